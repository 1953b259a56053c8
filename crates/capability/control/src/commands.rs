//! 命令表
//!
//! 命令与寄存器一一绑定，写入固定魔数（硬件约定，不可更改编码）。

use domain::DeviceEndpoint;

/// 启动类命令写入值
pub const START_MAGIC: u16 = 2321;
/// 停止类命令写入值
pub const STOP_MAGIC: u16 = 2322;

/// 单条命令定义。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandDefinition {
    pub name: String,
    pub endpoint: DeviceEndpoint,
    pub r_number: u32,
    pub value: u16,
    pub description: String,
}

impl CommandDefinition {
    pub fn new(
        name: impl Into<String>,
        endpoint: DeviceEndpoint,
        r_number: u32,
        value: u16,
        description: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            endpoint,
            r_number,
            value,
            description: description.into(),
        }
    }
}

/// 命令表，配置加载后只读。
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CommandTable {
    commands: Vec<CommandDefinition>,
}

impl CommandTable {
    pub fn new(commands: Vec<CommandDefinition>) -> Self {
        Self { commands }
    }

    pub fn get(&self, name: &str) -> Option<&CommandDefinition> {
        self.commands.iter().find(|command| command.name == name)
    }

    pub fn iter(&self) -> impl Iterator<Item = &CommandDefinition> {
        self.commands.iter()
    }

    pub fn len(&self) -> usize {
        self.commands.len()
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }
}
