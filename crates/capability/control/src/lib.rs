//! # 控制能力模块
//!
//! - [`CommandTable`]：具名命令与寄存器、魔数的绑定
//! - [`CommandExecutor`]：命令执行、数值设定、批量写入，写后回读确认

mod commands;
mod error;
mod executor;

pub use commands::{CommandDefinition, CommandTable, START_MAGIC, STOP_MAGIC};
pub use error::ControlError;
pub use executor::{CommandExecutor, ExecutorConfig};
