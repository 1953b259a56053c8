//! 机种配置文件
//!
//! JSON 结构：
//!
//! ```json
//! {
//!   "name": "cdu",
//!   "endpoints": [{ "id": "plc", "host": "10.10.40.8", "port": 502, "unitId": 1 }],
//!   "windows": {
//!     "read":    { "first": 10000, "last": 11000, "base": 10000 },
//!     "write":   { "first": 10500, "last": 10700, "base": 10000 },
//!     "command": { "first": 10500, "last": 10503, "base": 10000 },
//!     "value":   { "first": 10600, "last": 10608, "base": 10000 }
//!   },
//!   "points": [{ "key": "t11", "rNumber": 10111, "class": "telemetry",
//!                "kind": { "type": "linear", "rawBase": 0, "precision": 0.1,
//!                          "rawMin": 100, "rawMax": 800 }, "unit": "°C" }],
//!   "commands": [{ "name": "start", "rNumber": 10500, "value": 2321 }]
//! }
//! ```
//!
//! 点位与命令的 `endpoint` 省略时绑定第一个端点。

use crate::ConfigError;
use domain::{
    DeviceEndpoint, LinearScale, OperationClass, PointDescriptor, PointKind, StatusTable,
    WindowKind,
};
use plcgw_control::CommandDefinition;
use plcgw_normalize::RegisterWindow;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::path::Path;

fn default_port() -> u16 {
    502
}

fn default_unit_id() -> u8 {
    1
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EndpointSpec {
    pub id: String,
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default = "default_unit_id")]
    pub unit_id: u8,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WindowSpec {
    pub first: u32,
    pub last: u32,
    pub base: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WindowsSpec {
    pub read: WindowSpec,
    pub write: WindowSpec,
    pub command: WindowSpec,
    pub value: WindowSpec,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PointClassSpec {
    Telemetry,
    Command,
    Value,
}

impl From<PointClassSpec> for OperationClass {
    fn from(value: PointClassSpec) -> Self {
        match value {
            PointClassSpec::Telemetry => OperationClass::Telemetry,
            PointClassSpec::Command => OperationClass::Command,
            PointClassSpec::Value => OperationClass::Value,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StateSpec {
    pub raw: u16,
    pub label: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum PointKindSpec {
    #[serde(rename_all = "camelCase")]
    Linear {
        raw_base: i32,
        precision: f64,
        raw_min: u16,
        raw_max: u16,
    },
    TwoState { states: Vec<StateSpec> },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PointSpec {
    pub key: String,
    pub r_number: u32,
    #[serde(default)]
    pub endpoint: Option<String>,
    pub class: PointClassSpec,
    pub kind: PointKindSpec,
    #[serde(default)]
    pub unit: String,
    #[serde(default)]
    pub description: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommandSpec {
    pub name: String,
    pub r_number: u32,
    pub value: u16,
    #[serde(default)]
    pub endpoint: Option<String>,
    #[serde(default)]
    pub description: String,
}

/// 机种配置（未校验的原始结构）。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MachineProfile {
    pub name: String,
    pub endpoints: Vec<EndpointSpec>,
    pub windows: WindowsSpec,
    #[serde(default)]
    pub points: Vec<PointSpec>,
    #[serde(default)]
    pub commands: Vec<CommandSpec>,
}

/// 校验通过、可直接交给网关的配置。
#[derive(Debug, Clone)]
pub struct ResolvedProfile {
    pub name: String,
    pub endpoints: Vec<DeviceEndpoint>,
    pub windows: Vec<RegisterWindow>,
    pub points: Vec<PointDescriptor>,
    pub commands: Vec<CommandDefinition>,
}

impl ResolvedProfile {
    /// 默认端点（配置中的第一个）。
    pub fn default_endpoint(&self) -> Option<&DeviceEndpoint> {
        self.endpoints.first()
    }
}

pub fn load_profile(path: impl AsRef<Path>) -> Result<MachineProfile, ConfigError> {
    let path = path.as_ref();
    let text = std::fs::read_to_string(path)
        .map_err(|e| ConfigError::Io(path.display().to_string(), e.to_string()))?;
    profile_from_json(&text)
}

pub fn profile_from_json(text: &str) -> Result<MachineProfile, ConfigError> {
    serde_json::from_str(text).map_err(|e| ConfigError::Parse(e.to_string()))
}

fn invalid(message: impl Into<String>) -> ConfigError {
    ConfigError::Profile(message.into())
}

impl MachineProfile {
    /// 校验并转换为运行时结构。
    ///
    /// 点位必须落在其操作类别对应的窗口内，命令必须落在命令窗口内，
    /// 端点 id、点位 key、命令名均不得重复。
    pub fn resolve(&self) -> Result<ResolvedProfile, ConfigError> {
        if self.endpoints.is_empty() {
            return Err(invalid("at least one endpoint is required"));
        }
        let mut endpoints = HashMap::new();
        let mut ordered = Vec::with_capacity(self.endpoints.len());
        for spec in &self.endpoints {
            let endpoint = DeviceEndpoint::new(spec.host.clone(), spec.port, spec.unit_id);
            if endpoints.insert(spec.id.as_str(), endpoint.clone()).is_some() {
                return Err(invalid(format!("duplicate endpoint id {}", spec.id)));
            }
            ordered.push(endpoint);
        }
        let default_endpoint = ordered[0].clone();
        let lookup = |id: &Option<String>| -> Result<DeviceEndpoint, ConfigError> {
            match id {
                None => Ok(default_endpoint.clone()),
                Some(id) => endpoints
                    .get(id.as_str())
                    .cloned()
                    .ok_or_else(|| invalid(format!("unknown endpoint id {}", id))),
            }
        };

        let windows = self.windows.resolve()?;
        let window_of = |kind: WindowKind| {
            windows
                .iter()
                .find(|window| window.kind == kind)
                .copied()
                .ok_or_else(|| invalid(format!("{} window missing", kind.as_str())))
        };

        let mut keys = HashSet::new();
        let mut registers = HashSet::new();
        let mut points = Vec::with_capacity(self.points.len());
        for spec in &self.points {
            if !keys.insert(spec.key.as_str()) {
                return Err(invalid(format!("duplicate point key {}", spec.key)));
            }
            let endpoint = lookup(&spec.endpoint)?;
            if !registers.insert((endpoint.clone(), spec.r_number)) {
                return Err(invalid(format!(
                    "R{} is bound to more than one point",
                    spec.r_number
                )));
            }
            let class = OperationClass::from(spec.class);
            let window = window_of(class.window())?;
            if !window.contains(spec.r_number) {
                return Err(invalid(format!(
                    "point {} at R{} is outside the {} window",
                    spec.key,
                    spec.r_number,
                    window.kind.as_str()
                )));
            }
            points.push(PointDescriptor {
                key: spec.key.clone(),
                r_number: spec.r_number,
                endpoint,
                class,
                kind: spec.kind.resolve(&spec.key)?,
                unit: spec.unit.clone(),
                description: spec.description.clone(),
            });
        }

        let command_window = window_of(WindowKind::Command)?;
        let mut names = HashSet::new();
        let mut commands = Vec::with_capacity(self.commands.len());
        for spec in &self.commands {
            if !names.insert(spec.name.as_str()) {
                return Err(invalid(format!("duplicate command {}", spec.name)));
            }
            if !command_window.contains(spec.r_number) {
                return Err(invalid(format!(
                    "command {} at R{} is outside the command window",
                    spec.name, spec.r_number
                )));
            }
            commands.push(CommandDefinition::new(
                spec.name.clone(),
                lookup(&spec.endpoint)?,
                spec.r_number,
                spec.value,
                spec.description.clone(),
            ));
        }

        Ok(ResolvedProfile {
            name: self.name.clone(),
            endpoints: ordered,
            windows,
            points,
            commands,
        })
    }
}

impl WindowsSpec {
    fn resolve(&self) -> Result<Vec<RegisterWindow>, ConfigError> {
        [
            (WindowKind::Read, self.read),
            (WindowKind::Write, self.write),
            (WindowKind::Command, self.command),
            (WindowKind::Value, self.value),
        ]
        .into_iter()
        .map(|(kind, spec)| {
            if spec.first > spec.last || spec.base > spec.first {
                return Err(invalid(format!(
                    "{} window R{}-R{} base {} is not ordered",
                    kind.as_str(),
                    spec.first,
                    spec.last,
                    spec.base
                )));
            }
            if spec.last - spec.base > u32::from(u16::MAX) {
                return Err(invalid(format!(
                    "{} window exceeds the 16-bit address space",
                    kind.as_str()
                )));
            }
            Ok(RegisterWindow::new(kind, spec.first, spec.last, spec.base))
        })
        .collect()
    }
}

impl PointKindSpec {
    fn resolve(&self, key: &str) -> Result<PointKind, ConfigError> {
        match self {
            Self::Linear {
                raw_base,
                precision,
                raw_min,
                raw_max,
            } => {
                if !precision.is_finite() || *precision <= 0.0 {
                    return Err(invalid(format!("point {} precision must be > 0", key)));
                }
                if raw_min > raw_max {
                    return Err(invalid(format!("point {} raw range is not ordered", key)));
                }
                Ok(PointKind::Linear(LinearScale::new(
                    *raw_base, *precision, *raw_min, *raw_max,
                )))
            }
            Self::TwoState { states } => {
                if states.is_empty() {
                    return Err(invalid(format!("point {} has no states", key)));
                }
                let mut seen = HashSet::new();
                if states.iter().any(|state| !seen.insert(state.raw)) {
                    return Err(invalid(format!("point {} repeats a state value", key)));
                }
                Ok(PointKind::TwoState(StatusTable::new(
                    states.iter().map(|state| (state.raw, state.label.as_str())),
                )))
            }
        }
    }
}
