//! 内置 CDU 机种配置（未提供配置文件时使用）

use crate::profile::{
    CommandSpec, EndpointSpec, MachineProfile, PointClassSpec, PointKindSpec, PointSpec,
    StateSpec, WindowSpec, WindowsSpec,
};
use plcgw_control::{START_MAGIC, STOP_MAGIC};

const WINDOW_BASE: u32 = 10000;

fn window(first: u32, last: u32) -> WindowSpec {
    WindowSpec {
        first,
        last,
        base: WINDOW_BASE,
    }
}

fn linear(
    key: &str,
    r_number: u32,
    class: PointClassSpec,
    (raw_base, precision, raw_min, raw_max): (i32, f64, u16, u16),
    unit: &str,
    description: &str,
) -> PointSpec {
    PointSpec {
        key: key.to_string(),
        r_number,
        endpoint: None,
        class,
        kind: PointKindSpec::Linear {
            raw_base,
            precision,
            raw_min,
            raw_max,
        },
        unit: unit.to_string(),
        description: description.to_string(),
    }
}

fn two_state(key: &str, r_number: u32, off: &str, on: &str, description: &str) -> PointSpec {
    PointSpec {
        key: key.to_string(),
        r_number,
        endpoint: None,
        class: PointClassSpec::Telemetry,
        kind: PointKindSpec::TwoState {
            states: vec![
                StateSpec {
                    raw: 0,
                    label: off.to_string(),
                },
                StateSpec {
                    raw: 1,
                    label: on.to_string(),
                },
            ],
        },
        unit: String::new(),
        description: description.to_string(),
    }
}

fn command(name: &str, r_number: u32, value: u16, description: &str) -> CommandSpec {
    CommandSpec {
        name: name.to_string(),
        r_number,
        value,
        endpoint: None,
        description: description.to_string(),
    }
}

pub fn default_cdu_profile() -> MachineProfile {
    use PointClassSpec::{Telemetry, Value};

    let setting = (3000, 0.1, 3000, 3600);
    let percent = (3000, 1.0, 3000, 3100);
    let temperature = (0, 0.1, 100, 800);
    let pressure = (0, 0.01, 5, 600);

    MachineProfile {
        name: "cdu".to_string(),
        endpoints: vec![EndpointSpec {
            id: "plc".to_string(),
            host: "10.10.40.8".to_string(),
            port: 502,
            unit_id: 1,
        }],
        windows: WindowsSpec {
            read: window(10000, 11000),
            write: window(10500, 10700),
            command: window(10500, 10503),
            value: window(10600, 10608),
        },
        points: vec![
            linear("f2_flow", 10062, Telemetry, (0, 0.1, 0, 700), "LPM", "F2 flow"),
            linear("p12_pressure", 10082, Telemetry, pressure, "bar", "P12 pressure"),
            linear("p13_pressure", 10083, Telemetry, pressure, "bar", "P13 pressure"),
            linear("t11_temperature", 10111, Telemetry, temperature, "°C", "T11 temperature"),
            linear("t12_temperature", 10112, Telemetry, temperature, "°C", "T12 temperature"),
            linear("t13_temperature", 10113, Telemetry, temperature, "°C", "T13 temperature"),
            two_state("tank_level_switch", 10141, "Normal", "HighLevel", "Tank level switch"),
            two_state("leak_detection", 10143, "Leak", "Normal", "Leak detection"),
            two_state("refill_pump_output", 10151, "Standby", "Active", "Refill pump output"),
            linear("temp_setting", 10600, Value, setting, "°C", "Supply temperature setting"),
            linear("flow_setting", 10601, Value, setting, "LPM", "Flow setting"),
            linear("fan_speed", 10605, Value, percent, "%", "Fan speed"),
            linear("pump1_speed", 10606, Value, percent, "%", "Pump 1 speed"),
            linear("pump2_speed", 10607, Value, percent, "%", "Pump 2 speed"),
        ],
        commands: vec![
            command("start", 10500, START_MAGIC, "Start unit"),
            command("stop", 10501, STOP_MAGIC, "Stop unit"),
            command("fan_start", 10502, START_MAGIC, "Start fans"),
            command("fan_stop", 10503, STOP_MAGIC, "Stop fans"),
        ],
    }
}
