//! 静态位标志表：状态寄存器 R10000 与异常寄存器 R10001-R10005。
//!
//! 异常码规则 `A{(register - 10001) * 16 + bit + 1:03}`，表中未列出的码为保留位。

use domain::BitFlagDescriptor;

/// 状态寄存器
pub const STATUS_REGISTER: u32 = 10000;

/// 异常寄存器（共 5 个，A001-A080）
pub const ALARM_REGISTERS: [u32; 5] = [10001, 10002, 10003, 10004, 10005];

pub const STATUS_BIT_POWER: u8 = 0;
pub const STATUS_BIT_RUNNING: u8 = 1;
pub const STATUS_BIT_STANDBY: u8 = 2;
pub const STATUS_BIT_WATER_FILLING: u8 = 4;
pub const STATUS_BIT_ABNORMAL: u8 = 7;

const fn status(
    bit: u8,
    code: &'static str,
    name: &'static str,
    off: &'static str,
    on: &'static str,
) -> BitFlagDescriptor {
    BitFlagDescriptor {
        register: STATUS_REGISTER,
        bit,
        code,
        name,
        off_text: off,
        on_text: on,
    }
}

const fn alarm(
    register: u32,
    bit: u8,
    code: &'static str,
    name: &'static str,
) -> BitFlagDescriptor {
    BitFlagDescriptor {
        register,
        bit,
        code,
        name,
        off_text: "Normal",
        on_text: "Fault",
    }
}

pub static STATUS_FLAGS: [BitFlagDescriptor; 5] = [
    status(STATUS_BIT_POWER, "POWER", "CDU power on", "Off", "On"),
    status(STATUS_BIT_RUNNING, "RUNNING", "CDU running", "Stopped", "Running"),
    status(STATUS_BIT_STANDBY, "STANDBY", "CDU standby", "Running", "Standby"),
    status(
        STATUS_BIT_WATER_FILLING,
        "WATER_FILLING",
        "CDU water filling",
        "Stopped",
        "Filling",
    ),
    status(STATUS_BIT_ABNORMAL, "ABNORMAL", "CDU abnormal", "Normal", "Abnormal"),
];

pub static ALARM_FLAGS: [BitFlagDescriptor; 58] = [
    alarm(10001, 0, "A001", "Pump 1 fault"),
    alarm(10001, 1, "A002", "Pump 2 fault"),
    alarm(10001, 2, "A003", "Pump 1 communication fault"),
    alarm(10001, 3, "A004", "Pump 2 communication fault"),
    alarm(10001, 8, "A009", "Internal return T12 temperature low"),
    alarm(10001, 9, "A010", "Internal return T12 temperature high"),
    alarm(10001, 10, "A011", "Internal inlet T11 temperature low"),
    alarm(10001, 11, "A012", "Internal inlet T11 temperature high"),
    alarm(10001, 12, "A013", "Internal outlet T13 temperature low"),
    alarm(10001, 13, "A014", "Internal outlet T13 temperature high"),
    alarm(10001, 14, "A015", "Internal return P12 pump inlet pressure low"),
    alarm(10001, 15, "A016", "Internal return P12 pump inlet pressure high"),
    alarm(10002, 0, "A017", "Internal return P13 pump inlet pressure low"),
    alarm(10002, 1, "A018", "Internal return P13 pump inlet pressure high"),
    alarm(10002, 8, "A025", "Internal inlet F2 flow reading low"),
    alarm(10002, 9, "A026", "Internal inlet F2 flow reading high"),
    alarm(10002, 10, "A027", "CDU ambient temperature low"),
    alarm(10002, 11, "A028", "CDU ambient temperature high"),
    alarm(10002, 12, "A029", "CDU ambient humidity low"),
    alarm(10002, 13, "A030", "CDU ambient humidity high"),
    alarm(10002, 14, "A031", "Dew point calculation input error"),
    alarm(10002, 15, "A032", "Internal return water level insufficient, check refill reserve"),
    alarm(10003, 0, "A033", "Pump 1 running pressure not rising"),
    alarm(10003, 1, "A034", "Pump 2 running pressure not rising"),
    alarm(10003, 2, "A035", "Water detected outside piping"),
    alarm(10003, 3, "A036", "Secondary T12 temperature check abnormal"),
    alarm(10003, 4, "A037", "Secondary T13 temperature check abnormal"),
    alarm(10003, 5, "A038", "Secondary T11 temperature check abnormal"),
    alarm(10003, 6, "A039", "Secondary T2 temperature deviation too large"),
    alarm(10003, 7, "A040", "Internal return P1a/P2 pressure difference too large"),
    alarm(10003, 8, "A041", "Secondary P12 pressure check abnormal"),
    alarm(10003, 9, "A042", "Secondary P13 pressure check abnormal"),
    alarm(10003, 10, "A043", "Password entered wrong 3 times"),
    alarm(10003, 11, "A044", "Dual pump failure, system shut down"),
    alarm(10003, 12, "A045", "ModbusRTU consecutive communication errors (hygrometer)"),
    alarm(10003, 13, "A046", "ModbusTCP consecutive communication errors ET7215.01"),
    alarm(10003, 14, "A047", "Secondary T3 temperature deviation too large"),
    alarm(10003, 15, "A048", "Secondary T4 temperature deviation too large"),
    alarm(10004, 0, "A049", "ModbusTCP consecutive communication errors ET7215.04"),
    alarm(10004, 1, "A050", "ModbusTCP consecutive communication errors ET7215.05"),
    alarm(10004, 2, "A051", "ModbusTCP consecutive communication errors ET7215.06"),
    alarm(10004, 3, "A052", "FX5-8AD module 1 fault"),
    alarm(10004, 4, "A053", "FX5-8AD module 2 fault"),
    alarm(10004, 5, "A054", "FX5-4DA-ADP module fault"),
    alarm(10004, 6, "A055", "PLC controller error code raised"),
    alarm(10004, 7, "A056", "Fan feedback abnormal"),
    alarm(10004, 8, "A057", "Heater tank temperature high"),
    alarm(10004, 10, "A059", "Secondary water pressure level insufficient at startup"),
    alarm(10004, 11, "A060", "T11a temperature probe wiring fault"),
    alarm(10004, 12, "A061", "T11b temperature probe wiring fault"),
    alarm(10004, 13, "A062", "T12a temperature probe wiring fault"),
    alarm(10004, 14, "A063", "T12b temperature probe wiring fault"),
    alarm(10004, 15, "A064", "T13a temperature probe wiring fault"),
    alarm(10005, 0, "A065", "T13b temperature probe wiring fault"),
    alarm(10005, 1, "A066", "P1a pressure gauge wiring fault"),
    alarm(10005, 2, "A067", "P2 pressure gauge wiring fault"),
    alarm(10005, 3, "A068", "F2 flow meter wiring fault"),
    alarm(10005, 4, "A069", "Proportional valve wiring fault"),
];

/// 查找某寄存器某一位的描述，未定义的位返回 `None`。
pub fn descriptor(register: u32, bit: u8) -> Option<&'static BitFlagDescriptor> {
    let table: &'static [BitFlagDescriptor] = if register == STATUS_REGISTER {
        &STATUS_FLAGS
    } else if is_alarm_register(register) {
        &ALARM_FLAGS
    } else {
        return None;
    };
    table
        .iter()
        .find(|flag| flag.register == register && flag.bit == bit)
}

pub fn is_alarm_register(register: u32) -> bool {
    ALARM_REGISTERS.contains(&register)
}

/// 异常码，例如 R10002 bit15 -> `A032`。
pub fn alarm_code(register: u32, bit: u8) -> String {
    let index = (register.saturating_sub(ALARM_REGISTERS[0])) * 16 + u32::from(bit) + 1;
    format!("A{:03}", index)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn alarm_table_codes_follow_numbering_rule() {
        for flag in ALARM_FLAGS.iter() {
            assert_eq!(alarm_code(flag.register, flag.bit), flag.code);
            assert!(flag.bit < 16);
        }
    }

    #[test]
    fn alarm_codes_span_a001_to_a080() {
        assert_eq!(alarm_code(10001, 0), "A001");
        assert_eq!(alarm_code(10002, 15), "A032");
        assert_eq!(alarm_code(10005, 15), "A080");
    }

    #[test]
    fn unnamed_codes_have_no_descriptor() {
        assert!(descriptor(10001, 4).is_none());
        assert!(descriptor(10000, 3).is_none());
        assert!(descriptor(10006, 0).is_none());
        assert_eq!(descriptor(10004, 10).map(|flag| flag.code), Some("A059"));
    }
}
