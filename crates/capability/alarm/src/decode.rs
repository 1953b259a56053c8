//! 寄存器位解析

use crate::tables::{alarm_code, descriptor, is_alarm_register};
use domain::DecodedFlag;
use std::collections::BTreeMap;

const RESERVED_NAME: &str = "Reserved";

/// 解析一个寄存器的 16 个位。未定义的位标记为保留位，但照常上报。
pub fn decode(register: u32, raw: u16) -> BTreeMap<u8, DecodedFlag> {
    (0u8..16)
        .map(|bit| (bit, decode_bit(register, raw, bit)))
        .collect()
}

fn decode_bit(register: u32, raw: u16, bit: u8) -> DecodedFlag {
    let value = ((raw >> bit) & 1) as u8;
    let active = value == 1;
    match descriptor(register, bit) {
        Some(flag) => DecodedFlag {
            register,
            bit,
            code: flag.code.to_string(),
            name: flag.name.to_string(),
            value,
            active,
            reserved: false,
            status: if active { flag.on_text } else { flag.off_text }.to_string(),
        },
        None => DecodedFlag {
            register,
            bit,
            code: reserved_code(register, bit),
            name: RESERVED_NAME.to_string(),
            value,
            active,
            reserved: true,
            status: if active { "Set" } else { "Clear" }.to_string(),
        },
    }
}

fn reserved_code(register: u32, bit: u8) -> String {
    if is_alarm_register(register) {
        alarm_code(register, bit)
    } else {
        format!("R{}.{}", register, bit)
    }
}
