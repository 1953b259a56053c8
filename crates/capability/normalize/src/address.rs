//! R 寄存器地址转换
//!
//! 每个窗口声明自己的 `[first, last]` 闭区间和基址，
//! 线路偏移为 `r_number - base`。校验在任何 I/O 之前完成。

use crate::error::NormalizeError;
use domain::WindowKind;

/// 一个 R 寄存器窗口。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RegisterWindow {
    pub kind: WindowKind,
    /// 窗口首个 R 编号（含）
    pub first: u32,
    /// 窗口末个 R 编号（含）
    pub last: u32,
    /// 线路偏移基址
    pub base: u32,
}

impl RegisterWindow {
    pub fn new(kind: WindowKind, first: u32, last: u32, base: u32) -> Self {
        Self {
            kind,
            first,
            last,
            base,
        }
    }

    pub fn contains(&self, r_number: u32) -> bool {
        r_number >= self.first && r_number <= self.last
    }

    /// 窗口包含的寄存器个数。
    pub fn size(&self) -> u32 {
        self.last.saturating_sub(self.first) + 1
    }

    fn offset(&self, r_number: u32) -> Option<u16> {
        r_number
            .checked_sub(self.base)
            .and_then(|offset| u16::try_from(offset).ok())
    }
}

/// 地址转换器：按窗口类型查表。配置加载后只读。
#[derive(Debug, Clone, Default)]
pub struct AddressTranslator {
    windows: Vec<RegisterWindow>,
}

impl AddressTranslator {
    /// 同一类型出现多次时以最后一个为准。
    pub fn new(windows: impl IntoIterator<Item = RegisterWindow>) -> Self {
        let mut translator = Self::default();
        for window in windows {
            translator.windows.retain(|existing| existing.kind != window.kind);
            translator.windows.push(window);
        }
        translator
    }

    pub fn window(&self, kind: WindowKind) -> Option<&RegisterWindow> {
        self.windows.iter().find(|window| window.kind == kind)
    }

    pub fn windows(&self) -> &[RegisterWindow] {
        &self.windows
    }

    fn require(&self, kind: WindowKind) -> Result<&RegisterWindow, NormalizeError> {
        self.window(kind)
            .ok_or(NormalizeError::WindowNotConfigured(kind))
    }

    /// 单个 R 编号转换为线路偏移。
    pub fn translate(&self, r_number: u32, kind: WindowKind) -> Result<u16, NormalizeError> {
        let window = self.require(kind)?;
        if !window.contains(r_number) {
            return Err(NormalizeError::AddressOutOfRange {
                r_number,
                window: kind,
            });
        }
        window
            .offset(r_number)
            .ok_or(NormalizeError::AddressOutOfRange {
                r_number,
                window: kind,
            })
    }

    /// 连续 `count` 个寄存器的批量转换，返回起始线路偏移。
    ///
    /// 先校验数量（与地址是否合法无关），再校验起止地址。
    pub fn translate_batch(
        &self,
        r_number: u32,
        count: usize,
        kind: WindowKind,
        max_count: u16,
    ) -> Result<u16, NormalizeError> {
        if count == 0 || count > usize::from(max_count) {
            return Err(NormalizeError::BatchSizeInvalid {
                r_number,
                count,
                reason: format!("count must be within 1..={}", max_count),
            });
        }
        let start = self.translate(r_number, kind)?;
        let window = self.require(kind)?;
        let end = u64::from(r_number) + count as u64 - 1;
        if end > u64::from(window.last) {
            return Err(NormalizeError::BatchSizeInvalid {
                r_number,
                count,
                reason: format!("R{} exceeds window end R{}", end, window.last),
            });
        }
        Ok(start)
    }
}
