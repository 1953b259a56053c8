//! 稳定的 DTO 与 API 响应契约。
//!
//! 字段统一 camelCase，时间戳为毫秒。
//!
//! 请求体（`ReadBatchRequest`、`WritePointRequest`、`WriteBatchRequest`、
//! `ExecuteCommandRequest`）与 `CommandOutcomeDto` 是 HTTP 门面调用网关
//! 读写/命令接口时使用的报文形状；守护进程本身只输出快照类 DTO。

mod dto;
mod error_code;

pub use dto::*;
pub use error_code::error_code;

use serde::Serialize;

/// 标准 API 响应封装。
#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub data: Option<T>,
    pub error: Option<ApiError>,
}

/// 失败响应的错误体。
#[derive(Debug, Serialize)]
pub struct ApiError {
    pub code: String,
    pub message: String,
}

impl<T> ApiResponse<T> {
    pub fn success(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }

    pub fn error(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(ApiError {
                code: code.into(),
                message: message.into(),
            }),
        }
    }

    /// 按错误类别生成失败响应。
    pub fn failure(kind: domain::ErrorKind, message: impl Into<String>) -> Self {
        Self::error(error_code(kind), message)
    }
}
