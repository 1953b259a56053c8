//! 命令/数值写入执行器
//!
//! 所有写入都先在本地完成地址与数值校验，再取租约下发；
//! 回读使用同一租约，保证读在写之后。多寄存器写入只走一次功能码 16，
//! 不做逐个寄存器的降级写入。

use crate::commands::CommandTable;
use crate::error::ControlError;
use domain::{
    CachedValue, CommandOutcome, Confirmation, DeviceEndpoint, OperationClass, PointDescriptor,
    PointKind, WindowKind, WriteValue,
};
use plcgw_normalize::{AddressTranslator, resolve_write, to_raw};
use plcgw_protocol::{
    ConnectionPool, MAX_WRITE_REGISTERS, ModbusFunctionCode, ProtocolError, now_epoch_ms,
};
use plcgw_storage::RealtimeStore;
use std::sync::Arc;
use tracing::{info, warn};

/// 执行器参数
#[derive(Debug, Clone, Default)]
pub struct ExecutorConfig {
    /// 数值写入后是否回读确认（命令写入总是回读）
    pub confirm_value_writes: bool,
}

/// 一次写入的处理方式。
#[derive(Debug, Clone, Copy)]
struct WritePlan {
    readback: bool,
    /// 未确认时是否仍以写入值更新缓存
    cache_unconfirmed: bool,
}

struct WriteRequest<'a> {
    endpoint: &'a DeviceEndpoint,
    r_number: u32,
    offset: u16,
    values: Vec<u16>,
    engineering: Option<f64>,
    plan: WritePlan,
}

/// 命令/数值写入执行器
#[derive(Clone)]
pub struct CommandExecutor {
    pool: Arc<ConnectionPool>,
    translator: Arc<AddressTranslator>,
    store: Arc<dyn RealtimeStore>,
    commands: Arc<CommandTable>,
    config: ExecutorConfig,
}

impl CommandExecutor {
    pub fn new(
        pool: Arc<ConnectionPool>,
        translator: Arc<AddressTranslator>,
        store: Arc<dyn RealtimeStore>,
        commands: Arc<CommandTable>,
        config: ExecutorConfig,
    ) -> Self {
        Self {
            pool,
            translator,
            store,
            commands,
            config,
        }
    }

    pub fn commands(&self) -> &CommandTable {
        &self.commands
    }

    /// 执行具名命令：写入魔数并回读确认。
    pub async fn execute(&self, name: &str) -> Result<CommandOutcome, ControlError> {
        let command = self
            .commands
            .get(name)
            .ok_or_else(|| ControlError::UnknownCommand(name.to_string()))?;
        let offset = self
            .translator
            .translate(command.r_number, WindowKind::Command)?;
        info!(
            target: "plcgw.control",
            command = %command.name,
            endpoint = %command.endpoint,
            r_number = command.r_number,
            value = command.value,
            "command_execute_requested"
        );
        let outcome = self
            .perform(WriteRequest {
                endpoint: &command.endpoint,
                r_number: command.r_number,
                offset,
                values: vec![command.value],
                engineering: None,
                plan: WritePlan {
                    readback: true,
                    cache_unconfirmed: false,
                },
            })
            .await?;
        plcgw_telemetry::record_command_executed();
        info!(
            target: "plcgw.control",
            command = %command.name,
            outcome_id = %outcome.outcome_id,
            confirmation = outcome.confirmation.as_str(),
            "command_executed"
        );
        Ok(outcome)
    }

    /// 数值设定：工程量经换算后写入数值窗口。
    pub async fn write_value(
        &self,
        point: &PointDescriptor,
        engineering: f64,
    ) -> Result<CommandOutcome, ControlError> {
        let offset = self.translator.translate(point.r_number, WindowKind::Value)?;
        let raw = to_raw(engineering, point)?;
        self.perform(WriteRequest {
            endpoint: &point.endpoint,
            r_number: point.r_number,
            offset,
            values: vec![raw],
            engineering: Some(engineering),
            plan: self.plan_for(point.class),
        })
        .await
    }

    /// 通用单点写入（写窗口），原始值或工程量均可。
    pub async fn write_point(
        &self,
        point: &PointDescriptor,
        value: WriteValue,
    ) -> Result<CommandOutcome, ControlError> {
        let offset = self.translator.translate(point.r_number, WindowKind::Write)?;
        if !point.class.is_writable() {
            return Err(ControlError::ReadOnly {
                r_number: point.r_number,
            });
        }
        let raw = resolve_write(value, point)?;
        let engineering = match (&point.kind, value) {
            (PointKind::Linear(_), WriteValue::Engineering(value)) => Some(value),
            (PointKind::Linear(scale), WriteValue::Raw(raw)) => {
                Some((i64::from(raw) - i64::from(scale.raw_base)) as f64 * scale.precision)
            }
            (PointKind::TwoState(_), _) => Some(f64::from(raw)),
        };
        self.perform(WriteRequest {
            endpoint: &point.endpoint,
            r_number: point.r_number,
            offset,
            values: vec![raw],
            engineering,
            plan: self.plan_for(point.class),
        })
        .await
    }

    /// 连续寄存器批量写入（写窗口），要么全部写入，要么一个都不写。
    pub async fn write_batch(
        &self,
        endpoint: &DeviceEndpoint,
        start_r: u32,
        values: &[u16],
    ) -> Result<CommandOutcome, ControlError> {
        let offset = self.translator.translate_batch(
            start_r,
            values.len(),
            WindowKind::Write,
            MAX_WRITE_REGISTERS,
        )?;
        let touches_commands = self
            .translator
            .window(WindowKind::Command)
            .map(|window| {
                let end = start_r + values.len() as u32 - 1;
                start_r <= window.last && end >= window.first
            })
            .unwrap_or(false);
        let plan = if touches_commands {
            WritePlan {
                readback: true,
                cache_unconfirmed: false,
            }
        } else {
            self.plan_for(OperationClass::Value)
        };
        self.perform(WriteRequest {
            endpoint,
            r_number: start_r,
            offset,
            values: values.to_vec(),
            engineering: None,
            plan,
        })
        .await
    }

    fn plan_for(&self, class: OperationClass) -> WritePlan {
        match class {
            OperationClass::Command => WritePlan {
                readback: true,
                cache_unconfirmed: false,
            },
            _ => WritePlan {
                readback: self.config.confirm_value_writes,
                cache_unconfirmed: true,
            },
        }
    }

    async fn perform(&self, request: WriteRequest<'_>) -> Result<CommandOutcome, ControlError> {
        let WriteRequest {
            endpoint,
            r_number,
            offset,
            values,
            engineering,
            plan,
        } = request;
        let write_error = |source: ProtocolError| ControlError::Write {
            endpoint: endpoint.to_string(),
            r_number,
            source,
        };

        let mut lease = match self.pool.acquire(endpoint).await {
            Ok(lease) => lease,
            Err(err) => {
                plcgw_telemetry::record_write_failed();
                return Err(write_error(err));
            }
        };
        let written = match ModbusFunctionCode::for_write(values.len()) {
            ModbusFunctionCode::WriteSingleRegister => {
                lease.write_single_register(offset, values[0]).await
            }
            _ => lease.write_multiple_registers(offset, &values).await,
        };
        if let Err(err) = written {
            plcgw_telemetry::record_write_failed();
            warn!(
                target: "plcgw.control",
                endpoint = %endpoint,
                r_number = r_number,
                count = values.len(),
                error = %err,
                "register_write_failed"
            );
            return Err(write_error(err));
        }
        plcgw_telemetry::record_write_ok();

        let readback = if plan.readback {
            match lease
                .read_holding_registers(offset, values.len() as u16)
                .await
            {
                Ok(current) => Some(current),
                Err(err) => {
                    warn!(
                        target: "plcgw.control",
                        endpoint = %endpoint,
                        r_number = r_number,
                        error = %err,
                        "readback_failed"
                    );
                    None
                }
            }
        } else {
            None
        };
        drop(lease);

        let confirmation = match &readback {
            Some(current) if *current == values => Confirmation::Confirmed,
            Some(_) => Confirmation::Mismatch,
            None => Confirmation::Unconfirmed,
        };
        let ts_ms = now_epoch_ms();
        // 回读值即设备当前值，优先写入缓存
        let cached = match &readback {
            Some(current) => Some(current.as_slice()),
            None if plan.cache_unconfirmed => Some(values.as_slice()),
            None => None,
        };
        if let Some(raws) = cached {
            self.update_cache(endpoint, r_number, raws, ts_ms).await;
        }

        let outcome = CommandOutcome {
            outcome_id: plcgw_telemetry::new_operation_id(),
            endpoint: endpoint.clone(),
            r_number,
            written: values,
            engineering,
            readback,
            confirmation,
            ts_ms,
        };
        info!(
            target: "plcgw.control",
            outcome_id = %outcome.outcome_id,
            endpoint = %endpoint,
            r_number = r_number,
            count = outcome.written.len(),
            confirmation = confirmation.as_str(),
            "register_write_completed"
        );

        if confirmation == Confirmation::Mismatch {
            plcgw_telemetry::record_readback_mismatch();
            warn!(
                target: "plcgw.control",
                outcome_id = %outcome.outcome_id,
                r_number = r_number,
                written = ?outcome.written,
                readback = ?outcome.readback,
                "readback_mismatch"
            );
            return Err(ControlError::ReadbackMismatch {
                outcome: Box::new(outcome),
            });
        }
        Ok(outcome)
    }

    async fn update_cache(
        &self,
        endpoint: &DeviceEndpoint,
        start_r: u32,
        raws: &[u16],
        ts_ms: i64,
    ) {
        for (index, raw) in raws.iter().enumerate() {
            let value = CachedValue {
                endpoint: endpoint.clone(),
                r_number: start_r + index as u32,
                raw: *raw,
                ts_ms,
            };
            if let Err(err) = self.store.upsert_last_value(&value).await {
                warn!(
                    target: "plcgw.control",
                    endpoint = %endpoint,
                    r_number = value.r_number,
                    error = %err,
                    "cache_update_failed"
                );
            }
        }
    }
}
