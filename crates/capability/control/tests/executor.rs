use domain::{
    Confirmation, DeviceEndpoint, ErrorKind, LinearScale, OperationClass, PointDescriptor,
    PointKind, WindowKind, WriteValue,
};
use plcgw_control::{
    CommandDefinition, CommandExecutor, CommandTable, ControlError, ExecutorConfig, START_MAGIC,
    STOP_MAGIC,
};
use plcgw_normalize::{AddressTranslator, RegisterWindow};
use plcgw_protocol::{ConnectionPool, PoolConfig, SimulatedConnector, SimulatedPlc};
use plcgw_storage::{InMemoryRealtimeStore, RealtimeStore};
use std::sync::Arc;
use std::time::Duration;

fn endpoint() -> DeviceEndpoint {
    DeviceEndpoint::new("10.10.40.8", 502, 1)
}

struct Harness {
    executor: CommandExecutor,
    plc: SimulatedPlc,
    store: Arc<InMemoryRealtimeStore>,
}

fn harness(config: ExecutorConfig) -> Harness {
    harness_with(config, PoolConfig::default())
}

fn harness_with(config: ExecutorConfig, pool_config: PoolConfig) -> Harness {
    let connector = SimulatedConnector::new();
    let plc = connector.attach(&endpoint());
    let pool = Arc::new(ConnectionPool::new(Arc::new(connector), pool_config));
    let translator = Arc::new(AddressTranslator::new([
        RegisterWindow::new(WindowKind::Read, 10000, 11000, 10000),
        RegisterWindow::new(WindowKind::Write, 10500, 10700, 10000),
        RegisterWindow::new(WindowKind::Command, 10500, 10503, 10000),
        RegisterWindow::new(WindowKind::Value, 10600, 10608, 10000),
    ]));
    let commands = Arc::new(CommandTable::new(vec![
        CommandDefinition::new("start", endpoint(), 10500, START_MAGIC, "start CDU"),
        CommandDefinition::new("stop", endpoint(), 10501, STOP_MAGIC, "stop CDU"),
        CommandDefinition::new("bogus", endpoint(), 10600, START_MAGIC, "outside command window"),
    ]));
    let store = Arc::new(InMemoryRealtimeStore::new());
    let executor = CommandExecutor::new(pool, translator, store.clone(), commands, config);
    Harness {
        executor,
        plc,
        store,
    }
}

fn temp_setting() -> PointDescriptor {
    PointDescriptor {
        key: "temp_setting".to_string(),
        r_number: 10600,
        endpoint: endpoint(),
        class: OperationClass::Value,
        kind: PointKind::Linear(LinearScale::new(3000, 0.1, 3000, 3600)),
        unit: "C".to_string(),
        description: "temperature setting".to_string(),
    }
}

#[tokio::test]
async fn start_command_writes_magic_and_confirms() {
    let h = harness(ExecutorConfig::default());
    let outcome = h.executor.execute("start").await.expect("execute");
    assert_eq!(h.plc.register(500), 2321);
    assert!(outcome.confirmed());
    assert_eq!(outcome.written, vec![2321]);
    assert_eq!(outcome.readback, Some(vec![2321]));

    let cached = h
        .store
        .get_last_value(&endpoint(), 10500)
        .await
        .expect("get")
        .expect("cached");
    assert_eq!(cached.raw, 2321);
}

#[tokio::test]
async fn stop_command_uses_stop_magic() {
    let h = harness(ExecutorConfig::default());
    h.executor.execute("stop").await.expect("execute");
    assert_eq!(h.plc.register(501), 2322);
}

#[tokio::test]
async fn unknown_command_is_rejected() {
    let h = harness(ExecutorConfig::default());
    let err = h.executor.execute("launch").await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::UnknownCommand);
}

#[tokio::test]
async fn command_outside_command_window_never_reaches_device() {
    let h = harness(ExecutorConfig::default());
    let err = h.executor.execute("bogus").await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::AddressOutOfRange);
    assert_eq!(h.plc.connects(), 0);
}

#[tokio::test]
async fn ignored_write_reports_readback_mismatch() {
    let h = harness(ExecutorConfig::default());
    h.plc.lock_register(500);
    let err = h.executor.execute("start").await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::ReadbackMismatch);
    let outcome = err.outcome().expect("outcome");
    assert_eq!(outcome.confirmation, Confirmation::Mismatch);
    assert_eq!(outcome.readback, Some(vec![0]));
}

#[tokio::test]
async fn value_write_scales_and_caches_immediately() {
    let h = harness(ExecutorConfig::default());
    let outcome = h
        .executor
        .write_value(&temp_setting(), 25.5)
        .await
        .expect("write");
    assert_eq!(h.plc.register(600), 3255);
    assert_eq!(outcome.confirmation, Confirmation::Unconfirmed);
    assert_eq!(outcome.engineering, Some(25.5));
    let cached = h
        .store
        .get_last_value(&endpoint(), 10600)
        .await
        .expect("get")
        .expect("cached");
    assert_eq!(cached.raw, 3255);
}

#[tokio::test]
async fn value_write_confirms_when_enabled() {
    let h = harness(ExecutorConfig {
        confirm_value_writes: true,
    });
    let outcome = h
        .executor
        .write_value(&temp_setting(), 30.0)
        .await
        .expect("write");
    assert!(outcome.confirmed());
}

#[tokio::test]
async fn out_of_range_value_is_rejected_before_io() {
    let h = harness(ExecutorConfig::default());
    let err = h
        .executor
        .write_value(&temp_setting(), 75.0)
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::ValueOutOfRange);
    assert_eq!(h.plc.connects(), 0);
}

#[tokio::test]
async fn raw_point_write_through_write_window() {
    let h = harness(ExecutorConfig::default());
    let outcome = h
        .executor
        .write_point(&temp_setting(), WriteValue::Raw(3300))
        .await
        .expect("write");
    assert_eq!(h.plc.register(600), 3300);
    assert!((outcome.engineering.expect("engineering") - 30.0).abs() < 1e-9);
}

#[tokio::test]
async fn telemetry_points_are_read_only() {
    let h = harness(ExecutorConfig::default());
    let mut point = temp_setting();
    point.class = OperationClass::Telemetry;
    let err = h
        .executor
        .write_point(&point, WriteValue::Raw(3300))
        .await
        .unwrap_err();
    assert!(matches!(err, ControlError::ReadOnly { .. }));
}

#[tokio::test]
async fn batch_write_is_single_request() {
    let h = harness(ExecutorConfig::default());
    let outcome = h
        .executor
        .write_batch(&endpoint(), 10602, &[100, 200, 300])
        .await
        .expect("write");
    assert_eq!(h.plc.writes(), 1);
    assert_eq!(
        [h.plc.register(602), h.plc.register(603), h.plc.register(604)],
        [100, 200, 300]
    );
    assert_eq!(outcome.written, vec![100, 200, 300]);
}

#[tokio::test]
async fn failed_batch_applies_nothing() {
    let h = harness(ExecutorConfig::default());
    h.plc.fault_register(651);
    let err = h
        .executor
        .write_batch(&endpoint(), 10650, &[1, 2, 3])
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Device);
    assert_eq!(h.plc.register(650), 0);
    assert_eq!(h.plc.register(652), 0);
}

#[tokio::test]
async fn batch_straddling_commands_is_confirmed() {
    let h = harness(ExecutorConfig::default());
    let outcome = h
        .executor
        .write_batch(&endpoint(), 10502, &[100, 200, 300])
        .await
        .expect("write");
    assert!(outcome.confirmed());
}

#[tokio::test]
async fn oversized_batch_is_rejected() {
    let h = harness(ExecutorConfig::default());
    let values = vec![0u16; 124];
    let err = h
        .executor
        .write_batch(&endpoint(), 10500, &values)
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::BatchSizeInvalid);
}

#[tokio::test]
async fn offline_device_write_fails_without_cache() {
    let h = harness(ExecutorConfig::default());
    h.plc.set_online(false);
    let err = h
        .executor
        .write_value(&temp_setting(), 25.0)
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotConnected);
    assert!(h.store.is_empty());
}

#[tokio::test]
async fn slow_device_write_surfaces_write_timeout() {
    let h = harness_with(
        ExecutorConfig::default(),
        PoolConfig {
            io_timeout: Duration::from_millis(50),
            ..PoolConfig::default()
        },
    );
    h.plc.set_latency(Duration::from_millis(200));
    let err = h.executor.execute("start").await.expect_err("timeout");
    assert_eq!(err.kind(), ErrorKind::WriteTimeout);
    assert!(err.outcome().is_none());
    assert_eq!(h.plc.register(500), 0);
    let cached = h.store.get_last_value(&endpoint(), 10500).await.expect("get");
    assert!(cached.is_none());
}
