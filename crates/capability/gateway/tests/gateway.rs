use async_trait::async_trait;
use domain::{Confirmation, DeviceEndpoint, ErrorKind, OverallLabel, Severity, WriteValue};
use plcgw_config::default_cdu_profile;
use plcgw_gateway::{Gateway, GatewayOptions, LinkState};
use plcgw_protocol::{
    ConnectionPool, PoolConfig, ProtocolError, RegisterSession, SessionConnector,
    SimulatedConnector, SimulatedPlc,
};
use plcgw_storage::InMemoryRealtimeStore;
use std::sync::Arc;
use std::time::Duration;

fn setup_with(options: GatewayOptions) -> (Gateway, SimulatedPlc, DeviceEndpoint) {
    let profile = default_cdu_profile().resolve().expect("profile");
    let endpoint = profile.default_endpoint().cloned().expect("endpoint");
    let connector = SimulatedConnector::new();
    let plc = connector.attach(&endpoint);
    let pool = Arc::new(ConnectionPool::new(
        Arc::new(connector),
        PoolConfig {
            acquire_timeout: Duration::from_millis(200),
            io_timeout: Duration::from_millis(500),
            ..PoolConfig::default()
        },
    ));
    let gateway = Gateway::new(
        profile,
        pool,
        Arc::new(InMemoryRealtimeStore::new()),
        options,
    )
    .expect("gateway");
    (gateway, plc, endpoint)
}

fn setup() -> (Gateway, SimulatedPlc, DeviceEndpoint) {
    setup_with(GatewayOptions::default())
}

async fn connected() -> (Gateway, SimulatedPlc, DeviceEndpoint) {
    let (gateway, plc, endpoint) = setup();
    gateway.connect().await;
    assert_eq!(gateway.link_state(&endpoint), LinkState::Connected);
    (gateway, plc, endpoint)
}

#[tokio::test]
async fn write_point_then_read_point() {
    let (gateway, plc, _) = connected().await;
    let outcome = gateway
        .write_point(10500, WriteValue::Raw(1234))
        .await
        .expect("write");
    assert_eq!(outcome.written, vec![1234]);
    assert_eq!(plc.register(500), 1234);

    let reading = gateway.read_point(10500).await.expect("read");
    assert_eq!(reading.raw, 1234);
    assert_eq!(reading.engineering, Some(1234.0));
    assert!(!reading.stale);
}

#[tokio::test]
async fn write_batch_then_read_batch() {
    let (gateway, plc, _) = connected().await;
    gateway
        .write_batch(10502, &[100, 200, 300])
        .await
        .expect("write");
    assert_eq!(plc.writes(), 1);

    let readings = gateway.read_batch(10502, 3).await.expect("read");
    let raws: Vec<u16> = readings.iter().map(|reading| reading.raw).collect();
    assert_eq!(raws, vec![100, 200, 300]);
    let numbers: Vec<u32> = readings.iter().map(|reading| reading.r_number).collect();
    assert_eq!(numbers, vec![10502, 10503, 10504]);
}

#[tokio::test]
async fn start_command_is_confirmed() {
    let (gateway, plc, _) = connected().await;
    let outcome = gateway.execute_command("start").await.expect("start");
    assert!(outcome.confirmed());
    assert_eq!(outcome.r_number, 10500);
    assert_eq!(plc.register(500), 2321);
}

#[tokio::test]
async fn ignored_command_write_reports_mismatch() {
    let (gateway, plc, _) = connected().await;
    plc.lock_register(501);
    let err = gateway.execute_command("stop").await.expect_err("mismatch");
    assert_eq!(err.kind(), ErrorKind::ReadbackMismatch);
    // 设备可达，链路保持连接
    assert_eq!(
        gateway.link_state(gateway.default_endpoint()),
        LinkState::Connected
    );
}

#[tokio::test]
async fn unknown_command_is_rejected() {
    let (gateway, _, _) = connected().await;
    let err = gateway.execute_command("purge").await.expect_err("unknown");
    assert_eq!(err.kind(), ErrorKind::UnknownCommand);
}

#[tokio::test]
async fn scaled_value_write_reads_back_in_engineering_units() {
    let (gateway, plc, _) = connected().await;
    let outcome = gateway
        .write_value("temp_setting", 25.5)
        .await
        .expect("write");
    assert_eq!(outcome.written, vec![3255]);
    assert_eq!(plc.register(600), 3255);

    let reading = gateway.read_point_by_key("temp_setting").await.expect("read");
    let engineering = reading.engineering.expect("in range");
    assert!((engineering - 25.5).abs() < 1e-9);
    assert_eq!(reading.unit, "°C");

    let err = gateway
        .write_value("temp_setting", 75.0)
        .await
        .expect_err("out of range");
    assert_eq!(err.kind(), ErrorKind::ValueOutOfRange);
}

#[tokio::test]
async fn validation_precedes_connection_checks() {
    let (gateway, _, _) = setup();
    let err = gateway.read_point(9999).await.expect_err("outside");
    assert_eq!(err.kind(), ErrorKind::AddressOutOfRange);

    let err = gateway
        .write_point(10400, WriteValue::Raw(1))
        .await
        .expect_err("outside write window");
    assert_eq!(err.kind(), ErrorKind::AddressOutOfRange);

    let err = gateway.read_batch(10000, 126).await.expect_err("too many");
    assert_eq!(err.kind(), ErrorKind::BatchSizeInvalid);

    let err = gateway
        .write_batch(10500, &[0u16; 124])
        .await
        .expect_err("too many");
    assert_eq!(err.kind(), ErrorKind::BatchSizeInvalid);
}

#[tokio::test]
async fn writes_require_a_connected_link() {
    let (gateway, plc, _) = setup();
    let err = gateway
        .write_point(10500, WriteValue::Raw(1))
        .await
        .expect_err("not connected");
    assert_eq!(err.kind(), ErrorKind::NotConnected);
    assert_eq!(plc.writes(), 0);
}

#[tokio::test]
async fn read_without_cache_is_unavailable() {
    let (gateway, _, _) = setup();
    let err = gateway.read_point(10111).await.expect_err("no cache");
    assert_eq!(err.kind(), ErrorKind::Unavailable);
}

#[tokio::test]
async fn unreachable_device_serves_stale_cache() {
    let (gateway, plc, endpoint) = connected().await;
    plc.set_register(111, 255);
    let live = gateway.read_point(10111).await.expect("live");
    assert!(!live.stale);
    assert!((live.engineering.expect("in range") - 25.5).abs() < 1e-9);

    plc.set_online(false);
    let stale = gateway.read_point(10111).await.expect("stale");
    assert!(stale.stale);
    assert_eq!(stale.raw, 255);
    assert_eq!(stale.ts_ms, live.ts_ms);
    assert_eq!(gateway.link_state(&endpoint), LinkState::Degraded);

    let err = gateway.read_point(10112).await.expect_err("never read");
    assert_eq!(err.kind(), ErrorKind::Unavailable);
}

#[tokio::test]
async fn link_degrades_disconnects_and_recovers() {
    let (gateway, plc, endpoint) = connected().await;
    gateway.poll_once(&endpoint).await.expect("poll");

    plc.set_online(false);
    gateway.poll_once(&endpoint).await.expect_err("offline");
    assert_eq!(gateway.link_state(&endpoint), LinkState::Degraded);
    gateway.poll_once(&endpoint).await.expect_err("offline");
    assert_eq!(gateway.link_state(&endpoint), LinkState::Disconnected);

    assert_eq!(gateway.probe(&endpoint).await, LinkState::Disconnected);

    plc.set_online(true);
    assert_eq!(gateway.probe(&endpoint).await, LinkState::Connected);
}

#[tokio::test]
async fn poll_cycle_fills_the_cache() {
    let (gateway, plc, endpoint) = connected().await;
    plc.set_register(0, 0b0000_0011);
    plc.set_register(62, 123);
    plc.set_register(141, 1);
    let refreshed = gateway.poll_once(&endpoint).await.expect("poll");
    // 6 个状态/异常寄存器 + 14 个点位
    assert_eq!(refreshed, 20);
    let cached = gateway.cached_values(&endpoint).await.expect("cache");
    assert_eq!(cached.len(), 20);
    assert_eq!(cached[0].r_number, 10000);

    plc.set_online(false);
    let flow = gateway.read_point_by_key("f2_flow").await.expect("flow");
    assert!(flow.stale);
    assert!((flow.engineering.expect("in range") - 12.3).abs() < 1e-9);

    let level = gateway
        .read_point_by_key("tank_level_switch")
        .await
        .expect("level");
    assert_eq!(level.label.as_deref(), Some("HighLevel"));

    let status = gateway.status_snapshot().await.expect("status");
    assert!(status.stale);
    assert_eq!(status.summary.overall, OverallLabel::Running);
}

#[tokio::test]
async fn status_snapshot_decodes_flags() {
    let (gateway, plc, _) = connected().await;
    plc.set_register(0, 0b1000_0001);
    let snapshot = gateway.status_snapshot().await.expect("status");
    assert!(!snapshot.stale);
    assert!(snapshot.summary.power_on);
    assert!(snapshot.summary.abnormal);
    assert_eq!(snapshot.summary.overall, OverallLabel::Abnormal);
    assert_eq!(snapshot.summary.flags.len(), 16);
}

#[tokio::test]
async fn alarm_snapshot_aggregates_registers() {
    let (gateway, plc, _) = connected().await;
    plc.set_register(2, 1 << 10);
    let snapshot = gateway.alarm_snapshot().await.expect("alarms");
    assert_eq!(snapshot.summary.total_active, 1);
    assert_eq!(snapshot.summary.severity, Severity::Minor);
    assert_eq!(snapshot.summary.active[0].code, "A027");
    assert_eq!(snapshot.summary.registers.len(), 5);

    plc.set_register(1, 0b1);
    let snapshot = gateway.alarm_snapshot().await.expect("alarms");
    assert_eq!(snapshot.summary.severity, Severity::Critical);
}

#[tokio::test]
async fn alarm_threshold_follows_options() {
    let mut options = GatewayOptions::default();
    options.alarm_policy.major_threshold = 1;
    let (gateway, plc, _) = setup_with(options);
    gateway.connect().await;
    plc.set_register(2, 1 << 10);
    let snapshot = gateway.alarm_snapshot().await.expect("alarms");
    assert_eq!(snapshot.summary.severity, Severity::Major);
}

#[tokio::test]
async fn value_settings_list_every_setting_point() {
    let (gateway, plc, _) = connected().await;
    plc.set_register(605, 3050);
    let settings = gateway.value_settings().await;
    let keys: Vec<&str> = settings
        .iter()
        .map(|setting| setting.point.key.as_str())
        .collect();
    assert_eq!(
        keys,
        vec![
            "temp_setting",
            "flow_setting",
            "fan_speed",
            "pump1_speed",
            "pump2_speed"
        ]
    );
    let fan = settings
        .iter()
        .find(|setting| setting.point.key == "fan_speed")
        .and_then(|setting| setting.reading.as_ref())
        .expect("fan reading");
    assert_eq!(fan.engineering, Some(50.0));
    // 原始值 0 低于设定范围
    let pump = settings
        .iter()
        .find(|setting| setting.point.key == "pump1_speed")
        .and_then(|setting| setting.reading.as_ref())
        .expect("pump reading");
    assert_eq!(pump.engineering, None);
    assert_eq!(pump.label.as_deref(), Some("BelowRange"));
}

#[tokio::test]
async fn value_write_without_confirmation_is_unconfirmed() {
    let (gateway, _, _) = connected().await;
    let outcome = gateway
        .write_value("fan_speed", 80.0)
        .await
        .expect("write");
    assert_eq!(outcome.confirmation, Confirmation::Unconfirmed);
    assert_eq!(outcome.written, vec![3080]);
}

#[tokio::test]
async fn commands_are_listed() {
    let (gateway, _, _) = setup();
    let names: Vec<String> = gateway
        .commands()
        .into_iter()
        .map(|command| command.name)
        .collect();
    assert_eq!(names, vec!["start", "stop", "fan_start", "fan_stop"]);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn supervisor_reconnects_and_polls() {
    let options = GatewayOptions {
        poll_interval: Duration::from_millis(10),
        reconnect_interval: Duration::from_millis(20),
        ..GatewayOptions::default()
    };
    let (gateway, plc, endpoint) = setup_with(options);
    plc.set_online(false);
    plc.set_register(113, 300);
    let tasks = gateway.start();
    assert_eq!(tasks.len(), 1);

    tokio::time::sleep(Duration::from_millis(50)).await;
    assert_eq!(gateway.link_state(&endpoint), LinkState::Disconnected);

    plc.set_online(true);
    let deadline = tokio::time::Instant::now() + Duration::from_secs(3);
    while gateway.pool_stats(&endpoint).created == 0
        || gateway.link_state(&endpoint) != LinkState::Connected
    {
        assert!(tokio::time::Instant::now() < deadline, "link never recovered");
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    // 等待至少一轮轮询写入缓存
    tokio::time::sleep(Duration::from_millis(100)).await;
    tasks.shutdown();

    plc.set_online(false);
    let reading = gateway.read_point_by_key("t13_temperature").await.expect("cached");
    assert_eq!(reading.raw, 300);
}

/// 请求发出即采样、应答晚到的会话（覆盖 `slow_address` 的读取延迟 `delay`）。
#[derive(Clone)]
struct LateReplySession {
    plc: SimulatedPlc,
    slow_address: u16,
    delay: Duration,
}

#[async_trait]
impl SessionConnector for LateReplySession {
    async fn connect(
        &self,
        _endpoint: &DeviceEndpoint,
    ) -> Result<Box<dyn RegisterSession>, ProtocolError> {
        Ok(Box::new(self.clone()))
    }
}

#[async_trait]
impl RegisterSession for LateReplySession {
    async fn read_holding_registers(
        &mut self,
        _unit_id: u8,
        address: u16,
        count: u16,
    ) -> Result<Vec<u16>, ProtocolError> {
        let addresses = address..address + count;
        let sample: Vec<u16> = addresses.clone().map(|addr| self.plc.register(addr)).collect();
        if addresses.contains(&self.slow_address) {
            tokio::time::sleep(self.delay).await;
        }
        Ok(sample)
    }

    async fn write_single_register(
        &mut self,
        _unit_id: u8,
        address: u16,
        value: u16,
    ) -> Result<(), ProtocolError> {
        self.plc.set_register(address, value);
        Ok(())
    }

    async fn write_multiple_registers(
        &mut self,
        _unit_id: u8,
        address: u16,
        values: &[u16],
    ) -> Result<(), ProtocolError> {
        for (addr, value) in (address..).zip(values) {
            self.plc.set_register(addr, *value);
        }
        Ok(())
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn late_poll_reply_does_not_roll_back_value_write() {
    let plc = SimulatedPlc::new();
    plc.set_register(600, 3000);
    let profile = default_cdu_profile().resolve().expect("profile");
    let endpoint = profile.default_endpoint().cloned().expect("endpoint");
    let connector = LateReplySession {
        plc: plc.clone(),
        slow_address: 600,
        delay: Duration::from_millis(150),
    };
    let pool = Arc::new(ConnectionPool::new(
        Arc::new(connector),
        PoolConfig::default(),
    ));
    let gateway = Gateway::new(
        profile,
        pool,
        Arc::new(InMemoryRealtimeStore::new()),
        GatewayOptions::default(),
    )
    .expect("gateway");
    gateway.connect().await;
    assert_eq!(gateway.link_state(&endpoint), LinkState::Connected);

    // 轮询在写入前采到旧值 3000，应答在写入之后才到
    let poll = {
        let gateway = gateway.clone();
        let endpoint = endpoint.clone();
        tokio::spawn(async move { gateway.poll_once(&endpoint).await })
    };
    tokio::time::sleep(Duration::from_millis(30)).await;
    let outcome = gateway
        .write_value("temp_setting", 25.5)
        .await
        .expect("write");
    assert_eq!(outcome.written, vec![3255]);
    poll.await.expect("join").expect("poll");

    assert_eq!(plc.register(600), 3255);
    let cached = gateway.cached_values(&endpoint).await.expect("cache");
    let setting = cached
        .iter()
        .find(|value| value.r_number == 10600)
        .expect("R10600 cached");
    assert_eq!(setting.raw, 3255);
}
