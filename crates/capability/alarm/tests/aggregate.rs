use domain::{OverallLabel, Severity};
use plcgw_alarm::{AlarmCategory, AlarmPolicy, overall_label, summarize_status};

#[test]
fn overall_label_precedence() {
    // 异常位优先于一切
    assert_eq!(overall_label(0b1000_0111), OverallLabel::Abnormal);
    assert_eq!(overall_label(0b0000_0110), OverallLabel::PoweredOff);
    assert_eq!(overall_label(0b0000_0111), OverallLabel::Standby);
    assert_eq!(overall_label(0b0000_0011), OverallLabel::Running);
    assert_eq!(overall_label(0b0000_0001), OverallLabel::PoweredOnIdle);
}

#[test]
fn status_summary_exposes_named_bits() {
    let summary = summarize_status(0b0001_0011);
    assert!(summary.power_on);
    assert!(summary.running);
    assert!(summary.water_filling);
    assert!(!summary.standby);
    assert!(!summary.abnormal);
    assert_eq!(summary.flags.len(), 16);
    assert_eq!(summary.overall, OverallLabel::Running);
}

#[test]
fn no_alarms_is_normal() {
    let summary = AlarmPolicy::default().aggregate_alarm_block(&[0; 5]);
    assert_eq!(summary.severity, Severity::Normal);
    assert_eq!(summary.total_active, 0);
    assert_eq!(summary.registers.len(), 5);
}

#[test]
fn critical_alarm_wins_over_count() {
    // A001 水泵异常
    let summary = AlarmPolicy::default().aggregate_alarm_block(&[0b1, 0, 0, 0, 0]);
    assert_eq!(summary.severity, Severity::Critical);
    assert_eq!(summary.critical.len(), 1);
    assert_eq!(summary.category_count(AlarmCategory::Pump), 1);
}

#[test]
fn many_non_critical_alarms_are_major() {
    // A009-A013：温度类，非关键
    let raw = 0b0001_1111_0000_0000;
    let summary = AlarmPolicy::default().aggregate_alarm_block(&[raw, 0, 0, 0, 0]);
    assert_eq!(summary.total_active, 5);
    assert!(summary.critical.is_empty());
    assert_eq!(summary.severity, Severity::Major);
    assert_eq!(summary.category_count(AlarmCategory::Temperature), 5);
}

#[test]
fn few_non_critical_alarms_are_minor() {
    // A027 环境温度过低
    let summary = AlarmPolicy::default().aggregate_alarm_block(&[0, 1 << 10, 0, 0, 0]);
    assert_eq!(summary.severity, Severity::Minor);
    assert_eq!(summary.active[0].code, "A027");
}

#[test]
fn reserved_bits_do_not_count() {
    // A005-A008 为保留位
    let summary = AlarmPolicy::default().aggregate_alarm_block(&[0b1111_0000, 0, 0, 0, 0]);
    assert_eq!(summary.total_active, 0);
    assert_eq!(summary.severity, Severity::Normal);
}

#[test]
fn level_insufficient_is_critical() {
    // A032 回水水位不足
    let summary = AlarmPolicy::default().aggregate_alarm_block(&[0, 1 << 15, 0, 0, 0]);
    assert_eq!(summary.severity, Severity::Critical);
}

#[test]
fn threshold_is_configurable() {
    let policy = AlarmPolicy {
        major_threshold: 2,
        ..AlarmPolicy::default()
    };
    let summary = policy.aggregate_alarm_block(&[0b0011_0000_0000, 0, 0, 0, 0]);
    assert_eq!(summary.severity, Severity::Major);
}

#[test]
fn categories_use_first_matching_keyword() {
    assert_eq!(
        AlarmCategory::classify("ModbusTCP consecutive communication errors ET7215.01"),
        AlarmCategory::Communication
    );
    assert_eq!(
        AlarmCategory::classify("P2 pressure gauge wiring fault"),
        AlarmCategory::Pressure
    );
    assert_eq!(
        AlarmCategory::classify("FX5-8AD module 1 fault"),
        AlarmCategory::System
    );
    assert_eq!(
        AlarmCategory::classify("Password entered wrong 3 times"),
        AlarmCategory::Other
    );
}
