use api_contract::{
    CommandOutcomeDto, PointReadingDto, ReadBatchRequest, WriteBatchRequest, WritePointRequest,
};
use domain::{CommandOutcome, Confirmation, DeviceEndpoint, PointReading, WriteValue};
use serde_json::Value;

fn sample_reading() -> PointReading {
    PointReading {
        r_number: 10111,
        raw: 255,
        engineering: Some(25.5),
        unit: "°C".to_string(),
        label: None,
        stale: true,
        ts_ms: 1_700_000_000_000,
    }
}

#[test]
fn point_reading_is_camel_case() {
    let value = serde_json::to_value(PointReadingDto::from(&sample_reading())).expect("serialize");
    assert_eq!(value.get("rNumber"), Some(&Value::from(10111)));
    assert_eq!(value.get("stale"), Some(&Value::Bool(true)));
    assert!(value.get("timestamp").is_some());
    assert!(value.get("r_number").is_none());
    // 无标签时不输出
    assert!(value.get("label").is_none());
}

#[test]
fn out_of_range_reading_keeps_null_engineering() {
    let mut reading = sample_reading();
    reading.engineering = None;
    reading.label = Some("AboveRange".to_string());
    let value = serde_json::to_value(PointReadingDto::from(&reading)).expect("serialize");
    assert_eq!(value.get("engineering"), Some(&Value::Null));
    assert_eq!(value.get("label"), Some(&Value::from("AboveRange")));
}

#[test]
fn command_outcome_reports_confirmation() {
    let outcome = CommandOutcome {
        outcome_id: "op-1".to_string(),
        endpoint: DeviceEndpoint::new("10.10.40.8", 502, 1),
        r_number: 10500,
        written: vec![2321],
        engineering: None,
        readback: Some(vec![2321]),
        confirmation: Confirmation::Confirmed,
        ts_ms: 1,
    };
    let value = serde_json::to_value(CommandOutcomeDto::from(&outcome)).expect("serialize");
    assert_eq!(value.get("confirmed"), Some(&Value::Bool(true)));
    assert_eq!(value.get("confirmation"), Some(&Value::from("confirmed")));
    assert_eq!(value.get("endpoint"), Some(&Value::from("10.10.40.8:502#1")));
    assert_eq!(value.get("outcomeId"), Some(&Value::from("op-1")));
}

#[test]
fn write_point_request_takes_exactly_one_value() {
    let req: WritePointRequest =
        serde_json::from_str(r#"{"rNumber":10500,"raw":1234}"#).expect("parse");
    assert_eq!(req.value(), Some(WriteValue::Raw(1234)));

    let req: WritePointRequest =
        serde_json::from_str(r#"{"rNumber":10600,"engineering":25.5}"#).expect("parse");
    assert_eq!(req.value(), Some(WriteValue::Engineering(25.5)));

    let req: WritePointRequest =
        serde_json::from_str(r#"{"rNumber":10600,"raw":1,"engineering":2.0}"#).expect("parse");
    assert_eq!(req.value(), None);
}

#[test]
fn batch_requests_accept_camel_case() {
    let req: ReadBatchRequest =
        serde_json::from_str(r#"{"startR":10502,"count":3}"#).expect("parse");
    assert_eq!((req.start_r, req.count), (10502, 3));

    let req: WriteBatchRequest =
        serde_json::from_str(r#"{"startR":10502,"values":[100,200,300]}"#).expect("parse");
    assert_eq!(req.values, vec![100, 200, 300]);
}
