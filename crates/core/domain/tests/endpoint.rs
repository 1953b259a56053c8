use domain::{CommandOutcome, Confirmation, DeviceEndpoint, ErrorKind};
use std::collections::HashSet;

#[test]
fn endpoint_identity_includes_unit() {
    let a = DeviceEndpoint::new("10.10.40.8", 502, 1);
    let b = DeviceEndpoint::new("10.10.40.8", 502, 2);
    let mut set = HashSet::new();
    set.insert(a.clone());
    set.insert(b);
    set.insert(a.clone());
    assert_eq!(set.len(), 2);
    assert_eq!(a.address(), "10.10.40.8:502");
    assert_eq!(a.to_string(), "10.10.40.8:502#1");
}

#[test]
fn outcome_confirmed_only_when_confirmed() {
    let mut outcome = CommandOutcome {
        outcome_id: "op-1".to_string(),
        endpoint: DeviceEndpoint::new("plc", 502, 1),
        r_number: 10500,
        written: vec![2321],
        engineering: None,
        readback: Some(vec![2321]),
        confirmation: Confirmation::Confirmed,
        ts_ms: 0,
    };
    assert!(outcome.confirmed());
    outcome.confirmation = Confirmation::Mismatch;
    assert!(!outcome.confirmed());
}

#[test]
fn validation_kinds() {
    assert!(ErrorKind::BatchSizeInvalid.is_validation());
    assert!(!ErrorKind::NotConnected.is_validation());
}
