use crate::sim::SimTime;

#[test]
fn unit_conversions() {
    assert_eq!(SimTime::from_micros(3), SimTime(3_000));
    assert_eq!(SimTime::from_millis(7), SimTime(7_000_000));
    assert_eq!(SimTime::from_secs(2), SimTime(2_000_000_000));
    assert_eq!(SimTime::ZERO, SimTime(0));
}

#[test]
fn as_secs_truncates() {
    assert_eq!(SimTime(999_999_999).as_secs(), 0);
    assert_eq!(SimTime::from_secs(40).as_secs(), 40);
    assert_eq!(SimTime(40_500_000_000).as_secs(), 40);
}

#[test]
fn saturating_arithmetic() {
    assert_eq!(
        SimTime(u64::MAX).saturating_add(SimTime(1)),
        SimTime(u64::MAX)
    );
    assert_eq!(SimTime(5).saturating_sub(SimTime(10)), SimTime::ZERO);
    assert_eq!(SimTime(10).saturating_sub(SimTime(3)), SimTime(7));
}

#[test]
fn ordering_is_numeric() {
    assert!(SimTime::from_millis(1) < SimTime::from_secs(1));
    assert!(SimTime::from_secs(40) < SimTime::from_secs(131));
}
