use crate::net::{NetError, Prefix};
use std::net::Ipv4Addr;

#[test]
fn new_masks_host_bits() {
    let p = Prefix::new(Ipv4Addr::new(10, 0, 3, 77), 24).expect("prefix");
    assert_eq!(p.network(), Ipv4Addr::new(10, 0, 3, 0));
    assert_eq!(p.len(), 24);
    assert_eq!(
        p,
        Prefix::new(Ipv4Addr::new(10, 0, 3, 0), 24).expect("prefix")
    );
}

#[test]
fn contains_respects_mask() {
    let p = Prefix::new(Ipv4Addr::new(10, 0, 3, 0), 24).expect("prefix");
    assert!(p.contains(Ipv4Addr::new(10, 0, 3, 1)));
    assert!(p.contains(Ipv4Addr::new(10, 0, 3, 254)));
    assert!(!p.contains(Ipv4Addr::new(10, 0, 4, 1)));
}

#[test]
fn default_route_matches_everything() {
    assert!(Prefix::DEFAULT.contains(Ipv4Addr::new(10, 0, 3, 2)));
    assert!(Prefix::DEFAULT.contains(Ipv4Addr::new(192, 168, 1, 1)));
    assert_eq!(Prefix::DEFAULT.len(), 0);
}

#[test]
fn slash_32_matches_single_host() {
    let p = Prefix::new(Ipv4Addr::new(10, 0, 0, 1), 32).expect("prefix");
    assert!(p.contains(Ipv4Addr::new(10, 0, 0, 1)));
    assert!(!p.contains(Ipv4Addr::new(10, 0, 0, 2)));
}

#[test]
fn invalid_len_rejected() {
    let err = Prefix::new(Ipv4Addr::new(10, 0, 0, 1), 33).unwrap_err();
    assert!(matches!(err, NetError::InvalidPrefixLen(33)));
}

#[test]
fn display_format() {
    let p = Prefix::new(Ipv4Addr::new(10, 0, 3, 9), 24).expect("prefix");
    assert_eq!(p.to_string(), "10.0.3.0/24");
    assert_eq!(Prefix::DEFAULT.to_string(), "0.0.0.0/0");
}
