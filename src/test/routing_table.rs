use crate::net::{IfaceId, Prefix, Route, RouteSource, RoutingTable};
use std::net::Ipv4Addr;

fn route(dest: Prefix, metric: u32, source: RouteSource, iface: usize) -> Route {
    Route {
        dest,
        next_hop: Some(Ipv4Addr::new(10, 0, 0, 2)),
        iface: IfaceId(iface),
        metric,
        source,
    }
}

fn p(a: u8, b: u8, c: u8, d: u8, len: u8) -> Prefix {
    Prefix::new(Ipv4Addr::new(a, b, c, d), len).expect("prefix")
}

#[test]
fn lookup_prefers_longest_prefix() {
    let mut t = RoutingTable::default();
    assert!(t.insert(route(Prefix::DEFAULT, 1, RouteSource::Static, 0)));
    assert!(t.insert(route(p(10, 0, 0, 0, 16), 2, RouteSource::Rip, 1)));
    assert!(t.insert(route(p(10, 0, 3, 0, 24), 3, RouteSource::Rip, 2)));

    let hit = t.lookup(Ipv4Addr::new(10, 0, 3, 2)).expect("route");
    assert_eq!(hit.iface, IfaceId(2));

    let hit = t.lookup(Ipv4Addr::new(10, 0, 9, 1)).expect("route");
    assert_eq!(hit.iface, IfaceId(1));

    let hit = t.lookup(Ipv4Addr::new(192, 168, 1, 1)).expect("route");
    assert_eq!(hit.iface, IfaceId(0));
}

#[test]
fn lookup_miss_without_default() {
    let mut t = RoutingTable::default();
    t.insert(route(p(10, 0, 3, 0, 24), 1, RouteSource::Rip, 0));
    assert!(t.lookup(Ipv4Addr::new(10, 0, 4, 1)).is_none());
}

#[test]
fn better_metric_evicts_worse_is_noop() {
    let mut t = RoutingTable::default();
    let dest = p(10, 0, 3, 0, 24);
    assert!(t.insert(route(dest, 5, RouteSource::Rip, 0)));

    // 更差的插入是 no-op
    assert!(!t.insert(route(dest, 7, RouteSource::Rip, 1)));
    assert_eq!(t.lookup(Ipv4Addr::new(10, 0, 3, 1)).expect("route").metric, 5);

    // 更优的驱逐在位者
    assert!(t.insert(route(dest, 2, RouteSource::Rip, 2)));
    let hit = t.lookup(Ipv4Addr::new(10, 0, 3, 1)).expect("route");
    assert_eq!((hit.metric, hit.iface), (2, IfaceId(2)));

    // 同度量不驱逐（先到先得）
    assert!(!t.insert(route(dest, 2, RouteSource::Rip, 3)));
    assert_eq!(t.lookup(Ipv4Addr::new(10, 0, 3, 1)).expect("route").iface, IfaceId(2));
}

#[test]
fn static_overrides_dynamic_regardless_of_metric() {
    let mut t = RoutingTable::default();
    let dest = p(10, 0, 3, 0, 24);
    assert!(t.insert(route(dest, 1, RouteSource::Rip, 0)));
    assert!(t.insert(route(dest, 10, RouteSource::Static, 1)));
    assert_eq!(
        t.lookup(Ipv4Addr::new(10, 0, 3, 1)).expect("route").source,
        RouteSource::Static
    );

    // 动态路由再优也压不过静态
    assert!(!t.insert(route(dest, 1, RouteSource::LinkState, 2)));
    assert_eq!(
        t.lookup(Ipv4Addr::new(10, 0, 3, 1)).expect("route").source,
        RouteSource::Static
    );
}

#[test]
fn remove_requires_matching_source() {
    let mut t = RoutingTable::default();
    let dest = p(10, 0, 3, 0, 24);
    t.insert(route(dest, 1, RouteSource::Static, 0));

    assert!(!t.remove(dest, RouteSource::Rip));
    assert_eq!(t.len(), 1);

    assert!(t.remove(dest, RouteSource::Static));
    assert!(t.is_empty());
    assert!(!t.remove(dest, RouteSource::Static));
}

#[test]
fn remove_source_clears_only_that_source() {
    let mut t = RoutingTable::default();
    t.insert(route(p(10, 0, 1, 0, 24), 1, RouteSource::LinkState, 0));
    t.insert(route(p(10, 0, 2, 0, 24), 1, RouteSource::LinkState, 1));
    t.insert(route(p(10, 0, 3, 0, 24), 1, RouteSource::Static, 2));

    t.remove_source(RouteSource::LinkState);
    assert_eq!(t.len(), 1);
    assert_eq!(t.snapshot()[0].source, RouteSource::Static);
}

#[test]
fn snapshot_is_ordered_and_stable() {
    let mut t = RoutingTable::default();
    t.insert(route(p(10, 0, 3, 0, 24), 1, RouteSource::Rip, 0));
    t.insert(route(p(10, 0, 1, 0, 24), 1, RouteSource::Rip, 1));
    t.insert(route(Prefix::DEFAULT, 1, RouteSource::Static, 2));

    let dests: Vec<Prefix> = t.snapshot().iter().map(|r| r.dest).collect();
    assert_eq!(
        dests,
        vec![Prefix::DEFAULT, p(10, 0, 1, 0, 24), p(10, 0, 3, 0, 24)]
    );
}
