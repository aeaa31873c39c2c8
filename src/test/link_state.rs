use crate::net::{LsaBody, NetWorld, Network, NodeId, PacketKind, Prefix, RouteSource, schedule_link_down};
use crate::proto::{LinkState, RoutingProtocol};
use crate::sim::{SimTime, Simulator};
use crate::topo::{ChainOpts, build_chain, build_diamond};
use std::net::Ipv4Addr;

fn p(a: u8, b: u8, c: u8, d: u8, len: u8) -> Prefix {
    Prefix::new(Ipv4Addr::new(a, b, c, d), len).expect("prefix")
}

fn chain_with_ls() -> (Simulator, NetWorld, crate::topo::Chain) {
    let mut world = NetWorld::default();
    let chain = build_chain(&mut world.net, &ChainOpts::default()).expect("build chain");
    for router in chain.routers() {
        world.net.set_protocol(router, Box::new(LinkState::new()));
    }
    let mut sim = Simulator::default();
    world.net.start_protocols(&mut sim);
    (sim, world, chain)
}

#[test]
fn chain_converges_to_shortest_paths() {
    let (mut sim, mut world, chain) = chain_with_ls();
    sim.run_until(SimTime::from_secs(15), &mut world);

    let a_table = world.net.table(chain.a);
    assert_eq!(a_table.len(), 4);

    // 远端主机网段：两跳到 C，下一跳是 B 在 A-B 链路上的地址
    let far = a_table.lookup(Ipv4Addr::new(10, 0, 3, 2)).expect("route");
    assert_eq!(far.dest, p(10, 0, 3, 0, 24));
    assert_eq!(far.metric, 2);
    assert_eq!(far.next_hop, Some(Ipv4Addr::new(10, 0, 1, 2)));
    assert_eq!(far.source, RouteSource::LinkState);

    // 中段网段有两个宿主，取更近的（B，一跳）
    let mid = a_table.lookup(Ipv4Addr::new(10, 0, 2, 1)).expect("route");
    assert_eq!(mid.metric, 1);

    // 直连网段度量 0，直接投递
    let local = a_table.lookup(Ipv4Addr::new(10, 0, 0, 1)).expect("route");
    assert_eq!(local.metric, 0);
    assert_eq!(local.next_hop, None);
}

#[test]
fn partition_withdraws_unreachable_segments() {
    let (mut sim, mut world, chain) = chain_with_ls();
    sim.run_until(SimTime::from_secs(15), &mut world);
    assert!(world.net.table(chain.a).lookup(Ipv4Addr::new(10, 0, 3, 2)).is_some());

    schedule_link_down(&mut sim, chain.links[1], SimTime::from_secs(20));
    // 留出邻居保持时间 + 清扫周期
    sim.run_until(SimTime::from_secs(40), &mut world);

    let a_table = world.net.table(chain.a);
    assert!(a_table.lookup(Ipv4Addr::new(10, 0, 3, 2)).is_none());
    assert!(a_table.lookup(Ipv4Addr::new(10, 0, 2, 1)).is_none());
    // 本地直连不受影响
    assert!(a_table.lookup(Ipv4Addr::new(10, 0, 0, 1)).is_some());

    // 对侧也收敛到只剩自己可达的部分
    let c_table = world.net.table(chain.c);
    assert!(c_table.lookup(Ipv4Addr::new(10, 0, 0, 1)).is_none());
    assert!(c_table.lookup(Ipv4Addr::new(10, 0, 3, 2)).is_some());
}

#[test]
fn diamond_reroutes_after_single_link_failure() {
    let mut world = NetWorld::default();
    let diamond = build_diamond(&mut world.net).expect("build diamond");
    for router in diamond.routers() {
        world.net.set_protocol(router, Box::new(LinkState::new()));
    }
    let mut sim = Simulator::default();
    world.net.start_protocols(&mut sim);
    sim.run_until(SimTime::from_secs(15), &mut world);

    // 收敛后 A 一跳直达 D 的网段
    let before = world
        .net
        .table(diamond.a)
        .lookup(Ipv4Addr::new(10, 0, 8, 2))
        .expect("route")
        .clone();
    assert_eq!(before.metric, 1);

    schedule_link_down(&mut sim, diamond.l_ad, SimTime::from_secs(20));
    sim.run_until(SimTime::from_secs(35), &mut world);

    // 改走 B，两跳
    let after = world
        .net
        .table(diamond.a)
        .lookup(Ipv4Addr::new(10, 0, 8, 2))
        .expect("rerouted");
    assert_eq!(after.metric, 2);
    assert_eq!(after.next_hop, Some(Ipv4Addr::new(10, 0, 4, 2)));
}

#[test]
fn installed_routes_match_table_after_convergence() {
    let (mut sim, mut world, chain) = chain_with_ls();
    sim.run_until(SimTime::from_secs(15), &mut world);

    // 协议自报的路由集合与表中本协议来源的条目一致（整表覆盖的结果）
    for router in chain.routers() {
        let mut installed = world.net.protocol_routes(router);
        installed.sort_by_key(|r| r.dest);
        let from_table: Vec<_> = world
            .net
            .table(router)
            .snapshot()
            .into_iter()
            .filter(|r| r.source == RouteSource::LinkState)
            .collect();
        assert_eq!(installed, from_table, "router {router:?}");
    }
}

/// 驱动 on_packet 的协议单元测试用最小拓扑。
fn tiny_net() -> (Network, NodeId, crate::net::IfaceId) {
    let mut net = Network::default();
    let x = net.add_node("X").expect("node");
    let y = net.add_node("Y").expect("node");
    let if_x = net.add_iface(x, Ipv4Addr::new(10, 9, 0, 1), 24).expect("iface");
    let if_y = net.add_iface(y, Ipv4Addr::new(10, 9, 0, 2), 24).expect("iface");
    net.connect(if_x, if_y, SimTime::from_millis(1), 10_000_000)
        .expect("link");
    (net, x, if_x)
}

#[test]
fn hello_registers_neighbor_once() {
    let (mut net, x, if_x) = tiny_net();
    let mut sim = Simulator::default();
    let mut ls = LinkState::new();
    let peer = NodeId(1);
    let peer_addr = Ipv4Addr::new(10, 9, 0, 2);

    ls.on_packet(x, if_x, peer_addr, PacketKind::Hello { origin: peer }, &mut sim, &mut net);
    assert_eq!(ls.neighbor_count(), 1);

    // 重复 hello 只刷新保持时间
    ls.on_packet(x, if_x, peer_addr, PacketKind::Hello { origin: peer }, &mut sim, &mut net);
    assert_eq!(ls.neighbor_count(), 1);

    // 自己的 hello 被忽略
    ls.on_packet(x, if_x, peer_addr, PacketKind::Hello { origin: x }, &mut sim, &mut net);
    assert_eq!(ls.neighbor_count(), 1);
}

#[test]
fn stale_lsa_sequence_is_rejected() {
    let (mut net, x, if_x) = tiny_net();
    let mut sim = Simulator::default();
    let mut ls = LinkState::new();
    let peer = NodeId(1);
    let peer_addr = Ipv4Addr::new(10, 9, 0, 2);
    ls.on_packet(x, if_x, peer_addr, PacketKind::Hello { origin: peer }, &mut sim, &mut net);

    let newer = LsaBody {
        origin: peer,
        seq: 2,
        neighbors: vec![x],
        prefixes: vec![p(10, 20, 0, 0, 24)],
    };
    ls.on_packet(x, if_x, peer_addr, PacketKind::Lsa(newer), &mut sim, &mut net);
    let installed = ls.installed_routes();
    assert!(installed.iter().any(|r| r.dest == p(10, 20, 0, 0, 24)));

    // 更小（或相同）序列号的 LSA 不覆盖数据库
    let stale = LsaBody {
        origin: peer,
        seq: 1,
        neighbors: vec![x],
        prefixes: vec![p(10, 30, 0, 0, 24)],
    };
    ls.on_packet(x, if_x, peer_addr, PacketKind::Lsa(stale), &mut sim, &mut net);
    let installed = ls.installed_routes();
    assert!(installed.iter().any(|r| r.dest == p(10, 20, 0, 0, 24)));
    assert!(!installed.iter().any(|r| r.dest == p(10, 30, 0, 0, 24)));
}
