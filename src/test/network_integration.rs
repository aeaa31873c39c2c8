use crate::app::ProbeSend;
use crate::net::{NetWorld, schedule_link_down};
use crate::proto::{LinkState, Rip, SplitHorizon};
use crate::sim::{
    FaultAction, FaultSpec, ProbeSpec, ScenarioProtocol, ScenarioSpec, ScenarioTopology, SimTime,
    Simulator,
};
use crate::topo::{ChainOpts, ECHO_PORT, build_chain, build_diamond, build_scenario};
use std::net::Ipv4Addr;

#[test]
fn chain_rip_delivers_until_host_link_dies() {
    let mut sim = Simulator::default();
    let mut world = NetWorld::default();
    let chain = build_chain(&mut world.net, &ChainOpts::default()).expect("build chain");

    for router in chain.routers() {
        let mut rip = Rip::new(SplitHorizon::PoisonReverse);
        if router == chain.a {
            rip.exclude_iface(chain.a_host_iface);
        }
        if router == chain.c {
            rip.exclude_iface(chain.c_host_iface);
        }
        world.net.set_protocol(router, Box::new(rip));
    }

    world.net.add_echo_server(chain.r, ECHO_PORT);
    let client = world.net.add_echo_client(
        chain.t,
        chain.r_addr,
        ECHO_PORT,
        1024,
        SimTime::from_secs(1),
        100,
    );
    sim.schedule(SimTime::from_secs(2), ProbeSend { client });
    schedule_link_down(&mut sim, chain.links[0], SimTime::from_secs(40));

    world.net.start_protocols(&mut sim);
    sim.run_until(SimTime::from_secs(131), &mut world);

    let c = world.net.client(client);
    assert_eq!(c.sent, 100);
    // t=2..=39 的探测有应答；主机链路断掉后一个也回不来
    assert!(c.received >= 35, "received {}", c.received);
    assert!(c.received <= 38, "received {}", c.received);
    let last = c.last_rx_sent_at.expect("some replies");
    assert!(last < SimTime::from_secs(40));
    // 断链后的探测在源头就被丢掉
    assert!(world.net.stats.dropped_iface_down > 0);
}

#[test]
fn chain_link_state_delivers_until_host_link_dies() {
    let mut sim = Simulator::default();
    let mut world = NetWorld::default();
    let chain = build_chain(&mut world.net, &ChainOpts::default()).expect("build chain");

    for router in chain.routers() {
        world.net.set_protocol(router, Box::new(LinkState::new()));
    }

    world.net.add_echo_server(chain.r, ECHO_PORT);
    let client = world.net.add_echo_client(
        chain.t,
        chain.r_addr,
        ECHO_PORT,
        1024,
        SimTime::from_secs(1),
        100,
    );
    sim.schedule(SimTime::from_secs(2), ProbeSend { client });
    schedule_link_down(&mut sim, chain.links[0], SimTime::from_secs(40));

    world.net.start_protocols(&mut sim);
    sim.run_until(SimTime::from_secs(131), &mut world);

    let c = world.net.client(client);
    assert_eq!(c.sent, 100);
    assert!(c.received >= 35, "received {}", c.received);
    assert!(c.last_rx_sent_at.expect("some replies") < SimTime::from_secs(40));
}

#[test]
fn diamond_link_state_survives_path_failure() {
    let mut sim = Simulator::default();
    let mut world = NetWorld::default();
    let diamond = build_diamond(&mut world.net).expect("build diamond");

    for router in diamond.routers() {
        world.net.set_protocol(router, Box::new(LinkState::new()));
    }

    world.net.add_echo_server(diamond.r, ECHO_PORT);
    let client = world.net.add_echo_client(
        diamond.t,
        diamond.r_addr,
        ECHO_PORT,
        1024,
        SimTime::from_secs(1),
        120,
    );
    sim.schedule(SimTime::from_secs(2), ProbeSend { client });
    // 切断当前最短路径 A-D：流量应改走 A-B-D
    schedule_link_down(&mut sim, diamond.l_ad, SimTime::from_secs(40));

    world.net.start_protocols(&mut sim);
    sim.run_until(SimTime::from_secs(131), &mut world);

    let c = world.net.client(client);
    assert_eq!(c.sent, 120);
    // 重新收敛期间最多丢几个探测
    assert!(c.received >= 110, "received {}", c.received);
    // 故障之后发出的探测也有应答，证明确实改道了
    assert!(c.last_rx_sent_at.expect("some replies") >= SimTime::from_secs(100));
}

#[test]
fn diamond_double_fault_leaves_primary_path_intact() {
    let mut sim = Simulator::default();
    let mut world = NetWorld::default();
    let diamond = build_diamond(&mut world.net).expect("build diamond");

    for router in diamond.routers() {
        world.net.set_protocol(router, Box::new(LinkState::new()));
    }

    world.net.add_echo_server(diamond.r, ECHO_PORT);
    let client = world.net.add_echo_client(
        diamond.t,
        diamond.r_addr,
        ECHO_PORT,
        1024,
        SimTime::from_secs(1),
        120,
    );
    sim.schedule(SimTime::from_secs(2), ProbeSend { client });
    // 同时切断 B-D 与 A-C：剩余链路仍构成 T 到 R 的通路
    schedule_link_down(&mut sim, diamond.l_bd, SimTime::from_secs(40));
    schedule_link_down(&mut sim, diamond.l_ac, SimTime::from_secs(40));

    world.net.start_protocols(&mut sim);
    sim.run_until(SimTime::from_secs(131), &mut world);

    let c = world.net.client(client);
    assert_eq!(c.sent, 120);
    assert!(c.received >= 110, "received {}", c.received);
    assert!(c.last_rx_sent_at.expect("some replies") >= SimTime::from_secs(100));
}

#[test]
fn echo_reply_rtts_are_recorded_in_order() {
    let mut sim = Simulator::default();
    let mut world = NetWorld::default();
    let chain = build_chain(&mut world.net, &ChainOpts::default()).expect("build chain");

    for router in chain.routers() {
        world.net.set_protocol(router, Box::new(LinkState::new()));
    }
    world.net.add_echo_server(chain.r, ECHO_PORT);
    let client = world.net.add_echo_client(
        chain.t,
        chain.r_addr,
        ECHO_PORT,
        1024,
        SimTime::from_secs(1),
        5,
    );
    sim.schedule(SimTime::from_secs(2), ProbeSend { client });

    world.net.start_protocols(&mut sim);
    sim.run_until(SimTime::from_secs(20), &mut world);

    let c = world.net.client(client);
    assert_eq!(c.sent, 5);
    assert_eq!(c.received, 5);
    let seqs: Vec<u32> = c.rtts.iter().map(|&(seq, _)| seq).collect();
    assert_eq!(seqs, vec![0, 1, 2, 3, 4]);
    // 往返时延下界：8 段单向传播时延
    for &(_, rtt) in &c.rtts {
        assert!(rtt >= SimTime::from_millis(2 * 2 + 10 * 2 + 50 * 2 + 5 * 2));
    }
}

#[test]
fn echo_without_server_counts_delivery_but_no_reply() {
    let mut sim = Simulator::default();
    let mut world = NetWorld::default();
    let chain = build_chain(&mut world.net, &ChainOpts::default()).expect("build chain");

    for router in chain.routers() {
        world.net.set_protocol(router, Box::new(LinkState::new()));
    }
    // 不注册服务端
    let client = world.net.add_echo_client(
        chain.t,
        chain.r_addr,
        ECHO_PORT,
        1024,
        SimTime::from_secs(1),
        3,
    );
    sim.schedule(SimTime::from_secs(2), ProbeSend { client });

    world.net.start_protocols(&mut sim);
    sim.run_until(SimTime::from_secs(10), &mut world);

    let c = world.net.client(client);
    assert_eq!(c.sent, 3);
    assert_eq!(c.received, 0);
    assert_eq!(world.net.stats.delivered_pkts, 3);
}

#[test]
fn scenario_builder_runs_end_to_end() {
    let spec = ScenarioSpec {
        schema_version: 1,
        meta: None,
        topology: ScenarioTopology::Chain,
        protocol: ScenarioProtocol::Rip {
            split_horizon: Some("PoisonReverse".to_string()),
        },
        faults: vec![FaultSpec {
            link: ["T".to_string(), "RouterA".to_string()],
            at_s: 40,
            action: FaultAction::Down,
        }],
        probe: Some(ProbeSpec {
            interval_s: 1,
            count: 100,
            size_bytes: 1024,
            start_s: 2,
        }),
        print_tables_at_s: vec![],
        until_s: 131,
    };

    let mut sim = Simulator::default();
    let mut world = NetWorld::default();
    let run = build_scenario(&spec, &mut world, &mut sim).expect("build scenario");
    assert_eq!(run.routers.len(), 3);
    sim.run_until(run.until, &mut world);

    let c = world.net.client(run.client.expect("client"));
    assert_eq!(c.sent, 100);
    assert!(c.received >= 35 && c.received <= 38, "received {}", c.received);
}

#[test]
fn scenario_builder_rejects_unknown_fault_link() {
    let spec = ScenarioSpec {
        schema_version: 1,
        meta: None,
        topology: ScenarioTopology::Chain,
        protocol: ScenarioProtocol::LinkState,
        faults: vec![FaultSpec {
            link: ["T".to_string(), "RouterC".to_string()],
            at_s: 40,
            action: FaultAction::Down,
        }],
        probe: None,
        print_tables_at_s: vec![],
        until_s: 10,
    };

    let mut sim = Simulator::default();
    let mut world = NetWorld::default();
    assert!(build_scenario(&spec, &mut world, &mut sim).is_err());
}

#[test]
fn ttl_exhaustion_is_counted() {
    // 人为制造两跳环：两台路由器互指静态默认路由
    use crate::net::{Prefix, Route, RouteSource};

    let mut sim = Simulator::default();
    let mut world = NetWorld::default();
    let x = world.net.add_node("X").expect("node");
    let y = world.net.add_node("Y").expect("node");
    let if_x = world.net.add_iface(x, Ipv4Addr::new(10, 0, 0, 1), 24).expect("iface");
    let if_y = world.net.add_iface(y, Ipv4Addr::new(10, 0, 0, 2), 24).expect("iface");
    world
        .net
        .connect(if_x, if_y, SimTime::from_millis(1), 10_000_000)
        .expect("link");
    world.net.table_mut(x).insert(Route {
        dest: Prefix::DEFAULT,
        next_hop: Some(Ipv4Addr::new(10, 0, 0, 2)),
        iface: if_x,
        metric: 1,
        source: RouteSource::Static,
    });
    world.net.table_mut(y).insert(Route {
        dest: Prefix::DEFAULT,
        next_hop: Some(Ipv4Addr::new(10, 0, 0, 1)),
        iface: if_y,
        metric: 1,
        source: RouteSource::Static,
    });

    let client = world.net.add_echo_client(
        x,
        Ipv4Addr::new(192, 168, 1, 1),
        ECHO_PORT,
        64,
        SimTime::from_secs(1),
        1,
    );
    sim.schedule(SimTime::ZERO, ProbeSend { client });
    sim.run_until(SimTime::from_secs(10), &mut world);

    assert_eq!(world.net.stats.dropped_ttl, 1);
    assert_eq!(world.net.stats.delivered_pkts, 0);
    assert_eq!(world.net.client(client).received, 0);
}
