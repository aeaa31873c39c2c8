//! 拓扑构建模块
//!
//! 场景拓扑构建函数，以及把声明式场景文件落地为可运行仿真的装配逻辑。

mod chain;
mod diamond;

pub use chain::{Chain, ChainOpts, build_chain};
pub use diamond::{Diamond, build_diamond};

use crate::app::ProbeSend;
use crate::net::{
    ClientId, DumpRoutes, NetError, NetWorld, NodeId, schedule_link_down, schedule_link_up,
};
use crate::proto::{LinkState, Rip, SplitHorizon};
use crate::sim::{FaultAction, ScenarioProtocol, ScenarioSpec, ScenarioTopology, SimTime, Simulator};
use std::net::Ipv4Addr;

/// 回显服务端端口（well-known echo）。
pub const ECHO_PORT: u16 = 9;

/// 装配完成的场景。
#[derive(Debug)]
pub struct ScenarioRun {
    pub routers: Vec<NodeId>,
    pub client: Option<ClientId>,
    pub until: SimTime,
}

/// 把场景描述落地：建拓扑、挂协议、注册应用、调度故障与打印。
pub fn build_scenario(
    spec: &ScenarioSpec,
    world: &mut NetWorld,
    sim: &mut Simulator,
) -> Result<ScenarioRun, NetError> {
    let net = &mut world.net;

    // 拓扑与端点
    let (routers, t, r, r_addr, host_ifaces): (Vec<NodeId>, NodeId, NodeId, Ipv4Addr, Vec<_>) =
        match spec.topology {
            ScenarioTopology::Chain => {
                let chain = build_chain(net, &ChainOpts::default())?;
                (
                    chain.routers().to_vec(),
                    chain.t,
                    chain.r,
                    chain.r_addr,
                    vec![
                        (chain.a, chain.a_host_iface),
                        (chain.c, chain.c_host_iface),
                    ],
                )
            }
            ScenarioTopology::Diamond => {
                let diamond = build_diamond(net)?;
                (
                    diamond.routers().to_vec(),
                    diamond.t,
                    diamond.r,
                    diamond.r_addr,
                    Vec::new(),
                )
            }
        };

    // 路由协议
    match &spec.protocol {
        ScenarioProtocol::Rip { split_horizon } => {
            let policy: SplitHorizon = match split_horizon {
                Some(s) => s.parse()?,
                None => SplitHorizon::default(),
            };
            for &router in &routers {
                let mut rip = Rip::new(policy);
                for &(owner, iface) in &host_ifaces {
                    if owner == router {
                        rip.exclude_iface(iface);
                    }
                }
                net.set_protocol(router, Box::new(rip));
            }
        }
        ScenarioProtocol::LinkState => {
            for &router in &routers {
                net.set_protocol(router, Box::new(LinkState::new()));
            }
        }
    }

    // 探测流量 T -> R
    let client = spec.probe.as_ref().map(|p| {
        net.add_echo_server(r, ECHO_PORT);
        let id = net.add_echo_client(
            t,
            r_addr,
            ECHO_PORT,
            p.size_bytes,
            SimTime::from_secs(p.interval_s),
            p.count,
        );
        sim.schedule(SimTime::from_secs(p.start_s), ProbeSend { client: id });
        id
    });

    // 故障注入
    for f in &spec.faults {
        let a = net
            .find_node(&f.link[0])
            .ok_or_else(|| NetError::UnknownNode(f.link[0].clone()))?;
        let b = net
            .find_node(&f.link[1])
            .ok_or_else(|| NetError::UnknownNode(f.link[1].clone()))?;
        let link = net
            .link_between(a, b)
            .ok_or_else(|| NetError::NoSuchLink(f.link[0].clone(), f.link[1].clone()))?;
        let at = SimTime::from_secs(f.at_s);
        match f.action {
            FaultAction::Down => schedule_link_down(sim, link, at),
            FaultAction::Up => schedule_link_up(sim, link, at),
        };
    }

    // 路由表打印
    for &at_s in &spec.print_tables_at_s {
        for &router in &routers {
            sim.schedule(SimTime::from_secs(at_s), DumpRoutes { node: router });
        }
    }

    net.start_protocols(sim);

    Ok(ScenarioRun {
        routers,
        client,
        until: SimTime::from_secs(spec.until_s),
    })
}
