//! 链式拓扑构建
//!
//! T - A - B - C - R：两端主机、三台路由器，每段链路一个 /24 网段。
//! 主机不跑路由协议，持有指向相邻路由器的静态默认路由。

use crate::net::{IfaceId, LinkId, NetError, Network, NodeId, Prefix, Route, RouteSource};
use crate::sim::SimTime;
use std::net::Ipv4Addr;

/// 链式拓扑配置选项（按链路顺序 T-A, A-B, B-C, C-R）。
#[derive(Debug, Clone)]
pub struct ChainOpts {
    pub rates_bps: [u64; 4],
    pub delays: [SimTime; 4],
}

impl Default for ChainOpts {
    fn default() -> Self {
        Self {
            rates_bps: [10_000_000, 5_000_000, 50_000_000, 5_000_000],
            delays: [
                SimTime::from_millis(2),
                SimTime::from_millis(10),
                SimTime::from_millis(50),
                SimTime::from_millis(5),
            ],
        }
    }
}

/// 构建好的链式拓扑。
#[derive(Debug)]
pub struct Chain {
    pub t: NodeId,
    pub a: NodeId,
    pub b: NodeId,
    pub c: NodeId,
    pub r: NodeId,
    /// 链路 T-A, A-B, B-C, C-R。
    pub links: [LinkId; 4],
    /// A 朝向主机 T 的接口（RIP 排除用）。
    pub a_host_iface: IfaceId,
    /// C 朝向主机 R 的接口（RIP 排除用）。
    pub c_host_iface: IfaceId,
    pub t_addr: Ipv4Addr,
    pub r_addr: Ipv4Addr,
}

impl Chain {
    pub fn routers(&self) -> [NodeId; 3] {
        [self.a, self.b, self.c]
    }
}

/// 构建链式拓扑并安装主机静态默认路由。
pub fn build_chain(net: &mut Network, opts: &ChainOpts) -> Result<Chain, NetError> {
    let t = net.add_node("T")?;
    let a = net.add_node("RouterA")?;
    let b = net.add_node("RouterB")?;
    let c = net.add_node("RouterC")?;
    let r = net.add_node("R")?;

    // 每段链路一个 10.0.k.0/24，左端 .1 右端 .2
    let if_t = net.add_iface(t, Ipv4Addr::new(10, 0, 0, 1), 24)?;
    let if_a0 = net.add_iface(a, Ipv4Addr::new(10, 0, 0, 2), 24)?;
    let if_a1 = net.add_iface(a, Ipv4Addr::new(10, 0, 1, 1), 24)?;
    let if_b0 = net.add_iface(b, Ipv4Addr::new(10, 0, 1, 2), 24)?;
    let if_b1 = net.add_iface(b, Ipv4Addr::new(10, 0, 2, 1), 24)?;
    let if_c0 = net.add_iface(c, Ipv4Addr::new(10, 0, 2, 2), 24)?;
    let if_c1 = net.add_iface(c, Ipv4Addr::new(10, 0, 3, 1), 24)?;
    let if_r = net.add_iface(r, Ipv4Addr::new(10, 0, 3, 2), 24)?;

    let links = [
        net.connect(if_t, if_a0, opts.delays[0], opts.rates_bps[0])?,
        net.connect(if_a1, if_b0, opts.delays[1], opts.rates_bps[1])?,
        net.connect(if_b1, if_c0, opts.delays[2], opts.rates_bps[2])?,
        net.connect(if_c1, if_r, opts.delays[3], opts.rates_bps[3])?,
    ];

    // 主机静态默认路由
    net.table_mut(t).insert(Route {
        dest: Prefix::DEFAULT,
        next_hop: Some(Ipv4Addr::new(10, 0, 0, 2)),
        iface: if_t,
        metric: 1,
        source: RouteSource::Static,
    });
    net.table_mut(r).insert(Route {
        dest: Prefix::DEFAULT,
        next_hop: Some(Ipv4Addr::new(10, 0, 3, 1)),
        iface: if_r,
        metric: 1,
        source: RouteSource::Static,
    });

    // 展示坐标，与仿真行为无关
    for (i, n) in [t, a, b, c, r].into_iter().enumerate() {
        net.set_position(n, 10.0 + 20.0 * i as f64, 50.0);
    }

    Ok(Chain {
        t,
        a,
        b,
        c,
        r,
        links,
        a_host_iface: if_a0,
        c_host_iface: if_c1,
        t_addr: Ipv4Addr::new(10, 0, 0, 1),
        r_addr: Ipv4Addr::new(10, 0, 3, 2),
    })
}
