//! 菱形拓扑构建
//!
//! T-{A,B}，A-B，{A,B}-{C,D}，{C,D}-R：双路径冗余，单条链路失效后
//! 仍有备用路径可走。链路速率与时延取自原型场景的参数。

use crate::net::{LinkId, NetError, Network, NodeId, Prefix, Route, RouteSource};
use crate::sim::SimTime;
use std::net::Ipv4Addr;

/// 构建好的菱形拓扑。
#[derive(Debug)]
pub struct Diamond {
    pub t: NodeId,
    pub r: NodeId,
    pub a: NodeId,
    pub b: NodeId,
    pub c: NodeId,
    pub d: NodeId,
    pub l_ta: LinkId,
    pub l_tb: LinkId,
    pub l_ac: LinkId,
    pub l_ad: LinkId,
    pub l_ab: LinkId,
    pub l_bc: LinkId,
    pub l_bd: LinkId,
    pub l_cr: LinkId,
    pub l_dr: LinkId,
    pub t_addr: Ipv4Addr,
    pub r_addr: Ipv4Addr,
}

impl Diamond {
    pub fn routers(&self) -> [NodeId; 4] {
        [self.a, self.b, self.c, self.d]
    }
}

/// 构建菱形拓扑并安装主机静态默认路由。
pub fn build_diamond(net: &mut Network) -> Result<Diamond, NetError> {
    let t = net.add_node("T")?;
    let a = net.add_node("RouterA")?;
    let b = net.add_node("RouterB")?;
    let c = net.add_node("RouterC")?;
    let d = net.add_node("RouterD")?;
    let r = net.add_node("R")?;

    let mbps = |m: u64| m.saturating_mul(1_000_000);
    let ms = SimTime::from_millis;

    // 网段 10.0.k.0/24，k 按链路编号
    let if_t0 = net.add_iface(t, Ipv4Addr::new(10, 0, 0, 1), 24)?;
    let if_a0 = net.add_iface(a, Ipv4Addr::new(10, 0, 0, 2), 24)?;
    let if_t1 = net.add_iface(t, Ipv4Addr::new(10, 0, 1, 1), 24)?;
    let if_b0 = net.add_iface(b, Ipv4Addr::new(10, 0, 1, 2), 24)?;
    let if_a1 = net.add_iface(a, Ipv4Addr::new(10, 0, 2, 1), 24)?;
    let if_c0 = net.add_iface(c, Ipv4Addr::new(10, 0, 2, 2), 24)?;
    let if_a2 = net.add_iface(a, Ipv4Addr::new(10, 0, 3, 1), 24)?;
    let if_d0 = net.add_iface(d, Ipv4Addr::new(10, 0, 3, 2), 24)?;
    let if_a3 = net.add_iface(a, Ipv4Addr::new(10, 0, 4, 1), 24)?;
    let if_b1 = net.add_iface(b, Ipv4Addr::new(10, 0, 4, 2), 24)?;
    let if_b2 = net.add_iface(b, Ipv4Addr::new(10, 0, 5, 1), 24)?;
    let if_c1 = net.add_iface(c, Ipv4Addr::new(10, 0, 5, 2), 24)?;
    let if_b3 = net.add_iface(b, Ipv4Addr::new(10, 0, 6, 1), 24)?;
    let if_d1 = net.add_iface(d, Ipv4Addr::new(10, 0, 6, 2), 24)?;
    let if_c2 = net.add_iface(c, Ipv4Addr::new(10, 0, 7, 1), 24)?;
    let if_r0 = net.add_iface(r, Ipv4Addr::new(10, 0, 7, 2), 24)?;
    let if_d2 = net.add_iface(d, Ipv4Addr::new(10, 0, 8, 1), 24)?;
    let if_r1 = net.add_iface(r, Ipv4Addr::new(10, 0, 8, 2), 24)?;

    let l_ta = net.connect(if_t0, if_a0, ms(2), mbps(10))?;
    let l_tb = net.connect(if_t1, if_b0, ms(10), mbps(5))?;
    let l_ac = net.connect(if_a1, if_c0, ms(50), mbps(50))?;
    let l_ad = net.connect(if_a2, if_d0, ms(5), mbps(5))?;
    let l_ab = net.connect(if_a3, if_b1, ms(2), mbps(10))?;
    let l_bc = net.connect(if_b2, if_c1, ms(10), mbps(5))?;
    let l_bd = net.connect(if_b3, if_d1, ms(50), mbps(50))?;
    let l_cr = net.connect(if_c2, if_r0, ms(10), mbps(5))?;
    let l_dr = net.connect(if_d2, if_r1, ms(2), mbps(10))?;

    // 主机静态默认路由：T 走 A，R 走 D
    net.table_mut(t).insert(Route {
        dest: Prefix::DEFAULT,
        next_hop: Some(Ipv4Addr::new(10, 0, 0, 2)),
        iface: if_t0,
        metric: 1,
        source: RouteSource::Static,
    });
    net.table_mut(r).insert(Route {
        dest: Prefix::DEFAULT,
        next_hop: Some(Ipv4Addr::new(10, 0, 8, 1)),
        iface: if_r1,
        metric: 1,
        source: RouteSource::Static,
    });

    net.set_position(t, 10.0, 50.0);
    net.set_position(a, 35.0, 30.0);
    net.set_position(b, 35.0, 70.0);
    net.set_position(c, 65.0, 30.0);
    net.set_position(d, 65.0, 70.0);
    net.set_position(r, 90.0, 50.0);

    Ok(Diamond {
        t,
        r,
        a,
        b,
        c,
        d,
        l_ta,
        l_tb,
        l_ac,
        l_ad,
        l_ab,
        l_bc,
        l_bd,
        l_cr,
        l_dr,
        t_addr: Ipv4Addr::new(10, 0, 0, 1),
        r_addr: Ipv4Addr::new(10, 0, 8, 2),
    })
}
