//! 距离向量路由协议（RIP 风格）
//!
//! 周期性向每个未排除的 Up 接口通告全表；收到邻居通告时按
//! Bellman-Ford 规则更新；度量达到无穷（16）视为不可达，触发
//! 计划外（triggered）更新。水平分割策略只影响每个接口的出站
//! 通告内容，从不改变表中存储的内容。

use super::{ProtoTimer, ProtocolTimer, RoutingProtocol};
use crate::net::{IfaceId, Network, NodeId, Packet, PacketKind, Prefix, RipEntry, Route, RouteSource};
use crate::sim::{EventHandle, SimTime, Simulator};
use std::collections::{BTreeMap, BTreeSet};
use std::net::Ipv4Addr;
use std::str::FromStr;
use tracing::{debug, trace};

/// 不可达度量阈值。
pub const INFINITY_METRIC: u32 = 16;

const UPDATE_INTERVAL: SimTime = SimTime(30_000_000_000);
const ROUTE_TIMEOUT: SimTime = SimTime(180_000_000_000);
const GC_HOLD: SimTime = SimTime(120_000_000_000);
/// 触发更新的小延迟：同一事件里的多处变化合并成一次通告。
const TRIGGERED_DELAY: SimTime = SimTime(100_000_000);
/// 启动错峰，按节点序号拉开首轮周期通告。
const START_STAGGER: SimTime = SimTime(100_000_000);

/// 水平分割策略。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SplitHorizon {
    NoSplitHorizon,
    SplitHorizon,
    #[default]
    PoisonReverse,
}

impl FromStr for SplitHorizon {
    type Err = crate::net::NetError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "NoSplitHorizon" => Ok(SplitHorizon::NoSplitHorizon),
            "SplitHorizon" => Ok(SplitHorizon::SplitHorizon),
            "PoisonReverse" => Ok(SplitHorizon::PoisonReverse),
            other => Err(crate::net::NetError::UnknownSplitHorizon(other.to_string())),
        }
    }
}

/// 每条路由的生存状态。缺席即 NoRoute；GC 结束即 Expired（从表中清除）。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RouteState {
    Active,
    GarbageCollecting,
}

#[derive(Debug)]
struct RipRoute {
    metric: u32,
    next_hop: Option<Ipv4Addr>,
    iface: IfaceId,
    state: RouteState,
    expire: Option<EventHandle>,
    flush: Option<EventHandle>,
}

/// 距离向量协议实例（每路由器一个）。
pub struct Rip {
    policy: SplitHorizon,
    /// 排除的接口：既不发送也不接受通告（纯主机网段）。
    excluded: BTreeSet<IfaceId>,
    routes: BTreeMap<Prefix, RipRoute>,
    triggered_pending: bool,
}

impl Rip {
    pub fn new(policy: SplitHorizon) -> Self {
        Self {
            policy,
            excluded: BTreeSet::new(),
            routes: BTreeMap::new(),
            triggered_pending: false,
        }
    }

    pub fn exclude_iface(&mut self, iface: IfaceId) {
        self.excluded.insert(iface);
    }

    fn install_connected(
        &mut self,
        node: NodeId,
        iface: IfaceId,
        sim: &mut Simulator,
        net: &mut Network,
    ) {
        let prefix = net.iface(iface).prefix;
        if let Some(old) = self.routes.get_mut(&prefix) {
            if let Some(h) = old.expire.take() {
                sim.cancel(h);
            }
            if let Some(h) = old.flush.take() {
                sim.cancel(h);
            }
        }
        self.routes.insert(
            prefix,
            RipRoute {
                metric: 1,
                next_hop: None,
                iface,
                state: RouteState::Active,
                expire: None,
                flush: None,
            },
        );
        net.table_mut(node).remove(prefix, RouteSource::Rip);
        net.table_mut(node).insert(Route {
            dest: prefix,
            next_hop: None,
            iface,
            metric: 1,
            source: RouteSource::Rip,
        });
    }

    /// 路由转入不可达：度量置无穷、撤出转发表、进入垃圾回收。
    fn make_unreachable(
        &mut self,
        node: NodeId,
        prefix: Prefix,
        sim: &mut Simulator,
        net: &mut Network,
    ) -> bool {
        let Some(r) = self.routes.get_mut(&prefix) else {
            return false;
        };
        if r.state == RouteState::GarbageCollecting {
            return false;
        }
        r.metric = INFINITY_METRIC;
        r.state = RouteState::GarbageCollecting;
        if let Some(h) = r.expire.take() {
            sim.cancel(h);
        }
        r.flush = Some(sim.schedule_in(
            GC_HOLD,
            ProtocolTimer {
                node,
                timer: ProtoTimer::RipRouteFlush(prefix),
            },
        ));
        net.table_mut(node).remove(prefix, RouteSource::Rip);
        debug!(node = node.0, %prefix, "路由不可达，进入垃圾回收");
        true
    }

    fn schedule_triggered(&mut self, node: NodeId, sim: &mut Simulator) {
        if !self.triggered_pending {
            self.triggered_pending = true;
            sim.schedule_in(
                TRIGGERED_DELAY,
                ProtocolTimer {
                    node,
                    timer: ProtoTimer::RipTriggered,
                },
            );
        }
    }

    /// 依据水平分割策略构造某个出接口的通告内容。
    fn build_entries(&self, out: IfaceId) -> Vec<RipEntry> {
        self.routes
            .iter()
            .filter_map(|(prefix, r)| {
                let learned_here = r.iface == out;
                let metric = match self.policy {
                    SplitHorizon::NoSplitHorizon => r.metric,
                    SplitHorizon::SplitHorizon if learned_here => return None,
                    SplitHorizon::SplitHorizon => r.metric,
                    SplitHorizon::PoisonReverse if learned_here => INFINITY_METRIC,
                    SplitHorizon::PoisonReverse => r.metric,
                };
                Some(RipEntry {
                    prefix: *prefix,
                    metric,
                })
            })
            .collect()
    }

    /// 向所有未排除的 Up 接口发出通告。
    fn advertise(&mut self, node: NodeId, sim: &mut Simulator, net: &mut Network) {
        let ifaces = net.node(node).ifaces.clone();
        for iface in ifaces {
            if self.excluded.contains(&iface) || !net.iface(iface).up {
                continue;
            }
            let entries = self.build_entries(iface);
            if entries.is_empty() {
                continue;
            }
            // RIP 头 + 每条 20 字节，近似报文体积
            let size = 32 + 20 * entries.len() as u32;
            let src = net.addr_of(iface);
            let mut pkt: Packet =
                net.make_packet(src, Ipv4Addr::BROADCAST, size, PacketKind::Rip(entries));
            pkt.ttl = 1;
            net.transmit_broadcast(iface, pkt, sim);
        }
    }

    /// 处理一条邻居通告；返回是否有路由变化。
    fn process_update(
        &mut self,
        node: NodeId,
        iface: IfaceId,
        src: Ipv4Addr,
        entries: &[RipEntry],
        sim: &mut Simulator,
        net: &mut Network,
    ) -> bool {
        let mut changed = false;
        for e in entries {
            let cost = e.metric.saturating_add(1).min(INFINITY_METRIC);
            let cur = self
                .routes
                .get(&e.prefix)
                .map(|r| (r.next_hop, r.metric, r.state));
            match cur {
                None => {
                    if cost < INFINITY_METRIC {
                        self.install_learned(node, e.prefix, cost, src, iface, sim, net);
                        changed = true;
                    }
                }
                Some((nh, metric, state)) if nh == Some(src) => {
                    // 来自当前下一跳：刷新，即使度量不变或变差
                    if cost >= INFINITY_METRIC {
                        if self.make_unreachable(node, e.prefix, sim, net) {
                            changed = true;
                        }
                    } else {
                        self.install_learned(node, e.prefix, cost, src, iface, sim, net);
                        if (metric, state) != (cost, RouteState::Active) {
                            changed = true;
                        }
                    }
                }
                Some((_, metric, _)) => {
                    if cost < metric {
                        self.install_learned(node, e.prefix, cost, src, iface, sim, net);
                        changed = true;
                    }
                }
            }
        }
        changed
    }

    /// 安装/刷新一条学来的路由并重置其老化定时器。
    #[allow(clippy::too_many_arguments)]
    fn install_learned(
        &mut self,
        node: NodeId,
        prefix: Prefix,
        metric: u32,
        next_hop: Ipv4Addr,
        iface: IfaceId,
        sim: &mut Simulator,
        net: &mut Network,
    ) {
        if let Some(old) = self.routes.get_mut(&prefix) {
            if let Some(h) = old.expire.take() {
                sim.cancel(h);
            }
            if let Some(h) = old.flush.take() {
                sim.cancel(h);
            }
        }
        let expire = sim.schedule_in(
            ROUTE_TIMEOUT,
            ProtocolTimer {
                node,
                timer: ProtoTimer::RipRouteExpire(prefix),
            },
        );
        self.routes.insert(
            prefix,
            RipRoute {
                metric,
                next_hop: Some(next_hop),
                iface,
                state: RouteState::Active,
                expire: Some(expire),
                flush: None,
            },
        );
        let table = net.table_mut(node);
        table.remove(prefix, RouteSource::Rip);
        table.insert(Route {
            dest: prefix,
            next_hop: Some(next_hop),
            iface,
            metric,
            source: RouteSource::Rip,
        });
        trace!(node = node.0, %prefix, metric, %next_hop, "安装距离向量路由");
    }
}

impl RoutingProtocol for Rip {
    fn start(&mut self, node: NodeId, sim: &mut Simulator, net: &mut Network) {
        let ifaces = net.node(node).ifaces.clone();
        for iface in ifaces {
            if net.iface(iface).up {
                self.install_connected(node, iface, sim, net);
            }
        }
        let stagger = SimTime(START_STAGGER.0.saturating_mul(node.0 as u64 + 1));
        sim.schedule_in(
            stagger,
            ProtocolTimer {
                node,
                timer: ProtoTimer::RipPeriodic,
            },
        );
    }

    fn on_topology_change(
        &mut self,
        node: NodeId,
        iface: IfaceId,
        up: bool,
        sim: &mut Simulator,
        net: &mut Network,
    ) {
        if up {
            self.install_connected(node, iface, sim, net);
            self.schedule_triggered(node, sim);
            return;
        }
        // 接口 Down：所有经由该接口的路由立刻不可达
        let dead: Vec<Prefix> = self
            .routes
            .iter()
            .filter(|(_, r)| r.iface == iface)
            .map(|(p, _)| *p)
            .collect();
        let mut changed = false;
        for prefix in dead {
            if self.make_unreachable(node, prefix, sim, net) {
                changed = true;
            }
        }
        if changed {
            self.schedule_triggered(node, sim);
        }
    }

    fn on_timer(&mut self, node: NodeId, timer: ProtoTimer, sim: &mut Simulator, net: &mut Network) {
        match timer {
            ProtoTimer::RipPeriodic => {
                self.advertise(node, sim, net);
                sim.schedule_in(
                    UPDATE_INTERVAL,
                    ProtocolTimer {
                        node,
                        timer: ProtoTimer::RipPeriodic,
                    },
                );
            }
            ProtoTimer::RipTriggered => {
                if self.triggered_pending {
                    self.triggered_pending = false;
                    self.advertise(node, sim, net);
                }
            }
            ProtoTimer::RipRouteExpire(prefix) => {
                // 老化超时：未被刷新的路由转入不可达
                if self.make_unreachable(node, prefix, sim, net) {
                    self.schedule_triggered(node, sim);
                }
            }
            ProtoTimer::RipRouteFlush(prefix) => {
                // 只清除仍在垃圾回收中的路由；已复活的路由不受影响
                if self
                    .routes
                    .get(&prefix)
                    .is_some_and(|r| r.state == RouteState::GarbageCollecting)
                {
                    self.routes.remove(&prefix);
                }
            }
            _ => {}
        }
    }

    fn on_packet(
        &mut self,
        node: NodeId,
        iface: IfaceId,
        src: Ipv4Addr,
        kind: PacketKind,
        sim: &mut Simulator,
        net: &mut Network,
    ) {
        let PacketKind::Rip(entries) = kind else {
            // 非本协议报文：本地丢弃
            return;
        };
        if self.excluded.contains(&iface) {
            return;
        }
        if self.process_update(node, iface, src, &entries, sim, net) {
            self.schedule_triggered(node, sim);
        }
    }

    fn installed_routes(&self) -> Vec<Route> {
        self.routes
            .iter()
            .filter(|(_, r)| r.state == RouteState::Active)
            .map(|(prefix, r)| Route {
                dest: *prefix,
                next_hop: r.next_hop,
                iface: r.iface,
                metric: r.metric,
                source: RouteSource::Rip,
            })
            .collect()
    }
}
