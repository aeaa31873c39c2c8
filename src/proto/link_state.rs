//! 链路状态路由协议（OLSR 风格）
//!
//! 两个子协议叠加在周期定时器上：邻居发现（hello）与拓扑洪泛（LSA）。
//! 链路状态数据库一有变化就从头重算最短路径树并整表覆盖本协议的路由，
//! 以换取对距离向量瞬态环路的免疫。
//!
//! 洪泛去重以 (originator, seq) 对照数据库中的最高序列号；去重记录
//! 随 LSA 条目一起在保持时间到期后退役，不单独留存。

use super::{ProtoTimer, ProtocolTimer, RoutingProtocol};
use crate::net::{IfaceId, LsaBody, Network, NodeId, Packet, PacketKind, Prefix, Route, RouteSource};
use crate::sim::{SimTime, Simulator};
use std::collections::{BTreeMap, BTreeSet, VecDeque};
use std::net::Ipv4Addr;
use tracing::{debug, trace};

const HELLO_INTERVAL: SimTime = SimTime(2_000_000_000);
const FLOOD_INTERVAL: SimTime = SimTime(5_000_000_000);
const NEIGHBOR_HOLD: SimTime = SimTime(6_000_000_000);
const LSA_HOLD: SimTime = SimTime(15_000_000_000);
const SWEEP_INTERVAL: SimTime = SimTime(1_000_000_000);
const START_STAGGER: SimTime = SimTime(50_000_000);

#[derive(Debug, Clone)]
struct Neighbor {
    addr: Ipv4Addr,
    iface: IfaceId,
    hold_until: SimTime,
}

#[derive(Debug, Clone)]
struct LsaEntry {
    seq: u64,
    neighbors: Vec<NodeId>,
    prefixes: Vec<Prefix>,
    hold_until: SimTime,
}

/// 链路状态协议实例（每路由器一个）。
pub struct LinkState {
    seq: u64,
    neighbors: BTreeMap<NodeId, Neighbor>,
    lsdb: BTreeMap<NodeId, LsaEntry>,
    /// 最近一次整表覆盖安装的路由（检查用）。
    installed: Vec<Route>,
}

impl Default for LinkState {
    fn default() -> Self {
        Self::new()
    }
}

impl LinkState {
    pub fn new() -> Self {
        Self {
            seq: 0,
            neighbors: BTreeMap::new(),
            lsdb: BTreeMap::new(),
            installed: Vec::new(),
        }
    }

    /// 数据库里的邻居数量（测试观察用）。
    pub fn neighbor_count(&self) -> usize {
        self.neighbors.len()
    }

    fn up_prefixes(&self, node: NodeId, net: &Network) -> Vec<Prefix> {
        net.node(node)
            .ifaces
            .iter()
            .filter(|&&i| net.iface(i).up)
            .map(|&i| net.iface(i).prefix)
            .collect()
    }

    fn send_hellos(&self, node: NodeId, sim: &mut Simulator, net: &mut Network) {
        let ifaces = net.node(node).ifaces.clone();
        for iface in ifaces {
            if !net.iface(iface).up || net.iface(iface).link.is_none() {
                continue;
            }
            let src = net.addr_of(iface);
            let mut pkt: Packet = net.make_packet(
                src,
                Ipv4Addr::BROADCAST,
                48,
                PacketKind::Hello { origin: node },
            );
            pkt.ttl = 1;
            net.transmit_broadcast(iface, pkt, sim);
        }
    }

    /// 生成并洪泛一条新的自身 LSA。
    fn originate_lsa(&mut self, node: NodeId, sim: &mut Simulator, net: &mut Network) {
        self.seq += 1;
        let body = LsaBody {
            origin: node,
            seq: self.seq,
            neighbors: self.neighbors.keys().copied().collect(),
            prefixes: self.up_prefixes(node, net),
        };
        self.lsdb.insert(
            node,
            LsaEntry {
                seq: body.seq,
                neighbors: body.neighbors.clone(),
                prefixes: body.prefixes.clone(),
                hold_until: sim.now().saturating_add(LSA_HOLD),
            },
        );
        trace!(node = node.0, seq = body.seq, "生成 LSA");
        self.flood(node, &body, None, sim, net);
    }

    /// 向除 `except` 外的所有 Up 接口转发一条 LSA。
    fn flood(
        &self,
        node: NodeId,
        body: &LsaBody,
        except: Option<IfaceId>,
        sim: &mut Simulator,
        net: &mut Network,
    ) {
        let ifaces = net.node(node).ifaces.clone();
        for iface in ifaces {
            if Some(iface) == except || !net.iface(iface).up || net.iface(iface).link.is_none() {
                continue;
            }
            let size = 64 + 8 * body.neighbors.len() as u32 + 8 * body.prefixes.len() as u32;
            let src = net.addr_of(iface);
            let mut pkt: Packet =
                net.make_packet(src, Ipv4Addr::BROADCAST, size, PacketKind::Lsa(body.clone()));
            pkt.ttl = 1;
            net.transmit_broadcast(iface, pkt, sim);
        }
    }

    /// 从本节点重算最短路径树（跳数作边权）并整表覆盖本协议路由。
    fn recompute(&mut self, node: NodeId, net: &mut Network) {
        // 邻接：一跳邻居直接可达；远端边要求两端互相通告（对称性检查）
        let mut adj: BTreeMap<NodeId, BTreeSet<NodeId>> = BTreeMap::new();
        for n in self.neighbors.keys() {
            adj.entry(node).or_default().insert(*n);
            adj.entry(*n).or_default().insert(node);
        }
        for (&u, e) in &self.lsdb {
            if u == node {
                continue;
            }
            for &v in &e.neighbors {
                if v == node {
                    continue;
                }
                let mutual = self.lsdb.get(&v).is_some_and(|ve| ve.neighbors.contains(&u));
                if mutual {
                    adj.entry(u).or_default().insert(v);
                    adj.entry(v).or_default().insert(u);
                }
            }
        }

        // BFS：记录跳数与第一跳
        let mut dist: BTreeMap<NodeId, u32> = BTreeMap::new();
        let mut first_hop: BTreeMap<NodeId, NodeId> = BTreeMap::new();
        let mut queue = VecDeque::new();
        dist.insert(node, 0);
        queue.push_back(node);
        while let Some(u) = queue.pop_front() {
            let du = dist[&u];
            let Some(nbrs) = adj.get(&u) else { continue };
            for &v in nbrs {
                if dist.contains_key(&v) {
                    continue;
                }
                dist.insert(v, du + 1);
                let fh = if u == node { v } else { first_hop[&u] };
                first_hop.insert(v, fh);
                queue.push_back(v);
            }
        }

        // 直连网段优先；远端网段按最短跳数挑第一跳
        let mut best: BTreeMap<Prefix, Route> = BTreeMap::new();
        let own_ifaces = net.node(node).ifaces.clone();
        for iface in own_ifaces {
            if !net.iface(iface).up {
                continue;
            }
            let prefix = net.iface(iface).prefix;
            best.insert(
                prefix,
                Route {
                    dest: prefix,
                    next_hop: None,
                    iface,
                    metric: 0,
                    source: RouteSource::LinkState,
                },
            );
        }
        for (&d, entry) in &self.lsdb {
            if d == node {
                continue;
            }
            let Some(&metric) = dist.get(&d) else {
                continue;
            };
            let Some(&fh) = first_hop.get(&d) else {
                continue;
            };
            let Some(nbr) = self.neighbors.get(&fh) else {
                // 第一跳邻居已丢失：等下一轮 hello/清扫纠正
                continue;
            };
            for &prefix in &entry.prefixes {
                let replace = best.get(&prefix).is_none_or(|b| metric < b.metric);
                if replace {
                    best.insert(
                        prefix,
                        Route {
                            dest: prefix,
                            next_hop: Some(nbr.addr),
                            iface: nbr.iface,
                            metric,
                            source: RouteSource::LinkState,
                        },
                    );
                }
            }
        }

        let routes: Vec<Route> = best.into_values().collect();
        let table = net.table_mut(node);
        table.remove_source(RouteSource::LinkState);
        for r in &routes {
            table.insert(r.clone());
        }
        debug!(node = node.0, routes = routes.len(), "最短路径树重算完成");
        self.installed = routes;
    }
}

impl RoutingProtocol for LinkState {
    fn start(&mut self, node: NodeId, sim: &mut Simulator, net: &mut Network) {
        self.recompute(node, net);
        let stagger = SimTime(START_STAGGER.0.saturating_mul(node.0 as u64 + 1));
        sim.schedule_in(
            stagger,
            ProtocolTimer {
                node,
                timer: ProtoTimer::Hello,
            },
        );
        sim.schedule_in(
            stagger.saturating_add(SimTime(500_000_000)),
            ProtocolTimer {
                node,
                timer: ProtoTimer::LsaFlood,
            },
        );
        sim.schedule_in(
            SWEEP_INTERVAL,
            ProtocolTimer {
                node,
                timer: ProtoTimer::LsExpire,
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
        if !up {
            // 该接口上的邻居立即失效，不等保持定时器
            self.neighbors.retain(|_, n| n.iface != iface);
        }
        self.recompute(node, net);
        self.originate_lsa(node, sim, net);
    }

    fn on_timer(&mut self, node: NodeId, timer: ProtoTimer, sim: &mut Simulator, net: &mut Network) {
        match timer {
            ProtoTimer::Hello => {
                self.send_hellos(node, sim, net);
                sim.schedule_in(
                    HELLO_INTERVAL,
                    ProtocolTimer {
                        node,
                        timer: ProtoTimer::Hello,
                    },
                );
            }
            ProtoTimer::LsaFlood => {
                self.originate_lsa(node, sim, net);
                sim.schedule_in(
                    FLOOD_INTERVAL,
                    ProtocolTimer {
                        node,
                        timer: ProtoTimer::LsaFlood,
                    },
                );
            }
            ProtoTimer::LsExpire => {
                let now = sim.now();
                let before_nbrs = self.neighbors.len();
                self.neighbors.retain(|_, n| n.hold_until > now);
                let lost_neighbor = self.neighbors.len() != before_nbrs;

                let before_lsas = self.lsdb.len();
                self.lsdb
                    .retain(|&origin, e| origin == node || e.hold_until > now);
                let lost_lsa = self.lsdb.len() != before_lsas;

                if lost_neighbor || lost_lsa {
                    debug!(node = node.0, lost_neighbor, lost_lsa, "老化清扫发现失效条目");
                    self.recompute(node, net);
                }
                if lost_neighbor {
                    self.originate_lsa(node, sim, net);
                }
                sim.schedule_in(
                    SWEEP_INTERVAL,
                    ProtocolTimer {
                        node,
                        timer: ProtoTimer::LsExpire,
                    },
                );
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
        match kind {
            PacketKind::Hello { origin } => {
                if origin == node {
                    return;
                }
                let is_new = !self.neighbors.contains_key(&origin);
                self.neighbors.insert(
                    origin,
                    Neighbor {
                        addr: src,
                        iface,
                        hold_until: sim.now().saturating_add(NEIGHBOR_HOLD),
                    },
                );
                if is_new {
                    trace!(node = node.0, origin = origin.0, "发现新邻居");
                    self.recompute(node, net);
                    self.originate_lsa(node, sim, net);
                }
            }
            PacketKind::Lsa(body) => {
                if body.origin == node {
                    // 自己的 LSA 被洪回：忽略
                    return;
                }
                let stale = self
                    .lsdb
                    .get(&body.origin)
                    .is_some_and(|e| e.seq >= body.seq);
                if stale {
                    // 重复或过期序列号：丢弃，不再转发
                    return;
                }
                self.lsdb.insert(
                    body.origin,
                    LsaEntry {
                        seq: body.seq,
                        neighbors: body.neighbors.clone(),
                        prefixes: body.prefixes.clone(),
                        hold_until: sim.now().saturating_add(LSA_HOLD),
                    },
                );
                self.recompute(node, net);
                self.flood(node, &body, Some(iface), sim, net);
            }
            _ => {
                // 非本协议报文：本地丢弃
            }
        }
    }

    fn installed_routes(&self) -> Vec<Route> {
        self.installed.clone()
    }
}
