//! 网络拓扑管理
//!
//! 定义网络拓扑结构：节点、接口、链路，以及数据包的发送、转发与投递。
//! 配置错误（重名节点、重复地址、重复连线）在构造期快速失败；
//! 转发失败（无路由、TTL 耗尽、接口 Down）静默丢弃并计数。

use std::net::Ipv4Addr;

use super::addr::Prefix;
use super::deliver_packet::DeliverPacket;
use super::error::NetError;
use super::iface::Iface;
use super::id::{IfaceId, LinkId, NodeId};
use super::link::Link;
use super::node::Node;
use super::packet::{DEFAULT_TTL, Packet, PacketKind};
use super::route::RoutingTable;
use super::stats::Stats;
use crate::app::AppRegistry;
use crate::proto::{ProtoTimer, RoutingProtocol};
use crate::sim::{SimTime, Simulator};
use tracing::{debug, trace, warn};

/// 网络拓扑
#[derive(Default)]
pub struct Network {
    nodes: Vec<Node>,
    ifaces: Vec<Iface>,
    links: Vec<Link>,
    protocols: Vec<Option<Box<dyn RoutingProtocol>>>,
    pub(crate) apps: AppRegistry,
    next_pkt_id: u64,
    pub stats: Stats,
}

impl Network {
    /// 添加节点。节点名用于诊断与场景文件引用，必须唯一。
    pub fn add_node(&mut self, name: impl Into<String>) -> Result<NodeId, NetError> {
        let name = name.into();
        if self.nodes.iter().any(|n| n.name == name) {
            return Err(NetError::DuplicateNodeName(name));
        }
        let id = NodeId(self.nodes.len());
        self.nodes.push(Node::new(id, name));
        self.protocols.push(None);
        Ok(id)
    }

    /// 为节点添加接口并分配地址。
    pub fn add_iface(
        &mut self,
        node: NodeId,
        addr: Ipv4Addr,
        prefix_len: u8,
    ) -> Result<IfaceId, NetError> {
        let prefix = Prefix::new(addr, prefix_len)?;
        if self.ifaces.iter().any(|i| i.addr == addr) {
            return Err(NetError::DuplicateAddress(addr));
        }
        let id = IfaceId(self.ifaces.len());
        self.ifaces.push(Iface::new(id, node, addr, prefix));
        self.nodes[node.0].ifaces.push(id);
        Ok(id)
    }

    /// 连接两个接口（点对点链路）。
    pub fn connect(
        &mut self,
        a: IfaceId,
        b: IfaceId,
        latency: SimTime,
        bandwidth_bps: u64,
    ) -> Result<LinkId, NetError> {
        self.connect_many(vec![a, b], latency, bandwidth_bps)
    }

    /// 连接一组接口（共享介质）。每个接口至多挂一条链路。
    pub fn connect_many(
        &mut self,
        endpoints: Vec<IfaceId>,
        latency: SimTime,
        bandwidth_bps: u64,
    ) -> Result<LinkId, NetError> {
        if endpoints.len() < 2 {
            return Err(NetError::TooFewEndpoints);
        }
        for &ep in &endpoints {
            if self.ifaces[ep.0].link.is_some() {
                return Err(NetError::AlreadyConnected(ep));
            }
        }
        let id = LinkId(self.links.len());
        for &ep in &endpoints {
            self.ifaces[ep.0].link = Some(id);
        }
        self.links.push(Link::new(id, endpoints, latency, bandwidth_bps));
        Ok(id)
    }

    pub fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id.0]
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn find_node(&self, name: &str) -> Option<NodeId> {
        self.nodes.iter().find(|n| n.name == name).map(|n| n.id)
    }

    pub fn iface(&self, id: IfaceId) -> &Iface {
        &self.ifaces[id.0]
    }

    pub fn link(&self, id: LinkId) -> &Link {
        &self.links[id.0]
    }

    pub fn addr_of(&self, iface: IfaceId) -> Ipv4Addr {
        self.ifaces[iface.0].addr
    }

    /// 按地址反查接口。地址唯一，至多一个结果。
    pub fn iface_of_addr(&self, addr: Ipv4Addr) -> Option<IfaceId> {
        self.ifaces.iter().find(|i| i.addr == addr).map(|i| i.id)
    }

    pub fn table(&self, node: NodeId) -> &RoutingTable {
        &self.nodes[node.0].table
    }

    pub fn table_mut(&mut self, node: NodeId) -> &mut RoutingTable {
        &mut self.nodes[node.0].table
    }

    /// 查找连接两个节点的链路。
    pub fn link_between(&self, a: NodeId, b: NodeId) -> Option<LinkId> {
        self.links
            .iter()
            .find(|l| {
                let owners: Vec<NodeId> =
                    l.endpoints.iter().map(|&e| self.ifaces[e.0].node).collect();
                owners.contains(&a) && owners.contains(&b)
            })
            .map(|l| l.id)
    }

    /// 设置节点的可视化坐标。纯展示元数据。
    pub fn set_position(&mut self, node: NodeId, x: f64, y: f64) {
        self.nodes[node.0].position = Some((x, y));
    }

    // ---- 路由协议挂接 ----

    pub fn set_protocol(&mut self, node: NodeId, proto: Box<dyn RoutingProtocol>) {
        self.protocols[node.0] = Some(proto);
    }

    pub fn has_protocol(&self, node: NodeId) -> bool {
        self.protocols[node.0].is_some()
    }

    /// 启动所有协议实例：安装直连路由、调度首轮定时器。
    pub fn start_protocols(&mut self, sim: &mut Simulator) {
        for idx in 0..self.protocols.len() {
            if let Some(mut p) = self.protocols[idx].take() {
                p.start(NodeId(idx), sim, self);
                self.protocols[idx] = Some(p);
            }
        }
    }

    /// 查询某节点协议当前安装的路由（检查用）。
    pub fn protocol_routes(&self, node: NodeId) -> Vec<super::route::Route> {
        self.protocols[node.0]
            .as_ref()
            .map(|p| p.installed_routes())
            .unwrap_or_default()
    }

    pub(crate) fn dispatch_timer(&mut self, node: NodeId, timer: ProtoTimer, sim: &mut Simulator) {
        // 暂时把协议取出来，避免 &mut self 与 &mut protocol 的重叠借用。
        if let Some(mut p) = self.protocols[node.0].take() {
            p.on_timer(node, timer, sim, self);
            self.protocols[node.0] = Some(p);
        }
    }

    fn dispatch_packet(
        &mut self,
        node: NodeId,
        iface: IfaceId,
        pkt: Packet,
        sim: &mut Simulator,
    ) {
        if let Some(mut p) = self.protocols[node.0].take() {
            p.on_packet(node, iface, pkt.src, pkt.kind, sim, self);
            self.protocols[node.0] = Some(p);
        } else {
            // 主机收到路由协议报文：本地丢弃，不算异常
            trace!(node = %self.nodes[node.0].name, "无协议实例，丢弃控制报文");
        }
    }

    fn dispatch_topology_change(
        &mut self,
        node: NodeId,
        iface: IfaceId,
        up: bool,
        sim: &mut Simulator,
    ) {
        if let Some(mut p) = self.protocols[node.0].take() {
            p.on_topology_change(node, iface, up, sim, self);
            self.protocols[node.0] = Some(p);
        }
    }

    // ---- 接口状态（故障注入入口） ----

    /// 设置接口状态；幂等。状态变化时通知所属节点的路由协议。
    pub fn set_iface_state(&mut self, iface: IfaceId, up: bool, sim: &mut Simulator) {
        let i = &mut self.ifaces[iface.0];
        if i.up == up {
            return;
        }
        i.up = up;
        let node = i.node;
        debug!(
            node = %self.nodes[node.0].name,
            iface = iface.0,
            up,
            now_s = sim.now().as_secs(),
            "接口状态变化"
        );
        self.dispatch_topology_change(node, iface, up, sim);
    }

    /// 设置链路两端（全部端点）接口状态；幂等。
    pub fn set_link_state(&mut self, link: LinkId, up: bool, sim: &mut Simulator) {
        let endpoints = self.links[link.0].endpoints.clone();
        for ep in endpoints {
            self.set_iface_state(ep, up, sim);
        }
    }

    // ---- 数据包发送与转发 ----

    /// 创建数据包（TTL 取缺省值）。
    pub fn make_packet(
        &mut self,
        src: Ipv4Addr,
        dst: Ipv4Addr,
        size_bytes: u32,
        kind: PacketKind,
    ) -> Packet {
        let id = self.next_pkt_id;
        self.next_pkt_id = self.next_pkt_id.wrapping_add(1);
        Packet {
            id,
            src,
            dst,
            size_bytes,
            ttl: DEFAULT_TTL,
            kind,
        }
    }

    /// 在链路上对一个包计算（开始发送, 到达）时间并推进串行化游标。
    fn link_schedule(&mut self, link: LinkId, bytes: u32, sim: &Simulator) -> SimTime {
        let link = &mut self.links[link.0];
        let start = sim.now().max(link.busy_until);
        let depart = start.saturating_add(link.tx_time(bytes));
        link.busy_until = depart;
        depart.saturating_add(link.latency)
    }

    /// 从接口向链路上所有其他端点广播（协议报文用）。
    pub fn transmit_broadcast(&mut self, from: IfaceId, pkt: Packet, sim: &mut Simulator) {
        if !self.ifaces[from.0].up {
            self.stats.dropped_iface_down += 1;
            return;
        }
        let Some(link_id) = self.ifaces[from.0].link else {
            // 未连线的接口：静默丢弃
            self.stats.dropped_no_route += 1;
            return;
        };
        let arrive = self.link_schedule(link_id, pkt.size_bytes, sim);
        let endpoints = self.links[link_id.0].endpoints.clone();
        for ep in endpoints {
            if ep != from {
                sim.schedule(
                    arrive,
                    DeliverPacket {
                        to: ep,
                        pkt: pkt.clone(),
                    },
                );
            }
        }
    }

    /// 从接口向链路上地址为 `to_addr` 的端点单播。
    pub fn transmit_unicast(
        &mut self,
        from: IfaceId,
        to_addr: Ipv4Addr,
        pkt: Packet,
        sim: &mut Simulator,
    ) {
        if !self.ifaces[from.0].up {
            self.stats.dropped_iface_down += 1;
            return;
        }
        let Some(link_id) = self.ifaces[from.0].link else {
            self.stats.dropped_no_route += 1;
            return;
        };
        let target = self.links[link_id.0]
            .endpoints
            .iter()
            .copied()
            .find(|&ep| ep != from && self.ifaces[ep.0].addr == to_addr);
        let Some(target) = target else {
            // 下一跳地址不在这条链路上
            warn!(pkt_id = pkt.id, %to_addr, "下一跳不可达，丢弃");
            self.stats.dropped_no_route += 1;
            return;
        };
        let arrive = self.link_schedule(link_id, pkt.size_bytes, sim);
        trace!(pkt_id = pkt.id, from = from.0, to = target.0, arrive = ?arrive, "调度投递事件");
        sim.schedule(arrive, DeliverPacket { to: target, pkt });
    }

    /// 节点发出一个自产数据包：查表选出接口与下一跳。
    pub fn send_from(&mut self, node: NodeId, pkt: Packet, sim: &mut Simulator) {
        let Some(route) = self.nodes[node.0].table.lookup(pkt.dst).cloned() else {
            trace!(node = %self.nodes[node.0].name, dst = %pkt.dst, "无路由，丢弃");
            self.stats.dropped_no_route += 1;
            return;
        };
        let to_addr = route.next_hop.unwrap_or(pkt.dst);
        self.transmit_unicast(route.iface, to_addr, pkt, sim);
    }

    /// 投递事件落地：接口 Down 时静默丢弃。
    pub(crate) fn receive(&mut self, at: IfaceId, pkt: Packet, sim: &mut Simulator) {
        if !self.ifaces[at.0].up {
            self.stats.dropped_iface_down += 1;
            return;
        }
        let node = self.ifaces[at.0].node;
        if pkt.kind.is_control() {
            self.dispatch_packet(node, at, pkt, sim);
            return;
        }
        if self.is_local_addr(node, pkt.dst) {
            self.local_deliver(node, pkt, sim);
        } else {
            self.forward(node, pkt, sim);
        }
    }

    fn is_local_addr(&self, node: NodeId, addr: Ipv4Addr) -> bool {
        self.nodes[node.0]
            .ifaces
            .iter()
            .any(|&i| self.ifaces[i.0].addr == addr)
    }

    fn local_deliver(&mut self, node: NodeId, pkt: Packet, sim: &mut Simulator) {
        debug!(
            node = %self.nodes[node.0].name,
            pkt_id = pkt.id,
            size_bytes = pkt.size_bytes,
            "✅ 数据包送达目的地"
        );
        self.stats.delivered_pkts += 1;
        self.stats.delivered_bytes += pkt.size_bytes as u64;
        self.handle_echo(node, pkt, sim);
    }

    fn forward(&mut self, node: NodeId, mut pkt: Packet, sim: &mut Simulator) {
        if pkt.ttl <= 1 {
            trace!(pkt_id = pkt.id, "TTL 耗尽，丢弃");
            self.stats.dropped_ttl += 1;
            return;
        }
        pkt.ttl -= 1;
        self.stats.forwarded_pkts += 1;
        self.send_from(node, pkt, sim);
    }

    /// 节点首个接口的地址（应用流量的源地址）。
    pub(crate) fn primary_addr(&self, node: NodeId) -> Option<Ipv4Addr> {
        self.nodes[node.0]
            .ifaces
            .first()
            .map(|&i| self.ifaces[i.0].addr)
    }
}
