//! 回显服务端 / 探测客户端
//!
//! 服务端对每个收到的请求立即回包；客户端按固定间隔发包并记录
//! 发送/接收时间戳与序列号，用于送达/丢包核算。

use crate::net::{ClientId, NetWorld, Network, NodeId, Packet, PacketKind};
use crate::sim::{Event, SimTime, Simulator, World};
use std::collections::BTreeMap;
use std::net::Ipv4Addr;
use tracing::{debug, trace};

/// 每节点的回显服务端与全部探测客户端。
#[derive(Debug, Default)]
pub struct AppRegistry {
    servers: BTreeMap<NodeId, u16>,
    clients: Vec<EchoClientState>,
}

/// 探测客户端状态与核算数据。
#[derive(Debug)]
pub struct EchoClientState {
    pub node: NodeId,
    pub dst: Ipv4Addr,
    pub port: u16,
    pub size_bytes: u32,
    pub interval: SimTime,
    pub max_count: u64,
    next_seq: u32,
    pub sent: u64,
    pub received: u64,
    in_flight: BTreeMap<u32, SimTime>,
    /// (序列号, 往返时延)
    pub rtts: Vec<(u32, SimTime)>,
    /// 最近一次收到应答的发出时刻（收敛窗口分析用）。
    pub last_rx_sent_at: Option<SimTime>,
}

impl Network {
    /// 在节点上注册回显服务端。
    pub fn add_echo_server(&mut self, node: NodeId, port: u16) {
        self.apps.servers.insert(node, port);
    }

    /// 注册探测客户端。首包需由调用方调度一个 `ProbeSend` 事件。
    pub fn add_echo_client(
        &mut self,
        node: NodeId,
        dst: Ipv4Addr,
        port: u16,
        size_bytes: u32,
        interval: SimTime,
        max_count: u64,
    ) -> ClientId {
        let id = ClientId(self.apps.clients.len());
        self.apps.clients.push(EchoClientState {
            node,
            dst,
            port,
            size_bytes,
            interval,
            max_count,
            next_seq: 0,
            sent: 0,
            received: 0,
            in_flight: BTreeMap::new(),
            rtts: Vec::new(),
            last_rx_sent_at: None,
        });
        id
    }

    pub fn client(&self, id: ClientId) -> &EchoClientState {
        &self.apps.clients[id.0]
    }

    pub(crate) fn probe_tick(&mut self, client: ClientId, sim: &mut Simulator) {
        let now = sim.now();
        let c = &mut self.apps.clients[client.0];
        if c.sent >= c.max_count {
            return;
        }
        let seq = c.next_seq;
        c.next_seq += 1;
        c.sent += 1;
        c.in_flight.insert(seq, now);
        let (node, dst, port, size, interval, more) = (
            c.node,
            c.dst,
            c.port,
            c.size_bytes,
            c.interval,
            c.sent < c.max_count,
        );
        trace!(client = client.0, seq, now_s = now.as_secs(), "发出探测包");

        let Some(src) = self.primary_addr(node) else {
            // 没有接口的节点不该挂客户端；静默跳过
            return;
        };
        let pkt = self.make_packet(src, dst, size, PacketKind::EchoRequest { client, seq, port });
        self.send_from(node, pkt, sim);
        if more {
            sim.schedule_in(interval, ProbeSend { client });
        }
    }

    /// 应用层落地：回显请求生成应答，回显应答记录往返。
    pub(crate) fn handle_echo(&mut self, node: NodeId, pkt: Packet, sim: &mut Simulator) {
        match pkt.kind {
            PacketKind::EchoRequest { client, seq, port } => {
                if self.apps.servers.get(&node) == Some(&port) {
                    let reply = self.make_packet(
                        pkt.dst,
                        pkt.src,
                        pkt.size_bytes,
                        PacketKind::EchoReply { client, seq },
                    );
                    self.send_from(node, reply, sim);
                }
                // 无监听者：包已送达，但没有应答
            }
            PacketKind::EchoReply { client, seq } => {
                let now = sim.now();
                if let Some(c) = self.apps.clients.get_mut(client.0) {
                    if c.node == node {
                        if let Some(t0) = c.in_flight.remove(&seq) {
                            c.received += 1;
                            c.rtts.push((seq, now.saturating_sub(t0)));
                            c.last_rx_sent_at = Some(t0);
                            debug!(client = client.0, seq, rtt_ns = now.saturating_sub(t0).0, "收到应答");
                        }
                    }
                }
            }
            _ => {}
        }
    }
}

/// 事件：客户端周期发包。
#[derive(Debug)]
pub struct ProbeSend {
    pub client: ClientId,
}

impl Event for ProbeSend {
    fn execute(self: Box<Self>, sim: &mut Simulator, world: &mut dyn World) {
        let w = world
            .as_any_mut()
            .downcast_mut::<NetWorld>()
            .expect("world must be NetWorld");
        w.net.probe_tick(self.client, sim);
    }
}
