//! 数据包投递事件
//!
//! 把一个 packet 交给目标接口所在的节点处理。投递时刻接口若已 Down，
//! 数据包被静默丢弃并计数。

use super::id::IfaceId;
use super::net_world::NetWorld;
use super::packet::Packet;
use crate::sim::{Event, Simulator, World};
use tracing::trace;

/// 事件：把一个 packet 投递到某个接口。
#[derive(Debug)]
pub struct DeliverPacket {
    pub to: IfaceId,
    pub pkt: Packet,
}

impl Event for DeliverPacket {
    fn execute(self: Box<Self>, sim: &mut Simulator, world: &mut dyn World) {
        let DeliverPacket { to, pkt } = *self;
        trace!(pkt_id = pkt.id, to = to.0, now = ?sim.now(), "📨 数据包到达接口");

        let w = world
            .as_any_mut()
            .downcast_mut::<NetWorld>()
            .expect("world must be NetWorld");
        w.net.receive(to, pkt, sim);
    }
}
