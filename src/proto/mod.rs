//! 路由协议层
//!
//! 协议通过能力接口挂接在节点上：路由表与调度器对具体协议一无所知。
//! 每个实例只服务一个节点；所有定时器都是调度器事件。

mod link_state;
mod rip;

pub use link_state::LinkState;
pub use rip::{INFINITY_METRIC, Rip, SplitHorizon};

use crate::net::{IfaceId, NetWorld, Network, NodeId, PacketKind, Prefix, Route};
use crate::sim::{Event, Simulator, World};
use std::net::Ipv4Addr;

/// 路由协议能力接口。
///
/// 实现者在 `start` 里安装直连路由并调度首轮定时器；之后只被
/// 拓扑变化通知、定时器与协议报文驱动。
pub trait RoutingProtocol: Send + 'static {
    fn start(&mut self, node: NodeId, sim: &mut Simulator, net: &mut Network);

    /// 所属节点某接口 Up/Down。
    fn on_topology_change(
        &mut self,
        node: NodeId,
        iface: IfaceId,
        up: bool,
        sim: &mut Simulator,
        net: &mut Network,
    );

    fn on_timer(&mut self, node: NodeId, timer: ProtoTimer, sim: &mut Simulator, net: &mut Network);

    /// 收到一条以本协议为目标的控制报文。
    fn on_packet(
        &mut self,
        node: NodeId,
        iface: IfaceId,
        src: Ipv4Addr,
        kind: PacketKind,
        sim: &mut Simulator,
        net: &mut Network,
    );

    /// 当前由本协议安装的路由（检查用）。
    fn installed_routes(&self) -> Vec<Route>;
}

/// 协议定时器种类。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProtoTimer {
    /// 距离向量周期通告
    RipPeriodic,
    /// 距离向量触发更新
    RipTriggered,
    /// 某条距离向量路由的老化
    RipRouteExpire(Prefix),
    /// 某条距离向量路由的垃圾回收清除
    RipRouteFlush(Prefix),
    /// 链路状态邻居发现
    Hello,
    /// 链路状态周期洪泛
    LsaFlood,
    /// 链路状态老化扫描
    LsExpire,
}

/// 事件：驱动某个节点路由协议的一个定时器。
#[derive(Debug)]
pub struct ProtocolTimer {
    pub node: NodeId,
    pub timer: ProtoTimer,
}

impl Event for ProtocolTimer {
    fn execute(self: Box<Self>, sim: &mut Simulator, world: &mut dyn World) {
        let w = world
            .as_any_mut()
            .downcast_mut::<NetWorld>()
            .expect("world must be NetWorld");
        w.net.dispatch_timer(self.node, self.timer, sim);
    }
}
