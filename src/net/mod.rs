//! 网络模拟模块
//!
//! 此模块包含网络模拟的核心组件：节点、接口、链路、数据包、
//! 路由表、转发路径与故障注入。

// 子模块声明
mod addr;
mod deliver_packet;
mod error;
mod fault;
mod iface;
mod id;
mod link;
mod net_world;
mod network;
mod node;
mod packet;
mod report;
mod route;
mod stats;

// 重新导出公共接口
pub use addr::Prefix;
pub use deliver_packet::DeliverPacket;
pub use error::NetError;
pub use fault::{LinkDown, LinkUp, schedule_link_down, schedule_link_up};
pub use iface::Iface;
pub use id::{ClientId, IfaceId, LinkId, NodeId};
pub use link::Link;
pub use net_world::NetWorld;
pub use network::Network;
pub use node::Node;
pub use packet::{DEFAULT_TTL, LsaBody, Packet, PacketKind, RipEntry};
pub use report::DumpRoutes;
pub use route::{Route, RouteSource, RoutingTable};
pub use stats::Stats;
