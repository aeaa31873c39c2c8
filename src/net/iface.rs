//! 接口类型
//!
//! 接口属于唯一的节点，持有地址、链路引用与 Up/Down 状态。
//! 状态只由故障注入或协议保持逻辑变更；运行期间不销毁。

use super::addr::Prefix;
use super::id::{IfaceId, LinkId, NodeId};
use std::net::Ipv4Addr;

/// 网络接口
#[derive(Debug)]
pub struct Iface {
    pub id: IfaceId,
    pub node: NodeId,
    pub addr: Ipv4Addr,
    pub prefix: Prefix,
    pub link: Option<LinkId>,
    pub up: bool,
}

impl Iface {
    pub fn new(id: IfaceId, node: NodeId, addr: Ipv4Addr, prefix: Prefix) -> Self {
        Self {
            id,
            node,
            addr,
            prefix,
            link: None,
            up: true,
        }
    }
}
