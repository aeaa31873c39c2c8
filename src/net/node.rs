//! 节点类型
//!
//! 节点持有接口序列与一张路由表；路由协议实例由 `Network` 按节点保存，
//! 通过能力接口驱动（见 `proto`）。

use super::id::{IfaceId, NodeId};
use super::route::RoutingTable;

/// 网络节点
#[derive(Debug)]
pub struct Node {
    pub id: NodeId,
    pub name: String,
    pub ifaces: Vec<IfaceId>,
    pub table: RoutingTable,
    /// 可视化布局元数据。纯展示用途，路由与转发逻辑绝不读取。
    pub position: Option<(f64, f64)>,
}

impl Node {
    pub fn new(id: NodeId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            ifaces: Vec::new(),
            table: RoutingTable::default(),
            position: None,
        }
    }
}
