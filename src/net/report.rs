//! 路由表打印
//!
//! 只读消费者：在请求的仿真时刻取路由表快照并渲染为文本。

use super::id::NodeId;
use super::net_world::NetWorld;
use crate::sim::{Event, Simulator, World};

/// 事件：打印某节点的路由表快照。
#[derive(Debug)]
pub struct DumpRoutes {
    pub node: NodeId,
}

impl Event for DumpRoutes {
    fn execute(self: Box<Self>, sim: &mut Simulator, world: &mut dyn World) {
        let w = world
            .as_any_mut()
            .downcast_mut::<NetWorld>()
            .expect("world must be NetWorld");
        let node = w.net.node(self.node);
        println!(
            "=== t={}s  {} routing table ({} routes) ===",
            sim.now().as_secs(),
            node.name,
            node.table.len()
        );
        for route in node.table.snapshot() {
            println!("  {route}");
        }
    }
}
