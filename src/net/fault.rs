//! 故障注入
//!
//! 在指定仿真时刻把链路两端接口置 Down/Up。没有重试或回滚语义：
//! 已调度的故障一定触发（除非仿真先停止）；对已处于目标状态的接口幂等。

use super::id::LinkId;
use super::net_world::NetWorld;
use crate::sim::{Event, EventHandle, SimTime, Simulator, World};
use tracing::info;

/// 事件：切断链路。
#[derive(Debug)]
pub struct LinkDown {
    pub link: LinkId,
}

impl Event for LinkDown {
    fn execute(self: Box<Self>, sim: &mut Simulator, world: &mut dyn World) {
        info!(link = self.link.0, now_s = sim.now().as_secs(), "💥 链路切断");
        let w = world
            .as_any_mut()
            .downcast_mut::<NetWorld>()
            .expect("world must be NetWorld");
        w.net.set_link_state(self.link, false, sim);
    }
}

/// 事件：恢复链路。
#[derive(Debug)]
pub struct LinkUp {
    pub link: LinkId,
}

impl Event for LinkUp {
    fn execute(self: Box<Self>, sim: &mut Simulator, world: &mut dyn World) {
        info!(link = self.link.0, now_s = sim.now().as_secs(), "🔌 链路恢复");
        let w = world
            .as_any_mut()
            .downcast_mut::<NetWorld>()
            .expect("world must be NetWorld");
        w.net.set_link_state(self.link, true, sim);
    }
}

pub fn schedule_link_down(sim: &mut Simulator, link: LinkId, at: SimTime) -> EventHandle {
    sim.schedule(at, LinkDown { link })
}

pub fn schedule_link_up(sim: &mut Simulator, link: LinkId, at: SimTime) -> EventHandle {
    sim.schedule(at, LinkUp { link })
}
