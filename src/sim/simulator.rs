//! 仿真器
//!
//! 定义事件驱动仿真器，维护当前时间与事件队列。

use super::event::Event;
use super::scheduled_event::ScheduledEvent;
use super::time::SimTime;
use super::world::World;
use std::collections::{BinaryHeap, HashSet};
use tracing::{debug, info, trace};

/// 事件句柄：由 `schedule` 返回，可用于取消尚未触发的事件。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct EventHandle(pub(crate) u64);

/// 事件驱动仿真器：维护当前时间与事件队列。
#[derive(Default)]
pub struct Simulator {
    now: SimTime,
    next_seq: u64,
    q: BinaryHeap<ScheduledEvent>,
    cancelled: HashSet<u64>,
}

impl Simulator {
    /// 获取当前仿真时间
    pub fn now(&self) -> SimTime {
        self.now
    }

    /// 调度事件在指定时间执行。
    ///
    /// `at` 早于当前时间时收敛为当前时间，不会 panic。
    #[tracing::instrument(skip(self, ev), fields(event_type = std::any::type_name::<E>(), schedule_at = ?at))]
    pub fn schedule<E: Event>(&mut self, at: SimTime, ev: E) -> EventHandle {
        let at = at.max(self.now);
        let seq = self.next_seq;
        trace!(now = ?self.now, seq, "调度事件");

        self.next_seq = self.next_seq.wrapping_add(1);
        self.q.push(ScheduledEvent {
            at,
            seq,
            ev: Box::new(ev),
        });

        debug!(queue_size = self.q.len(), "事件已加入队列");
        EventHandle(seq)
    }

    /// 调度事件在当前时间 + `delay` 执行。
    pub fn schedule_in<E: Event>(&mut self, delay: SimTime, ev: E) -> EventHandle {
        self.schedule(self.now.saturating_add(delay), ev)
    }

    /// 取消一个尚未触发的事件。
    ///
    /// 对已触发或已取消的句柄调用是 no-op，不是错误。
    pub fn cancel(&mut self, handle: EventHandle) {
        if handle.0 < self.next_seq {
            trace!(seq = handle.0, "取消事件");
            self.cancelled.insert(handle.0);
        }
    }

    /// 运行到 `until` 为止。
    ///
    /// 触发所有 `at <= until` 的事件；超过 `until` 的未决事件被丢弃而非触发，
    /// 时钟最终停在 `max(now, until)`。
    pub fn run_until(&mut self, until: SimTime, world: &mut dyn World) {
        while let Some(top) = self.q.peek() {
            if top.at > until {
                // 剩余事件在停止时间之后：全部丢弃
                debug!(discarded = self.q.len(), "丢弃停止时间之后的未决事件");
                self.q.clear();
                break;
            }
            let item = self.q.pop().expect("peek then pop");
            if self.cancelled.remove(&item.seq) {
                continue;
            }
            self.now = item.at;
            item.ev.execute(self, world);
            world.on_tick(self);
        }
        self.cancelled.clear();
        self.now = self.now.max(until);
    }

    /// 运行所有事件直到队列为空。
    #[tracing::instrument(skip(self, world))]
    pub fn run(&mut self, world: &mut dyn World) {
        info!("▶️  开始运行仿真");
        debug!(now = ?self.now, queue_size = self.q.len(), "初始状态");

        let mut event_count = 0;
        while let Some(item) = self.q.pop() {
            if self.cancelled.remove(&item.seq) {
                continue;
            }
            event_count += 1;
            self.now = item.at;

            debug!(
                event_num = event_count,
                now = ?self.now,
                scheduled_at = ?item.at,
                seq = item.seq,
                remaining_queue = self.q.len(),
                "执行事件"
            );

            item.ev.execute(self, world);
            world.on_tick(self);
        }

        info!(
            total_events = event_count,
            final_time = ?self.now,
            "✅ 仿真完成"
        );
    }
}
