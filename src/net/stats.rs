//! 统计信息
//!
//! 转发失败按原因计数，不作为错误上报：链路故障下的丢包正是被观测对象。

/// 网络统计信息
#[derive(Debug, Default)]
pub struct Stats {
    pub delivered_pkts: u64,
    pub delivered_bytes: u64,
    pub forwarded_pkts: u64,
    pub dropped_no_route: u64,
    pub dropped_ttl: u64,
    pub dropped_iface_down: u64,
}

impl Stats {
    pub fn dropped_total(&self) -> u64 {
        self.dropped_no_route + self.dropped_ttl + self.dropped_iface_down
    }
}
