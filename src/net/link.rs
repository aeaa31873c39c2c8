//! 链路类型
//!
//! 定义网络链路及其传输时延计算。链路连接两个（点对点）或多个（共享介质）
//! 接口；拓扑一经创建不可变，运行期间只有端点接口状态变化。

use super::id::{IfaceId, LinkId};
use crate::sim::SimTime;

/// 网络链路
#[derive(Debug)]
pub struct Link {
    pub id: LinkId,
    /// 有序端点接口，至少两个。
    pub endpoints: Vec<IfaceId>,
    pub latency: SimTime,
    pub bandwidth_bps: u64,
    /// 半双工串行化游标：下一次发送最早可以开始的时间。
    pub busy_until: SimTime,
}

impl Link {
    pub fn new(id: LinkId, endpoints: Vec<IfaceId>, latency: SimTime, bandwidth_bps: u64) -> Self {
        Self {
            id,
            endpoints,
            latency,
            bandwidth_bps,
            busy_until: SimTime::ZERO,
        }
    }

    /// 计算传输指定字节数所需的时间
    pub(crate) fn tx_time(&self, bytes: u32) -> SimTime {
        // ceil(bytes*8 / bps) 秒 -> 纳秒
        if self.bandwidth_bps == 0 {
            return SimTime(u64::MAX / 4);
        }
        let bits = (bytes as u128).saturating_mul(8);
        let nanos = (bits.saturating_mul(1_000_000_000u128) + (self.bandwidth_bps as u128 - 1))
            / self.bandwidth_bps as u128;
        SimTime(nanos.min(u64::MAX as u128) as u64)
    }
}
