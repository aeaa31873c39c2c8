//! 数据包类型
//!
//! 定义网络数据包。应用载荷与路由协议报文共用同一载体，
//! 协议报文同样经过链路传输与排队，链路断开时同样被丢弃。

use super::addr::Prefix;
use super::id::{ClientId, NodeId};
use std::net::Ipv4Addr;

/// 缺省 TTL。
pub const DEFAULT_TTL: u8 = 64;

/// 网络数据包
#[derive(Debug, Clone)]
pub struct Packet {
    pub id: u64,
    pub src: Ipv4Addr,
    pub dst: Ipv4Addr,
    pub size_bytes: u32,
    pub ttl: u8,
    pub kind: PacketKind,
}

/// 数据包载荷种类。
#[derive(Debug, Clone)]
pub enum PacketKind {
    /// 回显请求（探测流量）
    EchoRequest { client: ClientId, seq: u32, port: u16 },
    /// 回显应答
    EchoReply { client: ClientId, seq: u32 },
    /// 距离向量通告（全表）
    Rip(Vec<RipEntry>),
    /// 链路状态邻居发现
    Hello { origin: NodeId },
    /// 链路状态通告（洪泛）
    Lsa(LsaBody),
}

impl PacketKind {
    /// 路由协议控制报文：交给节点的路由协议处理，不进入转发路径。
    pub fn is_control(&self) -> bool {
        matches!(
            self,
            PacketKind::Rip(_) | PacketKind::Hello { .. } | PacketKind::Lsa(_)
        )
    }
}

/// 距离向量通告条目。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RipEntry {
    pub prefix: Prefix,
    pub metric: u32,
}

/// 链路状态通告体：(originator, seq) 用于洪泛去重。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LsaBody {
    pub origin: NodeId,
    pub seq: u64,
    pub neighbors: Vec<NodeId>,
    pub prefixes: Vec<Prefix>,
}
