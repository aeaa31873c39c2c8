//! 拓扑构造错误
//!
//! 配置错误在进入运行循环之前快速失败；转发失败只计数，不走错误通道。

use super::id::IfaceId;
use std::net::Ipv4Addr;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum NetError {
    #[error("invalid prefix length /{0}")]
    InvalidPrefixLen(u8),
    #[error("duplicate node name {0:?}")]
    DuplicateNodeName(String),
    #[error("duplicate interface address {0}")]
    DuplicateAddress(Ipv4Addr),
    #[error("interface {0:?} is already attached to a link")]
    AlreadyConnected(IfaceId),
    #[error("a link needs at least two endpoint interfaces")]
    TooFewEndpoints,
    #[error("unknown split horizon policy {0:?} (expected NoSplitHorizon, SplitHorizon or PoisonReverse)")]
    UnknownSplitHorizon(String),
    #[error("unknown node {0:?} in scenario")]
    UnknownNode(String),
    #[error("nodes {0:?} and {1:?} are not connected by a link")]
    NoSuchLink(String, String),
    #[error("scenario file: {0}")]
    ScenarioParse(#[from] serde_json::Error),
    #[error("io: {0}")]
    Io(#[from] std::io::Error),
}
