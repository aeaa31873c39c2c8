//! 流量应用
//!
//! 回显服务端与探测客户端：纯粹作为可观测流量验证收敛后的路由正确性，
//! 不做重传，也不做拥塞控制。

mod echo;

pub use echo::{AppRegistry, EchoClientState, ProbeSend};
