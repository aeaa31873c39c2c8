//! 地址与网段
//!
//! IPv4 地址直接使用 `std::net::Ipv4Addr`；本模块定义目的网段（前缀）。

use super::error::NetError;
use std::fmt;
use std::net::Ipv4Addr;

/// 目的网段：网络地址 + 前缀长度。构造时掩掉主机位。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Prefix {
    net: u32,
    len: u8,
}

impl Prefix {
    /// 默认路由 0.0.0.0/0。
    pub const DEFAULT: Prefix = Prefix { net: 0, len: 0 };

    pub fn new(addr: Ipv4Addr, len: u8) -> Result<Prefix, NetError> {
        if len > 32 {
            return Err(NetError::InvalidPrefixLen(len));
        }
        Ok(Prefix {
            net: u32::from(addr) & mask(len),
            len,
        })
    }

    pub fn contains(&self, addr: Ipv4Addr) -> bool {
        u32::from(addr) & mask(self.len) == self.net
    }

    pub fn len(&self) -> u8 {
        self.len
    }

    pub fn network(&self) -> Ipv4Addr {
        Ipv4Addr::from(self.net)
    }
}

fn mask(len: u8) -> u32 {
    if len == 0 {
        0
    } else {
        u32::MAX << (32 - u32::from(len))
    }
}

impl fmt::Display for Prefix {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.network(), self.len)
    }
}
