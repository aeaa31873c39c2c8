//! 路由表
//!
//! 每节点一张：目的网段到单条最优路由的映射。查询走最长前缀匹配；
//! 同一网段插入更优路由会驱逐较差者，较差路由的插入是 no-op；
//! 静态路由对同一目的始终压过动态路由。

use super::addr::Prefix;
use super::id::IfaceId;
use std::collections::BTreeMap;
use std::fmt;
use std::net::Ipv4Addr;

/// 路由来源。协议只能移除自己安装的路由。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouteSource {
    Static,
    Rip,
    LinkState,
}

impl fmt::Display for RouteSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RouteSource::Static => write!(f, "static"),
            RouteSource::Rip => write!(f, "rip"),
            RouteSource::LinkState => write!(f, "link-state"),
        }
    }
}

/// 一条路由。`next_hop` 为 `None` 表示直连网段，按目的地址直接投递。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Route {
    pub dest: Prefix,
    pub next_hop: Option<Ipv4Addr>,
    pub iface: IfaceId,
    pub metric: u32,
    pub source: RouteSource,
}

impl fmt::Display for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.next_hop {
            Some(nh) => write!(
                f,
                "{:<18} via {:<15} if{} metric {:>2} [{}]",
                self.dest.to_string(),
                nh,
                self.iface.0,
                self.metric,
                self.source
            ),
            None => write!(
                f,
                "{:<18} direct {:<12} if{} metric {:>2} [{}]",
                self.dest.to_string(),
                "",
                self.iface.0,
                self.metric,
                self.source
            ),
        }
    }
}

/// 路由表。
#[derive(Debug, Default)]
pub struct RoutingTable {
    routes: BTreeMap<Prefix, Route>,
}

impl RoutingTable {
    /// 最长前缀匹配查询。
    ///
    /// 同一前缀只保留一条最优路由，因此覆盖目的地址的候选之间
    /// 前缀长度互不相同，取最长者即可。
    pub fn lookup(&self, addr: Ipv4Addr) -> Option<&Route> {
        self.routes
            .values()
            .filter(|r| r.dest.contains(addr))
            .max_by_key(|r| r.dest.len())
    }

    /// 插入一条路由；返回是否真的写入。
    pub fn insert(&mut self, route: Route) -> bool {
        match self.routes.get(&route.dest) {
            None => {
                self.routes.insert(route.dest, route);
                true
            }
            Some(cur) => {
                let better = match (route.source == RouteSource::Static, cur.source == RouteSource::Static) {
                    // 静态压过动态
                    (true, false) => true,
                    (false, true) => false,
                    _ => route.metric < cur.metric,
                };
                if better {
                    self.routes.insert(route.dest, route);
                }
                better
            }
        }
    }

    /// 移除某来源安装的路由；来源不匹配时是 no-op。
    pub fn remove(&mut self, dest: Prefix, source: RouteSource) -> bool {
        if self.routes.get(&dest).is_some_and(|r| r.source == source) {
            self.routes.remove(&dest);
            true
        } else {
            false
        }
    }

    /// 批量移除某来源的全部路由（链路状态协议整表覆盖用）。
    pub fn remove_source(&mut self, source: RouteSource) {
        self.routes.retain(|_, r| r.source != source);
    }

    /// 有序路由快照（检查/打印用）。
    pub fn snapshot(&self) -> Vec<Route> {
        self.routes.values().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.routes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }
}
