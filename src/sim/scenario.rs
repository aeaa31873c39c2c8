//! 场景描述
//!
//! 声明式场景文件（JSON）的数据结构：拓扑、路由协议、故障注入与探测流量。
//! 纯 serde 类型，不依赖上层组件；由 `topo` 负责落地为真实拓扑。

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScenarioSpec {
    pub schema_version: u32,
    #[serde(default)]
    pub meta: Option<ScenarioMeta>,
    pub topology: ScenarioTopology,
    pub protocol: ScenarioProtocol,
    #[serde(default)]
    pub faults: Vec<FaultSpec>,
    #[serde(default)]
    pub probe: Option<ProbeSpec>,
    /// 在这些仿真时刻（秒）打印所有路由器的路由表。
    #[serde(default)]
    pub print_tables_at_s: Vec<u64>,
    pub until_s: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScenarioMeta {
    #[serde(default)]
    pub source: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ScenarioTopology {
    /// 链式：T - A - B - C - R
    Chain,
    /// 菱形：T-{A,B}，A-B，{A,B}-{C,D}，{C,D}-R
    Diamond,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ScenarioProtocol {
    Rip {
        /// NoSplitHorizon | SplitHorizon | PoisonReverse
        #[serde(default)]
        split_horizon: Option<String>,
    },
    LinkState,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FaultSpec {
    /// 链路两端节点名，如 ["T", "A"]。
    pub link: [String; 2],
    pub at_s: u64,
    pub action: FaultAction,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FaultAction {
    Down,
    Up,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProbeSpec {
    #[serde(default = "default_interval_s")]
    pub interval_s: u64,
    #[serde(default = "default_count")]
    pub count: u64,
    #[serde(default = "default_size")]
    pub size_bytes: u32,
    /// 首包发出时刻（秒）。
    #[serde(default = "default_start_s")]
    pub start_s: u64,
}

fn default_interval_s() -> u64 {
    1
}

fn default_count() -> u64 {
    1
}

fn default_size() -> u32 {
    1024
}

fn default_start_s() -> u64 {
    2
}
