//! 场景文件驱动的仿真入口
//!
//! 读取 scenario.json（拓扑 / 协议 / 故障脚本 / 探测流量），装配后运行，
//! 最后打印探测与转发核算。

use clap::Parser;
use routesim_rs::net::NetWorld;
use routesim_rs::sim::{ScenarioSpec, Simulator};
use routesim_rs::topo::build_scenario;
use std::fs;
use std::path::PathBuf;

#[derive(Debug, Parser)]
#[command(name = "scenario-sim", about = "Run scenario.json on routesim-rs")]
struct Args {
    /// 提升默认日志级别到 debug（RUST_LOG 优先）
    #[arg(long, default_value_t = false)]
    verbose: bool,

    /// Path to scenario.json
    #[arg(long)]
    scenario: PathBuf,

    /// 覆盖场景文件中的仿真截止时间（秒）
    #[arg(long)]
    until_s: Option<u64>,
}

fn main() {
    let args = Args::parse();

    // 初始化 tracing
    let default_filter = if args.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_filter)),
        )
        .with_file(true)
        .with_line_number(true)
        .with_target(true)
        .init();

    let raw = fs::read_to_string(&args.scenario).expect("read scenario.json");
    let spec: ScenarioSpec = serde_json::from_str(&raw).expect("parse scenario.json");

    let mut sim = Simulator::default();
    let mut world = NetWorld::default();

    let run = build_scenario(&spec, &mut world, &mut sim).expect("build scenario");
    let until = args.until_s.map_or(run.until, routesim_rs::sim::SimTime::from_secs);

    sim.run_until(until, &mut world);

    if let Some(client) = run.client {
        let c = world.net.client(client);
        println!("probes sent={} received={}", c.sent, c.received);
    }
    println!(
        "done @ {:?}, delivered_pkts={}, forwarded_pkts={}, drops(no_route={}, ttl={}, iface_down={})",
        sim.now(),
        world.net.stats.delivered_pkts,
        world.net.stats.forwarded_pkts,
        world.net.stats.dropped_no_route,
        world.net.stats.dropped_ttl,
        world.net.stats.dropped_iface_down
    );
}
