//! 菱形拓扑链路状态仿真
//!
//! T-{A,B}-{C,D}-R 双路径拓扑，四台路由器跑链路状态协议。t=40s 同时
//! 切断 B-D 与 A-C，流量应在重新收敛后改走剩余路径继续送达。

use clap::Parser;
use routesim_rs::app::ProbeSend;
use routesim_rs::net::{DumpRoutes, NetWorld, schedule_link_down};
use routesim_rs::proto::LinkState;
use routesim_rs::sim::{SimTime, Simulator};
use routesim_rs::topo::{ECHO_PORT, build_diamond};

#[derive(Debug, Parser)]
#[command(name = "diamond-ls", about = "菱形拓扑仿真：链路状态路由 + 双链路故障")]
struct Args {
    /// 提升默认日志级别到 debug（RUST_LOG 优先）
    #[arg(long, default_value_t = false)]
    verbose: bool,

    /// 探测包个数
    #[arg(long, default_value_t = 5000)]
    probe_count: u64,

    /// 探测包大小（字节）
    #[arg(long, default_value_t = 1024)]
    probe_bytes: u32,

    /// 在 30/60/90 秒打印各路由器的路由表
    #[arg(long, default_value_t = false)]
    print_routing_tables: bool,

    /// 仿真运行到多少秒
    #[arg(long, default_value_t = 131)]
    until_s: u64,
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

    let mut sim = Simulator::default();
    let mut world = NetWorld::default();

    let diamond = build_diamond(&mut world.net).expect("build diamond topology");

    for router in diamond.routers() {
        world.net.set_protocol(router, Box::new(LinkState::new()));
    }

    world.net.add_echo_server(diamond.r, ECHO_PORT);
    let client = world.net.add_echo_client(
        diamond.t,
        diamond.r_addr,
        ECHO_PORT,
        args.probe_bytes,
        SimTime::from_secs(1),
        args.probe_count,
    );
    sim.schedule(SimTime::from_secs(2), ProbeSend { client });

    // 双故障：切掉 R 的默认出口所在路径与另一条备用路径的一段
    schedule_link_down(&mut sim, diamond.l_bd, SimTime::from_secs(40));
    schedule_link_down(&mut sim, diamond.l_ac, SimTime::from_secs(40));

    if args.print_routing_tables {
        for at_s in [30, 60, 90] {
            for router in diamond.routers() {
                sim.schedule(SimTime::from_secs(at_s), DumpRoutes { node: router });
            }
        }
    }

    world.net.start_protocols(&mut sim);
    sim.run_until(SimTime::from_secs(args.until_s), &mut world);

    let c = world.net.client(client);
    println!(
        "done @ {:?}, probes sent={} received={}, delivered_pkts={}, drops(no_route={}, ttl={}, iface_down={})",
        sim.now(),
        c.sent,
        c.received,
        world.net.stats.delivered_pkts,
        world.net.stats.dropped_no_route,
        world.net.stats.dropped_ttl,
        world.net.stats.dropped_iface_down
    );
}
