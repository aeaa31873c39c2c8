//! 链式拓扑 RIP 仿真
//!
//! T-A-B-C-R 链式拓扑，三台路由器跑距离向量协议，t=40s 切断 T-A 链路，
//! 观察路由撤销与探测流量中断。

use clap::Parser;
use routesim_rs::app::ProbeSend;
use routesim_rs::net::{DumpRoutes, NetWorld, schedule_link_down};
use routesim_rs::proto::{Rip, SplitHorizon};
use routesim_rs::sim::{SimTime, Simulator};
use routesim_rs::topo::{ChainOpts, ECHO_PORT, build_chain};

#[derive(Debug, Parser)]
#[command(name = "chain-rip", about = "链式拓扑仿真：距离向量路由 + 链路故障")]
struct Args {
    /// 提升默认日志级别到 debug（RUST_LOG 优先）
    #[arg(long, default_value_t = false)]
    verbose: bool,

    /// 水平分割策略：NoSplitHorizon / SplitHorizon / PoisonReverse
    #[arg(long, default_value = "PoisonReverse")]
    split_horizon: String,

    /// 探测包个数
    #[arg(long, default_value_t = 100)]
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
    let policy: SplitHorizon = args.split_horizon.parse().expect("parse split horizon");

    let mut sim = Simulator::default();
    let mut world = NetWorld::default();

    let opts = ChainOpts {
        rates_bps: [5_000_000; 4],
        delays: [SimTime::from_millis(2); 4],
    };
    let chain = build_chain(&mut world.net, &opts).expect("build chain topology");

    for router in chain.routers() {
        let mut rip = Rip::new(policy);
        if router == chain.a {
            rip.exclude_iface(chain.a_host_iface);
        }
        if router == chain.c {
            rip.exclude_iface(chain.c_host_iface);
        }
        world.net.set_protocol(router, Box::new(rip));
    }

    world.net.add_echo_server(chain.r, ECHO_PORT);
    let client = world.net.add_echo_client(
        chain.t,
        chain.r_addr,
        ECHO_PORT,
        args.probe_bytes,
        SimTime::from_secs(1),
        args.probe_count,
    );
    sim.schedule(SimTime::from_secs(2), ProbeSend { client });

    schedule_link_down(&mut sim, chain.links[0], SimTime::from_secs(40));

    if args.print_routing_tables {
        for at_s in [30, 60, 90] {
            for router in chain.routers() {
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
