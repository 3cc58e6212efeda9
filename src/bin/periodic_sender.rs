//! 周期发包仿真
//!
//! 安装一个周期发包应用，运行到停止时刻，打印收发统计

use clap::Parser;
use evsim_rs::demo::{DemoWorld, SenderOpts};
use evsim_rs::sim::{SimDuration, SimTime, Simulator};

#[derive(Debug, Parser)]
#[command(name = "periodic_sender", about = "周期发包仿真：单个 sender，到停止时刻结束")]
struct Args {
    #[arg(long, default_value_t = 1024)]
    pkt_bytes: u32,
    /// 最多发送的包数（0 表示不限）
    #[arg(long, default_value_t = 0)]
    max_packets: u64,
    /// 两个包之间的间隔（毫秒）
    #[arg(long, default_value_t = 1000)]
    interval_ms: i64,
    /// 单向链路时延（微秒）
    #[arg(long, default_value_t = 2000)]
    latency_us: i64,
    /// 应用启动时刻（秒）
    #[arg(long, default_value_t = 1.0)]
    start_s: f64,
    /// 应用停止时刻（秒）
    #[arg(long, default_value_t = 10.0)]
    app_stop_s: f64,
    /// 仿真停止时刻（秒）
    #[arg(long, default_value_t = 11.0)]
    stop_s: f64,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // 初始化 tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_file(true)
        .with_line_number(true)
        .with_target(true)
        .init();

    let args = Args::parse();

    let mut sim = Simulator::new();
    let mut world = DemoWorld::default();

    let opts = SenderOpts {
        name: "client".to_string(),
        start: SimTime::from_secs_f64(args.start_s),
        stop: SimTime::from_secs_f64(args.app_stop_s),
        interval: SimDuration::from_millis(args.interval_ms),
        max_packets: args.max_packets,
        pkt_bytes: args.pkt_bytes,
        latency: SimDuration::from_micros(args.latency_us),
    };
    world.install_sender(&mut sim, opts)?;

    sim.stop_at(SimTime::from_secs_f64(args.stop_s))?;
    sim.run(&mut world)?;

    println!(
        "done @ {}, events={}, sent_pkts={}, delivered_pkts={}, delivered_bytes={}",
        sim.now(),
        sim.executed_events(),
        world.stats.sent_pkts,
        world.stats.delivered_pkts,
        world.stats.delivered_bytes
    );

    sim.destroy()?;
    Ok(())
}
