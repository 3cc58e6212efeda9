//! 场景仿真
//!
//! 从 JSON 场景文件安装多个 sender，运行后打印每个 sender 的统计，可选写出执行轨迹

use std::fs;
use std::path::PathBuf;

use clap::Parser;
use evsim_rs::demo::DemoWorld;
use evsim_rs::scenario::ScenarioSpec;
use evsim_rs::sim::Simulator;
use tracing::info;

#[derive(Debug, Parser)]
#[command(name = "scenario_sim", about = "场景仿真：从 JSON 场景文件安装应用并运行")]
struct Args {
    /// 场景文件（JSON）
    #[arg(long)]
    scenario: PathBuf,
    /// 将执行轨迹写为 JSON 数组
    #[arg(long)]
    trace_json: Option<PathBuf>,
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
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    let spec = ScenarioSpec::from_path(&args.scenario)?;

    let mut sim = Simulator::new();
    if args.trace_json.is_some() {
        sim.enable_exec_trace();
    }
    let mut world = DemoWorld::default();
    let apps = spec.install(&mut sim, &mut world)?;
    info!(apps = apps.len(), stop = ?spec.stop_time(), "场景已安装");

    sim.run(&mut world)?;

    for app in world.apps() {
        println!(
            "sender name={} sent_pkts={} delivered_pkts={} delivered_bytes={}",
            app.opts.name,
            app.stats.sent_pkts,
            app.stats.delivered_pkts,
            app.stats.delivered_bytes
        );
    }
    println!(
        "done @ {}, events={}, sent_pkts={}, delivered_pkts={}",
        sim.now(),
        sim.executed_events(),
        world.stats.sent_pkts,
        world.stats.delivered_pkts
    );

    if let Some(path) = args.trace_json {
        if let Some(trace) = sim.take_exec_trace() {
            fs::write(&path, trace.to_json_pretty()?)?;
            eprintln!("wrote exec trace to {}", path.display());
        }
    }

    sim.destroy()?;
    Ok(())
}
