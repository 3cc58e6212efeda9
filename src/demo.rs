//! 演示应用
//!
//! 一个最小的应用层：周期发包的 sender，以及经过固定链路时延后的接收统计。
//! 全部行为只通过 `schedule` / `cancel` / `now` 驱动，不建模任何无线/路由/TCP 细节。

use crate::sim::{
    BoxError, Event, EventId, EventResult, SimDuration, SimError, SimTime, Simulator, World,
};
use std::any::Any;
use tracing::{debug, info};

/// 应用标识符（同时用作事件上下文）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct AppId(pub usize);

impl AppId {
    pub fn context(self) -> u32 {
        u32::try_from(self.0).unwrap_or(u32::MAX - 1)
    }
}

/// 周期发包应用的配置选项
#[derive(Debug, Clone)]
pub struct SenderOpts {
    pub name: String,
    /// 应用启动时刻
    pub start: SimTime,
    /// 应用停止时刻（停止后未发出的包被取消）
    pub stop: SimTime,
    /// 两个包之间的间隔
    pub interval: SimDuration,
    /// 最多发送的包数，0 表示不限
    pub max_packets: u64,
    pub pkt_bytes: u32,
    /// 单向链路时延
    pub latency: SimDuration,
}

impl Default for SenderOpts {
    fn default() -> Self {
        Self {
            name: "sender".to_string(),
            start: SimTime::from_secs(1),
            stop: SimTime::from_secs(10),
            interval: SimDuration::from_secs(1),
            max_packets: 0,
            pkt_bytes: 1024,
            latency: SimDuration::from_millis(2),
        }
    }
}

/// 收发统计信息
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Stats {
    pub sent_pkts: u64,
    pub delivered_pkts: u64,
    pub delivered_bytes: u64,
    pub total_delay_ns: u64,
}

impl Stats {
    pub fn mean_delay(&self) -> Option<SimDuration> {
        if self.delivered_pkts == 0 {
            return None;
        }
        let mean = self.total_delay_ns / self.delivered_pkts;
        Some(SimDuration(i64::try_from(mean).unwrap_or(i64::MAX)))
    }
}

/// 一个已安装的周期发包应用
#[derive(Debug)]
pub struct SenderApp {
    pub opts: SenderOpts,
    pub stats: Stats,
    running: bool,
    send_event: Option<EventId>,
}

impl SenderApp {
    pub fn is_running(&self) -> bool {
        self.running
    }

    /// 下一次发包事件的句柄（若已调度）
    pub fn send_event(&self) -> Option<EventId> {
        self.send_event
    }
}

/// 演示世界：持有所有应用与全局统计。
#[derive(Debug, Default)]
pub struct DemoWorld {
    apps: Vec<SenderApp>,
    pub stats: Stats,
}

impl World for DemoWorld {
    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

fn demo_world(world: &mut dyn World) -> Result<&mut DemoWorld, BoxError> {
    world
        .as_any_mut()
        .downcast_mut::<DemoWorld>()
        .ok_or_else(|| "world must be DemoWorld".into())
}

impl DemoWorld {
    pub fn apps(&self) -> &[SenderApp] {
        &self.apps
    }

    pub fn app(&self, id: AppId) -> Option<&SenderApp> {
        self.apps.get(id.0)
    }

    /// 安装一个 sender：在 `opts.start` 调度启动事件，在 `opts.stop` 调度停止事件。
    pub fn install_sender(
        &mut self,
        sim: &mut Simulator,
        opts: SenderOpts,
    ) -> Result<AppId, SimError> {
        if opts.interval <= SimDuration::ZERO {
            return Err(SimError::InvalidArgument(format!(
                "sender {}: interval must be positive",
                opts.name
            )));
        }
        if opts.latency.is_negative() {
            return Err(SimError::InvalidArgument(format!(
                "sender {}: negative latency",
                opts.name
            )));
        }
        if opts.stop < opts.start {
            return Err(SimError::InvalidArgument(format!(
                "sender {}: stop {} is before start {}",
                opts.name, opts.stop, opts.start
            )));
        }
        if opts.start < sim.now() {
            return Err(SimError::InvalidArgument(format!(
                "sender {}: start {} is before now {}",
                opts.name,
                opts.start,
                sim.now()
            )));
        }

        let app = AppId(self.apps.len());
        let ctx = app.context();
        sim.schedule_with_context(ctx, opts.start.saturating_since(sim.now()), StartApp { app })?;
        sim.schedule_with_context(ctx, opts.stop.saturating_since(sim.now()), StopApp { app })?;

        debug!(app = app.0, name = %opts.name, start = %opts.start, stop = %opts.stop, "安装 sender");
        self.apps.push(SenderApp {
            opts,
            stats: Stats::default(),
            running: false,
            send_event: None,
        });
        Ok(app)
    }
}

/// 应用启动事件
#[derive(Debug)]
pub struct StartApp {
    pub app: AppId,
}

impl Event for StartApp {
    fn execute(self: Box<Self>, sim: &mut Simulator, world: &mut dyn World) -> EventResult {
        let w = demo_world(world)?;
        let app = w.apps.get_mut(self.app.0).ok_or("unknown app")?;
        info!(app = self.app.0, name = %app.opts.name, now = %sim.now(), "应用启动");
        app.running = true;
        app.send_event = Some(sim.schedule_now(SendPacket { app: self.app })?);
        Ok(())
    }
}

/// 发包事件：发出一个包并重新调度自己
#[derive(Debug)]
pub struct SendPacket {
    pub app: AppId,
}

impl Event for SendPacket {
    fn execute(self: Box<Self>, sim: &mut Simulator, world: &mut dyn World) -> EventResult {
        let w = demo_world(world)?;
        let app = w.apps.get_mut(self.app.0).ok_or("unknown app")?;
        app.send_event = None;
        if !app.running {
            return Ok(());
        }

        app.stats.sent_pkts += 1;
        w.stats.sent_pkts += 1;
        debug!(app = self.app.0, seq = app.stats.sent_pkts, now = %sim.now(), "发送数据包");

        sim.schedule(
            app.opts.latency,
            DeliverPacket {
                app: self.app,
                bytes: app.opts.pkt_bytes,
                sent_at: sim.now(),
            },
        )?;

        if app.opts.max_packets == 0 || app.stats.sent_pkts < app.opts.max_packets {
            app.send_event = Some(sim.schedule(app.opts.interval, SendPacket { app: self.app })?);
        }
        Ok(())
    }
}

/// 应用停止事件：取消尚未执行的发包事件
#[derive(Debug)]
pub struct StopApp {
    pub app: AppId,
}

impl Event for StopApp {
    fn execute(self: Box<Self>, sim: &mut Simulator, world: &mut dyn World) -> EventResult {
        let w = demo_world(world)?;
        let app = w.apps.get_mut(self.app.0).ok_or("unknown app")?;
        info!(app = self.app.0, name = %app.opts.name, now = %sim.now(), sent = app.stats.sent_pkts, "应用停止");
        app.running = false;
        if let Some(id) = app.send_event.take() {
            sim.cancel(id);
        }
        Ok(())
    }
}

/// 数据包到达接收端
#[derive(Debug)]
pub struct DeliverPacket {
    pub app: AppId,
    pub bytes: u32,
    pub sent_at: SimTime,
}

impl Event for DeliverPacket {
    fn execute(self: Box<Self>, sim: &mut Simulator, world: &mut dyn World) -> EventResult {
        let w = demo_world(world)?;
        let delay_ns = sim.now().saturating_since(self.sent_at).0 as u64;
        let app = w.apps.get_mut(self.app.0).ok_or("unknown app")?;
        for stats in [&mut app.stats, &mut w.stats] {
            stats.delivered_pkts += 1;
            stats.delivered_bytes += u64::from(self.bytes);
            stats.total_delay_ns += delay_ns;
        }
        Ok(())
    }
}
