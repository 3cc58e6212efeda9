//! 事件 trait
//!
//! 定义仿真事件接口，以及把闭包包装成事件的适配器。

use super::error::EventResult;
use super::simulator::Simulator;
use super::world::World;

/// 事件：可被调度执行。使用 `self: Box<Self>` 以支持 move/所有权转移。
///
/// 回调内可以继续 `schedule` / `cancel`，这些改动对当前运行循环立即可见。
/// 返回 `Err` 会终止 `Simulator::run` 并把错误交给调用方。
pub trait Event: 'static {
    fn execute(self: Box<Self>, sim: &mut Simulator, world: &mut dyn World) -> EventResult;
}

/// 闭包事件：让闭包可以交给任意 `schedule*` 接口。
///
/// ```ignore
/// sim.schedule_now(EventFn::new(|sim, _world| {
///     tracing::info!(now = %sim.now(), "tick");
///     Ok(())
/// }))?;
/// ```
pub struct EventFn<F>(F);

impl<F> EventFn<F>
where
    F: FnOnce(&mut Simulator, &mut dyn World) -> EventResult + 'static,
{
    pub fn new(f: F) -> Self {
        Self(f)
    }
}

impl<F> Event for EventFn<F>
where
    F: FnOnce(&mut Simulator, &mut dyn World) -> EventResult + 'static,
{
    fn execute(self: Box<Self>, sim: &mut Simulator, world: &mut dyn World) -> EventResult {
        (self.0)(sim, world)
    }
}
