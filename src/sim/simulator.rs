//! 仿真器
//!
//! 定义事件驱动仿真器，维护当前时间、事件队列、停止时刻与生命周期状态。

use super::error::{EventResult, SimError};
use super::event::{Event, EventFn};
use super::event_id::{EventId, EventSlab, EventState};
use super::scheduled_event::ScheduledEvent;
use super::time::{SimDuration, SimTime};
use super::trace::{ExecRecord, ExecTrace};
use super::world::World;
use std::cmp::Reverse;
use std::collections::BinaryHeap;
use tracing::{debug, info, trace};

/// 不属于任何节点的上下文。
pub const NO_CONTEXT: u32 = u32::MAX;

/// 仿真器生命周期状态。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SimState {
    /// 可以调度、运行。
    Ready,
    /// `run()` 正在执行。
    Running,
    /// 已 `destroy()`，除 `reset()` 外的调度/运行接口都会返回 `NotRunnable`。
    Destroyed,
}

/// 事件驱动仿真器：维护当前时间与事件队列。
///
/// 单线程：`schedule` / `cancel` 与回调都在调用 `run` 的线程上按程序顺序执行。
/// 同一时刻的事件按调度顺序执行，因此相同的调用序列总是得到相同的执行顺序。
pub struct Simulator {
    now: SimTime,
    next_seq: u64,
    q: BinaryHeap<ScheduledEvent>,
    slots: EventSlab,
    stops: BinaryHeap<Reverse<SimTime>>,
    stop_requested: bool,
    state: SimState,
    context: u32,
    executed: u64,
    exec_trace: Option<ExecTrace>,
}

impl Default for Simulator {
    fn default() -> Self {
        Self::new()
    }
}

impl Simulator {
    pub fn new() -> Self {
        Self {
            now: SimTime::ZERO,
            next_seq: 0,
            q: BinaryHeap::new(),
            slots: EventSlab::default(),
            stops: BinaryHeap::new(),
            stop_requested: false,
            state: SimState::Ready,
            context: NO_CONTEXT,
            executed: 0,
            exec_trace: None,
        }
    }

    /// 获取当前仿真时间
    pub fn now(&self) -> SimTime {
        self.now
    }

    pub fn state(&self) -> SimState {
        self.state
    }

    /// 当前正在执行的事件的上下文；回调之外为 `NO_CONTEXT`。
    pub fn context(&self) -> u32 {
        self.context
    }

    /// 可表示的最大仿真时间
    pub fn max_simulation_time(&self) -> SimTime {
        SimTime::MAX
    }

    /// 等待执行（未取消）的事件数
    pub fn pending_events(&self) -> usize {
        self.slots.pending()
    }

    /// 自构造（或上次 reset/destroy）以来已执行的事件数
    pub fn executed_events(&self) -> u64 {
        self.executed
    }

    /// 没有等待中的事件时为 true。
    pub fn is_finished(&self) -> bool {
        self.slots.pending() == 0
    }

    /// 开启执行轨迹记录。
    pub fn enable_exec_trace(&mut self) {
        self.exec_trace.get_or_insert_with(ExecTrace::default);
    }

    pub fn exec_trace(&self) -> Option<&ExecTrace> {
        self.exec_trace.as_ref()
    }

    pub fn take_exec_trace(&mut self) -> Option<ExecTrace> {
        self.exec_trace.take()
    }

    fn ensure_not_destroyed(&self, op: &'static str) -> Result<(), SimError> {
        match self.state {
            SimState::Destroyed => Err(SimError::NotRunnable { op }),
            SimState::Ready | SimState::Running => Ok(()),
        }
    }

    fn fire_time(&self, delay: SimDuration) -> Result<SimTime, SimError> {
        if delay.is_negative() {
            return Err(SimError::InvalidArgument(format!(
                "negative delay {}ns",
                delay.0
            )));
        }
        self.now.checked_add(delay).ok_or_else(|| {
            SimError::InvalidArgument(format!("now {} + delay {}ns overflows", self.now, delay.0))
        })
    }

    fn insert(&mut self, at: SimTime, context: u32, ev: Box<dyn Event>) -> EventId {
        let seq = self.next_seq;
        trace!(now = ?self.now, seq, "调度事件");

        self.next_seq = self.next_seq.wrapping_add(1);
        let id = self.slots.insert(at, seq, ev);
        self.q.push(ScheduledEvent {
            at,
            seq,
            id,
            context,
        });

        debug!(queue_size = self.q.len(), "事件已加入队列");
        id
    }

    /// 调度事件在 `now + delay` 执行，继承当前上下文。
    #[tracing::instrument(skip(self, ev), fields(event_type = std::any::type_name::<E>(), delay_ns = delay.0))]
    pub fn schedule<E: Event>(&mut self, delay: SimDuration, ev: E) -> Result<EventId, SimError> {
        self.ensure_not_destroyed("schedule")?;
        let at = self.fire_time(delay)?;
        Ok(self.insert(at, self.context, Box::new(ev)))
    }

    /// 调度事件在绝对时刻 `at` 执行；`at` 不能早于 `now()`。
    #[tracing::instrument(skip(self, ev), fields(event_type = std::any::type_name::<E>(), schedule_at = ?at))]
    pub fn schedule_at<E: Event>(&mut self, at: SimTime, ev: E) -> Result<EventId, SimError> {
        self.ensure_not_destroyed("schedule_at")?;
        if at < self.now {
            return Err(SimError::InvalidArgument(format!(
                "cannot schedule at {at}, which is before now {}",
                self.now
            )));
        }
        Ok(self.insert(at, self.context, Box::new(ev)))
    }

    /// 调度事件在当前时刻执行（排在当前时刻已有事件之后）。
    pub fn schedule_now<E: Event>(&mut self, ev: E) -> Result<EventId, SimError> {
        self.ensure_not_destroyed("schedule_now")?;
        Ok(self.insert(self.now, self.context, Box::new(ev)))
    }

    /// 调度事件在 `now + delay` 执行，并在执行期间把 `context()` 设为 `context`。
    #[tracing::instrument(skip(self, ev), fields(event_type = std::any::type_name::<E>(), delay_ns = delay.0))]
    pub fn schedule_with_context<E: Event>(
        &mut self,
        context: u32,
        delay: SimDuration,
        ev: E,
    ) -> Result<EventId, SimError> {
        self.ensure_not_destroyed("schedule_with_context")?;
        let at = self.fire_time(delay)?;
        Ok(self.insert(at, context, Box::new(ev)))
    }

    /// `schedule` 的闭包形式。
    pub fn schedule_fn<F>(&mut self, delay: SimDuration, f: F) -> Result<EventId, SimError>
    where
        F: FnOnce(&mut Simulator, &mut dyn World) -> EventResult + 'static,
    {
        self.schedule(delay, EventFn::new(f))
    }

    /// 取消一个事件。已执行、已取消或句柄过期时什么也不做。
    pub fn cancel(&mut self, id: EventId) {
        if self.slots.cancel(id) {
            debug!(uid = id.uid(), now = ?self.now, "事件已取消");
        }
    }

    pub fn event_state(&self, id: EventId) -> EventState {
        self.slots.state(id)
    }

    pub fn is_pending(&self, id: EventId) -> bool {
        self.slots.state(id) == EventState::Pending
    }

    pub fn is_expired(&self, id: EventId) -> bool {
        !self.is_pending(id)
    }

    /// 距离事件到期的剩余时延；事件不再等待时为 0。
    pub fn delay_left(&self, id: EventId) -> SimDuration {
        self.slots
            .due_at(id)
            .map(|at| at.saturating_since(self.now))
            .unwrap_or(SimDuration::ZERO)
    }

    /// 当前事件返回后停止运行循环。
    pub fn stop(&mut self) -> Result<(), SimError> {
        self.ensure_not_destroyed("stop")?;
        self.stop_requested = true;
        Ok(())
    }

    /// 在绝对时刻 `at` 放置停止标记：早于 `at` 的事件都会执行，`at` 及之后的都不执行。
    ///
    /// 多个停止标记同时存在时，最早的先生效；每个标记只生效一次。
    pub fn stop_at(&mut self, at: SimTime) -> Result<(), SimError> {
        self.ensure_not_destroyed("stop_at")?;
        if at < self.now {
            return Err(SimError::InvalidArgument(format!(
                "cannot stop at {at}, which is before now {}",
                self.now
            )));
        }
        debug!(stop_at = ?at, "设置停止时刻");
        self.stops.push(Reverse(at));
        Ok(())
    }

    /// 在 `now + delay` 放置停止标记。
    pub fn stop_after(&mut self, delay: SimDuration) -> Result<(), SimError> {
        self.ensure_not_destroyed("stop_after")?;
        let at = self.fire_time(delay)?;
        self.stop_at(at)
    }

    /// 运行直到事件队列为空或到达停止时刻。
    ///
    /// 回调返回的错误会立即终止循环并原样返回；出错事件之后的事件保持等待状态。
    #[tracing::instrument(skip(self, world))]
    pub fn run(&mut self, world: &mut dyn World) -> Result<(), SimError> {
        match self.state {
            SimState::Destroyed => return Err(SimError::NotRunnable { op: "run" }),
            SimState::Running => {
                return Err(SimError::InvalidState(
                    "run() called from inside an event callback".to_string(),
                ));
            }
            SimState::Ready => {}
        }

        info!("▶️  开始运行仿真");
        debug!(now = ?self.now, queue_size = self.q.len(), pending = self.slots.pending(), "初始状态");

        self.state = SimState::Running;
        let started = self.executed;
        let result = self.run_loop(world);
        self.state = SimState::Ready;
        self.context = NO_CONTEXT;

        match &result {
            Ok(()) => info!(
                total_events = self.executed - started,
                final_time = ?self.now,
                "✅ 仿真完成"
            ),
            Err(e) => info!(final_time = ?self.now, error = %e, "仿真因事件错误终止"),
        }
        result
    }

    fn run_loop(&mut self, world: &mut dyn World) -> Result<(), SimError> {
        loop {
            if self.stop_requested {
                self.stop_requested = false;
                debug!(now = ?self.now, "收到停止请求");
                return Ok(());
            }

            let next_stop = self.stops.peek().map(|r| r.0);
            let Some(top) = self.q.peek().copied() else {
                // 队列已空，但停止标记本身也是一个排队的时刻。
                if let Some(at) = next_stop {
                    self.stops.pop();
                    self.now = self.now.max(at);
                }
                return Ok(());
            };
            if let Some(at) = next_stop {
                if top.at >= at {
                    self.stops.pop();
                    self.now = self.now.max(at);
                    debug!(now = ?self.now, "到达停止时刻");
                    return Ok(());
                }
            }

            self.q.pop();
            let Some(ev) = self.slots.take(top.id) else {
                trace!(seq = top.seq, at = ?top.at, "跳过已取消事件");
                continue;
            };

            self.now = top.at;
            self.context = top.context;
            self.executed += 1;
            if let Some(t) = self.exec_trace.as_mut() {
                t.push(ExecRecord {
                    t_ns: top.at.0,
                    uid: top.seq,
                    context: (top.context != NO_CONTEXT).then_some(top.context),
                });
            }

            debug!(
                event_num = self.executed,
                now = ?self.now,
                seq = top.seq,
                remaining_queue = self.q.len(),
                "执行事件"
            );

            let res = ev.execute(self, world);
            self.context = NO_CONTEXT;
            res.map_err(SimError::Callback)?;
            world.on_tick(self);
        }
    }

    /// 释放所有剩余事件（回调随之析构），时钟归零，进入 `Destroyed` 状态。
    ///
    /// 可在任何非运行状态下调用，重复调用无副作用；运行中（回调内）调用返回 `InvalidState`。
    pub fn destroy(&mut self) -> Result<(), SimError> {
        if self.state == SimState::Running {
            return Err(SimError::InvalidState(
                "destroy() called from inside an event callback".to_string(),
            ));
        }
        info!(pending = self.slots.pending(), now = ?self.now, "销毁仿真器");
        self.clear();
        self.exec_trace = None;
        self.state = SimState::Destroyed;
        Ok(())
    }

    /// 重新初始化：等价于新构造的仿真器（已开启的执行轨迹会被清空但保持开启）。
    ///
    /// 旧的 `EventId` 在 reset 之后依然失效。
    pub fn reset(&mut self) -> Result<(), SimError> {
        if self.state == SimState::Running {
            return Err(SimError::InvalidState(
                "reset() called from inside an event callback".to_string(),
            ));
        }
        self.clear();
        if let Some(t) = self.exec_trace.as_mut() {
            t.records.clear();
        }
        self.state = SimState::Ready;
        Ok(())
    }

    fn clear(&mut self) {
        self.q.clear();
        self.slots.clear();
        self.stops.clear();
        self.stop_requested = false;
        self.now = SimTime::ZERO;
        self.next_seq = 0;
        self.context = NO_CONTEXT;
        self.executed = 0;
    }
}
