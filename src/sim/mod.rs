//! 仿真核心模块
//!
//! 此模块包含事件驱动仿真的核心组件：仿真时间、事件、事件句柄、世界和仿真器。

// 子模块声明
mod error;
mod event;
mod event_id;
mod scheduled_event;
mod simulator;
mod time;
mod trace;
mod world;

// 重新导出公共接口
pub use error::{BoxError, EventResult, SimError};
pub use event::{Event, EventFn};
pub use event_id::{EventId, EventState};
pub use simulator::{NO_CONTEXT, SimState, Simulator};
pub use time::{SimDuration, SimTime};
pub use trace::{ExecRecord, ExecTrace};
pub use world::World;
