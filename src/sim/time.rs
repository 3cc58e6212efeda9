//! 仿真时间类型
//!
//! 定义仿真时间（绝对时刻）与时延（相对时间）及其单位转换。

use serde::{Deserialize, Serialize};
use std::fmt;

const NANOS_PER_SEC: f64 = 1_000_000_000.0;

/// 仿真时间（纳秒）。与墙钟时间无关，只由运行循环单调推进。
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
pub struct SimTime(pub u64);

impl SimTime {
    pub const ZERO: SimTime = SimTime(0);
    pub const MAX: SimTime = SimTime(u64::MAX);

    pub fn from_nanos(ns: u64) -> SimTime {
        SimTime(ns)
    }
    pub fn from_micros(us: u64) -> SimTime {
        SimTime(us.saturating_mul(1_000))
    }
    pub fn from_millis(ms: u64) -> SimTime {
        SimTime(ms.saturating_mul(1_000_000))
    }
    pub fn from_secs(s: u64) -> SimTime {
        SimTime(s.saturating_mul(1_000_000_000))
    }

    /// 小数秒（例如 `5.5`）。负数与 NaN 截断为 0，溢出截断为 `MAX`。
    pub fn from_secs_f64(s: f64) -> SimTime {
        SimTime((s * NANOS_PER_SEC).round() as u64)
    }

    pub fn as_nanos(self) -> u64 {
        self.0
    }

    pub fn as_secs_f64(self) -> f64 {
        self.0 as f64 / NANOS_PER_SEC
    }

    /// `self + delay`；结果为负或溢出时返回 `None`。
    pub fn checked_add(self, delay: SimDuration) -> Option<SimTime> {
        self.0.checked_add_signed(delay.0).map(SimTime)
    }

    /// 从 `earlier` 到 `self` 的时延；`earlier` 更晚时返回 0。
    pub fn saturating_since(self, earlier: SimTime) -> SimDuration {
        let ns = self.0.saturating_sub(earlier.0);
        SimDuration(i64::try_from(ns).unwrap_or(i64::MAX))
    }
}

impl fmt::Display for SimTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "+{}.{:09}s", self.0 / 1_000_000_000, self.0 % 1_000_000_000)
    }
}

/// 相对时延（纳秒，有符号）。
///
/// 允许构造负值，但任何调度接口收到负时延都会返回 `InvalidArgument`。
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
pub struct SimDuration(pub i64);

impl SimDuration {
    pub const ZERO: SimDuration = SimDuration(0);

    pub fn from_nanos(ns: i64) -> SimDuration {
        SimDuration(ns)
    }
    pub fn from_micros(us: i64) -> SimDuration {
        SimDuration(us.saturating_mul(1_000))
    }
    pub fn from_millis(ms: i64) -> SimDuration {
        SimDuration(ms.saturating_mul(1_000_000))
    }
    pub fn from_secs(s: i64) -> SimDuration {
        SimDuration(s.saturating_mul(1_000_000_000))
    }
    pub fn from_secs_f64(s: f64) -> SimDuration {
        SimDuration((s * NANOS_PER_SEC).round() as i64)
    }

    pub fn as_nanos(self) -> i64 {
        self.0
    }

    pub fn as_secs_f64(self) -> f64 {
        self.0 as f64 / NANOS_PER_SEC
    }

    pub fn is_negative(self) -> bool {
        self.0 < 0
    }
}
