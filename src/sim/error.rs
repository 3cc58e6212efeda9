//! 仿真器错误类型

use thiserror::Error;

/// 事件回调可返回的任意错误。
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// 事件回调的返回值。
pub type EventResult = Result<(), BoxError>;

/// 调度/运行接口的错误。
///
/// 前三类是调用方的编程错误，在出错的调用点立即返回；`Callback` 是事件回调
/// 返回的错误，原样从 `Simulator::run` 透传出来。
#[derive(Debug, Error)]
pub enum SimError {
    /// 负时延、早于 `now()` 的绝对时间、或时间溢出。
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// 在已 `destroy()` 的仿真器上调用 `schedule*` / `run` / `stop*`。
    #[error("simulator destroyed: `{op}` is not runnable until reset")]
    NotRunnable { op: &'static str },

    /// 回调中递归调用 `run()`，或在运行中调用 `destroy()` / `reset()`。
    #[error("invalid state: {0}")]
    InvalidState(String),

    /// 事件回调返回的错误，运行循环随即终止。
    #[error(transparent)]
    Callback(BoxError),
}

impl SimError {
    /// 若为回调错误，返回原始错误。
    pub fn callback_error(&self) -> Option<&(dyn std::error::Error + Send + Sync + 'static)> {
        match self {
            SimError::Callback(e) => Some(e.as_ref()),
            _ => None,
        }
    }
}
