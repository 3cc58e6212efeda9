//! 调度事件
//!
//! 定义事件队列中的条目及其优先级比较。回调本身存放在事件槽中，条目只携带排序键与句柄。

use super::event_id::EventId;
use super::time::SimTime;
use std::cmp::Ordering;

/// 调度事件，包含执行时间、序列号、句柄与上下文。
#[derive(Debug, Clone, Copy)]
pub(crate) struct ScheduledEvent {
    pub(crate) at: SimTime,
    pub(crate) seq: u64,
    pub(crate) id: EventId,
    pub(crate) context: u32,
}

// BinaryHeap 是 max-heap；我们需要最小时间优先，因此反向比较。
impl Ord for ScheduledEvent {
    fn cmp(&self, other: &Self) -> Ordering {
        match self.at.cmp(&other.at) {
            Ordering::Equal => self.seq.cmp(&other.seq),
            ord => ord,
        }
        .reverse()
    }
}

impl PartialOrd for ScheduledEvent {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for ScheduledEvent {
    fn eq(&self, other: &Self) -> bool {
        self.at == other.at && self.seq == other.seq
    }
}

impl Eq for ScheduledEvent {}
