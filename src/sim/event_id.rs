//! 事件句柄与事件槽
//!
//! 仿真器独占所有已调度的事件，调用方只持有 `EventId`。`EventId` 由槽位下标与
//! 代数（generation）组成：槽位被释放时代数加一，过期的句柄不会误伤复用了同一
//! 槽位的新事件。

use super::event::Event;
use super::time::SimTime;

/// 已调度事件的句柄，仅用于查询与取消。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct EventId {
    slot: u32,
    generation: u32,
    uid: u64,
}

impl EventId {
    /// 调度时分配的单调递增序号，同一时刻的事件按它排序。
    pub fn uid(&self) -> u64 {
        self.uid
    }
}

/// 事件句柄指向的事件当前所处的状态。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventState {
    /// 仍在队列中，到期后会执行。
    Pending,
    /// 已取消，队列中的条目尚未被弹出（惰性删除）。
    Cancelled,
    /// 已执行、或已取消且条目已被弹出、或仿真器已被 destroy/reset。
    Expired,
}

enum SlotEntry {
    Vacant,
    Pending { at: SimTime, ev: Box<dyn Event> },
    Cancelled,
}

struct Slot {
    generation: u32,
    entry: SlotEntry,
}

/// 事件槽（arena）。
#[derive(Default)]
pub(crate) struct EventSlab {
    slots: Vec<Slot>,
    free: Vec<u32>,
    pending: usize,
}

impl EventSlab {
    pub(crate) fn insert(&mut self, at: SimTime, uid: u64, ev: Box<dyn Event>) -> EventId {
        let entry = SlotEntry::Pending { at, ev };
        let slot = match self.free.pop() {
            Some(slot) => {
                self.slots[slot as usize].entry = entry;
                slot
            }
            None => {
                let slot = self.slots.len() as u32;
                self.slots.push(Slot {
                    generation: 0,
                    entry,
                });
                slot
            }
        };
        self.pending += 1;
        EventId {
            slot,
            generation: self.slots[slot as usize].generation,
            uid,
        }
    }

    fn live(&self, id: EventId) -> Option<&Slot> {
        self.slots
            .get(id.slot as usize)
            .filter(|s| s.generation == id.generation)
    }

    fn live_mut(&mut self, id: EventId) -> Option<&mut Slot> {
        self.slots
            .get_mut(id.slot as usize)
            .filter(|s| s.generation == id.generation)
    }

    pub(crate) fn state(&self, id: EventId) -> EventState {
        match self.live(id).map(|s| &s.entry) {
            Some(SlotEntry::Pending { .. }) => EventState::Pending,
            Some(SlotEntry::Cancelled) => EventState::Cancelled,
            Some(SlotEntry::Vacant) | None => EventState::Expired,
        }
    }

    /// 若仍在等待执行，返回其到期时间。
    pub(crate) fn due_at(&self, id: EventId) -> Option<SimTime> {
        match self.live(id).map(|s| &s.entry) {
            Some(SlotEntry::Pending { at, .. }) => Some(*at),
            _ => None,
        }
    }

    /// 把等待中的事件标记为已取消，并立即释放其回调。其他状态下什么也不做。
    pub(crate) fn cancel(&mut self, id: EventId) -> bool {
        let Some(slot) = self.live_mut(id) else {
            return false;
        };
        if !matches!(slot.entry, SlotEntry::Pending { .. }) {
            return false;
        }
        // 先换出再 drop，回调的析构不会看到半更新的槽。
        let old = std::mem::replace(&mut slot.entry, SlotEntry::Cancelled);
        self.pending -= 1;
        drop(old);
        true
    }

    /// 队列条目弹出时调用：释放槽位，若事件仍在等待则交出回调。
    pub(crate) fn take(&mut self, id: EventId) -> Option<Box<dyn Event>> {
        let slot = self.live_mut(id)?;
        let entry = std::mem::replace(&mut slot.entry, SlotEntry::Vacant);
        slot.generation = slot.generation.wrapping_add(1);
        self.free.push(id.slot);
        match entry {
            SlotEntry::Pending { ev, .. } => {
                self.pending -= 1;
                Some(ev)
            }
            SlotEntry::Cancelled | SlotEntry::Vacant => None,
        }
    }

    /// 等待执行（未取消）的事件数。
    pub(crate) fn pending(&self) -> usize {
        self.pending
    }

    /// 释放所有事件。槽位保留并推进代数，旧句柄在之后的复用中依然失效。
    pub(crate) fn clear(&mut self) {
        let mut released = Vec::new();
        self.free.clear();
        for (idx, slot) in self.slots.iter_mut().enumerate() {
            let entry = std::mem::replace(&mut slot.entry, SlotEntry::Vacant);
            slot.generation = slot.generation.wrapping_add(1);
            self.free.push(idx as u32);
            released.push(entry);
        }
        self.pending = 0;
        // 回调在槽位整理完之后才析构。
        drop(released);
    }
}
