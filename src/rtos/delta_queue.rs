//! Delay-sorted pending task queue
//!
//! Tasks are kept in due order, each storing its delay *relative to the
//! task in front of it*. Summing the relative delays from the head up to a
//! node gives that node's remaining delay, so advancing time only ever
//! touches the head node.
//!
//! Nodes live in a fixed arena and are linked by index. Free slots form a
//! second list threaded through the same `next` field. Due nodes are moved
//! to a ready list by [`DeltaQueue::pop_all_due`] and handed out one at a
//! time by [`DeltaQueue::take_ready`], which frees their slot.

use super::task::{TaskId, TaskRecord};
use super::{ErrorCode, Result};

#[derive(Copy, Clone)]
struct Node {
    record: Option<TaskRecord>,
    delay: u32,
    next: Option<usize>,
}

impl Node {
    const EMPTY: Node = Node {
        record: None,
        delay: 0,
        next: None,
    };
}

/// What a single tick did to the queue
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum TickOutcome {
    /// Queue empty, nothing touched
    Idle,
    /// Head delay decremented by one
    Decremented,
    /// Head already due; the tick was added to the lag counter
    Lagged,
}

/// Snapshot of one pending task, as yielded by [`DeltaQueue::iter`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PendingTask {
    pub id: TaskId,
    pub period: u32,
    /// Ticks counted from the task in front of this one
    pub relative: u32,
    /// Ticks from now until the task is due
    pub remaining: u32,
}

/// Fixed-capacity delta queue
pub struct DeltaQueue<const N: usize> {
    nodes: [Node; N],
    head: Option<usize>,
    ready_head: Option<usize>,
    ready_tail: Option<usize>,
    free: Option<usize>,
    /// Ticks that elapsed while the head was already due
    lag: u32,
    len: usize,
}

impl<const N: usize> DeltaQueue<N> {
    pub const fn new() -> Self {
        let mut nodes = [Node::EMPTY; N];
        let mut i = 0;
        while i + 1 < N {
            nodes[i].next = Some(i + 1);
            i += 1;
        }

        Self {
            nodes,
            head: None,
            ready_head: None,
            ready_tail: None,
            free: if N > 0 { Some(0) } else { None },
            lag: 0,
            len: 0,
        }
    }

    /// Queue `record` to become due `delay` ticks from now
    ///
    /// The record goes in front of the first task due strictly later, so
    /// tasks due on the same tick keep their insertion order. Nothing is
    /// touched when the arena is full, or when `delay` plus the pending lag
    /// does not fit in a `u32`.
    pub fn insert(&mut self, record: TaskRecord, delay: u32) -> Result<()> {
        // Queue positions trail real time by `lag` ticks
        let target = delay
            .checked_add(self.lag)
            .ok_or(ErrorCode::DelayOutOfRange)?;

        let mut prev = None;
        let mut cur = self.head;
        let mut acc: u32 = 0;
        while let Some(idx) = cur {
            let reach = acc.saturating_add(self.nodes[idx].delay);
            if reach > target {
                break;
            }
            acc = reach;
            prev = cur;
            cur = self.nodes[idx].next;
        }

        let relative = target - acc;
        let idx = self.alloc(record, relative)?;

        self.nodes[idx].next = cur;
        if let Some(next) = cur {
            self.nodes[next].delay -= relative;
        }
        match prev {
            Some(p) => self.nodes[p].next = Some(idx),
            None => self.head = Some(idx),
        }
        Ok(())
    }

    /// Advance time by one tick. Touches the head node only.
    #[inline]
    pub fn tick(&mut self) -> TickOutcome {
        match self.head {
            None => TickOutcome::Idle,
            Some(idx) if self.nodes[idx].delay > 0 => {
                self.nodes[idx].delay -= 1;
                TickOutcome::Decremented
            }
            Some(_) => {
                self.lag = self.lag.saturating_add(1);
                TickOutcome::Lagged
            }
        }
    }

    /// Remove the task with `id`, whether pending or ready
    ///
    /// A pending task's delay is donated to its successor so every other
    /// task keeps its due time.
    pub fn remove(&mut self, id: TaskId) -> Result<TaskRecord> {
        if let Some((prev, idx)) = self.find(self.head, id) {
            let Node { delay, next, .. } = self.nodes[idx];
            if let Some(n) = next {
                self.nodes[n].delay = self.nodes[n].delay.saturating_add(delay);
            }
            match prev {
                Some(p) => self.nodes[p].next = next,
                None => self.head = next,
            }
            if self.head.is_none() {
                self.lag = 0;
            }
            return self.release(idx).ok_or(ErrorCode::CannotDeleteTask);
        }

        if let Some((prev, idx)) = self.find(self.ready_head, id) {
            let next = self.nodes[idx].next;
            match prev {
                Some(p) => self.nodes[p].next = next,
                None => self.ready_head = next,
            }
            if self.ready_tail == Some(idx) {
                self.ready_tail = prev;
            }
            return self.release(idx).ok_or(ErrorCode::CannotDeleteTask);
        }

        Err(ErrorCode::CannotDeleteTask)
    }

    /// Move every due task from the front of the queue to the ready list
    ///
    /// Accumulated lag is applied first, so tasks that fell due while the
    /// head was waiting for dispatch are included. Returns how many tasks
    /// were moved.
    pub fn pop_all_due(&mut self) -> usize {
        let mut count = 0;
        while let Some(idx) = self.head {
            if self.nodes[idx].delay > 0 {
                if self.lag == 0 {
                    break;
                }
                let step = self.lag.min(self.nodes[idx].delay);
                self.nodes[idx].delay -= step;
                self.lag -= step;
                if self.nodes[idx].delay > 0 {
                    break;
                }
            }

            self.head = self.nodes[idx].next;
            self.nodes[idx].next = None;
            match self.ready_tail {
                Some(tail) => self.nodes[tail].next = Some(idx),
                None => self.ready_head = Some(idx),
            }
            self.ready_tail = Some(idx);
            count += 1;
        }

        if self.head.is_none() {
            self.lag = 0;
        }
        count
    }

    /// Hand out the next ready task and free its slot
    pub fn take_ready(&mut self) -> Option<TaskRecord> {
        let idx = self.ready_head?;
        self.ready_head = self.nodes[idx].next;
        if self.ready_head.is_none() {
            self.ready_tail = None;
        }
        self.release(idx)
    }

    pub fn contains(&self, id: TaskId) -> bool {
        self.find(self.head, id).is_some() || self.find(self.ready_head, id).is_some()
    }

    /// Pending tasks in due order
    pub fn iter(&self) -> Pending<'_, N> {
        Pending {
            queue: self,
            cur: self.head,
            acc: 0,
        }
    }

    /// Occupied slots, pending and ready
    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    #[inline]
    pub const fn capacity(&self) -> usize {
        N
    }

    fn find(&self, start: Option<usize>, id: TaskId) -> Option<(Option<usize>, usize)> {
        let mut prev = None;
        let mut cur = start;
        while let Some(idx) = cur {
            if matches!(self.nodes[idx].record, Some(r) if r.id == id) {
                return Some((prev, idx));
            }
            prev = cur;
            cur = self.nodes[idx].next;
        }
        None
    }

    fn alloc(&mut self, record: TaskRecord, delay: u32) -> Result<usize> {
        let idx = self.free.ok_or(ErrorCode::TooManyTasks)?;
        self.free = self.nodes[idx].next;
        self.nodes[idx] = Node {
            record: Some(record),
            delay,
            next: None,
        };
        self.len += 1;
        Ok(idx)
    }

    fn release(&mut self, idx: usize) -> Option<TaskRecord> {
        let record = self.nodes[idx].record.take();
        self.nodes[idx].delay = 0;
        self.nodes[idx].next = self.free;
        self.free = Some(idx);
        self.len -= 1;
        record
    }
}

impl<const N: usize> Default for DeltaQueue<N> {
    fn default() -> Self {
        Self::new()
    }
}

/// Iterator over pending tasks, see [`DeltaQueue::iter`]
pub struct Pending<'a, const N: usize> {
    queue: &'a DeltaQueue<N>,
    cur: Option<usize>,
    acc: u32,
}

impl<'a, const N: usize> Iterator for Pending<'a, N> {
    type Item = PendingTask;

    fn next(&mut self) -> Option<PendingTask> {
        let idx = self.cur?;
        let node = &self.queue.nodes[idx];
        self.cur = node.next;
        self.acc = self.acc.saturating_add(node.delay);
        let record = node.record?;
        Some(PendingTask {
            id: record.id,
            period: record.period,
            relative: node.delay,
            remaining: self.acc.saturating_sub(self.queue.lag),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::vec::Vec;

    fn noop() {}

    fn record(id: u32, period: u32) -> TaskRecord {
        TaskRecord::new(TaskId::new(id), noop, period)
    }

    /// (id, relative, remaining) for each pending task, in queue order
    fn snapshot<const N: usize>(q: &DeltaQueue<N>) -> Vec<(u32, u32, u32)> {
        q.iter()
            .map(|t| (t.id.get(), t.relative, t.remaining))
            .collect()
    }

    fn drain<const N: usize>(q: &mut DeltaQueue<N>) -> Vec<u32> {
        q.pop_all_due();
        core::iter::from_fn(|| q.take_ready())
            .map(|r| r.id.get())
            .collect()
    }

    #[test]
    fn insert_keeps_relative_delays() {
        let mut q: DeltaQueue<8> = DeltaQueue::new();
        q.insert(record(1, 0), 7).unwrap();
        q.insert(record(2, 0), 3).unwrap();
        q.insert(record(3, 0), 12).unwrap();
        q.insert(record(4, 0), 5).unwrap();

        assert_eq!(
            snapshot(&q),
            [(2, 3, 3), (4, 2, 5), (1, 2, 7), (3, 5, 12)]
        );
        assert_eq!(q.len(), 4);
    }

    #[test]
    fn equal_due_times_keep_insertion_order() {
        let mut q: DeltaQueue<8> = DeltaQueue::new();
        q.insert(record(1, 0), 5).unwrap();
        q.insert(record(2, 0), 5).unwrap();
        q.insert(record(3, 0), 3).unwrap();

        assert_eq!(snapshot(&q), [(3, 3, 3), (1, 2, 5), (2, 0, 5)]);
    }

    #[test]
    fn tick_touches_only_the_head() {
        let mut q: DeltaQueue<8> = DeltaQueue::new();
        assert_eq!(q.tick(), TickOutcome::Idle);

        q.insert(record(1, 0), 2).unwrap();
        q.insert(record(2, 0), 4).unwrap();
        q.insert(record(3, 0), 9).unwrap();

        let before = snapshot(&q);
        assert_eq!(q.tick(), TickOutcome::Decremented);
        let after = snapshot(&q);

        let changed: Vec<_> = before
            .iter()
            .zip(after.iter())
            .filter(|(b, a)| b.1 != a.1)
            .collect();
        assert_eq!(changed.len(), 1);
        assert_eq!(after[0], (1, 1, 1));
    }

    #[test]
    fn due_head_accumulates_lag_without_touching_nodes() {
        let mut q: DeltaQueue<8> = DeltaQueue::new();
        q.insert(record(1, 0), 1).unwrap();
        q.insert(record(2, 0), 4).unwrap();

        assert_eq!(q.tick(), TickOutcome::Decremented);
        assert_eq!(q.tick(), TickOutcome::Lagged);
        assert_eq!(q.tick(), TickOutcome::Lagged);
        assert_eq!(q.tick(), TickOutcome::Lagged);

        // Relative delays are untouched, remaining time reflects the lag
        assert_eq!(snapshot(&q), [(1, 0, 0), (2, 3, 0)]);
        assert_eq!(drain(&mut q), [1, 2]);
        assert!(q.is_empty());
    }

    #[test]
    fn partial_lag_is_folded_into_next_head() {
        let mut q: DeltaQueue<8> = DeltaQueue::new();
        q.insert(record(1, 0), 0).unwrap();
        q.insert(record(2, 0), 5).unwrap();

        q.tick();
        q.tick();
        assert_eq!(drain(&mut q), [1]);
        assert_eq!(snapshot(&q), [(2, 3, 3)]);
    }

    #[test]
    fn insert_while_lagging_counts_from_now() {
        let mut q: DeltaQueue<8> = DeltaQueue::new();
        q.insert(record(1, 0), 0).unwrap();
        q.insert(record(2, 0), 10).unwrap();
        q.tick();
        q.tick();

        q.insert(record(3, 0), 4).unwrap();
        assert_eq!(
            q.iter().map(|t| (t.id.get(), t.remaining)).collect::<Vec<_>>(),
            [(1, 0), (3, 4), (2, 8)]
        );
    }

    #[test]
    fn delay_overflowing_lag_is_rejected() {
        let mut q: DeltaQueue<8> = DeltaQueue::new();
        q.insert(record(1, 0), 0).unwrap();
        q.tick();
        q.tick();
        let before = snapshot(&q);

        // Would land earlier than requested if clamped
        assert_eq!(
            q.insert(record(2, 0), u32::MAX - 1).unwrap_err(),
            ErrorCode::DelayOutOfRange
        );
        assert_eq!(snapshot(&q), before);
        assert_eq!(q.len(), 1);

        q.insert(record(3, 0), u32::MAX - 2).unwrap();
        assert_eq!(
            q.iter().map(|t| (t.id.get(), t.remaining)).collect::<Vec<_>>(),
            [(1, 0), (3, u32::MAX - 2)]
        );
    }

    #[test]
    fn remove_donates_delay_to_successor() {
        let mut q: DeltaQueue<8> = DeltaQueue::new();
        q.insert(record(1, 0), 3).unwrap();
        q.insert(record(2, 0), 7).unwrap();
        q.insert(record(3, 0), 12).unwrap();

        let removed = q.remove(TaskId::new(2)).unwrap();
        assert_eq!(removed.id, TaskId::new(2));
        assert_eq!(snapshot(&q), [(1, 3, 3), (3, 9, 12)]);

        q.remove(TaskId::new(1)).unwrap();
        assert_eq!(snapshot(&q), [(3, 12, 12)]);

        q.remove(TaskId::new(3)).unwrap();
        assert!(q.is_empty());
    }

    #[test]
    fn remove_unknown_id_leaves_queue_alone() {
        let mut q: DeltaQueue<4> = DeltaQueue::new();
        q.insert(record(1, 0), 3).unwrap();
        let before = snapshot(&q);

        assert_eq!(q.remove(TaskId::new(9)).unwrap_err(), ErrorCode::CannotDeleteTask);
        assert_eq!(snapshot(&q), before);
    }

    #[test]
    fn remove_cancels_ready_task() {
        let mut q: DeltaQueue<4> = DeltaQueue::new();
        q.insert(record(1, 0), 0).unwrap();
        q.insert(record(2, 0), 0).unwrap();
        q.insert(record(3, 0), 0).unwrap();
        assert_eq!(q.pop_all_due(), 3);

        q.remove(TaskId::new(3)).unwrap();
        q.remove(TaskId::new(1)).unwrap();
        assert!(!q.contains(TaskId::new(1)));
        assert!(q.contains(TaskId::new(2)));

        assert_eq!(q.take_ready().map(|r| r.id.get()), Some(2));
        assert!(q.take_ready().is_none());
        assert!(q.is_empty());
    }

    #[test]
    fn full_arena_rejects_without_mutation() {
        let mut q: DeltaQueue<2> = DeltaQueue::new();
        q.insert(record(1, 0), 4).unwrap();
        q.insert(record(2, 0), 8).unwrap();
        let before = snapshot(&q);

        assert_eq!(q.insert(record(3, 0), 1).unwrap_err(), ErrorCode::TooManyTasks);
        assert_eq!(snapshot(&q), before);
        assert_eq!(q.capacity(), 2);
    }

    #[test]
    fn slots_are_reused_after_dispatch() {
        let mut q: DeltaQueue<1> = DeltaQueue::new();
        for id in 1..=5 {
            q.insert(record(id, 0), 0).unwrap();
            assert_eq!(drain(&mut q), [id]);
        }
    }

    #[test]
    fn pop_stops_at_first_pending_task() {
        let mut q: DeltaQueue<8> = DeltaQueue::new();
        q.insert(record(1, 0), 0).unwrap();
        q.insert(record(2, 0), 0).unwrap();
        q.insert(record(3, 0), 1).unwrap();

        assert_eq!(q.pop_all_due(), 2);
        assert_eq!(q.pop_all_due(), 0);
        assert_eq!(snapshot(&q), [(3, 1, 1)]);
        assert_eq!(q.len(), 3);
    }
}
