// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 The tagmod Authors

//! Deferred task scheduler
//!
//! Script bodies may schedule continuations (timers, callbacks) that run
//! after the page's synchronous phase. The scheduler keeps them in a
//! min-heap ordered by due time and drains them on the single execution
//! thread with virtual time, so delays never make tests wait.

use crate::error::Result;
use crate::runtime::Runtime;
use std::cell::{Cell, RefCell};
use std::cmp::Ordering;
use std::collections::BinaryHeap;
use tracing::debug;

/// Unique identifier for a scheduled task
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TaskId(pub u64);

type TaskFn = Box<dyn FnOnce(&Runtime) -> Result<()>>;

struct ScheduledTask {
    due: u64,
    seq: u64,
    task: TaskFn,
}

impl PartialEq for ScheduledTask {
    fn eq(&self, other: &Self) -> bool {
        self.due == other.due && self.seq == other.seq
    }
}

impl Eq for ScheduledTask {}

impl PartialOrd for ScheduledTask {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for ScheduledTask {
    fn cmp(&self, other: &Self) -> Ordering {
        // Reverse ordering for min-heap (earliest due time first, FIFO on ties)
        other
            .due
            .cmp(&self.due)
            .then_with(|| other.seq.cmp(&self.seq))
    }
}

/// Single-threaded virtual-time task queue
pub struct Scheduler {
    queue: RefCell<BinaryHeap<ScheduledTask>>,
    now: Cell<u64>,
    next_seq: Cell<u64>,
}

impl Scheduler {
    /// Create an empty scheduler at virtual time zero
    pub fn new() -> Self {
        Self {
            queue: RefCell::new(BinaryHeap::new()),
            now: Cell::new(0),
            next_seq: Cell::new(1),
        }
    }

    /// Schedule a task `delay_ms` of virtual time from now
    pub fn schedule<F>(&self, delay_ms: u64, task: F) -> TaskId
    where
        F: FnOnce(&Runtime) -> Result<()> + 'static,
    {
        let seq = self.next_seq.get();
        self.next_seq.set(seq + 1);
        self.queue.borrow_mut().push(ScheduledTask {
            due: self.now.get().saturating_add(delay_ms),
            seq,
            task: Box::new(task),
        });
        TaskId(seq)
    }

    /// Drain the queue in due order, advancing virtual time to each task's
    /// deadline. Tasks scheduled while draining run too. A failing task is
    /// logged and does not stop the drain; there is no caller to receive
    /// its error. Returns the number of tasks run.
    pub fn run(&self, runtime: &Runtime) -> usize {
        let mut ran = 0;
        loop {
            let Some(next) = self.queue.borrow_mut().pop() else {
                break;
            };
            self.now.set(next.due);
            if let Err(error) = (next.task)(runtime) {
                debug!("deferred task {} failed: {}", next.seq, error);
            }
            ran += 1;
        }
        ran
    }

    /// Current virtual time in milliseconds
    pub fn now(&self) -> u64 {
        self.now.get()
    }

    /// Number of tasks waiting to run
    pub fn pending(&self) -> usize {
        self.queue.borrow().len()
    }
}

impl Default for Scheduler {
    fn default() -> Self {
        Self::new()
    }
}
