// Copyright 2025 the Thicket Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Deadline scheduling against event time.
//!
//! Timers are measured against event timestamps, never wall-clock reads.
//! The engine advances the queue to each incoming sample's timestamp
//! before processing the sample itself, so a deadline that ties with a
//! sample fires first, and tests drive time purely through synthetic
//! timestamps.

use alloc::vec::Vec;

use thicket_router::Timestamp;

/// Handle for one scheduled deadline. Cancelling a token that already
/// fired is a no-op.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub struct TimerToken(u64);

#[derive(Clone, Debug)]
struct Entry<T> {
    token: TimerToken,
    deadline: Timestamp,
    payload: T,
}

/// A timer that reached its deadline.
#[derive(Clone, Debug)]
pub struct Firing<T> {
    /// The handle returned when this timer was scheduled.
    pub token: TimerToken,
    /// The deadline it was scheduled for.
    pub deadline: Timestamp,
    /// Caller payload.
    pub payload: T,
}

/// Pending deadlines ordered by (deadline, schedule order).
#[derive(Clone, Debug)]
pub struct TimerQueue<T> {
    entries: Vec<Entry<T>>,
    next_token: u64,
}

impl<T> Default for TimerQueue<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> TimerQueue<T> {
    /// Create an empty queue.
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
            next_token: 0,
        }
    }

    /// Schedule a payload to fire at `deadline`.
    pub fn schedule(&mut self, deadline: Timestamp, payload: T) -> TimerToken {
        let token = TimerToken(self.next_token);
        self.next_token += 1;
        self.entries.push(Entry {
            token,
            deadline,
            payload,
        });
        token
    }

    /// Cancel a pending timer. Returns whether it was still pending.
    pub fn cancel(&mut self, token: TimerToken) -> bool {
        let before = self.entries.len();
        self.entries.retain(|e| e.token != token);
        self.entries.len() != before
    }

    /// Drain every timer with `deadline <= now`, in deadline order; equal
    /// deadlines fire in schedule order.
    pub fn advance_to(&mut self, now: Timestamp) -> Vec<Firing<T>> {
        let mut due: Vec<Entry<T>> = Vec::new();
        let mut i = 0;
        while i < self.entries.len() {
            if self.entries[i].deadline <= now {
                due.push(self.entries.remove(i));
            } else {
                i += 1;
            }
        }
        // Schedule order breaks deadline ties; tokens are monotonic.
        due.sort_by_key(|e| (e.deadline, e.token.0));
        due.into_iter()
            .map(|e| Firing {
                token: e.token,
                deadline: e.deadline,
                payload: e.payload,
            })
            .collect()
    }

    /// The earliest pending deadline, if any.
    pub fn next_deadline(&self) -> Option<Timestamp> {
        self.entries.iter().map(|e| e.deadline).min()
    }

    /// Whether nothing is pending.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fires_in_deadline_order_with_stable_ties() {
        let mut queue: TimerQueue<&str> = TimerQueue::new();
        queue.schedule(50, "b");
        queue.schedule(20, "a");
        queue.schedule(50, "c");

        let fired = queue.advance_to(60);
        let order: Vec<&str> = fired.iter().map(|f| f.payload).collect();
        assert_eq!(order, ["a", "b", "c"]);
        assert!(queue.is_empty());
    }

    #[test]
    fn advance_only_drains_due_timers() {
        let mut queue: TimerQueue<u32> = TimerQueue::new();
        queue.schedule(10, 1);
        queue.schedule(30, 2);

        let fired = queue.advance_to(10);
        assert_eq!(fired.len(), 1);
        assert_eq!(fired[0].payload, 1);
        assert_eq!(queue.next_deadline(), Some(30));
    }

    #[test]
    fn cancelled_timers_never_fire() {
        let mut queue: TimerQueue<u32> = TimerQueue::new();
        let token = queue.schedule(10, 1);
        queue.schedule(20, 2);

        assert!(queue.cancel(token));
        assert!(!queue.cancel(token), "double cancel is a no-op");

        let fired = queue.advance_to(100);
        assert_eq!(fired.len(), 1);
        assert_eq!(fired[0].payload, 2);
    }
}
