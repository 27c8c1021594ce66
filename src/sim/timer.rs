//! Deferred actions keyed by simulation time
//!
//! A min-heap of `(fire_time, seq, payload)`. Entries with equal fire times
//! come out in the order they were scheduled. The clock is `f64` so 1/60 s
//! steps still register after weeks of uptime.

use std::cmp::Ordering;
use std::collections::BinaryHeap;

#[derive(Debug)]
struct Scheduled<T> {
    fire_at: f64,
    seq: u64,
    payload: T,
}

impl<T> PartialEq for Scheduled<T> {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl<T> Eq for Scheduled<T> {}

impl<T> PartialOrd for Scheduled<T> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl<T> Ord for Scheduled<T> {
    // Reversed so BinaryHeap (a max-heap) pops the earliest entry
    fn cmp(&self, other: &Self) -> Ordering {
        other
            .fire_at
            .total_cmp(&self.fire_at)
            .then_with(|| other.seq.cmp(&self.seq))
    }
}

/// Queue of payloads to release once the clock passes their fire time
#[derive(Debug)]
pub struct TimerQueue<T> {
    now: f64,
    next_seq: u64,
    heap: BinaryHeap<Scheduled<T>>,
}

impl<T> Default for TimerQueue<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> TimerQueue<T> {
    pub fn new() -> Self {
        Self {
            now: 0.0,
            next_seq: 0,
            heap: BinaryHeap::new(),
        }
    }

    /// Current clock value
    pub fn now(&self) -> f64 {
        self.now
    }

    pub fn len(&self) -> usize {
        self.heap.len()
    }

    pub fn is_empty(&self) -> bool {
        self.heap.is_empty()
    }

    /// Schedule `payload` to fire `delay` seconds from now
    pub fn schedule(&mut self, delay: f32, payload: T) {
        let seq = self.next_seq;
        self.next_seq += 1;
        self.heap.push(Scheduled {
            fire_at: self.now + f64::from(delay.max(0.0)),
            seq,
            payload,
        });
    }

    /// Advance the clock and return every payload that is now due, earliest first
    pub fn advance(&mut self, dt: f32) -> Vec<T> {
        self.now += f64::from(dt);
        let mut due = Vec::new();
        while self
            .heap
            .peek()
            .is_some_and(|s| s.fire_at <= self.now + f64::from(crate::consts::TIME_EPSILON))
        {
            if let Some(s) = self.heap.pop() {
                due.push(s.payload);
            }
        }
        due
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fires_in_time_order() {
        let mut q = TimerQueue::new();
        q.schedule(0.3, "c");
        q.schedule(0.1, "a");
        q.schedule(0.2, "b");

        assert!(q.advance(0.05).is_empty());
        assert_eq!(q.advance(0.1), vec!["a"]);
        assert_eq!(q.advance(0.5), vec!["b", "c"]);
        assert!(q.is_empty());
    }

    #[test]
    fn test_equal_times_are_fifo() {
        let mut q = TimerQueue::new();
        q.schedule(1.0, 1);
        q.schedule(1.0, 2);
        q.schedule(1.0, 3);
        assert_eq!(q.advance(1.0), vec![1, 2, 3]);
    }

    #[test]
    fn test_delay_is_relative_to_clock() {
        let mut q = TimerQueue::new();
        q.advance(2.0);
        q.schedule(0.5, ());
        assert!(q.advance(0.4).is_empty());
        assert_eq!(q.advance(0.1).len(), 1);
        assert!((q.now() - 2.5).abs() < 1e-5);
    }

    #[test]
    fn test_small_steps_fire_after_long_uptime() {
        let mut q = TimerQueue::new();
        q.advance(600_000.0);
        q.schedule(1.0, 7);

        let mut fired = Vec::new();
        for _ in 0..59 {
            fired.extend(q.advance(1.0 / 60.0));
        }
        assert!(fired.is_empty());
        for _ in 0..2 {
            fired.extend(q.advance(1.0 / 60.0));
        }
        assert_eq!(fired, vec![7]);
        assert!(q.now() > 600_001.0 - 1e-3);
    }
}
