//! Deterministic timeline of deferred actions
//!
//! Actions are queued with an absolute simulation time and drained by the
//! frame loop once that time is reached. Ties run in insertion order.

use std::cmp::Ordering;
use std::collections::BinaryHeap;

#[derive(Debug, Clone)]
struct Scheduled<A> {
    at: f32,
    seq: u64,
    action: A,
}

impl<A> PartialEq for Scheduled<A> {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl<A> Eq for Scheduled<A> {}

impl<A> PartialOrd for Scheduled<A> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl<A> Ord for Scheduled<A> {
    // Reversed so the max-heap pops the earliest entry
    fn cmp(&self, other: &Self) -> Ordering {
        other
            .at
            .total_cmp(&self.at)
            .then_with(|| other.seq.cmp(&self.seq))
    }
}

/// Priority queue of "apply at time T" actions
#[derive(Debug, Clone)]
pub struct Timeline<A> {
    heap: BinaryHeap<Scheduled<A>>,
    next_seq: u64,
}

impl<A> Default for Timeline<A> {
    fn default() -> Self {
        Self::new()
    }
}

impl<A> Timeline<A> {
    pub fn new() -> Self {
        Self {
            heap: BinaryHeap::new(),
            next_seq: 0,
        }
    }

    /// Queue an action for time `at`
    pub fn schedule(&mut self, at: f32, action: A) {
        let seq = self.next_seq;
        self.next_seq += 1;
        self.heap.push(Scheduled { at, seq, action });
    }

    /// Pop every action due at or before `now`, earliest first
    pub fn drain_due(&mut self, now: f32) -> Vec<A> {
        let mut due = Vec::new();
        while self.heap.peek().is_some_and(|s| s.at <= now) {
            if let Some(entry) = self.heap.pop() {
                due.push(entry.action);
            }
        }
        due
    }

    /// Time of the next pending action
    pub fn next_due(&self) -> Option<f32> {
        self.heap.peek().map(|s| s.at)
    }

    pub fn len(&self) -> usize {
        self.heap.len()
    }

    pub fn is_empty(&self) -> bool {
        self.heap.is_empty()
    }

    pub fn clear(&mut self) {
        self.heap.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_drains_in_time_order() {
        let mut timeline = Timeline::new();
        timeline.schedule(2.0, "late");
        timeline.schedule(0.5, "early");
        timeline.schedule(1.0, "middle");
        assert_eq!(timeline.next_due(), Some(0.5));

        assert_eq!(timeline.drain_due(1.0), vec!["early", "middle"]);
        assert_eq!(timeline.len(), 1);
        assert!(timeline.drain_due(1.5).is_empty());
        assert_eq!(timeline.drain_due(2.0), vec!["late"]);
        assert!(timeline.is_empty());
    }

    #[test]
    fn test_ties_keep_insertion_order() {
        let mut timeline = Timeline::new();
        for i in 0..5 {
            timeline.schedule(1.0, i);
        }
        assert_eq!(timeline.drain_due(1.0), vec![0, 1, 2, 3, 4]);
    }
}
