//! Same-tick follow-up queue.
//!
//! Follow-up events emitted during a firing are appended here and drained
//! FIFO after the event that produced them has been fully dispatched.
//! Nothing in the queue outlives the `fire` call that created it.
//!
//! Depth is bounded: events deeper than `max_depth` are dropped and counted
//! instead of queued, which is what makes self-retriggering effects
//! terminate.

use std::collections::VecDeque;

use super::event::TriggerEvent;

/// FIFO of pending follow-up events with a depth cap.
#[derive(Clone, Debug)]
pub struct FollowUpQueue {
    pending: VecDeque<TriggerEvent>,
    max_depth: usize,
    dropped: usize,
}

impl FollowUpQueue {
    /// Create an empty queue accepting events up to `max_depth`.
    #[must_use]
    pub fn new(max_depth: usize) -> Self {
        Self {
            pending: VecDeque::new(),
            max_depth,
            dropped: 0,
        }
    }

    /// Queue an event. Returns `false` (and counts a drop) if it is too deep.
    pub fn push(&mut self, event: TriggerEvent) -> bool {
        if event.depth > self.max_depth {
            self.dropped += 1;
            return false;
        }
        self.pending.push_back(event);
        true
    }

    /// Take the oldest pending event.
    pub fn pop(&mut self) -> Option<TriggerEvent> {
        self.pending.pop_front()
    }

    /// Events dropped for exceeding the depth cap.
    #[must_use]
    pub fn dropped(&self) -> usize {
        self.dropped
    }

    /// The configured depth cap.
    #[must_use]
    pub fn max_depth(&self) -> usize {
        self.max_depth
    }

    /// Number of pending events.
    #[must_use]
    pub fn len(&self) -> usize {
        self.pending.len()
    }

    /// Check if nothing is pending.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::EntityId;
    use crate::triggers::{Payload, TriggerKind};

    fn root() -> TriggerEvent {
        TriggerEvent::root(TriggerKind::OnKill, EntityId(0), Payload::new())
    }

    #[test]
    fn test_fifo() {
        let mut queue = FollowUpQueue::new(8);
        let first = root();
        let second = first.follow_up(TriggerKind::OnHit, Payload::new());

        queue.push(first.clone());
        queue.push(second.clone());

        assert_eq!(queue.len(), 2);
        assert_eq!(queue.pop(), Some(first));
        assert_eq!(queue.pop(), Some(second));
        assert!(queue.is_empty());
    }

    #[test]
    fn test_depth_cap() {
        let mut queue = FollowUpQueue::new(1);
        let depth0 = root();
        let depth1 = depth0.follow_up(TriggerKind::OnKill, Payload::new());
        let depth2 = depth1.follow_up(TriggerKind::OnKill, Payload::new());

        assert!(queue.push(depth0));
        assert!(queue.push(depth1));
        assert!(!queue.push(depth2));

        assert_eq!(queue.len(), 2);
        assert_eq!(queue.dropped(), 1);
    }

    #[test]
    fn test_zero_depth_only_root() {
        let mut queue = FollowUpQueue::new(0);
        let depth0 = root();
        let depth1 = depth0.follow_up(TriggerKind::OnHit, Payload::new());

        assert!(queue.push(depth0));
        assert!(!queue.push(depth1));
        assert_eq!(queue.max_depth(), 0);
    }
}
