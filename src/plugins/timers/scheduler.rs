use std::cmp::Reverse;
use std::collections::BinaryHeap;
use std::time::Duration;

use bevy::platform::collections::HashMap;
use bevy::prelude::*;

/// Simulation time, advanced once per fixed step.
#[derive(Resource, Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct SimClock {
    now: Duration,
}

impl SimClock {
    #[inline]
    pub fn now(&self) -> Duration {
        self.now
    }

    #[inline]
    pub fn advance(&mut self, dt: Duration) {
        self.now = self.now.saturating_add(dt);
    }
}

/// Cancellation handle for one scheduled action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TimerToken(u64);

/// A timer that came due.
#[derive(Debug, Clone, PartialEq)]
pub struct Fired<A> {
    pub token: TimerToken,
    pub deadline: Duration,
    pub action: A,
}

/// Priority queue of deadlines against `SimClock`.
///
/// Cancelled entries stay in the heap until they surface and are skipped there.
#[derive(Resource, Debug)]
pub struct DeferredQueue<A: Send + Sync + 'static> {
    next_id: u64,
    heap: BinaryHeap<Reverse<(Duration, u64)>>,
    pending: HashMap<u64, A>,
}

impl<A: Send + Sync + 'static> Default for DeferredQueue<A> {
    fn default() -> Self {
        Self {
            next_id: 0,
            heap: BinaryHeap::new(),
            pending: HashMap::default(),
        }
    }
}

impl<A: Send + Sync + 'static> DeferredQueue<A> {
    /// Run `action` once `delay` has elapsed on `clock`.
    pub fn schedule(&mut self, clock: &SimClock, delay: Duration, action: A) -> TimerToken {
        let id = self.next_id;
        self.next_id += 1;

        let deadline = clock.now().saturating_add(delay);
        self.heap.push(Reverse((deadline, id)));
        self.pending.insert(id, action);
        TimerToken(id)
    }

    /// Returns `true` if the timer was still pending.
    pub fn cancel(&mut self, token: TimerToken) -> bool {
        self.pending.remove(&token.0).is_some()
    }

    #[inline]
    pub fn is_pending(&self, token: TimerToken) -> bool {
        self.pending.contains_key(&token.0)
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.pending.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    pub fn clear(&mut self) {
        self.heap.clear();
        self.pending.clear();
    }

    /// Remove and return every pending timer with `deadline <= now`,
    /// earliest deadline first, ties in scheduling order.
    pub fn drain_due(&mut self, clock: &SimClock) -> Vec<Fired<A>> {
        let now = clock.now();
        let mut fired = Vec::new();

        while let Some(&Reverse((deadline, id))) = self.heap.peek() {
            if deadline > now {
                break;
            }
            self.heap.pop();

            // Missing means cancelled.
            if let Some(action) = self.pending.remove(&id) {
                fired.push(Fired {
                    token: TimerToken(id),
                    deadline,
                    action,
                });
            }
        }

        fired
    }
}

/// Seconds from config to a `Duration`. Negative and NaN become zero, overflow saturates.
pub fn secs(s: f32) -> Duration {
    Duration::try_from_secs_f32(s.max(0.0)).unwrap_or(Duration::MAX)
}
