//! Timer scheduling for the page behaviors.
//!
//! Everything runs on one logical thread: a callback is an event value that
//! the owner of the queue dispatches when its deadline is reached. The queue
//! is a simulated clock, so the render loop drives it with a fixed frame time
//! and tests drive it with whatever steps they like.

use std::collections::BTreeMap;
use std::time::Duration;

use slotmap::{SlotMap, new_key_type};

new_key_type! {
    /// Identifies one scheduled callback. Stale handles never match a newer timer.
    pub struct TimerHandle;
}

pub trait Scheduler<E> {
    fn now(&self) -> Duration;

    /// Schedules `event` to fire `delay` after the current time.
    fn schedule_after(&mut self, delay: Duration, event: E) -> TimerHandle;

    /// Returns false if the timer already fired or was cancelled.
    fn cancel(&mut self, handle: TimerHandle) -> bool;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Fired<E> {
    pub handle: TimerHandle,
    pub at: Duration,
    pub event: E,
}

// (deadline, scheduling sequence) gives time order with FIFO ties.
type Slot = (Duration, u64);

struct Timer<E> {
    key: Slot,
    event: E,
}

pub struct TimerQueue<E> {
    now: Duration,
    next_seq: u64,
    timers: SlotMap<TimerHandle, Timer<E>>,
    order: BTreeMap<Slot, TimerHandle>,
}

impl<E> TimerQueue<E> {
    pub fn new() -> Self {
        Self {
            now: Duration::ZERO,
            next_seq: 0,
            timers: SlotMap::with_key(),
            order: BTreeMap::new(),
        }
    }

    /// Number of live timers.
    pub fn len(&self) -> usize {
        self.timers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.timers.is_empty()
    }

    pub fn is_live(&self, handle: TimerHandle) -> bool {
        self.timers.contains_key(handle)
    }

    pub fn next_deadline(&self) -> Option<Duration> {
        self.order.keys().next().map(|(at, _)| *at)
    }

    /// Removes the earliest timer due at or before `until` and moves the clock to its deadline.
    pub fn pop_due(&mut self, until: Duration) -> Option<Fired<E>> {
        let (&key, &handle) = self.order.first_key_value()?;
        if key.0 > until {
            return None;
        }
        self.order.remove(&key);
        let timer = self.timers.remove(handle)?;
        self.now = self.now.max(key.0);
        Some(Fired { handle, at: key.0, event: timer.event })
    }

    /// Moves the clock forward without firing anything. Timers already due stay queued.
    pub fn skip_to(&mut self, until: Duration) {
        self.now = self.now.max(until);
    }

    /// Fires every timer due within `dt`, in order, then leaves the clock at `now + dt`.
    ///
    /// Callbacks may schedule or cancel timers; a timer they schedule inside
    /// the window fires during the same call. Returns the number fired.
    pub fn advance_by(&mut self, dt: Duration, mut dispatch: impl FnMut(&mut Self, Fired<E>)) -> usize {
        let until = self.now + dt;
        let mut fired = 0;
        while let Some(next) = self.pop_due(until) {
            dispatch(self, next);
            fired += 1;
        }
        self.skip_to(until);
        fired
    }
}

impl<E> Default for TimerQueue<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E> Scheduler<E> for TimerQueue<E> {
    fn now(&self) -> Duration {
        self.now
    }

    fn schedule_after(&mut self, delay: Duration, event: E) -> TimerHandle {
        let key = (self.now + delay, self.next_seq);
        self.next_seq += 1;
        let handle = self.timers.insert(Timer { key, event });
        self.order.insert(key, handle);
        handle
    }

    fn cancel(&mut self, handle: TimerHandle) -> bool {
        match self.timers.remove(handle) {
            Some(timer) => {
                self.order.remove(&timer.key);
                true
            }
            None => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ms(value: u64) -> Duration {
        Duration::from_millis(value)
    }

    fn drain(queue: &mut TimerQueue<&'static str>, dt: Duration) -> Vec<(u64, &'static str)> {
        let mut seen = Vec::new();
        queue.advance_by(dt, |_, fired| seen.push((fired.at.as_millis() as u64, fired.event)));
        seen
    }

    #[test]
    fn fires_in_deadline_order() {
        let mut queue = TimerQueue::new();
        queue.schedule_after(ms(300), "c");
        queue.schedule_after(ms(100), "a");
        queue.schedule_after(ms(200), "b");

        assert_eq!(drain(&mut queue, ms(1000)), vec![(100, "a"), (200, "b"), (300, "c")]);
        assert!(queue.is_empty());
        assert_eq!(queue.now(), ms(1000));
    }

    #[test]
    fn ties_fire_in_scheduling_order() {
        let mut queue = TimerQueue::new();
        queue.schedule_after(ms(50), "first");
        queue.schedule_after(ms(50), "second");
        queue.schedule_after(ms(50), "third");

        let order: Vec<_> = drain(&mut queue, ms(50)).into_iter().map(|(_, e)| e).collect();
        assert_eq!(order, vec!["first", "second", "third"]);
    }

    #[test]
    fn cancelled_timer_never_fires() {
        let mut queue = TimerQueue::new();
        let keep = queue.schedule_after(ms(10), "keep");
        let dropped = queue.schedule_after(ms(20), "dropped");

        assert!(queue.cancel(dropped));
        assert!(!queue.is_live(dropped));
        assert!(queue.is_live(keep));
        assert_eq!(drain(&mut queue, ms(100)), vec![(10, "keep")]);
    }

    #[test]
    fn stale_handle_cannot_cancel_a_newer_timer() {
        let mut queue = TimerQueue::new();
        let old = queue.schedule_after(ms(10), "old");
        drain(&mut queue, ms(10));
        assert!(!queue.cancel(old));

        // The freed slot is reused; the old handle's generation no longer matches.
        let new = queue.schedule_after(ms(10), "new");
        assert!(!queue.cancel(old));
        assert!(queue.is_live(new));
        assert_eq!(drain(&mut queue, ms(10)), vec![(20, "new")]);
    }

    #[test]
    fn timers_scheduled_by_a_callback_fire_within_the_same_window() {
        let mut queue = TimerQueue::new();
        queue.schedule_after(ms(100), 1u32);

        let mut seen = Vec::new();
        queue.advance_by(ms(350), |queue, fired| {
            seen.push((queue.now(), fired.event));
            if fired.event < 5 {
                queue.schedule_after(ms(100), fired.event + 1);
            }
        });

        assert_eq!(seen, vec![(ms(100), 1), (ms(200), 2), (ms(300), 3)]);
        assert_eq!(queue.len(), 1);
        assert_eq!(queue.next_deadline(), Some(ms(400)));
        assert_eq!(queue.now(), ms(350));
    }

    #[test]
    fn pop_due_leaves_future_timers_alone() {
        let mut queue = TimerQueue::new();
        queue.schedule_after(ms(500), ());
        assert!(queue.pop_due(ms(499)).is_none());
        assert_eq!(queue.len(), 1);

        let fired = queue.pop_due(ms(500)).expect("due timer");
        assert_eq!(fired.at, ms(500));
        assert_eq!(queue.now(), ms(500));
    }

    #[test]
    fn skip_to_never_rewinds() {
        let mut queue: TimerQueue<()> = TimerQueue::new();
        queue.skip_to(ms(40));
        queue.skip_to(ms(10));
        assert_eq!(queue.now(), ms(40));
    }
}
