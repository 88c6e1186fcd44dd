use std::time::Duration;

use thiserror::Error;
use tracing::{debug, info, trace, warn};

use crate::ring::slots::SlotSurface;
use crate::ring::state::CycleState;
use crate::scheduler::{Scheduler, TimerHandle};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RingEvent {
    Activate(usize), // Light the slot at this index of the sequence
    Cleanup,         // Turn every slot off
    Restart,         // Cycle complete, schedule the next one
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum RingError {
    #[error("ring step interval must be greater than zero")]
    ZeroInterval,
}

/// Timers owned by one run of the sequence.
///
/// Every handle the cycle schedules is recorded here until it either fires
/// or is cancelled, so dropping a cycle through [`AnimationCycle::cancel_all`]
/// leaves nothing behind in the scheduler.
#[derive(Debug, Default)]
pub struct AnimationCycle {
    pending: Vec<TimerHandle>,
}

impl AnimationCycle {
    fn schedule<E, S>(&mut self, timers: &mut S, delay: Duration, event: RingEvent)
    where
        E: From<RingEvent>,
        S: Scheduler<E>,
    {
        let handle = timers.schedule_after(delay, event.into());
        self.pending.push(handle);
    }

    /// Releases a handle that just fired. False if this cycle never owned it.
    fn consume(&mut self, handle: TimerHandle) -> bool {
        match self.pending.iter().position(|pending| *pending == handle) {
            Some(index) => {
                self.pending.swap_remove(index);
                true
            }
            None => false,
        }
    }

    fn cancel_all<E, S>(&mut self, timers: &mut S) -> usize
    where
        S: Scheduler<E>,
    {
        self.pending.drain(..).filter(|handle| timers.cancel(*handle)).count()
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    pub fn owns(&self, handle: TimerHandle) -> bool {
        self.pending.contains(&handle)
    }
}

pub struct RingAnimator {
    sequence: Vec<String>,
    step: Duration,
    cycle: Option<AnimationCycle>,
    state: CycleState,
    cycles_started: u64,
}

impl RingAnimator {
    pub fn new(sequence: Vec<String>, step: Duration) -> Result<Self, RingError> {
        if step.is_zero() {
            return Err(RingError::ZeroInterval);
        }
        Ok(Self {
            sequence,
            step,
            cycle: None,
            state: CycleState::Stopped,
            cycles_started: 0,
        })
    }

    pub fn sequence(&self) -> &[String] {
        &self.sequence
    }

    pub fn step(&self) -> Duration {
        self.step
    }

    pub fn state(&self) -> CycleState {
        self.state
    }

    pub fn is_running(&self) -> bool {
        self.cycle.is_some()
    }

    /// Timers of the live cycle that have neither fired nor been cancelled.
    pub fn pending_len(&self) -> usize {
        self.cycle.as_ref().map_or(0, AnimationCycle::len)
    }

    pub fn cycle(&self) -> Option<&AnimationCycle> {
        self.cycle.as_ref()
    }

    /// Dark beat, one step per slot, then cleanup: `(N + 1) * step`.
    pub fn cycle_duration(&self) -> Duration {
        self.step * (self.sequence.len() as u32 + 1)
    }

    pub fn cycles_started(&self) -> u64 {
        self.cycles_started
    }

    /// Drops whatever cycle is live and schedules a fresh one.
    pub fn start<E, S, L>(&mut self, timers: &mut S, slots: &mut L)
    where
        E: From<RingEvent>,
        S: Scheduler<E>,
        L: SlotSurface,
    {
        info!(
            slots = self.sequence.len(),
            interval_ms = self.step.as_millis() as u64,
            "starting ring animation"
        );
        self.restart::<E, S, L>(timers, slots);
    }

    /// Cancels every pending timer and turns all slots off. Safe to call repeatedly.
    pub fn stop<E, S, L>(&mut self, timers: &mut S, slots: &mut L)
    where
        S: Scheduler<E>,
        L: SlotSurface,
    {
        let was_running = self.is_running();
        let cancelled = self.halt::<E, S, L>(timers, slots);
        if was_running {
            info!(cancelled, "ring animation stopped");
        }
    }

    /// Applies one fired timer. Timers this animator does not own are ignored.
    pub fn on_timer<E, S, L>(&mut self, handle: TimerHandle, event: RingEvent, timers: &mut S, slots: &mut L)
    where
        E: From<RingEvent>,
        S: Scheduler<E>,
        L: SlotSurface,
    {
        let Some(cycle) = self.cycle.as_mut() else {
            warn!(?event, "ring timer fired while stopped, ignoring");
            return;
        };
        if !cycle.consume(handle) {
            warn!(?event, "ring timer from a superseded cycle, ignoring");
            return;
        }

        match event {
            RingEvent::Activate(index) => {
                match self.sequence.get(index) {
                    Some(id) => {
                        if !slots.set_active(id, true) {
                            trace!(slot = %id, "slot element missing, skipping");
                        }
                    }
                    None => warn!(index, "activation past the end of the sequence"),
                }
                let lit = index + 1;
                self.state = if lit >= self.sequence.len() {
                    CycleState::AllOn
                } else {
                    CycleState::Activating(lit)
                };
                debug!(state = ?self.state, "ring slot lit");
            }
            RingEvent::Cleanup => {
                self.clear(slots);
                self.state = CycleState::Cleanup;
                debug!("ring cleared");
            }
            RingEvent::Restart => {
                debug!(cycle = self.cycles_started, "ring cycle complete, rescheduling");
                self.restart::<E, S, L>(timers, slots);
            }
        }
    }

    fn restart<E, S, L>(&mut self, timers: &mut S, slots: &mut L)
    where
        E: From<RingEvent>,
        S: Scheduler<E>,
        L: SlotSurface,
    {
        self.halt::<E, S, L>(timers, slots);

        let mut cycle = AnimationCycle::default();
        for index in 0..self.sequence.len() {
            cycle.schedule::<E, S>(timers, self.step * (index as u32 + 1), RingEvent::Activate(index));
        }
        // Cleanup goes in first so it wins the tie with the restart.
        let end = self.cycle_duration();
        cycle.schedule::<E, S>(timers, end, RingEvent::Cleanup);
        cycle.schedule::<E, S>(timers, end, RingEvent::Restart);

        self.cycles_started += 1;
        self.state = CycleState::Idle;
        debug!(cycle = self.cycles_started, pending = cycle.len(), "ring cycle scheduled");
        self.cycle = Some(cycle);
    }

    fn halt<E, S, L>(&mut self, timers: &mut S, slots: &mut L) -> usize
    where
        S: Scheduler<E>,
        L: SlotSurface,
    {
        let cancelled = self
            .cycle
            .take()
            .map_or(0, |mut cycle| cycle.cancel_all::<E, S>(timers));
        self.clear(slots);
        self.state = CycleState::Stopped;
        cancelled
    }

    fn clear<L: SlotSurface>(&self, slots: &mut L) {
        for id in &self.sequence {
            slots.set_active(id, false);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ring::slots::SlotSet;
    use crate::scheduler::TimerQueue;
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    const STEP: Duration = Duration::from_millis(1000);

    fn ms(value: u64) -> Duration {
        Duration::from_millis(value)
    }

    fn ids(n: usize) -> Vec<String> {
        (1..=n).map(|i| format!("slot{i}")).collect()
    }

    struct Rig {
        timers: TimerQueue<RingEvent>,
        slots: SlotSet,
        ring: RingAnimator,
    }

    impl Rig {
        fn new(n: usize, step: Duration) -> Self {
            let sequence = ids(n);
            Self {
                timers: TimerQueue::new(),
                slots: SlotSet::new(sequence.clone()),
                ring: RingAnimator::new(sequence, step).unwrap(),
            }
        }

        fn start(&mut self) {
            self.ring.start(&mut self.timers, &mut self.slots);
        }

        fn stop(&mut self) {
            self.ring.stop(&mut self.timers, &mut self.slots);
        }

        fn advance(&mut self, dt: Duration) -> usize {
            let Rig { timers, slots, ring } = self;
            timers.advance_by(dt, |timers, fired| ring.on_timer(fired.handle, fired.event, timers, slots))
        }

        fn advance_to(&mut self, at: Duration) {
            let dt = at - self.timers.now();
            self.advance(dt);
        }

        fn lit(&self) -> Vec<bool> {
            self.slots.iter().map(|slot| slot.active).collect()
        }

        /// Length of the lit prefix, or None if the lit set is not a prefix.
        fn lit_prefix(&self) -> Option<usize> {
            let lit = self.lit();
            let k = lit.iter().take_while(|on| **on).count();
            lit[k..].iter().all(|on| !on).then_some(k)
        }
    }

    #[test]
    fn rejects_zero_interval() {
        assert_eq!(RingAnimator::new(ids(5), Duration::ZERO).err(), Some(RingError::ZeroInterval));
    }

    #[test]
    fn start_schedules_n_plus_two_timers() {
        for n in [1, 2, 5, 8] {
            let mut rig = Rig::new(n, STEP);
            rig.start();
            assert_eq!(rig.timers.len(), n + 2);
            assert_eq!(rig.ring.pending_len(), n + 2);
            assert_eq!(rig.ring.state(), CycleState::Idle);
        }
    }

    #[test]
    fn every_cycle_schedules_n_plus_two_timers_with_a_fixed_period() {
        let mut rig = Rig::new(5, STEP);
        rig.start();
        let period = rig.ring.cycle_duration();
        assert_eq!(period, ms(6000));

        for cycle in 1..=4u32 {
            rig.advance_to(period * cycle);
            assert_eq!(rig.ring.cycles_started(), u64::from(cycle) + 1);
            assert_eq!(rig.timers.len(), 7);
            assert_eq!(rig.timers.next_deadline(), Some(period * cycle + STEP));
        }
    }

    #[test]
    fn five_slot_timeline() {
        let mut rig = Rig::new(5, STEP);
        rig.start();
        assert_eq!(rig.lit(), [false; 5]);

        rig.advance_to(ms(999));
        assert_eq!(rig.lit(), [false; 5]);

        rig.advance_to(ms(1000));
        assert_eq!(rig.lit(), [true, false, false, false, false]);
        assert_eq!(rig.ring.state(), CycleState::Activating(1));

        rig.advance_to(ms(2000));
        assert_eq!(rig.lit(), [true, true, false, false, false]);

        rig.advance_to(ms(5000));
        assert_eq!(rig.lit(), [true; 5]);
        assert_eq!(rig.ring.state(), CycleState::AllOn);

        rig.advance_to(ms(6000));
        assert_eq!(rig.lit(), [false; 5]);
        assert_eq!(rig.ring.state(), CycleState::Idle);
        assert_eq!(rig.ring.cycles_started(), 2);

        rig.advance_to(ms(6999));
        assert_eq!(rig.lit(), [false; 5]);

        rig.advance_to(ms(7000));
        assert_eq!(rig.lit(), [true, false, false, false, false]);

        rig.advance_to(ms(11_000));
        assert_eq!(rig.lit(), [true; 5]);

        rig.advance_to(ms(12_000));
        assert_eq!(rig.lit(), [false; 5]);
    }

    #[test]
    fn lit_slots_always_form_a_prefix() {
        let mut rig = Rig::new(5, STEP);
        rig.start();
        for _ in 0..(6 * 6 * 4) {
            rig.advance(ms(250));
            let k = rig.lit_prefix().expect("lit slots must be a prefix");
            assert_eq!(k, rig.ring.state().lit(5));
        }
    }

    #[test]
    fn stop_silences_the_ring() {
        let mut rig = Rig::new(5, STEP);
        rig.start();
        rig.advance_to(ms(3500));
        assert_eq!(rig.lit_prefix(), Some(3));

        rig.stop();
        assert_eq!(rig.lit(), [false; 5]);
        assert!(rig.timers.is_empty());
        assert!(!rig.ring.is_running());
        assert_eq!(rig.ring.state(), CycleState::Stopped);

        let revision = rig.slots.revision();
        assert_eq!(rig.advance(ms(60_000)), 0);
        assert_eq!(rig.slots.revision(), revision);
    }

    #[test]
    fn stop_twice_matches_stop_once() {
        let mut rig = Rig::new(5, STEP);
        rig.start();
        rig.advance_to(ms(2000));

        rig.stop();
        let revision = rig.slots.revision();
        rig.stop();
        assert_eq!(rig.slots.revision(), revision);
        assert_eq!(rig.ring.state(), CycleState::Stopped);
        assert!(rig.timers.is_empty());
    }

    #[test]
    fn stop_before_start_is_harmless() {
        let mut rig = Rig::new(3, STEP);
        rig.stop();
        assert_eq!(rig.ring.cycles_started(), 0);
        assert!(rig.timers.is_empty());
    }

    #[test]
    fn restart_mid_cycle_supersedes_the_old_cycle() {
        let mut rig = Rig::new(5, STEP);
        rig.start();
        rig.advance_to(ms(2500));
        let old: Vec<_> = rig.ring.cycle().unwrap().pending.clone();

        rig.start();
        assert_eq!(rig.lit(), [false; 5]);
        assert_eq!(rig.timers.len(), 7);
        assert!(old.iter().all(|handle| !rig.timers.is_live(*handle)));

        // New cycle began at 2500: first slot at 3500, not at the old 3000.
        rig.advance_to(ms(3499));
        assert_eq!(rig.lit(), [false; 5]);
        rig.advance_to(ms(3500));
        assert_eq!(rig.lit_prefix(), Some(1));
        rig.advance_to(ms(8500));
        assert_eq!(rig.lit(), [false; 5]);
        assert_eq!(rig.ring.cycles_started(), 3);
    }

    #[test]
    fn foreign_handles_are_ignored() {
        let mut rig = Rig::new(2, STEP);
        rig.start();
        let stray = rig.timers.schedule_after(ms(10), RingEvent::Cleanup);
        assert!(!rig.ring.cycle().unwrap().owns(stray));
        rig.slots.set_active("slot1", true);

        rig.advance_to(ms(10));
        assert!(rig.slots.is_active("slot1"));
        assert_eq!(rig.ring.pending_len(), 4);
        assert!(!rig.timers.is_live(stray));
    }

    #[test]
    fn missing_slots_are_skipped_without_stalling() {
        let sequence = vec!["slot1".to_string(), "ghost".to_string(), "slot3".to_string()];
        let mut timers = TimerQueue::new();
        let mut slots = SlotSet::new(["slot1", "slot3"]);
        let mut ring = RingAnimator::new(sequence, STEP).unwrap();
        ring.start(&mut timers, &mut slots);

        timers.advance_by(ms(3000), |timers, fired| ring.on_timer(fired.handle, fired.event, timers, &mut slots));
        assert_eq!(slots.active_ids(), ["slot1", "slot3"]);
        assert_eq!(ring.state(), CycleState::AllOn);

        timers.advance_by(ms(1000), |timers, fired| ring.on_timer(fired.handle, fired.event, timers, &mut slots));
        assert!(slots.active_ids().is_empty());
        assert_eq!(ring.cycles_started(), 2);
    }

    #[test]
    fn empty_sequence_still_loops() {
        let mut rig = Rig::new(0, ms(500));
        rig.start();
        assert_eq!(rig.timers.len(), 2);
        rig.advance_to(ms(2000));
        assert_eq!(rig.ring.cycles_started(), 5);
        assert_eq!(rig.timers.len(), 2);
    }

    #[test]
    fn odd_intervals_keep_their_period() {
        let mut rig = Rig::new(3, ms(250));
        rig.start();
        assert_eq!(rig.ring.cycle_duration(), ms(1000));
        rig.advance_to(ms(1750));
        assert_eq!(rig.lit_prefix(), Some(3));
        rig.advance_to(ms(2000));
        assert_eq!(rig.lit_prefix(), Some(0));
        assert_eq!(rig.ring.cycles_started(), 3);
    }

    #[test]
    fn random_start_stop_interleavings_keep_the_invariants() {
        let mut rng = StdRng::seed_from_u64(0x5eed);
        let mut rig = Rig::new(5, STEP);

        for _ in 0..500 {
            rig.advance(ms(rng.random_range(1..2_000)));
            assert!(rig.lit_prefix().is_some());
            assert_eq!(rig.lit_prefix(), Some(rig.ring.state().lit(5)));

            match rng.random_range(0..10) {
                0 => {
                    rig.stop();
                    assert!(rig.timers.is_empty());
                    assert_eq!(rig.lit(), [false; 5]);
                }
                1 => {
                    rig.start();
                    assert_eq!(rig.timers.len(), 7);
                    assert_eq!(rig.lit(), [false; 5]);
                }
                _ => {}
            }

            // The ring owns everything queued, and nothing it owns has been lost.
            assert_eq!(rig.timers.len(), rig.ring.pending_len());
        }
    }
}
