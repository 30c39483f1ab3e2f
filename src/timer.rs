//! Virtual-time timer facility.
//!
//! The host owns the clock: nothing fires until the scheduler is advanced.
//! One-shot and periodic timers carry a payload that tells the owner what to
//! do when they fire. Cancellation is idempotent.

use smallvec::SmallVec;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TimerId(u64);

#[derive(Clone, Debug)]
struct Entry<T> {
    id: TimerId,
    due_ms: u64,
    period_ms: Option<u64>,
    payload: T,
}

#[derive(Debug)]
pub struct Scheduler<T> {
    now_ms: u64,
    next_id: u64,
    entries: SmallVec<[Entry<T>; 4]>,
}

impl<T: Clone> Default for Scheduler<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Clone> Scheduler<T> {
    pub fn new() -> Self {
        Self {
            now_ms: 0,
            next_id: 1,
            entries: SmallVec::new(),
        }
    }

    pub fn now_ms(&self) -> u64 {
        self.now_ms
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn schedule_once(&mut self, delay_ms: u64, payload: T) -> TimerId {
        self.insert(delay_ms, None, payload)
    }

    /// First fire is one full period from now.
    pub fn schedule_every(&mut self, period_ms: u64, payload: T) -> TimerId {
        let period_ms = period_ms.max(1);
        self.insert(period_ms, Some(period_ms), payload)
    }

    fn insert(&mut self, delay_ms: u64, period_ms: Option<u64>, payload: T) -> TimerId {
        let id = TimerId(self.next_id);
        self.next_id += 1;
        self.entries.push(Entry {
            id,
            due_ms: self.now_ms + delay_ms,
            period_ms,
            payload,
        });
        id
    }

    /// Returns whether a live timer was removed. Cancelling twice is fine.
    pub fn cancel(&mut self, id: TimerId) -> bool {
        let before = self.entries.len();
        self.entries.retain(|e| e.id != id);
        before != self.entries.len()
    }

    /// Cancel whatever the slot holds and leave it empty.
    pub fn cancel_slot(&mut self, slot: &mut Option<TimerId>) {
        if let Some(id) = slot.take() {
            self.cancel(id);
        }
    }

    pub fn is_pending(&self, id: TimerId) -> bool {
        self.entries.iter().any(|e| e.id == id)
    }

    pub fn next_due(&self) -> Option<u64> {
        self.entries.iter().map(|e| e.due_ms).min()
    }

    /// Move the clock forward. The clock never runs backwards.
    pub fn advance_to(&mut self, t_ms: u64) {
        if t_ms > self.now_ms {
            self.now_ms = t_ms;
        }
    }

    /// Pop the earliest timer that is due at the current time, if any.
    /// Periodic timers are re-armed for their next period instead of removed.
    pub fn pop_due(&mut self) -> Option<(TimerId, T)> {
        let now = self.now_ms;
        let idx = self
            .entries
            .iter()
            .enumerate()
            .filter(|(_, e)| e.due_ms <= now)
            .min_by_key(|(_, e)| (e.due_ms, e.id))
            .map(|(i, _)| i)?;
        match self.entries[idx].period_ms {
            Some(period) => {
                let entry = &mut self.entries[idx];
                entry.due_ms += period;
                Some((entry.id, entry.payload.clone()))
            }
            None => {
                let entry = self.entries.remove(idx);
                Some((entry.id, entry.payload))
            }
        }
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn one_shot_fires_once_at_its_due_time() {
        let mut s = Scheduler::new();
        let id = s.schedule_once(200, "confirm");
        s.advance_to(199);
        assert!(s.pop_due().is_none());
        s.advance_to(200);
        assert_eq!(s.pop_due(), Some((id, "confirm")));
        assert!(s.pop_due().is_none());
        assert!(s.is_empty());
    }

    #[test]
    fn periodic_timer_rearms() {
        let mut s = Scheduler::new();
        let id = s.schedule_every(1000, 7u8);
        s.advance_to(3000);
        let mut fired = 0;
        while let Some((fid, _)) = s.pop_due() {
            assert_eq!(fid, id);
            fired += 1;
        }
        assert_eq!(fired, 3);
        assert_eq!(s.next_due(), Some(4000));
    }

    #[test]
    fn cancel_is_idempotent() {
        let mut s = Scheduler::new();
        let id = s.schedule_once(10, ());
        assert!(s.cancel(id));
        assert!(!s.cancel(id));
        let mut slot = Some(id);
        s.cancel_slot(&mut slot);
        assert!(slot.is_none());
        s.advance_to(100);
        assert!(s.pop_due().is_none());
    }

    #[test]
    fn due_timers_pop_in_time_order() {
        let mut s = Scheduler::new();
        let late = s.schedule_once(50, "late");
        let early = s.schedule_once(20, "early");
        s.advance_to(60);
        assert_eq!(s.pop_due(), Some((early, "early")));
        assert_eq!(s.pop_due(), Some((late, "late")));
    }
}
