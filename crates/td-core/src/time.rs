//! Active-time accounting per tab.
//!
//! Activity is tracked globally: activating any tab deactivates every other
//! one, regardless of which browser window it lives in.

use std::collections::BTreeMap;

use crate::record::TimeEntry;
use crate::types::{TabId, Timestamp};

#[derive(Debug, Clone, Default)]
pub struct TimeTracker {
    entries: BTreeMap<TabId, TimeEntry>,
}

impl TimeTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, id: TabId) -> Option<&TimeEntry> {
        self.entries.get(&id)
    }

    pub fn entries(&self) -> &BTreeMap<TabId, TimeEntry> {
        &self.entries
    }

    /// The tab currently accumulating time, if any.
    pub fn active(&self) -> Option<TabId> {
        self.entries
            .iter()
            .find_map(|(id, entry)| entry.is_active().then_some(*id))
    }

    /// Starts an inactive entry for a newly created tab, keeping the entry
    /// of a tab the host activated before announcing it.
    pub fn on_tab_created(&mut self, id: TabId, now: Timestamp) {
        self.entries.entry(id).or_insert_with(|| TimeEntry::new(now));
    }

    /// Makes `id` the single active tab.
    ///
    /// Every other active entry has its running span flushed. Returns the ids
    /// whose entries changed, the activated tab last.
    pub fn on_tab_activated(&mut self, id: TabId, now: Timestamp) -> Vec<TabId> {
        let mut touched = Vec::new();
        for (other, entry) in &mut self.entries {
            if *other != id && entry.is_active() {
                entry.flush(now);
                touched.push(*other);
            }
        }

        let entry = self.entries.entry(id).or_insert_with(|| TimeEntry::new(now));
        entry.last_active_time = Some(now);
        touched.push(id);
        touched
    }

    /// Flushes any running span into the total and discards the entry.
    pub fn finalize(&mut self, id: TabId, now: Timestamp) -> Option<TimeEntry> {
        let mut entry = self.entries.remove(&id)?;
        entry.flush(now);
        Some(entry)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn active_count(tracker: &TimeTracker) -> usize {
        tracker.entries().values().filter(|e| e.is_active()).count()
    }

    #[test]
    fn created_entries_start_inactive() {
        let mut tracker = TimeTracker::new();
        tracker.on_tab_created(TabId::new(1), 100);

        let entry = tracker.get(TabId::new(1)).unwrap();
        assert_eq!(entry.start_time, 100);
        assert!(!entry.is_active());
        assert_eq!(tracker.active(), None);
    }

    #[test]
    fn creation_after_activation_keeps_running_entry() {
        let mut tracker = TimeTracker::new();
        tracker.on_tab_activated(TabId::new(1), 50);
        tracker.on_tab_created(TabId::new(1), 60);

        let entry = tracker.get(TabId::new(1)).unwrap();
        assert_eq!(entry.start_time, 50);
        assert_eq!(entry.last_active_time, Some(50));
    }

    #[test]
    fn activation_switches_single_active_tab() {
        let mut tracker = TimeTracker::new();
        tracker.on_tab_activated(TabId::new(1), 0);
        let touched = tracker.on_tab_activated(TabId::new(2), 1_000);

        assert_eq!(touched, vec![TabId::new(1), TabId::new(2)]);
        assert_eq!(tracker.get(TabId::new(1)).unwrap().total_time_spent, 1_000);
        assert_eq!(tracker.active(), Some(TabId::new(2)));
        assert_eq!(active_count(&tracker), 1);
    }

    #[test]
    fn single_active_invariant_holds_across_sequences() {
        let mut tracker = TimeTracker::new();
        let sequence = [3, 1, 3, 2, 2, 5, 1, 4];
        for (step, id) in sequence.iter().enumerate() {
            let now = i64::try_from(step).unwrap() * 250;
            tracker.on_tab_activated(TabId::new(*id), now);
            assert_eq!(active_count(&tracker), 1, "after activating {id}");
        }
    }

    #[test]
    fn reactivating_active_tab_restarts_span_without_flush() {
        let mut tracker = TimeTracker::new();
        tracker.on_tab_activated(TabId::new(1), 0);
        tracker.on_tab_activated(TabId::new(1), 400);

        let entry = tracker.get(TabId::new(1)).unwrap();
        assert_eq!(entry.total_time_spent, 0);
        assert_eq!(entry.last_active_time, Some(400));
    }

    #[test]
    fn finalize_flushes_running_span() {
        let mut tracker = TimeTracker::new();
        tracker.on_tab_activated(TabId::new(1), 0);

        let entry = tracker.finalize(TabId::new(1), 750).unwrap();
        assert_eq!(entry.total_time_spent, 750);
        assert!(tracker.get(TabId::new(1)).is_none());
        assert!(tracker.finalize(TabId::new(1), 800).is_none());
    }

    #[test]
    fn removal_after_switch_keeps_accumulated_time() {
        let mut tracker = TimeTracker::new();
        tracker.on_tab_activated(TabId::new(1), 0);
        tracker.on_tab_activated(TabId::new(2), 1_000);

        let entry = tracker.finalize(TabId::new(1), 1_000).unwrap();
        assert_eq!(entry.total_time_spent, 1_000);
    }
}
