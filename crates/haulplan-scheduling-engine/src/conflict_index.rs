use std::collections::BTreeMap;
use std::collections::HashMap;
use std::sync::Arc;
use std::sync::Mutex;

use chrono::DateTime;
use chrono::Utc;
use haulplan_scheduling_environment::assignment::Assignment;
use haulplan_scheduling_environment::assignment::AssignmentId;
use haulplan_scheduling_environment::fleet_environment::TruckId;
use haulplan_scheduling_environment::time_environment::TimeWindow;

use crate::lock;

/// Committed windows of a single truck ordered by start.
///
/// `insert` refuses overlapping windows, so the stored windows are pairwise
/// disjoint. That makes an overlap query cheap: apart from the windows that
/// start inside the query, only the last window starting before it can reach
/// into it. A query costs O(log n + k).
#[derive(Debug, Default)]
pub struct TruckTimeline {
    by_start: BTreeMap<(DateTime<Utc>, AssignmentId), TimeWindow>,
    by_assignment: HashMap<AssignmentId, TimeWindow>,
}

impl TruckTimeline {
    pub fn query(&self, window: &TimeWindow) -> Vec<AssignmentId> {
        let pivot = (window.start(), AssignmentId(0));
        let mut overlapping = Vec::new();

        if let Some((&(_, id), slot)) = self.by_start.range(..pivot).next_back() {
            if slot.overlaps(window) {
                overlapping.push(id);
            }
        }

        overlapping.extend(
            self.by_start
                .range(pivot..)
                .take_while(|(_, slot)| slot.start() < window.end())
                .map(|(&(_, id), _)| id),
        );
        overlapping
    }

    /// Leaves the timeline untouched and returns the conflicting ids when
    /// `window` overlaps something already stored.
    pub fn insert(&mut self, id: AssignmentId, window: TimeWindow) -> Result<(), Vec<AssignmentId>> {
        let conflicting = self.query(&window);
        if !conflicting.is_empty() {
            return Err(conflicting);
        }
        if let Some(previous) = self.by_assignment.insert(id, window) {
            self.by_start.remove(&(previous.start(), id));
        }
        self.by_start.insert((window.start(), id), window);
        Ok(())
    }

    pub fn remove(&mut self, id: AssignmentId) -> Option<TimeWindow> {
        let window = self.by_assignment.remove(&id)?;
        self.by_start.remove(&(window.start(), id));
        Some(window)
    }

    pub fn windows(&self) -> impl Iterator<Item = (AssignmentId, TimeWindow)> + '_ {
        self.by_start.iter().map(|(&(_, id), window)| (id, *window))
    }

    pub fn len(&self) -> usize {
        self.by_start.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_start.is_empty()
    }
}

/// Per-truck timelines, each behind its own mutex. Holding a truck's mutex is
/// the critical section for that truck: the ledger keeps it while it
/// evaluates and updates the timeline. Sections are created on first use and
/// never removed, the outer map lock is only held for lookup and creation.
///
/// The index is derived state. The ledger is the authority on assignments.
#[derive(Debug, Default)]
pub struct ConflictIndex {
    sections: Mutex<HashMap<TruckId, Arc<Mutex<TruckTimeline>>>>,
    placements: Mutex<HashMap<AssignmentId, TruckId>>,
}

impl ConflictIndex {
    pub fn section(&self, truck_id: &TruckId) -> Arc<Mutex<TruckTimeline>> {
        let mut sections = lock(&self.sections);
        sections
            .entry(truck_id.clone())
            .or_insert_with(|| Arc::new(Mutex::new(TruckTimeline::default())))
            .clone()
    }

    pub fn query(&self, truck_id: &TruckId, window: &TimeWindow) -> Vec<AssignmentId> {
        let section = self.section(truck_id);
        let timeline = lock(&section);
        timeline.query(window)
    }

    pub fn insert(&self, assignment: &Assignment) -> Result<(), Vec<AssignmentId>> {
        let section = self.section(&assignment.truck_id);
        let mut timeline = lock(&section);
        timeline.insert(assignment.id, assignment.window)?;
        self.place(assignment.id, &assignment.truck_id);
        Ok(())
    }

    pub fn remove(&self, assignment_id: AssignmentId) -> Option<TimeWindow> {
        let truck_id = lock(&self.placements).get(&assignment_id).cloned()?;
        let section = self.section(&truck_id);
        let mut timeline = lock(&section);
        let window = timeline.remove(assignment_id);
        self.displace(assignment_id);
        window
    }

    pub fn committed_windows(&self, truck_id: &TruckId) -> Vec<(AssignmentId, TimeWindow)> {
        let section = self.section(truck_id);
        let timeline = lock(&section);
        timeline.windows().collect()
    }

    /// Bookkeeping for callers that already hold the truck's section and
    /// mutate the timeline through the guard.
    pub(crate) fn place(&self, assignment_id: AssignmentId, truck_id: &TruckId) {
        lock(&self.placements).insert(assignment_id, truck_id.clone());
    }

    pub(crate) fn displace(&self, assignment_id: AssignmentId) {
        lock(&self.placements).remove(&assignment_id);
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeDelta;
    use chrono::TimeZone;
    use haulplan_scheduling_environment::job_environment::JobId;
    use proptest::prelude::*;

    use super::*;

    fn at(minutes: i64) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, 2, 0, 0, 0).unwrap() + TimeDelta::minutes(minutes)
    }

    fn window(start: i64, end: i64) -> TimeWindow {
        TimeWindow::new(at(start), at(end)).unwrap()
    }

    #[test]
    fn test_query_finds_predecessor_and_contained_windows() {
        let mut timeline = TruckTimeline::default();
        timeline.insert(AssignmentId(1), window(0, 60)).unwrap();
        timeline.insert(AssignmentId(2), window(60, 120)).unwrap();
        timeline.insert(AssignmentId(3), window(150, 200)).unwrap();
        timeline.insert(AssignmentId(4), window(300, 400)).unwrap();

        assert_eq!(
            timeline.query(&window(90, 160)),
            vec![AssignmentId(2), AssignmentId(3)]
        );
        assert_eq!(timeline.query(&window(120, 150)), vec![]);
        assert_eq!(timeline.query(&window(0, 30)), vec![AssignmentId(1)]);
        assert_eq!(timeline.query(&window(199, 301)), vec![AssignmentId(3), AssignmentId(4)]);
    }

    #[test]
    fn test_insert_rejects_overlap_and_keeps_timeline() {
        let mut timeline = TruckTimeline::default();
        timeline.insert(AssignmentId(1), window(540, 660)).unwrap();

        assert_eq!(
            timeline.insert(AssignmentId(2), window(600, 720)),
            Err(vec![AssignmentId(1)])
        );
        assert_eq!(timeline.len(), 1);
    }

    #[test]
    fn test_remove_frees_the_slot() {
        let index = ConflictIndex::default();
        let truck_id = TruckId::new("T");
        let assignment = Assignment::proposed(
            AssignmentId(1),
            JobId::new("J1"),
            truck_id.clone(),
            window(540, 660),
            at(0),
        );

        index.insert(&assignment).unwrap();
        assert_eq!(index.query(&truck_id, &window(600, 720)), vec![AssignmentId(1)]);

        assert_eq!(index.remove(AssignmentId(1)), Some(window(540, 660)));
        assert!(index.query(&truck_id, &window(600, 720)).is_empty());
        assert!(index.committed_windows(&truck_id).is_empty());
        assert_eq!(index.remove(AssignmentId(1)), None);
    }

    #[test]
    fn test_sections_are_per_truck() {
        let index = ConflictIndex::default();
        let first = index.section(&TruckId::new("T1"));
        let again = index.section(&TruckId::new("T1"));
        let other = index.section(&TruckId::new("T2"));

        assert!(Arc::ptr_eq(&first, &again));
        assert!(!Arc::ptr_eq(&first, &other));
    }

    fn brute_force(stored: &[(AssignmentId, TimeWindow)], query: &TimeWindow) -> Vec<AssignmentId> {
        let mut overlapping: Vec<_> = stored
            .iter()
            .filter(|(_, w)| w.overlaps(query))
            .map(|(id, _)| *id)
            .collect();
        overlapping.sort();
        overlapping
    }

    proptest! {
        #[test]
        fn test_timeline_stays_disjoint_and_matches_brute_force(
            slots in prop::collection::vec((0i64..1_000, 1i64..120), 1..60),
            queries in prop::collection::vec((0i64..1_100, 1i64..200), 1..20),
        ) {
            let mut timeline = TruckTimeline::default();
            let mut stored = Vec::new();

            for (n, (start, length)) in slots.into_iter().enumerate() {
                let id = AssignmentId(n as u64);
                let slot = window(start, start + length);
                let expected = brute_force(&stored, &slot);

                match timeline.insert(id, slot) {
                    Ok(()) => {
                        prop_assert!(expected.is_empty());
                        stored.push((id, slot));
                    }
                    Err(mut conflicting) => {
                        conflicting.sort();
                        prop_assert_eq!(conflicting, expected);
                    }
                }
            }

            let windows: Vec<_> = timeline.windows().map(|(_, w)| w).collect();
            for pair in windows.windows(2) {
                prop_assert!(!pair[0].overlaps(&pair[1]));
                prop_assert!(pair[0].start() <= pair[1].start());
            }

            for (start, length) in queries {
                let query = window(start, start + length);
                let mut found = timeline.query(&query);
                found.sort();
                prop_assert_eq!(found, brute_force(&stored, &query));
            }
        }
    }
}
