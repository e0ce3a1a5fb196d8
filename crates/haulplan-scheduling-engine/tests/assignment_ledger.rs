mod common;

use haulplan_scheduling_engine::AssignmentFilter;
use haulplan_scheduling_engine::ErrorKind;
use haulplan_scheduling_engine::RetryHint;
use haulplan_scheduling_engine::SchedulingError;
use haulplan_scheduling_engine::error::Infeasibility;
use haulplan_scheduling_environment::assignment::AssignmentStatus;
use haulplan_scheduling_environment::assignment::Version;
use haulplan_scheduling_environment::fleet_environment::TruckId;
use haulplan_scheduling_environment::job_environment::JobId;

use self::common::ledger;
use self::common::window;

#[test]
fn test_second_overlapping_commit_is_rejected() {
    let (ledger, _) = ledger();
    let truck = TruckId::new("T");

    let j1 = ledger.propose(&JobId::new("J1"), &truck, window(9, 11)).unwrap();
    let j2 = ledger.propose(&JobId::new("J2"), &truck, window(10, 12)).unwrap();
    let j1 = ledger.commit(j1.id, j1.version).unwrap();

    let error = ledger.commit(j2.id, j2.version).unwrap_err();

    assert_eq!(
        error,
        SchedulingError::OverlapDetected {
            truck: truck.clone(),
            window: window(10, 12),
            conflicting: vec![j1.id],
        }
    );
    assert_eq!(error.retry_hint(), RetryHint::ChooseDifferentSlot);
    assert_eq!(ledger.get(j2.id).unwrap().status, AssignmentStatus::Proposed);
    assert_eq!(ledger.committed_windows(&truck), vec![(j1.id, window(9, 11))]);
}

#[test]
fn test_profile_mismatch_leaves_index_untouched() {
    let (ledger, _) = ledger();
    let truck = TruckId::new("T");

    let j3 = ledger.propose(&JobId::new("J3"), &truck, window(13, 14)).unwrap();
    let error = ledger.commit(j3.id, j3.version).unwrap_err();

    assert!(matches!(
        error,
        SchedulingError::Infeasible(Infeasibility::ProfileMismatch { .. })
    ));
    assert_eq!(error.kind(), ErrorKind::ProfileMismatch);
    assert!(ledger.committed_windows(&truck).is_empty());
    assert_eq!(ledger.get(j3.id).unwrap().version, Version(1));
}

#[test]
fn test_cancel_requires_current_version() {
    let (ledger, _) = ledger();
    let truck = TruckId::new("T");

    let j1 = ledger.propose(&JobId::new("J1"), &truck, window(9, 11)).unwrap();
    let committed = ledger.commit(j1.id, j1.version).unwrap();
    assert_eq!(committed.version, Version(2));

    assert_eq!(
        ledger.cancel(j1.id, Version(1)),
        Err(SchedulingError::VersionConflict {
            assignment: j1.id,
            expected: Version(1),
            current: Version(2),
        })
    );
    assert_eq!(ledger.committed_windows(&truck).len(), 1);

    let cancelled = ledger.cancel(j1.id, Version(2)).unwrap();

    assert_eq!(cancelled.status, AssignmentStatus::Cancelled);
    assert_eq!(cancelled.version, Version(3));
    assert!(ledger.committed_windows(&truck).is_empty());
}

#[test]
fn test_cancelled_slot_can_be_taken_by_a_new_proposal() {
    let (ledger, _) = ledger();
    let truck = TruckId::new("T");

    let j1 = ledger.propose(&JobId::new("J1"), &truck, window(9, 11)).unwrap();
    let j1 = ledger.commit(j1.id, j1.version).unwrap();
    ledger.cancel(j1.id, j1.version).unwrap();

    let again = ledger.propose(&JobId::new("J1"), &truck, window(9, 11)).unwrap();
    let again = ledger.commit(again.id, again.version).unwrap();

    assert_ne!(again.id, j1.id);
    assert_eq!(ledger.committed_windows(&truck), vec![(again.id, window(9, 11))]);
    assert_eq!(ledger.committed_assignment_for(&JobId::new("J1")), Some(again.id));
}

#[test]
fn test_stale_commit_is_rejected_every_time() {
    let (ledger, _) = ledger();
    let truck = TruckId::new("T");

    let j1 = ledger.propose(&JobId::new("J1"), &truck, window(9, 11)).unwrap();
    ledger.commit(j1.id, j1.version).unwrap();

    for _ in 0..3 {
        let error = ledger.commit(j1.id, j1.version).unwrap_err();
        assert_eq!(error.kind(), ErrorKind::VersionConflict);
    }
    assert_eq!(ledger.get(j1.id).unwrap().version, Version(2));
    assert_eq!(ledger.history(j1.id).unwrap().len(), 2);
}

#[test]
fn test_committing_a_committed_assignment_is_an_invalid_transition() {
    let (ledger, _) = ledger();

    let j1 = ledger
        .propose(&JobId::new("J1"), &TruckId::new("T"), window(9, 11))
        .unwrap();
    let committed = ledger.commit(j1.id, j1.version).unwrap();

    assert_eq!(
        ledger.commit(committed.id, committed.version),
        Err(SchedulingError::InvalidTransition {
            assignment: committed.id,
            from: AssignmentStatus::Committed,
            to: AssignmentStatus::Committed,
        })
    );
}

#[test]
fn test_cancelled_assignment_cannot_be_cancelled_again() {
    let (ledger, _) = ledger();

    let j1 = ledger
        .propose(&JobId::new("J1"), &TruckId::new("T"), window(9, 11))
        .unwrap();
    let cancelled = ledger.cancel(j1.id, j1.version).unwrap();

    let error = ledger.cancel(cancelled.id, cancelled.version).unwrap_err();

    assert_eq!(error.kind(), ErrorKind::InvalidTransition);
}

#[test]
fn test_adjacent_windows_do_not_conflict() {
    let (ledger, _) = ledger();
    let truck = TruckId::new("T");

    let j1 = ledger.propose(&JobId::new("J1"), &truck, window(9, 11)).unwrap();
    let j4 = ledger.propose(&JobId::new("J4"), &truck, window(11, 13)).unwrap();
    ledger.commit(j1.id, j1.version).unwrap();
    ledger.commit(j4.id, j4.version).unwrap();

    assert_eq!(ledger.committed_windows(&truck).len(), 2);
    assert!(ledger.overlapping(&truck, &window(11, 12)).contains(&j4.id));
}

#[test]
fn test_unknown_assignment_is_not_found() {
    let (ledger, _) = ledger();

    let error = ledger
        .commit(haulplan_scheduling_environment::assignment::AssignmentId(99), Version(1))
        .unwrap_err();

    assert_eq!(error.kind(), ErrorKind::NotFound);
    assert_eq!(error.to_string(), "assignment A-99 was not found");
}

#[test]
fn test_list_is_ordered_by_window_start() {
    let (ledger, _) = ledger();

    ledger
        .propose(&JobId::new("J4"), &TruckId::new("T"), window(11, 13))
        .unwrap();
    ledger
        .propose(&JobId::new("J1"), &TruckId::new("U"), window(9, 11))
        .unwrap();
    ledger
        .propose(&JobId::new("J2"), &TruckId::new("T"), window(10, 12))
        .unwrap();

    let jobs: Vec<_> = ledger
        .list(&AssignmentFilter::default())
        .into_iter()
        .map(|assignment| assignment.job_id)
        .collect();

    assert_eq!(jobs, vec![JobId::new("J1"), JobId::new("J2"), JobId::new("J4")]);
}
