//! Assignment ledger and conflict engine for the truck planning service.
//!
//! The ledger owns every assignment and its revision history. Commits,
//! cancellations and reassignments touching the same truck are serialized
//! through that truck's section of the [`ConflictIndex`], so two commits can
//! never leave overlapping windows on one truck.

pub mod conflict_index;
pub mod error;
pub mod feasibility;
pub mod ledger;
pub mod reference;
pub mod sink;

use std::sync::Mutex;
use std::sync::MutexGuard;
use std::sync::PoisonError;
use std::sync::RwLock;
use std::sync::RwLockReadGuard;
use std::sync::RwLockWriteGuard;

pub use conflict_index::ConflictIndex;
pub use error::ErrorKind;
pub use error::ReplayError;
pub use error::RetryHint;
pub use error::SchedulingError;
pub use ledger::AssignmentFilter;
pub use ledger::AssignmentLedger;
pub use ledger::ReassignTarget;
pub use ledger::Reassignment;
pub use reference::ReferenceSource;
pub use sink::AssignmentRecord;
pub use sink::AssignmentSink;

// A panic inside a section cannot leave a timeline half written: every
// mutation is a single insert or remove performed after all checks passed.
pub(crate) fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

pub(crate) fn read<T>(rw_lock: &RwLock<T>) -> RwLockReadGuard<'_, T> {
    rw_lock.read().unwrap_or_else(PoisonError::into_inner)
}

pub(crate) fn write<T>(rw_lock: &RwLock<T>) -> RwLockWriteGuard<'_, T> {
    rw_lock.write().unwrap_or_else(PoisonError::into_inner)
}
