//! The global timer: start, stop and entry listings.

use chrono::{DateTime, Utc};
use tracing::{info, warn};

use crate::clock::Clock;
use crate::deadline::Deadline;
use crate::error::{RepoResult, ServiceError, ServiceResult};
use crate::model::{NewTimeEntry, TimeEntry, elapsed_seconds};
use crate::repository::{ActiveSlot, CategoryRepository, TimeEntryRepository};
use crate::types::{CategoryId, TimeEntryId};

/// The single global timer.
///
/// The timer is either idle (no active entry) or running exactly one entry.
/// `start` and `stop_active` run inside the repository's active-slot scope,
/// so concurrent callers never observe the slot half-updated and never
/// create a second active entry.
pub struct TimeTrackingService<T, C, K>
where
    T: TimeEntryRepository,
    C: CategoryRepository,
    K: Clock,
{
    entries: T,
    categories: C,
    clock: K,
}

impl<T, C, K> TimeTrackingService<T, C, K>
where
    T: TimeEntryRepository,
    C: CategoryRepository,
    K: Clock,
{
    pub const fn new(entries: T, categories: C, clock: K) -> Self {
        Self {
            entries,
            categories,
            clock,
        }
    }

    /// Starts a timer for `category_id`, stopping the running one first.
    ///
    /// The same instant closes the previous entry and opens the new one. If
    /// stopping the previous entry fails, no new entry is created.
    pub fn start(&self, deadline: &Deadline, category_id: CategoryId) -> ServiceResult<TimeEntry> {
        self.categories.get_category(deadline, category_id)?;

        let entry = self.entries.with_active_slot(deadline, |slot| {
            let now = self.clock.now();
            if let Some(active) = slot.find_active_entry()? {
                let stopped = stop_at(slot, &active, now)?;
                info!(
                    entry_id = %stopped.id,
                    category_id = %stopped.category_id,
                    duration_seconds = stopped.duration_seconds,
                    "stopped running timer before starting a new one"
                );
            }
            slot.create_entry(&NewTimeEntry {
                id: TimeEntryId::new(),
                category_id,
                started_at: now,
            })
        })?;

        info!(entry_id = %entry.id, category_id = %category_id, started_at = %entry.started_at, "timer started");
        Ok(entry)
    }

    /// Stops the running timer.
    pub fn stop_active(&self, deadline: &Deadline) -> ServiceResult<TimeEntry> {
        let stopped = self.entries.with_active_slot(deadline, |slot| {
            let active = slot
                .find_active_entry()?
                .ok_or(ServiceError::NoActiveTimer)?;
            let now = self.clock.now();
            Ok::<_, ServiceError>(stop_at(slot, &active, now)?)
        })?;

        info!(
            entry_id = %stopped.id,
            duration_seconds = stopped.duration_seconds,
            "timer stopped"
        );
        Ok(stopped)
    }

    /// The running entry, if any.
    pub fn active(&self, deadline: &Deadline) -> ServiceResult<Option<TimeEntry>> {
        Ok(self.entries.find_active_entry(deadline)?)
    }

    /// All entries of a category, newest start first.
    pub fn list_by_category(
        &self,
        deadline: &Deadline,
        category_id: CategoryId,
    ) -> ServiceResult<Vec<TimeEntry>> {
        Ok(self.entries.list_entries(deadline, category_id)?)
    }

    /// Entries of a category started within `[start, end]`, newest first.
    ///
    /// Callers reject `start > end` before calling.
    pub fn list_by_category_in_range(
        &self,
        deadline: &Deadline,
        category_id: CategoryId,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> ServiceResult<Vec<TimeEntry>> {
        Ok(self
            .entries
            .list_entries_in_range(deadline, category_id, start, end)?)
    }
}

fn stop_at(slot: &dyn ActiveSlot, active: &TimeEntry, now: DateTime<Utc>) -> RepoResult<TimeEntry> {
    if now < active.started_at {
        warn!(
            entry_id = %active.id,
            started_at = %active.started_at,
            now = %now,
            "clock is behind the running entry; clamping duration to zero"
        );
    }
    slot.stop_entry(active.id, now, elapsed_seconds(active.started_at, now))
}
