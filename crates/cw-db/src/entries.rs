//! `TimeEntryRepository` over the `time_entries` table.

use chrono::{DateTime, Utc};
use cw_core::{
    ActiveSlot, CategoryId, Deadline, NewTimeEntry, RepoError, RepoResult, TimeEntry,
    TimeEntryId, TimeEntryRepository,
};
use rusqlite::{Connection, OptionalExtension, Row, TransactionBehavior, params};
use tracing::{debug, warn};

use crate::{
    Database, column_id, column_opt_timestamp, column_timestamp, format_timestamp, now_timestamp,
    repo_err,
};

const ENTRY_COLUMNS: &str =
    "id, category_id, started_at, stopped_at, duration_seconds, created_at, updated_at";

fn entry_from_row(row: &Row<'_>) -> rusqlite::Result<TimeEntry> {
    Ok(TimeEntry {
        id: column_id(row, 0)?,
        category_id: column_id(row, 1)?,
        started_at: column_timestamp(row, 2)?,
        stopped_at: column_opt_timestamp(row, 3)?,
        duration_seconds: row.get(4)?,
        created_at: column_timestamp(row, 5)?,
        updated_at: column_timestamp(row, 6)?,
    })
}

fn insert_entry(conn: &Connection, entry: &NewTimeEntry) -> RepoResult<TimeEntry> {
    conn.query_row(
        &format!(
            "INSERT INTO time_entries (id, category_id, started_at, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?4)
             RETURNING {ENTRY_COLUMNS}"
        ),
        params![
            entry.id.to_string(),
            entry.category_id.to_string(),
            format_timestamp(entry.started_at),
            now_timestamp(),
        ],
        entry_from_row,
    )
    .map_err(repo_err)
}

fn select_active(conn: &Connection) -> RepoResult<Option<TimeEntry>> {
    conn.query_row(
        &format!("SELECT {ENTRY_COLUMNS} FROM time_entries WHERE stopped_at IS NULL"),
        [],
        entry_from_row,
    )
    .optional()
    .map_err(repo_err)
}

fn update_stop(
    conn: &Connection,
    id: TimeEntryId,
    stopped_at: DateTime<Utc>,
    duration_seconds: i64,
) -> RepoResult<TimeEntry> {
    conn.query_row(
        &format!(
            "UPDATE time_entries
             SET stopped_at = ?2, duration_seconds = ?3, updated_at = ?4
             WHERE id = ?1
             RETURNING {ENTRY_COLUMNS}"
        ),
        params![
            id.to_string(),
            format_timestamp(stopped_at),
            duration_seconds,
            now_timestamp(),
        ],
        entry_from_row,
    )
    .map_err(repo_err)
}

/// Slot handle bound to the open `IMMEDIATE` transaction.
struct SqliteSlot<'a> {
    conn: &'a Connection,
    deadline: &'a Deadline,
}

impl ActiveSlot for SqliteSlot<'_> {
    fn find_active_entry(&self) -> RepoResult<Option<TimeEntry>> {
        self.deadline.check()?;
        select_active(self.conn)
    }

    fn stop_entry(
        &self,
        id: TimeEntryId,
        stopped_at: DateTime<Utc>,
        duration_seconds: i64,
    ) -> RepoResult<TimeEntry> {
        self.deadline.check()?;
        update_stop(self.conn, id, stopped_at, duration_seconds)
    }

    fn create_entry(&self, entry: &NewTimeEntry) -> RepoResult<TimeEntry> {
        self.deadline.check()?;
        insert_entry(self.conn, entry)
    }
}

impl TimeEntryRepository for Database {
    fn create_entry(&self, deadline: &Deadline, entry: &NewTimeEntry) -> RepoResult<TimeEntry> {
        let conn = self.lock(deadline)?;
        insert_entry(&conn, entry)
    }

    fn get_entry(&self, deadline: &Deadline, id: TimeEntryId) -> RepoResult<TimeEntry> {
        let conn = self.lock(deadline)?;
        conn.query_row(
            &format!("SELECT {ENTRY_COLUMNS} FROM time_entries WHERE id = ?1"),
            [id.to_string()],
            entry_from_row,
        )
        .map_err(repo_err)
    }

    fn list_entries(
        &self,
        deadline: &Deadline,
        category_id: CategoryId,
    ) -> RepoResult<Vec<TimeEntry>> {
        let conn = self.lock(deadline)?;
        let mut stmt = conn
            .prepare(&format!(
                "SELECT {ENTRY_COLUMNS} FROM time_entries
                 WHERE category_id = ?1
                 ORDER BY started_at DESC, id DESC"
            ))
            .map_err(repo_err)?;
        let rows = stmt
            .query_map([category_id.to_string()], entry_from_row)
            .map_err(repo_err)?;
        rows.collect::<rusqlite::Result<Vec<_>>>().map_err(repo_err)
    }

    fn list_entries_in_range(
        &self,
        deadline: &Deadline,
        category_id: CategoryId,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> RepoResult<Vec<TimeEntry>> {
        let conn = self.lock(deadline)?;
        let mut stmt = conn
            .prepare(&format!(
                "SELECT {ENTRY_COLUMNS} FROM time_entries
                 WHERE category_id = ?1 AND started_at >= ?2 AND started_at <= ?3
                 ORDER BY started_at DESC, id DESC"
            ))
            .map_err(repo_err)?;
        let rows = stmt
            .query_map(
                params![
                    category_id.to_string(),
                    format_timestamp(start),
                    format_timestamp(end)
                ],
                entry_from_row,
            )
            .map_err(repo_err)?;
        rows.collect::<rusqlite::Result<Vec<_>>>().map_err(repo_err)
    }

    fn find_active_entry(&self, deadline: &Deadline) -> RepoResult<Option<TimeEntry>> {
        let conn = self.lock(deadline)?;
        select_active(&conn)
    }

    fn stop_entry(
        &self,
        deadline: &Deadline,
        id: TimeEntryId,
        stopped_at: DateTime<Utc>,
        duration_seconds: i64,
    ) -> RepoResult<TimeEntry> {
        let conn = self.lock(deadline)?;
        update_stop(&conn, id, stopped_at, duration_seconds)
    }

    fn with_active_slot<T, E, F>(&self, deadline: &Deadline, f: F) -> Result<T, E>
    where
        F: FnOnce(&dyn ActiveSlot) -> Result<T, E>,
        E: From<RepoError>,
    {
        let mut conn = self.lock(deadline)?;
        let tx = conn
            .transaction_with_behavior(TransactionBehavior::Immediate)
            .map_err(repo_err)?;

        let outcome = f(&SqliteSlot {
            conn: &tx,
            deadline,
        });

        match outcome {
            Ok(value) => {
                tx.commit().map_err(repo_err)?;
                Ok(value)
            }
            Err(err) => {
                debug!("rolling back active slot transaction");
                if let Err(rollback) = tx.rollback() {
                    warn!(error = %rollback, "failed to roll back active slot transaction");
                }
                Err(err)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};
    use cw_core::{
        CancelToken, CategoryRepository, ManualClock, NewCategory, NewProject, ProjectId,
        ProjectRepository, ServiceError, TimeTrackingService,
    };
    use std::sync::Arc;

    fn at(hour: u32, minute: u32, second: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 11, 2, hour, minute, second)
            .unwrap()
    }

    fn seed(db: &Database) -> CategoryId {
        let deadline = Deadline::none();
        let project = db
            .create_project(
                &deadline,
                &NewProject {
                    id: ProjectId::new(),
                    name: "P".to_string(),
                    description: None,
                },
            )
            .unwrap();
        db.create_category(
            &deadline,
            &NewCategory {
                id: CategoryId::new(),
                project_id: project.id,
                parent_category_id: None,
                name: "Dev".to_string(),
                description: None,
            },
        )
        .unwrap()
        .id
    }

    fn new_entry(category_id: CategoryId, started_at: DateTime<Utc>) -> NewTimeEntry {
        NewTimeEntry {
            id: TimeEntryId::new(),
            category_id,
            started_at,
        }
    }

    #[test]
    fn second_running_entry_is_rejected_by_the_schema() {
        let db = Database::open_in_memory().unwrap();
        let deadline = Deadline::none();
        let category = seed(&db);

        db.create_entry(&deadline, &new_entry(category, at(10, 0, 0)))
            .unwrap();
        let err = db
            .create_entry(&deadline, &new_entry(category, at(10, 1, 0)))
            .unwrap_err();
        assert!(matches!(err, RepoError::Duplicate));
    }

    #[test]
    fn entry_for_missing_category_is_a_foreign_key_violation() {
        let db = Database::open_in_memory().unwrap();
        let err = db
            .create_entry(&Deadline::none(), &new_entry(CategoryId::new(), at(10, 0, 0)))
            .unwrap_err();
        assert!(matches!(err, RepoError::ForeignKeyViolation));
    }

    #[test]
    fn stop_and_find_active() {
        let db = Database::open_in_memory().unwrap();
        let deadline = Deadline::none();
        let category = seed(&db);

        let entry = db
            .create_entry(&deadline, &new_entry(category, at(10, 0, 0)))
            .unwrap();
        assert_eq!(db.find_active_entry(&deadline).unwrap(), Some(entry.clone()));

        let stopped = db
            .stop_entry(&deadline, entry.id, at(10, 5, 0), 300)
            .unwrap();
        assert_eq!(stopped.stopped_at, Some(at(10, 5, 0)));
        assert_eq!(stopped.duration_seconds, Some(300));
        assert_eq!(db.find_active_entry(&deadline).unwrap(), None);
        assert_eq!(db.get_entry(&deadline, entry.id).unwrap(), stopped);

        let err = db
            .stop_entry(&deadline, TimeEntryId::new(), at(10, 5, 0), 1)
            .unwrap_err();
        assert!(matches!(err, RepoError::NotFound));
    }

    #[test]
    fn range_listing_is_inclusive_and_newest_first() {
        let db = Database::open_in_memory().unwrap();
        let deadline = Deadline::none();
        let category = seed(&db);

        for (start, stop) in [(at(9, 0, 0), at(9, 30, 0)), (at(10, 0, 0), at(10, 30, 0))] {
            let entry = db
                .create_entry(&deadline, &new_entry(category, start))
                .unwrap();
            db.stop_entry(&deadline, entry.id, stop, 1800).unwrap();
        }
        db.create_entry(&deadline, &new_entry(category, at(11, 0, 0)))
            .unwrap();

        let starts: Vec<_> = db
            .list_entries_in_range(&deadline, category, at(9, 0, 0), at(10, 0, 0))
            .unwrap()
            .into_iter()
            .map(|entry| entry.started_at)
            .collect();
        assert_eq!(starts, vec![at(10, 0, 0), at(9, 0, 0)]);

        let all = db.list_entries(&deadline, category).unwrap();
        assert_eq!(all.len(), 3);
        assert_eq!(all[0].started_at, at(11, 0, 0));

        let empty = db
            .list_entries_in_range(&deadline, category, at(12, 0, 0), at(13, 0, 0))
            .unwrap();
        assert!(empty.is_empty());
    }

    #[test]
    fn failing_slot_closure_rolls_back() {
        let db = Database::open_in_memory().unwrap();
        let deadline = Deadline::none();
        let category = seed(&db);
        let running = db
            .create_entry(&deadline, &new_entry(category, at(10, 0, 0)))
            .unwrap();

        let result: Result<(), RepoError> = db.with_active_slot(&deadline, |slot| {
            slot.stop_entry(running.id, at(10, 5, 0), 300)?;
            Err(RepoError::NotFound)
        });
        assert!(matches!(result, Err(RepoError::NotFound)));

        let active = db.find_active_entry(&deadline).unwrap();
        assert_eq!(active, Some(running));
    }

    #[test]
    fn timer_service_runs_against_sqlite() {
        let db = Arc::new(Database::open_in_memory().unwrap());
        let deadline = Deadline::none();
        let category = seed(&db);
        let clock = Arc::new(ManualClock::new(at(10, 0, 0)));
        let service = TimeTrackingService::new(db.clone(), db.clone(), clock.clone());

        let first = service.start(&deadline, category).unwrap();
        clock.set(at(10, 5, 0));
        let second = service.start(&deadline, category).unwrap();
        clock.set(at(10, 7, 30));
        let stopped = service.stop_active(&deadline).unwrap();

        assert_eq!(stopped.id, second.id);
        assert_eq!(stopped.duration_seconds, Some(150));
        let first = db.get_entry(&deadline, first.id).unwrap();
        assert_eq!(first.duration_seconds, Some(300));
        assert_eq!(first.stopped_at, Some(at(10, 5, 0)));

        assert!(matches!(
            service.stop_active(&deadline),
            Err(ServiceError::NoActiveTimer)
        ));
    }

    #[test]
    fn sub_millisecond_instants_round_trip_through_the_timer() {
        let db = Arc::new(Database::open_in_memory().unwrap());
        let deadline = Deadline::none();
        let category = seed(&db);
        let t1 = at(10, 0, 0) + Duration::microseconds(500);
        let t2 = at(10, 5, 0) + Duration::microseconds(750);
        let clock = Arc::new(ManualClock::new(t1));
        let service = TimeTrackingService::new(db.clone(), db.clone(), clock.clone());

        let first = service.start(&deadline, category).unwrap();
        assert_eq!(first.started_at, t1);
        clock.set(t2);
        let second = service.start(&deadline, category).unwrap();
        assert_eq!(second.started_at, t2);

        let first = db.get_entry(&deadline, first.id).unwrap();
        assert_eq!(first.stopped_at, Some(t2));
        assert_eq!(first.duration_seconds, Some(300));
    }

    #[test]
    fn range_bounds_are_exact() {
        let db = Database::open_in_memory().unwrap();
        let deadline = Deadline::none();
        let category = seed(&db);
        let t1 = at(10, 0, 0) + Duration::microseconds(500);
        let t2 = at(10, 5, 0) + Duration::microseconds(750);

        let first = db.create_entry(&deadline, &new_entry(category, t1)).unwrap();
        db.stop_entry(&deadline, first.id, t2, 300).unwrap();
        let second = db.create_entry(&deadline, &new_entry(category, t2)).unwrap();

        let ids = |start: DateTime<Utc>, end: DateTime<Utc>| -> Vec<TimeEntryId> {
            db.list_entries_in_range(&deadline, category, start, end)
                .unwrap()
                .into_iter()
                .map(|entry| entry.id)
                .collect()
        };

        // Same millisecond as t1, but later.
        assert_eq!(
            ids(at(10, 0, 0) + Duration::microseconds(900), at(11, 0, 0)),
            vec![second.id]
        );
        assert_eq!(ids(t1, t2), vec![second.id, first.id]);
        assert_eq!(
            ids(t1 - Duration::seconds(1), t2 - Duration::seconds(1)),
            vec![first.id]
        );
        assert_eq!(
            ids(t1 + Duration::seconds(1), t2 + Duration::seconds(1)),
            vec![second.id]
        );
        assert!(ids(t1 + Duration::seconds(1), t2 - Duration::seconds(1)).is_empty());
    }

    #[test]
    fn cancel_between_stop_and_create_rolls_back() {
        let db = Arc::new(Database::open_in_memory().unwrap());
        let category = seed(&db);
        let running = db
            .create_entry(&Deadline::none(), &new_entry(category, at(10, 0, 0)))
            .unwrap();

        let token = CancelToken::new();
        let deadline = Deadline::none().with_cancel(token.clone());
        let result: Result<TimeEntry, RepoError> = db.with_active_slot(&deadline, |slot| {
            let active = slot.find_active_entry()?.ok_or(RepoError::NotFound)?;
            slot.stop_entry(active.id, at(10, 5, 0), 300)?;
            token.cancel();
            slot.create_entry(&new_entry(category, at(10, 5, 0)))
        });
        assert!(matches!(result, Err(RepoError::Cancelled)));

        // Back in the previous state: the old entry is still running.
        let fresh = Deadline::none();
        assert_eq!(db.find_active_entry(&fresh).unwrap(), Some(running.clone()));
        assert_eq!(db.list_entries(&fresh, category).unwrap(), vec![running.clone()]);

        let clock = Arc::new(ManualClock::new(at(10, 6, 0)));
        let service = TimeTrackingService::new(db.clone(), db.clone(), clock);
        let next = service.start(&fresh, category).unwrap();
        assert!(next.is_active());
        let previous = db.get_entry(&fresh, running.id).unwrap();
        assert_eq!(previous.duration_seconds, Some(360));
    }
}
