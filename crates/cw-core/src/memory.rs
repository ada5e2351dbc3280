//! In-memory repositories.
//!
//! [`MemoryStore`] implements all three repository traits over plain vectors
//! and mirrors the constraints the SQLite schema enforces: unique category
//! names per project, referential integrity, detach-on-delete for child
//! categories and cascading deletes for projects. Rows keep insertion order,
//! which stands in for `created_at` ordering.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};

use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::deadline::{CancelToken, Deadline};
use crate::error::{RepoError, RepoResult};
use crate::model::{Category, NewCategory, NewProject, NewTimeEntry, Project, TimeEntry};
use crate::repository::{ActiveSlot, CategoryRepository, ProjectRepository, TimeEntryRepository};
use crate::types::{CategoryId, ProjectId, TimeEntryId};

/// Failure injected by [`MemoryStore::fail_next_stop`].
#[derive(Debug, Error)]
#[error("injected stop failure")]
pub struct InjectedFailure;

#[derive(Debug, Default)]
struct Tables {
    projects: Vec<Project>,
    categories: Vec<Category>,
    entries: Vec<TimeEntry>,
}

/// Thread-safe in-memory store.
#[derive(Debug, Default)]
pub struct MemoryStore {
    tables: Mutex<Tables>,
    slot: Mutex<()>,
    fail_next_stop: AtomicBool,
    cancel_after_stop: Mutex<Option<CancelToken>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes the next `stop_entry` call fail with a storage error.
    pub fn fail_next_stop(&self) {
        self.fail_next_stop.store(true, Ordering::SeqCst);
    }

    /// Cancels `token` right after the next successful `stop_entry` call.
    pub fn cancel_after_next_stop(&self, token: CancelToken) {
        *self
            .cancel_after_stop
            .lock()
            .unwrap_or_else(PoisonError::into_inner) = Some(token);
    }

    /// Snapshot of every time entry, in insertion order.
    pub fn all_entries(&self) -> Vec<TimeEntry> {
        self.tables().entries.clone()
    }

    fn tables(&self) -> MutexGuard<'_, Tables> {
        // Every mutation below completes before the guard drops, so a
        // poisoned lock still guards consistent tables.
        self.tables.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn find_active(&self, deadline: &Deadline) -> RepoResult<Option<TimeEntry>> {
        deadline.check()?;
        Ok(self
            .tables()
            .entries
            .iter()
            .find(|entry| entry.is_active())
            .cloned())
    }

    fn stop(
        &self,
        deadline: &Deadline,
        id: TimeEntryId,
        stopped_at: DateTime<Utc>,
        duration_seconds: i64,
    ) -> RepoResult<TimeEntry> {
        deadline.check()?;
        if self.fail_next_stop.swap(false, Ordering::SeqCst) {
            return Err(RepoError::storage(InjectedFailure));
        }
        let mut tables = self.tables();
        let entry = tables
            .entries
            .iter_mut()
            .find(|entry| entry.id == id)
            .ok_or(RepoError::NotFound)?;
        entry.stopped_at = Some(stopped_at);
        entry.duration_seconds = Some(duration_seconds);
        entry.updated_at = Utc::now();
        let stopped = entry.clone();
        drop(tables);
        if let Some(token) = self
            .cancel_after_stop
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take()
        {
            token.cancel();
        }
        Ok(stopped)
    }

    fn create(&self, deadline: &Deadline, new: &NewTimeEntry) -> RepoResult<TimeEntry> {
        deadline.check()?;
        let mut tables = self.tables();
        if !tables.categories.iter().any(|c| c.id == new.category_id) {
            return Err(RepoError::ForeignKeyViolation);
        }
        if tables
            .entries
            .iter()
            .any(|e| e.id == new.id || e.is_active())
        {
            return Err(RepoError::Duplicate);
        }
        let now = Utc::now();
        let entry = TimeEntry {
            id: new.id,
            category_id: new.category_id,
            started_at: new.started_at,
            stopped_at: None,
            duration_seconds: None,
            created_at: now,
            updated_at: now,
        };
        tables.entries.push(entry.clone());
        Ok(entry)
    }
}

impl ProjectRepository for MemoryStore {
    fn create_project(&self, deadline: &Deadline, project: &NewProject) -> RepoResult<Project> {
        deadline.check()?;
        let mut tables = self.tables();
        if tables.projects.iter().any(|p| p.id == project.id) {
            return Err(RepoError::Duplicate);
        }
        let now = Utc::now();
        let project = Project {
            id: project.id,
            name: project.name.clone(),
            description: project.description.clone(),
            created_at: now,
            updated_at: now,
        };
        tables.projects.push(project.clone());
        Ok(project)
    }

    fn get_project(&self, deadline: &Deadline, id: ProjectId) -> RepoResult<Project> {
        deadline.check()?;
        self.tables()
            .projects
            .iter()
            .find(|p| p.id == id)
            .cloned()
            .ok_or(RepoError::NotFound)
    }

    fn list_projects(&self, deadline: &Deadline) -> RepoResult<Vec<Project>> {
        deadline.check()?;
        Ok(self.tables().projects.clone())
    }

    fn update_project(
        &self,
        deadline: &Deadline,
        id: ProjectId,
        name: &str,
        description: Option<&str>,
    ) -> RepoResult<Project> {
        deadline.check()?;
        let mut tables = self.tables();
        let project = tables
            .projects
            .iter_mut()
            .find(|p| p.id == id)
            .ok_or(RepoError::NotFound)?;
        project.name = name.to_string();
        project.description = description.map(str::to_string);
        project.updated_at = Utc::now();
        Ok(project.clone())
    }

    fn delete_project(&self, deadline: &Deadline, id: ProjectId) -> RepoResult<()> {
        deadline.check()?;
        let mut tables = self.tables();
        let before = tables.projects.len();
        tables.projects.retain(|p| p.id != id);
        if tables.projects.len() == before {
            return Err(RepoError::NotFound);
        }
        let removed: Vec<CategoryId> = tables
            .categories
            .iter()
            .filter(|c| c.project_id == id)
            .map(|c| c.id)
            .collect();
        tables.categories.retain(|c| c.project_id != id);
        tables.entries.retain(|e| !removed.contains(&e.category_id));
        Ok(())
    }
}

impl CategoryRepository for MemoryStore {
    fn create_category(
        &self,
        deadline: &Deadline,
        category: &NewCategory,
    ) -> RepoResult<Category> {
        deadline.check()?;
        let mut tables = self.tables();
        if !tables.projects.iter().any(|p| p.id == category.project_id) {
            return Err(RepoError::ForeignKeyViolation);
        }
        if category
            .parent_category_id
            .is_some_and(|parent_id| !tables.categories.iter().any(|c| c.id == parent_id))
        {
            return Err(RepoError::ForeignKeyViolation);
        }
        if tables.categories.iter().any(|c| {
            c.id == category.id || (c.project_id == category.project_id && c.name == category.name)
        }) {
            return Err(RepoError::Duplicate);
        }
        let now = Utc::now();
        let category = Category {
            id: category.id,
            project_id: category.project_id,
            parent_category_id: category.parent_category_id,
            name: category.name.clone(),
            description: category.description.clone(),
            created_at: now,
            updated_at: now,
        };
        tables.categories.push(category.clone());
        Ok(category)
    }

    fn get_category(&self, deadline: &Deadline, id: CategoryId) -> RepoResult<Category> {
        deadline.check()?;
        self.tables()
            .categories
            .iter()
            .find(|c| c.id == id)
            .cloned()
            .ok_or(RepoError::NotFound)
    }

    fn list_categories(
        &self,
        deadline: &Deadline,
        project_id: ProjectId,
    ) -> RepoResult<Vec<Category>> {
        deadline.check()?;
        Ok(self
            .tables()
            .categories
            .iter()
            .filter(|c| c.project_id == project_id)
            .cloned()
            .collect())
    }

    fn list_child_categories(
        &self,
        deadline: &Deadline,
        parent_id: CategoryId,
    ) -> RepoResult<Vec<Category>> {
        deadline.check()?;
        Ok(self
            .tables()
            .categories
            .iter()
            .filter(|c| c.parent_category_id == Some(parent_id))
            .cloned()
            .collect())
    }

    fn update_category(
        &self,
        deadline: &Deadline,
        id: CategoryId,
        name: &str,
        description: Option<&str>,
        parent_category_id: Option<CategoryId>,
    ) -> RepoResult<Category> {
        deadline.check()?;
        let mut tables = self.tables();
        let project_id = tables
            .categories
            .iter()
            .find(|c| c.id == id)
            .map(|c| c.project_id)
            .ok_or(RepoError::NotFound)?;
        if parent_category_id
            .is_some_and(|parent_id| !tables.categories.iter().any(|c| c.id == parent_id))
        {
            return Err(RepoError::ForeignKeyViolation);
        }
        if tables
            .categories
            .iter()
            .any(|c| c.id != id && c.project_id == project_id && c.name == name)
        {
            return Err(RepoError::Duplicate);
        }
        let category = tables
            .categories
            .iter_mut()
            .find(|c| c.id == id)
            .ok_or(RepoError::NotFound)?;
        category.name = name.to_string();
        category.description = description.map(str::to_string);
        category.parent_category_id = parent_category_id;
        category.updated_at = Utc::now();
        Ok(category.clone())
    }

    fn delete_category(&self, deadline: &Deadline, id: CategoryId) -> RepoResult<()> {
        deadline.check()?;
        let mut tables = self.tables();
        let before = tables.categories.len();
        tables.categories.retain(|c| c.id != id);
        if tables.categories.len() == before {
            return Err(RepoError::NotFound);
        }
        for child in &mut tables.categories {
            if child.parent_category_id == Some(id) {
                child.parent_category_id = None;
            }
        }
        tables.entries.retain(|e| e.category_id != id);
        Ok(())
    }
}

impl TimeEntryRepository for MemoryStore {
    fn create_entry(&self, deadline: &Deadline, entry: &NewTimeEntry) -> RepoResult<TimeEntry> {
        self.create(deadline, entry)
    }

    fn get_entry(&self, deadline: &Deadline, id: TimeEntryId) -> RepoResult<TimeEntry> {
        deadline.check()?;
        self.tables()
            .entries
            .iter()
            .find(|e| e.id == id)
            .cloned()
            .ok_or(RepoError::NotFound)
    }

    fn list_entries(
        &self,
        deadline: &Deadline,
        category_id: CategoryId,
    ) -> RepoResult<Vec<TimeEntry>> {
        deadline.check()?;
        let mut entries: Vec<TimeEntry> = self
            .tables()
            .entries
            .iter()
            .filter(|e| e.category_id == category_id)
            .cloned()
            .collect();
        entries.sort_by(|a, b| b.started_at.cmp(&a.started_at));
        Ok(entries)
    }

    fn list_entries_in_range(
        &self,
        deadline: &Deadline,
        category_id: CategoryId,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> RepoResult<Vec<TimeEntry>> {
        let mut entries = self.list_entries(deadline, category_id)?;
        entries.retain(|e| e.started_at >= start && e.started_at <= end);
        Ok(entries)
    }

    fn find_active_entry(&self, deadline: &Deadline) -> RepoResult<Option<TimeEntry>> {
        self.find_active(deadline)
    }

    fn stop_entry(
        &self,
        deadline: &Deadline,
        id: TimeEntryId,
        stopped_at: DateTime<Utc>,
        duration_seconds: i64,
    ) -> RepoResult<TimeEntry> {
        self.stop(deadline, id, stopped_at, duration_seconds)
    }

    fn with_active_slot<T, E, F>(&self, deadline: &Deadline, f: F) -> Result<T, E>
    where
        F: FnOnce(&dyn ActiveSlot) -> Result<T, E>,
        E: From<RepoError>,
    {
        deadline.check()?;
        let _held = self.slot.lock().unwrap_or_else(PoisonError::into_inner);
        f(&MemorySlot {
            store: self,
            deadline,
        })
    }
}

/// Slot operations; the enclosing scope holds `MemoryStore::slot`.
struct MemorySlot<'a> {
    store: &'a MemoryStore,
    deadline: &'a Deadline,
}

impl ActiveSlot for MemorySlot<'_> {
    fn find_active_entry(&self) -> RepoResult<Option<TimeEntry>> {
        self.store.find_active(self.deadline)
    }

    fn stop_entry(
        &self,
        id: TimeEntryId,
        stopped_at: DateTime<Utc>,
        duration_seconds: i64,
    ) -> RepoResult<TimeEntry> {
        self.store.stop(self.deadline, id, stopped_at, duration_seconds)
    }

    fn create_entry(&self, entry: &NewTimeEntry) -> RepoResult<TimeEntry> {
        self.store.create(self.deadline, entry)
    }
}
