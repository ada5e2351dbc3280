//! Persistence contracts consumed by the services.
//!
//! Every call takes the caller's [`Deadline`]. Implementations must report
//! missing rows as [`RepoError::NotFound`], uniqueness violations as
//! [`RepoError::Duplicate`] and dangling references as
//! [`RepoError::ForeignKeyViolation`].
//!
//! [`RepoError::NotFound`]: crate::RepoError::NotFound
//! [`RepoError::Duplicate`]: crate::RepoError::Duplicate
//! [`RepoError::ForeignKeyViolation`]: crate::RepoError::ForeignKeyViolation

use std::sync::Arc;

use chrono::{DateTime, Utc};

use crate::deadline::Deadline;
use crate::error::{RepoError, RepoResult};
use crate::model::{Category, NewCategory, NewProject, NewTimeEntry, Project, TimeEntry};
use crate::types::{CategoryId, ProjectId, TimeEntryId};

/// Project persistence.
pub trait ProjectRepository: Send + Sync {
    fn create_project(&self, deadline: &Deadline, project: &NewProject) -> RepoResult<Project>;
    fn get_project(&self, deadline: &Deadline, id: ProjectId) -> RepoResult<Project>;
    /// All projects, oldest first.
    fn list_projects(&self, deadline: &Deadline) -> RepoResult<Vec<Project>>;
    fn update_project(
        &self,
        deadline: &Deadline,
        id: ProjectId,
        name: &str,
        description: Option<&str>,
    ) -> RepoResult<Project>;
    /// Deletes the project together with its categories and their entries.
    fn delete_project(&self, deadline: &Deadline, id: ProjectId) -> RepoResult<()>;
}

/// Category persistence.
///
/// `(project_id, name)` is unique. Deleting a category detaches its
/// children (their parent becomes `None`) instead of deleting them.
pub trait CategoryRepository: Send + Sync {
    fn create_category(&self, deadline: &Deadline, category: &NewCategory)
    -> RepoResult<Category>;
    fn get_category(&self, deadline: &Deadline, id: CategoryId) -> RepoResult<Category>;
    /// Categories of one project, oldest first.
    fn list_categories(&self, deadline: &Deadline, project_id: ProjectId)
    -> RepoResult<Vec<Category>>;
    /// Direct children of `parent_id`, oldest first.
    fn list_child_categories(
        &self,
        deadline: &Deadline,
        parent_id: CategoryId,
    ) -> RepoResult<Vec<Category>>;
    /// Updates name, description and parent. The project never changes.
    fn update_category(
        &self,
        deadline: &Deadline,
        id: CategoryId,
        name: &str,
        description: Option<&str>,
        parent_category_id: Option<CategoryId>,
    ) -> RepoResult<Category>;
    fn delete_category(&self, deadline: &Deadline, id: CategoryId) -> RepoResult<()>;
}

/// Operations on the active-entry slot, valid only inside
/// [`TimeEntryRepository::with_active_slot`].
pub trait ActiveSlot {
    /// The unique entry with no stop time, if any.
    fn find_active_entry(&self) -> RepoResult<Option<TimeEntry>>;
    fn stop_entry(
        &self,
        id: TimeEntryId,
        stopped_at: DateTime<Utc>,
        duration_seconds: i64,
    ) -> RepoResult<TimeEntry>;
    fn create_entry(&self, entry: &NewTimeEntry) -> RepoResult<TimeEntry>;
}

/// Time entry persistence.
pub trait TimeEntryRepository: Send + Sync {
    fn create_entry(&self, deadline: &Deadline, entry: &NewTimeEntry) -> RepoResult<TimeEntry>;
    fn get_entry(&self, deadline: &Deadline, id: TimeEntryId) -> RepoResult<TimeEntry>;
    /// Entries of one category, newest start first.
    fn list_entries(&self, deadline: &Deadline, category_id: CategoryId)
    -> RepoResult<Vec<TimeEntry>>;
    /// Entries of one category with `start <= started_at <= end`, newest
    /// start first.
    fn list_entries_in_range(
        &self,
        deadline: &Deadline,
        category_id: CategoryId,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> RepoResult<Vec<TimeEntry>>;
    fn find_active_entry(&self, deadline: &Deadline) -> RepoResult<Option<TimeEntry>>;
    fn stop_entry(
        &self,
        deadline: &Deadline,
        id: TimeEntryId,
        stopped_at: DateTime<Utc>,
        duration_seconds: i64,
    ) -> RepoResult<TimeEntry>;

    /// Runs `f` with exclusive access to the active-entry slot.
    ///
    /// No other `with_active_slot` scope observes or changes the active
    /// entry while `f` runs. Implementations that support it roll back the
    /// slot operations when `f` returns an error.
    fn with_active_slot<T, E, F>(&self, deadline: &Deadline, f: F) -> Result<T, E>
    where
        F: FnOnce(&dyn ActiveSlot) -> Result<T, E>,
        E: From<RepoError>;
}

impl<R: ProjectRepository + ?Sized> ProjectRepository for Arc<R> {
    fn create_project(&self, deadline: &Deadline, project: &NewProject) -> RepoResult<Project> {
        (**self).create_project(deadline, project)
    }

    fn get_project(&self, deadline: &Deadline, id: ProjectId) -> RepoResult<Project> {
        (**self).get_project(deadline, id)
    }

    fn list_projects(&self, deadline: &Deadline) -> RepoResult<Vec<Project>> {
        (**self).list_projects(deadline)
    }

    fn update_project(
        &self,
        deadline: &Deadline,
        id: ProjectId,
        name: &str,
        description: Option<&str>,
    ) -> RepoResult<Project> {
        (**self).update_project(deadline, id, name, description)
    }

    fn delete_project(&self, deadline: &Deadline, id: ProjectId) -> RepoResult<()> {
        (**self).delete_project(deadline, id)
    }
}

impl<R: CategoryRepository + ?Sized> CategoryRepository for Arc<R> {
    fn create_category(
        &self,
        deadline: &Deadline,
        category: &NewCategory,
    ) -> RepoResult<Category> {
        (**self).create_category(deadline, category)
    }

    fn get_category(&self, deadline: &Deadline, id: CategoryId) -> RepoResult<Category> {
        (**self).get_category(deadline, id)
    }

    fn list_categories(
        &self,
        deadline: &Deadline,
        project_id: ProjectId,
    ) -> RepoResult<Vec<Category>> {
        (**self).list_categories(deadline, project_id)
    }

    fn list_child_categories(
        &self,
        deadline: &Deadline,
        parent_id: CategoryId,
    ) -> RepoResult<Vec<Category>> {
        (**self).list_child_categories(deadline, parent_id)
    }

    fn update_category(
        &self,
        deadline: &Deadline,
        id: CategoryId,
        name: &str,
        description: Option<&str>,
        parent_category_id: Option<CategoryId>,
    ) -> RepoResult<Category> {
        (**self).update_category(deadline, id, name, description, parent_category_id)
    }

    fn delete_category(&self, deadline: &Deadline, id: CategoryId) -> RepoResult<()> {
        (**self).delete_category(deadline, id)
    }
}

impl<R: TimeEntryRepository> TimeEntryRepository for Arc<R> {
    fn create_entry(&self, deadline: &Deadline, entry: &NewTimeEntry) -> RepoResult<TimeEntry> {
        (**self).create_entry(deadline, entry)
    }

    fn get_entry(&self, deadline: &Deadline, id: TimeEntryId) -> RepoResult<TimeEntry> {
        (**self).get_entry(deadline, id)
    }

    fn list_entries(
        &self,
        deadline: &Deadline,
        category_id: CategoryId,
    ) -> RepoResult<Vec<TimeEntry>> {
        (**self).list_entries(deadline, category_id)
    }

    fn list_entries_in_range(
        &self,
        deadline: &Deadline,
        category_id: CategoryId,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> RepoResult<Vec<TimeEntry>> {
        (**self).list_entries_in_range(deadline, category_id, start, end)
    }

    fn find_active_entry(&self, deadline: &Deadline) -> RepoResult<Option<TimeEntry>> {
        (**self).find_active_entry(deadline)
    }

    fn stop_entry(
        &self,
        deadline: &Deadline,
        id: TimeEntryId,
        stopped_at: DateTime<Utc>,
        duration_seconds: i64,
    ) -> RepoResult<TimeEntry> {
        (**self).stop_entry(deadline, id, stopped_at, duration_seconds)
    }

    fn with_active_slot<T, E, F>(&self, deadline: &Deadline, f: F) -> Result<T, E>
    where
        F: FnOnce(&dyn ActiveSlot) -> Result<T, E>,
        E: From<RepoError>,
    {
        (**self).with_active_slot(deadline, f)
    }
}
