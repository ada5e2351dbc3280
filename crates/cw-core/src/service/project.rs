//! Project CRUD with name validation.

use tracing::debug;

use crate::deadline::Deadline;
use crate::error::{ServiceError, ServiceResult};
use crate::model::{NewProject, Project};
use crate::repository::ProjectRepository;
use crate::types::{ProjectId, normalize_name};

/// Validated CRUD over projects.
pub struct ProjectService<R: ProjectRepository> {
    repo: R,
}

impl<R: ProjectRepository> ProjectService<R> {
    pub const fn new(repo: R) -> Self {
        Self { repo }
    }

    /// Creates a project with a trimmed, non-empty name.
    pub fn create(
        &self,
        deadline: &Deadline,
        name: &str,
        description: Option<&str>,
    ) -> ServiceResult<Project> {
        let name = normalize_name(name).ok_or(ServiceError::InvalidProjectName)?;
        let project = NewProject {
            id: ProjectId::new(),
            name,
            description: description.map(str::to_string),
        };
        debug!(project_id = %project.id, name = %project.name, "creating project");
        Ok(self.repo.create_project(deadline, &project)?)
    }

    /// Renames a project and replaces its description.
    pub fn update(
        &self,
        deadline: &Deadline,
        id: ProjectId,
        name: &str,
        description: Option<&str>,
    ) -> ServiceResult<Project> {
        let name = normalize_name(name).ok_or(ServiceError::InvalidProjectName)?;
        Ok(self.repo.update_project(deadline, id, &name, description)?)
    }

    pub fn delete(&self, deadline: &Deadline, id: ProjectId) -> ServiceResult<()> {
        Ok(self.repo.delete_project(deadline, id)?)
    }

    pub fn get(&self, deadline: &Deadline, id: ProjectId) -> ServiceResult<Project> {
        Ok(self.repo.get_project(deadline, id)?)
    }

    pub fn list(&self, deadline: &Deadline) -> ServiceResult<Vec<Project>> {
        Ok(self.repo.list_projects(deadline)?)
    }
}
