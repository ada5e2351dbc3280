//! Category CRUD enforcing the per-project tree invariants.

use std::collections::{HashSet, VecDeque};

use tracing::{debug, warn};

use crate::deadline::Deadline;
use crate::error::{RepoError, ServiceError, ServiceResult};
use crate::model::{Category, NewCategory};
use crate::repository::CategoryRepository;
use crate::types::{CategoryId, ProjectId};

/// Category CRUD with tree invariants.
///
/// # Invariants
/// - A parent always belongs to the same project as its child.
/// - A category is never its own ancestor.
pub struct CategoryService<R: CategoryRepository> {
    repo: R,
}

impl<R: CategoryRepository> CategoryService<R> {
    pub const fn new(repo: R) -> Self {
        Self { repo }
    }

    /// Creates a category, optionally under a parent of the same project.
    pub fn create(
        &self,
        deadline: &Deadline,
        project_id: ProjectId,
        name: &str,
        description: Option<&str>,
        parent_category_id: Option<CategoryId>,
    ) -> ServiceResult<Category> {
        if let Some(parent_id) = parent_category_id {
            let parent = self.load_parent(deadline, parent_id)?;
            if parent.project_id != project_id {
                return Err(ServiceError::CrossProjectParent);
            }
        }

        let category = NewCategory {
            id: CategoryId::new(),
            project_id,
            parent_category_id,
            name: name.to_string(),
            description: description.map(str::to_string),
        };
        Ok(self.repo.create_category(deadline, &category)?)
    }

    /// Updates name, description and parent.
    ///
    /// Rejects a parent from another project, the category itself, or any of
    /// its descendants.
    pub fn update(
        &self,
        deadline: &Deadline,
        id: CategoryId,
        name: &str,
        description: Option<&str>,
        parent_category_id: Option<CategoryId>,
    ) -> ServiceResult<Category> {
        let current = self.repo.get_category(deadline, id)?;

        if let Some(parent_id) = parent_category_id {
            let parent = self.load_parent(deadline, parent_id)?;
            if parent.project_id != current.project_id {
                return Err(ServiceError::CrossProjectParent);
            }
            if parent_id == id || self.is_descendant(deadline, id, parent_id)? {
                return Err(ServiceError::CategoryCycle {
                    category_id: id,
                    parent_id,
                });
            }
        }

        Ok(self
            .repo
            .update_category(deadline, id, name, description, parent_category_id)?)
    }

    pub fn delete(&self, deadline: &Deadline, id: CategoryId) -> ServiceResult<()> {
        Ok(self.repo.delete_category(deadline, id)?)
    }

    pub fn get(&self, deadline: &Deadline, id: CategoryId) -> ServiceResult<Category> {
        Ok(self.repo.get_category(deadline, id)?)
    }

    pub fn list_by_project(
        &self,
        deadline: &Deadline,
        project_id: ProjectId,
    ) -> ServiceResult<Vec<Category>> {
        Ok(self.repo.list_categories(deadline, project_id)?)
    }

    pub fn list_children(
        &self,
        deadline: &Deadline,
        parent_id: CategoryId,
    ) -> ServiceResult<Vec<Category>> {
        Ok(self.repo.list_child_categories(deadline, parent_id)?)
    }

    fn load_parent(&self, deadline: &Deadline, parent_id: CategoryId) -> ServiceResult<Category> {
        match self.repo.get_category(deadline, parent_id) {
            Ok(parent) => Ok(parent),
            Err(RepoError::NotFound) => Err(ServiceError::InvalidParent),
            Err(err) => Err(err.into()),
        }
    }

    /// Breadth-first search below `root` for `candidate`.
    ///
    /// Each node is expanded at most once, so a corrupted (cyclic) graph
    /// still terminates.
    fn is_descendant(
        &self,
        deadline: &Deadline,
        root: CategoryId,
        candidate: CategoryId,
    ) -> ServiceResult<bool> {
        let mut visited = HashSet::new();
        let mut queue = VecDeque::from([root]);

        while let Some(current) = queue.pop_front() {
            if !visited.insert(current) {
                warn!(category_id = %current, "category reached twice during descendant scan");
                continue;
            }
            for child in self.repo.list_child_categories(deadline, current)? {
                if child.id == candidate {
                    debug!(visited = visited.len(), "descendant found");
                    return Ok(true);
                }
                queue.push_back(child.id);
            }
        }

        debug!(visited = visited.len(), "descendant scan finished");
        Ok(false)
    }
}
