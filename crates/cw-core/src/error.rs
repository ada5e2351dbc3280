//! Two-tier error taxonomy: storage errors and semantic service errors.

use thiserror::Error;

use crate::types::CategoryId;

/// Errors surfaced by repository implementations.
#[derive(Debug, Error)]
pub enum RepoError {
    /// The addressed row does not exist.
    #[error("not found")]
    NotFound,
    /// A uniqueness constraint was violated.
    #[error("duplicate")]
    Duplicate,
    /// A referenced row does not exist.
    #[error("foreign key violation")]
    ForeignKeyViolation,
    /// The caller's deadline passed or the request was cancelled.
    #[error("deadline exceeded or request cancelled")]
    Cancelled,
    /// Any other storage failure.
    #[error("storage error: {0}")]
    Storage(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl RepoError {
    /// Wraps an arbitrary storage failure.
    pub fn storage(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::Storage(Box::new(err))
    }
}

/// Result type used by repository operations.
pub type RepoResult<T> = Result<T, RepoError>;

/// Errors returned by the services.
#[derive(Debug, Error)]
pub enum ServiceError {
    /// Project name is blank after trimming.
    #[error("project name cannot be empty")]
    InvalidProjectName,
    /// The referenced parent category does not exist.
    #[error("invalid parent category")]
    InvalidParent,
    /// The parent category belongs to a different project.
    #[error("parent category belongs to a different project")]
    CrossProjectParent,
    /// The requested parent would make the category its own ancestor.
    #[error("category cycle detected: {category_id} cannot be placed under {parent_id}")]
    CategoryCycle {
        category_id: CategoryId,
        parent_id: CategoryId,
    },
    /// `stop` was called while idle.
    #[error("no active timer")]
    NoActiveTimer,
    /// Storage failure, passed through unchanged.
    #[error(transparent)]
    Repo(#[from] RepoError),
}

/// Result type used by service operations.
pub type ServiceResult<T> = Result<T, ServiceError>;

/// How a boundary layer should report an error to its caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorClass {
    BadRequest,
    Conflict,
    NotFound,
    Internal,
}

impl ServiceError {
    /// Classifies the error for the caller-facing boundary.
    pub const fn class(&self) -> ErrorClass {
        match self {
            Self::InvalidProjectName | Self::InvalidParent | Self::CrossProjectParent => {
                ErrorClass::BadRequest
            }
            Self::CategoryCycle { .. } | Self::NoActiveTimer => ErrorClass::Conflict,
            Self::Repo(RepoError::NotFound) => ErrorClass::NotFound,
            Self::Repo(_) => ErrorClass::Internal,
        }
    }

    /// Whether this is a storage-level `NotFound`.
    pub const fn is_not_found(&self) -> bool {
        matches!(self, Self::Repo(RepoError::NotFound))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classes_follow_boundary_mapping() {
        assert_eq!(ServiceError::InvalidProjectName.class(), ErrorClass::BadRequest);
        assert_eq!(ServiceError::InvalidParent.class(), ErrorClass::BadRequest);
        assert_eq!(ServiceError::CrossProjectParent.class(), ErrorClass::BadRequest);
        let cycle = ServiceError::CategoryCycle {
            category_id: CategoryId::new(),
            parent_id: CategoryId::new(),
        };
        assert_eq!(cycle.class(), ErrorClass::Conflict);
        assert_eq!(ServiceError::NoActiveTimer.class(), ErrorClass::Conflict);
        assert_eq!(
            ServiceError::from(RepoError::NotFound).class(),
            ErrorClass::NotFound
        );
        assert_eq!(
            ServiceError::from(RepoError::Duplicate).class(),
            ErrorClass::Internal
        );
        assert_eq!(
            ServiceError::from(RepoError::Cancelled).class(),
            ErrorClass::Internal
        );
    }

    #[test]
    fn repo_errors_display_transparently() {
        let err = ServiceError::from(RepoError::ForeignKeyViolation);
        assert_eq!(err.to_string(), "foreign key violation");
        assert!(!err.is_not_found());
        assert!(ServiceError::from(RepoError::NotFound).is_not_found());
    }
}
