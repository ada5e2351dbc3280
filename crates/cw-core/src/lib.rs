//! Core domain logic for the clockwork time tracker.
//!
//! This crate contains:
//! - The data model: projects, a category forest per project, time entries
//! - Repository traits the storage layer implements, plus an in-memory store
//! - Services enforcing the category tree invariants and the single active timer

mod clock;
mod deadline;
mod error;
pub mod memory;
mod model;
pub mod repository;
pub mod service;
mod types;

pub use clock::{Clock, ManualClock, SystemClock};
pub use deadline::{CancelToken, Deadline};
pub use error::{ErrorClass, RepoError, RepoResult, ServiceError, ServiceResult};
pub use model::{
    Category, NewCategory, NewProject, NewTimeEntry, Project, TimeEntry, elapsed_seconds,
};
pub use repository::{ActiveSlot, CategoryRepository, ProjectRepository, TimeEntryRepository};
pub use service::{CategoryService, ProjectService, TimeTrackingService};
pub use types::{CategoryId, ParseIdError, ProjectId, TimeEntryId, normalize_name};
