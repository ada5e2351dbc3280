//! Use-case services over the repository traits.
//!
//! Services hold no mutable state of their own and may be shared across
//! threads; every call forwards the caller's [`Deadline`](crate::Deadline)
//! unchanged.

mod category;
mod project;
mod time;

pub use category::CategoryService;
pub use project::ProjectService;
pub use time::TimeTrackingService;
