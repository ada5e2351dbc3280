//! CLI subcommand implementations.

pub mod category;
pub mod entries;
pub mod health;
pub mod project;
pub mod timer;
pub mod util;

use std::sync::Arc;

use cw_core::{CategoryService, Deadline, ProjectService, SystemClock, TimeTrackingService};
use cw_db::Database;

/// Services wired to one database, plus the deadline for this command.
pub struct App {
    pub db: Arc<Database>,
    pub projects: ProjectService<Arc<Database>>,
    pub categories: CategoryService<Arc<Database>>,
    pub timer: TimeTrackingService<Arc<Database>, Arc<Database>, SystemClock>,
    pub deadline: Deadline,
}

impl App {
    pub fn new(db: Database, deadline: Deadline) -> Self {
        let db = Arc::new(db);
        Self {
            projects: ProjectService::new(Arc::clone(&db)),
            categories: CategoryService::new(Arc::clone(&db)),
            timer: TimeTrackingService::new(Arc::clone(&db), Arc::clone(&db), SystemClock),
            db,
            deadline,
        }
    }
}
