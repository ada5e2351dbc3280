//! Concurrent timer operations against a file-backed database.
//!
//! Two `Database` handles opened on the same file stand in for two
//! processes; the in-process mutex cannot serialize them, so only the
//! `IMMEDIATE` transaction and the schema keep the active slot unique.

use std::sync::Arc;

use cw_core::{
    CategoryId, CategoryRepository, Deadline, NewCategory, NewProject, ProjectId,
    ProjectRepository, ServiceError, SystemClock, TimeEntryRepository, TimeTrackingService,
};
use cw_db::Database;
use rayon::prelude::*;

fn seed(db: &Database, count: usize) -> Vec<CategoryId> {
    let deadline = Deadline::none();
    let project = db
        .create_project(
            &deadline,
            &NewProject {
                id: ProjectId::new(),
                name: "Concurrency".to_string(),
                description: None,
            },
        )
        .unwrap();
    (0..count)
        .map(|i| {
            db.create_category(
                &deadline,
                &NewCategory {
                    id: CategoryId::new(),
                    project_id: project.id,
                    parent_category_id: None,
                    name: format!("c{i}"),
                    description: None,
                },
            )
            .unwrap()
            .id
        })
        .collect()
}

#[test]
fn at_most_one_active_entry_across_handles() {
    let temp = tempfile::tempdir().unwrap();
    let path = temp.path().join("clockwork.db");

    let first = Arc::new(Database::open(&path).unwrap());
    let second = Arc::new(Database::open(&path).unwrap());
    let categories = seed(&first, 4);

    let services = [
        TimeTrackingService::new(first.clone(), first.clone(), SystemClock),
        TimeTrackingService::new(second.clone(), second.clone(), SystemClock),
    ];

    (0..48usize).into_par_iter().for_each(|i| {
        let service = &services[i % services.len()];
        let deadline = Deadline::none();
        let result = if i % 5 == 4 {
            service.stop_active(&deadline).map(|_| ())
        } else {
            service
                .start(&deadline, categories[i % categories.len()])
                .map(|_| ())
        };
        match result {
            Ok(()) | Err(ServiceError::NoActiveTimer) => {}
            Err(err) => panic!("unexpected error: {err}"),
        }
    });

    let deadline = Deadline::none();
    let mut active = 0;
    for category in &categories {
        for entry in first.list_entries(&deadline, *category).unwrap() {
            assert_eq!(entry.stopped_at.is_some(), entry.duration_seconds.is_some());
            if entry.is_active() {
                active += 1;
            }
        }
    }
    assert!(active <= 1, "found {active} active entries");
    assert_eq!(
        second.find_active_entry(&deadline).unwrap().is_some(),
        active == 1
    );
}

#[test]
fn data_survives_reopen() {
    let temp = tempfile::tempdir().unwrap();
    let path = temp.path().join("clockwork.db");
    let deadline = Deadline::none();

    let category = {
        let db = Arc::new(Database::open(&path).unwrap());
        let category = seed(&db, 1)[0];
        let service = TimeTrackingService::new(db.clone(), db.clone(), SystemClock);
        service.start(&deadline, category).unwrap();
        category
    };

    let db = Database::open(&path).unwrap();
    let active = db.find_active_entry(&deadline).unwrap().unwrap();
    assert_eq!(active.category_id, category);
}
