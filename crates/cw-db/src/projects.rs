//! `ProjectRepository` over the `projects` table.

use cw_core::{Deadline, NewProject, Project, ProjectId, ProjectRepository, RepoError, RepoResult};
use rusqlite::{Row, params};

use crate::{Database, column_id, column_timestamp, now_timestamp, repo_err};

const PROJECT_COLUMNS: &str = "id, name, description, created_at, updated_at";

fn project_from_row(row: &Row<'_>) -> rusqlite::Result<Project> {
    Ok(Project {
        id: column_id(row, 0)?,
        name: row.get(1)?,
        description: row.get(2)?,
        created_at: column_timestamp(row, 3)?,
        updated_at: column_timestamp(row, 4)?,
    })
}

impl ProjectRepository for Database {
    fn create_project(&self, deadline: &Deadline, project: &NewProject) -> RepoResult<Project> {
        let conn = self.lock(deadline)?;
        let now = now_timestamp();
        conn.query_row(
            &format!(
                "INSERT INTO projects (id, name, description, created_at, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?4)
                 RETURNING {PROJECT_COLUMNS}"
            ),
            params![
                project.id.to_string(),
                project.name,
                project.description,
                now
            ],
            project_from_row,
        )
        .map_err(repo_err)
    }

    fn get_project(&self, deadline: &Deadline, id: ProjectId) -> RepoResult<Project> {
        let conn = self.lock(deadline)?;
        conn.query_row(
            &format!("SELECT {PROJECT_COLUMNS} FROM projects WHERE id = ?1"),
            [id.to_string()],
            project_from_row,
        )
        .map_err(repo_err)
    }

    fn list_projects(&self, deadline: &Deadline) -> RepoResult<Vec<Project>> {
        let conn = self.lock(deadline)?;
        let mut stmt = conn
            .prepare(&format!(
                "SELECT {PROJECT_COLUMNS} FROM projects ORDER BY created_at ASC, id ASC"
            ))
            .map_err(repo_err)?;
        let rows = stmt.query_map([], project_from_row).map_err(repo_err)?;
        rows.collect::<rusqlite::Result<Vec<_>>>().map_err(repo_err)
    }

    fn update_project(
        &self,
        deadline: &Deadline,
        id: ProjectId,
        name: &str,
        description: Option<&str>,
    ) -> RepoResult<Project> {
        let conn = self.lock(deadline)?;
        conn.query_row(
            &format!(
                "UPDATE projects SET name = ?2, description = ?3, updated_at = ?4
                 WHERE id = ?1
                 RETURNING {PROJECT_COLUMNS}"
            ),
            params![id.to_string(), name, description, now_timestamp()],
            project_from_row,
        )
        .map_err(repo_err)
    }

    fn delete_project(&self, deadline: &Deadline, id: ProjectId) -> RepoResult<()> {
        let conn = self.lock(deadline)?;
        let deleted = conn
            .execute("DELETE FROM projects WHERE id = ?1", [id.to_string()])
            .map_err(repo_err)?;
        if deleted == 0 {
            return Err(RepoError::NotFound);
        }
        Ok(())
    }
}
