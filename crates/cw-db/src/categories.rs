//! `CategoryRepository` over the `categories` table.

use cw_core::{
    Category, CategoryId, CategoryRepository, Deadline, NewCategory, ProjectId, RepoError,
    RepoResult,
};
use rusqlite::{Connection, Row, params};

use crate::{Database, column_id, column_opt_id, column_timestamp, now_timestamp, repo_err};

const CATEGORY_COLUMNS: &str =
    "id, project_id, parent_category_id, name, description, created_at, updated_at";

fn category_from_row(row: &Row<'_>) -> rusqlite::Result<Category> {
    Ok(Category {
        id: column_id(row, 0)?,
        project_id: column_id(row, 1)?,
        parent_category_id: column_opt_id(row, 2)?,
        name: row.get(3)?,
        description: row.get(4)?,
        created_at: column_timestamp(row, 5)?,
        updated_at: column_timestamp(row, 6)?,
    })
}

fn query_categories(conn: &Connection, filter: &str, key: String) -> RepoResult<Vec<Category>> {
    let mut stmt = conn
        .prepare(&format!(
            "SELECT {CATEGORY_COLUMNS} FROM categories
             WHERE {filter} = ?1
             ORDER BY created_at ASC, id ASC"
        ))
        .map_err(repo_err)?;
    let rows = stmt.query_map([key], category_from_row).map_err(repo_err)?;
    rows.collect::<rusqlite::Result<Vec<_>>>().map_err(repo_err)
}

impl CategoryRepository for Database {
    fn create_category(
        &self,
        deadline: &Deadline,
        category: &NewCategory,
    ) -> RepoResult<Category> {
        let conn = self.lock(deadline)?;
        conn.query_row(
            &format!(
                "INSERT INTO categories
                 (id, project_id, parent_category_id, name, description, created_at, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?6)
                 RETURNING {CATEGORY_COLUMNS}"
            ),
            params![
                category.id.to_string(),
                category.project_id.to_string(),
                category.parent_category_id.map(|id| id.to_string()),
                category.name,
                category.description,
                now_timestamp(),
            ],
            category_from_row,
        )
        .map_err(repo_err)
    }

    fn get_category(&self, deadline: &Deadline, id: CategoryId) -> RepoResult<Category> {
        let conn = self.lock(deadline)?;
        conn.query_row(
            &format!("SELECT {CATEGORY_COLUMNS} FROM categories WHERE id = ?1"),
            [id.to_string()],
            category_from_row,
        )
        .map_err(repo_err)
    }

    fn list_categories(
        &self,
        deadline: &Deadline,
        project_id: ProjectId,
    ) -> RepoResult<Vec<Category>> {
        let conn = self.lock(deadline)?;
        query_categories(&conn, "project_id", project_id.to_string())
    }

    fn list_child_categories(
        &self,
        deadline: &Deadline,
        parent_id: CategoryId,
    ) -> RepoResult<Vec<Category>> {
        let conn = self.lock(deadline)?;
        query_categories(&conn, "parent_category_id", parent_id.to_string())
    }

    fn update_category(
        &self,
        deadline: &Deadline,
        id: CategoryId,
        name: &str,
        description: Option<&str>,
        parent_category_id: Option<CategoryId>,
    ) -> RepoResult<Category> {
        let conn = self.lock(deadline)?;
        // project_id is never updated.
        conn.query_row(
            &format!(
                "UPDATE categories
                 SET name = ?2, description = ?3, parent_category_id = ?4, updated_at = ?5
                 WHERE id = ?1
                 RETURNING {CATEGORY_COLUMNS}"
            ),
            params![
                id.to_string(),
                name,
                description,
                parent_category_id.map(|id| id.to_string()),
                now_timestamp(),
            ],
            category_from_row,
        )
        .map_err(repo_err)
    }

    fn delete_category(&self, deadline: &Deadline, id: CategoryId) -> RepoResult<()> {
        let conn = self.lock(deadline)?;
        let deleted = conn
            .execute("DELETE FROM categories WHERE id = ?1", [id.to_string()])
            .map_err(repo_err)?;
        if deleted == 0 {
            return Err(RepoError::NotFound);
        }
        Ok(())
    }
}
