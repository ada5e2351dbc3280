//! `cw category` subcommands.
//!
//! `list` renders a project's categories as an indented tree; every other
//! listing is flat.

use std::collections::{HashMap, HashSet};
use std::io::Write;

use anyhow::{Context, Result};
use cw_core::{Category, CategoryId, ProjectId};

use super::App;
use super::util::{format_timestamp, write_json};

pub fn create<W: Write>(
    writer: &mut W,
    app: &App,
    project_id: ProjectId,
    name: &str,
    description: Option<&str>,
    parent: Option<CategoryId>,
    json: bool,
) -> Result<()> {
    let category = app
        .categories
        .create(&app.deadline, project_id, name, description, parent)
        .context("failed to create category")?;
    if json {
        return write_json(writer, &category);
    }
    writeln!(writer, "Created category {} ({})", category.name, category.id)?;
    Ok(())
}

pub fn list<W: Write>(writer: &mut W, app: &App, project_id: ProjectId, json: bool) -> Result<()> {
    let categories = app
        .categories
        .list_by_project(&app.deadline, project_id)
        .with_context(|| format!("failed to list categories of project {project_id}"))?;
    if json {
        return write_json(writer, &categories);
    }
    if categories.is_empty() {
        writeln!(writer, "No categories.")?;
        return Ok(());
    }
    format_tree(writer, &categories)?;
    Ok(())
}

pub fn children<W: Write>(writer: &mut W, app: &App, id: CategoryId, json: bool) -> Result<()> {
    let children = app
        .categories
        .list_children(&app.deadline, id)
        .with_context(|| format!("failed to list children of category {id}"))?;
    if json {
        return write_json(writer, &children);
    }
    if children.is_empty() {
        writeln!(writer, "No child categories.")?;
        return Ok(());
    }
    for child in &children {
        writeln!(writer, "{} [{}]", child.name, child.id)?;
    }
    Ok(())
}

pub fn show<W: Write>(writer: &mut W, app: &App, id: CategoryId, json: bool) -> Result<()> {
    let category = app
        .categories
        .get(&app.deadline, id)
        .with_context(|| format!("category {id}"))?;
    if json {
        return write_json(writer, &category);
    }
    format_category(writer, &category)?;
    Ok(())
}

pub fn update<W: Write>(
    writer: &mut W,
    app: &App,
    id: CategoryId,
    name: &str,
    description: Option<&str>,
    parent: Option<CategoryId>,
) -> Result<()> {
    let category = app
        .categories
        .update(&app.deadline, id, name, description, parent)
        .with_context(|| format!("failed to update category {id}"))?;
    writeln!(writer, "Updated category {} ({})", category.name, category.id)?;
    Ok(())
}

pub fn delete<W: Write>(writer: &mut W, app: &App, id: CategoryId) -> Result<()> {
    app.categories
        .delete(&app.deadline, id)
        .with_context(|| format!("failed to delete category {id}"))?;
    writeln!(writer, "Deleted category {id}")?;
    Ok(())
}

/// Writes `categories` as a forest, children indented under their parent.
///
/// Input order is kept among siblings. A category whose parent is not in
/// the slice is printed as a root.
fn format_tree<W: Write>(writer: &mut W, categories: &[Category]) -> std::io::Result<()> {
    let present: HashSet<CategoryId> = categories.iter().map(|c| c.id).collect();
    let mut children: HashMap<CategoryId, Vec<&Category>> = HashMap::new();
    let mut roots = Vec::new();

    for category in categories {
        match category.parent_category_id {
            Some(parent) if present.contains(&parent) => {
                children.entry(parent).or_default().push(category);
            }
            _ => roots.push(category),
        }
    }

    let mut seen = HashSet::new();
    let mut stack: Vec<(&Category, usize)> = roots.into_iter().rev().map(|c| (c, 0)).collect();
    while let Some((category, depth)) = stack.pop() {
        if !seen.insert(category.id) {
            continue;
        }
        writeln!(
            writer,
            "{:indent$}{} [{}]",
            "",
            category.name,
            category.id,
            indent = depth * 2
        )?;
        if let Some(kids) = children.get(&category.id) {
            stack.extend(kids.iter().rev().map(|kid| (*kid, depth + 1)));
        }
    }
    Ok(())
}

fn format_category<W: Write>(writer: &mut W, category: &Category) -> std::io::Result<()> {
    writeln!(writer, "ID:          {}", category.id)?;
    writeln!(writer, "Name:        {}", category.name)?;
    writeln!(writer, "Project:     {}", category.project_id)?;
    if let Some(parent) = category.parent_category_id {
        writeln!(writer, "Parent:      {parent}")?;
    }
    if let Some(description) = &category.description {
        writeln!(writer, "Description: {description}")?;
    }
    writeln!(writer, "Created:     {}", format_timestamp(category.created_at))?;
    writeln!(writer, "Updated:     {}", format_timestamp(category.updated_at))?;
    Ok(())
}
