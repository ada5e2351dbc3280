//! `cw project` subcommands.

use std::io::Write;

use anyhow::{Context, Result};
use cw_core::{Project, ProjectId};

use super::App;
use super::util::{format_timestamp, write_json};

pub fn create<W: Write>(
    writer: &mut W,
    app: &App,
    name: &str,
    description: Option<&str>,
    json: bool,
) -> Result<()> {
    let project = app
        .projects
        .create(&app.deadline, name, description)
        .context("failed to create project")?;
    if json {
        return write_json(writer, &project);
    }
    writeln!(writer, "Created project {} ({})", project.name, project.id)?;
    Ok(())
}

pub fn list<W: Write>(writer: &mut W, app: &App, json: bool) -> Result<()> {
    let projects = app
        .projects
        .list(&app.deadline)
        .context("failed to list projects")?;
    if json {
        return write_json(writer, &projects);
    }
    format_projects(writer, &projects)?;
    Ok(())
}

pub fn show<W: Write>(writer: &mut W, app: &App, id: ProjectId, json: bool) -> Result<()> {
    let project = app
        .projects
        .get(&app.deadline, id)
        .with_context(|| format!("project {id}"))?;
    if json {
        return write_json(writer, &project);
    }
    format_project(writer, &project)?;
    Ok(())
}

pub fn update<W: Write>(
    writer: &mut W,
    app: &App,
    id: ProjectId,
    name: &str,
    description: Option<&str>,
) -> Result<()> {
    let project = app
        .projects
        .update(&app.deadline, id, name, description)
        .with_context(|| format!("failed to update project {id}"))?;
    writeln!(writer, "Updated project {} ({})", project.name, project.id)?;
    Ok(())
}

pub fn delete<W: Write>(writer: &mut W, app: &App, id: ProjectId) -> Result<()> {
    app.projects
        .delete(&app.deadline, id)
        .with_context(|| format!("failed to delete project {id}"))?;
    writeln!(writer, "Deleted project {id}")?;
    Ok(())
}

fn format_projects<W: Write>(writer: &mut W, projects: &[Project]) -> std::io::Result<()> {
    if projects.is_empty() {
        writeln!(writer, "No projects.")?;
        writeln!(writer)?;
        writeln!(writer, "Hint: Run 'cw project create <name>' to add one.")?;
        return Ok(());
    }

    writeln!(writer, "{:<36}  {:<24}  Description", "ID", "Name")?;
    for project in projects {
        let line = format!(
            "{:<36}  {:<24}  {}",
            project.id,
            project.name,
            project.description.as_deref().unwrap_or("")
        );
        writeln!(writer, "{}", line.trim_end())?;
    }
    Ok(())
}

fn format_project<W: Write>(writer: &mut W, project: &Project) -> std::io::Result<()> {
    writeln!(writer, "ID:          {}", project.id)?;
    writeln!(writer, "Name:        {}", project.name)?;
    if let Some(description) = &project.description {
        writeln!(writer, "Description: {description}")?;
    }
    writeln!(writer, "Created:     {}", format_timestamp(project.created_at))?;
    writeln!(writer, "Updated:     {}", format_timestamp(project.updated_at))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::test_support::{app, output};
    use chrono::{TimeZone, Utc};
    use insta::assert_snapshot;

    fn fixed_project(id: &str, name: &str, description: Option<&str>) -> Project {
        let at = Utc.with_ymd_and_hms(2025, 11, 2, 10, 0, 0).unwrap();
        Project {
            id: id.parse().unwrap(),
            name: name.to_string(),
            description: description.map(str::to_string),
            created_at: at,
            updated_at: at,
        }
    }

    #[test]
    fn project_table() {
        let projects = [
            fixed_project(
                "00000000-0000-4000-8000-000000000001",
                "Website",
                Some("Relaunch"),
            ),
            fixed_project("00000000-0000-4000-8000-000000000002", "Billing", None),
        ];
        let mut buf = Vec::new();
        format_projects(&mut buf, &projects).unwrap();
        assert_snapshot!(output(buf).trim_end(), @r"
        ID                                    Name                      Description
        00000000-0000-4000-8000-000000000001  Website                   Relaunch
        00000000-0000-4000-8000-000000000002  Billing
        ");
    }

    #[test]
    fn project_details() {
        let project = fixed_project(
            "00000000-0000-4000-8000-000000000001",
            "Website",
            Some("Relaunch"),
        );
        let mut buf = Vec::new();
        format_project(&mut buf, &project).unwrap();
        assert_snapshot!(output(buf), @r"
        ID:          00000000-0000-4000-8000-000000000001
        Name:        Website
        Description: Relaunch
        Created:     2025-11-02 10:00:00 UTC
        Updated:     2025-11-02 10:00:00 UTC
        ");
    }

    #[test]
    fn empty_list_shows_hint() {
        let app = app();
        let mut buf = Vec::new();
        list(&mut buf, &app, false).unwrap();
        assert!(output(buf).starts_with("No projects."));
    }

    #[test]
    fn create_then_show_as_json() {
        let app = app();
        let mut buf = Vec::new();
        create(&mut buf, &app, "  Website  ", None, true).unwrap();
        let created: Project = serde_json::from_slice(&buf).unwrap();
        assert_eq!(created.name, "Website");

        let mut buf = Vec::new();
        show(&mut buf, &app, created.id, true).unwrap();
        let shown: Project = serde_json::from_slice(&buf).unwrap();
        assert_eq!(shown, created);
    }

    #[test]
    fn blank_name_is_rejected() {
        let app = app();
        let err = create(&mut Vec::new(), &app, "   ", None, false).unwrap_err();
        assert_eq!(crate::exit_code(&err), 2);
    }
}
