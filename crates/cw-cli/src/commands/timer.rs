//! `cw start`, `cw stop` and `cw status`.

use std::io::Write;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use cw_core::{CategoryId, TimeEntry};
use serde::Serialize;

use super::App;
use super::util::{format_duration, format_timestamp, write_json};

/// JSON shape of `cw status --json`.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct StatusReport<'a> {
    active: Option<&'a TimeEntry>,
    elapsed_seconds: Option<i64>,
}

pub fn start<W: Write>(writer: &mut W, app: &App, category_id: CategoryId, json: bool) -> Result<()> {
    let entry = app
        .timer
        .start(&app.deadline, category_id)
        .with_context(|| format!("failed to start timer on category {category_id}"))?;
    if json {
        return write_json(writer, &entry);
    }
    writeln!(
        writer,
        "Started timer on category {} at {} (entry {})",
        entry.category_id,
        format_timestamp(entry.started_at),
        entry.id
    )?;
    Ok(())
}

pub fn stop<W: Write>(writer: &mut W, app: &App, json: bool) -> Result<()> {
    let entry = app
        .timer
        .stop_active(&app.deadline)
        .context("failed to stop timer")?;
    if json {
        return write_json(writer, &entry);
    }
    writeln!(
        writer,
        "Stopped timer on category {} after {}",
        entry.category_id,
        format_duration(entry.duration_seconds.unwrap_or_default())
    )?;
    Ok(())
}

pub fn status<W: Write>(writer: &mut W, app: &App, now: DateTime<Utc>, json: bool) -> Result<()> {
    let active = app
        .timer
        .active(&app.deadline)
        .context("failed to read timer status")?;
    if json {
        return write_json(
            writer,
            &StatusReport {
                active: active.as_ref(),
                elapsed_seconds: active.as_ref().map(|entry| entry.elapsed_seconds(now)),
            },
        );
    }
    format_status(writer, active.as_ref(), now)?;
    Ok(())
}

fn format_status<W: Write>(
    writer: &mut W,
    active: Option<&TimeEntry>,
    now: DateTime<Utc>,
) -> std::io::Result<()> {
    let Some(entry) = active else {
        writeln!(writer, "No timer running.")?;
        writeln!(writer)?;
        writeln!(writer, "Hint: Run 'cw start <category-id>' to start one.")?;
        return Ok(());
    };
    writeln!(writer, "Timer running")?;
    writeln!(writer, "Category: {}", entry.category_id)?;
    writeln!(writer, "Entry:    {}", entry.id)?;
    writeln!(writer, "Since:    {}", format_timestamp(entry.started_at))?;
    writeln!(
        writer,
        "Elapsed:  {}",
        format_duration(entry.elapsed_seconds(now))
    )?;
    Ok(())
}
