//! `cw entries`: time entries of one category.

use std::io::Write;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use cw_core::{CategoryId, TimeEntry};

use super::App;
use super::util::{format_duration, format_timestamp, parse_datetime, write_json};
use crate::InvalidInput;

/// Resolves `--from`/`--to` into an inclusive window.
///
/// Neither bound means no filter. A missing lower bound is the epoch and a
/// missing upper bound is `now`.
fn resolve_range(
    from: Option<&str>,
    to: Option<&str>,
    now: DateTime<Utc>,
) -> Result<Option<(DateTime<Utc>, DateTime<Utc>)>, InvalidInput> {
    if from.is_none() && to.is_none() {
        return Ok(None);
    }
    let start = from
        .map(|s| parse_datetime(s, now))
        .transpose()?
        .unwrap_or(DateTime::UNIX_EPOCH);
    let end = to.map(|s| parse_datetime(s, now)).transpose()?.unwrap_or(now);
    if start > end {
        return Err(InvalidInput(format!(
            "--from ({}) is after --to ({})",
            format_timestamp(start),
            format_timestamp(end)
        )));
    }
    Ok(Some((start, end)))
}

pub fn run<W: Write>(
    writer: &mut W,
    app: &App,
    category_id: CategoryId,
    from: Option<&str>,
    to: Option<&str>,
    now: DateTime<Utc>,
    json: bool,
) -> Result<()> {
    let range = resolve_range(from, to, now)?;
    let entries = match range {
        Some((start, end)) => {
            app.timer
                .list_by_category_in_range(&app.deadline, category_id, start, end)
        }
        None => app.timer.list_by_category(&app.deadline, category_id),
    }
    .with_context(|| format!("failed to list entries of category {category_id}"))?;

    if json {
        return write_json(writer, &entries);
    }
    format_entries(writer, &entries, now)?;
    Ok(())
}

fn format_entries<W: Write>(
    writer: &mut W,
    entries: &[TimeEntry],
    now: DateTime<Utc>,
) -> std::io::Result<()> {
    if entries.is_empty() {
        writeln!(writer, "No time entries.")?;
        return Ok(());
    }

    writeln!(writer, "{:<23}  {:<23}  {:>8}", "Started", "Stopped", "Duration")?;
    let mut total = 0;
    for entry in entries {
        let elapsed = entry.elapsed_seconds(now);
        total += elapsed;
        let stopped = entry
            .stopped_at
            .map_or_else(|| "(running)".to_string(), format_timestamp);
        writeln!(
            writer,
            "{:<23}  {:<23}  {:>8}",
            format_timestamp(entry.started_at),
            stopped,
            format_duration(elapsed)
        )?;
    }
    writeln!(writer)?;
    writeln!(
        writer,
        "{} entries, {} total",
        entries.len(),
        format_duration(total)
    )?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use insta::assert_snapshot;

    use crate::commands::test_support::output;

    fn at(hour: u32, minute: u32, second: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 11, 2, hour, minute, second)
            .unwrap()
    }

    fn entry(started: DateTime<Utc>, stopped: Option<DateTime<Utc>>) -> TimeEntry {
        TimeEntry {
            id: cw_core::TimeEntryId::new(),
            category_id: "00000000-0000-4000-8000-0000000000c1".parse().unwrap(),
            started_at: started,
            stopped_at: stopped,
            duration_seconds: stopped.map(|s| (s - started).num_seconds()),
            created_at: started,
            updated_at: started,
        }
    }

    #[test]
    fn entry_table() {
        let entries = [
            entry(at(10, 5, 0), None),
            entry(at(10, 0, 0), Some(at(10, 5, 0))),
            entry(at(8, 0, 0), Some(at(9, 30, 45))),
        ];
        let mut buf = Vec::new();
        format_entries(&mut buf, &entries, at(10, 7, 30)).unwrap();
        assert_snapshot!(output(buf), @r"
        Started                  Stopped                  Duration
        2025-11-02 10:05:00 UTC  (running)                  2m 30s
        2025-11-02 10:00:00 UTC  2025-11-02 10:05:00 UTC    5m 00s
        2025-11-02 08:00:00 UTC  2025-11-02 09:30:45 UTC    1h 30m

        3 entries, 1h 38m total
        ");
    }

    #[test]
    fn one_sided_ranges_default_to_epoch_and_now() {
        let now = at(12, 0, 0);
        let (start, end) = resolve_range(Some("2 hours ago"), None, now)
            .unwrap()
            .unwrap();
        assert_eq!((start, end), (at(10, 0, 0), now));

        let (start, end) = resolve_range(None, Some("2025-11-02T11:00:00Z"), now)
            .unwrap()
            .unwrap();
        assert_eq!((start, end), (DateTime::UNIX_EPOCH, at(11, 0, 0)));

        assert!(resolve_range(None, None, now).unwrap().is_none());
    }

    #[test]
    fn inverted_range_is_rejected() {
        let err = resolve_range(Some("1 hour ago"), Some("2 hours ago"), at(12, 0, 0));
        assert!(err.is_err());
    }

    #[test]
    fn inverted_range_never_reaches_the_service() {
        let app = crate::commands::test_support::app();
        // Listing an unknown category succeeds with no rows, so only the range
        // check can fail here.
        let err = run(
            &mut Vec::new(),
            &app,
            cw_core::CategoryId::new(),
            Some("1 hour ago"),
            Some("2 hours ago"),
            at(12, 0, 0),
            false,
        )
        .unwrap_err();
        assert_eq!(crate::exit_code(&err), 2);
    }
}
