//! Database health check.

use std::io::Write;
use std::path::Path;

use anyhow::{Context, Result};

use super::App;

pub fn run<W: Write>(writer: &mut W, app: &App, database_path: &Path) -> Result<()> {
    app.db.ping().context("database ping failed")?;
    let version = app
        .db
        .schema_version()
        .context("failed to read schema version")?;

    writeln!(writer, "Database: {}", database_path.display())?;
    writeln!(writer, "Schema version: {version}")?;
    writeln!(writer, "Status: ok")?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::test_support::{app, output};
    use insta::assert_snapshot;

    #[test]
    fn healthy_in_memory_database() {
        let app = app();
        let mut buf = Vec::new();
        run(&mut buf, &app, Path::new(":memory:")).unwrap();
        assert_snapshot!(output(buf), @r"
        Database: :memory:
        Schema version: 1
        Status: ok
        ");
    }
}
