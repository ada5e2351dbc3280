use std::io::{self, Write};
use std::path::Path;
use std::process::ExitCode;

use anyhow::{Context, Result};
use chrono::Utc;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use cw_cli::commands::{App, category, entries, health, project, timer};
use cw_cli::{CategoryAction, Cli, Commands, Config, ProjectAction, exit_code};

/// Load config and open database, ensuring the parent directory exists.
fn open_app(config_path: Option<&Path>) -> Result<(App, Config)> {
    let config = Config::load_from(config_path).context("failed to load configuration")?;
    tracing::debug!(?config, "loaded configuration");

    if let Some(parent) = config.database_path.parent() {
        std::fs::create_dir_all(parent).context("failed to create database directory")?;
    }

    let db = cw_db::Database::open(&config.database_path).with_context(|| {
        format!(
            "failed to open database {}",
            config.database_path.display()
        )
    })?;
    Ok((App::new(db, config.deadline()), config))
}

fn run(cli: &Cli, out: &mut impl Write) -> Result<()> {
    let Some(command) = &cli.command else {
        use clap::CommandFactory;
        Cli::command().print_help()?;
        println!();
        return Ok(());
    };

    let (app, config) = open_app(cli.config.as_deref())?;

    match command {
        Commands::Project(action) => match action {
            ProjectAction::Create {
                name,
                description,
                json,
            } => project::create(out, &app, name, description.as_deref(), *json)?,
            ProjectAction::List { json } => project::list(out, &app, *json)?,
            ProjectAction::Show { id, json } => project::show(out, &app, *id, *json)?,
            ProjectAction::Update {
                id,
                name,
                description,
            } => project::update(out, &app, *id, name, description.as_deref())?,
            ProjectAction::Delete { id } => project::delete(out, &app, *id)?,
        },
        Commands::Category(action) => match action {
            CategoryAction::Create {
                project,
                name,
                description,
                parent,
                json,
            } => category::create(
                out,
                &app,
                *project,
                name,
                description.as_deref(),
                *parent,
                *json,
            )?,
            CategoryAction::List { project, json } => {
                category::list(out, &app, *project, *json)?;
            }
            CategoryAction::Children { id, json } => category::children(out, &app, *id, *json)?,
            CategoryAction::Show { id, json } => category::show(out, &app, *id, *json)?,
            CategoryAction::Update {
                id,
                name,
                description,
                parent,
            } => category::update(out, &app, *id, name, description.as_deref(), *parent)?,
            CategoryAction::Delete { id } => category::delete(out, &app, *id)?,
        },
        Commands::Start { category, json } => timer::start(out, &app, *category, *json)?,
        Commands::Stop { json } => timer::stop(out, &app, *json)?,
        Commands::Status { json } => timer::status(out, &app, Utc::now(), *json)?,
        Commands::Entries {
            category,
            from,
            to,
            json,
        } => entries::run(
            out,
            &app,
            *category,
            from.as_deref(),
            to.as_deref(),
            Utc::now(),
            *json,
        )?,
        Commands::Health => health::run(out, &app, &config.database_path)?,
    }

    Ok(())
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::from_default_env()
    };
    // Use try_init to avoid panic if tracing is already initialized (e.g., in tests)
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .try_init();

    let stdout = io::stdout();
    let mut out = stdout.lock();
    match run(&cli, &mut out) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            tracing::debug!(error = ?err, "command failed");
            eprintln!("error: {err:#}");
            ExitCode::from(exit_code(&err))
        }
    }
}
