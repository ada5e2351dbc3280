//! Command-line argument definitions.

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use cw_core::{CategoryId, ProjectId};

/// Project and category time tracker.
///
/// Organizes work into projects with nested categories and runs a single
/// global timer against one category at a time.
#[derive(Debug, Parser)]
#[command(name = "cw", version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose output.
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Path to config file.
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Available subcommands.
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Manage projects.
    #[command(subcommand)]
    Project(ProjectAction),

    /// Manage categories within a project.
    #[command(subcommand)]
    Category(CategoryAction),

    /// Start the timer on a category, stopping any running timer first.
    Start {
        /// Category to track time against.
        category: CategoryId,

        /// Output as JSON.
        #[arg(long)]
        json: bool,
    },

    /// Stop the running timer.
    Stop {
        /// Output as JSON.
        #[arg(long)]
        json: bool,
    },

    /// Show the running timer.
    Status {
        /// Output as JSON.
        #[arg(long)]
        json: bool,
    },

    /// List time entries of a category, newest first.
    Entries {
        /// Category whose entries to list.
        category: CategoryId,

        /// Earliest start time (ISO 8601 or relative, e.g. "2 hours ago").
        #[arg(long)]
        from: Option<String>,

        /// Latest start time (ISO 8601 or relative, e.g. "30 minutes ago").
        #[arg(long)]
        to: Option<String>,

        /// Output as JSON.
        #[arg(long)]
        json: bool,
    },

    /// Check that the database is reachable.
    Health,
}

#[derive(Debug, Subcommand)]
pub enum ProjectAction {
    /// Create a project.
    Create {
        name: String,

        #[arg(long)]
        description: Option<String>,

        /// Output as JSON.
        #[arg(long)]
        json: bool,
    },

    /// List all projects, oldest first.
    List {
        /// Output as JSON.
        #[arg(long)]
        json: bool,
    },

    /// Show one project.
    Show {
        id: ProjectId,

        /// Output as JSON.
        #[arg(long)]
        json: bool,
    },

    /// Rename a project and replace its description.
    Update {
        id: ProjectId,

        name: String,

        #[arg(long)]
        description: Option<String>,
    },

    /// Delete a project with its categories and time entries.
    Delete { id: ProjectId },
}

#[derive(Debug, Subcommand)]
pub enum CategoryAction {
    /// Create a category in a project.
    Create {
        project: ProjectId,

        name: String,

        #[arg(long)]
        description: Option<String>,

        /// Parent category (must belong to the same project).
        #[arg(long)]
        parent: Option<CategoryId>,

        /// Output as JSON.
        #[arg(long)]
        json: bool,
    },

    /// List the categories of a project as a tree.
    List {
        project: ProjectId,

        /// Output as JSON.
        #[arg(long)]
        json: bool,
    },

    /// List the direct children of a category.
    Children {
        id: CategoryId,

        /// Output as JSON.
        #[arg(long)]
        json: bool,
    },

    /// Show one category.
    Show {
        id: CategoryId,

        /// Output as JSON.
        #[arg(long)]
        json: bool,
    },

    /// Rename, describe or move a category.
    ///
    /// Omitting --parent makes the category a root.
    Update {
        id: CategoryId,

        name: String,

        #[arg(long)]
        description: Option<String>,

        #[arg(long)]
        parent: Option<CategoryId>,
    },

    /// Delete a category; its children become roots.
    Delete { id: CategoryId },
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn command_tree_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parses_category_create_with_parent() {
        let parent = "6f9619ff-8b86-d011-b42d-00c04fc964ff";
        let cli = Cli::try_parse_from([
            "cw",
            "category",
            "create",
            "0e5f7c2a-1b3d-4e6f-8a9b-0c1d2e3f4a5b",
            "Backend",
            "--parent",
            parent,
        ])
        .unwrap();
        let Some(Commands::Category(CategoryAction::Create {
            name, parent: got, ..
        })) = &cli.command
        else {
            panic!("unexpected command: {:?}", cli.command);
        };
        assert_eq!(name, "Backend");
        assert_eq!(*got, Some(parent.parse().unwrap()));
    }

    #[test]
    fn rejects_malformed_ids() {
        let err = Cli::try_parse_from(["cw", "start", "not-a-uuid"]).unwrap_err();
        assert_eq!(err.kind(), clap::error::ErrorKind::ValueValidation);
    }
}
