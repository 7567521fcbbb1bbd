//! Command-line interface for taskboard
//!
//! This module defines the CLI structure using clap derive macros.
//! Each group of subcommands is implemented in its own submodule.

use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use tracing::debug;

use crate::config::Config;
use crate::error::{Error, Result};
use crate::fixtures::Seed;
use crate::model::Session;
use crate::output::OutputOptions;
use crate::store::Store;

mod board;
mod edit;
mod items;

/// taskboard - Role-aware task and bug tracking board
///
/// Seeds a board and shows the dashboard, task and bug tables, activity
/// charts and time reports as seen by one user. Write commands save the
/// board back to its seed file.
#[derive(Parser, Debug)]
#[command(name = "taskboard")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Directory holding .taskboard.toml (defaults to current directory)
    #[arg(long, global = true, env = "TASKBOARD_DIR")]
    pub dir: Option<PathBuf>,

    /// JSON seed file (overrides the configured seed)
    #[arg(long, global = true, env = "TASKBOARD_SEED")]
    pub seed: Option<PathBuf>,

    /// User id to act as (overrides config and the seed's current user)
    #[arg(long, global = true, env = "TASKBOARD_USER")]
    pub user: Option<String>,

    /// Output in JSON format
    #[arg(long, global = true)]
    pub json: bool,

    /// Suppress non-essential output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    #[command(subcommand)]
    pub command: Commands,
}

/// Available subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Overview of visible work with a preview of tasks and bugs
    Dashboard {
        /// Preview cards per collection (defaults to board.preview_limit)
        #[arg(long)]
        limit: Option<usize>,
    },

    /// List visible tasks
    Tasks(FilterArgs),

    /// List visible bugs
    Bugs(FilterArgs),

    /// Show one task or bug with its update trail
    Show {
        /// Task or bug id
        id: String,
    },

    /// Per-day chart series
    Series {
        /// Which series: activity (update log) or completions (closed items)
        #[arg(long, default_value = "activity")]
        source: String,

        /// Bucket by: type, status, priority (defaults to board.dimension)
        #[arg(long)]
        dimension: Option<String>,
    },

    /// Minutes logged per user and task
    TimeSpent {
        /// Case-insensitive filter on user names
        #[arg(long)]
        search: Option<String>,

        /// Sort order: name, total
        #[arg(long, default_value = "total")]
        sort: String,
    },

    /// Items completed today, this week and this month, per user
    Periods,

    /// Create .taskboard.toml and a writable seed file
    Init,

    /// Add a task, assigned to the acting user unless --assignee is given
    AddTask {
        /// Task title
        title: String,

        #[command(flatten)]
        fields: ItemArgs,
    },

    /// Add a bug, assigned to the acting user unless --assignee is given
    AddBug {
        /// Bug title
        title: String,

        #[command(flatten)]
        fields: ItemArgs,

        #[command(flatten)]
        bug: BugArgs,
    },

    /// Change fields of a task or bug
    Edit {
        /// Task or bug id
        id: String,

        /// New title
        #[arg(long)]
        title: Option<String>,

        #[command(flatten)]
        fields: ItemArgs,

        #[command(flatten)]
        bug: BugArgs,
    },

    /// Delete a task or bug
    Delete {
        /// Task or bug id
        id: String,
    },

    /// Start or stop the timer on a task or bug
    #[command(subcommand)]
    Track(TrackCommands),

    /// Add an update to a task or bug
    Note {
        /// Task or bug id
        id: String,

        /// Update text
        message: String,

        /// Append to the item's own notes instead of the update log
        #[arg(long)]
        inline: bool,
    },
}

#[derive(Subcommand, Debug)]
pub enum TrackCommands {
    /// Start the timer
    Start {
        /// Task or bug id
        id: String,
    },

    /// Stop the timer and add the elapsed minutes
    Stop {
        /// Task or bug id
        id: String,
    },
}

/// Table filters shared by `tasks` and `bugs`
#[derive(clap::Args, Debug, Clone, Default)]
pub struct FilterArgs {
    /// Status: open, in_progress, closed, pending_approval
    #[arg(long)]
    pub status: Option<String>,

    /// Priority: low, medium, high
    #[arg(long)]
    pub priority: Option<String>,

    /// Assignee user id (managers only)
    #[arg(long)]
    pub assignee: Option<String>,
}

/// Fields shared by `add-task`, `add-bug` and `edit`
#[derive(clap::Args, Debug, Clone, Default)]
pub struct ItemArgs {
    /// Description text
    #[arg(long)]
    pub description: Option<String>,

    /// Priority: low, medium, high
    #[arg(long)]
    pub priority: Option<String>,

    /// Status: open, in_progress, closed, pending_approval
    #[arg(long)]
    pub status: Option<String>,

    /// Assignee user id
    #[arg(long)]
    pub assignee: Option<String>,

    /// Start date (YYYY-MM-DD); empty clears it
    #[arg(long)]
    pub start_date: Option<String>,

    /// End date (YYYY-MM-DD); empty clears it
    #[arg(long)]
    pub end_date: Option<String>,
}

/// Bug-only fields
#[derive(clap::Args, Debug, Clone, Default)]
pub struct BugArgs {
    /// Severity: low, medium, high, critical
    #[arg(long)]
    pub severity: Option<String>,

    /// Impact: low, medium, high, critical
    #[arg(long)]
    pub impact: Option<String>,

    /// Steps to reproduce
    #[arg(long)]
    pub steps: Option<String>,

    /// Environment the bug shows up in
    #[arg(long)]
    pub environment: Option<String>,
}

impl Cli {
    /// Execute the CLI command
    pub fn run(self) -> Result<()> {
        let output = OutputOptions {
            json: self.json,
            quiet: self.quiet,
        };
        if let Commands::Init = self.command {
            return edit::init(&board_dir(self.dir.as_deref()), self.seed.as_deref(), output);
        }
        let mut board = Board::open(
            self.dir.as_deref(),
            self.seed.as_deref(),
            self.user.as_deref(),
        )?;

        match self.command {
            Commands::Dashboard { limit } => board::dashboard(&board, limit, output),
            Commands::Tasks(filter) => items::list_tasks(&board, &filter, output),
            Commands::Bugs(filter) => items::list_bugs(&board, &filter, output),
            Commands::Show { id } => items::show(&board, &id, output),
            Commands::Series { source, dimension } => {
                board::series(&board, &source, dimension.as_deref(), output)
            }
            Commands::TimeSpent { search, sort } => {
                board::time_spent(&board, search.as_deref(), &sort, output)
            }
            Commands::Periods => board::periods(&board, output),
            Commands::Init => Ok(()),
            Commands::AddTask { title, fields } => {
                edit::add_task(&mut board, &title, &fields, output)
            }
            Commands::AddBug { title, fields, bug } => {
                edit::add_bug(&mut board, &title, &fields, &bug, output)
            }
            Commands::Edit {
                id,
                title,
                fields,
                bug,
            } => edit::edit(&mut board, &id, title.as_deref(), &fields, &bug, output),
            Commands::Delete { id } => edit::delete(&mut board, &id, output),
            Commands::Track(action) => edit::track(&mut board, &action, output),
            Commands::Note { id, message, inline } => {
                edit::note(&mut board, &id, &message, inline, output)
            }
        }
    }
}

/// `--dir`, or the current directory.
fn board_dir(dir: Option<&Path>) -> PathBuf {
    dir.map(Path::to_path_buf)
        .unwrap_or_else(|| std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")))
}

/// A seeded store and the session reading it.
#[derive(Debug)]
pub struct Board {
    pub config: Config,
    pub store: Store,
    pub session: Session,
    /// Seed file the store came from; `None` for the built-in seed.
    pub seed_path: Option<PathBuf>,
}

impl Board {
    /// Load config from `dir`, seed the store, then resolve the acting user:
    /// `user`, else `session.user` from config, else the seed's current user.
    pub fn open(dir: Option<&Path>, seed: Option<&Path>, user: Option<&str>) -> Result<Self> {
        let dir = board_dir(dir);
        let config = Config::load_from_dir(&dir)?;

        let seed_path = seed.map(Path::to_path_buf).or_else(|| config.seed_path(&dir));
        let seed = match &seed_path {
            Some(path) => Seed::load(path)?,
            None => Seed::builtin()?,
        };

        let session = match user.or(config.session.user.as_deref()) {
            Some(user_id) => Session::for_user(&seed.users, user_id)?,
            None => seed.default_session()?,
        };
        debug!(user = %session.user_id, role = ?session.role, "session resolved");

        let store = seed.into_store()?;
        Ok(Self {
            config,
            store,
            session,
            seed_path,
        })
    }

    /// The seed file writes go to.
    pub fn writable_seed(&self) -> Result<&Path> {
        self.seed_path.as_deref().ok_or_else(|| {
            Error::InvalidArgument(
                "the built-in seed is read-only; run `taskboard init` or pass --seed".to_string(),
            )
        })
    }

    /// Save the store back to its seed file and return the path written.
    pub fn save(&self) -> Result<PathBuf> {
        let path = self.writable_seed()?;
        Seed::from_store(&self.store).save(path)?;
        debug!(path = %path.display(), revision = self.store.revision(), "board saved");
        Ok(path.to_path_buf())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::CONFIG_FILE;
    use crate::model::Role;

    #[test]
    fn open_defaults_to_builtin_seed_and_flagged_user() {
        let dir = tempfile::tempdir().expect("tempdir");
        let board = Board::open(Some(dir.path()), None, None).expect("open");
        assert_eq!(board.session, Session::new("u-001", Role::Manager));
        assert!(!board.store.tasks().is_empty());
    }

    #[test]
    fn user_flag_beats_config() {
        let dir = tempfile::tempdir().expect("tempdir");
        std::fs::write(dir.path().join(CONFIG_FILE), "[session]\nuser = \"u-002\"")
            .expect("write config");

        let board = Board::open(Some(dir.path()), None, None).expect("open");
        assert_eq!(board.session.user_id, "u-002");
        assert_eq!(board.session.role, Role::Developer);

        let board = Board::open(Some(dir.path()), None, Some("u-003")).expect("open");
        assert_eq!(board.session.user_id, "u-003");
    }

    #[test]
    fn unknown_user_is_rejected() {
        let dir = tempfile::tempdir().expect("tempdir");
        let err = Board::open(Some(dir.path()), None, Some("u-999")).expect_err("unknown");
        assert!(matches!(err, Error::UserNotFound(_)));
    }

    #[test]
    fn builtin_board_cannot_be_saved() {
        let dir = tempfile::tempdir().expect("tempdir");
        let board = Board::open(Some(dir.path()), None, None).expect("open");
        assert!(board.seed_path.is_none());
        assert!(matches!(board.save(), Err(Error::InvalidArgument(_))));
    }

    #[test]
    fn saved_board_reopens_with_changes() {
        let dir = tempfile::tempdir().expect("tempdir");
        let seed_path = dir.path().join("board.json");
        Seed::builtin()
            .expect("builtin")
            .save(&seed_path)
            .expect("write seed");

        let mut board = Board::open(Some(dir.path()), Some(&seed_path), None).expect("open");
        assert!(board.store.delete_bug("b-002"));
        assert_eq!(board.save().expect("save"), seed_path);

        let reopened = Board::open(Some(dir.path()), Some(&seed_path), None).expect("reopen");
        assert!(reopened.store.find_bug("b-002").is_none());
        assert_eq!(reopened.store.bugs().len(), 2);
    }

    #[test]
    fn cli_parses_write_commands() {
        let cli = Cli::try_parse_from([
            "taskboard",
            "edit",
            "b-001",
            "--status",
            "closed",
            "--severity",
            "high",
        ])
        .expect("parse");
        match cli.command {
            Commands::Edit { id, fields, bug, .. } => {
                assert_eq!(id, "b-001");
                assert_eq!(fields.status.as_deref(), Some("closed"));
                assert_eq!(bug.severity.as_deref(), Some("high"));
            }
            other => panic!("unexpected command: {other:?}"),
        }

        let cli = Cli::try_parse_from(["taskboard", "track", "stop", "t-002"]).expect("parse");
        assert!(matches!(
            cli.command,
            Commands::Track(TrackCommands::Stop { ref id }) if id == "t-002"
        ));
    }

    #[test]
    fn cli_parses_global_flags_after_subcommand() {
        let cli = Cli::try_parse_from(["taskboard", "tasks", "--status", "open", "--json"])
            .expect("parse");
        assert!(cli.json);
        match cli.command {
            Commands::Tasks(filter) => assert_eq!(filter.status.as_deref(), Some("open")),
            other => panic!("unexpected command: {other:?}"),
        }
    }
}
