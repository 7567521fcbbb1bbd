#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};

use assert_cmd::Command;
use chrono::{DateTime, TimeZone, Utc};
use taskboard::model::{timestamp, Bug, ItemType, Priority, Role, Session, Status, Task, Update, User};
use taskboard::store::Store;
use tempfile::TempDir;

pub fn at(year: i32, month: u32, day: u32, hour: u32, minute: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(year, month, day, hour, minute, 0)
        .single()
        .expect("valid timestamp")
}

pub fn t0() -> DateTime<Utc> {
    at(2024, 1, 1, 9, 0)
}

pub fn user(id: &str, name: &str, role: Role) -> User {
    User {
        id: id.to_string(),
        name: name.to_string(),
        email: format!("{id}@example.com"),
        role,
        is_current_user: false,
    }
}

pub fn manager() -> Session {
    Session::new("u1", Role::Manager)
}

pub fn developer(id: &str) -> Session {
    Session::new(id, Role::Developer)
}

pub fn task(id: &str, assignee: &str, status: Status, priority: Priority) -> Task {
    let mut task = Task::new(id, format!("Task {id}"), assignee, t0());
    task.status = status;
    task.priority = priority;
    task
}

pub fn bug(id: &str, assignee: &str, status: Status, priority: Priority) -> Bug {
    let mut bug = Bug::new(id, format!("Bug {id}"), assignee, t0());
    bug.status = status;
    bug.priority = priority;
    bug
}

pub fn update(id: &str, parent: &str, item_type: ItemType, created_at: DateTime<Utc>) -> Update {
    Update {
        id: id.to_string(),
        parent_id: parent.to_string(),
        item_type,
        message: format!("note {id}"),
        created_by: "u1".to_string(),
        created_at: timestamp(created_at),
    }
}

/// One manager `u1` and developers `u2` and `u3`.
pub fn team() -> Vec<User> {
    vec![
        user("u1", "Mia", Role::Manager),
        user("u2", "Dev Two", Role::Developer),
        user("u3", "Dev Three", Role::Developer),
    ]
}

pub fn store_with(tasks: Vec<Task>, bugs: Vec<Bug>) -> Store {
    Store::new(team(), tasks, bugs).expect("store")
}

/// A scratch directory for `.taskboard.toml` and seed files.
pub struct TestBoard {
    dir: TempDir,
}

impl TestBoard {
    pub fn new() -> Self {
        Self {
            dir: tempfile::tempdir().expect("failed to create tempdir"),
        }
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    pub fn write_file(&self, rel_path: &str, contents: &str) -> std::io::Result<PathBuf> {
        let path = self.dir.path().join(rel_path);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&path, contents)?;
        Ok(path)
    }

    pub fn write_config(&self, contents: &str) -> std::io::Result<PathBuf> {
        self.write_file(taskboard::config::CONFIG_FILE, contents)
    }

    /// `taskboard` running inside this directory, isolated from the caller's env.
    pub fn cmd(&self) -> Command {
        let mut cmd = taskboard_cmd();
        cmd.current_dir(self.path());
        cmd
    }
}

pub fn taskboard_cmd() -> Command {
    let mut cmd = Command::cargo_bin("taskboard").expect("binary");
    cmd.env_remove("TASKBOARD_DIR")
        .env_remove("TASKBOARD_SEED")
        .env_remove("TASKBOARD_USER")
        .env_remove("RUST_LOG");
    cmd
}
