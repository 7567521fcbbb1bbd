//! Seed data for the in-memory store.
//!
//! A seed is a JSON document with `users`, `tasks`, `bugs` and optionally
//! `updates`, in the same record shapes the store holds. Write commands save
//! the store back into the seed file they loaded.

use std::fs::{self, File};
use std::io::Write;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::Result;
use crate::model::{Bug, Session, Task, Update, User};
use crate::store::Store;

const BUILTIN_SEED: &str = include_str!("../fixtures/seed.json");

/// Seed file name `taskboard init` creates next to the config.
pub const DEFAULT_SEED_FILE: &str = "taskboard.json";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Seed {
    pub users: Vec<User>,
    #[serde(default)]
    pub tasks: Vec<Task>,
    #[serde(default)]
    pub bugs: Vec<Bug>,
    #[serde(default)]
    pub updates: Vec<Update>,
}

impl Seed {
    /// The fixture shipped with the crate; its update log starts empty.
    pub fn builtin() -> Result<Self> {
        Ok(serde_json::from_str(BUILTIN_SEED)?)
    }

    /// Snapshot of everything a store holds.
    pub fn from_store(store: &Store) -> Self {
        Self {
            users: store.users().to_vec(),
            tasks: store.tasks().to_vec(),
            bugs: store.bugs().to_vec(),
            updates: store.updates().to_vec(),
        }
    }

    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        let seed: Seed = serde_json::from_str(&content)?;
        debug!(
            path = %path.display(),
            users = seed.users.len(),
            tasks = seed.tasks.len(),
            bugs = seed.bugs.len(),
            updates = seed.updates.len(),
            "seed loaded"
        );
        Ok(seed)
    }

    /// Write the seed as pretty JSON. The file is written to a temp path
    /// first and renamed over the target, so readers never see half a seed.
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let temp_path = path.with_extension("json.tmp");
        let mut file = File::create(&temp_path)?;
        file.write_all(serde_json::to_string_pretty(self)?.as_bytes())?;
        file.write_all(b"\n")?;
        file.sync_all()?;
        drop(file);

        fs::rename(&temp_path, path)?;
        debug!(
            path = %path.display(),
            tasks = self.tasks.len(),
            bugs = self.bugs.len(),
            "seed saved"
        );
        Ok(())
    }

    /// The session of the user flagged as current in this seed.
    pub fn default_session(&self) -> Result<Session> {
        Session::from_users(&self.users)
    }

    /// Build a store holding this seed. Duplicate ids are rejected.
    pub fn into_store(self) -> Result<Store> {
        let mut store = Store::new(self.users, self.tasks, self.bugs)?;
        for update in self.updates {
            store.add_update(update);
        }
        Ok(store)
    }
}
