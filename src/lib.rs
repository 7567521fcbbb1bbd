//! taskboard - Role-Aware Task and Bug Board Library
//!
//! This library provides the core of the taskboard CLI: an in-memory store
//! of users, tasks, bugs and updates, with the role filtering, time tracking
//! and chart aggregation that the dashboard pages are built from.
//!
//! # Core Concepts
//!
//! - **Work items**: Tasks and bugs, both assignable and time-trackable
//! - **Session**: The acting user; developers see only their own work
//! - **Update log**: Timestamped notes attached to a task or bug
//! - **Chart series**: Per-day counts bucketed by type, status or priority
//!
//! # Module Organization
//!
//! - `cli`: Command-line interface using clap
//! - `config`: Configuration loading from `.taskboard.toml`
//! - `error`: Error types and result aliases
//! - `fixtures`: Seed data for the store, loaded from and saved to JSON
//! - `model`: Records, vocabularies and the session
//! - `output`: JSON envelope and human-readable output
//! - `role`: Role-based visibility
//! - `series`: Time-series aggregation for charts
//! - `store`: Versioned in-memory collections
//! - `tracking`: Start/stop time tracking
//! - `unify`: Common projection of tasks and bugs
//! - `updates`: Update log and merged update trail
//! - `views`: Read views behind the dashboard pages

pub mod cli;
pub mod config;
pub mod error;
pub mod fixtures;
pub mod model;
pub mod output;
pub mod role;
pub mod series;
pub mod store;
pub mod tracking;
pub mod unify;
pub mod updates;
pub mod views;

pub use error::{Error, Result};
