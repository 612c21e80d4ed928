//! # timeblock core library
//!
//! Decision/scheduling engine for a personal task-triage assistant bridging
//! Google Tasks and Google Calendar: pull open tasks, rank and filter them
//! against a time-and-energy budget, and commit a chosen task to a calendar
//! slot or defer it.
//!
//! ## Architecture
//!
//! - **Normalization**: [`TaskNormalizer`] maps raw Task Store records into
//!   canonical [`Task`] snapshots (inferred duration, parsed due, derived
//!   overdue/routine flags)
//! - **Triage**: [`triage::select`] filters against a [`TriageFilter`]
//!   without re-sorting
//! - **Orchestration**: [`Session`] owns credentials, store clients, and the
//!   in-memory working set, and performs the schedule/snooze/move/delete
//!   side effects
//! - **Stores**: [`TaskStore`] / [`EventStore`] traits with blocking Google
//!   clients behind them
//!
//! Everything is synchronous and single-threaded; one process is one
//! interactive session.

pub mod auth;
pub mod clock;
pub mod config;
pub mod error;
pub mod markers;
pub mod scheduling;
pub mod session;
pub mod stores;
pub mod task;
pub mod triage;

pub use auth::{Credential, CredentialProvider, GoogleAuth};
pub use config::Config;
pub use error::{
    ConfigError, CoreError, CredentialError, MoveError, Result, ScheduleError, StoreError,
};
pub use scheduling::EventDraft;
pub use session::{ScheduleOptions, ScheduleOutcome, Session};
pub use stores::{
    EventRecord, EventStore, GoogleCalendarClient, GoogleTasksClient, RawTask, TaskDraft,
    TaskList, TaskStore,
};
pub use task::{Task, TaskNormalizer};
pub use triage::{EnergyLevel, TimeBudget, TriageFilter, TriageMode};
