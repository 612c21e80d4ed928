pub mod auth;
pub mod common;
pub mod config;
pub mod lists;
pub mod move_task;
pub mod schedule;
pub mod snooze;
pub mod tasks;
