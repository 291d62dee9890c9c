//! Peerpool - See which friends are free and plan hangouts around them
//!
//! This crate provides the HTTP server binary and the library behind it:
//! time windowing in [`schedule`], storage in [`db`], and the views and
//! mutations in [`modules`].

pub mod config;
pub mod db;
pub mod error;
pub mod modules;
pub mod schedule;
pub mod session;
pub mod web;

pub use config::Config;
pub use db::Database;
pub use error::{PeerpoolError, Result};
pub use session::Session;
