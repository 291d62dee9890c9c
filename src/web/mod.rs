//! HTTP API

mod server;

pub use server::{router, serve, AppState};
