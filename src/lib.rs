// src/lib.rs
// Public library surface for integration tests (and potential reuse).

pub mod api;
pub mod auth;
pub mod codescan;
pub mod config;
pub mod error;
pub mod model;
pub mod recommend;
pub mod seed;
pub mod store;

// ---- Re-exports for stable public API ----
// Router construction: `course_coach::api::create_router` or `course_coach::create_router`
pub use crate::api::{create_router, AppState};
pub use crate::config::AppConfig;
