//! Web layer for the line schedule server.
//!
//! Provides HTTP endpoints for line schedules, line status, and the
//! admin cache surface.

mod dto;
mod routes;
mod state;

pub use dto::*;
pub use routes::{AppError, create_router};
pub use state::AppState;
