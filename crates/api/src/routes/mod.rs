//! Route definitions.
//!
//! Routes declare URL structure only; request handling lives in
//! [`crate::handlers`].

use axum::Router;

use crate::state::AppState;

pub mod health;
pub mod resources;

/// All routes mounted under `/api/v1`.
pub fn api_routes() -> Router<AppState> {
    resources::router()
}
