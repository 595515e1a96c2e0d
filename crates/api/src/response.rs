//! Shared response envelope types for API handlers.
//!
//! All API responses use a `{ "data": ... }` envelope per project conventions.
//! Use [`DataResponse`] instead of ad-hoc `serde_json::json!({ "data": ... })`
//! to get compile-time type safety and consistent serialization.

use serde::Serialize;

/// Standard `{ "data": T }` response envelope.
///
/// Wraps any serializable payload in the project's standard response format.
///
/// # Example
///
/// ```ignore
/// Ok(Json(DataResponse { data: items }))
/// ```
#[derive(Debug, Serialize)]
pub struct DataResponse<T: Serialize> {
    pub data: T,
}

/// `{ "data": T, "warning": ... }` envelope for operations that succeed with
/// a non-fatal notice (a sync that dropped its sub-selection).
#[derive(Debug, Serialize)]
pub struct DataWithWarning<T: Serialize> {
    pub data: T,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub warning: Option<Warning>,
}

/// A non-fatal, machine-readable warning attached to a successful response.
#[derive(Debug, Serialize)]
pub struct Warning {
    /// Stable warning code, e.g. `"sub_selection_lost"`.
    pub code: &'static str,
    /// Human-readable explanation.
    pub message: String,
}
