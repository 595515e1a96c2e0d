//! Shared query parameter types for API handlers.

use serde::Deserialize;
use testbed_core::types::DbId;

/// Generic list parameters (`?limit=&offset=&group=`).
///
/// Values are clamped in the repository layer via `clamp_limit` /
/// `clamp_offset`; `group` narrows the listing to one owning group.
#[derive(Debug, Deserialize)]
pub struct ListParams {
    pub limit: Option<i64>,
    pub offset: Option<i64>,
    pub group: Option<DbId>,
}
