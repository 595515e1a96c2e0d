//! Domain error taxonomy shared by the repository and API layers.

use crate::types::DbId;

/// Domain-level errors surfaced by store and binder operations.
///
/// The API layer maps each variant to an HTTP status; see
/// `testbed-api/src/error.rs`.
#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    /// An entity (resource, snapshot, draft, reference) does not exist.
    #[error("{entity} with id {id} not found")]
    NotFound { entity: &'static str, id: DbId },

    /// A field failed validation (bad name, bad identifier syntax,
    /// malformed payload).
    #[error("Validation error: {0}")]
    Validation(String),

    /// A uniqueness rule was violated, or a mutation raced with a delete
    /// (e.g. publishing a draft whose resource is gone).
    #[error("Conflict: {0}")]
    Conflict(String),

    /// A reference points at a resource identity that no longer exists.
    ///
    /// Terminal for the reference: the caller must create a new one.
    #[error("{entity} with id {id} has been deleted; the reference is broken")]
    DanglingReference { entity: &'static str, id: DbId },

    /// An invariant breach or storage fault the caller cannot repair.
    #[error("Internal error: {0}")]
    Internal(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn not_found_display() {
        let err = CoreError::NotFound {
            entity: "Queue",
            id: 7,
        };
        assert_eq!(err.to_string(), "Queue with id 7 not found");
    }

    #[test]
    fn dangling_reference_display_names_the_deleted_entity() {
        let err = CoreError::DanglingReference {
            entity: "Plugin",
            id: 3,
        };
        assert!(err.to_string().contains("Plugin with id 3"));
        assert!(err.to_string().contains("broken"));
    }
}
