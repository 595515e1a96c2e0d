//! Staleness detection and sync resolution for snapshot-bound references.
//!
//! A reference records the version of the referenced resource it was bound
//! to at creation time. Freshness is never stored; it is recomputed on read
//! by comparing the bound version against the referenced resource's current
//! version. Sync is the only operation that moves a binding forward.

use serde::Serialize;
use serde_json::Value;

use crate::plugin;
use crate::types::Version;

// ---------------------------------------------------------------------------
// Freshness
// ---------------------------------------------------------------------------

/// Derived freshness of a reference, recomputed on every read.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Freshness {
    /// The bound version is the referenced resource's latest.
    Fresh,
    /// The referenced resource has committed past the bound version.
    Stale,
}

impl Freshness {
    pub fn is_stale(&self) -> bool {
        matches!(self, Freshness::Stale)
    }
}

/// Compare a reference's bound version against the referenced resource's
/// current version.
pub fn freshness(bound_version: Version, latest_version: Version) -> Freshness {
    if bound_version == latest_version {
        Freshness::Fresh
    } else {
        Freshness::Stale
    }
}

/// Whether a snapshot version is the resource's current one. Used to flag
/// exactly one entry in a history listing.
pub fn is_latest(version: Version, current_version: Version) -> bool {
    version == current_version
}

/// Full reference classification: freshness plus the terminal broken state.
///
/// `Broken` is entered only when the referenced resource's identity no
/// longer exists; it is irreversible without creating a new reference.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ReferenceStatus {
    Fresh,
    Stale,
    Broken,
}

/// Classify a reference against its target's current version, or `None`
/// when the target identity has been deleted.
pub fn reference_status(
    bound_version: Version,
    latest_version: Option<Version>,
) -> ReferenceStatus {
    match latest_version {
        Some(latest) if latest == bound_version => ReferenceStatus::Fresh,
        Some(_) => ReferenceStatus::Stale,
        None => ReferenceStatus::Broken,
    }
}

// ---------------------------------------------------------------------------
// Sync resolution
// ---------------------------------------------------------------------------

/// Non-fatal notice that a narrower sub-selection (one task within a plugin
/// payload) did not survive a sync and was cleared.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SubSelectionLost {
    /// The task name that no longer exists in the newly bound snapshot.
    pub selection: String,
}

impl SubSelectionLost {
    /// Human-readable message for the API warning envelope.
    pub fn message(&self) -> String {
        format!(
            "Task '{}' no longer exists in the latest snapshot; \
             the selection was cleared and must be re-selected",
            self.selection
        )
    }
}

/// The computed outcome of a sync: the new binding, and whether the
/// previous sub-selection survived.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncPlan {
    /// Version the reference will be bound to (the target's current).
    pub bound_version: Version,
    /// Sub-selection carried forward, or `None` if there was none or it
    /// was lost.
    pub sub_selection: Option<String>,
    /// Present when a previous sub-selection was cleared.
    pub lost: Option<SubSelectionLost>,
}

/// Decide how a reference re-binds to the referenced resource's latest
/// snapshot.
///
/// The sub-selection survives only if the latest payload still defines a
/// task with that name; otherwise it is cleared and reported.
pub fn plan_sync(
    latest_version: Version,
    latest_payload: &Value,
    sub_selection: Option<&str>,
) -> SyncPlan {
    match sub_selection {
        Some(selection) if plugin::has_task(latest_payload, selection) => SyncPlan {
            bound_version: latest_version,
            sub_selection: Some(selection.to_string()),
            lost: None,
        },
        Some(selection) => SyncPlan {
            bound_version: latest_version,
            sub_selection: None,
            lost: Some(SubSelectionLost {
                selection: selection.to_string(),
            }),
        },
        None => SyncPlan {
            bound_version: latest_version,
            sub_selection: None,
            lost: None,
        },
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    // -- freshness -----------------------------------------------------------

    #[test]
    fn same_version_is_fresh() {
        assert_eq!(freshness(2, 2), Freshness::Fresh);
        assert!(!freshness(2, 2).is_stale());
    }

    #[test]
    fn older_bound_version_is_stale() {
        assert_eq!(freshness(1, 3), Freshness::Stale);
        assert!(freshness(1, 3).is_stale());
    }

    #[test]
    fn staleness_flips_exactly_at_the_next_commit() {
        let bound = 2;
        assert_eq!(freshness(bound, 2), Freshness::Fresh);
        // Target commits again.
        assert_eq!(freshness(bound, 3), Freshness::Stale);
    }

    #[test]
    fn reference_status_tracks_target_lifecycle() {
        assert_eq!(reference_status(2, Some(2)), ReferenceStatus::Fresh);
        assert_eq!(reference_status(2, Some(3)), ReferenceStatus::Stale);
        assert_eq!(reference_status(2, None), ReferenceStatus::Broken);
    }

    #[test]
    fn exactly_one_history_entry_is_latest() {
        let versions = [3, 2, 1];
        let current = 3;
        let flags: Vec<bool> = versions.iter().map(|v| is_latest(*v, current)).collect();
        assert_eq!(flags, vec![true, false, false]);
    }

    // -- plan_sync -----------------------------------------------------------

    #[test]
    fn sync_without_sub_selection_just_rebinds() {
        let plan = plan_sync(5, &json!({}), None);
        assert_eq!(plan.bound_version, 5);
        assert_eq!(plan.sub_selection, None);
        assert!(plan.lost.is_none());
    }

    #[test]
    fn surviving_sub_selection_is_kept() {
        let payload = json!({
            "files": [ { "filename": "a.py", "tasks": [ { "name": "fgsm" } ] } ]
        });
        let plan = plan_sync(2, &payload, Some("fgsm"));
        assert_eq!(plan.sub_selection.as_deref(), Some("fgsm"));
        assert!(plan.lost.is_none());
    }

    #[test]
    fn missing_sub_selection_is_cleared_with_warning() {
        let payload = json!({
            "files": [ { "filename": "a.py", "tasks": [ { "name": "pgd" } ] } ]
        });
        let plan = plan_sync(2, &payload, Some("fgsm"));
        assert_eq!(plan.bound_version, 2);
        assert_eq!(plan.sub_selection, None);
        let lost = plan.lost.expect("selection should be reported lost");
        assert_eq!(lost.selection, "fgsm");
        assert!(lost.message().contains("fgsm"));
        assert!(lost.message().contains("re-selected"));
    }
}
