//! Shared scalar types and the resource-kind enumeration.

use serde::{Deserialize, Serialize};

/// All database primary keys are SQLite INTEGER (64-bit).
pub type DbId = i64;

/// Per-resource snapshot version numbers. Start at 1, strictly increasing.
pub type Version = i64;

/// All timestamps are UTC.
pub type Timestamp = chrono::DateTime<chrono::Utc>;

/// The nine first-class resource kinds managed by the registry.
///
/// Every kind shares the same storage shape (current row + append-only
/// snapshot history + optional draft); `payload` carries the kind-specific
/// structure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResourceKind {
    Queue,
    Experiment,
    Entrypoint,
    Plugin,
    PluginParameterType,
    Job,
    Model,
    Artifact,
    Tag,
}

impl ResourceKind {
    /// Canonical token stored in the `resources.kind` column.
    ///
    /// Matches the serde `snake_case` representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            ResourceKind::Queue => "queue",
            ResourceKind::Experiment => "experiment",
            ResourceKind::Entrypoint => "entrypoint",
            ResourceKind::Plugin => "plugin",
            ResourceKind::PluginParameterType => "plugin_parameter_type",
            ResourceKind::Job => "job",
            ResourceKind::Model => "model",
            ResourceKind::Artifact => "artifact",
            ResourceKind::Tag => "tag",
        }
    }

    /// Entity label used in error messages ("Queue with id 7 not found").
    pub fn entity_label(&self) -> &'static str {
        match self {
            ResourceKind::Queue => "Queue",
            ResourceKind::Experiment => "Experiment",
            ResourceKind::Entrypoint => "Entrypoint",
            ResourceKind::Plugin => "Plugin",
            ResourceKind::PluginParameterType => "PluginParameterType",
            ResourceKind::Job => "Job",
            ResourceKind::Model => "Model",
            ResourceKind::Artifact => "Artifact",
            ResourceKind::Tag => "Tag",
        }
    }

    /// URL path segment under which the kind's collection is mounted
    /// (`/api/v1/{segment}`).
    pub fn path_segment(&self) -> &'static str {
        match self {
            ResourceKind::Queue => "queues",
            ResourceKind::Experiment => "experiments",
            ResourceKind::Entrypoint => "entrypoints",
            ResourceKind::Plugin => "plugins",
            ResourceKind::PluginParameterType => "plugin-parameter-types",
            ResourceKind::Job => "jobs",
            ResourceKind::Model => "models",
            ResourceKind::Artifact => "artifacts",
            ResourceKind::Tag => "tags",
        }
    }

    /// Parse a URL path segment. Unknown segments are `None` (the route
    /// layer maps that to 404).
    pub fn from_path_segment(segment: &str) -> Option<Self> {
        ALL_KINDS
            .iter()
            .copied()
            .find(|k| k.path_segment() == segment)
    }

    /// Parse the canonical storage token.
    pub fn from_str_token(token: &str) -> Option<Self> {
        ALL_KINDS.iter().copied().find(|k| k.as_str() == token)
    }

    /// Whether this kind's name doubles as a code identifier and must
    /// satisfy identifier syntax (plugins are imported by name; parameter
    /// types are referenced from task signatures).
    pub fn requires_identifier_name(&self) -> bool {
        matches!(
            self,
            ResourceKind::Plugin | ResourceKind::PluginParameterType
        )
    }
}

/// Every resource kind, in display order.
pub const ALL_KINDS: [ResourceKind; 9] = [
    ResourceKind::Queue,
    ResourceKind::Experiment,
    ResourceKind::Entrypoint,
    ResourceKind::Plugin,
    ResourceKind::PluginParameterType,
    ResourceKind::Job,
    ResourceKind::Model,
    ResourceKind::Artifact,
    ResourceKind::Tag,
];
