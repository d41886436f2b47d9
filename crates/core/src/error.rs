//! Error types surfaced by the planner engine.

use thiserror::Error;

/// Rejections raised by the resolution engine.
///
/// Every variant leaves the build untouched: an operation either applies in
/// full or not at all.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PlannerError {
    /// The id does not name a skill box in the catalog.
    #[error("unknown skill box '{0}'")]
    UnknownSkillBox(String),
    /// The id does not name a species in the catalog.
    #[error("unknown species '{0}'")]
    UnknownSpecies(String),
    /// The id does not name a profession in the catalog.
    #[error("unknown profession '{0}'")]
    UnknownProfession(String),
    /// The box is already part of the build.
    #[error("skill box '{0}' is already selected")]
    AlreadySelected(String),
    /// The box is not part of the build.
    #[error("skill box '{0}' is not selected")]
    NotSelected(String),
    /// Applying the change would exceed the skill point pool.
    #[error("not enough skill points: {needed} needed, {available} available")]
    InsufficientSkillPoints {
        /// Points the change would consume.
        needed: u32,
        /// Points left in the pool before the change.
        available: u32,
    },
}

/// Problems found while loading a catalog document.
#[derive(Debug, Error)]
pub enum CatalogError {
    /// The document is not valid catalog JSON.
    #[error("failed to parse catalog: {0}")]
    Parse(#[from] serde_json::Error),
    /// An identifier does not follow the `lower_snake_case` convention.
    #[error("invalid {kind} id '{id}'")]
    InvalidId {
        /// Kind of record (species, profession, skill box).
        kind: &'static str,
        /// Offending identifier.
        id: String,
    },
    /// Two records of the same kind share an id.
    #[error("duplicate {kind} id '{id}'")]
    Duplicate {
        /// Kind of record (species, profession, skill box).
        kind: &'static str,
        /// Offending identifier.
        id: String,
    },
    /// A prerequisite refers to a box that does not exist.
    #[error("'{owner}' requires unknown skill box '{missing}'")]
    MissingPrerequisite {
        /// Box or profession declaring the prerequisite.
        owner: String,
        /// Id that could not be resolved.
        missing: String,
    },
    /// A box costs more than the whole skill point pool.
    #[error("skill box '{id}' costs {skill_points} points, more than the pool allows")]
    OversizedBox {
        /// Offending box.
        id: String,
        /// Declared cost.
        skill_points: u32,
    },
    /// The prerequisite graph loops back onto itself.
    #[error("prerequisite cycle through '{0}'")]
    Cycle(String),
}

/// Failures reported by a persistence collaborator.
#[derive(Debug, Error)]
pub enum StorageError {
    /// The backing store could not be read or written.
    #[error("storage unavailable for '{key}': {reason}")]
    Unavailable {
        /// Namespace key being accessed.
        key: String,
        /// Underlying failure description.
        reason: String,
    },
    /// Templates could not be serialised for storage.
    #[error("failed to serialise templates: {0}")]
    Serialize(#[from] serde_json::Error),
}

impl StorageError {
    pub(crate) fn unavailable(key: &str, reason: impl ToString) -> Self {
        StorageError::Unavailable {
            key: key.to_string(),
            reason: reason.to_string(),
        }
    }
}
