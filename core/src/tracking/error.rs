//! Error types for target tracking

use radartrack_types::TargetId;
use thiserror::Error;

/// Errors surfaced by the tracker
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TrackerError {
    /// An update referenced an id the registry does not hold. The matcher only
    /// ever updates live targets, so this indicates a logic error.
    #[error("target {id} not found in registry")]
    NotFound { id: TargetId },

    #[error("trail limit {requested} out of range (max {max})")]
    InvalidConfiguration { requested: usize, max: usize },
}
