//! Error types for sd-migrate

use sd_core::CoreError;
use thiserror::Error;

/// Planning error type
///
/// Codes use the `P` prefix. A cancelled run is reported as
/// [`PlanError::Cancelled`] whether the flag was observed by the planner or
/// by a core operation it called.
#[derive(Error, Debug)]
pub enum PlanError {
    /// P001: A dependency cycle remained after every possible split
    #[error("[P001] Ordering conflict: cannot order {}", objects.join(", "))]
    OrderingConflict { objects: Vec<String> },

    /// P002: Cooperative cancellation was observed
    #[error("[P002] Planning cancelled")]
    Cancelled,

    /// P003: Core error propagation
    #[error("[P003] Core error: {0}")]
    Core(CoreError),
}

impl From<CoreError> for PlanError {
    fn from(err: CoreError) -> Self {
        if err.is_cancelled() {
            PlanError::Cancelled
        } else {
            PlanError::Core(err)
        }
    }
}

impl PlanError {
    pub fn is_cancelled(&self) -> bool {
        matches!(self, PlanError::Cancelled)
    }
}

/// Result type alias for PlanError
pub type PlanResult<T> = Result<T, PlanError>;
