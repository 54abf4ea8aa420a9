use crate::solver::SolveStatus;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AllocationError {
    /// The input data is inconsistent; no model was built.
    #[error("data integrity violation: {0}")]
    DataIntegrity(String),

    #[error("invalid scenario configuration: {0}")]
    InvalidConfig(String),

    /// The scalarization weight cannot make the prioritized student dominate.
    #[error("priority weight {weight} does not dominate the aggregate objective (needs more than {required})")]
    PriorityWeightTooSmall { weight: f64, required: f64 },

    #[error("model did not reach optimality: {0}")]
    NotOptimal(SolveStatus),
}

pub type Result<T> = std::result::Result<T, AllocationError>;
