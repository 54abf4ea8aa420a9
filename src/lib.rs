pub mod config;
pub mod data;
pub mod error;
pub mod model;
pub mod params;
pub mod report;
pub mod server;
pub mod solver;
pub mod validation;

pub use config::{AdvancedConfig, PriorityStrategy, ScenarioConfig};
pub use data::{AllocationInput, AllocationReport};
pub use error::AllocationError;
pub use solver::{HighsAdapter, SolveStatus, SolverAdapter, solve};
