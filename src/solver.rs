use crate::config::{PriorityStrategy, ScenarioConfig};
use crate::data::{AllocationInput, AllocationReport};
use crate::error::{AllocationError, Result};
use crate::model::{AllocationModel, ModelBuilder, Objective};
use crate::params::derive_parameters;
use crate::report::decode;
use crate::validation::validate_input;
use good_lp::solvers::SolutionStatus;
use good_lp::{
    ResolutionError, Solution, SolverModel, Variable, WithTimeLimit, default_solver,
};
use log::{info, warn};
use serde::Serialize;
use std::collections::HashMap;
use std::fmt;
use std::time::{Duration, Instant};

/// Terminal status of one optimization call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase", tag = "status", content = "reason")]
pub enum SolveStatus {
    Optimal,
    Infeasible,
    /// Unbounded, time-limited or failed; the reason comes from the backend.
    Other(String),
}

impl fmt::Display for SolveStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SolveStatus::Optimal => write!(f, "OPTIMAL"),
            SolveStatus::Infeasible => write!(f, "INFEASIBLE"),
            SolveStatus::Other(reason) => write!(f, "OTHER ({})", reason),
        }
    }
}

/// Solved value of every variable of a model, plus the objective value.
#[derive(Debug, Clone)]
pub struct SolvedValues {
    pub objective: f64,
    pub values: HashMap<Variable, f64>,
}

impl SolvedValues {
    /// Threshold used to round every boolean-typed variable.
    pub const BOOLEAN_THRESHOLD: f64 = 0.5;

    /// Solved value of `var`; variables the model never created read as 0.
    pub fn value(&self, var: Variable) -> f64 {
        self.values.get(&var).copied().unwrap_or(0.0)
    }

    pub fn is_set(&self, var: Variable) -> bool {
        self.value(var) > Self::BOOLEAN_THRESHOLD
    }
}

pub enum SolveOutcome {
    Optimal(SolvedValues),
    Infeasible,
    Other(String),
}

impl SolveOutcome {
    pub fn status(&self) -> SolveStatus {
        match self {
            SolveOutcome::Optimal(_) => SolveStatus::Optimal,
            SolveOutcome::Infeasible => SolveStatus::Infeasible,
            SolveOutcome::Other(reason) => SolveStatus::Other(reason.clone()),
        }
    }

    /// Non-optimal outcomes end the solve; nothing is retried.
    pub fn into_optimal(self) -> Result<SolvedValues> {
        match self {
            SolveOutcome::Optimal(values) => Ok(values),
            other => Err(AllocationError::NotOptimal(other.status())),
        }
    }
}

/// Boundary to the MILP backend: maximize the model's objective subject to its
/// constraints, synchronously.
pub trait SolverAdapter {
    fn solve(&self, model: AllocationModel) -> SolveOutcome;
}

/// Solves with HiGHS through `good_lp`.
#[derive(Debug, Clone, Default)]
pub struct HighsAdapter {
    time_limit: Option<Duration>,
}

impl HighsAdapter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adapter honouring the scenario's time limit, if any.
    pub fn for_scenario(config: &ScenarioConfig) -> Result<Self> {
        Ok(match config.time_limit()? {
            Some(limit) => Self::new().with_time_limit(limit),
            None => Self::new(),
        })
    }

    /// Reaching the limit is reported as [`SolveOutcome::Other`].
    pub fn with_time_limit(mut self, limit: Duration) -> Self {
        self.time_limit = Some(limit);
        self
    }
}

impl SolverAdapter for HighsAdapter {
    fn solve(&self, model: AllocationModel) -> SolveOutcome {
        let start_time = Instant::now();
        let AllocationModel {
            variables,
            decision_vars,
            objective,
            constraints,
        } = model;

        let mut problem = variables
            .maximise(objective.clone())
            .using(default_solver)
            .set_option("threads", 1) // limit to 1 thread for reproducibility
            .set_option("random_seed", 1234) // set seed for reproducibility
            .set_option("mip_rel_gap", 0.0); // only proven optima count as optimal
        if let Some(limit) = self.time_limit {
            problem = problem.with_time_limit(limit.as_secs_f64());
        }
        for constraint in constraints {
            problem.add_constraint(constraint);
        }

        info!("Starting ILP solver...");
        let solution = match problem.solve() {
            Ok(s) => s,
            Err(ResolutionError::Infeasible) => return SolveOutcome::Infeasible,
            Err(e) => return SolveOutcome::Other(e.to_string()),
        };
        let duration = start_time.elapsed();
        if let Some(reason) = early_stop_reason(solution.status()) {
            warn!("Solver stopped without proving optimality after {:.2?}: {}", duration, reason);
            return SolveOutcome::Other(reason);
        }
        info!("Solution found in {:.2?}", duration);

        SolveOutcome::Optimal(SolvedValues {
            objective: solution.eval(objective),
            values: decision_vars
                .into_iter()
                .map(|var| (var, solution.value(var)))
                .collect(),
        })
    }
}

/// Why a solution the backend returned is not a proven optimum, if it is not.
fn early_stop_reason(status: SolutionStatus) -> Option<String> {
    match status {
        SolutionStatus::Optimal => None,
        SolutionStatus::TimeLimit => Some("time, iteration or memory limit reached".to_string()),
        SolutionStatus::GapLimit => Some("stopped at the optimality gap limit".to_string()),
        #[allow(unreachable_patterns)]
        _ => Some("solver stopped early".to_string()),
    }
}

/// Validates the input, builds the scenario's model, solves it and decodes the report.
pub fn solve(
    input: &AllocationInput,
    config: &ScenarioConfig,
    adapter: &impl SolverAdapter,
) -> Result<AllocationReport> {
    validate_input(input)?;
    config.validate(input)?;
    let params = derive_parameters(input);
    let builder = ModelBuilder::new(input, &params, config);

    let priority = config.advanced.as_ref().map(|a| a.priority);
    let (solved, handles) = match priority {
        Some(PriorityStrategy::TwoPhase) => {
            let (model, _) = builder.build(Objective::PriorityOnly)?;
            let best = adapter.solve(model).into_optimal()?.objective;
            info!("Prioritized student can reach satisfaction {}; optimizing the group.", best);
            let (model, handles) = builder
                .with_priority_floor(best)
                .build(Objective::Aggregate)?;
            (adapter.solve(model).into_optimal()?, handles)
        }
        _ => {
            let (model, handles) = builder.build(builder.scenario_objective())?;
            (adapter.solve(model).into_optimal()?, handles)
        }
    };

    Ok(decode(input, &params, config, &handles, &solved))
}
