use crate::config::{PriorityStrategy, ScenarioConfig};
use crate::data::{AllocationInput, CourseId, StudentId};
use crate::error::{AllocationError, Result};
use crate::params::ModelParameters;
use crate::validation::validate_input;
use good_lp::{Constraint, Expression, ProblemVariables, Variable, constraint, variable};
use log::{debug, info, trace};
use std::collections::HashMap;

/// Slack allowed when holding the prioritized student's satisfaction at a previous optimum.
const PRIORITY_FLOOR_TOLERANCE: f64 = 1e-6;

/// Everything a solver needs: variable definitions, a maximization objective and the
/// constraint list. Owned by exactly one solve.
pub struct AllocationModel {
    pub variables: ProblemVariables,
    /// Every variable created, so the adapter can read back all solved values.
    pub decision_vars: Vec<Variable>,
    pub objective: Expression,
    pub constraints: Vec<Constraint>,
}

/// Lookup tables from domain keys to the variables of one model.
///
/// Assignment variables only exist for courses on a student's preference list; a
/// missing entry means the pair is fixed to "not assigned".
#[derive(Debug, Clone, Default)]
pub struct VariableHandles {
    pub assignments: HashMap<(StudentId, CourseId), Variable>,
    pub top_two: HashMap<StudentId, Variable>,
    /// Only populated for the advanced formulation.
    pub extensions: HashMap<CourseId, Variable>,
}

impl VariableHandles {
    pub fn assignment(&self, student: StudentId, course: &CourseId) -> Option<Variable> {
        self.assignments.get(&(student, course.clone())).copied()
    }
}

/// Which linear objective a model maximizes.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Objective {
    /// Sum of every student's satisfaction.
    Aggregate,
    /// `weight * S_p + aggregate` for the prioritized student `p`.
    Weighted(f64),
    /// `S_p` alone.
    PriorityOnly,
}

pub struct ModelBuilder<'a> {
    input: &'a AllocationInput,
    params: &'a ModelParameters,
    config: &'a ScenarioConfig,
    priority_floor: Option<f64>,
}

impl<'a> ModelBuilder<'a> {
    pub fn new(
        input: &'a AllocationInput,
        params: &'a ModelParameters,
        config: &'a ScenarioConfig,
    ) -> Self {
        ModelBuilder {
            input,
            params,
            config,
            priority_floor: None,
        }
    }

    /// Requires the prioritized student's satisfaction to reach at least `floor`.
    pub fn with_priority_floor(mut self, floor: f64) -> Self {
        self.priority_floor = Some(floor);
        self
    }

    /// Objective of the first (or only) solve of the configured scenario. The two-phase
    /// strategy starts with the prioritized student alone.
    pub fn scenario_objective(&self) -> Objective {
        match &self.config.advanced {
            Some(advanced) => match advanced.priority {
                PriorityStrategy::Weighted { weight } => Objective::Weighted(weight),
                PriorityStrategy::TwoPhase => Objective::PriorityOnly,
            },
            None => Objective::Aggregate,
        }
    }

    /// Builds the model. Inconsistent input is rejected with a data-integrity error
    /// before any variable is created.
    pub fn build(&self, objective: Objective) -> Result<(AllocationModel, VariableHandles)> {
        validate_input(self.input)?;
        if let Objective::Weighted(weight) = objective {
            let required = required_priority_weight(self.input, self.params);
            if weight <= required {
                return Err(AllocationError::PriorityWeightTooSmall { weight, required });
            }
            debug!("Priority weight {} dominates aggregate bound {}", weight, required);
        }
        let priority_student = self.priority_student();
        if priority_student.is_none()
            && (objective != Objective::Aggregate || self.priority_floor.is_some())
        {
            return Err(AllocationError::InvalidConfig(
                "a prioritized objective needs the advanced formulation".to_string(),
            ));
        }

        info!(
            "Setting up allocation model '{}' with {} students and {} courses...",
            self.config.name,
            self.input.students.len(),
            self.input.courses.len()
        );
        let mut variables = ProblemVariables::new();
        let mut decision_vars = Vec::new();
        let mut handles = VariableHandles::default();

        // x_ij = 1 if student i takes course j; only created for preferred courses
        for student in &self.input.students {
            for course in &self.input.preferences[student] {
                let var =
                    variables.add(variable().binary().name(format!("x_{}_{}", student, course)));
                handles.assignments.insert((*student, course.clone()), var);
                decision_vars.push(var);
            }
        }
        // l_i = 1 only if student i may be counted towards the top-2 requirement
        for student in &self.input.students {
            let var = variables.add(variable().binary().name(format!("l_{}", student)));
            handles.top_two.insert(*student, var);
            decision_vars.push(var);
        }
        if let Some(advanced) = &self.config.advanced {
            for course in &self.input.courses {
                let var = variables.add(
                    variable()
                        .integer()
                        .min(0)
                        .max(advanced.max_increase_per_course)
                        .name(format!("n_{}", course)),
                );
                handles.extensions.insert(course.clone(), var);
                decision_vars.push(var);
            }
        }
        trace!(
            "Created {} variables ({} assignment pairs out of {} possible).",
            decision_vars.len(),
            handles.assignments.len(),
            self.input.students.len() * self.input.courses.len()
        );

        let aggregate = self.satisfaction(&handles, None);
        let objective = match (objective, priority_student) {
            (Objective::Aggregate, _) => aggregate,
            (Objective::Weighted(weight), Some(p)) => {
                weight * self.satisfaction(&handles, Some(p)) + aggregate
            }
            (Objective::PriorityOnly, Some(p)) => self.satisfaction(&handles, Some(p)),
            // rejected above
            (_, None) => aggregate,
        };

        let mut constraints = Vec::new();
        self.add_capacity_constraints(&handles, &mut constraints);
        self.add_credit_constraints(&handles, &mut constraints);
        self.add_top_two_constraints(&handles, &mut constraints);
        if self.config.advanced.is_some() {
            self.add_advanced_constraints(&handles, &mut constraints);
        }
        if let (Some(floor), Some(p)) = (self.priority_floor, priority_student) {
            let priority = self.satisfaction(&handles, Some(p));
            let bound = floor - PRIORITY_FLOOR_TOLERANCE;
            constraints.push(constraint!(priority >= bound));
        }
        info!("Model has {} constraints.", constraints.len());

        Ok((
            AllocationModel {
                variables,
                decision_vars,
                objective,
                constraints,
            },
            handles,
        ))
    }

    fn priority_student(&self) -> Option<StudentId> {
        self.config.advanced.as_ref().map(|a| a.priority_student)
    }

    /// Weighted satisfaction of one student, or of everyone when `only` is `None`.
    fn satisfaction(&self, handles: &VariableHandles, only: Option<StudentId>) -> Expression {
        let input = self.input;
        let params = self.params;
        input
            .students
            .iter()
            .filter(|student| only.is_none_or(|p| p == **student))
            .flat_map(move |student| {
                input.preferences[student].iter().filter_map(move |course| {
                    let coefficient = params.satisfaction(*student, course)?;
                    let var = handles.assignment(*student, course)?;
                    Some(coefficient * var)
                })
            })
            .sum()
    }

    fn add_capacity_constraints(
        &self,
        handles: &VariableHandles,
        constraints: &mut Vec<Constraint>,
    ) {
        debug!("Adding course capacity constraints...");
        for course in &self.input.courses {
            let seats: Expression = self
                .input
                .students
                .iter()
                .filter_map(|student| handles.assignment(*student, course))
                .sum();
            let limit = f64::from(self.input.capacities[course]);
            match handles.extensions.get(course) {
                Some(extension) => constraints.push(constraint!(seats <= *extension + limit)),
                None => constraints.push(constraint!(seats <= limit)),
            }
        }
    }

    fn add_credit_constraints(
        &self,
        handles: &VariableHandles,
        constraints: &mut Vec<Constraint>,
    ) {
        debug!("Adding credit limit constraints...");
        let cap = f64::from(self.config.credit_cap);
        for student in &self.input.students {
            let load: Expression = self
                .input
                .courses
                .iter()
                .filter_map(|course| {
                    let var = handles.assignment(*student, course)?;
                    Some(f64::from(self.input.credits[course]) * var)
                })
                .sum();
            constraints.push(constraint!(load <= cap));
        }
    }

    fn add_top_two_constraints(
        &self,
        handles: &VariableHandles,
        constraints: &mut Vec<Constraint>,
    ) {
        debug!("Adding top-2 requirement and link constraints...");
        let flagged: Expression = self
            .input
            .students
            .iter()
            .map(|student| handles.top_two[student])
            .sum();
        let threshold = f64::from(self.config.top_two_threshold);
        constraints.push(constraint!(flagged >= threshold));

        // one-directional: l_i may only be 1 if a top-2 course is assigned
        for student in &self.input.students {
            let top_hits: Expression = self.params.top_two[student]
                .iter()
                .filter_map(|course| handles.assignment(*student, course))
                .sum();
            let indicator = handles.top_two[student];
            constraints.push(constraint!(top_hits >= indicator));
        }
    }

    fn add_advanced_constraints(
        &self,
        handles: &VariableHandles,
        constraints: &mut Vec<Constraint>,
    ) {
        let Some(advanced) = &self.config.advanced else {
            return;
        };
        debug!("Adding capacity increase budget and exclusivity constraints...");
        let granted: Expression = self
            .input
            .courses
            .iter()
            .map(|course| handles.extensions[course])
            .sum();
        let budget = f64::from(advanced.capacity_increase_budget);
        constraints.push(constraint!(granted <= budget));

        let (first, second) = &advanced.exclusive_pair;
        for student in &self.input.students {
            // without both variables the pair cannot be violated
            if let (Some(a), Some(b)) = (
                handles.assignment(*student, first),
                handles.assignment(*student, second),
            ) {
                constraints.push(constraint!(a + b <= 1));
            }
        }
    }
}

/// Smallest weight the prioritized student's term needs so that one unit of its
/// satisfaction outweighs any achievable aggregate value.
///
/// Satisfaction values move in steps of `gcd(credits) / 10`, and the aggregate can
/// never exceed the sum of every preference's worth.
pub fn required_priority_weight(input: &AllocationInput, params: &ModelParameters) -> f64 {
    let bound: f64 = params
        .ranks
        .keys()
        .filter_map(|(student, course)| params.satisfaction(*student, course))
        .sum();
    let step = input.credits.values().fold(0, |acc, credit| gcd(acc, *credit));
    if step == 0 {
        return 0.0;
    }
    bound / (f64::from(step) / 10.0)
}

fn gcd(a: u32, b: u32) -> u32 {
    if b == 0 { a } else { gcd(b, a % b) }
}
