use crate::data::{AllocationInput, CourseId, StudentId};
use crate::error::{AllocationError, Result};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Tunable parameters of one allocation scenario. Every field has a default, so a
/// partial JSON document is enough to describe a scenario.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ScenarioConfig {
    pub name: String,
    /// Minimum number of students that must receive a top-2 course.
    pub top_two_threshold: u32,
    pub credit_cap: u32,
    /// Wall-clock limit handed to the solver; exceeding it is a non-optimal outcome.
    pub time_limit_secs: Option<f64>,
    /// Present only for the advanced formulation.
    pub advanced: Option<AdvancedConfig>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AdvancedConfig {
    pub capacity_increase_budget: u32,
    pub max_increase_per_course: u32,
    pub priority_student: StudentId,
    pub priority: PriorityStrategy,
    /// No student may take both of these courses.
    pub exclusive_pair: (CourseId, CourseId),
}

/// How the prioritized student's satisfaction is put above the group's.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase", tag = "kind")]
pub enum PriorityStrategy {
    /// Single solve maximizing `weight * S_p + aggregate`.
    Weighted { weight: f64 },
    /// Maximize `S_p` first, then the aggregate with `S_p` held at its optimum.
    TwoPhase,
}

impl Default for ScenarioConfig {
    fn default() -> Self {
        Self::base()
    }
}

impl Default for AdvancedConfig {
    fn default() -> Self {
        AdvancedConfig {
            capacity_increase_budget: 2,
            max_increase_per_course: 2,
            priority_student: 8,
            priority: PriorityStrategy::default(),
            exclusive_pair: ("Algebra".to_string(), "Analytics".to_string()),
        }
    }
}

impl Default for PriorityStrategy {
    fn default() -> Self {
        PriorityStrategy::Weighted { weight: 1000.0 }
    }
}

impl ScenarioConfig {
    pub fn base() -> Self {
        ScenarioConfig {
            name: "Base Case".to_string(),
            top_two_threshold: 13,
            credit_cap: 40,
            time_limit_secs: None,
            advanced: None,
        }
    }

    pub fn advanced() -> Self {
        ScenarioConfig {
            name: "Advanced Case".to_string(),
            advanced: Some(AdvancedConfig::default()),
            ..Self::base()
        }
    }

    /// The solver time limit as a `Duration`, rejecting values it cannot represent.
    pub fn time_limit(&self) -> Result<Option<Duration>> {
        let Some(secs) = self.time_limit_secs else {
            return Ok(None);
        };
        match Duration::try_from_secs_f64(secs) {
            Ok(limit) if !limit.is_zero() => Ok(Some(limit)),
            _ => Err(AllocationError::InvalidConfig(format!(
                "time limit must be a positive number of seconds, got {}",
                secs
            ))),
        }
    }

    /// Checks the scenario against the input it will be applied to.
    pub fn validate(&self, input: &AllocationInput) -> Result<()> {
        if self.top_two_threshold as usize > input.students.len() {
            return Err(AllocationError::InvalidConfig(format!(
                "top-2 threshold {} exceeds the number of students ({})",
                self.top_two_threshold,
                input.students.len()
            )));
        }
        self.time_limit()?;

        let Some(advanced) = &self.advanced else {
            return Ok(());
        };
        if !input.students.contains(&advanced.priority_student) {
            return Err(AllocationError::InvalidConfig(format!(
                "prioritized student {} is not part of the cohort",
                advanced.priority_student
            )));
        }
        let (first, second) = &advanced.exclusive_pair;
        if first == second {
            return Err(AllocationError::InvalidConfig(format!(
                "exclusive pair must name two different courses, got {:?} twice",
                first
            )));
        }
        for course in [first, second] {
            if !input.courses.contains(course) {
                return Err(AllocationError::InvalidConfig(format!(
                    "exclusive course {:?} is not in the catalog",
                    course
                )));
            }
        }
        if let PriorityStrategy::Weighted { weight } = advanced.priority {
            if !(weight > 0.0) {
                return Err(AllocationError::InvalidConfig(format!(
                    "priority weight must be positive, got {}",
                    weight
                )));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::sample_input;

    #[test]
    fn canonical_scenarios_are_valid() {
        let input = sample_input();
        assert!(ScenarioConfig::base().validate(&input).is_ok());
        assert!(ScenarioConfig::advanced().validate(&input).is_ok());
    }

    #[test]
    fn partial_json_falls_back_to_defaults() {
        let config: ScenarioConfig =
            serde_json::from_str(r#"{"name": "Custom", "advanced": {"priorityStudent": 3}}"#)
                .unwrap();
        assert_eq!(config.top_two_threshold, 13);
        assert_eq!(config.credit_cap, 40);
        let advanced = config.advanced.unwrap();
        assert_eq!(advanced.priority_student, 3);
        assert_eq!(advanced.capacity_increase_budget, 2);
        assert_eq!(advanced.priority, PriorityStrategy::Weighted { weight: 1000.0 });
    }

    #[test]
    fn two_phase_strategy_deserializes() {
        let strategy: PriorityStrategy = serde_json::from_str(r#"{"kind": "twoPhase"}"#).unwrap();
        assert_eq!(strategy, PriorityStrategy::TwoPhase);
    }

    #[test]
    fn rejects_unknown_priority_student() {
        let mut config = ScenarioConfig::advanced();
        config.advanced.as_mut().unwrap().priority_student = 99;
        assert!(matches!(
            config.validate(&sample_input()),
            Err(AllocationError::InvalidConfig(_))
        ));
    }

    #[test]
    fn rejects_degenerate_exclusive_pair() {
        let mut config = ScenarioConfig::advanced();
        config.advanced.as_mut().unwrap().exclusive_pair =
            ("Logic".to_string(), "Logic".to_string());
        assert!(config.validate(&sample_input()).is_err());
    }

    #[test]
    fn time_limit_must_fit_a_duration() {
        let input = sample_input();
        for secs in [-1.0, 0.0, 1e30, f64::NAN, f64::INFINITY] {
            let mut config = ScenarioConfig::base();
            config.time_limit_secs = Some(secs);
            assert!(
                matches!(config.time_limit(), Err(AllocationError::InvalidConfig(_))),
                "{} seconds should be rejected",
                secs
            );
            assert!(config.validate(&input).is_err());
        }

        let mut config = ScenarioConfig::base();
        config.time_limit_secs = Some(2.5);
        assert_eq!(config.time_limit().unwrap(), Some(Duration::from_millis(2500)));
        assert!(config.validate(&input).is_ok());
    }

    #[test]
    fn rejects_unreachable_threshold() {
        let mut config = ScenarioConfig::base();
        config.top_two_threshold = 16;
        assert!(config.validate(&sample_input()).is_err());
    }
}
