use crate::config::{PriorityStrategy, ScenarioConfig};
use crate::data::{
    AllocationInput, AllocationReport, CapacityIncrease, ObjectiveBreakdown, StudentAllocation,
};
use crate::model::VariableHandles;
use crate::params::ModelParameters;
use crate::solver::SolvedValues;
use log::{info, warn};

/// Relative slack tolerated between the solver's objective and the recomputed one.
const OBJECTIVE_TOLERANCE: f64 = 1e-6;

/// Turns solved variable values back into a per-student allocation.
///
/// Everything in the report is recomputed from the decoded assignment, so it does
/// not depend on how the objective was scaled.
pub fn decode(
    input: &AllocationInput,
    params: &ModelParameters,
    config: &ScenarioConfig,
    handles: &VariableHandles,
    solved: &SolvedValues,
) -> AllocationReport {
    let students: Vec<StudentAllocation> = input
        .students
        .iter()
        .map(|student| {
            // catalog order; pairs without a variable were never assignable
            let courses: Vec<_> = input
                .courses
                .iter()
                .filter(|course| {
                    handles
                        .assignment(*student, course)
                        .is_some_and(|var| solved.is_set(var))
                })
                .cloned()
                .collect();
            let satisfaction = courses
                .iter()
                .filter_map(|course| params.satisfaction(*student, course))
                .sum();
            let credits = courses.iter().map(|course| input.credits[course]).sum();
            let has_top_two = courses
                .iter()
                .any(|course| params.top_two[student].contains(course));
            StudentAllocation {
                student: *student,
                courses,
                satisfaction,
                credits,
                has_top_two,
            }
        })
        .collect();

    let mut capacity_increases = Vec::new();
    let mut breakdown = None;
    if let Some(advanced) = &config.advanced {
        for course in &input.courses {
            let seats = handles
                .extensions
                .get(course)
                .map(|var| solved.value(*var))
                .unwrap_or(0.0);
            if seats > SolvedValues::BOOLEAN_THRESHOLD {
                capacity_increases.push(CapacityIncrease {
                    course: course.clone(),
                    seats: seats.round() as u32,
                });
            }
        }

        let priority_satisfaction = students
            .iter()
            .find(|s| s.student == advanced.priority_student)
            .map(|s| s.satisfaction)
            .unwrap_or(0.0);
        let priority_weight = match advanced.priority {
            PriorityStrategy::Weighted { weight } => Some(weight),
            PriorityStrategy::TwoPhase => None,
        };
        let recomputed = ObjectiveBreakdown {
            total_satisfaction: students.iter().map(|s| s.satisfaction).sum(),
            priority_student: advanced.priority_student,
            priority_satisfaction,
            priority_weight,
        };
        let expected = recomputed.recomputed_objective();
        if (expected - solved.objective).abs() > OBJECTIVE_TOLERANCE * expected.abs().max(1.0) {
            warn!(
                "Recomputed objective {} differs from the solver's {}",
                expected, solved.objective
            );
        }
        breakdown = Some(recomputed);
    }

    let report = AllocationReport {
        scenario: config.name.clone(),
        objective_value: solved.objective,
        students,
        capacity_increases,
        breakdown,
    };
    info!(
        "Decoded allocation: {} of {} students hold a top-2 course.",
        report.top_two_count(),
        report.students.len()
    );
    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::{CourseId, sample_input};
    use crate::model::{ModelBuilder, Objective};
    use crate::params::derive_parameters;
    use assert_float_eq::*;
    use std::collections::HashMap;

    fn course(name: &str) -> CourseId {
        name.to_string()
    }

    fn decode_with(
        config: &ScenarioConfig,
        picks: &[(u32, &str, f64)],
        seats: &[(&str, f64)],
        objective: f64,
    ) -> AllocationReport {
        let input = sample_input();
        let params = derive_parameters(&input);
        let (_, handles) = ModelBuilder::new(&input, &params, config)
            .build(Objective::Aggregate)
            .unwrap();
        let mut values = HashMap::new();
        for (student, name, value) in picks {
            values.insert(handles.assignment(*student, &course(name)).unwrap(), *value);
        }
        for (name, value) in seats {
            values.insert(handles.extensions[*name], *value);
        }
        decode(
            &input,
            &params,
            config,
            &handles,
            &SolvedValues { objective, values },
        )
    }

    #[test]
    fn threshold_rounds_solver_noise() {
        let report = decode_with(
            &ScenarioConfig::base(),
            &[
                (8, "Econometrics", 0.9999997),
                (8, "Analytics", 0.4999),
                (8, "Statistics", 1.0),
            ],
            &[],
            0.0,
        );
        let student = report.student(8).unwrap();
        assert_eq!(student.courses, vec![course("Statistics"), course("Econometrics")]);
        // Econometrics rank 1, Statistics rank 3, both weigh 1.0
        assert_float_absolute_eq!(student.satisfaction, 8.0, 1e-9);
        assert_eq!(student.credits, 20);
        assert!(student.has_top_two);
    }

    #[test]
    fn top_two_flag_comes_from_assignment() {
        let report = decode_with(&ScenarioConfig::base(), &[(1, "Programming", 1.0)], &[], 0.0);
        let student = report.student(1).unwrap();
        assert!(!student.has_top_two);
        assert_float_absolute_eq!(student.satisfaction, 6.0, 1e-9);
        assert_eq!(report.top_two_count(), 0);
    }

    #[test]
    fn base_report_has_no_advanced_sections() {
        let report = decode_with(&ScenarioConfig::base(), &[], &[], 0.0);
        assert!(report.capacity_increases.is_empty());
        assert!(report.breakdown.is_none());
        let text = report.to_string();
        assert!(text.starts_with("--- Base Case ---"));
        assert!(!text.contains("Breakdown"));
    }

    #[test]
    fn advanced_report_lists_increases_and_breakdown() {
        // Student 8 takes Econometrics (5) and Analytics (4); student 1 takes Analytics (5)
        let report = decode_with(
            &ScenarioConfig::advanced(),
            &[
                (8, "Econometrics", 1.0),
                (8, "Analytics", 1.0),
                (1, "Analytics", 1.0),
            ],
            &[("Logic", 1.0000001), ("Calculus", 0.2)],
            1000.0 * 9.0 + 14.0,
        );
        assert_eq!(
            report.capacity_increases,
            vec![CapacityIncrease {
                course: course("Logic"),
                seats: 1
            }]
        );
        let breakdown = report.breakdown.as_ref().unwrap();
        assert_float_absolute_eq!(breakdown.priority_satisfaction, 9.0, 1e-9);
        assert_float_absolute_eq!(breakdown.total_satisfaction, 14.0, 1e-9);
        assert_float_absolute_eq!(breakdown.recomputed_objective(), report.objective_value, 1e-6);

        let text = report.to_string();
        assert!(text.contains("  Logic: +1"));
        assert!(text.contains("  Student 8 Satisfaction:   9"));
        assert!(text.contains("  Total Satisfaction Score: 14"));
    }

    #[test]
    fn two_phase_breakdown_has_no_weight() {
        let mut config = ScenarioConfig::advanced();
        config.advanced.as_mut().unwrap().priority = PriorityStrategy::TwoPhase;
        let report = decode_with(&config, &[(8, "Programming", 1.0)], &[], 2.0);
        let breakdown = report.breakdown.unwrap();
        assert_eq!(breakdown.priority_weight, None);
        assert_float_absolute_eq!(breakdown.recomputed_objective(), 2.0, 1e-9);
    }
}
