use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

// Type aliases for clarity
pub type StudentId = u32;
pub type CourseId = String;

/// Number of ranked entries every student submits.
pub const PREFERENCE_COUNT: usize = 5;

/// The complete input for the allocation problem.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AllocationInput {
    pub students: Vec<StudentId>,
    pub courses: Vec<CourseId>,
    pub capacities: HashMap<CourseId, u32>,
    pub credits: HashMap<CourseId, u32>,
    /// Ordered preference list per student, most preferred first.
    pub preferences: HashMap<StudentId, Vec<CourseId>>,
}

/// Decoded allocation of a single student.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StudentAllocation {
    pub student: StudentId,
    pub courses: Vec<CourseId>,
    pub satisfaction: f64,
    pub credits: u32,
    pub has_top_two: bool,
}

/// Extra seats granted to a course.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CapacityIncrease {
    pub course: CourseId,
    pub seats: u32,
}

/// Objective decomposed into its aggregate and prioritized-student terms.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ObjectiveBreakdown {
    pub total_satisfaction: f64,
    pub priority_student: StudentId,
    pub priority_satisfaction: f64,
    /// `None` when the priority was enforced by a two-phase solve.
    pub priority_weight: Option<f64>,
}

impl ObjectiveBreakdown {
    /// Objective value implied by the decoded assignment.
    pub fn recomputed_objective(&self) -> f64 {
        match self.priority_weight {
            Some(weight) => weight * self.priority_satisfaction + self.total_satisfaction,
            None => self.total_satisfaction,
        }
    }
}

/// The final output of one solve.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AllocationReport {
    pub scenario: String,
    pub objective_value: f64,
    pub students: Vec<StudentAllocation>,
    pub capacity_increases: Vec<CapacityIncrease>,
    pub breakdown: Option<ObjectiveBreakdown>,
}

impl AllocationReport {
    pub fn student(&self, id: StudentId) -> Option<&StudentAllocation> {
        self.students.iter().find(|s| s.student == id)
    }

    pub fn top_two_count(&self) -> usize {
        self.students.iter().filter(|s| s.has_top_two).count()
    }
}

impl fmt::Display for StudentAllocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Student {:2}: [{}] (Sat: {}, Credits: {})",
            self.student,
            self.courses.join(", "),
            self.satisfaction,
            self.credits
        )
    }
}

impl fmt::Display for AllocationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "--- {} ---", self.scenario)?;
        writeln!(f, "Optimal Objective Value: {}", self.objective_value)?;
        writeln!(f)?;
        writeln!(f, "Student Assignments:")?;
        for student in &self.students {
            writeln!(f, "  {}", student)?;
        }
        if let Some(breakdown) = &self.breakdown {
            writeln!(f)?;
            writeln!(f, "Capacity Increases (n_j):")?;
            for increase in &self.capacity_increases {
                writeln!(f, "  {}: +{}", increase.course, increase.seats)?;
            }
            writeln!(f)?;
            writeln!(f, "Breakdown:")?;
            writeln!(f, "  Total Satisfaction Score: {}", breakdown.total_satisfaction)?;
            writeln!(
                f,
                "  Student {} Satisfaction:   {}",
                breakdown.priority_student, breakdown.priority_satisfaction
            )?;
        }
        Ok(())
    }
}

/// The 15-student, 8-course catalog used by the bundled scenarios.
pub fn sample_input() -> AllocationInput {
    let courses = [
        ("Algebra", 6, 10),
        ("Programming", 6, 20),
        ("Statistics", 6, 10),
        ("Econometrics", 5, 10),
        ("Visualisation", 6, 10),
        ("Logic", 5, 20),
        ("Analytics", 6, 10),
        ("Calculus", 5, 20),
    ];
    let preferences: [(StudentId, [&str; PREFERENCE_COUNT]); 15] = [
        (1, ["Analytics", "Statistics", "Programming", "Logic", "Calculus"]),
        (2, ["Econometrics", "Statistics", "Calculus", "Analytics", "Logic"]),
        (3, ["Econometrics", "Analytics", "Logic", "Algebra", "Programming"]),
        (4, ["Analytics", "Statistics", "Visualisation", "Econometrics", "Algebra"]),
        (5, ["Analytics", "Statistics", "Algebra", "Econometrics", "Visualisation"]),
        (6, ["Statistics", "Econometrics", "Visualisation", "Logic", "Algebra"]),
        (7, ["Econometrics", "Analytics", "Visualisation", "Programming", "Algebra"]),
        (8, ["Econometrics", "Analytics", "Statistics", "Visualisation", "Programming"]),
        (9, ["Analytics", "Statistics", "Econometrics", "Visualisation", "Programming"]),
        (10, ["Analytics", "Econometrics", "Algebra", "Programming", "Visualisation"]),
        (11, ["Econometrics", "Statistics", "Algebra", "Visualisation", "Analytics"]),
        (12, ["Econometrics", "Analytics", "Algebra", "Visualisation", "Statistics"]),
        (13, ["Analytics", "Econometrics", "Visualisation", "Algebra", "Statistics"]),
        (14, ["Econometrics", "Analytics", "Statistics", "Programming", "Visualisation"]),
        (15, ["Statistics", "Analytics", "Programming", "Calculus", "Visualisation"]),
    ];

    AllocationInput {
        students: preferences.iter().map(|(id, _)| *id).collect(),
        courses: courses.iter().map(|(name, _, _)| name.to_string()).collect(),
        capacities: courses
            .iter()
            .map(|(name, capacity, _)| (name.to_string(), *capacity))
            .collect(),
        credits: courses
            .iter()
            .map(|(name, _, credit)| (name.to_string(), *credit))
            .collect(),
        preferences: preferences
            .iter()
            .map(|(id, list)| (*id, list.iter().map(|c| c.to_string()).collect()))
            .collect(),
    }
}
