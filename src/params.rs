use crate::data::{AllocationInput, CourseId, StudentId};
use std::collections::{HashMap, HashSet};

/// Points a preference of rank `r` is worth before weighting: `SATISFACTION_BASE - r`.
pub const SATISFACTION_BASE: u32 = 6;

/// Parameters derived once per solve from the raw preference and credit data.
#[derive(Debug, Clone, PartialEq)]
pub struct ModelParameters {
    /// 1-based position of a course in a student's preference list.
    pub ranks: HashMap<(StudentId, CourseId), u32>,
    pub top_two: HashMap<StudentId, HashSet<CourseId>>,
    /// credit / 10
    pub weights: HashMap<CourseId, f64>,
}

impl ModelParameters {
    /// Satisfaction contributed by assigning `course` to `student`, or `None` when the
    /// course is not on the student's list.
    pub fn satisfaction(&self, student: StudentId, course: &CourseId) -> Option<f64> {
        let rank = self.ranks.get(&(student, course.clone()))?;
        Some(self.weights.get(course)? * f64::from(SATISFACTION_BASE - rank))
    }
}

/// Derives ranks, top-2 sets and weights. Students without a preference list get
/// no entries; run `validate_input` first to reject such data.
pub fn derive_parameters(input: &AllocationInput) -> ModelParameters {
    let mut ranks = HashMap::new();
    let mut top_two = HashMap::new();
    for student in &input.students {
        let Some(prefs) = input.preferences.get(student) else {
            continue;
        };
        for (position, course) in prefs.iter().enumerate() {
            ranks.insert((*student, course.clone()), position as u32 + 1);
        }
        top_two.insert(*student, prefs.iter().take(2).cloned().collect());
    }

    let weights = input
        .credits
        .iter()
        .map(|(course, credit)| (course.clone(), f64::from(*credit) / 10.0))
        .collect();

    ModelParameters {
        ranks,
        top_two,
        weights,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::sample_input;

    #[test]
    fn ranks_follow_list_order() {
        let params = derive_parameters(&sample_input());
        assert_eq!(params.ranks[&(8, "Econometrics".to_string())], 1);
        assert_eq!(params.ranks[&(8, "Programming".to_string())], 5);
        assert!(!params.ranks.contains_key(&(8, "Algebra".to_string())));
        assert_eq!(params.ranks.len(), 15 * 5);
    }

    #[test]
    fn top_two_is_first_two_entries() {
        let params = derive_parameters(&sample_input());
        let expected: HashSet<CourseId> = ["Statistics", "Analytics"]
            .iter()
            .map(|c| c.to_string())
            .collect();
        assert_eq!(params.top_two[&15], expected);
    }

    #[test]
    fn weights_are_credit_tenths() {
        let params = derive_parameters(&sample_input());
        assert_eq!(params.weights["Programming"], 2.0);
        assert_eq!(params.weights["Algebra"], 1.0);
    }

    #[test]
    fn satisfaction_uses_rank_and_weight() {
        let params = derive_parameters(&sample_input());
        // Programming is rank 3 for student 1 and weighs 2.0
        assert_eq!(params.satisfaction(1, &"Programming".to_string()), Some(6.0));
        assert_eq!(params.satisfaction(1, &"Algebra".to_string()), None);
    }

    #[test]
    fn missing_preference_list_is_skipped() {
        let mut input = sample_input();
        input.preferences.remove(&4);
        let params = derive_parameters(&input);
        assert!(!params.top_two.contains_key(&4));
        assert_eq!(params.ranks.len(), 14 * 5);
    }

    #[test]
    fn derivation_is_idempotent() {
        let input = sample_input();
        assert_eq!(derive_parameters(&input), derive_parameters(&input));
    }
}
