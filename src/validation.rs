//! Fail-fast integrity checks run before any model is built.
//!
//! Capacities and credits are `u32`, so negative values are already rejected when
//! the input is deserialized; the checks here cover the relations between the maps.

use crate::data::{AllocationInput, CourseId, PREFERENCE_COUNT};
use crate::error::{AllocationError, Result};
use itertools::Itertools;
use std::collections::HashSet;

pub fn validate_input(input: &AllocationInput) -> Result<()> {
    if !input.courses.iter().all_unique() {
        return Err(integrity(format!(
            "duplicate course ids: {:?}",
            input.courses.iter().duplicates().collect_vec()
        )));
    }
    if !input.students.iter().all_unique() {
        return Err(integrity(format!(
            "duplicate student ids: {:?}",
            input.students.iter().duplicates().collect_vec()
        )));
    }

    let courses: Vec<&CourseId> = input.courses.iter().sorted().collect();
    if courses != input.credits.keys().sorted().collect_vec() {
        return Err(integrity("course names and credits do not match"));
    }
    if courses != input.capacities.keys().sorted().collect_vec() {
        return Err(integrity("course names and capacities do not match"));
    }

    let students: HashSet<_> = input.students.iter().collect();
    let with_preferences: HashSet<_> = input.preferences.keys().collect();
    if students != with_preferences {
        return Err(integrity("preference entries must exist for every student, and only for them"));
    }

    let known: HashSet<&CourseId> = input.courses.iter().collect();
    for student in &input.students {
        let prefs = &input.preferences[student];
        if prefs.len() != PREFERENCE_COUNT {
            return Err(integrity(format!(
                "student {} lists {} preferences, expected exactly {}",
                student,
                prefs.len(),
                PREFERENCE_COUNT
            )));
        }
        if !prefs.iter().all_unique() {
            return Err(integrity(format!(
                "student {} repeats a course in their preferences",
                student
            )));
        }
        if let Some(unknown) = prefs.iter().find(|c| !known.contains(c)) {
            return Err(integrity(format!(
                "student {} prefers undefined course {:?}",
                student, unknown
            )));
        }
    }

    Ok(())
}

fn integrity(message: impl Into<String>) -> AllocationError {
    AllocationError::DataIntegrity(message.into())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::sample_input;

    fn assert_integrity_error(input: &AllocationInput, fragment: &str) {
        match validate_input(input) {
            Err(AllocationError::DataIntegrity(message)) => assert!(
                message.contains(fragment),
                "message {:?} should mention {:?}",
                message,
                fragment
            ),
            other => panic!("expected a data integrity error, got {:?}", other),
        }
    }

    #[test]
    fn sample_input_is_valid() {
        assert!(validate_input(&sample_input()).is_ok());
    }

    #[test]
    fn rejects_short_preference_list() {
        let mut input = sample_input();
        input.preferences.get_mut(&3).unwrap().pop();
        assert_integrity_error(&input, "lists 4 preferences");
    }

    #[test]
    fn rejects_repeated_preference() {
        let mut input = sample_input();
        input.preferences.get_mut(&1).unwrap()[4] = "Analytics".to_string();
        assert_integrity_error(&input, "repeats a course");
    }

    #[test]
    fn rejects_unknown_course_in_preferences() {
        let mut input = sample_input();
        input.preferences.get_mut(&2).unwrap()[0] = "Astrology".to_string();
        assert_integrity_error(&input, "Astrology");
    }

    #[test]
    fn rejects_mismatched_credit_table() {
        let mut input = sample_input();
        input.credits.remove("Logic");
        assert_integrity_error(&input, "credits");
    }

    #[test]
    fn rejects_mismatched_capacity_table() {
        let mut input = sample_input();
        input.capacities.insert("Geometry".to_string(), 3);
        assert_integrity_error(&input, "capacities");
    }

    #[test]
    fn rejects_student_without_preferences() {
        let mut input = sample_input();
        input.students.push(16);
        assert_integrity_error(&input, "every student");
    }

    #[test]
    fn rejects_duplicate_courses() {
        let mut input = sample_input();
        input.courses.push("Logic".to_string());
        assert_integrity_error(&input, "duplicate course");
    }
}
