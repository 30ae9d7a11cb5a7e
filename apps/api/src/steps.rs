//! The fixed wizard step registry.
//!
//! Steps are ordered and closed: navigation clamps to this list, and each
//! step names the record slice it edits. The Review step reads everything.

use serde::Serialize;

#[derive(Debug, Clone, Copy, Serialize)]
pub struct StepDef {
    pub name: &'static str,
    /// The record section this step reads and writes.
    pub slice: &'static str,
}

pub const STEPS: [StepDef; 12] = [
    StepDef {
        name: "Personal Info",
        slice: "personalInfo",
    },
    StepDef {
        name: "Objective",
        slice: "objective",
    },
    StepDef {
        name: "Education",
        slice: "education",
    },
    StepDef {
        name: "Skills",
        slice: "skills",
    },
    StepDef {
        name: "Experience",
        slice: "workExperience",
    },
    StepDef {
        name: "Volunteer",
        slice: "volunteerExperience",
    },
    StepDef {
        name: "Projects",
        slice: "projects",
    },
    StepDef {
        name: "Achievements",
        slice: "achievements",
    },
    StepDef {
        name: "Languages",
        slice: "languages",
    },
    StepDef {
        name: "Hobbies",
        slice: "hobbies",
    },
    StepDef {
        name: "Strengths",
        slice: "strengths",
    },
    StepDef {
        name: "Review",
        slice: "record",
    },
];

pub fn last_step() -> usize {
    STEPS.len() - 1
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_registry_has_twelve_steps_ending_in_review() {
        assert_eq!(STEPS.len(), 12);
        assert_eq!(STEPS[0].name, "Personal Info");
        assert_eq!(STEPS[last_step()].name, "Review");
    }

    #[test]
    fn test_slices_are_unique() {
        let mut slices: Vec<&str> = STEPS.iter().map(|s| s.slice).collect();
        slices.sort_unstable();
        slices.dedup();
        assert_eq!(slices.len(), STEPS.len());
    }
}
