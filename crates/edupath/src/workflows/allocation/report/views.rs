use super::super::domain::{AllocationDecision, AllocationResult};
use super::super::scoring::ScoreBreakdown;
use chrono::{DateTime, Utc};
use serde::Serialize;

/// The (student, placement, reasoning) tuple shown in tables.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AllocationRowView {
    pub student_id: String,
    pub name: String,
    pub university: String,
    pub course: String,
    pub reasoning: String,
    pub status_label: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub score: Option<u32>,
    /// Subjects whose cell was not a recognized grade and so scored zero.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub unrecognized_grades: Vec<String>,
}

impl AllocationRowView {
    pub fn new(result: &AllocationResult, breakdown: &ScoreBreakdown) -> Self {
        Self {
            student_id: result.student_id.0.clone(),
            name: result.name.clone(),
            university: result.university.clone(),
            course: result.course.clone(),
            reasoning: result.reasoning.clone(),
            status_label: result.decision.label(),
            score: result.decision.score(),
            unrecognized_grades: breakdown
                .unrecognized()
                .map(|component| component.subject.clone())
                .collect(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CourseLoadEntry {
    pub course: String,
    pub students: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UniversityLoadEntry {
    pub university: String,
    pub students: usize,
    pub courses: Vec<CourseLoadEntry>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AllocationSummary {
    pub total_students: usize,
    pub allocated: usize,
    pub unallocated: usize,
    pub overridden: usize,
    pub university_load: Vec<UniversityLoadEntry>,
}

impl AllocationSummary {
    pub(crate) fn count(results: &[AllocationResult]) -> (usize, usize, usize) {
        results
            .iter()
            .fold((0, 0, 0), |(allocated, unallocated, overridden), result| {
                match result.decision {
                    AllocationDecision::ManualOverride => (allocated + 1, unallocated, overridden + 1),
                    AllocationDecision::Matched { .. } => (allocated + 1, unallocated, overridden),
                    AllocationDecision::Unallocated { .. } => {
                        (allocated, unallocated + 1, overridden)
                    }
                }
            })
    }
}

/// JSON payload returned by the allocation endpoints.
#[derive(Debug, Clone, Serialize)]
pub struct AllocationRunView {
    pub generated_at: DateTime<Utc>,
    pub subjects: Vec<String>,
    pub summary: AllocationSummary,
    pub allocations: Vec<AllocationRowView>,
}
