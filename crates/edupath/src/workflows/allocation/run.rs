use super::domain::{AllocationResult, StudentId, StudentRecord};
use super::scoring::{self, GradeScale, ScoreBreakdown};
use crate::workflows::roster::Roster;
use chrono::{DateTime, Utc};
use serde::Serialize;

/// Output of one allocation pass: the roster it ran over and a result per student.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AllocationRun {
    pub generated_at: DateTime<Utc>,
    pub roster: Roster,
    pub results: Vec<AllocationResult>,
    #[serde(skip)]
    scale: GradeScale,
}

impl AllocationRun {
    pub fn new(roster: Roster, results: Vec<AllocationResult>, generated_at: DateTime<Utc>) -> Self {
        debug_assert_eq!(roster.len(), results.len());
        Self {
            generated_at,
            roster,
            results,
            scale: GradeScale::standard(),
        }
    }

    /// Scale the run was scored with; defaults to the standard scale.
    pub fn with_scale(mut self, scale: GradeScale) -> Self {
        self.scale = scale;
        self
    }

    /// Pairs each student with their result, in roster order.
    pub fn entries(&self) -> impl Iterator<Item = (&StudentRecord, &AllocationResult)> {
        self.roster.students().iter().zip(self.results.iter())
    }

    pub fn find(&self, student_id: &StudentId) -> Option<(&StudentRecord, &AllocationResult)> {
        self.entries()
            .find(|(record, _)| &record.id == student_id)
    }

    /// Per-subject points for a student of this run.
    pub fn breakdown(&self, record: &StudentRecord) -> ScoreBreakdown {
        scoring::tally(record, &self.scale)
    }
}
