use super::domain::{Grade, StudentRecord};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::debug;

/// Grade-to-points table used when summing a student's subjects.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GradeScale {
    points: BTreeMap<Grade, u32>,
}

impl GradeScale {
    /// A=5 down to F=0.
    pub fn standard() -> Self {
        let points = Grade::ordered()
            .into_iter()
            .zip((0..=5).rev())
            .collect::<BTreeMap<_, _>>();
        Self { points }
    }

    pub fn new(points: BTreeMap<Grade, u32>) -> Self {
        Self { points }
    }

    /// Points for a grade, or `None` when this scale does not rate it.
    pub fn points(&self, grade: Grade) -> Option<u32> {
        self.points.get(&grade).copied()
    }
}

impl Default for GradeScale {
    fn default() -> Self {
        Self::standard()
    }
}

/// Contribution of one subject to the total, kept for report audits.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubjectScore {
    pub subject: String,
    pub token: String,
    pub points: u32,
    pub recognized: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScoreBreakdown {
    pub total: u32,
    pub components: Vec<SubjectScore>,
}

impl ScoreBreakdown {
    pub fn unrecognized(&self) -> impl Iterator<Item = &SubjectScore> {
        self.components.iter().filter(|component| !component.recognized)
    }
}

/// Sum of grade points across the record's subjects; unknown tokens count as zero.
pub fn score(record: &StudentRecord, scale: &GradeScale) -> u32 {
    breakdown(record, scale).total
}

/// Per-subject points behind [`score`]. Tokens that are not a grade on the scale count as
/// zero, are flagged `recognized = false`, and are logged.
pub fn breakdown(record: &StudentRecord, scale: &GradeScale) -> ScoreBreakdown {
    let detail = tally(record, scale);
    for component in detail.unrecognized() {
        debug!(
            student_id = %record.id,
            subject = %component.subject,
            token = %component.token,
            "unrecognized grade scored as zero"
        );
    }
    detail
}

/// Same as [`breakdown`] without logging; used when re-rendering an existing run.
pub(crate) fn tally(record: &StudentRecord, scale: &GradeScale) -> ScoreBreakdown {
    let components: Vec<SubjectScore> = record
        .grades
        .iter()
        .map(|entry| {
            let points = entry.grade().and_then(|grade| scale.points(grade));
            SubjectScore {
                subject: entry.subject.clone(),
                token: entry.token.clone(),
                points: points.unwrap_or(0),
                recognized: points.is_some(),
            }
        })
        .collect();
    let total = components.iter().map(|component| component.points).sum();

    ScoreBreakdown { total, components }
}
