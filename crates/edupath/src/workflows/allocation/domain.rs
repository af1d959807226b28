use super::catalog::CourseRef;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifier of a student, unique within a roster.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StudentId(pub String);

impl StudentId {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for StudentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for StudentId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Grade {
    A,
    B,
    C,
    D,
    E,
    F,
}

impl Grade {
    pub const fn ordered() -> [Self; 6] {
        [Self::A, Self::B, Self::C, Self::D, Self::E, Self::F]
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::A => "A",
            Self::B => "B",
            Self::C => "C",
            Self::D => "D",
            Self::E => "E",
            Self::F => "F",
        }
    }

    /// Parses a spreadsheet cell. Only the exact upper-case letters are grades;
    /// surrounding whitespace is ignored.
    pub fn parse(token: &str) -> Option<Self> {
        match token.trim() {
            "A" => Some(Self::A),
            "B" => Some(Self::B),
            "C" => Some(Self::C),
            "D" => Some(Self::D),
            "E" => Some(Self::E),
            "F" => Some(Self::F),
            _ => None,
        }
    }
}

/// A single subject cell as it appeared in the roster.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubjectGrade {
    pub subject: String,
    pub token: String,
}

impl SubjectGrade {
    pub fn new(subject: impl Into<String>, token: impl Into<String>) -> Self {
        Self {
            subject: subject.into(),
            token: token.into(),
        }
    }

    pub fn grade(&self) -> Option<Grade> {
        Grade::parse(&self.token)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StudentRecord {
    pub id: StudentId,
    pub name: String,
    pub grades: Vec<SubjectGrade>,
}

impl StudentRecord {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: StudentId(id.into()),
            name: name.into(),
            grades: Vec::new(),
        }
    }

    pub fn with_grade(mut self, subject: impl Into<String>, token: impl Into<String>) -> Self {
        self.grades.push(SubjectGrade::new(subject, token));
        self
    }
}

/// A forced placement, as entered by an administrator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Placement {
    pub university: String,
    pub course: String,
}

/// Structured reason behind an allocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum AllocationDecision {
    ManualOverride,
    Matched { score: u32, min_score: u32 },
    Unallocated { score: u32 },
}

impl AllocationDecision {
    pub fn reasoning(&self) -> String {
        match self {
            AllocationDecision::ManualOverride => "Manual override applied".to_string(),
            AllocationDecision::Matched { score, min_score } => {
                format!("Total score {score} meets minimum {min_score}")
            }
            AllocationDecision::Unallocated { .. } => "No suitable course found".to_string(),
        }
    }

    pub const fn label(&self) -> &'static str {
        match self {
            AllocationDecision::ManualOverride => "Override",
            AllocationDecision::Matched { .. } => "Allocated",
            AllocationDecision::Unallocated { .. } => "Unallocated",
        }
    }

    pub const fn score(&self) -> Option<u32> {
        match self {
            AllocationDecision::ManualOverride => None,
            AllocationDecision::Matched { score, .. } | AllocationDecision::Unallocated { score } => {
                Some(*score)
            }
        }
    }
}

/// One row of allocation output. University and course are empty when nothing qualified.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AllocationResult {
    pub student_id: StudentId,
    pub name: String,
    pub university: String,
    pub course: String,
    pub reasoning: String,
    pub decision: AllocationDecision,
    /// (university, course) index of a computed placement within the catalog.
    #[serde(skip)]
    pub(crate) catalog_position: Option<(usize, usize)>,
}

impl AllocationResult {
    pub(crate) fn overridden(record: &StudentRecord, placement: &Placement) -> Self {
        Self::from_decision(
            record,
            placement.university.clone(),
            placement.course.clone(),
            AllocationDecision::ManualOverride,
        )
    }

    pub(crate) fn matched(record: &StudentRecord, best: &CourseRef<'_>, score: u32) -> Self {
        let mut result = Self::from_decision(
            record,
            best.university.name.clone(),
            best.course.name.clone(),
            AllocationDecision::Matched {
                score,
                min_score: best.course.min_score,
            },
        );
        result.catalog_position = Some(best.position);
        result
    }

    pub(crate) fn unallocated(record: &StudentRecord, score: u32) -> Self {
        Self::from_decision(
            record,
            String::new(),
            String::new(),
            AllocationDecision::Unallocated { score },
        )
    }

    fn from_decision(
        record: &StudentRecord,
        university: String,
        course: String,
        decision: AllocationDecision,
    ) -> Self {
        Self {
            student_id: record.id.clone(),
            name: record.name.clone(),
            university,
            course,
            reasoning: decision.reasoning(),
            decision,
            catalog_position: None,
        }
    }

    pub fn is_allocated(&self) -> bool {
        !matches!(self.decision, AllocationDecision::Unallocated { .. })
    }
}
