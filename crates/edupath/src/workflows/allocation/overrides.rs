use super::domain::{Placement, StudentId};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::io::Read;
use std::path::Path;

/// Administrator request forcing a student into a specific course.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OverrideEntry {
    pub student_id: StudentId,
    pub university: String,
    pub course: String,
}

impl OverrideEntry {
    pub fn new(
        student_id: impl Into<String>,
        university: impl Into<String>,
        course: impl Into<String>,
    ) -> Self {
        Self {
            student_id: StudentId(student_id.into()),
            university: university.into(),
            course: course.into(),
        }
    }

    pub fn placement(&self) -> Placement {
        Placement {
            university: self.university.clone(),
            course: self.course.clone(),
        }
    }
}

/// Point-in-time view of all overrides handed to the engine for a single run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OverrideTable {
    entries: BTreeMap<StudentId, Placement>,
}

impl OverrideTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Later entries for the same student replace earlier ones.
    pub fn insert(&mut self, entry: OverrideEntry) {
        let placement = entry.placement();
        self.entries.insert(entry.student_id, placement);
    }

    pub fn get(&self, student_id: &StudentId) -> Option<&Placement> {
        self.entries.get(student_id)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn entries(&self) -> Vec<OverrideEntry> {
        self.entries
            .iter()
            .map(|(student_id, placement)| OverrideEntry {
                student_id: student_id.clone(),
                university: placement.university.clone(),
                course: placement.course.clone(),
            })
            .collect()
    }

    /// Reads `student_id,university,course` rows, as kept by administrators between runs.
    pub fn from_csv_path<P: AsRef<Path>>(path: P) -> Result<Self, OverrideImportError> {
        let file = std::fs::File::open(path)?;
        Self::from_csv_reader(file)
    }

    pub fn from_csv_reader<R: Read>(reader: R) -> Result<Self, OverrideImportError> {
        let mut csv_reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .from_reader(reader);
        let mut table = Self::new();

        for row in csv_reader.deserialize::<OverrideEntry>() {
            table.insert(row?);
        }

        Ok(table)
    }
}

impl FromIterator<OverrideEntry> for OverrideTable {
    fn from_iter<T: IntoIterator<Item = OverrideEntry>>(iter: T) -> Self {
        let mut table = Self::new();
        for entry in iter {
            table.insert(entry);
        }
        table
    }
}

/// Shared override storage. Implementations must hand out consistent snapshots.
pub trait OverrideRepository: Send + Sync {
    fn record(&self, entry: OverrideEntry) -> Result<(), OverrideStoreError>;
    fn snapshot(&self) -> Result<OverrideTable, OverrideStoreError>;
}

#[derive(Debug, thiserror::Error)]
pub enum OverrideStoreError {
    #[error("override store unavailable: {0}")]
    Unavailable(String),
}

#[derive(Debug, thiserror::Error)]
pub enum OverrideImportError {
    #[error("failed to read overrides: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid override CSV data: {0}")]
    Csv(#[from] csv::Error),
}
