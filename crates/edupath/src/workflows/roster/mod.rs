mod normalizer;
mod parser;

use crate::workflows::allocation::domain::{StudentId, StudentRecord};
use serde::{Deserialize, Serialize};
use std::io::Read;
use std::path::Path;

/// Which roster columns carry grades.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SubjectColumns {
    /// Every column other than identifier, name and report output columns.
    #[default]
    Inferred,
    Declared(Vec<String>),
}

impl SubjectColumns {
    pub fn declared_or_inferred(subjects: Vec<String>) -> Self {
        if subjects.is_empty() {
            Self::Inferred
        } else {
            Self::Declared(subjects)
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RosterSchema {
    pub id_column: String,
    pub name_column: String,
    pub subjects: SubjectColumns,
}

impl Default for RosterSchema {
    fn default() -> Self {
        Self {
            id_column: "Student ID".to_string(),
            name_column: "Name".to_string(),
            subjects: SubjectColumns::Inferred,
        }
    }
}

impl RosterSchema {
    pub fn with_subjects(mut self, subjects: SubjectColumns) -> Self {
        self.subjects = subjects;
        self
    }
}

/// Batch of students loaded from one upload.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Roster {
    subjects: Vec<String>,
    students: Vec<StudentRecord>,
}

impl Roster {
    pub fn new(subjects: Vec<String>, students: Vec<StudentRecord>) -> Self {
        Self { subjects, students }
    }

    pub fn subjects(&self) -> &[String] {
        &self.subjects
    }

    pub fn students(&self) -> &[StudentRecord] {
        &self.students
    }

    pub fn get(&self, id: &StudentId) -> Option<&StudentRecord> {
        self.students.iter().find(|record| &record.id == id)
    }

    pub fn len(&self) -> usize {
        self.students.len()
    }

    pub fn is_empty(&self) -> bool {
        self.students.is_empty()
    }
}

#[derive(Debug)]
pub enum RosterImportError {
    Io(std::io::Error),
    Csv(csv::Error),
    MissingColumn(String),
    EmptyStudentId { line: usize },
    DuplicateStudent { student_id: String, line: usize },
}

impl std::fmt::Display for RosterImportError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RosterImportError::Io(err) => write!(f, "failed to read roster: {}", err),
            RosterImportError::Csv(err) => write!(f, "invalid roster CSV data: {}", err),
            RosterImportError::MissingColumn(column) => {
                write!(f, "roster is missing required column '{}'", column)
            }
            RosterImportError::EmptyStudentId { line } => {
                write!(f, "roster line {} has an empty student identifier", line)
            }
            RosterImportError::DuplicateStudent { student_id, line } => write!(
                f,
                "student '{}' appears more than once (again on line {})",
                student_id, line
            ),
        }
    }
}

impl std::error::Error for RosterImportError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            RosterImportError::Io(err) => Some(err),
            RosterImportError::Csv(err) => Some(err),
            RosterImportError::MissingColumn(_)
            | RosterImportError::EmptyStudentId { .. }
            | RosterImportError::DuplicateStudent { .. } => None,
        }
    }
}

impl From<std::io::Error> for RosterImportError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err)
    }
}

impl From<csv::Error> for RosterImportError {
    fn from(err: csv::Error) -> Self {
        Self::Csv(err)
    }
}

pub struct RosterImporter;

impl RosterImporter {
    pub fn from_path<P: AsRef<Path>>(
        path: P,
        schema: &RosterSchema,
    ) -> Result<Roster, RosterImportError> {
        let file = std::fs::File::open(path)?;
        Self::from_reader(file, schema)
    }

    pub fn from_reader<R: Read>(reader: R, schema: &RosterSchema) -> Result<Roster, RosterImportError> {
        let (subjects, students) = parser::parse_students(reader, schema)?;
        Ok(Roster { subjects, students })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn import(csv: &str, schema: &RosterSchema) -> Result<Roster, RosterImportError> {
        RosterImporter::from_reader(Cursor::new(csv), schema)
    }

    #[test]
    fn column_keys_ignore_bom_whitespace_and_case() {
        let key = normalizer::column_key_for_tests("\u{feff}Student   ID ");
        assert_eq!(key, "student id");
    }

    #[test]
    fn infers_subjects_from_remaining_columns() {
        let csv = "\u{feff}Student ID,Name,Math,English,Reasoning\nS1,Ada,A,B,\nS2,Grace,C,Z,\n";
        let roster = import(csv, &RosterSchema::default()).expect("roster parses");

        assert_eq!(roster.subjects(), ["Math", "English"]);
        assert_eq!(roster.len(), 2);
        let ada = roster.get(&StudentId::from("S1")).expect("ada present");
        assert_eq!(ada.name, "Ada");
        assert_eq!(ada.grades.len(), 2);
        assert_eq!(ada.grades[1].subject, "English");
        assert_eq!(ada.grades[1].token, "B");
    }

    #[test]
    fn short_rows_read_missing_cells_as_empty() {
        let csv = "Student ID,Name,Math,Eng\nS1,Ada,A\nS2,Grace,B,C\n";
        let roster = import(csv, &RosterSchema::default()).expect("short row accepted");

        let ada = roster.get(&StudentId::from("S1")).expect("ada present");
        assert_eq!(ada.grades.len(), 2);
        assert_eq!(ada.grades[1].subject, "Eng");
        assert_eq!(ada.grades[1].token, "");
        assert_eq!(roster.students()[1].grades[1].token, "C");
    }

    #[test]
    fn declared_subjects_limit_the_columns_read() {
        let csv = "Student ID,Name,Math,English,Notes\nS1,Ada,A,B,likes chess\n";
        let schema = RosterSchema::default()
            .with_subjects(SubjectColumns::Declared(vec!["math".to_string()]));
        let roster = import(csv, &schema).expect("roster parses");

        assert_eq!(roster.subjects(), ["Math"]);
        assert_eq!(roster.students()[0].grades.len(), 1);
    }

    #[test]
    fn missing_declared_subject_is_an_error() {
        let csv = "Student ID,Name,Math\nS1,Ada,A\n";
        let schema = RosterSchema::default()
            .with_subjects(SubjectColumns::Declared(vec!["Biology".to_string()]));
        match import(csv, &schema) {
            Err(RosterImportError::MissingColumn(column)) => assert_eq!(column, "Biology"),
            other => panic!("expected missing column, got {other:?}"),
        }
    }

    #[test]
    fn missing_identifier_column_is_an_error() {
        let csv = "ID,Name,Math\nS1,Ada,A\n";
        match import(csv, &RosterSchema::default()) {
            Err(RosterImportError::MissingColumn(column)) => assert_eq!(column, "Student ID"),
            other => panic!("expected missing column, got {other:?}"),
        }
    }

    #[test]
    fn duplicate_student_ids_are_rejected() {
        let csv = "Student ID,Name,Math\nS1,Ada,A\nS1,Ada Again,B\n";
        match import(csv, &RosterSchema::default()) {
            Err(RosterImportError::DuplicateStudent { student_id, line }) => {
                assert_eq!(student_id, "S1");
                assert_eq!(line, 3);
            }
            other => panic!("expected duplicate student, got {other:?}"),
        }
    }

    #[test]
    fn blank_rows_are_skipped_but_blank_ids_are_not() {
        let csv = "Student ID,Name,Math\nS1,Ada,A\n,,\nS2,Grace,B\n";
        let roster = import(csv, &RosterSchema::default()).expect("blank row skipped");
        assert_eq!(roster.len(), 2);

        let csv = "Student ID,Name,Math\n,Nobody,A\n";
        match import(csv, &RosterSchema::default()) {
            Err(RosterImportError::EmptyStudentId { line }) => assert_eq!(line, 2),
            other => panic!("expected empty id, got {other:?}"),
        }
    }

    #[test]
    fn from_path_propagates_io_errors() {
        let error = RosterImporter::from_path("./does-not-exist.csv", &RosterSchema::default())
            .expect_err("expected io error");
        match error {
            RosterImportError::Io(_) => {}
            other => panic!("expected io error, got {other:?}"),
        }
    }
}
