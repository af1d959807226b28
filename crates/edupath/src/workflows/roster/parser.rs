use super::normalizer::{clean_header, column_key};
use super::{RosterImportError, RosterSchema, SubjectColumns};
use crate::workflows::allocation::domain::{StudentRecord, SubjectGrade};
use std::collections::HashSet;
use std::io::Read;
use tracing::info;

/// Output columns written back by report generation; never treated as subjects.
const REPORT_COLUMNS: [&str; 3] = ["Allocated University", "Allocated Course", "Reasoning"];

#[derive(Debug)]
pub(crate) struct ColumnLayout {
    pub(crate) id: usize,
    pub(crate) name: usize,
    pub(crate) subjects: Vec<(usize, String)>,
}

pub(crate) fn resolve_layout(
    headers: &csv::StringRecord,
    schema: &RosterSchema,
) -> Result<ColumnLayout, RosterImportError> {
    let keys: Vec<String> = headers.iter().map(column_key).collect();
    let find = |column: &str| {
        let wanted = column_key(column);
        keys.iter().position(|key| *key == wanted)
    };

    let id = find(&schema.id_column)
        .ok_or_else(|| RosterImportError::MissingColumn(schema.id_column.clone()))?;
    let name = find(&schema.name_column)
        .ok_or_else(|| RosterImportError::MissingColumn(schema.name_column.clone()))?;

    let subjects = match &schema.subjects {
        SubjectColumns::Declared(declared) => declared
            .iter()
            .map(|subject| {
                find(subject)
                    .map(|idx| (idx, clean_header(&headers[idx])))
                    .ok_or_else(|| RosterImportError::MissingColumn(subject.clone()))
            })
            .collect::<Result<Vec<_>, _>>()?,
        SubjectColumns::Inferred => {
            let reserved: HashSet<String> = REPORT_COLUMNS.iter().map(|c| column_key(c)).collect();
            let inferred: Vec<(usize, String)> = headers
                .iter()
                .enumerate()
                .filter(|(idx, _)| *idx != id && *idx != name)
                .filter(|(idx, _)| !keys[*idx].is_empty() && !reserved.contains(&keys[*idx]))
                .map(|(idx, header)| (idx, clean_header(header)))
                .collect();
            info!(
                subjects = ?inferred.iter().map(|(_, subject)| subject.as_str()).collect::<Vec<_>>(),
                "inferred subject columns from roster headers"
            );
            inferred
        }
    };

    Ok(ColumnLayout { id, name, subjects })
}

pub(crate) fn parse_students<R: Read>(
    reader: R,
    schema: &RosterSchema,
) -> Result<(Vec<String>, Vec<StudentRecord>), RosterImportError> {
    // short rows are accepted; absent cells read as empty and score zero
    let mut csv_reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .flexible(true)
        .from_reader(reader);

    let headers = csv_reader.headers()?.clone();
    let layout = resolve_layout(&headers, schema)?;
    let subjects = layout
        .subjects
        .iter()
        .map(|(_, subject)| subject.clone())
        .collect();

    let mut seen = HashSet::new();
    let mut students = Vec::new();

    for (offset, row) in csv_reader.records().enumerate() {
        let row = row?;
        let line = row
            .position()
            .map(|position| position.line() as usize)
            .unwrap_or(offset + 2);

        if row.iter().all(|cell| cell.is_empty()) {
            continue;
        }

        let id = row.get(layout.id).unwrap_or_default();
        if id.is_empty() {
            return Err(RosterImportError::EmptyStudentId { line });
        }
        if !seen.insert(id.to_string()) {
            return Err(RosterImportError::DuplicateStudent {
                student_id: id.to_string(),
                line,
            });
        }

        let mut record = StudentRecord::new(id, row.get(layout.name).unwrap_or_default());
        record.grades = layout
            .subjects
            .iter()
            .map(|(idx, subject)| {
                SubjectGrade::new(subject.clone(), row.get(*idx).unwrap_or_default())
            })
            .collect();
        students.push(record);
    }

    Ok((subjects, students))
}
