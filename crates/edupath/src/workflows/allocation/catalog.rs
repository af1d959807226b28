use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::io::Read;
use std::path::Path;
use tracing::{debug, warn};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Course {
    pub name: String,
    pub min_score: u32,
}

impl Course {
    pub fn new(name: impl Into<String>, min_score: u32) -> Self {
        Self {
            name: name.into(),
            min_score,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct University {
    pub name: String,
    pub courses: Vec<Course>,
}

impl University {
    pub fn new(name: impl Into<String>, courses: Vec<Course>) -> Self {
        Self {
            name: name.into(),
            courses,
        }
    }
}

/// A course together with its owning university and catalog position.
#[derive(Debug, Clone, Copy)]
pub struct CourseRef<'a> {
    pub university: &'a University,
    pub course: &'a Course,
    pub position: (usize, usize),
}

/// Ordered list of universities. Iteration order is the allocation tie-break order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct Catalog {
    universities: Vec<University>,
}

#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    #[error("failed to read catalog: {0}")]
    Io(#[from] std::io::Error),
    #[error("malformed catalog document: {0}")]
    Malformed(#[from] serde_json::Error),
}

#[derive(Debug, Deserialize)]
struct RawUniversity {
    name: String,
    courses: Vec<RawCourse>,
}

#[derive(Debug, Deserialize)]
struct RawCourse {
    name: String,
    #[serde(default)]
    min_score: Option<Value>,
}

impl Catalog {
    pub fn new(universities: Vec<University>) -> Self {
        Self { universities }
    }

    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self, CatalogError> {
        let file = std::fs::File::open(path)?;
        Self::from_reader(file)
    }

    pub fn from_reader<R: Read>(reader: R) -> Result<Self, CatalogError> {
        let raw: Vec<RawUniversity> = serde_json::from_reader(reader)?;
        Ok(Self::from_raw(raw))
    }

    pub fn from_json_str(document: &str) -> Result<Self, CatalogError> {
        let raw: Vec<RawUniversity> = serde_json::from_str(document)?;
        Ok(Self::from_raw(raw))
    }

    fn from_raw(raw: Vec<RawUniversity>) -> Self {
        let universities = raw
            .into_iter()
            .map(|university| {
                let courses = university
                    .courses
                    .into_iter()
                    .map(|course| {
                        let min_score =
                            resolve_min_score(&university.name, &course.name, course.min_score);
                        Course {
                            name: course.name,
                            min_score,
                        }
                    })
                    .collect();
                University {
                    name: university.name,
                    courses,
                }
            })
            .collect();

        Self { universities }
    }

    pub fn universities(&self) -> &[University] {
        &self.universities
    }

    pub fn is_empty(&self) -> bool {
        self.universities
            .iter()
            .all(|university| university.courses.is_empty())
    }

    pub fn course_count(&self) -> usize {
        self.universities
            .iter()
            .map(|university| university.courses.len())
            .sum()
    }

    /// Every course in catalog order: universities first, then courses within each.
    pub fn courses(&self) -> impl Iterator<Item = CourseRef<'_>> {
        self.universities
            .iter()
            .enumerate()
            .flat_map(|(uni_idx, university)| {
                university
                    .courses
                    .iter()
                    .enumerate()
                    .map(move |(course_idx, course)| CourseRef {
                        university,
                        course,
                        position: (uni_idx, course_idx),
                    })
            })
    }
}

/// Missing thresholds admit everyone; malformed ones do too, but are logged loudly.
fn resolve_min_score(university: &str, course: &str, raw: Option<Value>) -> u32 {
    let value = match raw {
        None | Some(Value::Null) => {
            debug!(university, course, "course has no min_score; defaulting to 0");
            return 0;
        }
        Some(value) => value,
    };

    let parsed = match &value {
        Value::Number(number) => number
            .as_u64()
            .or_else(|| {
                number
                    .as_f64()
                    .filter(|float| *float >= 0.0 && float.fract() == 0.0)
                    .map(|float| float as u64)
            })
            .and_then(|whole| u32::try_from(whole).ok()),
        _ => None,
    };

    match parsed {
        Some(min_score) => min_score,
        None => {
            warn!(
                university,
                course,
                raw = %value,
                "malformed min_score; course will accept any score"
            );
            0
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_universities_and_courses_in_order() {
        let catalog = Catalog::from_json_str(
            r#"[
                {"name": "UniA", "courses": [{"name": "CourseX", "min_score": 5}]},
                {"name": "UniB", "courses": [
                    {"name": "CourseY", "min_score": 9},
                    {"name": "CourseZ", "min_score": 3}
                ]}
            ]"#,
        )
        .expect("catalog parses");

        let names: Vec<_> = catalog
            .courses()
            .map(|entry| (entry.university.name.as_str(), entry.course.name.as_str()))
            .collect();
        assert_eq!(
            names,
            vec![
                ("UniA", "CourseX"),
                ("UniB", "CourseY"),
                ("UniB", "CourseZ")
            ]
        );
        assert_eq!(catalog.course_count(), 3);
        assert_eq!(catalog.courses().nth(2).expect("third").position, (1, 1));
    }

    #[test]
    fn missing_or_malformed_min_score_defaults_to_zero() {
        let catalog = Catalog::from_json_str(
            r#"[{"name": "UniA", "courses": [
                {"name": "Open"},
                {"name": "Null", "min_score": null},
                {"name": "Text", "min_score": "high"},
                {"name": "Negative", "min_score": -4},
                {"name": "Fraction", "min_score": 7.5},
                {"name": "Whole", "min_score": 12.0}
            ]}]"#,
        )
        .expect("catalog parses");

        let scores: Vec<_> = catalog
            .courses()
            .map(|entry| entry.course.min_score)
            .collect();
        assert_eq!(scores, vec![0, 0, 0, 0, 0, 12]);
    }

    #[test]
    fn structural_errors_fail_the_load() {
        let not_a_list = Catalog::from_json_str(r#"{"name": "UniA"}"#);
        assert!(matches!(not_a_list, Err(CatalogError::Malformed(_))));

        let nameless = Catalog::from_json_str(r#"[{"courses": []}]"#);
        assert!(matches!(nameless, Err(CatalogError::Malformed(_))));

        let bad_courses = Catalog::from_json_str(r#"[{"name": "UniA", "courses": 4}]"#);
        assert!(matches!(bad_courses, Err(CatalogError::Malformed(_))));
    }

    #[test]
    fn missing_file_is_an_io_error() {
        let error = Catalog::from_path("./does-not-exist.json").expect_err("io error");
        assert!(matches!(error, CatalogError::Io(_)));
    }

    #[test]
    fn empty_catalog_has_no_courses() {
        let catalog = Catalog::from_json_str("[]").expect("empty list parses");
        assert!(catalog.is_empty());
        let hollow = Catalog::new(vec![University::new("UniA", Vec::new())]);
        assert!(hollow.is_empty());
    }
}
