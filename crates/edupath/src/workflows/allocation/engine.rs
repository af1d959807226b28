use super::catalog::{Catalog, CourseRef};
use super::domain::{AllocationResult, StudentRecord};
use super::overrides::OverrideTable;
use super::scoring::{self, GradeScale};
use tracing::{debug, instrument};

/// Stateless allocator applying the grade scale to a roster against a catalog.
#[derive(Debug, Clone, Default)]
pub struct AllocationEngine {
    scale: GradeScale,
}

impl AllocationEngine {
    pub fn new(scale: GradeScale) -> Self {
        Self { scale }
    }

    pub fn scale(&self) -> &GradeScale {
        &self.scale
    }

    /// One result per student, in roster order.
    #[instrument(skip_all, fields(students = students.len(), courses = catalog.course_count(), overrides = overrides.len()))]
    pub fn allocate(
        &self,
        students: &[StudentRecord],
        catalog: &Catalog,
        overrides: &OverrideTable,
    ) -> Vec<AllocationResult> {
        students
            .iter()
            .map(|record| self.allocate_student(record, catalog, overrides))
            .collect()
    }

    pub fn allocate_student(
        &self,
        record: &StudentRecord,
        catalog: &Catalog,
        overrides: &OverrideTable,
    ) -> AllocationResult {
        if let Some(placement) = overrides.get(&record.id) {
            debug!(student_id = %record.id, "manual override applied");
            return AllocationResult::overridden(record, placement);
        }

        let score = scoring::score(record, &self.scale);
        match select_best_fit(catalog, score) {
            Some(best) => {
                debug!(
                    student_id = %record.id,
                    score,
                    university = %best.university.name,
                    course = %best.course.name,
                    "course selected"
                );
                AllocationResult::matched(record, &best, score)
            }
            None => {
                debug!(student_id = %record.id, score, "no qualifying course");
                AllocationResult::unallocated(record, score)
            }
        }
    }
}

/// Picks the qualifying course with the highest threshold in one pass.
///
/// A course qualifies when `score >= min_score`. Among qualifying courses with the same
/// threshold, the first in catalog order wins (university order, then course order), so a
/// later course only replaces the running best when its threshold is strictly larger.
pub fn select_best_fit(catalog: &Catalog, score: u32) -> Option<CourseRef<'_>> {
    let mut best: Option<CourseRef<'_>> = None;

    for candidate in catalog.courses() {
        if candidate.course.min_score > score {
            continue;
        }

        let replaces = match &best {
            None => true,
            Some(current) => candidate.course.min_score > current.course.min_score,
        };
        if replaces {
            best = Some(candidate);
        }
    }

    best
}
