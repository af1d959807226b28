//! Grade scoring, best-fit course selection, manual overrides, and allocation reports.

pub mod catalog;
pub mod domain;
pub mod engine;
pub mod overrides;
pub mod report;
pub mod router;
mod run;
pub mod scoring;
pub mod service;

#[cfg(test)]
mod tests;

pub use catalog::{Catalog, CatalogError, Course, CourseRef, University};
pub use domain::{
    AllocationDecision, AllocationResult, Grade, Placement, StudentId, StudentRecord, SubjectGrade,
};
pub use engine::{select_best_fit, AllocationEngine};
pub use overrides::{
    OverrideEntry, OverrideImportError, OverrideRepository, OverrideStoreError, OverrideTable,
};
pub use report::{PublishError, ReportPublisher};
pub use router::{allocation_router, AllocationRequest};
pub use run::AllocationRun;
pub use scoring::{GradeScale, ScoreBreakdown, SubjectScore};
pub use service::{AllocationService, AllocationServiceError};
