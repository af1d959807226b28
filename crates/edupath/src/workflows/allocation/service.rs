use std::io::Read;
use std::sync::{Arc, Mutex, MutexGuard};

use chrono::Utc;
use tracing::{info, warn};

use super::catalog::Catalog;
use super::engine::AllocationEngine;
use super::overrides::{OverrideEntry, OverrideRepository, OverrideStoreError, OverrideTable};
use super::report::{PublishError, ReportPublisher};
use super::run::AllocationRun;
use super::scoring::GradeScale;
use crate::workflows::roster::{
    Roster, RosterImportError, RosterImporter, RosterSchema, SubjectColumns,
};

/// Service composing the engine, catalog, override repository, and report publisher.
///
/// Keeps the most recently uploaded roster so overrides can be re-applied without a new
/// upload.
pub struct AllocationService<O, P> {
    engine: Arc<AllocationEngine>,
    catalog: Arc<Catalog>,
    schema: RosterSchema,
    overrides: Arc<O>,
    publisher: Arc<P>,
    latest: Mutex<Option<Roster>>,
}

impl<O, P> AllocationService<O, P>
where
    O: OverrideRepository + 'static,
    P: ReportPublisher + 'static,
{
    pub fn new(catalog: Catalog, schema: RosterSchema, overrides: Arc<O>, publisher: Arc<P>) -> Self {
        Self::with_scale(GradeScale::standard(), catalog, schema, overrides, publisher)
    }

    pub fn with_scale(
        scale: GradeScale,
        catalog: Catalog,
        schema: RosterSchema,
        overrides: Arc<O>,
        publisher: Arc<P>,
    ) -> Self {
        if catalog.is_empty() {
            warn!("course catalog is empty; every student will be unallocated");
        }

        Self {
            engine: Arc::new(AllocationEngine::new(scale)),
            catalog: Arc::new(catalog),
            schema,
            overrides,
            publisher,
            latest: Mutex::new(None),
        }
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    /// Parse an uploaded roster, optionally replacing the configured subject columns.
    pub fn import_roster<R: Read>(
        &self,
        reader: R,
        subjects: Option<SubjectColumns>,
    ) -> Result<Roster, AllocationServiceError> {
        let roster = match subjects {
            Some(subjects) => {
                let schema = self.schema.clone().with_subjects(subjects);
                RosterImporter::from_reader(reader, &schema)?
            }
            None => RosterImporter::from_reader(reader, &self.schema)?,
        };
        Ok(roster)
    }

    /// Allocate a freshly uploaded roster, remember it as the latest, and publish reports.
    pub fn allocate(&self, roster: Roster) -> Result<AllocationRun, AllocationServiceError> {
        let mut latest = self.latest_guard();
        let run = self.compute(roster.clone())?;
        self.publish(&run)?;
        *latest = Some(roster);
        Ok(run)
    }

    /// Record an override and, when a roster has been uploaded, re-run and publish.
    ///
    /// The latest roster stays locked until the re-run is published, so a concurrent upload
    /// cannot be overwritten by reports for the roster it replaced.
    pub fn apply_override(
        &self,
        entry: OverrideEntry,
    ) -> Result<Option<AllocationRun>, AllocationServiceError> {
        let latest = self.latest_guard();

        if let Some(roster) = latest.as_ref() {
            if roster.get(&entry.student_id).is_none() {
                info!(student_id = %entry.student_id, "override stored for student not in latest roster");
            }
        }

        self.overrides.record(entry)?;

        match latest.as_ref() {
            Some(roster) => {
                let run = self.compute(roster.clone())?;
                self.publish(&run)?;
                Ok(Some(run))
            }
            None => Ok(None),
        }
    }

    /// Allocations for the latest roster against current overrides. Publishes nothing.
    pub fn latest_run(&self) -> Result<AllocationRun, AllocationServiceError> {
        let roster = self
            .latest_guard()
            .clone()
            .ok_or(AllocationServiceError::NoRoster)?;
        self.compute(roster)
    }

    pub fn overrides(&self) -> Result<OverrideTable, AllocationServiceError> {
        Ok(self.overrides.snapshot()?)
    }

    fn compute(&self, roster: Roster) -> Result<AllocationRun, AllocationServiceError> {
        let overrides = self.overrides.snapshot()?;
        let results = self
            .engine
            .allocate(roster.students(), &self.catalog, &overrides);
        Ok(AllocationRun::new(roster, results, Utc::now()).with_scale(self.engine.scale().clone()))
    }

    fn publish(&self, run: &AllocationRun) -> Result<(), AllocationServiceError> {
        self.publisher.publish(run)?;

        let summary = run.summary(&self.catalog);
        info!(
            students = summary.total_students,
            allocated = summary.allocated,
            unallocated = summary.unallocated,
            overridden = summary.overridden,
            "allocation run published"
        );
        Ok(())
    }

    fn latest_guard(&self) -> MutexGuard<'_, Option<Roster>> {
        // the roster is replaced wholesale, so a poisoned value is still consistent
        self.latest
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

/// Error raised by the allocation service.
#[derive(Debug, thiserror::Error)]
pub enum AllocationServiceError {
    #[error(transparent)]
    Roster(#[from] RosterImportError),
    #[error(transparent)]
    Overrides(#[from] OverrideStoreError),
    #[error(transparent)]
    Publish(#[from] PublishError),
    #[error("no roster has been uploaded yet")]
    NoRoster,
}
