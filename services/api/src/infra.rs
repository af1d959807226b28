use edupath::workflows::allocation::report::{
    full_report_html, student_report_file_name, student_report_html, FULL_REPORT_FILE,
};
use edupath::workflows::allocation::{
    AllocationRun, OverrideEntry, OverrideRepository, OverrideStoreError, OverrideTable,
    PublishError, ReportPublisher,
};
use metrics_exporter_prometheus::PrometheusHandle;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::AtomicBool;
use std::sync::{Arc, Mutex, MutexGuard};
use tracing::debug;

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
    pub(crate) report_dir: Arc<PathBuf>,
}

#[derive(Default, Clone)]
pub(crate) struct InMemoryOverrideRepository {
    entries: Arc<Mutex<OverrideTable>>,
}

impl InMemoryOverrideRepository {
    pub(crate) fn seeded(table: OverrideTable) -> Self {
        Self {
            entries: Arc::new(Mutex::new(table)),
        }
    }

    fn guard(&self) -> Result<MutexGuard<'_, OverrideTable>, OverrideStoreError> {
        self.entries
            .lock()
            .map_err(|_| OverrideStoreError::Unavailable("override store lock poisoned".to_string()))
    }
}

impl OverrideRepository for InMemoryOverrideRepository {
    fn record(&self, entry: OverrideEntry) -> Result<(), OverrideStoreError> {
        self.guard()?.insert(entry);
        Ok(())
    }

    fn snapshot(&self) -> Result<OverrideTable, OverrideStoreError> {
        Ok(self.guard()?.clone())
    }
}

/// Writes one HTML file per student plus the full report into a directory.
#[derive(Debug, Clone)]
pub(crate) struct HtmlReportDirectory {
    root: PathBuf,
}

impl HtmlReportDirectory {
    pub(crate) fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub(crate) fn root(&self) -> &Path {
        &self.root
    }
}

impl ReportPublisher for HtmlReportDirectory {
    fn publish(&self, run: &AllocationRun) -> Result<(), PublishError> {
        fs::create_dir_all(&self.root)?;

        for (record, result) in run.entries() {
            let path = self.root.join(student_report_file_name(record.id.as_str()));
            fs::write(path, student_report_html(record, result, &run.breakdown(record)))?;
        }
        fs::write(self.root.join(FULL_REPORT_FILE), full_report_html(run))?;

        debug!(
            directory = %self.root.display(),
            students = run.results.len(),
            "allocation reports written"
        );
        Ok(())
    }
}

/// Publisher for one-off CLI runs that print instead of writing files.
#[derive(Debug, Default, Clone, Copy)]
pub(crate) struct DiscardReports;

impl ReportPublisher for DiscardReports {
    fn publish(&self, _run: &AllocationRun) -> Result<(), PublishError> {
        Ok(())
    }
}

#[cfg(test)]
pub(crate) fn scratch_dir(label: &str) -> PathBuf {
    use std::sync::atomic::{AtomicUsize, Ordering};
    static COUNTER: AtomicUsize = AtomicUsize::new(0);

    let dir = std::env::temp_dir().join(format!(
        "edupath-{label}-{}-{}",
        std::process::id(),
        COUNTER.fetch_add(1, Ordering::Relaxed)
    ));
    let _ = fs::remove_dir_all(&dir);
    dir
}
