use std::sync::{Arc, Mutex};

use axum::response::Response;
use serde_json::Value;

use crate::workflows::allocation::catalog::{Catalog, Course, University};
use crate::workflows::allocation::domain::StudentRecord;
use crate::workflows::allocation::overrides::{
    OverrideEntry, OverrideRepository, OverrideStoreError, OverrideTable,
};
use crate::workflows::allocation::report::{PublishError, ReportPublisher};
use crate::workflows::allocation::run::AllocationRun;
use crate::workflows::allocation::{allocation_router, AllocationService};
use crate::workflows::roster::{Roster, RosterSchema};

#[derive(Default, Clone)]
pub(super) struct MemoryOverrides {
    table: Arc<Mutex<OverrideTable>>,
}

impl OverrideRepository for MemoryOverrides {
    fn record(&self, entry: OverrideEntry) -> Result<(), OverrideStoreError> {
        self.table.lock().expect("override mutex poisoned").insert(entry);
        Ok(())
    }

    fn snapshot(&self) -> Result<OverrideTable, OverrideStoreError> {
        Ok(self.table.lock().expect("override mutex poisoned").clone())
    }
}

pub(super) struct UnavailableOverrides;

impl OverrideRepository for UnavailableOverrides {
    fn record(&self, _entry: OverrideEntry) -> Result<(), OverrideStoreError> {
        Err(OverrideStoreError::Unavailable("offline".to_string()))
    }

    fn snapshot(&self) -> Result<OverrideTable, OverrideStoreError> {
        Err(OverrideStoreError::Unavailable("offline".to_string()))
    }
}

#[derive(Default, Clone)]
pub(super) struct MemoryPublisher {
    runs: Arc<Mutex<Vec<AllocationRun>>>,
}

impl ReportPublisher for MemoryPublisher {
    fn publish(&self, run: &AllocationRun) -> Result<(), PublishError> {
        self.runs
            .lock()
            .expect("publisher mutex poisoned")
            .push(run.clone());
        Ok(())
    }
}

impl MemoryPublisher {
    pub(super) fn runs(&self) -> Vec<AllocationRun> {
        self.runs.lock().expect("publisher mutex poisoned").clone()
    }
}

pub(super) struct BrokenPublisher;

impl ReportPublisher for BrokenPublisher {
    fn publish(&self, _run: &AllocationRun) -> Result<(), PublishError> {
        Err(PublishError::Unavailable("disk full".to_string()))
    }
}

/// UniA/CourseX needs 5, UniB/CourseY needs 9.
pub(super) fn catalog() -> Catalog {
    Catalog::new(vec![
        University::new("UniA", vec![Course::new("CourseX", 5)]),
        University::new("UniB", vec![Course::new("CourseY", 9)]),
    ])
}

pub(super) fn student(id: &str, grades: &[(&str, &str)]) -> StudentRecord {
    grades
        .iter()
        .fold(StudentRecord::new(id, format!("Student {id}")), |record, (subject, token)| {
            record.with_grade(*subject, *token)
        })
}

pub(super) fn roster() -> Roster {
    Roster::new(
        vec!["Math".to_string(), "Eng".to_string()],
        vec![
            student("S1", &[("Math", "A"), ("Eng", "B")]),
            student("S2", &[("Math", "C"), ("Eng", "F")]),
            student("S42", &[("Math", "A"), ("Eng", "A")]),
        ],
    )
}

pub(super) const ROSTER_CSV: &str = "Student ID,Name,Math,Eng\n\
S1,Ada,A,B\n\
S2,Grace,C,F\n\
S42,Linus,A,A\n";

pub(super) fn build_service() -> (
    AllocationService<MemoryOverrides, MemoryPublisher>,
    MemoryOverrides,
    MemoryPublisher,
) {
    let overrides = MemoryOverrides::default();
    let publisher = MemoryPublisher::default();
    let service = AllocationService::new(
        catalog(),
        RosterSchema::default(),
        Arc::new(overrides.clone()),
        Arc::new(publisher.clone()),
    );
    (service, overrides, publisher)
}

pub(super) fn router_with_service(
    service: AllocationService<MemoryOverrides, MemoryPublisher>,
) -> axum::Router {
    allocation_router(Arc::new(service))
}

pub(super) async fn read_body(response: Response) -> String {
    let body = axum::body::to_bytes(response.into_body(), 64 * 1024)
        .await
        .expect("read body");
    String::from_utf8(body.to_vec()).expect("utf-8 body")
}

pub(super) async fn read_json_body(response: Response) -> Value {
    let body = read_body(response).await;
    serde_json::from_str(&body).expect("json payload")
}
