use std::io::Cursor;
use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{Html, IntoResponse, Response},
    routing::{get, post},
    Form, Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::json;

use super::domain::StudentId;
use super::overrides::{OverrideEntry, OverrideRepository};
use super::report::{
    allocations_table_html, full_report_html, student_report_html, AllocationRunView,
    ReportPublisher,
};
use super::service::{AllocationService, AllocationServiceError};
use crate::workflows::roster::SubjectColumns;

/// Upload payload: the roster as CSV text plus an optional explicit subject list.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AllocationRequest {
    pub roster_csv: String,
    #[serde(default)]
    pub subjects: Option<Vec<String>>,
}

#[derive(Debug, Serialize)]
pub struct OverrideResponse {
    #[serde(rename = "override")]
    pub entry: OverrideEntry,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub allocations: Option<AllocationRunView>,
}

/// Router builder exposing allocation, override, and report endpoints.
pub fn allocation_router<O, P>(service: Arc<AllocationService<O, P>>) -> Router
where
    O: OverrideRepository + 'static,
    P: ReportPublisher + 'static,
{
    Router::new()
        .route(
            "/api/v1/allocations",
            post(allocate_handler::<O, P>).get(latest_handler::<O, P>),
        )
        .route("/api/v1/allocations/table", get(table_handler::<O, P>))
        .route(
            "/api/v1/overrides",
            post(override_handler::<O, P>).get(list_overrides_handler::<O, P>),
        )
        .route("/api/v1/overrides/form", post(override_form_handler::<O, P>))
        .route("/api/v1/reports", get(full_report_handler::<O, P>))
        .route(
            "/api/v1/reports/:student_id",
            get(student_report_handler::<O, P>),
        )
        .with_state(service)
}

pub(crate) async fn allocate_handler<O, P>(
    State(service): State<Arc<AllocationService<O, P>>>,
    Json(request): Json<AllocationRequest>,
) -> Response
where
    O: OverrideRepository + 'static,
    P: ReportPublisher + 'static,
{
    let subjects = request.subjects.map(SubjectColumns::declared_or_inferred);
    let result = service
        .import_roster(Cursor::new(request.roster_csv.into_bytes()), subjects)
        .and_then(|roster| service.allocate(roster));

    match result {
        Ok(run) => (StatusCode::OK, Json(run.view(service.catalog()))).into_response(),
        Err(err) => error_response(err),
    }
}

pub(crate) async fn latest_handler<O, P>(
    State(service): State<Arc<AllocationService<O, P>>>,
) -> Response
where
    O: OverrideRepository + 'static,
    P: ReportPublisher + 'static,
{
    match service.latest_run() {
        Ok(run) => (StatusCode::OK, Json(run.view(service.catalog()))).into_response(),
        Err(err) => error_response(err),
    }
}

pub(crate) async fn table_handler<O, P>(
    State(service): State<Arc<AllocationService<O, P>>>,
) -> Response
where
    O: OverrideRepository + 'static,
    P: ReportPublisher + 'static,
{
    match service.latest_run() {
        Ok(run) => Html(allocations_table_html(&run)).into_response(),
        Err(err) => error_response(err),
    }
}

pub(crate) async fn override_handler<O, P>(
    State(service): State<Arc<AllocationService<O, P>>>,
    Json(entry): Json<OverrideEntry>,
) -> Response
where
    O: OverrideRepository + 'static,
    P: ReportPublisher + 'static,
{
    record_override(&service, entry)
}

/// Same as [`override_handler`] for plain HTML form posts from the admin page.
pub(crate) async fn override_form_handler<O, P>(
    State(service): State<Arc<AllocationService<O, P>>>,
    Form(entry): Form<OverrideEntry>,
) -> Response
where
    O: OverrideRepository + 'static,
    P: ReportPublisher + 'static,
{
    record_override(&service, entry)
}

fn record_override<O, P>(service: &AllocationService<O, P>, entry: OverrideEntry) -> Response
where
    O: OverrideRepository + 'static,
    P: ReportPublisher + 'static,
{
    if entry.student_id.as_str().trim().is_empty() {
        let payload = json!({ "error": "student_id must not be empty" });
        return (StatusCode::UNPROCESSABLE_ENTITY, Json(payload)).into_response();
    }

    match service.apply_override(entry.clone()) {
        Ok(run) => {
            let body = OverrideResponse {
                entry,
                allocations: run.map(|run| run.view(service.catalog())),
            };
            (StatusCode::ACCEPTED, Json(body)).into_response()
        }
        Err(err) => error_response(err),
    }
}

pub(crate) async fn list_overrides_handler<O, P>(
    State(service): State<Arc<AllocationService<O, P>>>,
) -> Response
where
    O: OverrideRepository + 'static,
    P: ReportPublisher + 'static,
{
    match service.overrides() {
        Ok(table) => (StatusCode::OK, Json(table.entries())).into_response(),
        Err(err) => error_response(err),
    }
}

pub(crate) async fn full_report_handler<O, P>(
    State(service): State<Arc<AllocationService<O, P>>>,
) -> Response
where
    O: OverrideRepository + 'static,
    P: ReportPublisher + 'static,
{
    match service.latest_run() {
        Ok(run) => Html(full_report_html(&run)).into_response(),
        Err(err) => error_response(err),
    }
}

pub(crate) async fn student_report_handler<O, P>(
    State(service): State<Arc<AllocationService<O, P>>>,
    Path(student_id): Path<String>,
) -> Response
where
    O: OverrideRepository + 'static,
    P: ReportPublisher + 'static,
{
    let run = match service.latest_run() {
        Ok(run) => run,
        Err(err) => return error_response(err),
    };

    let id = StudentId(student_id);
    match run.find(&id) {
        Some((record, result)) => {
            Html(student_report_html(record, result, &run.breakdown(record))).into_response()
        }
        None => {
            let payload = json!({
                "error": format!("no report for student {id}"),
            });
            (StatusCode::NOT_FOUND, Json(payload)).into_response()
        }
    }
}

fn error_response(err: AllocationServiceError) -> Response {
    let status = match &err {
        AllocationServiceError::Roster(_) => StatusCode::BAD_REQUEST,
        AllocationServiceError::NoRoster => StatusCode::NOT_FOUND,
        AllocationServiceError::Overrides(_) | AllocationServiceError::Publish(_) => {
            StatusCode::INTERNAL_SERVER_ERROR
        }
    };
    let payload = json!({ "error": err.to_string() });
    (status, Json(payload)).into_response()
}
