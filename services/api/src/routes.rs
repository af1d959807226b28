use crate::infra::AppState;
use axum::extract::Path;
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Extension, Json, Router};
use edupath::error::AppError;
use edupath::workflows::allocation::{
    allocation_router, AllocationService, OverrideRepository, ReportPublisher,
};
use serde_json::json;
use std::io::ErrorKind;
use std::sync::Arc;
use tracing::debug;

pub(crate) fn with_allocation_routes<O, P>(service: Arc<AllocationService<O, P>>) -> Router
where
    O: OverrideRepository + 'static,
    P: ReportPublisher + 'static,
{
    allocation_router(service)
        .route("/health", get(healthcheck))
        .route("/ready", get(readiness_endpoint))
        .route("/metrics", get(metrics_endpoint))
        .route("/reports/files/:file_name", get(report_file_endpoint))
}

pub(crate) async fn healthcheck() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok" }))
}

pub(crate) async fn readiness_endpoint(Extension(state): Extension<AppState>) -> impl IntoResponse {
    let ready = state.readiness.load(std::sync::atomic::Ordering::Relaxed);
    let status = if ready {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    let payload = if ready {
        json!({ "status": "ready" })
    } else {
        json!({ "status": "initializing" })
    };

    (status, Json(payload))
}

pub(crate) async fn metrics_endpoint(Extension(state): Extension<AppState>) -> impl IntoResponse {
    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        state.metrics.render(),
    )
}

/// Serves a file previously written into the report directory.
pub(crate) async fn report_file_endpoint(
    Extension(state): Extension<AppState>,
    Path(file_name): Path<String>,
) -> Response {
    if !is_plain_file_name(&file_name) {
        let payload = json!({ "error": format!("invalid report file name '{file_name}'") });
        return (StatusCode::BAD_REQUEST, Json(payload)).into_response();
    }

    let path = state.report_dir.join(&file_name);
    match tokio::fs::read(&path).await {
        Ok(bytes) => {
            debug!(file = %path.display(), "serving report file");
            let content_type = mime_guess::from_path(&path)
                .first_or_octet_stream()
                .to_string();
            let disposition = format!("attachment; filename=\"{file_name}\"");
            (
                StatusCode::OK,
                [
                    (header::CONTENT_TYPE, content_type),
                    (header::CONTENT_DISPOSITION, disposition),
                ],
                bytes,
            )
                .into_response()
        }
        Err(err) if err.kind() == ErrorKind::NotFound => {
            let payload = json!({ "error": format!("report file '{file_name}' not found") });
            (StatusCode::NOT_FOUND, Json(payload)).into_response()
        }
        Err(err) => AppError::from(err).into_response(),
    }
}

fn is_plain_file_name(name: &str) -> bool {
    !name.is_empty()
        && !name.starts_with('.')
        && !name.contains("..")
        && !name.contains(['/', '\\'])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infra::{scratch_dir, HtmlReportDirectory, InMemoryOverrideRepository};
    use axum::body::{to_bytes, Body};
    use axum::http::Request;
    use edupath::workflows::allocation::{Catalog, Course, University};
    use edupath::workflows::roster::RosterSchema;
    use metrics_exporter_prometheus::PrometheusBuilder;
    use std::path::PathBuf;
    use std::sync::atomic::AtomicBool;
    use tower::ServiceExt;

    fn app(report_dir: PathBuf, ready: bool) -> Router {
        let catalog = Catalog::new(vec![
            University::new("UniA", vec![Course::new("CourseX", 5)]),
            University::new("UniB", vec![Course::new("CourseY", 9)]),
        ]);
        let service = Arc::new(AllocationService::new(
            catalog,
            RosterSchema::default(),
            Arc::new(InMemoryOverrideRepository::default()),
            Arc::new(HtmlReportDirectory::new(&report_dir)),
        ));
        let state = AppState {
            readiness: Arc::new(AtomicBool::new(ready)),
            metrics: Arc::new(PrometheusBuilder::new().build_recorder().handle()),
            report_dir: Arc::new(report_dir),
        };
        with_allocation_routes(service).layer(Extension(state))
    }

    async fn body_string(response: Response) -> String {
        let bytes = to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("body collects");
        String::from_utf8(bytes.to_vec()).expect("utf8 body")
    }

    #[tokio::test]
    async fn health_reports_ok() {
        let response = app(scratch_dir("health"), true)
            .oneshot(Request::get("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert!(body_string(response).await.contains("ok"));
    }

    #[tokio::test]
    async fn readiness_follows_flag() {
        let response = app(scratch_dir("ready"), false)
            .oneshot(Request::get("/ready").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
        assert!(body_string(response).await.contains("initializing"));
    }

    #[tokio::test]
    async fn uploaded_roster_reports_can_be_downloaded() {
        let dir = scratch_dir("download");
        let router = app(dir.clone(), true);

        let upload = json!({
            "roster_csv": "Student ID,Name,Math,Eng\nS1,Ada,A,B\nS2,Grace,C,F\n",
        });
        let response = router
            .clone()
            .oneshot(
                Request::post("/api/v1/allocations")
                    .header(header::CONTENT_TYPE, "application/json")
                    .body(Body::from(upload.to_string()))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let response = router
            .clone()
            .oneshot(
                Request::get("/reports/files/S1.html")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.headers().get(header::CONTENT_TYPE).unwrap(),
            "text/html"
        );
        let html = body_string(response).await;
        assert!(html.contains("<p><b>Allocated Course:</b> CourseY</p>"));

        let response = router
            .oneshot(
                Request::get("/reports/files/allocations_full.html")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        std::fs::remove_dir_all(&dir).expect("cleanup");
    }

    #[tokio::test]
    async fn missing_report_file_is_not_found() {
        let response = app(scratch_dir("missing"), true)
            .oneshot(
                Request::get("/reports/files/S404.html")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn hidden_report_file_names_are_rejected() {
        let response = app(scratch_dir("hidden"), true)
            .oneshot(
                Request::get("/reports/files/..secret")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn plain_file_names_only() {
        assert!(is_plain_file_name("S1.html"));
        assert!(!is_plain_file_name(".env"));
        assert!(!is_plain_file_name("a\\b.html"));
        assert!(!is_plain_file_name(""));
    }
}
