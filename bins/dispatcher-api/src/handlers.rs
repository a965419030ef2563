// HTTP route handlers for the test dispatcher

use axum::{
    extract::{rejection::JsonRejection, rejection::QueryRejection, Query, State},
    http::{header, StatusCode},
    response::{IntoResponse, Json},
};
use dispatch_common::service::{DequeueOutcome, EnqueueOutcome};
use dispatch_common::types::{
    NextTestQuery, NextTestResponse, PushListRequest, PushListResponse, SnapshotResponse,
};
use std::sync::Arc;
use tracing::info;

use crate::error::ApiError;
use crate::metrics;
use crate::AppState;

fn required(value: Option<String>, name: &str) -> Result<String, ApiError> {
    value
        .filter(|v| !v.trim().is_empty())
        .ok_or_else(|| ApiError::BadRequest(format!("missing required parameter: {}", name)))
}

/// POST /push_list - Submit the ordered test list of a build and suite
pub async fn push_list(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<PushListRequest>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Json(request) = payload.map_err(|e| ApiError::BadRequest(e.body_text()))?;

    let outcome = state
        .service
        .enqueue(&request.build_id, &request.test_suite, request.tests)
        .inspect_err(|_| metrics::record_enqueue("invalid"))?;

    match outcome {
        EnqueueOutcome::Created { queued } => {
            metrics::record_enqueue("created");
            metrics::set_active_queues(state.service.active_queues());
            Ok((
                StatusCode::CREATED,
                Json(PushListResponse {
                    status: "OK".to_string(),
                    queued,
                }),
            ))
        }
        EnqueueOutcome::Conflict => {
            metrics::record_enqueue("conflict");
            Err(ApiError::Conflict {
                build_id: request.build_id,
                test_suite: request.test_suite,
            })
        }
    }
}

/// GET /next_test - Pop the next test of a build and suite
///
/// Unknown and drained queues both answer with an empty `details`.
pub async fn next_test(
    State(state): State<Arc<AppState>>,
    query: Result<Query<NextTestQuery>, QueryRejection>,
) -> Result<Json<NextTestResponse>, ApiError> {
    let Query(query) = query.map_err(|e| ApiError::BadRequest(e.body_text()))?;
    let build_id = required(query.build_id, "build_id")?;
    let test_suite = required(query.test_suite, "test_suite")?;

    let outcome = state.service.dequeue(&build_id, &test_suite)?;
    let details = match outcome {
        DequeueOutcome::NextTest(name) => {
            metrics::record_dequeue("dispatched");
            name
        }
        DequeueOutcome::QueueExhausted => {
            metrics::record_dequeue("exhausted");
            info!(build_id = %build_id, test_suite = %test_suite, "Worker told queue is exhausted");
            String::new()
        }
        DequeueOutcome::NoSuchQueue => {
            metrics::record_dequeue("unknown");
            String::new()
        }
    };
    metrics::set_active_queues(state.service.active_queues());

    Ok(Json(NextTestResponse { details }))
}

/// GET / - Diagnostic view of every pending queue
pub async fn snapshot(State(state): State<Arc<AppState>>) -> Json<SnapshotResponse> {
    Json(SnapshotResponse {
        queues: state.service.queue_snapshots(),
    })
}

/// GET /status - Health check endpoint
pub async fn health_check() -> impl IntoResponse {
    (StatusCode::OK, "OK")
}

/// GET /metrics - Prometheus exposition
pub async fn prometheus_metrics() -> Result<impl IntoResponse, ApiError> {
    let body = metrics::render()?;
    Ok((
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        body,
    ))
}
