//! HTTP request handlers for the payroll API.
//!
//! This module contains the handler functions for all API endpoints.

use std::time::Instant;

use axum::{
    Json, Router,
    extract::{Path, State, rejection::JsonRejection},
    http::{HeaderMap, StatusCode, header},
    response::{IntoResponse, Response},
    routing::{get, post},
};
use serde::Serialize;
use tracing::{info, warn};
use uuid::Uuid;

use crate::error::EngineError;
use crate::models::{Actor, RequestMetadata, SalaryStructure};

use super::request::{CreateStructureRequest, PreviewRequest, StartRunRequest};
use super::response::{ApiError, ApiErrorResponse};
use super::state::AppState;

/// Creates the API router with all endpoints.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route(
            "/organizations/:org_id/salary-structures",
            post(create_structure_handler).get(list_structures_handler),
        )
        .route(
            "/organizations/:org_id/salary-structures/active",
            get(active_structure_handler),
        )
        .route("/payslips/preview", post(preview_handler))
        .route(
            "/organizations/:org_id/payroll-runs",
            post(start_run_handler).get(list_runs_handler),
        )
        .route(
            "/organizations/:org_id/payroll-runs/:run_id",
            get(get_run_handler),
        )
        .route(
            "/organizations/:org_id/payroll-runs/:run_id/payslips",
            get(list_payslips_handler),
        )
        .with_state(state)
}

/// Serializes `body` as a JSON response with an explicit content type.
fn json_response<T: Serialize>(status: StatusCode, body: T) -> Response {
    (
        status,
        [(header::CONTENT_TYPE, "application/json")],
        Json(body),
    )
        .into_response()
}

/// Logs an engine error and converts it to its HTTP form.
fn error_response(correlation_id: Uuid, err: EngineError) -> Response {
    warn!(
        correlation_id = %correlation_id,
        error = %err,
        "Request failed"
    );
    ApiErrorResponse::from(err).into_response()
}

/// Converts a JSON body rejection to a 400 response.
fn rejection_response(correlation_id: Uuid, rejection: JsonRejection) -> Response {
    let error = match rejection {
        JsonRejection::JsonDataError(err) => {
            // body_text carries serde's detailed message
            let body_text = err.body_text();
            warn!(
                correlation_id = %correlation_id,
                error = %body_text,
                "JSON data error"
            );
            if body_text.contains("missing field") {
                ApiError::new("VALIDATION_ERROR", body_text)
            } else {
                ApiError::malformed_json(body_text)
            }
        }
        JsonRejection::JsonSyntaxError(err) => {
            warn!(
                correlation_id = %correlation_id,
                error = %err,
                "JSON syntax error"
            );
            ApiError::malformed_json(format!("Invalid JSON syntax: {}", err))
        }
        JsonRejection::MissingJsonContentType(_) => {
            ApiError::new("MISSING_CONTENT_TYPE", "Content-Type must be application/json")
        }
        _ => ApiError::malformed_json("Failed to parse request body"),
    };
    ApiErrorResponse::new(StatusCode::BAD_REQUEST, error).into_response()
}

/// Builds the acting user with request context for the audit trail.
fn actor_from(actor_id: Uuid, correlation_id: Uuid, headers: &HeaderMap) -> Actor {
    let header_value = |name: &str| {
        headers
            .get(name)
            .and_then(|value| value.to_str().ok())
            .map(str::to_string)
    };

    Actor {
        id: actor_id,
        metadata: RequestMetadata {
            request_id: Some(correlation_id.to_string()),
            ip_address: header_value("x-forwarded-for")
                .and_then(|list| list.split(',').next().map(|ip| ip.trim().to_string())),
            user_agent: header_value(header::USER_AGENT.as_str()),
        },
    }
}

/// Handler for POST /organizations/:org_id/salary-structures.
async fn create_structure_handler(
    State(state): State<AppState>,
    Path(org_id): Path<Uuid>,
    headers: HeaderMap,
    payload: Result<Json<CreateStructureRequest>, JsonRejection>,
) -> Response {
    let correlation_id = Uuid::new_v4();
    info!(
        correlation_id = %correlation_id,
        organization_id = %org_id,
        "Processing salary structure creation"
    );

    let request = match payload {
        Ok(Json(req)) => req,
        Err(rejection) => return rejection_response(correlation_id, rejection),
    };

    let actor = actor_from(request.actor_id, correlation_id, &headers);
    match state
        .engine()
        .create_salary_structure(org_id, request.into(), &actor)
    {
        Ok(structure) => json_response(StatusCode::CREATED, structure),
        Err(err) => error_response(correlation_id, err),
    }
}

/// Handler for GET /organizations/:org_id/salary-structures.
async fn list_structures_handler(
    State(state): State<AppState>,
    Path(org_id): Path<Uuid>,
) -> Response {
    match state.engine().list_salary_structures(org_id) {
        Ok(structures) => json_response(StatusCode::OK, structures),
        Err(err) => error_response(Uuid::new_v4(), err),
    }
}

/// Handler for GET /organizations/:org_id/salary-structures/active.
async fn active_structure_handler(
    State(state): State<AppState>,
    Path(org_id): Path<Uuid>,
) -> Response {
    match state.engine().get_active_salary_structure(org_id) {
        Ok(structure) => json_response(StatusCode::OK, structure),
        Err(err) => error_response(Uuid::new_v4(), err),
    }
}

/// Handler for POST /payslips/preview.
///
/// Evaluates an unsaved structure for one base salary.
async fn preview_handler(
    State(state): State<AppState>,
    payload: Result<Json<PreviewRequest>, JsonRejection>,
) -> Response {
    let correlation_id = Uuid::new_v4();

    let request = match payload {
        Ok(Json(req)) => req,
        Err(rejection) => return rejection_response(correlation_id, rejection),
    };

    let start_time = Instant::now();
    let result = SalaryStructure::next_version(Uuid::nil(), None, request.structure, Uuid::nil())
        .and_then(|structure| {
            state
                .engine()
                .compute_payslip(&structure, request.base_salary)
        });

    match result {
        Ok(computation) => {
            info!(
                correlation_id = %correlation_id,
                base_salary = request.base_salary,
                net = computation.net_rounded,
                duration_us = start_time.elapsed().as_micros() as u64,
                "Payslip preview computed"
            );
            json_response(StatusCode::OK, computation)
        }
        Err(err) => error_response(correlation_id, err),
    }
}

/// Handler for POST /organizations/:org_id/payroll-runs.
///
/// Responds 201 with the completed run. On failure the run is still stored,
/// as failed, and the error is returned.
async fn start_run_handler(
    State(state): State<AppState>,
    Path(org_id): Path<Uuid>,
    headers: HeaderMap,
    payload: Result<Json<StartRunRequest>, JsonRejection>,
) -> Response {
    let correlation_id = Uuid::new_v4();

    let request = match payload {
        Ok(Json(req)) => req,
        Err(rejection) => return rejection_response(correlation_id, rejection),
    };

    info!(
        correlation_id = %correlation_id,
        organization_id = %org_id,
        employee_count = request.employees.len(),
        "Processing payroll run request"
    );

    let actor = actor_from(request.actor_id, correlation_id, &headers);
    // Batch computation is CPU bound; keep it off the async workers.
    let outcome = tokio::task::spawn_blocking(move || {
        state.engine().start_payroll_run(
            org_id,
            request.period_start,
            request.period_end,
            request.employees,
            &actor,
        )
    })
    .await;

    match outcome {
        Ok(Ok(run)) => json_response(StatusCode::CREATED, run),
        Ok(Err(err)) => error_response(correlation_id, err),
        Err(join_err) => {
            warn!(
                correlation_id = %correlation_id,
                error = %join_err,
                "Payroll run task aborted"
            );
            ApiErrorResponse::new(
                StatusCode::INTERNAL_SERVER_ERROR,
                ApiError::new("INTERNAL_ERROR", "Payroll run task aborted"),
            )
            .into_response()
        }
    }
}

/// Handler for GET /organizations/:org_id/payroll-runs.
async fn list_runs_handler(State(state): State<AppState>, Path(org_id): Path<Uuid>) -> Response {
    match state.engine().list_runs(org_id) {
        Ok(runs) => json_response(StatusCode::OK, runs),
        Err(err) => error_response(Uuid::new_v4(), err),
    }
}

/// Handler for GET /organizations/:org_id/payroll-runs/:run_id.
async fn get_run_handler(
    State(state): State<AppState>,
    Path((org_id, run_id)): Path<(Uuid, Uuid)>,
) -> Response {
    match state.engine().get_run(run_id, org_id) {
        Ok(Some(run)) => json_response(StatusCode::OK, run),
        Ok(None) => error_response(
            Uuid::new_v4(),
            EngineError::not_found("Payroll run", run_id),
        ),
        Err(err) => error_response(Uuid::new_v4(), err),
    }
}

/// Handler for GET /organizations/:org_id/payroll-runs/:run_id/payslips.
async fn list_payslips_handler(
    State(state): State<AppState>,
    Path((org_id, run_id)): Path<(Uuid, Uuid)>,
) -> Response {
    match state.engine().list_payslips(run_id, org_id) {
        Ok(payslips) => json_response(StatusCode::OK, payslips),
        Err(err) => error_response(Uuid::new_v4(), err),
    }
}
