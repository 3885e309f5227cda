use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Instant;

use crate::fence::{InvalidReason, ValidationOutcome, ValidationReport};
use crate::geo::Coordinate;

use super::state::AppState;

// ─── Error response ──────────────────────────────────────────────

#[derive(Serialize)]
struct ApiErrorBody {
    error: String,
    code: u16,
}

pub(super) struct ApiError(StatusCode, String);

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = ApiErrorBody {
            error: self.1,
            code: self.0.as_u16(),
        };
        (self.0, Json(body)).into_response()
    }
}

fn api_error(status: StatusCode, msg: impl Into<String>) -> ApiError {
    ApiError(status, msg.into())
}

// ─── GET /api/validate ───────────────────────────────────────────

#[derive(Deserialize)]
pub struct ValidateQuery {
    pub address: Option<String>,
}

#[derive(Serialize)]
pub struct ValidateResponse {
    pub valid: bool,
    /// Machine-readable rejection code, absent when valid.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<InvalidReason>,
    /// User-renderable field feedback.
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub matched_label: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub coordinate: Option<Coordinate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub distance_km: Option<f64>,
    pub max_distance_km: f64,
}

pub async fn validate_address(
    State(state): State<Arc<AppState>>,
    Query(params): Query<ValidateQuery>,
) -> Result<Response, Response> {
    let start = Instant::now();

    let address = params.address.as_deref().unwrap_or("").trim().to_string();
    if address.is_empty() {
        return Err(api_error(StatusCode::BAD_REQUEST, "Missing 'address' parameter").into_response());
    }

    // The lookup blocks on the network; keep it off the async workers.
    let report = {
        let state = state.clone();
        let address = address.clone();
        tokio::task::spawn_blocking(move || state.validator.evaluate(&address))
            .await
            .map_err(|e| {
                api_error(
                    StatusCode::INTERNAL_SERVER_ERROR,
                    format!("Validation task failed: {}", e),
                )
                .into_response()
            })?
    };

    let elapsed = start.elapsed();
    eprintln!(
        "[{}] GET /api/validate address={:?} -> {} ({:.1}ms)",
        Utc::now().format("%H:%M:%S"),
        address,
        report.outcome,
        elapsed.as_secs_f64() * 1000.0,
    );

    // Lookup failure is an upstream problem, not a verdict on the address.
    let status = match report.outcome {
        ValidationOutcome::Invalid(InvalidReason::LookupFailed) => StatusCode::BAD_GATEWAY,
        _ => StatusCode::OK,
    };

    Ok((status, Json(build_response(report))).into_response())
}

fn build_response(report: ValidationReport) -> ValidateResponse {
    let message = match report.outcome {
        ValidationOutcome::Valid => "Address accepted".to_string(),
        ValidationOutcome::Invalid(InvalidReason::AddressNotFound) => {
            "Address not found".to_string()
        }
        ValidationOutcome::Invalid(InvalidReason::OutOfRange) => format!(
            "Address must be within {} km of the reference point",
            report.reference.max_distance_km
        ),
        ValidationOutcome::Invalid(InvalidReason::LookupFailed) => {
            "Error validating address, please try again".to_string()
        }
    };

    ValidateResponse {
        valid: report.outcome.is_valid(),
        reason: report.outcome.reason(),
        message,
        matched_label: report.matched.as_ref().map(|m| m.label.clone()),
        coordinate: report.matched.as_ref().map(|m| m.coordinate),
        distance_km: report.distance_km,
        max_distance_km: report.reference.max_distance_km,
    }
}

// ─── GET /api/reference ──────────────────────────────────────────

pub async fn reference(State(state): State<Arc<AppState>>) -> Json<crate::fence::ReferencePoint> {
    Json(state.validator.reference())
}
