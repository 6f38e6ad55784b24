use axum::{
    Json,
    extract::{State, rejection::JsonRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use medlink_core::{Patient, RawSearchCriteria, normalize};
use medlink_search::SearchError;
use serde::Serialize;
use serde_json::json;

use crate::server::AppState;
use crate::tenant::Tenant;

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
}

#[derive(Serialize)]
struct ReadyResponse {
    status: &'static str,
    storage: &'static str,
}

#[derive(Debug, Serialize)]
pub struct SearchResponse {
    pub patients: Vec<Patient>,
}

pub async fn healthz() -> impl IntoResponse {
    (StatusCode::OK, Json(HealthResponse { status: "ok" }))
}

pub async fn readyz(State(state): State<AppState>) -> impl IntoResponse {
    (
        StatusCode::OK,
        Json(ReadyResponse {
            status: "ready",
            storage: state.backend,
        }),
    )
}

/// Errors a handler can answer with.
#[derive(Debug)]
pub enum ApiError {
    /// The body is not a JSON criteria object.
    InvalidBody(JsonRejection),
    Search(SearchError),
}

impl From<SearchError> for ApiError {
    fn from(err: SearchError) -> Self {
        Self::Search(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            Self::InvalidBody(rejection) => {
                tracing::debug!(error = %rejection, "rejected search body");
                (StatusCode::BAD_REQUEST, "invalid request body".to_string())
            }
            Self::Search(SearchError::Persistence(err)) if err.is_invalid_criteria() => {
                (StatusCode::BAD_REQUEST, err.to_string())
            }
            Self::Search(err) => {
                tracing::error!(error = %err, category = %err.category(), "patient search failed");
                (StatusCode::INTERNAL_SERVER_ERROR, "search failed".to_string())
            }
        };
        (status, Json(json!({ "error": message }))).into_response()
    }
}

/// `POST /patient/search`
pub async fn search_patients(
    State(state): State<AppState>,
    Tenant(hospital): Tenant,
    body: Result<Json<RawSearchCriteria>, JsonRejection>,
) -> Result<Json<SearchResponse>, ApiError> {
    let Json(raw) = body.map_err(ApiError::InvalidBody)?;
    let criteria = normalize(raw);

    let patients = state.search.search(&hospital, &criteria).await?;
    Ok(Json(SearchResponse { patients }))
}
