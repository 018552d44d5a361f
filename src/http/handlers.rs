//! API handlers.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};

use crate::breaker::BreakerError;
use crate::form::{self, ConfigDraft, RenderedField, ValidationError};
use crate::http::server::AppState;
use crate::schema::FieldDescriptor;
use crate::workflow::{StoreError, TestReport, WorkflowError};

#[derive(Serialize)]
pub struct SystemStatus {
    pub version: &'static str,
    pub status: &'static str,
}

/// Schema response: the field descriptors plus the derived render plan
/// (one input element per field, in schema order).
#[derive(Serialize)]
pub struct SchemaResponse {
    pub provider_type: String,
    pub fields: Vec<FieldDescriptor>,
    pub form: Vec<RenderedField>,
}

#[derive(Deserialize, Default)]
pub struct TestRequest {
    /// Candidate configuration to probe. Omitted: test the slot's active
    /// configuration (the manual recovery-probe path).
    #[serde(default)]
    pub draft: Option<ConfigDraft>,
}

#[derive(Deserialize)]
pub struct OutcomeReport {
    pub success: bool,
    #[serde(default)]
    pub error: Option<String>,
}

#[derive(Serialize)]
pub struct AcquireResponse {
    pub slot: String,
    pub granted: bool,
}

/// Error body for every non-2xx API response.
#[derive(Serialize)]
struct ErrorBody {
    error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    detail: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    fields: Option<Vec<ValidationError>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    retry_in_ms: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    failover_to: Option<String>,
}

impl ErrorBody {
    fn new(error: &str) -> Self {
        Self {
            error: error.to_string(),
            detail: None,
            fields: None,
            retry_in_ms: None,
            failover_to: None,
        }
    }

    fn detail(mut self, detail: impl Into<String>) -> Self {
        self.detail = Some(detail.into());
        self
    }
}

pub struct ApiError(StatusCode, ErrorBody);

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.0, Json(self.1)).into_response()
    }
}

impl From<WorkflowError> for ApiError {
    fn from(err: WorkflowError) -> Self {
        match err {
            WorkflowError::Validation(fields) => {
                let mut body = ErrorBody::new("validation_failed");
                body.fields = Some(fields);
                ApiError(StatusCode::UNPROCESSABLE_ENTITY, body)
            }
            WorkflowError::Busy { .. } => ApiError(
                StatusCode::CONFLICT,
                ErrorBody::new("slot_busy").detail(err.to_string()),
            ),
            WorkflowError::UnknownSlot(_) => ApiError(
                StatusCode::NOT_FOUND,
                ErrorBody::new("unknown_slot").detail(err.to_string()),
            ),
            WorkflowError::NoActiveConfig(_) => ApiError(
                StatusCode::CONFLICT,
                ErrorBody::new("no_active_config").detail(err.to_string()),
            ),
            WorkflowError::Persistence(StoreError::Rejected(detail)) => ApiError(
                StatusCode::CONFLICT,
                ErrorBody::new("persistence_rejected").detail(detail),
            ),
            WorkflowError::Persistence(StoreError::Unavailable(detail)) => ApiError(
                StatusCode::BAD_GATEWAY,
                ErrorBody::new("persistence_unavailable").detail(detail),
            ),
            WorkflowError::Breaker(e) => e.into(),
        }
    }
}

impl From<BreakerError> for ApiError {
    fn from(err: BreakerError) -> Self {
        match err {
            BreakerError::Rejected { retry_in, .. } => {
                let mut body = ErrorBody::new("circuit_open");
                body.retry_in_ms = Some(retry_in.as_millis() as u64);
                ApiError(StatusCode::SERVICE_UNAVAILABLE, body)
            }
            BreakerError::ProbeInFlight(_) => ApiError(
                StatusCode::SERVICE_UNAVAILABLE,
                ErrorBody::new("probe_in_flight").detail(err.to_string()),
            ),
            BreakerError::UnknownSlot(_) => ApiError(
                StatusCode::NOT_FOUND,
                ErrorBody::new("unknown_slot").detail(err.to_string()),
            ),
        }
    }
}

pub async fn get_status() -> Json<SystemStatus> {
    Json(SystemStatus {
        version: env!("CARGO_PKG_VERSION"),
        status: "operational",
    })
}

/// Schema for a provider type. An unknown type yields an empty schema:
/// "no schema" means "no configuration needed", never an error.
pub async fn get_schema(
    State(state): State<AppState>,
    Path(provider_type): Path<String>,
) -> Json<SchemaResponse> {
    let schema = state.catalog.get(&provider_type);
    Json(SchemaResponse {
        provider_type: provider_type.clone(),
        fields: schema.map(|s| s.fields.clone()).unwrap_or_default(),
        form: form::render_plan(schema),
    })
}

pub async fn list_slots(State(state): State<AppState>) -> impl IntoResponse {
    Json(state.aggregator.snapshot_all().await)
}

pub async fn test_slot(
    State(state): State<AppState>,
    Path(slot): Path<String>,
    Json(request): Json<TestRequest>,
) -> Result<Json<TestReport>, ApiError> {
    let report = state.workflow.test(&slot, request.draft).await?;
    Ok(Json(report))
}

pub async fn save_config(
    State(state): State<AppState>,
    Path(slot): Path<String>,
    Json(draft): Json<ConfigDraft>,
) -> Result<Json<ConfigDraft>, ApiError> {
    let saved = state.workflow.save(&slot, draft).await?;
    Ok(Json(saved))
}

pub async fn get_config(
    State(state): State<AppState>,
    Path(slot): Path<String>,
) -> Result<Response, ApiError> {
    match state.workflow.active_config(&slot).await? {
        Some(config) => Ok(Json(config).into_response()),
        None => Ok((
            StatusCode::NOT_FOUND,
            Json(ErrorBody::new("no_active_config")),
        )
            .into_response()),
    }
}

pub async fn get_health(
    State(state): State<AppState>,
    Path(slot): Path<String>,
) -> Result<Response, ApiError> {
    let snapshot = state.aggregator.snapshot(&slot).await.map_err(ApiError::from)?;
    Ok(Json(snapshot).into_response())
}

/// Identical to `get_health` by design: snapshots are never cached, so a
/// refresh is simply a fresh computation.
pub async fn refresh_health(
    State(state): State<AppState>,
    Path(slot): Path<String>,
) -> Result<Response, ApiError> {
    get_health(State(state), Path(slot)).await
}

/// Admission check for a live call attempt. While the circuit is OPEN the
/// rejection carries the failover target, if one is available.
pub async fn acquire_slot(
    State(state): State<AppState>,
    Path(slot): Path<String>,
) -> Result<Json<AcquireResponse>, ApiError> {
    match state.breakers.admit(&slot).await {
        Ok(()) => Ok(Json(AcquireResponse {
            slot: slot.clone(),
            granted: true,
        })),
        Err(err) => {
            let mut api_err = ApiError::from(err);
            if let Ok(snapshot) = state.aggregator.snapshot(&slot).await {
                if snapshot.failover_active {
                    api_err.1.failover_to = snapshot.backup_provider;
                }
            }
            Err(api_err)
        }
    }
}

/// Report the outcome of a live call against a slot's provider.
pub async fn report_outcome(
    State(state): State<AppState>,
    Path(slot): Path<String>,
    Json(report): Json<OutcomeReport>,
) -> Result<StatusCode, ApiError> {
    if report.success {
        state.breakers.record_success(&slot).await?;
    } else {
        let error = report.error.unwrap_or_else(|| "call failed".to_string());
        state.breakers.record_failure(&slot, error).await?;
    }
    Ok(StatusCode::NO_CONTENT)
}
