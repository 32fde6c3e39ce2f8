//! HTTP routes for the scan pipeline.

use crate::error::ApiError;
use api_shared::{
    ApiErrorRes, AssessRiskData, AssessRiskReq, AssessRiskRes, GenerateOutreachData,
    GenerateOutreachReq, GenerateOutreachRes, HealthRes, HealthService, PatientContextReq,
    ScanReportData, ScanReportReq, ScanReportRes,
};
use axum::{
    extract::{rejection::JsonRejection, State},
    response::Json,
    routing::{get, post},
    Router,
};
use mtf_core::{
    derive_risk_assessment, EmailContent, Fracture, KeyFindings, LlmBackend, OutreachContent,
    OutreachPatient, OutreachService, PatientContext, RiskAssessment, RiskLevel, ScanResult,
    ScanService, SelfAssessment,
};
use tower_http::cors::CorsLayer;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

/// Application state shared across REST API handlers.
#[derive(Clone, Debug)]
pub struct AppState {
    scan_service: ScanService,
    outreach_service: OutreachService,
}

impl AppState {
    /// Build the services around one backend so scan and outreach never disagree on mock mode.
    pub fn new(backend: LlmBackend) -> Self {
        Self {
            scan_service: ScanService::new(backend.clone()),
            outreach_service: OutreachService::new(backend),
        }
    }

    pub fn is_mock(&self) -> bool {
        self.scan_service.is_mock()
    }
}

#[derive(OpenApi)]
#[openapi(
    paths(health, scan_report, assess_risk, generate_outreach),
    components(schemas(
        HealthRes,
        ApiErrorRes,
        ScanReportReq,
        PatientContextReq,
        ScanReportRes,
        ScanReportData,
        AssessRiskReq,
        AssessRiskRes,
        AssessRiskData,
        GenerateOutreachReq,
        GenerateOutreachRes,
        GenerateOutreachData,
        PatientContext,
        ScanResult,
        KeyFindings,
        Fracture,
        RiskLevel,
        RiskAssessment,
        OutreachPatient,
        OutreachContent,
        EmailContent,
        SelfAssessment,
    ))
)]
pub struct ApiDoc;

/// Build the REST router with OpenAPI docs and permissive CORS.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/api/reports/scan", post(scan_report))
        .route("/api/risk/assess", post(assess_risk))
        .route("/api/outreach/generate", post(generate_outreach))
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

fn timestamp() -> String {
    chrono::Utc::now().to_rfc3339()
}

#[utoipa::path(
    get,
    path = "/health",
    responses(
        (status = 200, description = "Health check response", body = HealthRes)
    )
)]
/// Health check endpoint for the REST API
///
/// The message flags when the service is running on the mock backend.
#[axum::debug_handler]
async fn health(State(state): State<AppState>) -> Json<HealthRes> {
    Json(HealthService::check_health(state.is_mock()))
}

#[utoipa::path(
    post,
    path = "/api/reports/scan",
    request_body = ScanReportReq,
    responses(
        (status = 200, description = "Report scanned and assessed", body = ScanReportRes),
        (status = 400, description = "Missing reportText or patientContext.patientId", body = ApiErrorRes),
        (status = 500, description = "Scan failed", body = ApiErrorRes)
    )
)]
/// Scan a radiology report and derive its risk assessment
///
/// Validates the request before any model call: `reportText` must be non-blank and
/// `patientContext.patientId` must be present.
///
/// # Errors
/// Returns `400 Bad Request` for malformed bodies or missing fields, and
/// `500 Internal Server Error` with the underlying message for any scan failure.
#[axum::debug_handler]
async fn scan_report(
    State(state): State<AppState>,
    payload: Result<Json<ScanReportReq>, JsonRejection>,
) -> Result<Json<ScanReportRes>, ApiError> {
    let Json(req) = payload?;

    let report_text = req
        .report_text
        .filter(|text| !text.trim().is_empty())
        .ok_or_else(|| ApiError::BadRequest("reportText is required".into()))?;
    let patient = req
        .patient_context
        .and_then(PatientContextReq::into_context)
        .ok_or_else(|| ApiError::BadRequest("patientContext.patientId is required".into()))?;

    let scan_result = state.scan_service.scan(&report_text, &patient).await?;
    let risk_assessment = derive_risk_assessment(&scan_result, Some(&patient));

    tracing::info!(
        patient_id = %patient.patient_id,
        risk_score = scan_result.risk_score.value(),
        priority = %risk_assessment.priority,
        mock = state.is_mock(),
        "report scanned"
    );

    Ok(Json(ScanReportRes::ok(ScanReportData {
        scan_result,
        risk_assessment,
        timestamp: timestamp(),
        mock: state.is_mock(),
    })))
}

#[utoipa::path(
    post,
    path = "/api/risk/assess",
    request_body = AssessRiskReq,
    responses(
        (status = 200, description = "Risk assessment derived", body = AssessRiskRes),
        (status = 400, description = "Missing or malformed scanResult", body = ApiErrorRes)
    )
)]
/// Derive a risk assessment from an existing scan result
///
/// Pure derivation; never calls the model.
#[axum::debug_handler]
async fn assess_risk(
    payload: Result<Json<AssessRiskReq>, JsonRejection>,
) -> Result<Json<AssessRiskRes>, ApiError> {
    let Json(req) = payload?;

    let scan_result = req
        .scan_result
        .ok_or_else(|| ApiError::BadRequest("scanResult is required".into()))?;
    let risk_assessment = derive_risk_assessment(&scan_result, req.patient_context.as_ref());

    Ok(Json(AssessRiskRes::ok(AssessRiskData {
        risk_assessment,
        timestamp: timestamp(),
    })))
}

#[utoipa::path(
    post,
    path = "/api/outreach/generate",
    request_body = GenerateOutreachReq,
    responses(
        (status = 200, description = "Outreach content generated", body = GenerateOutreachRes),
        (status = 400, description = "Missing patient or scanResult", body = ApiErrorRes),
        (status = 500, description = "Generation failed", body = ApiErrorRes)
    )
)]
/// Generate patient outreach content
///
/// When `riskAssessment` is omitted it is derived from `scanResult`.
///
/// # Errors
/// Returns `400 Bad Request` for malformed bodies or missing fields, and
/// `500 Internal Server Error` with the underlying message for any generation failure.
#[axum::debug_handler]
async fn generate_outreach(
    State(state): State<AppState>,
    payload: Result<Json<GenerateOutreachReq>, JsonRejection>,
) -> Result<Json<GenerateOutreachRes>, ApiError> {
    let Json(req) = payload?;

    let patient = req
        .patient
        .ok_or_else(|| ApiError::BadRequest("patient is required".into()))?;
    let scan_result = req
        .scan_result
        .ok_or_else(|| ApiError::BadRequest("scanResult is required".into()))?;
    let risk_assessment = req
        .risk_assessment
        .unwrap_or_else(|| derive_risk_assessment(&scan_result, None));

    let content = state
        .outreach_service
        .generate(&patient, &scan_result, &risk_assessment)
        .await?;

    tracing::info!(
        patient_id = %scan_result.patient_id,
        priority = %risk_assessment.priority,
        mock = state.is_mock(),
        "outreach generated"
    );

    Ok(Json(GenerateOutreachRes::ok(GenerateOutreachData {
        content,
        risk_assessment,
        timestamp: timestamp(),
        mock: state.is_mock(),
    })))
}
