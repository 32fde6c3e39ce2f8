//! Report scanning.
//!
//! [`ScanService::scan`] turns free-text radiology report plus patient context into a
//! [`ScanResult`]: one structured completion, timed by the caller, decoded through the scan
//! schema. There is no retry and no partial result; any failure is returned to the caller.

use crate::constants::{MOCK_PROCESSING_TIME_MS, SCAN_TEMPERATURE};
use crate::decode::decode_scan_output;
use crate::llm::{CompletionRequest, LlmBackend};
use crate::models::{Fracture, KeyFindings, PatientContext, RiskLevel, ScanResult};
use crate::prompt::{scan_user_prompt, SCAN_SYSTEM_PROMPT};
use crate::{CoreError, CoreResult};
use mtf_types::{NonEmptyText, PatientId, Score};
use std::time::Instant;

#[derive(Clone, Debug)]
pub struct ScanService {
    backend: LlmBackend,
}

impl ScanService {
    pub fn new(backend: LlmBackend) -> Self {
        Self { backend }
    }

    /// Whether results come from fixtures rather than a model.
    pub fn is_mock(&self) -> bool {
        self.backend.is_mock()
    }

    /// Scan one radiology report.
    ///
    /// # Errors
    /// - `CoreError::InvalidInput` if `report_text` is blank (no outbound call is made).
    /// - `CoreError::Llm` if the completion call fails.
    /// - `CoreError::ModelOutput` if the model output violates the scan schema.
    pub async fn scan(&self, report_text: &str, patient: &PatientContext) -> CoreResult<ScanResult> {
        let report = NonEmptyText::new(report_text)
            .map_err(|_| CoreError::InvalidInput("reportText cannot be empty".into()))?;

        let client = match &self.backend {
            LlmBackend::Mock => {
                tracing::warn!(
                    patient_id = %patient.patient_id,
                    "returning MOCK scan result; no LLM credential configured"
                );
                return Ok(mock_scan_result(patient.patient_id.clone()));
            }
            LlmBackend::Live(client) => client,
        };

        let request = CompletionRequest {
            system: SCAN_SYSTEM_PROMPT.to_string(),
            user: scan_user_prompt(&report, patient),
            temperature: SCAN_TEMPERATURE,
        };

        let started = Instant::now();
        let value = client.complete_structured(&request).await?;
        let processing_time = elapsed_ms(started);

        tracing::debug!(
            patient_id = %patient.patient_id,
            processing_time,
            "scan completion received"
        );

        decode_scan_output(&value, patient.patient_id.clone(), processing_time)
    }
}

/// Milliseconds since `started`, saturating at `u64::MAX`.
pub(crate) fn elapsed_ms(started: Instant) -> u64 {
    u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX)
}

/// Fixed development result. Identical for every patient apart from the echoed identifier.
pub fn mock_scan_result(patient_id: PatientId) -> ScanResult {
    ScanResult {
        patient_id,
        risk_score: Score::clamped(75),
        risk_level: RiskLevel::High,
        key_findings: KeyFindings {
            fractures: vec![Fracture {
                location: "L1 vertebra".into(),
                fracture_type: "Compression fracture".into(),
                severity: "Moderate".into(),
                mechanism: "Fall from standing height".into(),
                is_minimal_trauma: true,
            }],
            risk_factors: vec![
                "Age over 65".into(),
                "Female".into(),
                "Low-energy mechanism".into(),
            ],
            recommendations: vec![
                "DEXA scan".into(),
                "Bone health assessment".into(),
                "Falls risk assessment".into(),
            ],
            follow_up_required: true,
        },
        mtf_suspected: true,
        confidence: Score::clamped(87),
        processing_time: MOCK_PROCESSING_TIME_MS,
    }
}
