//! Request and response envelopes.
//!
//! Request bodies are deliberately loose (every field optional) so that handlers can report a
//! missing field as `400` with a readable message instead of a generic deserialisation failure.
//! Success bodies are `{ success: true, data }`; failures are [`ApiErrorRes`].

use mtf_core::{OutreachContent, OutreachPatient, PatientContext, RiskAssessment, ScanResult};
use mtf_types::PatientId;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use utoipa::ToSchema;

/// Scan request context. Everything except `patientId` is forwarded to the prompt as sent.
#[derive(Clone, Debug, Default, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase", default)]
pub struct PatientContextReq {
    #[schema(value_type = Option<String>)]
    pub patient_id: Option<PatientId>,
    #[schema(value_type = Option<Object>)]
    pub age: Option<Value>,
    #[schema(value_type = Option<Object>)]
    pub gender: Option<Value>,
    #[schema(value_type = Option<Object>)]
    pub medical_history: Option<Value>,
}

impl PatientContextReq {
    /// Convert into a domain context. Returns `None` when the patient identifier is missing.
    pub fn into_context(self) -> Option<PatientContext> {
        Some(PatientContext {
            patient_id: self.patient_id?,
            age: self.age,
            gender: self.gender,
            medical_history: self.medical_history,
        })
    }
}

#[derive(Clone, Debug, Default, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase", default)]
pub struct ScanReportReq {
    pub report_text: Option<String>,
    pub patient_context: Option<PatientContextReq>,
}

#[derive(Clone, Debug, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ScanReportData {
    pub scan_result: ScanResult,
    pub risk_assessment: RiskAssessment,
    /// RFC 3339 UTC time the response was produced.
    pub timestamp: String,
    /// `true` when the scan result is a development fixture rather than model output.
    pub mock: bool,
}

#[derive(Clone, Debug, Deserialize, Serialize, ToSchema)]
pub struct ScanReportRes {
    pub success: bool,
    pub data: ScanReportData,
}

impl ScanReportRes {
    pub fn ok(data: ScanReportData) -> Self {
        Self {
            success: true,
            data,
        }
    }
}

#[derive(Clone, Debug, Default, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase", default)]
pub struct AssessRiskReq {
    pub scan_result: Option<ScanResult>,
    pub patient_context: Option<PatientContext>,
}

#[derive(Clone, Debug, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AssessRiskData {
    pub risk_assessment: RiskAssessment,
    pub timestamp: String,
}

#[derive(Clone, Debug, Deserialize, Serialize, ToSchema)]
pub struct AssessRiskRes {
    pub success: bool,
    pub data: AssessRiskData,
}

impl AssessRiskRes {
    pub fn ok(data: AssessRiskData) -> Self {
        Self {
            success: true,
            data,
        }
    }
}

#[derive(Clone, Debug, Default, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase", default)]
pub struct GenerateOutreachReq {
    pub patient: Option<OutreachPatient>,
    pub scan_result: Option<ScanResult>,
    /// Derived from `scanResult` when omitted.
    pub risk_assessment: Option<RiskAssessment>,
}

#[derive(Clone, Debug, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct GenerateOutreachData {
    pub content: OutreachContent,
    pub risk_assessment: RiskAssessment,
    pub timestamp: String,
    pub mock: bool,
}

#[derive(Clone, Debug, Deserialize, Serialize, ToSchema)]
pub struct GenerateOutreachRes {
    pub success: bool,
    pub data: GenerateOutreachData,
}

impl GenerateOutreachRes {
    pub fn ok(data: GenerateOutreachData) -> Self {
        Self {
            success: true,
            data,
        }
    }
}

/// Failure body for every endpoint.
#[derive(Clone, Debug, Deserialize, Serialize, ToSchema)]
pub struct ApiErrorRes {
    pub success: bool,
    pub error: String,
    pub message: String,
}

impl ApiErrorRes {
    pub fn new(error: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            success: false,
            error: error.into(),
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn scan_request_tolerates_missing_fields() {
        let req: ScanReportReq = serde_json::from_value(json!({})).unwrap();
        assert!(req.report_text.is_none());
        assert!(req.patient_context.is_none());

        let req: ScanReportReq =
            serde_json::from_value(json!({ "patientContext": { "age": 70 } })).unwrap();
        assert!(req.patient_context.unwrap().into_context().is_none());
    }

    #[test]
    fn patient_context_request_converts_when_id_present() {
        let req: PatientContextReq = serde_json::from_value(json!({
            "patientId": 314,
            "gender": "male",
            "medicalHistory": ["COPD"]
        }))
        .unwrap();

        let ctx = req.into_context().unwrap();
        assert_eq!(ctx.patient_id.as_str(), "314");
        assert_eq!(ctx.gender, Some(json!("male")));
        assert_eq!(ctx.medical_history, Some(json!(["COPD"])));
    }

    #[test]
    fn scan_request_accepts_any_context_value_types() {
        for context in [
            json!({ "patientId": "P-1", "age": "72" }),
            json!({ "patientId": "P-1", "age": 72.5 }),
            json!({ "patientId": "P-1", "gender": 1 }),
            json!({ "patientId": "P-1", "medicalHistory": "osteoporosis" }),
        ] {
            let req: ScanReportReq = serde_json::from_value(json!({
                "reportText": "Fracture of the left distal radius.",
                "patientContext": context
            }))
            .unwrap();
            assert!(req.patient_context.unwrap().into_context().is_some());
        }
    }

    #[test]
    fn error_body_is_marked_unsuccessful() {
        let body = serde_json::to_value(ApiErrorRes::new("Bad request", "reportText is required"))
            .unwrap();
        assert_eq!(
            body,
            json!({ "success": false, "error": "Bad request", "message": "reportText is required" })
        );
    }
}
