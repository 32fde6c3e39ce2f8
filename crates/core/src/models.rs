//! Transient value objects that flow through the scan pipeline.
//!
//! None of these are persisted. A [`ScanResult`] is built fresh per request from model output
//! (or the mock fixture) and a [`RiskAssessment`] is recomputed from it on every call.

use crate::constants::HIGH_RISK_THRESHOLD;
use mtf_types::{PatientId, Score};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use utoipa::ToSchema;

/// Caller-supplied patient context.
///
/// Only `patientId` is checked. Age, gender and medical history are kept as whatever JSON the
/// caller sent and rendered into the prompt uninspected.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PatientContext {
    #[schema(value_type = String, example = "P-1042")]
    pub patient_id: PatientId,
    #[serde(default)]
    #[schema(value_type = Option<Object>)]
    pub age: Option<Value>,
    #[serde(default)]
    #[schema(value_type = Option<Object>)]
    pub gender: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[schema(value_type = Option<Object>)]
    pub medical_history: Option<Value>,
}

impl PatientContext {
    pub fn new(patient_id: PatientId) -> Self {
        Self {
            patient_id,
            age: None,
            gender: None,
            medical_history: None,
        }
    }
}

/// Risk tier shared by the model's own `riskLevel` and the derived `priority`.
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, ToSchema,
)]
#[serde(rename_all = "lowercase")]
pub enum RiskLevel {
    #[default]
    Low,
    Medium,
    High,
    Critical,
}

impl RiskLevel {
    pub fn as_str(self) -> &'static str {
        match self {
            RiskLevel::Low => "low",
            RiskLevel::Medium => "medium",
            RiskLevel::High => "high",
            RiskLevel::Critical => "critical",
        }
    }
}

impl fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One fracture extracted from the report text.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase", default)]
pub struct Fracture {
    pub location: String,
    #[serde(rename = "type")]
    pub fracture_type: String,
    pub severity: String,
    pub mechanism: String,
    pub is_minimal_trauma: bool,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase", default)]
pub struct KeyFindings {
    pub fractures: Vec<Fracture>,
    pub risk_factors: Vec<String>,
    pub recommendations: Vec<String>,
    pub follow_up_required: bool,
}

/// Structured result of scanning one radiology report.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ScanResult {
    #[schema(value_type = String)]
    pub patient_id: PatientId,
    #[schema(value_type = u8, minimum = 0, maximum = 100)]
    pub risk_score: Score,
    pub risk_level: RiskLevel,
    #[serde(default)]
    pub key_findings: KeyFindings,
    #[serde(default)]
    pub mtf_suspected: bool,
    #[schema(value_type = u8, minimum = 0, maximum = 100)]
    pub confidence: Score,
    /// Wall-clock milliseconds spent on the model call.
    #[serde(default)]
    pub processing_time: u64,
}

impl ScanResult {
    pub fn is_high_risk(&self) -> bool {
        self.risk_score.value() >= HIGH_RISK_THRESHOLD
    }
}

/// Priority and follow-up plan derived from a [`ScanResult`].
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RiskAssessment {
    pub priority: RiskLevel,
    pub recommendations: Vec<String>,
    pub follow_up_required: bool,
    /// Hours until action is required.
    pub estimated_urgency: u32,
}
