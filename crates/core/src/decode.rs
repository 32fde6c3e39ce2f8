//! Schema-validated decoding of model output.
//!
//! Decoding runs in two phases:
//!
//! 1. **Structural**: the raw JSON is validated against a fixed JSON Schema with the `jsonschema`
//!    crate. Fields may be absent or `null`, but any other value must have the right type and
//!    range. All violations are collected so the error names every problem at once.
//! 2. **Defaulting**: absent and `null` fields take explicit defaults (empty arrays, zero, `false`,
//!    `low`, empty strings) while the value is converted into the domain types.
//!
//! Caller-owned fields (`patientId`, `processingTime`) are never taken from the model.

use crate::models::{Fracture, KeyFindings, RiskLevel, ScanResult};
use crate::outreach::{EmailContent, OutreachContent, SelfAssessment};
use crate::{CoreError, CoreResult};
use mtf_types::{PatientId, Score};
use serde::Deserialize;
use jsonschema::Validator;
use serde_json::{json, Value};
use std::sync::LazyLock;

static SCAN_VALIDATOR: LazyLock<Result<Validator, String>> =
    LazyLock::new(|| compile(&scan_output_schema()));

static OUTREACH_VALIDATOR: LazyLock<Result<Validator, String>> =
    LazyLock::new(|| compile(&outreach_output_schema()));

fn compile(schema: &Value) -> Result<Validator, String> {
    jsonschema::validator_for(schema).map_err(|e| e.to_string())
}

fn nullable_string() -> Value {
    json!({ "type": ["string", "null"] })
}

fn nullable_bool() -> Value {
    json!({ "type": ["boolean", "null"] })
}

fn string_array() -> Value {
    json!({ "type": ["array", "null"], "items": { "type": "string" } })
}

fn percentage() -> Value {
    json!({ "type": ["integer", "null"], "minimum": 0, "maximum": 100 })
}

/// JSON Schema for the scan model output.
pub fn scan_output_schema() -> Value {
    json!({
        "type": "object",
        "properties": {
            "riskScore": percentage(),
            "riskLevel": { "enum": ["low", "medium", "high", "critical", null] },
            "keyFindings": {
                "type": ["object", "null"],
                "properties": {
                    "fractures": {
                        "type": ["array", "null"],
                        "items": {
                            "type": "object",
                            "properties": {
                                "location": nullable_string(),
                                "type": nullable_string(),
                                "severity": nullable_string(),
                                "mechanism": nullable_string(),
                                "isMinimalTrauma": nullable_bool()
                            }
                        }
                    },
                    "riskFactors": string_array(),
                    "recommendations": string_array(),
                    "followUpRequired": nullable_bool()
                }
            },
            "mtfSuspected": nullable_bool(),
            "confidence": percentage()
        }
    })
}

/// JSON Schema for the outreach model output.
pub fn outreach_output_schema() -> Value {
    json!({
        "type": "object",
        "properties": {
            "email": {
                "type": ["object", "null"],
                "properties": {
                    "subject": nullable_string(),
                    "body": nullable_string()
                }
            },
            "sms": nullable_string(),
            "phoneScript": nullable_string(),
            "selfAssessment": {
                "type": ["object", "null"],
                "properties": {
                    "title": nullable_string(),
                    "questions": string_array()
                }
            }
        }
    })
}

/// Validate `instance` against a compiled schema, collecting every violation into one error.
fn validate(validator: &Result<Validator, String>, instance: &Value) -> CoreResult<()> {
    let validator = validator
        .as_ref()
        .map_err(|e| CoreError::Schema(e.clone()))?;

    let violations: Vec<String> = validator
        .iter_errors(instance)
        .map(|error| {
            let path = error.instance_path.to_string();
            if path.is_empty() {
                error.to_string()
            } else {
                format!("{path}: {error}")
            }
        })
        .collect();

    if violations.is_empty() {
        Ok(())
    } else {
        tracing::warn!(count = violations.len(), "model output failed schema validation");
        Err(CoreError::ModelOutput(violations.join("; ")))
    }
}

#[derive(Deserialize, Default)]
#[serde(rename_all = "camelCase", default)]
struct RawScanOutput {
    risk_score: Option<f64>,
    risk_level: Option<RiskLevel>,
    key_findings: Option<RawKeyFindings>,
    mtf_suspected: Option<bool>,
    confidence: Option<f64>,
}

#[derive(Deserialize, Default)]
#[serde(rename_all = "camelCase", default)]
struct RawKeyFindings {
    fractures: Option<Vec<RawFracture>>,
    risk_factors: Option<Vec<String>>,
    recommendations: Option<Vec<String>>,
    follow_up_required: Option<bool>,
}

#[derive(Deserialize, Default)]
#[serde(rename_all = "camelCase", default)]
struct RawFracture {
    location: Option<String>,
    #[serde(rename = "type")]
    fracture_type: Option<String>,
    severity: Option<String>,
    mechanism: Option<String>,
    is_minimal_trauma: Option<bool>,
}

impl From<RawFracture> for Fracture {
    fn from(raw: RawFracture) -> Self {
        Fracture {
            location: raw.location.unwrap_or_default(),
            fracture_type: raw.fracture_type.unwrap_or_default(),
            severity: raw.severity.unwrap_or_default(),
            mechanism: raw.mechanism.unwrap_or_default(),
            is_minimal_trauma: raw.is_minimal_trauma.unwrap_or(false),
        }
    }
}

/// Convert a schema-checked JSON integer (which may arrive as `75.0`) into a [`Score`].
fn score_from(value: Option<f64>, field: &str) -> CoreResult<Score> {
    let Some(raw) = value else {
        return Ok(Score::default());
    };
    if raw.fract() != 0.0 || !(0.0..=f64::from(Score::MAX)).contains(&raw) {
        return Err(CoreError::ModelOutput(format!(
            "{field} must be an integer between 0 and 100, got {raw}"
        )));
    }
    Score::try_from(raw as u64).map_err(|e| CoreError::ModelOutput(format!("{field}: {e}")))
}

/// Decode a scan model response into a [`ScanResult`].
///
/// # Errors
/// Returns `CoreError::ModelOutput` if the value violates the output schema.
pub fn decode_scan_output(
    value: &Value,
    patient_id: PatientId,
    processing_time_ms: u64,
) -> CoreResult<ScanResult> {
    validate(&SCAN_VALIDATOR, value)?;

    let raw: RawScanOutput = serde_json::from_value(value.clone())
        .map_err(|e| CoreError::ModelOutput(e.to_string()))?;
    let findings = raw.key_findings.unwrap_or_default();

    Ok(ScanResult {
        patient_id,
        risk_score: score_from(raw.risk_score, "riskScore")?,
        risk_level: raw.risk_level.unwrap_or_default(),
        key_findings: KeyFindings {
            fractures: findings
                .fractures
                .unwrap_or_default()
                .into_iter()
                .map(Fracture::from)
                .collect(),
            risk_factors: findings.risk_factors.unwrap_or_default(),
            recommendations: findings.recommendations.unwrap_or_default(),
            follow_up_required: findings.follow_up_required.unwrap_or(false),
        },
        mtf_suspected: raw.mtf_suspected.unwrap_or(false),
        confidence: score_from(raw.confidence, "confidence")?,
        processing_time: processing_time_ms,
    })
}

#[derive(Deserialize, Default)]
#[serde(rename_all = "camelCase", default)]
struct RawOutreachOutput {
    email: Option<RawEmail>,
    sms: Option<String>,
    phone_script: Option<String>,
    self_assessment: Option<RawSelfAssessment>,
}

#[derive(Deserialize, Default)]
#[serde(default)]
struct RawEmail {
    subject: Option<String>,
    body: Option<String>,
}

#[derive(Deserialize, Default)]
#[serde(default)]
struct RawSelfAssessment {
    title: Option<String>,
    questions: Option<Vec<String>>,
}

/// Decode an outreach model response into [`OutreachContent`].
///
/// # Errors
/// Returns `CoreError::ModelOutput` if the value violates the output schema.
pub fn decode_outreach_output(value: &Value) -> CoreResult<OutreachContent> {
    validate(&OUTREACH_VALIDATOR, value)?;

    let raw: RawOutreachOutput = serde_json::from_value(value.clone())
        .map_err(|e| CoreError::ModelOutput(e.to_string()))?;
    let email = raw.email.unwrap_or_default();
    let self_assessment = raw.self_assessment.unwrap_or_default();

    Ok(OutreachContent {
        email: EmailContent {
            subject: email.subject.unwrap_or_default(),
            body: email.body.unwrap_or_default(),
        },
        sms: raw.sms.unwrap_or_default(),
        phone_script: raw.phone_script.unwrap_or_default(),
        self_assessment: SelfAssessment {
            title: self_assessment.title.unwrap_or_default(),
            questions: self_assessment.questions.unwrap_or_default(),
        },
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pid() -> PatientId {
        PatientId::new("P-100").unwrap()
    }

    #[test]
    fn decodes_complete_scan_output() {
        let value = json!({
            "patientId": "someone-else",
            "riskScore": 82,
            "riskLevel": "high",
            "keyFindings": {
                "fractures": [{
                    "location": "left femoral neck",
                    "type": "subcapital",
                    "severity": "displaced",
                    "mechanism": "fall from standing height",
                    "isMinimalTrauma": true
                }],
                "riskFactors": ["age over 65", "previous wrist fracture"],
                "recommendations": ["DEXA scan"],
                "followUpRequired": true
            },
            "mtfSuspected": true,
            "confidence": 91,
            "processingTime": 5
        });

        let scan = decode_scan_output(&value, pid(), 1534).unwrap();

        assert_eq!(scan.patient_id, pid());
        assert_eq!(scan.processing_time, 1534);
        assert_eq!(scan.risk_score.value(), 82);
        assert_eq!(scan.risk_level, RiskLevel::High);
        assert_eq!(scan.confidence.value(), 91);
        assert!(scan.mtf_suspected);
        assert_eq!(scan.key_findings.fractures.len(), 1);
        assert_eq!(scan.key_findings.fractures[0].fracture_type, "subcapital");
        assert!(scan.key_findings.fractures[0].is_minimal_trauma);
        assert_eq!(scan.key_findings.risk_factors.len(), 2);
        assert!(scan.key_findings.follow_up_required);
    }

    #[test]
    fn missing_fields_take_explicit_defaults() {
        let scan = decode_scan_output(&json!({}), pid(), 7).unwrap();

        assert_eq!(scan.risk_score.value(), 0);
        assert_eq!(scan.risk_level, RiskLevel::Low);
        assert_eq!(scan.confidence.value(), 0);
        assert!(!scan.mtf_suspected);
        assert_eq!(scan.key_findings, KeyFindings::default());
    }

    #[test]
    fn null_fracture_text_becomes_empty() {
        let value = json!({
            "keyFindings": { "fractures": [{ "location": "L2", "mechanism": null }] }
        });

        let scan = decode_scan_output(&value, pid(), 0).unwrap();
        let fracture = &scan.key_findings.fractures[0];
        assert_eq!(fracture.location, "L2");
        assert_eq!(fracture.mechanism, "");
        assert!(!fracture.is_minimal_trauma);
    }

    #[test]
    fn null_fields_take_the_same_defaults_as_missing_ones() {
        let value = json!({
            "riskScore": null,
            "riskLevel": null,
            "keyFindings": {
                "fractures": null,
                "riskFactors": null,
                "recommendations": null,
                "followUpRequired": null
            },
            "mtfSuspected": null,
            "confidence": null
        });

        let scan = decode_scan_output(&value, pid(), 3).unwrap();

        assert_eq!(scan.risk_score.value(), 0);
        assert_eq!(scan.risk_level, RiskLevel::Low);
        assert_eq!(scan.confidence.value(), 0);
        assert!(!scan.mtf_suspected);
        assert_eq!(scan.key_findings, KeyFindings::default());

        let scan = decode_scan_output(&json!({ "keyFindings": null }), pid(), 3).unwrap();
        assert_eq!(scan.key_findings, KeyFindings::default());
    }

    #[test]
    fn each_nullable_field_decodes_on_its_own() {
        for field in ["riskScore", "riskLevel", "keyFindings", "mtfSuspected", "confidence"] {
            let value = json!({ field: null });
            assert!(decode_scan_output(&value, pid(), 0).is_ok(), "{field}: null");
        }
        for field in ["fractures", "riskFactors", "recommendations", "followUpRequired"] {
            let value = json!({ "keyFindings": { field: null } });
            assert!(decode_scan_output(&value, pid(), 0).is_ok(), "keyFindings.{field}: null");
        }
    }

    #[test]
    fn output_schemas_compile() {
        assert!(SCAN_VALIDATOR.is_ok());
        assert!(OUTREACH_VALIDATOR.is_ok());
    }

    #[test]
    fn integral_floats_are_accepted_as_scores() {
        let scan = decode_scan_output(&json!({ "riskScore": 75.0 }), pid(), 0).unwrap();
        assert_eq!(scan.risk_score.value(), 75);
    }

    #[test]
    fn out_of_range_risk_score_is_rejected() {
        let err = decode_scan_output(&json!({ "riskScore": 140 }), pid(), 0).unwrap_err();
        match err {
            CoreError::ModelOutput(msg) => assert!(msg.contains("riskScore"), "{msg}"),
            other => panic!("expected ModelOutput error, got {other:?}"),
        }

        assert!(decode_scan_output(&json!({ "confidence": -3 }), pid(), 0).is_err());
        assert!(decode_scan_output(&json!({ "riskScore": 55.5 }), pid(), 0).is_err());
    }

    #[test]
    fn unknown_risk_level_and_wrong_types_are_rejected_together() {
        let value = json!({
            "riskLevel": "extreme",
            "mtfSuspected": "yes",
            "keyFindings": { "recommendations": "DEXA scan" }
        });

        let err = decode_scan_output(&value, pid(), 0).unwrap_err();
        match err {
            CoreError::ModelOutput(msg) => {
                assert!(msg.contains("/riskLevel"), "{msg}");
                assert!(msg.contains("/mtfSuspected"), "{msg}");
                assert!(msg.contains("/keyFindings/recommendations"), "{msg}");
            }
            other => panic!("expected ModelOutput error, got {other:?}"),
        }
    }

    #[test]
    fn non_object_output_is_rejected() {
        assert!(decode_scan_output(&json!(["not", "an", "object"]), pid(), 0).is_err());
    }

    #[test]
    fn decodes_outreach_with_defaults() {
        let value = json!({
            "email": { "subject": "Your recent X-ray" },
            "sms": "Please call us about your recent X-ray.",
            "selfAssessment": { "questions": ["Have you fallen in the past year?"] }
        });

        let content = decode_outreach_output(&value).unwrap();

        assert_eq!(content.email.subject, "Your recent X-ray");
        assert_eq!(content.email.body, "");
        assert_eq!(content.phone_script, "");
        assert_eq!(content.self_assessment.title, "");
        assert_eq!(content.self_assessment.questions.len(), 1);
    }

    #[test]
    fn null_outreach_sections_become_empty() {
        let value = json!({
            "email": null,
            "sms": null,
            "selfAssessment": { "title": "Bone health check", "questions": null }
        });

        let content = decode_outreach_output(&value).unwrap();

        assert_eq!(content.email.subject, "");
        assert_eq!(content.sms, "");
        assert_eq!(content.self_assessment.title, "Bone health check");
        assert!(content.self_assessment.questions.is_empty());
    }

    #[test]
    fn outreach_with_wrong_types_is_rejected() {
        assert!(decode_outreach_output(&json!({ "sms": 42 })).is_err());
    }
}
