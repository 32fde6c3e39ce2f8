//! Prompt templates for report scanning and outreach generation.

use crate::models::{PatientContext, RiskAssessment, ScanResult};
use crate::outreach::OutreachPatient;
use crate::{CoreError, CoreResult};
use mtf_types::NonEmptyText;
use serde_json::Value;

/// System prompt for radiology report extraction.
pub const SCAN_SYSTEM_PROMPT: &str = r#"You are a clinical radiology assistant that screens radiology reports for minimal trauma fractures (MTF).

Tasks:
1. Extract every fracture mentioned in the report text.
2. Classify each fracture as a minimal trauma fracture or not. A fracture is minimal trauma when ANY of these hold:
   - it resulted from a fall from standing height or lower;
   - the mechanism was low-energy (e.g. bending, lifting, coughing, turning in bed);
   - the patient is over 50 with osteoporosis risk factors;
   - the fracture pattern is typical of osteoporosis (vertebral compression, hip, distal radius, proximal humerus).
3. Exclude irrelevant fractures: high-trauma fractures (motor vehicle accidents, falls from height, sports impact), pathological fractures from malignancy, and fractures of the hands, fingers, feet or toes.
4. Estimate an overall osteoporotic fracture risk score from 0 to 100 and a risk level.

Respond with a single JSON object and nothing else, using exactly this shape:
{
  "riskScore": <integer 0-100>,
  "riskLevel": "low" | "medium" | "high" | "critical",
  "keyFindings": {
    "fractures": [
      {
        "location": <string>,
        "type": <string>,
        "severity": <string>,
        "mechanism": <string>,
        "isMinimalTrauma": <boolean>
      }
    ],
    "riskFactors": [<string>],
    "recommendations": [<string>],
    "followUpRequired": <boolean>
  },
  "mtfSuspected": <boolean>,
  "confidence": <integer 0-100>
}

If no relevant fractures are found return an empty fractures array, mtfSuspected false and a low risk score."#;

/// Render a caller-supplied context value as prompt text. Blank values render as `None`.
fn render_context_value(value: Option<&Value>) -> Option<String> {
    let text = match value? {
        Value::Null => return None,
        Value::String(s) => s.trim().to_string(),
        Value::Array(items) => items
            .iter()
            .filter_map(|item| render_context_value(Some(item)))
            .collect::<Vec<_>>()
            .join(", "),
        other => other.to_string(),
    };
    (!text.is_empty()).then_some(text)
}

/// Build the user prompt for a report scan.
pub fn scan_user_prompt(report_text: &NonEmptyText, patient: &PatientContext) -> String {
    let age = render_context_value(patient.age.as_ref()).unwrap_or_else(|| "Unknown".into());
    let gender = render_context_value(patient.gender.as_ref()).unwrap_or_else(|| "Unknown".into());
    let history = render_context_value(patient.medical_history.as_ref())
        .unwrap_or_else(|| "None provided".into());

    format!(
        "Patient context:\n\
         - Patient ID: {}\n\
         - Age: {age}\n\
         - Gender: {gender}\n\
         - Medical history: {history}\n\
         \n\
         Radiology report:\n\
         \"\"\"\n\
         {}\n\
         \"\"\"\n\
         \n\
         Analyse this report and respond with the JSON object described in your instructions.",
        patient.patient_id,
        report_text.as_str(),
    )
}

/// System prompt for patient outreach content.
pub const OUTREACH_SYSTEM_PROMPT: &str = r#"You are a patient communication specialist for a fracture liaison service.

Write clear, compassionate outreach for a patient whose radiology report suggests a possible minimal trauma fracture and osteoporosis risk. Use plain language at roughly a sixth-grade reading level. Do not state a diagnosis; invite the patient to a follow-up assessment. Match the tone to the priority: critical and high priority outreach should ask the patient to respond promptly.

Respond with a single JSON object and nothing else, using exactly this shape:
{
  "email": { "subject": <string>, "body": <string> },
  "sms": <string, at most 160 characters>,
  "phoneScript": <string>,
  "selfAssessment": { "title": <string>, "questions": [<string>] }
}"#;

/// Build the user prompt for outreach generation.
///
/// # Errors
/// Returns `CoreError::Serialization` if the scan or assessment cannot be rendered as JSON.
pub fn outreach_user_prompt(
    patient: &OutreachPatient,
    scan: &ScanResult,
    assessment: &RiskAssessment,
) -> CoreResult<String> {
    let findings =
        serde_json::to_string_pretty(&scan.key_findings).map_err(CoreError::Serialization)?;
    let recommendations = if assessment.recommendations.is_empty() {
        "None".to_string()
    } else {
        assessment.recommendations.join("; ")
    };

    Ok(format!(
        "Patient:\n\
         - Name: {}\n\
         - Age: {}\n\
         - Preferred contact: {}\n\
         \n\
         Scan summary:\n\
         - Risk score: {} ({})\n\
         - Minimal trauma fracture suspected: {}\n\
         - Findings: {findings}\n\
         \n\
         Assessment:\n\
         - Priority: {}\n\
         - Action needed within: {} hours\n\
         - Recommendations: {recommendations}\n\
         \n\
         Write the outreach JSON object described in your instructions.",
        patient.display_name(),
        patient
            .age
            .map(|a| a.to_string())
            .unwrap_or_else(|| "Unknown".into()),
        patient.preferred_contact(),
        scan.risk_score,
        scan.risk_level,
        if scan.mtf_suspected { "yes" } else { "no" },
        assessment.priority,
        assessment.estimated_urgency,
    ))
}
