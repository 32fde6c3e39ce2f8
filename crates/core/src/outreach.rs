//! Patient outreach generation.
//!
//! Same prompt/decode pattern as the report scan: one structured completion per request, decoded
//! through the outreach schema. Mock mode fills a fixed template instead.

use crate::constants::OUTREACH_TEMPERATURE;
use crate::decode::decode_outreach_output;
use crate::llm::{CompletionRequest, LlmBackend};
use crate::models::{RiskAssessment, ScanResult};
use crate::prompt::{outreach_user_prompt, OUTREACH_SYSTEM_PROMPT};
use crate::scan::elapsed_ms;
use crate::CoreResult;
use mtf_types::PatientId;
use serde::{Deserialize, Serialize};
use std::time::Instant;
use utoipa::ToSchema;

/// Patient details supplied by the dashboard for outreach.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase", default)]
pub struct OutreachPatient {
    #[schema(value_type = Option<String>)]
    pub id: Option<PatientId>,
    pub name: Option<String>,
    pub age: Option<u32>,
    pub email: Option<String>,
    pub phone: Option<String>,
}

impl OutreachPatient {
    pub fn display_name(&self) -> &str {
        self.name
            .as_deref()
            .map(str::trim)
            .filter(|n| !n.is_empty())
            .unwrap_or("the patient")
    }

    pub fn preferred_contact(&self) -> &'static str {
        match (&self.email, &self.phone) {
            (Some(_), _) => "email",
            (None, Some(_)) => "phone",
            (None, None) => "unknown",
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct EmailContent {
    pub subject: String,
    pub body: String,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct SelfAssessment {
    pub title: String,
    pub questions: Vec<String>,
}

/// Generated patient-facing content.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct OutreachContent {
    pub email: EmailContent,
    pub sms: String,
    pub phone_script: String,
    pub self_assessment: SelfAssessment,
}

#[derive(Clone, Debug)]
pub struct OutreachService {
    backend: LlmBackend,
}

impl OutreachService {
    pub fn new(backend: LlmBackend) -> Self {
        Self { backend }
    }

    pub fn is_mock(&self) -> bool {
        self.backend.is_mock()
    }

    /// Generate outreach content for one patient.
    ///
    /// # Errors
    /// Returns an error if the LLM call fails or its output violates the outreach schema.
    pub async fn generate(
        &self,
        patient: &OutreachPatient,
        scan: &ScanResult,
        assessment: &RiskAssessment,
    ) -> CoreResult<OutreachContent> {
        match &self.backend {
            LlmBackend::Mock => {
                tracing::warn!(
                    patient_id = %scan.patient_id,
                    "returning MOCK outreach content; no LLM credential configured"
                );
                Ok(mock_outreach_content(patient, assessment))
            }
            LlmBackend::Live(client) => {
                let request = CompletionRequest {
                    system: OUTREACH_SYSTEM_PROMPT.to_string(),
                    user: outreach_user_prompt(patient, scan, assessment)?,
                    temperature: OUTREACH_TEMPERATURE,
                };

                let started = Instant::now();
                let value = client.complete_structured(&request).await?;
                tracing::debug!(
                    patient_id = %scan.patient_id,
                    elapsed_ms = elapsed_ms(started),
                    "outreach completion received"
                );

                decode_outreach_output(&value)
            }
        }
    }
}

/// Templated content used in mock mode.
pub fn mock_outreach_content(
    patient: &OutreachPatient,
    assessment: &RiskAssessment,
) -> OutreachContent {
    let name = patient.display_name();
    let hours = assessment.estimated_urgency;

    OutreachContent {
        email: EmailContent {
            subject: "Follow-up on your recent X-ray".into(),
            body: format!(
                "Dear {name},\n\nA recent imaging report showed a finding that we would like to \
                 follow up on. Please contact our bone health clinic within the next {hours} hours \
                 to arrange a short assessment.\n\nKind regards,\nFracture Liaison Service"
            ),
        },
        sms: format!(
            "Hi {name}, our bone health team would like to follow up on your recent X-ray. \
             Please call us within {hours} hours."
        ),
        phone_script: format!(
            "Hello, may I speak with {name}? I'm calling from the fracture liaison service about \
             your recent X-ray. This call is {} priority and we'd like to book a bone health \
             assessment for you.",
            assessment.priority
        ),
        self_assessment: SelfAssessment {
            title: "Bone health questionnaire".into(),
            questions: vec![
                "Have you had a fall in the past 12 months?".into(),
                "Have you broken a bone after the age of 50?".into(),
                "Has a parent broken a hip?".into(),
                "Do you take steroid tablets or have rheumatoid arthritis?".into(),
                "Do you smoke or drink more than 3 units of alcohol a day?".into(),
            ],
        },
    }
}
