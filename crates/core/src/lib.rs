//! # MTF Core
//!
//! Core logic for the radiology report scan pipeline:
//! - report scanning via an injected LLM capability ([`ScanService`])
//! - schema-validated decoding of model output
//! - fixed-threshold risk assessment derivation ([`derive_risk_assessment`])
//! - patient outreach generation ([`OutreachService`])
//!
//! **No API concerns**: HTTP routing, envelopes and status codes belong in `api-rest` and
//! `api-shared`.

pub mod config;
pub mod constants;
pub mod decode;
pub mod error;
pub mod llm;
pub mod models;
pub mod outreach;
pub mod prompt;
pub mod risk;
pub mod scan;

pub use config::CoreConfig;
pub use error::{CoreError, CoreResult};
pub use llm::{CompletionRequest, LlmBackend, LlmError, LlmResult, OpenAiClient, StructuredCompletion};
pub use models::{Fracture, KeyFindings, PatientContext, RiskAssessment, RiskLevel, ScanResult};
pub use outreach::{EmailContent, OutreachContent, OutreachPatient, OutreachService, SelfAssessment};
pub use risk::derive_risk_assessment;
pub use scan::{mock_scan_result, ScanService};

pub use mtf_types::{NonEmptyText, PatientId, Score};
