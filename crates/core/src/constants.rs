//! Constants used throughout the MTF core crate.
//!
//! Thresholds, urgency windows and recommendation strings live here so that the risk table and
//! the mock fixtures stay in one place.

/// Default OpenAI-compatible API base URL.
pub const DEFAULT_LLM_BASE_URL: &str = "https://api.openai.com/v1";

/// Default chat-completion model.
pub const DEFAULT_LLM_MODEL: &str = "gpt-4o";

/// Default per-request HTTP timeout for LLM calls, in seconds.
pub const DEFAULT_LLM_TIMEOUT_SECS: u64 = 60;

/// Sampling temperature for report extraction. Kept low for near-deterministic output.
pub const SCAN_TEMPERATURE: f64 = 0.1;

/// Sampling temperature for patient-facing outreach copy.
pub const OUTREACH_TEMPERATURE: f64 = 0.7;

/// Risk score at or above which a scan is prioritised as critical.
pub const CRITICAL_RISK_THRESHOLD: u8 = 85;

/// Risk score at or above which a scan is prioritised as high.
pub const HIGH_RISK_THRESHOLD: u8 = 70;

/// Risk score at or above which a scan is prioritised as medium.
pub const MEDIUM_RISK_THRESHOLD: u8 = 50;

pub const CRITICAL_URGENCY_HOURS: u32 = 4;
pub const HIGH_URGENCY_HOURS: u32 = 24;
pub const MEDIUM_URGENCY_HOURS: u32 = 48;
pub const LOW_URGENCY_HOURS: u32 = 72;

pub const RECOMMEND_SPECIALIST_REVIEW: &str = "Immediate specialist review";
pub const RECOMMEND_OSTEOPOROSIS_ASSESSMENT: &str = "Osteoporosis assessment";
pub const RECOMMEND_URGENT_FOLLOW_UP: &str = "Urgent follow-up required";

/// Processing time reported by mock scans, in milliseconds.
pub const MOCK_PROCESSING_TIME_MS: u64 = 1200;
