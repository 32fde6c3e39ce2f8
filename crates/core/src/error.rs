use crate::llm::LlmError;

#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("invalid input: {0}")]
    InvalidInput(String),
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
    #[error(
        "no LLM credential configured; set OPENAI_API_KEY, or MTF_ALLOW_MOCK_LLM=true for development"
    )]
    MissingCredential,
    #[error("LLM request failed: {0}")]
    Llm(#[from] LlmError),
    #[error("invalid model output: {0}")]
    ModelOutput(String),
    #[error("invalid output schema: {0}")]
    Schema(String),
    #[error("failed to serialize prompt context: {0}")]
    Serialization(serde_json::Error),
}

pub type CoreResult<T> = std::result::Result<T, CoreError>;
