use thiserror::Error;

#[derive(Debug, Error)]
pub enum AlignError {
    #[error("unsupported payload version {version} (this build reads version {supported})")]
    UnsupportedPayloadVersion { version: u32, supported: u32 },
    #[error("JSON parse error while {context}: {source}")]
    Json {
        context: &'static str,
        #[source]
        source: serde_json::Error,
    },
    #[error("score source failed while {context}: {message}")]
    ScoreSource {
        context: &'static str,
        message: String,
    },
    #[error("invalid input: {message}")]
    InvalidInput { message: String },
}

impl AlignError {
    pub(crate) fn json(context: &'static str, source: serde_json::Error) -> Self {
        Self::Json { context, source }
    }

    /// For [`crate::pipeline::traits::ScoreSource`] implementations wrapping
    /// their parser's failures.
    pub fn score_source(context: &'static str, err: impl std::fmt::Display) -> Self {
        Self::ScoreSource {
            context,
            message: err.to_string(),
        }
    }

    pub(crate) fn invalid_input(message: impl Into<String>) -> Self {
        Self::InvalidInput {
            message: message.into(),
        }
    }
}
