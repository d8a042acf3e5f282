//! Error types for ClosureCast

/// Result type alias using ClosureCast's Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type for ClosureCast operations
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A feature named by the model was not submitted (absent, null or empty)
    #[error("'{0}' 필드가 누락되었습니다")]
    MissingField(String),

    /// A categorical feature received a value its encoder does not know
    #[error("'{field}' 값 '{value}'가 유효하지 않습니다")]
    InvalidCategory { field: String, value: String },

    /// A numeric feature received a value that does not parse as a number
    #[error("'{field}' 값이 숫자가 아닙니다: '{value}'")]
    NotNumeric { field: String, value: String },

    /// No model package was loaded at startup
    #[error("모델을 사용할 수 없습니다")]
    ModelUnavailable,

    /// The generation client could not be initialized (usually a missing API key)
    #[error("챗봇 기능을 사용할 수 없습니다")]
    GenerationClientUnavailable,

    /// The generation backend reported quota or rate-limit exhaustion
    #[error("generation quota exhausted: {0}")]
    QuotaExhausted(String),

    /// Quota exhaustion persisted through every retry
    #[error("재시도 횟수 초과: 잠시 후 다시 시도해주세요 ({attempts} attempts)")]
    RetriesExhausted { attempts: u32 },

    /// Any other generation backend failure
    #[error("generation error: {0}")]
    Generation(String),

    /// Feature vector width disagrees with the classifier
    #[error("feature vector has {actual} values but the model expects {expected}")]
    ShapeMismatch { expected: usize, actual: usize },

    /// Configuration errors
    #[error("configuration error: {0}")]
    Config(String),

    /// Network/IO errors
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization errors
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Generic internal errors
    #[error("internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Create a new missing-field error
    pub fn missing_field(field: impl Into<String>) -> Self {
        Self::MissingField(field.into())
    }

    /// Create a new invalid-category error
    pub fn invalid_category(field: impl Into<String>, value: impl Into<String>) -> Self {
        Self::InvalidCategory {
            field: field.into(),
            value: value.into(),
        }
    }

    /// Create a new not-numeric error
    pub fn not_numeric(field: impl Into<String>, value: impl Into<String>) -> Self {
        Self::NotNumeric {
            field: field.into(),
            value: value.into(),
        }
    }

    /// Create a new quota-exhausted error
    pub fn quota_exhausted(msg: impl Into<String>) -> Self {
        Self::QuotaExhausted(msg.into())
    }

    /// Create a new generation error
    pub fn generation(msg: impl Into<String>) -> Self {
        Self::Generation(msg.into())
    }

    /// Create a new configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create a new internal error
    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }

    /// Errors caused by the submitted input rather than the deployment
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            Self::MissingField(_) | Self::InvalidCategory { .. } | Self::NotNumeric { .. }
        )
    }

    /// Only quota exhaustion is worth waiting out
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::QuotaExhausted(_))
    }

    /// Name of the offending field for client errors
    pub fn field(&self) -> Option<&str> {
        match self {
            Self::MissingField(field)
            | Self::InvalidCategory { field, .. }
            | Self::NotNumeric { field, .. } => Some(field),
            _ => None,
        }
    }

    /// Short, stable identifier used for metric labels
    pub fn kind(&self) -> &'static str {
        match self {
            Self::MissingField(_) => "missing_field",
            Self::InvalidCategory { .. } => "invalid_category",
            Self::NotNumeric { .. } => "not_numeric",
            Self::ModelUnavailable => "model_unavailable",
            Self::GenerationClientUnavailable => "generation_unavailable",
            Self::QuotaExhausted(_) => "quota_exhausted",
            Self::RetriesExhausted { .. } => "retries_exhausted",
            Self::Generation(_) => "generation",
            Self::ShapeMismatch { .. } => "shape_mismatch",
            Self::Config(_) => "config",
            Self::Io(_) => "io",
            Self::Serialization(_) => "serialization",
            Self::Internal(_) => "internal",
        }
    }
}
