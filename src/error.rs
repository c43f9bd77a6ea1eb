use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum FacetError {
    #[error("Invalid range value for {facet}: {value:?} ({reason})")]
    InvalidRangeValue {
        facet: String,
        value: String,
        reason: String,
    },

    #[error("Invalid term value for {facet}: {value:?}")]
    InvalidTermValue { facet: String, value: String },

    #[error("No index field mapped for filter: {0}")]
    UnknownField(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(String),

    #[error("JSON error: {0}")]
    Json(String),
}

pub type Result<T> = std::result::Result<T, FacetError>;

impl From<std::io::Error> for FacetError {
    fn from(e: std::io::Error) -> Self {
        FacetError::Io(e.to_string())
    }
}

impl From<serde_json::Error> for FacetError {
    fn from(e: serde_json::Error) -> Self {
        FacetError::Json(e.to_string())
    }
}

impl FacetError {
    /// Recoverable errors reject a single criterion; the rest of the
    /// compilation carries on without it. Everything else aborts.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            FacetError::InvalidRangeValue { .. } | FacetError::InvalidTermValue { .. }
        )
    }

    pub(crate) fn invalid_range(
        facet: &str,
        value: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        FacetError::InvalidRangeValue {
            facet: facet.to_string(),
            value: value.into(),
            reason: reason.into(),
        }
    }
}
