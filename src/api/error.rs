use thiserror::Error;

/// Result type alias for API operations.
pub type Result<T> = std::result::Result<T, ApiError>;

/// Error type for Voice Vault API operations.
#[derive(Error, Debug)]
pub enum ApiError {
    /// Non-success HTTP status, message extracted from the error body
    /// (`detail`/`message` field) when present.
    #[error("{message}")]
    Api { status: u16, message: String },

    /// A token-gated call was made with no stored credential. Raised
    /// locally, before any network I/O.
    #[error("Authentication required. Please authenticate first.")]
    AuthRequired,

    /// Transport-level failure.
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    /// Malformed success body.
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    /// Invalid client configuration (bad base URL).
    #[error("invalid configuration: {0}")]
    Config(String),
}

impl ApiError {
    /// True for a 401 response; the stored credential has already been
    /// cleared by the time the caller sees this.
    pub fn is_unauthorized(&self) -> bool {
        matches!(self, ApiError::Api { status: 401, .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unauthorized_is_detected_by_status() {
        let err = ApiError::Api {
            status: 401,
            message: "Token has expired".into(),
        };
        assert!(err.is_unauthorized());
        assert_eq!(err.to_string(), "Token has expired");

        let err = ApiError::Api {
            status: 500,
            message: "boom".into(),
        };
        assert!(!err.is_unauthorized());
    }

    #[test]
    fn auth_required_carries_user_facing_message() {
        assert_eq!(
            ApiError::AuthRequired.to_string(),
            "Authentication required. Please authenticate first."
        );
    }
}
