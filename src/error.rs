use thiserror::Error;

/// Errors surfaced by notification providers.
#[derive(Debug, Error)]
pub enum NotifyError {
    #[error("Invalid notification settings: {0}")]
    Config(String),

    #[error("Template error: {0}")]
    Render(String),

    /// A failed Bot API call, already translated into operator-readable text.
    #[error("Error: {message}")]
    Transport {
        status: Option<u16>,
        message: String,
    },

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, NotifyError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transport_error_display() {
        let err = NotifyError::Transport {
            status: Some(403),
            message: "Forbidden: bot was blocked by the user".to_string(),
        };
        assert_eq!(err.to_string(), "Error: Forbidden: bot was blocked by the user");
    }

    #[test]
    fn test_json_error_converts() {
        let json_err = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        let err: NotifyError = json_err.into();
        assert!(matches!(err, NotifyError::Json(_)));
    }

    #[test]
    fn test_error_is_send_and_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<NotifyError>();
    }
}
