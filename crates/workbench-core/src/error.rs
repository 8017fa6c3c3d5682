use std::path::PathBuf;

use reqwest::StatusCode;
use thiserror::Error;

/// Failures of a single backend call.
///
/// Every variant ends up as user-visible text; none of them is fatal.
#[derive(Debug, Error)]
pub enum ApiError {
    /// The request could not be sent or no response came back
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),

    /// Non-2xx status, with the body's `detail` when the server supplied one
    #[error("server returned {status}")]
    Server {
        status: StatusCode,
        detail: Option<String>,
    },

    /// 2xx status but the body didn't have the expected shape
    #[error("malformed response: {0}")]
    Malformed(String),

    /// The selected document couldn't be read from disk
    #[error("could not read {}: {source}", path.display())]
    File {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl ApiError {
    /// Server-supplied detail text, if any
    pub fn detail(&self) -> Option<&str> {
        match self {
            ApiError::Server { detail, .. } => detail.as_deref(),
            _ => None,
        }
    }

    /// The detail text when present, otherwise `fallback` followed by the error
    pub fn user_message(&self, fallback: &str) -> String {
        match self.detail() {
            Some(detail) => detail.to_string(),
            None => format!("{}: {}", fallback, self),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_message_prefers_detail() {
        let err = ApiError::Server {
            status: StatusCode::BAD_REQUEST,
            detail: Some("bad file".to_string()),
        };
        assert_eq!(err.user_message("Upload failed"), "bad file");
    }

    #[test]
    fn test_user_message_falls_back_to_generic() {
        let err = ApiError::Server {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            detail: None,
        };
        let msg = err.user_message("Upload failed");
        assert!(msg.starts_with("Upload failed: server returned 500"));

        let err = ApiError::Malformed("missing field `answer`".to_string());
        assert_eq!(
            err.user_message("Chat failed"),
            "Chat failed: malformed response: missing field `answer`"
        );
    }
}
