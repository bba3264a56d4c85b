//! Errors reported by the gateway and by the command dispatcher

use thiserror::Error;

use crate::dispatcher::CommandKind;

/// A failed call to the server
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ApiError {
    /// The request never reached the server, or no response came back
    #[error("network error: {0}")]
    Network(String),
    /// The server answered with a non-success status
    #[error("{message}")]
    Rejected { status: u16, message: String },
    /// The server answered, but not with what we expected
    #[error("unexpected response: {0}")]
    Decode(String),
}

impl ApiError {
    /// Build a rejection from a response body, extracting its `message` (or `error`) field when it is JSON
    pub fn rejected(status: u16, body: &str) -> Self {
        ApiError::Rejected { status, message: rejection_message(status, body) }
    }

    /// The HTTP status, for rejections
    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::Rejected { status, .. } => Some(*status),
            _ => None,
        }
    }
}

impl From<reqwest::Error> for ApiError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            ApiError::Decode(err.to_string())
        } else {
            ApiError::Network(err.to_string())
        }
    }
}

/// The text to show for a rejected request
pub fn rejection_message(status: u16, body: &str) -> String {
    if let Ok(serde_json::Value::Object(map)) = serde_json::from_str::<serde_json::Value>(body) {
        for key in &["message", "error"] {
            if let Some(serde_json::Value::String(text)) = map.get(*key) {
                if !text.is_empty() {
                    return text.clone();
                }
            }
        }
    }

    let body = body.trim();
    if body.is_empty() {
        format!("Unexpected HTTP status code {}", status)
    } else {
        body.to_string()
    }
}

/// Why a user command did not go through
#[derive(Debug, Error)]
pub enum CommandError {
    #[error("{0}")]
    Validation(String),
    #[error("a {0} request is already in progress")]
    AlreadyInFlight(CommandKind),
    #[error(transparent)]
    Api(#[from] ApiError),
    #[error("unable to save the file: {0}")]
    Io(#[from] std::io::Error),
}

impl CommandError {
    /// The error from the server, if that is what this is
    pub fn api_error(&self) -> Option<&ApiError> {
        match self {
            CommandError::Api(err) => Some(err),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn structured_messages_are_preferred() {
        assert_eq!(rejection_message(403, r#"{"message":"forbidden"}"#), "forbidden");
        assert_eq!(rejection_message(500, r#"{"message":"","error":"Internal Server Error"}"#), "Internal Server Error");
        assert_eq!(rejection_message(400, "Username already exists"), "Username already exists");
        assert_eq!(rejection_message(404, "  "), "Unexpected HTTP status code 404");
    }

    #[test]
    fn rejections_display_their_message() {
        let err = ApiError::rejected(403, r#"{"message":"forbidden","status":403}"#);
        assert_eq!(err.to_string(), "forbidden");
        assert_eq!(err.status(), Some(403));
        assert_eq!(ApiError::Network("down".into()).status(), None);
    }
}
