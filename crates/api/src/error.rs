//! Errors surfaced by the console API client.

use serde::Deserialize;
use thiserror::Error;

/// Failure of a single backend call.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ApiError {
    /// The backend answered with a non-success status and a structured error body.
    #[error("{description} ({code})")]
    Backend { status: u16, code: String, description: String },

    /// The backend answered with a non-success status and no recognizable body.
    #[error("HTTP {status}: {body}")]
    Http { status: u16, body: String },

    #[error("Network error: {0}")]
    Transport(String),

    #[error("Unexpected response body: {0}")]
    Decode(String),
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    code: String,
    #[serde(default)]
    description: String,
}

impl ApiError {
    /// Build an error from a failed response, preferring the backend's `{code, description}` body.
    pub fn from_response(status: u16, body: &str) -> Self {
        match serde_json::from_str::<ErrorBody>(body) {
            Ok(parsed) if !parsed.code.is_empty() => Self::Backend {
                status,
                code: parsed.code,
                description: parsed.description,
            },
            _ => Self::Http {
                status,
                body: body.trim().to_string(),
            },
        }
    }

    /// Shorthand for a structured backend error, used by tests and fakes.
    pub fn backend(code: impl Into<String>, description: impl Into<String>) -> Self {
        Self::Backend {
            status: 400,
            code: code.into(),
            description: description.into(),
        }
    }

    /// Backend error code, if the failure carried one.
    pub fn code(&self) -> Option<&str> {
        match self {
            Self::Backend { code, .. } => Some(code),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_structured_error_bodies() {
        let error = ApiError::from_response(400, r#"{"code":"DataCatalog.Public.NameRepeat","description":"名称重复"}"#);
        assert_eq!(error.code(), Some("DataCatalog.Public.NameRepeat"));
        assert_eq!(error.to_string(), "名称重复 (DataCatalog.Public.NameRepeat)");
    }

    #[test]
    fn falls_back_to_raw_body() {
        let error = ApiError::from_response(502, "Bad Gateway\n");
        assert_eq!(error.code(), None);
        assert_eq!(error.to_string(), "HTTP 502: Bad Gateway");
    }
}
