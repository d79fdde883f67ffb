//! User-facing notices produced from failed backend calls.

use rescat_api::ApiError;
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum NoticeLevel {
    Info,
    Success,
    Error,
}

/// Follow-up the console performs after showing the notice.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum NoticeAction {
    /// Navigate away once the toast is shown.
    Redirect { route: String },
    /// Ask whether the entry should be restored to its published content.
    ConfirmRestore,
}

/// A toast shown to the user, with an optional follow-up action.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Notice {
    pub level: NoticeLevel,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub action: Option<NoticeAction>,
}

impl Notice {
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Error,
            message: message.into(),
            action: None,
        }
    }

    pub fn success(message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Success,
            message: message.into(),
            action: None,
        }
    }

    pub fn with_action(mut self, action: NoticeAction) -> Self {
        self.action = Some(action);
        self
    }
}

/// Generic formatter for failures without bespoke handling.
pub fn format_api_error(error: &ApiError) -> String {
    match error {
        ApiError::Backend { description, code, .. } if description.trim().is_empty() => format!("Request failed ({})", code),
        ApiError::Backend { description, .. } => description.trim().to_string(),
        ApiError::Http { status, .. } if *status == 401 || *status == 403 => {
            "You do not have permission to perform this action".to_string()
        }
        ApiError::Http { status, .. } if *status >= 500 => "The service is temporarily unavailable, please retry".to_string(),
        ApiError::Http { status, body } if body.is_empty() => format!("Request failed with HTTP {}", status),
        ApiError::Http { status, body } => format!("Request failed with HTTP {}: {}", status, body),
        ApiError::Transport(_) => "Network error, please check the connection".to_string(),
        ApiError::Decode(_) => "Unexpected response from the service".to_string(),
    }
}
