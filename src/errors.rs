use thiserror::Error;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("JSON parsing error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Unsupported platform '{platform}', expected one of 'napcat', 'llonebot' or 'lagrange'")]
    UnsupportedDialect { platform: String },

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Validation error: {field} - {message}")]
    Validation { field: String, message: String },

    #[error("No files named '{base_name}' found in {directory}")]
    NoMatchingFiles { directory: String, base_name: String },

    #[error("Remote call '{action}' failed: {reason}")]
    RemoteCall { action: String, reason: String },

    #[error("Remote call '{action}' returned status '{status}': {message}")]
    RemoteStatus {
        action: String,
        status: String,
        message: String,
    },

    #[error("Folder '{folder_name}' could not be found or created in group {group_id}")]
    FolderUnresolved {
        group_id: String,
        folder_name: String,
    },

    #[error("Internal error: {0}")]
    Internal(String),
}

/// Convert to string for callers that report plain messages
impl From<AppError> for String {
    fn from(error: AppError) -> Self {
        error.to_string()
    }
}

/// Custom result type
pub type AppResult<T> = Result<T, AppError>;

impl AppError {
    pub fn validation(field: &str, message: &str) -> Self {
        Self::Validation {
            field: field.to_string(),
            message: message.to_string(),
        }
    }

    pub fn unsupported_dialect(platform: &str) -> Self {
        Self::UnsupportedDialect {
            platform: platform.to_string(),
        }
    }

    pub fn no_matching_files(directory: &str, base_name: &str) -> Self {
        Self::NoMatchingFiles {
            directory: directory.to_string(),
            base_name: base_name.to_string(),
        }
    }

    pub fn remote_call(action: &str, reason: impl Into<String>) -> Self {
        Self::RemoteCall {
            action: action.to_string(),
            reason: reason.into(),
        }
    }

    pub fn remote_status(action: &str, status: &str, message: Option<&str>) -> Self {
        Self::RemoteStatus {
            action: action.to_string(),
            status: status.to_string(),
            message: message.unwrap_or("no message").to_string(),
        }
    }

    pub fn folder_unresolved(group_id: &str, folder_name: &str) -> Self {
        Self::FolderUnresolved {
            group_id: group_id.to_string(),
            folder_name: folder_name.to_string(),
        }
    }

    /// Errors raised by a bad configuration; nothing is attempted after these.
    pub fn is_configuration_error(&self) -> bool {
        matches!(
            self,
            AppError::UnsupportedDialect { .. }
                | AppError::Config(_)
                | AppError::Validation { .. }
        )
    }

    /// Errors scoped to a single call against the chat bridge.
    pub fn is_remote_call_error(&self) -> bool {
        matches!(
            self,
            AppError::RemoteCall { .. } | AppError::RemoteStatus { .. } | AppError::Network(_)
        )
    }

    pub fn is_fatal(&self) -> bool {
        self.is_configuration_error()
            || matches!(
                self,
                AppError::NoMatchingFiles { .. } | AppError::FolderUnresolved { .. }
            )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unsupported_dialect_is_configuration_error() {
        let error = AppError::unsupported_dialect("go-cqhttp");
        assert!(error.is_configuration_error());
        assert!(error.is_fatal());
        assert!(!error.is_remote_call_error());
        assert!(error.to_string().contains("go-cqhttp"));
    }

    #[test]
    fn test_remote_status_without_message() {
        let error = AppError::remote_status("upload_group_file", "failed", None);
        assert!(error.is_remote_call_error());
        assert!(!error.is_fatal());
        assert_eq!(
            error.to_string(),
            "Remote call 'upload_group_file' returned status 'failed': no message"
        );
    }

    #[test]
    fn test_no_matching_files_converts_to_string() {
        let message: String = AppError::no_matching_files("/tmp/docs", "report").into();
        assert_eq!(message, "No files named 'report' found in /tmp/docs");
    }
}
