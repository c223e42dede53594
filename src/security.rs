use regex::Regex;
use std::path::Path;

use crate::commands::{UploadRequest, UploadTarget};
use crate::errors::{AppError, AppResult};

pub struct InputValidator;

impl InputValidator {
    pub fn validate_document_name(name: &str) -> AppResult<()> {
        if name.trim().is_empty() {
            return Err(AppError::validation("name", "Document name cannot be empty"));
        }

        if name.chars().count() > 200 {
            return Err(AppError::validation("name", "Document name too long (max 200 characters)"));
        }

        // The name is matched against entries of one directory only
        if name.contains('/') || name.contains('\\') || name == ".." {
            return Err(AppError::validation("name", "Document name must not contain path components"));
        }

        if name.chars().any(char::is_control) {
            return Err(AppError::validation("name", "Document name contains invalid characters"));
        }

        Ok(())
    }

    pub fn validate_folder_name(folder_name: &str) -> AppResult<()> {
        if folder_name == "/" {
            return Ok(());
        }

        let trimmed = folder_name.trim();
        if trimmed.is_empty() {
            return Err(AppError::validation("folder_name", "Folder name cannot be empty"));
        }

        if trimmed != folder_name {
            return Err(AppError::validation("folder_name", "Folder name has surrounding whitespace"));
        }

        // Group folders live on the chat platform, not on a local filesystem
        if folder_name.chars().any(char::is_control) {
            return Err(AppError::validation("folder_name", "Folder name contains invalid characters"));
        }

        Ok(())
    }

    pub fn validate_target_id(field: &str, id: &str) -> AppResult<()> {
        let numeric = Regex::new(r"^\d{1,20}$").map_err(|e| AppError::Internal(e.to_string()))?;
        if !numeric.is_match(id) {
            return Err(AppError::validation(field, "Must be a numeric id"));
        }

        Ok(())
    }

    pub fn validate_upload_directory(directory: &Path) -> AppResult<()> {
        if !directory.exists() {
            return Err(AppError::validation(
                "directory",
                &format!("{} does not exist", directory.display()),
            ));
        }

        if !directory.is_dir() {
            return Err(AppError::validation(
                "directory",
                &format!("{} is not a directory", directory.display()),
            ));
        }

        Ok(())
    }

    pub fn validate_upload_request(request: &UploadRequest) -> AppResult<()> {
        match &request.target {
            UploadTarget::Private { user_id } => Self::validate_target_id("user_id", user_id)?,
            UploadTarget::Group { group_id } => {
                Self::validate_target_id("group_id", group_id)?;
                Self::validate_folder_name(&request.folder_name)?;
            }
        }

        Self::validate_document_name(&request.name)?;
        Self::validate_upload_directory(&request.directory)?;

        Ok(())
    }
}
