use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use tokio_util::sync::CancellationToken;

use crate::config::Config;
use crate::errors::AppResult;
use crate::uploader::folder_resolver::ROOT_FOLDER;
use crate::uploader::{FileUploader, ProgressSink, UploadSummary};

/// Where uploaded files are delivered
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum UploadTarget {
    Private { user_id: String },
    Group { group_id: String },
}

impl UploadTarget {
    pub fn upload_action(&self) -> &'static str {
        match self {
            UploadTarget::Private { .. } => "upload_private_file",
            UploadTarget::Group { .. } => "upload_group_file",
        }
    }

    pub fn id_field(&self) -> &'static str {
        match self {
            UploadTarget::Private { .. } => "user_id",
            UploadTarget::Group { .. } => "group_id",
        }
    }

    pub fn id(&self) -> &str {
        match self {
            UploadTarget::Private { user_id } => user_id,
            UploadTarget::Group { group_id } => group_id,
        }
    }

    pub fn is_group(&self) -> bool {
        matches!(self, UploadTarget::Group { .. })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UploadRequest {
    pub target: UploadTarget,
    pub directory: PathBuf,
    /// Logical document name, without the " part N" suffix or extension
    pub name: String,
    /// Group folder to upload into; ignored for private targets
    #[serde(default = "default_folder_name")]
    pub folder_name: String,
}

fn default_folder_name() -> String {
    ROOT_FOLDER.to_string()
}

impl UploadRequest {
    pub fn new(target: UploadTarget, directory: impl Into<PathBuf>, name: &str) -> Self {
        Self {
            target,
            directory: directory.into(),
            name: name.to_string(),
            folder_name: default_folder_name(),
        }
    }

    pub fn with_folder(mut self, folder_name: &str) -> Self {
        self.folder_name = folder_name.to_string();
        self
    }
}

/// Upload a document using settings from `config`
pub async fn upload_document(
    config: &Config,
    request: &UploadRequest,
    progress: &dyn ProgressSink,
    cancel: CancellationToken,
) -> AppResult<UploadSummary> {
    let uploader = FileUploader::from_config(config)?;
    uploader.process_upload(request, progress, cancel).await
}
