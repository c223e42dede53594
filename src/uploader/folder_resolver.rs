use crate::errors::{AppError, AppResult};

use super::onebot_client::GroupFileApi;

/// Folder id meaning "top level of the group file area"
pub const ROOT_FOLDER: &str = "/";

/// How a folder id was obtained
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FolderResolution {
    Root,
    Existing(String),
    Created(String),
    /// Created without an id, then found by re-listing
    Reverified(String),
    /// Not found after creation; uploads go to the root instead
    RootFallback,
}

impl FolderResolution {
    pub fn folder_id(&self) -> &str {
        match self {
            FolderResolution::Existing(id)
            | FolderResolution::Created(id)
            | FolderResolution::Reverified(id) => id,
            FolderResolution::Root | FolderResolution::RootFallback => ROOT_FOLDER,
        }
    }

    pub fn into_folder_id(self) -> String {
        self.folder_id().to_string()
    }
}

enum ResolveState {
    Lookup,
    NotFound,
    CreateAttempted(Option<String>),
    Reverified(Option<String>),
}

/// Find `folder_name` in the group's root listing, creating it when missing.
///
/// Not safe against concurrent callers creating the same name; the bridge
/// may end up with duplicate folders.
pub async fn resolve_folder<A: GroupFileApi + ?Sized>(
    api: &A,
    group_id: &str,
    folder_name: &str,
) -> AppResult<FolderResolution> {
    if folder_name == ROOT_FOLDER {
        return Ok(FolderResolution::Root);
    }

    let mut state = ResolveState::Lookup;

    loop {
        state = match state {
            ResolveState::Lookup => {
                let listing = api.get_group_root_files(group_id).await?;
                match listing.find_folder(folder_name) {
                    Some(folder) => {
                        log::debug!(
                            "Found folder '{}' ({}) in group {}",
                            folder_name,
                            folder.folder_id,
                            group_id
                        );
                        return Ok(FolderResolution::Existing(folder.folder_id.clone()));
                    }
                    None => ResolveState::NotFound,
                }
            }
            ResolveState::NotFound => {
                log::info!("Creating folder '{}' in group {}", folder_name, group_id);
                let created = api.create_group_file_folder(group_id, folder_name).await?;
                ResolveState::CreateAttempted(created)
            }
            ResolveState::CreateAttempted(Some(folder_id)) => {
                return Ok(FolderResolution::Created(folder_id));
            }
            ResolveState::CreateAttempted(None) => {
                log::debug!(
                    "Bridge returned no id for new folder '{}', re-listing group {}",
                    folder_name,
                    group_id
                );
                let listing = api.get_group_root_files(group_id).await?;
                ResolveState::Reverified(
                    listing
                        .find_folder(folder_name)
                        .map(|folder| folder.folder_id.clone()),
                )
            }
            ResolveState::Reverified(Some(folder_id)) => {
                return Ok(FolderResolution::Reverified(folder_id));
            }
            ResolveState::Reverified(None) => {
                log::warn!(
                    "Folder '{}' still missing in group {} after creation, uploading to root",
                    folder_name,
                    group_id
                );
                return Ok(FolderResolution::RootFallback);
            }
        };
    }
}

/// Resolve to a folder id, optionally refusing the root fallback
pub async fn resolve_or_create_folder<A: GroupFileApi + ?Sized>(
    api: &A,
    group_id: &str,
    folder_name: &str,
    strict: bool,
) -> AppResult<String> {
    let resolution = resolve_folder(api, group_id, folder_name).await?;

    if strict && resolution == FolderResolution::RootFallback {
        return Err(AppError::folder_unresolved(group_id, folder_name));
    }

    Ok(resolution.into_folder_id())
}
