use async_trait::async_trait;
use reqwest::header::CONTENT_TYPE;
use reqwest::{Client, RequestBuilder};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use crate::config::PlatformSettings;
use crate::errors::{AppError, AppResult};

use super::dialect::PlatformDialect;

/// Envelope every bridge endpoint answers with
#[derive(Debug, Deserialize)]
pub struct ApiResponse {
    pub status: String,
    #[serde(default)]
    pub data: Option<Value>,
    #[serde(default)]
    pub message: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteFolder {
    pub folder_id: String,
    pub folder_name: String,
}

impl RemoteFolder {
    /// Bridges disagree on whether `folder_id` is a string or a number
    fn from_entry(entry: &Value) -> Option<Self> {
        let folder_id = extract_folder_id(entry)?;
        let folder_name = entry.get("folder_name")?.as_str()?.to_string();
        Some(Self {
            folder_id,
            folder_name,
        })
    }
}

/// Snapshot of a group's top-level file area
#[derive(Debug, Clone, Default, Deserialize)]
pub struct GroupRootListing {
    #[serde(default, deserialize_with = "deserialize_folders")]
    pub folders: Vec<RemoteFolder>,
    #[serde(default, deserialize_with = "deserialize_entries")]
    pub files: Vec<Value>,
}

impl GroupRootListing {
    pub fn find_folder(&self, folder_name: &str) -> Option<&RemoteFolder> {
        self.folders.iter().find(|f| f.folder_name == folder_name)
    }
}

fn deserialize_entries<'de, D>(deserializer: D) -> Result<Vec<Value>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<Vec<Value>>::deserialize(deserializer)?.unwrap_or_default())
}

/// Entries without a usable id or name are skipped rather than failing the listing
fn deserialize_folders<'de, D>(deserializer: D) -> Result<Vec<RemoteFolder>, D::Error>
where
    D: Deserializer<'de>,
{
    let entries = deserialize_entries(deserializer)?;

    Ok(entries
        .iter()
        .filter_map(|entry| {
            let folder = RemoteFolder::from_entry(entry);
            if folder.is_none() {
                log::debug!("Skipping unusable folder entry: {}", entry);
            }
            folder
        })
        .collect())
}

/// Group file operations the folder resolver needs
#[async_trait]
pub trait GroupFileApi: Send + Sync {
    async fn get_group_root_files(&self, group_id: &str) -> AppResult<GroupRootListing>;

    /// Returns the new folder's id when the bridge reports one
    async fn create_group_file_folder(
        &self,
        group_id: &str,
        folder_name: &str,
    ) -> AppResult<Option<String>>;
}

/// HTTP client for OneBot-style chat bridges
pub struct OneBotClient {
    client: Client,
    base_url: String,
    api_token: Option<String>,
    dialect: PlatformDialect,
}

impl OneBotClient {
    pub fn from_settings(settings: &PlatformSettings) -> AppResult<Self> {
        let dialect: PlatformDialect = settings.platform_type.parse()?;
        let base_url = format!("http://{}:{}", settings.http_host, settings.http_port);
        Self::with_base_url(&base_url, Some(settings.api_token.clone()), dialect)
    }

    pub fn with_base_url(
        base_url: &str,
        api_token: Option<String>,
        dialect: PlatformDialect,
    ) -> AppResult<Self> {
        Ok(Self {
            client: Self::new_session()?,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_token: api_token.filter(|token| !token.is_empty()),
            dialect,
        })
    }

    /// Fresh connection pool; upload workers each own one for their lifetime.
    /// No request timeout is set.
    pub fn new_session() -> AppResult<Client> {
        Ok(Client::builder().build()?)
    }

    pub fn action_url(&self, action: &str) -> String {
        format!("{}/{}", self.base_url, action)
    }

    fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        match &self.api_token {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }

    /// POST an action on the given session and return its `data` field.
    ///
    /// Transport failures, non-2xx answers and unparseable bodies become
    /// [`AppError::RemoteCall`]; a status other than `"ok"` becomes
    /// [`AppError::RemoteStatus`].
    pub async fn call_action_with(
        &self,
        session: &Client,
        action: &str,
        payload: &Value,
    ) -> AppResult<Option<Value>> {
        log::debug!("Sending to chat bridge -> {}: {}", action, payload);

        let request = session
            .post(self.action_url(action))
            .header(CONTENT_TYPE, "application/json")
            .json(payload);

        let response = self
            .authorize(request)
            .send()
            .await
            .map_err(|e| AppError::remote_call(action, e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(AppError::remote_call(
                action,
                format!("HTTP {}: {}", status, error_text),
            ));
        }

        let body: ApiResponse = response
            .json()
            .await
            .map_err(|e| AppError::remote_call(action, format!("malformed response: {}", e)))?;

        log::debug!(
            "Chat bridge returned <- {}: status={} data={:?}",
            action,
            body.status,
            body.data
        );

        if body.status != "ok" {
            return Err(AppError::remote_status(
                action,
                &body.status,
                body.message.as_deref(),
            ));
        }

        Ok(body.data)
    }

    pub async fn call_action(&self, action: &str, payload: &Value) -> AppResult<Option<Value>> {
        self.call_action_with(&self.client, action, payload).await
    }
}

#[async_trait]
impl GroupFileApi for OneBotClient {
    async fn get_group_root_files(&self, group_id: &str) -> AppResult<GroupRootListing> {
        const ACTION: &str = "get_group_root_files";

        let payload = serde_json::json!({ "group_id": group_id });
        let data = self
            .call_action(ACTION, &payload)
            .await?
            .ok_or_else(|| AppError::remote_call(ACTION, "response carried no data"))?;

        serde_json::from_value(data)
            .map_err(|e| AppError::remote_call(ACTION, format!("malformed listing: {}", e)))
    }

    async fn create_group_file_folder(
        &self,
        group_id: &str,
        folder_name: &str,
    ) -> AppResult<Option<String>> {
        let payload = self.dialect.folder_creation_body(group_id, folder_name);
        let data = self.call_action("create_group_file_folder", &payload).await?;

        Ok(data.as_ref().and_then(extract_folder_id))
    }
}

/// Some bridges answer with a numeric id, some with none at all
fn extract_folder_id(data: &Value) -> Option<String> {
    match data.get("folder_id")? {
        Value::String(id) if !id.is_empty() => Some(id.clone()),
        Value::Number(id) => Some(id.to_string()),
        _ => None,
    }
}
