use reqwest::Client;
use serde_json::{json, Map, Value};
use std::collections::VecDeque;
use std::sync::{Mutex, MutexGuard, PoisonError};
use tokio_util::sync::CancellationToken;

use crate::commands::{UploadRequest, UploadTarget};
use crate::config::{Config, UploadSettings, MAX_WORKER_COUNT};
use crate::errors::AppResult;
use crate::security::InputValidator;

use super::file_selector::{select_files, FileCandidate, SelectorOptions};
use super::folder_resolver::{resolve_or_create_folder, ROOT_FOLDER};
use super::onebot_client::OneBotClient;
use super::progress_tracker::{start_message, ProgressSink};
use super::summary::UploadSummary;

/// Result of one upload attempt
#[derive(Debug, Clone, PartialEq)]
pub struct UploadOutcome {
    /// Position of the file in the selected candidates
    pub index: usize,
    pub file_name: String,
    pub success: bool,
    pub payload: Option<Value>,
    pub error: Option<String>,
}

impl UploadOutcome {
    pub fn succeeded(index: usize, file_name: &str, payload: Option<Value>) -> Self {
        Self {
            index,
            file_name: file_name.to_string(),
            success: true,
            payload,
            error: None,
        }
    }

    pub fn failed(index: usize, file_name: &str, error: impl Into<String>) -> Self {
        Self {
            index,
            file_name: file_name.to_string(),
            success: false,
            payload: None,
            error: Some(error.into()),
        }
    }

    /// Restore document part order after a multi-worker run
    pub fn sort_by_candidate_order(outcomes: &mut [UploadOutcome]) {
        outcomes.sort_by_key(|outcome| outcome.index);
    }
}

#[derive(Debug, Clone)]
pub struct DispatchOptions {
    /// With one worker outcomes keep candidate order; with more they arrive
    /// in completion order.
    pub worker_count: usize,
    /// Cancelling fails every upload that hasn't finished yet
    pub cancel: CancellationToken,
}

impl Default for DispatchOptions {
    fn default() -> Self {
        Self {
            worker_count: 1,
            cancel: CancellationToken::new(),
        }
    }
}

type QueuedFile = (usize, FileCandidate);

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Fields shared by every upload request of one run
pub fn base_payload(target: &UploadTarget, folder_id: Option<&str>) -> Map<String, Value> {
    let mut payload = Map::new();
    payload.insert(target.id_field().to_string(), json!(target.id()));

    if target.is_group() {
        payload.insert(
            "folder_id".to_string(),
            json!(folder_id.unwrap_or(ROOT_FOLDER)),
        );
    }

    payload
}

/// Upload every candidate and return one outcome per candidate.
///
/// Never fails: transport errors, bad statuses and cancellation all end up
/// as failed outcomes.
pub async fn dispatch(
    client: &OneBotClient,
    target: &UploadTarget,
    candidates: &[FileCandidate],
    folder_id: Option<&str>,
    options: &DispatchOptions,
    progress: &dyn ProgressSink,
) -> Vec<UploadOutcome> {
    let run_id = uuid::Uuid::new_v4().to_string();
    let total = candidates.len();
    let worker_count = options.worker_count.clamp(1, total.max(1));
    let action = target.upload_action();
    let template = base_payload(target, folder_id);

    log::info!(
        "Run {}: uploading {} file(s) via {} with {} worker(s)",
        run_id,
        total,
        action,
        worker_count
    );

    let queue: Mutex<VecDeque<QueuedFile>> =
        Mutex::new(candidates.iter().cloned().enumerate().collect());
    let outcomes: Mutex<Vec<UploadOutcome>> = Mutex::new(Vec::with_capacity(total));

    let workers = (0..worker_count).map(|worker_id| {
        run_worker(
            worker_id,
            client,
            action,
            &template,
            &queue,
            &outcomes,
            total,
            &options.cancel,
            progress,
        )
    });
    futures::future::join_all(workers).await;

    // Anything still queued was never attempted
    let leftovers: Vec<QueuedFile> = lock(&queue).drain(..).collect();
    for (index, candidate) in leftovers {
        let reason = if options.cancel.is_cancelled() {
            "upload cancelled before it started"
        } else {
            "no upload worker was available"
        };
        let outcome = UploadOutcome::failed(
            index,
            &candidate.display_name,
            format!("{}: {}", candidate.display_name, reason),
        );
        record_outcome(&outcomes, outcome, total, progress).await;
    }

    let outcomes = std::mem::take(&mut *lock(&outcomes));
    log::info!(
        "Run {}: finished, {} of {} succeeded",
        run_id,
        outcomes.iter().filter(|o| o.success).count(),
        total
    );
    outcomes
}

#[allow(clippy::too_many_arguments)]
async fn run_worker(
    worker_id: usize,
    client: &OneBotClient,
    action: &str,
    template: &Map<String, Value>,
    queue: &Mutex<VecDeque<QueuedFile>>,
    outcomes: &Mutex<Vec<UploadOutcome>>,
    total: usize,
    cancel: &CancellationToken,
    progress: &dyn ProgressSink,
) {
    // Dropped on every return path below, closing the worker's connections
    let session = match OneBotClient::new_session() {
        Ok(session) => session,
        Err(e) => {
            log::error!("Worker {} could not open an HTTP session: {}", worker_id, e);
            return;
        }
    };

    loop {
        if cancel.is_cancelled() {
            log::info!("Worker {} stopping, upload cancelled", worker_id);
            break;
        }

        let next = lock(queue).pop_front();
        let Some((index, candidate)) = next else {
            break;
        };

        let outcome = tokio::select! {
            outcome = upload_single_file(client, &session, action, template, index, &candidate) => outcome,
            _ = cancel.cancelled() => UploadOutcome::failed(
                index,
                &candidate.display_name,
                format!("{}: upload cancelled before completion", candidate.display_name),
            ),
        };

        record_outcome(outcomes, outcome, total, progress).await;
    }

    log::debug!("Worker {} drained its queue", worker_id);
}

async fn record_outcome(
    outcomes: &Mutex<Vec<UploadOutcome>>,
    outcome: UploadOutcome,
    total: usize,
    progress: &dyn ProgressSink,
) {
    let completed = {
        let mut outcomes = lock(outcomes);
        outcomes.push(outcome.clone());
        outcomes.len()
    };

    progress.file_finished(&outcome, completed, total).await;
}

async fn upload_single_file(
    client: &OneBotClient,
    session: &Client,
    action: &str,
    template: &Map<String, Value>,
    index: usize,
    candidate: &FileCandidate,
) -> UploadOutcome {
    let mut payload = template.clone();
    payload.insert(
        "file".to_string(),
        json!(candidate.absolute_path.to_string_lossy()),
    );
    payload.insert("name".to_string(), json!(candidate.display_name));

    match client
        .call_action_with(session, action, &Value::Object(payload))
        .await
    {
        Ok(data) => UploadOutcome::succeeded(index, &candidate.display_name, data),
        Err(e) => UploadOutcome::failed(
            index,
            &candidate.display_name,
            format!("{}: {}", candidate.display_name, e),
        ),
    }
}

/// Runs the whole pipeline: select, resolve the folder, upload, summarise
pub struct FileUploader {
    client: OneBotClient,
    selector: SelectorOptions,
    worker_count: usize,
    strict_folder_resolution: bool,
}

impl FileUploader {
    pub fn from_config(config: &Config) -> AppResult<Self> {
        crate::config::validate_config(config)?;
        let client = OneBotClient::from_settings(&config.platform)?;
        Ok(Self::with_client(client, &config.upload))
    }

    pub fn with_client(client: OneBotClient, settings: &UploadSettings) -> Self {
        Self {
            client,
            selector: SelectorOptions::from(settings),
            worker_count: settings.worker_count.clamp(1, MAX_WORKER_COUNT),
            strict_folder_resolution: settings.strict_folder_resolution,
        }
    }

    /// Overrides are held to the same bounds as the configured value
    pub fn set_worker_count(&mut self, worker_count: usize) {
        self.worker_count = worker_count.clamp(1, MAX_WORKER_COUNT);
    }

    /// Upload one logical document.
    ///
    /// Fails only when nothing can be uploaded at all: invalid input, no
    /// matching files, or a folder that can't be resolved. Per-file failures
    /// land in the summary.
    pub async fn process_upload(
        &self,
        request: &UploadRequest,
        progress: &dyn ProgressSink,
        cancel: CancellationToken,
    ) -> AppResult<UploadSummary> {
        InputValidator::validate_upload_request(request)?;

        progress.notify(&start_message(&request.name)).await;

        let candidates = select_files(&request.directory, &request.name, &self.selector)?;

        let folder_id = match &request.target {
            UploadTarget::Group { group_id } => Some(
                resolve_or_create_folder(
                    &self.client,
                    group_id,
                    &request.folder_name,
                    self.strict_folder_resolution,
                )
                .await?,
            ),
            UploadTarget::Private { .. } => None,
        };

        let options = DispatchOptions {
            worker_count: self.worker_count,
            cancel,
        };
        let outcomes = dispatch(
            &self.client,
            &request.target,
            &candidates,
            folder_id.as_deref(),
            &options,
            progress,
        )
        .await;

        Ok(UploadSummary::from_outcomes(&outcomes))
    }
}
