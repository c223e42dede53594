use async_trait::async_trait;
use std::sync::Mutex;

use super::upload_queue::UploadOutcome;

/// Where the end user hears about an upload in progress.
///
/// The host supplies this; typically it replies in the chat the request
/// came from.
#[async_trait]
pub trait ProgressSink: Send + Sync {
    /// Free-form notice, e.g. "upload started"
    async fn notify(&self, message: &str);

    /// Called once per file as soon as its outcome is known
    async fn file_finished(&self, _outcome: &UploadOutcome, _completed: usize, _total: usize) {}
}

/// Message sent before anything else happens
pub fn start_message(document_name: &str) -> String {
    format!("Sending {}, please wait...", document_name)
}

/// Writes progress to the log
pub struct LogProgressSink;

#[async_trait]
impl ProgressSink for LogProgressSink {
    async fn notify(&self, message: &str) {
        log::info!("{}", message);
    }

    async fn file_finished(&self, outcome: &UploadOutcome, completed: usize, total: usize) {
        if outcome.success {
            log::info!(
                "Progress: Successfully uploaded {} ({}/{})",
                outcome.file_name,
                completed,
                total
            );
        } else {
            log::warn!(
                "Progress: Failed to upload {} - {} ({}/{})",
                outcome.file_name,
                outcome.error.as_deref().unwrap_or("unknown error"),
                completed,
                total
            );
        }
    }
}

/// Keeps every notice; handy for hosts that batch replies
#[derive(Default)]
pub struct RecordingProgressSink {
    messages: Mutex<Vec<String>>,
    finished: Mutex<Vec<(String, bool)>>,
}

impl RecordingProgressSink {
    pub fn messages(&self) -> Vec<String> {
        match self.messages.lock() {
            Ok(messages) => messages.clone(),
            Err(e) => e.into_inner().clone(),
        }
    }

    /// (file name, success) in the order files finished
    pub fn finished(&self) -> Vec<(String, bool)> {
        match self.finished.lock() {
            Ok(finished) => finished.clone(),
            Err(e) => e.into_inner().clone(),
        }
    }
}

#[async_trait]
impl ProgressSink for RecordingProgressSink {
    async fn notify(&self, message: &str) {
        match self.messages.lock() {
            Ok(mut messages) => messages.push(message.to_string()),
            Err(e) => log::warn!("Failed to record progress message (non-critical): {}", e),
        }
    }

    async fn file_finished(&self, outcome: &UploadOutcome, _completed: usize, _total: usize) {
        match self.finished.lock() {
            Ok(mut finished) => finished.push((outcome.file_name.clone(), outcome.success)),
            Err(e) => log::warn!("Failed to record file progress (non-critical): {}", e),
        }
    }
}
