// Main uploader module - orchestrates all upload functionality
//
// This module is responsible for delivering local documents to a chat bridge

pub mod dialect;
pub mod file_selector;
pub mod folder_resolver;
pub mod onebot_client;
pub mod progress_tracker;
pub mod summary;
pub mod upload_queue;

pub use dialect::PlatformDialect;
pub use progress_tracker::{LogProgressSink, ProgressSink, RecordingProgressSink};
pub use summary::UploadSummary;
pub use upload_queue::{dispatch, DispatchOptions, FileUploader, UploadOutcome};
