use httpmock::prelude::*;
use serde_json::json;
use std::fs::File;
use std::path::Path;
use tokio_util::sync::CancellationToken;

use chat_file_uploader::{
    commands::{upload_document, UploadRequest, UploadTarget},
    config::Config,
    errors::AppError,
    uploader::RecordingProgressSink,
};

/// Integration tests for the upload pipeline
/// These run selection, folder resolution and dispatch against a mock bridge

fn config_for(server: &MockServer, platform: &str) -> Config {
    let mut config = Config::default();
    config.platform.platform_type = platform.to_string();
    config.platform.http_host = server.host();
    config.platform.http_port = server.port();
    config.platform.api_token = "secret".to_string();
    config
}

fn write_files(dir: &Path, names: &[&str]) {
    for name in names {
        File::create(dir.join(name)).expect("Failed to create test file");
    }
}

fn group_request(dir: &Path, folder: &str) -> UploadRequest {
    UploadRequest::new(
        UploadTarget::Group {
            group_id: "1001".to_string(),
        },
        dir,
        "manual",
    )
    .with_folder(folder)
}

#[tokio::test]
async fn test_group_upload_into_existing_folder() {
    let server = MockServer::start_async().await;
    let listing = server
        .mock_async(|when, then| {
            when.method(POST)
                .path("/get_group_root_files")
                .header("Authorization", "Bearer secret");
            then.status(200).json_body(json!({
                "status": "ok",
                "data": {"folders": [{"folder_id": "/manuals-id", "folder_name": "Manuals"}], "files": []}
            }));
        })
        .await;
    let create = server
        .mock_async(|when, then| {
            when.method(POST).path("/create_group_file_folder");
            then.status(200).json_body(json!({"status": "ok", "data": {"folder_id": "/dup"}}));
        })
        .await;
    let upload = server
        .mock_async(|when, then| {
            when.method(POST)
                .path("/upload_group_file")
                .header("Authorization", "Bearer secret")
                .json_body_partial(r#"{"group_id": "1001", "folder_id": "/manuals-id"}"#);
            then.status(200).json_body(json!({"status": "ok", "data": {"file_id": "x"}}));
        })
        .await;

    let dir = tempfile::tempdir().unwrap();
    write_files(
        dir.path(),
        &["manual.pdf", "manual part 2.pdf", "manual part 10.pdf", "manualx.pdf"],
    );

    let sink = RecordingProgressSink::default();
    let summary = upload_document(
        &config_for(&server, "napcat"),
        &group_request(dir.path(), "Manuals"),
        &sink,
        CancellationToken::new(),
    )
    .await
    .expect("Upload should produce a summary");

    listing.assert_async().await;
    assert_eq!(create.hits_async().await, 0);
    upload.assert_hits_async(3).await;

    assert_eq!(summary.total, 3);
    assert_eq!(summary.success_count, 3);
    assert_eq!(summary.failed_count, 0);
    assert_eq!(sink.messages(), vec!["Sending manual, please wait..."]);

    let finished: Vec<String> = sink.finished().into_iter().map(|(name, _)| name).collect();
    assert_eq!(
        finished,
        vec!["manual.pdf", "manual part 2.pdf", "manual part 10.pdf"]
    );
}

#[tokio::test]
async fn test_folder_created_without_id_falls_back_to_root() {
    let server = MockServer::start_async().await;
    let listing = server
        .mock_async(|when, then| {
            when.method(POST).path("/get_group_root_files");
            then.status(200)
                .json_body(json!({"status": "ok", "data": {"folders": [], "files": []}}));
        })
        .await;
    let create = server
        .mock_async(|when, then| {
            when.method(POST)
                .path("/create_group_file_folder")
                .json_body(json!({"group_id": "1001", "name": "Manuals", "parent_id": "/"}));
            then.status(200).json_body(json!({"status": "ok", "data": {}}));
        })
        .await;
    let upload = server
        .mock_async(|when, then| {
            when.method(POST)
                .path("/upload_group_file")
                .json_body_partial(r#"{"folder_id": "/"}"#);
            then.status(200).json_body(json!({"status": "ok", "data": null}));
        })
        .await;

    let dir = tempfile::tempdir().unwrap();
    write_files(dir.path(), &["manual.pdf"]);

    let summary = upload_document(
        &config_for(&server, "lagrange"),
        &group_request(dir.path(), "Manuals"),
        &RecordingProgressSink::default(),
        CancellationToken::new(),
    )
    .await
    .expect("Root fallback should not fail the upload");

    listing.assert_hits_async(2).await;
    create.assert_async().await;
    upload.assert_async().await;
    assert_eq!(summary.success_count, 1);
}

#[tokio::test]
async fn test_strict_resolution_reports_unresolved_folder() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(POST).path("/get_group_root_files");
            then.status(200)
                .json_body(json!({"status": "ok", "data": {"folders": [], "files": []}}));
        })
        .await;
    server
        .mock_async(|when, then| {
            when.method(POST).path("/create_group_file_folder");
            then.status(200).json_body(json!({"status": "ok", "data": null}));
        })
        .await;
    let upload = server
        .mock_async(|when, then| {
            when.method(POST).path("/upload_group_file");
            then.status(200).json_body(json!({"status": "ok", "data": null}));
        })
        .await;

    let dir = tempfile::tempdir().unwrap();
    write_files(dir.path(), &["manual.pdf"]);

    let mut config = config_for(&server, "llonebot");
    config.upload.strict_folder_resolution = true;

    let result = upload_document(
        &config,
        &group_request(dir.path(), "Manuals"),
        &RecordingProgressSink::default(),
        CancellationToken::new(),
    )
    .await;

    assert!(matches!(result, Err(AppError::FolderUnresolved { .. })));
    assert_eq!(upload.hits_async().await, 0);
}

#[tokio::test]
async fn test_no_matching_files_makes_no_requests() {
    let server = MockServer::start_async().await;
    let any_call = server
        .mock_async(|when, then| {
            when.method(POST);
            then.status(200).json_body(json!({"status": "ok", "data": null}));
        })
        .await;

    let dir = tempfile::tempdir().unwrap();
    write_files(dir.path(), &["manualx.pdf", "manual part x.pdf"]);

    let result = upload_document(
        &config_for(&server, "napcat"),
        &group_request(dir.path(), "Manuals"),
        &RecordingProgressSink::default(),
        CancellationToken::new(),
    )
    .await;

    match result {
        Err(error @ AppError::NoMatchingFiles { .. }) => assert!(error.is_fatal()),
        other => panic!("Expected NoMatchingFiles, got {:?}", other),
    }
    assert_eq!(any_call.hits_async().await, 0);
}

#[tokio::test]
async fn test_unknown_platform_fails_before_any_request() {
    let server = MockServer::start_async().await;
    let any_call = server
        .mock_async(|when, then| {
            when.method(POST);
            then.status(200).json_body(json!({"status": "ok", "data": null}));
        })
        .await;

    let dir = tempfile::tempdir().unwrap();
    write_files(dir.path(), &["manual.pdf"]);

    let result = upload_document(
        &config_for(&server, "go-cqhttp"),
        &group_request(dir.path(), "Manuals"),
        &RecordingProgressSink::default(),
        CancellationToken::new(),
    )
    .await;

    let error = result.expect_err("Unknown platform must be rejected");
    assert!(error.is_configuration_error());
    assert_eq!(any_call.hits_async().await, 0);
}

#[tokio::test]
async fn test_private_upload_with_partial_failure() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(POST)
                .path("/upload_private_file")
                .json_body_partial(r#"{"user_id": "42", "name": "manual part 2.pdf"}"#);
            then.status(503).body("busy");
        })
        .await;
    let ok = server
        .mock_async(|when, then| {
            when.method(POST)
                .path("/upload_private_file")
                .json_body_partial(r#"{"user_id": "42", "name": "manual.pdf"}"#);
            then.status(200).json_body(json!({"status": "ok", "data": {"file_id": "a"}}));
        })
        .await;

    let dir = tempfile::tempdir().unwrap();
    write_files(dir.path(), &["manual.pdf", "manual part 2.pdf"]);

    let request = UploadRequest::new(
        UploadTarget::Private {
            user_id: "42".to_string(),
        },
        dir.path(),
        "manual",
    );

    let summary = upload_document(
        &config_for(&server, "napcat"),
        &request,
        &RecordingProgressSink::default(),
        CancellationToken::new(),
    )
    .await
    .expect("Per-file failures must not fail the run");

    ok.assert_async().await;
    assert_eq!(summary.total, 2);
    assert_eq!(summary.success_count, 1);
    assert_eq!(summary.failed_count, 1);
    assert_eq!(summary.successes, vec![json!({"file_id": "a"})]);
    assert!(summary.errors[0].contains("manual part 2.pdf"));
    assert!(summary.errors[0].contains("503"));
}

#[tokio::test]
async fn test_numeric_folder_ids_do_not_break_resolution() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(POST).path("/get_group_root_files");
            then.status(200).json_body(json!({
                "status": "ok",
                "data": {
                    "folders": [
                        {"folder_id": 77, "folder_name": "Other"},
                        {"folder_id": "/abc", "folder_name": "Manuals"}
                    ],
                    "files": []
                }
            }));
        })
        .await;
    let create = server
        .mock_async(|when, then| {
            when.method(POST).path("/create_group_file_folder");
            then.status(200).json_body(json!({"status": "ok", "data": null}));
        })
        .await;
    let upload = server
        .mock_async(|when, then| {
            when.method(POST)
                .path("/upload_group_file")
                .json_body_partial(r#"{"folder_id": "/abc"}"#);
            then.status(200).json_body(json!({"status": "ok", "data": null}));
        })
        .await;

    let dir = tempfile::tempdir().unwrap();
    write_files(dir.path(), &["manual.pdf"]);

    let summary = upload_document(
        &config_for(&server, "napcat"),
        &group_request(dir.path(), "Manuals"),
        &RecordingProgressSink::default(),
        CancellationToken::new(),
    )
    .await
    .expect("A numeric id on another folder must not fail resolution");

    assert_eq!(create.hits_async().await, 0);
    upload.assert_async().await;
    assert_eq!(summary.success_count, 1);
}

#[tokio::test]
async fn test_folder_name_with_punctuation_is_resolved() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(POST).path("/get_group_root_files");
            then.status(200).json_body(json!({
                "status": "ok",
                "data": {"folders": [{"folder_id": "/qa", "folder_name": "Q&A: 2024"}]}
            }));
        })
        .await;
    let upload = server
        .mock_async(|when, then| {
            when.method(POST)
                .path("/upload_group_file")
                .json_body_partial(r#"{"folder_id": "/qa", "name": "Vol.. 2.pdf"}"#);
            then.status(200).json_body(json!({"status": "ok", "data": null}));
        })
        .await;

    let dir = tempfile::tempdir().unwrap();
    write_files(dir.path(), &["Vol.. 2.pdf"]);

    let request = UploadRequest::new(
        UploadTarget::Group {
            group_id: "1001".to_string(),
        },
        dir.path(),
        "Vol.. 2",
    )
    .with_folder("Q&A: 2024");

    let summary = upload_document(
        &config_for(&server, "napcat"),
        &request,
        &RecordingProgressSink::default(),
        CancellationToken::new(),
    )
    .await
    .expect("Punctuation in names is not a validation error");

    upload.assert_async().await;
    assert_eq!(summary.success_count, 1);
}
