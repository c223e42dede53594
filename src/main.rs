use anyhow::Context;
use clap::{ArgGroup, Parser};
use std::path::PathBuf;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

use chat_file_uploader::commands::{UploadRequest, UploadTarget};
use chat_file_uploader::config::{self, ConfigSource};
use chat_file_uploader::uploader::{FileUploader, LogProgressSink};

/// Upload a (possibly multi-part) document to a OneBot chat bridge
#[derive(Parser, Debug)]
#[command(version, about)]
#[command(group(ArgGroup::new("target").required(true).args(["user", "group"])))]
struct Cli {
    /// Config file (defaults to the user config directory)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Send to this user as a private file
    #[arg(long)]
    user: Option<String>,

    /// Send to this group's file area
    #[arg(long)]
    group: Option<String>,

    /// Directory holding the document files
    #[arg(long)]
    dir: PathBuf,

    /// Document name, without " part N" or extension
    #[arg(long)]
    name: String,

    /// Group folder name; "/" uploads to the root
    #[arg(long, default_value = "/")]
    folder: String,

    /// Override the configured number of upload workers
    #[arg(long)]
    workers: Option<usize>,

    /// Give up on unfinished uploads after this many seconds
    #[arg(long)]
    deadline_secs: Option<u64>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let config_path = match cli.config {
        Some(path) => path,
        None => config::get_config_path().context("Failed to locate configuration")?,
    };
    let (config, source) =
        config::load_or_create_config(&config_path).context("Failed to load configuration")?;

    // Initialize logging
    env_logger::Builder::new()
        .filter_level(config.log_level_filter())
        .parse_default_env()
        .init();

    if source == ConfigSource::CreatedDefault {
        log::info!("Wrote default configuration to {}", config_path.display());
    }

    log::info!(
        "Starting chat file uploader ({} at {}:{})",
        config.platform.platform_type,
        config.platform.http_host,
        config.platform.http_port
    );

    let target = match (cli.user, cli.group) {
        (Some(user_id), None) => UploadTarget::Private { user_id },
        (None, Some(group_id)) => UploadTarget::Group { group_id },
        _ => anyhow::bail!("Exactly one of --user or --group is required"),
    };

    let mut uploader = FileUploader::from_config(&config)?;
    if let Some(workers) = cli.workers {
        if workers == 0 || workers > config::MAX_WORKER_COUNT {
            log::warn!(
                "--workers {} is out of range, using a value between 1 and {}",
                workers,
                config::MAX_WORKER_COUNT
            );
        }
        uploader.set_worker_count(workers);
    }

    let request = UploadRequest::new(target, cli.dir, &cli.name).with_folder(&cli.folder);

    let cancel = CancellationToken::new();
    if let Some(seconds) = cli.deadline_secs {
        let deadline = cancel.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_secs(seconds)).await;
            log::warn!("Deadline of {}s reached, cancelling unfinished uploads", seconds);
            deadline.cancel();
        });
    }

    let summary = uploader
        .process_upload(&request, &LogProgressSink, cancel)
        .await?;

    println!("{}", serde_json::to_string_pretty(&summary)?);

    if !summary.all_succeeded() {
        std::process::exit(1);
    }

    Ok(())
}
