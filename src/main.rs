//! yt-upload - upload a video with a resumable, retrying transfer

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, ValueEnum};
use tokio_util::sync::CancellationToken;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use yt_upload::auth::resolve_provider;
use yt_upload::config::{DEFAULT_BASE_URL, DEFAULT_CATEGORY, DEFAULT_DESCRIPTION, DEFAULT_TITLE};
use yt_upload::{
    Config, ConfigOptions, PrivacyStatus, RequestOptions, ResumableUploadDriver, UploadError,
    UploadReport, UploadRequest, VideoService,
};

#[derive(ValueEnum, Debug, Copy, Clone)]
enum PrivacyArg {
    Public,
    Private,
    Unlisted,
}

impl From<PrivacyArg> for PrivacyStatus {
    fn from(arg: PrivacyArg) -> Self {
        match arg {
            PrivacyArg::Public => PrivacyStatus::Public,
            PrivacyArg::Private => PrivacyStatus::Private,
            PrivacyArg::Unlisted => PrivacyStatus::Unlisted,
        }
    }
}

#[derive(Parser, Debug)]
#[command(name = "yt-upload")]
#[command(about = "Upload a video file with a resumable, retrying transfer")]
struct Args {
    /// Video file to upload
    #[arg(long)]
    file: PathBuf,

    /// Video title
    #[arg(long, default_value = DEFAULT_TITLE)]
    title: String,

    /// Video description
    #[arg(long, default_value = DEFAULT_DESCRIPTION)]
    description: String,

    /// Numeric video category
    #[arg(long, default_value = DEFAULT_CATEGORY)]
    category: String,

    /// Comma-separated video keywords
    #[arg(long, default_value = "")]
    keywords: String,

    /// Video privacy status
    #[arg(long, alias = "privacyStatus", value_enum, default_value = "public")]
    privacy_status: PrivacyArg,

    /// API host
    #[arg(long, default_value = DEFAULT_BASE_URL)]
    base_url: String,

    /// Credential file written by the authorization flow
    #[arg(long)]
    credentials: Option<PathBuf>,

    /// Chunk size in bytes (multiple of 262144); whole file when omitted
    #[arg(long)]
    chunk_size: Option<u64>,

    /// Retries allowed after the first attempt
    #[arg(long)]
    max_retries: Option<u32>,

    /// Connect and control-request timeout in seconds; chunk uploads have none
    #[arg(long)]
    timeout: Option<u64>,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let args = Args::parse();

    match upload(args).await {
        Ok(report) => {
            println!("{}", report.video_id);
            Ok(())
        }
        Err(e) => {
            error!("{}", e);
            std::process::exit(e.exit_code());
        }
    }
}

async fn upload(args: Args) -> Result<UploadReport, UploadError> {
    let request = UploadRequest::from_options(RequestOptions {
        file: args.file,
        title: args.title,
        description: args.description,
        category: args.category,
        keywords: args.keywords,
        privacy_status: args.privacy_status.into(),
    })?;

    let config = Config::new(
        args.base_url,
        ConfigOptions {
            chunk_size: args.chunk_size,
            max_retries: args.max_retries,
            request_timeout: args.timeout,
        },
    )
    .map_err(|e| UploadError::InvalidOption(e.to_string()))?;

    let credentials = resolve_provider(args.credentials).credentials()?;
    let service = VideoService::new(&config, credentials)?;
    let session = service.create_upload_session(&request)?;

    let cancel = CancellationToken::new();
    let on_interrupt = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            on_interrupt.cancel();
        }
    });

    info!("Uploading {}", request.file().display());
    let mut driver = ResumableUploadDriver::new(config.max_retries).with_cancellation(cancel);
    let report = driver.run(session).await?;

    info!(
        "Upload finished after {} attempts ({} retries)",
        report.attempts, report.retries
    );
    Ok(report)
}
