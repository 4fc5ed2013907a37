//! Command-line front end
//!
//! CLI arguments and environment variable handling using clap.

use std::future::Future;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Context;
use clap::{Parser, Subcommand};
use futures::StreamExt;
use packhost_client::{pack_stem, ClientConfig, ClientError, PackClient, PackStream};
use tokio::io::AsyncWriteExt;
use tracing::{debug, info};

use crate::acceptance::AcceptanceFilter;
use crate::clipboard::default_clipboard;
use crate::config::{UploaderConfig, DEFAULT_MAX_PACK_SIZE};
use crate::presenter::{copy_to, server_properties, summary, CopyTarget};
use crate::verify::{check_sha1, sha1_hex, PackHasher};
use crate::workflow::{UploadWorkflow, WorkflowState};

/// Packhost - upload resource packs and manage hosted packs
#[derive(Parser, Debug, Clone)]
#[command(name = "packhost")]
#[command(about = "Upload resource packs and manage hosted packs")]
pub struct Cli {
    /// Pack service connection
    #[command(flatten)]
    pub connection: ConnectionArgs,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, env = "LOG_LEVEL", default_value = "info", global = true)]
    pub log_level: String,

    #[command(subcommand)]
    pub command: Command,
}

/// Pack service connection settings
#[derive(clap::Args, Debug, Clone)]
pub struct ConnectionArgs {
    /// Base URL of the pack hosting API
    #[arg(long, env = "PACKHOST_BASE_URL", default_value = "http://localhost:8000")]
    pub base_url: String,

    /// Anti-abuse token sent as X-Captcha-Token
    #[arg(long, env = "PACKHOST_CAPTCHA_TOKEN", hide_env_values = true)]
    pub captcha_token: Option<String>,

    /// Largest archive accepted for upload, in bytes
    #[arg(long, env = "PACKHOST_MAX_PACK_SIZE", default_value_t = DEFAULT_MAX_PACK_SIZE)]
    pub max_pack_size: u64,

    /// Request timeout in seconds
    #[arg(long, env = "PACKHOST_TIMEOUT_SECS", default_value = "300")]
    pub timeout_secs: u64,
}

impl ConnectionArgs {
    pub fn to_config(&self) -> UploaderConfig {
        UploaderConfig {
            client: ClientConfig {
                base_url: self.base_url.clone(),
                captcha_token: self.captcha_token.clone(),
                timeout_secs: self.timeout_secs,
            },
            max_pack_size: self.max_pack_size,
        }
    }
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Upload a resource pack and print its server.properties lines
    Upload {
        /// The ZIP archive to upload (exactly one)
        #[arg(required = true)]
        files: Vec<PathBuf>,

        /// Copy a fragment of the result
        #[arg(long, value_enum)]
        copy: Option<CopyTarget>,

        /// Compare the local SHA-1 with the one reported by the service
        #[arg(long)]
        verify: bool,
    },

    /// Print the SHA-1 of a hosted pack
    Hash {
        /// Pack name, with or without .zip
        name: String,
    },

    /// Download a hosted pack
    Download {
        /// Pack name, with or without .zip
        name: String,

        /// Output path (default: <name>.zip)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Expected SHA-1; the file is removed on mismatch
        #[arg(long)]
        sha1: Option<String>,
    },

    /// Delete a hosted pack
    Delete {
        /// Pack name, with or without .zip
        name: String,

        /// Delete key returned by the upload
        #[arg(long, env = "PACKHOST_DELETE_KEY", hide_env_values = true)]
        key: String,
    },
}

/// Execute a parsed command line
pub async fn run(cli: Cli) -> anyhow::Result<()> {
    let config = cli.connection.to_config();
    config.validate()?;

    let client = PackClient::new(config.client.clone())?;
    info!(base_url = client.base_url(), "Using pack service");

    match cli.command {
        Command::Upload { files, copy, verify } => {
            upload(client, AcceptanceFilter::from_config(&config), &files, copy, verify).await
        }
        Command::Hash { name } => {
            let hash = client.fetch_hash(&name).await.map_err(user_error)?;
            println!("{}", hash.sha1);
            Ok(())
        }
        Command::Download { name, output, sha1 } => {
            let output = output.unwrap_or_else(|| PathBuf::from(format!("{}.zip", pack_stem(&name))));
            download(&client, &name, &output, sha1.as_deref()).await
        }
        Command::Delete { name, key } => {
            let response = client.delete(&name, &key).await.map_err(user_error)?;
            println!("{}", response.message);
            Ok(())
        }
    }
}

async fn upload(
    client: PackClient,
    filter: AcceptanceFilter,
    files: &[PathBuf],
    copy: Option<CopyTarget>,
    verify: bool,
) -> anyhow::Result<()> {
    let file = filter.accept_single(files).await?;
    let local_sha1 = verify.then(|| sha1_hex(&file.content()));

    let workflow = Arc::new(UploadWorkflow::new(Arc::new(client)));
    workflow.select_file(file);

    let mut updates = workflow.subscribe();
    let reporter = tokio::spawn(async move {
        while updates.changed().await.is_ok() {
            let line = match &*updates.borrow_and_update() {
                WorkflowState::Uploading(file) => {
                    Some(format!("Uploading {} ({} bytes)...", file.name(), file.size()))
                }
                _ => None,
            };
            if let Some(line) = line {
                eprintln!("{}", line);
            }
        }
    });

    let canceller = {
        let workflow = workflow.clone();
        tokio::spawn(async move { cancel_on_interrupt(&workflow, tokio::signal::ctrl_c).await })
    };

    let state = workflow.confirm_upload().await;
    canceller.abort();
    reporter.abort();

    match state {
        WorkflowState::Succeeded(result) => {
            println!("{}", summary(&result));
            println!();
            println!("server.properties:");
            println!("{}", server_properties(&result));

            if let Some(local) = local_sha1 {
                check_sha1(&local, &result.sha1)?;
                info!(sha1 = %local, "Local SHA-1 matches the service");
            }

            if let Some(target) = copy {
                let mut clipboard = default_clipboard();
                copy_to(clipboard.as_mut(), &result, target)?;
                eprintln!("Copied {}", target.label());
            }
            Ok(())
        }
        WorkflowState::Failed(_, message) => anyhow::bail!("{}", message),
        WorkflowState::FileSelected(_) => anyhow::bail!("upload cancelled"),
        other => anyhow::bail!("upload ended in unexpected state: {}", other.label()),
    }
}

/// Cancel the upload on the first interrupt that finds one in flight
async fn cancel_on_interrupt<F, Fut>(workflow: &UploadWorkflow, mut interrupt: F)
where
    F: FnMut() -> Fut,
    Fut: Future<Output = std::io::Result<()>>,
{
    while interrupt().await.is_ok() {
        if workflow.cancel() {
            info!("Upload cancelled by interrupt");
            break;
        }
        debug!("Interrupt received with no upload in flight");
    }
}

async fn download(
    client: &PackClient,
    name: &str,
    output: &Path,
    expected_sha1: Option<&str>,
) -> anyhow::Result<()> {
    let stream = client.download(name).await.map_err(user_error)?;
    let (written, digest) = save_pack(stream, output, expected_sha1).await?;

    info!(path = %output.display(), bytes = written, "Pack downloaded");
    println!("Saved {} ({} bytes, SHA-1 {})", output.display(), written, digest);
    Ok(())
}

/// Write a downloaded pack to `output`, returning its size and SHA-1.
///
/// A file this call created is removed again on any failure.
async fn save_pack(
    stream: PackStream,
    output: &Path,
    expected_sha1: Option<&str>,
) -> anyhow::Result<(u64, String)> {
    let file = tokio::fs::File::create(output)
        .await
        .with_context(|| format!("cannot create {}", output.display()))?;

    let saved = write_pack(stream, file, expected_sha1).await;
    if saved.is_err() {
        tokio::fs::remove_file(output).await.ok();
    }
    saved
}

async fn write_pack(
    mut stream: PackStream,
    mut file: tokio::fs::File,
    expected_sha1: Option<&str>,
) -> anyhow::Result<(u64, String)> {
    let mut hasher = PackHasher::new();
    let mut written: u64 = 0;
    while let Some(chunk) = stream.next().await {
        let chunk = chunk.map_err(user_error)?;
        hasher.update(&chunk);
        file.write_all(&chunk).await?;
        written += chunk.len() as u64;
    }
    file.flush().await?;
    drop(file);

    let digest = hasher.finish();
    if let Some(expected) = expected_sha1 {
        check_sha1(&digest, expected)?;
    }
    Ok((written, digest))
}

/// Surface the server's detail text rather than the raw error chain
fn user_error(e: ClientError) -> anyhow::Error {
    anyhow::anyhow!(e.user_message())
}
