//! recon3d worker entrypoint
//!
//! Reads one job JSON document from a file or stdin (the transport a host
//! runtime would own), runs it through the handler, and writes the response
//! JSON to stdout. Logs go to stderr so stdout stays machine-readable.

use std::fs;
use std::io::Read;
use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use recon3d::config::{BackendKind, WorkerConfig};
use recon3d::handler::JobHandler;
use recon3d::job::{JobRequest, JobResponse};

#[derive(Parser, Debug)]
#[command(author, version, about = "Serverless image-to-3D reconstruction worker", long_about = None)]
struct Cli {
    /// Job JSON file; reads stdin when omitted
    #[arg(long)]
    job: Option<PathBuf>,

    /// Root directory for checkpoint trees
    #[arg(long)]
    checkpoint_root: Option<PathBuf>,

    /// Checkpoint tag under the root
    #[arg(long)]
    model_tag: Option<String>,

    /// Hub repository to download checkpoints from
    #[arg(long)]
    checkpoint_repo: Option<String>,

    /// Inference bridge base URL; the mock backend is used when omitted
    #[arg(long)]
    bridge_url: Option<String>,

    /// Asset download timeout in seconds
    #[arg(long)]
    fetch_timeout_secs: Option<u64>,

    /// Inference request timeout in seconds
    #[arg(long)]
    inference_timeout_secs: Option<u64>,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let mut config = WorkerConfig::from_env();
    if let Some(root) = cli.checkpoint_root {
        config.checkpoint_root = root;
    }
    if let Some(tag) = cli.model_tag {
        config.model_tag = tag;
    }
    if let Some(repo) = cli.checkpoint_repo {
        config.checkpoint_repo = repo;
    }
    if let Some(url) = cli.bridge_url {
        config.backend = BackendKind::Bridge { url };
    }
    if let Some(secs) = cli.fetch_timeout_secs {
        config.fetch_timeout = Duration::from_secs(secs);
    }
    if let Some(secs) = cli.inference_timeout_secs {
        config.inference_timeout = Duration::from_secs(secs);
    }

    info!(
        backend = match &config.backend {
            BackendKind::Mock => "mock",
            BackendKind::Bridge { .. } => "bridge",
        },
        "recon3d worker v{}",
        env!("CARGO_PKG_VERSION")
    );

    let handler = JobHandler::new(config)?;

    let raw = match &cli.job {
        Some(path) => fs::read_to_string(path)?,
        None => {
            let mut buffer = String::new();
            std::io::stdin().read_to_string(&mut buffer)?;
            buffer
        }
    };

    // A malformed job document is a handled failure, not a crash.
    let response = match serde_json::from_str::<JobRequest>(&raw) {
        Ok(job) => handler.handle(&job),
        Err(e) => JobResponse::failure(format!("Invalid job: {e}")),
    };

    println!("{}", serde_json::to_string(&response)?);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_timeout_flags_parse() {
        let cli = Cli::parse_from([
            "recon3d-worker",
            "--fetch-timeout-secs",
            "10",
            "--inference-timeout-secs",
            "90",
        ]);
        assert_eq!(cli.fetch_timeout_secs, Some(10));
        assert_eq!(cli.inference_timeout_secs, Some(90));
    }

    #[test]
    fn test_timeout_flags_default_to_unset() {
        let cli = Cli::parse_from(["recon3d-worker"]);
        assert!(cli.fetch_timeout_secs.is_none());
        assert!(cli.inference_timeout_secs.is_none());
    }
}
