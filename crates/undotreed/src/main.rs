mod editor;
mod watcher;

use anyhow::Context;
use clap::Parser;
use editor::{FileEditor, PendingWrites};
use notify::{Event, RecursiveMode, Watcher};
use std::collections::HashSet;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;
use undotree_core::config::{is_binary, Config};
use undotree_core::{FileTracker, GraphClient, Poller};

#[derive(Parser)]
#[command(name = "undotreed")]
#[command(about = "Sync files on disk with an undo-tree authority")]
struct Cli {
    /// Files to track.
    #[arg(required = true)]
    files: Vec<PathBuf>,

    #[arg(long)]
    server_url: Option<String>,

    #[arg(long)]
    debounce_ms: Option<u64>,

    #[arg(long)]
    poll_interval_ms: Option<u64>,

    /// Config file; defaults to $UNDOTREE_ROOT/.undotree/config.
    #[arg(short, long)]
    config: Option<PathBuf>,
}

impl Cli {
    fn apply_overrides(&self, config: &mut Config) {
        if let Some(url) = &self.server_url {
            config.server_url = url.clone();
        }
        if let Some(ms) = self.debounce_ms {
            config.debounce_ms = ms;
        }
        if let Some(ms) = self.poll_interval_ms {
            config.poll_interval_ms = ms;
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();
    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => Config::load_from(path).await?,
        None => Config::load().await?,
    };
    cli.apply_overrides(&mut config);
    config.validate()?;

    info!("=== undotreed ===");
    info!("Authority: {}", config.server_url);

    let client = GraphClient::with_config(config.client_config())?;
    let pending = PendingWrites::new();
    let tracker = FileTracker::from_config(
        &config,
        Arc::new(client),
        Arc::new(FileEditor::new(pending.clone())),
    );

    let (tx_fs, mut rx_fs) = tokio::sync::mpsc::channel(100);
    let mut fs_watcher = notify::recommended_watcher(move |res: notify::Result<Event>| match res {
        Ok(event) => {
            let _ = tx_fs.blocking_send(event);
        }
        Err(e) => error!("Watch error: {:?}", e),
    })?;

    let mut watched_dirs = HashSet::new();
    for file in &cli.files {
        let path = std::fs::canonicalize(file)
            .with_context(|| format!("cannot resolve {}", file.display()))?;
        let file_id = watcher::file_id_for(&path);
        if is_binary(&file_id) {
            warn!("Skipping binary file {}", file_id);
            continue;
        }

        let text = tokio::fs::read_to_string(&path)
            .await
            .with_context(|| format!("cannot read {}", file_id))?;
        if let Err(e) = tracker.enable(&file_id, &text).await {
            warn!("Not tracking {}: {}", file_id, e);
            continue;
        }

        // Editors often save by rename, so watch the directory.
        if let Some(dir) = path.parent() {
            if watched_dirs.insert(dir.to_path_buf()) {
                fs_watcher.watch(dir, RecursiveMode::NonRecursive)?;
            }
        }
    }

    if tracker.tracked_files().is_empty() {
        anyhow::bail!("no files could be tracked");
    }
    info!("Tracking {} file(s)", tracker.tracked_files().len());

    let poller = Poller::new(tracker.clone(), config.poll_interval()).spawn();

    let shutdown = tokio::signal::ctrl_c();
    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            Some(event) = rx_fs.recv() => {
                watcher::handle_fs_event(event, &tracker, &pending).await;
            }
            _ = &mut shutdown => {
                info!("Shutting down");
                break;
            }
        }
    }

    poller.shutdown().await;
    tracker.close_all();
    drop(fs_watcher);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_overrides_config() {
        let cli = Cli::parse_from([
            "undotreed",
            "notes.txt",
            "--server-url",
            "http://10.1.1.1:5000",
            "--debounce-ms",
            "50",
        ]);
        let mut config = Config::default();
        cli.apply_overrides(&mut config);

        assert_eq!(config.server_url, "http://10.1.1.1:5000");
        assert_eq!(config.debounce_ms, 50);
        assert_eq!(config.poll_interval_ms, 300);
        assert_eq!(cli.files, vec![PathBuf::from("notes.txt")]);
    }

    #[test]
    fn test_files_are_required() {
        assert!(Cli::try_parse_from(["undotreed"]).is_err());
    }
}
