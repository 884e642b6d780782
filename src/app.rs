//! Entry points behind the CLI actions.

use crate::command;
use crate::data_watcher::{DataWatcher, ScanOptions};
use crate::fs::{FileSystem, LocalFileSystem};
use crate::host::{HostNotifier, HostOutput, StdioHost};
use crate::html;
use crate::session::PreviewController;
use anyhow::{Context, Result};
use jscad_preview_config::PreviewConfig;
use jscad_preview_protocol::{FrameError, InboundMessage, parse_line};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::io::{AsyncBufRead, AsyncBufReadExt};

/// Drive a preview controller from line-delimited commands on `input`.
///
/// Returns when `input` reaches end of file; the live session, if any, is
/// closed first.
pub async fn run_host<F, R>(
    fs: Arc<F>,
    input: R,
    output: HostOutput,
    config: Arc<PreviewConfig>,
    initial_target: Option<String>,
) -> Result<()>
where
    F: FileSystem,
    R: AsyncBufRead + Unpin,
{
    let notifier = Arc::new(HostNotifier::new(output.clone()));
    let mut controller =
        PreviewController::new(StdioHost::new(output), fs, notifier, Arc::clone(&config));

    if let Some(target) = initial_target {
        controller.show_preview(&target).await;
    }

    let mut lines = input.lines();
    while let Some(line) = lines
        .next_line()
        .await
        .context("Failed to read host input")?
    {
        match parse_line::<InboundMessage>(&line) {
            Ok(message) => {
                log::debug!("Host command: {:?}", message);
                controller.handle_message(message).await;
            }
            Err(FrameError::Empty) => {}
            Err(e) => log::warn!("Ignoring malformed host input: {}", e),
        }
    }

    log::info!("Host input closed, shutting down");
    controller.close();
    Ok(())
}

/// Serve the stdio protocol on the process's stdin and stdout.
pub async fn run_stdio(config: PreviewConfig, target: Option<String>) -> Result<()> {
    let stdin = tokio::io::BufReader::new(tokio::io::stdin());
    run_host(
        Arc::new(LocalFileSystem::new()),
        stdin,
        HostOutput::stdout(),
        Arc::new(config),
        target,
    )
    .await
}

/// Scan `raw_target` once and render the tree as JSON.
pub async fn run_scan<F: FileSystem>(
    fs: Arc<F>,
    config: &PreviewConfig,
    raw_target: &str,
    pretty: bool,
) -> Result<String> {
    let target = command::resolve_target(raw_target)?;
    let watcher = DataWatcher::new(fs, ScanOptions::from_config(config));
    let root = watcher
        .scan_once(&target)
        .await
        .with_context(|| format!("Failed to scan {}", target.display()))?;
    let json = if pretty {
        serde_json::to_string_pretty(&root)?
    } else {
        serde_json::to_string(&root)?
    };
    Ok(json)
}

/// The panel document for `title`, or for the configured prefix alone.
pub fn render_html(config: &PreviewConfig, title: Option<&str>) -> String {
    let title = title.unwrap_or(&config.title_prefix);
    html::preview_document(title, &config.viewer_script, &config.bridge_script)
}

/// Write the default config to `path` (or the default location).
pub fn init_config(path: Option<&Path>, force: bool) -> Result<PathBuf> {
    let path = path.map_or_else(PreviewConfig::config_path, Path::to_path_buf);
    if path.exists() && !force {
        anyhow::bail!(
            "Config file already exists at {} (use --force to overwrite)",
            path.display()
        );
    }
    PreviewConfig::default()
        .save_to(&path)
        .with_context(|| format!("Failed to write {}", path.display()))?;
    Ok(path)
}
