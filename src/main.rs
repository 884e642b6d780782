use anyhow::{Context, Result};
use jscad_preview::app;
use jscad_preview::cli::{self, Action};
use jscad_preview::config::PreviewConfig;
use jscad_preview::fs::LocalFileSystem;
use std::sync::Arc;

fn main() -> Result<()> {
    // Process CLI arguments first; clap handles --help/--version itself
    let cli::CliResult { action, options } = cli::process_cli();

    if let Action::InitConfig { force } = action {
        let path = app::init_config(options.config.as_deref(), force)?;
        println!("Wrote default config to {}", path.display());
        return Ok(());
    }

    let config = match options.config.as_deref() {
        Some(path) => PreviewConfig::load_from(path)
            .with_context(|| format!("Failed to load config from {}", path.display()))?,
        None => PreviewConfig::load().context("Failed to load config")?,
    };

    // Logs go to /tmp/jscad_preview_debug.log so stdout stays protocol-only.
    // CLI --log-level wins over RUST_LOG, which wins over the config file.
    let level = jscad_preview::debug::init_log_bridge(options.log_level, config.log_level);
    log::info!(
        "Starting jscad-preview {} (log level {})",
        jscad_preview::VERSION,
        level
    );

    match action {
        Action::Html { title } => {
            println!("{}", app::render_html(&config, title.as_deref()));
            Ok(())
        }
        Action::Scan { target, pretty } => {
            let runtime = build_runtime()?;
            let json = runtime.block_on(app::run_scan(
                Arc::new(LocalFileSystem::new()),
                &config,
                &target,
                pretty,
            ))?;
            println!("{json}");
            Ok(())
        }
        Action::Serve { target } => {
            let runtime = build_runtime()?;
            let result = runtime.block_on(app::run_stdio(config, target));
            log::info!("Host loop exited, shutting down runtime");
            runtime.shutdown_timeout(std::time::Duration::from_secs(2));
            result
        }
        Action::InitConfig { .. } => Ok(()),
    }
}

/// Single-threaded runtime: command handling and rescans share one loop.
fn build_runtime() -> Result<tokio::runtime::Runtime> {
    tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("Failed to create async runtime")
}
