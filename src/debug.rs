//! Log bridge for jscad-preview.
//!
//! Routes the `log` facade to a debug log file so that stdout stays
//! reserved for the host protocol:
//! - `/tmp/jscad_preview_debug.log` on Unix/macOS
//! - `%TEMP%\jscad_preview_debug.log` on Windows
//!
//! When `RUST_LOG` is set, lines are mirrored to stderr as well.
//! Level precedence: CLI `--log-level`, then `RUST_LOG`, then the config.

use jscad_preview_config::LogLevel;
use log::{LevelFilter, Log, Metadata, Record};
use parking_lot::Mutex;
use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::PathBuf;
use std::sync::OnceLock;
use std::time::{SystemTime, UNIX_EPOCH};

struct LogBridge {
    file: Mutex<Option<File>>,
    mirror_stderr: bool,
}

impl LogBridge {
    fn new(level: LevelFilter, mirror_stderr: bool) -> Self {
        let file = if level != LevelFilter::Off {
            match OpenOptions::new()
                .write(true)
                .truncate(true)
                .create(true)
                .open(log_path())
            {
                Ok(mut f) => {
                    let _ = write!(
                        f,
                        "\n{}\njscad-preview session started at {} (level={})\n{}\n",
                        "=".repeat(80),
                        timestamp(),
                        level,
                        "=".repeat(80)
                    );
                    Some(f)
                }
                // Without a log file we still run; stdout must stay clean
                Err(_) => None,
            }
        } else {
            None
        };
        Self {
            file: Mutex::new(file),
            mirror_stderr,
        }
    }
}

impl Log for LogBridge {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= log::max_level()
    }

    fn log(&self, record: &Record) {
        if !self.enabled(record.metadata()) {
            return;
        }
        let line = format!(
            "[{}] [{:<5}] [{}] {}\n",
            timestamp(),
            record.level(),
            record.target(),
            record.args()
        );
        if let Some(file) = self.file.lock().as_mut() {
            let _ = file.write_all(line.as_bytes());
            let _ = file.flush();
        }
        if self.mirror_stderr {
            eprint!("{line}");
        }
    }

    fn flush(&self) {
        if let Some(file) = self.file.lock().as_mut() {
            let _ = file.flush();
        }
    }
}

static BRIDGE: OnceLock<LogBridge> = OnceLock::new();

fn timestamp() -> String {
    let now = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default();
    format!("{}.{:06}", now.as_secs(), now.subsec_micros())
}

/// Path of the debug log file.
pub fn log_path() -> PathBuf {
    #[cfg(unix)]
    {
        PathBuf::from("/tmp/jscad_preview_debug.log")
    }
    #[cfg(not(unix))]
    {
        std::env::temp_dir().join("jscad_preview_debug.log")
    }
}

/// Pick the effective level from the three sources, highest precedence first.
pub fn effective_level(
    cli_level: Option<LogLevel>,
    rust_log: Option<&str>,
    config_level: LogLevel,
) -> LevelFilter {
    cli_level
        .map(LogLevel::to_level_filter)
        .or_else(|| rust_log.and_then(|v| v.trim().parse::<LevelFilter>().ok()))
        .unwrap_or_else(|| config_level.to_level_filter())
}

/// Install the bridge as the global logger. Later calls keep the first
/// installation and return its level.
pub fn init_log_bridge(cli_level: Option<LogLevel>, config_level: LogLevel) -> LevelFilter {
    let rust_log = std::env::var("RUST_LOG").ok();
    let level = effective_level(cli_level, rust_log.as_deref(), config_level);
    let bridge = BRIDGE.get_or_init(|| LogBridge::new(level, rust_log.is_some()));
    if log::set_logger(bridge).is_ok() {
        log::set_max_level(level);
    }
    log::max_level()
}
