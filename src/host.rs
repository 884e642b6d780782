//! Headless editor host over newline-delimited JSON.
//!
//! Panel lifecycle, viewer messages and notifications are all written as
//! [`HostEvent`] lines to one shared output (stdout in the binary). Nothing
//! else may write to that stream; logging goes to the debug log file.

use crate::display::{DisplayHost, DisplaySurface, Notifier};
use anyhow::{Context, Result};
use jscad_preview_protocol::{HostEvent, OutboundMessage, Severity, write_line};
use parking_lot::Mutex;
use std::io::Write;
use std::sync::Arc;

/// Shared, line-oriented event output.
#[derive(Clone)]
pub struct HostOutput {
    writer: Arc<Mutex<Box<dyn Write + Send>>>,
}

impl std::fmt::Debug for HostOutput {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HostOutput").finish_non_exhaustive()
    }
}

impl HostOutput {
    pub fn new(writer: impl Write + Send + 'static) -> Self {
        Self {
            writer: Arc::new(Mutex::new(Box::new(writer))),
        }
    }

    pub fn stdout() -> Self {
        Self::new(std::io::stdout())
    }

    pub fn emit(&self, event: &HostEvent) -> Result<()> {
        let mut writer = self.writer.lock();
        write_line(&mut *writer, event).context("Failed to write host event")
    }

    fn emit_logged(&self, event: &HostEvent) {
        if let Err(e) = self.emit(event) {
            log::error!("{:#}", e);
        }
    }
}

/// Creates [`StdioSurface`]s announcing themselves on the host output.
#[derive(Debug, Clone)]
pub struct StdioHost {
    output: HostOutput,
}

impl StdioHost {
    pub fn new(output: HostOutput) -> Self {
        Self { output }
    }
}

impl DisplayHost for StdioHost {
    type Surface = StdioSurface;

    fn create_surface(&mut self, title: &str, html: &str) -> Result<StdioSurface> {
        self.output.emit(&HostEvent::PanelOpened {
            title: title.to_string(),
            html: html.to_string(),
        })?;
        Ok(StdioSurface {
            output: self.output.clone(),
            disposed: false,
        })
    }
}

/// A panel living on the other side of the host output.
#[derive(Debug)]
pub struct StdioSurface {
    output: HostOutput,
    disposed: bool,
}

impl StdioSurface {
    pub fn is_disposed(&self) -> bool {
        self.disposed
    }
}

impl DisplaySurface for StdioSurface {
    fn post_message(&mut self, message: &OutboundMessage) -> Result<()> {
        if self.disposed {
            anyhow::bail!("Preview panel is already closed");
        }
        self.output.emit(&HostEvent::PostMessage {
            message: message.clone(),
        })
    }

    fn set_title(&mut self, title: &str) {
        if !self.disposed {
            self.output.emit_logged(&HostEvent::TitleChanged {
                title: title.to_string(),
            });
        }
    }

    fn reveal(&mut self) {
        if !self.disposed {
            self.output.emit_logged(&HostEvent::PanelRevealed);
        }
    }

    fn dispose(&mut self) {
        if !self.disposed {
            self.disposed = true;
            self.output.emit_logged(&HostEvent::PanelDisposed);
        }
    }
}

/// Writes notifications as host events and to the log.
#[derive(Debug, Clone)]
pub struct HostNotifier {
    output: HostOutput,
}

impl HostNotifier {
    pub fn new(output: HostOutput) -> Self {
        Self { output }
    }
}

impl Notifier for HostNotifier {
    fn notify(&self, severity: Severity, message: &str) {
        crate::display::LogNotifier.notify(severity, message);
        self.output.emit_logged(&HostEvent::Notification {
            severity,
            message: message.to_string(),
        });
    }
}
