//! Seams to the editor: the display surface, the host that creates it, and
//! user-visible notifications.

use jscad_preview_protocol::{OutboundMessage, Severity};

/// An embedded preview panel that renders whatever tree it is sent.
pub trait DisplaySurface: Send + 'static {
    /// Push a message to the surface's bridging script.
    fn post_message(&mut self, message: &OutboundMessage) -> anyhow::Result<()>;

    fn set_title(&mut self, title: &str);

    /// Bring the panel to the foreground.
    fn reveal(&mut self);

    /// Close the panel. Calling it again has no effect.
    fn dispose(&mut self);
}

/// Creates display surfaces.
pub trait DisplayHost {
    type Surface: DisplaySurface;

    fn create_surface(&mut self, title: &str, html: &str) -> anyhow::Result<Self::Surface>;
}

/// Shows messages to the user.
pub trait Notifier: Send + Sync {
    fn notify(&self, severity: Severity, message: &str);

    fn warn(&self, message: &str) {
        self.notify(Severity::Warning, message);
    }

    fn error(&self, message: &str) {
        self.notify(Severity::Error, message);
    }
}

/// Notifier for hosts without a UI: everything goes to the log.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn notify(&self, severity: Severity, message: &str) {
        match severity {
            Severity::Info => log::info!("{}", message),
            Severity::Warning => log::warn!("{}", message),
            Severity::Error => log::error!("{}", message),
        }
    }
}
