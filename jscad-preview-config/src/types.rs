//! Enumerations shared between the config file and the runtime crates.

use serde::{Deserialize, Serialize};

/// Log level for the debug log bridge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    /// No logging (log file not created)
    #[default]
    Off,
    /// Errors only
    Error,
    /// Warnings and errors
    Warn,
    /// Informational messages
    Info,
    /// Debug messages
    Debug,
    /// Most verbose
    Trace,
}

impl LogLevel {
    /// All available levels, least verbose first
    pub fn all() -> &'static [LogLevel] {
        &[
            LogLevel::Off,
            LogLevel::Error,
            LogLevel::Warn,
            LogLevel::Info,
            LogLevel::Debug,
            LogLevel::Trace,
        ]
    }

    /// Lowercase name as written in config files and on the command line
    pub fn name(self) -> &'static str {
        match self {
            LogLevel::Off => "off",
            LogLevel::Error => "error",
            LogLevel::Warn => "warn",
            LogLevel::Info => "info",
            LogLevel::Debug => "debug",
            LogLevel::Trace => "trace",
        }
    }

    /// Convert to `log::LevelFilter`
    pub fn to_level_filter(self) -> log::LevelFilter {
        match self {
            LogLevel::Off => log::LevelFilter::Off,
            LogLevel::Error => log::LevelFilter::Error,
            LogLevel::Warn => log::LevelFilter::Warn,
            LogLevel::Info => log::LevelFilter::Info,
            LogLevel::Debug => log::LevelFilter::Debug,
            LogLevel::Trace => log::LevelFilter::Trace,
        }
    }
}

/// Which viewer message carries tree updates to the display surface.
///
/// `SetData` hands the tree to the viewer's builder; `Update` is the older
/// protocol that passes the tree straight to the viewer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ProtocolVariant {
    #[default]
    SetData,
    Update,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_level_filters_are_ordered() {
        let filters: Vec<log::LevelFilter> =
            LogLevel::all().iter().map(|l| l.to_level_filter()).collect();
        let mut sorted = filters.clone();
        sorted.sort();
        assert_eq!(filters, sorted);
    }

    #[test]
    fn test_protocol_variant_yaml_names() {
        let v: ProtocolVariant = serde_yaml_ng::from_str("update").unwrap();
        assert_eq!(v, ProtocolVariant::Update);
        let v: ProtocolVariant = serde_yaml_ng::from_str("set_data").unwrap();
        assert_eq!(v, ProtocolVariant::SetData);
    }
}
