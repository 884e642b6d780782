//! Configuration system for the jscad-preview host.
//!
//! This crate provides configuration loading, saving, and default values
//! for the preview host. It includes:
//!
//! - The [`PreviewConfig`] struct and its YAML persistence
//! - [`ScriptFilter`], the recognised script-file suffix matcher
//! - Shared enumerations ([`LogLevel`], [`ProtocolVariant`])
//! - Typed configuration errors ([`ConfigError`])

pub mod config;
pub mod defaults;
pub mod error;
pub mod filter;
mod types;

pub use config::PreviewConfig;
pub use error::ConfigError;
pub use filter::ScriptFilter;
pub use types::{LogLevel, ProtocolVariant};
