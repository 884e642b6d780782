//! Default value functions for configuration.
//!
//! Used as `#[serde(default = "crate::defaults::...")]` attributes on
//! [`PreviewConfig`](crate::PreviewConfig) fields.

pub fn script_extensions() -> Vec<String> {
    vec!["js".to_string()]
}

pub fn single_file_name() -> String {
    "index.js".to_string()
}

pub fn root_segment() -> String {
    "root".to_string()
}

pub fn title_prefix() -> String {
    "OpenJscad".to_string()
}

pub fn debounce_ms() -> u64 {
    100
}

pub fn viewer_script() -> String {
    "media/openjscad-web-sdk.js".to_string()
}

pub fn bridge_script() -> String {
    "media/bridge.js".to_string()
}
