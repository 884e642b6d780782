//! Recognised script-file suffix matching.

use std::path::Path;

/// Decides which file names are modeling scripts.
///
/// A name matches when it ends in `.<ext>` for one of the configured
/// extensions and has a non-empty stem (`.js` alone is not a script).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScriptFilter {
    extensions: Vec<String>,
}

impl ScriptFilter {
    pub fn new<I, S>(extensions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            extensions: extensions.into_iter().map(Into::into).collect(),
        }
    }

    pub fn extensions(&self) -> &[String] {
        &self.extensions
    }

    /// The recognised extension of `name`, if any.
    ///
    /// The longest matching extension wins so that `model.jscad.js` style
    /// configurations stay unambiguous.
    pub fn extension_of(&self, name: &str) -> Option<&str> {
        self.extensions
            .iter()
            .filter(|ext| {
                name.len() > ext.len() + 1
                    && name.ends_with(ext.as_str())
                    && name.as_bytes()[name.len() - ext.len() - 1] == b'.'
            })
            .max_by_key(|ext| ext.len())
            .map(String::as_str)
    }

    pub fn matches(&self, name: &str) -> bool {
        self.extension_of(name).is_some()
    }

    /// Match against the final component of a filesystem path.
    pub fn matches_path(&self, path: &Path) -> bool {
        path.file_name()
            .and_then(|n| n.to_str())
            .is_some_and(|n| self.matches(n))
    }
}

impl Default for ScriptFilter {
    fn default() -> Self {
        Self::new(crate::defaults::script_extensions())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_matches_js_only() {
        let filter = ScriptFilter::default();
        assert!(filter.matches("a.js"));
        assert!(filter.matches("model.part.js"));
        assert!(!filter.matches("a.jsx"));
        assert!(!filter.matches("readme.md"));
        assert!(!filter.matches("js"));
        assert!(!filter.matches(".js"));
        assert!(!filter.matches("ajs"));
    }

    #[test]
    fn test_extension_of_prefers_longest() {
        let filter = ScriptFilter::new(["js", "jscad.js", "jscad"]);
        assert_eq!(filter.extension_of("gear.jscad"), Some("jscad"));
        assert_eq!(filter.extension_of("gear.jscad.js"), Some("jscad.js"));
        assert_eq!(filter.extension_of("gear.js"), Some("js"));
        assert_eq!(filter.extension_of("gear.ts"), None);
    }

    #[test]
    fn test_matches_path_uses_file_name() {
        let filter = ScriptFilter::default();
        assert!(filter.matches_path(Path::new("/tmp/models.js/part.js")));
        assert!(!filter.matches_path(Path::new("/tmp/models.js/part.txt")));
        assert!(!filter.matches_path(Path::new("/")));
    }
}
