//! Command entry: turns whatever the editor passes as a preview target into
//! a local filesystem path.

use std::path::PathBuf;
use thiserror::Error;
use url::Url;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CommandError {
    #[error("Preview is only available for files on the local filesystem: {target}")]
    NotLocalFilesystem { target: String },

    #[error("Invalid preview target: {target:?}")]
    InvalidTarget { target: String },
}

/// Resolve a plain path or `file://` URI to an absolute local path.
///
/// Any other URI scheme is rejected with
/// [`CommandError::NotLocalFilesystem`]. Single-letter schemes are treated as
/// Windows drive letters. The path is not required to exist.
pub fn resolve_target(raw: &str) -> Result<PathBuf, CommandError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(CommandError::InvalidTarget {
            target: raw.to_string(),
        });
    }

    let path = match Url::parse(trimmed) {
        Ok(url) if url.scheme() == "file" => {
            url.to_file_path()
                .map_err(|_| CommandError::InvalidTarget {
                    target: trimmed.to_string(),
                })?
        }
        Ok(url) if url.scheme().len() > 1 => {
            return Err(CommandError::NotLocalFilesystem {
                target: trimmed.to_string(),
            });
        }
        _ => PathBuf::from(trimmed),
    };

    std::path::absolute(&path).map_err(|_| CommandError::InvalidTarget {
        target: trimmed.to_string(),
    })
}
