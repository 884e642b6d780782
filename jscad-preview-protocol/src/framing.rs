//! Newline-delimited JSON framing.
//!
//! One JSON value per line, flushed after every write so the peer sees each
//! message as soon as it is produced.

use serde::Serialize;
use serde::de::DeserializeOwned;
use std::io::Write;
use thiserror::Error;

/// Errors from reading or writing a single frame.
#[derive(Debug, Error)]
pub enum FrameError {
    /// The line was empty or whitespace only.
    #[error("empty frame")]
    Empty,
    /// The line was not valid JSON for the expected type.
    #[error("invalid JSON frame: {0}")]
    Json(#[source] serde_json::Error),
    /// Writing to the underlying stream failed.
    #[error("frame I/O error: {0}")]
    Io(#[source] std::io::Error),
}

/// Parse one line into a message.
pub fn parse_line<T: DeserializeOwned>(line: &str) -> Result<T, FrameError> {
    let trimmed = line.trim();
    if trimmed.is_empty() {
        return Err(FrameError::Empty);
    }
    serde_json::from_str(trimmed).map_err(FrameError::Json)
}

/// Write a message as a single newline-terminated line and flush.
pub fn write_line<T: Serialize>(out: &mut impl Write, message: &T) -> Result<(), FrameError> {
    let json = serde_json::to_string(message).map_err(FrameError::Json)?;
    log::trace!("-> {json}");
    writeln!(out, "{json}").map_err(FrameError::Io)?;
    out.flush().map_err(FrameError::Io)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::message::{HostEvent, InboundMessage};

    #[test]
    fn test_write_line_is_single_line() {
        let mut buf = Vec::new();
        write_line(
            &mut buf,
            &HostEvent::TitleChanged {
                title: "multi\nline".to_string(),
            },
        )
        .unwrap();
        let text = String::from_utf8(buf).unwrap();
        assert_eq!(text.matches('\n').count(), 1);
        assert!(text.ends_with('\n'));
    }

    #[test]
    fn test_parse_line() {
        let msg: InboundMessage = parse_line("  {\"command\":\"ready\"}\r\n").unwrap();
        assert_eq!(msg, InboundMessage::Ready);
        assert!(matches!(parse_line::<InboundMessage>("   "), Err(FrameError::Empty)));
        assert!(matches!(
            parse_line::<InboundMessage>("{not json"),
            Err(FrameError::Json(_))
        ));
        // Missing discriminant is a framing error, not an unknown command
        assert!(parse_line::<InboundMessage>("{\"target\":\"x\"}").is_err());
    }

    #[test]
    fn test_frame_error_messages_and_sources() {
        use std::error::Error as _;

        assert_eq!(FrameError::Empty.to_string(), "empty frame");
        assert!(FrameError::Empty.source().is_none());

        let err = parse_line::<InboundMessage>("{not json").unwrap_err();
        assert!(err.to_string().starts_with("invalid JSON frame: "));
        assert!(err.source().is_some());

        let io = FrameError::Io(std::io::Error::other("pipe closed"));
        assert_eq!(io.to_string(), "frame I/O error: pipe closed");
        assert!(io.source().is_some());
    }
}
