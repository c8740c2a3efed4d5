//! Unified error type for hlsaux.
//!
//! Every unit of work (one variant, one caption stream) fails with an
//! [`Error`]; the orchestrator isolates it and carries on with the others.
//! Non-fatal conditions are reported as [`Warning`]s instead.

use std::fmt;

/// Unified error type covering all failure modes in hlsaux.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The packet feed could not be obtained or was malformed.
    #[error("Probe error: {0}")]
    Probe(String),

    /// An external tool failed to spawn, exited non-zero or timed out.
    #[error("Tool error [{tool}]: {message}")]
    Tool {
        /// Name of the tool that failed.
        tool: String,
        /// Human-readable error description.
        message: String,
    },

    /// Cue input was structurally invalid. Parsing stops at the first one.
    #[error("Parse error at line {line}: {message}")]
    Parse {
        /// 1-based line number of the offending input line.
        line: usize,
        /// Human-readable error description.
        message: String,
    },

    /// An input playlist could not be read or interpreted.
    #[error("Playlist error: {0}")]
    Playlist(String),

    /// No segment of a variant contained a keyframe.
    #[error("No keyframes found in variant {variant}")]
    NoKeyframes {
        /// URI of the variant playlist.
        variant: String,
    },

    /// The producer/consumer hand-off broke down.
    #[error("Hand-off error: {0}")]
    HandOff(String),

    /// The unit was cancelled before it completed.
    #[error("Cancelled")]
    Cancelled,

    /// Configuration or request data failed validation.
    #[error("Validation error: {0}")]
    Validation(String),

    /// An I/O operation failed.
    #[error("IO error: {source}")]
    Io {
        /// The underlying I/O error.
        #[from]
        source: std::io::Error,
    },
}

impl Error {
    /// Convenience constructor for [`Error::Probe`].
    pub fn probe(message: impl Into<String>) -> Self {
        Error::Probe(message.into())
    }

    /// Convenience constructor for [`Error::Tool`].
    pub fn tool(tool: impl Into<String>, message: impl Into<String>) -> Self {
        Error::Tool {
            tool: tool.into(),
            message: message.into(),
        }
    }

    /// Convenience constructor for [`Error::Parse`].
    pub fn parse(line: usize, message: impl Into<String>) -> Self {
        Error::Parse {
            line,
            message: message.into(),
        }
    }

    /// Convenience constructor for [`Error::Playlist`].
    pub fn playlist(message: impl Into<String>) -> Self {
        Error::Playlist(message.into())
    }

    /// Whether this error came from the packet feed (ProbeFailure).
    pub fn is_probe_failure(&self) -> bool {
        matches!(self, Error::Probe(_) | Error::Tool { .. })
    }
}

/// Result type alias using the hlsaux [`Error`].
pub type Result<T> = std::result::Result<T, Error>;

/// A non-fatal condition that degraded a unit's output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Warning {
    /// A segment file contained no keyframe and contributed no entries.
    NoKeyframes {
        /// URI of the segment file.
        segment: String,
    },
}

impl fmt::Display for Warning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Warning::NoKeyframes { segment } => {
                write!(f, "segment {segment} has no keyframe")
            }
        }
    }
}
