//! Analysis-related supporting types for events

use serde::{Deserialize, Serialize};
use std::fmt;

/// Which kind of input an analysis was submitted with
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InputSource {
    /// Uploaded audio file (`POST /process-file`)
    File,
    /// Video URL (`POST /process-youtube`)
    Url,
}

impl fmt::Display for InputSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InputSource::File => write!(f, "file"),
            InputSource::Url => write!(f, "url"),
        }
    }
}

/// Why an analysis ended in failure
///
/// All kinds render identically to the user; the distinction is kept for
/// diagnostics and logs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    /// Timeout clock fired before the backend answered
    TimedOut,
    /// Non-success HTTP status, or the request never completed
    RequestError,
    /// Success status but the body lacked a usable notes array
    InvalidResponse,
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FailureKind::TimedOut => write!(f, "timed_out"),
            FailureKind::RequestError => write!(f, "request_error"),
            FailureKind::InvalidResponse => write!(f, "invalid_response"),
        }
    }
}

/// The three logical views of the front end
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ViewKind {
    /// File drop / URL entry form
    Input,
    /// Progress bar (and in-place errors)
    Progress,
    /// Chord/note sequence
    Results,
}

impl ViewKind {
    /// Page path the browser should load for this view
    pub fn path(&self) -> &'static str {
        match self {
            ViewKind::Input => "/",
            ViewKind::Progress => "/progress",
            ViewKind::Results => "/results",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_failure_kind_serializes_snake_case() {
        let json = serde_json::to_string(&FailureKind::InvalidResponse).unwrap();
        assert_eq!(json, "\"invalid_response\"");
        assert_eq!(FailureKind::TimedOut.to_string(), "timed_out");
    }

    #[test]
    fn test_view_paths() {
        assert_eq!(ViewKind::Input.path(), "/");
        assert_eq!(ViewKind::Progress.path(), "/progress");
        assert_eq!(ViewKind::Results.path(), "/results");
    }
}
