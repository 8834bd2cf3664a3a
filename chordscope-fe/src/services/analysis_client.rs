//! Remote analysis service client
//!
//! Posts one `multipart/form-data` request per analysis:
//! - `POST /process-file` with field `file` (binary audio)
//! - `POST /process-youtube` with field `url`
//!
//! A 2xx response must carry `{ "notes": [...], "title"?: "..." }`.

use async_trait::async_trait;
use chordscope_common::events::FailureKind;
use reqwest::multipart::{Form, Part};
use reqwest::Url;
use serde::Deserialize;
use thiserror::Error;

use crate::models::{AnalysisRequest, Note};

const USER_AGENT: &str = concat!("chordscope-fe/", env!("CARGO_PKG_VERSION"));

/// Backend client errors
#[derive(Debug, Error)]
pub enum ClientError {
    /// Connection, DNS, TLS or body transfer failure
    #[error("Could not reach the analysis service: {0}")]
    Network(String),

    /// Backend answered with a non-success status
    #[error("Analysis service returned {status}: {detail}")]
    Status { status: u16, detail: String },

    /// Success status but unusable body
    #[error("Analysis service sent an invalid response: {0}")]
    InvalidResponse(String),

    /// Base URL is not a usable http(s) URL
    #[error("Invalid analysis service URL: {0}")]
    InvalidUrl(String),

    /// Request payload could not be encoded
    #[error("Could not build analysis request: {0}")]
    InvalidRequest(String),
}

impl ClientError {
    /// Failure category shown on the progress view
    pub fn kind(&self) -> FailureKind {
        match self {
            ClientError::InvalidResponse(_) => FailureKind::InvalidResponse,
            ClientError::Network(_)
            | ClientError::Status { .. }
            | ClientError::InvalidUrl(_)
            | ClientError::InvalidRequest(_) => FailureKind::RequestError,
        }
    }
}

/// Parsed success body
#[derive(Debug, Clone, PartialEq)]
pub struct RemoteAnalysis {
    pub notes: Vec<Note>,
    /// Title reported by the backend (URL analyses)
    pub title: Option<String>,
}

/// The remote analysis service
///
/// `HttpAnalysisClient` is the production implementation; tests substitute
/// scripted backends.
#[async_trait]
pub trait AnalysisBackend: Send + Sync {
    /// Submit one request and wait for the complete result
    async fn analyze(&self, request: AnalysisRequest) -> Result<RemoteAnalysis, ClientError>;
}

/// HTTP client for the analysis service
pub struct HttpAnalysisClient {
    http_client: reqwest::Client,
    base_url: Url,
}

impl HttpAnalysisClient {
    /// Create a client for `base_url` (e.g. "http://127.0.0.1:8000")
    ///
    /// No transport-level timeout is set: the orchestrator's timeout clock
    /// owns the deadline.
    pub fn new(base_url: &str) -> Result<Self, ClientError> {
        let base_url =
            Url::parse(base_url).map_err(|e| ClientError::InvalidUrl(format!("{}: {}", base_url, e)))?;
        if !matches!(base_url.scheme(), "http" | "https") {
            return Err(ClientError::InvalidUrl(format!(
                "{}: scheme must be http or https",
                base_url
            )));
        }

        let http_client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| ClientError::Network(e.to_string()))?;

        Ok(Self {
            http_client,
            base_url,
        })
    }

    /// Full URL for the request's endpoint
    pub fn endpoint_url(&self, request: &AnalysisRequest) -> Url {
        // Keep any path prefix on the base ("http://host/api" → "/api/process-file")
        let mut url = self.base_url.clone();
        let path = format!(
            "{}{}",
            url.path().trim_end_matches('/'),
            request.endpoint_path()
        );
        url.set_path(&path);
        url
    }

    fn build_form(request: AnalysisRequest) -> Result<Form, ClientError> {
        let field = request.form_field();
        let form = match request {
            AnalysisRequest::File(upload) => {
                let part = Part::bytes(upload.bytes)
                    .file_name(upload.file_name)
                    .mime_str(&upload.media_type)
                    .map_err(|e| ClientError::InvalidRequest(format!("media type: {}", e)))?;
                Form::new().part(field, part)
            }
            AnalysisRequest::Url(url) => Form::new().text(field, url),
        };
        Ok(form)
    }
}

#[async_trait]
impl AnalysisBackend for HttpAnalysisClient {
    async fn analyze(&self, request: AnalysisRequest) -> Result<RemoteAnalysis, ClientError> {
        let url = self.endpoint_url(&request);
        let source = request.source();
        let form = Self::build_form(request)?;

        tracing::debug!(url = %url, source = %source, "Posting analysis request");

        let response = self
            .http_client
            .post(url)
            .multipart(form)
            .send()
            .await
            .map_err(|e| ClientError::Network(e.to_string()))?;

        let status = response.status();
        let body = response
            .bytes()
            .await
            .map_err(|e| ClientError::Network(e.to_string()))?;

        if !status.is_success() {
            return Err(ClientError::Status {
                status: status.as_u16(),
                detail: error_detail(&body),
            });
        }

        let analysis = parse_success_body(&body)?;

        tracing::info!(
            notes = analysis.notes.len(),
            has_title = analysis.title.is_some(),
            "Analysis service returned result"
        );

        Ok(analysis)
    }
}

/// One entry of the `notes` array
///
/// Objects carry timing; bare strings are chord labels without timing.
#[derive(Deserialize)]
#[serde(untagged)]
enum WireNote {
    Timed(Note),
    Label(String),
}

impl From<WireNote> for Note {
    fn from(wire: WireNote) -> Self {
        match wire {
            WireNote::Timed(note) => note,
            WireNote::Label(chord) => Note::new(chord, 0.0, 0.0),
        }
    }
}

/// Interpret a 2xx body
pub fn parse_success_body(body: &[u8]) -> Result<RemoteAnalysis, ClientError> {
    let value: serde_json::Value = serde_json::from_slice(body)
        .map_err(|e| ClientError::InvalidResponse(format!("body is not JSON ({})", e)))?;

    let notes = value
        .get("notes")
        .and_then(|n| n.as_array())
        .ok_or_else(|| ClientError::InvalidResponse("missing notes array".to_string()))?;

    let notes = notes
        .iter()
        .enumerate()
        .map(|(index, entry)| {
            serde_json::from_value::<WireNote>(entry.clone())
                .map(Note::from)
                .map_err(|_| ClientError::InvalidResponse(format!("malformed note at index {}", index)))
        })
        .collect::<Result<Vec<_>, _>>()?;

    let title = value
        .get("title")
        .and_then(|t| t.as_str())
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(str::to_string);

    Ok(RemoteAnalysis { notes, title })
}

/// Human-readable detail from an error body
///
/// The backend reports failures as `{"detail": "..."}`; anything else is
/// passed through as text, or the status alone when empty.
fn error_detail(body: &[u8]) -> String {
    if let Ok(value) = serde_json::from_slice::<serde_json::Value>(body) {
        if let Some(detail) = value.get("detail").and_then(|d| d.as_str()) {
            return detail.to_string();
        }
    }

    let text = String::from_utf8_lossy(body).trim().to_string();
    if text.is_empty() {
        "no details".to_string()
    } else {
        text
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::AudioUpload;

    #[test]
    fn test_parse_notes_and_title() {
        let body = br#"{"notes":[{"chord":"Am","start_time":0,"end_time":1},{"chord":"F","start_time":1,"end_time":2}],"title":"Song X"}"#;
        let parsed = parse_success_body(body).unwrap();

        assert_eq!(parsed.notes.len(), 2);
        assert_eq!(parsed.notes[0], Note::new("Am", 0.0, 1.0));
        assert_eq!(parsed.notes[1].chord, "F");
        assert_eq!(parsed.title.as_deref(), Some("Song X"));
    }

    #[test]
    fn test_parse_missing_notes_is_invalid() {
        let err = parse_success_body(br#"{"title":"Song X"}"#).unwrap_err();
        assert_eq!(err.kind(), FailureKind::InvalidResponse);
    }

    #[test]
    fn test_parse_notes_not_array_is_invalid() {
        let err = parse_success_body(br#"{"notes":"Am F C"}"#).unwrap_err();
        assert!(matches!(err, ClientError::InvalidResponse(_)));
    }

    #[test]
    fn test_parse_non_json_is_invalid() {
        let err = parse_success_body(b"<html>oops</html>").unwrap_err();
        assert_eq!(err.kind(), FailureKind::InvalidResponse);
    }

    #[test]
    fn test_parse_malformed_entry_is_invalid() {
        let err = parse_success_body(br#"{"notes":[{"chord":"Am","start_time":0,"end_time":1},42]}"#)
            .unwrap_err();
        assert_eq!(err.to_string(), "Analysis service sent an invalid response: malformed note at index 1");
    }

    #[test]
    fn test_parse_bare_labels_and_blank_title() {
        let parsed = parse_success_body(br#"{"notes":["Am","G"],"title":"  "}"#).unwrap();
        assert_eq!(parsed.notes, vec![Note::new("Am", 0.0, 0.0), Note::new("G", 0.0, 0.0)]);
        assert_eq!(parsed.title, None);
    }

    #[test]
    fn test_error_detail_prefers_detail_field() {
        assert_eq!(error_detail(br#"{"detail":"Video unavailable"}"#), "Video unavailable");
        assert_eq!(error_detail(b"Bad Gateway"), "Bad Gateway");
        assert_eq!(error_detail(b""), "no details");
    }

    #[test]
    fn test_status_and_network_are_request_errors() {
        let status = ClientError::Status {
            status: 400,
            detail: "bad".to_string(),
        };
        assert_eq!(status.kind(), FailureKind::RequestError);
        assert_eq!(ClientError::Network("refused".to_string()).kind(), FailureKind::RequestError);
    }

    #[test]
    fn test_endpoint_url_keeps_base_prefix() {
        let client = HttpAnalysisClient::new("http://127.0.0.1:8000/api/").unwrap();
        let file = AnalysisRequest::File(AudioUpload {
            file_name: "a.mp3".to_string(),
            media_type: "audio/mpeg".to_string(),
            bytes: vec![],
        });
        let url = AnalysisRequest::Url("https://youtu.be/x".to_string());

        assert_eq!(
            client.endpoint_url(&file).as_str(),
            "http://127.0.0.1:8000/api/process-file"
        );
        assert_eq!(
            client.endpoint_url(&url).as_str(),
            "http://127.0.0.1:8000/api/process-youtube"
        );
    }

    #[test]
    fn test_invalid_base_url_rejected() {
        assert!(matches!(
            HttpAnalysisClient::new("not a url"),
            Err(ClientError::InvalidUrl(_))
        ));
        assert!(matches!(
            HttpAnalysisClient::new("ftp://host/"),
            Err(ClientError::InvalidUrl(_))
        ));
    }

    #[test]
    fn test_parse_entry_without_timing_defaults_to_zero() {
        let parsed = parse_success_body(br#"{"notes":[{"chord":"Em"}]}"#).unwrap();
        assert_eq!(parsed.notes, vec![Note::new("Em", 0.0, 0.0)]);
    }
}
