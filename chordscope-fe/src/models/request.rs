//! Analysis request variants

use chordscope_common::events::InputSource;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Remote endpoint for file analyses
pub const FILE_ENDPOINT: &str = "/process-file";
/// Remote endpoint for URL analyses
pub const URL_ENDPOINT: &str = "/process-youtube";

/// An uploaded audio file as received from the browser
#[derive(Clone, PartialEq, Eq)]
pub struct AudioUpload {
    /// Original file name (becomes the result title)
    pub file_name: String,
    /// Declared media type, e.g. "audio/mpeg"
    pub media_type: String,
    /// Raw file contents
    pub bytes: Vec<u8>,
}

impl fmt::Debug for AudioUpload {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AudioUpload")
            .field("file_name", &self.file_name)
            .field("media_type", &self.media_type)
            .field("len", &self.bytes.len())
            .finish()
    }
}

/// One analysis submission: exactly one of file or URL
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AnalysisRequest {
    File(AudioUpload),
    Url(String),
}

impl AnalysisRequest {
    pub fn source(&self) -> InputSource {
        match self {
            AnalysisRequest::File(_) => InputSource::File,
            AnalysisRequest::Url(_) => InputSource::Url,
        }
    }

    /// Path on the analysis backend this request is posted to
    pub fn endpoint_path(&self) -> &'static str {
        match self {
            AnalysisRequest::File(_) => FILE_ENDPOINT,
            AnalysisRequest::Url(_) => URL_ENDPOINT,
        }
    }

    /// Multipart field name carrying the payload
    pub fn form_field(&self) -> &'static str {
        match self {
            AnalysisRequest::File(_) => "file",
            AnalysisRequest::Url(_) => "url",
        }
    }

    /// File name for file requests
    pub fn file_name(&self) -> Option<&str> {
        match self {
            AnalysisRequest::File(upload) => Some(upload.file_name.as_str()),
            AnalysisRequest::Url(_) => None,
        }
    }
}

/// Instrument selected on the results view
///
/// Display only: it is never sent to the backend.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Instrument {
    Guitar,
    Piano,
    Violin,
    #[default]
    Flute,
}

impl Instrument {
    pub const ALL: [Instrument; 4] = [
        Instrument::Guitar,
        Instrument::Piano,
        Instrument::Violin,
        Instrument::Flute,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            Instrument::Guitar => "Guitar",
            Instrument::Piano => "Piano",
            Instrument::Violin => "Violin",
            Instrument::Flute => "Flute",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn upload() -> AnalysisRequest {
        AnalysisRequest::File(AudioUpload {
            file_name: "song.mp3".to_string(),
            media_type: "audio/mpeg".to_string(),
            bytes: vec![0u8; 16],
        })
    }

    #[test]
    fn test_endpoint_and_field_follow_variant() {
        let file = upload();
        assert_eq!(file.endpoint_path(), "/process-file");
        assert_eq!(file.form_field(), "file");
        assert_eq!(file.source(), InputSource::File);
        assert_eq!(file.file_name(), Some("song.mp3"));

        let url = AnalysisRequest::Url("https://youtu.be/abc".to_string());
        assert_eq!(url.endpoint_path(), "/process-youtube");
        assert_eq!(url.form_field(), "url");
        assert_eq!(url.source(), InputSource::Url);
        assert_eq!(url.file_name(), None);
    }

    #[test]
    fn test_upload_debug_omits_payload() {
        let rendered = format!("{:?}", upload());
        assert!(rendered.contains("len: 16"));
        assert!(!rendered.contains("[0, 0"));
    }

    #[test]
    fn test_instrument_default_and_serde() {
        assert_eq!(Instrument::default(), Instrument::Flute);
        let parsed: Instrument = serde_json::from_str("\"piano\"").unwrap();
        assert_eq!(parsed, Instrument::Piano);
        assert_eq!(parsed.label(), "Piano");
    }
}
