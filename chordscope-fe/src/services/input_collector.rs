//! Input validation in front of the orchestrator
//!
//! A request only reaches the orchestrator (and therefore the network) after
//! it passes validation here.

use thiserror::Error;

use super::orchestrator::{AnalysisOrchestrator, OrchestratorError};
use crate::models::{AnalysisRequest, AnalysisSession, AudioUpload};

/// Input rejected before submission
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ValidationError {
    /// Declared media type is not `audio/*`
    #[error("Please upload an audio file (got {0})")]
    InvalidFileType(String),

    /// No file part, or a URL that is blank after trimming
    #[error("Please provide an audio file or a video URL")]
    MissingInput,
}

/// Why a submission was not started
#[derive(Debug, Error, PartialEq)]
pub enum SubmitError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Orchestrator(#[from] OrchestratorError),
}

/// Check a request without submitting it
///
/// URLs come back trimmed.
pub fn validate(request: AnalysisRequest) -> Result<AnalysisRequest, ValidationError> {
    match request {
        AnalysisRequest::File(upload) => validate_file(upload).map(AnalysisRequest::File),
        AnalysisRequest::Url(url) => {
            let trimmed = url.trim();
            if trimmed.is_empty() {
                return Err(ValidationError::MissingInput);
            }
            Ok(AnalysisRequest::Url(trimmed.to_string()))
        }
    }
}

fn validate_file(upload: AudioUpload) -> Result<AudioUpload, ValidationError> {
    let media_type = upload.media_type.trim().to_ascii_lowercase();
    if !media_type.starts_with("audio/") {
        let shown = if media_type.is_empty() {
            "no media type".to_string()
        } else {
            media_type
        };
        return Err(ValidationError::InvalidFileType(shown));
    }
    Ok(upload)
}

/// Gathers one request from the input view and hands it on
#[derive(Clone)]
pub struct InputCollector {
    orchestrator: AnalysisOrchestrator,
}

impl InputCollector {
    pub fn new(orchestrator: AnalysisOrchestrator) -> Self {
        Self { orchestrator }
    }

    /// Validate and start an analysis; the session is shown on the progress view
    pub async fn submit(&self, request: AnalysisRequest) -> Result<AnalysisSession, SubmitError> {
        let request = validate(request).map_err(|e| {
            tracing::info!(error = %e, "Submission rejected by validation");
            e
        })?;

        Ok(self.orchestrator.start(request).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn file(media_type: &str) -> AnalysisRequest {
        AnalysisRequest::File(AudioUpload {
            file_name: "clip".to_string(),
            media_type: media_type.to_string(),
            bytes: vec![0; 4],
        })
    }

    #[test]
    fn test_audio_types_accepted() {
        assert!(validate(file("audio/mpeg")).is_ok());
        assert!(validate(file("audio/wav")).is_ok());
        assert!(validate(file("Audio/FLAC")).is_ok());
    }

    #[test]
    fn test_non_audio_rejected() {
        assert_eq!(
            validate(file("video/mp4")).unwrap_err(),
            ValidationError::InvalidFileType("video/mp4".to_string())
        );
        assert_eq!(
            validate(file("")).unwrap_err(),
            ValidationError::InvalidFileType("no media type".to_string())
        );
    }

    #[test]
    fn test_url_trimmed_or_missing() {
        assert_eq!(
            validate(AnalysisRequest::Url("  https://youtu.be/x \n".to_string())).unwrap(),
            AnalysisRequest::Url("https://youtu.be/x".to_string())
        );
        assert_eq!(
            validate(AnalysisRequest::Url("   ".to_string())).unwrap_err(),
            ValidationError::MissingInput
        );
    }
}
