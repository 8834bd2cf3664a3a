//! Results and failure view models
//!
//! Entries keep the backend's order. Every fourth entry starts a visual
//! group. The key label is a heuristic: a first chord containing a
//! lowercase `m` reads as minor ("Am", "Em7"), anything else as major.

use chordscope_common::events::FailureKind;
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

use crate::models::{AnalysisResult, AnalysisSession, Instrument};

/// Time signature shown on every result
pub const TIME_SIGNATURE: &str = "4/4";

/// Separator used when exporting a sequence
pub const EXPORT_SEPARATOR: &str = " - ";

/// Entries per visual group
const GROUP_SIZE: usize = 4;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum KeyQuality {
    Major,
    Minor,
}

impl KeyQuality {
    pub fn from_first_chord(first: Option<&str>) -> Self {
        match first {
            Some(chord) if chord.contains('m') => KeyQuality::Minor,
            _ => KeyQuality::Major,
        }
    }
}

impl fmt::Display for KeyQuality {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            KeyQuality::Major => write!(f, "Major"),
            KeyQuality::Minor => write!(f, "Minor"),
        }
    }
}

/// Which sequence an export contains
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExportKind {
    #[default]
    Chords,
    Notes,
}

impl ExportKind {
    fn suffix(&self) -> &'static str {
        match self {
            ExportKind::Chords => "chords",
            ExportKind::Notes => "notes",
        }
    }
}

/// One rendered entry
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResultEntry {
    pub index: usize,
    pub chord: String,
    pub start_time: f64,
    pub end_time: f64,
    /// First entry of a group of four
    pub starts_group: bool,
    pub is_last: bool,
}

/// Results view model
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResultsView {
    pub session_id: Uuid,
    pub title: String,
    pub key: KeyQuality,
    pub time_signature: &'static str,
    pub instrument: Instrument,
    pub is_playing: bool,
    pub entries: Vec<ResultEntry>,
}

/// Failure view model with the way back to the input view
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FailureView {
    pub session_id: Uuid,
    pub kind: FailureKind,
    pub message: String,
    pub retry_path: &'static str,
}

/// Downloadable text export
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Export {
    pub file_name: String,
    pub content: String,
}

/// Render the ordered entries of a result
pub fn render_entries(result: &AnalysisResult) -> Vec<ResultEntry> {
    let last = result.len().saturating_sub(1);
    result
        .notes()
        .iter()
        .enumerate()
        .map(|(index, note)| ResultEntry {
            index,
            chord: note.chord.clone(),
            start_time: note.start_time,
            end_time: note.end_time,
            starts_group: index % GROUP_SIZE == 0,
            is_last: index == last,
        })
        .collect()
}

/// Results view for a succeeded session, `None` otherwise
pub fn render_results(session: &AnalysisSession) -> Option<ResultsView> {
    let result = session.result()?;
    let title = session.title()?.to_string();

    Some(ResultsView {
        session_id: session.session_id,
        title,
        key: KeyQuality::from_first_chord(result.first_chord()),
        time_signature: TIME_SIGNATURE,
        instrument: session.instrument,
        is_playing: session.is_playing,
        entries: render_entries(result),
    })
}

/// Failure view for a failed session, `None` otherwise
pub fn render_failure(session: &AnalysisSession) -> Option<FailureView> {
    let (kind, message) = session.failure()?;
    Some(FailureView {
        session_id: session.session_id,
        kind,
        message: message.to_string(),
        retry_path: "/",
    })
}

/// Export file for a result
pub fn export(result: &AnalysisResult, title: &str, kind: ExportKind) -> Export {
    Export {
        file_name: format!("{}-{}.txt", sanitize_file_stem(title), kind.suffix()),
        content: result.chords().collect::<Vec<_>>().join(EXPORT_SEPARATOR),
    }
}

/// Keep a title usable as a download name
fn sanitize_file_stem(title: &str) -> String {
    let cleaned: String = title
        .chars()
        .map(|c| match c {
            '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|' => '_',
            c if c.is_control() => '_',
            c => c,
        })
        .collect();
    let cleaned = cleaned.trim();
    if cleaned.is_empty() {
        "analysis".to_string()
    } else {
        cleaned.to_string()
    }
}
