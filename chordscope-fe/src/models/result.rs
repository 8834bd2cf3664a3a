//! Analysis result: the ordered chord/note sequence

use serde::{Deserialize, Serialize};

/// One detected chord or note with its time span (seconds)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Note {
    pub chord: String,
    #[serde(default)]
    pub start_time: f64,
    #[serde(default)]
    pub end_time: f64,
}

impl Note {
    pub fn new(chord: impl Into<String>, start_time: f64, end_time: f64) -> Self {
        Self {
            chord: chord.into(),
            start_time,
            end_time,
        }
    }
}

/// Result of one successful analysis
///
/// Insertion order is temporal order. The sequence is fixed at construction;
/// there is no way to reorder or mutate it afterwards.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(transparent)]
pub struct AnalysisResult {
    notes: Vec<Note>,
}

impl AnalysisResult {
    pub fn new(notes: Vec<Note>) -> Self {
        Self { notes }
    }

    pub fn notes(&self) -> &[Note] {
        &self.notes
    }

    /// Chord labels in order
    pub fn chords(&self) -> impl Iterator<Item = &str> + '_ {
        self.notes.iter().map(|n| n.chord.as_str())
    }

    pub fn first_chord(&self) -> Option<&str> {
        self.notes.first().map(|n| n.chord.as_str())
    }

    pub fn len(&self) -> usize {
        self.notes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.notes.is_empty()
    }
}
