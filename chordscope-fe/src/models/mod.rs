//! Data models for chordscope-fe
//!
//! - Analysis requests (file upload or URL)
//! - Analysis results (ordered chord/note sequence)
//! - Analysis session state machine

pub mod request;
pub mod result;
pub mod session;

pub use request::{AnalysisRequest, AudioUpload, Instrument};
pub use result::{AnalysisResult, Note};
pub use session::{
    AnalysisOutcome, AnalysisSession, AnalysisState, ProgressState, StateTransition,
};
