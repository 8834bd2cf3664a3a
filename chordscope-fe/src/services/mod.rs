//! Service modules for the analysis front end
//!
//! - Backend client (multipart POST to the analysis service)
//! - Progress estimator (synthetic percentage while waiting)
//! - Session reducer (the state machine's single writer)
//! - Orchestrator (submission, timeout race, teardown)
//! - Input collector (validation before submission)
//! - Presenter (results, failure and export view models)

pub mod analysis_client;
pub mod input_collector;
pub mod orchestrator;
pub mod presenter;
pub mod progress_estimator;
pub mod session_reducer;

pub use analysis_client::{AnalysisBackend, ClientError, HttpAnalysisClient, RemoteAnalysis};
pub use input_collector::{InputCollector, SubmitError, ValidationError};
pub use orchestrator::{AnalysisOrchestrator, AnalysisSettings, OrchestratorError};
pub use presenter::{ExportKind, FailureView, KeyQuality, ResultsView};
pub use progress_estimator::{ProgressEstimator, ProgressHandle, ESTIMATE_CEILING};
pub use session_reducer::{Applied, SessionMsg, SessionReducer, DEFAULT_URL_TITLE};
