//! HTTP API handlers for chordscope-fe
//!
//! JSON endpoints for submitting and following analyses, SSE streams for
//! live progress, and the three HTML views.

pub mod analysis;
pub mod health;
pub mod sse;
pub mod ui;

pub use analysis::analysis_routes;
pub use health::health_routes;
pub use sse::{analysis_event_stream, event_stream};
pub use ui::ui_routes;
