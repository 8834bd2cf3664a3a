//! Static asset handlers for the chordscope-fe UI
//!
//! Embeds and serves CSS/JS files at compile time

use axum::{http::StatusCode, response::{IntoResponse, Response}};

const CHORDSCOPE_SSE_JS: &str = include_str!("../../../static/chordscope-sse.js");
const CHORDSCOPE_CSS: &str = include_str!("../../../static/chordscope.css");

/// GET /static/chordscope-sse.js
pub async fn serve_chordscope_sse_js() -> Response {
    (
        StatusCode::OK,
        [
            ("content-type", "application/javascript"),
            ("cache-control", "no-cache, no-store, must-revalidate"),
        ],
        CHORDSCOPE_SSE_JS,
    )
        .into_response()
}

/// GET /static/chordscope.css
pub async fn serve_chordscope_css() -> Response {
    (
        StatusCode::OK,
        [
            ("content-type", "text/css"),
            ("cache-control", "no-cache, no-store, must-revalidate"),
        ],
        CHORDSCOPE_CSS,
    )
        .into_response()
}
