//! UI Routes - HTML pages for the chordscope-fe web interface
//!
//! Three views, vanilla HTML/CSS/JS:
//! - **Input** (`input`): file drop/choose or URL entry
//! - **Progress** (`progress`): live progress over SSE, failure with a way back
//! - **Results** (`results`): ordered chords, key, playback, export
//!
//! Shared CSS/JS are embedded at compile time (`static_assets`).

use axum::{routing::get, Router};
use serde::Deserialize;
use uuid::Uuid;

use crate::AppState;

mod input;
mod progress;
mod results;
mod static_assets;

use input::input_page;
use progress::progress_page;
use results::results_page;
use static_assets::{serve_chordscope_css, serve_chordscope_sse_js};

/// `?session=<id>` on the progress and results pages
#[derive(Debug, Default, Deserialize)]
pub struct PageQuery {
    pub session: Option<Uuid>,
}

/// Build UI routes
pub fn ui_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(input_page))
        .route("/progress", get(progress_page))
        .route("/results", get(results_page))
        .route("/static/chordscope.css", get(serve_chordscope_css))
        .route("/static/chordscope-sse.js", get(serve_chordscope_sse_js))
}

/// Escape text for HTML element and attribute content
pub(crate) fn escape_html(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            c => escaped.push(c),
        }
    }
    escaped
}

/// Opening markup shared by all pages: head, header with build info
fn page_start(title: &str, subtitle: &str) -> String {
    let version = env!("CARGO_PKG_VERSION");
    let git_hash = env!("GIT_HASH");
    let short_hash = git_hash.get(..8).unwrap_or(git_hash);
    let build_timestamp = env!("BUILD_TIMESTAMP");
    let build_profile = env!("BUILD_PROFILE");

    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="UTF-8">
    <meta name="viewport" content="width=device-width, initial-scale=1.0">
    <title>Chordscope - {title}</title>
    <link rel="stylesheet" href="/static/chordscope.css">
</head>
<body>
    <header>
        <div class="header-content">
            <div class="header-left">
                <h1>
                    Chordscope
                    <span class="connection-status" id="connection-status">Connecting...</span>
                </h1>
                <p class="subtitle">{subtitle}</p>
            </div>
            <div class="header-right">
                <div class="build-info-line">chordscope-fe v{version}</div>
                <div class="build-info-line">{short_hash} ({build_profile})</div>
                <div class="build-info-line">{build_timestamp}</div>
            </div>
        </div>
    </header>
    <div class="content">
"#,
        title = escape_html(title),
        subtitle = escape_html(subtitle),
    )
}

fn page_end(script: &str) -> String {
    format!(
        r#"    </div>
    <script src="/static/chordscope-sse.js"></script>
    <script>
{script}
    </script>
</body>
</html>"#
    )
}
