//! Results view - ordered chords, key, playback and export

use axum::{
    extract::{Query, State},
    response::{Html, IntoResponse, Redirect, Response},
};
use std::fmt::Write;

use super::{escape_html, page_end, page_start, PageQuery};
use crate::models::Instrument;
use crate::services::presenter::{self, ResultsView};
use crate::AppState;

/// GET /results?session=<id>
pub async fn results_page(
    State(state): State<AppState>,
    Query(query): Query<PageQuery>,
) -> Response {
    let Some(session_id) = query.session else {
        return Redirect::to("/").into_response();
    };
    let Some(session) = state.orchestrator.session(session_id).await else {
        return Redirect::to("/").into_response();
    };
    let Some(view) = presenter::render_results(&session) else {
        return Redirect::to(&format!("/progress?session={}", session_id)).into_response();
    };

    Html(render_page(&view)).into_response()
}

fn render_page(view: &ResultsView) -> String {
    let mut html = page_start(&view.title, "Detected chords");

    let _ = write!(
        html,
        r#"        <h2>{title}</h2>
        <p class="meta">
            <span>Key: {key}</span>
            <span>Time Signature: {time_signature}</span>
            <span>Instrument: <select id="instrument-select">{options}</select></span>
        </p>

        <button class="button" id="play-button">{play_label}</button>
        <a class="button" href="/analysis/{session_id}/export?kind=chords">Export chords</a>
        <a class="button" href="/analysis/{session_id}/export?kind=notes">Export notes</a>

        <div class="entries">
"#,
        title = escape_html(&view.title),
        key = view.key,
        time_signature = view.time_signature,
        options = instrument_options(view.instrument),
        play_label = if view.is_playing { "Pause" } else { "Play" },
        session_id = view.session_id,
    );

    for entry in &view.entries {
        let _ = writeln!(
            html,
            r#"            <div class="entry{group}" title="{start:.2}s - {end:.2}s">{chord}</div>"#,
            group = if entry.starts_group { " group-start" } else { "" },
            start = entry.start_time,
            end = entry.end_time,
            chord = escape_html(&entry.chord),
        );
    }
    if view.entries.is_empty() {
        html.push_str("            <p>No chords were detected.</p>\n");
    }

    html.push_str(
        r#"        </div>
        <a class="button" href="/" id="go-back">Analyze another</a>
"#,
    );

    let script = format!(
        r#"
        const sessionId = '{session_id}';
        const connection = new ChordscopeSSEConnection('/events', 'connection-status');
        connection.connect();

        document.getElementById('play-button').addEventListener('click', async (e) => {{
            const response = await fetch('/analysis/' + sessionId + '/playback', {{ method: 'POST' }});
            if (response.ok) {{
                const body = await response.json();
                e.target.textContent = body.is_playing ? 'Pause' : 'Play';
            }}
        }});

        document.getElementById('instrument-select').addEventListener('change', (e) => {{
            fetch('/analysis/' + sessionId + '/instrument', {{
                method: 'POST',
                headers: {{ 'Content-Type': 'application/json' }},
                body: JSON.stringify({{ instrument: e.target.value }}),
            }});
        }});

        document.getElementById('go-back').addEventListener('click', async (e) => {{
            e.preventDefault();
            await fetch('/analysis/cancel/' + sessionId, {{ method: 'POST' }}).catch(() => null);
            window.location.href = '/';
        }});
"#,
        session_id = view.session_id,
    );
    html.push_str(&page_end(&script));
    html
}

fn instrument_options(selected: Instrument) -> String {
    Instrument::ALL
        .iter()
        .map(|instrument| {
            let value = serde_json::to_value(instrument)
                .ok()
                .and_then(|v| v.as_str().map(str::to_string))
                .unwrap_or_default();
            format!(
                r#"<option value="{}"{}>{}</option>"#,
                value,
                if *instrument == selected { " selected" } else { "" },
                instrument.label()
            )
        })
        .collect()
}
