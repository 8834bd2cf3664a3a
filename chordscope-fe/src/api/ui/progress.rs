//! Progress view - synthetic progress, then navigation or failure

use axum::{
    extract::{Query, State},
    response::{Html, IntoResponse, Redirect, Response},
};
use chordscope_common::events::ViewKind;

use super::{escape_html, page_end, page_start, PageQuery};
use crate::services::presenter;
use crate::AppState;

/// GET /progress?session=<id>
pub async fn progress_page(
    State(state): State<AppState>,
    Query(query): Query<PageQuery>,
) -> Response {
    let Some(session_id) = query.session else {
        return Redirect::to("/").into_response();
    };
    let Some(session) = state.orchestrator.session(session_id).await else {
        return Redirect::to("/").into_response();
    };

    match session.view {
        ViewKind::Results => {
            return Redirect::to(&format!("/results?session={}", session_id)).into_response();
        }
        ViewKind::Input if session.is_terminal() => return Redirect::to("/").into_response(),
        _ => {}
    }

    let failure = presenter::render_failure(&session);
    let (failure_hidden, failure_message) = match &failure {
        Some(view) => ("", escape_html(&view.message)),
        None => ("hidden", String::new()),
    };
    let progress = session.progress().value();

    let mut html = page_start("Analyzing", "Detecting chords and notes");
    html.push_str(&format!(
        r#"        <h2 id="progress-heading">Analyzing your audio...</h2>
        <div class="progress-bar"><div class="progress-fill" id="progress-fill" style="width: {progress:.1}%"></div></div>
        <p id="progress-label">{progress:.0}%</p>

        <div id="failure" {failure_hidden}>
            <p class="error" id="failure-message">{failure_message}</p>
            <a class="button" href="/" id="go-back">Go back</a>
        </div>

        <button class="button" id="cancel-button">Cancel</button>
"#
    ));

    let script = format!(
        r#"
        const sessionId = '{session_id}';
        const connection = new ChordscopeSSEConnection('/analysis/events?session=' + sessionId, 'connection-status');

        function setProgress(percentage) {{
            document.getElementById('progress-fill').style.width = percentage + '%';
            document.getElementById('progress-label').textContent = Math.round(percentage) + '%';
        }}

        function showFailure(message) {{
            document.getElementById('failure-message').textContent = message;
            document.getElementById('failure').hidden = false;
            document.getElementById('cancel-button').hidden = true;
        }}

        // Catch up on anything that happened before the stream opened
        async function syncFromStatus() {{
            const response = await fetch('/analysis/status/' + sessionId).catch(() => null);
            if (!response || !response.ok) {{
                return;
            }}
            const status = await response.json();
            if (status.view === 'results') {{
                window.location.href = '/results?session=' + sessionId;
            }} else if (status.view === 'input') {{
                window.location.href = '/';
            }} else if (status.error) {{
                setProgress(status.progress);
                showFailure(status.error.message);
            }} else {{
                setProgress(status.progress);
            }}
        }}

        connection
            .on('AnalysisProgress', (event) => setProgress(event.percentage))
            .on('AnalysisFailed', (event) => showFailure(event.message))
            .onOpen(syncFromStatus);
        followViewChanges(connection, sessionId);
        connection.connect();

        async function goBack(e) {{
            e.preventDefault();
            await fetch('/analysis/cancel/' + sessionId, {{ method: 'POST' }}).catch(() => null);
            window.location.href = '/';
        }}
        document.getElementById('cancel-button').addEventListener('click', goBack);
        document.getElementById('go-back').addEventListener('click', goBack);
        if ({is_failed}) {{
            document.getElementById('cancel-button').hidden = true;
        }}
"#,
        is_failed = failure.is_some(),
    );
    html.push_str(&page_end(&script));

    Html(html).into_response()
}
