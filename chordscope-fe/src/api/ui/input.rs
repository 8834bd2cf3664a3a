//! Input view - choose a file or enter a video URL

use axum::response::{Html, IntoResponse};

use super::{page_end, page_start};

const INPUT_SCRIPT: &str = r#"
        const connection = new ChordscopeSSEConnection('/events', 'connection-status');
        connection.connect();

        const errorEl = document.getElementById('input-error');

        function showError(message) {
            errorEl.textContent = message;
            errorEl.hidden = false;
        }

        async function handleSubmitResponse(response) {
            const body = await response.json().catch(() => ({}));
            if (response.ok) {
                window.location.href = '/progress?session=' + body.session_id;
            } else {
                showError(body.error ? body.error.message : 'Submission failed (' + response.status + ')');
            }
        }

        async function submitFile(file) {
            if (!file) {
                return;
            }
            const form = new FormData();
            form.append('file', file, file.name);
            try {
                await handleSubmitResponse(await fetch('/analysis/file', { method: 'POST', body: form }));
            } catch (err) {
                showError('Could not reach Chordscope: ' + err);
            }
        }

        async function submitUrl() {
            const url = document.getElementById('url-input').value;
            try {
                await handleSubmitResponse(await fetch('/analysis/url', {
                    method: 'POST',
                    headers: { 'Content-Type': 'application/json' },
                    body: JSON.stringify({ url: url }),
                }));
            } catch (err) {
                showError('Could not reach Chordscope: ' + err);
            }
        }

        const dropZone = document.getElementById('drop-zone');
        dropZone.addEventListener('dragover', (e) => {
            e.preventDefault();
            dropZone.classList.add('dragover');
        });
        dropZone.addEventListener('dragleave', () => dropZone.classList.remove('dragover'));
        dropZone.addEventListener('drop', (e) => {
            e.preventDefault();
            dropZone.classList.remove('dragover');
            submitFile(e.dataTransfer.files[0]);
        });
        document.getElementById('file-input').addEventListener('change', (e) => submitFile(e.target.files[0]));
        document.getElementById('analyze-button').addEventListener('click', submitUrl);

        fetch('/analysis/active').then(async (response) => {
            if (response.ok) {
                const session = await response.json();
                const link = document.getElementById('active-link');
                link.href = '/progress?session=' + session.session_id;
                document.getElementById('active-session').hidden = false;
            }
        });
"#;

/// GET /
pub async fn input_page() -> impl IntoResponse {
    let mut html = page_start("Analyze", "Chord and note detection for audio files and videos");
    html.push_str(
        r#"        <p id="active-session" hidden>
            An analysis is already running. <a id="active-link" class="button" href="/">Follow it</a>
        </p>

        <h2>Audio file</h2>
        <div class="drop-zone" id="drop-zone">
            <p>Drop an audio file here, or</p>
            <label class="button" for="file-input">Choose file</label>
            <input type="file" id="file-input" accept="audio/*" hidden>
        </div>

        <h2>Video URL</h2>
        <input type="text" id="url-input" placeholder="https://www.youtube.com/watch?v=...">
        <button class="button" id="analyze-button">Analyze</button>

        <p class="error" id="input-error" hidden></p>
"#,
    );
    html.push_str(&page_end(INPUT_SCRIPT));
    Html(html)
}
