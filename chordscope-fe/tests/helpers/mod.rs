//! Shared test utilities for chordscope-fe integration tests

#![allow(dead_code)]

use async_trait::async_trait;
use chordscope_common::events::{ChordscopeEvent, EventBus};
use chordscope_fe::models::{AnalysisRequest, Note};
use chordscope_fe::services::{AnalysisBackend, AnalysisSettings, ClientError, RemoteAnalysis};
use chordscope_fe::AppState;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::broadcast;

type Reply = Box<dyn Fn() -> Result<RemoteAnalysis, ClientError> + Send + Sync>;

/// Backend that answers every request with a fixed reply after a delay
pub struct ScriptedBackend {
    delay: Duration,
    reply: Reply,
    calls: AtomicUsize,
    requests: Mutex<Vec<AnalysisRequest>>,
}

impl ScriptedBackend {
    pub fn new(
        delay: Duration,
        reply: impl Fn() -> Result<RemoteAnalysis, ClientError> + Send + Sync + 'static,
    ) -> Arc<Self> {
        Arc::new(Self {
            delay,
            reply: Box::new(reply),
            calls: AtomicUsize::new(0),
            requests: Mutex::new(Vec::new()),
        })
    }

    /// Replies with the "Song X" result (Am, F)
    pub fn song_x(delay: Duration) -> Arc<Self> {
        Self::new(delay, || Ok(song_x()))
    }

    /// Never replies
    pub fn silent() -> Arc<Self> {
        Self::song_x(Duration::from_secs(24 * 60 * 60))
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn requests(&self) -> Vec<AnalysisRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl AnalysisBackend for ScriptedBackend {
    async fn analyze(&self, request: AnalysisRequest) -> Result<RemoteAnalysis, ClientError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.requests.lock().unwrap().push(request);
        tokio::time::sleep(self.delay).await;
        (self.reply)()
    }
}

pub fn song_x() -> RemoteAnalysis {
    RemoteAnalysis {
        notes: vec![Note::new("Am", 0.0, 1.0), Note::new("F", 1.0, 2.0)],
        title: Some("Song X".to_string()),
    }
}

/// Default timings (5 minute timeout, 1 s ticks, 500 ms settle)
pub fn default_settings() -> AnalysisSettings {
    AnalysisSettings::default()
}

/// App state around a backend; the bus is large enough for a full timeout
pub fn create_state(backend: Arc<dyn AnalysisBackend>, settings: AnalysisSettings) -> AppState {
    AppState::new(backend, EventBus::new(1000), settings)
}

/// Everything currently buffered on a receiver
pub fn drain(rx: &mut broadcast::Receiver<ChordscopeEvent>) -> Vec<ChordscopeEvent> {
    let mut events = Vec::new();
    while let Ok(event) = rx.try_recv() {
        events.push(event);
    }
    events
}

pub fn event_types(events: &[ChordscopeEvent]) -> Vec<&str> {
    events.iter().map(|e| e.event_type()).collect()
}

/// Serve `router` on an ephemeral local port
pub async fn spawn_stub_server(router: axum::Router) -> SocketAddr {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind stub server");
    let addr = listener.local_addr().expect("Stub server has no address");
    tokio::spawn(async move {
        axum::serve(listener, router).await.expect("Stub server failed");
    });
    addr
}

/// Build a multipart/form-data body with one file part
pub fn multipart_body(boundary: &str, field: &str, file_name: &str, media_type: &str, data: &[u8]) -> Vec<u8> {
    let mut body = Vec::new();
    body.extend_from_slice(format!("--{}\r\n", boundary).as_bytes());
    body.extend_from_slice(
        format!(
            "Content-Disposition: form-data; name=\"{}\"; filename=\"{}\"\r\n",
            field, file_name
        )
        .as_bytes(),
    );
    body.extend_from_slice(format!("Content-Type: {}\r\n\r\n", media_type).as_bytes());
    body.extend_from_slice(data);
    body.extend_from_slice(format!("\r\n--{}--\r\n", boundary).as_bytes());
    body
}
