//! HTTP probe engine
//!
//! Stands in for a browser streaming engine: it fetches the manifest and
//! reports what a real engine would (parsed, load failure, parse failure)
//! without downloading segments. Events go back to the controller loop over
//! an unbounded channel, tagged with the session token.

use castline_core::{
    EngineBackend, EngineConfig, EngineErrorClass, EngineErrorEvent, HeadlessMedia, SanitizedUrl,
    SessionEvent, SessionToken, StreamingEngine,
};
use reqwest::Client;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info};

/// Channel the controller loop drains
pub type EventSender = mpsc::UnboundedSender<(SessionToken, SessionEvent)>;

const PLAYLIST_TAG: &str = "#EXTM3U";

/// Factory for probe engines
pub struct ProbeBackend {
    client: Client,
    events: EventSender,
    enabled: bool,
}

impl ProbeBackend {
    pub fn new(events: EventSender, timeout: Duration, enabled: bool) -> anyhow::Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(concat!("castline/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            client,
            events,
            enabled,
        })
    }

    pub fn client(&self) -> &Client {
        &self.client
    }
}

impl EngineBackend for ProbeBackend {
    type Media = HeadlessMedia;
    type Engine = ProbeEngine;

    fn is_supported(&self) -> bool {
        self.enabled
    }

    fn create(&mut self, config: &EngineConfig, token: SessionToken) -> castline_core::Result<ProbeEngine> {
        debug!(token = %token, forward_buffer = config.forward_buffer_secs, "Creating probe engine");
        Ok(ProbeEngine {
            token,
            client: self.client.clone(),
            events: self.events.clone(),
            source: None,
            task: None,
        })
    }
}

/// One probe per session; aborting the task on destroy drops late results
pub struct ProbeEngine {
    token: SessionToken,
    client: Client,
    events: EventSender,
    source: Option<String>,
    task: Option<JoinHandle<()>>,
}

impl ProbeEngine {
    fn spawn_probe(&mut self) {
        let Some(url) = self.source.clone() else {
            return;
        };
        if let Some(previous) = self.task.take() {
            previous.abort();
        }

        let client = self.client.clone();
        let events = self.events.clone();
        let token = self.token;
        self.task = Some(tokio::spawn(async move {
            let event = probe_manifest(&client, &url).await;
            let _ = events.send((token, event));
        }));
    }
}

impl StreamingEngine for ProbeEngine {
    type Media = HeadlessMedia;

    fn attach_media(&mut self, _media: &mut HeadlessMedia) {
        let _ = self.events.send((self.token, SessionEvent::MediaAttached));
    }

    fn load_source(&mut self, url: &SanitizedUrl) {
        self.source = Some(url.to_string());
        self.spawn_probe();
    }

    fn recover_media_error(&mut self) {
        info!(token = %self.token, "Re-probing manifest");
        self.spawn_probe();
    }

    fn destroy(self) {
        if let Some(task) = self.task {
            task.abort();
        }
        debug!(token = %self.token, "Probe engine destroyed");
    }
}

/// Fetch `url` and describe the result the way a streaming engine would
pub async fn probe_manifest(client: &Client, url: &str) -> SessionEvent {
    let response = match client.get(url).send().await {
        Ok(response) => response,
        Err(e) => {
            debug!(url = %url, error = %e, "Manifest request failed");
            return SessionEvent::EngineError(EngineErrorEvent::manifest_load(url));
        }
    };

    if !response.status().is_success() {
        debug!(url = %url, status = %response.status(), "Manifest request rejected");
        return SessionEvent::EngineError(EngineErrorEvent::manifest_load(url));
    }

    match response.text().await {
        Ok(body) if body.trim_start().starts_with(PLAYLIST_TAG) => SessionEvent::ManifestParsed,
        Ok(_) => SessionEvent::EngineError(
            EngineErrorEvent::new(true, EngineErrorClass::Other, "manifestParsingError").with_url(url),
        ),
        Err(e) => {
            debug!(url = %url, error = %e, "Manifest body unreadable");
            SessionEvent::EngineError(EngineErrorEvent::manifest_load(url))
        }
    }
}

/// Native mode: map the probe result onto the media element's hooks
pub async fn probe_native(client: &Client, url: &str) -> SessionEvent {
    match probe_manifest(client, url).await {
        SessionEvent::ManifestParsed => SessionEvent::MetadataLoaded,
        _ => SessionEvent::PlaybackError,
    }
}
