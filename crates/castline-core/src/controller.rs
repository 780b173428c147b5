//! Stream Session Controller - owns one playback attempt at a time
//!
//! Coordinates:
//! - URL sanitizing and write-back of the request text
//! - Teardown of the previous session before anything new is created
//! - Capability selection (engine-assisted, native, unsupported)
//! - Engine error classification and recovery
//! - Status reporting
//!
//! Collaborators report asynchronous progress through [`handle_event`],
//! tagged with the [`SessionToken`] of the load that created them. Events
//! whose token is not the live session's are discarded, so a late
//! "manifest parsed" from a torn-down engine can never touch a newer session.
//!
//! [`handle_event`]: StreamController::handle_event

use crate::{
    config::ControllerConfig,
    engine::{EngineBackend, EngineErrorEvent, StreamingEngine},
    error::{Error, Recovery},
    media::{MediaElement, MediaHook, PlayOutcome},
    sanitize::{self, SanitizedUrl},
    status::{ObserverView, StatusLog, StatusReport},
    types::*,
    Result,
};
use tokio::sync::watch;
use tracing::{debug, info, instrument, warn};

/// Media type probed for native HLS support
pub const HLS_MIME_TYPE: &str = "application/vnd.apple.mpegurl";

const MSG_LOADING: &str = "Loading stream...";
const MSG_NATIVE_LOADING: &str = "Native HLS playback supported. Loading stream...";
const MSG_MANIFEST_PARSED: &str = "Manifest parsed. Playing stream...";
const MSG_NATIVE_PLAYING: &str = "Stream loaded and playing!";

/// One-shot hooks still armed for a native session
#[derive(Debug, Clone, Copy, Default)]
struct NativeHooks {
    metadata: bool,
    error: bool,
}

/// Live binding of a URL, the media element and (optionally) an engine
struct Session<E> {
    id: SessionId,
    token: SessionToken,
    url: SanitizedUrl,
    mode: CapabilityMode,
    phase: SessionPhase,
    engine: Option<E>,
    hooks: NativeHooks,
    recoveries: u32,
}

impl<E> Session<E> {
    fn engine_assisted(token: SessionToken, url: SanitizedUrl, engine: E) -> Self {
        Self {
            id: SessionId::new(),
            token,
            url,
            mode: CapabilityMode::EngineAssisted,
            phase: SessionPhase::Attaching,
            engine: Some(engine),
            hooks: NativeHooks::default(),
            recoveries: 0,
        }
    }

    fn native(token: SessionToken, url: SanitizedUrl) -> Self {
        Self {
            id: SessionId::new(),
            token,
            url,
            mode: CapabilityMode::Native,
            phase: SessionPhase::AwaitingMetadata,
            engine: None,
            hooks: NativeHooks {
                metadata: true,
                error: true,
            },
            recoveries: 0,
        }
    }
}

/// Controller driving a media element and an engine backend
pub struct StreamController<B: EngineBackend> {
    /// Controller configuration
    config: ControllerConfig,
    /// Raw candidate URL as typed by the user
    request: String,
    /// Bound media element
    media: Option<B::Media>,
    /// Engine factory
    backend: B,
    /// The single live session
    session: Option<Session<B::Engine>>,
    /// Token of the most recent load attempt
    token: SessionToken,
    /// Strategy picked by the most recent load attempt
    last_mode: Option<CapabilityMode>,
    /// Current status broadcaster
    status_tx: watch::Sender<StatusReport>,
    /// Status history side channel
    history: StatusLog,
}

impl<B: EngineBackend> StreamController<B> {
    /// Create a controller with the default configuration
    pub fn new(backend: B) -> Self {
        Self::build(backend, ControllerConfig::default())
    }

    /// Create a controller with a validated configuration
    pub fn with_config(backend: B, config: ControllerConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self::build(backend, config))
    }

    fn build(backend: B, config: ControllerConfig) -> Self {
        let (status_tx, _) = watch::channel(StatusReport::default());
        let history = StatusLog::new(config.history_limit);

        Self {
            config,
            request: String::new(),
            media: None,
            backend,
            session: None,
            token: SessionToken::default(),
            last_mode: None,
            status_tx,
            history,
        }
    }

    /// Bind a media element, returning the previous one.
    ///
    /// Any live session belongs to the previous element and is torn down.
    pub fn bind_media(&mut self, media: B::Media) -> Option<B::Media> {
        self.teardown();
        self.media.replace(media)
    }

    /// Release the media element after tearing down the live session
    pub fn unbind_media(&mut self) -> Option<B::Media> {
        self.teardown();
        self.media.take()
    }

    /// Store the raw candidate URL
    pub fn set_url(&mut self, text: impl Into<String>) {
        self.request = text.into();
    }

    /// Current request text (rewritten to the sanitized URL after a load)
    pub fn url(&self) -> &str {
        &self.request
    }

    /// Current status
    pub fn status(&self) -> StatusReport {
        self.status_tx.borrow().clone()
    }

    /// Subscribe to status changes
    pub fn subscribe(&self) -> watch::Receiver<StatusReport> {
        self.status_tx.subscribe()
    }

    /// Snapshot for presentation layers
    pub fn view(&self) -> ObserverView {
        ObserverView {
            current_status: self.status(),
            current_url: self.request.clone(),
            recovery_attempts: self.session.as_ref().map_or(0, |s| s.recoveries),
        }
    }

    /// Status history, oldest first
    pub fn history(&self) -> &StatusLog {
        &self.history
    }

    pub fn config(&self) -> &ControllerConfig {
        &self.config
    }

    pub fn media(&self) -> Option<&B::Media> {
        self.media.as_ref()
    }

    pub fn media_mut(&mut self) -> Option<&mut B::Media> {
        self.media.as_mut()
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// Strategy chosen by the most recent load attempt
    pub fn mode(&self) -> Option<CapabilityMode> {
        self.last_mode
    }

    /// Phase of the live session
    pub fn phase(&self) -> Option<SessionPhase> {
        self.session.as_ref().map(|s| s.phase)
    }

    /// Token of the live session
    pub fn session_token(&self) -> Option<SessionToken> {
        self.session.as_ref().map(|s| s.token)
    }

    /// Sanitized URL of the live session
    pub fn session_url(&self) -> Option<&SanitizedUrl> {
        self.session.as_ref().map(|s| &s.url)
    }

    pub fn is_session_active(&self) -> bool {
        self.session.is_some()
    }

    /// Load the current request, replacing any live session
    #[instrument(skip(self))]
    pub fn load_stream(&mut self) {
        self.token = self.token.next();
        let token = self.token;

        if self.media.is_none() {
            self.report(&Error::ElementUnavailable);
            return;
        }

        self.teardown();

        if let Some(media) = self.media.as_mut() {
            media.clear_source();
            media.reload();
        }
        self.emit(StatusReport::info(MSG_LOADING));

        let Some(url) = sanitize::extract(&self.request) else {
            self.report(&Error::InputInvalid);
            self.release_media();
            return;
        };

        if url.as_str() != self.request {
            debug!(from = %self.request, to = %url, "Request rewritten to sanitized URL");
            self.request = url.as_str().to_string();
        }

        let mode = self.select_mode();
        self.last_mode = Some(mode);
        info!(url = %url, mode = %mode, token = %token, "Loading stream");

        match mode {
            CapabilityMode::EngineAssisted => self.start_engine_session(token, url),
            CapabilityMode::Native => self.start_native_session(token, url),
            CapabilityMode::Unsupported => {
                self.report(&Error::CapabilityUnsupported);
                self.release_media();
            }
        }
    }

    /// Destroy the live session, if any. Safe to call repeatedly.
    pub fn teardown(&mut self) {
        if let Some(mut session) = self.session.take() {
            if let Some(engine) = session.engine.take() {
                engine.destroy();
            }
            if let Some(media) = self.media.as_mut() {
                media.disarm();
            }
            info!(
                session_id = %session.id,
                token = %session.token,
                mode = %session.mode,
                "Session torn down"
            );
        }
    }

    /// Deliver an asynchronous collaborator event.
    ///
    /// Returns false when the event was discarded: stale token, wrong mode,
    /// already-fired one-shot hook, or out of phase.
    pub fn handle_event(&mut self, token: SessionToken, event: SessionEvent) -> bool {
        let name = event.name();
        let live = self.session.as_ref().map(|s| s.token);
        if live != Some(token) {
            debug!(event = name, token = %token, live = ?live, "Discarding stale event");
            return false;
        }

        let applied = match event {
            SessionEvent::MediaAttached => self.on_media_attached(),
            SessionEvent::ManifestParsed => self.on_manifest_parsed(token),
            SessionEvent::EngineError(ev) => self.on_engine_error(ev),
            SessionEvent::MetadataLoaded => self.on_metadata_loaded(token),
            SessionEvent::PlaybackError => self.on_native_error(),
            SessionEvent::PlayStarted => self.on_play_started(),
            SessionEvent::PlayRejected { reason } => self.on_play_rejected(reason),
        };

        if !applied {
            debug!(event = name, token = %token, phase = ?self.phase(), "Event not applicable, ignored");
        }
        applied
    }

    fn select_mode(&self) -> CapabilityMode {
        if self.backend.is_supported() {
            return CapabilityMode::EngineAssisted;
        }

        let native = self
            .media
            .as_ref()
            .is_some_and(|m| m.can_play_type(&self.config.native_mime_type));

        if native {
            CapabilityMode::Native
        } else {
            CapabilityMode::Unsupported
        }
    }

    fn start_engine_session(&mut self, token: SessionToken, url: SanitizedUrl) {
        let mut engine = match self.backend.create(&self.config.engine, token) {
            Ok(engine) => engine,
            Err(e) => {
                warn!(error = %e, "Engine creation failed");
                self.report(&Error::UnrecoverableFault {
                    detail: e.to_string(),
                });
                self.release_media();
                return;
            }
        };

        let Some(media) = self.media.as_mut() else {
            engine.destroy();
            return;
        };
        engine.attach_media(media);

        let session = Session::engine_assisted(token, url, engine);
        info!(session_id = %session.id, token = %token, "Engine session created");
        self.session = Some(session);
    }

    fn start_native_session(&mut self, token: SessionToken, url: SanitizedUrl) {
        let Some(media) = self.media.as_mut() else {
            return;
        };
        media.set_source(url.as_str());
        media.arm_once(token, MediaHook::MetadataLoaded);
        media.arm_once(token, MediaHook::PlaybackError);

        let session = Session::native(token, url);
        info!(session_id = %session.id, token = %token, "Native session created");
        self.session = Some(session);
        self.emit(StatusReport::info(MSG_NATIVE_LOADING));
    }

    fn on_media_attached(&mut self) -> bool {
        let Some(session) = self.session.as_mut() else {
            return false;
        };
        if session.mode != CapabilityMode::EngineAssisted || session.phase != SessionPhase::Attaching {
            return false;
        }

        if let Some(engine) = session.engine.as_mut() {
            engine.load_source(&session.url);
        }
        session.phase = SessionPhase::LoadingManifest;
        debug!(url = %session.url, "Media attached, loading source");
        true
    }

    fn on_manifest_parsed(&mut self, token: SessionToken) -> bool {
        let Some(session) = self.session.as_mut() else {
            return false;
        };
        if session.mode != CapabilityMode::EngineAssisted || session.phase != SessionPhase::LoadingManifest {
            return false;
        }

        session.phase = SessionPhase::Starting;
        self.emit(StatusReport::success(MSG_MANIFEST_PARSED));
        self.request_play(token);
        true
    }

    fn on_metadata_loaded(&mut self, token: SessionToken) -> bool {
        let Some(session) = self.session.as_mut() else {
            return false;
        };
        if session.mode != CapabilityMode::Native || !session.hooks.metadata {
            return false;
        }

        session.hooks.metadata = false;
        session.phase = SessionPhase::Starting;
        self.request_play(token);
        true
    }

    fn on_native_error(&mut self) -> bool {
        let Some(session) = self.session.as_mut() else {
            return false;
        };
        if session.mode != CapabilityMode::Native || !session.hooks.error {
            return false;
        }

        session.hooks.error = false;
        let err = Error::NativePlaybackFailed {
            url: session.url.to_string(),
        };
        self.report(&err);
        self.release_media();
        self.teardown();
        true
    }

    fn request_play(&mut self, token: SessionToken) {
        let Some(media) = self.media.as_mut() else {
            return;
        };

        match media.play(token) {
            PlayOutcome::Started => {
                self.on_play_started();
            }
            PlayOutcome::Pending => debug!(token = %token, "Play pending"),
            PlayOutcome::Rejected(reason) => {
                self.on_play_rejected(reason);
            }
        }
    }

    fn on_play_started(&mut self) -> bool {
        let Some(session) = self.session.as_mut() else {
            return false;
        };
        if session.phase != SessionPhase::Starting {
            return false;
        }

        session.phase = SessionPhase::Playing;
        info!(session_id = %session.id, mode = %session.mode, "Playback started");
        if session.mode == CapabilityMode::Native {
            self.emit(StatusReport::success(MSG_NATIVE_PLAYING));
        }
        true
    }

    fn on_play_rejected(&mut self, reason: String) -> bool {
        let Some(session) = self.session.as_mut() else {
            return false;
        };
        if session.phase != SessionPhase::Starting {
            return false;
        }

        // The session stays; the user can resume manually
        session.phase = SessionPhase::PlaybackBlocked;
        self.report(&Error::PlaybackStartFailed { reason });
        true
    }

    fn on_engine_error(&mut self, event: EngineErrorEvent) -> bool {
        let Some(session) = self.session.as_ref() else {
            return false;
        };
        if session.mode != CapabilityMode::EngineAssisted {
            return false;
        }

        let err = event.classify(session.url.as_str());
        self.report(&err);

        match err.recovery() {
            Recovery::Continue => {}
            Recovery::Recover => {
                if let Some(session) = self.session.as_mut() {
                    session.recoveries += 1;
                    if let Some(engine) = session.engine.as_mut() {
                        engine.recover_media_error();
                    }
                    info!(attempt = session.recoveries, class = %event.class, "Engine recovery requested");
                }
            }
            Recovery::Terminate => {
                self.release_media();
                self.teardown();
            }
        }
        true
    }

    /// Pause the element and drop its source
    fn release_media(&mut self) {
        if let Some(media) = self.media.as_mut() {
            media.pause();
            media.clear_source();
        }
    }

    fn report(&mut self, err: &Error) {
        warn!(code = err.error_code(), token = %self.token, "{}", err);
        self.emit(StatusReport::error(err.to_string()));
    }

    fn emit(&mut self, report: StatusReport) {
        let session_id = self.session.as_ref().map(|s| s.id);
        self.history.push(self.token, session_id, report.clone());
        self.status_tx.send_replace(report);
    }
}

impl<B: EngineBackend> Drop for StreamController<B> {
    fn drop(&mut self) {
        self.teardown();
    }
}
