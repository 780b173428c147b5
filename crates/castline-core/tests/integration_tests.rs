//! Integration tests for Castline Core

use castline_core::{
    catalog, extract, CapabilityMode, ControllerConfig, EngineBackend, EngineConfig,
    EngineErrorClass, EngineErrorEvent, Error, HeadlessMedia, MediaElement, PlayPolicy, SanitizedUrl,
    SessionEvent, SessionPhase, SessionToken, Severity, StatusReport, StreamController,
    StreamingEngine, HLS_MIME_TYPE,
};
use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::Rc;

// =============================================================================
// Scripted engine
// =============================================================================

/// What a scripted engine does once asked to load a source
#[derive(Clone, Copy, PartialEq)]
enum Script {
    ParseManifest,
    FailManifest,
    Silent,
}

#[derive(Default)]
struct Journal {
    /// Ordered calls, e.g. "create#1", "destroy#1"
    calls: Vec<String>,
    created: u32,
    destroyed: u32,
    recovered: u32,
    queue: VecDeque<(SessionToken, SessionEvent)>,
}

type Shared = Rc<RefCell<Journal>>;

struct ScriptedEngine {
    token: SessionToken,
    script: Script,
    journal: Shared,
}

impl StreamingEngine for ScriptedEngine {
    type Media = HeadlessMedia;

    fn attach_media(&mut self, _media: &mut HeadlessMedia) {
        let mut j = self.journal.borrow_mut();
        j.calls.push(format!("attach#{}", self.token.0));
        j.queue.push_back((self.token, SessionEvent::MediaAttached));
    }

    fn load_source(&mut self, url: &SanitizedUrl) {
        let mut j = self.journal.borrow_mut();
        j.calls.push(format!("load#{}", self.token.0));
        match self.script {
            Script::ParseManifest => j.queue.push_back((self.token, SessionEvent::ManifestParsed)),
            Script::FailManifest => j.queue.push_back((
                self.token,
                SessionEvent::EngineError(EngineErrorEvent::manifest_load(url.as_str())),
            )),
            Script::Silent => {}
        }
    }

    fn recover_media_error(&mut self) {
        self.journal.borrow_mut().recovered += 1;
    }

    fn destroy(self) {
        let mut j = self.journal.borrow_mut();
        j.calls.push(format!("destroy#{}", self.token.0));
        j.destroyed += 1;
    }
}

struct ScriptedBackend {
    supported: bool,
    script: Script,
    fail_create: bool,
    journal: Shared,
}

impl EngineBackend for ScriptedBackend {
    type Media = HeadlessMedia;
    type Engine = ScriptedEngine;

    fn is_supported(&self) -> bool {
        self.supported
    }

    fn create(&mut self, _config: &EngineConfig, token: SessionToken) -> castline_core::Result<ScriptedEngine> {
        if self.fail_create {
            return Err(Error::InvalidConfig("worker unavailable".into()));
        }
        let mut j = self.journal.borrow_mut();
        j.calls.push(format!("create#{}", token.0));
        j.created += 1;
        Ok(ScriptedEngine {
            token,
            script: self.script,
            journal: self.journal.clone(),
        })
    }
}

fn controller(script: Script) -> (StreamController<ScriptedBackend>, Shared) {
    let journal = Shared::default();
    let mut controller = StreamController::new(ScriptedBackend {
        supported: true,
        script,
        fail_create: false,
        journal: journal.clone(),
    });
    controller.bind_media(HeadlessMedia::new());
    (controller, journal)
}

fn unsupported_controller(media: HeadlessMedia) -> (StreamController<ScriptedBackend>, Shared) {
    let journal = Shared::default();
    let mut controller = StreamController::new(ScriptedBackend {
        supported: false,
        script: Script::Silent,
        fail_create: false,
        journal: journal.clone(),
    });
    controller.bind_media(media);
    (controller, journal)
}

/// Deliver queued engine events until the queue is empty
fn pump(controller: &mut StreamController<ScriptedBackend>, journal: &Shared) {
    loop {
        let next = journal.borrow_mut().queue.pop_front();
        match next {
            Some((token, event)) => {
                controller.handle_event(token, event);
            }
            None => break,
        }
    }
}

// =============================================================================
// Sanitizer
// =============================================================================

#[test]
fn test_sanitizer_returns_embedded_url_exactly() {
    let urls = [
        "http://example.com/stream.m3u8",
        "https://cdn.example.net:8443/live/master.m3u8?sig=abc%20def",
        "https://bitdash-a.akamaihd.net/content/sintel/hls/playlist.m3u8",
    ];
    let wrappers = [
        ("", ""),
        ("check this out ", " thanks"),
        ("2024-01-01T00:00:00Z GET ", " 200 OK"),
        ("(", " )"),
        ("\n\n", "\t"),
    ];

    for url in urls {
        for (before, after) in wrappers {
            let input = format!("{before}{url}{after}");
            assert_eq!(extract(&input).map(|u| u.as_str().to_string()).as_deref(), Some(url), "input: {input:?}");
        }
    }
}

#[test]
fn test_sanitizer_rejects_inputs_without_url() {
    for input in ["", " ", "\t\n", "example.com/live.m3u8", "ws://example.com/socket", "just some words"] {
        assert!(extract(input).is_none(), "input: {input:?}");
    }
}

// =============================================================================
// Engine-assisted lifecycle
// =============================================================================

#[test]
fn test_successful_load_goes_info_then_success() {
    let (mut controller, journal) = controller(Script::ParseManifest);
    let mut rx = controller.subscribe();

    controller.set_url("http://example.com/live.m3u8");
    controller.load_stream();
    assert_eq!(controller.status(), StatusReport::info("Loading stream..."));
    assert!(rx.has_changed().unwrap());
    rx.borrow_and_update();

    // attach completes; success must wait for the manifest
    let attached = journal.borrow_mut().queue.pop_front().unwrap();
    controller.handle_event(attached.0, attached.1);
    assert_eq!(controller.status().severity, Severity::Info);
    assert!(!rx.has_changed().unwrap());

    pump(&mut controller, &journal);
    assert_eq!(controller.status(), StatusReport::success("Manifest parsed. Playing stream..."));
    assert_eq!(controller.phase(), Some(SessionPhase::Playing));

    let token = controller.session_token().unwrap();
    let severities: Vec<_> = controller
        .history()
        .for_token(token)
        .map(|r| r.report.severity)
        .collect();
    assert_eq!(severities, [Severity::Info, Severity::Success]);
}

#[test]
fn test_subscriber_sees_latest_status() {
    let (mut controller, journal) = controller(Script::ParseManifest);
    let mut rx = controller.subscribe();

    controller.set_url("http://example.com/live.m3u8");
    controller.load_stream();
    pump(&mut controller, &journal);

    tokio_test::block_on(rx.changed()).unwrap();
    assert_eq!(rx.borrow_and_update().severity, Severity::Success);
}

#[test]
fn test_second_load_tears_down_before_creating() {
    let (mut controller, journal) = controller(Script::Silent);
    controller.set_url("http://example.com/one.m3u8");
    controller.load_stream();
    controller.load_stream();

    let j = journal.borrow();
    let destroy_first = j.calls.iter().position(|c| c == "destroy#1").unwrap();
    let create_second = j.calls.iter().position(|c| c == "create#2").unwrap();
    assert!(destroy_first < create_second);
    assert_eq!(j.created - j.destroyed, 1);
    drop(j);

    assert_eq!(controller.session_token(), Some(SessionToken(2)));
}

#[test]
fn test_late_events_from_old_session_are_discarded() {
    let (mut controller, journal) = controller(Script::ParseManifest);
    controller.set_url("http://example.com/one.m3u8");
    controller.load_stream();
    let old = controller.session_token().unwrap();

    controller.set_url("http://example.com/two.m3u8");
    controller.load_stream();
    let status_before = controller.status();

    assert!(!controller.handle_event(old, SessionEvent::MediaAttached));
    assert!(!controller.handle_event(old, SessionEvent::ManifestParsed));
    assert!(!controller.handle_event(
        old,
        SessionEvent::EngineError(EngineErrorEvent::manifest_load("http://example.com/one.m3u8"))
    ));
    assert_eq!(controller.status(), status_before);
    assert!(controller.is_session_active());

    // the queue still holds attach#1; pumping must only advance session #2
    pump(&mut controller, &journal);
    assert_eq!(controller.status().severity, Severity::Success);
    assert_eq!(controller.session_url().unwrap().as_str(), "http://example.com/two.m3u8");
}

#[test]
fn test_fatal_manifest_error_is_terminal() {
    let (mut controller, journal) = controller(Script::FailManifest);
    controller.set_url("http://offline.example/live.m3u8");
    controller.load_stream();
    pump(&mut controller, &journal);

    let status = controller.status();
    assert_eq!(status.severity, Severity::Error);
    assert!(status.message.contains("\"http://offline.example/live.m3u8\""));
    assert!(!controller.is_session_active());

    let media = controller.media().unwrap();
    assert!(media.is_paused());
    assert!(media.source().is_none());

    let j = journal.borrow();
    assert_eq!(j.created, j.destroyed);
}

#[test]
fn test_repeated_manifest_failures_leak_nothing() {
    let (mut controller, journal) = controller(Script::FailManifest);
    controller.set_url("http://offline.example/live.m3u8");

    for attempt in 1..=5 {
        controller.load_stream();
        pump(&mut controller, &journal);

        assert!(controller.status().message.starts_with("Error: Could not load stream manifest"));
        assert!(!controller.is_session_active());
        let j = journal.borrow();
        assert_eq!(j.created, attempt);
        assert_eq!(j.destroyed, j.created);
    }
}

#[test]
fn test_non_fatal_errors_never_change_liveness() {
    for class in [EngineErrorClass::Network, EngineErrorClass::Media, EngineErrorClass::Other] {
        let (mut controller, journal) = controller(Script::ParseManifest);
        controller.set_url("http://example.com/live.m3u8");
        controller.load_stream();
        pump(&mut controller, &journal);
        let token = controller.session_token().unwrap();
        let phase = controller.phase();

        let ev = EngineErrorEvent::new(false, class, "bufferNudgeOnStall");
        assert!(controller.handle_event(token, SessionEvent::EngineError(ev)));

        assert_eq!(
            controller.status(),
            StatusReport::error("Non-fatal HLS error: bufferNudgeOnStall")
        );
        assert_eq!(controller.session_token(), Some(token));
        assert_eq!(controller.phase(), phase);
        assert_eq!(journal.borrow().destroyed, 0);
        assert_eq!(journal.borrow().recovered, 0);
    }
}

#[test]
fn test_fatal_media_error_recovers() {
    let (mut controller, journal) = controller(Script::ParseManifest);
    controller.set_url("http://example.com/live.m3u8");
    controller.load_stream();
    pump(&mut controller, &journal);
    let token = controller.session_token().unwrap();

    let ev = EngineErrorEvent::new(true, EngineErrorClass::Media, "bufferAppendError");
    controller.handle_event(token, SessionEvent::EngineError(ev.clone()));
    controller.handle_event(token, SessionEvent::EngineError(ev));

    assert_eq!(
        controller.status(),
        StatusReport::error("Media error encountered, trying to recover...")
    );
    assert_eq!(journal.borrow().recovered, 2);
    assert_eq!(controller.view().recovery_attempts, 2);
    assert!(controller.is_session_active());
}

#[test]
fn test_pending_play_resolves_later() {
    let (mut controller, journal) = controller(Script::ParseManifest);
    controller.media_mut().unwrap().set_play_policy(PlayPolicy::Defer);
    controller.set_url("http://example.com/live.m3u8");
    controller.load_stream();
    pump(&mut controller, &journal);

    let token = controller.session_token().unwrap();
    assert_eq!(controller.phase(), Some(SessionPhase::Starting));

    assert!(controller.handle_event(token, SessionEvent::PlayRejected { reason: "NotAllowedError".into() }));
    assert_eq!(
        controller.status(),
        StatusReport::error("Error playing video: NotAllowedError. Please enable autoplay or click play.")
    );
    assert_eq!(controller.phase(), Some(SessionPhase::PlaybackBlocked));
    assert!(controller.is_session_active());
    assert!(!controller.handle_event(token, SessionEvent::PlayStarted));
}

#[test]
fn test_engine_creation_failure_is_unrecoverable() {
    let journal = Shared::default();
    let mut controller = StreamController::new(ScriptedBackend {
        supported: true,
        script: Script::ParseManifest,
        fail_create: true,
        journal: journal.clone(),
    });
    controller.bind_media(HeadlessMedia::new());
    controller.set_url("http://example.com/live.m3u8");
    controller.load_stream();

    assert!(controller.status().message.starts_with("An unrecoverable HLS error occurred"));
    assert!(!controller.is_session_active());
    assert!(controller.media().unwrap().source().is_none());
}

#[test]
fn test_drop_destroys_live_engine_once() {
    let (mut controller, journal) = controller(Script::ParseManifest);
    controller.set_url("http://example.com/live.m3u8");
    controller.load_stream();
    pump(&mut controller, &journal);
    controller.teardown();
    controller.load_stream();

    drop(controller);
    let j = journal.borrow();
    assert_eq!(j.created, 2);
    assert_eq!(j.destroyed, 2);
}

// =============================================================================
// Reset
// =============================================================================

#[test]
fn test_every_load_reloads_the_element() {
    let (mut controller, journal) = controller(Script::ParseManifest);
    assert_eq!(controller.media().unwrap().reload_count(), 0);

    controller.set_url("nothing to see here");
    controller.load_stream();
    assert_eq!(controller.media().unwrap().reload_count(), 1);
    assert!(controller.status().is_error());

    controller.set_url("http://example.com/live.m3u8");
    controller.load_stream();
    pump(&mut controller, &journal);
    assert_eq!(controller.media().unwrap().reload_count(), 2);
    assert_eq!(controller.status().severity, Severity::Success);
}

#[test]
fn test_native_source_is_cleared_before_next_load() {
    let media = HeadlessMedia::new().with_native_type(HLS_MIME_TYPE);
    let (mut controller, _journal) = unsupported_controller(media);
    controller.set_url("http://example.com/first.m3u8");
    controller.load_stream();
    let first = controller.session_token().unwrap();
    assert_eq!(controller.media().unwrap().source(), Some("http://example.com/first.m3u8"));

    controller.set_url("no url this time");
    controller.load_stream();

    let media = controller.media().unwrap();
    assert_eq!(media.reload_count(), 2);
    assert!(media.source().is_none());
    assert!(media.armed(first).is_empty());
    assert!(!controller.is_session_active());
}

#[test]
fn test_observer_url_is_request_text() {
    let (mut controller, _journal) = controller(Script::Silent);
    controller.set_url("watch HTTP://Example.com/live.m3u8 now");
    controller.load_stream();

    assert_eq!(controller.view().current_url, controller.url());
    assert_eq!(controller.view().current_url, "HTTP://Example.com/live.m3u8");

    controller.set_url("edited, not loaded");
    assert_eq!(controller.view().current_url, "edited, not loaded");
    assert_eq!(controller.session_url().unwrap().as_str(), "HTTP://Example.com/live.m3u8");
}

// =============================================================================
// Native and unsupported
// =============================================================================

#[test]
fn test_unsupported_environment_example() {
    let (mut controller, journal) = unsupported_controller(HeadlessMedia::new());
    controller.set_url("check this out http://example.com/stream.m3u8 thanks");
    controller.load_stream();

    assert_eq!(controller.url(), "http://example.com/stream.m3u8");
    assert_eq!(controller.mode(), Some(CapabilityMode::Unsupported));
    assert_eq!(controller.status(), StatusReport::error(Error::CapabilityUnsupported.to_string()));
    assert!(!controller.is_session_active());

    let media = controller.media().unwrap();
    assert!(media.is_paused());
    assert!(media.source().is_none());
    assert_eq!(journal.borrow().created, 0);
}

#[test]
fn test_native_playback_error_is_one_shot() {
    let media = HeadlessMedia::new().with_native_type(HLS_MIME_TYPE);
    let (mut controller, _journal) = unsupported_controller(media);
    controller.set_url("http://example.com/gone.m3u8");
    controller.load_stream();

    assert_eq!(
        controller.status(),
        StatusReport::info("Native HLS playback supported. Loading stream...")
    );
    let token = controller.session_token().unwrap();

    assert!(controller.handle_event(token, SessionEvent::PlaybackError));
    assert!(controller.status().message.contains("\"http://example.com/gone.m3u8\""));
    assert!(!controller.is_session_active());
    assert!(controller.media().unwrap().source().is_none());
    assert!(controller.media().unwrap().armed(token).is_empty());

    assert!(!controller.handle_event(token, SessionEvent::PlaybackError));
}

#[test]
fn test_native_play_rejection_keeps_session() {
    let media = HeadlessMedia::new()
        .with_native_type(HLS_MIME_TYPE)
        .with_play_policy(PlayPolicy::Block("autoplay is disabled".into()));
    let (mut controller, _journal) = unsupported_controller(media);
    controller.set_url("http://example.com/live.m3u8");
    controller.load_stream();
    let token = controller.session_token().unwrap();

    assert!(controller.handle_event(token, SessionEvent::MetadataLoaded));

    assert_eq!(
        controller.status(),
        StatusReport::error("Error playing video: autoplay is disabled. Please enable autoplay or click play.")
    );
    assert_eq!(controller.phase(), Some(SessionPhase::PlaybackBlocked));
    assert!(controller.is_session_active());
    assert_eq!(controller.media().unwrap().source(), Some("http://example.com/live.m3u8"));
    assert_eq!(controller.media().unwrap().play_requests(), 1);

    // A late start report no longer applies
    assert!(!controller.handle_event(token, SessionEvent::PlayStarted));
    assert!(controller.status().is_error());
}

#[test]
fn test_native_ignores_engine_events() {
    let media = HeadlessMedia::new().with_native_type(HLS_MIME_TYPE);
    let (mut controller, _journal) = unsupported_controller(media);
    controller.set_url("http://example.com/live.m3u8");
    controller.load_stream();
    let token = controller.session_token().unwrap();

    assert!(!controller.handle_event(token, SessionEvent::ManifestParsed));
    assert!(!controller.handle_event(
        token,
        SessionEvent::EngineError(EngineErrorEvent::manifest_load("http://example.com/live.m3u8"))
    ));
    assert_eq!(controller.phase(), Some(SessionPhase::AwaitingMetadata));
}

#[test]
fn test_custom_native_mime_type() {
    let config = ControllerConfig {
        native_mime_type: "application/x-mpegURL".into(),
        ..Default::default()
    };
    let journal = Shared::default();
    let mut controller = StreamController::with_config(
        ScriptedBackend {
            supported: false,
            script: Script::Silent,
            fail_create: false,
            journal,
        },
        config,
    )
    .unwrap();
    controller.bind_media(HeadlessMedia::new().with_native_type("application/x-mpegurl"));
    controller.set_url("http://example.com/live.m3u8");
    controller.load_stream();

    assert_eq!(controller.mode(), Some(CapabilityMode::Native));
}

// =============================================================================
// Catalog
// =============================================================================

#[test]
fn test_every_preset_loads() {
    for preset in catalog::presets() {
        let (mut controller, journal) = controller(Script::ParseManifest);
        controller.set_url(preset.url);
        controller.load_stream();
        pump(&mut controller, &journal);
        assert_eq!(controller.status().severity, Severity::Success, "preset {}", preset.id);
        assert_eq!(controller.url(), preset.url);
    }
}
