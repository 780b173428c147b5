//! Headless media element
//!
//! Tracks source, pause state and armed hooks without decoding anything.
//! Used by the CLI, where the real work is done by probing the stream, and
//! by tests that need to inspect what the controller did to the element.

use crate::{
    media::{MediaElement, MediaHook, PlayOutcome},
    types::SessionToken,
};

/// How a headless element answers `play`
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum PlayPolicy {
    /// Start immediately
    #[default]
    Allow,
    /// Answer `Pending`; the host delivers the outcome later
    Defer,
    /// Refuse with the given reason
    Block(String),
}

/// A media element with no output
#[derive(Debug, Clone)]
pub struct HeadlessMedia {
    source: Option<String>,
    paused: bool,
    native_types: Vec<String>,
    play_policy: PlayPolicy,
    armed: Vec<(SessionToken, MediaHook)>,
    reloads: u32,
    play_requests: u32,
}

impl HeadlessMedia {
    pub fn new() -> Self {
        Self {
            source: None,
            paused: true,
            native_types: Vec::new(),
            play_policy: PlayPolicy::Allow,
            armed: Vec::new(),
            reloads: 0,
            play_requests: 0,
        }
    }

    /// Declare native support for a media type
    pub fn with_native_type(mut self, mime_type: impl Into<String>) -> Self {
        self.native_types.push(mime_type.into());
        self
    }

    pub fn with_play_policy(mut self, policy: PlayPolicy) -> Self {
        self.play_policy = policy;
        self
    }

    pub fn set_play_policy(&mut self, policy: PlayPolicy) {
        self.play_policy = policy;
    }

    pub fn is_paused(&self) -> bool {
        self.paused
    }

    /// Hooks armed for `token`
    pub fn armed(&self, token: SessionToken) -> Vec<MediaHook> {
        self.armed
            .iter()
            .filter(|(t, _)| *t == token)
            .map(|(_, hook)| *hook)
            .collect()
    }

    pub fn reload_count(&self) -> u32 {
        self.reloads
    }

    pub fn play_requests(&self) -> u32 {
        self.play_requests
    }
}

impl Default for HeadlessMedia {
    fn default() -> Self {
        Self::new()
    }
}

impl MediaElement for HeadlessMedia {
    fn set_source(&mut self, url: &str) {
        self.source = Some(url.to_string());
    }

    fn clear_source(&mut self) {
        self.source = None;
    }

    fn reload(&mut self) {
        self.reloads += 1;
        self.paused = true;
    }

    fn pause(&mut self) {
        self.paused = true;
    }

    fn play(&mut self, _token: SessionToken) -> PlayOutcome {
        self.play_requests += 1;
        match &self.play_policy {
            PlayPolicy::Allow => {
                self.paused = false;
                PlayOutcome::Started
            }
            PlayPolicy::Defer => PlayOutcome::Pending,
            PlayPolicy::Block(reason) => PlayOutcome::Rejected(reason.clone()),
        }
    }

    fn can_play_type(&self, mime_type: &str) -> bool {
        self.native_types.iter().any(|t| t.eq_ignore_ascii_case(mime_type))
    }

    fn arm_once(&mut self, token: SessionToken, hook: MediaHook) {
        // Listeners from older sessions are dropped when a new one arms
        self.armed.retain(|(t, _)| *t == token);
        self.armed.push((token, hook));
    }

    fn disarm(&mut self) {
        self.armed.clear();
    }

    fn source(&self) -> Option<&str> {
        self.source.as_deref()
    }
}
