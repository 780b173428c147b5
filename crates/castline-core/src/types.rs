//! Core types for Castline

use crate::engine::EngineErrorEvent;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Unique identifier for a playback session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SessionId(pub Uuid);

impl SessionId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for SessionId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for SessionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Generation number of a load attempt.
///
/// Every `load_stream` call mints a new token, even when it fails before a
/// session exists. Collaborators tag their events with the token they were
/// created under so the controller can drop events from torn-down sessions.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SessionToken(pub u64);

impl SessionToken {
    pub(crate) fn next(self) -> Self {
        Self(self.0 + 1)
    }
}

impl std::fmt::Display for SessionToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Playback strategy chosen for a load attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CapabilityMode {
    /// An adaptive-streaming engine drives the media element
    EngineAssisted,
    /// The media element plays the manifest itself
    Native,
    /// Nothing in this environment can play HLS
    Unsupported,
}

impl std::fmt::Display for CapabilityMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CapabilityMode::EngineAssisted => write!(f, "engine-assisted"),
            CapabilityMode::Native => write!(f, "native"),
            CapabilityMode::Unsupported => write!(f, "unsupported"),
        }
    }
}

/// Where the live session is in its lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionPhase {
    /// Engine created, waiting for it to bind to the media element
    Attaching,
    /// Engine loading the manifest
    LoadingManifest,
    /// Native source set, waiting for metadata
    AwaitingMetadata,
    /// Play requested, waiting for the media element to answer
    Starting,
    /// Media element reported playback started
    Playing,
    /// Play was rejected (autoplay policy etc); session kept for a manual resume
    PlaybackBlocked,
}

impl SessionPhase {
    /// True once the load has settled and no further lifecycle event is expected
    pub fn is_settled(&self) -> bool {
        matches!(self, SessionPhase::Playing | SessionPhase::PlaybackBlocked)
    }
}

impl std::fmt::Display for SessionPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SessionPhase::Attaching => write!(f, "attaching"),
            SessionPhase::LoadingManifest => write!(f, "loading_manifest"),
            SessionPhase::AwaitingMetadata => write!(f, "awaiting_metadata"),
            SessionPhase::Starting => write!(f, "starting"),
            SessionPhase::Playing => write!(f, "playing"),
            SessionPhase::PlaybackBlocked => write!(f, "playback_blocked"),
        }
    }
}

/// Asynchronous events delivered back to the controller.
///
/// Engine events come from an [`EngineBackend`](crate::EngineBackend)
/// instance, the rest from the [`MediaElement`](crate::MediaElement).
#[derive(Debug, Clone, PartialEq)]
pub enum SessionEvent {
    /// Engine finished binding to the media element
    MediaAttached,
    /// Engine parsed the manifest
    ManifestParsed,
    /// Engine reported an error
    EngineError(EngineErrorEvent),
    /// Native: media element loaded metadata
    MetadataLoaded,
    /// Native: media element failed to play the source
    PlaybackError,
    /// A pending play request resolved
    PlayStarted,
    /// A pending play request was rejected
    PlayRejected { reason: String },
}

impl SessionEvent {
    /// Short name for logging
    pub fn name(&self) -> &'static str {
        match self {
            SessionEvent::MediaAttached => "media_attached",
            SessionEvent::ManifestParsed => "manifest_parsed",
            SessionEvent::EngineError(_) => "engine_error",
            SessionEvent::MetadataLoaded => "metadata_loaded",
            SessionEvent::PlaybackError => "playback_error",
            SessionEvent::PlayStarted => "play_started",
            SessionEvent::PlayRejected { .. } => "play_rejected",
        }
    }
}
