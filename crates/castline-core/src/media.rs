//! Media element collaborator - the thing that actually decodes and renders

use crate::types::SessionToken;
use serde::{Deserialize, Serialize};

/// Result of asking the media element to start playback
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlayOutcome {
    /// Playback started synchronously
    Started,
    /// The answer arrives later as `PlayStarted` or `PlayRejected`
    Pending,
    /// Playback was refused (e.g. autoplay policy)
    Rejected(String),
}

/// One-shot hooks the controller arms in native mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MediaHook {
    /// Delivered as `SessionEvent::MetadataLoaded`
    MetadataLoaded,
    /// Delivered as `SessionEvent::PlaybackError`
    PlaybackError,
}

impl MediaHook {
    /// DOM event name backing this hook
    pub fn dom_event(&self) -> &'static str {
        match self {
            MediaHook::MetadataLoaded => "loadedmetadata",
            MediaHook::PlaybackError => "error",
        }
    }
}

/// A playback surface the controller can drive
pub trait MediaElement {
    /// Point the element at `url`
    fn set_source(&mut self, url: &str);

    /// Remove the current source
    fn clear_source(&mut self);

    /// Reload the element so it drops any buffered state
    fn reload(&mut self);

    fn pause(&mut self);

    /// Request playback. Asynchronous hosts return `Pending` and later
    /// deliver the outcome tagged with `token`.
    fn play(&mut self, token: SessionToken) -> PlayOutcome;

    /// Whether the element can natively play `mime_type`
    fn can_play_type(&self, mime_type: &str) -> bool;

    /// Arm a hook that fires at most once for `token`
    fn arm_once(&mut self, token: SessionToken, hook: MediaHook);

    /// Remove every armed hook
    fn disarm(&mut self);

    /// Current source, if any
    fn source(&self) -> Option<&str>;
}
