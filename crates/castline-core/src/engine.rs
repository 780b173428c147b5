//! Adaptive-streaming engine collaborator
//!
//! The engine turns a manifest URL into media segments for the bound media
//! element. The controller only issues coarse directives (attach, load,
//! recover, destroy) and consumes the engine's event stream through
//! [`StreamController::handle_event`](crate::StreamController::handle_event).

use crate::{
    config::EngineConfig,
    error::Error,
    media::MediaElement,
    sanitize::SanitizedUrl,
    types::SessionToken,
    Result,
};
use serde::{Deserialize, Serialize};

/// Engine detail string for a manifest that could not be fetched
pub const MANIFEST_LOAD_ERROR: &str = "manifestLoadError";

/// Error class reported by the engine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EngineErrorClass {
    Network,
    Media,
    Other,
}

impl EngineErrorClass {
    /// Map an hls.js `ErrorTypes` value
    pub fn from_hls_type(kind: &str) -> Self {
        match kind {
            "networkError" => EngineErrorClass::Network,
            "mediaError" => EngineErrorClass::Media,
            _ => EngineErrorClass::Other,
        }
    }
}

impl std::fmt::Display for EngineErrorClass {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EngineErrorClass::Network => write!(f, "network"),
            EngineErrorClass::Media => write!(f, "media"),
            EngineErrorClass::Other => write!(f, "other"),
        }
    }
}

/// Error event payload emitted by an engine
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngineErrorEvent {
    pub fatal: bool,
    pub class: EngineErrorClass,
    pub detail: String,
    pub url: Option<String>,
}

impl EngineErrorEvent {
    pub fn new(fatal: bool, class: EngineErrorClass, detail: impl Into<String>) -> Self {
        Self {
            fatal,
            class,
            detail: detail.into(),
            url: None,
        }
    }

    /// Fatal manifest-load failure for `url`
    pub fn manifest_load(url: impl Into<String>) -> Self {
        Self {
            fatal: true,
            class: EngineErrorClass::Network,
            detail: MANIFEST_LOAD_ERROR.to_string(),
            url: Some(url.into()),
        }
    }

    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = Some(url.into());
        self
    }

    pub fn is_manifest_load_failure(&self) -> bool {
        self.class == EngineErrorClass::Network && self.detail == MANIFEST_LOAD_ERROR
    }

    /// Classify into the controller's error taxonomy.
    ///
    /// `session_url` names the failed location when the engine omits it.
    pub fn classify(&self, session_url: &str) -> Error {
        if !self.fatal {
            return Error::EngineWarning {
                detail: self.detail.clone(),
            };
        }

        match self.class {
            EngineErrorClass::Network if self.is_manifest_load_failure() => Error::ManifestUnreachable {
                url: self.url.clone().unwrap_or_else(|| session_url.to_string()),
            },
            EngineErrorClass::Network | EngineErrorClass::Media => Error::TransientFault {
                class: self.class,
                detail: self.detail.clone(),
            },
            EngineErrorClass::Other => Error::UnrecoverableFault {
                detail: self.detail.clone(),
            },
        }
    }
}

/// A single engine instance bound to one session.
///
/// Instances are never reused: `destroy` consumes the engine.
pub trait StreamingEngine {
    /// Media element type this engine drives
    type Media: MediaElement;

    /// Bind to the media element. Completion is reported as
    /// [`SessionEvent::MediaAttached`](crate::SessionEvent::MediaAttached).
    fn attach_media(&mut self, media: &mut Self::Media);

    /// Start loading the manifest. Completion is reported as
    /// [`SessionEvent::ManifestParsed`](crate::SessionEvent::ManifestParsed).
    fn load_source(&mut self, url: &SanitizedUrl);

    /// Best-effort recovery after a fatal network or media error
    fn recover_media_error(&mut self);

    /// Detach from the media element and release all resources
    fn destroy(self);
}

/// Factory and capability probe for engine instances
pub trait EngineBackend {
    type Media: MediaElement;
    type Engine: StreamingEngine<Media = Self::Media>;

    /// Whether this environment can run the engine at all
    fn is_supported(&self) -> bool;

    /// Create a fresh engine whose events are tagged with `token`
    fn create(&mut self, config: &EngineConfig, token: SessionToken) -> Result<Self::Engine>;
}
