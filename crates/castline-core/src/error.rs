//! Error types for Castline Core
//!
//! The `Display` text of each variant is the exact status message shown to
//! the user, so the controller can surface errors verbatim.

use crate::engine::EngineErrorClass;
use thiserror::Error;

/// Result type alias for controller operations
pub type Result<T> = std::result::Result<T, Error>;

/// Stream controller error types
#[derive(Error, Debug, Clone, PartialEq)]
pub enum Error {
    // Load preconditions
    #[error("Please enter a valid HTTP or HTTPS URL.")]
    InputInvalid,

    #[error("Video element not found.")]
    ElementUnavailable,

    #[error("This environment does not support HLS streaming. Please use a modern browser like Chrome, Firefox, Edge, or Safari.")]
    CapabilityUnsupported,

    // Engine faults
    #[error("Error: Could not load stream manifest from \"{url}\". The URL might be incorrect, the stream is offline, or there's a CORS issue.")]
    ManifestUnreachable { url: String },

    #[error("{}", transient_message(.class, .detail))]
    TransientFault { class: EngineErrorClass, detail: String },

    #[error("An unrecoverable HLS error occurred: {detail}.")]
    UnrecoverableFault { detail: String },

    #[error("Non-fatal HLS error: {detail}")]
    EngineWarning { detail: String },

    // Media element faults
    #[error("Error playing video: {reason}. Please enable autoplay or click play.")]
    PlaybackStartFailed { reason: String },

    #[error("Native video playback error: Could not load stream from \"{url}\". The URL might be incorrect or the stream is offline.")]
    NativePlaybackFailed { url: String },

    // Configuration errors
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

fn transient_message(class: &EngineErrorClass, detail: &str) -> String {
    match class {
        EngineErrorClass::Media => "Media error encountered, trying to recover...".to_string(),
        _ => format!("Network error: {}. Trying to recover...", detail),
    }
}

/// What the controller does with the session after an error
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Recovery {
    /// Report only; the session carries on untouched
    Continue,
    /// Report and invoke the engine's recovery primitive
    Recover,
    /// Report, pause, clear the source and destroy the session
    Terminate,
}

impl Error {
    /// How the session reacts to this error
    pub fn recovery(&self) -> Recovery {
        match self {
            Error::EngineWarning { .. } | Error::PlaybackStartFailed { .. } => Recovery::Continue,
            Error::TransientFault { .. } => Recovery::Recover,
            Error::InputInvalid
            | Error::ElementUnavailable
            | Error::CapabilityUnsupported
            | Error::ManifestUnreachable { .. }
            | Error::UnrecoverableFault { .. }
            | Error::NativePlaybackFailed { .. }
            | Error::InvalidConfig(_) => Recovery::Terminate,
        }
    }

    /// Returns true if the session does not survive this error
    pub fn is_terminal(&self) -> bool {
        self.recovery() == Recovery::Terminate
    }

    /// Returns the error code for logs
    pub fn error_code(&self) -> &'static str {
        match self {
            Error::InputInvalid => "INPUT_INVALID",
            Error::ElementUnavailable => "ELEMENT_UNAVAILABLE",
            Error::CapabilityUnsupported => "CAPABILITY_UNSUPPORTED",
            Error::ManifestUnreachable { .. } => "MANIFEST_UNREACHABLE",
            Error::TransientFault { .. } => "TRANSIENT_FAULT",
            Error::UnrecoverableFault { .. } => "UNRECOVERABLE_FAULT",
            Error::EngineWarning { .. } => "ENGINE_WARNING",
            Error::PlaybackStartFailed { .. } => "PLAYBACK_START_FAILED",
            Error::NativePlaybackFailed { .. } => "NATIVE_PLAYBACK_FAILED",
            Error::InvalidConfig(_) => "INVALID_CONFIG",
        }
    }
}
