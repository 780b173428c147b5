//! Castline Core - Stream Session Controller
//!
//! This crate owns the part of an HLS player that decides *how* a stream is
//! played, not the part that plays it:
//! - URL sanitizing (pull a usable `http(s)://` location out of pasted text)
//! - Capability-based strategy selection (engine-assisted, native, unsupported)
//! - Single-session lifecycle with teardown-before-create
//! - Engine error classification and recovery
//! - Status reporting to observers
//!
//! Decoding and segment fetching belong to the collaborators behind
//! [`MediaElement`] and [`EngineBackend`].
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                        Castline Core                            │
//! ├─────────────────────────────────────────────────────────────────┤
//! │                                                                 │
//! │   set_url ──► ┌──────────────┐      ┌──────────────┐            │
//! │               │     URL      │      │    Status    │ ──► watch  │
//! │  load_stream ►│  Sanitizer   │      │   Channel    │ ──► log    │
//! │               └──────┬───────┘      └──────▲───────┘            │
//! │                      │                     │                    │
//! │               ┌──────┴─────────────────────┴──┐                 │
//! │               │      Stream Controller        │◄── handle_event │
//! │               │  (one Session, token-keyed)   │   (token, ev)   │
//! │               └──────┬─────────────────┬──────┘                 │
//! │                      │                 │                        │
//! │  ┌───────────────────┴──┐   ┌──────────┴───────────┐            │
//! │  │    MediaElement      │   │    EngineBackend     │            │
//! │  │  (video element)     │   │  (hls.js, probe...)  │            │
//! │  └──────────────────────┘   └──────────────────────┘            │
//! └─────────────────────────────────────────────────────────────────┘
//! ```

pub mod catalog;
pub mod config;
pub mod controller;
pub mod engine;
pub mod error;
pub mod headless;
pub mod media;
pub mod sanitize;
pub mod status;
pub mod types;

pub use catalog::StreamPreset;
pub use config::{ControllerConfig, EngineConfig};
pub use controller::{StreamController, HLS_MIME_TYPE};
pub use engine::{EngineBackend, EngineErrorClass, EngineErrorEvent, StreamingEngine};
pub use error::{Error, Recovery, Result};
pub use headless::{HeadlessMedia, PlayPolicy};
pub use media::{MediaElement, MediaHook, PlayOutcome};
pub use sanitize::{extract, SanitizedUrl};
pub use status::{ObserverView, Severity, StatusLog, StatusRecord, StatusReport};
pub use types::*;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Initialize the controller library
pub fn init() {
    tracing::info!(version = VERSION, "Castline Core initialized");
}
