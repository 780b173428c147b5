//! Controller and engine configuration

use crate::{controller::HLS_MIME_TYPE, Error, Result};
use serde::{Deserialize, Serialize};

/// Largest gap (seconds) the engine may jump over in the buffer
const MAX_GAP_TOLERANCE_SECS: f64 = 10.0;
/// Largest forward buffer (seconds) the engine may hold
const MAX_FORWARD_BUFFER_SECS: f64 = 600.0;

/// Buffering parameters handed to every new engine instance
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Buffer holes smaller than this are skipped (seconds)
    pub buffer_gap_tolerance_secs: f64,
    /// Target forward buffer length (seconds)
    pub forward_buffer_secs: f64,
    /// Prefer low-latency delivery for live streams
    pub low_latency: bool,
    /// Parse segments off the main thread
    pub background_parsing: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            buffer_gap_tolerance_secs: 0.5,
            forward_buffer_secs: 30.0,
            low_latency: true,
            background_parsing: true,
        }
    }
}

impl EngineConfig {
    /// Config optimized for low-latency live streaming
    pub fn low_latency() -> Self {
        Self {
            buffer_gap_tolerance_secs: 0.3,
            forward_buffer_secs: 6.0,
            low_latency: true,
            background_parsing: true,
        }
    }

    /// Config optimized for VOD
    pub fn vod() -> Self {
        Self {
            buffer_gap_tolerance_secs: 0.5,
            forward_buffer_secs: 60.0,
            low_latency: false,
            background_parsing: true,
        }
    }

    pub fn validate(&self) -> Result<()> {
        let gap = self.buffer_gap_tolerance_secs;
        if !gap.is_finite() || gap <= 0.0 || gap > MAX_GAP_TOLERANCE_SECS {
            return Err(Error::InvalidConfig(format!(
                "buffer_gap_tolerance_secs must be in (0, {}], got {}",
                MAX_GAP_TOLERANCE_SECS, gap
            )));
        }

        let forward = self.forward_buffer_secs;
        if !forward.is_finite() || forward <= 0.0 || forward > MAX_FORWARD_BUFFER_SECS {
            return Err(Error::InvalidConfig(format!(
                "forward_buffer_secs must be in (0, {}], got {}",
                MAX_FORWARD_BUFFER_SECS, forward
            )));
        }

        Ok(())
    }
}

/// Stream controller configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ControllerConfig {
    /// Parameters for each engine instance
    pub engine: EngineConfig,
    /// Media type probed for native playback
    pub native_mime_type: String,
    /// Status records kept in the history side channel (0 disables it)
    pub history_limit: usize,
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self {
            engine: EngineConfig::default(),
            native_mime_type: HLS_MIME_TYPE.to_string(),
            history_limit: 64,
        }
    }
}

impl ControllerConfig {
    /// Parse and validate a JSON config document
    pub fn from_json(json: &str) -> Result<Self> {
        let config: Self =
            serde_json::from_str(json).map_err(|e| Error::InvalidConfig(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.native_mime_type.trim().is_empty() {
            return Err(Error::InvalidConfig("native_mime_type must not be empty".into()));
        }
        self.engine.validate()
    }
}
