//! Application configuration types.
//!
//! The top-level [`Config`] struct is deserialized from TOML. Every section
//! defaults sensibly so an empty file is valid. Builders receive their own
//! section explicitly; nothing here is global.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

use crate::error::Result;
use crate::Error;

/// One MPEG transport stream packet.
pub const TS_PACKET_SIZE: u64 = 188;

// ---------------------------------------------------------------------------
// Top-level Config
// ---------------------------------------------------------------------------

/// Root application configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Maximum number of variants / caption streams processed at once.
    pub max_parallel_units: usize,
    pub iframes: IFrameConfig,
    pub captions: CaptionConfig,
    pub tools: ToolsConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            max_parallel_units: 4,
            iframes: IFrameConfig::default(),
            captions: CaptionConfig::default(),
            tools: ToolsConfig::default(),
        }
    }
}

impl Config {
    /// Deserialize a `Config` from a TOML string.
    pub fn from_toml(toml_str: &str) -> Result<Self> {
        toml::from_str(toml_str).map_err(|e| Error::Validation(format!("config parse error: {e}")))
    }

    /// Check for values no pipeline can run with.
    pub fn check(&self) -> Result<()> {
        if self.max_parallel_units == 0 {
            return Err(Error::Validation("max_parallel_units must be at least 1".into()));
        }
        if self.captions.segment_duration_secs == 0 {
            return Err(Error::Validation(
                "captions.segment_duration_secs must be at least 1".into(),
            ));
        }
        if self.captions.channel_capacity == 0 {
            return Err(Error::Validation(
                "captions.channel_capacity must be at least 1".into(),
            ));
        }
        if self.captions.segment_extension.is_empty() {
            return Err(Error::Validation("captions.segment_extension is empty".into()));
        }
        if self.iframes.playlist_suffix.is_empty() {
            return Err(Error::Validation(
                "iframes.playlist_suffix is empty; the variant playlist would be overwritten"
                    .into(),
            ));
        }
        Ok(())
    }

    /// Return a list of validation warnings (non-fatal issues).
    pub fn validate(&self) -> Vec<String> {
        let mut warnings = Vec::new();

        if self.iframes.packet_padding != TS_PACKET_SIZE {
            warnings.push(format!(
                "iframes.packet_padding is {} (transport streams use {})",
                self.iframes.packet_padding, TS_PACKET_SIZE
            ));
        }

        if self.captions.grace_ms >= self.captions.segment_duration_secs.saturating_mul(1000) {
            warnings.push(
                "captions.grace_ms is not shorter than the segment duration; \
                 segments may run up to twice their nominal length"
                    .into(),
            );
        }

        if let Some(ref p) = self.tools.ffprobe_path {
            if !p.exists() {
                warnings.push(format!(
                    "tools.ffprobe_path {} does not exist; PATH will be searched",
                    p.display()
                ));
            }
        }

        if self.tools.probe_timeout_secs == 0 {
            warnings.push("tools.probe_timeout_secs is 0; every probe will time out".into());
        }

        warnings
    }
}

// ---------------------------------------------------------------------------
// I-frame playlists
// ---------------------------------------------------------------------------

/// Settings for I-frame-only playlist synthesis.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct IFrameConfig {
    /// Bytes added to the reported size of a segment's last keyframe, which
    /// has no following packet to bound it.
    pub packet_padding: u64,
    /// Seconds subtracted from the source chunklist's target duration.
    pub target_duration_decrement: u64,
    /// Inserted between the variant file stem and its extension.
    pub playlist_suffix: String,
}

impl Default for IFrameConfig {
    fn default() -> Self {
        Self {
            packet_padding: TS_PACKET_SIZE,
            target_duration_decrement: 1,
            playlist_suffix: "_I-FRAME-ONLY".to_string(),
        }
    }
}

// ---------------------------------------------------------------------------
// Caption segmentation
// ---------------------------------------------------------------------------

/// Settings for WebVTT caption segmentation.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CaptionConfig {
    /// Nominal window length.
    pub segment_duration_secs: u64,
    /// How far past the window a cue may end before it is clipped.
    pub grace_ms: u64,
    /// Bound of the parser-to-segmenter hand-off.
    pub channel_capacity: usize,
    /// Maximum wait for the next cue before the stream is abandoned.
    pub hand_off_timeout_secs: u64,
    /// Extension of segment files, without the dot.
    pub segment_extension: String,
}

impl Default for CaptionConfig {
    fn default() -> Self {
        Self {
            segment_duration_secs: 6,
            grace_ms: 500,
            channel_capacity: 16,
            hand_off_timeout_secs: 60,
            segment_extension: "vtt".to_string(),
        }
    }
}

impl CaptionConfig {
    pub fn segment_duration(&self) -> Duration {
        Duration::from_secs(self.segment_duration_secs)
    }

    pub fn grace(&self) -> Duration {
        Duration::from_millis(self.grace_ms)
    }

    pub fn hand_off_timeout(&self) -> Duration {
        Duration::from_secs(self.hand_off_timeout_secs)
    }
}

// ---------------------------------------------------------------------------
// External tools
// ---------------------------------------------------------------------------

/// Optional overrides for external tool paths.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ToolsConfig {
    pub ffprobe_path: Option<PathBuf>,
    /// Maximum execution time of one probe call.
    pub probe_timeout_secs: u64,
}

impl Default for ToolsConfig {
    fn default() -> Self {
        Self {
            ffprobe_path: None,
            probe_timeout_secs: 300,
        }
    }
}

impl ToolsConfig {
    pub fn probe_timeout(&self) -> Duration {
        Duration::from_secs(self.probe_timeout_secs)
    }
}
