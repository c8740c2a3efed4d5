//! Derived playlist structures and their M3U8 rendering.

use std::fmt::Write;
use std::time::Duration;

/// One keyframe of an I-frame-only playlist.
#[derive(Debug, Clone, PartialEq)]
pub struct IFrameEntry {
    /// Segment file URI, as written in the source chunklist.
    pub uri: String,
    /// Byte offset within the segment file (init segment excluded).
    pub offset: u64,
    /// Byte length of the keyframe range.
    pub length: u64,
    /// Seconds from this keyframe up to the next one or end of stream.
    pub duration_secs: f64,
    /// Initialization segment URI in effect for this entry.
    pub init: Option<String>,
}

/// An I-frame-only media playlist for one variant.
#[derive(Debug, Clone, PartialEq)]
pub struct IFramePlaylist {
    /// Target duration in integer seconds.
    pub target_duration: u64,
    /// Entries in chunklist order.
    pub entries: Vec<IFrameEntry>,
}

impl IFramePlaylist {
    /// Measured bandwidth in bits per second: total keyframe bytes over
    /// total duration, rounded up.
    pub fn bandwidth(&self) -> u64 {
        let bytes: u64 = self.entries.iter().map(|e| e.length).sum();
        let secs: f64 = self.entries.iter().map(|e| e.duration_secs).sum();
        let bits = bytes.saturating_mul(8);
        if secs > 0.0 {
            (bits as f64 / secs).ceil() as u64
        } else {
            bits
        }
    }

    /// The master playlist line announcing this playlist at `uri`.
    pub fn stream_inf_line(&self, uri: &str) -> String {
        format!(
            "#EXT-X-I-FRAME-STREAM-INF:BANDWIDTH={},URI=\"{}\"",
            self.bandwidth(),
            uri
        )
    }

    fn has_map(&self) -> bool {
        self.entries.iter().any(|e| e.init.is_some())
    }

    /// Render to M3U8 text.
    pub fn render(&self) -> String {
        let mut out = String::new();

        writeln!(out, "#EXTM3U").unwrap();
        // EXT-X-MAP in an I-frame playlist needs version 5.
        let version = if self.has_map() { 5 } else { 4 };
        writeln!(out, "#EXT-X-VERSION:{}", version).unwrap();
        writeln!(out, "#EXT-X-TARGETDURATION:{}", self.target_duration).unwrap();
        writeln!(out, "#EXT-X-MEDIA-SEQUENCE:0").unwrap();
        writeln!(out, "#EXT-X-PLAYLIST-TYPE:VOD").unwrap();
        writeln!(out, "#EXT-X-I-FRAMES-ONLY").unwrap();

        let mut current_map: Option<&str> = None;
        for entry in &self.entries {
            let map = entry.init.as_deref();
            if map != current_map {
                if let Some(uri) = map {
                    writeln!(out, "#EXT-X-MAP:URI=\"{}\"", uri).unwrap();
                }
                current_map = map;
            }
            writeln!(out, "#EXT-X-BYTERANGE:{}@{}", entry.length, entry.offset).unwrap();
            writeln!(out, "#EXTINF:{:.6},", entry.duration_secs).unwrap();
            writeln!(out, "{}", entry.uri).unwrap();
        }

        writeln!(out, "#EXT-X-ENDLIST").unwrap();

        out
    }
}

/// Companion playlist of a segmented caption stream.
#[derive(Debug, Clone, PartialEq)]
pub struct CaptionPlaylist {
    /// Target duration in integer seconds.
    pub target_duration: u64,
    /// `(segment URI, duration)` in emission order.
    pub segments: Vec<(String, Duration)>,
}

impl CaptionPlaylist {
    /// Create an empty playlist whose segments may run up to
    /// `window + grace`.
    pub fn new(window: Duration, grace: Duration) -> Self {
        Self {
            target_duration: (window + grace).as_secs_f64().ceil() as u64,
            segments: Vec::new(),
        }
    }

    pub fn push(&mut self, uri: impl Into<String>, duration: Duration) {
        self.segments.push((uri.into(), duration));
    }

    /// Render to M3U8 text, terminated by `#EXT-X-ENDLIST`.
    pub fn render(&self) -> String {
        let mut out = String::new();

        writeln!(out, "#EXTM3U").unwrap();
        writeln!(out, "#EXT-X-VERSION:3").unwrap();
        writeln!(out, "#EXT-X-TARGETDURATION:{}", self.target_duration).unwrap();
        writeln!(out, "#EXT-X-MEDIA-SEQUENCE:0").unwrap();

        for (uri, duration) in &self.segments {
            writeln!(out, "#EXTINF:{:.6},", duration.as_secs_f64()).unwrap();
            writeln!(out, "{}", uri).unwrap();
        }

        writeln!(out, "#EXT-X-ENDLIST").unwrap();

        out
    }
}
