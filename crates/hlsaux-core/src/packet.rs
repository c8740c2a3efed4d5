//! Normalized packet records produced by the packet index feed.

/// One video packet as reported by the probing tool.
///
/// Offsets are relative to the bytes the tool was fed: for fragmented
/// streams that is the initialization segment followed by the payload
/// segment.
#[derive(Debug, Clone, PartialEq)]
pub struct PacketRecord {
    /// Presentation timestamp in seconds, if the tool reported one.
    pub pts_secs: Option<f64>,
    /// Decode timestamp in seconds, if the tool reported one.
    pub dts_secs: Option<f64>,
    /// Packet duration in seconds (zero when unknown).
    pub duration_secs: f64,
    /// Packet size in bytes.
    pub size: u64,
    /// Byte offset of the packet within the probed stream.
    pub offset: u64,
    /// Whether the packet starts a keyframe.
    pub keyframe: bool,
}

impl PacketRecord {
    /// Build a record with only the fields the segmenter cares about.
    pub fn new(offset: u64, size: u64, duration_secs: f64, keyframe: bool) -> Self {
        Self {
            pts_secs: None,
            dts_secs: None,
            duration_secs,
            size,
            offset,
            keyframe,
        }
    }
}
