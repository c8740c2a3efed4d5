//! Keyframe-bounded byte ranges of one segment file.

use hlsaux_core::{Error, PacketRecord, Result};

/// A keyframe range with offsets as the probe saw them (init segment
/// included).
#[derive(Debug, Clone, PartialEq)]
pub struct RawIFrame {
    pub offset: u64,
    pub length: u64,
    /// Duration from this keyframe up to the next one or end of input.
    pub duration_secs: f64,
}

/// Reduce one segment's packets to keyframe ranges in a single pass.
///
/// A keyframe's range runs up to the next packet. The last packet of the
/// segment has nothing after it, so its reported size plus `padding` is
/// used instead. Non-key packets extend the duration of the open range.
///
/// Returns an empty vector when no keyframe is present; the caller decides
/// how to report that. Packet offsets must strictly increase.
pub fn segment_keyframes(packets: &[PacketRecord], padding: u64) -> Result<Vec<RawIFrame>> {
    let mut entries = Vec::new();
    let mut open: Option<RawIFrame> = None;

    for (i, packet) in packets.iter().enumerate() {
        let next = packets.get(i + 1);
        if let Some(next) = next {
            if next.offset <= packet.offset {
                return Err(Error::probe(format!(
                    "packet offsets not increasing: {} followed by {}",
                    packet.offset, next.offset
                )));
            }
        }

        if packet.keyframe {
            if let Some(done) = open.take() {
                entries.push(done);
            }
            let length = match next {
                Some(next) => next.offset - packet.offset,
                None => packet.size + padding,
            };
            open = Some(RawIFrame {
                offset: packet.offset,
                length,
                duration_secs: packet.duration_secs,
            });
        } else if let Some(entry) = open.as_mut() {
            entry.duration_secs += packet.duration_secs;
        }
    }

    if let Some(done) = open {
        entries.push(done);
    }

    Ok(entries)
}
