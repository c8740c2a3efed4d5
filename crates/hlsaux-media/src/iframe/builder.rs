//! Per-variant I-frame playlist builder.

use hlsaux_core::config::IFrameConfig;
use hlsaux_core::{Error, PacketRecord, Result, Warning};

use super::segmenter::segment_keyframes;
use crate::hls::{IFrameEntry, IFramePlaylist};

/// Builder that gathers keyframe entries across the segment files of one
/// variant.
///
/// Segments must be pushed in chunklist order; entries keep that order.
#[derive(Debug)]
pub struct IFramePlaylistBuilder {
    variant: String,
    padding: u64,
    target_duration: u64,
    entries: Vec<IFrameEntry>,
    warnings: Vec<Warning>,
}

impl IFramePlaylistBuilder {
    /// Create a builder for `variant` whose chunklist declares
    /// `chunklist_target` seconds.
    ///
    /// The derived target duration is the chunklist's minus the configured
    /// decrement, raised if needed so no entry's `EXTINF` exceeds it.
    pub fn new(variant: impl Into<String>, config: &IFrameConfig, chunklist_target: u64) -> Self {
        Self {
            variant: variant.into(),
            padding: config.packet_padding,
            target_duration: chunklist_target.saturating_sub(config.target_duration_decrement),
            entries: Vec::new(),
            warnings: Vec::new(),
        }
    }

    /// Add the keyframes of one segment file.
    ///
    /// `init_size` is the byte size of the initialization segment the
    /// packets were probed with (zero without one); it is subtracted from
    /// every offset. Returns the number of entries added.
    pub fn push_segment(
        &mut self,
        uri: &str,
        init: Option<&str>,
        init_size: u64,
        packets: &[PacketRecord],
    ) -> Result<usize> {
        let raw = segment_keyframes(packets, self.padding)?;

        if raw.is_empty() {
            tracing::warn!(variant = %self.variant, segment = uri, "segment has no keyframe");
            self.warnings.push(Warning::NoKeyframes {
                segment: uri.to_string(),
            });
            return Ok(0);
        }

        let added = raw.len();
        for frame in raw {
            let offset = frame.offset.checked_sub(init_size).ok_or_else(|| {
                Error::probe(format!(
                    "{uri}: keyframe at byte {} lies inside the {init_size}-byte init segment",
                    frame.offset
                ))
            })?;
            self.entries.push(IFrameEntry {
                uri: uri.to_string(),
                offset,
                length: frame.length,
                duration_secs: frame.duration_secs,
                init: init.map(str::to_string),
            });
        }

        tracing::trace!(variant = %self.variant, segment = uri, entries = added, "segment indexed");
        Ok(added)
    }

    /// Degraded segments seen so far.
    pub fn warnings(&self) -> &[Warning] {
        &self.warnings
    }

    /// Assemble the playlist.
    ///
    /// Fails with [`Error::NoKeyframes`] if no segment contributed an entry.
    pub fn build(&self) -> Result<IFramePlaylist> {
        if self.entries.is_empty() {
            return Err(Error::NoKeyframes {
                variant: self.variant.clone(),
            });
        }

        let longest = self
            .entries
            .iter()
            .map(|e| e.duration_secs.ceil() as u64)
            .max()
            .unwrap_or(0);

        Ok(IFramePlaylist {
            target_duration: self.target_duration.max(longest).max(1),
            entries: self.entries.clone(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn gop(start: u64, frames: usize, frame_size: u64, frame_secs: f64) -> Vec<PacketRecord> {
        (0..frames)
            .map(|i| {
                PacketRecord::new(
                    start + i as u64 * frame_size,
                    frame_size,
                    frame_secs,
                    i == 0,
                )
            })
            .collect()
    }

    fn two_gops(start: u64) -> Vec<PacketRecord> {
        let mut packets = gop(start, 25, 1000, 0.04);
        packets.extend(gop(start + 25_000, 25, 1000, 0.04));
        packets
    }

    #[test]
    fn entries_follow_file_order() {
        let mut builder = IFramePlaylistBuilder::new("v.m3u8", &IFrameConfig::default(), 6);
        assert_eq!(builder.push_segment("seg0.ts", None, 0, &two_gops(0)).unwrap(), 2);
        assert_eq!(builder.push_segment("seg1.ts", None, 0, &two_gops(376)).unwrap(), 2);

        let playlist = builder.build().unwrap();
        let uris: Vec<_> = playlist.entries.iter().map(|e| e.uri.as_str()).collect();
        assert_eq!(uris, ["seg0.ts", "seg0.ts", "seg1.ts", "seg1.ts"]);
        assert_eq!(playlist.entries[2].offset, 376);
        assert_eq!(playlist.entries[3].length, 1000);
        assert_eq!(playlist.target_duration, 5);
    }

    #[test]
    fn init_size_is_subtracted() {
        let mut builder = IFramePlaylistBuilder::new("v.m3u8", &IFrameConfig::default(), 4);
        builder
            .push_segment("a.m4s", Some("init.mp4"), 700, &two_gops(700 + 8))
            .unwrap();

        let playlist = builder.build().unwrap();
        assert_eq!(playlist.entries[0].offset, 8);
        assert_eq!(playlist.entries[1].offset, 25_008);
        assert_eq!(playlist.entries[0].init.as_deref(), Some("init.mp4"));
    }

    #[test]
    fn offset_inside_init_segment_is_probe_failure() {
        let mut builder = IFramePlaylistBuilder::new("v.m3u8", &IFrameConfig::default(), 4);
        let err = builder
            .push_segment("a.m4s", Some("init.mp4"), 700, &gop(100, 3, 10, 0.04))
            .unwrap_err();
        assert!(err.is_probe_failure());
    }

    #[test]
    fn trailing_keyframe_gets_padding() {
        let mut builder = IFramePlaylistBuilder::new("v.m3u8", &IFrameConfig::default(), 6);
        let mut packets = gop(0, 3, 100, 0.04);
        packets.push(PacketRecord::new(300, 90, 0.04, true));
        builder.push_segment("seg0.ts", None, 0, &packets).unwrap();

        let playlist = builder.build().unwrap();
        assert_eq!(playlist.entries[1].offset, 300);
        assert_eq!(playlist.entries[1].length, 90 + 188);
    }

    #[test]
    fn keyless_segment_is_a_warning() {
        let mut builder = IFramePlaylistBuilder::new("v.m3u8", &IFrameConfig::default(), 6);
        let keyless: Vec<_> = (0..4)
            .map(|i| PacketRecord::new(i * 10, 10, 0.04, false))
            .collect();

        assert_eq!(builder.push_segment("seg0.ts", None, 0, &keyless).unwrap(), 0);
        builder.push_segment("seg1.ts", None, 0, &two_gops(0)).unwrap();

        assert_eq!(
            builder.warnings(),
            &[Warning::NoKeyframes {
                segment: "seg0.ts".into()
            }]
        );
        assert_eq!(builder.build().unwrap().entries.len(), 2);
    }

    #[test]
    fn variant_without_keyframes_fails() {
        let mut builder = IFramePlaylistBuilder::new("v.m3u8", &IFrameConfig::default(), 6);
        builder
            .push_segment("seg0.ts", None, 0, &[PacketRecord::new(0, 10, 1.0, false)])
            .unwrap();
        let err = builder.build().unwrap_err();
        assert!(matches!(err, Error::NoKeyframes { variant } if variant == "v.m3u8"));
    }

    #[test]
    fn target_duration_never_below_longest_entry() {
        let mut builder = IFramePlaylistBuilder::new("v.m3u8", &IFrameConfig::default(), 6);
        // One keyframe followed by 5.5 s of delta frames.
        let packets = gop(0, 12, 100, 0.5);
        builder.push_segment("seg0.ts", None, 0, &packets).unwrap();
        assert_eq!(builder.build().unwrap().target_duration, 6);

        let mut builder = IFramePlaylistBuilder::new("v.m3u8", &IFrameConfig::default(), 1);
        builder
            .push_segment("seg0.ts", None, 0, &gop(0, 2, 100, 0.1))
            .unwrap();
        assert_eq!(builder.build().unwrap().target_duration, 1);
    }

    #[test]
    fn building_twice_is_byte_identical() {
        let mut builder = IFramePlaylistBuilder::new("v.m3u8", &IFrameConfig::default(), 6);
        builder.push_segment("seg0.ts", None, 0, &two_gops(0)).unwrap();
        let first = builder.build().unwrap().render();
        let second = builder.build().unwrap().render();
        assert_eq!(first, second);

        let mut again = IFramePlaylistBuilder::new("v.m3u8", &IFrameConfig::default(), 6);
        again.push_segment("seg0.ts", None, 0, &two_gops(0)).unwrap();
        assert_eq!(again.build().unwrap().render(), first);
    }
}
