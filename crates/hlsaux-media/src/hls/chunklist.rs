//! Reading master playlists and variant chunklists.

use hlsaux_core::{Error, Result};
use m3u8_rs::Playlist;

/// A (non-I-frame) variant listed in a master playlist.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VariantRef {
    /// Chunklist URI, relative to the master playlist.
    pub uri: String,
}

/// One segment file of a chunklist.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChunkSegment {
    /// Segment URI, relative to the chunklist.
    pub uri: String,
    /// Initialization segment in effect for this segment, if any.
    pub init: Option<String>,
}

/// The ordered segment files of one variant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Chunklist {
    /// Declared `EXT-X-TARGETDURATION`.
    pub target_duration: u64,
    pub segments: Vec<ChunkSegment>,
}

/// What an input playlist turned out to be.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlaylistKind {
    Master(Vec<VariantRef>),
    Media(Chunklist),
}

/// Parse playlist bytes into a master variant list or a chunklist.
///
/// Only local, relative or absolute file references are supported; URLs
/// are rejected.
pub fn read_playlist(bytes: &[u8]) -> Result<PlaylistKind> {
    let parsed = m3u8_rs::parse_playlist_res(bytes)
        .map_err(|_| Error::playlist("input is not a valid M3U8 playlist"))?;

    match parsed {
        Playlist::MasterPlaylist(master) => {
            let variants = master
                .variants
                .into_iter()
                .filter(|v| !v.is_i_frame)
                .map(|v| {
                    ensure_local(&v.uri)?;
                    Ok(VariantRef { uri: v.uri })
                })
                .collect::<Result<Vec<_>>>()?;
            Ok(PlaylistKind::Master(variants))
        }
        Playlist::MediaPlaylist(media) => {
            let mut init: Option<String> = None;
            let mut segments = Vec::with_capacity(media.segments.len());

            for segment in media.segments {
                ensure_local(&segment.uri)?;
                // A map applies to every later segment until replaced.
                if let Some(map) = segment.map {
                    ensure_local(&map.uri)?;
                    init = Some(map.uri);
                }
                segments.push(ChunkSegment {
                    uri: segment.uri,
                    init: init.clone(),
                });
            }

            Ok(PlaylistKind::Media(Chunklist {
                target_duration: media.target_duration,
                segments,
            }))
        }
    }
}

fn ensure_local(uri: &str) -> Result<()> {
    if uri.contains("://") {
        return Err(Error::playlist(format!(
            "remote URI {uri} is not supported; only local files can be probed"
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reads_master_variants_and_skips_iframe_streams() {
        let master = "\
#EXTM3U
#EXT-X-VERSION:4
#EXT-X-STREAM-INF:BANDWIDTH=2000000,RESOLUTION=1280x720
720p/index.m3u8
#EXT-X-STREAM-INF:BANDWIDTH=800000,RESOLUTION=640x360
360p/index.m3u8
#EXT-X-I-FRAME-STREAM-INF:BANDWIDTH=100000,URI=\"720p/index_I-FRAME-ONLY.m3u8\"
";
        let PlaylistKind::Master(variants) = read_playlist(master.as_bytes()).unwrap() else {
            panic!("expected a master playlist");
        };
        assert_eq!(
            variants,
            vec![
                VariantRef {
                    uri: "720p/index.m3u8".into(),
                },
                VariantRef {
                    uri: "360p/index.m3u8".into(),
                },
            ]
        );
    }

    #[test]
    fn reads_chunklist() {
        let media = "\
#EXTM3U
#EXT-X-VERSION:3
#EXT-X-TARGETDURATION:6
#EXT-X-MEDIA-SEQUENCE:0
#EXTINF:6.000,
seg0.ts
#EXTINF:4.500,
seg1.ts
#EXT-X-ENDLIST
";
        let PlaylistKind::Media(chunklist) = read_playlist(media.as_bytes()).unwrap() else {
            panic!("expected a media playlist");
        };
        assert_eq!(chunklist.target_duration, 6);
        assert_eq!(chunklist.segments.len(), 2);
        assert_eq!(chunklist.segments[1].uri, "seg1.ts");
        assert!(chunklist.segments.iter().all(|s| s.init.is_none()));
    }

    #[test]
    fn carries_map_forward_until_replaced() {
        let media = "\
#EXTM3U
#EXT-X-VERSION:7
#EXT-X-TARGETDURATION:4
#EXT-X-MAP:URI=\"init0.mp4\"
#EXTINF:4.0,
a.m4s
#EXTINF:4.0,
b.m4s
#EXT-X-MAP:URI=\"init1.mp4\"
#EXTINF:4.0,
c.m4s
#EXT-X-ENDLIST
";
        let PlaylistKind::Media(chunklist) = read_playlist(media.as_bytes()).unwrap() else {
            panic!("expected a media playlist");
        };
        let inits: Vec<_> = chunklist
            .segments
            .iter()
            .map(|s| s.init.as_deref())
            .collect();
        assert_eq!(
            inits,
            vec![Some("init0.mp4"), Some("init0.mp4"), Some("init1.mp4")]
        );
    }

    #[test]
    fn rejects_remote_segments() {
        let media = "\
#EXTM3U
#EXT-X-TARGETDURATION:6
#EXTINF:6.0,
https://cdn.example.com/seg0.ts
#EXT-X-ENDLIST
";
        let err = read_playlist(media.as_bytes()).unwrap_err();
        assert!(matches!(err, Error::Playlist(_)));
    }

    #[test]
    fn rejects_garbage() {
        let err = read_playlist(b"not a playlist").unwrap_err();
        assert!(matches!(err, Error::Playlist(_)));
    }
}
