//! Shared fixtures for integration tests.
#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};

/// Sample WebVTT with a header line, a note and four one-second cues.
pub const SAMPLE_VTT: &str = "WEBVTT\n\
X-TIMESTAMP-MAP=MPEGTS:900000,LOCAL:00:00:00.000\n\
\n\
NOTE test captions\n\
\n\
00:00.000 --> 00:01.000\n\
One\n\
\n\
00:01.000 --> 00:02.000\n\
Two\n\
\n\
00:02.000 --> 00:03.000\n\
Three\n\
\n\
00:03.000 --> 00:04.000\n\
Four\n";

/// ffprobe-style packet JSON for one segment.
///
/// Each packet is `(pos, size, duration, keyframe)`.
pub fn packets_json(packets: &[(u64, u64, f64, bool)]) -> String {
    let items: Vec<String> = packets
        .iter()
        .map(|(pos, size, duration, key)| {
            format!(
                r#"{{"pos":"{pos}","size":"{size}","duration_time":"{duration:.6}","flags":"{}"}}"#,
                if *key { "K_" } else { "__" }
            )
        })
        .collect();
    format!(r#"{{"packets":[{}]}}"#, items.join(","))
}

/// Write an executable stand-in for ffprobe that prints the contents of
/// the file named by its last argument.
///
/// Segment files in these fixtures hold the packet JSON the real tool
/// would report for them.
#[cfg(unix)]
pub fn fake_ffprobe(dir: &Path) -> PathBuf {
    use std::os::unix::fs::PermissionsExt;

    let script = dir.join("fake-ffprobe");
    fs::write(
        &script,
        "#!/bin/sh\nfor last; do :; done\nexec cat \"$last\"\n",
    )
    .unwrap();
    fs::set_permissions(&script, fs::Permissions::from_mode(0o755)).unwrap();
    script
}

/// Write a chunklist of 6-second segments into `dir`.
pub fn write_chunklist(dir: &Path, segments: &[(&str, String)]) -> PathBuf {
    fs::create_dir_all(dir).unwrap();
    let mut text = String::from("#EXTM3U\n#EXT-X-VERSION:3\n#EXT-X-TARGETDURATION:6\n");
    text.push_str("#EXT-X-MEDIA-SEQUENCE:0\n#EXT-X-PLAYLIST-TYPE:VOD\n");
    for (uri, contents) in segments {
        text.push_str(&format!("#EXTINF:6.000000,\n{uri}\n"));
        fs::write(dir.join(uri), contents).unwrap();
    }
    text.push_str("#EXT-X-ENDLIST\n");

    let path = dir.join("index.m3u8");
    fs::write(&path, text).unwrap();
    path
}

/// One 6-second GOP: a keyframe followed by a non-key packet.
pub fn one_gop() -> String {
    packets_json(&[(0, 100, 3.0, true), (188, 100, 3.0, false)])
}

/// A segment whose packets carry no keyframe.
pub fn no_gop() -> String {
    packets_json(&[(0, 100, 3.0, false), (188, 100, 3.0, false)])
}

/// Build a master with `low` (two good segments), `high` (one good, one
/// keyless) and `broken` (a segment that does not exist) variants.
pub fn write_ladder(root: &Path) -> PathBuf {
    write_chunklist(
        &root.join("low"),
        &[("seg0.ts", one_gop()), ("seg1.ts", one_gop())],
    );
    write_chunklist(
        &root.join("high"),
        &[("seg0.ts", one_gop()), ("seg1.ts", no_gop())],
    );
    let broken = write_chunklist(&root.join("broken"), &[("seg0.ts", one_gop())]);
    fs::remove_file(broken.with_file_name("seg0.ts")).unwrap();

    let master = root.join("master.m3u8");
    fs::write(
        &master,
        "#EXTM3U\n\
         #EXT-X-STREAM-INF:BANDWIDTH=800000\n\
         low/index.m3u8\n\
         #EXT-X-STREAM-INF:BANDWIDTH=1600000\n\
         high/index.m3u8\n\
         #EXT-X-STREAM-INF:BANDWIDTH=3000000\n\
         broken/index.m3u8\n",
    )
    .unwrap();
    master
}
