//! I-frame pipeline integration tests.
//!
//! These run against a stand-in ffprobe script, so they are Unix-only.
#![cfg(unix)]

mod common;

use std::fs;
use std::time::Duration;

use hlsaux::config::Config;
use hlsaux::pipeline::{generate_iframe_playlists, UnitOutcome};
use hlsaux_av::PacketProbe;
use tempfile::tempdir;
use tokio_util::sync::CancellationToken;

fn probe(dir: &std::path::Path) -> PacketProbe {
    PacketProbe::new(common::fake_ffprobe(dir), Duration::from_secs(10))
}

#[tokio::test]
async fn test_master_ladder() {
    let dir = tempdir().unwrap();
    let master = common::write_ladder(dir.path());

    let units = generate_iframe_playlists(
        &master,
        &Config::default(),
        probe(dir.path()),
        CancellationToken::new(),
    )
    .await
    .unwrap();

    let names: Vec<_> = units.iter().map(|u| u.name.as_str()).collect();
    assert_eq!(names, ["low/index.m3u8", "high/index.m3u8", "broken/index.m3u8"]);
    assert!(!units[0].is_failed());
    assert!(!units[1].is_failed());
    assert!(units[2].is_failed());
    assert_eq!(units[1].warnings, ["segment seg1.ts has no keyframe"]);

    let low = fs::read_to_string(dir.path().join("low/index_I-FRAME-ONLY.m3u8")).unwrap();
    let expected = "\
#EXTM3U
#EXT-X-VERSION:4
#EXT-X-TARGETDURATION:6
#EXT-X-MEDIA-SEQUENCE:0
#EXT-X-PLAYLIST-TYPE:VOD
#EXT-X-I-FRAMES-ONLY
#EXT-X-BYTERANGE:188@0
#EXTINF:6.000000,
seg0.ts
#EXT-X-BYTERANGE:188@0
#EXTINF:6.000000,
seg1.ts
#EXT-X-ENDLIST
";
    assert_eq!(low, expected);

    let high = fs::read_to_string(dir.path().join("high/index_I-FRAME-ONLY.m3u8")).unwrap();
    assert_eq!(high.matches("#EXT-X-BYTERANGE").count(), 1);
    assert!(!dir.path().join("broken/index_I-FRAME-ONLY.m3u8").exists());

    let rewritten = fs::read_to_string(&master).unwrap();
    assert!(rewritten.ends_with(
        "#EXT-X-I-FRAME-STREAM-INF:BANDWIDTH=251,URI=\"low/index_I-FRAME-ONLY.m3u8\"\n\
         #EXT-X-I-FRAME-STREAM-INF:BANDWIDTH=251,URI=\"high/index_I-FRAME-ONLY.m3u8\"\n"
    ));
    assert!(!rewritten.contains("broken/index_I-FRAME-ONLY"));
}

#[tokio::test]
async fn test_rerun_is_idempotent() {
    let dir = tempdir().unwrap();
    let master = common::write_ladder(dir.path());
    let config = Config::default();

    generate_iframe_playlists(&master, &config, probe(dir.path()), CancellationToken::new())
        .await
        .unwrap();
    let first_master = fs::read_to_string(&master).unwrap();
    let first_low = fs::read(dir.path().join("low/index_I-FRAME-ONLY.m3u8")).unwrap();

    generate_iframe_playlists(&master, &config, probe(dir.path()), CancellationToken::new())
        .await
        .unwrap();
    assert_eq!(fs::read_to_string(&master).unwrap(), first_master);
    assert_eq!(
        fs::read(dir.path().join("low/index_I-FRAME-ONLY.m3u8")).unwrap(),
        first_low
    );
}

#[tokio::test]
async fn test_single_chunklist_input() {
    let dir = tempdir().unwrap();
    let chunklist = common::write_chunklist(
        &dir.path().join("v0"),
        &[(
            "seg0.ts",
            common::packets_json(&[
                (1000, 150, 1.0, true),
                (1200, 80, 1.0, false),
                (1500, 120, 1.0, false),
                (1900, 90, 1.0, false),
            ]),
        )],
    );
    let before = fs::read_to_string(&chunklist).unwrap();

    let units = generate_iframe_playlists(
        &chunklist,
        &Config::default(),
        probe(dir.path()),
        CancellationToken::new(),
    )
    .await
    .unwrap();

    assert_eq!(units.len(), 1);
    match &units[0].outcome {
        UnitOutcome::Completed { artifacts } => {
            assert_eq!(artifacts, &[dir.path().join("v0/index_I-FRAME-ONLY.m3u8")]);
        }
        UnitOutcome::Failed { error } => panic!("unit failed: {error}"),
    }

    let playlist = fs::read_to_string(dir.path().join("v0/index_I-FRAME-ONLY.m3u8")).unwrap();
    assert!(playlist.contains("#EXT-X-BYTERANGE:200@1000\n#EXTINF:4.000000,\nseg0.ts\n"));
    // A lone chunklist has no master to update.
    assert_eq!(fs::read_to_string(&chunklist).unwrap(), before);
}

#[tokio::test]
async fn test_variant_without_keyframes_fails() {
    let dir = tempdir().unwrap();
    let chunklist = common::write_chunklist(
        &dir.path().join("v0"),
        &[("seg0.ts", common::no_gop()), ("seg1.ts", common::no_gop())],
    );

    let units = generate_iframe_playlists(
        &chunklist,
        &Config::default(),
        probe(dir.path()),
        CancellationToken::new(),
    )
    .await
    .unwrap();

    match &units[0].outcome {
        UnitOutcome::Failed { error } => assert!(error.contains("No keyframes")),
        UnitOutcome::Completed { .. } => panic!("expected failure"),
    }
    assert!(!dir.path().join("v0/index_I-FRAME-ONLY.m3u8").exists());
}

#[tokio::test]
async fn test_cancelled_run_fails_every_unit() {
    let dir = tempdir().unwrap();
    let master = common::write_ladder(dir.path());
    let before = fs::read_to_string(&master).unwrap();
    let cancel = CancellationToken::new();
    cancel.cancel();

    let units = generate_iframe_playlists(&master, &Config::default(), probe(dir.path()), cancel)
        .await
        .unwrap();

    assert!(units.iter().all(|u| u.is_failed()));
    assert_eq!(fs::read_to_string(&master).unwrap(), before);
}

#[tokio::test]
async fn test_missing_playlist_is_an_error() {
    let dir = tempdir().unwrap();
    let result = generate_iframe_playlists(
        &dir.path().join("nope.m3u8"),
        &Config::default(),
        probe(dir.path()),
        CancellationToken::new(),
    )
    .await;
    assert!(result.is_err());
}
