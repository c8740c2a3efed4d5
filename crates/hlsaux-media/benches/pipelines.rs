//! Benchmark keyframe segmentation and caption parsing + segmentation.

use std::time::Duration;

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use hlsaux_core::config::IFrameConfig;
use hlsaux_core::PacketRecord;
use hlsaux_media::{CaptionSegmenter, CueBlocks, IFramePlaylistBuilder};

/// One 6 s transport stream segment at 25 fps with a 2 s GOP.
fn make_segment_packets() -> Vec<PacketRecord> {
    (0..150u64)
        .map(|i| PacketRecord::new(i * 7520, 7000, 0.04, i % 50 == 0))
        .collect()
}

fn make_webvtt(cues: usize) -> String {
    let mut out = String::from("WEBVTT\n\n");
    for i in 0..cues {
        let start = i * 2;
        out.push_str(&format!(
            "{}\n00:{:02}:{:02}.000 --> 00:{:02}:{:02}.500\nLine number {i}\n\n",
            i,
            start / 60,
            start % 60,
            (start + 1) / 60,
            (start + 1) % 60,
        ));
    }
    out
}

fn bench_iframes(c: &mut Criterion) {
    let mut group = c.benchmark_group("iframes");
    let packets = make_segment_packets();
    let config = IFrameConfig::default();

    // 1 hour: 600 segments of 6 s.
    group.bench_function("1hr_600_segments", |b| {
        b.iter(|| {
            let mut builder = IFramePlaylistBuilder::new("bench.m3u8", &config, 6);
            for i in 0..600 {
                builder
                    .push_segment(&format!("seg{i}.ts"), None, 0, black_box(&packets))
                    .unwrap();
            }
            builder.build().unwrap().render()
        });
    });

    group.finish();
}

fn bench_captions(c: &mut Criterion) {
    let mut group = c.benchmark_group("captions");

    // 1800 cues cover one hour.
    let input = make_webvtt(1800);
    group.bench_function("1hr_1800_cues", |b| {
        b.iter(|| {
            let mut segmenter =
                CaptionSegmenter::new(Duration::from_secs(6), Duration::from_millis(500));
            let mut count = 0;
            for block in CueBlocks::new(black_box(input.as_bytes())) {
                count += segmenter.push(block.unwrap()).len();
            }
            count + segmenter.finish().map_or(0, |_| 1)
        });
    });

    group.finish();
}

criterion_group!(benches, bench_iframes, bench_captions);
criterion_main!(benches);
