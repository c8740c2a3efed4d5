//! hlsaux-media: the synchronous core of derived-playlist synthesis.
//!
//! Everything here is pure computation over in-memory records; process
//! spawning and file IO live in `hlsaux-av` and the `hlsaux` binary.
//!
//! # Modules
//!
//! - [`iframe`] - Keyframe byte ranges and I-frame-only playlist assembly
//! - [`webvtt`] - WebVTT cue parsing and fixed-window caption segmentation
//! - [`hls`] - Chunklist reading, playlist rendering, master playlist rewriting

pub mod hls;
pub mod iframe;
pub mod webvtt;

pub use hls::{
    read_playlist, rewrite_master, CaptionPlaylist, ChunkSegment, Chunklist, IFrameEntry,
    IFramePlaylist, PlaylistKind, VariantRef,
};
pub use iframe::{segment_keyframes, IFramePlaylistBuilder, RawIFrame};
pub use webvtt::{
    render_segment, segment_file_name, CaptionBlock, CaptionSegment, CaptionSegmenter, CueBlocks,
    CueEvent, CueParser,
};
