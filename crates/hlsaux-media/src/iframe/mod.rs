//! I-frame-only playlist synthesis.
//!
//! Packet records of each segment file are reduced to keyframe byte ranges
//! by [`segment_keyframes`], then gathered per variant by
//! [`IFramePlaylistBuilder`].

mod builder;
mod segmenter;

pub use builder::IFramePlaylistBuilder;
pub use segmenter::{segment_keyframes, RawIFrame};
