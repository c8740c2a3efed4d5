//! WebVTT caption segmentation.
//!
//! [`CueParser`] turns WebVTT lines into [`CaptionBlock`]s one line at a
//! time ([`CueBlocks`] wraps it as an iterator over a reader), and
//! [`CaptionSegmenter`] buckets the blocks into fixed-duration segments.

mod parser;
mod segmenter;

use std::time::Duration;

pub use parser::{parse_timestamp, CueBlocks, CueEvent, CueParser};
pub use segmenter::{render_segment, segment_file_name, CaptionSegment, CaptionSegmenter};

/// One timed cue, with the text of any note, region, style or identifier
/// lines that preceded it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CaptionBlock {
    pub start: Duration,
    pub end: Duration,
    /// Raw source text: associated lines, the timing line and the payload,
    /// always terminated by a blank line.
    pub text: String,
}
