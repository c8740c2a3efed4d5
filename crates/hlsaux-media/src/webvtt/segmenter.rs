//! Fixed-window caption segmentation.

use std::time::Duration;

use super::CaptionBlock;

/// Blocks assigned to one window.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CaptionSegment {
    /// Zero-based position in the caption playlist.
    pub index: usize,
    pub blocks: Vec<CaptionBlock>,
    /// Span covered by the window.
    pub duration: Duration,
}

/// Buckets start-ordered blocks into windows of `window` length.
///
/// A block ending within `grace` past the window boundary stretches the
/// window instead of spilling into the next one. Blocks that straddle a
/// boundary are repeated in the following window; they are never split or
/// reordered. Windows falling in a gap of the timeline come out empty so
/// segment durations stay contiguous.
///
/// Blocks go in through [`push`](Self::push); [`finish`](Self::finish)
/// consumes the segmenter and returns the trailing window.
#[derive(Debug)]
pub struct CaptionSegmenter {
    window: Duration,
    grace: Duration,
    window_start: Duration,
    span: Duration,
    blocks: Vec<CaptionBlock>,
    index: usize,
}

impl CaptionSegmenter {
    /// Create a segmenter. `window` must be non-zero.
    pub fn new(window: Duration, grace: Duration) -> Self {
        Self {
            window,
            grace,
            window_start: Duration::ZERO,
            span: Duration::ZERO,
            blocks: Vec::new(),
            index: 0,
        }
    }

    /// Offer the next block, returning every window it closed.
    pub fn push(&mut self, block: CaptionBlock) -> Vec<CaptionSegment> {
        let mut flushed = Vec::new();

        loop {
            let relative_end = block.end.saturating_sub(self.window_start);
            let clipped_end = if relative_end > self.window + self.grace {
                self.window_start + self.window
            } else {
                block.end
            };

            let span = self
                .span
                .max(clipped_end.saturating_sub(self.window_start));
            let flushes = span >= self.window;
            // A block the window cannot hold is still taken when the window
            // stays open, so nothing is ever dropped.
            let added = block.start < clipped_end || !flushes;
            if added {
                self.blocks.push(block.clone());
            }
            self.span = span;

            if !flushes {
                break;
            }

            let next_start = self.window_start + span;
            flushed.push(self.flush());
            self.window_start = next_start;

            let straddles = block.start < next_start && next_start < block.end;
            if added && !straddles {
                break;
            }
        }

        flushed
    }

    /// Close the trailing window, if it holds any block.
    pub fn finish(mut self) -> Option<CaptionSegment> {
        if self.blocks.is_empty() {
            return None;
        }
        Some(self.flush())
    }

    fn flush(&mut self) -> CaptionSegment {
        let segment = CaptionSegment {
            index: self.index,
            blocks: std::mem::take(&mut self.blocks),
            duration: self.span,
        };
        tracing::trace!(
            index = segment.index,
            blocks = segment.blocks.len(),
            duration = ?segment.duration,
            "caption window closed"
        );
        self.index += 1;
        self.span = Duration::ZERO;
        segment
    }
}

/// File name of segment `index`: `<base>-<5-digit index>.<extension>`.
pub fn segment_file_name(base: &str, index: usize, extension: &str) -> String {
    format!("{base}-{index:05}.{extension}")
}

/// Contents of a segment file: the `WEBVTT` line, the source's header
/// lines, a blank line, then the blocks' raw text.
pub fn render_segment(header: &[String], segment: &CaptionSegment) -> String {
    let mut out = String::from("WEBVTT\n");
    for line in header {
        out.push_str(line);
        out.push('\n');
    }
    out.push('\n');
    for block in &segment.blocks {
        out.push_str(&block.text);
    }
    out
}
