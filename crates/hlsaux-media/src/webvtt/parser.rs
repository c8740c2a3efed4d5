//! Line-oriented WebVTT cue parser.

use std::io::{BufRead, Lines};
use std::time::Duration;

use hlsaux_core::{Error, Result};

use super::CaptionBlock;

const TIMING_SEPARATOR: &str = " --> ";
const BOM: char = '\u{feff}';

/// What a pushed line completed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CueEvent {
    /// Header lines following the `WEBVTT` marker (possibly none).
    Header(Vec<String>),
    Block(CaptionBlock),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ParserState {
    Header { seen_marker: bool },
    Idle,
    Note,
    Region,
    Style,
    CueText,
}

/// Incremental WebVTT parser.
///
/// Feed lines with [`push_line`](Self::push_line) and call
/// [`finish`](Self::finish) at end of input. A block is handed out as soon
/// as it is complete: on the blank line ending its payload, on the next
/// timing line, or at end of input. The first malformed timestamp is a
/// hard error; the parser must not be used after that.
#[derive(Debug)]
pub struct CueParser {
    state: ParserState,
    line_no: usize,
    header: Vec<String>,
    associated: String,
    open: Option<CaptionBlock>,
}

impl Default for CueParser {
    fn default() -> Self {
        Self::new()
    }
}

impl CueParser {
    pub fn new() -> Self {
        Self {
            state: ParserState::Header { seen_marker: false },
            line_no: 0,
            header: Vec::new(),
            associated: String::new(),
            open: None,
        }
    }

    /// Number of lines pushed so far.
    pub fn line_no(&self) -> usize {
        self.line_no
    }

    /// Process one input line (without its line terminator).
    pub fn push_line(&mut self, line: &str) -> Result<Option<CueEvent>> {
        self.line_no += 1;
        let line = line.strip_suffix('\r').unwrap_or(line);

        if let ParserState::Header { seen_marker } = self.state {
            if !seen_marker {
                if is_marker(line.trim_start_matches(BOM)) {
                    self.state = ParserState::Header { seen_marker: true };
                }
                return Ok(None);
            }
            if line.trim().is_empty() {
                self.state = ParserState::Idle;
                return Ok(Some(CueEvent::Header(std::mem::take(&mut self.header))));
            }
            if !line.contains(TIMING_SEPARATOR) {
                self.header.push(line.to_string());
                return Ok(None);
            }
            // Cue without the blank line after the header.
            let header = std::mem::take(&mut self.header);
            self.start_cue(line)?;
            return Ok(Some(CueEvent::Header(header)));
        }

        if line.trim().is_empty() {
            let state = std::mem::replace(&mut self.state, ParserState::Idle);
            return Ok(match state {
                ParserState::CueText => self.close_block().map(CueEvent::Block),
                ParserState::Note | ParserState::Region | ParserState::Style => {
                    self.associated.push('\n');
                    None
                }
                _ => None,
            });
        }

        if line.contains(TIMING_SEPARATOR) {
            let previous = self.close_block();
            self.start_cue(line)?;
            return Ok(previous.map(CueEvent::Block));
        }

        match self.state {
            ParserState::CueText => {
                if let Some(block) = self.open.as_mut() {
                    block.text.push_str(line);
                    block.text.push('\n');
                }
            }
            ParserState::Idle => {
                self.state = block_kind(line);
                self.associated.push_str(line);
                self.associated.push('\n');
            }
            _ => {
                self.associated.push_str(line);
                self.associated.push('\n');
            }
        }

        Ok(None)
    }

    /// Signal end of input, returning whatever was still pending.
    pub fn finish(mut self) -> Result<Option<CueEvent>> {
        match self.state {
            ParserState::Header { seen_marker: false } => Err(Error::parse(
                self.line_no,
                "missing WEBVTT header line",
            )),
            ParserState::Header { seen_marker: true } => {
                Ok(Some(CueEvent::Header(std::mem::take(&mut self.header))))
            }
            _ => Ok(self.close_block().map(CueEvent::Block)),
        }
    }

    fn start_cue(&mut self, line: &str) -> Result<()> {
        let (start, end) = parse_timing(line, self.line_no)?;
        let mut text = std::mem::take(&mut self.associated);
        text.push_str(line);
        text.push('\n');
        self.open = Some(CaptionBlock { start, end, text });
        self.state = ParserState::CueText;
        Ok(())
    }

    fn close_block(&mut self) -> Option<CaptionBlock> {
        let mut block = self.open.take()?;
        block.text.push('\n');
        Some(block)
    }
}

fn is_marker(line: &str) -> bool {
    match line.strip_prefix("WEBVTT") {
        Some(rest) => rest.is_empty() || rest.starts_with([' ', '\t']),
        None => false,
    }
}

/// State entered by a non-timing line seen between blocks.
fn block_kind(line: &str) -> ParserState {
    let keyword = line.split([' ', '\t']).next().unwrap_or("");
    match keyword {
        "NOTE" => ParserState::Note,
        "STYLE" => ParserState::Style,
        "REGION" | "Region:" => ParserState::Region,
        // A cue identifier: it stays buffered for the cue that follows.
        _ => ParserState::Idle,
    }
}

fn parse_timing(line: &str, line_no: usize) -> Result<(Duration, Duration)> {
    let (left, right) = line
        .split_once(TIMING_SEPARATOR)
        .ok_or_else(|| Error::parse(line_no, "missing timing separator"))?;
    let start = parse_timestamp(left.trim())
        .ok_or_else(|| Error::parse(line_no, format!("invalid start timestamp {:?}", left.trim())))?;
    // Cue settings may follow the end timestamp.
    let end_token = right.split_whitespace().next().unwrap_or("");
    let end = parse_timestamp(end_token)
        .ok_or_else(|| Error::parse(line_no, format!("invalid end timestamp {end_token:?}")))?;
    Ok((start, end))
}

/// Parse `hh:mm:ss.ttt` or `mm:ss.ttt`.
///
/// Minutes and seconds must be below 60; the fraction has one to three
/// digits and is read as a decimal fraction of a second.
pub fn parse_timestamp(s: &str) -> Option<Duration> {
    let (clock, fraction) = s.split_once('.')?;
    if fraction.is_empty() || fraction.len() > 3 {
        return None;
    }
    let millis = digits(fraction)? * 10u64.pow(3 - fraction.len() as u32);

    let parts: Vec<&str> = clock.split(':').collect();
    let (hours, minutes, seconds) = match parts.as_slice() {
        [m, s] => (0, digits(m)?, digits(s)?),
        [h, m, s] => (digits(h)?, digits(m)?, digits(s)?),
        _ => return None,
    };
    if minutes >= 60 || seconds >= 60 {
        return None;
    }

    let secs = hours
        .checked_mul(3600)?
        .checked_add(minutes * 60 + seconds)?;
    Duration::from_secs(secs).checked_add(Duration::from_millis(millis))
}

fn digits(s: &str) -> Option<u64> {
    if s.is_empty() || !s.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    s.parse().ok()
}

/// Lazy iterator of [`CaptionBlock`]s read from a WebVTT source.
///
/// Single pass and forward only; after the first error it yields nothing.
pub struct CueBlocks<R> {
    lines: Lines<R>,
    parser: Option<CueParser>,
    header: Vec<String>,
}

impl<R: BufRead> CueBlocks<R> {
    pub fn new(reader: R) -> Self {
        Self {
            lines: reader.lines(),
            parser: Some(CueParser::new()),
            header: Vec::new(),
        }
    }

    /// Header lines captured after the `WEBVTT` marker. Complete once the
    /// first block has been yielded.
    pub fn header(&self) -> &[String] {
        &self.header
    }
}

impl<R: BufRead> Iterator for CueBlocks<R> {
    type Item = Result<CaptionBlock>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let parser = self.parser.as_mut()?;
            let event = match self.lines.next() {
                Some(Ok(line)) => parser.push_line(&line),
                Some(Err(e)) => Err(e.into()),
                None => {
                    let parser = self.parser.take()?;
                    parser.finish()
                }
            };

            match event {
                Ok(Some(CueEvent::Block(block))) => return Some(Ok(block)),
                Ok(Some(CueEvent::Header(lines))) => self.header = lines,
                Ok(None) => {}
                Err(e) => {
                    self.parser = None;
                    return Some(Err(e));
                }
            }
        }
    }
}
