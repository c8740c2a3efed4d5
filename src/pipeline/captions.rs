//! Caption run: one producer/consumer pair per caption stream.
//!
//! The producer parses WebVTT lines as they arrive and hands cue blocks
//! over a bounded channel; the consumer segments them and writes files as
//! windows close, so output starts before the input is fully read.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use hlsaux_core::config::CaptionConfig;
use hlsaux_core::{Error, Result};
use hlsaux_media::{
    render_segment, segment_file_name, CaptionBlock, CaptionPlaylist, CaptionSegment,
    CaptionSegmenter, CueEvent, CueParser,
};
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader};
use tokio::sync::{mpsc, Semaphore};
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;

use super::report::{UnitKind, UnitReport};

/// Hand-off between the cue parser and the segmenter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CueMessage {
    /// Header lines to repeat in every segment.
    Header(Vec<String>),
    Block(CaptionBlock),
    /// The producer reached end of input.
    End,
}

/// Where a caption stream is read from.
#[derive(Debug, Clone)]
pub enum CaptionSource {
    File(PathBuf),
    Stdin,
}

impl CaptionSource {
    /// `-` means stdin; anything else is a path.
    pub fn from_arg(arg: &str) -> Self {
        if arg == "-" {
            CaptionSource::Stdin
        } else {
            CaptionSource::File(PathBuf::from(arg))
        }
    }
}

/// One caption stream to segment.
#[derive(Debug, Clone)]
pub struct CaptionJob {
    /// Base name of the segment files and playlist.
    pub name: String,
    pub source: CaptionSource,
    pub output_dir: PathBuf,
}

/// Files written for one caption stream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CaptionOutput {
    pub playlist: PathBuf,
    pub segments: Vec<PathBuf>,
}

impl CaptionOutput {
    fn into_artifacts(self) -> Vec<PathBuf> {
        let mut artifacts = self.segments;
        artifacts.push(self.playlist);
        artifacts
    }
}

/// Segment every caption job concurrently, at most `max_parallel` at once.
pub async fn segment_caption_streams(
    jobs: Vec<CaptionJob>,
    config: &CaptionConfig,
    max_parallel: usize,
    cancel: CancellationToken,
) -> Vec<UnitReport> {
    let semaphore = Arc::new(Semaphore::new(max_parallel));
    let mut set = JoinSet::new();

    for (index, job) in jobs.iter().cloned().enumerate() {
        let semaphore = semaphore.clone();
        let config = config.clone();
        let cancel = cancel.clone();
        set.spawn(async move {
            let Ok(_permit) = semaphore.acquire_owned().await else {
                return (index, Err(Error::Cancelled));
            };
            (index, run_job(&job, &config, cancel).await)
        });
    }

    let mut results: Vec<Option<Result<CaptionOutput>>> = jobs.iter().map(|_| None).collect();
    while let Some(joined) = set.join_next().await {
        match joined {
            Ok((index, result)) => results[index] = Some(result),
            Err(e) => tracing::error!("caption task failed to complete: {e}"),
        }
    }

    jobs.iter()
        .zip(results)
        .map(|(job, result)| match result.unwrap_or(Err(Error::Cancelled)) {
            Ok(output) => {
                tracing::info!(
                    stream = %job.name,
                    segments = output.segments.len(),
                    playlist = %output.playlist.display(),
                    "caption stream segmented"
                );
                UnitReport::completed(UnitKind::Captions, &job.name, output.into_artifacts(), &[])
            }
            Err(e) => UnitReport::failed(UnitKind::Captions, &job.name, &e),
        })
        .collect()
}

async fn run_job(
    job: &CaptionJob,
    config: &CaptionConfig,
    cancel: CancellationToken,
) -> Result<CaptionOutput> {
    match &job.source {
        CaptionSource::File(path) => {
            let file = tokio::fs::File::open(path).await?;
            segment_captions(BufReader::new(file), &job.name, &job.output_dir, config, cancel).await
        }
        CaptionSource::Stdin => {
            let stdin = BufReader::new(tokio::io::stdin());
            segment_captions(stdin, &job.name, &job.output_dir, config, cancel).await
        }
    }
}

/// Segment one WebVTT stream into `output_dir`.
///
/// Writes `<name>-NNNNN.<ext>` segment files as windows close and
/// `<name>.m3u8` once the stream has ended. Every wait on the parser is
/// bounded by the configured hand-off timeout and by `cancel`.
pub async fn segment_captions<R>(
    reader: R,
    name: &str,
    output_dir: &Path,
    config: &CaptionConfig,
    cancel: CancellationToken,
) -> Result<CaptionOutput>
where
    R: AsyncBufRead + Unpin + Send + 'static,
{
    check_name(name)?;
    tokio::fs::create_dir_all(output_dir).await?;

    let (tx, rx) = mpsc::channel(config.channel_capacity);
    let producer = tokio::spawn(produce_cues(reader, tx));

    let mut writer = SegmentWriter::new(name, output_dir, config);
    let result = consume_cues(rx, &mut writer, config, &cancel).await;
    // The consumer may stop early; the producer must not outlive it.
    producer.abort();

    match result {
        Ok(()) => writer.finish().await,
        Err(e) => {
            // Segments without their playlist are unreachable; remove them.
            writer.discard().await;
            Err(e)
        }
    }
}

async fn produce_cues<R>(reader: R, tx: mpsc::Sender<Result<CueMessage>>)
where
    R: AsyncBufRead + Unpin,
{
    let mut lines = reader.lines();
    let mut parser = CueParser::new();

    loop {
        let event = match lines.next_line().await {
            Ok(Some(line)) => parser.push_line(&line),
            Ok(None) => break,
            Err(e) => Err(e.into()),
        };
        let message = match event {
            Ok(Some(event)) => Ok(into_message(event)),
            Ok(None) => continue,
            Err(e) => Err(e),
        };
        let failed = message.is_err();
        if tx.send(message).await.is_err() || failed {
            return;
        }
    }

    match parser.finish() {
        Ok(Some(event)) => {
            if tx.send(Ok(into_message(event))).await.is_err() {
                return;
            }
        }
        Ok(None) => {}
        Err(e) => {
            let _ = tx.send(Err(e)).await;
            return;
        }
    }
    let _ = tx.send(Ok(CueMessage::End)).await;
}

fn into_message(event: CueEvent) -> CueMessage {
    match event {
        CueEvent::Header(lines) => CueMessage::Header(lines),
        CueEvent::Block(block) => CueMessage::Block(block),
    }
}

async fn consume_cues(
    mut rx: mpsc::Receiver<Result<CueMessage>>,
    writer: &mut SegmentWriter<'_>,
    config: &CaptionConfig,
    cancel: &CancellationToken,
) -> Result<()> {
    let timeout = config.hand_off_timeout();
    let mut segmenter = CaptionSegmenter::new(config.segment_duration(), config.grace());

    loop {
        let received = tokio::select! {
            _ = cancel.cancelled() => return Err(Error::Cancelled),
            r = tokio::time::timeout(timeout, rx.recv()) => r,
        };
        let message = match received {
            Ok(Some(message)) => message?,
            Ok(None) => {
                return Err(Error::HandOff(
                    "cue producer stopped without signalling end of stream".into(),
                ))
            }
            Err(_) => {
                return Err(Error::HandOff(format!(
                    "no cue received within {timeout:?}"
                )))
            }
        };

        match message {
            CueMessage::Header(lines) => writer.header = lines,
            CueMessage::Block(block) => {
                for segment in segmenter.push(block) {
                    writer.write(&segment).await?;
                }
            }
            CueMessage::End => break,
        }
    }

    if let Some(segment) = segmenter.finish() {
        writer.write(&segment).await?;
    }
    Ok(())
}

struct SegmentWriter<'a> {
    name: &'a str,
    output_dir: &'a Path,
    extension: &'a str,
    header: Vec<String>,
    playlist: CaptionPlaylist,
    segments: Vec<PathBuf>,
}

impl<'a> SegmentWriter<'a> {
    fn new(name: &'a str, output_dir: &'a Path, config: &'a CaptionConfig) -> Self {
        Self {
            name,
            output_dir,
            extension: &config.segment_extension,
            header: Vec::new(),
            playlist: CaptionPlaylist::new(config.segment_duration(), config.grace()),
            segments: Vec::new(),
        }
    }

    async fn write(&mut self, segment: &CaptionSegment) -> Result<()> {
        let file_name = segment_file_name(self.name, segment.index, self.extension);
        let path = self.output_dir.join(&file_name);
        tokio::fs::write(&path, render_segment(&self.header, segment)).await?;
        tracing::debug!(
            stream = self.name,
            index = segment.index,
            blocks = segment.blocks.len(),
            "caption segment written"
        );
        self.playlist.push(file_name, segment.duration);
        self.segments.push(path);
        Ok(())
    }

    async fn finish(self) -> Result<CaptionOutput> {
        let playlist = self.output_dir.join(format!("{}.m3u8", self.name));
        tokio::fs::write(&playlist, self.playlist.render()).await?;
        Ok(CaptionOutput {
            playlist,
            segments: self.segments,
        })
    }

    async fn discard(self) {
        for path in &self.segments {
            if let Err(e) = tokio::fs::remove_file(path).await {
                tracing::warn!(
                    stream = self.name,
                    "failed to remove partial segment {}: {}",
                    path.display(),
                    e
                );
            }
        }
    }
}

fn check_name(name: &str) -> Result<()> {
    if name.is_empty() || name.contains(['/', '\\']) || name == "." || name == ".." {
        return Err(Error::Validation(format!(
            "caption stream name {name:?} must be a plain file name"
        )));
    }
    Ok(())
}
