//! FFprobe-backed packet index feed.
//!
//! Shells out to `ffprobe -show_packets` for the video stream of one segment
//! file and maps the JSON output into ordered [`PacketRecord`]s.

use std::path::{Path, PathBuf};
use std::time::Duration;

use hlsaux_core::{Error, PacketRecord, Result};
use serde::Deserialize;
use tokio_util::sync::CancellationToken;

use crate::command::ToolCommand;
use crate::tools::ToolRegistry;

const PACKET_ENTRIES: &str = "packet=pts_time,dts_time,duration_time,size,pos,flags";

#[derive(Debug, Deserialize)]
struct FfprobePackets {
    #[serde(default)]
    packets: Vec<FfprobePacket>,
}

#[derive(Debug, Deserialize)]
struct FfprobePacket {
    pts_time: Option<Field>,
    dts_time: Option<Field>,
    duration_time: Option<Field>,
    size: Option<Field>,
    pos: Option<Field>,
    #[serde(default)]
    flags: String,
}

/// ffprobe prints most numbers as strings, and `N/A` when unknown.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum Field {
    Number(serde_json::Number),
    Text(String),
}

impl Field {
    fn as_f64(&self) -> Option<f64> {
        match self {
            Field::Number(n) => n.as_f64(),
            Field::Text(s) => s.trim().parse().ok(),
        }
    }

    fn as_u64(&self) -> Option<u64> {
        match self {
            Field::Number(n) => n.as_u64(),
            Field::Text(s) => s.trim().parse().ok(),
        }
    }
}

/// Parse `ffprobe -show_packets -print_format json` output.
///
/// Packets keep the tool's order. A packet without a usable `pos` or `size`
/// makes the whole feed malformed, since byte ranges cannot be derived.
pub fn parse_packets(json: &str) -> Result<Vec<PacketRecord>> {
    let output: FfprobePackets = serde_json::from_str(json)
        .map_err(|e| Error::probe(format!("malformed ffprobe output: {e}")))?;

    output
        .packets
        .into_iter()
        .enumerate()
        .map(|(index, p)| {
            let offset = p
                .pos
                .as_ref()
                .and_then(Field::as_u64)
                .ok_or_else(|| Error::probe(format!("packet {index} has no byte position")))?;
            let size = p
                .size
                .as_ref()
                .and_then(Field::as_u64)
                .ok_or_else(|| Error::probe(format!("packet {index} has no size")))?;

            let keyframe = match p.flags.chars().next() {
                Some(c) => c == 'K',
                None => {
                    tracing::warn!(packet = index, "packet has empty flags; treating as non-key");
                    false
                }
            };

            let duration_secs = p
                .duration_time
                .as_ref()
                .and_then(Field::as_f64)
                .filter(|d| d.is_finite() && *d > 0.0)
                .unwrap_or(0.0);

            Ok(PacketRecord {
                pts_secs: p.pts_time.as_ref().and_then(Field::as_f64),
                dts_secs: p.dts_time.as_ref().and_then(Field::as_f64),
                duration_secs,
                size,
                offset,
                keyframe,
            })
        })
        .collect()
}

/// Packet index feed backed by the `ffprobe` CLI.
#[derive(Debug, Clone)]
pub struct PacketProbe {
    ffprobe_path: PathBuf,
    timeout: Duration,
}

impl PacketProbe {
    /// Create a probe using the given ffprobe path and per-call timeout.
    pub fn new(ffprobe_path: PathBuf, timeout: Duration) -> Self {
        Self {
            ffprobe_path,
            timeout,
        }
    }

    /// Create a probe from the discovered ffprobe.
    pub fn from_registry(tools: &ToolRegistry) -> Result<Self> {
        let ffprobe = tools.require("ffprobe")?;
        Ok(Self::new(ffprobe.path.clone(), ffprobe.timeout))
    }

    /// Probe the video packets of one segment file.
    ///
    /// With an initialization segment, the tool reads `init ‖ segment` from
    /// stdin, so offsets are relative to that concatenation.
    pub async fn probe_segment(
        &self,
        segment: &Path,
        init: Option<&Path>,
        cancel: &CancellationToken,
    ) -> Result<Vec<PacketRecord>> {
        let mut cmd = ToolCommand::new(self.ffprobe_path.clone());
        cmd.timeout(self.timeout);
        cmd.cancel_on(cancel.clone());
        cmd.args(["-hide_banner", "-loglevel", "warning"]);
        cmd.args(["-select_streams", "v", "-show_packets"]);
        cmd.args(["-show_entries", PACKET_ENTRIES]);
        cmd.args(["-print_format", "json"]);

        match init {
            Some(init) => {
                let mut data = tokio::fs::read(init).await?;
                data.extend(tokio::fs::read(segment).await?);
                tracing::debug!(
                    segment = %segment.display(),
                    init = %init.display(),
                    bytes = data.len(),
                    "probing packets through stdin"
                );
                cmd.arg("-");
                cmd.stdin(data);
            }
            None => {
                tracing::debug!(segment = %segment.display(), "probing packets");
                cmd.arg(segment.to_string_lossy().as_ref());
            }
        }

        let output = cmd.execute().await?;
        let packets = parse_packets(&output.stdout).map_err(|e| match e {
            Error::Probe(msg) => Error::probe(format!("{}: {msg}", segment.display())),
            other => other,
        })?;

        tracing::trace!(segment = %segment.display(), packets = packets.len(), "probed");
        Ok(packets)
    }
}
