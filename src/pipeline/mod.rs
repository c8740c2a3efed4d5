//! Derived-artifact pipelines.
//!
//! Each variant and each caption stream is an independent unit: a failed
//! unit is reported and the others carry on.

pub mod captions;
pub mod iframes;
pub mod report;

pub use captions::{
    segment_caption_streams, segment_captions, CaptionJob, CaptionOutput, CaptionSource,
    CueMessage,
};
pub use iframes::generate_iframe_playlists;
pub use report::{RunReport, UnitKind, UnitOutcome, UnitReport};

use std::path::Path;

use hlsaux_av::PacketProbe;
use hlsaux_core::config::Config;
use tokio_util::sync::CancellationToken;

/// Run the I-frame pipeline over `playlist` and segment `captions`
/// alongside it.
///
/// Every outcome ends up in the report. An unreadable input playlist is
/// reported as one failed I-frame unit named after the path; the caption
/// streams are unaffected by it.
pub async fn run_all(
    playlist: &Path,
    captions: Vec<CaptionJob>,
    config: &Config,
    probe: PacketProbe,
    cancel: CancellationToken,
) -> RunReport {
    let (iframe_units, caption_units) = tokio::join!(
        generate_iframe_playlists(playlist, config, probe, cancel.clone()),
        segment_caption_streams(captions, &config.captions, config.max_parallel_units, cancel),
    );

    let mut report = RunReport::default();
    match iframe_units {
        Ok(units) => report.extend(units),
        Err(e) => report.push(UnitReport::failed(
            UnitKind::IFrames,
            playlist.display().to_string(),
            &e,
        )),
    }
    report.extend(caption_units);

    tracing::info!(
        units = report.units.len(),
        warnings = report.warning_count(),
        failed = report.has_failures(),
        "run finished"
    );
    report
}
