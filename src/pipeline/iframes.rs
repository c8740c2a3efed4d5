//! I-frame playlist run: one unit per variant.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use hlsaux_av::PacketProbe;
use hlsaux_core::config::{Config, IFrameConfig};
use hlsaux_core::{Error, Result, Warning};
use hlsaux_media::{read_playlist, rewrite_master, IFramePlaylistBuilder, PlaylistKind};
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;

use super::report::{UnitKind, UnitReport};

/// A variant chunklist to process.
#[derive(Debug, Clone)]
struct VariantJob {
    /// URI as listed in the master (or the file name of a lone chunklist).
    uri: String,
    /// Resolved chunklist path.
    path: PathBuf,
}

/// What a successful variant hands back for the master playlist.
struct VariantOutput {
    playlist_path: PathBuf,
    /// I-frame playlist URI relative to the master.
    master_uri: String,
    stream_inf: String,
    warnings: Vec<Warning>,
}

/// Generate I-frame-only playlists for every variant reachable from
/// `input`, which may be a master playlist or a single chunklist.
///
/// Variants run concurrently, at most `max_parallel_units` at a time. A
/// failed variant is reported and left out of the master; the others carry
/// on. For a master input the master is rewritten with one
/// `#EXT-X-I-FRAME-STREAM-INF` line per successful variant.
///
/// Only an unreadable input playlist or master fails the whole call.
pub async fn generate_iframe_playlists(
    input: &Path,
    config: &Config,
    probe: PacketProbe,
    cancel: CancellationToken,
) -> Result<Vec<UnitReport>> {
    let master_text = tokio::fs::read_to_string(input).await?;
    let base_dir = input.parent().unwrap_or(Path::new("")).to_path_buf();

    let (jobs, is_master) = match read_playlist(master_text.as_bytes())? {
        PlaylistKind::Master(variants) => {
            let jobs: Vec<_> = variants
                .into_iter()
                .map(|v| VariantJob {
                    path: base_dir.join(&v.uri),
                    uri: v.uri,
                })
                .collect();
            (jobs, true)
        }
        PlaylistKind::Media(_) => {
            let uri = input
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .ok_or_else(|| Error::playlist(format!("{} is not a file", input.display())))?;
            let job = VariantJob {
                uri,
                path: input.to_path_buf(),
            };
            (vec![job], false)
        }
    };

    tracing::info!(
        input = %input.display(),
        variants = jobs.len(),
        master = is_master,
        "generating I-frame playlists"
    );

    let semaphore = Arc::new(Semaphore::new(config.max_parallel_units));
    let iframes = Arc::new(config.iframes.clone());
    let mut set = JoinSet::new();

    for (index, job) in jobs.iter().cloned().enumerate() {
        let semaphore = semaphore.clone();
        let iframes = iframes.clone();
        let probe = probe.clone();
        let cancel = cancel.clone();
        set.spawn(async move {
            let Ok(_permit) = semaphore.acquire_owned().await else {
                return (index, Err(Error::Cancelled));
            };
            if cancel.is_cancelled() {
                return (index, Err(Error::Cancelled));
            }
            (index, process_variant(&job, &iframes, &probe, &cancel).await)
        });
    }

    let mut results: Vec<Option<Result<VariantOutput>>> = jobs.iter().map(|_| None).collect();
    while let Some(joined) = set.join_next().await {
        match joined {
            Ok((index, result)) => results[index] = Some(result),
            Err(e) => tracing::error!("variant task failed to complete: {e}"),
        }
    }

    let mut reports = Vec::with_capacity(jobs.len());
    let mut streams = Vec::new();
    for (job, result) in jobs.iter().zip(results) {
        let result = result.unwrap_or_else(|| Err(Error::Cancelled));
        match result {
            Ok(output) => {
                tracing::info!(
                    variant = %job.uri,
                    playlist = %output.playlist_path.display(),
                    "I-frame playlist written"
                );
                streams.push((output.master_uri, output.stream_inf));
                reports.push(UnitReport::completed(
                    UnitKind::IFrames,
                    &job.uri,
                    vec![output.playlist_path],
                    &output.warnings,
                ));
            }
            Err(e) => reports.push(UnitReport::failed(UnitKind::IFrames, &job.uri, &e)),
        }
    }

    if is_master && !streams.is_empty() {
        let rewritten = rewrite_master(&master_text, &streams);
        tokio::fs::write(input, rewritten).await?;
        tracing::info!(
            master = %input.display(),
            streams = streams.len(),
            "master playlist updated"
        );
    }

    Ok(reports)
}

async fn process_variant(
    job: &VariantJob,
    config: &IFrameConfig,
    probe: &PacketProbe,
    cancel: &CancellationToken,
) -> Result<VariantOutput> {
    let bytes = tokio::fs::read(&job.path).await?;
    let chunklist = match read_playlist(&bytes)? {
        PlaylistKind::Media(chunklist) => chunklist,
        PlaylistKind::Master(_) => {
            return Err(Error::playlist(format!(
                "variant {} is a master playlist",
                job.uri
            )))
        }
    };

    let dir = job.path.parent().unwrap_or(Path::new(""));
    let mut builder = IFramePlaylistBuilder::new(&job.uri, config, chunklist.target_duration);
    // (init URI, path, size) of the init segment currently in effect.
    let mut init_in_effect: Option<(String, PathBuf, u64)> = None;

    tracing::debug!(
        variant = %job.uri,
        segments = chunklist.segments.len(),
        "indexing keyframes"
    );

    for segment in &chunklist.segments {
        if cancel.is_cancelled() {
            return Err(Error::Cancelled);
        }

        match &segment.init {
            Some(uri) if init_in_effect.as_ref().map(|(u, _, _)| u) != Some(uri) => {
                let path = dir.join(uri);
                let size = tokio::fs::metadata(&path).await?.len();
                tracing::debug!(variant = %job.uri, init = %uri, size, "init segment");
                init_in_effect = Some((uri.clone(), path, size));
            }
            Some(_) => {}
            None => init_in_effect = None,
        }

        let (init_path, init_size) = match &init_in_effect {
            Some((_, path, size)) => (Some(path.as_path()), *size),
            None => (None, 0),
        };

        let packets = probe
            .probe_segment(&dir.join(&segment.uri), init_path, cancel)
            .await?;
        builder.push_segment(&segment.uri, segment.init.as_deref(), init_size, &packets)?;
    }

    let playlist = builder.build()?;

    let file_name = iframe_file_name(&job.path, &config.playlist_suffix);
    let playlist_path = dir.join(&file_name);
    tokio::fs::write(&playlist_path, playlist.render()).await?;

    let master_uri = sibling_uri(&job.uri, &file_name);
    Ok(VariantOutput {
        stream_inf: playlist.stream_inf_line(&master_uri),
        master_uri,
        playlist_path,
        warnings: builder.warnings().to_vec(),
    })
}

/// `<stem><suffix>.m3u8` for a variant chunklist path.
fn iframe_file_name(variant: &Path, suffix: &str) -> String {
    let stem = variant
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    format!("{stem}{suffix}.m3u8")
}

/// Replace the last path component of a relative URI.
fn sibling_uri(uri: &str, file_name: &str) -> String {
    match uri.rfind('/') {
        Some(i) => format!("{}{}", &uri[..=i], file_name),
        None => file_name.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn iframe_names() {
        assert_eq!(
            iframe_file_name(Path::new("/media/720p/index.m3u8"), "_I-FRAME-ONLY"),
            "index_I-FRAME-ONLY.m3u8"
        );
        assert_eq!(
            sibling_uri("720p/index.m3u8", "index_I-FRAME-ONLY.m3u8"),
            "720p/index_I-FRAME-ONLY.m3u8"
        );
        assert_eq!(sibling_uri("low.m3u8", "low_iframes.m3u8"), "low_iframes.m3u8");
    }
}
