use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "hlsaux")]
#[command(
    author,
    version,
    about = "Derive I-frame playlists and segmented WebVTT captions for HLS"
)]
pub struct Cli {
    /// Path to config file
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Generate I-frame-only playlists for a master playlist or chunklist
    Iframes {
        /// Master playlist or variant chunklist
        #[arg(required = true)]
        playlist: PathBuf,

        /// Output the run report as JSON
        #[arg(long)]
        json: bool,
    },

    /// Segment a WebVTT caption stream into an HLS caption playlist
    Captions {
        /// WebVTT file, or `-` to read from stdin
        #[arg(required = true)]
        input: String,

        /// Base name of the segment files and playlist
        #[arg(short, long)]
        name: String,

        /// Directory to write segments and playlist into
        #[arg(short, long)]
        output_dir: PathBuf,

        /// Segment window in seconds (overrides config)
        #[arg(long)]
        segment_duration: Option<u64>,

        /// Grace period in milliseconds (overrides config)
        #[arg(long)]
        grace_ms: Option<u64>,

        /// Output the run report as JSON
        #[arg(long)]
        json: bool,
    },

    /// Generate I-frame playlists and segment caption streams in one run
    Run {
        /// Master playlist or variant chunklist
        #[arg(required = true)]
        playlist: PathBuf,

        /// Caption stream to segment next to the playlist, as NAME=FILE
        #[arg(long = "captions", value_name = "NAME=FILE", value_parser = parse_caption_arg)]
        captions: Vec<(String, String)>,

        /// Output the run report as JSON
        #[arg(long)]
        json: bool,
    },

    /// Check that required external tools are available
    CheckTools,

    /// Validate configuration file
    Validate {
        /// Config file to validate (uses default if not specified)
        config: Option<PathBuf>,
    },

    /// Display version information
    Version,
}

fn parse_caption_arg(arg: &str) -> Result<(String, String), String> {
    match arg.split_once('=') {
        Some((name, file)) if !name.is_empty() && !file.is_empty() => {
            Ok((name.to_string(), file.to_string()))
        }
        _ => Err(format!("expected NAME=FILE, got {arg:?}")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn caption_arg_splits_on_first_equals() {
        assert_eq!(
            parse_caption_arg("en=subs/en.vtt").unwrap(),
            ("en".to_string(), "subs/en.vtt".to_string())
        );
        assert_eq!(
            parse_caption_arg("en=a=b.vtt").unwrap(),
            ("en".to_string(), "a=b.vtt".to_string())
        );
        assert!(parse_caption_arg("en.vtt").is_err());
        assert!(parse_caption_arg("=en.vtt").is_err());
        assert!(parse_caption_arg("en=").is_err());
    }

    #[test]
    fn cli_parses_run_with_captions() {
        let cli = Cli::parse_from([
            "hlsaux",
            "run",
            "master.m3u8",
            "--captions",
            "en=en.vtt",
            "--captions",
            "fr=-",
            "--json",
        ]);
        match cli.command {
            Commands::Run {
                playlist,
                captions,
                json,
            } => {
                assert_eq!(playlist, PathBuf::from("master.m3u8"));
                assert_eq!(captions.len(), 2);
                assert_eq!(captions[1], ("fr".to_string(), "-".to_string()));
                assert!(json);
            }
            _ => panic!("expected run"),
        }
    }
}
