//! HLS playlist reading and writing.
//!
//! Input playlists are parsed with `m3u8-rs`; derived playlists are rendered
//! by hand so their text is byte-stable across runs.

mod chunklist;
mod master;
mod playlist;

pub use chunklist::{read_playlist, ChunkSegment, Chunklist, PlaylistKind, VariantRef};
pub use master::rewrite_master;
pub use playlist::{CaptionPlaylist, IFrameEntry, IFramePlaylist};
