//! # hlsaux-av
//!
//! External tool plumbing for hlsaux.
//!
//! - **Tool discovery** ([`ToolRegistry`]) -- find ffprobe on `PATH` or at a
//!   configured location.
//! - **Command execution** ([`ToolCommand`]) -- async builder with timeout,
//!   cancellation and stdin feeding for running external processes.
//! - **Packet index feed** ([`PacketProbe`]) -- per-segment packet records
//!   from `ffprobe -show_packets`.

pub mod command;
pub mod probe;
pub mod tools;

pub use command::{ToolCommand, ToolOutput};
pub use probe::{parse_packets, PacketProbe};
pub use tools::{ToolInfo, ToolRegistry};
