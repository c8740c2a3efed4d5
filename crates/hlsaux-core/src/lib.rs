//! # hlsaux-core
//!
//! Shared foundation for the hlsaux workspace.
//!
//! - **Errors** ([`Error`], [`Result`]) -- one taxonomy for probe, parse,
//!   playlist and I/O failures, shared by every crate.
//! - **Packet model** ([`PacketRecord`]) -- the normalized shape of one
//!   probed video packet.
//! - **Configuration** ([`config`]) -- TOML-backed settings handed explicitly
//!   to each builder.

pub mod config;
pub mod error;
pub mod packet;

pub use config::Config;
pub use error::{Error, Result, Warning};
pub use packet::PacketRecord;
