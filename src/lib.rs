//! hlsaux - derived HLS playlist synthesis
//!
//! This library crate exposes the pipelines for integration testing.

pub mod config;
pub mod pipeline;
