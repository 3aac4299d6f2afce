#![forbid(unsafe_code)]

//! Builds a static video gallery page from a YouTube channel's latest
//! uploads, leaving out Shorts.
//!
//! The binary in `src/bin/build_gallery.rs` wires these modules together;
//! [`pipeline::run`] is the whole build in one call.

pub mod config;
pub mod duration;
pub mod error;
pub mod filter;
pub mod pipeline;
pub mod render;
pub mod retry;
pub mod youtube;
