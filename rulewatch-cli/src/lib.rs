//! Rulewatch CLI - driver for the change detection engine.
//!
//! Reads per-source inbox files, runs detection cycles and renders the resulting
//! events. The binary in `main.rs` is a thin clap front end over these modules.

#![warn(clippy::all)]
#![allow(clippy::pedantic)]

pub mod commands;
pub mod daemon;
pub mod inbox;
pub mod render;
