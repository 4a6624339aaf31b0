//! regpanel — operator client for device configuration registers behind a
//! serial backend service.
//!
//! The operator picks a serial port from the backend's directory, confirms it,
//! reads the eight configuration registers, edits them locally and submits the
//! new values. The workflow lives in [`core::Session`]; [`api`] holds the
//! backend transport, and the `cli` and `tui` modules are the two front ends
//! driving it.

pub mod api;
pub mod cli;
pub mod core;
pub mod protocol;
pub mod tui;

pub use api::*;
