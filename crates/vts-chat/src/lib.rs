//! A terminal chat client for Gemini that can translate its replies and
//! read them aloud.
//!
//! The crate ships the `vts-chat` binary. As a library it exposes the
//! pieces the binary is built from: configuration, the HTTP translation
//! and speech backends, and the REPL command handling.

#![deny(missing_docs)]

#[macro_use]
extern crate tracing;

pub mod actions;
mod app;
pub mod commands;
pub mod config;
mod error;
pub mod services;

pub use app::{App, Flow};
pub use error::{Error, ErrorKind};

/// Re-exports of [`vts_chat_core`] crate.
pub mod core {
    pub use vts_chat_core::*;
}
