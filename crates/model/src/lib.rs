//! An abstraction layer for hosted chat models.
//!
//! This crate establishes an unified protocol for the chat session to
//! talk to a hosted model, so that the session can switch providers
//! without modifying the orchestration code.
//!
//! Types in this crate don't define any behavior, instead they are the
//! constraints that the implementors should adhere to.

#![deny(missing_docs)]

mod error;
mod opaque;
mod provider;
mod request;
mod response;
mod settings;

pub use error::*;
pub use opaque::*;
pub use provider::*;
pub use request::*;
pub use response::*;
pub use settings::*;
