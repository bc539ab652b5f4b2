//! Core abstractions for the stock advisor
//!
//! This crate defines the agent trait, the execution context threaded through a
//! pipeline run, and the shared error type.

pub mod agent;
pub mod context;
pub mod error;

pub use agent::Agent;
pub use context::Context;
pub use error::{Error, Result};
