//! Shared utilities for the stock advisor
//!
//! Logging setup and `.env` loading used by the binary and by integration
//! examples.

pub mod env;
pub mod logging;

pub use env::load_dotenv;
pub use logging::{LogFormat, init_tracing, init_tracing_with};
