//! Common utilities shared by the HR services.
//!
//! This crate provides:
//! - Transport-facing error type with HTTP and gRPC mappings
//! - Configuration structures
//! - Tracing subscriber setup

pub mod config;
pub mod error;
pub mod telemetry;

pub use config::*;
pub use error::{AppError, AppResult, OptionExt};
pub use telemetry::init_tracing;
