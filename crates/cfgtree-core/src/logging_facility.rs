//! Structured logging facility for cfgtree
//!
//! This module provides:
//! - Single initialization point via `init(profile)`
//! - Structured logging macros (`log_op_start!`, `log_op_end!`, `log_op_error!`)
//! - Test capture mode for deterministic assertions
//!
//! # Usage
//!
//! ```rust
//! use cfgtree_core::logging_facility::{init, Profile};
//!
//! init(Profile::Development);
//! ```
//!
//! Facade operations (`open_editor`, `accept_editor`, file load/save) own the
//! start/end events; the model, dependency and sync layers only use
//! `tracing::debug!` for internal details.

pub mod init;
pub mod macros;
pub mod test_capture;

pub use init::{init, Profile};
pub use test_capture::{init_test_capture, CapturedEvent, TestCapture};
