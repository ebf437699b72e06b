//! Core types for the financial insights toolkit
//!
//! Every tool exposed to an orchestration layer reports failures through
//! [`Error`], whatever crate the tool lives in.

pub mod error;

pub use error::{Error, Result};
