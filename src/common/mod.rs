//! Common utilities shared by every scenario

pub mod config;
pub mod error;
pub mod logging;
pub mod paths;

pub use error::{Error, FailureKind, Result};
