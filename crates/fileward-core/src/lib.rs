//! # fileward-core
//!
//! Core crate for Fileward. Contains configuration schemas, the qualified
//! name type, and the unified error system.
//!
//! This crate has **no** internal dependencies on other Fileward crates.

pub mod config;
pub mod error;
pub mod result;
pub mod types;

pub use error::AppError;
pub use result::AppResult;
