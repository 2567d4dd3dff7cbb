//! Core type definitions used across the Fileward workspace.

pub mod qualified_name;

pub use qualified_name::QualifiedName;
