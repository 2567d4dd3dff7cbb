//! # fileward-fs
//!
//! Filesystem primitives shared by the managed-file layer:
//!
//! - [`FsPath`]: an owned path with the create/inspect/glob operations the
//!   managed layer needs
//! - [`FsPerm`]: a validated octal permission mode
//! - [`escape_glob`]: escapes a literal filename for use in a glob pattern

pub mod path;
pub mod perm;

pub use path::{FsPath, escape_glob};
pub use perm::FsPerm;
