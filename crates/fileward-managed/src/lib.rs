//! # fileward-managed
//!
//! The managed-file abstraction layer: logical file sources wrapping a
//! filesystem path, a thumb engine that caches resized variants of image
//! files in reserved sibling directories, and session-scoped temp files
//! that clean up after themselves.
//!
//! A file under management is represented by a [`ManagedFileSource`];
//! structural mutation (move, delete) through the source always fails and
//! must go through the owning manager instead. Image sources yield a
//! [`ThumbEngine`](thumb::ThumbEngine) that derives variant files at
//! `<parent>/~res-<dimension>~/<name>` lazily and rediscovers them from
//! disk on every call. [`TmpFileSource`]s are ephemeral: unless bound to a
//! session they remove their files when dropped.

pub mod dimension;
pub mod managed;
pub mod naming;
pub mod source;
pub mod thumb;
pub mod tmp;

pub use dimension::ImageDimension;
pub use managed::ManagedFileSource;
pub use source::{FileSource, SourceBase, VariationEngine};
pub use thumb::{ThumbEngine, ThumbFileSource};
pub use tmp::{TmpFileManager, TmpFileSource};
