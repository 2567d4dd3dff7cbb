//! Derived thumb variants cached in reserved sibling directories.

mod engine;
mod gate;
mod source;

pub use engine::ThumbEngine;
pub use source::ThumbFileSource;
