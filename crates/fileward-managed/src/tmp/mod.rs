//! Session-scoped temp files.

mod manager;
mod source;

pub use manager::{INFO_FILE_SUFFIX, TMP_FILE_SUFFIX, TmpFileManager};
pub use source::TmpFileSource;
