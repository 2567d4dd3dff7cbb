//! # fileward-img
//!
//! Image handling for the managed-file layer: MIME type resolution,
//! decoded pixel data with resize operations, and a per-path codec that
//! reads and writes image files in the format their extension implies.

pub mod codec;
pub mod mime;
pub mod resource;

pub use codec::ImageCodec;
pub use resource::ImageResource;
