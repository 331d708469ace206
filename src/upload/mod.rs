//! Chunked multipart uploads
//!
//! This module uploads buffers, streams and files to a presigned destination
//! in numbered parts with bounded concurrency and per-part retries.

pub mod chunks;
pub mod operations;
pub mod session;
pub mod types;

pub use operations::Uploader;
pub use session::UploadSession;
pub use types::{
    Access, PresignedUrl, SignedUrlResponse, UploadOptions, UploadParams, UploadProgress,
    UploadSource,
};
