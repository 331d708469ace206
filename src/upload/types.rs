use crate::error::{PixelbinError, Result};
use bytes::Bytes;
use futures::stream::BoxStream;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Default part size: 10 MiB
pub const DEFAULT_CHUNK_SIZE: usize = 10 * 1024 * 1024;
pub const DEFAULT_MAX_RETRIES: u32 = 2;
pub const DEFAULT_CONCURRENCY: usize = 3;
pub const DEFAULT_EXPONENTIAL_FACTOR: f64 = 2.0;

/// Access level of an uploaded asset
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Access {
    PublicRead,
    Private,
}

impl Default for Access {
    fn default() -> Self {
        Access::PublicRead
    }
}

impl std::fmt::Display for Access {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Access::PublicRead => write!(f, "public-read"),
            Access::Private => write!(f, "private"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct UploadProgress {
    pub bytes_uploaded: usize,
    pub total_bytes: Option<usize>,
    pub percentage: f64,
    pub parts_uploaded: usize,
    pub last_part: Option<u32>,
}

impl UploadProgress {
    pub fn new(bytes_uploaded: usize, total_bytes: Option<usize>) -> Self {
        let percentage = match total_bytes {
            Some(total) if total > 0 => bytes_uploaded as f64 / total as f64,
            _ => 0.0,
        };

        Self {
            bytes_uploaded,
            total_bytes,
            percentage: percentage.min(1.0),
            parts_uploaded: 0,
            last_part: None,
        }
    }

    pub fn new_part(
        bytes_uploaded: usize,
        total_bytes: Option<usize>,
        parts_uploaded: usize,
        part_number: u32,
    ) -> Self {
        let mut progress = Self::new(bytes_uploaded, total_bytes);
        progress.parts_uploaded = parts_uploaded;
        progress.last_part = Some(part_number);
        progress
    }
}

/// Tuning for multipart uploads
#[derive(Clone)]
pub struct UploadOptions {
    /// Bytes per part (default: 10 MiB)
    pub chunk_size: usize,
    /// Retries per part and for the finalize call (default: 2)
    pub max_retries: u32,
    /// Parts in flight per batch (default: 3)
    pub concurrency: usize,
    /// Back-off multiplier (default: 2)
    pub exponential_factor: f64,
    pub on_progress: Option<Arc<dyn Fn(UploadProgress) + Send + Sync>>,
}

impl std::fmt::Debug for UploadOptions {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UploadOptions")
            .field("chunk_size", &self.chunk_size)
            .field("max_retries", &self.max_retries)
            .field("concurrency", &self.concurrency)
            .field("exponential_factor", &self.exponential_factor)
            .field("on_progress", &self.on_progress.is_some())
            .finish()
    }
}

impl Default for UploadOptions {
    fn default() -> Self {
        Self {
            chunk_size: DEFAULT_CHUNK_SIZE,
            max_retries: DEFAULT_MAX_RETRIES,
            concurrency: DEFAULT_CONCURRENCY,
            exponential_factor: DEFAULT_EXPONENTIAL_FACTOR,
            on_progress: None,
        }
    }
}

impl UploadOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn chunk_size(mut self, size: usize) -> Self {
        self.chunk_size = size;
        self
    }

    pub fn max_retries(mut self, retries: u32) -> Self {
        self.max_retries = retries;
        self
    }

    pub fn concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency;
        self
    }

    pub fn exponential_factor(mut self, factor: f64) -> Self {
        self.exponential_factor = factor;
        self
    }

    pub fn on_progress<F>(mut self, callback: F) -> Self
    where
        F: Fn(UploadProgress) + Send + Sync + 'static,
    {
        self.on_progress = Some(Arc::new(callback));
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.chunk_size == 0 {
            return Err(PixelbinError::illegal_argument(
                "Invalid chunkSize: Must be a positive integer",
            ));
        }

        if self.concurrency == 0 {
            return Err(PixelbinError::illegal_argument(
                "Invalid concurrency: Must be a positive integer",
            ));
        }

        if !self.exponential_factor.is_finite() || self.exponential_factor < 0.0 {
            return Err(PixelbinError::illegal_argument(
                "Invalid exponentialFactor: Must be a non-negative number",
            ));
        }

        Ok(())
    }
}

/// Destination and attributes of an upload, sent to the signed-url endpoint
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadParams {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub format: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub access: Option<Access>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata: Option<serde_json::Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub overwrite: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub filename_override: Option<bool>,
    /// Seconds the presigned URL stays valid
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expiry: Option<u64>,
}

impl UploadParams {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn path(mut self, path: impl Into<String>) -> Self {
        self.path = Some(path.into());
        self
    }

    pub fn format(mut self, format: impl Into<String>) -> Self {
        self.format = Some(format.into());
        self
    }

    pub fn access(mut self, access: Access) -> Self {
        self.access = Some(access);
        self
    }

    pub fn add_tag(mut self, tag: impl Into<String>) -> Self {
        self.tags.push(tag.into());
        self
    }

    pub fn metadata(mut self, metadata: serde_json::Value) -> Self {
        self.metadata = Some(metadata);
        self
    }

    pub fn overwrite(mut self, overwrite: bool) -> Self {
        self.overwrite = Some(overwrite);
        self
    }

    pub fn filename_override(mut self, filename_override: bool) -> Self {
        self.filename_override = Some(filename_override);
        self
    }

    pub fn expiry(mut self, seconds: u64) -> Self {
        self.expiry = Some(seconds);
        self
    }
}

/// Presigned multipart destination
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PresignedUrl {
    pub url: String,
    /// Echoed into every part form and into the finalize body
    #[serde(default)]
    pub fields: serde_json::Map<String, serde_json::Value>,
}

/// Response of the signed-url endpoint
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SignedUrlResponse {
    pub presigned_url: PresignedUrl,
}

/// Bytes to upload
pub enum UploadSource {
    Buffer(Bytes),
    Stream(BoxStream<'static, std::io::Result<Bytes>>),
}

impl std::fmt::Debug for UploadSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            UploadSource::Buffer(bytes) => f.debug_tuple("Buffer").field(&bytes.len()).finish(),
            UploadSource::Stream(_) => f.write_str("Stream"),
        }
    }
}

impl From<Bytes> for UploadSource {
    fn from(bytes: Bytes) -> Self {
        UploadSource::Buffer(bytes)
    }
}

impl From<Vec<u8>> for UploadSource {
    fn from(bytes: Vec<u8>) -> Self {
        UploadSource::Buffer(Bytes::from(bytes))
    }
}

impl From<BoxStream<'static, std::io::Result<Bytes>>> for UploadSource {
    fn from(stream: BoxStream<'static, std::io::Result<Bytes>>) -> Self {
        UploadSource::Stream(stream)
    }
}
