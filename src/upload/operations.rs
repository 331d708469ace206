//! Upload operations implementation

use crate::error::{PixelbinError, Result};
use crate::platform::assets::Assets;
use crate::upload::session::UploadSession;
use crate::upload::types::{UploadOptions, UploadParams, UploadSource};
use bytes::Bytes;
use futures::stream::{BoxStream, StreamExt};
use serde_json::Value;
use std::path::Path;
use tokio::io::AsyncRead;
use tokio_util::io::ReaderStream;

/// Read size used when streaming from a reader
const READ_BUFFER_SIZE: usize = 1024 * 1024;

/// Chunked multipart uploader
#[derive(Debug, Clone)]
pub struct Uploader {
    assets: Assets,
}

impl Uploader {
    pub fn new(assets: Assets) -> Self {
        Self { assets }
    }

    /// Upload a buffer or stream and return the finalize response
    ///
    /// # Arguments
    ///
    /// * `source` - Bytes to upload
    /// * `params` - Destination name, path and attributes
    /// * `options` - Part size, concurrency and retry tuning
    pub async fn upload(
        &self,
        source: impl Into<UploadSource>,
        params: &UploadParams,
        options: &UploadOptions,
    ) -> Result<Value> {
        let source = source.into();
        let total = match &source {
            UploadSource::Buffer(bytes) => Some(bytes.len()),
            UploadSource::Stream(_) => None,
        };
        self.upload_with_total(source, params, options, total).await
    }

    async fn upload_with_total(
        &self,
        source: UploadSource,
        params: &UploadParams,
        options: &UploadOptions,
        total_bytes: Option<usize>,
    ) -> Result<Value> {
        options.validate()?;

        let presigned = self.assets.create_signed_url_v2(params).await?.presigned_url;
        log::debug!("presigned upload destination {}", presigned.url);

        let mut session = UploadSession::new(
            self.assets.api().transport(),
            presigned,
            options.clone(),
            total_bytes,
        )?;

        match source {
            UploadSource::Buffer(bytes) => session.upload_all(bytes).await,
            UploadSource::Stream(mut chunks) => {
                while let Some(chunk) = chunks.next().await {
                    session.push(&chunk?).await?;
                }
                session.finish().await
            }
        }
    }

    /// Upload everything readable from `reader`
    pub async fn upload_reader<R>(
        &self,
        reader: R,
        params: &UploadParams,
        options: &UploadOptions,
    ) -> Result<Value>
    where
        R: AsyncRead + Unpin + Send + 'static,
    {
        self.upload(reader_stream(reader), params, options).await
    }

    /// Upload a file, streaming it from disk
    pub async fn upload_file(
        &self,
        path: impl AsRef<Path>,
        params: &UploadParams,
        options: &UploadOptions,
    ) -> Result<Value> {
        let path = path.as_ref();
        options.validate()?;

        let file = tokio::fs::File::open(path).await.map_err(|e| {
            PixelbinError::illegal_argument(format!("cannot open {}: {}", path.display(), e))
        })?;
        let file_size = usize::try_from(file.metadata().await?.len()).ok();

        self.upload_with_total(
            UploadSource::Stream(reader_stream(file)),
            params,
            options,
            file_size,
        )
        .await
    }
}

fn reader_stream<R>(reader: R) -> BoxStream<'static, std::io::Result<Bytes>>
where
    R: AsyncRead + Unpin + Send + 'static,
{
    ReaderStream::with_capacity(reader, READ_BUFFER_SIZE).boxed()
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::TryStreamExt;
    use std::io::Cursor;

    #[tokio::test]
    async fn test_reader_stream_yields_all_bytes() {
        let data: Vec<u8> = (0..(READ_BUFFER_SIZE * 2 + 17)).map(|i| i as u8).collect();
        let chunks: Vec<Bytes> = reader_stream(Cursor::new(data.clone()))
            .try_collect()
            .await
            .unwrap();

        assert!(chunks.len() >= 3);
        assert!(chunks.iter().all(|c| c.len() <= READ_BUFFER_SIZE));
        assert_eq!(chunks.concat(), data);
    }

    #[tokio::test]
    async fn test_reader_stream_empty() {
        let chunks: Vec<Bytes> = reader_stream(Cursor::new(Vec::new()))
            .try_collect()
            .await
            .unwrap();
        assert!(chunks.is_empty());
    }
}
