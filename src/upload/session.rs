//! Multipart upload session
//!
//! A session owns the accumulation buffer and the part counter for a single
//! upload. Bytes are sliced off the front of the buffer in `chunk_size` parts;
//! whenever `chunk_size * concurrency` bytes are buffered, one batch of
//! `concurrency` parts is uploaded concurrently. Part numbers follow byte order.

use crate::error::{PixelbinError, Result};
use crate::platform::transport::Transport;
use crate::retry::RetryPolicy;
use crate::upload::chunks::{complete_upload, upload_part};
use crate::upload::types::{PresignedUrl, UploadOptions, UploadProgress};
use bytes::{Bytes, BytesMut};
use bytesize::ByteSize;
use futures::future::try_join_all;
use serde_json::{Map, Value};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use url::Url;

pub struct UploadSession {
    transport: Arc<dyn Transport>,
    url: Url,
    fields: Map<String, Value>,
    options: UploadOptions,
    policy: RetryPolicy,
    buffer: BytesMut,
    part_number: u32,
    total_bytes: Option<usize>,
    bytes_uploaded: AtomicUsize,
    parts_uploaded: AtomicUsize,
}

impl UploadSession {
    pub fn new(
        transport: Arc<dyn Transport>,
        presigned: PresignedUrl,
        options: UploadOptions,
        total_bytes: Option<usize>,
    ) -> Result<Self> {
        options.validate()?;
        let url = Url::parse(&presigned.url)?;
        let policy = RetryPolicy::new(options.max_retries).factor(options.exponential_factor);

        Ok(Self {
            transport,
            url,
            fields: presigned.fields,
            options,
            policy,
            buffer: BytesMut::new(),
            part_number: 0,
            total_bytes,
            bytes_uploaded: AtomicUsize::new(0),
            parts_uploaded: AtomicUsize::new(0),
        })
    }

    /// Parts numbered so far
    pub fn part_count(&self) -> u32 {
        self.part_number
    }

    /// Bytes accepted but not yet assigned to a part
    pub fn buffered(&self) -> usize {
        self.buffer.len()
    }

    fn number_part(&mut self, data: Bytes) -> Result<(u32, Bytes)> {
        self.part_number = self
            .part_number
            .checked_add(1)
            .ok_or_else(|| PixelbinError::illegal_argument("too many parts"))?;
        Ok((self.part_number, data))
    }

    fn next_part(&mut self, len: usize) -> Result<(u32, Bytes)> {
        let data = self.buffer.split_to(len).freeze();
        self.number_part(data)
    }

    /// Append bytes and upload every full batch they complete
    pub async fn push(&mut self, data: &[u8]) -> Result<()> {
        self.buffer.extend_from_slice(data);

        let chunk_size = self.options.chunk_size;
        let batch_bytes = chunk_size.saturating_mul(self.options.concurrency);
        while self.buffer.len() >= batch_bytes {
            let parts = (0..self.options.concurrency)
                .map(|_| self.next_part(chunk_size))
                .collect::<Result<Vec<_>>>()?;
            self.upload_batch(parts).await?;
        }
        Ok(())
    }

    /// Upload a whole in-memory buffer, then complete the upload
    ///
    /// Parts are sliced from `data` without copying it into the session buffer.
    pub async fn upload_all(mut self, mut data: Bytes) -> Result<Value> {
        if !self.buffer.is_empty() {
            self.push(&data).await?;
            return self.finish().await;
        }

        let mut parts = Vec::new();
        while !data.is_empty() {
            let len = self.options.chunk_size.min(data.len());
            parts.push(self.number_part(data.split_to(len))?);
        }
        self.upload_in_batches(parts).await?;
        self.complete().await
    }

    /// Upload the buffered remainder, then complete the upload
    pub async fn finish(mut self) -> Result<Value> {
        let mut remainder = Vec::new();
        while !self.buffer.is_empty() {
            let len = self.options.chunk_size.min(self.buffer.len());
            remainder.push(self.next_part(len)?);
        }
        self.upload_in_batches(remainder).await?;
        self.complete().await
    }

    async fn upload_in_batches(&self, parts: Vec<(u32, Bytes)>) -> Result<()> {
        let mut parts = parts.into_iter().peekable();
        while parts.peek().is_some() {
            let batch: Vec<_> = parts.by_ref().take(self.options.concurrency).collect();
            self.upload_batch(batch).await?;
        }
        Ok(())
    }

    async fn complete(self) -> Result<Value> {
        log::debug!("completing upload with {} parts", self.part_number);
        let response = complete_upload(
            self.transport.as_ref(),
            &self.url,
            &self.fields,
            self.part_number,
            &self.policy,
        )
        .await?;
        log::info!(
            "upload complete: {} in {} parts",
            ByteSize::b(self.bytes_uploaded.load(Ordering::SeqCst) as u64),
            self.part_number
        );
        Ok(response)
    }

    async fn upload_batch(&self, parts: Vec<(u32, Bytes)>) -> Result<()> {
        let uploads = parts.into_iter().map(|(part_number, data)| async move {
            let len = data.len();
            log::debug!("uploading part {} ({})", part_number, ByteSize::b(len as u64));
            upload_part(
                self.transport.as_ref(),
                &self.url,
                &self.fields,
                part_number,
                data,
                &self.policy,
            )
            .await?;
            self.report(part_number, len);
            Ok::<_, PixelbinError>(())
        });
        try_join_all(uploads).await?;
        Ok(())
    }

    fn report(&self, part_number: u32, len: usize) {
        let bytes = self.bytes_uploaded.fetch_add(len, Ordering::SeqCst) + len;
        let parts = self.parts_uploaded.fetch_add(1, Ordering::SeqCst) + 1;
        if let Some(callback) = &self.options.on_progress {
            callback(UploadProgress::new_part(
                bytes,
                self.total_bytes,
                parts,
                part_number,
            ));
        }
    }
}

impl std::fmt::Debug for UploadSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UploadSession")
            .field("url", &self.url.as_str())
            .field("part_number", &self.part_number)
            .field("buffered", &self.buffer.len())
            .field("options", &self.options)
            .finish()
    }
}
