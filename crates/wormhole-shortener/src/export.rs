use crate::error::ExportError;
use std::fmt::Display;
use std::sync::Arc;
use tokio::io::{AsyncWrite, AsyncWriteExt};
use tracing::debug;
use wormhole_core::{convert_to_protocol, IdCodec, Protocol, ReadRepository, ShortCode};

pub const DEFAULT_BATCH_SIZE: usize = 1000;

/// One active mapping as it appears in a dump.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportLine {
    pub id: u64,
    pub code: ShortCode,
    pub url: String,
}

impl Display for ExportLine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}|{}", self.code, self.url)
    }
}

/// Walks every active mapping in id order, a batch at a time.
pub struct Exporter<R> {
    repository: Arc<R>,
    codec: Arc<IdCodec>,
    protocol: Protocol,
    batch_size: usize,
}

impl<R: ReadRepository> Exporter<R> {
    pub fn new(repository: Arc<R>, codec: Arc<IdCodec>) -> Self {
        Self {
            repository,
            codec,
            protocol: Protocol::Http,
            batch_size: DEFAULT_BATCH_SIZE,
        }
    }

    /// Protocol the stored URLs are expanded to.
    pub fn with_protocol(mut self, protocol: Protocol) -> Self {
        self.protocol = protocol;
        self
    }

    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size.max(1);
        self
    }

    /// The batch following `after_id`. Empty once everything has been read.
    pub async fn next_batch(&self, after_id: u64) -> Result<Vec<ExportLine>, ExportError> {
        let entries = self
            .repository
            .scan_active(after_id, self.batch_size)
            .await?;

        Ok(entries
            .into_iter()
            .map(|entry| ExportLine {
                id: entry.id,
                code: self.codec.encode(entry.id),
                url: convert_to_protocol(&entry.url, self.protocol),
            })
            .collect())
    }

    /// Writes `code|url` lines for every active mapping. Returns the line count.
    pub async fn write_all<W>(&self, out: &mut W) -> Result<usize, ExportError>
    where
        W: AsyncWrite + Unpin + Send,
    {
        let mut after_id = 0;
        let mut written = 0;

        loop {
            let batch = self.next_batch(after_id).await?;
            let Some(last) = batch.last() else {
                break;
            };
            after_id = last.id;

            let mut chunk = String::new();
            for line in &batch {
                chunk.push_str(&line.to_string());
                chunk.push('\n');
            }
            out.write_all(chunk.as_bytes()).await?;

            written += batch.len();
            debug!(written, after_id, "exported batch");
        }

        out.flush().await?;
        Ok(written)
    }
}
