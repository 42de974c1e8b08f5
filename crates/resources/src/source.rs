//! Chunked payload sources.
//!
//! The loader pulls a payload one chunk at a time so it can report progress
//! and yield between chunks. Local paths stream through `tokio::fs`, URLs
//! through `reqwest`.

use std::io::ErrorKind;
use std::path::Path;

use async_trait::async_trait;
use tokio::io::AsyncReadExt;

use crate::{LoadError, LoadResult};

/// A payload delivered in chunks.
#[async_trait]
pub trait AssetStream: Send {
    /// Total payload size, when the source knows it.
    fn total_len(&self) -> Option<u64>;

    /// Next chunk, or `None` at end of stream.
    async fn next_chunk(&mut self) -> LoadResult<Option<Vec<u8>>>;
}

/// Open `uri` as a stream: `http://`/`https://` URLs are fetched, anything
/// else is treated as a local path.
pub async fn open(uri: &str, chunk_size: usize) -> LoadResult<Box<dyn AssetStream>> {
    if uri.starts_with("http://") || uri.starts_with("https://") {
        Ok(Box::new(HttpStream::open(uri).await?))
    } else {
        Ok(Box::new(FileStream::open(uri, chunk_size).await?))
    }
}

/// Local file read in fixed-size chunks.
pub struct FileStream {
    uri: String,
    file: tokio::fs::File,
    total: u64,
    buf: Vec<u8>,
}

impl FileStream {
    pub async fn open(uri: &str, chunk_size: usize) -> LoadResult<Self> {
        let path = Path::new(uri);
        let io_error = |source: std::io::Error| {
            if source.kind() == ErrorKind::NotFound {
                LoadError::FileNotFound(path.to_path_buf())
            } else {
                LoadError::Io {
                    uri: uri.to_string(),
                    source,
                }
            }
        };

        let file = tokio::fs::File::open(path).await.map_err(io_error)?;
        let total = file.metadata().await.map_err(io_error)?.len();

        Ok(Self {
            uri: uri.to_string(),
            file,
            total,
            buf: vec![0; chunk_size.max(1)],
        })
    }
}

#[async_trait]
impl AssetStream for FileStream {
    fn total_len(&self) -> Option<u64> {
        Some(self.total)
    }

    async fn next_chunk(&mut self) -> LoadResult<Option<Vec<u8>>> {
        let read = self
            .file
            .read(&mut self.buf)
            .await
            .map_err(|source| LoadError::Io {
                uri: self.uri.clone(),
                source,
            })?;
        Ok((read > 0).then(|| self.buf[..read].to_vec()))
    }
}

/// Remote payload streamed from an HTTP response body.
pub struct HttpStream {
    uri: String,
    response: reqwest::Response,
}

impl HttpStream {
    pub async fn open(uri: &str) -> LoadResult<Self> {
        let http_error = |e: reqwest::Error| LoadError::Http {
            uri: uri.to_string(),
            message: e.to_string(),
        };

        let response = reqwest::get(uri)
            .await
            .map_err(http_error)?
            .error_for_status()
            .map_err(http_error)?;

        Ok(Self {
            uri: uri.to_string(),
            response,
        })
    }
}

#[async_trait]
impl AssetStream for HttpStream {
    /// `Content-Length`, absent for chunked or compressed transfers.
    fn total_len(&self) -> Option<u64> {
        self.response.content_length()
    }

    async fn next_chunk(&mut self) -> LoadResult<Option<Vec<u8>>> {
        let chunk = self.response.chunk().await.map_err(|e| LoadError::Http {
            uri: self.uri.clone(),
            message: e.to_string(),
        })?;
        Ok(chunk.map(|bytes| bytes.to_vec()))
    }
}

/// In-memory payload, for embedded assets.
pub struct MemoryStream {
    data: Vec<u8>,
    pos: usize,
    chunk_size: usize,
    report_total: bool,
}

impl MemoryStream {
    /// Stream that reports its total size.
    pub fn new(data: Vec<u8>, chunk_size: usize) -> Self {
        Self {
            data,
            pos: 0,
            chunk_size: chunk_size.max(1),
            report_total: true,
        }
    }

    /// Stream that hides its total size, like a chunked HTTP body.
    pub fn without_total(data: Vec<u8>, chunk_size: usize) -> Self {
        Self {
            report_total: false,
            ..Self::new(data, chunk_size)
        }
    }
}

#[async_trait]
impl AssetStream for MemoryStream {
    fn total_len(&self) -> Option<u64> {
        self.report_total.then_some(self.data.len() as u64)
    }

    async fn next_chunk(&mut self) -> LoadResult<Option<Vec<u8>>> {
        if self.pos >= self.data.len() {
            return Ok(None);
        }
        let end = (self.pos + self.chunk_size).min(self.data.len());
        let chunk = self.data[self.pos..end].to_vec();
        self.pos = end;
        Ok(Some(chunk))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_memory_stream_chunks() {
        let mut stream = MemoryStream::new(vec![1, 2, 3, 4, 5], 2);
        assert_eq!(stream.total_len(), Some(5));
        assert_eq!(stream.next_chunk().await.unwrap(), Some(vec![1, 2]));
        assert_eq!(stream.next_chunk().await.unwrap(), Some(vec![3, 4]));
        assert_eq!(stream.next_chunk().await.unwrap(), Some(vec![5]));
        assert_eq!(stream.next_chunk().await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_memory_stream_without_total() {
        let stream = MemoryStream::without_total(vec![0; 10], 4);
        assert_eq!(stream.total_len(), None);
    }

    #[tokio::test]
    async fn test_missing_file() {
        let result = open("definitely/not/here.glb", 1024).await;
        assert!(matches!(result, Err(LoadError::FileNotFound(_))));
    }
}
