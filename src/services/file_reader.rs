use bytes::Bytes;
use std::io::SeekFrom;
use std::path::Path;
use tokio::io::{AsyncReadExt, AsyncSeekExt};

/// Inclusive byte range `[start, end]` within a file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ByteRange {
    pub start: u64,
    pub end: u64,
}

impl ByteRange {
    pub fn size(&self) -> u64 {
        self.end - self.start + 1
    }
}

pub async fn read_range(path: &Path, range: ByteRange) -> std::io::Result<Bytes> {
    let mut file = tokio::fs::File::open(path).await?;
    file.seek(SeekFrom::Start(range.start)).await?;
    let len = usize::try_from(range.size()).map_err(|_| {
        std::io::Error::new(std::io::ErrorKind::InvalidInput, "byte range too large")
    })?;
    let mut buffer = vec![0u8; len];
    file.read_exact(&mut buffer).await?;
    Ok(Bytes::from(buffer))
}
