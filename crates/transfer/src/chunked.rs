use std::sync::Arc;

use crate::DEFAULT_CHUNK_SIZE;
use crate::types::Chunk;

/// Splits in-memory file content into fixed-size chunks.
///
/// The reader shares the underlying buffer and copies one chunk at a time,
/// so it is cheap to hand to a streaming request body.
pub struct ChunkReader {
    data: Arc<[u8]>,
    chunk_size: usize,
    offset: usize,
}

impl ChunkReader {
    /// Creates a reader over `data`.
    ///
    /// If `chunk_size` is 0, [`DEFAULT_CHUNK_SIZE`] is used.
    pub fn new(data: Arc<[u8]>, chunk_size: usize) -> Self {
        let chunk_size = if chunk_size == 0 {
            DEFAULT_CHUNK_SIZE
        } else {
            chunk_size
        };
        Self {
            data,
            chunk_size,
            offset: 0,
        }
    }

    /// Current byte offset.
    pub fn offset(&self) -> usize {
        self.offset
    }

    /// Total content size in bytes.
    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Bytes remaining to read.
    pub fn remaining(&self) -> usize {
        self.data.len() - self.offset
    }
}

impl Iterator for ChunkReader {
    type Item = Chunk;

    fn next(&mut self) -> Option<Chunk> {
        if self.remaining() == 0 {
            return None;
        }
        let end = (self.offset + self.chunk_size).min(self.data.len());
        let chunk = Chunk {
            offset: self.offset as u64,
            data: self.data[self.offset..end].to_vec(),
        };
        self.offset = end;
        Some(chunk)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let n = self.remaining().div_ceil(self.chunk_size);
        (n, Some(n))
    }
}
