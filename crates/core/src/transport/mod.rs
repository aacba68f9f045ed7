//! Network transport: HTTP connections and pull-based byte sources.
//!
//! - [`tcp`]: one TCP connection per HTTP exchange. Control commands read
//!   a bounded body; the camera stream hands its open-ended body to a
//!   [`ByteSource`].
//!
//! - [`ByteSource`]: the seam between the network and the frame
//!   demultiplexer. Chunks arrive in receipt order with no alignment to
//!   multipart boundaries.

pub mod tcp;

use std::collections::VecDeque;
use std::io::{ErrorKind, Read};

use crate::error::Result;

pub use tcp::{Body, HttpConnection, Socket};

/// Pull-based sequence of binary chunks.
///
/// `next_chunk` suspends until one of:
///
/// - more bytes are available → `Ok(Some(chunk))`, never empty,
/// - the stream ended → `Ok(None)`,
/// - the transport failed → `Err(..)`.
///
/// The returned slice borrows the source, so only one read can be
/// outstanding at a time and the caller must consume the chunk before
/// asking for the next one.
pub trait ByteSource {
    fn next_chunk(&mut self) -> Result<Option<&[u8]>>;
}

/// [`ByteSource`] over any [`Read`], using a reusable read buffer.
///
/// Each chunk is whatever a single `read` call returned; no buffering is
/// added beyond the buffer itself.
pub struct ReaderSource<R> {
    reader: R,
    buf: Vec<u8>,
}

impl<R: Read> ReaderSource<R> {
    pub fn new(reader: R, chunk_size: usize) -> Self {
        Self {
            reader,
            buf: vec![0u8; chunk_size.max(1)],
        }
    }
}

impl<R: Read> ByteSource for ReaderSource<R> {
    fn next_chunk(&mut self) -> Result<Option<&[u8]>> {
        loop {
            match self.reader.read(&mut self.buf) {
                Ok(0) => return Ok(None),
                Ok(n) => {
                    tracing::trace!(bytes = n, "chunk received");
                    return Ok(Some(&self.buf[..n]));
                }
                Err(e) if e.kind() == ErrorKind::Interrupted => continue,
                Err(e) => return Err(tcp::map_io(e, "read stream")),
            }
        }
    }
}

/// In-memory [`ByteSource`] replaying pre-split chunks.
///
/// Empty chunks are skipped so the non-empty guarantee holds.
#[derive(Debug, Default)]
pub struct ChunkSource {
    pending: VecDeque<Vec<u8>>,
    current: Vec<u8>,
}

impl ChunkSource {
    pub fn new<I, C>(chunks: I) -> Self
    where
        I: IntoIterator<Item = C>,
        C: Into<Vec<u8>>,
    {
        Self {
            pending: chunks
                .into_iter()
                .map(Into::into)
                .filter(|chunk: &Vec<u8>| !chunk.is_empty())
                .collect(),
            current: Vec::new(),
        }
    }

    /// Split `data` into chunks of `size` bytes (last one may be shorter).
    pub fn split(data: &[u8], size: usize) -> Self {
        Self::new(data.chunks(size.max(1)).map(<[u8]>::to_vec))
    }

    pub fn remaining(&self) -> usize {
        self.pending.len()
    }
}

impl ByteSource for ChunkSource {
    fn next_chunk(&mut self) -> Result<Option<&[u8]>> {
        match self.pending.pop_front() {
            Some(chunk) => {
                self.current = chunk;
                Ok(Some(&self.current))
            }
            None => Ok(None),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{self, Cursor};

    fn drain(source: &mut impl ByteSource) -> Vec<Vec<u8>> {
        let mut chunks = Vec::new();
        while let Some(chunk) = source.next_chunk().unwrap() {
            chunks.push(chunk.to_vec());
        }
        chunks
    }

    #[test]
    fn chunk_source_preserves_order_and_skips_empty() {
        let mut source = ChunkSource::new(vec![b"ab".to_vec(), Vec::new(), b"c".to_vec()]);
        assert_eq!(source.remaining(), 2);
        assert_eq!(drain(&mut source), vec![b"ab".to_vec(), b"c".to_vec()]);
        assert!(source.next_chunk().unwrap().is_none());
    }

    #[test]
    fn chunk_source_split() {
        let mut source = ChunkSource::split(b"abcdefg", 3);
        assert_eq!(
            drain(&mut source),
            vec![b"abc".to_vec(), b"def".to_vec(), b"g".to_vec()]
        );
    }

    #[test]
    fn reader_source_respects_chunk_size() {
        let mut source = ReaderSource::new(Cursor::new(b"0123456789".to_vec()), 4);
        assert_eq!(
            drain(&mut source),
            vec![b"0123".to_vec(), b"4567".to_vec(), b"89".to_vec()]
        );
    }

    struct Failing;

    impl Read for Failing {
        fn read(&mut self, _: &mut [u8]) -> io::Result<usize> {
            Err(io::Error::new(ErrorKind::ConnectionReset, "reset"))
        }
    }

    #[test]
    fn reader_source_surfaces_transport_failure() {
        let mut source = ReaderSource::new(Failing, 8);
        assert!(source.next_chunk().is_err());
    }
}
