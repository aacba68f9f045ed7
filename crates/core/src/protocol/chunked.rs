use std::io::{self, BufRead, Read};

/// Longest chunk-size line accepted, extensions included.
const MAX_SIZE_LINE: usize = 1024;

/// Decoder for `Transfer-Encoding: chunked` bodies (RFC 9112 §7.1).
///
/// ```text
/// 1a;ext=1\r\n          ← hex size, optional extensions (ignored)
/// <26 bytes>\r\n
/// 0\r\n                 ← last chunk
/// Trailer: value\r\n    ← optional trailers (discarded)
/// \r\n
/// ```
///
/// Implements [`Read`] so the decoded body can be drained like any other
/// byte stream. Reads never cross a chunk boundary, which keeps each read
/// aligned with what the server flushed.
pub struct ChunkedReader<R> {
    inner: R,
    /// Bytes left in the current chunk.
    remaining: u64,
    done: bool,
}

impl<R: BufRead> ChunkedReader<R> {
    pub fn new(inner: R) -> Self {
        Self {
            inner,
            remaining: 0,
            done: false,
        }
    }

    pub fn get_mut(&mut self) -> &mut R {
        &mut self.inner
    }

    fn read_line(&mut self) -> io::Result<String> {
        let mut line = String::new();
        let n = (&mut self.inner)
            .take(MAX_SIZE_LINE as u64)
            .read_line(&mut line)?;
        if n == 0 {
            return Err(io::Error::new(
                io::ErrorKind::UnexpectedEof,
                "chunked body ended mid-frame",
            ));
        }
        if !line.ends_with('\n') {
            return Err(invalid("chunk line too long"));
        }
        Ok(line)
    }

    /// Read the next size line. Returns 0 for the last chunk.
    fn next_chunk_size(&mut self) -> io::Result<u64> {
        let line = self.read_line()?;
        let size = line
            .trim_end()
            .split(';')
            .next()
            .unwrap_or_default()
            .trim();
        u64::from_str_radix(size, 16).map_err(|_| invalid("invalid chunk size"))
    }

    fn expect_crlf(&mut self) -> io::Result<()> {
        let line = self.read_line()?;
        if line.trim_end_matches(['\r', '\n']).is_empty() {
            Ok(())
        } else {
            Err(invalid("missing CRLF after chunk data"))
        }
    }

    fn skip_trailers(&mut self) -> io::Result<()> {
        loop {
            let line = self.read_line()?;
            if line == "\r\n" || line == "\n" {
                return Ok(());
            }
        }
    }
}

impl<R: BufRead> Read for ChunkedReader<R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        if self.done || buf.is_empty() {
            return Ok(0);
        }

        if self.remaining == 0 {
            let size = self.next_chunk_size()?;
            if size == 0 {
                self.skip_trailers()?;
                self.done = true;
                tracing::trace!("chunked body complete");
                return Ok(0);
            }
            self.remaining = size;
        }

        let max = self.remaining.min(buf.len() as u64) as usize;
        let n = self.inner.read(&mut buf[..max])?;
        if n == 0 {
            return Err(io::Error::new(
                io::ErrorKind::UnexpectedEof,
                "chunked body ended mid-chunk",
            ));
        }

        self.remaining -= n as u64;
        if self.remaining == 0 {
            self.expect_crlf()?;
        }
        Ok(n)
    }
}

fn invalid(message: &'static str) -> io::Error {
    io::Error::new(io::ErrorKind::InvalidData, message)
}
