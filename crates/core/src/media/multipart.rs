//! Streaming `multipart/x-mixed-replace` demultiplexer.
//!
//! An MJPEG-over-HTTP camera answers with one endless response body:
//!
//! ```text
//! --frame\r\n
//! Content-Type: image/jpeg\r\n
//! \r\n
//! <JPEG bytes>\r\n
//! --frame\r\n
//! Content-Type: image/jpeg\r\n
//! \r\n
//! <JPEG bytes>\r\n
//! ...
//! ```
//!
//! There is no length prefix, and the network splits the body into chunks
//! with no regard for markers or images. [`FrameDemuxer`] therefore scans
//! byte by byte with a prefix-function (KMP) matcher whose state survives
//! across chunks: a marker split over any number of reads is still found,
//! and no byte is examined twice.
//!
//! A part is only known to be complete when the *next* marker arrives, so
//! frames are emitted one marker late and the trailing part of a stream
//! that ends without a marker is discarded.

use std::sync::atomic::{AtomicBool, Ordering};

use crate::config::DEFAULT_MAX_PART_SIZE;
use crate::error::{Result, StreamErrorKind, TeleopError};
use crate::media::frame::{Frame, split_part};
use crate::transport::ByteSource;

/// Why a consume loop returned without error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamEnd {
    /// The byte source reported end of stream.
    EndOfStream,
    /// The closing delimiter (`--frame--`) was seen.
    Closed,
    /// The running flag was cleared.
    Cancelled,
}

/// Running totals for one stream.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct DemuxStats {
    /// Bytes received, markers and headers included.
    pub bytes: u64,
    pub frames: u64,
    /// Parts that carried no payload and were skipped.
    pub empty_parts: u64,
    /// Parts with no blank line after their headers, skipped.
    pub malformed_parts: u64,
}

/// Reconstructs frames from an arbitrarily chunked multipart byte stream.
///
/// Two logical states:
///
/// - **Awaiting boundary**: every byte is appended to the accumulator while
///   the matcher advances.
/// - **Emitting**: on a full marker match, the accumulated part (minus the
///   marker) is split into headers and payload, a non-empty payload is
///   emitted, and the accumulator is cleared before scanning resumes.
///
/// Bytes before the first marker are a preamble and are never buffered.
/// A complete part without a header separator is counted and skipped. The
/// accumulator is bounded by `max_part_size`; a stream that exceeds it
/// without producing a marker is rejected as malformed.
#[derive(Debug)]
pub struct FrameDemuxer {
    /// `--` + boundary.
    marker: Vec<u8>,
    /// KMP prefix function of `marker`.
    fallback: Vec<usize>,
    /// Marker bytes matched so far, possibly carried over from the previous chunk.
    matched: usize,
    accumulator: Vec<u8>,
    /// Set once the first marker has been seen.
    in_part: bool,
    preamble: usize,
    closed: bool,
    max_part_size: usize,
    stats: DemuxStats,
}

impl FrameDemuxer {
    /// Create a demuxer for `boundary` as named in the `Content-Type`
    /// header (without the leading `--`).
    pub fn new(boundary: &str) -> Self {
        let mut marker = b"--".to_vec();
        marker.extend_from_slice(boundary.as_bytes());
        let fallback = prefix_function(&marker);

        Self {
            marker,
            fallback,
            matched: 0,
            accumulator: Vec::new(),
            in_part: false,
            preamble: 0,
            closed: false,
            max_part_size: DEFAULT_MAX_PART_SIZE,
            stats: DemuxStats::default(),
        }
    }

    pub fn with_max_part_size(mut self, max_part_size: usize) -> Self {
        self.max_part_size = max_part_size;
        self
    }

    /// The byte sequence being scanned for.
    pub fn marker(&self) -> &[u8] {
        &self.marker
    }

    pub fn stats(&self) -> DemuxStats {
        self.stats
    }

    /// Whether the closing delimiter has been seen.
    pub fn is_closed(&self) -> bool {
        self.closed
    }

    /// Bytes currently held for the unfinished part.
    pub fn buffered(&self) -> usize {
        self.accumulator.len()
    }

    /// Feed one chunk, calling `emit` for every frame it completes, in order.
    ///
    /// An error from `emit` stops processing and is returned as-is.
    pub fn push<F>(&mut self, chunk: &[u8], mut emit: F) -> Result<()>
    where
        F: FnMut(Frame) -> Result<()>,
    {
        if self.closed {
            return Ok(());
        }
        self.stats.bytes += chunk.len() as u64;

        let mut start = 0;
        for (i, &byte) in chunk.iter().enumerate() {
            while self.matched > 0 && byte != self.marker[self.matched] {
                self.matched = self.fallback[self.matched - 1];
            }
            if byte == self.marker[self.matched] {
                self.matched += 1;
            }
            if self.matched < self.marker.len() {
                continue;
            }

            self.matched = 0;
            self.append(&chunk[start..=i])?;
            start = i + 1;
            self.on_boundary(&mut emit)?;
            if self.closed {
                return Ok(());
            }
        }

        self.append(&chunk[start..])?;
        if self.closed {
            self.matched = 0;
        }
        Ok(())
    }

    /// Feed one chunk and collect the frames it completes.
    pub fn feed(&mut self, chunk: &[u8]) -> Result<Vec<Frame>> {
        let mut frames = Vec::new();
        self.push(chunk, |frame| {
            frames.push(frame);
            Ok(())
        })?;
        Ok(frames)
    }

    /// Drain `source` until it ends, the stream closes, `running` is
    /// cleared, or an error occurs.
    ///
    /// `running` is checked before every read. Whatever is left in the
    /// accumulator when the loop stops is discarded, never emitted.
    pub fn run<S, F>(&mut self, source: &mut S, running: &AtomicBool, mut emit: F) -> Result<StreamEnd>
    where
        S: ByteSource + ?Sized,
        F: FnMut(Frame) -> Result<()>,
    {
        let end = loop {
            if !running.load(Ordering::SeqCst) {
                break StreamEnd::Cancelled;
            }
            let Some(chunk) = source.next_chunk()? else {
                break StreamEnd::EndOfStream;
            };
            self.push(chunk, &mut emit)?;
            if self.closed {
                break StreamEnd::Closed;
            }
        };

        self.discard();
        tracing::debug!(
            ?end,
            bytes = self.stats.bytes,
            frames = self.stats.frames,
            "demuxer stopped"
        );
        Ok(end)
    }

    /// Drop any partial part and matcher state.
    pub fn discard(&mut self) {
        if !self.accumulator.is_empty() {
            tracing::debug!(bytes = self.accumulator.len(), "discarding partial part");
        }
        self.accumulator.clear();
        self.matched = 0;
    }

    fn append(&mut self, bytes: &[u8]) -> Result<()> {
        if self.closed || bytes.is_empty() {
            return Ok(());
        }

        if !self.in_part {
            self.preamble += bytes.len();
            if self.preamble > self.max_part_size {
                return Err(self.too_large());
            }
            return Ok(());
        }

        self.accumulator.extend_from_slice(bytes);
        if self.accumulator.starts_with(b"--") {
            tracing::debug!("closing delimiter");
            self.closed = true;
            self.accumulator.clear();
            return Ok(());
        }
        if self.accumulator.len() > self.max_part_size {
            return Err(self.too_large());
        }
        Ok(())
    }

    fn too_large(&self) -> TeleopError {
        TeleopError::MalformedStream {
            kind: StreamErrorKind::PartTooLarge {
                limit: self.max_part_size,
            },
        }
    }

    /// A full marker has just been appended to the accumulator.
    fn on_boundary<F>(&mut self, emit: &mut F) -> Result<()>
    where
        F: FnMut(Frame) -> Result<()>,
    {
        if self.closed {
            return Ok(());
        }
        if !self.in_part {
            tracing::trace!(preamble = self.preamble, "first boundary");
            self.in_part = true;
            return Ok(());
        }

        let part_len = self.accumulator.len().saturating_sub(self.marker.len());
        let frame = self.finalize(part_len);
        self.accumulator.clear();

        match frame? {
            Some(frame) => {
                tracing::trace!(seq = frame.seq, bytes = frame.len(), "frame");
                emit(frame)
            }
            None => Ok(()),
        }
    }

    fn finalize(&mut self, part_len: usize) -> Result<Option<Frame>> {
        let part = &self.accumulator[..part_len];
        if part.iter().all(u8::is_ascii_whitespace) {
            self.stats.empty_parts += 1;
            return Ok(None);
        }

        let Some((headers, payload)) = split_part(part) else {
            self.stats.malformed_parts += 1;
            tracing::warn!(
                bytes = part_len,
                skipped = self.stats.malformed_parts,
                "part header separator not found, skipping part"
            );
            return Ok(None);
        };

        if payload.is_empty() {
            tracing::debug!("skipping part with empty payload");
            self.stats.empty_parts += 1;
            return Ok(None);
        }

        self.stats.frames += 1;
        Ok(Some(Frame {
            seq: self.stats.frames,
            content_type: headers.content_type,
            data: payload.to_vec(),
        }))
    }
}

/// KMP prefix function: `pi[i]` is the length of the longest proper prefix
/// of `pattern[..=i]` that is also its suffix.
fn prefix_function(pattern: &[u8]) -> Vec<usize> {
    let mut pi = vec![0; pattern.len()];
    let mut k = 0;
    for i in 1..pattern.len() {
        while k > 0 && pattern[i] != pattern[k] {
            k = pi[k - 1];
        }
        if pattern[i] == pattern[k] {
            k += 1;
        }
        pi[i] = k;
    }
    pi
}
