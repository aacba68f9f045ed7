/// Media type assumed when a part carries no `Content-Type`.
pub const DEFAULT_MEDIA_TYPE: &str = "image/jpeg";

/// One finalized image payload: a multipart part with its boundary marker
/// and header block removed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    /// 1-based emission order within a stream.
    pub seq: u64,
    /// The part's `Content-Type`, when it declared one.
    pub content_type: Option<String>,
    pub data: Vec<u8>,
}

impl Frame {
    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Media type to present the frame as.
    pub fn media_type(&self) -> &str {
        self.content_type.as_deref().unwrap_or(DEFAULT_MEDIA_TYPE)
    }
}

/// Header fields of one multipart part (RFC 2046 §5.1.1).
///
/// Only the fields that affect framing are kept. Unknown headers and lines
/// without a colon are skipped.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct PartHeaders {
    pub content_type: Option<String>,
    pub content_length: Option<usize>,
}

impl PartHeaders {
    /// Parse a header block (lines separated by CRLF or bare LF).
    pub fn parse(block: &[u8]) -> Self {
        let mut headers = PartHeaders::default();

        for line in block.split(|&b| b == b'\n') {
            let line = String::from_utf8_lossy(line);
            let line = line.trim_end_matches('\r');
            let Some((name, value)) = line.split_once(':') else {
                if !line.trim().is_empty() {
                    tracing::trace!(line, "skipping part header without colon");
                }
                continue;
            };

            let name = name.trim();
            let value = value.trim();
            if name.eq_ignore_ascii_case("Content-Type") {
                headers.content_type = Some(value.to_string());
            } else if name.eq_ignore_ascii_case("Content-Length") {
                headers.content_length = value.parse().ok();
            }
        }

        headers
    }
}

/// Split a complete part (bytes between two boundary markers) into its
/// headers and payload.
///
/// ```text
/// [padding]\r\n                 ← rest of the boundary line
/// Content-Type: image/jpeg\r\n
/// Content-Length: 8\r\n
/// \r\n                          ← header/body separator
/// <payload>[\r\n]               ← CRLF belongs to the next delimiter
/// ```
///
/// Returns `None` when the blank-line separator is missing. The payload is
/// `Content-Length` bytes when that header fits the available data;
/// otherwise a single trailing line break is dropped, matching the line
/// endings the part itself uses: after CRLF headers only a final `\r\n`
/// is taken as the delimiter's, so a payload ending in a bare `\n` is kept
/// whole. A payload that itself ends in `\r\n` with no delimiter CRLF
/// after it cannot be told apart and loses those two bytes; producers
/// that need exact bytes send `Content-Length`.
pub fn split_part(part: &[u8]) -> Option<(PartHeaders, &[u8])> {
    let rest = skip_boundary_line(part);

    let (block, body, crlf) = if let Some(after) = rest.strip_prefix(b"\r\n") {
        (&rest[..0], after, true)
    } else if let Some(after) = rest.strip_prefix(b"\n") {
        (&rest[..0], after, false)
    } else {
        let end = find_header_end(rest)?;
        (&rest[..end.block], &rest[end.body..], end.crlf)
    };

    let headers = PartHeaders::parse(block);
    let payload = match headers.content_length {
        Some(len) if len <= body.len() => &body[..len],
        _ => strip_trailing_line_break(body, crlf),
    };

    Some((headers, payload))
}

/// Skip transport padding after the marker and the line break ending it.
fn skip_boundary_line(part: &[u8]) -> &[u8] {
    let padding = part
        .iter()
        .take_while(|&&b| b == b' ' || b == b'\t')
        .count();
    let rest = &part[padding..];
    rest.strip_prefix(b"\r\n")
        .or_else(|| rest.strip_prefix(b"\n"))
        .unwrap_or(rest)
}

fn strip_trailing_line_break(bytes: &[u8], crlf: bool) -> &[u8] {
    match bytes.strip_suffix(b"\r\n") {
        Some(stripped) => stripped,
        None if !crlf => bytes.strip_suffix(b"\n").unwrap_or(bytes),
        None => bytes,
    }
}

/// Where the header block ends and the payload starts.
#[derive(Debug, PartialEq, Eq)]
struct HeaderEnd {
    block: usize,
    body: usize,
    /// The separator's blank line is `\r\n`.
    crlf: bool,
}

/// Find the first line feed that is followed by another line break
/// (`\n\n`, `\r\n\r\n` or a mix), in one forward pass.
fn find_header_end(bytes: &[u8]) -> Option<HeaderEnd> {
    let mut from = 0;
    while let Some(offset) = bytes[from..].iter().position(|&b| b == b'\n') {
        let lf = from + offset;
        let block = if lf > 0 && bytes[lf - 1] == b'\r' { lf - 1 } else { lf };
        let next = &bytes[lf + 1..];
        if next.starts_with(b"\n") {
            return Some(HeaderEnd { block, body: lf + 2, crlf: false });
        }
        if next.starts_with(b"\r\n") {
            return Some(HeaderEnd { block, body: lf + 3, crlf: true });
        }
        from = lf + 1;
    }
    None
}
