use crate::error::{ParseErrorKind, TeleopError};

/// Boundary assumed when a multipart response does not name one.
pub const DEFAULT_BOUNDARY: &str = "frame";

/// A parsed HTTP/1.1 response head (RFC 9112 §4).
///
/// ```text
/// HTTP/1.1 200 OK\r\n
/// Content-Type: multipart/x-mixed-replace; boundary=frame\r\n
/// \r\n
/// ```
///
/// Header lookup is case-insensitive (RFC 9110 §5.1). The body is not part
/// of the head; [`crate::transport::tcp::HttpConnection`] decides how to
/// frame it from [`content_length`](Self::content_length) and
/// [`is_chunked`](Self::is_chunked).
#[derive(Debug)]
pub struct ResponseHead {
    /// Protocol version (e.g. `HTTP/1.1`).
    pub version: String,
    /// Status code.
    pub status: u16,
    /// Reason phrase, possibly empty.
    pub reason: String,
    /// Headers as ordered (name, value) pairs. Names are stored as-received;
    /// lookups via [`get_header`](Self::get_header) are case-insensitive.
    pub headers: Vec<(String, String)>,
}

impl ResponseHead {
    /// Parse a response head from its text representation.
    ///
    /// Expects the status line and header lines, optionally followed by the
    /// terminating blank line. Returns [`TeleopError::Parse`] on malformed
    /// input.
    pub fn parse(raw: &str) -> crate::error::Result<Self> {
        let mut lines = raw.lines();

        let status_line = lines
            .next()
            .filter(|line| !line.trim().is_empty())
            .ok_or(TeleopError::Parse {
                kind: ParseErrorKind::EmptyResponse,
            })?;

        let mut parts = status_line.splitn(3, ' ');
        let version = parts.next().unwrap_or_default();
        let status = parts.next().and_then(|code| code.parse::<u16>().ok());

        let status = match status {
            Some(code) if version.starts_with("HTTP/") => code,
            _ => {
                return Err(TeleopError::Parse {
                    kind: ParseErrorKind::InvalidStatusLine,
                });
            }
        };
        let reason = parts.next().unwrap_or_default().trim().to_string();

        let mut headers = Vec::new();

        for line in lines {
            if line.is_empty() {
                break;
            }

            let colon_pos = line.find(':').ok_or(TeleopError::Parse {
                kind: ParseErrorKind::InvalidHeader,
            })?;

            let name = line[..colon_pos].trim().to_string();
            let value = line[colon_pos + 1..].trim().to_string();

            headers.push((name, value));
        }

        Ok(ResponseHead {
            version: version.to_string(),
            status,
            reason,
            headers,
        })
    }

    /// Look up a header value by name (case-insensitive).
    pub fn get_header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Declared body length, if any.
    pub fn content_length(&self) -> Option<u64> {
        self.get_header("Content-Length")
            .and_then(|value| value.parse().ok())
    }

    /// Whether the body uses `Transfer-Encoding: chunked`.
    pub fn is_chunked(&self) -> bool {
        self.get_header("Transfer-Encoding")
            .is_some_and(|value| {
                value
                    .rsplit(',')
                    .next()
                    .is_some_and(|last| last.trim().eq_ignore_ascii_case("chunked"))
            })
    }

    pub fn content_type(&self) -> Option<&str> {
        self.get_header("Content-Type")
    }

    /// Multipart boundary from the `Content-Type` header (RFC 2046 §5.1.1).
    ///
    /// Returns `None` when the response is not `multipart/*`. A multipart
    /// type without a `boundary` parameter falls back to
    /// [`DEFAULT_BOUNDARY`]. Quotes are stripped, and a leading `--` that
    /// some servers include in the parameter is tolerated.
    pub fn boundary(&self) -> Option<String> {
        let content_type = self.content_type()?;
        let mut params = content_type.split(';');
        let media_type = params.next()?.trim();
        if !media_type
            .get(..10)
            .is_some_and(|prefix| prefix.eq_ignore_ascii_case("multipart/"))
        {
            return None;
        }

        let boundary = params
            .filter_map(|param| param.split_once('='))
            .find(|(name, _)| name.trim().eq_ignore_ascii_case("boundary"))
            .map(|(_, value)| value.trim().trim_matches('"'))
            .map(|value| value.strip_prefix("--").unwrap_or(value))
            .filter(|value| !value.is_empty())
            .unwrap_or(DEFAULT_BOUNDARY);

        Some(boundary.to_string())
    }
}
