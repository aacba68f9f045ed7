//! Error types for the tele-operation client.

use std::fmt;

/// Errors that can occur in the tele-operation client.
///
/// Variants map to specific failure modes across the stack:
///
/// - **Transport**: [`Io`](Self::Io), [`Timeout`](Self::Timeout),
///   [`InvalidAddress`](Self::InvalidAddress): socket/network failures.
/// - **Wire**: [`Parse`](Self::Parse): malformed HTTP response heads.
/// - **Controller**: [`BadRequest`](Self::BadRequest),
///   [`NotFound`](Self::NotFound),
///   [`PreconditionFailed`](Self::PreconditionFailed),
///   [`InternalServer`](Self::InternalServer),
///   [`Unexpected`](Self::Unexpected): non-success HTTP status codes.
/// - **Camera stream**: [`MalformedStream`](Self::MalformedStream),
///   [`ObserverGone`](Self::ObserverGone).
/// - **Session**: [`AlreadyRunning`](Self::AlreadyRunning).
#[derive(Debug, thiserror::Error)]
pub enum TeleopError {
    /// Underlying I/O or socket error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A control request exceeded its client-side deadline.
    #[error("request timed out: {0}")]
    Timeout(String),

    /// The controller address did not resolve to any socket address.
    #[error("invalid controller address: {0}")]
    InvalidAddress(String),

    /// Failed to parse an HTTP response head.
    #[error("HTTP parse error: {kind}")]
    Parse { kind: ParseErrorKind },

    /// 400 Bad Request.
    #[error("bad request: {0}")]
    BadRequest(String),

    /// 404 Not Found.
    #[error("not found: {0}")]
    NotFound(String),

    /// 412 Precondition Failed.
    #[error("precondition failed: {0}")]
    PreconditionFailed(String),

    /// 500 Internal Server Error.
    #[error("internal server error: {0}")]
    InternalServer(String),

    /// Any other non-success status.
    #[error("unexpected status {status}: {body}")]
    Unexpected { status: u16, body: String },

    /// Request or response body was not valid JSON for the expected shape.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// The multipart camera stream violated its framing.
    #[error("malformed camera stream: {kind}")]
    MalformedStream { kind: StreamErrorKind },

    /// The frame observer hung up; nobody is left to display frames.
    #[error("frame observer disconnected")]
    ObserverGone,

    /// [`CameraSession::start`](crate::camera::CameraSession::start) was
    /// called while a session was already streaming.
    #[error("camera session already running")]
    AlreadyRunning,
}

impl TeleopError {
    /// Map a non-success HTTP status and its body text to an error.
    pub fn from_status(status: u16, body: String) -> Self {
        match status {
            400 => Self::BadRequest(body),
            404 => Self::NotFound(body),
            412 => Self::PreconditionFailed(body),
            500 => Self::InternalServer(body),
            _ => Self::Unexpected { status, body },
        }
    }

    /// Whether this error ends a camera session (transport failure or a
    /// malformed stream) rather than a single request.
    pub fn is_stream_fatal(&self) -> bool {
        matches!(
            self,
            Self::Io(_) | Self::Timeout(_) | Self::Parse { .. } | Self::MalformedStream { .. }
        )
    }
}

/// Specific kind of HTTP response parse failure.
#[derive(Debug)]
pub enum ParseErrorKind {
    /// Connection closed before a status line arrived.
    EmptyResponse,
    /// Status line did not have the expected `HTTP/1.x CODE REASON` format.
    InvalidStatusLine,
    /// A header line did not contain a colon separator.
    InvalidHeader,
    /// Response head exceeded the size limit without a blank line.
    HeadTooLarge,
}

impl fmt::Display for ParseErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmptyResponse => write!(f, "empty response"),
            Self::InvalidStatusLine => write!(f, "invalid status line"),
            Self::InvalidHeader => write!(f, "invalid header"),
            Self::HeadTooLarge => write!(f, "response head too large"),
        }
    }
}

/// Specific kind of multipart framing failure.
#[derive(Debug)]
pub enum StreamErrorKind {
    /// More than `limit` bytes accumulated without reaching a boundary.
    PartTooLarge { limit: usize },
    /// The response was not `multipart/*` or carried no boundary.
    NotMultipart(String),
}

impl fmt::Display for StreamErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::PartTooLarge { limit } => write!(f, "part exceeded {limit} buffered bytes"),
            Self::NotMultipart(content_type) => {
                write!(f, "not a multipart response: {content_type:?}")
            }
        }
    }
}

/// Convenience alias for `Result<T, TeleopError>`.
pub type Result<T> = std::result::Result<T, TeleopError>;
