//! HTTP/1.1 client-side wire format.
//!
//! The controller speaks plain HTTP/1.1 with JSON bodies. Each exchange
//! uses its own connection (`Connection: close`), so this module only
//! needs to:
//!
//! - serialize requests ([`request`]),
//! - parse the response head ([`response`]),
//! - decode `Transfer-Encoding: chunked` bodies ([`chunked`]).
//!
//! ## Message format (RFC 9112)
//!
//! ```text
//! GET /api/v1/controller/camera/image-stream HTTP/1.1\r\n
//! Host: 192.168.7.2\r\n
//! X-API-KEY: 5fCzHs\r\n
//! \r\n
//! ```
//!
//! The camera endpoint answers with a never-ending
//! `multipart/x-mixed-replace` body; see [`crate::media::multipart`].

pub mod chunked;
pub mod request;
pub mod response;

pub use chunked::ChunkedReader;
pub use request::HttpRequest;
pub use response::ResponseHead;
