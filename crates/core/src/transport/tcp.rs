use std::io::{self, BufRead, BufReader, Read, Take, Write};
use std::net::{SocketAddr, TcpStream, ToSocketAddrs};
use std::time::{Duration, Instant};

use crate::error::{ParseErrorKind, Result, TeleopError};
use crate::protocol::{ChunkedReader, HttpRequest, ResponseHead};

/// Longest response head accepted before the blank line.
const MAX_HEAD_SIZE: usize = 16 * 1024;

/// Longest error/JSON body read into memory for a control response.
const MAX_TEXT_BODY: u64 = 1024 * 1024;

/// A single HTTP/1.1 exchange over its own TCP connection.
///
/// ```text
/// connect ──▶ send(request) ──▶ (ResponseHead, Body)
/// ```
///
/// The body keeps the connection alive for as long as it is read, which
/// is what lets the camera stream run indefinitely. A cloned socket from
/// [`shutdown_handle`](Self::shutdown_handle) can interrupt a blocked read
/// from another thread.
pub struct HttpConnection {
    socket: Socket,
    peer_addr: SocketAddr,
}

/// A TCP stream whose reads and writes all answer to one deadline.
///
/// Before every I/O call the socket timeout is set to the time left, so a
/// peer that trickles its reply cannot hold the exchange past the
/// deadline. Without a deadline, I/O blocks indefinitely.
pub struct Socket {
    stream: TcpStream,
    deadline: Option<Instant>,
}

impl Socket {
    fn new(stream: TcpStream) -> Self {
        Self {
            stream,
            deadline: None,
        }
    }

    pub fn set_deadline(&mut self, deadline: Option<Instant>) -> io::Result<()> {
        self.deadline = deadline;
        if deadline.is_none() {
            self.stream.set_read_timeout(None)?;
            self.stream.set_write_timeout(None)?;
        }
        Ok(())
    }

    fn time_left(&self) -> io::Result<Option<Duration>> {
        let Some(deadline) = self.deadline else {
            return Ok(None);
        };
        let left = deadline.saturating_duration_since(Instant::now());
        if left.is_zero() {
            return Err(io::Error::new(
                io::ErrorKind::TimedOut,
                "request deadline passed",
            ));
        }
        Ok(Some(left))
    }
}

impl Read for Socket {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        if let Some(left) = self.time_left()? {
            self.stream.set_read_timeout(Some(left))?;
        }
        self.stream.read(buf)
    }
}

impl Write for Socket {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        if let Some(left) = self.time_left()? {
            self.stream.set_write_timeout(Some(left))?;
        }
        self.stream.write(buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.stream.flush()
    }
}

impl HttpConnection {
    /// Resolve `host` (`host:port`) and connect to the first address that
    /// answers within `timeout`.
    pub fn connect(host: &str, timeout: Duration) -> Result<Self> {
        let addrs: Vec<SocketAddr> = host
            .to_socket_addrs()
            .map_err(|_| TeleopError::InvalidAddress(host.to_string()))?
            .collect();

        let mut last_err = None;
        for addr in addrs {
            match TcpStream::connect_timeout(&addr, timeout) {
                Ok(stream) => {
                    stream.set_nodelay(true)?;
                    tracing::trace!(%addr, "connected");
                    return Ok(Self {
                        socket: Socket::new(stream),
                        peer_addr: addr,
                    });
                }
                Err(e) => {
                    tracing::debug!(%addr, error = %e, "connect attempt failed");
                    last_err = Some(e);
                }
            }
        }

        match last_err {
            Some(e) => Err(map_io(e, "connect")),
            None => Err(TeleopError::InvalidAddress(host.to_string())),
        }
    }

    pub fn peer_addr(&self) -> SocketAddr {
        self.peer_addr
    }

    /// Bound the rest of the exchange, head and body included, by
    /// `deadline`. `None` blocks indefinitely.
    pub fn set_deadline(&mut self, deadline: Option<Instant>) -> Result<()> {
        Ok(self.socket.set_deadline(deadline)?)
    }

    /// A second handle to the socket, used only to shut it down.
    pub fn shutdown_handle(&self) -> Result<TcpStream> {
        Ok(self.socket.stream.try_clone()?)
    }

    /// Write `request` and read the response head.
    ///
    /// Returns the head and a [`Body`] framed according to its
    /// `Transfer-Encoding` / `Content-Length` headers.
    pub fn send(mut self, request: &HttpRequest, host: &str) -> Result<(ResponseHead, Body)> {
        self.socket
            .write_all(&request.serialize(host))
            .map_err(|e| map_io(e, "write request"))?;
        self.socket.flush()?;

        tracing::debug!(
            peer = %self.peer_addr,
            method = request.method,
            target = %request.target,
            "request"
        );

        let mut reader = BufReader::new(self.socket);
        let head = read_head(&mut reader)?;

        tracing::debug!(
            peer = %self.peer_addr,
            status = head.status,
            "response"
        );

        let body = if head.is_chunked() {
            Body::Chunked(ChunkedReader::new(reader))
        } else if let Some(len) = head.content_length() {
            Body::Fixed(reader.take(len))
        } else {
            Body::UntilClose(reader)
        };

        Ok((head, body))
    }
}

/// Read header lines up to and including the blank line.
fn read_head(reader: &mut BufReader<Socket>) -> Result<ResponseHead> {
    let mut raw = Vec::new();
    loop {
        let mut line = Vec::new();
        let n = reader
            .read_until(b'\n', &mut line)
            .map_err(|e| map_io(e, "read response head"))?;
        if n == 0 {
            if raw.is_empty() {
                return Err(TeleopError::Parse {
                    kind: ParseErrorKind::EmptyResponse,
                });
            }
            break;
        }

        raw.extend_from_slice(&line);
        if raw.len() > MAX_HEAD_SIZE {
            return Err(TeleopError::Parse {
                kind: ParseErrorKind::HeadTooLarge,
            });
        }
        if line == b"\r\n" || line == b"\n" {
            break;
        }
    }

    ResponseHead::parse(&String::from_utf8_lossy(&raw))
}

/// Response body framed per RFC 9112 §6.3.
pub enum Body {
    /// `Content-Length` delimited.
    Fixed(Take<BufReader<Socket>>),
    /// `Transfer-Encoding: chunked`.
    Chunked(ChunkedReader<BufReader<Socket>>),
    /// Delimited by the server closing the connection.
    UntilClose(BufReader<Socket>),
}

impl Body {
    /// Replace the deadline the connection was sent with, e.g. to let an
    /// open-ended stream body outlive the request that opened it.
    pub fn set_deadline(&mut self, deadline: Option<Instant>) -> Result<()> {
        let socket = match self {
            Body::Fixed(reader) => reader.get_mut().get_mut(),
            Body::Chunked(reader) => reader.get_mut().get_mut(),
            Body::UntilClose(reader) => reader.get_mut(),
        };
        Ok(socket.set_deadline(deadline)?)
    }

    /// Read the whole body as (lossy) UTF-8 text, up to 1 MiB.
    pub fn read_text(self) -> Result<String> {
        let mut bytes = Vec::new();
        self.take(MAX_TEXT_BODY)
            .read_to_end(&mut bytes)
            .map_err(|e| map_io(e, "read response body"))?;
        Ok(String::from_utf8_lossy(&bytes).into_owned())
    }
}

impl Read for Body {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        match self {
            Body::Fixed(reader) => reader.read(buf),
            Body::Chunked(reader) => reader.read(buf),
            Body::UntilClose(reader) => reader.read(buf),
        }
    }
}

/// Classify read/write deadline expiry as [`TeleopError::Timeout`].
pub(crate) fn map_io(e: io::Error, during: &str) -> TeleopError {
    match e.kind() {
        io::ErrorKind::WouldBlock | io::ErrorKind::TimedOut => {
            TeleopError::Timeout(during.to_string())
        }
        _ => TeleopError::Io(e),
    }
}
