//! REST control channel to the robot controller.
//!
//! Every call is a single HTTP/1.1 exchange on its own connection:
//!
//! ```text
//! Client                                  Controller
//!   |--- POST /api/v1/controller/0 -------->|   init_controller
//!   |<-- 200 OK ----------------------------|
//!   |--- POST .../camera/start {cfg} ------>|   start_camera
//!   |<-- 200 OK ----------------------------|
//!   |--- GET .../camera/image-stream ------>|   open_image_stream
//!   |<-- 200 multipart/x-mixed-replace ~~~~~|   (body never ends)
//!   |--- POST .../motors/1 {speed} -------->|   drive (x4)
//!   |<-- 200 OK ----------------------------|
//! ```
//!
//! Control calls are independent of the camera stream: a slow or failing
//! command never blocks frame delivery and vice versa.

use std::io::{BufRead, BufReader, Read};
use std::net::TcpStream;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;

use serde::de::DeserializeOwned;

use crate::config::{CameraConfig, ClientConfig};
use crate::drive::commands::{ControllerInfo, MotorCommand, ServoCommand, motor_commands};
use crate::drive::intent::Action;
use crate::drive::kinematics::{DEFAULT_SCALE, WheelSpeeds, wheel_speeds};
use crate::error::{Result, StreamErrorKind, TeleopError};
use crate::models::{Counter, ImageRecognitionConfig, Input};
use crate::protocol::{HttpRequest, ResponseHead};
use crate::transport::tcp::map_io;
use crate::transport::{Body, ByteSource, HttpConnection, ReaderSource};

/// Header (and stream query parameter) carrying the API key.
pub const API_KEY_HEADER: &str = "X-API-KEY";

/// Longest message-stream line returned whole; longer lines are split.
const MAX_MESSAGE_LINE: u64 = 1024 * 1024;

/// Blocking client for the controller REST API.
///
/// Safe to share between threads; the camera session and the drive loop
/// typically hold the same client.
pub struct ControllerClient {
    config: Arc<ClientConfig>,
    dropped: AtomicU64,
}

impl ControllerClient {
    pub fn new(config: ClientConfig) -> Self {
        Self {
            config: Arc::new(config),
            dropped: AtomicU64::new(0),
        }
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Drive commands that failed and were dropped so far.
    pub fn dropped_commands(&self) -> u64 {
        self.dropped.load(Ordering::Relaxed)
    }

    /// Check that the controller is reachable and the key accepted.
    pub fn init_controller(&self, id: u32) -> Result<()> {
        self.call(self.request("POST", &format!("controller/{id}")))
            .map(drop)
    }

    pub fn controller(&self, id: u32) -> Result<ControllerInfo> {
        self.call_json(self.request("GET", &format!("controller/{id}")))
    }

    /// List the controllers visible to the API.
    pub fn discover(&self) -> Result<Vec<ControllerInfo>> {
        self.call_json(self.request("GET", "controller/discovery"))
    }

    pub fn start_camera(&self, camera: &CameraConfig) -> Result<()> {
        tracing::info!(
            width = camera.width,
            height = camera.height,
            fps = camera.fps,
            "starting camera"
        );
        let request = self
            .request("POST", "controller/camera/start")
            .json_body(camera)?;
        self.call(request).map(drop)
    }

    pub fn stop_camera(&self) -> Result<()> {
        tracing::info!("stopping camera");
        self.call(self.request("DELETE", "controller/camera/stop"))
            .map(drop)
    }

    /// Open the multipart camera stream.
    ///
    /// The head must arrive within the command timeout; afterwards reads
    /// block until data arrives or the socket is shut down through
    /// [`ImageStream::shutdown_handle`].
    pub fn open_image_stream(&self) -> Result<ImageStream> {
        let (head, mut body, socket) = self.open_stream("controller/camera/image-stream")?;
        let Some(boundary) = head.boundary() else {
            return Err(TeleopError::MalformedStream {
                kind: StreamErrorKind::NotMultipart(
                    head.content_type().unwrap_or("<none>").to_string(),
                ),
            });
        };

        body.set_deadline(None)?;
        tracing::info!(boundary = %boundary, "image stream open");

        Ok(ImageStream {
            boundary,
            source: ReaderSource::new(body, self.config.chunk_size),
            socket,
        })
    }

    /// Configure the camera's detectors. Results arrive on
    /// [`camera_messages`](Self::camera_messages).
    pub fn set_image_recognition(&self, config: &ImageRecognitionConfig) -> Result<()> {
        let request = self
            .request("POST", "controller/camera/image-recognition")
            .json_body(config)?;
        self.call(request).map(drop)
    }

    /// Image-recognition results, one message per line.
    pub fn camera_messages(&self) -> Result<MessageStream> {
        self.open_message_stream("controller/camera/message-stream")
    }

    /// Console output of the running program, one message per line.
    pub fn controller_messages(&self) -> Result<MessageStream> {
        self.open_message_stream("controller/message-stream")
    }

    /// Counter states of `controller`, refreshed by the controller about
    /// every 100 ms.
    pub fn counter_messages(&self, controller: u32) -> Result<MessageStream> {
        self.open_message_stream(&format!("controller/{controller}/counters/message-stream"))
    }

    pub fn counters(&self, controller: u32) -> Result<Vec<Counter>> {
        self.call_json(self.request("GET", &format!("controller/{controller}/counters")))
    }

    /// Initialize `counters` on `controller`.
    pub fn add_counters(&self, controller: u32, counters: &[Counter]) -> Result<()> {
        let request = self
            .request("POST", &format!("controller/{controller}/counters"))
            .json_body(counters)?;
        self.call(request).map(drop)
    }

    pub fn counter(&self, controller: u32, counter: u32) -> Result<Counter> {
        self.call_json(self.request(
            "GET",
            &format!("controller/{controller}/counters/{counter}"),
        ))
    }

    /// Reset a counter to zero.
    pub fn reset_counter(&self, controller: u32, counter: u32) -> Result<()> {
        self.call(self.request(
            "PATCH",
            &format!("controller/{controller}/counters/{counter}"),
        ))
        .map(drop)
    }

    pub fn inputs(&self, controller: u32) -> Result<Vec<Input>> {
        self.call_json(self.request("GET", &format!("controller/{controller}/inputs")))
    }

    /// Initialize `inputs` on `controller`.
    pub fn add_inputs(&self, controller: u32, inputs: &[Input]) -> Result<()> {
        let request = self
            .request("POST", &format!("controller/{controller}/inputs"))
            .json_body(inputs)?;
        self.call(request).map(drop)
    }

    pub fn set_motor(&self, controller: u32, motor: u32, command: &MotorCommand) -> Result<()> {
        let request = self
            .request("POST", &format!("controller/{controller}/motors/{motor}"))
            .json_body(command)?;
        self.call(request).map(drop)
    }

    pub fn set_servo(&self, controller: u32, servo: u32, command: &ServoCommand) -> Result<()> {
        let request = self
            .request("POST", &format!("controller/{controller}/servomotors/{servo}"))
            .json_body(command)?;
        self.call(request).map(drop)
    }

    pub fn start_program(&self, name: &str) -> Result<()> {
        tracing::info!(program = name, "starting program");
        self.call(self.request("POST", &format!("application/{name}/start")))
            .map(drop)
    }

    /// Send one command per wheel. Best-effort: failures are logged and
    /// counted, never returned. Returns how many commands were accepted.
    pub fn drive(&self, speeds: &WheelSpeeds) -> usize {
        let controller = self.config.controller_id;
        let mut delivered = 0;

        for (motor, command) in motor_commands(speeds) {
            match self.set_motor(controller, motor, &command) {
                Ok(()) => delivered += 1,
                Err(e) => {
                    self.dropped.fetch_add(1, Ordering::Relaxed);
                    tracing::warn!(motor, error = %e, "motor command dropped");
                }
            }
        }

        tracing::debug!(speeds = ?speeds.rounded(), delivered, "drive");
        delivered
    }

    /// Execute an intent [`Action`].
    ///
    /// Drive actions are best-effort like [`drive`](Self::drive); servo and
    /// program failures are returned.
    pub fn apply(&self, action: &Action) -> Result<()> {
        match action {
            Action::Drive(intent) => {
                self.drive(&wheel_speeds(*intent, DEFAULT_SCALE));
                Ok(())
            }
            Action::Servo { id, position } => self.set_servo(
                self.config.controller_id,
                *id,
                &ServoCommand::position(*id, *position),
            ),
            Action::StartProgram(name) => self.start_program(name),
        }
    }

    fn request(&self, method: &'static str, path: &str) -> HttpRequest {
        self.authorize(HttpRequest::new(method, &self.config.endpoint(path)))
            .header("Accept", "application/json")
    }

    fn authorize(&self, request: HttpRequest) -> HttpRequest {
        match &self.config.api_key {
            Some(key) => request.header(API_KEY_HEADER, key),
            None => request,
        }
    }

    /// `GET` an open-ended stream endpoint. The API key travels both as
    /// header and query parameter. Returns once a 2xx head arrived; the
    /// body still carries the command deadline.
    fn open_stream(&self, path: &str) -> Result<(ResponseHead, Body, TcpStream)> {
        let mut target = self.config.endpoint(path);
        if let Some(key) = &self.config.api_key {
            target.push_str(&format!("?{}={}", API_KEY_HEADER, encode_query_value(key)));
        }
        let request = self.authorize(HttpRequest::get(&target));

        let (mut conn, deadline) = self.connect()?;
        conn.set_deadline(Some(deadline))?;
        let socket = conn.shutdown_handle()?;
        let (head, body) = conn.send(&request, self.config.host())?;

        if !head.is_success() {
            return Err(status_error(&head, body));
        }
        Ok((head, body, socket))
    }

    fn open_message_stream(&self, path: &str) -> Result<MessageStream> {
        let (_, mut body, socket) = self.open_stream(path)?;
        body.set_deadline(None)?;
        tracing::info!(path, "message stream open");
        Ok(MessageStream {
            reader: BufReader::new(body),
            socket,
        })
    }

    /// Connect within the connect timeout, or less when the command
    /// timeout is shorter. Returns the deadline for the whole exchange.
    fn connect(&self) -> Result<(HttpConnection, Instant)> {
        let deadline = Instant::now() + self.config.command_timeout;
        let timeout = self.config.connect_timeout.min(self.config.command_timeout);
        let conn = HttpConnection::connect(self.config.host(), timeout)?;
        Ok((conn, deadline))
    }

    /// Run one exchange under a single deadline (connect, write, head and
    /// body) and return the body text of a 2xx reply.
    fn call(&self, request: HttpRequest) -> Result<String> {
        let (mut conn, deadline) = self.connect()?;
        conn.set_deadline(Some(deadline))?;
        let (head, body) = conn.send(&request, self.config.host())?;

        if !head.is_success() {
            let err = status_error(&head, body);
            tracing::debug!(target = %request.target, error = %err, "request failed");
            return Err(err);
        }
        body.read_text()
    }

    fn call_json<T: DeserializeOwned>(&self, request: HttpRequest) -> Result<T> {
        let text = self.call(request)?;
        Ok(serde_json::from_str(&text)?)
    }
}

fn status_error(head: &ResponseHead, body: Body) -> TeleopError {
    // The body is only context for the error; a failed read leaves it empty.
    let text = body.read_text().unwrap_or_default();
    TeleopError::from_status(head.status, text)
}

/// Percent-encode everything outside the RFC 3986 unreserved set.
fn encode_query_value(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for byte in value.bytes() {
        match byte {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'.' | b'_' | b'~' => {
                out.push(byte as char)
            }
            _ => out.push_str(&format!("%{byte:02X}")),
        }
    }
    out
}

/// An open `multipart/x-mixed-replace` camera response.
pub struct ImageStream {
    boundary: String,
    source: ReaderSource<Body>,
    socket: TcpStream,
}

impl ImageStream {
    /// Boundary parameter negotiated in the response `Content-Type`.
    pub fn boundary(&self) -> &str {
        &self.boundary
    }

    /// A clone of the underlying socket. Shutting it down unblocks a
    /// pending [`next_chunk`](ByteSource::next_chunk) on another thread.
    pub fn shutdown_handle(&self) -> Result<TcpStream> {
        Ok(self.socket.try_clone()?)
    }
}

impl ByteSource for ImageStream {
    fn next_chunk(&mut self) -> Result<Option<&[u8]>> {
        self.source.next_chunk()
    }
}

/// An open `message-stream` response: newline-separated text messages,
/// usually one JSON document each.
pub struct MessageStream {
    reader: BufReader<Body>,
    socket: TcpStream,
}

impl MessageStream {
    /// Block until the next non-blank line. `Ok(None)` once the controller
    /// closes the stream.
    pub fn next_message(&mut self) -> Result<Option<String>> {
        loop {
            let mut line = Vec::new();
            let n = (&mut self.reader)
                .take(MAX_MESSAGE_LINE)
                .read_until(b'\n', &mut line)
                .map_err(|e| map_io(e, "read message stream"))?;
            if n == 0 {
                return Ok(None);
            }
            let text = String::from_utf8_lossy(&line);
            let text = text.trim();
            if !text.is_empty() {
                return Ok(Some(text.to_string()));
            }
        }
    }

    /// A clone of the underlying socket. Shutting it down unblocks a
    /// pending [`next_message`](Self::next_message) on another thread.
    pub fn shutdown_handle(&self) -> Result<TcpStream> {
        Ok(self.socket.try_clone()?)
    }
}

impl Iterator for MessageStream {
    type Item = Result<String>;

    fn next(&mut self) -> Option<Self::Item> {
        self.next_message().transpose()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::drive::intent::{DriveIntent, Key};
    use crate::models::{InputDevice, MotionDetector};
    use std::io::{BufRead, BufReader, Read, Write};
    use std::net::TcpListener;
    use std::thread;
    use std::time::Duration;

    /// Answer `responses.len()` connections in order; returns each raw
    /// request (head and body).
    fn serve(responses: Vec<&'static [u8]>) -> (String, thread::JoinHandle<Vec<String>>) {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap().to_string();
        let handle = thread::spawn(move || {
            let mut requests = Vec::new();
            for response in responses {
                let (mut stream, _) = listener.accept().unwrap();
                let mut reader = BufReader::new(stream.try_clone().unwrap());
                let mut request = String::new();
                let mut content_length = 0;
                loop {
                    let mut line = String::new();
                    if reader.read_line(&mut line).unwrap() == 0 {
                        break;
                    }
                    if let Some(value) = line.strip_prefix("Content-Length: ") {
                        content_length = value.trim().parse().unwrap();
                    }
                    request.push_str(&line);
                    if line == "\r\n" {
                        break;
                    }
                }
                let mut body = vec![0u8; content_length];
                reader.read_exact(&mut body).unwrap();
                request.push_str(&String::from_utf8(body).unwrap());
                stream.write_all(response).unwrap();
                requests.push(request);
            }
            requests
        });
        (addr, handle)
    }

    fn client(addr: &str) -> ControllerClient {
        let mut config = ClientConfig::new(addr).with_api_key("k3y/+");
        config.command_timeout = Duration::from_secs(2);
        config.connect_timeout = Duration::from_secs(2);
        ControllerClient::new(config)
    }

    const OK: &[u8] = b"HTTP/1.1 200 OK\r\nContent-Length: 0\r\n\r\n";

    #[test]
    fn init_controller_sends_key() {
        let (addr, server) = serve(vec![OK]);
        client(&addr).init_controller(0).unwrap();
        let requests = server.join().unwrap();
        assert!(requests[0].starts_with("POST /api/v1/controller/0 HTTP/1.1\r\n"));
        assert!(requests[0].contains("X-API-KEY: k3y/+\r\n"));
    }

    #[test]
    fn status_codes_map_to_errors() {
        let (addr, server) = serve(vec![
            b"HTTP/1.1 404 Not Found\r\nContent-Length: 9\r\n\r\nno motor!",
            b"HTTP/1.1 412 Precondition Failed\r\nContent-Length: 0\r\n\r\n",
            b"HTTP/1.1 418 I'm a teapot\r\nContent-Length: 3\r\n\r\ntea",
        ]);
        let client = client(&addr);
        let command = MotorCommand::speed("M9", 0, crate::drive::Direction::Clockwise);

        match client.set_motor(0, 9, &command) {
            Err(TeleopError::NotFound(body)) => assert_eq!(body, "no motor!"),
            other => panic!("unexpected: {other:?}"),
        }
        assert!(matches!(
            client.start_program("Meow"),
            Err(TeleopError::PreconditionFailed(_))
        ));
        assert!(matches!(
            client.stop_camera(),
            Err(TeleopError::Unexpected { status: 418, .. })
        ));
        server.join().unwrap();
    }

    #[test]
    fn discover_parses_json() {
        let (addr, server) = serve(vec![
            b"HTTP/1.1 200 OK\r\nContent-Type: application/json\r\nContent-Length: 35\r\n\r\n[{\"name\":\"TXT\",\"firmware\":\"3.1.0\"}]",
        ]);
        let controllers = client(&addr).discover().unwrap();
        assert_eq!(controllers.len(), 1);
        assert_eq!(controllers[0].firmware.as_deref(), Some("3.1.0"));
        assert!(server.join().unwrap()[0].starts_with("GET /api/v1/controller/discovery "));
    }

    #[test]
    fn start_camera_posts_config() {
        let (addr, server) = serve(vec![OK]);
        client(&addr).start_camera(&CameraConfig::default()).unwrap();
        let request = &server.join().unwrap()[0];
        assert!(request.starts_with("POST /api/v1/controller/camera/start "));
        assert!(request.contains("\"width\":320"));
        assert!(request.contains("\"fps\":15"));
    }

    #[test]
    fn servo_action() {
        let (addr, server) = serve(vec![OK, OK]);
        let client = client(&addr);
        let mut keys = DriveIntent::new();
        let actions = keys.key_down(Key::Servo);
        assert_eq!(actions.len(), 2);
        // Only the servo; the drive action would open four more connections.
        client.apply(&actions[0]).unwrap();
        client
            .apply(&Action::StartProgram("Meow".to_string()))
            .unwrap();

        let requests = server.join().unwrap();
        assert!(requests[0].starts_with("POST /api/v1/controller/0/servomotors/1 "));
        assert!(requests[0].contains("\"value\":512"));
        assert!(requests[1].starts_with("POST /api/v1/application/Meow/start "));
    }

    #[test]
    fn drive_counts_dropped_commands() {
        // Bind and release a port so nothing is listening on it.
        let addr = {
            let listener = TcpListener::bind("127.0.0.1:0").unwrap();
            listener.local_addr().unwrap().to_string()
        };
        let client = client(&addr);
        let delivered = client.drive(&WheelSpeeds([512.0; 4]));
        assert_eq!(delivered, 0);
        assert_eq!(client.dropped_commands(), 4);
    }

    #[test]
    fn image_stream_requires_multipart() {
        let (addr, server) = serve(vec![
            b"HTTP/1.1 200 OK\r\nContent-Type: text/plain\r\nContent-Length: 2\r\n\r\nhi",
        ]);
        assert!(matches!(
            client(&addr).open_image_stream(),
            Err(TeleopError::MalformedStream {
                kind: StreamErrorKind::NotMultipart(_)
            })
        ));
        let request = &server.join().unwrap()[0];
        assert!(request.starts_with(
            "GET /api/v1/controller/camera/image-stream?X-API-KEY=k3y%2F%2B HTTP/1.1\r\n"
        ));
    }

    #[test]
    fn image_stream_yields_body_chunks() {
        let (addr, server) = serve(vec![
            b"HTTP/1.1 200 OK\r\nContent-Type: multipart/x-mixed-replace; boundary=cam\r\n\r\n--cam\r\n\r\nabc\r\n--cam",
        ]);
        let mut stream = client(&addr).open_image_stream().unwrap();
        server.join().unwrap();
        assert_eq!(stream.boundary(), "cam");

        let mut body = Vec::new();
        while let Some(chunk) = stream.next_chunk().unwrap() {
            body.extend_from_slice(chunk);
        }
        assert_eq!(body, b"--cam\r\n\r\nabc\r\n--cam");
    }

    #[test]
    fn counters_and_inputs() {
        let (addr, server) = serve(vec![
            b"HTTP/1.1 200 OK\r\nContent-Length: 35\r\n\r\n[{\"name\":\"C1\",\"count\":7,\"state\":1}]",
            OK,
            OK,
            b"HTTP/1.1 200 OK\r\nContent-Length: 36\r\n\r\n[{\"device\":\"MINI_SWITCH\",\"value\":1}]",
            OK,
        ]);
        let client = client(&addr);

        let counters = client.counters(0).unwrap();
        assert_eq!(counters[0].count, Some(7));
        client.add_counters(0, &[Counter::enabled(1)]).unwrap();
        client.reset_counter(0, 1).unwrap();
        let inputs = client.inputs(0).unwrap();
        assert_eq!(inputs[0].device, Some(InputDevice::MiniSwitch));
        client
            .add_inputs(0, &[Input::device(2, InputDevice::PhotoTransistor)])
            .unwrap();

        let requests = server.join().unwrap();
        assert!(requests[0].starts_with("GET /api/v1/controller/0/counters "));
        assert!(requests[1].starts_with("POST /api/v1/controller/0/counters "));
        assert!(requests[1].ends_with(r#"[{"enabled":true,"name":"C1"}]"#));
        assert!(requests[2].starts_with("PATCH /api/v1/controller/0/counters/1 "));
        assert!(requests[2].contains("Content-Length: 0\r\n"));
        assert!(requests[3].starts_with("GET /api/v1/controller/0/inputs "));
        assert!(requests[4].ends_with(
            r#"[{"device":"PHOTO_TRANSISTOR","enabled":true,"name":"I2"}]"#
        ));
    }

    #[test]
    fn image_recognition_posts_detectors() {
        let (addr, server) = serve(vec![OK]);
        let config = ImageRecognitionConfig {
            motion_detectors: Some(vec![MotionDetector {
                name: Some("door".into()),
                ..MotionDetector::default()
            }]),
            ..ImageRecognitionConfig::default()
        };
        client(&addr).set_image_recognition(&config).unwrap();
        let request = &server.join().unwrap()[0];
        assert!(request.starts_with("POST /api/v1/controller/camera/image-recognition "));
        assert!(request.ends_with(r#"{"motion_detectors":[{"name":"door","tolerance":1.0}]}"#));
    }

    #[test]
    fn message_stream_yields_lines() {
        let (addr, server) = serve(vec![
            b"HTTP/1.1 200 OK\r\nContent-Type: text/plain\r\nTransfer-Encoding: chunked\r\n\r\nc\r\n{\"c\":1}\n\nhel\r\nb\r\nlo\r\n{\"c\":2}\r\n0\r\n\r\n",
        ]);
        let stream = client(&addr).counter_messages(0).unwrap();
        let messages: Vec<String> = stream.map(Result::unwrap).collect();
        assert_eq!(messages, vec![r#"{"c":1}"#, "hello", r#"{"c":2}"#]);

        let request = &server.join().unwrap()[0];
        assert!(request.starts_with(
            "GET /api/v1/controller/0/counters/message-stream?X-API-KEY=k3y%2F%2B "
        ));
        assert!(request.contains("X-API-KEY: k3y/+\r\n"));
    }

    #[test]
    fn message_stream_reports_status() {
        let (addr, server) = serve(vec![
            b"HTTP/1.1 404 Not Found\r\nContent-Length: 0\r\n\r\n",
        ]);
        assert!(matches!(
            client(&addr).camera_messages(),
            Err(TeleopError::NotFound(_))
        ));
        assert!(server.join().unwrap()[0].starts_with("GET /api/v1/controller/camera/message-stream?"));
    }

    #[test]
    fn command_deadline_covers_slow_reply() {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap().to_string();
        let server = thread::spawn(move || {
            let (mut stream, _) = listener.accept().unwrap();
            let mut reader = BufReader::new(stream.try_clone().unwrap());
            let mut line = String::new();
            while reader.read_line(&mut line).unwrap() > 0 && line != "\r\n" {
                line.clear();
            }
            // Every piece arrives well within a per-read timeout.
            for piece in OK.chunks(8) {
                thread::sleep(Duration::from_millis(300));
                if stream.write_all(piece).is_err() {
                    break;
                }
            }
        });

        let mut config = ClientConfig::new(&addr);
        config.command_timeout = Duration::from_millis(800);
        let client = ControllerClient::new(config);

        let started = Instant::now();
        assert!(matches!(
            client.start_program("Meow"),
            Err(TeleopError::Timeout(_))
        ));
        assert!(started.elapsed() < Duration::from_millis(1400));
        server.join().unwrap();
    }

    #[test]
    fn query_encoding() {
        assert_eq!(encode_query_value("aZ09-._~"), "aZ09-._~");
        assert_eq!(encode_query_value("a b&c"), "a%20b%26c");
    }
}
