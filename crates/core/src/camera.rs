use std::net::{Shutdown, TcpStream};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread::{self, JoinHandle};

use parking_lot::Mutex;

use crate::client::ControllerClient;
use crate::error::{Result, TeleopError};
use crate::media::{FrameDemuxer, FrameObserver, FramePublisher, HandleStore, StreamEnd};

/// Where a camera session is in its lifecycle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionState {
    /// Never started.
    Idle,
    Streaming,
    /// The consume loop returned normally.
    Ended(StreamEnd),
    /// The stream failed; the feed is stopped until the next `start`.
    Failed(String),
}

/// Live camera feed: starts the controller camera, drains the multipart
/// stream on a background thread and publishes every frame.
///
/// The controller supports one consume loop per stream, so a session
/// refuses a second `start` while streaming. Stopping clears the running
/// flag, shuts the socket down to unblock a pending read, joins the thread
/// and revokes every outstanding display handle. A loop that ends on its
/// own (end of stream, closing delimiter or failure) revokes them too.
pub struct CameraSession {
    client: Arc<ControllerClient>,
    store: HandleStore,
    running: Arc<AtomicBool>,
    state: Arc<Mutex<SessionState>>,
    socket: Option<TcpStream>,
    worker: Option<JoinHandle<()>>,
}

impl CameraSession {
    pub fn new(client: Arc<ControllerClient>) -> Self {
        Self {
            client,
            store: HandleStore::with_random_tag(),
            running: Arc::new(AtomicBool::new(false)),
            state: Arc::new(Mutex::new(SessionState::Idle)),
            socket: None,
            worker: None,
        }
    }

    /// Start the camera, open the image stream and begin publishing to
    /// `observer`.
    pub fn start(&mut self, observer: Box<dyn FrameObserver>) -> Result<()> {
        if self.running.load(Ordering::SeqCst) {
            return Err(TeleopError::AlreadyRunning);
        }
        // A previous loop may have ended on its own; reap it first.
        self.stop();

        let config = self.client.config();
        self.client.start_camera(&config.camera)?;
        let mut stream = self.client.open_image_stream()?;
        self.socket = Some(stream.shutdown_handle()?);

        let mut demuxer =
            FrameDemuxer::new(stream.boundary()).with_max_part_size(config.max_part_size);
        let mut publisher = FramePublisher::new(self.store.clone(), observer);
        let running = self.running.clone();
        let state = self.state.clone();
        let tag = self.store.tag().to_string();

        self.running.store(true, Ordering::SeqCst);
        *self.state.lock() = SessionState::Streaming;
        tracing::info!(tag = %tag, boundary = stream.boundary(), "camera session started");

        let spawned = thread::Builder::new()
            .name(format!("camera-{tag}"))
            .spawn(move || {
                let result = demuxer.run(&mut stream, &running, |frame| {
                    publisher.publish(frame, None)
                });
                let cancelled = !running.load(Ordering::SeqCst);
                let released = publisher.store().release_all();
                tracing::debug!(tag = %tag, released, "camera loop finished");

                let end = match result {
                    _ if cancelled => SessionState::Ended(StreamEnd::Cancelled),
                    Ok(end) => {
                        tracing::info!(tag = %tag, ?end, frames = publisher.published(), "camera stream ended");
                        SessionState::Ended(end)
                    }
                    Err(TeleopError::ObserverGone) => {
                        tracing::info!(tag = %tag, "frame observer gone, stopping feed");
                        SessionState::Ended(StreamEnd::Cancelled)
                    }
                    Err(e) => {
                        tracing::warn!(tag = %tag, error = %e, "camera stream failed");
                        SessionState::Failed(e.to_string())
                    }
                };
                // Cleared last: once the session reads as stopped, its
                // final state is recorded and no handle is live.
                *state.lock() = end;
                running.store(false, Ordering::SeqCst);
            });

        match spawned {
            Ok(worker) => {
                self.worker = Some(worker);
                Ok(())
            }
            Err(e) => {
                self.running.store(false, Ordering::SeqCst);
                *self.state.lock() = SessionState::Failed(e.to_string());
                self.socket = None;
                Err(e.into())
            }
        }
    }

    /// Stop the feed and release every outstanding handle. Idempotent.
    pub fn stop(&mut self) {
        let was_running = self.running.swap(false, Ordering::SeqCst);

        if let Some(socket) = self.socket.take() {
            // The peer may already have closed the connection.
            let _ = socket.shutdown(Shutdown::Both);
        }
        if let Some(worker) = self.worker.take()
            && worker.join().is_err()
        {
            tracing::warn!(tag = %self.store.tag(), "camera thread panicked");
            *self.state.lock() = SessionState::Failed("camera thread panicked".to_string());
        }

        let released = self.store.release_all();
        if was_running {
            tracing::info!(tag = %self.store.tag(), released, "camera session stopped");
        }
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    pub fn state(&self) -> SessionState {
        self.state.lock().clone()
    }

    /// Random tag naming this session in handle URIs and logs.
    pub fn tag(&self) -> &str {
        self.store.tag()
    }

    pub fn handles(&self) -> &HandleStore {
        &self.store
    }
}

impl Drop for CameraSession {
    fn drop(&mut self) {
        self.stop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ClientConfig;
    use std::net::TcpListener;
    use std::sync::mpsc;
    use std::time::Duration;

    #[test]
    fn idle_until_started() {
        let client = Arc::new(ControllerClient::new(ClientConfig::default()));
        let mut session = CameraSession::new(client);
        assert_eq!(session.state(), SessionState::Idle);
        assert!(!session.is_running());
        assert_eq!(session.tag().len(), 8);
        session.stop();
        session.stop();
        assert_eq!(session.state(), SessionState::Idle);
    }

    #[test]
    fn start_fails_when_controller_unreachable() {
        let addr = {
            let listener = TcpListener::bind("127.0.0.1:0").unwrap();
            listener.local_addr().unwrap().to_string()
        };
        let mut config = ClientConfig::new(&addr);
        config.connect_timeout = Duration::from_millis(500);
        let mut session = CameraSession::new(Arc::new(ControllerClient::new(config)));

        let (tx, _rx) = mpsc::channel();
        assert!(session.start(Box::new(tx)).is_err());
        assert!(!session.is_running());
        assert_eq!(session.state(), SessionState::Idle);
    }
}
