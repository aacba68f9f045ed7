use parking_lot::Mutex;
use pyo3::exceptions::PyRuntimeError;
use pyo3::prelude::*;
use std::sync::Arc;
use std::time::Duration;

use teleop::drive::commands::ServoCommand;
use teleop::media::FnObserver;
use teleop::{
    CameraSession, ClientConfig, ControllerClient, DisplayHandle, Intent, SessionState,
    TeleopError, wheel_speeds,
};

use crate::types::{PyControllerInfo, PyFrame};

fn to_py(e: TeleopError) -> PyErr {
    PyRuntimeError::new_err(e.to_string())
}

#[pyclass(name = "Client")]
pub struct PyClient {
    client: Arc<ControllerClient>,
    session: Mutex<CameraSession>,
    latest: Arc<Mutex<Option<DisplayHandle>>>,
}

impl PyClient {
    fn with_session<F, R>(&self, f: F) -> PyResult<R>
    where
        F: FnOnce(&mut CameraSession) -> R,
    {
        Ok(f(&mut self.session.lock()))
    }
}

#[pymethods]
impl PyClient {
    #[new]
    #[pyo3(signature = (
        address = "127.0.0.1:8080",
        api_key = None,
        controller = 0,
        timeout_ms = 5000,
    ))]
    fn new(address: &str, api_key: Option<&str>, controller: u32, timeout_ms: u64) -> Self {
        let config = ClientConfig {
            api_key: api_key.map(std::string::ToString::to_string),
            controller_id: controller,
            command_timeout: Duration::from_millis(timeout_ms),
            connect_timeout: Duration::from_millis(timeout_ms),
            ..ClientConfig::new(address)
        };
        let client = Arc::new(ControllerClient::new(config));
        PyClient {
            session: Mutex::new(CameraSession::new(client.clone())),
            client,
            latest: Arc::new(Mutex::new(None)),
        }
    }

    fn init_controller(&self) -> PyResult<()> {
        self.client
            .init_controller(self.client.config().controller_id)
            .map_err(to_py)
    }

    fn controller_info(&self) -> PyResult<PyControllerInfo> {
        self.client
            .controller(self.client.config().controller_id)
            .map(PyControllerInfo::from)
            .map_err(to_py)
    }

    fn discover(&self) -> PyResult<Vec<PyControllerInfo>> {
        let controllers = self.client.discover().map_err(to_py)?;
        Ok(controllers.into_iter().map(PyControllerInfo::from).collect())
    }

    /// Send wheel speeds for the intent. Returns the number of motor
    /// commands the controller accepted.
    #[pyo3(signature = (tx = 0.0, ty = 0.0, rotation = 0.0))]
    fn drive(&self, tx: f64, ty: f64, rotation: f64) -> usize {
        let speeds = wheel_speeds(Intent::new(tx, ty, rotation), teleop::drive::DEFAULT_SCALE);
        self.client.drive(&speeds)
    }

    fn set_servo(&self, servo: u32, value: i32) -> PyResult<()> {
        self.client
            .set_servo(
                self.client.config().controller_id,
                servo,
                &ServoCommand::position(servo, value),
            )
            .map_err(to_py)
    }

    fn start_program(&self, name: &str) -> PyResult<()> {
        self.client.start_program(name).map_err(to_py)
    }

    /// `(name, count)` for every initialized counter.
    fn counters(&self) -> PyResult<Vec<(String, i64)>> {
        let counters = self
            .client
            .counters(self.client.config().controller_id)
            .map_err(to_py)?;
        Ok(counters
            .into_iter()
            .map(|c| (c.name.unwrap_or_default(), c.count.unwrap_or_default()))
            .collect())
    }

    fn reset_counter(&self, counter: u32) -> PyResult<()> {
        self.client
            .reset_counter(self.client.config().controller_id, counter)
            .map_err(to_py)
    }

    #[getter]
    fn dropped_commands(&self) -> u64 {
        self.client.dropped_commands()
    }

    /// Start the camera and keep the newest frame for `latest_frame`.
    fn start_camera(&self) -> PyResult<()> {
        let latest = self.latest.clone();
        let observer = FnObserver(move |handle: DisplayHandle| {
            *latest.lock() = Some(handle);
        });
        self.session
            .lock()
            .start(Box::new(observer))
            .map_err(to_py)
    }

    /// Stop the feed locally and ask the controller to stop the camera.
    fn stop_camera(&self) -> PyResult<()> {
        self.latest.lock().take();
        self.with_session(|s| s.stop())?;
        self.client.stop_camera().map_err(to_py)
    }

    fn latest_frame(&self) -> Option<PyFrame> {
        self.latest.lock().as_ref().and_then(PyFrame::from_handle)
    }

    fn is_streaming(&self) -> PyResult<bool> {
        self.with_session(|s| s.is_running())
    }

    /// `"idle"`, `"streaming"`, `"ended"` or `"failed: <reason>"`.
    fn camera_state(&self) -> PyResult<String> {
        self.with_session(|s| match s.state() {
            SessionState::Idle => "idle".to_string(),
            SessionState::Streaming => "streaming".to_string(),
            SessionState::Ended(_) => "ended".to_string(),
            SessionState::Failed(reason) => format!("failed: {reason}"),
        })
    }
}
