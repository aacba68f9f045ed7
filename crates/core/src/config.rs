use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Default controller REST address (host:port).
pub const DEFAULT_ADDRESS: &str = "127.0.0.1:8080";

/// Path prefix of the controller REST API.
pub const DEFAULT_BASE_PATH: &str = "/api/v1";

/// Client-side deadline for control commands.
pub const DEFAULT_COMMAND_TIMEOUT: Duration = Duration::from_secs(5);

/// Read size used when draining the camera stream.
pub const DEFAULT_CHUNK_SIZE: usize = 16 * 1024;

/// Upper bound on bytes buffered for a single multipart part.
pub const DEFAULT_MAX_PART_SIZE: usize = 4 * 1024 * 1024;

/// Client configuration shared by the control channel and camera sessions.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Controller address as `host:port`. An `http://` prefix is accepted.
    pub address: String,
    /// REST path prefix, without a trailing slash.
    pub base_path: String,
    /// Value for the `X-API-KEY` header. `None` omits the header.
    pub api_key: Option<String>,
    /// Controller index used for motor/servo endpoints.
    pub controller_id: u32,
    /// Deadline for a whole control request (connect, write, read).
    pub command_timeout: Duration,
    /// Deadline for establishing any TCP connection, including the stream.
    pub connect_timeout: Duration,
    /// Read size for camera stream chunks.
    pub chunk_size: usize,
    /// Maximum bytes a single camera part may buffer before the stream is
    /// declared malformed.
    pub max_part_size: usize,
    /// Camera parameters sent when a session starts.
    pub camera: CameraConfig,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            address: DEFAULT_ADDRESS.to_string(),
            base_path: DEFAULT_BASE_PATH.to_string(),
            api_key: None,
            controller_id: 0,
            command_timeout: DEFAULT_COMMAND_TIMEOUT,
            connect_timeout: DEFAULT_COMMAND_TIMEOUT,
            chunk_size: DEFAULT_CHUNK_SIZE,
            max_part_size: DEFAULT_MAX_PART_SIZE,
            camera: CameraConfig::default(),
        }
    }
}

impl ClientConfig {
    pub fn new(address: &str) -> Self {
        Self {
            address: address.to_string(),
            ..Self::default()
        }
    }

    pub fn with_api_key(mut self, api_key: &str) -> Self {
        self.api_key = Some(api_key.to_string());
        self
    }

    /// Address with any `http://` scheme and trailing slash removed.
    pub fn host(&self) -> &str {
        let host = self
            .address
            .strip_prefix("http://")
            .unwrap_or(&self.address);
        host.trim_end_matches('/')
    }

    /// Absolute request path for an API-relative endpoint.
    ///
    /// `endpoint("controller/0")` → `/api/v1/controller/0`
    pub fn endpoint(&self, path: &str) -> String {
        format!(
            "{}/{}",
            self.base_path.trim_end_matches('/'),
            path.trim_start_matches('/')
        )
    }
}

/// Camera start parameters (`POST controller/camera/start`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CameraConfig {
    pub width: u32,
    pub height: u32,
    pub fps: u32,
    /// Rotate the image by 180 degrees on the controller.
    pub rotate: bool,
    pub debug: bool,
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            width: 320,
            height: 240,
            fps: 15,
            rotate: false,
            debug: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn endpoint_joins_base_path() {
        let config = ClientConfig::default();
        assert_eq!(config.endpoint("controller/0"), "/api/v1/controller/0");
        assert_eq!(config.endpoint("/controller/0"), "/api/v1/controller/0");
    }

    #[test]
    fn host_strips_scheme() {
        let config = ClientConfig::new("http://192.168.7.2:80/");
        assert_eq!(config.host(), "192.168.7.2:80");
        assert_eq!(ClientConfig::new("10.0.0.5:8080").host(), "10.0.0.5:8080");
    }

    #[test]
    fn camera_config_json_shape() {
        let json = serde_json::to_value(CameraConfig::default()).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "width": 320,
                "height": 240,
                "fps": 15,
                "rotate": false,
                "debug": false
            })
        );
    }
}
