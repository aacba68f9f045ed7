pub mod camera;
pub mod client;
pub mod config;
pub mod drive;
pub mod error;
pub mod media;
pub mod models;
pub mod protocol;
pub mod transport;

pub use camera::{CameraSession, SessionState};
pub use client::{ControllerClient, ImageStream, MessageStream};
pub use config::{CameraConfig, ClientConfig};
pub use drive::{Action, DriveIntent, Intent, Key, WheelSpeeds, wheel_speeds};
pub use error::{Result, TeleopError};
pub use media::{DisplayHandle, Frame, FrameDemuxer, FrameObserver, HandleStore, StreamEnd};
