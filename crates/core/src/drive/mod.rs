//! Drive control: operator keys → intent → wheel speeds → motor commands.
//!
//! - [`intent`]: held-key state and the [`Action`]s each transition yields.
//! - [`kinematics`]: the four-wheel linear mixer.
//! - [`commands`]: JSON payloads for motor, servo and controller endpoints.

pub mod commands;
pub mod intent;
pub mod kinematics;

pub use commands::{ControllerInfo, Direction, MotorCommand, ServoCommand, motor_commands};
pub use intent::{Action, DriveIntent, Key};
pub use kinematics::{DEFAULT_SCALE, Intent, WheelSpeeds, wheel_speeds};
