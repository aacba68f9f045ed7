//! JSON bodies of the controller's output endpoints.

use serde::{Deserialize, Serialize};

use crate::drive::kinematics::WheelSpeeds;

/// Motor rotation sense.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Direction {
    #[serde(rename = "CW")]
    Clockwise,
    #[serde(rename = "CCW")]
    CounterClockwise,
}

/// `POST controller/{c}/motors/{m}`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MotorCommand {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub enabled: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub values: Vec<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub direction: Option<Direction>,
}

impl MotorCommand {
    /// An enabled single-speed command.
    pub fn speed(name: &str, speed: i32, direction: Direction) -> Self {
        Self {
            enabled: Some(true),
            name: Some(name.to_string()),
            values: vec![speed],
            direction: Some(direction),
        }
    }
}

/// `POST controller/{c}/servomotors/{s}`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServoCommand {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub enabled: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub value: i32,
}

impl ServoCommand {
    /// Enabled command for servo `id`, named `S{id}`.
    pub fn position(id: u32, value: i32) -> Self {
        Self {
            enabled: Some(true),
            name: Some(format!("S{id}")),
            value,
        }
    }
}

/// Controller description returned by discovery and `GET controller/{id}`.
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ControllerInfo {
    #[serde(default)]
    pub api_version: Option<String>,
    #[serde(default)]
    pub controller_lib_version: Option<String>,
    #[serde(default)]
    pub firmware: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub serial_number: Option<String>,
    #[serde(default)]
    pub version: Option<String>,
}

/// Wheel motor ids, names and mounting directions, M1..M4.
///
/// The left and right wheels are mounted mirrored, so alternate wheels
/// run counter-clockwise for the same forward motion.
pub const WHEELS: [(u32, &str, Direction); 4] = [
    (1, "M1", Direction::CounterClockwise),
    (2, "M2", Direction::Clockwise),
    (3, "M3", Direction::CounterClockwise),
    (4, "M4", Direction::Clockwise),
];

/// One command per wheel, paired with its motor id.
pub fn motor_commands(speeds: &WheelSpeeds) -> [(u32, MotorCommand); 4] {
    let rounded = speeds.rounded();
    std::array::from_fn(|i| {
        let (id, name, direction) = WHEELS[i];
        (id, MotorCommand::speed(name, rounded[i], direction))
    })
}
