//! JSON models of the controller's input, counter and image-recognition
//! endpoints.
//!
//! Every field is optional on the wire: absent fields deserialize to
//! `None` and `None` fields are left out of request bodies.

use serde::{Deserialize, Serialize};

/// `controller/{c}/counters` entry.
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Counter {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub count: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub digital: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub enabled: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub state: Option<i64>,
}

impl Counter {
    /// An enabled counter named `C{id}`.
    pub fn enabled(id: u32) -> Self {
        Self {
            enabled: Some(true),
            name: Some(format!("C{id}")),
            ..Self::default()
        }
    }
}

/// Sensor attached to a universal input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum InputDevice {
    MiniSwitch,
    PhotoResistor,
    UltrasonicDistanceMeter,
    PhotoTransistor,
    ColorSensor,
    NtcResistor,
    TrailFollower,
}

/// `controller/{c}/inputs` entry.
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Input {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub device: Option<InputDevice>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub enabled: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<i64>,
}

impl Input {
    /// An enabled input `I{id}` reading `device`.
    pub fn device(id: u32, device: InputDevice) -> Self {
        Self {
            device: Some(device),
            enabled: Some(true),
            name: Some(format!("I{id}")),
            value: None,
        }
    }
}

/// Image region in pixels, origin at the top-left corner.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Rectangle {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub height: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub width: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub x: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub y: Option<u32>,
}

impl Rectangle {
    pub fn new(x: u32, y: u32, width: u32, height: u32) -> Self {
        Self {
            height: Some(height),
            width: Some(width),
            x: Some(x),
            y: Some(y),
        }
    }
}

/// Finds balls of a given colour inside `area`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BallDetector {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub area: Option<Rectangle>,
    pub end_range_value: Option<i32>,
    pub max_ball_diameter: Option<u32>,
    pub min_ball_diameter: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Target colour as `[r, g, b]`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rgb: Option<[u8; 3]>,
    pub start_range_value: Option<i32>,
    pub tolerance: Option<f64>,
}

impl Default for BallDetector {
    fn default() -> Self {
        Self {
            area: None,
            end_range_value: Some(100),
            max_ball_diameter: Some(20),
            min_ball_diameter: Some(5),
            name: None,
            rgb: None,
            start_range_value: Some(-100),
            tolerance: Some(1.0),
        }
    }
}

/// Finds up to `number_of_lines` dark (or, inverted, light) lines.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LineDetector {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub area: Option<Rectangle>,
    pub end_range_value: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub invert: Option<bool>,
    pub max_line_width: Option<u32>,
    pub min_line_width: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub number_of_lines: Option<u32>,
    pub start_range_value: Option<i32>,
}

impl Default for LineDetector {
    fn default() -> Self {
        Self {
            area: None,
            end_range_value: Some(100),
            invert: None,
            max_line_width: Some(20),
            min_line_width: Some(5),
            name: None,
            number_of_lines: Some(1),
            start_range_value: Some(-100),
        }
    }
}

/// Reports the dominant colour inside `area`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ColorDetector {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub area: Option<Rectangle>,
    pub contrast: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

impl Default for ColorDetector {
    fn default() -> Self {
        Self {
            area: None,
            contrast: Some(1.0),
            name: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MotionDetector {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub area: Option<Rectangle>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub tolerance: Option<f64>,
}

impl Default for MotionDetector {
    fn default() -> Self {
        Self {
            area: None,
            name: None,
            tolerance: Some(1.0),
        }
    }
}

/// `POST controller/camera/image-recognition`
///
/// Detector results arrive on the camera message stream.
#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ImageRecognitionConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ball_detectors: Option<Vec<BallDetector>>,
    /// Regions every detector ignores.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub blocked_areas: Option<Vec<Rectangle>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color_detectors: Option<Vec<ColorDetector>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub line_detectors: Option<Vec<LineDetector>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub motion_detectors: Option<Vec<MotionDetector>>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn counter_wire_format() {
        assert_eq!(
            serde_json::to_value(Counter::enabled(2)).unwrap(),
            json!({"enabled": true, "name": "C2"})
        );
        let counter: Counter =
            serde_json::from_str(r#"{"name":"C1","count":17,"state":1,"extra":0}"#).unwrap();
        assert_eq!(counter.count, Some(17));
        assert_eq!(counter.digital, None);
    }

    #[test]
    fn input_device_names() {
        assert_eq!(
            serde_json::to_value(Input::device(3, InputDevice::UltrasonicDistanceMeter)).unwrap(),
            json!({"device": "ULTRASONIC_DISTANCE_METER", "enabled": true, "name": "I3"})
        );
        let input: Input = serde_json::from_str(r#"{"device":"NTC_RESISTOR","value":512}"#).unwrap();
        assert_eq!(input.device, Some(InputDevice::NtcResistor));
        assert_eq!(input.value, Some(512));
    }

    #[test]
    fn detector_defaults_are_sent() {
        let config = ImageRecognitionConfig {
            line_detectors: Some(vec![LineDetector {
                name: Some("track".into()),
                area: Some(Rectangle::new(0, 200, 320, 40)),
                ..LineDetector::default()
            }]),
            ..ImageRecognitionConfig::default()
        };
        assert_eq!(
            serde_json::to_value(&config).unwrap(),
            json!({"line_detectors": [{
                "area": {"height": 40, "width": 320, "x": 0, "y": 200},
                "end_range_value": 100,
                "max_line_width": 20,
                "min_line_width": 5,
                "name": "track",
                "number_of_lines": 1,
                "start_range_value": -100,
            }]})
        );
    }

    #[test]
    fn ball_detector_rgb() {
        let detector = BallDetector {
            rgb: Some([255, 0, 0]),
            ..BallDetector::default()
        };
        let value = serde_json::to_value(&detector).unwrap();
        assert_eq!(value["rgb"], json!([255, 0, 0]));
        assert_eq!(value["tolerance"], json!(1.0));
        assert_eq!(value["min_ball_diameter"], json!(5));
    }
}
