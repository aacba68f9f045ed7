use std::collections::HashSet;
use std::str::FromStr;

use crate::drive::kinematics::Intent;

/// Servo moved by the [`Key::Servo`] key.
pub const SERVO_ID: u32 = 1;

/// Servo position while the servo key is held.
pub const SERVO_PRESSED: i32 = 512;

/// Servo position after the servo key is released.
pub const SERVO_RELEASED: i32 = 210;

/// Program started by the [`Key::Program`] key.
pub const DEFAULT_PROGRAM: &str = "Meow";

/// Operator keys, named after their effect.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Key {
    Forward,
    Left,
    Back,
    Right,
    RotateRight,
    RotateLeft,
    Servo,
    Program,
}

impl FromStr for Key {
    type Err = String;

    /// Accepts DOM `KeyboardEvent.key` names (`"w"`, `"ArrowUp"`,
    /// `"Enter"`, `" "`) plus `Space`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "w" | "ArrowUp" => Ok(Key::Forward),
            "a" | "ArrowLeft" => Ok(Key::Left),
            "s" | "ArrowDown" => Ok(Key::Back),
            "d" | "ArrowRight" => Ok(Key::Right),
            "e" => Ok(Key::RotateRight),
            "q" => Ok(Key::RotateLeft),
            "Enter" => Ok(Key::Servo),
            " " | "Space" => Ok(Key::Program),
            _ => Err(format!("unmapped key: {s:?}")),
        }
    }
}

/// A control command produced by a key transition.
#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    /// Send fresh wheel speeds for this intent.
    Drive(Intent),
    Servo { id: u32, position: i32 },
    StartProgram(String),
}

/// Pressed-key set and the drive intent it implies.
///
/// Every accepted key transition yields its side effect (if any) followed
/// by a [`Action::Drive`] with the updated intent. Repeated key-down events
/// for a held key and key-up events for keys that are not held yield
/// nothing.
#[derive(Debug, Clone)]
pub struct DriveIntent {
    pressed: HashSet<Key>,
    intent: Intent,
    program: String,
}

impl Default for DriveIntent {
    fn default() -> Self {
        Self::new()
    }
}

impl DriveIntent {
    pub fn new() -> Self {
        Self {
            pressed: HashSet::new(),
            intent: Intent::default(),
            program: DEFAULT_PROGRAM.to_string(),
        }
    }

    /// Use `program` for the [`Key::Program`] key.
    pub fn with_program(mut self, program: &str) -> Self {
        self.program = program.to_string();
        self
    }

    pub fn intent(&self) -> Intent {
        self.intent
    }

    pub fn is_pressed(&self, key: Key) -> bool {
        self.pressed.contains(&key)
    }

    pub fn key_down(&mut self, key: Key) -> Vec<Action> {
        if !self.pressed.insert(key) {
            return Vec::new();
        }

        let mut actions = Vec::with_capacity(2);
        match key {
            Key::Forward => self.intent.ty = 1.0,
            Key::Back => self.intent.ty = -1.0,
            Key::Left => self.intent.tx = -1.0,
            Key::Right => self.intent.tx = 1.0,
            Key::RotateRight => self.intent.rotation = -1.0,
            Key::RotateLeft => self.intent.rotation = 1.0,
            Key::Servo => actions.push(Action::Servo {
                id: SERVO_ID,
                position: SERVO_PRESSED,
            }),
            Key::Program => actions.push(Action::StartProgram(self.program.clone())),
        }
        actions.push(Action::Drive(self.intent));
        actions
    }

    pub fn key_up(&mut self, key: Key) -> Vec<Action> {
        if !self.pressed.remove(&key) {
            return Vec::new();
        }

        let mut actions = Vec::with_capacity(2);
        match key {
            Key::Forward | Key::Back => self.intent.ty = 0.0,
            Key::Left | Key::Right => self.intent.tx = 0.0,
            Key::RotateRight | Key::RotateLeft => self.intent.rotation = 0.0,
            Key::Servo => actions.push(Action::Servo {
                id: SERVO_ID,
                position: SERVO_RELEASED,
            }),
            Key::Program => {}
        }
        actions.push(Action::Drive(self.intent));
        actions
    }

    /// Focus lost: forget every held key and stop.
    pub fn blur(&mut self) -> Vec<Action> {
        self.pressed.clear();
        self.intent = Intent::default();
        vec![Action::Drive(self.intent)]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn drive(tx: f64, ty: f64, rotation: f64) -> Action {
        Action::Drive(Intent { tx, ty, rotation })
    }

    #[test]
    fn parse_keys() {
        assert_eq!("w".parse::<Key>(), Ok(Key::Forward));
        assert_eq!("ArrowLeft".parse::<Key>(), Ok(Key::Left));
        assert_eq!(" ".parse::<Key>(), Ok(Key::Program));
        assert_eq!("Space".parse::<Key>(), Ok(Key::Program));
        assert_eq!("Enter".parse::<Key>(), Ok(Key::Servo));
        assert!("x".parse::<Key>().is_err());
    }

    #[test]
    fn press_and_release_forward() {
        let mut state = DriveIntent::new();
        assert_eq!(state.key_down(Key::Forward), vec![drive(0.0, 1.0, 0.0)]);
        assert_eq!(state.key_up(Key::Forward), vec![drive(0.0, 0.0, 0.0)]);
    }

    #[test]
    fn repeats_are_ignored() {
        let mut state = DriveIntent::new();
        assert_eq!(state.key_down(Key::Left).len(), 1);
        assert!(state.key_down(Key::Left).is_empty());
        assert!(state.key_up(Key::Right).is_empty());
    }

    #[test]
    fn axes_combine() {
        let mut state = DriveIntent::new();
        state.key_down(Key::Forward);
        state.key_down(Key::Right);
        assert_eq!(state.key_down(Key::RotateLeft), vec![drive(1.0, 1.0, 1.0)]);
        assert_eq!(state.key_up(Key::Right), vec![drive(0.0, 1.0, 1.0)]);
    }

    #[test]
    fn releasing_one_direction_zeroes_the_axis() {
        let mut state = DriveIntent::new();
        state.key_down(Key::Left);
        state.key_down(Key::Right);
        assert_eq!(state.intent().tx, 1.0);
        state.key_up(Key::Left);
        assert_eq!(state.intent().tx, 0.0);
        assert!(state.is_pressed(Key::Right));
    }

    #[test]
    fn servo_key() {
        let mut state = DriveIntent::new();
        assert_eq!(
            state.key_down(Key::Servo),
            vec![Action::Servo { id: 1, position: 512 }, drive(0.0, 0.0, 0.0)]
        );
        assert_eq!(
            state.key_up(Key::Servo),
            vec![Action::Servo { id: 1, position: 210 }, drive(0.0, 0.0, 0.0)]
        );
    }

    #[test]
    fn program_key() {
        let mut state = DriveIntent::new().with_program("Dance");
        assert_eq!(
            state.key_down(Key::Program),
            vec![Action::StartProgram("Dance".to_string()), drive(0.0, 0.0, 0.0)]
        );
        assert_eq!(state.key_up(Key::Program), vec![drive(0.0, 0.0, 0.0)]);
    }

    #[test]
    fn blur_stops_everything() {
        let mut state = DriveIntent::new();
        state.key_down(Key::Forward);
        state.key_down(Key::RotateRight);
        assert_eq!(state.blur(), vec![drive(0.0, 0.0, 0.0)]);
        assert!(!state.is_pressed(Key::Forward));
        // Nothing is held any more, so the release is ignored.
        assert!(state.key_up(Key::Forward).is_empty());
    }
}
