//! Mecanum drive mixing.
//!
//! Maps a translation `(tx, ty)` and rotation `r`, each in `[-1, 1]`, to
//! four wheel speeds in `[-S, S]`:
//!
//! ```text
//! w1 = clamp(-S·tx + S·ty + S·r)      M1 ┌───┐ M2
//! w2 = clamp( S·tx + S·ty - S·r)         │ ▲ │
//! w3 = clamp( S·tx + S·ty + S·r)      M3 └───┘ M4
//! w4 = clamp(-S·tx + S·ty - S·r)
//! ```
//!
//! Positive `ty` is forward, positive `tx` is right and positive `r` turns
//! left. Out-of-range components are clamped before mixing.

/// Scale used by the controller's motor API (full speed = 512).
pub const DEFAULT_SCALE: f64 = 512.0;

/// Operator drive intent. Every component lies in `[-1, 1]`.
#[derive(Debug, Default, Clone, Copy, PartialEq)]
pub struct Intent {
    pub tx: f64,
    pub ty: f64,
    pub rotation: f64,
}

impl Intent {
    /// Build an intent, clamping each component to `[-1, 1]`.
    ///
    /// `NaN` components are treated as zero.
    pub fn new(tx: f64, ty: f64, rotation: f64) -> Self {
        Self {
            tx: unit(tx),
            ty: unit(ty),
            rotation: unit(rotation),
        }
    }
}

fn unit(value: f64) -> f64 {
    if value.is_nan() { 0.0 } else { value.clamp(-1.0, 1.0) }
}

/// Speeds for wheels M1..M4, in that order.
#[derive(Debug, Default, Clone, Copy, PartialEq)]
pub struct WheelSpeeds(pub [f64; 4]);

impl WheelSpeeds {
    /// Speeds rounded to the integer values the motor API accepts.
    pub fn rounded(&self) -> [i32; 4] {
        self.0.map(|speed| speed.round() as i32)
    }
}

/// Mix `intent` into four wheel speeds bounded by `scale`.
pub fn wheel_speeds(intent: Intent, scale: f64) -> WheelSpeeds {
    let Intent { tx, ty, rotation: r } = Intent::new(intent.tx, intent.ty, intent.rotation);
    let scale = scale.abs();
    let s = |v: f64| (scale * v).clamp(-scale, scale);

    WheelSpeeds([
        s(-tx + ty + r),
        s(tx + ty - r),
        s(tx + ty + r),
        s(-tx + ty - r),
    ])
}
