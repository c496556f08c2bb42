use glam::Vec3;

/// One decoded controller notification.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SensorFrame {
    /// Absolute touchpad position, 10 bits per axis.
    pub touchpad: TouchPosition,
    /// Accelerometer sample in g.
    pub accel: Vec3,
    /// Gyroscope sample in rad/s.
    pub gyro: Vec3,
    /// Magnetometer sample in device units scaled by the fixed mag factor.
    pub mag: Vec3,
    /// Device clock converted to seconds.
    pub timestamp_s: f64,
    /// Raw temperature byte, unscaled.
    pub temperature_raw: u8,
    /// Button bitmask, decoded per bit.
    pub buttons: Buttons,
}

/// Touchpad position. Range is [0, 1023] per axis; the hardware
/// reports at most ~315 (the pad's sensitive dimension in mm).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TouchPosition {
    pub x: u16,
    pub y: u16,
}

/// Button states from the bitmask byte. The flags are independent:
/// any combination can be pressed at once.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Buttons {
    pub trigger: bool,
    pub home: bool,
    pub back: bool,
    pub touchpad: bool,
    pub volume_up: bool,
    pub volume_down: bool,
}

impl Buttons {
    pub fn from_bits(bits: u8) -> Self {
        Self {
            trigger: bits & (1 << 0) != 0,
            home: bits & (1 << 1) != 0,
            back: bits & (1 << 2) != 0,
            touchpad: bits & (1 << 3) != 0,
            volume_up: bits & (1 << 4) != 0,
            volume_down: bits & (1 << 5) != 0,
        }
    }

    /// Whether any button is currently held.
    pub fn any(&self) -> bool {
        self.trigger
            || self.home
            || self.back
            || self.touchpad
            || self.volume_up
            || self.volume_down
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn buttons_decode_independent_bits() {
        let b = Buttons::from_bits(0b0010_1101);
        assert!(b.trigger);
        assert!(!b.home);
        assert!(b.back);
        assert!(b.touchpad);
        assert!(!b.volume_up);
        assert!(b.volume_down);
        assert!(b.any());
    }

    #[test]
    fn buttons_none_pressed() {
        let b = Buttons::from_bits(0);
        assert_eq!(b, Buttons::default());
        assert!(!b.any());
    }
}
