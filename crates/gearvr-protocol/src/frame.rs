use crate::types::{Buttons, SensorFrame, TouchPosition};
use glam::Vec3;
use thiserror::Error;

/// BLE custom service carrying the controller's notify/write characteristics.
pub const UUID_CUSTOM_SERVICE: &str = "4f63756c-7573-2054-6872-65656d6f7465";
pub const UUID_CUSTOM_SERVICE_WRITE: &str = "c8c51726-81bc-483b-a052-f7a14ea3d282";
pub const UUID_CUSTOM_SERVICE_NOTIFY: &str = "c8c51726-81bc-483b-a052-f7a14ea3d281";

/// Minimum notification payload length. Anything shorter cannot be decoded;
/// anything longer decodes from the first `FRAME_LEN` bytes.
pub const FRAME_LEN: usize = 59;

// Byte offsets into the notification payload. The wire format has no
// framing or checksum; these positions are fixed.
const TIMESTAMP_OFFSET: usize = 0;
const ACCEL_OFFSET: usize = 4;
const GYRO_OFFSET: usize = 10;
const MAG_OFFSET: usize = 32;
const TOUCH_OFFSET: usize = 54;
const TEMPERATURE_OFFSET: usize = 57;
const BUTTONS_OFFSET: usize = 58;

/// The packet carries three staggered accel/gyro sample sets this many
/// bytes apart. Only the first set is decoded.
pub const SAMPLE_STRIDE: usize = 16;

// Frame-level unit conversion factors.
const GYRO_FACTOR: f64 = 0.0001; // to rad/s
const ACCEL_FACTOR: f64 = 0.00001; // to g
const TIMESTAMP_FACTOR: f64 = 0.001; // to seconds
const MAG_FACTOR: f64 = 0.06;

// Sensor sensitivity constants. These are applied as a separate stage
// before the frame-level factors; the two stages must not be folded
// together or the f32 rounding changes.
const ACCEL_SENSITIVITY: f64 = 9.80665;
const ACCEL_DIVISOR: f64 = 2048.0;
const GYRO_SENSITIVITY: f64 = 0.017453292;
const GYRO_DIVISOR: f64 = 14.285;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum DecodeError {
    #[error("notification too short: expected {expected} bytes, got {actual}")]
    BufferTooShort { expected: usize, actual: usize },
}

/// Decode one controller notification into a [`SensorFrame`].
///
/// Pure function; no validation happens beyond the length check. The wire
/// format carries no checksum, so any 59+ byte buffer decodes.
pub fn decode(buf: &[u8]) -> Result<SensorFrame, DecodeError> {
    if buf.len() < FRAME_LEN {
        return Err(DecodeError::BufferTooShort {
            expected: FRAME_LEN,
            actual: buf.len(),
        });
    }

    let touch_x = (((buf[TOUCH_OFFSET] as u16 & 0xF) << 6)
        | ((buf[TOUCH_OFFSET + 1] as u16 & 0xFC) >> 2))
        & 0x3FF;
    let touch_y =
        (((buf[TOUCH_OFFSET + 1] as u16 & 0x3) << 8) | (buf[TOUCH_OFFSET + 2] as u16)) & 0x3FF;

    // The device clock is read from three bytes only, zero-extended to 32
    // bits. Raw ticks -> microseconds -> seconds.
    let ticks = u32::from_le_bytes([
        buf[TIMESTAMP_OFFSET],
        buf[TIMESTAMP_OFFSET + 1],
        buf[TIMESTAMP_OFFSET + 2],
        0,
    ]);
    let timestamp_s = ticks as f64 / 1000.0 * TIMESTAMP_FACTOR;

    let accel = Vec3::new(
        accel_component(read_i16(buf, ACCEL_OFFSET)),
        accel_component(read_i16(buf, ACCEL_OFFSET + 2)),
        accel_component(read_i16(buf, ACCEL_OFFSET + 4)),
    );
    let gyro = Vec3::new(
        gyro_component(read_i16(buf, GYRO_OFFSET)),
        gyro_component(read_i16(buf, GYRO_OFFSET + 2)),
        gyro_component(read_i16(buf, GYRO_OFFSET + 4)),
    );
    let mag = Vec3::new(
        mag_component(read_i16(buf, MAG_OFFSET)),
        mag_component(read_i16(buf, MAG_OFFSET + 2)),
        mag_component(read_i16(buf, MAG_OFFSET + 4)),
    );

    Ok(SensorFrame {
        touchpad: TouchPosition {
            x: touch_x,
            y: touch_y,
        },
        accel,
        gyro,
        mag,
        timestamp_s,
        temperature_raw: buf[TEMPERATURE_OFFSET],
        buttons: Buttons::from_bits(buf[BUTTONS_OFFSET]),
    })
}

fn read_i16(buf: &[u8], offset: usize) -> i16 {
    i16::from_le_bytes([buf[offset], buf[offset + 1]])
}

// The sensitivity stage rounds through f32 before the frame-level factor
// is applied; both roundings are part of the wire contract.
fn accel_component(raw: i16) -> f32 {
    let sensed = (raw as f64 * 10000.0 * ACCEL_SENSITIVITY / ACCEL_DIVISOR) as f32;
    (sensed as f64 * ACCEL_FACTOR) as f32
}

fn gyro_component(raw: i16) -> f32 {
    let sensed = (raw as f64 * 10000.0 * GYRO_SENSITIVITY / GYRO_DIVISOR) as f32;
    (sensed as f64 * GYRO_FACTOR) as f32
}

fn mag_component(raw: i16) -> f32 {
    (raw as f64 * MAG_FACTOR) as f32
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Build a zeroed frame and let tests poke bytes into it.
    fn make_test_frame() -> Vec<u8> {
        vec![0u8; FRAME_LEN]
    }

    fn put_i16(buf: &mut [u8], offset: usize, value: i16) {
        buf[offset..offset + 2].copy_from_slice(&value.to_le_bytes());
    }

    #[test]
    fn rejects_short_buffer() {
        let buf = vec![0u8; FRAME_LEN - 1];
        assert_eq!(
            decode(&buf),
            Err(DecodeError::BufferTooShort {
                expected: FRAME_LEN,
                actual: FRAME_LEN - 1,
            })
        );
    }

    #[test]
    fn decode_is_deterministic() {
        let mut buf = make_test_frame();
        for (i, b) in buf.iter_mut().enumerate() {
            *b = (i as u8).wrapping_mul(37).wrapping_add(11);
        }
        let a = decode(&buf).unwrap();
        let b = decode(&buf).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn touchpad_x_bit_packing() {
        let mut buf = make_test_frame();
        buf[54] = 0x0F;
        buf[55] = 0xFF;
        let frame = decode(&buf).unwrap();
        // ((0x0F & 0xF) << 6) + ((0xFF & 0xFC) >> 2) = 960 + 63 = 1023
        assert_eq!(frame.touchpad.x, 1023);
    }

    #[test]
    fn touchpad_y_bit_packing() {
        let mut buf = make_test_frame();
        buf[55] = 0x03;
        buf[56] = 0xFF;
        let frame = decode(&buf).unwrap();
        assert_eq!(frame.touchpad.y, 1023);
        // The low two bits of byte 55 belong to Y, not X.
        assert_eq!(frame.touchpad.x, 0);
    }

    #[test]
    fn accel_full_scale_count() {
        let mut buf = make_test_frame();
        put_i16(&mut buf, 4, 2048);
        let frame = decode(&buf).unwrap();
        // 2048 * 10000 * 9.80665 / 2048 * 0.00001 = 0.980665 g
        assert!((frame.accel.x - 0.980665).abs() < 1e-6);
        assert_eq!(frame.accel.y, 0.0);
        assert_eq!(frame.accel.z, 0.0);
    }

    #[test]
    fn accel_axes_are_two_bytes_apart() {
        let mut buf = make_test_frame();
        put_i16(&mut buf, 6, -2048);
        put_i16(&mut buf, 8, 1024);
        let frame = decode(&buf).unwrap();
        assert!((frame.accel.y + 0.980665).abs() < 1e-6);
        assert!((frame.accel.z - 0.4903325).abs() < 1e-6);
    }

    #[test]
    fn gyro_scaling() {
        let mut buf = make_test_frame();
        put_i16(&mut buf, 10, 14285);
        let frame = decode(&buf).unwrap();
        // 14285 * 10000 * 0.017453292 / 14.285 * 0.0001 = 17.453292 rad/s
        assert!((frame.gyro.x - 17.453292).abs() < 1e-4);
    }

    #[test]
    fn mag_scaling() {
        let mut buf = make_test_frame();
        put_i16(&mut buf, 32, 100);
        put_i16(&mut buf, 36, -100);
        let frame = decode(&buf).unwrap();
        assert!((frame.mag.x - 6.0).abs() < 1e-6);
        assert_eq!(frame.mag.y, 0.0);
        assert!((frame.mag.z + 6.0).abs() < 1e-6);
    }

    #[test]
    fn timestamp_ticks_to_seconds() {
        let mut buf = make_test_frame();
        buf[0] = 0xE8;
        buf[1] = 0x03; // 1000 ticks
        let frame = decode(&buf).unwrap();
        assert!((frame.timestamp_s - 0.001).abs() < 1e-12);
    }

    #[test]
    fn timestamp_uses_three_bytes() {
        let mut buf = make_test_frame();
        buf[2] = 0x01; // 65536 ticks
        let frame = decode(&buf).unwrap();
        assert!((frame.timestamp_s - 0.065536).abs() < 1e-12);
    }

    #[test]
    fn temperature_is_raw() {
        let mut buf = make_test_frame();
        buf[57] = 0xAB;
        let frame = decode(&buf).unwrap();
        assert_eq!(frame.temperature_raw, 0xAB);
    }

    #[test]
    fn buttons_from_mask_byte() {
        let mut buf = make_test_frame();
        buf[58] = 0b0001_0010;
        let frame = decode(&buf).unwrap();
        assert!(frame.buttons.home);
        assert!(frame.buttons.volume_up);
        assert!(!frame.buttons.trigger);
    }

    #[test]
    fn oversized_buffer_decodes_from_prefix() {
        let mut buf = vec![0u8; FRAME_LEN + 20];
        buf[58] = 0x01;
        let frame = decode(&buf).unwrap();
        assert!(frame.buttons.trigger);
    }
}
