use glam::Vec2;

/// Truncates toward zero; `as` saturates at both ends and maps NaN to 0.
pub fn quantize_coord(value: f32) -> u16 {
    value as u16
}

pub fn dequantize_coord(value: u16) -> f32 {
    f32::from(value)
}

pub fn quantize_position(pos: Vec2) -> [u16; 2] {
    [quantize_coord(pos.x), quantize_coord(pos.y)]
}

pub fn dequantize_position([x, y]: [u16; 2]) -> Vec2 {
    Vec2::new(dequantize_coord(x), dequantize_coord(y))
}

/// Maps a countdown in `0..=max` onto a byte in 1/256ths of `max`.
pub fn quantize_timer(time: f32, max: f32) -> u8 {
    if max <= 0.0 {
        return 0;
    }
    (time * 256.0 / max).clamp(0.0, 255.0) as u8
}

pub fn dequantize_timer(byte: u8, max: f32) -> f32 {
    f32::from(byte) / 256.0 * max
}

/// Largest error a timer of maximum `max` picks up on the wire.
pub fn timer_resolution(max: f32) -> f32 {
    max / 256.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn coords_truncate_and_saturate() {
        assert_eq!(quantize_coord(100.9), 100);
        assert_eq!(quantize_coord(-3.0), 0);
        assert_eq!(quantize_coord(70_000.0), u16::MAX);
        assert_eq!(quantize_coord(f32::NAN), 0);
        assert_eq!(
            dequantize_position(quantize_position(Vec2::new(100.0, 200.0))),
            Vec2::new(100.0, 200.0)
        );
    }

    #[test]
    fn timer_endpoints() {
        assert_eq!(quantize_timer(0.0, 15.0), 0);
        assert_eq!(quantize_timer(15.0, 15.0), 255);
        assert_eq!(quantize_timer(30.0, 15.0), 255);
        assert_eq!(quantize_timer(-1.0, 15.0), 0);
        assert_eq!(quantize_timer(1.0, 0.0), 0);
        assert_eq!(dequantize_timer(128, 2.0), 1.0);
    }

    #[test]
    fn timer_error_within_resolution() {
        let max = 0.7;
        for step in 0..=70 {
            let time = step as f32 / 100.0;
            let decoded = dequantize_timer(quantize_timer(time, max), max);
            assert!((decoded - time).abs() <= timer_resolution(max) + 1e-6);
        }
    }
}
