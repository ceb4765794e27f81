//! Lossless color transforms HP1, HP2 and HP3.
//!
//! These decorrelate RGB triplets before coding and are defined for 8-bit,
//! 3-component scans only. All arithmetic wraps modulo the sample range so a
//! forward transform followed by the inverse is the identity on every input.

use crate::ColorTransformation;

fn wrap(value: i32, range: i32) -> i32 {
    value & (range - 1)
}

/// Applies the transform on the way into the scan buffers (encode side).
pub fn forward(
    transformation: ColorTransformation,
    red: i32,
    green: i32,
    blue: i32,
    range: i32,
) -> (i32, i32, i32) {
    match transformation {
        ColorTransformation::None => (red, green, blue),
        ColorTransformation::Hp1 => (
            wrap(red - green + range / 2, range),
            green,
            wrap(blue - green + range / 2, range),
        ),
        ColorTransformation::Hp2 => (
            wrap(red - green + range / 2, range),
            green,
            wrap(blue - ((red + green) >> 1) - range / 2, range),
        ),
        ColorTransformation::Hp3 => {
            let v2 = wrap(blue - green + range / 2, range);
            let v3 = wrap(red - green + range / 2, range);
            (wrap(green + ((v2 + v3) >> 2) - range / 4, range), v2, v3)
        }
    }
}

/// Applies the inverse transform on the way out of the scan buffers
/// (decode side).
pub fn inverse(
    transformation: ColorTransformation,
    v1: i32,
    v2: i32,
    v3: i32,
    range: i32,
) -> (i32, i32, i32) {
    match transformation {
        ColorTransformation::None => (v1, v2, v3),
        ColorTransformation::Hp1 => (
            wrap(v1 + v2 - range / 2, range),
            v2,
            wrap(v3 + v2 - range / 2, range),
        ),
        ColorTransformation::Hp2 => {
            let red = wrap(v1 + v2 - range / 2, range);
            (red, v2, wrap(v3 + ((red + v2) >> 1) + range / 2, range))
        }
        ColorTransformation::Hp3 => {
            let green = wrap(v1 - ((v2 + v3) >> 2) + range / 4, range);
            (
                wrap(v3 + green - range / 2, range),
                green,
                wrap(v2 + green - range / 2, range),
            )
        }
    }
}
