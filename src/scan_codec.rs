//! Small pure helpers shared by the scan encoder and decoder.

use crate::traits::bit_wise_sign;

const I32_BIT_COUNT: i32 = 32;

/// Folds the three quantized gradients into one context number; the caller
/// sign-flips negative ids into [0, 364].
pub const fn compute_context_id(q1: i32, q2: i32, q3: i32) -> i32 {
    (q1 * 9 + q2) * 9 + q3
}

/// Median Edge Detector predictor over the causal L-shaped neighborhood.
pub fn get_predicted_value(ra: i32, rb: i32, rc: i32) -> i32 {
    // The sign trick reduces branching: is Ra between Rc and Rb?
    let sign = bit_wise_sign(rb - ra);
    if (sign ^ (rc - ra)) < 0 {
        return rb;
    }
    if (sign ^ (rb - rc)) < 0 {
        return ra;
    }
    ra + rb - rc
}

/// Maps a signed error to the non-negative Golomb input: 2e for e >= 0,
/// -2e - 1 for e < 0.
pub const fn get_mapped_err_val(error_value: i32) -> i32 {
    (error_value >> (I32_BIT_COUNT - 2)) ^ (2 * error_value)
}

/// Inverse of [`get_mapped_err_val`].
pub const fn unmap_err_val(mapped_error: i32) -> i32 {
    let sign = (mapped_error << (I32_BIT_COUNT - 1)) >> (I32_BIT_COUNT - 1);
    sign ^ (mapped_error >> 1)
}
