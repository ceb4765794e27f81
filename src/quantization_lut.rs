//! Gradient quantization lookup tables.
//!
//! Mapping a signed sample difference to one of the nine bins is on the hot
//! path, so every scan uses a table of 2·2^bpp entries indexed by
//! `difference + 2^bpp`. Lossless scans with the default thresholds at the
//! common bit depths share process-wide tables that are built once and are
//! read-only afterwards; every other parameter combination builds a private
//! table at scan start.

use std::borrow::Cow;
use std::sync::LazyLock;

use crate::coding_parameters::{compute_default, PresetCodingParameters};

/// Direct implementation of ISO/IEC 14495-1, code segment A.4.
pub fn quantize_gradient_org(
    di: i32,
    threshold1: i32,
    threshold2: i32,
    threshold3: i32,
    near_lossless: i32,
) -> i32 {
    if di <= -threshold3 {
        return -4;
    }
    if di <= -threshold2 {
        return -3;
    }
    if di <= -threshold1 {
        return -2;
    }
    if di < -near_lossless {
        return -1;
    }
    if di <= near_lossless {
        return 0;
    }
    if di < threshold1 {
        return 1;
    }
    if di < threshold2 {
        return 2;
    }
    if di < threshold3 {
        return 3;
    }
    4
}

fn build_table(bits_per_sample: i32, preset: &PresetCodingParameters, near_lossless: i32) -> Vec<i8> {
    let range = 1 << bits_per_sample;
    let mut table = Vec::with_capacity(2 * range as usize);
    for difference in -range..range {
        table.push(quantize_gradient_org(
            difference,
            preset.threshold1,
            preset.threshold2,
            preset.threshold3,
            near_lossless,
        ) as i8);
    }
    table
}

fn build_lossless_table(bits_per_sample: i32) -> Vec<i8> {
    let preset = compute_default((1 << bits_per_sample) - 1, 0);
    build_table(bits_per_sample, &preset, 0)
}

static QUANTIZATION_LUT_LOSSLESS_8: LazyLock<Vec<i8>> = LazyLock::new(|| build_lossless_table(8));
static QUANTIZATION_LUT_LOSSLESS_10: LazyLock<Vec<i8>> = LazyLock::new(|| build_lossless_table(10));
static QUANTIZATION_LUT_LOSSLESS_12: LazyLock<Vec<i8>> = LazyLock::new(|| build_lossless_table(12));
static QUANTIZATION_LUT_LOSSLESS_16: LazyLock<Vec<i8>> = LazyLock::new(|| build_lossless_table(16));

/// Selects the shared table when the scan parameters allow it, otherwise
/// builds a scan-local one.
pub fn quantization_table(
    bits_per_sample: i32,
    near_lossless: i32,
    preset: &PresetCodingParameters,
) -> Cow<'static, [i8]> {
    if near_lossless == 0 && preset.maximum_sample_value == (1 << bits_per_sample) - 1 {
        let defaults = compute_default(preset.maximum_sample_value, 0);
        if preset.threshold1 == defaults.threshold1
            && preset.threshold2 == defaults.threshold2
            && preset.threshold3 == defaults.threshold3
        {
            match bits_per_sample {
                8 => return Cow::Borrowed(&QUANTIZATION_LUT_LOSSLESS_8[..]),
                10 => return Cow::Borrowed(&QUANTIZATION_LUT_LOSSLESS_10[..]),
                12 => return Cow::Borrowed(&QUANTIZATION_LUT_LOSSLESS_12[..]),
                16 => return Cow::Borrowed(&QUANTIZATION_LUT_LOSSLESS_16[..]),
                _ => {}
            }
        }
    }
    Cow::Owned(build_table(bits_per_sample, preset, near_lossless))
}
