use std::cmp::{max, min};

use crate::constants::DEFAULT_RESET_VALUE;
use crate::error::Error;
use crate::{ColorTransformation, InterleaveMode};

/// Per-scan coding options supplied by the caller (the marker framing layer).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CodingParameters {
    /// Maximum allowed reconstruction error per sample; 0 selects lossless.
    pub near_lossless: i32,
    pub interleave_mode: InterleaveMode,
    pub transformation: ColorTransformation,
}

/// JPEG-LS preset coding parameters (ISO/IEC 14495-1, C.2.4.1.1).
///
/// A zero field means "use the default derived from MAXVAL and NEAR".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PresetCodingParameters {
    pub maximum_sample_value: i32,
    pub threshold1: i32,
    pub threshold2: i32,
    pub threshold3: i32,
    pub reset_value: i32,
}

// Clamping function as defined by ISO/IEC 14495-1, Figure C.3.
const fn clamp(i: i32, j: i32, maximum_sample_value: i32) -> i32 {
    if i > maximum_sample_value || i < j {
        j
    } else {
        i
    }
}

pub fn compute_maximum_near_lossless(maximum_sample_value: i32) -> i32 {
    debug_assert!(maximum_sample_value >= 1);
    min(255, maximum_sample_value / 2)
}

/// Default coding threshold values as defined by ISO/IEC 14495-1, C.2.4.1.1.1.
pub fn compute_default(maximum_sample_value: i32, near_lossless: i32) -> PresetCodingParameters {
    debug_assert!(maximum_sample_value <= u16::MAX as i32);

    // Basic threshold values from ISO/IEC 14495-1, table C.3 (MAXVAL = 255, NEAR = 0).
    const BASIC_THRESHOLD1: i32 = 3;
    const BASIC_THRESHOLD2: i32 = 7;
    const BASIC_THRESHOLD3: i32 = 21;

    let factor = (min(maximum_sample_value, 4095) + 128) / 256;
    let threshold1 = clamp(
        factor * (BASIC_THRESHOLD1 - 2) + 2 + 3 * near_lossless,
        near_lossless + 1,
        maximum_sample_value,
    );
    let threshold2 = clamp(
        factor * (BASIC_THRESHOLD2 - 3) + 3 + 5 * near_lossless,
        threshold1,
        maximum_sample_value,
    );

    PresetCodingParameters {
        maximum_sample_value,
        threshold1,
        threshold2,
        threshold3: clamp(
            factor * (BASIC_THRESHOLD3 - 4) + 4 + 7 * near_lossless,
            threshold2,
            maximum_sample_value,
        ),
        reset_value: DEFAULT_RESET_VALUE,
    }
}

/// Validates caller-supplied preset parameters against ISO/IEC 14495-1,
/// table C.1 and resolves zero fields to their defaults.
pub fn validate_preset_coding_parameters(
    pc_parameters: &PresetCodingParameters,
    maximum_component_value: i32,
    near_lossless: i32,
) -> Result<PresetCodingParameters, Error> {
    debug_assert!(maximum_component_value >= 3 && maximum_component_value <= u16::MAX as i32);

    if pc_parameters.maximum_sample_value != 0
        && (pc_parameters.maximum_sample_value < 1
            || pc_parameters.maximum_sample_value > maximum_component_value)
    {
        return Err(Error::InvalidArgumentPresetCodingParameters);
    }

    let maximum_sample_value = if pc_parameters.maximum_sample_value != 0 {
        pc_parameters.maximum_sample_value
    } else {
        maximum_component_value
    };

    if pc_parameters.threshold1 != 0
        && (pc_parameters.threshold1 < near_lossless + 1
            || pc_parameters.threshold1 > maximum_sample_value)
    {
        return Err(Error::InvalidArgumentPresetCodingParameters);
    }

    let defaults = compute_default(maximum_sample_value, near_lossless);

    let threshold1 = if pc_parameters.threshold1 != 0 {
        pc_parameters.threshold1
    } else {
        defaults.threshold1
    };

    if pc_parameters.threshold2 != 0
        && (pc_parameters.threshold2 < threshold1
            || pc_parameters.threshold2 > maximum_sample_value)
    {
        return Err(Error::InvalidArgumentPresetCodingParameters);
    }

    let threshold2 = if pc_parameters.threshold2 != 0 {
        pc_parameters.threshold2
    } else {
        defaults.threshold2
    };

    if pc_parameters.threshold3 != 0
        && (pc_parameters.threshold3 < threshold2
            || pc_parameters.threshold3 > maximum_sample_value)
    {
        return Err(Error::InvalidArgumentPresetCodingParameters);
    }

    if pc_parameters.reset_value != 0
        && (pc_parameters.reset_value < 3
            || pc_parameters.reset_value > max(255, maximum_sample_value))
    {
        return Err(Error::InvalidArgumentPresetCodingParameters);
    }

    Ok(PresetCodingParameters {
        maximum_sample_value,
        threshold1,
        threshold2,
        threshold3: if pc_parameters.threshold3 != 0 {
            pc_parameters.threshold3
        } else {
            defaults.threshold3
        },
        reset_value: if pc_parameters.reset_value != 0 {
            pc_parameters.reset_value
        } else {
            defaults.reset_value
        },
    })
}
