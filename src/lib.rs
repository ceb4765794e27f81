/*!
# jpegls-rs

`jpegls-rs` is a pure Rust implementation of the JPEG-LS (ISO/IEC 14495-1 /
ITU-T T.87) scan codec: lossless and near-lossless compression of
continuous-tone images up to 16 bits per sample with 1, 3 or 4 components and
the three standard interleave modes.

The crate deliberately covers the *entropy-coded scan* only. The surrounding
JPEG marker framing (SOI, SOF55, LSE, SOS, EOI, ...) is the caller's concern:
[`encode_scan`] produces the bare entropy segment and [`decode_scan`] consumes
one, with the scan parameters passed in explicitly.

```rust
use jpegls_rs::{encode_scan, decode_scan, CodingParameters, FrameInfo, PresetCodingParameters};

let frame_info = FrameInfo { width: 4, height: 2, bits_per_sample: 8, component_count: 1 };
let parameters = CodingParameters::default();
let preset = PresetCodingParameters::default();
let pixels = [12u8, 12, 12, 12, 200, 12, 12, 12];

let mut encoded = vec![0u8; 64];
let length = encode_scan(&frame_info, &parameters, &preset, &pixels, &mut encoded).unwrap();

let mut decoded = [0u8; 8];
decode_scan(&frame_info, &parameters, &preset, &encoded[..length], &mut decoded, None).unwrap();
assert_eq!(decoded, pixels);
```
*/

pub mod bit_reader;
pub mod bit_writer;
pub mod coding_parameters;
pub mod color_transform;
pub mod constants;
pub mod error;
pub mod golomb_lut;
pub mod process_line;
pub mod quantization_lut;
pub mod regular_mode_context;
pub mod run_mode_context;
pub mod scan_codec;
pub mod scan_decoder;
pub mod scan_encoder;
pub mod traits;

use log::debug;

use crate::coding_parameters::validate_preset_coding_parameters;
use crate::constants::{
    DEFAULT_RESET_VALUE, MAXIMUM_BITS_PER_SAMPLE, MAXIMUM_COMPONENT_COUNT, MAXIMUM_HEIGHT,
    MAXIMUM_WIDTH, MINIMUM_BITS_PER_SAMPLE, MINIMUM_COMPONENT_COUNT, MINIMUM_HEIGHT, MINIMUM_WIDTH,
};
use crate::process_line::{RawByteLineSink, RawByteLineSource};
use crate::scan_decoder::ScanDecoder;
use crate::scan_encoder::ScanEncoder;
use crate::traits::{DefaultTraits, LosslessTraits, Quad, Traits, Triplet};

pub use crate::coding_parameters::{
    compute_default, compute_maximum_near_lossless, CodingParameters, PresetCodingParameters,
};
pub use crate::error::Error;

/// Basic properties of the image a scan belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FrameInfo {
    /// Width of the frame in pixels, 1..=65535.
    pub width: u32,
    /// Height of the frame in pixels, 1..=65535.
    pub height: u32,
    /// Bits per sample, 2..=16.
    pub bits_per_sample: i32,
    /// Number of color components, 1..=255.
    pub component_count: i32,
}

/// Interleave mode for multi-component scans.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum InterleaveMode {
    /// One component per scan.
    #[default]
    None = 0,
    /// Interleaved by line.
    Line = 1,
    /// Interleaved by sample.
    Sample = 2,
}

impl std::convert::TryFrom<u8> for InterleaveMode {
    type Error = Error;

    fn try_from(value: u8) -> Result<Self, Error> {
        match value {
            0 => Ok(Self::None),
            1 => Ok(Self::Line),
            2 => Ok(Self::Sample),
            _ => Err(Error::InvalidArgumentInterleaveMode),
        }
    }
}

/// Color transformation for multi-component scans.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ColorTransformation {
    /// No color transformation.
    #[default]
    None = 0,
    /// HP1 color transformation.
    Hp1 = 1,
    /// HP2 color transformation.
    Hp2 = 2,
    /// HP3 color transformation.
    Hp3 = 3,
}

impl std::convert::TryFrom<u8> for ColorTransformation {
    type Error = Error;

    fn try_from(value: u8) -> Result<Self, Error> {
        match value {
            0 => Ok(Self::None),
            1 => Ok(Self::Hp1),
            2 => Ok(Self::Hp2),
            3 => Ok(Self::Hp3),
            _ => Err(Error::UnsupportedColorTransform),
        }
    }
}

/// Region of interest for decoding. All lines are still decoded for state
/// correctness; only samples inside the region are written out.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rect {
    pub x: usize,
    pub y: usize,
    pub width: usize,
    pub height: usize,
}

impl Rect {
    fn full_frame(frame_info: &FrameInfo) -> Self {
        Self {
            x: 0,
            y: 0,
            width: frame_info.width as usize,
            height: frame_info.height as usize,
        }
    }
}

/// Picks the traits instantiation for the scan parameters: compile-time
/// lossless traits for the common bit depths, runtime traits otherwise.
macro_rules! dispatch {
    ($frame_info:expr, $parameters:expr, $preset:expr, $operation:ident $(, $argument:expr)*) => {{
        let frame_info = $frame_info;
        let parameters = $parameters;
        let preset = $preset;
        let maxval = preset.maximum_sample_value;
        let optimized = parameters.near_lossless == 0
            && preset.reset_value == DEFAULT_RESET_VALUE
            && maxval == (1 << frame_info.bits_per_sample) - 1;

        match (parameters.interleave_mode, frame_info.component_count) {
            (InterleaveMode::Sample, 3) => {
                if optimized && frame_info.bits_per_sample == 8 {
                    $operation(
                        LosslessTraits::<u8, Triplet<u8>, 8>::new(),
                        frame_info,
                        parameters,
                        preset
                        $(, $argument)*
                    )
                } else if frame_info.bits_per_sample <= 8 {
                    $operation(
                        DefaultTraits::<u8, Triplet<u8>>::new(
                            maxval,
                            parameters.near_lossless,
                            preset.reset_value,
                        ),
                        frame_info,
                        parameters,
                        preset
                        $(, $argument)*
                    )
                } else {
                    $operation(
                        DefaultTraits::<u16, Triplet<u16>>::new(
                            maxval,
                            parameters.near_lossless,
                            preset.reset_value,
                        ),
                        frame_info,
                        parameters,
                        preset
                        $(, $argument)*
                    )
                }
            }
            (InterleaveMode::Sample, _) => {
                // Validation only lets quads through here.
                if frame_info.bits_per_sample <= 8 {
                    $operation(
                        DefaultTraits::<u8, Quad<u8>>::new(
                            maxval,
                            parameters.near_lossless,
                            preset.reset_value,
                        ),
                        frame_info,
                        parameters,
                        preset
                        $(, $argument)*
                    )
                } else {
                    $operation(
                        DefaultTraits::<u16, Quad<u16>>::new(
                            maxval,
                            parameters.near_lossless,
                            preset.reset_value,
                        ),
                        frame_info,
                        parameters,
                        preset
                        $(, $argument)*
                    )
                }
            }
            _ => {
                if optimized && frame_info.bits_per_sample == 8 {
                    $operation(
                        LosslessTraits::<u8, u8, 8>::new(),
                        frame_info,
                        parameters,
                        preset
                        $(, $argument)*
                    )
                } else if optimized && frame_info.bits_per_sample == 10 {
                    $operation(
                        LosslessTraits::<u16, u16, 10>::new(),
                        frame_info,
                        parameters,
                        preset
                        $(, $argument)*
                    )
                } else if optimized && frame_info.bits_per_sample == 12 {
                    $operation(
                        LosslessTraits::<u16, u16, 12>::new(),
                        frame_info,
                        parameters,
                        preset
                        $(, $argument)*
                    )
                } else if optimized && frame_info.bits_per_sample == 16 {
                    $operation(
                        LosslessTraits::<u16, u16, 16>::new(),
                        frame_info,
                        parameters,
                        preset
                        $(, $argument)*
                    )
                } else if frame_info.bits_per_sample <= 8 {
                    $operation(
                        DefaultTraits::<u8, u8>::new(
                            maxval,
                            parameters.near_lossless,
                            preset.reset_value,
                        ),
                        frame_info,
                        parameters,
                        preset
                        $(, $argument)*
                    )
                } else {
                    $operation(
                        DefaultTraits::<u16, u16>::new(
                            maxval,
                            parameters.near_lossless,
                            preset.reset_value,
                        ),
                        frame_info,
                        parameters,
                        preset
                        $(, $argument)*
                    )
                }
            }
        }
    }};
}

/// Encodes one scan into `destination`, returning the number of entropy
/// bytes written.
///
/// `source` holds the raw pixels, packed: for `InterleaveMode::None` one
/// component plane (call once per component), otherwise the full
/// sample-interleaved image. 16-bit samples are native-endian.
pub fn encode_scan(
    frame_info: &FrameInfo,
    parameters: &CodingParameters,
    preset: &PresetCodingParameters,
    source: &[u8],
    destination: &mut [u8],
) -> Result<usize, Error> {
    validate_parameters(frame_info, parameters)?;
    let preset = validate_preset_coding_parameters(
        preset,
        (1 << frame_info.bits_per_sample) - 1,
        parameters.near_lossless,
    )?;

    if source.len() < raw_size(frame_info, parameters, &Rect::full_frame(frame_info)) {
        return Err(Error::InvalidArgumentSize);
    }

    debug!(
        "encoding scan: {}x{}, {} bpp, {} component(s), near {}, {:?}",
        frame_info.width,
        frame_info.height,
        frame_info.bits_per_sample,
        frame_info.component_count,
        parameters.near_lossless,
        parameters.interleave_mode
    );

    dispatch!(frame_info, parameters, &preset, encode_with, source, destination)
}

/// Decodes one scan from `source` into `destination`, returning the number
/// of entropy bytes consumed.
///
/// `roi` restricts which lines and columns are written; `None` decodes the
/// full frame. The destination receives `roi.width * roi.height` packed
/// pixels.
pub fn decode_scan(
    frame_info: &FrameInfo,
    parameters: &CodingParameters,
    preset: &PresetCodingParameters,
    source: &[u8],
    destination: &mut [u8],
    roi: Option<Rect>,
) -> Result<usize, Error> {
    validate_parameters(frame_info, parameters)?;
    let preset = validate_preset_coding_parameters(
        preset,
        (1 << frame_info.bits_per_sample) - 1,
        parameters.near_lossless,
    )?;

    let rect = roi.unwrap_or_else(|| Rect::full_frame(frame_info));
    if rect.x + rect.width > frame_info.width as usize
        || rect.y + rect.height > frame_info.height as usize
    {
        return Err(Error::InvalidArgumentRegionOfInterest);
    }
    if destination.len() < raw_size(frame_info, parameters, &rect) {
        return Err(Error::DestinationTooSmall);
    }

    debug!(
        "decoding scan: {}x{}, {} bpp, {} component(s), near {}, {:?}, {} source bytes",
        frame_info.width,
        frame_info.height,
        frame_info.bits_per_sample,
        frame_info.component_count,
        parameters.near_lossless,
        parameters.interleave_mode,
        source.len()
    );

    dispatch!(frame_info, parameters, &preset, decode_with, source, destination, rect)
}


fn encode_with<T: Traits>(
    traits: T,
    frame_info: &FrameInfo,
    parameters: &CodingParameters,
    preset: &PresetCodingParameters,
    source: &[u8],
    destination: &mut [u8],
) -> Result<usize, Error> {
    let component_count = components_in_scan(frame_info, parameters);
    let mut line_source = RawByteLineSource::<T::Sample, T::Pixel>::new(
        source,
        parameters.interleave_mode,
        component_count,
        parameters.transformation,
    );
    let mut encoder = ScanEncoder::new(
        traits,
        *frame_info,
        parameters.interleave_mode,
        preset,
        destination,
    );
    encoder.encode_scan(&mut line_source)
}

fn decode_with<T: Traits>(
    traits: T,
    frame_info: &FrameInfo,
    parameters: &CodingParameters,
    preset: &PresetCodingParameters,
    source: &[u8],
    destination: &mut [u8],
    rect: Rect,
) -> Result<usize, Error> {
    let component_count = components_in_scan(frame_info, parameters);
    let mut line_sink = RawByteLineSink::<T::Sample, T::Pixel>::new(
        destination,
        parameters.interleave_mode,
        component_count,
        parameters.transformation,
    );
    let mut decoder = ScanDecoder::new(
        traits,
        *frame_info,
        parameters.interleave_mode,
        preset,
        source,
        rect,
    )?;
    decoder.decode_scan(&mut line_sink)
}

/// Number of components carried by one scan call: one per call in
/// `InterleaveMode::None`, all of them otherwise.
fn components_in_scan(frame_info: &FrameInfo, parameters: &CodingParameters) -> usize {
    if parameters.interleave_mode == InterleaveMode::None {
        1
    } else {
        frame_info.component_count as usize
    }
}

fn raw_size(frame_info: &FrameInfo, parameters: &CodingParameters, rect: &Rect) -> usize {
    let bytes_per_sample = if frame_info.bits_per_sample <= 8 { 1 } else { 2 };
    rect.width * rect.height * components_in_scan(frame_info, parameters) * bytes_per_sample
}

fn validate_parameters(
    frame_info: &FrameInfo,
    parameters: &CodingParameters,
) -> Result<(), Error> {
    if frame_info.width < MINIMUM_WIDTH || frame_info.width > MAXIMUM_WIDTH {
        return Err(Error::InvalidArgumentWidth);
    }
    if frame_info.height < MINIMUM_HEIGHT || frame_info.height > MAXIMUM_HEIGHT {
        return Err(Error::InvalidArgumentHeight);
    }
    if frame_info.bits_per_sample < MINIMUM_BITS_PER_SAMPLE
        || frame_info.bits_per_sample > MAXIMUM_BITS_PER_SAMPLE
    {
        return Err(Error::InvalidArgumentBitsPerSample);
    }
    if frame_info.component_count < MINIMUM_COMPONENT_COUNT
        || frame_info.component_count > MAXIMUM_COMPONENT_COUNT
    {
        return Err(Error::InvalidArgumentComponentCount);
    }

    // Sample interleave needs pixels the line buffer can hold: triplets or
    // quads. Everything else is restricted to one component per scan.
    match frame_info.component_count {
        3 | 4 => {}
        _ => {
            if parameters.interleave_mode != InterleaveMode::None {
                return Err(Error::InvalidArgumentInterleaveMode);
            }
        }
    }

    let maximum_sample_value = (1 << frame_info.bits_per_sample) - 1;
    if parameters.near_lossless < 0
        || parameters.near_lossless > compute_maximum_near_lossless(maximum_sample_value)
    {
        return Err(Error::InvalidArgumentNearLossless);
    }

    if parameters.transformation != ColorTransformation::None {
        if frame_info.component_count != 3
            || parameters.interleave_mode == InterleaveMode::None
        {
            return Err(Error::UnsupportedColorTransform);
        }
        if frame_info.bits_per_sample != 8 {
            return Err(Error::UnsupportedBitDepthForTransform);
        }
    }
    Ok(())
}
