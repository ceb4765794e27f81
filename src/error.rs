use thiserror::Error;

/// Errors reported at the scan boundary.
///
/// Decode failures abort the scan immediately; partial output up to the
/// failure point must be discarded by the caller.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    #[error("Invalid compressed data")]
    InvalidCompressedData,
    #[error("Too much compressed data")]
    TooMuchCompressedData,
    #[error("Destination buffer too small")]
    DestinationTooSmall,

    #[error("Invalid argument: width")]
    InvalidArgumentWidth,
    #[error("Invalid argument: height")]
    InvalidArgumentHeight,
    #[error("Invalid argument: bits per sample")]
    InvalidArgumentBitsPerSample,
    #[error("Invalid argument: component count")]
    InvalidArgumentComponentCount,
    #[error("Invalid argument: interleave mode")]
    InvalidArgumentInterleaveMode,
    #[error("Invalid argument: near lossless")]
    InvalidArgumentNearLossless,
    #[error("Invalid argument: preset coding parameters")]
    InvalidArgumentPresetCodingParameters,
    #[error("Invalid argument: source or destination size")]
    InvalidArgumentSize,
    #[error("Invalid argument: region of interest")]
    InvalidArgumentRegionOfInterest,

    #[error("Color transformation not supported for this component configuration")]
    UnsupportedColorTransform,
    #[error("Bit depth not supported for this color transformation")]
    UnsupportedBitDepthForTransform,
}
