/// Default RESET value as defined in ISO/IEC 14495-1, table C.2.
pub const DEFAULT_RESET_VALUE: i32 = 64;

pub const MINIMUM_WIDTH: u32 = 1;
pub const MAXIMUM_WIDTH: u32 = 65535;
pub const MINIMUM_HEIGHT: u32 = 1;
pub const MAXIMUM_HEIGHT: u32 = 65535;
pub const MINIMUM_COMPONENT_COUNT: i32 = 1;
pub const MAXIMUM_COMPONENT_COUNT: i32 = 255;
pub const MINIMUM_BITS_PER_SAMPLE: i32 = 2;
pub const MAXIMUM_BITS_PER_SAMPLE: i32 = 16;
pub const MAXIMUM_NEAR_LOSSLESS: i32 = 255;

/// Number of regular-mode contexts after gradient sign folding.
pub const CONTEXT_COUNT: usize = 365;

/// Upper bound on the Golomb coding parameter. The theoretical limit is 32;
/// a decoded stream that pushes k there is corrupt.
pub const MAX_K_VALUE: i32 = 32;

/// First byte of a JPEG marker. Inside the entropy stream every 0xFF byte is
/// followed by a stuffed zero bit.
pub const JPEG_MARKER_START_BYTE: u8 = 0xFF;

/// Order of run-length codes as defined in ISO/IEC 14495-1, code segment A.15.
pub const J: [i32; 32] = [
    0, 0, 0, 0, 1, 1, 1, 1, 2, 2, 2, 2, 3, 3, 3, 3, 4, 4, 5, 5, 6, 6, 7, 7, 8, 9, 10, 11, 12, 13,
    14, 15,
];
