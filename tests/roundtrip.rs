//! End-to-end scan round-trip tests.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use jpegls_rs::{
    decode_scan, encode_scan, CodingParameters, ColorTransformation, Error, FrameInfo,
    InterleaveMode, PresetCodingParameters, Rect,
};

fn frame(width: u32, height: u32, bits_per_sample: i32, component_count: i32) -> FrameInfo {
    FrameInfo {
        width,
        height,
        bits_per_sample,
        component_count,
    }
}

fn parameters(interleave_mode: InterleaveMode, near_lossless: i32) -> CodingParameters {
    CodingParameters {
        near_lossless,
        interleave_mode,
        transformation: ColorTransformation::None,
    }
}

fn encode(
    frame_info: &FrameInfo,
    parameters: &CodingParameters,
    preset: &PresetCodingParameters,
    pixels: &[u8],
) -> Vec<u8> {
    let mut encoded = vec![0u8; pixels.len() * 2 + 1024];
    let length = encode_scan(frame_info, parameters, preset, pixels, &mut encoded)
        .expect("encode should succeed");
    encoded.truncate(length);
    encoded
}

fn decode(
    frame_info: &FrameInfo,
    parameters: &CodingParameters,
    preset: &PresetCodingParameters,
    encoded: &[u8],
    raw_length: usize,
) -> Vec<u8> {
    let mut decoded = vec![0u8; raw_length];
    let consumed = decode_scan(frame_info, parameters, preset, encoded, &mut decoded, None)
        .expect("decode should succeed");
    assert_eq!(consumed, encoded.len(), "scan should consume every byte");
    decoded
}

fn assert_round_trip(
    frame_info: &FrameInfo,
    parameters: &CodingParameters,
    pixels: &[u8],
) -> Vec<u8> {
    let preset = PresetCodingParameters::default();
    let encoded = encode(frame_info, parameters, &preset, pixels);
    assert_no_marker(&encoded);
    let decoded = decode(frame_info, parameters, &preset, &encoded, pixels.len());
    assert_eq!(decoded, pixels, "round trip must be the identity");
    encoded
}

/// Byte-stuffing soundness: no 0xFF inside a scan may be followed by a byte
/// with the high bit set.
fn assert_no_marker(encoded: &[u8]) {
    for (i, pair) in encoded.windows(2).enumerate() {
        assert!(
            !(pair[0] == 0xFF && pair[1] >= 0x80),
            "marker at offset {i}: {:02X} {:02X}",
            pair[0],
            pair[1]
        );
    }
}

fn to_bytes(samples: &[u16]) -> Vec<u8> {
    samples.iter().flat_map(|s| s.to_ne_bytes()).collect()
}

fn from_bytes(bytes: &[u8]) -> Vec<u16> {
    bytes
        .chunks_exact(2)
        .map(|c| u16::from_ne_bytes([c[0], c[1]]))
        .collect()
}

#[test]
fn flat_gray_lines_collapse_into_runs() {
    let frame_info = frame(4, 2, 8, 1);
    let pixels = [0u8; 8];
    let encoded = assert_round_trip(&frame_info, &parameters(InterleaveMode::None, 0), &pixels);
    // Two all-zero lines cost a handful of run bits.
    assert!(encoded.len() <= 2, "flat image took {} bytes", encoded.len());
}

#[test]
fn two_sample_edge_round_trips() {
    let frame_info = frame(2, 1, 8, 1);
    let pixels = [0u8, 255];
    let encoded = assert_round_trip(&frame_info, &parameters(InterleaveMode::None, 0), &pixels);
    assert!(!encoded.is_empty());
}

#[test]
fn twelve_bit_extremes_round_trip() {
    let frame_info = frame(3, 1, 12, 1);
    let pixels = to_bytes(&[0, 2048, 4095]);
    assert_round_trip(&frame_info, &parameters(InterleaveMode::None, 0), &pixels);
}

#[test]
fn flat_rgb_sample_interleaved_uses_run_mode() {
    let frame_info = frame(2, 2, 8, 3);
    let pixels = [10u8, 20, 30, 10, 20, 30, 10, 20, 30, 10, 20, 30];
    let encoded = assert_round_trip(&frame_info, &parameters(InterleaveMode::Sample, 0), &pixels);
    assert!(
        encoded.len() <= 8,
        "flat triplets took {} bytes",
        encoded.len()
    );
}

#[test]
fn near_lossless_ramp_stays_within_tolerance() {
    let near = 2;
    let frame_info = frame(5, 1, 8, 1);
    let pixels = [0u8, 1, 2, 3, 4];
    let preset = PresetCodingParameters::default();
    let coding = parameters(InterleaveMode::None, near);

    let encoded = encode(&frame_info, &coding, &preset, &pixels);
    assert!(encoded.len() < 5, "near-lossless took {} bytes", encoded.len());
    let decoded = decode(&frame_info, &coding, &preset, &encoded, pixels.len());
    for (original, reconstructed) in pixels.iter().zip(&decoded) {
        assert!((i32::from(*original) - i32::from(*reconstructed)).abs() <= near);
    }
}

#[test]
fn marker_inside_the_stream_is_rejected() {
    let mut rng = StdRng::seed_from_u64(6);
    let frame_info = frame(16, 16, 8, 1);
    let pixels: Vec<u8> = (0..256).map(|_| rng.gen()).collect();
    let preset = PresetCodingParameters::default();
    let coding = parameters(InterleaveMode::None, 0);

    let mut encoded = encode(&frame_info, &coding, &preset, &pixels);
    let middle = encoded.len() / 2;
    encoded[middle] = 0xFF;
    encoded[middle + 1] = 0x90;

    let mut decoded = vec![0u8; pixels.len()];
    assert_eq!(
        decode_scan(&frame_info, &coding, &preset, &encoded, &mut decoded, None),
        Err(Error::InvalidCompressedData)
    );
}

#[test]
fn trailing_garbage_is_rejected() {
    let frame_info = frame(8, 8, 8, 1);
    let pixels: Vec<u8> = (0..64).map(|i| (i * 3) as u8).collect();
    let preset = PresetCodingParameters::default();
    let coding = parameters(InterleaveMode::None, 0);

    let mut encoded = encode(&frame_info, &coding, &preset, &pixels);
    encoded.extend_from_slice(&[0x55, 0x55]);

    let mut decoded = vec![0u8; pixels.len()];
    assert_eq!(
        decode_scan(&frame_info, &coding, &preset, &encoded, &mut decoded, None),
        Err(Error::TooMuchCompressedData)
    );
}

#[test]
fn random_gray_8_bit_round_trips() {
    let mut rng = StdRng::seed_from_u64(1);
    let frame_info = frame(31, 17, 8, 1);
    let pixels: Vec<u8> = (0..31 * 17).map(|_| rng.gen()).collect();
    assert_round_trip(&frame_info, &parameters(InterleaveMode::None, 0), &pixels);
}

#[test]
fn random_gray_16_bit_round_trips() {
    let mut rng = StdRng::seed_from_u64(2);
    let frame_info = frame(23, 11, 16, 1);
    let samples: Vec<u16> = (0..23 * 11).map(|_| rng.gen()).collect();
    assert_round_trip(
        &frame_info,
        &parameters(InterleaveMode::None, 0),
        &to_bytes(&samples),
    );
}

#[test]
fn random_gray_10_bit_round_trips() {
    let mut rng = StdRng::seed_from_u64(3);
    let frame_info = frame(19, 7, 10, 1);
    let samples: Vec<u16> = (0..19 * 7).map(|_| rng.gen_range(0..1024)).collect();
    assert_round_trip(
        &frame_info,
        &parameters(InterleaveMode::None, 0),
        &to_bytes(&samples),
    );
}

#[test]
fn smooth_gradient_mixes_run_and_regular_mode() {
    let frame_info = frame(64, 64, 8, 1);
    let pixels: Vec<u8> = (0..64 * 64)
        .map(|i| ((i % 64 + i / 64) / 2) as u8)
        .collect();
    let encoded = assert_round_trip(&frame_info, &parameters(InterleaveMode::None, 0), &pixels);
    assert!(encoded.len() < pixels.len(), "gradient should compress");
}

#[test]
fn all_white_image_round_trips() {
    let frame_info = frame(32, 4, 8, 1);
    let pixels = [255u8; 128];
    assert_round_trip(&frame_info, &parameters(InterleaveMode::None, 0), &pixels);
}

#[test]
fn rgb_line_interleaved_round_trips() {
    let mut rng = StdRng::seed_from_u64(4);
    let frame_info = frame(13, 9, 8, 3);
    let pixels: Vec<u8> = (0..13 * 9 * 3).map(|_| rng.gen()).collect();
    assert_round_trip(&frame_info, &parameters(InterleaveMode::Line, 0), &pixels);
}

#[test]
fn rgb_sample_interleaved_round_trips() {
    let mut rng = StdRng::seed_from_u64(5);
    let frame_info = frame(13, 9, 8, 3);
    let pixels: Vec<u8> = (0..13 * 9 * 3).map(|_| rng.gen()).collect();
    assert_round_trip(&frame_info, &parameters(InterleaveMode::Sample, 0), &pixels);
}

#[test]
fn rgb_16_bit_line_interleaved_round_trips() {
    let mut rng = StdRng::seed_from_u64(14);
    let frame_info = frame(7, 5, 16, 3);
    let samples: Vec<u16> = (0..7 * 5 * 3).map(|_| rng.gen()).collect();
    assert_round_trip(
        &frame_info,
        &parameters(InterleaveMode::Line, 0),
        &to_bytes(&samples),
    );
}

#[test]
fn rgba_sample_interleaved_round_trips() {
    let mut rng = StdRng::seed_from_u64(7);
    let frame_info = frame(8, 8, 8, 4);
    let pixels: Vec<u8> = (0..8 * 8 * 4).map(|_| rng.gen()).collect();
    assert_round_trip(&frame_info, &parameters(InterleaveMode::Sample, 0), &pixels);
}

#[test]
fn planar_components_encode_as_separate_scans() {
    // InterleaveMode::None with a multi-component image: one scan per plane.
    let mut rng = StdRng::seed_from_u64(8);
    let frame_info = frame(16, 8, 8, 3);
    let coding = parameters(InterleaveMode::None, 0);
    for _ in 0..3 {
        let plane: Vec<u8> = (0..16 * 8).map(|_| rng.gen()).collect();
        assert_round_trip(&frame_info, &coding, &plane);
    }
}

#[test]
fn near_lossless_random_respects_the_bound() {
    for (bits, near, seed) in [(8, 3, 9u64), (12, 5, 10u64)] {
        let mut rng = StdRng::seed_from_u64(seed);
        let frame_info = frame(21, 13, bits, 1);
        let maximum = (1u32 << bits) - 1;
        let samples: Vec<u16> = (0..21 * 13)
            .map(|_| rng.gen_range(0..=maximum) as u16)
            .collect();
        let pixels = to_bytes(&samples);
        let preset = PresetCodingParameters::default();
        let coding = parameters(InterleaveMode::None, near);

        let encoded = encode(&frame_info, &coding, &preset, &pixels);
        assert_no_marker(&encoded);
        let decoded = decode(&frame_info, &coding, &preset, &encoded, pixels.len());
        for (original, reconstructed) in samples.iter().zip(from_bytes(&decoded)) {
            assert!(
                (i32::from(*original) - i32::from(reconstructed)).abs() <= near,
                "bits={bits} near={near}"
            );
            assert!(u32::from(reconstructed) <= maximum);
        }
    }
}

#[test]
fn color_transforms_round_trip() {
    let mut rng = StdRng::seed_from_u64(11);
    let frame_info = frame(11, 7, 8, 3);
    let pixels: Vec<u8> = (0..11 * 7 * 3).map(|_| rng.gen()).collect();
    for transformation in [
        ColorTransformation::Hp1,
        ColorTransformation::Hp2,
        ColorTransformation::Hp3,
    ] {
        for interleave_mode in [InterleaveMode::Line, InterleaveMode::Sample] {
            let coding = CodingParameters {
                near_lossless: 0,
                interleave_mode,
                transformation,
            };
            assert_round_trip(&frame_info, &coding, &pixels);
        }
    }
}

#[test]
fn custom_preset_parameters_round_trip() {
    let mut rng = StdRng::seed_from_u64(12);
    let frame_info = frame(17, 9, 8, 1);
    let pixels: Vec<u8> = (0..17 * 9).map(|_| rng.gen()).collect();
    let preset = PresetCodingParameters {
        maximum_sample_value: 255,
        threshold1: 5,
        threshold2: 10,
        threshold3: 20,
        reset_value: 31,
    };
    let coding = parameters(InterleaveMode::None, 0);

    let encoded = encode(&frame_info, &coding, &preset, &pixels);
    assert_no_marker(&encoded);
    let decoded = decode(&frame_info, &coding, &preset, &encoded, pixels.len());
    assert_eq!(decoded, pixels);
}

#[test]
fn reduced_maxval_preset_round_trips() {
    let mut rng = StdRng::seed_from_u64(13);
    let frame_info = frame(12, 12, 8, 1);
    let pixels: Vec<u8> = (0..144).map(|_| rng.gen_range(0..=100)).collect();
    let preset = PresetCodingParameters {
        maximum_sample_value: 100,
        ..Default::default()
    };
    let coding = parameters(InterleaveMode::None, 0);

    let encoded = encode(&frame_info, &coding, &preset, &pixels);
    let decoded = decode(&frame_info, &coding, &preset, &encoded, pixels.len());
    assert_eq!(decoded, pixels);
}

#[test]
fn single_pixel_and_single_line_edges_round_trip() {
    assert_round_trip(&frame(1, 1, 8, 1), &parameters(InterleaveMode::None, 0), &[77]);
    assert_round_trip(
        &frame(1, 8, 8, 1),
        &parameters(InterleaveMode::None, 0),
        &[0, 10, 20, 255, 0, 1, 2, 3],
    );
    assert_round_trip(
        &frame(8, 1, 8, 1),
        &parameters(InterleaveMode::None, 0),
        &[0, 10, 20, 255, 0, 1, 2, 3],
    );
}

#[test]
fn region_of_interest_decodes_the_requested_window() {
    let frame_info = frame(16, 16, 8, 1);
    let pixels: Vec<u8> = (0..256).map(|i| (i % 251) as u8).collect();
    let preset = PresetCodingParameters::default();
    let coding = parameters(InterleaveMode::None, 0);

    let encoded = encode(&frame_info, &coding, &preset, &pixels);
    let roi = Rect {
        x: 4,
        y: 4,
        width: 8,
        height: 8,
    };
    let mut window = vec![0u8; roi.width * roi.height];
    decode_scan(&frame_info, &coding, &preset, &encoded, &mut window, Some(roi)).unwrap();

    for row in 0..roi.height {
        for column in 0..roi.width {
            assert_eq!(
                window[row * roi.width + column],
                pixels[(roi.y + row) * 16 + roi.x + column],
                "mismatch at ({column}, {row})"
            );
        }
    }
}

#[test]
fn out_of_bounds_region_is_rejected() {
    let frame_info = frame(8, 8, 8, 1);
    let preset = PresetCodingParameters::default();
    let coding = parameters(InterleaveMode::None, 0);
    let encoded = encode(&frame_info, &coding, &preset, &[0u8; 64]);

    let roi = Rect {
        x: 4,
        y: 0,
        width: 8,
        height: 8,
    };
    let mut window = vec![0u8; 64];
    assert_eq!(
        decode_scan(&frame_info, &coding, &preset, &encoded, &mut window, Some(roi)),
        Err(Error::InvalidArgumentRegionOfInterest)
    );
}

#[test]
fn undersized_buffers_are_rejected() {
    let frame_info = frame(8, 8, 8, 1);
    let preset = PresetCodingParameters::default();
    let coding = parameters(InterleaveMode::None, 0);

    let mut encoded = vec![0u8; 256];
    assert_eq!(
        encode_scan(&frame_info, &coding, &preset, &[0u8; 63], &mut encoded),
        Err(Error::InvalidArgumentSize)
    );

    let length = encode_scan(&frame_info, &coding, &preset, &[0u8; 64], &mut encoded).unwrap();
    let mut decoded = vec![0u8; 63];
    assert_eq!(
        decode_scan(&frame_info, &coding, &preset, &encoded[..length], &mut decoded, None),
        Err(Error::DestinationTooSmall)
    );
}
