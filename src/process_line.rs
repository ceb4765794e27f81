//! The line-transform plug point between raw pixel buffers and the scan
//! line buffers.
//!
//! The scan driver never touches raw memory directly: on encode it pulls one
//! logical image line at a time through [`RawLineSource`], on decode it
//! pushes finished lines through [`RawLineSink`]. The built-in
//! implementations cover the three interleave layouts and apply the optional
//! color transform; callers with exotic layouts can supply their own.

use std::marker::PhantomData;

use crate::color_transform;
use crate::error::Error;
use crate::traits::{Pixel, Sample};
use crate::{ColorTransformation, InterleaveMode};

/// Pull interface used by the encoder to obtain raw image lines.
///
/// `destination` starts at the first sample slot of the first component; in
/// line-interleaved scans the row of component `c` begins at
/// `c * pixel_stride`.
pub trait RawLineSource<P> {
    fn new_line_requested(
        &mut self,
        destination: &mut [P],
        pixel_count: usize,
        pixel_stride: usize,
    ) -> Result<(), Error>;
}

/// Push interface used by the decoder to deliver finished raw image lines.
pub trait RawLineSink<P> {
    fn new_line_decoded(
        &mut self,
        source: &[P],
        pixel_count: usize,
        pixel_stride: usize,
    ) -> Result<(), Error>;
}

fn pixel_from_sample<S: Sample, P: Pixel<S>>(sample: S) -> P {
    let mut pixel = P::default();
    pixel.set_component(0, sample);
    pixel
}

fn transform_pixel<S: Sample, P: Pixel<S>>(
    transformation: ColorTransformation,
    mut pixel: P,
) -> P {
    if P::COMPONENT_COUNT == 3 && transformation != ColorTransformation::None {
        let range = 1 << (8 * S::SIZE);
        let (v1, v2, v3) = color_transform::forward(
            transformation,
            pixel.component(0).to_i32(),
            pixel.component(1).to_i32(),
            pixel.component(2).to_i32(),
            range as i32,
        );
        pixel.set_component(0, S::from_i32(v1));
        pixel.set_component(1, S::from_i32(v2));
        pixel.set_component(2, S::from_i32(v3));
    }
    pixel
}

fn inverse_transform_pixel<S: Sample, P: Pixel<S>>(
    transformation: ColorTransformation,
    mut pixel: P,
) -> P {
    if P::COMPONENT_COUNT == 3 && transformation != ColorTransformation::None {
        let range = 1 << (8 * S::SIZE);
        let (red, green, blue) = color_transform::inverse(
            transformation,
            pixel.component(0).to_i32(),
            pixel.component(1).to_i32(),
            pixel.component(2).to_i32(),
            range as i32,
        );
        pixel.set_component(0, S::from_i32(red));
        pixel.set_component(1, S::from_i32(green));
        pixel.set_component(2, S::from_i32(blue));
    }
    pixel
}

/// Reads raw lines from a packed byte buffer.
///
/// For `InterleaveMode::None` and `Sample` the pixels are copied as-is; for
/// `Line` the raw samples are pixel-interleaved and get split into
/// component-planar rows `pixel_stride` apart.
pub struct RawByteLineSource<'a, S: Sample, P: Pixel<S>> {
    raw: &'a [u8],
    position: usize,
    interleave_mode: InterleaveMode,
    component_count: usize,
    transformation: ColorTransformation,
    _marker: PhantomData<(S, P)>,
}

impl<'a, S: Sample, P: Pixel<S>> RawByteLineSource<'a, S, P> {
    pub fn new(
        raw: &'a [u8],
        interleave_mode: InterleaveMode,
        component_count: usize,
        transformation: ColorTransformation,
    ) -> Self {
        Self {
            raw,
            position: 0,
            interleave_mode,
            component_count,
            transformation,
            _marker: PhantomData,
        }
    }
}

impl<S: Sample, P: Pixel<S>> RawLineSource<P> for RawByteLineSource<'_, S, P> {
    fn new_line_requested(
        &mut self,
        destination: &mut [P],
        pixel_count: usize,
        pixel_stride: usize,
    ) -> Result<(), Error> {
        match self.interleave_mode {
            InterleaveMode::Line => {
                if self.transformation == ColorTransformation::None {
                    for i in 0..pixel_count {
                        for component in 0..self.component_count {
                            let sample = S::read_from(&self.raw[self.position..]);
                            self.position += S::SIZE;
                            destination[component * pixel_stride + i] = pixel_from_sample(sample);
                        }
                    }
                } else {
                    let range = 1 << (8 * S::SIZE);
                    for i in 0..pixel_count {
                        let red = S::read_from(&self.raw[self.position..]).to_i32();
                        let green = S::read_from(&self.raw[self.position + S::SIZE..]).to_i32();
                        let blue = S::read_from(&self.raw[self.position + 2 * S::SIZE..]).to_i32();
                        self.position += 3 * S::SIZE;
                        let (v1, v2, v3) = color_transform::forward(
                            self.transformation,
                            red,
                            green,
                            blue,
                            range as i32,
                        );
                        destination[i] = pixel_from_sample(S::from_i32(v1));
                        destination[pixel_stride + i] = pixel_from_sample(S::from_i32(v2));
                        destination[2 * pixel_stride + i] = pixel_from_sample(S::from_i32(v3));
                    }
                }
            }
            InterleaveMode::None | InterleaveMode::Sample => {
                let pixel_size = P::COMPONENT_COUNT * S::SIZE;
                for slot in destination.iter_mut().take(pixel_count) {
                    let pixel = P::read_raw(&self.raw[self.position..]);
                    self.position += pixel_size;
                    *slot = transform_pixel::<S, P>(self.transformation, pixel);
                }
            }
        }
        Ok(())
    }
}

/// Writes decoded lines to a packed byte buffer, the counterpart of
/// [`RawByteLineSource`].
pub struct RawByteLineSink<'a, S: Sample, P: Pixel<S>> {
    raw: &'a mut [u8],
    position: usize,
    interleave_mode: InterleaveMode,
    component_count: usize,
    transformation: ColorTransformation,
    _marker: PhantomData<(S, P)>,
}

impl<'a, S: Sample, P: Pixel<S>> RawByteLineSink<'a, S, P> {
    pub fn new(
        raw: &'a mut [u8],
        interleave_mode: InterleaveMode,
        component_count: usize,
        transformation: ColorTransformation,
    ) -> Self {
        Self {
            raw,
            position: 0,
            interleave_mode,
            component_count,
            transformation,
            _marker: PhantomData,
        }
    }

    /// Bytes delivered so far.
    pub fn bytes_written(&self) -> usize {
        self.position
    }
}

impl<S: Sample, P: Pixel<S>> RawLineSink<P> for RawByteLineSink<'_, S, P> {
    fn new_line_decoded(
        &mut self,
        source: &[P],
        pixel_count: usize,
        pixel_stride: usize,
    ) -> Result<(), Error> {
        match self.interleave_mode {
            InterleaveMode::Line => {
                if self.transformation == ColorTransformation::None {
                    for i in 0..pixel_count {
                        for component in 0..self.component_count {
                            source[component * pixel_stride + i]
                                .component(0)
                                .write_to(&mut self.raw[self.position..]);
                            self.position += S::SIZE;
                        }
                    }
                } else {
                    let range = 1 << (8 * S::SIZE);
                    for i in 0..pixel_count {
                        let (red, green, blue) = color_transform::inverse(
                            self.transformation,
                            source[i].component(0).to_i32(),
                            source[pixel_stride + i].component(0).to_i32(),
                            source[2 * pixel_stride + i].component(0).to_i32(),
                            range as i32,
                        );
                        S::from_i32(red).write_to(&mut self.raw[self.position..]);
                        S::from_i32(green).write_to(&mut self.raw[self.position + S::SIZE..]);
                        S::from_i32(blue).write_to(&mut self.raw[self.position + 2 * S::SIZE..]);
                        self.position += 3 * S::SIZE;
                    }
                }
            }
            InterleaveMode::None | InterleaveMode::Sample => {
                let pixel_size = P::COMPONENT_COUNT * S::SIZE;
                for pixel in source.iter().take(pixel_count) {
                    let pixel = inverse_transform_pixel::<S, P>(self.transformation, *pixel);
                    pixel.write_raw(&mut self.raw[self.position..]);
                    self.position += pixel_size;
                }
            }
        }
        Ok(())
    }
}
