//! Scan decoder: the inverse of the scan encoder, with a short-code lookup
//! fast path and region-of-interest restricted output.

use std::borrow::Cow;

use crate::bit_reader::BitReader;
use crate::coding_parameters::PresetCodingParameters;
use crate::constants::{CONTEXT_COUNT, J, MAX_K_VALUE};
use crate::error::Error;
use crate::golomb_lut::{GOLOMB_TABLES, GOLOMB_TABLE_COUNT};
use crate::process_line::RawLineSink;
use crate::quantization_lut::{quantization_table, quantize_gradient_org};
use crate::regular_mode_context::RegularModeContext;
use crate::run_mode_context::RunModeContext;
use crate::scan_codec::{compute_context_id, get_predicted_value, unmap_err_val};
use crate::traits::{apply_sign, bit_wise_sign, Pixel, Sample, Traits};
use crate::{FrameInfo, InterleaveMode, Rect};

pub struct ScanDecoder<'a, T: Traits> {
    traits: T,
    frame_info: FrameInfo,
    interleave_mode: InterleaveMode,
    reader: BitReader<'a>,
    rect: Rect,

    contexts: [RegularModeContext; CONTEXT_COUNT],
    run_mode_contexts: [RunModeContext; 2],
    run_index: usize,

    threshold1: i32,
    threshold2: i32,
    threshold3: i32,
    quantization: Cow<'static, [i8]>,
    gradient_range: i32,
}

impl<'a, T: Traits> ScanDecoder<'a, T> {
    pub fn new(
        traits: T,
        frame_info: FrameInfo,
        interleave_mode: InterleaveMode,
        preset: &PresetCodingParameters,
        source: &'a [u8],
        rect: Rect,
    ) -> Result<Self, Error> {
        let range = traits.range();
        Ok(Self {
            frame_info,
            interleave_mode,
            reader: BitReader::new(source)?,
            rect,
            contexts: [RegularModeContext::new(range); CONTEXT_COUNT],
            run_mode_contexts: [RunModeContext::new(0, range), RunModeContext::new(1, range)],
            run_index: 0,
            threshold1: preset.threshold1,
            threshold2: preset.threshold2,
            threshold3: preset.threshold3,
            quantization: quantization_table(frame_info.bits_per_sample, traits.near(), preset),
            gradient_range: 1 << frame_info.bits_per_sample,
            traits,
        })
    }

    /// Decodes one complete scan, returning the number of source bytes
    /// consumed. Every line is decoded for state correctness; only lines
    /// inside the region of interest reach the sink.
    pub fn decode_scan(
        &mut self,
        line_sink: &mut dyn RawLineSink<T::Pixel>,
    ) -> Result<usize, Error> {
        self.decode_lines(line_sink)?;
        self.reader.end_scan()?;
        Ok(self.reader.bytes_consumed())
    }

    fn decode_lines(&mut self, line_sink: &mut dyn RawLineSink<T::Pixel>) -> Result<(), Error> {
        let width = self.frame_info.width as usize;
        let height = self.frame_info.height as usize;
        let pixel_stride = width + 4;
        let component_count = if self.interleave_mode == InterleaveMode::Line {
            self.frame_info.component_count as usize
        } else {
            1
        };

        let mut line_buffer: Vec<T::Pixel> =
            vec![T::Pixel::default(); 2 * component_count * pixel_stride];
        let mut run_index_per_component = vec![0usize; component_count];

        for line in 0..height {
            let (first, second) = line_buffer.split_at_mut(component_count * pixel_stride);
            let (previous_line, current_line) = if line & 1 == 1 {
                (second, first)
            } else {
                (first, second)
            };

            for component in 0..component_count {
                self.run_index = run_index_per_component[component];
                let previous = &mut previous_line[component * pixel_stride..][..pixel_stride];
                let current = &mut current_line[component * pixel_stride..][..pixel_stride];

                previous[width + 1] = previous[width];
                current[0] = previous[1];

                self.decode_line(previous, current, width)?;
                run_index_per_component[component] = self.run_index;
            }

            if self.rect.y <= line && line < self.rect.y + self.rect.height {
                line_sink.new_line_decoded(
                    &current_line[1 + self.rect.x..],
                    self.rect.width,
                    pixel_stride,
                )?;
            }
        }
        Ok(())
    }

    fn decode_line(
        &mut self,
        previous: &[T::Pixel],
        current: &mut [T::Pixel],
        width: usize,
    ) -> Result<(), Error> {
        let component_count = <T::Pixel as Pixel<T::Sample>>::COMPONENT_COUNT;
        let mut index = 1;

        while index <= width {
            let ra = current[index - 1];
            let rc = previous[index - 1];
            let rb = previous[index];
            let rd = previous[index + 1];

            let mut qs = [0i32; 4];
            let mut all_zero = true;
            for component in 0..component_count {
                qs[component] = compute_context_id(
                    self.quantize_gradient(
                        rd.component(component).to_i32() - rb.component(component).to_i32(),
                    ),
                    self.quantize_gradient(
                        rb.component(component).to_i32() - rc.component(component).to_i32(),
                    ),
                    self.quantize_gradient(
                        rc.component(component).to_i32() - ra.component(component).to_i32(),
                    ),
                );
                if qs[component] != 0 {
                    all_zero = false;
                }
            }

            if all_zero {
                index += self.decode_run_mode(index, previous, current, width)?;
            } else {
                let mut reconstructed = T::Pixel::default();
                for component in 0..component_count {
                    let predicted = get_predicted_value(
                        ra.component(component).to_i32(),
                        rb.component(component).to_i32(),
                        rc.component(component).to_i32(),
                    );
                    let sample = self.decode_regular(qs[component], predicted)?;
                    reconstructed.set_component(component, sample);
                }
                current[index] = reconstructed;
                index += 1;
            }
        }
        Ok(())
    }

    fn decode_regular(&mut self, qs: i32, predicted: i32) -> Result<T::Sample, Error> {
        let sign = bit_wise_sign(qs);
        let context_index = apply_sign(qs, sign) as usize;

        let (k, context_c) = {
            let context = &self.contexts[context_index];
            (context.compute_golomb_coding_parameter()?, context.c())
        };
        let px = self
            .traits
            .correct_prediction(predicted + apply_sign(context_c, sign));

        let mut error_value;
        let code = if (k as usize) < GOLOMB_TABLE_COUNT {
            GOLOMB_TABLES[k as usize][self.reader.peek_byte()? as usize]
        } else {
            crate::golomb_lut::GolombCodeMatch {
                error_value: 0,
                bit_count: 0,
            }
        };
        if code.bit_count != 0 {
            self.reader.skip(i32::from(code.bit_count));
            error_value = i32::from(code.error_value);
        } else {
            error_value =
                unmap_err_val(self.decode_value(k, self.traits.limit(), self.traits.qbpp())?);
            if error_value.abs() > 65535 {
                return Err(Error::InvalidCompressedData);
            }
        }

        if k == 0 {
            error_value ^= self.contexts[context_index].get_error_correction(self.traits.near());
        }
        self.contexts[context_index].update_variables_and_bias(
            error_value,
            self.traits.near(),
            self.traits.reset(),
        )?;

        error_value = apply_sign(error_value, sign);
        Ok(self.traits.compute_reconstructed_sample(px, error_value))
    }

    fn decode_value(&mut self, k: i32, limit: i32, qbpp: i32) -> Result<i32, Error> {
        let high_bits = self.reader.read_high_bits()?;

        if high_bits >= limit - (qbpp + 1) {
            return Ok(self.reader.read_value(qbpp)? + 1);
        }

        if k == 0 {
            return Ok(high_bits);
        }

        let value = (i64::from(high_bits) << k) + i64::from(self.reader.read_value(k)?);
        if value > i64::from(i32::MAX) {
            return Err(Error::InvalidCompressedData);
        }
        Ok(value as i32)
    }

    fn decode_run_mode(
        &mut self,
        index: usize,
        previous: &[T::Pixel],
        current: &mut [T::Pixel],
        width: usize,
    ) -> Result<usize, Error> {
        let ra = current[index - 1];
        let count_type_remain = width - (index - 1);

        let run_length =
            self.decode_run_pixels(ra, &mut current[index..], count_type_remain as i32)? as usize;

        if run_length == count_type_remain {
            // The run reached the end of the line.
            return Ok(run_length);
        }

        let rb = previous[index + run_length];
        current[index + run_length] = self.decode_run_interruption_pixel(ra, rb)?;
        self.decrement_run_index();
        Ok(run_length + 1)
    }

    fn decode_run_pixels(
        &mut self,
        ra: T::Pixel,
        start: &mut [T::Pixel],
        pixel_count: i32,
    ) -> Result<i32, Error> {
        let mut index = 0;
        while self.reader.read_bit()? {
            let count = std::cmp::min(1 << J[self.run_index], pixel_count - index);
            index += count;
            debug_assert!(index <= pixel_count);

            if count == 1 << J[self.run_index] {
                self.increment_run_index();
            }
            if index == pixel_count {
                break;
            }
        }

        if index != pixel_count {
            // Incomplete run: the tail length follows in J bits.
            if J[self.run_index] > 0 {
                index += self.reader.read_value(J[self.run_index])?;
            }
        }

        if index > pixel_count {
            return Err(Error::InvalidCompressedData);
        }

        for slot in start.iter_mut().take(index as usize) {
            *slot = ra;
        }
        Ok(index)
    }

    fn decode_run_interruption_pixel(
        &mut self,
        ra: T::Pixel,
        rb: T::Pixel,
    ) -> Result<T::Pixel, Error> {
        let mut reconstructed = T::Pixel::default();

        if <T::Pixel as Pixel<T::Sample>>::COMPONENT_COUNT == 1 {
            let ra = ra.component(0).to_i32();
            let rb = rb.component(0).to_i32();

            if self.traits.is_near(ra, rb) {
                let error_value = self.decode_run_interruption_error(1)?;
                reconstructed
                    .set_component(0, self.traits.compute_reconstructed_sample(ra, error_value));
            } else {
                let error_value = self.decode_run_interruption_error(0)?;
                let sign = RunModeContext::interruption_sign(ra, rb);
                reconstructed.set_component(
                    0,
                    self.traits
                        .compute_reconstructed_sample(rb, error_value * sign),
                );
            }
        } else {
            for component in 0..<T::Pixel as Pixel<T::Sample>>::COMPONENT_COUNT {
                let ra = ra.component(component).to_i32();
                let rb = rb.component(component).to_i32();

                let error_value = self.decode_run_interruption_error(0)?;
                let sign = RunModeContext::interruption_sign(ra, rb);
                reconstructed.set_component(
                    component,
                    self.traits
                        .compute_reconstructed_sample(rb, error_value * sign),
                );
            }
        }
        Ok(reconstructed)
    }

    fn decode_run_interruption_error(&mut self, context_index: usize) -> Result<i32, Error> {
        let k = self.run_mode_contexts[context_index].compute_golomb_coding_parameter();
        if k >= MAX_K_VALUE {
            return Err(Error::InvalidCompressedData);
        }
        let e_mapped_error_value =
            self.decode_value(k, self.traits.limit() - J[self.run_index] - 1, self.traits.qbpp())?;
        if e_mapped_error_value > 2 * 65536 {
            return Err(Error::InvalidCompressedData);
        }
        let error_value = self.run_mode_contexts[context_index].compute_error_value(
            e_mapped_error_value + self.run_mode_contexts[context_index].run_interruption_type(),
            k,
        );
        self.run_mode_contexts[context_index].update_variables(
            error_value,
            e_mapped_error_value,
            self.traits.reset(),
        );
        Ok(error_value)
    }

    fn quantize_gradient(&self, di: i32) -> i32 {
        debug_assert_eq!(
            i32::from(self.quantization[(self.gradient_range + di) as usize]),
            quantize_gradient_org(
                di,
                self.threshold1,
                self.threshold2,
                self.threshold3,
                self.traits.near()
            )
        );
        i32::from(self.quantization[(self.gradient_range + di) as usize])
    }

    fn increment_run_index(&mut self) {
        self.run_index = std::cmp::min(31, self.run_index + 1);
    }

    fn decrement_run_index(&mut self) {
        self.run_index = self.run_index.saturating_sub(1);
    }
}
