//! Scan encoder: context modeling, MED prediction, Golomb coding and run
//! mode for one entropy-coded scan.

use std::borrow::Cow;

use crate::bit_writer::BitWriter;
use crate::coding_parameters::PresetCodingParameters;
use crate::constants::{CONTEXT_COUNT, J};
use crate::error::Error;
use crate::process_line::RawLineSource;
use crate::quantization_lut::{quantization_table, quantize_gradient_org};
use crate::regular_mode_context::RegularModeContext;
use crate::run_mode_context::RunModeContext;
use crate::scan_codec::{compute_context_id, get_mapped_err_val, get_predicted_value};
use crate::traits::{apply_sign, bit_wise_sign, Pixel, Sample, Traits};
use crate::{FrameInfo, InterleaveMode};

pub struct ScanEncoder<'a, T: Traits> {
    traits: T,
    frame_info: FrameInfo,
    interleave_mode: InterleaveMode,
    writer: BitWriter<'a>,

    contexts: [RegularModeContext; CONTEXT_COUNT],
    run_mode_contexts: [RunModeContext; 2],
    run_index: usize,

    threshold1: i32,
    threshold2: i32,
    threshold3: i32,
    quantization: Cow<'static, [i8]>,
    gradient_range: i32,
}

impl<'a, T: Traits> ScanEncoder<'a, T> {
    pub fn new(
        traits: T,
        frame_info: FrameInfo,
        interleave_mode: InterleaveMode,
        preset: &PresetCodingParameters,
        destination: &'a mut [u8],
    ) -> Self {
        let range = traits.range();
        Self {
            frame_info,
            interleave_mode,
            writer: BitWriter::new(destination),
            contexts: [RegularModeContext::new(range); CONTEXT_COUNT],
            run_mode_contexts: [RunModeContext::new(0, range), RunModeContext::new(1, range)],
            run_index: 0,
            threshold1: preset.threshold1,
            threshold2: preset.threshold2,
            threshold3: preset.threshold3,
            // Sized by the frame bit depth so every representable sample
            // difference stays in range, also with a custom MAXVAL preset.
            quantization: quantization_table(frame_info.bits_per_sample, traits.near(), preset),
            gradient_range: 1 << frame_info.bits_per_sample,
            traits,
        }
    }

    /// Encodes one complete scan, returning the number of entropy bytes
    /// written. No marker bytes are emitted.
    pub fn encode_scan(
        &mut self,
        line_source: &mut dyn RawLineSource<T::Pixel>,
    ) -> Result<usize, Error> {
        self.encode_lines(line_source)?;
        self.writer.end_scan()?;
        Ok(self.writer.bytes_written())
    }

    fn encode_lines(&mut self, line_source: &mut dyn RawLineSource<T::Pixel>) -> Result<(), Error> {
        let width = self.frame_info.width as usize;
        let height = self.frame_info.height as usize;
        let pixel_stride = width + 4;
        let component_count = if self.interleave_mode == InterleaveMode::Line {
            self.frame_info.component_count as usize
        } else {
            1
        };

        // Two rows of sentinel-padded lines per component; logical sample i
        // lives at slice index i + 1, the previous line starts as zeros.
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

            line_source.new_line_requested(&mut current_line[1..], width, pixel_stride)?;

            for component in 0..component_count {
                self.run_index = run_index_per_component[component];
                let previous = &mut previous_line[component * pixel_stride..][..pixel_stride];
                let current = &mut current_line[component * pixel_stride..][..pixel_stride];

                // Edge pixels used for prediction.
                previous[width + 1] = previous[width];
                current[0] = previous[1];

                self.encode_line(previous, current, width)?;
                run_index_per_component[component] = self.run_index;
            }
        }
        Ok(())
    }

    fn encode_line(
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
                index += self.encode_run_mode(index, previous, current, width)?;
            } else {
                let mut reconstructed = current[index];
                for component in 0..component_count {
                    let predicted = get_predicted_value(
                        ra.component(component).to_i32(),
                        rb.component(component).to_i32(),
                        rc.component(component).to_i32(),
                    );
                    let sample = self.encode_regular(
                        qs[component],
                        current[index].component(component).to_i32(),
                        predicted,
                    )?;
                    reconstructed.set_component(component, sample);
                }
                current[index] = reconstructed;
                index += 1;
            }
        }
        Ok(())
    }

    fn encode_regular(&mut self, qs: i32, x: i32, predicted: i32) -> Result<T::Sample, Error> {
        let sign = bit_wise_sign(qs);
        let context_index = apply_sign(qs, sign) as usize;

        let (k, context_c, correction) = {
            let context = &self.contexts[context_index];
            let k = context.compute_golomb_coding_parameter()?;
            (k, context.c(), context.get_error_correction(k | self.traits.near()))
        };

        let px = self
            .traits
            .correct_prediction(predicted + apply_sign(context_c, sign));
        let error_value = self.traits.compute_err_val(apply_sign(x - px, sign));

        self.encode_mapped_value(
            k,
            get_mapped_err_val(correction ^ error_value),
            self.traits.limit(),
        )?;
        self.contexts[context_index].update_variables_and_bias(
            error_value,
            self.traits.near(),
            self.traits.reset(),
        )?;

        let reconstructed = self
            .traits
            .compute_reconstructed_sample(px, apply_sign(error_value, sign));
        debug_assert!(self.traits.is_near(reconstructed.to_i32(), x));
        Ok(reconstructed)
    }

    fn encode_mapped_value(&mut self, k: i32, mapped_error: i32, limit: i32) -> Result<(), Error> {
        let mut high_bits = mapped_error >> k;

        if high_bits < limit - self.traits.qbpp() - 1 {
            if high_bits + 1 > 31 {
                self.writer.append_to_bit_stream(0, high_bits / 2)?;
                high_bits -= high_bits / 2;
            }
            self.writer.append_to_bit_stream(1, high_bits + 1)?;
            self.writer
                .append_to_bit_stream((mapped_error & ((1 << k) - 1)) as u32, k)?;
            return Ok(());
        }

        // Escape: unary prefix of LIMIT - qbpp ones, then the mapped error
        // minus one in qbpp bits.
        if limit - self.traits.qbpp() > 31 {
            self.writer.append_to_bit_stream(0, 31)?;
            self.writer
                .append_to_bit_stream(1, limit - self.traits.qbpp() - 31)?;
        } else {
            self.writer
                .append_to_bit_stream(1, limit - self.traits.qbpp())?;
        }
        self.writer.append_to_bit_stream(
            ((mapped_error - 1) & ((1 << self.traits.qbpp()) - 1)) as u32,
            self.traits.qbpp(),
        )?;
        Ok(())
    }

    fn encode_run_mode(
        &mut self,
        index: usize,
        previous: &[T::Pixel],
        current: &mut [T::Pixel],
        width: usize,
    ) -> Result<usize, Error> {
        let count_type_remain = width - (index - 1);
        let ra = current[index - 1];

        let mut run_length = 0;
        while self.traits.is_near_pixel(current[index + run_length], ra) {
            current[index + run_length] = ra;
            run_length += 1;
            if run_length == count_type_remain {
                break;
            }
        }

        self.encode_run_pixels(run_length as i32, run_length == count_type_remain)?;

        if run_length == count_type_remain {
            return Ok(run_length);
        }

        current[index + run_length] = self.encode_run_interruption_pixel(
            current[index + run_length],
            ra,
            previous[index + run_length],
        )?;
        self.decrement_run_index();
        Ok(run_length + 1)
    }

    fn encode_run_pixels(&mut self, mut run_length: i32, end_of_line: bool) -> Result<(), Error> {
        while run_length >= 1 << J[self.run_index] {
            self.writer.append_ones_to_bit_stream(1)?;
            run_length -= 1 << J[self.run_index];
            self.increment_run_index();
        }

        if end_of_line {
            if run_length != 0 {
                self.writer.append_ones_to_bit_stream(1)?;
            }
        } else {
            // Leading zero plus the remaining length.
            self.writer
                .append_to_bit_stream(run_length as u32, J[self.run_index] + 1)?;
        }
        Ok(())
    }

    fn encode_run_interruption_pixel(
        &mut self,
        x: T::Pixel,
        ra: T::Pixel,
        rb: T::Pixel,
    ) -> Result<T::Pixel, Error> {
        let mut reconstructed = x;

        if <T::Pixel as Pixel<T::Sample>>::COMPONENT_COUNT == 1 {
            let x = x.component(0).to_i32();
            let ra = ra.component(0).to_i32();
            let rb = rb.component(0).to_i32();

            if self.traits.is_near(ra, rb) {
                let error_value = self.traits.compute_err_val(x - ra);
                self.encode_run_interruption_error(1, error_value)?;
                reconstructed
                    .set_component(0, self.traits.compute_reconstructed_sample(ra, error_value));
            } else {
                let sign = RunModeContext::interruption_sign(ra, rb);
                let error_value = self.traits.compute_err_val((x - rb) * sign);
                self.encode_run_interruption_error(0, error_value)?;
                reconstructed.set_component(
                    0,
                    self.traits
                        .compute_reconstructed_sample(rb, error_value * sign),
                );
            }
        } else {
            // Interleaved pixels always code their components against the
            // sample above, through run-interruption context 0.
            for component in 0..<T::Pixel as Pixel<T::Sample>>::COMPONENT_COUNT {
                let x = x.component(component).to_i32();
                let ra = ra.component(component).to_i32();
                let rb = rb.component(component).to_i32();

                let sign = RunModeContext::interruption_sign(ra, rb);
                let error_value = self.traits.compute_err_val((x - rb) * sign);
                self.encode_run_interruption_error(0, error_value)?;
                reconstructed.set_component(
                    component,
                    self.traits
                        .compute_reconstructed_sample(rb, error_value * sign),
                );
            }
        }
        Ok(reconstructed)
    }

    fn encode_run_interruption_error(
        &mut self,
        context_index: usize,
        error_value: i32,
    ) -> Result<(), Error> {
        let (k, e_mapped_error_value) = {
            let context = &self.run_mode_contexts[context_index];
            let k = context.compute_golomb_coding_parameter();
            let map = context.compute_map(error_value, k);
            let e_mapped = 2 * error_value.abs() - context.run_interruption_type() - i32::from(map);
            debug_assert_eq!(
                error_value,
                context.compute_error_value(e_mapped + context.run_interruption_type(), k)
            );
            (k, e_mapped)
        };

        let limit = self.traits.limit() - J[self.run_index] - 1;
        self.encode_mapped_value(k, e_mapped_error_value, limit)?;

        self.run_mode_contexts[context_index].update_variables(
            error_value,
            e_mapped_error_value,
            self.traits.reset(),
        );
        Ok(())
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
