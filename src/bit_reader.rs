//! Entropy-coded bit stream reader.
//!
//! The cache is a 64-bit word holding stream bits left-aligned at the MSB;
//! `valid_bits` counts how many of the high bits carry data. Refilling merges
//! the byte after an 0xFF so its stuffed high bit overlaps the 0xFF's low
//! bit, which makes post-0xFF bytes contribute exactly 7 bits. A 0xFF
//! followed by a byte >= 0x80 is a marker and stops the refill; draining the
//! cache past that point is a decode error.

use crate::constants::JPEG_MARKER_START_BYTE;
use crate::error::Error;

const CACHE_BIT_COUNT: i32 = 64;

pub struct BitReader<'a> {
    source: &'a [u8],
    position: usize,
    read_cache: u64,
    valid_bits: i32,
}

impl<'a> BitReader<'a> {
    pub fn new(source: &'a [u8]) -> Result<Self, Error> {
        let mut reader = Self {
            source,
            position: 0,
            read_cache: 0,
            valid_bits: 0,
        };
        reader.fill_read_cache()?;
        Ok(reader)
    }

    fn fill_read_cache(&mut self) -> Result<(), Error> {
        if self.valid_bits < 0 {
            // A short code claimed more bits than the stream still had.
            return Err(Error::InvalidCompressedData);
        }

        while self.valid_bits < CACHE_BIT_COUNT - 8 {
            if self.position >= self.source.len() {
                if self.valid_bits <= 0 {
                    return Err(Error::InvalidCompressedData);
                }
                return Ok(());
            }

            let value = u64::from(self.source[self.position]);
            if value == u64::from(JPEG_MARKER_START_BYTE)
                && (self.position + 1 == self.source.len()
                    || self.source[self.position + 1] & 0x80 != 0)
            {
                // Marker ahead: no more payload bytes in this scan.
                if self.valid_bits <= 0 {
                    return Err(Error::InvalidCompressedData);
                }
                return Ok(());
            }

            self.read_cache |= value << (CACHE_BIT_COUNT - 8 - self.valid_bits);
            self.position += 1;
            self.valid_bits += 8;

            if value == u64::from(JPEG_MARKER_START_BYTE) {
                // The next byte's high bit is a stuffed zero that overlaps
                // this byte's low bit in the cache.
                self.valid_bits -= 1;
            }
        }
        Ok(())
    }

    pub fn skip(&mut self, length: i32) {
        self.valid_bits -= length;
        self.read_cache <<= length;
    }

    pub fn read_bit(&mut self) -> Result<bool, Error> {
        if self.valid_bits <= 0 {
            self.fill_read_cache()?;
            if self.valid_bits <= 0 {
                return Err(Error::InvalidCompressedData);
            }
        }
        let set = self.read_cache & (1 << (CACHE_BIT_COUNT - 1)) != 0;
        self.skip(1);
        Ok(set)
    }

    /// Reads `length` bits, 1..=31, as an unsigned value.
    pub fn read_value(&mut self, length: i32) -> Result<i32, Error> {
        debug_assert!((1..32).contains(&length));
        if self.valid_bits < length {
            self.fill_read_cache()?;
            if self.valid_bits < length {
                return Err(Error::InvalidCompressedData);
            }
        }
        let result = (self.read_cache >> (CACHE_BIT_COUNT - length)) as i32;
        self.skip(length);
        Ok(result)
    }

    /// Reads `length` bits, 1..=32, splitting wide reads in two.
    pub fn read_long_value(&mut self, length: i32) -> Result<i32, Error> {
        if length <= 24 {
            return self.read_value(length);
        }
        Ok((self.read_value(length - 24)? << 24) + self.read_value(24)?)
    }

    /// The next 8 bits without consuming them; used by the short-code tables.
    pub fn peek_byte(&mut self) -> Result<i32, Error> {
        if self.valid_bits < 8 {
            self.fill_read_cache()?;
        }
        Ok((self.read_cache >> (CACHE_BIT_COUNT - 8)) as i32)
    }

    /// Number of leading zero bits among the next 16, or -1 if all are zero.
    fn peek_zero_bits(&mut self) -> Result<i32, Error> {
        if self.valid_bits < 16 {
            self.fill_read_cache()?;
        }
        let mut value = self.read_cache;
        for count in 0..16 {
            if value & (1 << (CACHE_BIT_COUNT - 1)) != 0 {
                return Ok(count);
            }
            value <<= 1;
        }
        Ok(-1)
    }

    /// Counts zero bits up to the terminating one bit and consumes it.
    pub fn read_high_bits(&mut self) -> Result<i32, Error> {
        let count = self.peek_zero_bits()?;
        if count >= 0 {
            self.skip(count + 1);
            return Ok(count);
        }
        self.skip(15);

        let mut high_bits = 15;
        loop {
            if self.read_bit()? {
                return Ok(high_bits);
            }
            high_bits += 1;
        }
    }

    /// Verifies the scan ends cleanly: only zero padding bits remain and any
    /// unconsumed byte starts a marker.
    pub fn end_scan(&mut self) -> Result<(), Error> {
        if self.position < self.source.len()
            && self.source[self.position] != JPEG_MARKER_START_BYTE
        {
            self.read_bit()?;
            if self.position < self.source.len()
                && self.source[self.position] != JPEG_MARKER_START_BYTE
            {
                return Err(Error::TooMuchCompressedData);
            }
        }
        if self.read_cache != 0 {
            return Err(Error::TooMuchCompressedData);
        }
        Ok(())
    }

    /// Number of source bytes the scan actually consumed, walking the cached
    /// tail back over 7-bit (post-0xFF) and 8-bit contributions.
    pub fn bytes_consumed(&self) -> usize {
        let mut valid_bits = self.valid_bits;
        let mut position = self.position;
        while position > 0 {
            let last_bit_count = if self.source[position - 1] == JPEG_MARKER_START_BYTE {
                7
            } else {
                8
            };
            if valid_bits < last_bit_count {
                break;
            }
            valid_bits -= last_bit_count;
            position -= 1;
        }
        position
    }
}
