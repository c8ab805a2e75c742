// - - - - - - - - - - - - - - - - - - - - - - - - - - - - - - - - - - - - - -
//                                                                           -
//                       ****************************                        -
//                         ARITHMETIC CODING ENGINE                          -
//                       ****************************                        -
//                                                                           -
// - - - - - - - - - - - - - - - - - - - - - - - - - - - - - - - - - - - - - -
//                                                                           -
// Arithmetic coding implementation                                          -
// -> 64-bit floating-point variables, 16-bit renormalization               -
//                                                                           -
// - - - - - - - - - - - - - - - - - - - - - - - - - - - - - - - - - - - - - -
//                                                                           -
// A description of the arithmetic coding method used here is available in   -
//                                                                           -
// Lossless Compression Handbook, ed. K. Sayood                              -
// Chapter 5: Arithmetic Coding (A. Said), pp. 101-152, Academic Press, 2003 -
//                                                                           -
// A. Said, Introduction to Arithmetic Coding Theory and Practice            -
// HP Labs report HPL-2004-76  -  http://www.hpl.hp.com/techreports/         -
//                                                                           -
// - - - - - - - - - - - - - - - - - - - - - - - - - - - - - - - - - - - - - -

use std::io::{Read, Write};

use crate::buffer::{validate_capacity, CodeBuffer};
use crate::codec::{read_varint, write_varint, CodecMode};
use crate::errors::ArithmeticError;

use super::models::{AdaptiveBitModel, AdaptiveDataModel, StaticBitModel, StaticDataModel};

// this encoder saves data 2 bytes at a time: renormalization factor = 2^16
const AC_OUTPUT_FACTOR: f64 = 65536.0;
const AC_MIN_LENGTH: f64 = 1.0 / 65536.0;
// 2^-48, the weight of the last code-value bit
const AC_LEAST_SIGNIF_BIT: f64 = 1.0 / 16_777_216.0 / 16_777_216.0;
// rounding-error compensation subtracted from the length on every step
const AC_LEAKAGE: f64 = 2.0 * AC_LEAST_SIGNIF_BIT;

/// Arithmetic encoder and decoder over a bounded code buffer, interval
/// state kept in doubles.
///
/// See the crate-level docs and the integer [`ArithmeticCodec`] for
/// the coding model; only the numeric strategy differs. Streams are
/// not interchangeable with the integer variant's.
///
/// [`ArithmeticCodec`]: crate::ArithmeticCodec
pub struct ArithmeticCodec<'a> {
    mode: CodecMode,
    buffer: CodeBuffer<'a>,
    // next byte written (encoder) or read (decoder)
    ac_index: usize,
    base: f64,
    value: f64,
    length: f64,
}

impl<'a> ArithmeticCodec<'a> {
    /// Codec without a buffer; [`set_buffer`] must be called before
    /// starting a coder.
    ///
    /// [`set_buffer`]: ArithmeticCodec::set_buffer
    pub fn new() -> Self {
        Self {
            mode: CodecMode::Idle,
            buffer: CodeBuffer::Unset,
            ac_index: 0,
            base: 0.0,
            value: 0.0,
            length: 1.0,
        }
    }

    /// Codec owning a buffer able to hold `capacity` code bytes.
    pub fn with_capacity(capacity: usize) -> Result<Self, ArithmeticError> {
        let mut codec = Self::new();
        codec.buffer = CodeBuffer::owned(capacity)?;
        Ok(codec)
    }

    /// Codec borrowing the caller's buffer for compressed data.
    pub fn with_user_buffer(buffer: &'a mut [u8]) -> Result<Self, ArithmeticError> {
        let mut codec = Self::new();
        codec.buffer = CodeBuffer::user(buffer)?;
        Ok(codec)
    }

    pub fn mode(&self) -> CodecMode {
        self.mode
    }

    /// Number of code bytes the attached buffer can hold.
    pub fn buffer_size(&self) -> usize {
        self.buffer.capacity()
    }

    /// The compressed data region; meaningful up to the byte count
    /// returned by [`stop_encoder`].
    ///
    /// [`stop_encoder`]: ArithmeticCodec::stop_encoder
    pub fn buffer(&self) -> &[u8] {
        let capacity = self.buffer.capacity();
        &self.buffer.as_slice()[..capacity]
    }

    /// Mutable access to the code region, e.g. to place compressed
    /// data before [`start_decoder`].
    ///
    /// [`start_decoder`]: ArithmeticCodec::start_decoder
    pub fn buffer_mut(&mut self) -> &mut [u8] {
        let capacity = self.buffer.capacity();
        &mut self.buffer.as_mut_slice()[..capacity]
    }

    /// Grows the owned buffer to hold at least `capacity` code bytes.
    pub fn set_buffer(&mut self, capacity: usize) -> Result<(), ArithmeticError> {
        self.check_mode(CodecMode::Idle)?;
        validate_capacity(capacity)?;
        if capacity <= self.buffer.capacity() {
            // enough available
            return Ok(());
        }
        self.buffer = CodeBuffer::owned(capacity)?;
        Ok(())
    }

    /// Adopts the caller's buffer, releasing any owned one.
    pub fn set_user_buffer(&mut self, buffer: &'a mut [u8]) -> Result<(), ArithmeticError> {
        self.check_mode(CodecMode::Idle)?;
        self.buffer = CodeBuffer::user(buffer)?;
        Ok(())
    }

    pub fn start_encoder(&mut self) -> Result<(), ArithmeticError> {
        self.check_mode(CodecMode::Idle)?;
        if self.buffer.capacity() == 0 {
            return Err(ArithmeticError::BufferNotSet);
        }

        self.mode = CodecMode::Encoding;
        self.base = 0.0;
        self.length = 1.0;
        self.ac_index = 0;
        Ok(())
    }

    pub fn start_decoder(&mut self) -> Result<(), ArithmeticError> {
        self.check_mode(CodecMode::Idle)?;
        if self.buffer.capacity() == 0 {
            return Err(ArithmeticError::BufferNotSet);
        }

        self.mode = CodecMode::Decoding;
        self.length = 1.0;
        self.base = 0.0;
        self.value = 0.0;
        // set initial code value: 48 bits
        let buffer = self.buffer.as_slice();
        for &byte in &buffer[..6] {
            self.value = 256.0 * self.value + AC_LEAST_SIGNIF_BIT * f64::from(byte);
        }
        self.ac_index = 6;
        Ok(())
    }

    /// Terminates the code stream and returns the number of code bytes
    /// used; the codec goes back to idle.
    pub fn stop_encoder(&mut self) -> Result<usize, ArithmeticError> {
        self.check_mode(CodecMode::Encoding)?;
        self.mode = CodecMode::Idle;

        // decide the number of final bytes from the interval width
        let a = (AC_OUTPUT_FACTOR * self.base) as u32;
        let b = (AC_OUTPUT_FACTOR * (self.base + self.length)) as u32;

        let mut last_bytes;
        if b - a < 2 {
            self.base += 0.5 * AC_MIN_LENGTH;
            // output 3 bytes
            last_bytes = 3;
        } else if (b >> 8) - (a >> 8) < 2 {
            self.base += AC_MIN_LENGTH;
            // output 2 bytes
            last_bytes = 2;
        } else {
            self.base += 256.0 * AC_MIN_LENGTH;
            // output 1 byte
            last_bytes = 1;
        }

        if self.base >= 1.0 {
            self.propagate_carry();
        }

        while last_bytes > 0 {
            self.base *= 256.0;
            // save 8 most-significant bits
            let a = self.base as u32;
            let buffer = self.buffer.as_mut_slice();
            if self.ac_index >= buffer.len() {
                return Err(ArithmeticError::BufferOverflow);
            }
            buffer[self.ac_index] = a as u8;
            self.ac_index += 1;
            // rescale interval by factor 256
            self.base -= f64::from(a);
            last_bytes -= 1;
        }

        let code_bytes = self.ac_index;
        if code_bytes > self.buffer.capacity() {
            return Err(ArithmeticError::BufferOverflow);
        }
        Ok(code_bytes)
    }

    pub fn stop_decoder(&mut self) -> Result<(), ArithmeticError> {
        self.check_mode(CodecMode::Decoding)?;
        self.mode = CodecMode::Idle;
        Ok(())
    }

    /// Stops the encoder and writes the code to `dst`, prefixed with a
    /// variable-length byte count. Returns the total bytes written.
    pub fn write_to_file<W: Write>(&mut self, dst: &mut W) -> Result<usize, ArithmeticError> {
        let code_bytes = self.stop_encoder()?;
        let header_bytes = write_varint(dst, code_bytes as u32)?;
        dst.write_all(&self.buffer.as_slice()[..code_bytes])?;
        Ok(code_bytes + header_bytes)
    }

    /// Reads a length-prefixed code stream from `src` into the buffer
    /// and starts the decoder on it.
    pub fn read_from_file<R: Read>(&mut self, src: &mut R) -> Result<(), ArithmeticError> {
        self.check_mode(CodecMode::Idle)?;

        let code_bytes = read_varint(src)? as usize;
        if code_bytes > self.buffer.capacity() {
            return Err(ArithmeticError::BufferOverflow);
        }
        src.read_exact(&mut self.buffer.as_mut_slice()[..code_bytes])?;
        self.start_decoder()
    }

    /// Encode a bit assuming p0 = p1 = 1/2.
    pub fn put_bit(&mut self, bit: u32) -> Result<(), ArithmeticError> {
        debug_assert!(self.mode == CodecMode::Encoding);
        debug_assert!(bit <= 1);

        // compute middle point
        let x = 0.5 * self.length;
        if bit == 0 {
            self.length = x;
        } else {
            self.base += x;
            self.length -= x;
            if self.base >= 1.0 {
                // check if carry bit
                self.propagate_carry();
            }
        }

        self.length -= AC_LEAKAGE;
        if self.length <= AC_MIN_LENGTH {
            self.renorm_enc_interval()?;
        }
        Ok(())
    }

    /// Decode a bit under the uniform model.
    pub fn get_bit(&mut self) -> u32 {
        debug_assert!(self.mode == CodecMode::Decoding);

        // compute interval middle point
        let x = 0.5 * self.length;
        let bit = u32::from(self.value + AC_LEAST_SIGNIF_BIT >= self.base + x);

        if bit == 0 {
            self.length = x;
        } else {
            self.base += x;
            self.length -= x;
            self.shift_interval_down();
        }

        self.length -= AC_LEAKAGE;
        if self.length <= AC_MIN_LENGTH {
            self.renorm_dec_interval();
        }
        bit
    }

    /// Encode `data` as `bits` equiprobable binary digits,
    /// 1 <= `bits` <= 20.
    pub fn put_bits(&mut self, data: u32, bits: u32) -> Result<(), ArithmeticError> {
        debug_assert!(self.mode == CodecMode::Encoding);
        debug_assert!(bits >= 1 && bits <= 20);
        debug_assert!(data < (1u32 << bits));

        // assume uniform distribution
        let symbols = 1u32 << bits;
        let d = self.length / f64::from(symbols);
        let y = if data == symbols - 1 {
            // avoid multiplication by 1
            self.base + self.length
        } else {
            self.base + d * f64::from(data + 1)
        };

        // set new interval
        self.base += d * f64::from(data);
        self.length = y - self.base;

        if self.base >= 1.0 {
            // check if carry bit
            self.propagate_carry();
        }
        self.length -= AC_LEAKAGE;
        if self.length <= AC_MIN_LENGTH {
            self.renorm_enc_interval()?;
        }
        Ok(())
    }

    /// Decode a `bits`-wide uniform value, 1 <= `bits` <= 20.
    pub fn get_bits(&mut self, bits: u32) -> u32 {
        debug_assert!(self.mode == CodecMode::Decoding);
        debug_assert!(bits >= 1 && bits <= 20);

        let mut s = 0u32;
        let mut n = 1u32 << bits;
        let d = self.length / f64::from(n);
        let mut m = n >> 1;
        let mut x = self.base;
        let mut y = self.base + self.length;
        let shifted_value = self.value + AC_LEAST_SIGNIF_BIT;

        // bisection search of index in arithmetic coding interval
        loop {
            let z = self.base + d * f64::from(m);
            if z > shifted_value {
                // code value is smaller
                y = z;
                n = m;
            } else {
                // code value is larger or equal
                x = z;
                s = m;
            }
            m = (s + n) >> 1;
            if m == s {
                break;
            }
        }

        // set new interval
        self.base = x;
        self.length = y - x;
        self.shift_interval_down();

        self.length -= AC_LEAKAGE;
        if self.length <= AC_MIN_LENGTH {
            self.renorm_dec_interval();
        }
        s
    }

    /// Encode a raw 32-bit value as two 16-bit uniform halves.
    pub fn put_int(&mut self, data: u32) -> Result<(), ArithmeticError> {
        // lower 16 bits
        self.put_bits(data & 0xFFFF, 16)?;
        // upper 16 bits
        self.put_bits(data >> 16, 16)
    }

    pub fn get_int(&mut self) -> u32 {
        let lower = self.get_bits(16);
        let upper = self.get_bits(16);
        (upper << 16) | lower
    }

    pub fn encode_bit(&mut self, model: &StaticBitModel, bit: u32) -> Result<(), ArithmeticError> {
        debug_assert!(self.mode == CodecMode::Encoding);
        debug_assert!(bit <= 1);

        // compute product l x p0
        let x = self.length * model.bit_0_prob;
        if bit == 0 {
            self.length = x;
        } else {
            self.base += x;
            self.length -= x;
            if self.base >= 1.0 {
                // check if carry bit
                self.propagate_carry();
            }
        }

        self.length -= AC_LEAKAGE;
        if self.length <= AC_MIN_LENGTH {
            self.renorm_enc_interval()?;
        }
        Ok(())
    }

    pub fn decode_bit(&mut self, model: &StaticBitModel) -> u32 {
        debug_assert!(self.mode == CodecMode::Decoding);

        // compute interval-division point
        let x = self.length * model.bit_0_prob;
        let bit = u32::from(self.value + AC_LEAST_SIGNIF_BIT >= self.base + x);

        if bit == 0 {
            self.length = x;
        } else {
            self.base += x;
            self.length -= x;
            self.shift_interval_down();
        }

        self.length -= AC_LEAKAGE;
        if self.length <= AC_MIN_LENGTH {
            self.renorm_dec_interval();
        }
        bit
    }

    pub fn encode_adaptive_bit(
        &mut self,
        model: &mut AdaptiveBitModel,
        bit: u32,
    ) -> Result<(), ArithmeticError> {
        debug_assert!(self.mode == CodecMode::Encoding);
        debug_assert!(bit <= 1);

        // compute product l x p0
        let x = self.length * model.bit_0_prob;
        if bit == 0 {
            self.length = x;
            model.bit_0_count += 1;
        } else {
            self.base += x;
            self.length -= x;
            if self.base >= 1.0 {
                // check if carry bit
                self.propagate_carry();
            }
        }

        self.length -= AC_LEAKAGE;
        if self.length <= AC_MIN_LENGTH {
            self.renorm_enc_interval()?;
        }

        model.bits_until_update -= 1;
        if model.bits_until_update == 0 {
            // periodic model update
            model.update();
        }
        Ok(())
    }

    pub fn decode_adaptive_bit(&mut self, model: &mut AdaptiveBitModel) -> u32 {
        debug_assert!(self.mode == CodecMode::Decoding);

        // compute interval-division point
        let x = self.length * model.bit_0_prob;
        let bit = u32::from(self.value + AC_LEAST_SIGNIF_BIT >= self.base + x);

        if bit == 0 {
            self.length = x;
            model.bit_0_count += 1;
        } else {
            self.base += x;
            self.length -= x;
            self.shift_interval_down();
        }

        self.length -= AC_LEAKAGE;
        if self.length <= AC_MIN_LENGTH {
            self.renorm_dec_interval();
        }

        model.bits_until_update -= 1;
        if model.bits_until_update == 0 {
            // periodic model update
            model.update();
        }
        bit
    }

    pub fn encode_symbol(
        &mut self,
        model: &StaticDataModel,
        data: u32,
    ) -> Result<(), ArithmeticError> {
        debug_assert!(self.mode == CodecMode::Encoding);
        debug_assert!(data < model.data_symbols);

        self.narrow_to_symbol(&model.distribution, data, model.data_symbols);
        self.length -= AC_LEAKAGE;
        if self.length <= AC_MIN_LENGTH {
            self.renorm_enc_interval()?;
        }
        Ok(())
    }

    pub fn decode_symbol(&mut self, model: &StaticDataModel) -> u32 {
        debug_assert!(self.mode == CodecMode::Decoding);

        self.search_symbol(&model.distribution, model.data_symbols)
    }

    pub fn encode_adaptive_symbol(
        &mut self,
        model: &mut AdaptiveDataModel,
        data: u32,
    ) -> Result<(), ArithmeticError> {
        debug_assert!(self.mode == CodecMode::Encoding);
        debug_assert!(data < model.data_symbols);

        self.narrow_to_symbol(&model.distribution, data, model.data_symbols);
        self.length -= AC_LEAKAGE;
        if self.length <= AC_MIN_LENGTH {
            self.renorm_enc_interval()?;
        }

        model.symbol_count[data as usize] += 1;
        model.symbols_until_update -= 1;
        if model.symbols_until_update == 0 {
            // periodic model update
            model.update();
        }
        Ok(())
    }

    pub fn decode_adaptive_symbol(&mut self, model: &mut AdaptiveDataModel) -> u32 {
        debug_assert!(self.mode == CodecMode::Decoding);

        let s = self.search_symbol(&model.distribution, model.data_symbols);

        model.symbol_count[s as usize] += 1;
        model.symbols_until_update -= 1;
        if model.symbols_until_update == 0 {
            // periodic model update
            model.update();
        }
        s
    }

    // Finds the symbol whose cell contains the code value by bisection
    // over the cumulative distribution, and narrows the interval to it.
    fn search_symbol(&mut self, distribution: &[f64], data_symbols: u32) -> u32 {
        let mut s = 0u32;
        let mut n = data_symbols;
        let mut m = n >> 1;
        let mut x = self.base;
        let mut y = self.base + self.length;
        let shifted_value = self.value + AC_LEAST_SIGNIF_BIT;

        // bisection search of index in arithmetic coding interval
        loop {
            let z = self.base + self.length * distribution[m as usize];
            if z > shifted_value {
                // code value is smaller
                y = z;
                n = m;
            } else {
                // code value is larger or equal
                x = z;
                s = m;
            }
            m = (s + n) >> 1;
            if m == s {
                break;
            }
        }

        // set new interval
        self.base = x;
        self.length = y - x;
        self.shift_interval_down();

        self.length -= AC_LEAKAGE;
        if self.length <= AC_MIN_LENGTH {
            self.renorm_dec_interval();
        }
        s
    }

    // Narrows the interval to the cell of `data` under the cumulative
    // distribution; the top cell takes the rest of the interval to
    // avoid a multiplication by 1.
    fn narrow_to_symbol(&mut self, distribution: &[f64], data: u32, data_symbols: u32) {
        let y = if data == data_symbols - 1 {
            self.base + self.length
        } else {
            self.base + self.length * distribution[(data + 1) as usize]
        };

        // set new interval
        self.base += self.length * distribution[data as usize];
        self.length = y - self.base;

        if self.base >= 1.0 {
            // check if carry bit
            self.propagate_carry();
        }
    }

    fn check_mode(&self, expected: CodecMode) -> Result<(), ArithmeticError> {
        if self.mode != expected {
            Err(ArithmeticError::InvalidMode {
                expected,
                actual: self.mode,
            })
        } else {
            Ok(())
        }
    }

    // The decoder does not propagate carries into the input stream:
    // the encoder already did when it wrote. Shift the interval and
    // the code value back below 1 instead.
    fn shift_interval_down(&mut self) {
        if self.base >= 1.0 {
            self.base -= 1.0;
            self.value -= 1.0;
        }
    }

    // Carry propagation on compressed data buffer, encoder side.
    fn propagate_carry(&mut self) {
        self.base -= 1.0;
        debug_assert!(self.ac_index > 0);
        let buffer = self.buffer.as_mut_slice();
        let mut p = self.ac_index - 1;
        while buffer[p] == 0xFF {
            buffer[p] = 0;
            p -= 1;
        }
        buffer[p] += 1;
    }

    fn renorm_enc_interval(&mut self) -> Result<(), ArithmeticError> {
        // rescale interval, output two data bytes per iteration
        loop {
            self.base *= AC_OUTPUT_FACTOR;
            let a = self.base as u32;
            {
                let buffer = self.buffer.as_mut_slice();
                if self.ac_index + 2 > buffer.len() {
                    return Err(ArithmeticError::BufferOverflow);
                }
                buffer[self.ac_index] = (a >> 8) as u8;
                buffer[self.ac_index + 1] = (a & 0xFF) as u8;
            }
            self.ac_index += 2;
            self.base -= f64::from(a);
            self.length *= AC_OUTPUT_FACTOR;
            if self.length > AC_MIN_LENGTH {
                break;
            }
        }
        Ok(())
    }

    fn renorm_dec_interval(&mut self) {
        // rescale interval, input two data bytes per iteration
        loop {
            self.base *= AC_OUTPUT_FACTOR;
            let a = self.base as u32;
            self.base -= f64::from(a);
            let (high, low) = self.next_input_pair();
            self.value = (AC_OUTPUT_FACTOR * self.value - f64::from(a))
                + AC_LEAST_SIGNIF_BIT * (256.0 * f64::from(high) + f64::from(low));
            self.length *= AC_OUTPUT_FACTOR;
            if self.length > AC_MIN_LENGTH {
                break;
            }
        }
    }

    fn next_input_pair(&mut self) -> (u8, u8) {
        let buffer = self.buffer.as_slice();
        // reads past the encoded body only fuel the interval; the
        // termination bytes guarantee they never change a decision
        let at = |index: usize| if index < buffer.len() { buffer[index] } else { 0 };
        let pair = (at(self.ac_index), at(self.ac_index + 1));
        self.ac_index += 2;
        pair
    }
}

impl<'a> Default for ArithmeticCodec<'a> {
    fn default() -> Self {
        Self::new()
    }
}
