// - - - - - - - - - - - - - - - - - - - - - - - - - - - - - - - - - - - - - -
//                                                                           -
//                       ****************************                        -
//                         ARITHMETIC CODING ENGINE                          -
//                       ****************************                        -
//                                                                           -
// - - - - - - - - - - - - - - - - - - - - - - - - - - - - - - - - - - - - - -
//                                                                           -
// Fast arithmetic coding implementation                                     -
// -> 32-bit variables, 32-bit product, periodic updates, sorted symbols     -
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

use byteorder::{ReadBytesExt, WriteBytesExt};

use crate::buffer::{validate_capacity, CodeBuffer};
use crate::errors::ArithmeticError;
use crate::models::{
    AdaptiveBitModel, AdaptiveDataModel, StaticBitModel, StaticDataModel, BM_LENGTH_SHIFT,
    DM_LENGTH_SHIFT,
};

// threshold for renormalization
pub(crate) const AC_MIN_LENGTH: u32 = 0x0100_0000;
// maximum AC interval length
pub(crate) const AC_MAX_LENGTH: u32 = 0xFFFF_FFFF;

/// State a codec is in; coding operations are gated by it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CodecMode {
    Idle,
    Encoding,
    Decoding,
}

/// Arithmetic encoder and decoder over a bounded code buffer.
///
/// The codec maintains a sub-interval of [0, 1) scaled to 32 bits and
/// renormalizes one byte at a time. Encoding and decoding are the two
/// active modes of the same state machine; a round trip replays the
/// same sequence of operations against models reset to the same state.
///
/// Compressed data lives in the attached code buffer: either owned by
/// the codec or borrowed from the caller (`'a` is the lifetime of a
/// borrowed buffer; owned codecs can be `'static`).
pub struct ArithmeticCodec<'a> {
    mode: CodecMode,
    buffer: CodeBuffer<'a>,
    // next byte written (encoder) or read (decoder)
    ac_index: usize,
    base: u32,
    value: u32,
    length: u32,
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
            base: 0,
            value: 0,
            length: AC_MAX_LENGTH,
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
    ///
    /// A buffer (owned or borrowed) that is already large enough is
    /// kept as is; otherwise a new owned buffer is allocated.
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
        self.base = 0;
        self.length = AC_MAX_LENGTH;
        self.ac_index = 0;
        Ok(())
    }

    pub fn start_decoder(&mut self) -> Result<(), ArithmeticError> {
        self.check_mode(CodecMode::Idle)?;
        if self.buffer.capacity() == 0 {
            return Err(ArithmeticError::BufferNotSet);
        }

        self.mode = CodecMode::Decoding;
        self.length = AC_MAX_LENGTH;
        let buffer = self.buffer.as_slice();
        self.value = (u32::from(buffer[0]) << 24)
            | (u32::from(buffer[1]) << 16)
            | (u32::from(buffer[2]) << 8)
            | u32::from(buffer[3]);
        self.ac_index = 4;
        Ok(())
    }

    /// Terminates the code stream and returns the number of code bytes
    /// used; the codec goes back to idle.
    pub fn stop_encoder(&mut self) -> Result<usize, ArithmeticError> {
        self.check_mode(CodecMode::Encoding)?;
        self.mode = CodecMode::Idle;

        // done encoding: set final data bytes
        let init_base = self.base;
        if self.length > 2 * AC_MIN_LENGTH {
            // base offset
            self.base = self.base.wrapping_add(AC_MIN_LENGTH);
            // set new length for 1 more byte
            self.length = AC_MIN_LENGTH >> 1;
        } else {
            // base offset
            self.base = self.base.wrapping_add(AC_MIN_LENGTH >> 1);
            // set new length for 2 more bytes
            self.length = AC_MIN_LENGTH >> 9;
        }

        if init_base > self.base {
            // overflow = carry
            self.propagate_carry();
        }
        self.renorm_enc_interval()?;

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

        // halve interval
        self.length >>= 1;
        if bit != 0 {
            let init_base = self.base;
            // move base
            self.base = self.base.wrapping_add(self.length);
            if init_base > self.base {
                // overflow = carry
                self.propagate_carry();
            }
        }

        if self.length < AC_MIN_LENGTH {
            self.renorm_enc_interval()?;
        }
        Ok(())
    }

    /// Decode a bit under the uniform model.
    pub fn get_bit(&mut self) -> u32 {
        debug_assert!(self.mode == CodecMode::Decoding);

        // halve interval
        self.length >>= 1;
        // decode bit
        let bit = u32::from(self.value >= self.length);
        if bit != 0 {
            // move base
            self.value -= self.length;
        }

        if self.length < AC_MIN_LENGTH {
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

        // new interval base and length
        self.length >>= bits;
        let init_base = self.base;
        self.base = self.base.wrapping_add(data * self.length);

        if init_base > self.base {
            // overflow = carry
            self.propagate_carry();
        }
        if self.length < AC_MIN_LENGTH {
            self.renorm_enc_interval()?;
        }
        Ok(())
    }

    /// Decode a `bits`-wide uniform value, 1 <= `bits` <= 20.
    pub fn get_bits(&mut self, bits: u32) -> u32 {
        debug_assert!(self.mode == CodecMode::Decoding);
        debug_assert!(bits >= 1 && bits <= 20);

        // decode symbol, change length
        self.length >>= bits;
        let sym = self.value / self.length;

        // update interval
        self.value -= self.length * sym;
        if self.length < AC_MIN_LENGTH {
            self.renorm_dec_interval();
        }
        sym
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

        // multiplication approximated by two bit shifts and two additions
        let x = self.length - (self.length >> model.shift_a) - (self.length >> model.shift_b);

        // update interval
        if model.least_probable_bit != bit {
            // simplest case is the most common
            self.length = x;
        } else {
            let init_base = self.base;
            self.base = self.base.wrapping_add(x);
            self.length -= x;
            if init_base > self.base {
                // overflow = carry
                self.propagate_carry();
            }
        }

        if self.length < AC_MIN_LENGTH {
            self.renorm_enc_interval()?;
        }
        Ok(())
    }

    pub fn decode_bit(&mut self, model: &StaticBitModel) -> u32 {
        debug_assert!(self.mode == CodecMode::Decoding);

        let x = self.length - (self.length >> model.shift_a) - (self.length >> model.shift_b);

        // decision
        let mpb = self.value < x;
        // update & shift interval
        if mpb {
            self.length = x;
        } else {
            // shifted interval base = 0
            self.value -= x;
            self.length -= x;
        }

        if self.length < AC_MIN_LENGTH {
            self.renorm_dec_interval();
        }
        u32::from(mpb) ^ model.least_probable_bit
    }

    pub fn encode_adaptive_bit(
        &mut self,
        model: &mut AdaptiveBitModel,
        bit: u32,
    ) -> Result<(), ArithmeticError> {
        debug_assert!(self.mode == CodecMode::Encoding);
        debug_assert!(bit <= 1);

        // product l x pm
        let x = model.mpb_prob * (self.length >> BM_LENGTH_SHIFT);

        // update interval
        if model.least_probable_bit != bit {
            // simplest case is the most common
            self.length = x;
        } else {
            model.lpb_count += 1;
            let init_base = self.base;
            self.base = self.base.wrapping_add(x);
            self.length -= x;
            if init_base > self.base {
                // overflow = carry
                self.propagate_carry();
            }
        }

        if self.length < AC_MIN_LENGTH {
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

        // product l x pm
        let x = model.mpb_prob * (self.length >> BM_LENGTH_SHIFT);

        // decision
        let mpb = self.value < x;
        // update interval
        if mpb {
            self.length = x;
        } else {
            model.lpb_count += 1;
            self.value -= x;
            self.length -= x;
        }

        if self.length < AC_MIN_LENGTH {
            self.renorm_dec_interval();
        }

        // save bit value: the update may swap the least probable bit
        let bit = u32::from(mpb) ^ model.least_probable_bit;
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

        let init_base = self.base;
        // symbol = rank
        let s = model.rank[data as usize] as usize;
        self.narrow_to_symbol(&model.distribution, s, model.most_probable_symbol);
        if init_base > self.base {
            // overflow = carry
            self.propagate_carry();
        }
        if self.length < AC_MIN_LENGTH {
            self.renorm_enc_interval()?;
        }
        Ok(())
    }

    pub fn decode_symbol(&mut self, model: &StaticDataModel) -> u32 {
        debug_assert!(self.mode == CodecMode::Decoding);

        let s = self.search_symbol(
            &model.distribution,
            &model.first_tests,
            model.data_symbols as usize,
        );
        if self.length < AC_MIN_LENGTH {
            self.renorm_dec_interval();
        }
        // return decoded data value
        model.data[s]
    }

    pub fn encode_adaptive_symbol(
        &mut self,
        model: &mut AdaptiveDataModel,
        data: u32,
    ) -> Result<(), ArithmeticError> {
        debug_assert!(self.mode == CodecMode::Encoding);
        debug_assert!(data < model.data_symbols);

        let init_base = self.base;
        // symbol = rank
        let s = model.rank[data as usize] as usize;
        self.narrow_to_symbol(&model.distribution, s, model.most_probable_symbol);
        if init_base > self.base {
            // overflow = carry
            self.propagate_carry();
        }
        if self.length < AC_MIN_LENGTH {
            self.renorm_enc_interval()?;
        }

        model.symbol_count[s] += 1;
        model.symbols_until_update -= 1;
        if model.symbols_until_update == 0 {
            // periodic model update
            model.update();
        }
        Ok(())
    }

    pub fn decode_adaptive_symbol(&mut self, model: &mut AdaptiveDataModel) -> u32 {
        debug_assert!(self.mode == CodecMode::Decoding);

        let s = self.search_symbol(
            &model.distribution,
            &model.first_tests,
            model.data_symbols as usize,
        );
        if self.length < AC_MIN_LENGTH {
            self.renorm_dec_interval();
        }

        model.symbol_count[s] += 1;
        // save data value: the update re-sorts the symbols
        let data = model.data[s];
        model.symbols_until_update -= 1;
        if model.symbols_until_update == 0 {
            // periodic model update
            model.update();
        }
        data
    }

    // Narrows the interval to the cell of sorted position `s`. The top
    // cell takes the remaining length, saving one multiplication on
    // the branch the sort makes most likely.
    #[inline]
    fn narrow_to_symbol(&mut self, distribution: &[u32], s: usize, most_probable: usize) {
        let x;
        if s == most_probable {
            x = distribution[s] * (self.length >> DM_LENGTH_SHIFT);
            self.base = self.base.wrapping_add(x);
            // no product needed
            self.length -= x;
        } else {
            self.length >>= DM_LENGTH_SHIFT;
            x = distribution[s] * self.length;
            self.base = self.base.wrapping_add(x);
            self.length = distribution[s + 1] * self.length - x;
        }
    }

    // Finds the sorted position whose cell contains the code value,
    // starting from the precomputed quartile seeds and finishing with
    // bisection. Narrows the interval; renormalization is left to the
    // caller.
    #[inline]
    fn search_symbol(
        &mut self,
        distribution: &[u32],
        first_tests: &[usize; 3],
        data_symbols: usize,
    ) -> usize {
        let mut y = self.length;
        let mut m = first_tests[1];
        self.length >>= DM_LENGTH_SHIFT;
        let z = distribution[m] * self.length;

        let mut s;
        let mut n;
        let mut x;
        if z > self.value {
            // first predefined test based on probabilities
            // initialize search from bottom and define next test
            n = m;
            y = z;
            x = 0;
            s = 0;
            m = first_tests[0];
        } else {
            // initialize search from top and define next test
            s = m;
            x = z;
            n = data_symbols;
            m = first_tests[2];
        }

        if n - s > 1 {
            // if necessary finish with bisection search
            loop {
                let z = self.length * distribution[m];
                if z > self.value {
                    // value is smaller
                    n = m;
                    y = z;
                } else {
                    // value is larger or equal
                    s = m;
                    x = z;
                }
                m = (s + n) >> 1;
                if m == s {
                    break;
                }
            }
        }

        // update interval
        self.value -= x;
        self.length = y - x;
        s
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

    // Carry propagation on compressed data buffer: zero the trailing
    // 0xFF run, then increment the first byte below it. A proper
    // renormalization always leaves a non-0xFF byte behind, so the
    // walk is bounded.
    fn propagate_carry(&mut self) {
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
        // output and discard top byte
        loop {
            let buffer = self.buffer.as_mut_slice();
            if self.ac_index >= buffer.len() {
                return Err(ArithmeticError::BufferOverflow);
            }
            buffer[self.ac_index] = (self.base >> 24) as u8;
            self.ac_index += 1;
            self.base <<= 8;
            // length multiplied by 256
            self.length <<= 8;
            if self.length >= AC_MIN_LENGTH {
                break;
            }
        }
        Ok(())
    }

    fn renorm_dec_interval(&mut self) {
        // read least-significant byte
        loop {
            self.value = (self.value << 8) | u32::from(self.next_input_byte());
            // length multiplied by 256
            self.length <<= 8;
            if self.length >= AC_MIN_LENGTH {
                break;
            }
        }
    }

    fn next_input_byte(&mut self) -> u8 {
        let buffer = self.buffer.as_slice();
        // reads past the encoded body only fuel the interval; the
        // termination bytes guarantee they never change a decision
        let byte = if self.ac_index < buffer.len() {
            buffer[self.ac_index]
        } else {
            0
        };
        self.ac_index += 1;
        byte
    }
}

impl<'a> Default for ArithmeticCodec<'a> {
    fn default() -> Self {
        Self::new()
    }
}

// write variable-length header with number of code bytes
pub(crate) fn write_varint<W: Write>(dst: &mut W, mut value: u32) -> std::io::Result<usize> {
    let mut header_bytes = 0;
    loop {
        let mut byte = (value & 0x7F) as u8;
        value >>= 7;
        if value > 0 {
            byte |= 0x80;
        }
        dst.write_u8(byte)?;
        header_bytes += 1;
        if value == 0 {
            break;
        }
    }
    Ok(header_bytes)
}

// read variable-length header with number of code bytes
pub(crate) fn read_varint<R: Read>(src: &mut R) -> std::io::Result<u32> {
    let mut value = 0u32;
    let mut shift = 0;
    loop {
        let byte = src.read_u8()?;
        value |= u32::from(byte & 0x7F) << shift;
        shift += 7;
        if byte & 0x80 == 0 {
            break;
        }
        if shift > 28 {
            return Err(std::io::Error::new(
                std::io::ErrorKind::InvalidData,
                "length header does not fit in 32 bits",
            ));
        }
    }
    Ok(value)
}
