//! Owned-or-borrowed storage for compressed data.

use crate::errors::ArithmeticError;

pub(crate) const MIN_BUFFER_SIZE: usize = 16;
pub(crate) const MAX_BUFFER_SIZE: usize = 0x0100_0000;

// spare bytes past the declared capacity, written only between two
// overflow checks of the encoder renormalization
const CARRY_MARGIN: usize = 16;

pub(crate) fn validate_capacity(capacity: usize) -> Result<(), ArithmeticError> {
    if capacity < MIN_BUFFER_SIZE || capacity > MAX_BUFFER_SIZE {
        Err(ArithmeticError::InvalidBufferSize(capacity))
    } else {
        Ok(())
    }
}

/// Byte region the codec writes code bytes to and reads them from.
///
/// Either allocated (and owned) by the codec itself, or borrowed from
/// the caller for the lifetime of the codec.
#[derive(Debug)]
pub(crate) enum CodeBuffer<'a> {
    Unset,
    Owned(Box<[u8]>),
    User(&'a mut [u8]),
}

impl<'a> CodeBuffer<'a> {
    pub(crate) fn owned(capacity: usize) -> Result<Self, ArithmeticError> {
        validate_capacity(capacity)?;
        let bytes = vec![0u8; capacity + CARRY_MARGIN].into_boxed_slice();
        Ok(CodeBuffer::Owned(bytes))
    }

    pub(crate) fn user(buffer: &'a mut [u8]) -> Result<Self, ArithmeticError> {
        validate_capacity(buffer.len())?;
        Ok(CodeBuffer::User(buffer))
    }

    /// Number of code bytes that may be produced or consumed.
    pub(crate) fn capacity(&self) -> usize {
        match self {
            CodeBuffer::Unset => 0,
            CodeBuffer::Owned(bytes) => bytes.len() - CARRY_MARGIN,
            CodeBuffer::User(bytes) => bytes.len(),
        }
    }

    pub(crate) fn as_slice(&self) -> &[u8] {
        match self {
            CodeBuffer::Unset => &[],
            CodeBuffer::Owned(bytes) => bytes,
            CodeBuffer::User(bytes) => bytes,
        }
    }

    pub(crate) fn as_mut_slice(&mut self) -> &mut [u8] {
        match self {
            CodeBuffer::Unset => &mut [],
            CodeBuffer::Owned(bytes) => bytes,
            CodeBuffer::User(bytes) => bytes,
        }
    }
}
