//! Definitions of error related things.

use crate::codec::CodecMode;
use std::fmt;

/// Errors of this crate
#[derive(Debug)]
#[non_exhaustive]
pub enum ArithmeticError {
    /// The operation requires the codec to be in another mode
    InvalidMode {
        expected: CodecMode,
        actual: CodecMode,
    },
    /// A coder was started before any code buffer was set
    BufferNotSet,
    /// The requested code buffer capacity is outside the accepted range
    InvalidBufferSize(usize),
    /// The compressed data does not fit in the code buffer
    BufferOverflow,
    /// A probability outside [0.0001, 0.9999]
    InvalidProbability(f64),
    /// The probabilities of a distribution do not sum to 1
    InvalidDistributionSum(f64),
    /// The alphabet size is outside the range supported by the model
    InvalidSymbolCount(u32),
    /// Wrapper around an io error from the std lib
    IoError(std::io::Error),
}

impl From<std::io::Error> for ArithmeticError {
    fn from(e: std::io::Error) -> Self {
        ArithmeticError::IoError(e)
    }
}

impl fmt::Display for ArithmeticError {
    fn fmt(&self, f: &mut fmt::Formatter) -> Result<(), fmt::Error> {
        match self {
            ArithmeticError::InvalidMode { expected, actual } => write!(
                f,
                "Operation requires the codec to be {:?} but it is {:?}",
                expected, actual
            ),
            ArithmeticError::BufferNotSet => write!(f, "No code buffer set"),
            ArithmeticError::InvalidBufferSize(size) => {
                write!(f, "Invalid codec buffer size: {}", size)
            }
            ArithmeticError::BufferOverflow => write!(f, "Code buffer overflow"),
            ArithmeticError::InvalidProbability(p) => write!(f, "Invalid probability: {}", p),
            ArithmeticError::InvalidDistributionSum(sum) => {
                write!(f, "Probabilities sum to {} instead of 1", sum)
            }
            ArithmeticError::InvalidSymbolCount(n) => {
                write!(f, "Invalid number of data symbols: {}", n)
            }
            ArithmeticError::IoError(e) => write!(f, "IoError: {}", e),
        }
    }
}

impl std::error::Error for ArithmeticError {}
