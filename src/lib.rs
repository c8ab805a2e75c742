//! Fast arithmetic coding.
//!
//! This crate is an entropy-coding core: it maps a sequence of coding
//! decisions (bits, uniform values, or symbols drawn from a model) to
//! a nested sub-interval of [0, 1) and emits the shortest byte string
//! identifying that interval. Higher-level compressors drive it by
//! pairing every `encode` call with the matching `decode` call against
//! models reset to the same state.
//!
//! Two numeric variants are provided with the same API:
//!
//! * [`ArithmeticCodec`] — 32-bit integer interval state, byte-wise
//!   renormalization, shift-based binary models and sorted-symbol
//!   data models. This is the fast variant.
//! * [`fp::ArithmeticCodec`] — double-precision interval state with
//!   16-bit renormalization chunks.
//!
//! Both round-trip exactly, but their byte streams are not
//! interchangeable.
//!
//! # Example
//!
//! ```
//! use fastac::{AdaptiveDataModel, ArithmeticCodec};
//!
//! # fn main() -> Result<(), fastac::ArithmeticError> {
//! let mut codec = ArithmeticCodec::with_capacity(4096)?;
//! let mut model = AdaptiveDataModel::new(16)?;
//!
//! codec.start_encoder()?;
//! for sym in (0..16u32).cycle().take(1000) {
//!     codec.encode_adaptive_symbol(&mut model, sym)?;
//! }
//! let code_bytes = codec.stop_encoder()?;
//! assert!(code_bytes <= 4096);
//!
//! // decoding replays the same operations with a freshly reset model
//! model.reset();
//! codec.start_decoder()?;
//! for sym in (0..16u32).cycle().take(1000) {
//!     assert_eq!(codec.decode_adaptive_symbol(&mut model), sym);
//! }
//! codec.stop_decoder()?;
//! # Ok(())
//! # }
//! ```
//!
//! Compressed streams carry no framing of their own; transport the
//! byte count returned by `stop_encoder` yourself, or use
//! [`ArithmeticCodec::write_to_file`] and
//! [`ArithmeticCodec::read_from_file`] which prefix the code with a
//! variable-length byte count.

mod buffer;

pub mod codec;
pub mod errors;
pub mod fp;
pub mod models;

pub use codec::{ArithmeticCodec, CodecMode};
pub use errors::ArithmeticError;
pub use models::{AdaptiveBitModel, AdaptiveDataModel, StaticBitModel, StaticDataModel};
