//! Floating-point variant of the arithmetic codec.
//!
//! Same coding operations and model kinds as the integer variant, but
//! the interval lives in doubles and renormalization moves 16 bits at
//! a time. Round trips are exact, yet the emitted byte streams differ
//! from the integer variant's, and they depend on strict IEEE-754
//! double arithmetic: decode streams on the host that produced them.

mod codec;
mod models;

pub use codec::ArithmeticCodec;
pub use models::{AdaptiveBitModel, AdaptiveDataModel, StaticBitModel, StaticDataModel};
