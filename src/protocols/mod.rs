//! Protocol decoders for the supported keyfob systems.
//!
//! Each protocol module owns one instantiation of the same pipeline: 2-bit
//! symbol decode ([`symbols`]) into a canonical key, fixed bitfield
//! extraction, per-protocol de-obfuscation, and a [`crate::record`] result.
//! Shared pieces: [`symbols`], [`keeloq_common`].
//!
//! Decoders are pure: each decode call is a function of the frame (plus the
//! read-only key material a decoder was built with) and either yields a
//! complete record or aborts. No state is carried between frames and there
//! is no retry — a rejected frame is simply not reported.

pub mod keeloq_common;
pub mod symbols;

mod ford_v0;
mod kia_v0;
mod kia_v1;
mod kia_v2;
mod kia_v3_v4;
mod kia_v5;
mod subaru;

#[cfg(test)]
pub(crate) mod testutil;

pub use ford_v0::FordV0Decoder;
pub use kia_v0::KiaV0Decoder;
pub use kia_v1::KiaV1Decoder;
pub use kia_v2::KiaV2Decoder;
pub use kia_v3_v4::KiaV3V4Decoder;
pub use kia_v5::KiaV5Decoder;
pub use subaru::SubaruDecoder;

use thiserror::Error;

/// Why a decode attempt was rejected.
///
/// Malformed RF data is routine, not exceptional: aborts are returned as
/// values and never escalate further. A frame that aborts produces no
/// partial output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum DecodeAbort {
    /// The frame carries fewer bits than the protocol needs. The caller may
    /// retry only once more bits have arrived.
    #[error("insufficient data: got {got} bits, need at least {need}")]
    Length { need: usize, got: usize },

    /// Structural rejection: wrong preamble bytes, a missing
    /// resynchronization pattern, or an illegal 2-bit symbol mid-stream.
    /// Terminal for this frame.
    #[error("sanity check failed: {0}")]
    Sanity(&'static str),
}

/// Per-protocol decode result.
pub type DecodeResult = Result<crate::record::DecodedRecord, DecodeAbort>;
