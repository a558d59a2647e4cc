//! fobdec — keyfob frame decoding.
//!
//! Recovers serial number, button code, rolling counter and checksum fields
//! from the raw bitstreams of automotive remote keyfobs, across several
//! incompatible on-air protocols: Ford V0, Kia V0/V1/V2, Kia V3/V4
//! (KeeLoq), Kia V5 and Subaru.
//!
//! Every protocol runs the same pipeline over one captured [`RawFrame`]:
//!
//! 1. decode the 2-bit-per-logical-bit symbol stream into a canonical
//!    64-bit key, aborting on any illegal symbol;
//! 2. slice the key into the protocol's fixed bitfields;
//! 3. reverse the protocol's obfuscation — Ford's parity-selected XOR
//!    network, Kia V5's 18-round stream mixer, KeeLoq decryption against a
//!    [`KeyRing`], Subaru's data-dependent ring rotation;
//! 4. report the fields as a flat [`DecodedRecord`].
//!
//! Demodulation, preamble search and bit-addressed extraction stay outside:
//! the decoders that resynchronize mid-row take a caller-supplied
//! [`FrameSync`] implementation. Decoders hold only read-only key material,
//! so frames may be decoded from any number of threads without
//! coordination. A malformed frame is an ordinary [`DecodeAbort`] value,
//! never a panic; a missing or unmatched cipher key still yields a record,
//! with the affected fields reported as `"Unknown"`.

pub mod frame;
pub mod keys;
pub mod protocols;
pub mod record;

pub use frame::{FrameRow, FrameSync, RawFrame};
pub use keys::{KeyClass, KeyRing, KeyStore};
pub use protocols::{
    DecodeAbort, DecodeResult, FordV0Decoder, KiaV0Decoder, KiaV1Decoder, KiaV2Decoder,
    KiaV3V4Decoder, KiaV5Decoder, SubaruDecoder,
};
pub use record::{DecodedRecord, FieldValue};
