//! Kia V5 decoder.
//!
//! Single row behind a 24-bit preamble; the symbol stream starts one bit
//! after the preamble to skip a guard bit. 64-bit key plus a 4-bit CRC
//! rider, both LSB-first on the air. The low 32 bits hide the rolling
//! counter behind an 18-round nonlinear stream mixer keyed by an 8-byte
//! keystore; [`mixer_decode`] runs it in reverse.

use tracing::debug;

use super::keeloq_common::reverse_key;
use super::symbols::{decode_symbols, SymbolMap};
use super::{DecodeAbort, DecodeResult};
use crate::frame::{FrameSync, RawFrame};
use crate::record::DecodedRecord;

const SYMBOLS: SymbolMap = SymbolMap::new(0b01, 0b10);

const PREAMBLE: [u8; 3] = [0xAA, 0xAA, 0xA6];
const PREAMBLE_BITS: usize = 24;
const MIN_BITS: usize = 404;
/// 64 key bits plus the CRC rider, two raw bits each.
const DATA_BYTES: usize = 17;
const KEY_BITS: usize = 64;
const CRC_BITS: usize = 4;

/// Kia V5 protocol decoder. Holds the mixer keystore.
pub struct KiaV5Decoder {
    keystore: [u8; 8],
}

impl KiaV5Decoder {
    /// Keystore bytes shipped in the fob firmware.
    pub const DEFAULT_KEYSTORE: [u8; 8] = [0x53, 0x54, 0x46, 0x52, 0x4B, 0x45, 0x30, 0x30];

    pub fn new() -> Self {
        Self {
            keystore: Self::DEFAULT_KEYSTORE,
        }
    }

    pub fn with_keystore(keystore: [u8; 8]) -> Self {
        Self { keystore }
    }

    pub fn decode(&self, frame: &RawFrame, sync: &impl FrameSync) -> DecodeResult {
        let Some(row) = frame.row(0) else {
            return Err(DecodeAbort::Length {
                need: MIN_BITS,
                got: 0,
            });
        };
        if row.bit_len() < MIN_BITS {
            return Err(DecodeAbort::Length {
                need: MIN_BITS,
                got: row.bit_len(),
            });
        }

        let Some(start) = sync.search(row, 0, &PREAMBLE, PREAMBLE_BITS) else {
            debug!("Kia V5: preamble not found");
            return Err(DecodeAbort::Sanity("preamble not found"));
        };

        let total_bits = DATA_BYTES * 8;
        if row.bit_len() - start < total_bits {
            return Err(DecodeAbort::Sanity("payload truncated"));
        }

        // One bit late: a guard bit separates preamble and data.
        let mut data = [0u8; DATA_BYTES];
        sync.extract(row, start + PREAMBLE_BITS + 1, total_bits, &mut data);

        let key = decode_symbols(&data, KEY_BITS, &SYMBOLS)?;
        // The CRC rides in the 17th raw byte, first two symbols always zero.
        let crc = decode_symbols(&data[16..], CRC_BITS, &SYMBOLS)? as u8;

        let yek = reverse_key(key, 64);
        let encrypted = (yek & 0xFFFF_FFFF) as u32;
        let button = ((yek >> 60) & 0xF) as u8;
        let serial = ((yek >> 32) & 0x0FFF_FFFF) as u32;
        let decrypted = mixer_decode(encrypted, &self.keystore);

        let mut rec = DecodedRecord::new("Kia V5");
        rec.push_hex("key", key, 8);
        rec.push_hex("id", encrypted as u64, 8);
        rec.push_int("button", button as u32);
        rec.push_hex("yek", yek, 8);
        rec.push_hex("serial", serial as u64, 7);
        rec.push_hex("decrypted", decrypted as u64, 1);
        rec.push_hex("crc", crc as u64, 1);
        Ok(rec)
    }
}

impl Default for KiaV5Decoder {
    fn default() -> Self {
        Self::new()
    }
}

/// Undo the fob's 18-round stream mixer and recover the 16-bit counter.
///
/// Four 8-bit lanes (s0 = least significant byte of `encrypted`) rotate
/// left one bit per inner step with carries rippling s0→s1→s2→s3, while a
/// lookup byte keyed by two bits of s3, three data-gated tweaks and the
/// rotating keystore byte decide the bit injected into s0. The round index
/// starts at 1 and steps downward modulo 8. Pure function of its inputs.
pub fn mixer_decode(encrypted: u32, keystore: &[u8; 8]) -> u16 {
    let mut s0 = (encrypted & 0xFF) as u8;
    let mut s1 = ((encrypted >> 8) & 0xFF) as u8;
    let mut s2 = ((encrypted >> 16) & 0xFF) as u8;
    let mut s3 = ((encrypted >> 24) & 0xFF) as u8;

    let mut round_index: usize = 1;
    for _ in 0..18 {
        let mut r = keystore[round_index];
        for _ in 0..8 {
            let mut base: u8 = if s3 & 0x40 == 0 {
                if s3 & 0x02 == 0 {
                    0x74
                } else {
                    0x2E
                }
            } else if s3 & 0x02 == 0 {
                0x3A
            } else {
                0x5C
            };

            if s2 & 0x08 != 0 {
                base = (base >> 4) | (base << 4);
            }
            if s1 & 0x01 != 0 {
                base = (base & 0x3F) << 2;
            }
            if s0 & 0x01 != 0 {
                base <<= 1;
            }

            let temp = s3 ^ s1;
            s3 = (s3 & 0x7F) << 1;
            if s2 & 0x80 != 0 {
                s3 |= 0x01;
            }
            s2 = (s2 & 0x7F) << 1;
            if s1 & 0x80 != 0 {
                s2 |= 0x01;
            }
            s1 = (s1 & 0x7F) << 1;
            if s0 & 0x80 != 0 {
                s1 |= 0x01;
            }
            s0 = (s0 & 0x7F) << 1;

            let chk = base ^ r ^ temp;
            if chk & 0x80 != 0 {
                s0 |= 0x01;
            }
            r = (r & 0x7F) << 1;
        }
        round_index = round_index.wrapping_sub(1) & 0x7;
    }

    ((s1 as u16) << 8) | s0 as u16
}
