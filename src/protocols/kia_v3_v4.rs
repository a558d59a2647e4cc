//! Kia V3/V4 decoder (KeeLoq hop codes).
//!
//! PWM transmission, LSB-first per byte, captured inverted. Two row shapes
//! occur in practice: preamble split into its own 10-bit row with the
//! payload in the next row, or an 11-bit partial preamble row followed by
//! the payload. The 32-bit hop code is tried against the key ring; a key
//! whose decryption is consistent with the transmitted button nibble and
//! serial low byte pins the variant (ring slot 0 = V4, slot 1 = V3).
//! Without a match the frame still decodes, with cipher fields Unknown.

use tracing::debug;

use super::keeloq_common::{keeloq_decrypt, reverse8, reverse_key};
use super::{DecodeAbort, DecodeResult};
use crate::frame::RawFrame;
use crate::keys::{KeyClass, KeyRing};
use crate::record::{DecodedRecord, UNKNOWN};

const MIN_DATA_BITS: usize = 64;
const MAX_DATA_BITS: usize = 80;

/// Kia V3/V4 protocol decoder. Holds the candidate key ring.
pub struct KiaV3V4Decoder {
    ring: KeyRing,
}

impl KiaV3V4Decoder {
    pub fn new(ring: KeyRing) -> Self {
        Self { ring }
    }

    pub fn decode(&self, frame: &RawFrame) -> DecodeResult {
        // Two capture shapes: empty first row with a clean 0xFFC0 preamble
        // row, or an 11-bit 0x7FE0 partial preamble as the first row.
        let data_row = match frame.bit_len(0) {
            0 => {
                let data_bits = frame.bit_len(2);
                if frame.bit_len(1) != 10 || !(MIN_DATA_BITS..=MAX_DATA_BITS).contains(&data_bits)
                {
                    return Err(DecodeAbort::Length {
                        need: MIN_DATA_BITS,
                        got: data_bits,
                    });
                }
                let pre = frame.row(1).map(|r| (r.byte(0), r.byte(1)));
                if pre != Some((0xFF, 0xC0)) {
                    debug!("Kia V3/V4: preamble not found");
                    return Err(DecodeAbort::Sanity("preamble not found"));
                }
                frame.row(2)
            }
            11 => {
                let data_bits = frame.bit_len(1);
                if !(MIN_DATA_BITS..=MAX_DATA_BITS).contains(&data_bits) {
                    return Err(DecodeAbort::Length {
                        need: MIN_DATA_BITS,
                        got: data_bits,
                    });
                }
                let pre = frame.row(0).map(|r| (r.byte(0), r.byte(1)));
                if pre != Some((0x7F, 0xE0)) {
                    debug!("Kia V3/V4: partial preamble not found");
                    return Err(DecodeAbort::Sanity("preamble not found"));
                }
                frame.row(1)
            }
            _ => return Err(DecodeAbort::Sanity("unrecognized row shape")),
        };

        let Some(data_row) = data_row else {
            return Err(DecodeAbort::Length {
                need: MIN_DATA_BITS,
                got: 0,
            });
        };

        // The air signal is active-low; work on the inverted copy.
        let inv = data_row.inverted();
        let mut b = [0u8; 8];
        for (i, byte) in b.iter_mut().enumerate() {
            *byte = inv.byte(i);
        }

        // Transmission is LSB-first: every field reassembles through
        // per-byte bit reversal.
        let encrypted = ((reverse8(b[3]) as u32) << 24)
            | ((reverse8(b[2]) as u32) << 16)
            | ((reverse8(b[1]) as u32) << 8)
            | reverse8(b[0]) as u32;
        let key = u64::from_be_bytes(b);
        let yek = reverse_key(key, 64);
        let serial = ((reverse8(b[7] & 0xF0) as u32) << 24)
            | ((reverse8(b[6]) as u32) << 16)
            | ((reverse8(b[5]) as u32) << 8)
            | reverse8(b[4]) as u32;
        let button = (reverse8(b[7]) & 0xF0) >> 4;

        // Try each provisioned key; a decryption is accepted when the block
        // agrees with the transmitted button nibble and serial low byte.
        let mut matched = None;
        for (class, mf_key) in self.ring.candidates() {
            let block = keeloq_decrypt(encrypted, mf_key);
            if (block >> 28) as u8 == button && ((block >> 16) & 0xFF) as u8 == serial as u8 {
                matched = Some((class, mf_key, block));
                break;
            }
        }

        let model = match matched {
            Some((KeyClass::V4, _, _)) => "Kia V4",
            Some((KeyClass::V3, _, _)) => "Kia V3",
            None => "Kia 3/4",
        };

        let mut rec = DecodedRecord::new(model);
        rec.push_hex("key", key, 8);
        rec.push_hex("id", encrypted as u64, 8);
        rec.push_int("button", button as u32);
        rec.push_hex("yek", yek, 8);
        rec.push_hex("serial", serial as u64, 7);
        match matched {
            Some((_, mf_key, block)) => {
                rec.push_hex("decrypted", block as u64, 8);
                rec.push_hex("mfkey", mf_key, 8);
            }
            None => {
                rec.push_text("decrypted", UNKNOWN);
                rec.push_text("mfkey", UNKNOWN);
            }
        }
        Ok(rec)
    }
}
