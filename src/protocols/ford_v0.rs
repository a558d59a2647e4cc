//! Ford V0 decoder.
//!
//! Two rows: a 35-bit (full) or 28-bit (repeat) preamble row, then a
//! 167/168-bit data row carrying a 64-bit key and a 16-bit BS/CRC code as
//! 2-bit symbols. The key is scrambled with a parity-selected XOR pass and
//! an odd/even bit interleave of the last two bytes; [`unscramble`] reverses
//! both. The transmitted BS and CRC bytes are reported as received, without
//! independent verification.

use tracing::debug;

use super::symbols::{decode_symbols, SymbolMap};
use super::{DecodeAbort, DecodeResult};
use crate::frame::RawFrame;
use crate::record::DecodedRecord;

const SYMBOLS: SymbolMap = SymbolMap::new(0b01, 0b10);

const KEY_BITS: usize = 64;
const CODE_BITS: usize = 16;
/// Full preamble row length; a repeat burst carries 28 bits.
const PREAMBLE_BITS_FULL: usize = 35;
const PREAMBLE_BITS_REPEAT: usize = 28;
/// Data row length; overall length changes by one bit with parity.
const DATA_BITS_MIN: usize = 167;

/// Ford V0 protocol decoder.
pub struct FordV0Decoder;

impl FordV0Decoder {
    pub fn new() -> Self {
        Self
    }

    pub fn decode(&self, frame: &RawFrame) -> DecodeResult {
        let pre_len = frame.bit_len(0);
        if pre_len != PREAMBLE_BITS_FULL && pre_len != PREAMBLE_BITS_REPEAT {
            return Err(DecodeAbort::Length {
                need: PREAMBLE_BITS_REPEAT,
                got: pre_len,
            });
        }

        let Some(pre) = frame.row(0) else {
            return Err(DecodeAbort::Length {
                need: PREAMBLE_BITS_REPEAT,
                got: 0,
            });
        };
        let (b0, b1) = (pre.byte(0), pre.byte(1));
        if (b0 != 0xFF && b0 != 0x99) || (b1 != 0x33 && b1 != 0x99) {
            debug!("Ford V0: preamble bytes {:02X} {:02X} rejected", b0, b1);
            return Err(DecodeAbort::Sanity("preamble mismatch"));
        }

        let data_len = frame.bit_len(1);
        if data_len != DATA_BITS_MIN && data_len != DATA_BITS_MIN + 1 {
            return Err(DecodeAbort::Length {
                need: DATA_BITS_MIN,
                got: data_len,
            });
        }
        let Some(data) = frame.row(1) else {
            return Err(DecodeAbort::Length {
                need: DATA_BITS_MIN,
                got: 0,
            });
        };

        let key = decode_symbols(data.bytes(), KEY_BITS, &SYMBOLS)?;

        // BS and CRC ride in raw bytes 16..20, past the 64-bit key.
        let code_raw = [data.byte(16), data.byte(17), data.byte(18), data.byte(19)];
        let code = decode_symbols(&code_raw, CODE_BITS, &SYMBOLS)? as u16;

        let (serial, button, counter) = unscramble(key, code);

        let mut rec = DecodedRecord::new("Ford V0");
        rec.push_hex("id", serial as u64, 8);
        rec.push_hex("key", key, 8);
        rec.push_hex("btn", button as u64, 2);
        rec.push_hex("count", counter as u64, 8);
        rec.push_hex("bs", (code >> 8) as u64, 2);
        rec.push_hex("crc", (code & 0xFF) as u64, 2);
        Ok(rec)
    }
}

impl Default for FordV0Decoder {
    fn default() -> Self {
        Self::new()
    }
}

/// Reverse the parity-selected XOR pass and the byte 6/7 bit interleave,
/// then pull out (serial, button, counter).
fn unscramble(key: u64, code: u16) -> (u32, u8, u32) {
    let mut buf = [0u8; 8];
    for (i, b) in buf.iter_mut().enumerate() {
        *b = (key >> (56 - i * 8)) as u8;
    }
    let bs = (code >> 8) as u8;

    // Parity over the BS byte; an all-zero byte clears the flag outright.
    let mut tmp = bs;
    let mut parity = 0u8;
    while tmp != 0 {
        parity ^= tmp & 1;
        tmp >>= 1;
    }
    let parity_active = bs != 0 && parity != 0;

    let (xor_key, limit) = if parity_active {
        (buf[7], 7usize)
    } else {
        (buf[6], 6usize)
    };
    for idx in 1..limit {
        buf[idx] ^= xor_key;
    }
    // The inactive branch also covers byte 7.
    if !parity_active {
        buf[7] ^= xor_key;
    }

    // Interleave: new byte 7 takes the even-position bits of the old byte 7
    // and the odd-position bits of byte 6; byte 6 takes the complement.
    let orig_b7 = buf[7];
    buf[7] = (orig_b7 & 0xAA) | (buf[6] & 0x55);
    buf[6] = (buf[6] & 0xAA) | (orig_b7 & 0x55);

    let serial_le = u32::from_le_bytes([buf[1], buf[2], buf[3], buf[4]]);
    let serial = serial_le.swap_bytes();
    let button = buf[5] >> 4;
    let counter = (((buf[5] & 0x0F) as u32) << 16) | ((buf[6] as u32) << 8) | buf[7] as u32;

    (serial, button, counter)
}
