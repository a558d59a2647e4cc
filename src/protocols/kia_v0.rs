//! Kia V0 decoder.
//!
//! Single row, resynchronized on a repeated 32-bit preamble. The payload
//! sits between two preamble occurrences; the stretch is decoded as 2-bit
//! symbols into a 56-bit key. This variant tolerates 0b00 filler symbols
//! between runs, and its fields are plain fixed masks — no de-obfuscation.

use tracing::debug;

use super::symbols::{decode_symbols, SymbolMap};
use super::{DecodeAbort, DecodeResult};
use crate::frame::{FrameSync, RawFrame};
use crate::record::{hex, DecodedRecord};

const SYMBOLS: SymbolMap = SymbolMap::with_filler(0b11, 0b10, 0b00);

const PREAMBLE: [u8; 4] = [0xAA, 0xAA, 0xCC, 0xCC];
const PREAMBLE_BITS: usize = 32;
/// The full burst repeats the preamble; anything shorter than this cannot
/// hold a payload yet.
const MIN_BITS: usize = 670;
const DATA_BYTES: usize = 25;
const KEY_BITS: usize = 56;

/// Kia V0 protocol decoder.
pub struct KiaV0Decoder;

impl KiaV0Decoder {
    pub fn new() -> Self {
        Self
    }

    pub fn decode(&self, frame: &RawFrame, sync: &impl FrameSync) -> DecodeResult {
        let Some(row) = frame.row(0) else {
            return Err(DecodeAbort::Length {
                need: MIN_BITS,
                got: 0,
            });
        };
        let available = row.bit_len();
        if available < MIN_BITS {
            return Err(DecodeAbort::Length {
                need: MIN_BITS,
                got: available,
            });
        }

        let Some(start) = sync.search(row, 0, &PREAMBLE, PREAMBLE_BITS) else {
            debug!("Kia V0: preamble not found");
            return Err(DecodeAbort::Sanity("preamble not found"));
        };

        // Payload runs to the next preamble, or to the end of the row when
        // the repeat is missing. Size varies, so take more than we need.
        let data_start = start + PREAMBLE_BITS;
        let end = sync
            .search(row, data_start, &PREAMBLE, PREAMBLE_BITS)
            .unwrap_or(available);
        let total_bits = (end - data_start).min(DATA_BYTES * 8);

        let mut data = [0u8; DATA_BYTES];
        sync.extract(row, data_start, total_bits, &mut data);

        let key = decode_symbols(&data, KEY_BITS, &SYMBOLS)?;

        let counter = ((key >> 40) & 0xFFFF) as u32;
        let serial = ((key >> 12) & 0x0FFF_FFFF) as u32;
        let button = ((key >> 8) & 0x0F) as u8;
        let crc = (key & 0xFF) as u8;

        let mut rec = DecodedRecord::new("Kia V0");
        rec.push_hex("id", serial as u64, 7);
        rec.push_text("flipper key", format!("0F{}", hex(key, 8)));
        rec.push_hex("btn", button as u64, 1);
        rec.push_hex("count", counter as u64, 4);
        rec.push_hex("crc", crc as u64, 2);
        Ok(rec)
    }
}

impl Default for KiaV0Decoder {
    fn default() -> Self {
        Self::new()
    }
}
