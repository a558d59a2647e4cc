//! Kia V2 decoder.
//!
//! Single row with a 24-bit resynchronization preamble and a quick partial
//! check on the first three raw bytes. 52-bit key; the 12-bit counter
//! subfield is transmitted byte-swapped (low byte and high nibble traded)
//! and truncated back to 12 bits after the swap.

use tracing::debug;

use super::symbols::{decode_symbols, SymbolMap};
use super::{DecodeAbort, DecodeResult};
use crate::frame::{FrameSync, RawFrame};
use crate::record::DecodedRecord;

const SYMBOLS: SymbolMap = SymbolMap::new(0b10, 0b01);

const PREAMBLE: [u8; 3] = [0xCC, 0xCC, 0xCD];
const PREAMBLE_BITS: usize = 24;
const DATA_BYTES: usize = 13;
const KEY_BITS: usize = 52;

/// Kia V2 protocol decoder.
pub struct KiaV2Decoder;

impl KiaV2Decoder {
    pub fn new() -> Self {
        Self
    }

    pub fn decode(&self, frame: &RawFrame, sync: &impl FrameSync) -> DecodeResult {
        let Some(row) = frame.row(0) else {
            return Err(DecodeAbort::Length {
                need: DATA_BYTES * 8,
                got: 0,
            });
        };

        // Partial preamble over the leading bytes; the capture may start on
        // a half-chip (0xF9) or mid-preamble (0x99).
        let (b0, b1, b2) = (row.byte(0), row.byte(1), row.byte(2));
        if (b0 != 0xF9 && b0 != 0x99 && b0 != 0xCC)
            || (b1 != 0x99 && b1 != 0xCC)
            || (b2 != 0x99 && b2 != 0xCC)
        {
            debug!("Kia V2: leading bytes {:02X} {:02X} {:02X} rejected", b0, b1, b2);
            return Err(DecodeAbort::Sanity("preamble mismatch"));
        }

        let Some(start) = sync.search(row, 0, &PREAMBLE, PREAMBLE_BITS) else {
            return Err(DecodeAbort::Sanity("preamble not found"));
        };

        let total_bits = DATA_BYTES * 8;
        if row.bit_len() - start < total_bits {
            return Err(DecodeAbort::Sanity("payload truncated"));
        }

        // One bit early, same overlap trick as V1.
        let mut data = [0u8; DATA_BYTES];
        sync.extract(row, start + PREAMBLE_BITS - 1, total_bits, &mut data);

        let key = decode_symbols(&data, KEY_BITS, &SYMBOLS)?;

        let serial = ((key >> 20) & 0xFFFF_FFFF) as u32;
        let button = ((key >> 16) & 0xF) as u8;
        // Counter subfield is byte-swapped on the air; swap back and keep
        // the low 12 bits, discarding whatever the swap pushed out.
        let swapped = ((key >> 4) & 0xFFF) as u16;
        let counter = ((swapped >> 4) | (swapped << 8)) & 0xFFF;
        let crc = (key & 0xF) as u8;

        let mut rec = DecodedRecord::new("Kia V2");
        rec.push_hex("id", serial as u64, 8);
        rec.push_hex("key", key, 8);
        rec.push_hex("btn", button as u64, 1);
        rec.push_hex("count", counter as u64, 3);
        rec.push_hex("crc", crc as u64, 1);
        Ok(rec)
    }
}

impl Default for KiaV2Decoder {
    fn default() -> Self {
        Self::new()
    }
}
