//! Kia V1 decoder.
//!
//! Single row, resynchronized on a 32-bit preamble ending in 0xCD. The
//! symbol stream overlaps the final preamble bit, so extraction starts one
//! bit early. 56-bit key, plain fixed-mask fields.

use tracing::debug;

use super::symbols::{decode_symbols, SymbolMap};
use super::{DecodeAbort, DecodeResult};
use crate::frame::{FrameSync, RawFrame};
use crate::record::DecodedRecord;

const SYMBOLS: SymbolMap = SymbolMap::new(0b10, 0b01);

const PREAMBLE: [u8; 4] = [0xCC, 0xCC, 0xCC, 0xCD];
const PREAMBLE_BITS: usize = 32;
const MIN_BITS: usize = 354;
/// 8 decoded bytes take 16 raw bytes on the air.
const DATA_BYTES: usize = 16;
const KEY_BITS: usize = 56;

/// Kia V1 protocol decoder.
pub struct KiaV1Decoder;

impl KiaV1Decoder {
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
        if row.bit_len() < MIN_BITS {
            return Err(DecodeAbort::Length {
                need: MIN_BITS,
                got: row.bit_len(),
            });
        }

        let Some(start) = sync.search(row, 0, &PREAMBLE, PREAMBLE_BITS) else {
            debug!("Kia V1: preamble not found");
            return Err(DecodeAbort::Sanity("preamble not found"));
        };

        let total_bits = DATA_BYTES * 8;
        if row.bit_len() - start < total_bits {
            return Err(DecodeAbort::Sanity("payload truncated"));
        }

        // Extract one bit before the preamble end to line up the symbols.
        let mut data = [0u8; DATA_BYTES];
        sync.extract(row, start + PREAMBLE_BITS - 1, total_bits, &mut data);

        let key = decode_symbols(&data, KEY_BITS, &SYMBOLS)?;

        let serial = (key >> 24) as u32;
        let button = (key >> 16) as u8;
        let counter = (key >> 8) as u8;
        let crc = key as u8;

        let mut rec = DecodedRecord::new("Kia V1");
        rec.push_hex("id", serial as u64, 8);
        rec.push_hex("key", key, 8);
        rec.push_hex("btn", button as u64, 1);
        rec.push_hex("count", counter as u64, 2);
        rec.push_hex("crc", crc as u64, 2);
        Ok(rec)
    }
}

impl Default for KiaV1Decoder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocols::testutil::{BitWriter, TestSync};
    use crate::record::FieldValue;

    /// The first logical bit must be 1: its symbol's leading raw bit doubles
    /// as the final preamble bit.
    fn burst(key: u64) -> RawFrame {
        let mut w = BitWriter::new();
        w.push_byte(0xCC);
        w.push_byte(0xCC);
        w.push_byte(0xCC);
        w.push_bits(0xCD >> 1, 7);
        w.push_symbols(key, KEY_BITS, &SYMBOLS);
        w.pad_to(360);
        RawFrame::new(vec![w.into_row()])
    }

    #[test]
    fn decodes_fixed_mask_layout() {
        let rec = KiaV1Decoder::new()
            .decode(&burst(0x81_2233_4455_6677), &TestSync)
            .unwrap();

        assert_eq!(rec.model(), "Kia V1");
        assert_eq!(rec.get("id"), Some(&FieldValue::Text("81223344".into())));
        assert_eq!(
            rec.get("key"),
            Some(&FieldValue::Text("81223344556677".into()))
        );
        assert_eq!(rec.get("btn"), Some(&FieldValue::Text("55".into())));
        assert_eq!(rec.get("count"), Some(&FieldValue::Text("66".into())));
        assert_eq!(rec.get("crc"), Some(&FieldValue::Text("77".into())));
    }

    #[test]
    fn hex_widths_match_report_format() {
        // Small field values keep their minimum widths: 8 for serial, 1 for
        // button, 2 for counter and crc.
        let rec = KiaV1Decoder::new()
            .decode(&burst(0x8000_0100_0203_04), &TestSync)
            .unwrap();
        assert_eq!(rec.get("id"), Some(&FieldValue::Text("80000100".into())));
        assert_eq!(rec.get("btn"), Some(&FieldValue::Text("2".into())));
        assert_eq!(rec.get("count"), Some(&FieldValue::Text("03".into())));
        assert_eq!(rec.get("crc"), Some(&FieldValue::Text("04".into())));
    }

    #[test]
    fn short_row_rejected() {
        let mut w = BitWriter::new();
        w.pad_to(100);
        let frame = RawFrame::new(vec![w.into_row()]);
        assert_eq!(
            KiaV1Decoder::new().decode(&frame, &TestSync),
            Err(DecodeAbort::Length {
                need: MIN_BITS,
                got: 100
            })
        );
    }

    #[test]
    fn preamble_near_the_end_leaves_no_payload() {
        let mut w = BitWriter::new();
        w.pad_to(MIN_BITS - PREAMBLE_BITS + 10);
        for &b in &PREAMBLE {
            w.push_byte(b);
        }
        let frame = RawFrame::new(vec![w.into_row()]);
        assert_eq!(
            KiaV1Decoder::new().decode(&frame, &TestSync),
            Err(DecodeAbort::Sanity("payload truncated"))
        );
    }
}
