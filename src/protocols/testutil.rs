//! Test fixtures: synthetic frame construction and a reference
//! implementation of the caller-supplied [`FrameSync`] primitive.

use crate::frame::{FrameRow, FrameSync};
use crate::protocols::symbols::SymbolMap;

/// MSB-first bit accumulator for building synthetic rows.
pub struct BitWriter {
    bytes: Vec<u8>,
    bit_len: usize,
}

impl BitWriter {
    pub fn new() -> Self {
        Self {
            bytes: Vec::new(),
            bit_len: 0,
        }
    }

    pub fn push_bit(&mut self, bit: bool) {
        if self.bit_len % 8 == 0 {
            self.bytes.push(0);
        }
        if bit {
            let idx = self.bit_len / 8;
            self.bytes[idx] |= 1 << (7 - self.bit_len % 8);
        }
        self.bit_len += 1;
    }

    /// Push the low `count` bits of `value`, most significant first.
    pub fn push_bits(&mut self, value: u64, count: usize) {
        for i in (0..count).rev() {
            self.push_bit((value >> i) & 1 == 1);
        }
    }

    pub fn push_byte(&mut self, byte: u8) {
        self.push_bits(byte as u64, 8);
    }

    /// Encode `bit_count` logical bits of `value` as 2-bit symbols.
    pub fn push_symbols(&mut self, value: u64, bit_count: usize, map: &SymbolMap) {
        for i in (0..bit_count).rev() {
            let sym = if (value >> i) & 1 == 1 { map.one } else { map.zero };
            self.push_bits(sym as u64, 2);
        }
    }

    /// Zero-fill up to `bit_len` total bits.
    pub fn pad_to(&mut self, bit_len: usize) {
        while self.bit_len < bit_len {
            self.push_bit(false);
        }
    }

    pub fn bit_len(&self) -> usize {
        self.bit_len
    }

    pub fn into_row(self) -> FrameRow {
        FrameRow::new(self.bytes, self.bit_len)
    }
}

/// Symbol-encode a value into whole bytes (zero-padded tail).
pub fn encode_symbols(value: u64, bit_count: usize, map: &SymbolMap) -> Vec<u8> {
    let mut w = BitWriter::new();
    w.push_symbols(value, bit_count, map);
    let padded = (w.bit_len() + 7) / 8 * 8;
    w.pad_to(padded);
    let row = w.into_row();
    row.bytes().to_vec()
}

fn row_bit(row: &FrameRow, idx: usize) -> bool {
    if idx >= row.bit_len() {
        return false;
    }
    (row.byte(idx / 8) >> (7 - idx % 8)) & 1 == 1
}

fn pattern_bit(pattern: &[u8], idx: usize) -> bool {
    (pattern[idx / 8] >> (7 - idx % 8)) & 1 == 1
}

/// Straightforward bit-at-a-time frame synchronization, standing in for the
/// external search/extract collaborator.
pub struct TestSync;

impl FrameSync for TestSync {
    fn search(
        &self,
        row: &FrameRow,
        from_bit: usize,
        pattern: &[u8],
        pattern_bits: usize,
    ) -> Option<usize> {
        let len = row.bit_len();
        if from_bit + pattern_bits > len {
            return None;
        }
        'candidate: for pos in from_bit..=(len - pattern_bits) {
            for k in 0..pattern_bits {
                if row_bit(row, pos + k) != pattern_bit(pattern, k) {
                    continue 'candidate;
                }
            }
            return Some(pos);
        }
        None
    }

    fn extract(&self, row: &FrameRow, from_bit: usize, bit_count: usize, out: &mut [u8]) {
        for b in out.iter_mut() {
            *b = 0;
        }
        for k in 0..bit_count {
            if row_bit(row, from_bit + k) {
                out[k / 8] |= 1 << (7 - k % 8);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn writer_packs_msb_first() {
        let mut w = BitWriter::new();
        w.push_byte(0xA5);
        w.push_bits(0b101, 3);
        w.pad_to(16);
        let row = w.into_row();
        assert_eq!(row.bytes(), &[0xA5, 0b1010_0000]);
        assert_eq!(row.bit_len(), 16);
    }

    #[test]
    fn search_finds_pattern_at_bit_offsets() {
        // 0xcc 0xcc 0xcd preceded by one 0xcc byte: match lands at bit 8.
        let mut w = BitWriter::new();
        for &b in &[0xCCu8, 0xCC, 0xCC, 0xCD] {
            w.push_byte(b);
        }
        let row = w.into_row();
        let sync = TestSync;
        assert_eq!(sync.search(&row, 0, &[0xCC, 0xCC, 0xCD], 24), Some(8));
        assert_eq!(sync.search(&row, 9, &[0xCC, 0xCC, 0xCD], 24), None);
        assert_eq!(sync.search(&row, 0, &[0xAA], 8), None);
    }

    #[test]
    fn extract_is_bit_addressed_and_zero_fills() {
        let mut w = BitWriter::new();
        w.push_byte(0xFF);
        w.push_byte(0x0F);
        let row = w.into_row();
        let sync = TestSync;

        let mut out = [0u8; 2];
        sync.extract(&row, 4, 8, &mut out);
        assert_eq!(out[0], 0xF0);

        // Reads past the end of the row come back as zero bits.
        sync.extract(&row, 12, 8, &mut out);
        assert_eq!(out[0], 0xF0);
        sync.extract(&row, 100, 8, &mut out);
        assert_eq!(out[0], 0x00);
    }
}
