//! Huffman decoding of one block: selectors, delta coded code lengths, and the symbol stream.
//!
//! Canonical codes are decoded with Julian's limit / base / perm tables: a code of length `n`
//! is valid when its value is no larger than `limit[n]`, and `perm[value - base[n]]` is the symbol.

use std::io::Read;

use log::trace;

use super::huffman::GROUP_SIZE;
use crate::bitstream::bitreader::BitReader;
use crate::error::{Bz2Error, Result};
use crate::tools::rle2_mtf::Rle2Decoder;

/// Longest code length a stream may declare.
const MAX_DECODE_LEN: u32 = 20;
/// Size of the limit / base tables.
const TABLE_SLOTS: usize = 23;
/// Selectors beyond this many are read but ignored.
const MAX_SELECTORS: usize = 18_002;

/// Decoding tables for one canonical huffman code.
#[derive(Debug)]
pub struct DecodeTable {
    limit: [i32; TABLE_SLOTS],
    base: [i32; TABLE_SLOTS],
    perm: Vec<u16>,
    min_len: u32,
}

impl DecodeTable {
    /// Build the tables from code lengths (each 1..=20).
    pub fn new(lengths: &[u32]) -> Self {
        let alpha_size = lengths.len();
        let min_len = lengths.iter().copied().min().unwrap_or(1);
        let max_len = lengths.iter().copied().max().unwrap_or(1);

        // Symbols in canonical order: by length, then by symbol
        let mut perm = Vec::with_capacity(alpha_size);
        for len in min_len..=max_len {
            for (sym, &l) in lengths.iter().enumerate() {
                if l == len {
                    perm.push(sym as u16);
                }
            }
        }

        // base[n] starts as the number of symbols shorter than n
        let mut base = [0_i32; TABLE_SLOTS];
        for &l in lengths {
            base[l as usize + 1] += 1;
        }
        for i in 1..TABLE_SLOTS {
            base[i] += base[i - 1];
        }

        let mut limit = [0_i32; TABLE_SLOTS];
        let mut vec = 0_i32;
        for i in min_len as usize..=max_len as usize {
            vec += base[i + 1] - base[i];
            limit[i] = vec - 1;
            vec <<= 1;
        }
        for i in min_len as usize + 1..=max_len as usize {
            base[i] = ((limit[i - 1] + 1) << 1) - base[i];
        }

        Self {
            limit,
            base,
            perm,
            min_len,
        }
    }

    /// Read one symbol.
    pub fn decode<R: Read>(&self, br: &mut BitReader<R>, block: u32) -> Result<u16> {
        let mut zn = self.min_len;
        let mut zvec = br.bint(zn)? as i32;
        loop {
            if zn > MAX_DECODE_LEN {
                return Err(Bz2Error::corrupt(block, "invalid huffman code"));
            }
            if zvec <= self.limit[zn as usize] {
                break;
            }
            zn += 1;
            zvec = (zvec << 1) | br.bit()? as i32;
        }
        let idx = zvec - self.base[zn as usize];
        if idx < 0 || idx as usize >= self.perm.len() {
            return Err(Bz2Error::corrupt(block, "invalid huffman code"));
        }
        Ok(self.perm[idx as usize])
    }
}

/// Read the table count and the selector list (undoing its move-to-front transform).
fn read_selectors<R: Read>(br: &mut BitReader<R>, block: u32) -> Result<(usize, Vec<u8>)> {
    let table_count = br.bint(3)? as usize;
    if !(2..=6).contains(&table_count) {
        return Err(Bz2Error::corrupt(
            block,
            format!("{} huffman tables (expected 2-6)", table_count),
        ));
    }
    let selector_count = br.bint(15)? as usize;
    if selector_count == 0 {
        return Err(Bz2Error::corrupt(block, "no selectors"));
    }

    let mut table_idx: Vec<u8> = (0..table_count as u8).collect();
    let mut selectors = Vec::with_capacity(selector_count.min(MAX_SELECTORS));
    for _ in 0..selector_count {
        let mut j = 0;
        while br.bool_bit()? {
            j += 1;
            if j >= table_count {
                return Err(Bz2Error::corrupt(block, "selector out of range"));
            }
        }
        if selectors.len() < MAX_SELECTORS {
            let sel = table_idx[j];
            table_idx[..=j].rotate_right(1);
            selectors.push(sel);
        }
    }
    Ok((table_count, selectors))
}

/// Read one table's delta coded code lengths.
fn read_code_lengths<R: Read>(
    br: &mut BitReader<R>,
    alpha_size: usize,
    block: u32,
) -> Result<Vec<u32>> {
    let mut curr = br.bint(5)? as i32;
    let mut lengths = Vec::with_capacity(alpha_size);
    for _ in 0..alpha_size {
        loop {
            if !(1..=MAX_DECODE_LEN as i32).contains(&curr) {
                return Err(Bz2Error::corrupt(
                    block,
                    format!("code length {} out of range", curr),
                ));
            }
            if !br.bool_bit()? {
                break;
            }
            if br.bool_bit()? {
                curr -= 1;
            } else {
                curr += 1;
            }
        }
        lengths.push(curr as u32);
    }
    Ok(lengths)
}

/// Decode the huffman part of a block (everything after the symbol map), feeding the symbols
/// into the MTF / RLE2 decoder until end-of-block.
pub fn huf_decode<R: Read>(
    br: &mut BitReader<R>,
    rle2: &mut Rle2Decoder,
    block: u32,
) -> Result<()> {
    let alpha_size = rle2.alpha_size();
    let (table_count, selectors) = read_selectors(br, block)?;
    trace!(
        "Block {}: {} tables, {} selectors, alphabet of {}",
        block,
        table_count,
        selectors.len(),
        alpha_size
    );

    let tables = (0..table_count)
        .map(|_| read_code_lengths(br, alpha_size, block).map(|l| DecodeTable::new(&l)))
        .collect::<Result<Vec<_>>>()?;

    let mut groups = selectors.iter();
    let mut table = &tables[0];
    let mut group_pos = 0;
    loop {
        if group_pos == 0 {
            let Some(&sel) = groups.next() else {
                return Err(Bz2Error::MissingEndOfBlock { block });
            };
            table = &tables[sel as usize];
            group_pos = GROUP_SIZE;
        }
        group_pos -= 1;
        let sym = table.decode(br, block)?;
        if rle2.push(sym)? {
            return Ok(());
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::bitstream::bitpacker::BitPacker;
    use crate::huffman_coding::huffman::huf_encode;
    use crate::huffman_coding::huffman_code_from_weights::assign_codes;
    use crate::tools::rle2_mtf::rle2_mtf_encode;
    use crate::tools::symbol_map::decode_sym_map;

    #[test]
    fn decode_table_reads_canonical_codes() {
        let lengths = [3_u32, 2, 3, 3, 3, 2];
        let codes = assign_codes(&lengths);
        let mut bp = BitPacker::new(16);
        let message = [0_usize, 1, 5, 4, 2, 3, 1];
        for &sym in &message {
            bp.out24(codes[sym]);
        }
        bp.flush();
        let table = DecodeTable::new(&lengths);
        let mut br = BitReader::new(bp.output.as_slice());
        for &sym in &message {
            assert_eq!(table.decode(&mut br, 1).unwrap(), sym as u16);
        }
    }

    #[test]
    fn block_body_round_trip() {
        let data = b"She sells sea shells by the sea shore, the shells she sells are sea shells."
            .repeat(30);
        let block = rle2_mtf_encode(&data);
        let mut bp = BitPacker::new(4096);
        huf_encode(&mut bp, &block);
        bp.flush();

        let mut br = BitReader::new(bp.output.as_slice());
        // Read the symbol map the way the block parser does
        let groups = br.bint(16).unwrap() as u16;
        let mut map = vec![groups];
        for _ in 0..groups.count_ones() {
            map.push(br.bint(16).unwrap() as u16);
        }
        let mut rle2 = Rle2Decoder::new(decode_sym_map(&map), data.len(), 1);
        huf_decode(&mut br, &mut rle2, 1).unwrap();
        assert_eq!(rle2.finish().unwrap(), data);
    }

    #[test]
    fn bad_table_count_is_corrupt() {
        // 3 bits of table count = 7
        let bytes = [0b1110_0000_u8, 0, 0, 0];
        let mut br = BitReader::new(bytes.as_slice());
        let mut rle2 = Rle2Decoder::new(vec![b'a'], 10, 9);
        let err = huf_decode(&mut br, &mut rle2, 9).unwrap_err();
        assert_eq!(err.kind(), crate::error::ErrorKind::CorruptBlock);
    }
}
