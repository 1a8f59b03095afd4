//! Perform run-length-encoding and move-to-front transforms for the bzip2 engine.
//!
//! The move-to-front transform will increase the frequency of lower byte values. The result of this is that
//! the huffman codes can more efficiently compress those high frequency bytes.
//!
//! The run-length-encoding will compress runs of the zero rank irregardless of the number of zeros found. The
//! number of zeros found is written in bijective base 2 using the RUNA / RUNB symbols. Every other rank r
//! becomes symbol r + 1, and the block ends with the EOB symbol (number of bytes in use + 1).
//!
//! Encoding also returns the symbol frequency table and the symbol map used during the huffman stage.
//!
use super::symbol_map::encode_sym_map_from_bool_map;
use crate::error::{Bz2Error, Result};

pub const RUNA: u16 = 0;
pub const RUNB: u16 = 1;
/// Largest alphabet: RUNA, RUNB, 255 ranks and EOB.
pub const MAX_ALPHA_SIZE: usize = 258;

/// Output of the MTF / RLE2 stage for one block.
#[derive(Debug, Clone)]
pub struct Rle2Block {
    /// Symbols, ending with EOB
    pub symbols: Vec<u16>,
    /// Frequency of each symbol
    pub freqs: [u32; MAX_ALPHA_SIZE],
    /// bzip2 symbol map of the bytes used
    pub sym_map: Vec<u16>,
    /// End-of-block symbol; the alphabet size is eob + 1
    pub eob: u16,
}

/// Write a run of `zeros` rank-0 symbols as RUNA / RUNB digits.
fn push_zero_run(zeros: usize, out: &mut Vec<u16>, freqs: &mut [u32; MAX_ALPHA_SIZE]) {
    if zeros == 0 {
        return;
    }
    let mut n = zeros - 1;
    loop {
        let sym = (n & 1) as u16;
        out.push(sym);
        freqs[sym as usize] += 1;
        if n < 2 {
            break;
        }
        n = (n - 2) >> 1;
    }
}

/// Move the entry at `idx` to the front of the MTF table.
#[inline]
fn move_to_front(mtf_index: &mut [u8], idx: usize) {
    let sym = mtf_index[idx];
    mtf_index.copy_within(0..idx, 1);
    mtf_index[0] = sym;
}

/// Does Move-To-Front transform and Run-Length-Encoding 2 prior to the huffman stage.
/// Receives a block of BWT data.
pub fn rle2_mtf_encode(block: &[u8]) -> Rle2Block {
    // Find every u8 in the input.
    let mut bool_array = [false; 256];
    for &i in block {
        bool_array[i as usize] = true;
    }
    // The MTF table starts as the used bytes in ascending order.
    let mut mtf_index: Vec<u8> = (0..=255_u8).filter(|&b| bool_array[b as usize]).collect();

    let eob = mtf_index.len() as u16 + 1;
    let sym_map = encode_sym_map_from_bool_map(&bool_array);

    let mut zeros = 0_usize;
    let mut symbols: Vec<u16> = Vec::with_capacity(block.len() + 1);
    let mut freqs = [0_u32; MAX_ALPHA_SIZE];

    for &byte in block {
        // Every byte in the block is in the table, so the search always succeeds.
        let idx = mtf_index.iter().position(|&c| c == byte).unwrap_or(0);
        if idx == 0 {
            zeros += 1;
            continue;
        }
        // Not a zero, so output any pending zeros first
        push_zero_run(zeros, &mut symbols, &mut freqs);
        zeros = 0;

        let sym = idx as u16 + 1;
        freqs[sym as usize] += 1;
        symbols.push(sym);
        move_to_front(&mut mtf_index, idx);
    }
    // Write any trailing zeros, then EOB
    push_zero_run(zeros, &mut symbols, &mut freqs);
    symbols.push(eob);
    freqs[eob as usize] += 1;

    Rle2Block {
        symbols,
        freqs,
        sym_map,
        eob,
    }
}

/// Incremental RUNA / RUNB + MTF decoder. Symbols are pushed one at a time as the huffman
/// decoder produces them, so a bad block is rejected as soon as it runs past the size limit.
pub struct Rle2Decoder {
    mtf_index: Vec<u8>,
    out: Vec<u8>,
    limit: usize,
    eob: u16,
    block: u32,
    // Pending zero run and the weight of the next RUNA / RUNB digit
    zeros: usize,
    bit_multiplier: usize,
    done: bool,
}

impl Rle2Decoder {
    /// `symbols` is the decoded symbol map, `limit` the largest block allowed by the stream header.
    pub fn new(symbols: Vec<u8>, limit: usize, block: u32) -> Self {
        let eob = symbols.len() as u16 + 1;
        Rle2Decoder {
            mtf_index: symbols,
            out: Vec::with_capacity(limit.min(1 << 20)),
            limit,
            eob,
            block,
            zeros: 0,
            bit_multiplier: 1,
            done: false,
        }
    }

    /// Alphabet size of this block (RUNA, RUNB, the ranks and EOB).
    pub fn alpha_size(&self) -> usize {
        self.eob as usize + 1
    }

    fn flush_zeros(&mut self) -> Result<()> {
        if self.zeros > 0 {
            if self.out.len() + self.zeros > self.limit {
                return Err(Bz2Error::corrupt(self.block, "run exceeds block size"));
            }
            let front = self.mtf_index[0];
            self.out.resize(self.out.len() + self.zeros, front);
            self.zeros = 0;
            self.bit_multiplier = 1;
        }
        Ok(())
    }

    /// Feed one symbol. Returns true once EOB has been seen.
    pub fn push(&mut self, sym: u16) -> Result<bool> {
        match sym {
            RUNA | RUNB => {
                // A run longer than any block is corrupt; stop before the multiplier overflows.
                if self.bit_multiplier > self.limit {
                    return Err(Bz2Error::corrupt(self.block, "run exceeds block size"));
                }
                self.zeros += self.bit_multiplier << sym;
                self.bit_multiplier <<= 1;
            }
            n if n == self.eob => {
                self.flush_zeros()?;
                self.done = true;
                return Ok(true);
            }
            n => {
                self.flush_zeros()?;
                let idx = n as usize - 1;
                if idx >= self.mtf_index.len() {
                    return Err(Bz2Error::corrupt(self.block, "MTF rank out of range"));
                }
                if self.out.len() >= self.limit {
                    return Err(Bz2Error::corrupt(self.block, "block exceeds declared size"));
                }
                self.out.push(self.mtf_index[idx]);
                move_to_front(&mut self.mtf_index, idx);
            }
        }
        Ok(false)
    }

    /// The decoded BWT block. Fails if EOB was never pushed.
    pub fn finish(self) -> Result<Vec<u8>> {
        if !self.done {
            return Err(Bz2Error::MissingEndOfBlock { block: self.block });
        }
        Ok(self.out)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::error::ErrorKind;
    use crate::tools::symbol_map::decode_sym_map;

    /// Does run-length-decoding and MTF decoding of a whole symbol sequence.
    /// `symbols` is the decoded symbol map, `limit` the maximum block size.
    fn rle2_mtf_decode(data_in: &[u16], symbols: Vec<u8>, limit: usize, block: u32) -> Result<Vec<u8>> {
        let mut decoder = Rle2Decoder::new(symbols, limit, block);
        for &sym in data_in {
            if decoder.push(sym)? {
                break;
            }
        }
        decoder.finish()
    }

    fn round_trip(data: &[u8]) {
        let enc = rle2_mtf_encode(data);
        let syms = decode_sym_map(&enc.sym_map);
        let dec = rle2_mtf_decode(&enc.symbols, syms, data.len().max(1), 1).unwrap();
        assert_eq!(dec, data);
    }

    #[test]
    fn zero_runs_use_bijective_base_two() {
        // One used byte, so every rank is zero. EOB is 2.
        let enc = rle2_mtf_encode(&[9; 1]);
        assert_eq!(enc.symbols, vec![RUNA, 2]);
        let enc = rle2_mtf_encode(&[9; 2]);
        assert_eq!(enc.symbols, vec![RUNB, 2]);
        let enc = rle2_mtf_encode(&[9; 3]);
        assert_eq!(enc.symbols, vec![RUNA, RUNA, 2]);
        let enc = rle2_mtf_encode(&[9; 4]);
        assert_eq!(enc.symbols, vec![RUNB, RUNA, 2]);
        let enc = rle2_mtf_encode(&[9; 6]);
        assert_eq!(enc.symbols, vec![RUNB, RUNB, 2]);
    }

    #[test]
    fn ranks_are_shifted_by_one() {
        // "nnbaaa": table starts a b n
        let enc = rle2_mtf_encode(b"nnbaaa");
        // n -> rank 2 (sym 3), n -> rank 0, b -> rank 2 (sym 3), a -> rank 2 (sym 3), a, a -> zeros
        assert_eq!(enc.symbols, vec![3, RUNA, 3, 3, RUNB, 4]);
        assert_eq!(enc.eob, 4);
        assert_eq!(enc.freqs[3], 3);
        assert_eq!(enc.freqs[RUNA as usize], 1);
        assert_eq!(enc.freqs[RUNB as usize], 1);
        assert_eq!(enc.freqs[4], 1);
    }

    #[test]
    fn round_trips() {
        round_trip(b"nnbaaa");
        round_trip(b"abracadabra");
        round_trip(&[0_u8; 1000]);
        let all: Vec<u8> = (0..=255).rev().chain(0..=255).collect();
        round_trip(&all);
    }

    #[test]
    fn missing_eob_is_reported() {
        let enc = rle2_mtf_encode(b"abc");
        let syms = decode_sym_map(&enc.sym_map);
        let cut = &enc.symbols[..enc.symbols.len() - 1];
        let err = rle2_mtf_decode(cut, syms, 10, 4).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::MissingEndOfBlock);
        assert_eq!(err.block(), Some(4));
    }

    #[test]
    fn oversized_run_is_corrupt() {
        // 20 RUNB digits describe far more than 100 zeros
        let data = vec![RUNB; 20];
        let err = rle2_mtf_decode(&data, vec![b'x'], 100, 1).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::CorruptBlock);
    }

    #[test]
    fn rank_out_of_range_is_corrupt() {
        // two symbols in use: ranks 0..2, EOB = 3. Symbol 2 is rank 1 and fine, 5 is not.
        let err = rle2_mtf_decode(&[2, 5, 3], vec![b'a', b'b'], 100, 1).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::CorruptBlock);
    }
}
