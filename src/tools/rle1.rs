//! Run-length encoding, phase 1.
//!
//! Runs of 4 to 255 identical bytes are written as the 4 bytes followed by a count byte (0-251)
//! holding the extra repeats. Longer runs are split into 255 byte pieces.
//!
//! The encoder is also where the input is cut into blocks: pieces are added while the block
//! holds fewer than `100_000 * block_size - 19` bytes, so a run is never split across blocks and
//! the finished block always fits in the size announced in the stream header.
//! The block CRC is computed here, over the original (un-encoded) bytes.

use super::crc::do_crc;

/// Longest run the encoder collapses into one piece.
const MAX_RUN: usize = 255;

/// One RLE1 encoded block, ready for the BWT.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rle1Block {
    /// RLE1 encoded bytes
    pub data: Vec<u8>,
    /// CRC of the original bytes in this block
    pub crc: u32,
    /// How many original bytes went into this block
    pub consumed: usize,
}

/// Largest number of RLE1 bytes a block may be filled to before it is closed.
pub fn block_limit(block_size: u8) -> usize {
    block_size as usize * 100_000 - 19
}

/// Iterator cutting an input slice into RLE1 encoded blocks.
pub struct Rle1Blocks<'a> {
    source: &'a [u8],
    position: usize,
    limit: usize,
}

impl<'a> Rle1Blocks<'a> {
    pub fn new(source: &'a [u8], block_size: u8) -> Self {
        Rle1Blocks {
            source,
            position: 0,
            limit: block_limit(block_size),
        }
    }

    /// Length of the run starting at `self.position`, capped at MAX_RUN.
    fn run_length(&self) -> usize {
        let rest = &self.source[self.position..];
        let first = rest[0];
        rest.iter()
            .take(MAX_RUN)
            .position(|&b| b != first)
            .unwrap_or_else(|| rest.len().min(MAX_RUN))
    }
}

impl<'a> Iterator for Rle1Blocks<'a> {
    type Item = Rle1Block;

    fn next(&mut self) -> Option<Self::Item> {
        if self.position >= self.source.len() {
            return None;
        }
        let start = self.position;
        let mut out: Vec<u8> = Vec::with_capacity(self.limit.min(self.source.len() - start) + 5);

        while out.len() < self.limit && self.position < self.source.len() {
            let run = self.run_length();
            let byte = self.source[self.position];
            if run < 4 {
                out.extend_from_slice(&self.source[self.position..self.position + run]);
            } else {
                out.extend_from_slice(&[byte; 4]);
                out.push((run - 4) as u8);
            }
            self.position += run;
        }

        let crc = do_crc(0, &self.source[start..self.position]);
        Some(Rle1Block {
            data: out,
            crc,
            consumed: self.position - start,
        })
    }
}

/// Undo RLE1. A block that ends right after four identical bytes has no count byte, which is
/// treated as a count of zero.
pub fn rle1_decode(data: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(data.len() + data.len() / 4);
    // Number of identical bytes seen in a row (0-4) and the byte they match
    let mut count = 0_usize;
    let mut last: Option<u8> = None;

    let mut iter = data.iter();
    while let Some(&byte) = iter.next() {
        if Some(byte) == last {
            count += 1;
        } else {
            last = Some(byte);
            count = 1;
        }
        out.push(byte);
        if count == 4 {
            if let Some(&extra) = iter.next() {
                out.resize(out.len() + extra as usize, byte);
            }
            count = 0;
            last = None;
        }
    }
    out
}

#[cfg(test)]
mod test {
    use super::*;

    fn encode_all(data: &[u8], block_size: u8) -> Vec<Rle1Block> {
        Rle1Blocks::new(data, block_size).collect()
    }

    #[test]
    fn short_runs_untouched() {
        let blocks = encode_all(b"aabbbcdd", 1);
        assert_eq!(blocks.len(), 1);
        assert_eq!(blocks[0].data, b"aabbbcdd".to_vec());
        assert_eq!(blocks[0].consumed, 8);
    }

    #[test]
    fn run_of_four_gets_zero_count() {
        let blocks = encode_all(b"xaaaay", 1);
        assert_eq!(blocks[0].data, vec![b'x', b'a', b'a', b'a', b'a', 0, b'y']);
    }

    #[test]
    fn run_of_255_is_one_piece() {
        let input = vec![7_u8; 255];
        let blocks = encode_all(&input, 1);
        assert_eq!(blocks[0].data, vec![7, 7, 7, 7, 251]);
    }

    #[test]
    fn run_of_258_is_split() {
        let input = vec![7_u8; 258];
        let blocks = encode_all(&input, 1);
        assert_eq!(blocks[0].data, vec![7, 7, 7, 7, 251, 7, 7, 7]);
        assert_eq!(rle1_decode(&blocks[0].data), input);
    }

    #[test]
    fn twelve_as() {
        let blocks = encode_all(b"aaaaaaaaaaaa", 9);
        assert_eq!(blocks[0].data, vec![b'a', b'a', b'a', b'a', 8]);
        assert_eq!(rle1_decode(&blocks[0].data), b"aaaaaaaaaaaa".to_vec());
    }

    #[test]
    fn crc_covers_original_bytes() {
        let input = b"hello     world, aaaaaaaaaaaaaaaaaaaaa!";
        let blocks = encode_all(input, 1);
        assert_eq!(blocks[0].crc, do_crc(0, input));
    }

    #[test]
    fn blocks_respect_limit() {
        // Mostly literal data so the encoded size tracks the input size
        let input: Vec<u8> = (0..250_000_u32).map(|i| (i % 251) as u8).collect();
        let blocks = encode_all(&input, 1);
        assert_eq!(blocks.len(), 3);
        let limit = block_limit(1);
        for block in &blocks {
            assert!(block.data.len() <= limit + 4);
        }
        assert_eq!(blocks.iter().map(|b| b.consumed).sum::<usize>(), input.len());
        let decoded: Vec<u8> = blocks.iter().flat_map(|b| rle1_decode(&b.data)).collect();
        assert_eq!(decoded, input);
    }

    #[test]
    fn empty_input_has_no_blocks() {
        assert!(encode_all(&[], 9).is_empty());
    }

    #[test]
    fn decode_missing_trailing_count() {
        assert_eq!(rle1_decode(&[1, 1, 1, 1]), vec![1, 1, 1, 1]);
    }
}
