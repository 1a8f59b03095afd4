use log::{debug, trace};

use crate::bitstream::bitpacker::BitPacker;
use crate::bitstream::bitwriter::PackedBlock;
use crate::bwt_algorithms::bwt_sort::bwt_encode;
use crate::huffman_coding::huffman::huf_encode;
use crate::tools::rle1::Rle1Block;
use crate::tools::rle2_mtf::rle2_mtf_encode;

/// Block header magic (pi), first and second 24 bits.
pub const BLOCK_MAGIC_HI: u32 = 0x314159;
pub const BLOCK_MAGIC_LO: u32 = 0x265359;

#[allow(clippy::unusual_byte_groupings)]
/// Called by compress, this takes one RLE1 block through the BWT, MTF/RLE2 and huffman stages
/// and returns it packed into bits, ready for the StreamWriter.
pub fn compress_block(block: &Rle1Block, work_factor: u32, seq: u32) -> PackedBlock {
    let mut bw = BitPacker::new(block.data.len() + 1024);

    // For each block, write the block header:
    // Six bytes of magic, 4 bytes of crc data, 1 bit for Randomized flag.
    trace!("Writing magic and CRC at {}.", bw.loc());
    bw.out24(0x18_000000 | BLOCK_MAGIC_HI); // magic bits  1-24
    bw.out24(0x18_000000 | BLOCK_MAGIC_LO); // magic bits 25-48
    bw.out32(block.crc); // crc
    bw.out24(0x01_000000); // One zero bit

    let (key, bwt) = bwt_encode(&block.data, work_factor);

    // Now that we have the key, we can write the 24bit BWT key
    trace!("Writing key {} at {}.", key, bw.loc());
    bw.out24(0x18_000000 | key);

    let rle2 = rle2_mtf_encode(&bwt);

    // Now for the compression - the Huffman encoding (which also writes out the symbol map)
    huf_encode(&mut bw, &rle2);

    bw.flush();
    debug!(
        "Block {}: crc {:#010x}, {} bytes in block, {} after MTF & RLE2 coding, {} syms in use, {} bytes packed",
        seq,
        block.crc,
        block.data.len(),
        rle2.symbols.len(),
        rle2.eob + 1,
        bw.output.len(),
    );

    let padding = bw.padding();
    PackedBlock {
        crc: block.crc,
        bytes: bw.output,
        padding,
    }
}
