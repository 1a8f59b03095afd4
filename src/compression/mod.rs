//! The compression module drives the bzip2 pipeline in both directions.
//!
//! Compression happens in the following steps:
//! - Run Length Encoding 1: Compress all runs of 4-255 identical bytes, cutting the input into blocks.
//! - Burrow Wheeler Transform: Sort the data to increase the probability of runs of identical bytes.
//! - Move To Front transform: Increase the frequency of lower byte values, and thereby decrease the frequency of other byte values.
//! - Run Length Encoding 2: Compress all runs of the zero byte.
//! - Huffman coding: Encode frequent symbols using shorter bit codes and less frequent symbols with longer bit codes.
//!
//! While the initial RLE1 compression is probably not necessary, it is part of the bzip2 format and must be preserved.
//!
//! The huffman stage makes four passes over the data to improve the compression ratio. Up to six different
//! huffman tables are generated for each block of data, and every chunk of 50 symbols within that block is analyzed to determine which
//! huffman table will result in the best compression ratio for that chunk.
//!
//! Decompression follows the inverse of the compression process, one block at a time, checking
//! every block CRC and the combined stream CRC.
//! - Huffman decoding.
//! - RLE 2: Expand all runs of the zero symbol.
//! - MTF transform: Convert from the Move-To-Front indecies to the symbols represented by the indecies.
//! - BWT reversal: Restore the original data from the BWT transform.
//! - RLE 1: Expand all runs of 4+ identical bytes.
//!

pub mod compress;
pub mod compress_block;
pub mod decompress;
