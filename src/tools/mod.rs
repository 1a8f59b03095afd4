//! The tools module provides the helper stages of the bzip2 engine.
//!
//! The tools are:
//! - crc: CRC32 checksum for bzip2, both block and stream versions.
//! - freq_count: Frequency count for bzip2.
//! - options: The immutable engine configuration.
//! - rle1: Run-Length-Encoding phase 1 for bzip2, which also cuts the input into blocks.
//! - rle2_mtf: Move-To-Front transform and Run-Length-Encoding 2 (integrated for speed) for bzip2.
//! - symbol_map: Encode and decode the symbol map used in bzip2.
//!
pub mod crc;
pub mod freq_count;
pub mod options;
pub mod rle1;
pub mod rle2_mtf;
pub mod symbol_map;
