//! Block-sorting compression in the bzip2 stream format.
//!
//! Version 0.4.0
//!
//! Provides safe compression and decompression of data using the bzip2 format. The output is
//! bit-compatible with the classic bzip2 program: its files decompress here and ours decompress there.
//!
//! The engine works on any `Read` source and `Write` sink and takes its settings from an explicit
//! [`Config`]. It never prints; everything that goes wrong comes back as a [`Bz2Error`].
//!
//! ```
//! use bzip2_blocksort::{compress_bytes, decompress_bytes, Config};
//!
//! let config = Config::new(9).unwrap();
//! let packed = compress_bytes(b"hello hello hello", &config).unwrap();
//! assert_eq!(decompress_bytes(&packed).unwrap(), b"hello hello hello");
//! ```
//!
//! The `bzip2` binary in this package wraps the engine in the familiar command line.
//!
pub mod bitstream;
pub mod bwt_algorithms;
pub mod compression;
pub mod error;
pub mod huffman_coding;
pub mod tools;

pub use compression::compress::{compress, compress_bytes, compress_interruptible, CompressSummary};
pub use compression::decompress::{
    decompress, decompress_bytes, decompress_interruptible, test, DecodeState, DecodedBlock,
    DecompressSummary, StreamDecoder,
};
pub use error::{Bz2Error, ErrorKind, MagicKind, Result};
pub use tools::options::Config;
