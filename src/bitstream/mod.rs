//! The bitstream module forms the I/O subsystem of the bzip2 engine.
//!
//! Each block is packed into its own buffer by the BitPacker. The StreamWriter then stitches
//! the packed blocks together behind the stream header (blocks are not byte aligned, so the
//! padding bits of each block are dropped), and closes the stream with the footer and the
//! combined CRC. The BitReader goes the other way, pulling bits from any `Read` source.
//!
//! This I/O subsystem is designed to efficiently interface with the other modules within the engine.
//! It is not intended for more general use.
//!
pub mod bitpacker;
pub mod bitreader;
pub mod bitwriter;
