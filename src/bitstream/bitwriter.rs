use super::bitpacker::BitPacker;
use crate::tools::crc::do_stream_crc;
use std::io::Write;

/// Stream footer magic (sqrt(pi)), written after the last block.
pub const END_MAGIC: u64 = 0x1772_4538_5090;

/// A block packed by BitPacker, ready to be stitched into the stream.
#[derive(Debug, Clone)]
pub struct PackedBlock {
    /// CRC of the block's original bytes
    pub crc: u32,
    /// Packed bits, the last byte padded with zeros
    pub bytes: Vec<u8>,
    /// Number of padding bits at the end of the last byte
    pub padding: u8,
}

/// Writes a bitstream for output. Takes the blocks packed by BitPacker and assembles them with
/// the stream header and footer, calculating the stream CRC as it processes the blocks.
///
/// Blocks are not byte aligned in a bzip2 stream, so the padding of each packed block is
/// dropped and the next block continues in the same byte.
pub struct StreamWriter<W: Write> {
    /// Bits waiting to be written out.
    packer: BitPacker,
    /// Handle to the output stream
    writer: W,
    /// Block size, needed to create the header.
    block_size: u8,
    header_written: bool,
    /// Stream CRC, calculated from each block crc and added to the stream footer.
    stream_crc: u32,
    /// Bytes handed to the writer so far.
    bytes_out: u64,
    blocks: u32,
}

impl<W: Write> StreamWriter<W> {
    /// Create a new StreamWriter. We need the block size to create the header.
    /// Use add_block() to add each block to the stream and finish() to close it.
    pub fn new(writer: W, block_size: u8) -> Self {
        Self {
            packer: BitPacker::new(block_size as usize * 100_000 + 64),
            writer,
            block_size,
            header_written: false,
            stream_crc: 0,
            bytes_out: 0,
            blocks: 0,
        }
    }

    /// Push the stream header to output buffer.
    fn push_header(&mut self) {
        if !self.header_written {
            b"BZh".iter().for_each(|&x| self.packer.out8(x));
            self.packer.out8(self.block_size + b'0');
            self.header_written = true;
        }
    }

    /// Hand all complete bytes to the writer.
    fn drain(&mut self) -> std::io::Result<()> {
        if !self.packer.output.is_empty() {
            self.writer.write_all(&self.packer.output)?;
            self.bytes_out += self.packer.output.len() as u64;
            self.packer.output.clear();
        }
        Ok(())
    }

    /// Add a block of data to the output. The block is written in full or the error is returned;
    /// the stream CRC only includes blocks that were accepted.
    pub fn add_block(&mut self, block: &PackedBlock) -> std::io::Result<()> {
        self.push_header();

        if let Some((&last, body)) = block.bytes.split_last() {
            body.iter().for_each(|&x| self.packer.out8(x));
            // Write only the real bits of the final byte
            let real = 8 - block.padding;
            self.packer.write_bits(real, (last >> block.padding) as u32);
        }

        self.stream_crc = do_stream_crc(self.stream_crc, block.crc);
        self.blocks += 1;
        self.drain()
    }

    /// Write the footer (end magic and combined CRC), pad to a byte and flush the writer.
    /// Returns the writer and the number of bytes written.
    pub fn finish(mut self) -> std::io::Result<(W, u64)> {
        self.push_header();
        self.packer.out24(0x18_000000 | (END_MAGIC >> 24) as u32);
        self.packer.out24(0x18_000000 | (END_MAGIC & 0xff_ffff) as u32);
        self.packer.out32(self.stream_crc);
        self.packer.flush();
        self.drain()?;
        self.writer.flush()?;
        Ok((self.writer, self.bytes_out))
    }

    pub fn stream_crc(&self) -> u32 {
        self.stream_crc
    }

    pub fn blocks(&self) -> u32 {
        self.blocks
    }

    pub fn bytes_out(&self) -> u64 {
        self.bytes_out
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn empty_stream() {
        let sw = StreamWriter::new(Vec::new(), 9);
        let (out, n) = sw.finish().unwrap();
        assert_eq!(
            out,
            vec![b'B', b'Z', b'h', b'9', 0x17, 0x72, 0x45, 0x38, 0x50, 0x90, 0, 0, 0, 0]
        );
        assert_eq!(n, 14);
    }

    #[test]
    fn padding_is_dropped_between_blocks() {
        let mut sw = StreamWriter::new(Vec::new(), 1);
        // 3 real bits: 101
        let block = PackedBlock {
            crc: 0,
            bytes: vec![0b1010_0000],
            padding: 5,
        };
        sw.add_block(&block).unwrap();
        sw.add_block(&block).unwrap();
        let (out, _) = sw.finish().unwrap();
        assert_eq!(&out[..4], b"BZh1");
        // 101 101 then the footer magic 0x17 = 0001 0111 starts at bit 6
        assert_eq!(out[4], 0b1011_0100);
        assert_eq!(out[5], 0b0101_1101);
        // 48 + 32 + 6 bits = 86 bits -> 11 bytes
        assert_eq!(out.len(), 4 + 11);
    }

    #[test]
    fn stream_crc_combines_blocks() {
        let mut sw = StreamWriter::new(Vec::new(), 1);
        for crc in [0x8000_0001_u32, 0x1234_5678] {
            sw.add_block(&PackedBlock {
                crc,
                bytes: vec![0xff],
                padding: 0,
            })
            .unwrap();
        }
        assert_eq!(sw.stream_crc(), 0x8000_0001_u32.rotate_left(1) ^ 0x1234_5678);
        assert_eq!(sw.blocks(), 2);
    }
}
