use std::io::{Read, Write};
use std::sync::atomic::{AtomicBool, Ordering};

use log::debug;

use crate::bitstream::bitwriter::StreamWriter;
use crate::error::{Bz2Error, Result};
use crate::tools::options::Config;
use crate::tools::rle1::Rle1Blocks;

use super::compress_block::compress_block;

/*
    The source is read to the end, then cut into RLE1 blocks. Each block is passed to
    compress_block for the BWT, MTF, RLE2 and huffman stages, and the packed block is
    handed to the StreamWriter, which stitches the blocks into one stream and writes
    the footer with the combined CRC.
*/

/// What a compression run produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CompressSummary {
    pub blocks: u32,
    pub bytes_in: u64,
    pub bytes_out: u64,
    pub stream_crc: u32,
}

impl CompressSummary {
    /// Compressed size as a fraction of the input (1.0 for empty input).
    pub fn ratio(&self) -> f64 {
        if self.bytes_in == 0 {
            1.0
        } else {
            self.bytes_out as f64 / self.bytes_in as f64
        }
    }
}

/// Compress everything `source` yields into one bzip2 stream on `sink`.
pub fn compress<R: Read, W: Write>(source: R, sink: W, config: &Config) -> Result<CompressSummary> {
    let never = AtomicBool::new(false);
    compress_interruptible(source, sink, config, &never)
}

/// Like [`compress`], but checks `interrupt` between blocks. When it is set, the stream is closed
/// after the blocks already written (so the output is a valid, shorter stream) and
/// `Interrupted` is returned.
pub fn compress_interruptible<R: Read, W: Write>(
    mut source: R,
    sink: W,
    config: &Config,
    interrupt: &AtomicBool,
) -> Result<CompressSummary> {
    let block_size = config.compress_block_size();

    let mut input = Vec::new();
    source.read_to_end(&mut input)?;
    debug!(
        "Compressing {} bytes with {}00k blocks, work factor {}.",
        input.len(),
        block_size,
        config.work_factor()
    );

    let mut writer = StreamWriter::new(sink, block_size);
    let mut seq = 0_u32;
    let mut interrupted = false;

    for block in Rle1Blocks::new(&input, block_size) {
        if interrupt.load(Ordering::Relaxed) {
            interrupted = true;
            break;
        }
        seq += 1;
        let packed = compress_block(&block, config.work_factor(), seq);
        writer.add_block(&packed)?;
    }

    let stream_crc = writer.stream_crc();
    let blocks = writer.blocks();
    let (_, bytes_out) = writer.finish()?;
    debug!(
        "Wrote {} blocks, {} bytes, stream crc {:#010x}.",
        blocks, bytes_out, stream_crc
    );

    if interrupted {
        return Err(Bz2Error::Interrupted {
            completed_blocks: blocks,
        });
    }
    Ok(CompressSummary {
        blocks,
        bytes_in: input.len() as u64,
        bytes_out,
        stream_crc,
    })
}

/// Compress a byte slice in memory.
pub fn compress_bytes(data: &[u8], config: &Config) -> Result<Vec<u8>> {
    let mut out = Vec::with_capacity(data.len() / 2 + 64);
    compress(data, &mut out, config)?;
    Ok(out)
}
