use std::io::{self, Read, Write};
use std::sync::atomic::{AtomicBool, Ordering};

use log::{debug, trace};

use super::compress_block::{BLOCK_MAGIC_HI, BLOCK_MAGIC_LO};
use crate::bitstream::bitreader::BitReader;
use crate::bitstream::bitwriter::END_MAGIC;
use crate::bwt_algorithms::bwt_sort::{bwt_decode, bwt_decode_small};
use crate::error::{Bz2Error, ErrorKind, MagicKind, Result};
use crate::huffman_coding::huffman_decode::huf_decode;
use crate::tools::crc::{do_crc, do_stream_crc};
use crate::tools::options::Config;
use crate::tools::rle1::rle1_decode;
use crate::tools::rle2_mtf::Rle2Decoder;
use crate::tools::symbol_map::decode_sym_map;

/// Where the decoder is within the current stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecodeState {
    ExpectStreamHeader,
    ExpectBlockOrEnd,
    DecodingBlock,
    StreamComplete,
    /// A parse error stopped the decoder. Nothing more is read.
    Failed(ErrorKind),
}

/// One decoded block. The data is only trustworthy when the CRCs agree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedBlock {
    /// Block number within its stream, starting at 1
    pub number: u32,
    pub data: Vec<u8>,
    pub stored_crc: u32,
    pub computed_crc: u32,
}

impl DecodedBlock {
    pub fn is_intact(&self) -> bool {
        self.stored_crc == self.computed_crc
    }
}

/// What a decompression run produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DecompressSummary {
    pub streams: u32,
    pub blocks: u32,
    pub bytes_out: u64,
    /// Bytes that were not a bzip2 stream followed the last stream, and were ignored.
    pub trailing_garbage: bool,
}

/// Block by block decoder for one or more concatenated bzip2 streams.
///
/// `next_block` hands out each block as it is decoded, with both CRCs, so a caller can decide
/// what to do with a damaged block. When it returns `None` the stream is complete (its combined
/// CRC checked); `next_stream` then looks for another stream behind it.
pub struct StreamDecoder<R> {
    br: BitReader<R>,
    state: DecodeState,
    small: bool,
    block_size: u8,
    block_no: u32,
    stream_crc: u32,
    trailing_garbage: bool,
}

impl<R: Read> StreamDecoder<R> {
    pub fn new(reader: R, small: bool) -> Self {
        Self {
            br: BitReader::new(reader),
            state: DecodeState::ExpectStreamHeader,
            small,
            block_size: 9,
            block_no: 0,
            stream_crc: 0,
            trailing_garbage: false,
        }
    }

    pub fn state(&self) -> DecodeState {
        self.state
    }

    /// Block size (in 100k) announced by the current stream's header.
    pub fn block_size(&self) -> u8 {
        self.block_size
    }

    pub fn trailing_garbage(&self) -> bool {
        self.trailing_garbage
    }

    /// Record a failure and hand the error back.
    fn fail(&mut self, err: Bz2Error) -> Bz2Error {
        self.state = DecodeState::Failed(err.kind());
        err
    }

    /// Check the 4 byte stream header, given its first byte.
    fn parse_header(&mut self, first: u8) -> Result<()> {
        let rest = self.br.bytes(3)?;
        if first != b'B' || rest[0] != b'Z' || rest[1] != b'h' {
            return Err(Bz2Error::BadMagic {
                what: MagicKind::Stream,
            });
        }
        let level = rest[2];
        if !(b'1'..=b'9').contains(&level) {
            return Err(Bz2Error::UnsupportedBlockSize(level.wrapping_sub(b'0')));
        }
        self.block_size = level - b'0';
        self.block_no = 0;
        self.stream_crc = 0;
        self.state = DecodeState::ExpectBlockOrEnd;
        trace!("Found a valid bzip2 signature, block size {}00k.", self.block_size);
        Ok(())
    }

    fn read_first_header(&mut self) -> Result<()> {
        let first = self.br.byte()?;
        self.parse_header(first)
    }

    /// Decode the next block of the current stream. Returns `None` at the end of the stream
    /// (after the combined CRC matched) and after a failure.
    pub fn next_block(&mut self) -> Result<Option<DecodedBlock>> {
        match self.state {
            DecodeState::ExpectStreamHeader => {
                if let Err(e) = self.read_first_header() {
                    return Err(self.fail(e));
                }
            }
            DecodeState::ExpectBlockOrEnd => {}
            DecodeState::DecodingBlock | DecodeState::StreamComplete | DecodeState::Failed(_) => {
                return Ok(None)
            }
        }

        match self.read_block_or_end() {
            Ok(block) => Ok(block),
            Err(e) => Err(self.fail(e)),
        }
    }

    fn read_block_or_end(&mut self) -> Result<Option<DecodedBlock>> {
        let hi = self.br.bint(24)?;
        let lo = self.br.bint(24)?;
        let magic = (hi as u64) << 24 | lo as u64;

        if magic == END_MAGIC {
            let stored = self.br.bint(32)?;
            if stored != self.stream_crc {
                return Err(Bz2Error::StreamCrcMismatch {
                    stored,
                    computed: self.stream_crc,
                });
            }
            debug!("Stream CRCs matched: {:#010x}.", stored);
            self.state = DecodeState::StreamComplete;
            return Ok(None);
        }
        if hi != BLOCK_MAGIC_HI || lo != BLOCK_MAGIC_LO {
            return Err(Bz2Error::BadMagic {
                what: MagicKind::Block,
            });
        }

        self.state = DecodeState::DecodingBlock;
        self.block_no += 1;
        let block = self.decode_block()?;
        self.stream_crc = do_stream_crc(self.stream_crc, block.computed_crc);
        self.state = DecodeState::ExpectBlockOrEnd;
        Ok(Some(block))
    }

    /// Everything after the block magic.
    fn decode_block(&mut self) -> Result<DecodedBlock> {
        let number = self.block_no;
        trace!("Block {} starts near byte {}.", number, self.br.byte_offset());
        let stored_crc = self.br.bint(32)?;
        if self.br.bool_bit()? {
            return Err(Bz2Error::corrupt(number, "randomised blocks are not supported"));
        }
        let key = self.br.bint(24)?;

        // Symbol map: the group word, then one word per used group
        let groups = self.br.bint(16)? as u16;
        let mut sym_map = vec![groups];
        for _ in 0..groups.count_ones() {
            sym_map.push(self.br.bint(16)? as u16);
        }
        let symbols = decode_sym_map(&sym_map);
        if symbols.is_empty() {
            return Err(Bz2Error::corrupt(number, "no symbols in use"));
        }

        let limit = self.block_size as usize * 100_000;
        let mut rle2 = Rle2Decoder::new(symbols, limit, number);
        huf_decode(&mut self.br, &mut rle2, number)?;
        let bwt = rle2.finish()?;

        let rle1 = if self.small {
            bwt_decode_small(key, &bwt, number)?
        } else {
            bwt_decode(key, &bwt, number)?
        };
        let data = rle1_decode(&rle1);
        let computed_crc = do_crc(0, &data);
        debug!(
            "Block {}: key {}, {} bytes, stored crc {:#010x}, computed {:#010x}",
            number,
            key,
            data.len(),
            stored_crc,
            computed_crc
        );

        Ok(DecodedBlock {
            number,
            data,
            stored_crc,
            computed_crc,
        })
    }

    /// After a complete stream, look for another one. Returns true when a new stream header was
    /// read. Anything that is not a stream header is trailing garbage and is ignored.
    pub fn next_stream(&mut self) -> Result<bool> {
        if self.state != DecodeState::StreamComplete {
            return Ok(false);
        }
        self.br.align_to_byte();
        let first = match self.br.try_byte() {
            Ok(Some(b)) => b,
            Ok(None) => return Ok(false),
            Err(e) if e.kind() == ErrorKind::Io => return Err(e),
            Err(_) => {
                self.trailing_garbage = true;
                return Ok(false);
            }
        };
        match self.parse_header(first) {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == ErrorKind::Io => Err(e),
            Err(_) => {
                debug!("Ignoring trailing garbage after the last stream.");
                self.trailing_garbage = true;
                self.state = DecodeState::StreamComplete;
                Ok(false)
            }
        }
    }
}

/// Decompress every stream in `source` onto `sink`. Only blocks whose CRC matched are written.
pub fn decompress<R: Read, W: Write>(
    source: R,
    sink: W,
    config: &Config,
) -> Result<DecompressSummary> {
    let never = AtomicBool::new(false);
    decompress_interruptible(source, sink, config, &never)
}

/// Like [`decompress`], but checks `interrupt` before each block and returns `Interrupted`
/// when it is set. Only whole, verified blocks have been written at that point.
pub fn decompress_interruptible<R: Read, W: Write>(
    source: R,
    mut sink: W,
    config: &Config,
    interrupt: &AtomicBool,
) -> Result<DecompressSummary> {
    let mut decoder = StreamDecoder::new(source, config.small());
    let mut summary = DecompressSummary::default();

    loop {
        loop {
            if interrupt.load(Ordering::Relaxed) {
                sink.flush()?;
                return Err(Bz2Error::Interrupted {
                    completed_blocks: summary.blocks,
                });
            }
            let Some(block) = decoder.next_block()? else {
                break;
            };
            if !block.is_intact() {
                return Err(Bz2Error::BlockCrcMismatch {
                    block: block.number,
                    stored: block.stored_crc,
                    computed: block.computed_crc,
                });
            }
            sink.write_all(&block.data)?;
            summary.blocks += 1;
            summary.bytes_out += block.data.len() as u64;
        }
        summary.streams += 1;
        if !decoder.next_stream()? {
            break;
        }
    }
    summary.trailing_garbage = decoder.trailing_garbage();
    sink.flush()?;
    Ok(summary)
}

/// Check that `source` decompresses cleanly without keeping the output.
pub fn test<R: Read>(source: R, config: &Config) -> Result<DecompressSummary> {
    decompress(source, io::sink(), config)
}

/// Decompress a byte slice in memory.
pub fn decompress_bytes(data: &[u8]) -> Result<Vec<u8>> {
    let mut out = Vec::with_capacity(data.len() * 4);
    decompress(data, &mut out, &Config::default())?;
    Ok(out)
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::compression::compress::compress_bytes;

    #[test]
    fn decoder_walks_the_states() {
        let cfg = Config::new(1).unwrap();
        let packed = compress_bytes(b"hello hello hello", &cfg).unwrap();
        let mut decoder = StreamDecoder::new(packed.as_slice(), false);
        assert_eq!(decoder.state(), DecodeState::ExpectStreamHeader);
        let block = decoder.next_block().unwrap().unwrap();
        assert_eq!(block.number, 1);
        assert!(block.is_intact());
        assert_eq!(block.data, b"hello hello hello".to_vec());
        assert_eq!(decoder.state(), DecodeState::ExpectBlockOrEnd);
        assert_eq!(decoder.block_size(), 1);
        assert!(decoder.next_block().unwrap().is_none());
        assert_eq!(decoder.state(), DecodeState::StreamComplete);
        assert!(!decoder.next_stream().unwrap());
        assert!(!decoder.trailing_garbage());
    }

    #[test]
    fn bad_header_fails_the_decoder() {
        let mut decoder = StreamDecoder::new(&b"BZx9garbage"[..], false);
        let err = decoder.next_block().unwrap_err();
        assert_eq!(err.kind(), ErrorKind::BadMagic);
        assert_eq!(decoder.state(), DecodeState::Failed(ErrorKind::BadMagic));
        assert!(decoder.next_block().unwrap().is_none());
    }

    #[test]
    fn block_size_digit_is_checked() {
        let err = decompress_bytes(b"BZh0").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::UnsupportedBlockSize);
    }

    #[test]
    fn empty_input_is_truncated() {
        let err = decompress_bytes(&[]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::TruncatedStream);
    }
}
