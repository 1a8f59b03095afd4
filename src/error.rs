//! Error types for the bzip2 engine.
//!
//! Every failure the engine can report is a variant of [`Bz2Error`]. The engine never prints
//! anything itself; callers decide what to show the user. Block level problems carry the
//! (1-based) block number so a caller can decide whether to keep what was already produced.

use std::io;
use thiserror::Error;

/// Which magic number failed to match.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MagicKind {
    /// The "BZh" stream signature.
    Stream,
    /// The 48 bit block (or end of stream) marker.
    Block,
}

impl std::fmt::Display for MagicKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MagicKind::Stream => write!(f, "stream header"),
            MagicKind::Block => write!(f, "block header"),
        }
    }
}

/// All errors produced while compressing or decompressing.
#[derive(Debug, Error)]
pub enum Bz2Error {
    /// I/O error from the byte source or sink.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// The input is not a bzip2 stream (or a block marker is damaged).
    #[error("not a bzip2 stream: bad {what} magic")]
    BadMagic {
        /// Which marker was wrong.
        what: MagicKind,
    },

    /// The compressed data ended before the stream was complete.
    #[error("compressed stream ended unexpectedly near byte {offset}")]
    TruncatedStream {
        /// Byte offset in the compressed input where data ran out.
        offset: u64,
    },

    /// A block could not be decoded.
    #[error("block {block} is corrupt: {reason}")]
    CorruptBlock {
        /// Block number within the stream, starting at 1.
        block: u32,
        /// What was wrong.
        reason: String,
    },

    /// The Huffman coded data ran out of selector groups before the end-of-block symbol.
    #[error("block {block} ended without an end-of-block symbol")]
    MissingEndOfBlock {
        /// Block number within the stream, starting at 1.
        block: u32,
    },

    /// A block decoded cleanly but its CRC does not match the stored one.
    #[error("CRC mismatch in block {block}: stored {stored:#010x}, computed {computed:#010x}")]
    BlockCrcMismatch {
        /// Block number within the stream, starting at 1.
        block: u32,
        /// CRC stored in the block header.
        stored: u32,
        /// CRC computed from the decoded bytes.
        computed: u32,
    },

    /// Every block matched, but the combined stream CRC does not.
    #[error("combined stream CRC mismatch: stored {stored:#010x}, computed {computed:#010x}")]
    StreamCrcMismatch {
        /// CRC stored in the stream footer.
        stored: u32,
        /// CRC combined from the decoded blocks.
        computed: u32,
    },

    /// Block size outside 1..=9 (in units of 100k).
    #[error("unsupported block size {0} (expected 1-9)")]
    UnsupportedBlockSize(u8),

    /// Work factor outside 0..=250.
    #[error("invalid work factor {0} (expected 1-250)")]
    InvalidWorkFactor(u32),

    /// The caller asked the engine to stop between blocks.
    #[error("interrupted after {completed_blocks} complete blocks")]
    Interrupted {
        /// Number of whole blocks processed before stopping.
        completed_blocks: u32,
    },
}

/// Flat classification of [`Bz2Error`], one entry per error family.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Io,
    BadMagic,
    TruncatedStream,
    CorruptBlock,
    MissingEndOfBlock,
    CrcMismatch,
    UnsupportedBlockSize,
    InvalidConfig,
    Interrupted,
}

impl Bz2Error {
    /// Shorthand used by the decoders.
    pub(crate) fn corrupt(block: u32, reason: impl Into<String>) -> Self {
        Bz2Error::CorruptBlock {
            block,
            reason: reason.into(),
        }
    }

    /// The family this error belongs to.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Bz2Error::Io(_) => ErrorKind::Io,
            Bz2Error::BadMagic { .. } => ErrorKind::BadMagic,
            Bz2Error::TruncatedStream { .. } => ErrorKind::TruncatedStream,
            Bz2Error::CorruptBlock { .. } => ErrorKind::CorruptBlock,
            Bz2Error::MissingEndOfBlock { .. } => ErrorKind::MissingEndOfBlock,
            Bz2Error::BlockCrcMismatch { .. } | Bz2Error::StreamCrcMismatch { .. } => {
                ErrorKind::CrcMismatch
            }
            Bz2Error::UnsupportedBlockSize(_) => ErrorKind::UnsupportedBlockSize,
            Bz2Error::InvalidWorkFactor(_) => ErrorKind::InvalidConfig,
            Bz2Error::Interrupted { .. } => ErrorKind::Interrupted,
        }
    }

    /// True when decoding can carry on with the next block of the same stream.
    pub fn is_recoverable(&self) -> bool {
        matches!(self, Bz2Error::BlockCrcMismatch { .. })
    }

    /// Block number the error refers to, if it is tied to one block.
    pub fn block(&self) -> Option<u32> {
        match self {
            Bz2Error::CorruptBlock { block, .. }
            | Bz2Error::MissingEndOfBlock { block }
            | Bz2Error::BlockCrcMismatch { block, .. } => Some(*block),
            _ => None,
        }
    }
}

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, Bz2Error>;
