//! Engine configuration.
//!
//! A `Config` is built once by the caller and handed to every compress / decompress call.
//! Nothing in the engine reads process-wide settings.

use crate::error::{Bz2Error, Result};

/// Default work factor, the same value libbzip2 uses when asked for 0.
pub const DEFAULT_WORK_FACTOR: u32 = 30;
/// Largest work factor accepted.
pub const MAX_WORK_FACTOR: u32 = 250;

/// Immutable settings for one engine call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Config {
    /// Block size in units of 100k (1..=9)
    block_size: u8,
    /// Effort spent in the fast BWT sort before switching to the guaranteed fallback
    work_factor: u32,
    /// Reduce memory use (smaller blocks when compressing, packed tables when decompressing)
    small: bool,
}

impl Config {
    /// New configuration with the given block size (1-9) and default settings otherwise.
    pub fn new(block_size: u8) -> Result<Self> {
        if !(1..=9).contains(&block_size) {
            return Err(Bz2Error::UnsupportedBlockSize(block_size));
        }
        Ok(Self {
            block_size,
            work_factor: DEFAULT_WORK_FACTOR,
            small: false,
        })
    }

    /// Set the work factor. 0 selects the default (30), anything above 250 is rejected.
    pub fn with_work_factor(mut self, work_factor: u32) -> Result<Self> {
        self.work_factor = match work_factor {
            0 => DEFAULT_WORK_FACTOR,
            1..=MAX_WORK_FACTOR => work_factor,
            _ => return Err(Bz2Error::InvalidWorkFactor(work_factor)),
        };
        Ok(self)
    }

    /// Turn small (low memory) mode on or off.
    pub fn with_small(mut self, small: bool) -> Self {
        self.small = small;
        self
    }

    pub fn block_size(&self) -> u8 {
        self.block_size
    }

    pub fn work_factor(&self) -> u32 {
        self.work_factor
    }

    pub fn small(&self) -> bool {
        self.small
    }

    /// Block size actually used when compressing. Small mode caps it at 200k.
    pub fn compress_block_size(&self) -> u8 {
        if self.small {
            self.block_size.min(2)
        } else {
            self.block_size
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            block_size: 9,
            work_factor: DEFAULT_WORK_FACTOR,
            small: false,
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::error::ErrorKind;

    #[test]
    fn block_size_bounds() {
        assert!(Config::new(1).is_ok());
        assert!(Config::new(9).is_ok());
        assert_eq!(
            Config::new(0).unwrap_err().kind(),
            ErrorKind::UnsupportedBlockSize
        );
        assert_eq!(
            Config::new(10).unwrap_err().kind(),
            ErrorKind::UnsupportedBlockSize
        );
    }

    #[test]
    fn work_factor_zero_means_default() {
        let cfg = Config::new(5).unwrap().with_work_factor(0).unwrap();
        assert_eq!(cfg.work_factor(), 30);
        let cfg = cfg.with_work_factor(250).unwrap();
        assert_eq!(cfg.work_factor(), 250);
        assert!(Config::default().with_work_factor(251).is_err());
    }

    #[test]
    fn small_mode_caps_compress_block_size() {
        let cfg = Config::new(9).unwrap().with_small(true);
        assert_eq!(cfg.block_size(), 9);
        assert_eq!(cfg.compress_block_size(), 2);
        let cfg = Config::new(1).unwrap().with_small(true);
        assert_eq!(cfg.compress_block_size(), 1);
        assert_eq!(Config::default().compress_block_size(), 9);
    }
}
