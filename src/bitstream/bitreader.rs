//! BitReader: reads the packed bitstream of a bzip2 file, most significant bit first.
//!
//! NOTE: This module can read from any I/O source that supports the read() call. Running out of
//! data in the middle of a read is reported as `TruncatedStream` with the byte offset reached.
//!
use crate::error::{Bz2Error, Result};
use std::io::{ErrorKind, Read};

const BUFFER_SIZE: usize = 1024 * 1024;

/// Reads a binary Bzip2 file.
#[derive(Debug)]
pub struct BitReader<R> {
    buffer: Vec<u8>,
    /// Valid bytes in the buffer
    len: usize,
    cursor: usize,
    /// Bits taken from the buffer but not yet consumed (right aligned)
    queue: u64,
    q_bits: u32,
    /// Bytes taken from the source so far
    offset: u64,
    source: R,
}

impl<R: Read> BitReader<R> {
    /// Creates a new BitReader (with a 1Mbyte buffer).
    pub fn new(source: R) -> Self {
        Self {
            buffer: vec![0; BUFFER_SIZE],
            len: 0,
            cursor: 0,
            queue: 0,
            q_bits: 0,
            offset: 0,
            source,
        }
    }

    /// Check (and refill) buffer. Returns true if we have data, false if there is no more
    fn have_data(&mut self) -> Result<bool> {
        if self.cursor < self.len {
            return Ok(true);
        }
        loop {
            match self.source.read(&mut self.buffer) {
                Ok(0) => return Ok(false),
                Ok(size) => {
                    self.len = size;
                    self.cursor = 0;
                    return Ok(true);
                }
                Err(e) if e.kind() == ErrorKind::Interrupted => continue,
                Err(e) => return Err(e.into()),
            }
        }
    }

    /// Move one byte from the buffer into the bit queue. False when the source is empty.
    fn fill(&mut self) -> Result<bool> {
        if !self.have_data()? {
            return Ok(false);
        }
        self.queue = (self.queue << 8) | self.buffer[self.cursor] as u64;
        self.cursor += 1;
        self.q_bits += 8;
        self.offset += 1;
        Ok(true)
    }

    /// Return the next n bits (n <= 32) as a u32.
    pub fn bint(&mut self, n: u32) -> Result<u32> {
        while self.q_bits < n {
            if !self.fill()? {
                return Err(Bz2Error::TruncatedStream {
                    offset: self.offset,
                });
            }
        }
        self.q_bits -= n;
        let mask = if n == 32 { u32::MAX } else { (1_u32 << n) - 1 };
        Ok((self.queue >> self.q_bits) as u32 & mask)
    }

    /// Return the next bit (1 or 0)
    pub fn bit(&mut self) -> Result<u32> {
        self.bint(1)
    }

    /// Return *true* if the next bit is 1, *false* if 0, consuming the bit.
    pub fn bool_bit(&mut self) -> Result<bool> {
        self.bint(1).map(|bit| bit == 1)
    }

    /// Returns a byte. This is a convenience function, and calls bint(8).
    pub fn byte(&mut self) -> Result<u8> {
        self.bint(8).map(|byte| byte as u8)
    }

    /// Returns a Vec<u8> of n bytes.
    pub fn bytes(&mut self, n: usize) -> Result<Vec<u8>> {
        (0..n).map(|_| self.byte()).collect()
    }

    /// Returns the next byte, or None if the source ended cleanly. Only meaningful on a byte boundary.
    pub fn try_byte(&mut self) -> Result<Option<u8>> {
        if self.q_bits < 8 && !self.fill()? {
            return Ok(None);
        }
        self.byte().map(Some)
    }

    /// Drop the bits left in the current byte.
    pub fn align_to_byte(&mut self) {
        self.q_bits -= self.q_bits % 8;
    }

    /// True when no bits are left to read.
    pub fn is_exhausted(&mut self) -> Result<bool> {
        Ok(self.q_bits == 0 && !self.have_data()?)
    }

    /// Number of whole bytes consumed so far.
    pub fn byte_offset(&self) -> u64 {
        (self.offset * 8 - self.q_bits as u64) / 8
    }

    /// Debugging function. Report current position as bytes.bits.
    pub fn loc(&self) -> String {
        let bits = self.offset * 8 - self.q_bits as u64;
        format!("[{}.{}]", bits / 8, bits % 8)
    }
}

#[cfg(test)]
mod test {
    use super::BitReader;
    use crate::error::ErrorKind;

    #[test]
    fn basic_test() {
        let x = [0b10000001_u8].as_slice();
        let mut br = BitReader::new(x);
        assert_eq!(br.bit().unwrap(), 1);
        for _ in 0..6 {
            assert_eq!(br.bit().unwrap(), 0);
        }
        assert_eq!(br.bit().unwrap(), 1);
        assert_eq!(br.bit().unwrap_err().kind(), ErrorKind::TruncatedStream);
    }

    #[test]
    fn bint_test() {
        let x = [0b00011011].as_slice();
        let mut br = BitReader::new(x);
        assert_eq!(br.bint(5).unwrap(), 3);
        assert_eq!(br.bint(1).unwrap(), 0);
        assert_eq!(br.bint(2).unwrap(), 3);
    }

    #[test]
    fn bint_across_bytes() {
        let x = [0xab, 0xcd, 0xef, 0x12, 0x34].as_slice();
        let mut br = BitReader::new(x);
        assert_eq!(br.bint(4).unwrap(), 0xa);
        assert_eq!(br.bint(32).unwrap(), 0xbcdef123);
        assert_eq!(br.bint(4).unwrap(), 0x4);
        assert!(br.is_exhausted().unwrap());
    }

    #[test]
    fn byte_test() {
        let x = "Hello, world!".as_bytes();
        let mut br = BitReader::new(x);
        assert_eq!(br.byte().unwrap(), b'H');
        assert_eq!(br.byte().unwrap(), b'e');
        assert_eq!(br.bytes(3).unwrap(), b"llo".to_vec());
    }

    #[test]
    fn loc_test() {
        let x = "Hello, world!".as_bytes();
        let mut br = BitReader::new(x);
        br.bytes(5).unwrap();
        br.bit().unwrap();
        assert_eq!(br.loc(), "[5.1]");
        assert_eq!(br.byte_offset(), 5);
        br.bint(7).unwrap();
        assert_eq!(br.byte_offset(), 6);
    }

    #[test]
    fn align_and_try_byte() {
        let x = [0b1110_0000, 0x42].as_slice();
        let mut br = BitReader::new(x);
        assert_eq!(br.bint(3).unwrap(), 7);
        br.align_to_byte();
        assert_eq!(br.try_byte().unwrap(), Some(0x42));
        assert_eq!(br.try_byte().unwrap(), None);
        assert!(br.is_exhausted().unwrap());
    }

    #[test]
    fn truncation_reports_offset() {
        let x = [1_u8, 2, 3].as_slice();
        let mut br = BitReader::new(x);
        match br.bint(32) {
            Err(crate::error::Bz2Error::TruncatedStream { offset }) => assert_eq!(offset, 3),
            other => panic!("unexpected {:?}", other.map(|_| ())),
        }
    }

    #[test]
    fn bool_bit_test() {
        let x = [0b01010000].as_slice();
        let mut br = BitReader::new(x);
        let bits: Vec<bool> = (0..8).map(|_| br.bool_bit().unwrap()).collect();
        assert_eq!(
            bits,
            vec![false, true, false, true, false, false, false, false]
        );
    }
}
