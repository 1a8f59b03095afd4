//! CRC-32 as used by bzip2.
//!
//! bzip2 feeds the CRC most significant bit first (polynomial 0x04c11db7, no reflection), so it
//! does not match the zlib / ethernet CRC-32 even though the polynomial is the same.
//! The stream CRC is built from the block CRCs, rotating left one bit before each is mixed in.

const POLY: u32 = 0x04c1_1db7;

/// Lookup table, built at compile time.
static CRC_TABLE: [u32; 256] = build_table();

const fn build_table() -> [u32; 256] {
    let mut table = [0_u32; 256];
    let mut i = 0;
    while i < 256 {
        let mut crc = (i as u32) << 24;
        let mut bit = 0;
        while bit < 8 {
            crc = if crc & 0x8000_0000 != 0 {
                (crc << 1) ^ POLY
            } else {
                crc << 1
            };
            bit += 1;
        }
        table[i] = crc;
        i += 1;
    }
    table
}

/// Continue a block CRC over `data`. Pass 0 to start a new block; the value returned is final
/// (already inverted), so it can be fed back in for the next chunk.
pub fn do_crc(crc: u32, data: &[u8]) -> u32 {
    let mut crc = !crc;
    for &byte in data {
        crc = (crc << 8) ^ CRC_TABLE[((crc >> 24) ^ byte as u32) as usize];
    }
    !crc
}

/// Fold a block CRC into the running stream CRC.
pub fn do_stream_crc(stream_crc: u32, block_crc: u32) -> u32 {
    stream_crc.rotate_left(1) ^ block_crc
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn check_value() {
        assert_eq!(do_crc(0, b"123456789"), 0xfc89_1918);
    }

    #[test]
    fn empty_input_is_zero() {
        assert_eq!(do_crc(0, &[]), 0);
    }

    #[test]
    fn chunked_matches_whole() {
        let data = b"The quick brown fox jumps over the lazy dog";
        let whole = do_crc(0, data);
        let (a, b) = data.split_at(17);
        assert_eq!(do_crc(do_crc(0, a), b), whole);
    }

    #[test]
    fn stream_crc_is_order_dependent() {
        let a = do_crc(0, b"first block");
        let b = do_crc(0, b"second block");
        let ab = do_stream_crc(do_stream_crc(0, a), b);
        let ba = do_stream_crc(do_stream_crc(0, b), a);
        assert_ne!(ab, ba);
        // a single block stream carries the block crc unchanged
        assert_eq!(do_stream_crc(0, a), a);
    }
}
