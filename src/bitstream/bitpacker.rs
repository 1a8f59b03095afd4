use log::error;

/// Packs the bits of one compressed block, most significant bit first.
pub struct BitPacker {
    pub output: Vec<u8>,
    /// Number of valid bits in the final byte after flush() (0 means the last byte is full).
    pub last_bits: u8,
    queue: u64,
    q_bits: u8,
}

impl BitPacker {
    /// Create a new BitPacker with an output buffer of size specified. Suggest the
    /// size be set to the block size. Call flush() to flush the bit queue to the buffer
    /// before taking the output.
    pub fn new(size: usize) -> Self {
        Self {
            output: Vec::with_capacity(size),
            last_bits: 0,
            queue: 0,
            q_bits: 0,
        }
    }

    /// Internal bitstream write function common to all out.XX functions.
    fn write_stream(&mut self) {
        while self.q_bits > 7 {
            let byte = (self.queue >> (self.q_bits - 8)) as u8;
            self.output.push(byte); //push the packed byte out
            self.q_bits -= 8; //adjust the count of bits left in the queue
        }
    }

    /// Writes the low `n` bits of `value` (n <= 32).
    pub fn write_bits(&mut self, n: u8, value: u32) {
        if n == 0 {
            return;
        }
        self.queue <<= n;
        self.queue |= (value as u64) & ((1_u64 << n) - 1);
        self.q_bits += n;
        self.write_stream();
    }

    /*
    NOTE: out24 takes a u32.  The 8 most significant bits of the word indicate how
    many of the least significant bits will be written. Those bits must be aligned to
    the least signficant bit. (The middle bits are masked out.)

    It is primarily used to write huffman codes and other odd size data.
    Eg 0000100_00000000_00000000_00000010 writes out 0010.
    */
    /// Writes 0-24 bits encoded with the number of bits to write in the most
    /// significant byte of a 32 bit word.
    pub fn out24(&mut self, data: u32) {
        self.write_bits((data >> 24) as u8, data & 0x00ff_ffff);
    }

    /// Puts a 32 bit word of pre-packed binary encoded data on the stream.
    pub fn out32(&mut self, data: u32) {
        self.write_bits(32, data);
    }

    /// Puts a 16 bit word of pre-packed binary encoded data on the stream.
    pub fn out16(&mut self, data: u16) {
        self.write_bits(16, data as u32);
    }

    /// Puts a byte on the stream.
    pub fn out8(&mut self, data: u8) {
        self.write_bits(8, data as u32);
    }

    /// Flushes the remaining bits (1-7) from the buffer, padding with 0s in the least
    /// signficant bits
    pub fn flush(&mut self) {
        self.last_bits = self.q_bits % 8;
        if self.q_bits > 0 {
            self.queue <<= 8 - self.q_bits; //pad the queue with zeros
            self.q_bits += 8 - self.q_bits;
            self.write_stream(); // write out all that is left
            if self.q_bits > 0 {
                error!("Stuff left in the BitPacker queue.");
            }
        }
    }

    /// Number of zero bits flush() added to the final byte.
    pub fn padding(&self) -> u8 {
        (8 - self.last_bits) % 8
    }

    /// Debugging function to return the number of bytes.bits output so far
    pub fn loc(&self) -> String {
        format! {"[{}.{}]",((self.output.len() * 8) + self.q_bits as usize)/8, ((self.output.len() * 8) + self.q_bits as usize)%8}
    }
}

#[cfg(test)]
mod test {
    use super::BitPacker;

    #[test]
    fn out16_test() {
        let mut bw = BitPacker::new(100);
        let data = 0b00100001_00100000;
        bw.out16(data);
        bw.flush();
        let out = bw.output;
        assert_eq!(out, "! ".as_bytes());
    }

    #[test]
    fn out24_and_loc_test() {
        let mut bw = BitPacker::new(100);
        let data = 0b00001000_00000000_00000000_00100001;
        bw.out24(data);
        bw.flush();
        let out = &bw.output;
        assert_eq!(out, "!".as_bytes());
        assert_eq!("[1.0]", &bw.loc());
        let data = 0b00011000_00000000_00000000_00000011;
        bw.out24(data);
        bw.flush();
        let out2 = &bw.output;
        assert_eq!(out2, &[33, 0, 0, 3]); // Note: '33' is data from previous call
        assert_eq!("[4.0]", &bw.loc());
    }

    #[test]
    fn out32_test() {
        let mut bw = BitPacker::new(100);
        let data = 0b00100001_00100000_00100001_00100000;
        bw.out32(data);
        bw.flush();
        let out = bw.output;
        assert_eq!(out, [33, 32, 33, 32]);
    }

    #[test]
    fn odd_bits_are_padded() {
        let mut bw = BitPacker::new(10);
        bw.write_bits(3, 0b101);
        bw.write_bits(1, 1);
        bw.write_bits(9, 0b1_0000_0001);
        bw.flush();
        // 101 1 1000 | 00001 000
        assert_eq!(bw.output, vec![0b1011_1000, 0b0000_1000]);
        assert_eq!(bw.last_bits, 5);
        assert_eq!(bw.padding(), 3);
    }

    #[test]
    fn full_bytes_need_no_padding() {
        let mut bw = BitPacker::new(10);
        bw.out8(0xab);
        bw.flush();
        assert_eq!(bw.output, vec![0xab]);
        assert_eq!(bw.padding(), 0);
    }
}
