/// Returns a frequency count of the input data.
pub fn freqs(data: &[u8]) -> [u32; 256] {
    let mut freqs = [0_u32; 256];
    // Counting in 4 interleaved tables avoids store-to-load stalls on runs of one byte.
    let mut lanes = [[0_u32; 256]; 4];
    let mut chunks = data.chunks_exact(4);
    for chunk in &mut chunks {
        lanes[0][chunk[0] as usize] += 1;
        lanes[1][chunk[1] as usize] += 1;
        lanes[2][chunk[2] as usize] += 1;
        lanes[3][chunk[3] as usize] += 1;
    }
    chunks
        .remainder()
        .iter()
        .for_each(|&el| freqs[el as usize] += 1);
    for (i, f) in freqs.iter_mut().enumerate() {
        *f += lanes[0][i] + lanes[1][i] + lanes[2][i] + lanes[3][i];
    }
    freqs
}

/// Cumulative counts: entry `c` is the number of bytes smaller than `c`. The final entry holds
/// the total.
pub fn cumulative(freqs: &[u32; 256]) -> [u32; 257] {
    let mut cum = [0_u32; 257];
    for i in 0..256 {
        cum[i + 1] = cum[i] + freqs[i];
    }
    cum
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn counts_every_byte() {
        let data = b"abracadabra";
        let f = freqs(data);
        assert_eq!(f[b'a' as usize], 5);
        assert_eq!(f[b'b' as usize], 2);
        assert_eq!(f[b'r' as usize], 2);
        assert_eq!(f[b'c' as usize], 1);
        assert_eq!(f[b'd' as usize], 1);
        assert_eq!(f.iter().sum::<u32>(), data.len() as u32);
    }

    #[test]
    fn cumulative_totals() {
        let f = freqs(b"banana");
        let cum = cumulative(&f);
        assert_eq!(cum[b'a' as usize], 0);
        assert_eq!(cum[b'b' as usize], 3);
        assert_eq!(cum[b'n' as usize], 4);
        assert_eq!(cum[256], 6);
    }
}
