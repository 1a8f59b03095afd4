//! This helper is part of the huffman encoding system.
//!
//! The main huffman encoding function generates frequency weight tables for each table in use. This helper
//! generates huffman code lengths (depth tables) from those frequency weights. The bzip2 format
//! requires that the maximum code length is 17 bits when encoding. If the weights supplied create longer codes, the
//! weights will be flattened and another attempt will be made.
//!
//! Codes are then handed out canonically: shortest lengths first, and within one length in
//! symbol order. The decoder rebuilds exactly the same codes from the lengths alone.

use std::cmp::Reverse;
use std::collections::BinaryHeap;

/// Longest code the encoder may produce.
pub const MAX_CODE_LEN: u32 = 17;

/// Build code lengths (at most `max_len` bits) for the first `alpha_size` symbols of `sym_weight`,
/// writing them into `lengths`. Symbols with a zero weight still get a code.
pub fn improve_code_len_from_weights(
    lengths: &mut [u32],
    sym_weight: &[u32],
    alpha_size: usize,
    max_len: u32,
) {
    if alpha_size < 2 {
        lengths.iter_mut().take(alpha_size).for_each(|l| *l = 1);
        return;
    }

    // Weights carry the subtree depth in the low 8 bits, so equal weights favour shallow trees.
    // If the weight was 0, put 1 otherwise put weight * 256 ( << 8 )
    let mut weight: Vec<u32> = sym_weight
        .iter()
        .take(alpha_size)
        .map(|&f| if f == 0 { 1 << 8 } else { f << 8 })
        .collect();

    // Node i < alpha_size is a leaf, the rest are internal nodes
    let mut parent = vec![usize::MAX; alpha_size * 2];

    loop {
        weight.truncate(alpha_size);
        parent.iter_mut().for_each(|p| *p = usize::MAX);

        let mut heap: BinaryHeap<Reverse<(u32, usize)>> = weight
            .iter()
            .enumerate()
            .map(|(i, &w)| Reverse((w, i)))
            .collect();

        // Pull off the two lightest nodes and join them until only the root is left.
        while heap.len() > 1 {
            let (Some(Reverse((w1, n1))), Some(Reverse((w2, n2)))) = (heap.pop(), heap.pop()) else {
                break;
            };
            let node = weight.len();
            weight.push(add_weights(w1, w2));
            parent[n1] = node;
            parent[n2] = node;
            heap.push(Reverse((weight[node], node)));
        }

        // Depth of each leaf is its code length.
        let mut too_long = false;
        for (i, len) in lengths.iter_mut().enumerate().take(alpha_size) {
            let mut depth = 0;
            let mut k = i;
            while parent[k] != usize::MAX {
                k = parent[k];
                depth += 1;
            }
            *len = depth;
            too_long |= depth > max_len;
        }

        if !too_long {
            return;
        }
        // Flatten the weights by halving them (plus one) and try again.
        for w in weight.iter_mut().take(alpha_size) {
            let j = 1 + ((*w >> 8) / 2);
            *w = j << 8;
        }
    }
}

/// Julian's version of weight adding for parent nodes
#[inline(always)]
fn add_weights(a: u32, b: u32) -> u32 {
    let weight_mask: u32 = 0xffffff00;
    let depth_mask: u32 = 0x000000ff;
    ((a & weight_mask) + (b & weight_mask)) | (1 + (a & depth_mask).max(b & depth_mask))
}

/// Canonical codes for the given lengths, in the packed `length << 24 | code` form the
/// BitPacker's out24 takes.
#[allow(clippy::unusual_byte_groupings)]
pub fn assign_codes(lengths: &[u32]) -> Vec<u32> {
    let mut codes = vec![0_u32; lengths.len()];
    let (Some(&min), Some(&max)) = (lengths.iter().min(), lengths.iter().max()) else {
        return codes;
    };
    let mut next_code = 0_u32;
    for len in min..=max {
        for (sym, &l) in lengths.iter().enumerate() {
            if l == len {
                codes[sym] = len << 24 | next_code;
                next_code += 1;
            }
        }
        next_code <<= 1;
    }
    codes
}

#[cfg(test)]
mod test {
    use super::*;

    fn kraft_sum(lengths: &[u32]) -> f64 {
        lengths.iter().map(|&l| 0.5_f64.powi(l as i32)).sum()
    }

    #[test]
    fn simple_weights() {
        let mut lengths = [0_u32; 4];
        improve_code_len_from_weights(&mut lengths, &[10, 5, 2, 1], 4, MAX_CODE_LEN);
        assert_eq!(lengths, [1, 2, 3, 3]);
    }

    #[test]
    fn zero_weights_still_get_codes() {
        let mut lengths = [0_u32; 5];
        improve_code_len_from_weights(&mut lengths, &[100, 0, 0, 0, 0], 5, MAX_CODE_LEN);
        assert!(lengths.iter().all(|&l| l > 0));
        assert!((kraft_sum(&lengths) - 1.0).abs() < 1e-12);
    }

    #[test]
    fn fibonacci_weights_are_limited() {
        // Fibonacci frequencies make the deepest possible tree
        let mut freqs = vec![1_u32, 1];
        while freqs.len() < 30 {
            let next = freqs[freqs.len() - 1] + freqs[freqs.len() - 2];
            freqs.push(next);
        }
        let mut lengths = vec![0_u32; 30];
        improve_code_len_from_weights(&mut lengths, &freqs, 30, MAX_CODE_LEN);
        assert!(lengths.iter().all(|&l| (1..=MAX_CODE_LEN).contains(&l)));
        assert!((kraft_sum(&lengths) - 1.0).abs() < 1e-12);
    }

    #[test]
    fn canonical_codes_are_prefix_free() {
        let lengths = [3_u32, 2, 3, 3, 3, 2];
        let codes = assign_codes(&lengths);
        // length 2: symbols 1, 5 -> 00, 01; length 3: symbols 0, 2, 3, 4 -> 100, 101, 110, 111
        assert_eq!(codes[1], 2 << 24);
        assert_eq!(codes[5], 2 << 24 | 1);
        assert_eq!(codes[0], 3 << 24 | 0b100);
        assert_eq!(codes[4], 3 << 24 | 0b111);
        for (i, &a) in codes.iter().enumerate() {
            for (j, &b) in codes.iter().enumerate() {
                if i == j {
                    continue;
                }
                let (la, lb) = (a >> 24, b >> 24);
                if la <= lb {
                    let prefix = (b & 0xff_ffff) >> (lb - la);
                    assert_ne!(prefix, a & 0xff_ffff, "{} is a prefix of {}", i, j);
                }
            }
        }
    }
}
