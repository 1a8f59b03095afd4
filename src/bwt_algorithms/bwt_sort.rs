use super::sais::suffix_array;
use crate::error::{Bz2Error, Result};
use crate::tools::freq_count::{cumulative, freqs};
use log::{debug, trace};
use std::cmp::Ordering;

/// Blocks shorter than this go straight to SA-IS.
const SAIS_ONLY_BELOW: usize = 3_000;
/// Partitions this small are finished with an insertion sort.
const INSERTION_LIMIT: usize = 16;
/// Bytes compared per unit of work factor, per byte of block.
const BUDGET_SCALE: i64 = 4;

/// Burrows-Wheeler-Transform of one RLE1 block.
///
/// Rotations are first sorted with a multikey quicksort, which is fast on ordinary data but
/// degrades on highly repetitive blocks. It works against a budget of
/// `block length * work_factor * 4` byte comparisons; when the budget runs out the sort is
/// abandoned and the block is sorted again with SA-IS, which is linear in every case.
///
/// This returns a u32 Key (the row of the original block among the sorted rotations) and the
/// BWT data (last column).
pub fn bwt_encode(rle1_data: &[u8], work_factor: u32) -> (u32, Vec<u8>) {
    let n = rle1_data.len();
    if n == 0 {
        return (0, Vec::new());
    }

    let order = if n < SAIS_ONLY_BELOW {
        trace!("Block of {} bytes, using SA-IS.", n);
        rotation_order_sais(rle1_data)
    } else {
        let mut budget = n as i64 * work_factor as i64 * BUDGET_SCALE;
        match rotation_order_quicksort(rle1_data, &mut budget) {
            Some(order) => {
                debug!("Multikey sort finished, {} budget left.", budget);
                order
            }
            None => {
                debug!("Sort budget exhausted, falling back to SA-IS.");
                rotation_order_sais(rle1_data)
            }
        }
    };

    // Get key and BWT output
    let mut key = 0_u32;
    let mut bwt = Vec::with_capacity(n);
    for (row, &start) in order.iter().enumerate() {
        let start = start as usize;
        if start == 0 {
            key = row as u32;
            bwt.push(rle1_data[n - 1]);
        } else {
            bwt.push(rle1_data[start - 1]);
        }
    }
    (key, bwt)
}

/// Sorted rotation starts, using the suffix array of the block written twice.
fn rotation_order_sais(block: &[u8]) -> Vec<u32> {
    let n = block.len();
    let mut doubled = Vec::with_capacity(2 * n);
    doubled.extend_from_slice(block);
    doubled.extend_from_slice(block);
    // A suffix starting in the first copy begins with the whole rotation, so suffix order is a
    // valid rotation order. Identical rotations only occur in periodic blocks, where their
    // relative order does not change the BWT.
    suffix_array(&doubled)
        .into_iter()
        .filter(|&p| p < n)
        .map(|p| p as u32)
        .collect()
}

/// Compare rotations `a` and `b` of the block from `depth` on, charging the bytes looked at.
fn compare_rotations(
    doubled: &[u8],
    n: usize,
    a: usize,
    b: usize,
    depth: usize,
    budget: &mut i64,
) -> Ordering {
    const CHUNK: usize = 32;
    let mut k = depth;
    while k < n {
        let end = (k + CHUNK).min(n);
        let x = &doubled[a + k..a + end];
        let y = &doubled[b + k..b + end];
        *budget -= (end - k) as i64;
        if x != y {
            return x.cmp(y);
        }
        k = end;
    }
    Ordering::Equal
}

/// Multikey (three way radix) quicksort over rotations with an explicit work stack.
/// Returns None once the budget is spent.
fn rotation_order_quicksort(block: &[u8], budget: &mut i64) -> Option<Vec<u32>> {
    let n = block.len();
    let mut doubled = Vec::with_capacity(2 * n);
    doubled.extend_from_slice(block);
    doubled.extend_from_slice(block);

    let mut index: Vec<u32> = (0..n as u32).collect();
    // (start, end, depth) ranges of `index` still to sort; all entries agree on their first `depth` bytes
    let mut stack: Vec<(usize, usize, usize)> = vec![(0, n, 0)];

    while let Some((lo, hi, depth)) = stack.pop() {
        if *budget < 0 {
            return None;
        }
        let len = hi - lo;
        if len < 2 || depth >= n {
            continue;
        }

        if len <= INSERTION_LIMIT {
            for i in lo + 1..hi {
                let mut j = i;
                while j > lo
                    && compare_rotations(
                        &doubled,
                        n,
                        index[j - 1] as usize,
                        index[j] as usize,
                        depth,
                        budget,
                    ) == Ordering::Greater
                {
                    index.swap(j - 1, j);
                    j -= 1;
                }
            }
            continue;
        }

        let byte_at = |pos: u32| doubled[pos as usize + depth];
        let pivot = median_of_three(
            byte_at(index[lo]),
            byte_at(index[lo + len / 2]),
            byte_at(index[hi - 1]),
        );

        // Dijkstra three way partition on the byte at `depth`
        let (mut lt, mut i, mut gt) = (lo, lo, hi);
        while i < gt {
            match byte_at(index[i]).cmp(&pivot) {
                Ordering::Less => {
                    index.swap(lt, i);
                    lt += 1;
                    i += 1;
                }
                Ordering::Greater => {
                    gt -= 1;
                    index.swap(i, gt);
                }
                Ordering::Equal => i += 1,
            }
        }
        *budget -= len as i64;

        stack.push((lo, lt, depth));
        stack.push((gt, hi, depth));
        stack.push((lt, gt, depth + 1));
    }
    if *budget < 0 {
        return None;
    }
    Some(index)
}

fn median_of_three(a: u8, b: u8, c: u8) -> u8 {
    if a < b {
        if b < c {
            b
        } else if a < c {
            c
        } else {
            a
        }
    } else if a < c {
        a
    } else if b < c {
        c
    } else {
        b
    }
}

/// Check the key against the block before inverting.
fn check_key(key: u32, len: usize, block: u32) -> Result<()> {
    if len == 0 {
        return Err(Bz2Error::corrupt(block, "empty block"));
    }
    if key as usize >= len {
        return Err(Bz2Error::corrupt(
            block,
            format!("primary index {} out of range for {} bytes", key, len),
        ));
    }
    Ok(())
}

/// Decode a Burrows-Wheeler-Transform.
pub fn bwt_decode(key: u32, bwt_in: &[u8], block: u32) -> Result<Vec<u8>> {
    let end = bwt_in.len();
    check_key(key, end, block)?;

    // Cumulative count: where each byte's rows start in the sorted first column
    let mut cum = cumulative(&freqs(bwt_in));

    // Build the transformation vector to find the next character in the original data
    let mut t_vec = vec![0_u32; end];
    for (i, &s) in bwt_in.iter().enumerate() {
        t_vec[cum[s as usize] as usize] = i as u32;
        cum[s as usize] += 1
    }

    // Walk the cycle from the key
    let mut out = Vec::with_capacity(end);
    let mut pos = t_vec[key as usize] as usize;
    for _ in 0..end {
        out.push(bwt_in[pos]);
        pos = t_vec[pos] as usize;
    }
    Ok(out)
}

/// 20 bit indices stored as a 16 bit low half plus a 4 bit high nibble, 2.5 bytes per entry.
struct PackedIndices {
    low: Vec<u16>,
    high: Vec<u8>,
}

impl PackedIndices {
    fn new(len: usize) -> Self {
        Self {
            low: vec![0; len],
            high: vec![0; (len + 1) / 2],
        }
    }

    fn set(&mut self, i: usize, value: u32) {
        self.low[i] = value as u16;
        let shift = (i & 1) << 2;
        let nibble = ((value >> 16) & 0xf) as u8;
        self.high[i >> 1] = (self.high[i >> 1] & !(0xf << shift)) | (nibble << shift);
    }

    fn get(&self, i: usize) -> u32 {
        let shift = (i & 1) << 2;
        let nibble = (self.high[i >> 1] >> shift) & 0xf;
        self.low[i] as u32 | (nibble as u32) << 16
    }
}

/// Decode a Burrows-Wheeler-Transform with less memory: the next-row table is packed into
/// 20 bit entries, and each output byte is found by searching the cumulative counts instead of
/// indexing the BWT data. Slower, but uses 2.5 bytes per block byte.
pub fn bwt_decode_small(key: u32, bwt_in: &[u8], block: u32) -> Result<Vec<u8>> {
    let end = bwt_in.len();
    check_key(key, end, block)?;
    if end > 1 << 20 {
        return Err(Bz2Error::corrupt(block, "block too large for small mode"));
    }

    let cum = cumulative(&freqs(bwt_in));
    let mut next = cum;
    let mut t_vec = PackedIndices::new(end);
    for (i, &s) in bwt_in.iter().enumerate() {
        t_vec.set(next[s as usize] as usize, i as u32);
        next[s as usize] += 1;
    }

    // Row `pos` of the sorted rotations starts with the byte whose bucket holds `pos`
    let first_column = |pos: u32| -> u8 { (cum.partition_point(|&c| c <= pos) - 1) as u8 };

    let mut out = Vec::with_capacity(end);
    let mut pos = key;
    for _ in 0..end {
        out.push(first_column(pos));
        pos = t_vec.get(pos as usize);
    }
    Ok(out)
}
