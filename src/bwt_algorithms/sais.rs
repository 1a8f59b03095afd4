//! SA-IS suffix array construction (Nong, Zhang and Chan), linear time in the input length.
//!
//! This is the guaranteed path of the BWT. It sorts plain suffixes, not rotations, so the BWT
//! builder runs it over the block written out twice and keeps the suffixes that start in the
//! first copy.
//!
//! Values in the suffix array are stored one-based while inducing, so 0 can mean "empty".

/// Below this length a plain comparison sort is faster than inducing.
const THRESHOLD_NAIVE: usize = 10;

/// Suffix array of a byte string.
pub fn suffix_array(data: &[u8]) -> Vec<usize> {
    let s: Vec<usize> = data.iter().map(|&b| b as usize).collect();
    sa_is(&s, 255)
}

fn sa_naive(s: &[usize]) -> Vec<usize> {
    let mut sa: Vec<usize> = (0..s.len()).collect();
    sa.sort_by(|&a, &b| s[a..].cmp(&s[b..]));
    sa
}

/// Suffix array of `s`, every element of which is <= `upper`.
fn sa_is(s: &[usize], upper: usize) -> Vec<usize> {
    let n = s.len();
    match n {
        0 => return vec![],
        1 => return vec![0],
        2 => return if s[0] < s[1] { vec![0, 1] } else { vec![1, 0] },
        _ => (),
    }
    if n < THRESHOLD_NAIVE {
        return sa_naive(s);
    }

    // ls[i] is true for S-type suffixes (smaller than the suffix that follows)
    let mut ls = vec![false; n];
    for i in (0..n - 1).rev() {
        ls[i] = if s[i] == s[i + 1] {
            ls[i + 1]
        } else {
            s[i] < s[i + 1]
        };
    }

    // Bucket starts: sum_l[c] is where the L-type suffixes of c begin, sum_s[c] the S-type ones.
    let mut sum_l = vec![0; upper + 1];
    let mut sum_s = vec![0; upper + 1];
    for i in 0..n {
        if !ls[i] {
            sum_s[s[i]] += 1;
        } else {
            sum_l[s[i] + 1] += 1;
        }
    }
    for i in 0..=upper {
        sum_s[i] += sum_l[i];
        if i < upper {
            sum_l[i + 1] += sum_s[i];
        }
    }

    let induce = |sa: &mut [usize], lms: &[usize]| {
        sa.iter_mut().for_each(|elem| *elem = 0);
        let mut buf = sum_s.clone();
        for &d in lms {
            if d == n {
                continue;
            }
            let old = buf[s[d]];
            buf[s[d]] += 1;
            sa[old] = d + 1;
        }
        // L-type pass, left to right
        buf.copy_from_slice(&sum_l);
        let old = buf[s[n - 1]];
        buf[s[n - 1]] += 1;
        sa[old] = n;
        for i in 0..n {
            let v = sa[i];
            if v >= 2 && !ls[v - 2] {
                let old = buf[s[v - 2]];
                buf[s[v - 2]] += 1;
                sa[old] = v - 1;
            }
        }
        // S-type pass, right to left
        buf.copy_from_slice(&sum_l);
        for i in (0..n).rev() {
            let v = sa[i];
            if v >= 2 && ls[v - 2] {
                buf[s[v - 2] + 1] -= 1;
                sa[buf[s[v - 2] + 1]] = v - 1;
            }
        }
    };

    // lms_map[i] is the one-based rank of LMS position i in text order, 0 if not LMS
    let mut lms_map = vec![0; n + 1];
    let mut lms = Vec::new();
    for i in 1..n {
        if !ls[i - 1] && ls[i] {
            lms.push(i);
            lms_map[i] = lms.len();
        }
    }
    let m = lms.len();

    let mut sa = vec![0; n];
    induce(&mut sa, &lms);

    if m > 0 {
        let mut sorted_lms = Vec::with_capacity(m);
        for &v in &sa {
            if lms_map[v - 1] != 0 {
                sorted_lms.push(v - 1);
            }
        }
        // Name the LMS substrings, equal substrings getting equal names
        let mut rec_s = vec![0; m];
        let mut rec_upper = 0;
        rec_s[lms_map[sorted_lms[0]] - 1] = 0;
        for i in 1..m {
            let mut l = sorted_lms[i - 1];
            let mut r = sorted_lms[i];
            let end_l = if lms_map[l] < m { lms[lms_map[l]] } else { n };
            let end_r = if lms_map[r] < m { lms[lms_map[r]] } else { n };
            let same = if end_l - l != end_r - r {
                false
            } else {
                while l < end_l {
                    if s[l] != s[r] {
                        break;
                    }
                    l += 1;
                    r += 1;
                }
                l != n && s[l] == s[r]
            };
            if !same {
                rec_upper += 1;
            }
            rec_s[lms_map[sorted_lms[i]] - 1] = rec_upper;
        }

        let rec_sa = sa_is(&rec_s, rec_upper);
        for (i, &r) in rec_sa.iter().enumerate() {
            sorted_lms[i] = lms[r];
        }
        induce(&mut sa, &sorted_lms);
    }
    sa.iter_mut().for_each(|elem| *elem -= 1);
    sa
}

#[cfg(test)]
mod test {
    use super::*;

    fn naive(data: &[u8]) -> Vec<usize> {
        let mut sa: Vec<usize> = (0..data.len()).collect();
        sa.sort_by(|&a, &b| data[a..].cmp(&data[b..]));
        sa
    }

    #[test]
    fn banana() {
        assert_eq!(suffix_array(b"banana"), vec![5, 3, 1, 0, 4, 2]);
    }

    #[test]
    fn matches_naive_on_mixed_inputs() {
        let inputs: Vec<Vec<u8>> = vec![
            b"mississippi".to_vec(),
            b"abracadabra abracadabra abracadabra".to_vec(),
            vec![b'a'; 100],
            b"ab".repeat(77),
            b"aab".repeat(40),
            (0..=255_u8).rev().collect(),
            {
                // xorshift noise over a small alphabet
                let mut x = 0x2545_f491_u32;
                (0..3000)
                    .map(|_| {
                        x ^= x << 13;
                        x ^= x >> 17;
                        x ^= x << 5;
                        b"acgt"[(x % 4) as usize]
                    })
                    .collect()
            },
        ];
        for input in inputs {
            assert_eq!(suffix_array(&input), naive(&input), "input {:?}", input);
        }
    }

    #[test]
    fn rle1_shaped_runs() {
        // What a long run of zeros looks like after RLE1
        let input = [0_u8, 0, 0, 0, 251].repeat(500);
        assert_eq!(suffix_array(&input), naive(&input));
        let doubled = [input.as_slice(), input.as_slice()].concat();
        assert_eq!(suffix_array(&doubled), naive(&doubled));
    }

    #[test]
    fn tiny_inputs() {
        assert!(suffix_array(&[]).is_empty());
        assert_eq!(suffix_array(&[7]), vec![0]);
        assert_eq!(suffix_array(&[7, 3]), vec![1, 0]);
        assert_eq!(suffix_array(&[3, 3]), vec![1, 0]);
    }
}
