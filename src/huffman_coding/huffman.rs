use log::trace;

use crate::bitstream::bitpacker::BitPacker;

use super::huffman_code_from_weights::{assign_codes, improve_code_len_from_weights, MAX_CODE_LEN};
use crate::tools::rle2_mtf::{Rle2Block, MAX_ALPHA_SIZE};

/// Number of symbols coded with one table before the next selector applies.
pub const GROUP_SIZE: usize = 50;
/// Table refinement passes (Julian used 4).
const ITERATIONS: usize = 4;
/// Initial cost of a symbol inside / outside a table's share of the alphabet.
const LESSER_ICOST: u32 = 0;
const GREATER_ICOST: u32 = 15;

/// Table count for a block of `symbol_count` MTF/RLE2 symbols.
fn table_count_for(symbol_count: usize) -> usize {
    // We can have 2-6 coding tables depending on how much data we have coming in.
    match symbol_count {
        0..=199 => 2,
        200..=599 => 3,
        600..=1199 => 4,
        1200..=2399 => 5,
        _ => 6,
    }
}

/// Give each table a contiguous slice of the alphabet holding roughly an equal share of the
/// symbol frequencies. Symbols inside a table's slice start cheap, the rest expensive.
fn init_tables(
    freqs: &[u32; MAX_ALPHA_SIZE],
    table_count: usize,
    alpha_size: usize,
    symbol_count: usize,
) -> Vec<[u32; MAX_ALPHA_SIZE]> {
    let mut tables = vec![[GREATER_ICOST; MAX_ALPHA_SIZE]; table_count];

    let mut n_part = table_count;
    let mut rem_f = symbol_count as i64;
    let mut gs: i64 = 0;
    while n_part > 0 {
        let t_freq = rem_f / n_part as i64;
        let mut ge = gs - 1;
        let mut a_freq: i64 = 0;
        while a_freq < t_freq && ge < alpha_size as i64 - 1 {
            ge += 1;
            a_freq += freqs[ge as usize] as i64;
        }
        // Alternate tables stop just short of their share so later tables are not starved.
        if ge > gs && n_part != table_count && n_part != 1 && (table_count - n_part) % 2 == 1 {
            a_freq -= freqs[ge as usize] as i64;
            ge -= 1;
        }
        trace!(
            "initial group {}, [{} .. {}], has {} syms ({:4.1}%)",
            n_part,
            gs,
            ge,
            a_freq,
            (100.0 * a_freq as f64) / (symbol_count.max(1) as f64)
        );
        for (v, cost) in tables[n_part - 1].iter_mut().enumerate().take(alpha_size) {
            let v = v as i64;
            *cost = if v >= gs && v <= ge {
                LESSER_ICOST
            } else {
                GREATER_ICOST
            };
        }
        n_part -= 1;
        gs = ge + 1;
        rem_f -= a_freq;
    }
    tables
}

/// Move-to-front transform of the selector list.
fn mtf_selectors(selectors: &[usize], table_count: usize) -> Vec<usize> {
    let mut table_idx: Vec<usize> = (0..table_count).collect();
    selectors
        .iter()
        .map(|&sel| {
            let idx = table_idx.iter().position(|&t| t == sel).unwrap_or(0);
            table_idx[..=idx].rotate_right(1);
            idx
        })
        .collect()
}

#[allow(clippy::unusual_byte_groupings)]
/// Encode MTF/RLE2 data using Julian's multi-table system, starting with the symbol map.
/// Writes the symbol map, table count, selectors, delta coded code lengths and the coded symbols.
pub fn huf_encode(bw: &mut BitPacker, block: &Rle2Block) {
    let symbols = &block.symbols;
    let alpha_size = block.eob as usize + 1;
    let table_count = table_count_for(symbols.len());

    let mut tables = init_tables(&block.freqs, table_count, alpha_size, symbols.len());

    let selector_count = symbols.chunks(GROUP_SIZE).count();
    let mut selectors = vec![0_usize; selector_count];

    /*
     Each symbol in each table is now either a 0 or a 15. We move through the input 50 symbols
     at a time, find the table with the lowest cost for each group, and collect the symbol
     frequencies each table was chosen for. Those frequencies build the next set of lengths.
    */
    for iter in 0..ITERATIONS {
        // For reporting only
        let mut favorites = [0; 6];
        let mut total_cost = 0;

        // "recalculated" frequency array for each table (for adjusting the tables)
        let mut rfreq = vec![[0u32; MAX_ALPHA_SIZE]; table_count];

        for (i, chunk) in symbols.chunks(GROUP_SIZE).enumerate() {
            let mut cost = [0_u32; 6];
            chunk.iter().for_each(|&symbol| {
                (0..table_count).for_each(|t| cost[t] += tables[t][symbol as usize])
            });

            // Get the position of the lowest cost (the first if several have the same low cost)
            let mut bt = 0;
            for t in 1..table_count {
                if cost[t] < cost[bt] {
                    bt = t;
                }
            }
            total_cost += cost[bt];
            favorites[bt] += 1;
            selectors[i] = bt;

            chunk
                .iter()
                .for_each(|&symbol| rfreq[bt][symbol as usize] += 1);
        }

        trace!(
            " pass {}: size is {}, grp uses are {:?}",
            iter + 1,
            total_cost / 8,
            &favorites[..table_count]
        );

        // Rebuild every table's lengths from the frequencies it was chosen for.
        for (table, freqs) in tables.iter_mut().zip(rfreq.iter()) {
            improve_code_len_from_weights(table, freqs, alpha_size, MAX_CODE_LEN);
        }
    }

    // Write out the the symbol maps, 16 bit L1 + 0-16 words of 16 bit L2 maps.
    trace!("Symbol maps written at {}.", bw.loc());
    for word in &block.sym_map {
        bw.out16(*word);
    }

    // Symbol maps are followed by a 3 bit number of Huffman trees that exist
    bw.out24((3 << 24) | table_count as u32);

    // Then a 15 bit number indicating the how many selectors are used
    bw.out24((15 << 24) | selector_count as u32);

    // The selectors are written after a Move-To-Front transform, in unary (n ones then a zero).
    trace!("{} Selectors written at {}.", selector_count, bw.loc());
    for selector in mtf_selectors(&selectors, table_count) {
        bw.write_bits(selector as u8 + 1, ((1_u32 << selector) - 1) << 1);
    }

    /*
    Next we write out the code lengths that will be used in the decompression.
    They start with an "origin" length of five bits taken from the first symbol.

    Each symbol's length (INCLUDING THE FIRST SYMBOL) is written as the delta
    from the last symbol: 10 for +1, 11 for -1, as many as needed, then a single 0 bit.
    */
    let mut code_tables = Vec::with_capacity(table_count);
    for (t, table) in tables.iter().enumerate() {
        let lengths = &table[..alpha_size];
        let mut origin = lengths[0];
        trace!("Writing origin {} for huffman map {} at {}.", origin, t, bw.loc());
        bw.out24((5 << 24) | origin);
        for &len in lengths {
            while origin < len {
                bw.out24(0x02_000002);
                origin += 1;
            }
            while origin > len {
                bw.out24(0x02_000003);
                origin -= 1;
            }
            bw.out24(0x01_000000);
        }
        code_tables.push(assign_codes(lengths));
    }

    // Now encode and write the data, switching tables every 50 symbols.
    trace!("Huffman data starts at {}.", bw.loc());
    for (chunk, &table_idx) in symbols.chunks(GROUP_SIZE).zip(selectors.iter()) {
        let codes = &code_tables[table_idx];
        chunk
            .iter()
            .for_each(|&symbol| bw.out24(codes[symbol as usize]));
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::tools::rle2_mtf::rle2_mtf_encode;

    #[test]
    fn table_counts() {
        assert_eq!(table_count_for(1), 2);
        assert_eq!(table_count_for(199), 2);
        assert_eq!(table_count_for(200), 3);
        assert_eq!(table_count_for(1199), 4);
        assert_eq!(table_count_for(2399), 5);
        assert_eq!(table_count_for(2400), 6);
    }

    #[test]
    fn initial_tables_split_the_alphabet() {
        let mut freqs = [0_u32; MAX_ALPHA_SIZE];
        freqs[..6].copy_from_slice(&[40, 30, 10, 10, 5, 5]);
        let tables = init_tables(&freqs, 2, 6, 100);
        // The last table takes the first half of the frequency mass
        assert_eq!(&tables[1][..6], &[0, 0, 15, 15, 15, 15]);
        assert_eq!(&tables[0][..6], &[15, 15, 0, 0, 0, 0]);
    }

    #[test]
    fn selector_mtf() {
        assert_eq!(
            mtf_selectors(&[0, 0, 2, 2, 1, 0], 3),
            vec![0, 0, 2, 0, 2, 2]
        );
    }

    #[test]
    fn encoder_output_is_deterministic() {
        let data = b"If Peter Piper picked a peck of pickled peppers".repeat(40);
        let block = rle2_mtf_encode(&data);
        let mut a = BitPacker::new(1000);
        let mut b = BitPacker::new(1000);
        huf_encode(&mut a, &block);
        huf_encode(&mut b, &block);
        a.flush();
        b.flush();
        assert_eq!(a.output, b.output);
        assert!(!a.output.is_empty());
    }
}
