//! The bzip2 symbol map.
//!
//! Only the byte values that occur in a block are given MTF slots. Which ones occur is sent as a
//! two level bitmap: one 16 bit word marking which groups of 16 byte values are in use, then one
//! 16 bit word per used group marking the individual values.
const BIT_MASK: u16 = 0x8000;

/// Takes a table of which u8s occur in the BWT output and returns the bzip2 symbol map
/// (the group word followed by the word of each used group).
pub fn encode_sym_map_from_bool_map(symbols: &[bool; 256]) -> Vec<u16> {
    let mut sym_maps: Vec<u16> = vec![0; 17]; // Index and 16 maps

    // Byte value idx lives in group idx >> 4, at bit idx & 15 of that group's word.
    symbols.iter().enumerate().for_each(|(idx, &sym)| {
        if sym {
            sym_maps[0] |= BIT_MASK >> (idx >> 4);
            sym_maps[1 + (idx >> 4)] |= BIT_MASK >> (idx & 15)
        }
    });
    for map in &sym_maps {
        log::trace!("{:0>16b}", map);
    }

    // The group word always stays (even if empty); keep only the groups that have bits set.
    let groups = sym_maps[0];
    let mut out = Vec::with_capacity(17);
    out.push(groups);
    out.extend(
        sym_maps[1..]
            .iter()
            .enumerate()
            .filter(|(group, _)| groups & (BIT_MASK >> group) != 0)
            .map(|(_, &map)| map),
    );
    out
}

/// Takes the unique bzip2 symbol map and returns a sorted vec of all
/// u8s used in the input.
pub fn decode_sym_map(symbol_map: &[u16]) -> Vec<u8> {
    let mut symbols: Vec<u8> = Vec::with_capacity(256);
    // Set a counter for the number of maps
    let mut map_idx = 0;

    for block in 0..16 {
        // Check the index to see if the next bit has a block of bytes
        if (symbol_map[0] & (BIT_MASK >> block)) > 0 {
            map_idx += 1;
            let Some(&map) = symbol_map.get(map_idx) else {
                break;
            };
            // Within that u16, iterate to find which bytes were present
            for byte_idx in 0..16_u8 {
                if (map & (BIT_MASK >> byte_idx)) > 0 {
                    // (block * 16 + byte_idx = u8 value we found)
                    symbols.push((block << 4) + byte_idx);
                };
            }
        }
    }
    symbols
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn decode_symbol_map_test() {
        let maps = vec![11008, 32770, 4, 17754, 6208];
        let mut compare = "Making a silly test.".as_bytes().to_vec();
        compare.sort_unstable();
        compare.dedup();
        assert_eq!(compare, decode_sym_map(&maps));
    }

    #[test]
    fn decode_symbol_map_full_test() {
        let maps = vec![0xffff; 17];
        let compare = (0..=255).collect::<Vec<u8>>();
        assert_eq!(compare, decode_sym_map(&maps));
    }

    #[test]
    fn encode_matches_known_map() {
        let mut used = [false; 256];
        for &b in "Making a silly test.".as_bytes() {
            used[b as usize] = true;
        }
        assert_eq!(
            encode_sym_map_from_bool_map(&used),
            vec![11008, 32770, 4, 17754, 6208]
        );
    }

    #[test]
    fn encode_then_decode_sparse() {
        let mut used = [false; 256];
        for b in [0_u8, 15, 16, 200, 255] {
            used[b as usize] = true;
        }
        let map = encode_sym_map_from_bool_map(&used);
        // groups 0, 1, 12 and 15
        assert_eq!(map.len(), 1 + 4);
        assert_eq!(decode_sym_map(&map), vec![0, 15, 16, 200, 255]);
    }
}
