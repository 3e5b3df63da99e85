// src/hand_parser.rs

use crate::hand::HandState;
use crate::tiles::{Suit, Tile, NUM_KINDS};

/// Type of a group in a standard hand.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Ord, PartialOrd)]
pub enum ParsedGroupType {
    Run,
    Triplet,
}

/// One group found by the search. Slots filled by a wild tile carry `is_wild = true`
/// and show the tile the wild stands in for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParsedGroup {
    pub group_type: ParsedGroupType,
    pub tiles: [Tile; 3],
    pub wilds_used: u8,
}

/// One pair plus the groups covering the rest of the concealed tiles.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedStandardHand {
    /// `None` when both pair tiles are wild.
    pub pair: Option<Tile>,
    pub pair_wilds: u8,
    pub groups: Vec<ParsedGroup>,
}

impl ParsedStandardHand {
    pub fn wilds_used(&self) -> u8 {
        self.pair_wilds + self.groups.iter().map(|g| g.wilds_used).sum::<u8>()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedSevenPairs {
    /// Natural tile of each pair that has one, sorted. Pure-wild pairs are not listed.
    pub pair_tiles: Vec<Tile>,
    pub wilds_used: u8,
}

fn tile_at(idx: usize) -> Option<Tile> {
    Tile::try_from(idx as u8).ok()
}

fn total(counts: &[u8; NUM_KINDS]) -> u32 {
    counts.iter().map(|&c| u32::from(c)).sum()
}

/// Finds the first pair + `need_groups` groups cover of `counts` plus `wilds` wild tiles.
///
/// Pair candidates are tried per natural tile in index order (two naturals, then one
/// natural and one wild), then a pair of two wilds.
pub fn parse_standard_hand(counts: &[u8; NUM_KINDS], wilds: u8, need_groups: u8) -> Option<ParsedStandardHand> {
    search_with_pair(counts, wilds, need_groups, false)
}

/// Same cover as [`parse_standard_hand`] with runs disallowed.
pub fn parse_all_triplets(counts: &[u8; NUM_KINDS], wilds: u8, need_groups: u8) -> Option<ParsedStandardHand> {
    search_with_pair(counts, wilds, need_groups, true)
}

fn search_with_pair(
    initial_counts: &[u8; NUM_KINDS],
    wilds: u8,
    need_groups: u8,
    triplets_only: bool,
) -> Option<ParsedStandardHand> {
    if total(initial_counts) + u32::from(wilds) != 3 * u32::from(need_groups) + 2 {
        return None;
    }

    let mut counts = *initial_counts;

    for pair_idx in 0..NUM_KINDS {
        if counts[pair_idx] == 0 {
            continue;
        }
        let pair_tile = tile_at(pair_idx)?;
        for pair_wilds in 0..=1u8 {
            let naturals = 2 - pair_wilds;
            if counts[pair_idx] < naturals || wilds < pair_wilds {
                continue;
            }
            counts[pair_idx] -= naturals;
            if let Some(groups) = find_groups_recursive(&mut counts, wilds - pair_wilds, need_groups, triplets_only) {
                return Some(ParsedStandardHand { pair: Some(pair_tile), pair_wilds, groups });
            }
            counts[pair_idx] += naturals; // backtrack
        }
    }

    if wilds >= 2 {
        if let Some(groups) = find_groups_recursive(&mut counts, wilds - 2, need_groups, triplets_only) {
            return Some(ParsedStandardHand { pair: None, pair_wilds: 2, groups });
        }
    }
    None
}

fn find_groups_recursive(
    counts: &mut [u8; NUM_KINDS],
    wilds: u8,
    groups_to_find: u8,
    triplets_only: bool,
) -> Option<Vec<ParsedGroup>> {
    if groups_to_find == 0 {
        return (wilds == 0 && counts.iter().all(|&c| c == 0)).then(Vec::new);
    }

    let start_idx = match counts.iter().position(|&c| c > 0) {
        Some(idx) => idx,
        None => {
            // only wilds left: each remaining group is three of them
            if u32::from(wilds) != 3 * u32::from(groups_to_find) {
                return None;
            }
            let filler = Tile::wind(1).with_wild(true);
            return Some(
                (0..groups_to_find)
                    .map(|_| ParsedGroup { group_type: ParsedGroupType::Triplet, tiles: [filler; 3], wilds_used: 3 })
                    .collect(),
            );
        }
    };
    let lowest = tile_at(start_idx)?;

    // 1. Triplets, most naturals first
    for naturals in (1..=3u8).rev() {
        let need_wild = 3 - naturals;
        if counts[start_idx] < naturals || wilds < need_wild {
            continue;
        }
        counts[start_idx] -= naturals;
        if let Some(mut rest) = find_groups_recursive(counts, wilds - need_wild, groups_to_find - 1, triplets_only) {
            let mut tiles = [lowest; 3];
            for slot in tiles.iter_mut().skip(naturals as usize) {
                slot.is_wild = true;
            }
            rest.push(ParsedGroup { group_type: ParsedGroupType::Triplet, tiles, wilds_used: need_wild });
            return Some(rest);
        }
        counts[start_idx] += naturals; // backtrack
    }

    if triplets_only || !lowest.is_number() {
        return None;
    }

    // 2. Runs through the lowest tile. Slots below it can only be wild.
    let rank = lowest.rank;
    for start_rank in (rank.saturating_sub(2).max(1)..=rank).rev() {
        if start_rank + 2 > 9 {
            continue;
        }
        let others: Vec<u8> = (start_rank..start_rank + 3).filter(|&r| r != rank).collect();
        for wild_mask in 0..4u8 {
            let slot_is_wild = |k: usize| wild_mask & (1 << k) != 0;
            let mut need_wild = 0u8;
            let mut feasible = true;
            for (k, &r) in others.iter().enumerate() {
                let idx = start_idx + r as usize - rank as usize;
                if slot_is_wild(k) {
                    need_wild += 1;
                } else if r < rank || counts[idx] == 0 {
                    feasible = false;
                }
            }
            if !feasible || need_wild > wilds {
                continue;
            }

            counts[start_idx] -= 1;
            for (k, &r) in others.iter().enumerate() {
                if !slot_is_wild(k) {
                    counts[start_idx + r as usize - rank as usize] -= 1;
                }
            }

            let found = find_groups_recursive(counts, wilds - need_wild, groups_to_find - 1, triplets_only);

            counts[start_idx] += 1;
            for (k, &r) in others.iter().enumerate() {
                if !slot_is_wild(k) {
                    counts[start_idx + r as usize - rank as usize] += 1;
                }
            }

            if let Some(mut rest) = found {
                let mut tiles = [lowest; 3];
                let mut k = 0;
                for (slot, r) in tiles.iter_mut().zip(start_rank..start_rank + 3) {
                    *slot = Tile { suit: lowest.suit, rank: r, is_wild: false };
                    if r != rank {
                        slot.is_wild = slot_is_wild(k);
                        k += 1;
                    }
                }
                rest.push(ParsedGroup { group_type: ParsedGroupType::Run, tiles, wilds_used: need_wild });
                return Some(rest);
            }
        }
    }
    None
}

/// Seven pairs over exactly 14 concealed tiles. A quad counts as two pairs; each odd
/// natural count takes one wild; leftover wilds pair with each other.
pub fn parse_seven_pairs(counts: &[u8; NUM_KINDS], wilds: u8) -> Option<ParsedSevenPairs> {
    if total(counts) + u32::from(wilds) != 14 {
        return None;
    }

    let mut pairs = 0u32;
    let mut wilds_left = wilds;
    let mut pair_tiles = Vec::with_capacity(7);

    for (idx, &c) in counts.iter().enumerate() {
        if c == 0 {
            continue;
        }
        let tile = tile_at(idx)?;
        let mut n = u32::from(c / 2);
        if c % 2 == 1 {
            if wilds_left == 0 {
                return None;
            }
            wilds_left -= 1;
            n += 1;
        }
        pairs += n;
        pair_tiles.extend(std::iter::repeat(tile).take(n as usize));
    }
    if wilds_left % 2 != 0 {
        return None;
    }
    pairs += u32::from(wilds_left / 2);

    (pairs == 7).then(|| ParsedSevenPairs { pair_tiles, wilds_used: wilds - wilds_left })
}

/// Groups still needed from the concealed tiles: four minus the declared melds.
pub fn groups_needed(hand: &HandState) -> Option<u8> {
    4u8.checked_sub(u8::try_from(hand.melds.len()).ok()?)
}

/// Standard-shape win check on a seat's concealed tiles. Flowers in hand never fit.
pub fn decompose(hand: &HandState) -> Option<ParsedStandardHand> {
    let need = groups_needed(hand)?;
    let wilds = u8::try_from(hand.wild_count()).ok()?;
    if hand.has_flower() {
        return None;
    }
    parse_standard_hand(&hand.natural_counts(), wilds, need)
}

/// Seven pairs check: no melds and all 14 tiles concealed.
pub fn decompose_seven_pairs(hand: &HandState) -> Option<ParsedSevenPairs> {
    if !hand.melds.is_empty() || hand.has_flower() {
        return None;
    }
    let wilds = u8::try_from(hand.wild_count()).ok()?;
    parse_seven_pairs(&hand.natural_counts(), wilds)
}

pub fn decompose_all_triplets(hand: &HandState) -> Option<ParsedStandardHand> {
    let need = groups_needed(hand)?;
    let wilds = u8::try_from(hand.wild_count()).ok()?;
    if hand.has_flower() {
        return None;
    }
    parse_all_triplets(&hand.natural_counts(), wilds, need)
}

/// Any winning shape at all.
pub fn can_win(hand: &HandState) -> bool {
    decompose(hand).is_some() || decompose_seven_pairs(hand).is_some()
}

/// All number suits present among natural tiles of the given slice.
pub(crate) fn number_suits<'a>(tiles: impl Iterator<Item = &'a Tile>) -> Vec<Suit> {
    let mut suits: Vec<Suit> = tiles.filter(|t| !t.is_wild && t.is_number()).map(|t| t.suit).collect();
    suits.sort();
    suits.dedup();
    suits
}

#[cfg(test)]
mod tests {
    use super::*;

    fn get_counts(tiles: &[Tile]) -> [u8; NUM_KINDS] {
        let mut counts = [0u8; NUM_KINDS];
        for tile in tiles {
            counts[tile.index().unwrap()] += 1;
        }
        counts
    }

    fn t(code: &str) -> Tile {
        code.parse().unwrap()
    }

    fn tiles(codes: &str) -> Vec<Tile> {
        codes.split_whitespace().map(t).collect()
    }

    #[test]
    fn test_std_parse_triplet_hand() {
        let hand = tiles("1WAN 1WAN 1WAN 2TONG 2TONG 2TONG 3TIAO 3TIAO 3TIAO 4WAN 4WAN 4WAN DONG DONG");
        let parsed = parse_standard_hand(&get_counts(&hand), 0, 4).unwrap();
        assert_eq!(parsed.pair, Some(Tile::wind(1)));
        assert_eq!(parsed.groups.len(), 4);
        assert!(parsed.groups.iter().all(|g| g.group_type == ParsedGroupType::Triplet));
        assert!(parse_all_triplets(&get_counts(&hand), 0, 4).is_some());
    }

    #[test]
    fn test_std_parse_run_hand() {
        let hand = tiles("1WAN 2WAN 3WAN 4TONG 5TONG 6TONG 7TIAO 8TIAO 9TIAO 1TONG 2TONG 3TONG ZHONG ZHONG");
        let counts = get_counts(&hand);
        let parsed = parse_standard_hand(&counts, 0, 4);
        assert!(parsed.is_some(), "run hand should parse. Counts: {:?}", counts);
        assert!(parse_all_triplets(&counts, 0, 4).is_none());
    }

    #[test]
    fn runs_never_cross_suits_or_honors() {
        // 8WAN 9WAN 1TONG is not a run
        let hand = tiles("8WAN 9WAN 1TONG 2TONG 2TONG 2TONG 3TIAO 3TIAO 3TIAO 4WAN 4WAN 4WAN DONG DONG");
        assert!(parse_standard_hand(&get_counts(&hand), 0, 4).is_none());
        let honors = tiles("DONG NAN XI 1WAN 1WAN 1WAN 2WAN 2WAN 2WAN 3WAN 3WAN 3WAN FA FA");
        assert!(parse_standard_hand(&get_counts(&honors), 0, 4).is_none());
    }

    #[test]
    fn two_wilds_complete_a_triplet() {
        // 1WAN triplet reduced to a single natural plus two wilds
        let naturals = tiles("1WAN 2TONG 2TONG 2TONG 3TIAO 3TIAO 3TIAO 4WAN 4WAN 4WAN DONG DONG");
        let parsed = parse_standard_hand(&get_counts(&naturals), 2, 4).unwrap();
        assert_eq!(parsed.wilds_used(), 2);
    }

    #[test]
    fn wild_fills_run_gap() {
        let naturals = tiles("3TIAO 5TIAO 7WAN 8WAN 9WAN 1TONG 1TONG 1TONG 6TONG 7TONG 8TONG BAI BAI");
        let parsed = parse_standard_hand(&get_counts(&naturals), 1, 4).unwrap();
        let run = parsed
            .groups
            .iter()
            .find(|g| g.tiles[0].suit == Suit::Tiao)
            .unwrap();
        assert_eq!(run.group_type, ParsedGroupType::Run);
        assert_eq!(run.tiles[1], Tile::tiao(4));
        assert!(run.tiles[1].is_wild);
    }

    #[test]
    fn wild_pair_and_all_wild_group() {
        // nine naturals, five wilds: every wild must be absorbed somewhere
        let naturals = tiles("1WAN 2WAN 3WAN 4WAN 5WAN 6WAN 7WAN 8WAN 9WAN");
        let parsed = parse_standard_hand(&get_counts(&naturals), 5, 4).unwrap();
        assert_eq!(parsed.wilds_used(), 5);
    }

    #[test]
    fn wrong_tile_total_is_rejected() {
        let hand = tiles("1WAN 1WAN 1WAN DONG DONG");
        assert!(parse_standard_hand(&get_counts(&hand), 0, 4).is_none());
        assert!(parse_standard_hand(&get_counts(&hand), 0, 1).is_some());
    }

    #[test]
    fn test_parse_seven_pairs() {
        let hand = tiles("1WAN 1WAN 9WAN 9WAN 2TONG 2TONG 7TONG 7TONG DONG DONG NAN NAN BAI BAI");
        let parsed = parse_seven_pairs(&get_counts(&hand), 0).unwrap();
        assert_eq!(parsed.pair_tiles.len(), 7);

        // a quad counts as two pairs
        let quad = tiles("1WAN 1WAN 1WAN 1WAN 9WAN 9WAN 2TONG 2TONG 7TONG 7TONG DONG DONG NAN NAN");
        assert!(parse_seven_pairs(&get_counts(&quad), 0).is_some());
    }

    #[test]
    fn six_pairs_singleton_and_wild() {
        let naturals = tiles("1WAN 1WAN 9WAN 9WAN 2TONG 2TONG 7TONG 7TONG DONG DONG NAN NAN BAI");
        let parsed = parse_seven_pairs(&get_counts(&naturals), 1).unwrap();
        assert_eq!(parsed.wilds_used, 1);
        assert!(parse_seven_pairs(&get_counts(&naturals), 0).is_none());
    }

    #[test]
    fn seven_pairs_needs_no_melds() {
        let mut hand = HandState::default();
        for tile in tiles("1WAN 1WAN 9WAN 9WAN 2TONG 2TONG 7TONG 7TONG DONG DONG NAN NAN BAI BAI") {
            hand.add(tile);
        }
        assert!(decompose_seven_pairs(&hand).is_some());
        assert!(can_win(&hand));
        hand.melds.push(crate::hand::Meld::pong(Tile::dragon(1), 2));
        assert!(decompose_seven_pairs(&hand).is_none());
    }

    #[test]
    fn decompose_uses_meld_count() {
        let mut hand = HandState::default();
        for tile in tiles("2TONG 3TONG 4TONG 5TIAO 5TIAO") {
            hand.add(tile);
        }
        for tile in [Tile::wan(1), Tile::wan(5), Tile::dragon(2)] {
            hand.melds.push(crate::hand::Meld::pong(tile, 2));
        }
        assert_eq!(groups_needed(&hand), Some(1));
        assert!(decompose(&hand).is_some());
        assert!(decompose_all_triplets(&hand).is_none());

        hand.add(Tile::flower(1));
        assert!(decompose(&hand).is_none());
    }
}
