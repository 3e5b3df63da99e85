// src/fan_calculation.rs

use serde::{Deserialize, Serialize};

use crate::hand::{HandState, MeldKind};
use crate::hand_parser::{self, number_suits};

/// Special-hand patterns recognised at a win and the fan each is worth.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HuType {
    Normal,
    SingleWaitAfterFourMelds,
    KongReplacement,
    /// Three or more wild tiles held at the win.
    ExtendedWait,
    /// No wild tile held at the win.
    NoWildcard,
    Concealed,
    /// Four wild tiles held; wins on its own and is the only type reported.
    FourWildcards,
    SingleSuit,
    AllTriplets,
    SevenPairs,
    SelfDraw,
}

impl HuType {
    pub fn fan(self) -> u32 {
        match self {
            HuType::Normal => 1,
            HuType::SingleWaitAfterFourMelds => 2,
            HuType::KongReplacement => 2,
            HuType::ExtendedWait => 3,
            HuType::NoWildcard => 2,
            HuType::Concealed => 2,
            HuType::FourWildcards => 4,
            HuType::SingleSuit => 3,
            HuType::AllTriplets => 2,
            HuType::SevenPairs => 3,
            HuType::SelfDraw => 1,
        }
    }
}

pub fn total_fan(types: &[HuType]) -> u32 {
    types.iter().map(|t| t.fan()).sum()
}

/// What the classifiers need to know about the winning seat.
#[derive(Debug, Clone, Copy)]
pub struct FanCalculationInput<'a> {
    pub hand: &'a HandState,
    /// The winning tile came from a kong replacement draw.
    pub after_kong: bool,
}

pub fn is_single_wait_after_four_melds(input: &FanCalculationInput) -> bool {
    input.hand.melds.len() == 4 && input.hand.concealed.len() == 2
}

pub fn is_kong_replacement(input: &FanCalculationInput) -> bool {
    input.after_kong
}

/// No melds, or only concealed kongs.
pub fn is_concealed(input: &FanCalculationInput) -> bool {
    input.hand.melds.iter().all(|m| m.kind == MeldKind::ConcealedKong)
}

/// Every natural, non-flower tile in hand and melds is from one number suit.
pub fn is_single_suit(input: &FanCalculationInput) -> bool {
    let hand = input.hand;
    let tiles = hand
        .concealed
        .iter()
        .chain(hand.melds.iter().flat_map(|m| m.tiles.iter()))
        .filter(|t| !t.is_wild && !t.is_flower());
    let mut any_honor = false;
    let mut seen = Vec::new();
    for t in tiles {
        if t.is_honor() {
            any_honor = true;
        }
        seen.push(*t);
    }
    !any_honor && number_suits(seen.iter()).len() == 1
}

pub fn is_all_triplets(input: &FanCalculationInput) -> bool {
    let hand = input.hand;
    hand.melds.iter().all(|m| m.kind != MeldKind::Chi) && hand_parser::decompose_all_triplets(hand).is_some()
}

pub fn is_seven_pairs(input: &FanCalculationInput) -> bool {
    hand_parser::decompose_seven_pairs(input.hand).is_some()
}

pub fn is_four_wildcards(input: &FanCalculationInput) -> bool {
    input.hand.wild_count() >= 4
}

pub fn is_extended_wait(input: &FanCalculationInput) -> bool {
    input.hand.wild_count() >= 3
}

pub fn is_no_wildcard(input: &FanCalculationInput) -> bool {
    input.hand.wild_count() == 0
}

/// Hu types shared by both rulesets, in reporting order. `Normal` always leads and
/// `SelfDraw` always closes.
pub fn classify_common(input: &FanCalculationInput, wildcard_types: &[HuType]) -> Vec<HuType> {
    let mut types = vec![HuType::Normal];
    types.extend_from_slice(wildcard_types);

    let checks: [(HuType, fn(&FanCalculationInput) -> bool); 6] = [
        (HuType::SingleWaitAfterFourMelds, is_single_wait_after_four_melds),
        (HuType::KongReplacement, is_kong_replacement),
        (HuType::Concealed, is_concealed),
        (HuType::SingleSuit, is_single_suit),
        (HuType::AllTriplets, is_all_triplets),
        (HuType::SevenPairs, is_seven_pairs),
    ];
    for (hu_type, check) in checks {
        if check(input) {
            types.push(hu_type);
        }
    }

    types.push(HuType::SelfDraw);
    types
}

/// Wildcard-family classification. Four wilds supersede every other pattern,
/// `SelfDraw` included.
pub fn classify_with_wildcards(input: &FanCalculationInput) -> Vec<HuType> {
    if is_four_wildcards(input) {
        return vec![HuType::FourWildcards];
    }
    let mut wild_types = Vec::new();
    if is_no_wildcard(input) {
        wild_types.push(HuType::NoWildcard);
    }
    if is_extended_wait(input) {
        wild_types.push(HuType::ExtendedWait);
    }
    classify_common(input, &wild_types)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hand::Meld;
    use crate::tiles::Tile;

    fn hand_of(codes: &str) -> HandState {
        let mut hand = HandState::default();
        for code in codes.split_whitespace() {
            hand.add(code.parse().unwrap());
        }
        hand
    }

    fn input(hand: &HandState) -> FanCalculationInput<'_> {
        FanCalculationInput { hand, after_kong: false }
    }

    #[test]
    fn triplet_hand_is_normal_and_all_triplets() {
        let hand = hand_of("1WAN 1WAN 1WAN 2TONG 2TONG 2TONG 3TIAO 3TIAO 3TIAO 4WAN 4WAN 4WAN DONG DONG");
        let types = classify_common(&input(&hand), &[]);
        assert_eq!(types[0], HuType::Normal);
        assert!(types.contains(&HuType::AllTriplets));
        assert!(types.contains(&HuType::Concealed));
        assert!(!types.contains(&HuType::SingleSuit));
        assert_eq!(*types.last().unwrap(), HuType::SelfDraw);
    }

    #[test]
    fn single_suit_ignores_wilds_and_flowers() {
        let mut hand = hand_of("1WAN 2WAN 3WAN 4WAN 5WAN 6WAN 7WAN 8WAN 9WAN 1WAN 1WAN 5WAN 5WAN");
        hand.add(Tile::dragon(1).with_wild(true));
        hand.flowers.push(Tile::flower(3));
        assert!(is_single_suit(&input(&hand)));

        hand.melds.push(Meld::pong(Tile::tong(2), 3));
        assert!(!is_single_suit(&input(&hand)));
    }

    #[test]
    fn honors_break_single_suit() {
        let hand = hand_of("1WAN 2WAN 3WAN 4WAN 5WAN 6WAN 7WAN 8WAN 9WAN 1WAN 1WAN 1WAN DONG DONG");
        assert!(!is_single_suit(&input(&hand)));
    }

    #[test]
    fn four_wilds_supersede() {
        let mut hand = hand_of("1WAN 1WAN 1WAN 2TONG 2TONG 2TONG 3TIAO 3TIAO 3TIAO DONG");
        for _ in 0..4 {
            hand.add(Tile::tiao(9).with_wild(true));
        }
        let types = classify_with_wildcards(&input(&hand));
        assert_eq!(types, vec![HuType::FourWildcards]);
        assert_eq!(total_fan(&types), 4);
    }

    #[test]
    fn wildcard_counts_pick_types() {
        let plain = hand_of("1WAN 2WAN 3WAN 4TONG 5TONG 6TONG 7TIAO 8TIAO 9TIAO 1TONG 2TONG 3TONG ZHONG ZHONG");
        let types = classify_with_wildcards(&input(&plain));
        assert!(types.contains(&HuType::NoWildcard));
        assert!(!types.contains(&HuType::ExtendedWait));

        let mut three = hand_of("1WAN 2WAN 3WAN 4TONG 5TONG 6TONG 7TIAO 8TIAO 9TIAO 1TONG 2TONG");
        for _ in 0..3 {
            three.add(Tile::wind(2).with_wild(true));
        }
        let types = classify_with_wildcards(&input(&three));
        assert!(types.contains(&HuType::ExtendedWait));
        assert!(!types.contains(&HuType::NoWildcard));
    }

    #[test]
    fn melds_shape_the_hand_types() {
        let mut hand = hand_of("5TIAO 5TIAO");
        hand.melds.push(Meld::pong(Tile::wan(1), 2));
        hand.melds.push(Meld::exposed_kong(Tile::wan(4), 3));
        hand.melds.push(Meld::concealed_kong(Tile::dragon(2)));
        hand.melds.push(Meld::pong(Tile::tong(9), 4));
        let inp = FanCalculationInput { hand: &hand, after_kong: true };
        let types = classify_common(&inp, &[]);
        assert!(types.contains(&HuType::SingleWaitAfterFourMelds));
        assert!(types.contains(&HuType::KongReplacement));
        assert!(types.contains(&HuType::AllTriplets));
        assert!(!types.contains(&HuType::Concealed));
        assert!(!types.contains(&HuType::SevenPairs));

        let only_concealed_kong = {
            let mut h = hand_of("1WAN 2WAN 3WAN 4TONG 5TONG 6TONG 7TIAO 8TIAO 9TIAO BAI BAI");
            h.melds.push(Meld::concealed_kong(Tile::dragon(2)));
            h
        };
        assert!(is_concealed(&input(&only_concealed_kong)));
    }

    #[test]
    fn chi_meld_blocks_all_triplets() {
        let mut hand = hand_of("1WAN 1WAN 1WAN 2TONG 2TONG 2TONG 3TIAO 3TIAO 3TIAO DONG DONG");
        hand.melds.push(Meld::chi([Tile::wan(4), Tile::wan(5), Tile::wan(6)], 2));
        assert!(!is_all_triplets(&input(&hand)));
    }
}
