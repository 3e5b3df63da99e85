//! Property-based invariant tests for the round engine.
//!
//! Plays full matches from random seeds with pseudo-random action selection and
//! checks tile conservation, hand size, chi eligibility and snapshot round-trips at
//! every step.

use proptest::prelude::*;
use shanghai_engine::tiles::build_deck;
use shanghai_engine::{
    ActionKind, FlowerVariant, Match, MatchConfig, Phase, PlayerAction, RoundState, RoundStatus, RuleKind, Tile,
};

const MAX_STEPS: u32 = 5_000;

/// Pick a "random" element deterministically from seed + counter.
fn pick<T: Copy>(seed: u64, counter: u64, items: &[T]) -> T {
    let idx = (seed.wrapping_mul(counter.wrapping_add(1)) >> 3) as usize % items.len();
    items[idx]
}

fn new_match(seed: u64, rule: RuleKind, flowers: FlowerVariant, players: u8) -> Match {
    let mut cfg = match rule {
        RuleKind::Base => MatchConfig::default_base(),
        RuleKind::Extended => MatchConfig::default_extended(),
    };
    cfg.flower_variant = if rule == RuleKind::Base { FlowerVariant::Base } else { flowers };
    cfg.player_count = players;
    cfg.total_rounds = 2;
    cfg.seed = Some(seed);
    Match::new(cfg).unwrap()
}

/// Seat that should act next and a concrete legal action for it.
fn choose(round: &RoundState, seed: u64, counter: u64) -> Option<(u8, PlayerAction)> {
    let seat = match round.phase() {
        Phase::AwaitingReactions => {
            let seats: Vec<u8> = round.pending_reactions().keys().copied().collect();
            pick(seed, counter, &seats)
        }
        Phase::RoundEnded => return None,
        _ => round.current_seat(),
    };
    let legal = round.available_actions(seat);
    if legal.is_empty() {
        return None;
    }
    let kind = pick(seed, counter, &legal);
    let action = match kind {
        ActionKind::Draw => PlayerAction::Draw,
        ActionKind::Discard => {
            let hand: Vec<Tile> = round.hand(seat).unwrap().iter().copied().filter(|t| !t.is_flower()).collect();
            PlayerAction::Discard(pick(seed, counter + 7, &hand))
        }
        ActionKind::Chi => PlayerAction::Chi(pick(seed, counter, &round.chi_options(seat))),
        ActionKind::Pong => PlayerAction::Pong,
        ActionKind::MingKong => PlayerAction::MingKong,
        ActionKind::AnKong => PlayerAction::AnKong(pick(seed, counter, &round.an_kong_options(seat))),
        ActionKind::BuKong => PlayerAction::BuKong(pick(seed, counter, &round.bu_kong_options(seat))),
        ActionKind::BuHua => PlayerAction::BuHua,
        ActionKind::Hu => PlayerAction::Hu,
        ActionKind::Pass => PlayerAction::Pass,
    };
    Some((seat, action))
}

fn all_tiles(round: &RoundState) -> Vec<Tile> {
    let mut tiles: Vec<Tile> = round.wall().iter().copied().collect();
    for seat in round.seats() {
        tiles.extend(round.hand_state(seat).unwrap().all_tiles().copied());
    }
    tiles.sort();
    tiles
}

fn variant_of(rule: RuleKind, flowers: FlowerVariant) -> FlowerVariant {
    if rule == RuleKind::Base { FlowerVariant::Base } else { flowers }
}

fn rule_strategy() -> impl Strategy<Value = RuleKind> {
    prop_oneof![Just(RuleKind::Base), Just(RuleKind::Extended)]
}

fn flower_strategy() -> impl Strategy<Value = FlowerVariant> {
    prop_oneof![
        Just(FlowerVariant::Base),
        Just(FlowerVariant::Extended20),
        Just(FlowerVariant::Extended36)
    ]
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    /// Conservation, hand size and chi eligibility at every step of a full match.
    #[test]
    fn round_invariants_hold(
        seed in 0u64..1_000_000,
        rule in rule_strategy(),
        flowers in flower_strategy(),
        players in 2u8..=4,
    ) {
        let mut m = new_match(seed, rule, flowers, players);
        let mut deck = build_deck(variant_of(rule, flowers));
        deck.sort();
        let mut counter = 0u64;
        let mut steps = 0u32;

        while !m.is_finished() && steps < MAX_STEPS {
            if m.round().map_or(true, |r| r.status() != RoundStatus::Playing) {
                m.start_round().unwrap();
            }
            let round = m.round().unwrap();

            prop_assert_eq!(all_tiles(round), deck.clone(), "seed {}: tiles not conserved", seed);

            if round.status() == RoundStatus::Playing && round.phase() == Phase::AwaitingDiscard {
                for seat in round.seats() {
                    let units = round.hand_state(seat).unwrap().size_units();
                    let want = if seat == round.current_seat() { 14 } else { 13 };
                    prop_assert_eq!(units, want, "seed {}: seat {} has {} units", seed, seat, units);
                }
            }

            if let Some((_, discarder)) = round.last_discard() {
                for (&seat, offered) in round.pending_reactions() {
                    if offered.contains(&ActionKind::Chi) {
                        prop_assert_eq!(rule, RuleKind::Extended);
                        prop_assert_eq!(seat, round.next_seat(discarder));
                    }
                }
            }

            counter += 1;
            let Some((seat, action)) = choose(round, seed, counter) else { break };
            m.apply(seat, action).unwrap();
            steps += 1;
        }

        prop_assert!(m.is_finished(), "seed {}: match did not finish", seed);
        prop_assert_eq!(m.scores().iter().sum::<i64>(), 0);
    }

    /// Rehydrating a snapshot yields the same offers for every seat.
    #[test]
    fn snapshot_round_trip_preserves_actions(
        seed in 0u64..1_000_000,
        rule in rule_strategy(),
        players in 2u8..=4,
    ) {
        let mut m = new_match(seed, rule, FlowerVariant::Base, players);
        m.start_round().unwrap();
        let mut counter = 0u64;

        for _ in 0..MAX_STEPS {
            let round = m.round().unwrap();
            if round.status() != RoundStatus::Playing {
                break;
            }
            let json = round.snapshot_json().unwrap();
            let back = RoundState::from_snapshot_json(&json).unwrap();
            for seat in round.seats() {
                prop_assert_eq!(round.available_actions(seat), back.available_actions(seat));
                prop_assert_eq!(round.chi_options(seat), back.chi_options(seat));
            }
            prop_assert_eq!(round.wild_tile(), back.wild_tile());

            counter += 1;
            let Some((seat, action)) = choose(round, seed, counter) else { break };
            m.apply(seat, action).unwrap();
        }
    }
}

#[test]
fn wildcard_resolution_is_deterministic() {
    for seed in 0..20u64 {
        let mut a = new_match(seed, RuleKind::Extended, FlowerVariant::Base, 4);
        let mut b = new_match(seed, RuleKind::Extended, FlowerVariant::Base, 4);
        let ra = a.start_round().unwrap().wildcard().copied();
        let rb = b.start_round().unwrap().wildcard().copied();
        assert!(ra.is_some());
        assert_eq!(ra, rb);
        let info = ra.unwrap();
        assert_eq!(info.wild, info.guide.next_tile());
    }
}
