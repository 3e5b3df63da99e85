use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::action::ActionKind;
use crate::errors::{EngineError, EngineResult};
use crate::game_state::{LastAction, Phase, RoundOutcome, RoundState, RoundStatus, MAX_SEATS};
use crate::hand::{HandState, MeldKind, Seat};
use crate::rule::ScoringRule;
use crate::ruleset::RuleKind;
use crate::tiles::{all_kinds, deck_multiplicity, FlowerVariant, Tile, DECK_SIZE};
use crate::wall::Wall;
use crate::wildcard::WildcardInfo;

/// Everything needed to resume a round. Wild flags are not stored; they are
/// re-derived from `wildcard` when the round is rebuilt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoundSnapshot {
    pub rule: RuleKind,
    pub flower_variant: FlowerVariant,
    pub player_count: u8,
    pub dealer: Seat,
    pub current_seat: Seat,
    pub phase: Phase,
    pub status: RoundStatus,
    /// Head first.
    pub wall: Vec<Tile>,
    /// Indexed by `seat - 1`.
    pub hands: Vec<HandState>,
    pub last_discard: Option<(Tile, Seat)>,
    pub last_action: Option<LastAction>,
    pub pending_reactions: BTreeMap<Seat, Vec<ActionKind>>,
    pub wildcard: Option<WildcardInfo>,
    pub last_action_was_kong: bool,
    pub drew_this_turn: bool,
    pub scoring: ScoringRule,
    pub auto_draw: bool,
    pub outcome: RoundOutcome,
    #[serde(default)]
    pub skip_event_logging: bool,
}

impl RoundSnapshot {
    pub fn to_json(&self) -> EngineResult<String> {
        Ok(serde_json::to_string(self)?)
    }

    pub fn from_json(json: &str) -> EngineResult<Self> {
        Ok(serde_json::from_str(json)?)
    }

    fn seat_ok(&self, seat: Seat) -> bool {
        (1..=self.player_count).contains(&seat)
    }

    /// Rejects snapshots the engine could never have produced.
    pub fn validate(&self) -> EngineResult<()> {
        if !(2..=MAX_SEATS as u8).contains(&self.player_count) {
            return Err(EngineError::state(format!("player_count {} out of range", self.player_count)));
        }
        if self.hands.len() != usize::from(self.player_count) {
            return Err(EngineError::state(format!(
                "{} hands for {} players",
                self.hands.len(),
                self.player_count
            )));
        }
        if !self.seat_ok(self.dealer) || !self.seat_ok(self.current_seat) {
            return Err(EngineError::state("dealer or current seat out of range"));
        }
        if self.rule == RuleKind::Base && self.flower_variant != FlowerVariant::Base {
            return Err(EngineError::state("extended flower mode under the base ruleset"));
        }
        if (self.rule == RuleKind::Extended) != self.wildcard.is_some() {
            return Err(EngineError::state("wildcard info does not match the ruleset"));
        }
        if let Some(info) = self.wildcard {
            let dice_ok = (1..=6).contains(&info.dice.0) && (1..=6).contains(&info.dice.1);
            if !dice_ok || !self.seat_ok(info.break_seat) || !info.guide.is_valid() {
                return Err(EngineError::state("wildcard dice, break seat or guide out of range"));
            }
            if info.wild != info.guide.next_tile() {
                return Err(EngineError::state(format!(
                    "wild tile {} does not follow guide {}",
                    info.wild, info.guide
                )));
            }
        }
        if let Some((_, from)) = self.last_discard {
            if !self.seat_ok(from) {
                return Err(EngineError::state("last discard seat out of range"));
            }
        }
        if self.outcome.score_changes.len() != usize::from(self.player_count) {
            return Err(EngineError::state("score_changes length does not match player_count"));
        }

        self.validate_phase()?;
        self.validate_hands()?;
        self.validate_reactions()?;
        self.validate_conservation()
    }

    fn wild(&self) -> Option<Tile> {
        match self.rule {
            RuleKind::Extended => self.wildcard.map(|w| w.wild),
            RuleKind::Base => None,
        }
    }

    /// Copies of `tile` in the seat's hand that are not the round's wild tile.
    fn natural_count(&self, seat: Seat, tile: Tile) -> usize {
        let wild = self.wild();
        self.hands[usize::from(seat - 1)]
            .concealed
            .iter()
            .filter(|&&t| t == tile && Some(t) != wild)
            .count()
    }

    fn next_seat(&self, seat: Seat) -> Seat {
        if seat <= 1 {
            self.player_count
        } else {
            seat - 1
        }
    }

    /// Every pending offer must be a claim the seat could really make on the discard.
    fn validate_reactions(&self) -> EngineResult<()> {
        let Some((tile, discarder)) = self.last_discard else {
            return Ok(());
        };
        if self.phase == Phase::AwaitingReactions
            && self.hands[usize::from(discarder - 1)].discards.last() != Some(&tile)
        {
            return Err(EngineError::state("pending discard is not on top of its pile"));
        }
        for (&seat, opts) in &self.pending_reactions {
            for &kind in opts {
                let legal = match kind {
                    ActionKind::Pass => true,
                    ActionKind::Pong => self.natural_count(seat, tile) >= 2,
                    ActionKind::MingKong => self.natural_count(seat, tile) >= 3,
                    ActionKind::Chi => {
                        self.rule == RuleKind::Extended
                            && seat == self.next_seat(discarder)
                            && self.has_chi_pair(seat, tile)
                    }
                    _ => false,
                };
                if !legal {
                    return Err(EngineError::state(format!(
                        "seat {} cannot be offered {} on {}",
                        seat, kind, tile
                    )));
                }
            }
        }
        Ok(())
    }

    fn has_chi_pair(&self, seat: Seat, tile: Tile) -> bool {
        if !tile.is_number() {
            return false;
        }
        let held = |rank: u8| self.natural_count(seat, Tile { suit: tile.suit, rank, is_wild: false }) >= 1;
        (tile.rank.saturating_sub(2).max(1)..=tile.rank.min(7))
            .any(|start| (start..start + 3).filter(|&r| r != tile.rank).all(held))
    }

    fn validate_phase(&self) -> EngineResult<()> {
        let playing = self.status == RoundStatus::Playing;
        if playing == (self.phase == Phase::RoundEnded) {
            return Err(EngineError::state(format!("phase {:?} with status {:?}", self.phase, self.status)));
        }
        let reacting = self.phase == Phase::AwaitingReactions;
        if reacting == self.pending_reactions.is_empty() {
            return Err(EngineError::state("pending reactions do not match the phase"));
        }
        if reacting && self.last_discard.is_none() {
            return Err(EngineError::state("reactions pending without a discard"));
        }
        for (&seat, opts) in &self.pending_reactions {
            if !self.seat_ok(seat) || Some(seat) == self.last_discard.map(|(_, s)| s) {
                return Err(EngineError::state(format!("seat {} cannot react", seat)));
            }
            if !opts.contains(&ActionKind::Pass) {
                return Err(EngineError::state(format!("seat {} is offered no pass", seat)));
            }
        }
        if self.status == RoundStatus::Hu && !self.outcome.winner.is_some_and(|w| self.seat_ok(w)) {
            return Err(EngineError::state("won round without a valid winner"));
        }
        Ok(())
    }

    fn validate_hands(&self) -> EngineResult<()> {
        for (i, hand) in self.hands.iter().enumerate() {
            let seat = i as Seat + 1;
            let units = hand.size_units();
            let expected = if self.current_seat == seat && self.phase == Phase::AwaitingDiscard { 14 } else { 13 };
            let units_ok = match self.status {
                RoundStatus::Playing => units == expected,
                _ => units == 13 || units == 14,
            };
            if !units_ok {
                return Err(EngineError::state(format!("seat {} holds {} tile units", seat, units)));
            }
            if hand.has_flower() && !self.wall.is_empty() && self.status == RoundStatus::Playing {
                return Err(EngineError::state(format!("seat {} holds an unreplaced flower", seat)));
            }
            if hand.flowers.iter().any(|t| !t.is_flower()) || hand.discards.iter().any(|t| t.is_flower()) {
                return Err(EngineError::state(format!("seat {} has misplaced flowers", seat)));
            }
            for meld in &hand.melds {
                let size = if meld.kind.is_kong() { 4 } else { 3 };
                let first = meld.base_tile();
                let shape_ok = match meld.kind {
                    MeldKind::Chi => is_run(&meld.tiles),
                    _ => meld.tiles.iter().all(|&t| Some(t) == first),
                };
                if meld.tiles.len() != size || meld.tiles.iter().any(|t| t.is_flower() || !t.is_valid()) || !shape_ok {
                    return Err(EngineError::state(format!("seat {} has a malformed {:?}", seat, meld.kind)));
                }
            }
        }
        Ok(())
    }

    fn validate_conservation(&self) -> EngineResult<()> {
        let mut counts: BTreeMap<Tile, usize> = BTreeMap::new();
        let tiles = self.wall.iter().chain(self.hands.iter().flat_map(|h| h.all_tiles()));
        for &t in tiles {
            *counts.entry(t.with_wild(false)).or_insert(0) += 1;
        }
        let total: usize = counts.values().sum();
        if total != DECK_SIZE {
            return Err(EngineError::state(format!("{} tiles in play, expected {}", total, DECK_SIZE)));
        }
        for kind in all_kinds() {
            let have = counts.get(&kind).copied().unwrap_or(0);
            let want = usize::from(deck_multiplicity(kind, self.flower_variant));
            if have != want {
                return Err(EngineError::state(format!("{} copies of {}, expected {}", have, kind, want)));
            }
        }
        Ok(())
    }
}

/// Three consecutive ranks of one number suit, in any order.
fn is_run(tiles: &[Tile]) -> bool {
    let mut sorted = tiles.to_vec();
    sorted.sort();
    match sorted.as_slice() {
        [a, b, c] => {
            a.is_number()
                && a.suit == b.suit
                && b.suit == c.suit
                && b.rank == a.rank + 1
                && c.rank == b.rank + 1
        }
        _ => false,
    }
}

impl RoundState {
    pub fn to_snapshot(&self) -> RoundSnapshot {
        RoundSnapshot {
            rule: self.rule,
            flower_variant: self.flower_variant,
            player_count: self.player_count,
            dealer: self.dealer,
            current_seat: self.current_seat,
            phase: self.phase,
            status: self.status,
            wall: self.wall.to_vec(),
            hands: self.hands[..usize::from(self.player_count)].to_vec(),
            last_discard: self.last_discard,
            last_action: self.last_action,
            pending_reactions: self.pending_reactions.clone(),
            wildcard: self.wildcard,
            last_action_was_kong: self.last_action_was_kong,
            drew_this_turn: self.drew_this_turn,
            scoring: self.scoring,
            auto_draw: self.auto_draw,
            outcome: self.outcome.clone(),
            skip_event_logging: self.skip_event_logging,
        }
    }

    /// Rebuilds a round from a validated snapshot. The event log starts empty.
    pub fn from_snapshot(snapshot: RoundSnapshot) -> EngineResult<Self> {
        snapshot.validate()?;

        let mut hands: [HandState; MAX_SEATS] = Default::default();
        for (slot, hand) in hands.iter_mut().zip(snapshot.hands) {
            *slot = hand;
        }
        let mut round = RoundState {
            rule: snapshot.rule,
            flower_variant: snapshot.flower_variant,
            player_count: snapshot.player_count,
            dealer: snapshot.dealer,
            current_seat: snapshot.current_seat,
            phase: snapshot.phase,
            status: snapshot.status,
            wall: Wall::from_tiles(snapshot.wall),
            hands,
            last_discard: snapshot.last_discard,
            last_action: snapshot.last_action,
            pending_reactions: snapshot.pending_reactions,
            wildcard: snapshot.wildcard,
            last_action_was_kong: snapshot.last_action_was_kong,
            drew_this_turn: snapshot.drew_this_turn,
            scoring: snapshot.scoring,
            auto_draw: snapshot.auto_draw,
            outcome: snapshot.outcome,
            events: Vec::new(),
            skip_event_logging: snapshot.skip_event_logging,
        };
        round.remark_wild();
        Ok(round)
    }

    pub fn snapshot_json(&self) -> EngineResult<String> {
        self.to_snapshot().to_json()
    }

    pub fn from_snapshot_json(json: &str) -> EngineResult<Self> {
        Self::from_snapshot(RoundSnapshot::from_json(json)?)
    }
}
