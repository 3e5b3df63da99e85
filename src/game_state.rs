use std::collections::BTreeMap;

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::action::{ActionKind, PlayerAction};
use crate::errors::{EngineError, EngineResult};
use crate::event_log::RoundEvent;
use crate::fan_calculation::{total_fan, FanCalculationInput, HuType};
use crate::hand::{HandState, Meld, MeldKind, Seat};
use crate::rule::{MatchConfig, ScoringRule};
use crate::ruleset::{RuleKind, Ruleset};
use crate::settlement::{calculate_score, settle_self_draw};
use crate::tiles::{FlowerVariant, Tile};
use crate::wall::Wall;
use crate::wildcard::{self, Dice, WildcardInfo};

pub const MAX_SEATS: usize = 4;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    AwaitingDraw,
    AwaitingDiscard,
    AwaitingReactions,
    RoundEnded,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RoundStatus {
    Playing,
    Draw,
    Hu,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LastAction {
    pub kind: ActionKind,
    pub seat: Seat,
    pub tile: Option<Tile>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoundOutcome {
    pub winner: Option<Seat>,
    pub hu_types: Vec<HuType>,
    pub fan_count: u32,
    /// Indexed by `seat - 1`.
    pub score_changes: Vec<i32>,
}

/// One hand of play, from the deal to a win or an exhausted wall.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoundState {
    pub(crate) rule: RuleKind,
    pub(crate) flower_variant: FlowerVariant,
    pub(crate) player_count: u8,
    pub(crate) dealer: Seat,
    pub(crate) current_seat: Seat,
    pub(crate) phase: Phase,
    pub(crate) status: RoundStatus,
    pub(crate) wall: Wall,
    pub(crate) hands: [HandState; MAX_SEATS],

    pub(crate) last_discard: Option<(Tile, Seat)>,
    pub(crate) last_action: Option<LastAction>,
    pub(crate) pending_reactions: BTreeMap<Seat, Vec<ActionKind>>,

    pub(crate) wildcard: Option<WildcardInfo>,
    pub(crate) last_action_was_kong: bool,
    /// Current seat reached `AwaitingDiscard` through a draw (normal, replacement or deal).
    pub(crate) drew_this_turn: bool,

    pub(crate) scoring: ScoringRule,
    pub(crate) auto_draw: bool,
    pub(crate) outcome: RoundOutcome,

    pub(crate) events: Vec<RoundEvent>,
    pub(crate) skip_event_logging: bool,
}

fn check_table(config: &MatchConfig, dealer: Seat) -> EngineResult<()> {
    config.validate()?;
    if dealer == 0 || dealer > config.player_count {
        return Err(EngineError::config(format!(
            "dealer {} is not a seat at a {}-player table",
            dealer, config.player_count
        )));
    }
    Ok(())
}

impl RoundState {
    /// Shuffles a fresh wall, deals, and (extended ruleset) rolls for the wild tile.
    pub fn shuffle_and_deal<R: Rng + ?Sized>(config: &MatchConfig, dealer: Seat, rng: &mut R) -> EngineResult<Self> {
        check_table(config, dealer)?;
        let wall = Wall::shuffled(config.flower_variant, rng);
        let dice = Dice::roll(rng);
        Self::deal_from_wall(config, dealer, wall, dice)
    }

    /// Deals from a wall in the given order. `dice` are only used by the extended ruleset.
    pub fn deal_from_wall(config: &MatchConfig, dealer: Seat, wall: Wall, dice: Dice) -> EngineResult<Self> {
        check_table(config, dealer)?;
        let player_count = config.player_count;
        let mut round = Self {
            rule: config.rule,
            flower_variant: config.flower_variant,
            player_count,
            dealer,
            current_seat: dealer,
            phase: Phase::AwaitingDiscard,
            status: RoundStatus::Playing,
            wall,
            hands: Default::default(),
            last_discard: None,
            last_action: None,
            pending_reactions: BTreeMap::new(),
            wildcard: None,
            last_action_was_kong: false,
            drew_this_turn: true,
            scoring: config.scoring(),
            auto_draw: config.auto_draw,
            outcome: RoundOutcome { score_changes: vec![0; player_count as usize], ..Default::default() },
            events: Vec::new(),
            skip_event_logging: config.skip_event_logging,
        };

        for i in 0..player_count {
            let seat = (dealer - 1 + i) % player_count + 1;
            let take = if seat == dealer { 14 } else { 13 };
            for _ in 0..take {
                if let Some(t) = round.wall.draw_head() {
                    round.hands[usize::from(seat - 1)].add(t);
                }
            }
        }
        for i in 0..player_count {
            let seat = (dealer - 1 + i) % player_count + 1;
            // an empty wall mid-replacement is tolerated at the deal
            round.replace_flowers(seat);
        }
        for hand in round.hands.iter_mut() {
            hand.sort();
        }
        let dealt: Vec<Vec<Tile>> = round.seats().map(|s| round.hand_of(s).concealed.clone()).collect();
        round_event!(round, RoundEvent::StartRound { dealer, hands: dealt });

        if round.ruleset().uses_wildcard() {
            round.wildcard = wildcard::resolve_with_dice(&round.wall, dice, dealer, player_count);
            round.remark_wild();
            if let Some(info) = round.wildcard {
                round_event!(round, RoundEvent::WildcardResolved {
                    dice: info.dice,
                    break_seat: info.break_seat,
                    guide: info.guide,
                    wild: info.wild,
                });
            }
        }
        Ok(round)
    }

    pub fn ruleset(&self) -> &'static dyn Ruleset {
        self.rule.ruleset()
    }

    pub fn rule(&self) -> RuleKind {
        self.rule
    }

    pub fn player_count(&self) -> u8 {
        self.player_count
    }

    pub fn dealer(&self) -> Seat {
        self.dealer
    }

    pub fn current_seat(&self) -> Seat {
        self.current_seat
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn status(&self) -> RoundStatus {
        self.status
    }

    pub fn outcome(&self) -> &RoundOutcome {
        &self.outcome
    }

    pub fn wildcard(&self) -> Option<&WildcardInfo> {
        self.wildcard.as_ref()
    }

    pub fn wild_tile(&self) -> Option<Tile> {
        self.wildcard.map(|w| w.wild)
    }

    pub fn last_discard(&self) -> Option<(Tile, Seat)> {
        self.last_discard
    }

    pub fn last_action(&self) -> Option<LastAction> {
        self.last_action
    }

    pub fn pending_reactions(&self) -> &BTreeMap<Seat, Vec<ActionKind>> {
        &self.pending_reactions
    }

    pub fn wall_remaining(&self) -> usize {
        self.wall.remaining_count()
    }

    pub fn wall(&self) -> &Wall {
        &self.wall
    }

    pub fn seats(&self) -> impl Iterator<Item = Seat> {
        1..=self.player_count
    }

    fn seat_index(&self, seat: Seat) -> EngineResult<usize> {
        if seat == 0 || seat > self.player_count {
            return Err(EngineError::action(format!("seat {} is not at this table", seat)));
        }
        Ok(usize::from(seat - 1))
    }

    pub fn hand_state(&self, seat: Seat) -> EngineResult<&HandState> {
        Ok(&self.hands[self.seat_index(seat)?])
    }

    pub fn hand(&self, seat: Seat) -> EngineResult<&[Tile]> {
        Ok(&self.hand_state(seat)?.concealed)
    }

    pub fn melds(&self, seat: Seat) -> EngineResult<&[Meld]> {
        Ok(&self.hand_state(seat)?.melds)
    }

    pub fn discards(&self, seat: Seat) -> EngineResult<&[Tile]> {
        Ok(&self.hand_state(seat)?.discards)
    }

    pub fn flowers(&self, seat: Seat) -> EngineResult<&[Tile]> {
        Ok(&self.hand_state(seat)?.flowers)
    }

    /// Seats are trusted valid here.
    fn hand_of(&self, seat: Seat) -> &HandState {
        &self.hands[usize::from(seat - 1)]
    }

    fn hand_mut(&mut self, seat: Seat) -> &mut HandState {
        &mut self.hands[usize::from(seat - 1)]
    }

    /// Counter-clockwise neighbour: `seat - 1`, wrapping 1 to N.
    pub fn next_seat(&self, seat: Seat) -> Seat {
        if seat <= 1 {
            self.player_count
        } else {
            seat - 1
        }
    }

    pub fn is_wild(&self, tile: Tile) -> bool {
        self.ruleset().uses_wildcard() && self.wild_tile() == Some(tile)
    }

    /// Re-derives every wild flag in the wall and concealed hands.
    pub(crate) fn remark_wild(&mut self) {
        let wild = if self.ruleset().uses_wildcard() { self.wild_tile() } else { None };
        self.wall.mark_wild(wild);
        for hand in self.hands.iter_mut() {
            hand.mark_wild(wild);
            for t in hand.melds.iter_mut().flat_map(|m| m.tiles.iter_mut()) {
                t.is_wild = false;
            }
            for t in hand.discards.iter_mut().chain(hand.flowers.iter_mut()) {
                t.is_wild = false;
            }
        }
    }

    pub fn is_round_draw(&self) -> bool {
        match self.status {
            RoundStatus::Draw => true,
            RoundStatus::Hu => false,
            RoundStatus::Playing => self.phase == Phase::AwaitingDraw && self.wall.is_empty(),
        }
    }

    pub fn is_over(&self) -> bool {
        self.status != RoundStatus::Playing
    }

    pub fn events(&self) -> &[RoundEvent] {
        &self.events
    }

    pub fn events_json(&self) -> EngineResult<String> {
        Ok(serde_json::to_string(&self.events)?)
    }

    // ─── Internal moves ───

    fn with_wild_flag(&self, tile: Tile) -> Tile {
        tile.with_wild(self.is_wild(tile))
    }

    /// Moves concealed flowers to the pile one at a time, drawing each replacement from
    /// the tail. Returns false when the wall ran out first.
    fn replace_flowers(&mut self, seat: Seat) -> bool {
        loop {
            let hand = self.hand_mut(seat);
            let Some(pos) = hand.concealed.iter().position(|t| t.is_flower()) else {
                return true;
            };
            let flower = hand.concealed.remove(pos).with_wild(false);
            hand.flowers.push(flower);
            round_event!(self, RoundEvent::FlowerReplaced { actor: seat, flower });

            let Some(tile) = self.wall.draw_tail() else {
                return false;
            };
            let tile = self.with_wild_flag(tile);
            self.hand_mut(seat).add(tile);
            round_event!(self, RoundEvent::Draw { actor: seat, tile, from_tail: true });
        }
    }

    fn end_in_draw(&mut self) {
        self.status = RoundStatus::Draw;
        self.phase = Phase::RoundEnded;
        self.pending_reactions.clear();
        round_event!(self, RoundEvent::RoundDraw);
    }

    /// Hands the turn to `seat`, drawing for it when `auto_draw` is on.
    fn enter_turn(&mut self, seat: Seat) {
        self.current_seat = seat;
        self.phase = Phase::AwaitingDraw;
        self.drew_this_turn = false;
        self.pending_reactions.clear();
        if self.wall.is_empty() {
            self.end_in_draw();
            return;
        }
        if self.auto_draw {
            self.draw_head_for(seat);
        }
    }

    fn draw_head_for(&mut self, seat: Seat) {
        let Some(tile) = self.wall.draw_head() else {
            self.end_in_draw();
            return;
        };
        let tile = self.with_wild_flag(tile);
        self.hand_mut(seat).add(tile);
        round_event!(self, RoundEvent::Draw { actor: seat, tile, from_tail: false });
        self.last_action_was_kong = false;
        self.last_action = Some(LastAction { kind: ActionKind::Draw, seat, tile: Some(tile) });
        if !self.replace_flowers(seat) {
            self.end_in_draw();
            return;
        }
        self.phase = Phase::AwaitingDiscard;
        self.drew_this_turn = true;
    }

    /// Kong replacement from the tail. An empty wall here ends the round.
    fn draw_replacement(&mut self, seat: Seat) {
        let Some(tile) = self.wall.draw_tail() else {
            self.end_in_draw();
            return;
        };
        let tile = self.with_wild_flag(tile);
        self.hand_mut(seat).add(tile);
        round_event!(self, RoundEvent::Draw { actor: seat, tile, from_tail: true });
        if !self.replace_flowers(seat) {
            self.end_in_draw();
            return;
        }
        self.last_action_was_kong = true;
        self.phase = Phase::AwaitingDiscard;
        self.drew_this_turn = true;
    }

    fn take_claimed_discard(&mut self) -> EngineResult<(Tile, Seat)> {
        let (tile, from) = self.last_discard.ok_or_else(|| EngineError::state("no discard to claim"))?;
        let idx = self.seat_index(from)?;
        let pile = &mut self.hands[idx].discards;
        match pile.last() {
            Some(&top) if top == tile => {
                pile.pop();
            }
            _ => return Err(EngineError::state("claimed tile is not on top of the discard pile")),
        }
        self.last_discard = None;
        self.pending_reactions.clear();
        Ok((tile, from))
    }

    fn claimed_by(&mut self, seat: Seat) {
        self.current_seat = seat;
        self.phase = Phase::AwaitingDiscard;
        self.drew_this_turn = false;
        self.last_action_was_kong = false;
    }

    // ─── Checks ───

    fn ensure_playing(&self) -> EngineResult<()> {
        if self.status != RoundStatus::Playing {
            return Err(EngineError::action("round is over"));
        }
        Ok(())
    }

    fn ensure_own_turn(&self, seat: Seat, phase: Phase) -> EngineResult<()> {
        self.seat_index(seat)?;
        self.ensure_playing()?;
        if self.current_seat != seat {
            return Err(EngineError::action(format!("not seat {}'s turn", seat)));
        }
        if self.phase != phase {
            return Err(EngineError::action(format!("expected {:?}, round is in {:?}", phase, self.phase)));
        }
        Ok(())
    }

    fn ensure_offered(&self, seat: Seat, kind: ActionKind) -> EngineResult<Tile> {
        self.seat_index(seat)?;
        self.ensure_playing()?;
        if self.phase != Phase::AwaitingReactions {
            return Err(EngineError::action("no discard is waiting for reactions"));
        }
        let offered = self.pending_reactions.get(&seat).is_some_and(|opts| opts.contains(&kind));
        if !offered {
            return Err(EngineError::action(format!("{} is not offered to seat {}", kind, seat)));
        }
        self.last_discard
            .map(|(t, _)| t)
            .ok_or_else(|| EngineError::state("reactions pending without a discard"))
    }

    /// Pairs of natural hand tiles that make a run with `tile`, lowest run first.
    fn chi_pairs(&self, seat: Seat, tile: Tile) -> Vec<[Tile; 2]> {
        if !tile.is_number() {
            return Vec::new();
        }
        let hand = self.hand_of(seat);
        let mut out = Vec::new();
        for start in tile.rank.saturating_sub(2).max(1)..=tile.rank.min(7) {
            let others: Vec<Tile> = (start..start + 3)
                .filter(|&r| r != tile.rank)
                .map(|r| Tile { suit: tile.suit, rank: r, is_wild: false })
                .collect();
            if others.iter().all(|&o| hand.count_natural(o) >= 1) {
                out.push([others[0], others[1]]);
            }
        }
        out
    }

    /// Reaction set for `seat` to `tile` discarded by `discarder`, without Pass.
    fn reactions_to(&self, seat: Seat, tile: Tile, discarder: Seat) -> Vec<ActionKind> {
        let hand = self.hand_of(seat);
        let natural = hand.count_natural(tile);
        let mut opts = Vec::new();
        if self.ruleset().allows_chi()
            && seat == self.next_seat(discarder)
            && !self.chi_pairs(seat, tile).is_empty()
        {
            opts.push(ActionKind::Chi);
        }
        if natural >= 2 {
            opts.push(ActionKind::Pong);
        }
        if natural >= 3 {
            opts.push(ActionKind::MingKong);
        }
        opts
    }

    pub fn can_draw(&self, seat: Seat) -> bool {
        self.ensure_own_turn(seat, Phase::AwaitingDraw).is_ok()
    }

    pub fn can_discard(&self, seat: Seat) -> bool {
        self.ensure_own_turn(seat, Phase::AwaitingDiscard).is_ok()
    }

    pub fn can_pong(&self, seat: Seat) -> bool {
        self.ensure_offered(seat, ActionKind::Pong).is_ok()
    }

    pub fn can_ming_kong(&self, seat: Seat) -> bool {
        self.ensure_offered(seat, ActionKind::MingKong).is_ok()
    }

    pub fn chi_options(&self, seat: Seat) -> Vec<[Tile; 2]> {
        match self.ensure_offered(seat, ActionKind::Chi) {
            Ok(tile) => self.chi_pairs(seat, tile),
            Err(_) => Vec::new(),
        }
    }

    /// Tiles with four natural copies in hand. Wild tiles never qualify.
    pub fn an_kong_options(&self, seat: Seat) -> Vec<Tile> {
        if !self.can_discard(seat) {
            return Vec::new();
        }
        let hand = self.hand_of(seat);
        let mut opts: Vec<Tile> = hand
            .concealed
            .iter()
            .filter(|t| !t.is_wild && !t.is_flower())
            .copied()
            .filter(|&t| hand.count_natural(t) >= 4)
            .collect();
        opts.sort();
        opts.dedup();
        opts
    }

    /// Own pongs for which a natural fourth copy is held.
    pub fn bu_kong_options(&self, seat: Seat) -> Vec<Tile> {
        if !self.can_discard(seat) {
            return Vec::new();
        }
        let hand = self.hand_of(seat);
        hand.melds
            .iter()
            .filter(|m| m.kind == MeldKind::Pong)
            .filter_map(|m| m.base_tile())
            .filter(|&t| hand.count_natural(t) >= 1)
            .collect()
    }

    pub fn can_bu_hua(&self, seat: Seat) -> bool {
        self.can_discard(seat) && self.hand_of(seat).has_flower()
    }

    /// Self-draw win: only in the seat's own discard phase right after a draw.
    pub fn can_hu(&self, seat: Seat) -> bool {
        if !self.can_discard(seat) || !self.drew_this_turn {
            return false;
        }
        let hand = self.hand_of(seat);
        !hand.has_flower() && hand.size_units() == 14 && self.ruleset().can_win(hand)
    }

    pub fn available_actions(&self, seat: Seat) -> Vec<ActionKind> {
        if self.seat_index(seat).is_err() || self.status != RoundStatus::Playing {
            return Vec::new();
        }
        let mut actions = match self.phase {
            Phase::AwaitingDraw if seat == self.current_seat => vec![ActionKind::Draw],
            Phase::AwaitingDiscard if seat == self.current_seat => {
                let mut a = vec![ActionKind::Discard];
                if !self.an_kong_options(seat).is_empty() {
                    a.push(ActionKind::AnKong);
                }
                if !self.bu_kong_options(seat).is_empty() {
                    a.push(ActionKind::BuKong);
                }
                if self.can_bu_hua(seat) {
                    a.push(ActionKind::BuHua);
                }
                if self.can_hu(seat) {
                    a.push(ActionKind::Hu);
                }
                a
            }
            Phase::AwaitingReactions => self.pending_reactions.get(&seat).cloned().unwrap_or_default(),
            _ => Vec::new(),
        };
        actions.sort();
        actions
    }

    // ─── Executors ───

    pub fn apply(&mut self, seat: Seat, action: PlayerAction) -> EngineResult<()> {
        match action {
            PlayerAction::Draw => self.draw(seat),
            PlayerAction::Discard(tile) => self.discard(seat, tile),
            PlayerAction::Chi(tiles) => self.chi(seat, tiles),
            PlayerAction::Pong => self.pong(seat),
            PlayerAction::MingKong => self.ming_kong(seat),
            PlayerAction::AnKong(tile) => self.an_kong(seat, tile),
            PlayerAction::BuKong(tile) => self.bu_kong(seat, tile),
            PlayerAction::BuHua => self.bu_hua(seat),
            PlayerAction::Hu => self.hu(seat),
            PlayerAction::Pass => self.pass(seat),
        }
    }

    pub fn draw(&mut self, seat: Seat) -> EngineResult<()> {
        self.ensure_own_turn(seat, Phase::AwaitingDraw)?;
        self.draw_head_for(seat);
        Ok(())
    }

    pub fn discard(&mut self, seat: Seat, tile: Tile) -> EngineResult<()> {
        self.ensure_own_turn(seat, Phase::AwaitingDiscard)?;
        if tile.is_flower() {
            return Err(EngineError::action("flowers are replaced, not discarded"));
        }
        let held = self.hand_of(seat).count(tile);
        if held == 0 {
            return Err(EngineError::action(format!("seat {} does not hold {}", seat, tile)));
        }

        let removed = self.hand_mut(seat).remove(tile).unwrap_or(tile);
        // a discarded wild is an ordinary tile from here on
        let tile = removed.with_wild(false);
        self.hand_mut(seat).discards.push(tile);
        self.last_discard = Some((tile, seat));
        self.last_action = Some(LastAction { kind: ActionKind::Discard, seat, tile: Some(tile) });
        self.drew_this_turn = false;
        self.last_action_was_kong = false;
        round_event!(self, RoundEvent::Discard { actor: seat, tile });

        let mut pending = BTreeMap::new();
        for other in self.seats().filter(|&s| s != seat) {
            let mut opts = self.reactions_to(other, tile, seat);
            if !opts.is_empty() {
                opts.push(ActionKind::Pass);
                opts.sort();
                pending.insert(other, opts);
            }
        }

        if pending.is_empty() {
            let next = self.next_seat(seat);
            self.enter_turn(next);
        } else {
            self.pending_reactions = pending;
            self.phase = Phase::AwaitingReactions;
        }
        Ok(())
    }

    pub fn pong(&mut self, seat: Seat) -> EngineResult<()> {
        let tile = self.ensure_offered(seat, ActionKind::Pong)?;
        if self.hand_of(seat).count_natural(tile) < 2 {
            return Err(EngineError::state("pong offered without two natural copies"));
        }
        let (tile, from) = self.take_claimed_discard()?;
        let hand = self.hand_mut(seat);
        hand.remove_natural(tile, 2);
        hand.melds.push(Meld::pong(tile, from));
        self.claimed_by(seat);
        self.last_action = Some(LastAction { kind: ActionKind::Pong, seat, tile: Some(tile) });
        round_event!(self, RoundEvent::Pong { actor: seat, target: from, tile });
        Ok(())
    }

    pub fn ming_kong(&mut self, seat: Seat) -> EngineResult<()> {
        let tile = self.ensure_offered(seat, ActionKind::MingKong)?;
        if self.hand_of(seat).count_natural(tile) < 3 {
            return Err(EngineError::state("kong offered without three natural copies"));
        }
        let (tile, from) = self.take_claimed_discard()?;
        let hand = self.hand_mut(seat);
        hand.remove_natural(tile, 3);
        hand.melds.push(Meld::exposed_kong(tile, from));
        self.claimed_by(seat);
        self.last_action = Some(LastAction { kind: ActionKind::MingKong, seat, tile: Some(tile) });
        round_event!(self, RoundEvent::MingKong { actor: seat, target: from, tile });
        self.draw_replacement(seat);
        Ok(())
    }

    pub fn chi(&mut self, seat: Seat, tiles: [Tile; 2]) -> EngineResult<()> {
        let tile = self.ensure_offered(seat, ActionKind::Chi)?;
        let mut wanted = tiles;
        wanted.sort();
        if !self.chi_pairs(seat, tile).contains(&wanted) {
            return Err(EngineError::action(format!("{} {} do not make a run with {}", tiles[0], tiles[1], tile)));
        }
        let (tile, from) = self.take_claimed_discard()?;
        let hand = self.hand_mut(seat);
        hand.remove_natural(wanted[0], 1);
        hand.remove_natural(wanted[1], 1);
        hand.melds.push(Meld::chi([wanted[0], tile, wanted[1]], from));
        self.claimed_by(seat);
        self.last_action = Some(LastAction { kind: ActionKind::Chi, seat, tile: Some(tile) });
        round_event!(self, RoundEvent::Chi { actor: seat, target: from, tile, consumed: wanted });
        Ok(())
    }

    pub fn an_kong(&mut self, seat: Seat, tile: Tile) -> EngineResult<()> {
        if !self.an_kong_options(seat).contains(&tile) {
            self.ensure_own_turn(seat, Phase::AwaitingDiscard)?;
            return Err(EngineError::action(format!("seat {} cannot conceal-kong {}", seat, tile)));
        }
        let tile = tile.with_wild(false);
        let hand = self.hand_mut(seat);
        hand.remove_natural(tile, 4);
        hand.melds.push(Meld::concealed_kong(tile));
        self.last_action = Some(LastAction { kind: ActionKind::AnKong, seat, tile: Some(tile) });
        round_event!(self, RoundEvent::AnKong { actor: seat, tile });
        self.draw_replacement(seat);
        Ok(())
    }

    pub fn bu_kong(&mut self, seat: Seat, tile: Tile) -> EngineResult<()> {
        if !self.bu_kong_options(seat).contains(&tile) {
            self.ensure_own_turn(seat, Phase::AwaitingDiscard)?;
            return Err(EngineError::action(format!("seat {} has no pong of {} to promote", seat, tile)));
        }
        let tile = tile.with_wild(false);
        let hand = self.hand_mut(seat);
        let Some(idx) = hand.pong_meld_index(tile) else {
            return Err(EngineError::state("promotable pong vanished"));
        };
        hand.remove_natural(tile, 1);
        let meld = &mut hand.melds[idx];
        meld.kind = MeldKind::PromotedKong;
        meld.tiles.push(tile);
        self.last_action = Some(LastAction { kind: ActionKind::BuKong, seat, tile: Some(tile) });
        round_event!(self, RoundEvent::BuKong { actor: seat, tile });
        self.draw_replacement(seat);
        Ok(())
    }

    pub fn bu_hua(&mut self, seat: Seat) -> EngineResult<()> {
        self.ensure_own_turn(seat, Phase::AwaitingDiscard)?;
        if !self.hand_of(seat).has_flower() {
            return Err(EngineError::action(format!("seat {} holds no flower", seat)));
        }
        self.last_action = Some(LastAction { kind: ActionKind::BuHua, seat, tile: None });
        if !self.replace_flowers(seat) {
            self.end_in_draw();
        }
        Ok(())
    }

    pub fn pass(&mut self, seat: Seat) -> EngineResult<()> {
        self.seat_index(seat)?;
        self.ensure_playing()?;
        if self.phase != Phase::AwaitingReactions || !self.pending_reactions.contains_key(&seat) {
            return Err(EngineError::action(format!("seat {} has nothing to pass on", seat)));
        }
        self.pending_reactions.remove(&seat);
        round_event!(self, RoundEvent::Pass { actor: seat });
        if self.pending_reactions.is_empty() {
            let discarder = self.last_discard.map(|(_, s)| s).unwrap_or(self.current_seat);
            let next = self.next_seat(discarder);
            self.enter_turn(next);
        }
        Ok(())
    }

    pub fn hu(&mut self, seat: Seat) -> EngineResult<()> {
        if !self.can_hu(seat) {
            self.ensure_own_turn(seat, Phase::AwaitingDiscard)?;
            return Err(EngineError::action(format!("seat {} has no winning hand", seat)));
        }
        let input = FanCalculationInput { hand: self.hand_of(seat), after_kong: self.last_action_was_kong };
        let hu_types = self.ruleset().classify(&input);
        let fan = total_fan(&hu_types);
        let score = calculate_score(fan, &self.scoring);
        let deltas = settle_self_draw(seat, self.player_count, score);

        self.status = RoundStatus::Hu;
        self.phase = Phase::RoundEnded;
        self.pending_reactions.clear();
        self.last_action = Some(LastAction { kind: ActionKind::Hu, seat, tile: None });
        round_event!(self, RoundEvent::Hu {
            actor: seat,
            hu_types: hu_types.clone(),
            fan,
            deltas: deltas.clone(),
        });
        self.outcome = RoundOutcome { winner: Some(seat), hu_types, fan_count: fan, score_changes: deltas };
        Ok(())
    }
}
