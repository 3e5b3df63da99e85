use rand::{rngs::StdRng, Rng, SeedableRng};
use serde::{Deserialize, Serialize};

use crate::action::PlayerAction;
use crate::errors::{EngineError, EngineResult};
use crate::fan_calculation::HuType;
use crate::game_state::{RoundState, RoundStatus};
use crate::hand::Seat;
use crate::rule::MatchConfig;
use crate::snapshot::RoundSnapshot;

const DEAL_STREAM: u64 = 0x6465_616c;
const DEALER_STREAM: u64 = 0x6465_616c_6572;

/// Result of one finished round.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoundRecord {
    pub round_number: u32,
    pub dealer: Seat,
    pub status: RoundStatus,
    pub winner: Option<Seat>,
    pub hu_types: Vec<HuType>,
    pub fan_count: u32,
    pub score_changes: Vec<i32>,
}

/// A sequence of rounds with running scores and dealer rotation.
///
/// Randomness is drawn from per-round streams derived from one match seed, so a
/// saved match replays identically after [`Match::resume`].
#[derive(Debug, Clone)]
pub struct Match {
    config: MatchConfig,
    seed: u64,
    scores: Vec<i64>,
    history: Vec<RoundRecord>,
    current_round: u32,
    dealer: Seat,
    round: Option<RoundState>,
}

/// Everything needed to resume a match between (or during) rounds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchSnapshot {
    pub config: MatchConfig,
    pub seed: u64,
    pub scores: Vec<i64>,
    pub history: Vec<RoundRecord>,
    pub current_round: u32,
    pub dealer: Seat,
    pub round: Option<RoundSnapshot>,
}

impl MatchSnapshot {
    pub fn to_json(&self) -> EngineResult<String> {
        Ok(serde_json::to_string(self)?)
    }

    pub fn from_json(json: &str) -> EngineResult<Self> {
        Ok(serde_json::from_str(json)?)
    }
}

impl Match {
    pub fn new(config: MatchConfig) -> EngineResult<Self> {
        config.validate()?;
        let seed = match config.seed {
            Some(seed) => seed,
            None => StdRng::from_entropy().gen(),
        };
        Ok(Self {
            seed,
            scores: vec![0; usize::from(config.player_count)],
            history: Vec::new(),
            current_round: 1,
            dealer: config.initial_dealer,
            round: None,
            config,
        })
    }

    pub fn config(&self) -> &MatchConfig {
        &self.config
    }

    /// Seed every round stream is derived from; equals `config.seed` when one was given.
    pub fn seed(&self) -> u64 {
        self.seed
    }

    fn round_rng(&self, round: u32, stream: u64) -> StdRng {
        let mixed = u64::from(round).wrapping_mul(0x9E37_79B9_7F4A_7C15);
        StdRng::seed_from_u64(self.seed ^ mixed ^ stream)
    }

    /// Deals the next round. Fails while a round is still being played or once the
    /// match is over.
    pub fn start_round(&mut self) -> EngineResult<&RoundState> {
        if self.is_finished() {
            return Err(EngineError::action("match is finished"));
        }
        if self.round.as_ref().is_some_and(|r| r.status() == RoundStatus::Playing) {
            return Err(EngineError::action("current round is still in play"));
        }
        let mut rng = self.round_rng(self.current_round, DEAL_STREAM);
        let round = RoundState::shuffle_and_deal(&self.config, self.dealer, &mut rng)?;
        Ok(&*self.round.insert(round))
    }

    /// Forwards an action to the active round and books the result once it ends.
    pub fn apply(&mut self, seat: Seat, action: PlayerAction) -> EngineResult<()> {
        let round = self.round.as_mut().ok_or_else(|| EngineError::action("no round has been started"))?;
        if round.status() != RoundStatus::Playing {
            return Err(EngineError::action("round is over"));
        }
        round.apply(seat, action)?;
        if round.status() != RoundStatus::Playing {
            self.finish_round();
        }
        Ok(())
    }

    fn finish_round(&mut self) {
        let Some(round) = self.round.as_ref() else {
            return;
        };
        let outcome = round.outcome().clone();
        for (total, delta) in self.scores.iter_mut().zip(&outcome.score_changes) {
            *total += i64::from(*delta);
        }
        self.history.push(RoundRecord {
            round_number: self.current_round,
            dealer: round.dealer(),
            status: round.status(),
            winner: outcome.winner,
            hu_types: outcome.hu_types,
            fan_count: outcome.fan_count,
            score_changes: outcome.score_changes,
        });
        self.dealer = match outcome.winner {
            Some(winner) => winner,
            None => self.round_rng(self.current_round, DEALER_STREAM).gen_range(1..=self.config.player_count),
        };
        self.current_round += 1;
    }

    pub fn to_snapshot(&self) -> MatchSnapshot {
        MatchSnapshot {
            config: self.config,
            seed: self.seed,
            scores: self.scores.clone(),
            history: self.history.clone(),
            current_round: self.current_round,
            dealer: self.dealer,
            round: self.round.as_ref().map(RoundState::to_snapshot),
        }
    }

    /// Rebuilds a match from a snapshot after checking it against its own config.
    pub fn resume(snapshot: MatchSnapshot) -> EngineResult<Self> {
        let cfg = snapshot.config;
        cfg.validate()?;
        let seats = usize::from(cfg.player_count);
        if snapshot.scores.len() != seats {
            return Err(EngineError::state(format!("{} scores for {} players", snapshot.scores.len(), seats)));
        }
        if snapshot.dealer == 0 || snapshot.dealer > cfg.player_count {
            return Err(EngineError::state(format!("dealer {} out of range", snapshot.dealer)));
        }
        if snapshot.current_round == 0
            || snapshot.current_round > cfg.total_rounds.saturating_add(1)
            || snapshot.history.len() + 1 != snapshot.current_round as usize
        {
            return Err(EngineError::state(format!(
                "round {} with {} finished rounds",
                snapshot.current_round,
                snapshot.history.len()
            )));
        }
        let mut totals = vec![0i64; seats];
        for rec in &snapshot.history {
            if rec.score_changes.len() != seats {
                return Err(EngineError::state(format!("round {} has a malformed score line", rec.round_number)));
            }
            for (total, delta) in totals.iter_mut().zip(&rec.score_changes) {
                *total += i64::from(*delta);
            }
        }
        if totals != snapshot.scores {
            return Err(EngineError::state("scores do not match the round history"));
        }

        let round = match snapshot.round {
            Some(rs) => {
                if rs.rule != cfg.rule || rs.player_count != cfg.player_count || rs.flower_variant != cfg.flower_variant {
                    return Err(EngineError::state("round does not belong to this match config"));
                }
                let round = RoundState::from_snapshot(rs)?;
                if round.status() == RoundStatus::Playing && round.dealer() != snapshot.dealer {
                    return Err(EngineError::state("round in play has a different dealer"));
                }
                Some(round)
            }
            None => None,
        };

        Ok(Self {
            config: cfg,
            seed: snapshot.seed,
            scores: snapshot.scores,
            history: snapshot.history,
            current_round: snapshot.current_round,
            dealer: snapshot.dealer,
            round,
        })
    }

    pub fn snapshot_json(&self) -> EngineResult<String> {
        self.to_snapshot().to_json()
    }

    pub fn resume_json(json: &str) -> EngineResult<Self> {
        Self::resume(MatchSnapshot::from_json(json)?)
    }

    pub fn round(&self) -> Option<&RoundState> {
        self.round.as_ref()
    }

    /// Cumulative score per seat, indexed by `seat - 1`.
    pub fn scores(&self) -> &[i64] {
        &self.scores
    }

    pub fn history(&self) -> &[RoundRecord] {
        &self.history
    }

    pub fn current_round(&self) -> u32 {
        self.current_round
    }

    /// Dealer of the next round to be dealt, or of the round in play.
    pub fn dealer(&self) -> Seat {
        self.dealer
    }

    pub fn is_finished(&self) -> bool {
        self.current_round > self.config.total_rounds
            && self.round.as_ref().map_or(true, |r| r.status() != RoundStatus::Playing)
    }
}
