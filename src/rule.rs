use serde::{Deserialize, Serialize};

use crate::errors::{EngineError, EngineResult};
use crate::hand::Seat;
use crate::ruleset::RuleKind;
use crate::tiles::FlowerVariant;

/// The part of the configuration a round needs to settle a win.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ScoringRule {
    pub base_score: u32,
    pub score_cap: Option<u32>,
    /// Extra doublings added to every win.
    pub fly_count: u32,
}

impl Default for ScoringRule {
    fn default() -> Self {
        Self { base_score: 1, score_cap: None, fly_count: 0 }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MatchConfig {
    pub rule: RuleKind,
    pub flower_variant: FlowerVariant,
    pub player_count: u8,
    pub total_rounds: u32,
    pub base_score: u32,
    pub score_cap: Option<u32>,
    pub fly_count: u32,
    pub initial_dealer: Seat,

    /// Entering a turn draws automatically. When `false` the host sends `Draw`.
    pub auto_draw: bool,

    /// Fixed seed for shuffles, dice and dealer rotation; entropy when `None`.
    pub seed: Option<u64>,
    pub skip_event_logging: bool,
}

impl Default for MatchConfig {
    fn default() -> Self {
        Self::default_base()
    }
}

impl MatchConfig {
    pub fn default_base() -> Self {
        Self {
            rule: RuleKind::Base,
            flower_variant: FlowerVariant::Base,
            player_count: 4,
            total_rounds: 8,
            base_score: 1,
            score_cap: None,
            fly_count: 0,
            initial_dealer: 1,

            auto_draw: true,
            seed: None,
            skip_event_logging: false,
        }
    }

    pub fn default_extended() -> Self {
        Self {
            rule: RuleKind::Extended,
            flower_variant: FlowerVariant::Base,
            player_count: 4,
            total_rounds: 8,
            base_score: 1,
            score_cap: None,
            fly_count: 0,
            initial_dealer: 1,

            auto_draw: true,
            seed: None,
            skip_event_logging: false,
        }
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn scoring(&self) -> ScoringRule {
        ScoringRule { base_score: self.base_score, score_cap: self.score_cap, fly_count: self.fly_count }
    }

    pub fn validate(&self) -> EngineResult<()> {
        if !(2..=4).contains(&self.player_count) {
            return Err(EngineError::config(format!("player_count must be 2..=4, got {}", self.player_count)));
        }
        if self.total_rounds == 0 {
            return Err(EngineError::config("total_rounds must be at least 1"));
        }
        if self.base_score == 0 {
            return Err(EngineError::config("base_score must be at least 1"));
        }
        if self.initial_dealer == 0 || self.initial_dealer > self.player_count {
            return Err(EngineError::config(format!("initial_dealer {} is not a seat", self.initial_dealer)));
        }
        if self.rule == RuleKind::Base && self.flower_variant != FlowerVariant::Base {
            return Err(EngineError::config("extended flower modes need the extended ruleset"));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn presets_validate() {
        assert!(MatchConfig::default_base().validate().is_ok());
        assert!(MatchConfig::default_extended().validate().is_ok());
        assert_eq!(MatchConfig::default(), MatchConfig::default_base());
    }

    #[test]
    fn out_of_range_values_rejected() {
        let mut cfg = MatchConfig::default_base();
        cfg.player_count = 5;
        assert!(matches!(cfg.validate(), Err(EngineError::InvalidConfig { .. })));

        let mut cfg = MatchConfig::default_base();
        cfg.initial_dealer = 3;
        cfg.player_count = 2;
        assert!(cfg.validate().is_err());

        let mut cfg = MatchConfig::default_base();
        cfg.flower_variant = FlowerVariant::Extended36;
        assert!(cfg.validate().is_err());
        cfg.rule = RuleKind::Extended;
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn config_round_trips_through_json() {
        let cfg = MatchConfig::default_extended().with_seed(42);
        let json = serde_json::to_string(&cfg).unwrap();
        let back: MatchConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(back, cfg);
        assert_eq!(back.scoring(), ScoringRule { base_score: 1, score_cap: None, fly_count: 0 });
    }
}
