use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::action::PlayerAction;
use crate::errors::{EngineError, EngineResult};
use crate::hand::Seat;
use crate::match_state::{Match, MatchSnapshot};
use crate::rule::MatchConfig;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct MatchId(pub u64);

/// Live matches owned by the host. Matches are added on creation and removed
/// explicitly once they end.
#[derive(Debug, Default)]
pub struct MatchRegistry {
    matches: HashMap<MatchId, Match>,
    next_id: u64,
}

impl MatchRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn create(&mut self, config: MatchConfig) -> EngineResult<MatchId> {
        let m = Match::new(config)?;
        self.next_id += 1;
        let id = MatchId(self.next_id);
        self.matches.insert(id, m);
        Ok(id)
    }

    /// Registers a match rebuilt from a saved snapshot under a fresh id.
    pub fn restore(&mut self, snapshot: MatchSnapshot) -> EngineResult<MatchId> {
        let m = Match::resume(snapshot)?;
        self.next_id += 1;
        let id = MatchId(self.next_id);
        self.matches.insert(id, m);
        Ok(id)
    }

    pub fn get(&self, id: MatchId) -> Option<&Match> {
        self.matches.get(&id)
    }

    pub fn get_mut(&mut self, id: MatchId) -> Option<&mut Match> {
        self.matches.get_mut(&id)
    }

    pub fn submit(&mut self, id: MatchId, seat: Seat, action: PlayerAction) -> EngineResult<()> {
        self.matches
            .get_mut(&id)
            .ok_or_else(|| EngineError::action(format!("no match with id {}", id.0)))?
            .apply(seat, action)
    }

    pub fn evict(&mut self, id: MatchId) -> Option<Match> {
        self.matches.remove(&id)
    }

    /// Drops every finished match and returns their ids, sorted.
    pub fn evict_finished(&mut self) -> Vec<MatchId> {
        let mut done: Vec<MatchId> = self.matches.iter().filter(|(_, m)| m.is_finished()).map(|(&id, _)| id).collect();
        done.sort();
        for id in &done {
            self.matches.remove(id);
        }
        done
    }

    pub fn len(&self) -> usize {
        self.matches.len()
    }

    pub fn is_empty(&self) -> bool {
        self.matches.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game_state::RoundStatus;

    #[test]
    fn create_submit_evict() {
        let mut reg = MatchRegistry::new();
        let a = reg.create(MatchConfig::default_base().with_seed(1)).unwrap();
        let b = reg.create(MatchConfig::default_extended().with_seed(2)).unwrap();
        assert_ne!(a, b);
        assert_eq!(reg.len(), 2);

        assert!(reg.submit(MatchId(99), 1, PlayerAction::Pass).is_err());
        reg.get_mut(a).unwrap().start_round().unwrap();
        let dealer_tile = reg.get(a).unwrap().round().unwrap().hand(1).unwrap()[0];
        reg.submit(a, 1, PlayerAction::Discard(dealer_tile)).unwrap();
        assert_eq!(reg.get(a).unwrap().round().unwrap().status(), RoundStatus::Playing);

        assert!(reg.evict_finished().is_empty());
        assert!(reg.evict(b).is_some());
        assert!(reg.get(b).is_none());
        assert_eq!(reg.len(), 1);
    }

    #[test]
    fn saved_match_comes_back_under_a_new_id() {
        let mut reg = MatchRegistry::new();
        let a = reg.create(MatchConfig::default_base().with_seed(9)).unwrap();
        reg.get_mut(a).unwrap().start_round().unwrap();
        let saved = reg.evict(a).unwrap().to_snapshot();

        let b = reg.restore(saved.clone()).unwrap();
        assert_ne!(a, b);
        assert_eq!(reg.get(b).unwrap().to_snapshot(), saved);

        let mut broken = saved;
        broken.scores.pop();
        assert!(reg.restore(broken).is_err());
        assert_eq!(reg.len(), 1);
    }

    #[test]
    fn bad_config_creates_nothing() {
        let mut reg = MatchRegistry::new();
        let mut cfg = MatchConfig::default_base();
        cfg.player_count = 1;
        assert!(reg.create(cfg).is_err());
        assert!(reg.is_empty());
    }
}
