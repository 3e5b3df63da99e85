// src/lib.rs
#[macro_use]
pub mod event_log;

pub mod action;
pub mod errors;
pub mod fan_calculation;
pub mod game_state;
pub mod hand;
pub mod hand_parser;
pub mod match_state;
pub mod registry;
pub mod rule;
pub mod ruleset;
pub mod settlement;
pub mod snapshot;
pub mod tiles;
pub mod wall;
pub mod wildcard;

#[cfg(feature = "python")]
pub mod python;

pub use action::{ActionKind, PlayerAction};
pub use errors::{EngineError, EngineResult};
pub use event_log::RoundEvent;
pub use fan_calculation::HuType;
pub use game_state::{LastAction, Phase, RoundOutcome, RoundState, RoundStatus};
pub use hand::{HandState, Meld, MeldKind, Seat};
pub use match_state::{Match, MatchSnapshot, RoundRecord};
pub use registry::{MatchId, MatchRegistry};
pub use rule::{MatchConfig, ScoringRule};
pub use ruleset::{BaseRules, ExtendedRules, RuleKind, Ruleset};
pub use snapshot::RoundSnapshot;
pub use tiles::{FlowerVariant, Suit, Tile};
pub use wall::Wall;
pub use wildcard::{Dice, WildcardInfo};
