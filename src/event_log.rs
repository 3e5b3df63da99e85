//! Typed round event log.
//!
//! Events are pushed as plain enums while the round plays. JSON is produced only on
//! demand (replay export), via `RoundState::events_json`.

use serde::{Deserialize, Serialize};

use crate::fan_calculation::HuType;
use crate::hand::Seat;
use crate::tiles::Tile;
use crate::wildcard::Dice;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum RoundEvent {
    /// Deal finished, flowers already replaced.
    StartRound {
        dealer: Seat,
        hands: Vec<Vec<Tile>>,
    },
    WildcardResolved {
        dice: Dice,
        break_seat: Seat,
        guide: Tile,
        wild: Tile,
    },
    /// `from_tail` marks a kong replacement.
    Draw {
        actor: Seat,
        tile: Tile,
        from_tail: bool,
    },
    FlowerReplaced {
        actor: Seat,
        flower: Tile,
    },
    Discard {
        actor: Seat,
        tile: Tile,
    },
    Chi {
        actor: Seat,
        target: Seat,
        tile: Tile,
        consumed: [Tile; 2],
    },
    Pong {
        actor: Seat,
        target: Seat,
        tile: Tile,
    },
    MingKong {
        actor: Seat,
        target: Seat,
        tile: Tile,
    },
    AnKong {
        actor: Seat,
        tile: Tile,
    },
    BuKong {
        actor: Seat,
        tile: Tile,
    },
    Pass {
        actor: Seat,
    },
    Hu {
        actor: Seat,
        hu_types: Vec<HuType>,
        fan: u32,
        deltas: Vec<i32>,
    },
    /// Wall exhausted.
    RoundDraw,
}

/// Records an event unless logging is switched off for the round.
/// The event expression is not evaluated when skipped.
macro_rules! round_event {
    ($round:expr, $event:expr) => {
        if !$round.skip_event_logging {
            $round.events.push($event);
        }
    };
}
