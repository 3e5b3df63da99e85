use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::errors::EngineError;
use crate::tiles::Tile;

/// Action names as offered to a seat, without arguments.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ActionKind {
    Draw,
    Discard,
    Chi,
    Pong,
    MingKong,
    AnKong,
    BuKong,
    BuHua,
    Hu,
    Pass,
}

impl ActionKind {
    pub fn as_str(self) -> &'static str {
        match self {
            ActionKind::Draw => "DRAW",
            ActionKind::Discard => "DISCARD",
            ActionKind::Chi => "CHI",
            ActionKind::Pong => "PONG",
            ActionKind::MingKong => "MING_KONG",
            ActionKind::AnKong => "AN_KONG",
            ActionKind::BuKong => "BU_KONG",
            ActionKind::BuHua => "BU_HUA",
            ActionKind::Hu => "HU",
            ActionKind::Pass => "PASS",
        }
    }

    pub fn is_kong(self) -> bool {
        matches!(self, ActionKind::MingKong | ActionKind::AnKong | ActionKind::BuKong)
    }
}

impl fmt::Display for ActionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ActionKind {
    type Err = EngineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let kind = match s.trim().to_ascii_uppercase().as_str() {
            "DRAW" => ActionKind::Draw,
            "DISCARD" => ActionKind::Discard,
            "CHI" => ActionKind::Chi,
            "PONG" => ActionKind::Pong,
            "MING_KONG" => ActionKind::MingKong,
            "AN_KONG" => ActionKind::AnKong,
            "BU_KONG" => ActionKind::BuKong,
            "BU_HUA" => ActionKind::BuHua,
            "HU" => ActionKind::Hu,
            "PASS" => ActionKind::Pass,
            _ => {
                return Err(EngineError::Parse { input: s.to_string(), message: "unknown action".to_string() });
            }
        };
        Ok(kind)
    }
}

/// A seat's request to the round, with the arguments it needs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "tiles", rename_all = "snake_case")]
pub enum PlayerAction {
    Draw,
    Discard(Tile),
    /// The two hand tiles that complete a run with the last discard.
    Chi([Tile; 2]),
    Pong,
    MingKong,
    AnKong(Tile),
    BuKong(Tile),
    BuHua,
    Hu,
    Pass,
}

impl PlayerAction {
    pub fn kind(&self) -> ActionKind {
        match self {
            PlayerAction::Draw => ActionKind::Draw,
            PlayerAction::Discard(_) => ActionKind::Discard,
            PlayerAction::Chi(_) => ActionKind::Chi,
            PlayerAction::Pong => ActionKind::Pong,
            PlayerAction::MingKong => ActionKind::MingKong,
            PlayerAction::AnKong(_) => ActionKind::AnKong,
            PlayerAction::BuKong(_) => ActionKind::BuKong,
            PlayerAction::BuHua => ActionKind::BuHua,
            PlayerAction::Hu => ActionKind::Hu,
            PlayerAction::Pass => ActionKind::Pass,
        }
    }
}
