// src/tiles.rs
use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::errors::{EngineError, EngineResult};

/// Number of non-flower tile kinds (27 number tiles, 4 winds, 3 dragons).
/// Count tables used by the hand evaluator are indexed 0..NUM_KINDS.
pub const NUM_KINDS: usize = 34;

/// Every flower variant yields the same deck size.
pub const DECK_SIZE: usize = 144;

#[repr(u8)]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Suit {
    Wan = 0,
    Tong,
    Tiao,
    Wind,
    Dragon,
    Flower,
}

impl Suit {
    pub const NUMBER: [Suit; 3] = [Suit::Wan, Suit::Tong, Suit::Tiao];

    pub fn is_number(self) -> bool {
        matches!(self, Suit::Wan | Suit::Tong | Suit::Tiao)
    }

    pub fn is_honor(self) -> bool {
        matches!(self, Suit::Wind | Suit::Dragon)
    }

    pub fn max_rank(self) -> u8 {
        match self {
            Suit::Wan | Suit::Tong | Suit::Tiao => 9,
            Suit::Wind => 4,
            Suit::Dragon => 3,
            Suit::Flower => 36,
        }
    }

    /// First slot of this suit in a `[u8; NUM_KINDS]` count table.
    fn kind_offset(self) -> Option<usize> {
        match self {
            Suit::Wan => Some(0),
            Suit::Tong => Some(9),
            Suit::Tiao => Some(18),
            Suit::Wind => Some(27),
            Suit::Dragon => Some(31),
            Suit::Flower => None,
        }
    }

    fn mnemonic(self) -> &'static str {
        match self {
            Suit::Wan => "WAN",
            Suit::Tong => "TONG",
            Suit::Tiao => "TIAO",
            Suit::Wind => "FENG",
            Suit::Dragon => "JIAN",
            Suit::Flower => "HUA",
        }
    }
}

/// A physical tile. `is_wild` is round state carried by the tile while it sits in a
/// wall or hand; equality, ordering and hashing ignore it.
///
/// Serialized as its wire code, so the wild flag does not survive serialization. It is
/// re-derived from the round's wild tile on rehydration.
#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub struct Tile {
    pub suit: Suit,
    pub rank: u8,
    pub is_wild: bool,
}

const WIND_CODES: [&str; 4] = ["DONG", "NAN", "XI", "BEI"];
const DRAGON_CODES: [&str; 3] = ["ZHONG", "FA", "BAI"];
const FLOWER_CODES: [&str; 8] = ["CHUN", "XIA", "QIU", "DONGHUA", "MEI", "LAN", "ZHU", "JU"];

const WAN_GLYPHS: [char; 9] = ['🀇', '🀈', '🀉', '🀊', '🀋', '🀌', '🀍', '🀎', '🀏'];
const TONG_GLYPHS: [char; 9] = ['🀙', '🀚', '🀛', '🀜', '🀝', '🀞', '🀟', '🀠', '🀡'];
const TIAO_GLYPHS: [char; 9] = ['🀐', '🀑', '🀒', '🀓', '🀔', '🀕', '🀖', '🀗', '🀘'];
const WIND_GLYPHS: [char; 4] = ['🀀', '🀁', '🀂', '🀃'];
const DRAGON_GLYPHS: [char; 3] = ['🀄', '🀅', '🀆'];
// spring, summer, autumn, winter, plum, orchid, bamboo, chrysanthemum
const FLOWER_GLYPHS: [char; 8] = ['🀦', '🀧', '🀨', '🀩', '🀢', '🀣', '🀤', '🀥'];

impl Tile {
    /// Checked constructor.
    pub fn new(suit: Suit, rank: u8) -> EngineResult<Self> {
        if rank == 0 || rank > suit.max_rank() {
            return Err(EngineError::Parse {
                input: format!("{}{}", rank, suit.mnemonic()),
                message: format!("rank must be 1..={}", suit.max_rank()),
            });
        }
        Ok(Self { suit, rank, is_wild: false })
    }

    pub const fn wan(rank: u8) -> Self {
        assert!(rank >= 1 && rank <= 9);
        Self { suit: Suit::Wan, rank, is_wild: false }
    }

    pub const fn tong(rank: u8) -> Self {
        assert!(rank >= 1 && rank <= 9);
        Self { suit: Suit::Tong, rank, is_wild: false }
    }

    pub const fn tiao(rank: u8) -> Self {
        assert!(rank >= 1 && rank <= 9);
        Self { suit: Suit::Tiao, rank, is_wild: false }
    }

    /// 1=DONG 2=NAN 3=XI 4=BEI
    pub const fn wind(rank: u8) -> Self {
        assert!(rank >= 1 && rank <= 4);
        Self { suit: Suit::Wind, rank, is_wild: false }
    }

    /// 1=ZHONG 2=FA 3=BAI
    pub const fn dragon(rank: u8) -> Self {
        assert!(rank >= 1 && rank <= 3);
        Self { suit: Suit::Dragon, rank, is_wild: false }
    }

    pub const fn flower(rank: u8) -> Self {
        assert!(rank >= 1 && rank <= 36);
        Self { suit: Suit::Flower, rank, is_wild: false }
    }

    pub fn with_wild(self, is_wild: bool) -> Self {
        Self { is_wild, ..self }
    }

    pub fn is_flower(self) -> bool {
        self.suit == Suit::Flower
    }

    pub fn is_number(self) -> bool {
        self.suit.is_number()
    }

    pub fn is_honor(self) -> bool {
        self.suit.is_honor()
    }

    /// Whether the rank is inside its suit's range. Only hand-built tiles can fail this.
    pub fn is_valid(self) -> bool {
        (1..=self.suit.max_rank()).contains(&self.rank)
    }

    /// Slot in a `[u8; NUM_KINDS]` count table; flowers and invalid tiles have none.
    pub fn index(self) -> Option<usize> {
        if !self.is_valid() {
            return None;
        }
        self.suit.kind_offset().map(|off| off + self.rank as usize - 1)
    }

    /// Cyclic successor used to derive the wild tile from the guide tile:
    /// numbers wrap 9 -> 1 inside their suit, winds wrap BEI -> DONG,
    /// dragons and flowers map to DONG.
    pub fn next_tile(self) -> Tile {
        match self.suit {
            Suit::Wan | Suit::Tong | Suit::Tiao => Tile {
                suit: self.suit,
                rank: self.rank % 9 + 1,
                is_wild: false,
            },
            Suit::Wind => Tile::wind(self.rank % 4 + 1),
            Suit::Dragon | Suit::Flower => Tile::wind(1),
        }
    }

    /// Wire code: `5WAN`, `DONG`, `ZHONG`, `CHUN`, `HUA17`.
    ///
    /// An out-of-range rank yields `{rank}{suit}` (e.g. `0FENG`), which does not parse back.
    pub fn code(self) -> String {
        let named = match self.suit {
            Suit::Wan | Suit::Tong | Suit::Tiao => None,
            Suit::Wind => WIND_CODES.get(self.slot()),
            Suit::Dragon => DRAGON_CODES.get(self.slot()),
            Suit::Flower => FLOWER_CODES.get(self.slot()),
        };
        match named {
            Some(code) if self.is_valid() => code.to_string(),
            _ if self.suit == Suit::Flower && self.is_valid() => format!("HUA{}", self.rank),
            _ => format!("{}{}", self.rank, self.suit.mnemonic()),
        }
    }

    /// Returns the common Unicode Mahjong tile symbol
    pub fn to_unicode(self) -> char {
        let glyphs: &[char] = match self.suit {
            Suit::Wan => &WAN_GLYPHS,
            Suit::Tong => &TONG_GLYPHS,
            Suit::Tiao => &TIAO_GLYPHS,
            Suit::Wind => &WIND_GLYPHS,
            Suit::Dragon => &DRAGON_GLYPHS,
            Suit::Flower => &FLOWER_GLYPHS,
        };
        if !self.is_valid() {
            return '🀫';
        }
        glyphs.get(self.slot()).copied().unwrap_or('🀫')
    }

    /// Zero-based rank; wraps to `usize::MAX` for rank 0 so lookups miss.
    fn slot(self) -> usize {
        usize::from(self.rank).wrapping_sub(1)
    }
}

impl TryFrom<u8> for Tile {
    type Error = ();

    /// Count-table slot back to a tile.
    fn try_from(v: u8) -> Result<Self, Self::Error> {
        let v = v as usize;
        let (suit, rank) = match v {
            0..=8 => (Suit::Wan, v + 1),
            9..=17 => (Suit::Tong, v - 8),
            18..=26 => (Suit::Tiao, v - 17),
            27..=30 => (Suit::Wind, v - 26),
            31..=33 => (Suit::Dragon, v - 30),
            _ => return Err(()),
        };
        Ok(Tile { suit, rank: rank as u8, is_wild: false })
    }
}

impl PartialEq for Tile {
    fn eq(&self, other: &Self) -> bool {
        self.suit == other.suit && self.rank == other.rank
    }
}

impl Eq for Tile {}

impl Hash for Tile {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.suit.hash(state);
        self.rank.hash(state);
    }
}

impl PartialOrd for Tile {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Tile {
    fn cmp(&self, other: &Self) -> Ordering {
        (self.suit, self.rank).cmp(&(other.suit, other.rank))
    }
}

impl fmt::Display for Tile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.code())
    }
}

impl FromStr for Tile {
    type Err = EngineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let code = s.trim().to_ascii_uppercase();
        let parse_err = |message: &str| EngineError::Parse {
            input: s.to_string(),
            message: message.to_string(),
        };

        for suit in Suit::NUMBER {
            if let Some(digits) = code.strip_suffix(suit.mnemonic()) {
                let rank: u8 = digits.parse().map_err(|_| parse_err("expected a rank digit"))?;
                return Tile::new(suit, rank).map_err(|_| parse_err("rank must be 1..=9"));
            }
        }
        if let Some(i) = WIND_CODES.iter().position(|&c| c == code) {
            return Ok(Tile::wind(i as u8 + 1));
        }
        if let Some(i) = DRAGON_CODES.iter().position(|&c| c == code) {
            return Ok(Tile::dragon(i as u8 + 1));
        }
        if let Some(i) = FLOWER_CODES.iter().position(|&c| c == code) {
            return Ok(Tile::flower(i as u8 + 1));
        }
        if let Some(digits) = code.strip_prefix("HUA") {
            let rank: u8 = digits.parse().map_err(|_| parse_err("expected a flower number"))?;
            return Tile::new(Suit::Flower, rank).map_err(|_| parse_err("flower must be 1..=36"));
        }
        Err(parse_err("unknown tile code"))
    }
}

impl From<Tile> for String {
    fn from(t: Tile) -> String {
        t.code()
    }
}

impl TryFrom<String> for Tile {
    type Error = EngineError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

/// How many wind/dragon copies are converted into extra flowers.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FlowerVariant {
    /// 8 seasonal flowers, full winds and dragons.
    #[default]
    Base,
    /// 3 copies of every wind become flowers 9-20.
    Extended20,
    /// All winds and dragons become flowers 9-36.
    Extended36,
}

impl FlowerVariant {
    /// Flower mode as the host names it (8, 20, 36).
    pub fn from_code(code: u8) -> EngineResult<Self> {
        match code {
            8 => Ok(FlowerVariant::Base),
            20 => Ok(FlowerVariant::Extended20),
            36 => Ok(FlowerVariant::Extended36),
            _ => Err(EngineError::config(format!("unknown flower mode {}", code))),
        }
    }

    pub fn flower_count(self) -> u8 {
        match self {
            FlowerVariant::Base => 8,
            FlowerVariant::Extended20 => 20,
            FlowerVariant::Extended36 => 36,
        }
    }

    fn wind_copies(self) -> u8 {
        match self {
            FlowerVariant::Base => 4,
            FlowerVariant::Extended20 => 1,
            FlowerVariant::Extended36 => 0,
        }
    }

    fn dragon_copies(self) -> u8 {
        match self {
            FlowerVariant::Base | FlowerVariant::Extended20 => 4,
            FlowerVariant::Extended36 => 0,
        }
    }
}

/// Copies of `tile` in a fresh deck of the given variant.
pub fn deck_multiplicity(tile: Tile, variant: FlowerVariant) -> u8 {
    match tile.suit {
        Suit::Wan | Suit::Tong | Suit::Tiao => 4,
        Suit::Wind => variant.wind_copies(),
        Suit::Dragon => variant.dragon_copies(),
        Suit::Flower => u8::from(tile.rank <= variant.flower_count()),
    }
}

/// Every tile kind that can appear in any deck, in catalog order.
pub fn all_kinds() -> impl Iterator<Item = Tile> {
    (0u8..NUM_KINDS as u8)
        .filter_map(|i| Tile::try_from(i).ok())
        .chain((1..=36).map(Tile::flower))
}

/// Full, unshuffled deck for the variant.
pub fn build_deck(variant: FlowerVariant) -> Vec<Tile> {
    let mut deck = Vec::with_capacity(DECK_SIZE);
    for kind in all_kinds() {
        for _ in 0..deck_multiplicity(kind, variant) {
            deck.push(kind);
        }
    }
    debug_assert_eq!(deck.len(), DECK_SIZE);
    deck
}
