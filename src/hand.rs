use serde::{Deserialize, Serialize};

use crate::tiles::{Tile, NUM_KINDS};

/// 1-based seat number.
pub type Seat = u8;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MeldKind {
    Chi,
    Pong,
    ConcealedKong,
    ExposedKong,
    PromotedKong,
}

impl MeldKind {
    pub fn is_kong(self) -> bool {
        matches!(self, MeldKind::ConcealedKong | MeldKind::ExposedKong | MeldKind::PromotedKong)
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Meld {
    pub kind: MeldKind,
    pub tiles: Vec<Tile>,
    /// Seat the claimed tile came from; `None` for self-formed melds.
    pub source_seat: Option<Seat>,
    pub concealed: bool,
}

impl Meld {
    pub fn chi(mut tiles: [Tile; 3], from: Seat) -> Self {
        tiles.sort();
        Self { kind: MeldKind::Chi, tiles: tiles.to_vec(), source_seat: Some(from), concealed: false }
    }

    pub fn pong(tile: Tile, from: Seat) -> Self {
        Self { kind: MeldKind::Pong, tiles: vec![tile; 3], source_seat: Some(from), concealed: false }
    }

    pub fn exposed_kong(tile: Tile, from: Seat) -> Self {
        Self { kind: MeldKind::ExposedKong, tiles: vec![tile; 4], source_seat: Some(from), concealed: false }
    }

    pub fn concealed_kong(tile: Tile) -> Self {
        Self { kind: MeldKind::ConcealedKong, tiles: vec![tile; 4], source_seat: None, concealed: true }
    }

    /// First tile; for pong/kong every tile is the same.
    pub fn base_tile(&self) -> Option<Tile> {
        self.tiles.first().copied()
    }

    pub fn is_kong(&self) -> bool {
        self.kind.is_kong()
    }
}

/// Everything one seat holds: concealed hand, exposed melds, discard pile and flower pile.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HandState {
    pub concealed: Vec<Tile>,
    pub melds: Vec<Meld>,
    pub discards: Vec<Tile>,
    pub flowers: Vec<Tile>,
}

impl HandState {
    pub fn add(&mut self, tile: Tile) {
        self.concealed.push(tile);
    }

    pub fn sort(&mut self) {
        self.concealed.sort();
    }

    /// Copies of `tile` held concealed, wild or not.
    pub fn count(&self, tile: Tile) -> usize {
        self.concealed.iter().filter(|&&t| t == tile).count()
    }

    /// Copies of `tile` held concealed that are not currently wild.
    pub fn count_natural(&self, tile: Tile) -> usize {
        self.concealed.iter().filter(|&&t| t == tile && !t.is_wild).count()
    }

    pub fn wild_count(&self) -> usize {
        self.concealed.iter().filter(|t| t.is_wild).count()
    }

    /// Removes one copy of `tile`, returning the removed tile (with its wild flag).
    pub fn remove(&mut self, tile: Tile) -> Option<Tile> {
        let pos = self.concealed.iter().position(|&t| t == tile)?;
        Some(self.concealed.remove(pos))
    }

    /// Removes `n` natural copies of `tile`. Leaves the hand untouched and returns false
    /// when fewer than `n` are held.
    pub fn remove_natural(&mut self, tile: Tile, n: usize) -> bool {
        if self.count_natural(tile) < n {
            return false;
        }
        let mut left = n;
        self.concealed.retain(|&t| {
            if left > 0 && t == tile && !t.is_wild {
                left -= 1;
                false
            } else {
                true
            }
        });
        true
    }

    pub fn has_flower(&self) -> bool {
        self.concealed.iter().any(|t| t.is_flower())
    }

    /// Moves every concealed flower to the flower pile and returns how many moved.
    pub fn take_flowers(&mut self) -> usize {
        let before = self.flowers.len();
        let (flowers, rest): (Vec<Tile>, Vec<Tile>) =
            self.concealed.drain(..).partition(|t| t.is_flower());
        self.concealed = rest;
        self.flowers.extend(flowers);
        self.flowers.len() - before
    }

    /// `concealed + 3 × melds`; 14 while the seat must discard, 13 otherwise.
    pub fn size_units(&self) -> usize {
        self.concealed.len() + 3 * self.melds.len()
    }

    /// Count table of non-wild, non-flower concealed tiles.
    pub fn natural_counts(&self) -> [u8; NUM_KINDS] {
        let mut counts = [0u8; NUM_KINDS];
        for t in self.concealed.iter().filter(|t| !t.is_wild) {
            if let Some(i) = t.index() {
                counts[i] += 1;
            }
        }
        counts
    }

    /// Count table of all non-flower concealed tiles, wild ones included.
    pub fn all_counts(&self) -> [u8; NUM_KINDS] {
        let mut counts = [0u8; NUM_KINDS];
        for t in &self.concealed {
            if let Some(i) = t.index() {
                counts[i] += 1;
            }
        }
        counts
    }

    pub fn pong_meld_index(&self, tile: Tile) -> Option<usize> {
        self.melds
            .iter()
            .position(|m| m.kind == MeldKind::Pong && m.base_tile() == Some(tile))
    }

    /// Every tile this seat owns in any pile.
    pub fn all_tiles(&self) -> impl Iterator<Item = &Tile> + '_ {
        self.concealed
            .iter()
            .chain(self.melds.iter().flat_map(|m| m.tiles.iter()))
            .chain(self.discards.iter())
            .chain(self.flowers.iter())
    }

    /// Re-applies the wild flag after rehydration: concealed tiles matching `wild` are wild,
    /// all others natural.
    pub fn mark_wild(&mut self, wild: Option<Tile>) {
        for t in self.concealed.iter_mut() {
            t.is_wild = Some(*t) == wild;
        }
    }
}
