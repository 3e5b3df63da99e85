// src/wall.rs
use std::collections::VecDeque;

use rand::{seq::SliceRandom, Rng};

use crate::tiles::{build_deck, FlowerVariant, Tile};

/// Remaining tiles of a round. The head feeds normal draws; the tail feeds kong and
/// flower replacement draws.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Wall {
    tiles: VecDeque<Tile>,
}

impl Wall {
    /// Builds the full deck for `variant` and applies a uniform random permutation.
    pub fn shuffled<R: Rng + ?Sized>(variant: FlowerVariant, rng: &mut R) -> Self {
        let mut deck = build_deck(variant);
        deck.shuffle(rng);
        Self { tiles: deck.into() }
    }

    /// Wall in the given order, head first. Used for rehydration and fixed test walls.
    pub fn from_tiles(tiles: Vec<Tile>) -> Self {
        Self { tiles: tiles.into() }
    }

    pub fn draw_head(&mut self) -> Option<Tile> {
        self.tiles.pop_front()
    }

    pub fn draw_tail(&mut self) -> Option<Tile> {
        self.tiles.pop_back()
    }

    /// Tile at `pos` counted from the head, without removing it.
    pub fn peek(&self, pos: usize) -> Option<Tile> {
        self.tiles.get(pos).copied()
    }

    pub fn remaining_count(&self) -> usize {
        self.tiles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tiles.is_empty()
    }

    /// Sets the wild flag on every tile equal to `wild` and clears it elsewhere.
    pub fn mark_wild(&mut self, wild: Option<Tile>) {
        for t in self.tiles.iter_mut() {
            t.is_wild = Some(*t) == wild;
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = &Tile> + '_ {
        self.tiles.iter()
    }

    pub fn to_vec(&self) -> Vec<Tile> {
        self.tiles.iter().copied().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tiles::DECK_SIZE;
    use rand::{rngs::StdRng, SeedableRng};

    #[test]
    fn same_seed_same_wall() {
        let a = Wall::shuffled(FlowerVariant::Base, &mut StdRng::seed_from_u64(7));
        let b = Wall::shuffled(FlowerVariant::Base, &mut StdRng::seed_from_u64(7));
        assert_eq!(a, b);
        assert_eq!(a.remaining_count(), DECK_SIZE);

        let mut sorted = a.to_vec();
        sorted.sort();
        let mut deck = build_deck(FlowerVariant::Base);
        deck.sort();
        assert_eq!(sorted, deck);
    }

    #[test]
    fn head_and_tail_draws() {
        let mut w = Wall::from_tiles(vec![Tile::wan(1), Tile::wan(2), Tile::wan(3)]);
        assert_eq!(w.peek(1), Some(Tile::wan(2)));
        assert_eq!(w.draw_head(), Some(Tile::wan(1)));
        assert_eq!(w.draw_tail(), Some(Tile::wan(3)));
        assert_eq!(w.remaining_count(), 1);
        assert_eq!(w.draw_tail(), Some(Tile::wan(2)));
        assert!(w.is_empty());
        assert_eq!(w.draw_head(), None);
    }

    #[test]
    fn marking_wild() {
        let mut w = Wall::from_tiles(vec![Tile::tong(4), Tile::wind(1), Tile::tong(4)]);
        w.mark_wild(Some(Tile::tong(4)));
        assert_eq!(w.iter().filter(|t| t.is_wild).count(), 2);
        w.mark_wild(None);
        assert!(w.iter().all(|t| !t.is_wild));
    }
}
