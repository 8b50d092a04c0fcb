use rand::prelude::*;

use super::*;

// The full double-six set with a deal cursor. Four deals consume the whole
// set; asking for a fifth means the table state is corrupted.
#[derive(Debug)]
pub struct TileSet {
    tiles: Vec<Tile>,
    cursor: usize,
}

impl TileSet {
    pub fn new() -> Self {
        let mut tiles = Vec::with_capacity(SET_TILES);
        for first in 0..PIP_KINDS {
            for second in 0..=first {
                tiles.push(Tile(first, second));
            }
        }
        Self { tiles, cursor: 0 }
    }

    pub fn shuffle(&mut self, rng: &mut rand::rngs::StdRng) {
        self.tiles.shuffle(rng);
        self.cursor = 0;
    }

    pub fn deal(&mut self) -> Vec<Tile> {
        assert!(
            self.cursor + HAND_TILES <= self.tiles.len(),
            "tile set exhausted"
        );
        let hand = self.tiles[self.cursor..self.cursor + HAND_TILES].to_vec();
        self.cursor += HAND_TILES;
        hand
    }
}

#[test]
fn test_full_set() {
    let set = TileSet::new();
    assert_eq!(set.tiles.len(), SET_TILES);
    for (i, a) in set.tiles.iter().enumerate() {
        for b in &set.tiles[i + 1..] {
            assert!(!a.same_tile(b), "duplicate tile {}", a);
        }
    }
    // 0+1+..+6 pips, each value appearing in 8 tile halves
    let total: usize = set.tiles.iter().map(|t| t.pip_total()).sum();
    assert_eq!(total, 168);
}

#[test]
fn test_four_deals_exhaust() {
    let mut rng: rand::rngs::StdRng = rand::SeedableRng::seed_from_u64(11);
    let mut set = TileSet::new();
    set.shuffle(&mut rng);

    let mut seen: Vec<Tile> = vec![];
    for _ in 0..SEAT {
        let hand = set.deal();
        assert_eq!(hand.len(), HAND_TILES);
        seen.extend(hand);
    }
    assert_eq!(seen.len(), SET_TILES);
    for (i, a) in seen.iter().enumerate() {
        for b in &seen[i + 1..] {
            assert!(!a.same_tile(b), "duplicate tile {}", a);
        }
    }
}

#[test]
#[should_panic(expected = "tile set exhausted")]
fn test_fifth_deal_panics() {
    let mut rng: rand::rngs::StdRng = rand::SeedableRng::seed_from_u64(11);
    let mut set = TileSet::new();
    set.shuffle(&mut rng);
    for _ in 0..SEAT {
        set.deal();
    }
    set.deal();
}
