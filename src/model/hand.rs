use super::*;

// A seat's unplayed tiles. Only the table mutates hands.
#[derive(Debug, Default)]
pub struct Hand {
    tiles: Vec<Tile>,
}

impl Hand {
    pub fn new(tiles: Vec<Tile>) -> Self {
        Self { tiles }
    }

    pub fn tiles(&self) -> &[Tile] {
        &self.tiles
    }

    pub fn len(&self) -> usize {
        self.tiles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tiles.is_empty()
    }

    pub fn contains(&self, tile: Tile) -> bool {
        self.tiles.iter().any(|t| t.same_tile(&tile))
    }

    // Removes one tile matching the unordered identity.
    pub fn remove(&mut self, tile: Tile) -> bool {
        match self.tiles.iter().position(|t| t.same_tile(&tile)) {
            Some(i) => {
                self.tiles.remove(i);
                true
            }
            None => false,
        }
    }

    pub fn has_opening_tile(&self) -> bool {
        self.contains(OPENING_TILE)
    }

    // Combined pips of all held tiles, used when scoring a finished round.
    pub fn pip_total(&self) -> usize {
        self.tiles.iter().map(|t| t.pip_total()).sum()
    }
}

#[test]
fn test_hand_queries() {
    let mut hand = Hand::new(vec![Tile(6, 6), Tile(2, 5), Tile(0, 3)]);
    assert!(hand.has_opening_tile());
    assert_eq!(hand.pip_total(), 12 + 7 + 3);
    assert_eq!(hand.len(), 3);

    // removal matches the unordered identity
    assert!(hand.remove(Tile(5, 2)));
    assert!(!hand.contains(Tile(2, 5)));
    assert!(!hand.remove(Tile(2, 5)));
    assert_eq!(hand.pip_total(), 15);

    assert!(hand.remove(Tile(6, 6)));
    assert!(!hand.has_opening_tile());
    assert!(hand.remove(Tile(0, 3)));
    assert!(hand.is_empty());
}
