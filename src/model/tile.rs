use super::*;

// A domino tile. Identity is the unordered pip pair; which way it faces on
// the board is decided at placement time.
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct Tile(pub Pip, pub Pip);

// The only tile allowed to open a match's first round.
pub const OPENING_TILE: Tile = Tile(6, 6);

impl Tile {
    #[inline]
    pub fn is_double(&self) -> bool {
        self.0 == self.1
    }

    #[inline]
    pub fn has_pip(&self, pip: Pip) -> bool {
        self.0 == pip || self.1 == pip
    }

    #[inline]
    pub fn pip_total(&self) -> usize {
        self.0 + self.1
    }

    // unordered comparison
    #[inline]
    pub fn same_tile(&self, other: &Tile) -> bool {
        (self.0 == other.0 && self.1 == other.1) || (self.0 == other.1 && self.1 == other.0)
    }

    // The pip facing outwards when the tile is laid against `end`.
    #[inline]
    pub fn other_pip(&self, end: Pip) -> Pip {
        if self.0 == end {
            self.1
        } else {
            self.0
        }
    }
}

impl fmt::Display for Tile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}|{}", self.0, self.1)
    }
}

impl fmt::Debug for Tile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self)
    }
}

#[test]
fn test_tile_identity() {
    assert!(Tile(2, 5).same_tile(&Tile(5, 2)));
    assert!(Tile(2, 5).same_tile(&Tile(2, 5)));
    assert!(!Tile(2, 5).same_tile(&Tile(2, 4)));

    assert!(Tile(3, 3).is_double());
    assert!(!Tile(3, 4).is_double());
    assert!(OPENING_TILE.is_double());

    assert_eq!(Tile(6, 2).other_pip(6), 2);
    assert_eq!(Tile(6, 2).other_pip(2), 6);
    assert_eq!(Tile(4, 4).other_pip(4), 4);

    assert_eq!(Tile(3, 4).pip_total(), 7);
    assert!(Tile(0, 6).has_pip(0));
    assert!(!Tile(0, 6).has_pip(3));
}
