use super::*;

// Which open end of the line a tile is placed on. Carried on the wire as the
// `place_first` flag.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    First,
    Last,
}

// The line of played tiles. Tiles are kept in play order; the two open end
// values always equal the outward pip of the most recent tile on each side.
#[derive(Debug, Default)]
pub struct Board {
    played: Vec<(Tile, Side)>,
    ends: Option<(Pip, Pip)>, // (first end, last end)
}

impl Board {
    pub fn clear(&mut self) {
        self.played.clear();
        self.ends = None;
    }

    pub fn is_empty(&self) -> bool {
        self.ends.is_none()
    }

    pub fn ends(&self) -> Option<(Pip, Pip)> {
        self.ends
    }

    pub fn played(&self) -> &[(Tile, Side)] {
        &self.played
    }

    pub fn can_play(&self, tile: Tile, opening_round: bool) -> bool {
        match self.ends {
            None => !opening_round || tile.same_tile(&OPENING_TILE),
            Some((first, last)) => tile.has_pip(first) || tile.has_pip(last),
        }
    }

    pub fn can_play_at(&self, tile: Tile, side: Side, opening_round: bool) -> bool {
        match self.ends {
            None => !opening_round || tile.same_tile(&OPENING_TILE),
            Some((first, last)) => tile.has_pip(match side {
                Side::First => first,
                Side::Last => last,
            }),
        }
    }

    // Side selection for an automatic play: the first end takes precedence.
    // Only meaningful for a tile that passed `can_play`.
    pub fn auto_side(&self, tile: Tile) -> Side {
        match self.ends {
            None => Side::First,
            Some((first, _)) => {
                if tile.has_pip(first) {
                    Side::First
                } else {
                    Side::Last
                }
            }
        }
    }

    // Appends a tile the caller has already validated with `can_play_at`.
    pub fn place(&mut self, tile: Tile, side: Side) {
        self.ends = match self.ends {
            None => Some((tile.0, tile.1)),
            Some((first, last)) => match side {
                Side::First => Some((tile.other_pip(first), last)),
                Side::Last => Some((first, tile.other_pip(last))),
            },
        };
        self.played.push((tile, side));
    }
}

#[test]
fn test_opening_rules() {
    let board = Board::default();

    // a match's first round must open with the double six
    assert!(board.can_play(Tile(6, 6), true));
    assert!(!board.can_play(Tile(6, 5), true));
    assert!(!board.can_play_at(Tile(6, 5), Side::First, true));
    assert!(board.can_play_at(Tile(6, 6), Side::Last, true));

    // later rounds open with anything
    assert!(board.can_play(Tile(0, 3), false));
    assert!(board.can_play_at(Tile(0, 3), Side::Last, false));
}

#[test]
fn test_opening_placement() {
    let mut board = Board::default();
    assert!(board.is_empty());
    board.place(Tile(6, 6), Side::First);
    assert!(!board.is_empty());
    assert_eq!(board.ends(), Some((6, 6)));
    assert_eq!(board.played().len(), 1);

    board.clear();
    assert!(board.is_empty());
    assert_eq!(board.ends(), None);
}

#[test]
fn test_end_updates() {
    // ends (6,2): play 2|5 on the last side, then 6|3 on the first side
    let mut board = Board::default();
    board.place(Tile(6, 2), Side::First);
    assert_eq!(board.ends(), Some((6, 2)));

    assert!(board.can_play_at(Tile(2, 5), Side::Last, false));
    assert!(!board.can_play_at(Tile(2, 5), Side::First, false));
    board.place(Tile(2, 5), Side::Last);
    assert_eq!(board.ends(), Some((6, 5)));

    assert!(board.can_play_at(Tile(6, 3), Side::First, false));
    board.place(Tile(6, 3), Side::First);
    assert_eq!(board.ends(), Some((3, 5)));
}

#[test]
fn test_match_either_end() {
    let mut board = Board::default();
    board.place(Tile(6, 2), Side::First);

    // either pip against either end
    assert!(board.can_play(Tile(6, 4), false));
    assert!(board.can_play(Tile(4, 6), false));
    assert!(board.can_play(Tile(2, 0), false));
    assert!(!board.can_play(Tile(3, 4), false));

    assert_eq!(board.auto_side(Tile(4, 6)), Side::First);
    assert_eq!(board.auto_side(Tile(2, 0)), Side::Last);
}

#[test]
fn test_double_keeps_end() {
    let mut board = Board::default();
    board.place(Tile(6, 2), Side::First);
    board.place(Tile(6, 6), Side::First);
    assert_eq!(board.ends(), Some((6, 2)));
}
