// Type aliases
pub type Seat = usize; // table position
pub type Pip = usize; // tile face value (0..=6)
pub type Score = u32; // cumulative team score

// Number
pub const SEAT: usize = 4; // seats per table
pub const PIP_KINDS: usize = 7; // distinct pip values
pub const SET_TILES: usize = 28; // tiles in the full set
pub const HAND_TILES: usize = 7; // tiles dealt per seat

pub const SCORE_CAP: Score = 100; // a team at or above this ends the match

// Seats 0 and 2 form one team, seats 1 and 3 the other.
pub const TEAMS: usize = 2;

#[inline]
pub fn team_of(seat: Seat) -> usize {
    seat % TEAMS
}

#[inline]
pub fn next_seat(seat: Seat) -> Seat {
    (seat + 1) % SEAT
}
