use std::fmt;
use std::sync::mpsc::Sender;

use crate::model::*;
use crate::{debug, info};

// Frames queued here are flushed to the socket by the seat's session loop.
pub type Outbox = Sender<String>;

#[derive(Debug, Clone)]
pub struct PlayerHandle {
    pub user_id: String,
    pub user_name: String,
    pub outbox: Outbox,
}

// A seat either belongs to a connected human or is played by the table
// itself. Clients are never told which is which.
#[derive(Debug)]
pub enum SeatKind {
    Human(PlayerHandle),
    Automatic,
}

impl SeatKind {
    #[inline]
    pub fn is_human(&self) -> bool {
        matches!(self, SeatKind::Human(_))
    }

    #[inline]
    pub fn handle(&self) -> Option<&PlayerHandle> {
        match self {
            SeatKind::Human(h) => Some(h),
            SeatKind::Automatic => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Waiting,
    InRound,
    RoundOver { winner: Seat },
    MatchOver,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlayError {
    RoundNotActive,
    NotYourTurn,
    UnheldTile,
    IllegalMove,
    CannotPass,
}

impl fmt::Display for PlayError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}",
            match self {
                PlayError::RoundNotActive => "no round is in progress",
                PlayError::NotYourTurn => "it is not your turn",
                PlayError::UnheldTile => "that tile is not in your hand",
                PlayError::IllegalMove => "that tile cannot be played there",
                PlayError::CannotPass => "you still have a playable tile",
            }
        )
    }
}

// One table of four seats. All mutation happens under the owning mutex, one
// action at a time; broadcasts go out before the lock is released so seated
// clients observe events in table order.
#[derive(Debug)]
pub struct Table {
    seats: [SeatKind; SEAT],
    hands: [Hand; SEAT],
    board: Board,
    tile_set: TileSet,
    rng: rand::rngs::StdRng,
    phase: Phase,
    turn: Seat,
    starter: Seat,
    passes: usize,
    scores: [Score; TEAMS],
    opening_round: bool,
}

impl Table {
    pub fn new(seats: [SeatKind; SEAT], seed: u64) -> Self {
        Self {
            seats,
            hands: [(); SEAT].map(|_| Hand::default()),
            board: Board::default(),
            tile_set: TileSet::new(),
            rng: rand::SeedableRng::seed_from_u64(seed),
            phase: Phase::Waiting,
            turn: 0,
            starter: 0,
            passes: 0,
            scores: [0; TEAMS],
            opening_round: true,
        }
    }

    #[inline]
    pub fn is_over(&self) -> bool {
        self.phase == Phase::MatchOver
    }

    // Deals the first round and runs the table up to the first human turn.
    pub fn start_match(&mut self) {
        self.start_round(None);
        self.pump();
    }

    // A named starter continues the match; `None` hands the opening to
    // whichever seat was dealt the double six.
    fn start_round(&mut self, starter: Option<Seat>) {
        self.tile_set.shuffle(&mut self.rng);
        self.hands = [(); SEAT].map(|_| Hand::new(self.tile_set.deal()));
        self.board.clear();
        self.passes = 0;

        let starter = starter.unwrap_or_else(|| {
            // exactly one dealt hand holds the double six
            (0..SEAT)
                .find(|&s| self.hands[s].has_opening_tile())
                .unwrap()
        });
        self.starter = starter;
        self.turn = starter;
        self.phase = Phase::InRound;

        info!("round started, seat {} opens", starter);
        self.announce_round();
    }

    fn announce_round(&self) {
        let players: Vec<PlayerInfo> = self
            .seats
            .iter()
            .filter_map(|k| k.handle())
            .map(|h| PlayerInfo {
                user_id: h.user_id.clone(),
                user_name: h.user_name.clone(),
            })
            .collect();

        for s in 0..SEAT {
            if self.seats[s].is_human() {
                let hand = self.hands[s].tiles().iter().map(|&t| Chip::from(t)).collect();
                self.send_to(
                    s,
                    &ServerMessage::GameReady {
                        hand,
                        start: s == self.starter,
                        players: players.clone(),
                    },
                );
            }
        }
    }

    pub fn apply_play(&mut self, seat: Seat, chip: Chip) -> Result<(), PlayError> {
        if !matches!(self.phase, Phase::InRound) {
            return Err(PlayError::RoundNotActive);
        }
        if seat != self.turn {
            return Err(PlayError::NotYourTurn);
        }
        let (tile, side) = (chip.tile(), chip.side());
        if !self.hands[seat].contains(tile) {
            return Err(PlayError::UnheldTile);
        }
        if !self.board.can_play_at(tile, side, self.opening_round) {
            return Err(PlayError::IllegalMove);
        }

        self.hands[seat].remove(tile);
        self.play_tile(seat, tile, side);
        self.pump();
        Ok(())
    }

    pub fn apply_pass(&mut self, seat: Seat) -> Result<(), PlayError> {
        if !matches!(self.phase, Phase::InRound) {
            return Err(PlayError::RoundNotActive);
        }
        if seat != self.turn {
            return Err(PlayError::NotYourTurn);
        }
        let playable = self.hands[seat]
            .tiles()
            .iter()
            .any(|&t| self.board.can_play(t, self.opening_round));
        if playable {
            return Err(PlayError::CannotPass);
        }

        self.pass_turn(seat);
        self.pump();
        Ok(())
    }

    // The connection is gone for good; the seat plays itself from here on.
    pub fn detach_seat(&mut self, seat: Seat) {
        if !self.seats[seat].is_human() {
            return;
        }
        info!("seat {} lost its player, now automatic", seat);
        self.seats[seat] = SeatKind::Automatic;
        if matches!(self.phase, Phase::InRound) && self.turn == seat {
            self.pump();
        }
    }

    // Drives the table forward: automatic seats act, finished rounds chain
    // into the next one, and the pending human seat gets its turn notice.
    fn pump(&mut self) {
        loop {
            match self.phase {
                Phase::InRound => {
                    if self.seats[self.turn].is_human() {
                        self.send_to(self.turn, &ServerMessage::PlayerTurn {});
                        return;
                    }
                    self.auto_act(self.turn);
                }
                Phase::RoundOver { winner } => self.finish_round(winner),
                Phase::Waiting | Phase::MatchOver => return,
            }
        }
    }

    fn auto_act(&mut self, seat: Seat) {
        let pick = self.hands[seat]
            .tiles()
            .iter()
            .copied()
            .find(|&t| self.board.can_play(t, self.opening_round));
        match pick {
            Some(tile) => {
                let side = self.board.auto_side(tile);
                self.hands[seat].remove(tile);
                debug!("seat {} auto-plays {}", seat, tile);
                self.play_tile(seat, tile, side);
            }
            None => {
                debug!("seat {} auto-passes", seat);
                self.pass_turn(seat);
            }
        }
    }

    fn play_tile(&mut self, seat: Seat, tile: Tile, side: Side) {
        self.board.place(tile, side);
        self.passes = 0;

        let line = self
            .board
            .played()
            .iter()
            .map(|&(t, sd)| Chip::placed(t, sd))
            .collect();
        self.broadcast(&ServerMessage::PlayerPlayed {
            chip: Chip::placed(tile, side),
            player: seat,
            line,
        });

        if self.hands[seat].is_empty() {
            self.victory(seat);
        } else {
            self.turn = next_seat(seat);
        }
    }

    fn pass_turn(&mut self, seat: Seat) {
        self.passes += 1;
        if self.passes >= SEAT {
            self.blocked_closure();
        } else {
            self.turn = next_seat(seat);
        }
    }

    // The winning team takes the combined pips of both opposing hands.
    fn victory(&mut self, seat: Seat) {
        let team = team_of(seat);
        let opponents = 1 - team;
        let total =
            self.hands[opponents].pip_total() + self.hands[opponents + 2].pip_total();
        self.scores[team] += total as Score;
        info!("seat {} takes the round, {} points", seat, total);
        self.phase = Phase::RoundOver { winner: seat };
    }

    // Four consecutive passes: the team with fewer pips left wins, ties go to
    // the seat that opened the round.
    fn blocked_closure(&mut self) {
        let first = self.hands[0].pip_total() + self.hands[2].pip_total();
        let second = self.hands[1].pip_total() + self.hands[3].pip_total();
        info!("round blocked: {} vs {} pips", first, second);
        let winner = if first < second {
            0
        } else if second < first {
            1
        } else {
            self.starter
        };
        self.victory(winner);
    }

    fn finish_round(&mut self, winner: Seat) {
        self.broadcast(&ServerMessage::Winner {
            winner,
            first_score: self.scores[0],
            second_score: self.scores[1],
        });

        if self.scores.iter().any(|&s| s >= SCORE_CAP) {
            info!("match over: {} - {}", self.scores[0], self.scores[1]);
            self.phase = Phase::MatchOver;
        } else {
            self.opening_round = false;
            self.start_round(Some(winner));
        }
    }

    fn send_to(&self, seat: Seat, msg: &ServerMessage) {
        if let SeatKind::Human(h) = &self.seats[seat] {
            // best effort: a torn-down session just drops the frame
            h.outbox.send(msg.to_frame()).ok();
        }
    }

    fn broadcast(&self, msg: &ServerMessage) {
        let frame = msg.to_frame();
        for kind in &self.seats {
            if let SeatKind::Human(h) = kind {
                h.outbox.send(frame.clone()).ok();
            }
        }
    }
}

#[cfg(test)]
use std::sync::mpsc::{channel, Receiver};

#[cfg(test)]
fn human_seat(id: &str) -> (SeatKind, Receiver<String>) {
    let (tx, rx) = channel();
    let kind = SeatKind::Human(PlayerHandle {
        user_id: id.to_string(),
        user_name: id.to_uppercase(),
        outbox: tx,
    });
    (kind, rx)
}

#[cfg(test)]
fn drain(rx: &Receiver<String>) -> Vec<ServerMessage> {
    let mut out = vec![];
    while let Ok(frame) = rx.try_recv() {
        out.push(serde_json::from_str(&frame).unwrap());
    }
    out
}

#[cfg(test)]
fn all_human_table(seed: u64) -> (Table, Vec<Receiver<String>>) {
    let (k0, r0) = human_seat("u0");
    let (k1, r1) = human_seat("u1");
    let (k2, r2) = human_seat("u2");
    let (k3, r3) = human_seat("u3");
    (Table::new([k0, k1, k2, k3], seed), vec![r0, r1, r2, r3])
}

#[test]
fn test_first_deal() {
    let (mut table, rxs) = all_human_table(7);
    table.start_match();

    let mut starters = 0;
    let mut all_tiles: Vec<Tile> = vec![];
    for (s, rx) in rxs.iter().enumerate() {
        let msgs = drain(rx);
        match &msgs[0] {
            ServerMessage::GameReady {
                hand,
                start,
                players,
            } => {
                assert_eq!(hand.len(), HAND_TILES);
                assert_eq!(players.len(), SEAT);
                all_tiles.extend(hand.iter().map(|c| c.tile()));
                if *start {
                    starters += 1;
                    assert_eq!(s, table.starter);
                    assert!(hand.iter().any(|c| c.tile().same_tile(&OPENING_TILE)));
                    assert!(matches!(msgs[1], ServerMessage::PlayerTurn {}));
                }
            }
            other => panic!("expected GAME_READY, got {:?}", other),
        }
    }
    assert_eq!(starters, 1);

    // the four hands are the whole set
    assert_eq!(all_tiles.len(), SET_TILES);
    for (i, a) in all_tiles.iter().enumerate() {
        for b in &all_tiles[i + 1..] {
            assert!(!a.same_tile(b));
        }
    }
}

#[test]
fn test_opening_tile_rule() {
    let (mut table, rxs) = all_human_table(3);
    table.start_match();
    let starter = table.starter;

    // a tile other than 6|6 cannot open the match
    let other = table.hands[starter]
        .tiles()
        .iter()
        .copied()
        .find(|t| !t.same_tile(&OPENING_TILE))
        .unwrap();
    assert_eq!(
        table.apply_play(starter, Chip::placed(other, Side::First)),
        Err(PlayError::IllegalMove)
    );

    // nobody else may move first
    assert_eq!(
        table.apply_pass(next_seat(starter)),
        Err(PlayError::NotYourTurn)
    );

    assert!(table
        .apply_play(starter, Chip::placed(OPENING_TILE, Side::First))
        .is_ok());
    assert_eq!(table.board.ends(), Some((6, 6)));
    assert_eq!(table.turn, next_seat(starter));

    for rx in &rxs {
        drain(rx);
    }
}

#[test]
fn test_round_to_victory() {
    let (mut table, rxs) = all_human_table(1);
    table.phase = Phase::InRound;
    table.opening_round = false;
    table.turn = 0;
    table.starter = 0;
    table.hands = [
        Hand::new(vec![Tile(6, 2), Tile(1, 1)]),
        Hand::new(vec![Tile(2, 5), Tile(1, 2)]),
        Hand::new(vec![Tile(6, 3)]),
        Hand::new(vec![Tile(0, 0), Tile(0, 1)]),
    ];

    assert_eq!(
        table.apply_play(1, Chip::placed(Tile(2, 5), Side::Last)),
        Err(PlayError::NotYourTurn)
    );
    assert_eq!(table.apply_pass(0), Err(PlayError::CannotPass));
    assert_eq!(
        table.apply_play(0, Chip::placed(Tile(5, 5), Side::First)),
        Err(PlayError::UnheldTile)
    );

    assert!(table.apply_play(0, Chip::placed(Tile(6, 2), Side::First)).is_ok());
    assert_eq!(table.board.ends(), Some((6, 2)));
    assert!(table.apply_play(1, Chip::placed(Tile(2, 5), Side::Last)).is_ok());
    assert_eq!(table.board.ends(), Some((6, 5)));

    // seat 2 empties its hand: team {0,2} scores the opposing pips
    assert!(table.apply_play(2, Chip::placed(Tile(6, 3), Side::First)).is_ok());
    assert_eq!(table.scores, [4, 0]);

    let msgs = drain(&rxs[0]);
    let winner = msgs.iter().find_map(|m| match m {
        ServerMessage::Winner {
            winner,
            first_score,
            second_score,
        } => Some((*winner, *first_score, *second_score)),
        _ => None,
    });
    assert_eq!(winner, Some((2, 4, 0)));

    // the next round was dealt with the round's winner opening it
    assert!(matches!(table.phase, Phase::InRound));
    assert_eq!(table.starter, 2);
    assert_eq!(table.turn, 2);
    assert_eq!(table.hands.iter().map(Hand::len).sum::<usize>(), SET_TILES);
    let ready = drain(&rxs[2]);
    assert!(ready
        .iter()
        .any(|m| matches!(m, ServerMessage::GameReady { start: true, .. })));
}

#[test]
fn test_blocked_closure() {
    let (mut table, rxs) = all_human_table(1);
    table.phase = Phase::InRound;
    table.opening_round = false;
    table.turn = 0;
    table.starter = 0;
    table.board.place(Tile(3, 5), Side::First);
    table.hands = [
        Hand::new(vec![Tile(6, 6)]),
        Hand::new(vec![Tile(1, 1)]),
        Hand::new(vec![Tile(2, 2)]),
        Hand::new(vec![Tile(0, 0)]),
    ];

    // nothing matches the (3,5) ends: plays are rejected, passes are legal
    assert_eq!(
        table.apply_play(0, Chip::placed(Tile(6, 6), Side::First)),
        Err(PlayError::IllegalMove)
    );
    assert!(table.apply_pass(0).is_ok());
    assert!(table.apply_pass(1).is_ok());
    assert!(table.apply_pass(2).is_ok());
    assert!(table.apply_pass(3).is_ok());

    // team {1,3} held 2 pips against 16: it wins and scores the higher total
    assert_eq!(table.scores, [0, 16]);
    let msgs = drain(&rxs[3]);
    assert!(msgs.iter().any(|m| matches!(
        m,
        ServerMessage::Winner {
            winner: 1,
            first_score: 0,
            second_score: 16,
        }
    )));
    assert_eq!(table.starter, 1);
}

#[test]
fn test_blocked_tie_goes_to_starter() {
    let (mut table, _rxs) = all_human_table(1);
    table.phase = Phase::InRound;
    table.opening_round = false;
    table.turn = 2;
    table.starter = 2;
    table.board.place(Tile(6, 6), Side::First);
    table.hands = [
        Hand::new(vec![Tile(1, 1)]),
        Hand::new(vec![Tile(2, 3)]),
        Hand::new(vec![Tile(0, 3)]),
        Hand::new(vec![Tile(0, 0)]),
    ];

    assert!(table.apply_pass(2).is_ok());
    assert!(table.apply_pass(3).is_ok());
    assert!(table.apply_pass(0).is_ok());
    assert!(table.apply_pass(1).is_ok());

    // 5 pips each: the starter's team takes the round
    assert_eq!(table.scores, [5, 0]);
    assert_eq!(table.starter, 2);
}

#[test]
fn test_auto_play_cycles_turns() {
    let (k0, r0) = human_seat("u0");
    let mut table = Table::new(
        [k0, SeatKind::Automatic, SeatKind::Automatic, SeatKind::Automatic],
        1,
    );
    table.phase = Phase::InRound;
    table.opening_round = false;
    table.turn = 1;
    table.starter = 1;
    table.hands = [
        Hand::new(vec![Tile(6, 4), Tile(1, 3)]),
        Hand::new(vec![Tile(6, 2), Tile(0, 1)]),
        Hand::new(vec![Tile(2, 5), Tile(0, 2)]),
        Hand::new(vec![Tile(5, 5), Tile(0, 4)]),
    ];

    table.pump();

    // the three automatic seats act in strict cyclic order, then the human
    // is notified
    let msgs = drain(&r0);
    let players: Vec<Seat> = msgs
        .iter()
        .filter_map(|m| match m {
            ServerMessage::PlayerPlayed { player, .. } => Some(*player),
            _ => None,
        })
        .collect();
    assert_eq!(players, vec![1, 2, 3]);
    assert!(matches!(msgs.last(), Some(ServerMessage::PlayerTurn {})));
    assert_eq!(table.turn, 0);
    assert_eq!(table.board.ends(), Some((6, 5)));

    // human plays, the two stuck seats pass silently, seat 3 plays again
    assert!(table.apply_play(0, Chip::placed(Tile(6, 4), Side::First)).is_ok());
    let msgs = drain(&r0);
    let players: Vec<Seat> = msgs
        .iter()
        .filter_map(|m| match m {
            ServerMessage::PlayerPlayed { player, .. } => Some(*player),
            _ => None,
        })
        .collect();
    assert_eq!(players, vec![0, 3]);
    assert_eq!(table.passes, 0);
    assert_eq!(table.turn, 0);

    // tiles never leave the table: hands plus line still make the four hands
    let held: usize = table.hands.iter().map(Hand::len).sum();
    assert_eq!(held + table.board.played().len(), 8);
}

#[test]
fn test_match_end() {
    let (mut table, rxs) = all_human_table(1);
    table.phase = Phase::InRound;
    table.opening_round = false;
    table.turn = 0;
    table.starter = 0;
    table.scores = [96, 90];
    table.hands = [
        Hand::new(vec![Tile(6, 2)]),
        Hand::new(vec![Tile(1, 1)]),
        Hand::new(vec![Tile(3, 3)]),
        Hand::new(vec![Tile(2, 2)]),
    ];

    assert!(table.apply_play(0, Chip::placed(Tile(6, 2), Side::First)).is_ok());

    // 96 + 6 reaches the cap: no further round starts
    assert_eq!(table.scores, [102, 90]);
    assert!(table.is_over());
    let msgs = drain(&rxs[1]);
    assert!(msgs.iter().any(|m| matches!(
        m,
        ServerMessage::Winner {
            winner: 0,
            first_score: 102,
            second_score: 90,
        }
    )));
    assert!(!msgs
        .iter()
        .any(|m| matches!(m, ServerMessage::GameReady { .. })));

    assert_eq!(
        table.apply_play(1, Chip::placed(Tile(1, 1), Side::First)),
        Err(PlayError::RoundNotActive)
    );
}

#[test]
fn test_detach_current_turn_continues() {
    let (k0, r0) = human_seat("u0");
    let (k1, _r1) = human_seat("u1");
    let mut table = Table::new([k0, k1, SeatKind::Automatic, SeatKind::Automatic], 1);
    table.phase = Phase::InRound;
    table.opening_round = false;
    table.turn = 1;
    table.starter = 1;
    table.hands = [
        Hand::new(vec![Tile(6, 4), Tile(1, 3)]),
        Hand::new(vec![Tile(6, 2), Tile(0, 1)]),
        Hand::new(vec![Tile(2, 5), Tile(0, 2)]),
        Hand::new(vec![Tile(5, 5), Tile(0, 4)]),
    ];

    // seat 1 disconnects while holding the turn; the table keeps moving
    table.detach_seat(1);
    assert!(!table.seats[1].is_human());
    assert_eq!(table.turn, 0);

    let msgs = drain(&r0);
    let players: Vec<Seat> = msgs
        .iter()
        .filter_map(|m| match m {
            ServerMessage::PlayerPlayed { player, .. } => Some(*player),
            _ => None,
        })
        .collect();
    assert_eq!(players, vec![1, 2, 3]);

    // detaching an automatic seat is a no-op
    table.detach_seat(1);
    assert_eq!(table.turn, 0);
}
