use std::sync::mpsc::{channel, Receiver, Sender};
use std::sync::{Arc, Mutex};

use rand::prelude::*;

use crate::control::table::{PlayerHandle, SeatKind, Table};
use crate::info;
use crate::model::*;

pub type Seating = (Arc<Mutex<Table>>, Seat);

pub enum LoginOutcome {
    // seated right away: the login completed a table
    Seated(Seating),
    // queued: the seating arrives on this channel once a table forms
    Pooled(Receiver<Seating>),
}

struct PoolEntry {
    handle: PlayerHandle,
    seat_tx: Sender<Seating>,
}

// First come, first seated. Tables form as soon as the required number of
// humans is waiting; the remaining seats play themselves.
pub struct MatchMaker {
    pool: Mutex<Vec<PoolEntry>>,
    humans: usize,
    rng: Mutex<rand::rngs::StdRng>, // per-table shuffle seeds
}

impl MatchMaker {
    pub fn new(humans: usize, seed: u64) -> Self {
        assert!((1..=SEAT).contains(&humans));
        Self {
            pool: Mutex::new(vec![]),
            humans,
            rng: Mutex::new(rand::SeedableRng::seed_from_u64(seed)),
        }
    }

    pub fn login(&self, handle: PlayerHandle) -> LoginOutcome {
        let mut pool = self.pool.lock().unwrap();
        if pool.len() < self.humans - 1 {
            info!(
                "{} pooled, waiting for {} more",
                handle.user_id,
                self.humans - pool.len() - 1
            );
            let (seat_tx, seat_rx) = channel();
            pool.push(PoolEntry { handle, seat_tx });
            return LoginOutcome::Pooled(seat_rx);
        }

        // the arrival takes seat 0, then the pool in arrival order
        let entries: Vec<PoolEntry> = pool.drain(..self.humans - 1).collect();
        drop(pool);

        let mut seats = [
            SeatKind::Automatic,
            SeatKind::Automatic,
            SeatKind::Automatic,
            SeatKind::Automatic,
        ];
        seats[0] = SeatKind::Human(handle);
        for (i, entry) in entries.iter().enumerate() {
            seats[i + 1] = SeatKind::Human(entry.handle.clone());
        }

        let seed = self.rng.lock().unwrap().next_u64();
        let table = Arc::new(Mutex::new(Table::new(seats, seed)));
        info!(
            "table formed: {} humans, {} automatic seats",
            self.humans,
            SEAT - self.humans
        );
        table.lock().unwrap().start_match();

        for (i, entry) in entries.into_iter().enumerate() {
            entry.seat_tx.send((table.clone(), i + 1)).ok();
        }
        LoginOutcome::Seated((table, 0))
    }

    // Drops a pooled player that logged out before a table formed.
    pub fn remove(&self, user_id: &str) {
        self.pool.lock().unwrap().retain(|e| e.handle.user_id != user_id);
    }
}

#[cfg(test)]
fn test_handle(id: &str) -> (PlayerHandle, Receiver<String>) {
    let (tx, rx) = channel();
    (
        PlayerHandle {
            user_id: id.to_string(),
            user_name: id.to_uppercase(),
            outbox: tx,
        },
        rx,
    )
}

#[test]
fn test_pool_fills_then_forms() {
    let mm = MatchMaker::new(2, 5);

    let (h1, out1) = test_handle("u1");
    let seat_rx = match mm.login(h1) {
        LoginOutcome::Pooled(rx) => rx,
        LoginOutcome::Seated(_) => panic!("first login must pool"),
    };
    assert!(seat_rx.try_recv().is_err());

    let (h2, out2) = test_handle("u2");
    let (table, seat) = match mm.login(h2) {
        LoginOutcome::Seated(seating) => seating,
        LoginOutcome::Pooled(_) => panic!("second login must form a table"),
    };

    // the arrival took seat 0, the pooled player got seat 1
    assert_eq!(seat, 0);
    let (pooled_table, pooled_seat) = seat_rx.recv().unwrap();
    assert_eq!(pooled_seat, 1);
    assert!(Arc::ptr_eq(&table, &pooled_table));

    // both humans were dealt in
    for out in [&out1, &out2] {
        let frame = out.try_recv().unwrap();
        let msg: ServerMessage = serde_json::from_str(&frame).unwrap();
        assert!(matches!(msg, ServerMessage::GameReady { .. }));
    }
}

#[test]
fn test_remove_from_pool() {
    let mm = MatchMaker::new(3, 5);

    let (h1, _out1) = test_handle("u1");
    assert!(matches!(mm.login(h1), LoginOutcome::Pooled(_)));
    mm.remove("u1");

    // u1 left the queue, so two more logins are still one short
    let (h2, _out2) = test_handle("u2");
    assert!(matches!(mm.login(h2), LoginOutcome::Pooled(_)));
    let (h3, _out3) = test_handle("u3");
    assert!(matches!(mm.login(h3), LoginOutcome::Pooled(_)));

    let (h4, _out4) = test_handle("u4");
    assert!(matches!(mm.login(h4), LoginOutcome::Seated(_)));
}
