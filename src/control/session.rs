use std::sync::mpsc::{channel, Receiver, Sender};
use std::sync::{Arc, Mutex};

use crate::control::match_maker::{LoginOutcome, MatchMaker, Seating};
use crate::control::registry::Registry;
use crate::control::table::{PlayerHandle, Table};
use crate::model::*;
use crate::util::connection::{Connection, Message};
use crate::util::misc::sleep;
use crate::{error, info, warn};

// One actor per socket. Reads one client action at a time and finishes all of
// its side effects, including broadcasts queued by the table, before reading
// the next one.
pub struct PlayerSession {
    conn: Box<dyn Connection>,
    registry: Arc<Registry>,
    match_maker: Arc<MatchMaker>,
    outbox_tx: Sender<String>,
    outbox_rx: Receiver<String>,
    user: Option<PlayerInfo>,
    seating: Option<Seating>,
    seat_rx: Option<Receiver<Seating>>,
    running: bool,
}

impl PlayerSession {
    pub fn new(
        conn: Box<dyn Connection>,
        registry: Arc<Registry>,
        match_maker: Arc<MatchMaker>,
    ) -> Self {
        let (outbox_tx, outbox_rx) = channel();
        Self {
            conn,
            registry,
            match_maker,
            outbox_tx,
            outbox_rx,
            user: None,
            seating: None,
            seat_rx: None,
            running: false,
        }
    }

    pub fn run(&mut self) {
        self.running = true;
        while self.running {
            self.flush_outbox();
            if !self.running {
                break;
            }
            self.poll_seating();
            match self.conn.recv() {
                Message::Text(text) => self.handle_frame(&text),
                Message::Nop => sleep(0.01),
                Message::Close => self.teardown(),
            }
        }
    }

    // Queued table broadcasts go out between reads.
    fn flush_outbox(&mut self) {
        while let Ok(frame) = self.outbox_rx.try_recv() {
            if let Err(e) = self.conn.send(&frame) {
                error!("send failed: {}", e);
                self.teardown();
                return;
            }
        }
    }

    // A table formed around a pooled player delivers its seat here.
    fn poll_seating(&mut self) {
        if let Some(rx) = &self.seat_rx {
            if let Ok(seating) = rx.try_recv() {
                self.seating = Some(seating);
                self.seat_rx = None;
            }
        }
    }

    fn handle_frame(&mut self, text: &str) {
        self.poll_seating();

        let msg = match serde_json::from_str::<ClientMessage>(text) {
            Ok(msg) => msg,
            Err(e) => {
                warn!("bad frame: {} ({})", text, e);
                // an unknown action decodes as a value but not as an action
                let message = if serde_json::from_str::<serde_json::Value>(text).is_ok() {
                    "Error understanding your action."
                } else {
                    "Error parsing the json, please try again."
                };
                self.respond(&ServerMessage::error(message));
                return;
            }
        };

        match msg {
            ClientMessage::Login { user_id, user_name } => self.handle_login(user_id, user_name),
            ClientMessage::PlayChip(chip) => self.handle_play(chip),
            ClientMessage::Pass => self.handle_pass(),
            ClientMessage::Logout => {
                info!("logout");
                self.teardown();
            }
        }
    }

    fn handle_login(&mut self, user_id: String, user_name: String) {
        if self.user.is_some() || !self.registry.try_register(&user_id) {
            warn!("duplicate login: {}", user_id);
            self.respond(&ServerMessage::same_user());
            return;
        }

        info!("{} ({}) logged in", user_name, user_id);
        let handle = PlayerHandle {
            user_id: user_id.clone(),
            user_name: user_name.clone(),
            outbox: self.outbox_tx.clone(),
        };
        self.user = Some(PlayerInfo { user_id, user_name });

        match self.match_maker.login(handle) {
            LoginOutcome::Seated(seating) => self.seating = Some(seating),
            LoginOutcome::Pooled(seat_rx) => {
                self.seat_rx = Some(seat_rx);
                self.respond(&ServerMessage::login_ack());
            }
        }
    }

    fn handle_play(&mut self, chip: Chip) {
        let Some((table, seat)) = self.seating.clone() else {
            self.respond(&ServerMessage::error("You are not seated at a table."));
            return;
        };

        let result = table.lock().unwrap().apply_play(seat, chip);
        if let Err(e) = result {
            warn!("rejected play from seat {}: {}", seat, e);
            self.respond(&ServerMessage::error(&e.to_string()));
        }
        self.leave_if_over(&table);
    }

    fn handle_pass(&mut self) {
        let Some((table, seat)) = self.seating.clone() else {
            self.respond(&ServerMessage::error("You are not seated at a table."));
            return;
        };

        let result = table.lock().unwrap().apply_pass(seat);
        if let Err(e) = result {
            warn!("rejected pass from seat {}: {}", seat, e);
            self.respond(&ServerMessage::error(&e.to_string()));
        }
        self.leave_if_over(&table);
    }

    // A finished table is dropped; the id stays signed in until logout.
    fn leave_if_over(&mut self, table: &Arc<Mutex<Table>>) {
        if table.lock().unwrap().is_over() {
            info!("match over, leaving table");
            self.seating = None;
        }
    }

    fn respond(&mut self, msg: &ServerMessage) {
        if let Err(e) = self.conn.send(&msg.to_frame()) {
            error!("send failed: {}", e);
            self.teardown();
        }
    }

    // Logout and transport failure end up here; the seat, if any, becomes
    // permanently automatic.
    fn teardown(&mut self) {
        self.running = false;
        if let Some((table, seat)) = self.seating.take() {
            table.lock().unwrap().detach_seat(seat);
        }
        if let Some(user) = self.user.take() {
            self.match_maker.remove(&user.user_id);
            self.registry.release(&user.user_id);
            info!("{} disconnected", user.user_id);
        }
    }
}

#[cfg(test)]
use std::collections::VecDeque;

#[cfg(test)]
struct FakeConnection {
    incoming: VecDeque<String>,
    sent: Arc<Mutex<Vec<String>>>,
}

#[cfg(test)]
impl Connection for FakeConnection {
    fn send(&mut self, msg: &str) -> crate::util::misc::Res {
        self.sent.lock().unwrap().push(msg.to_string());
        Ok(())
    }

    fn recv(&mut self) -> Message {
        match self.incoming.pop_front() {
            Some(text) => Message::Text(text),
            None => Message::Close,
        }
    }
}

#[cfg(test)]
fn run_session(
    frames: &[&str],
    registry: &Arc<Registry>,
    match_maker: &Arc<MatchMaker>,
) -> Vec<ServerMessage> {
    let sent = Arc::new(Mutex::new(vec![]));
    let conn = Box::new(FakeConnection {
        incoming: frames.iter().map(|f| f.to_string()).collect(),
        sent: sent.clone(),
    });
    PlayerSession::new(conn, registry.clone(), match_maker.clone()).run();
    let sent = sent.lock().unwrap();
    sent.iter().map(|f| serde_json::from_str(f).unwrap()).collect()
}

#[test]
fn test_session_solo_table() {
    let registry = Arc::new(Registry::new());
    let match_maker = Arc::new(MatchMaker::new(1, 9));

    let msgs = run_session(
        &[
            r#"{ "action": "LOGIN", "data": {"user_id": "u1", "user_name": "Ann"}}"#,
            "this is not json",
            r#"{ "action": "SEND", "data": null}"#,
            r#"{ "action": "LOGIN", "data": {"user_id": "u9", "user_name": "Bob"}}"#,
        ],
        &registry,
        &match_maker,
    );

    // a single required human forms a table immediately: the deal and the
    // first turn notice arrive before anything else
    assert!(matches!(msgs[0], ServerMessage::GameReady { .. }));
    assert!(msgs.iter().any(|m| matches!(m, ServerMessage::PlayerTurn {})));

    let tail: Vec<&ServerMessage> = msgs.iter().rev().take(3).collect();
    assert!(matches!(tail[2], ServerMessage::Error { message } if message.contains("parsing")));
    assert!(matches!(tail[1], ServerMessage::Error { message } if message.contains("understanding")));
    assert!(matches!(tail[0], ServerMessage::SameUser(_)));

    // the id was released on disconnect
    assert!(registry.try_register("u1"));
}

#[test]
fn test_session_pooled_ack() {
    let registry = Arc::new(Registry::new());
    let match_maker = Arc::new(MatchMaker::new(2, 9));

    let msgs = run_session(
        &[r#"{ "action": "LOGIN", "data": {"user_id": "u1", "user_name": "Ann"}}"#],
        &registry,
        &match_maker,
    );
    assert!(matches!(&msgs[0], ServerMessage::Login(ack) if ack.is_empty()));

    // teardown removed the pooled entry, so the next login pools again
    let msgs = run_session(
        &[r#"{ "action": "LOGIN", "data": {"user_id": "u2", "user_name": "Bob"}}"#],
        &registry,
        &match_maker,
    );
    assert!(matches!(&msgs[0], ServerMessage::Login(_)));
}

#[test]
fn test_session_duplicate_id() {
    let registry = Arc::new(Registry::new());
    let match_maker = Arc::new(MatchMaker::new(2, 9));
    registry.try_register("u1");

    let msgs = run_session(
        &[r#"{ "action": "LOGIN", "data": {"user_id": "u1", "user_name": "Ann"}}"#],
        &registry,
        &match_maker,
    );
    assert!(matches!(msgs[0], ServerMessage::SameUser(_)));

    // the rejected session never owned the id
    assert!(!registry.try_register("u1"));
}

#[test]
fn test_session_play_without_table() {
    let registry = Arc::new(Registry::new());
    let match_maker = Arc::new(MatchMaker::new(2, 9));

    let msgs = run_session(
        &[r#"{ "action": "PLAY_CHIP", "data": {"first": 6, "second": 6, "place_first": true}}"#],
        &registry,
        &match_maker,
    );
    assert!(matches!(&msgs[0], ServerMessage::Error { message } if message.contains("not seated")));
}
