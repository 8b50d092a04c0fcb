// Game control: table state machine, per-socket sessions, matchmaking.
mod match_maker;
mod registry;
mod session;
mod table;

pub use match_maker::{LoginOutcome, MatchMaker, Seating};
pub use registry::Registry;
pub use session::PlayerSession;
pub use table::{Outbox, Phase, PlayError, PlayerHandle, SeatKind, Table};
