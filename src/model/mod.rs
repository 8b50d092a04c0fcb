// Domino data model modules.
mod board;
mod define;
mod hand;
mod message;
mod tile;
mod tile_set;

use std::fmt;

use serde::{Deserialize, Serialize};

pub use board::*;
pub use define::*;
pub use hand::*;
pub use message::*;
pub use tile::*;
pub use tile_set::*;
