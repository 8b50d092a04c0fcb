use super::*;

// Wire tile shape. In a PLAYER_PLAYED frame `place_first` names the end the
// tile was placed on; in dealt hands it carries no meaning.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Chip {
    pub first: Pip,
    pub second: Pip,
    pub place_first: bool,
}

impl Chip {
    #[inline]
    pub fn placed(tile: Tile, side: Side) -> Self {
        Self {
            first: tile.0,
            second: tile.1,
            place_first: side == Side::First,
        }
    }

    #[inline]
    pub fn tile(&self) -> Tile {
        Tile(self.first, self.second)
    }

    #[inline]
    pub fn side(&self) -> Side {
        if self.place_first {
            Side::First
        } else {
            Side::Last
        }
    }
}

impl From<Tile> for Chip {
    fn from(tile: Tile) -> Self {
        Self {
            first: tile.0,
            second: tile.1,
            place_first: false,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlayerInfo {
    pub user_id: String,
    pub user_name: String,
}

// {"action": ..., "data": ...} envelope, one frame per message.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "action", content = "data", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ClientMessage {
    Login { user_id: String, user_name: String },
    PlayChip(Chip),
    Pass,
    Logout,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "action", content = "data", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ServerMessage {
    Login(String),
    SameUser(String),
    GameReady {
        hand: Vec<Chip>,
        start: bool,
        players: Vec<PlayerInfo>,
    },
    PlayerPlayed {
        chip: Chip,
        player: Seat,
        line: Vec<Chip>,
    },
    PlayerTurn {},
    Winner {
        winner: Seat,
        first_score: Score,
        second_score: Score,
    },
    Error {
        message: String,
    },
}

impl ServerMessage {
    #[inline]
    pub fn login_ack() -> Self {
        Self::Login(String::new())
    }

    #[inline]
    pub fn same_user() -> Self {
        Self::SameUser("Error This user has already signed in.".to_string())
    }

    #[inline]
    pub fn error(message: &str) -> Self {
        Self::Error {
            message: message.to_string(),
        }
    }

    pub fn to_frame(&self) -> String {
        serde_json::json!(self).to_string()
    }
}

#[test]
fn test_decode_client_actions() {
    let msg = r#"{ "action": "LOGIN", "data": {"user_id": "u1", "user_name": "Ann"}}"#;
    match serde_json::from_str::<ClientMessage>(msg).unwrap() {
        ClientMessage::Login { user_id, user_name } => {
            assert_eq!(user_id, "u1");
            assert_eq!(user_name, "Ann");
        }
        other => panic!("wrong variant: {:?}", other),
    }

    let msg = r#"{"action": "PLAY_CHIP", "data": {"first": 6, "second": 2, "place_first": true}}"#;
    match serde_json::from_str::<ClientMessage>(msg).unwrap() {
        ClientMessage::PlayChip(chip) => {
            assert_eq!(chip.tile(), Tile(6, 2));
            assert_eq!(chip.side(), Side::First);
        }
        other => panic!("wrong variant: {:?}", other),
    }

    // PASS and LOGOUT arrive with null data
    let msg = r#"{ "action": "PASS", "data": null}"#;
    assert!(matches!(
        serde_json::from_str::<ClientMessage>(msg).unwrap(),
        ClientMessage::Pass
    ));
    let msg = r#"{ "action": "LOGOUT", "data": null}"#;
    assert!(matches!(
        serde_json::from_str::<ClientMessage>(msg).unwrap(),
        ClientMessage::Logout
    ));

    assert!(serde_json::from_str::<ClientMessage>("not json").is_err());
    assert!(serde_json::from_str::<ClientMessage>(r#"{"action": "SEND", "data": null}"#).is_err());
}

#[test]
fn test_encode_server_events() {
    let frame = ServerMessage::PlayerTurn {}.to_frame();
    let value: serde_json::Value = serde_json::from_str(&frame).unwrap();
    assert_eq!(value["action"], "PLAYER_TURN");
    assert_eq!(value["data"], serde_json::json!({}));

    let frame = ServerMessage::PlayerPlayed {
        chip: Chip::placed(Tile(2, 5), Side::Last),
        player: 3,
        line: vec![Chip::placed(Tile(6, 2), Side::First), Chip::placed(Tile(2, 5), Side::Last)],
    }
    .to_frame();
    let value: serde_json::Value = serde_json::from_str(&frame).unwrap();
    assert_eq!(value["action"], "PLAYER_PLAYED");
    assert_eq!(value["data"]["player"], 3);
    assert_eq!(value["data"]["chip"]["place_first"], false);
    assert_eq!(value["data"]["line"][0]["first"], 6);

    let frame = ServerMessage::Winner {
        winner: 2,
        first_score: 35,
        second_score: 100,
    }
    .to_frame();
    let value: serde_json::Value = serde_json::from_str(&frame).unwrap();
    assert_eq!(value["data"]["winner"], 2);
    assert_eq!(value["data"]["first_score"], 35);
    assert_eq!(value["data"]["second_score"], 100);

    let frame = ServerMessage::login_ack().to_frame();
    let value: serde_json::Value = serde_json::from_str(&frame).unwrap();
    assert_eq!(value["action"], "LOGIN");
    assert_eq!(value["data"], "");

    let frame = ServerMessage::GameReady {
        hand: vec![Chip::from(Tile(1, 1))],
        start: true,
        players: vec![PlayerInfo {
            user_id: "u1".to_string(),
            user_name: "Ann".to_string(),
        }],
    }
    .to_frame();
    let value: serde_json::Value = serde_json::from_str(&frame).unwrap();
    assert_eq!(value["data"]["start"], true);
    assert_eq!(value["data"]["hand"][0]["second"], 1);
    assert_eq!(value["data"]["players"][0]["user_name"], "Ann");
}
