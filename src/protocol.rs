//! Wire protocol
//!
//! Inbound actions and outbound events, JSON-tagged with `"t"`. Every
//! handled action produces an ordered list of [`Outgoing`] events; order is
//! significant and preserved by the transport (acknowledgment and identity
//! events always precede state-refresh events).

use crate::types::*;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "t", rename_all = "snake_case")]
pub enum ClientMessage {
    /// Create a session and join it as the first judge
    Start {
        display_name: String,
    },
    Join {
        session_id: SessionId,
        display_name: String,
    },
    /// Trade one held card for a fresh draw
    SwapCard {
        session_id: SessionId,
        player_id: PlayerId,
        card_id: CardId,
    },
    /// Play one card toward the active prompt
    Submit {
        session_id: SessionId,
        player_id: PlayerId,
        card_id: CardId,
    },
    /// Judge awards the round
    JudgePick {
        session_id: SessionId,
        player_id: PlayerId,
        winning_player_id: PlayerId,
    },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "t", rename_all = "snake_case")]
pub enum ServerMessage {
    SessionCreated {
        session_id: SessionId,
    },
    /// The acting connection's own player id; always sent before any
    /// broadcast that mentions that id
    PlayerAssigned {
        player_id: PlayerId,
    },
    Prompt {
        text: String,
        blank_count: usize,
    },
    Hand {
        cards: Vec<CardInfo>,
    },
    Roster {
        players: Vec<PlayerInfo>,
    },
    /// All submissions for the round, ready for the judge
    Judging {
        submissions: Vec<SubmissionInfo>,
    },
    ScoreUpdate {
        player_id: PlayerId,
        delta: u32,
    },
    RoundReset {
        session_id: SessionId,
    },
    WaitForJudge,
    Error {
        code: String,
        msg: String,
    },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CardInfo {
    pub id: CardId,
    pub text: String,
}

impl From<&ResponseCard> for CardInfo {
    fn from(c: &ResponseCard) -> Self {
        Self {
            id: c.id,
            text: c.text.clone(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlayerInfo {
    pub id: PlayerId,
    pub name: String,
    pub score: u32,
    pub is_judge: bool,
}

impl From<&Player> for PlayerInfo {
    fn from(p: &Player) -> Self {
        Self {
            id: p.id.clone(),
            name: p.name.clone(),
            score: p.score,
            is_judge: p.is_judge,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubmissionInfo {
    pub player_id: PlayerId,
    pub cards: Vec<CardInfo>,
    /// Card texts joined in submission order
    pub text: String,
}

impl From<&RoundAnswer> for SubmissionInfo {
    fn from(a: &RoundAnswer) -> Self {
        Self {
            player_id: a.player_id.clone(),
            cards: a.cards.iter().map(CardInfo::from).collect(),
            text: a.text.clone(),
        }
    }
}

/// Delivery scope for one outbound event
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scope {
    /// Only the acting connection
    Unicast,
    /// Every connection in the acting connection's session
    Broadcast,
}

/// One outbound event with its delivery scope
#[derive(Debug, Clone)]
pub struct Outgoing {
    pub message: ServerMessage,
    pub scope: Scope,
}

impl Outgoing {
    pub fn unicast(message: ServerMessage) -> Self {
        Self {
            message,
            scope: Scope::Unicast,
        }
    }

    pub fn broadcast(message: ServerMessage) -> Self {
        Self {
            message,
            scope: Scope::Broadcast,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn client_messages_round_trip_the_tag() {
        let json = r#"{"t":"start","display_name":"Ada"}"#;
        let msg: ClientMessage = serde_json::from_str(json).unwrap();
        assert!(matches!(msg, ClientMessage::Start { ref display_name } if display_name == "Ada"));
    }

    #[test]
    fn server_messages_serialize_snake_case() {
        let msg = ServerMessage::WaitForJudge;
        let json = serde_json::to_string(&msg).unwrap();
        assert_eq!(json, r#"{"t":"wait_for_judge"}"#);

        let msg = ServerMessage::ScoreUpdate {
            player_id: "p1".into(),
            delta: 1,
        };
        let json = serde_json::to_string(&msg).unwrap();
        assert!(json.starts_with(r#"{"t":"score_update""#));
    }
}
