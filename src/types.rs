use serde::{Deserialize, Serialize};

/// Opaque ID types for type safety
pub type SessionId = String;
pub type PlayerId = String;
pub type CardId = u32;

/// Number of response cards every player holds at all times.
pub const INITIAL_HAND_SIZE: usize = 10;

/// Points awarded to the winner of a round.
pub const WINNER_POINTS: u32 = 1;

/// Separator used when joining a multi-card submission into display text.
pub const ANSWER_SEPARATOR: &str = " , ";

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RoundState {
    /// Session created, no prompt drawn yet
    Lobby,
    /// Prompt active, non-judge players submitting
    Collecting,
    /// Every eligible player has submitted, judge is picking
    Judging,
    /// Roster emptied, session awaiting eviction
    Ended,
}

/// A prompt card with one or more blanks to fill
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PromptCard {
    pub id: CardId,
    pub text: String,
    /// Number of response cards a player must submit this round (>= 1)
    #[serde(default = "default_blank_count")]
    pub blank_count: usize,
}

fn default_blank_count() -> usize {
    1
}

/// A response card a player submits to fill a blank
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ResponseCard {
    pub id: CardId,
    pub text: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Player {
    pub id: PlayerId,
    pub name: String,
    pub score: u32,
    pub is_judge: bool,
    /// Fixed-size hand, slot order is stable across swaps
    pub hand: Vec<ResponseCard>,
}

impl Player {
    pub fn new(id: PlayerId, name: String, is_judge: bool) -> Self {
        Self {
            id,
            name,
            score: 0,
            is_judge,
            hand: Vec::with_capacity(INITIAL_HAND_SIZE),
        }
    }

    pub fn holds_card(&self, card_id: CardId) -> bool {
        self.hand.iter().any(|c| c.id == card_id)
    }
}

/// One player's completed submission for the current round, resolved to text
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoundAnswer {
    pub player_id: PlayerId,
    pub cards: Vec<ResponseCard>,
    /// Card texts joined with [`ANSWER_SEPARATOR`], in submission order
    pub text: String,
}
