//! Immutable card catalog
//!
//! Source data for a session's card pool: prompt cards (each with a blank
//! count) and response cards. A built-in deck ships with the binary; a
//! custom deck can be loaded from a JSON file at startup.

use crate::types::{CardId, PromptCard, ResponseCard};
use serde::Deserialize;
use std::path::Path;

/// Prompt entry in a JSON deck file
#[derive(Debug, Deserialize)]
struct DeckPrompt {
    text: String,
    /// Number of blanks (defaults to 1)
    #[serde(default = "one")]
    pick: usize,
}

fn one() -> usize {
    1
}

/// On-disk deck format: `{"prompts": [{"text", "pick"}], "responses": ["..."]}`
#[derive(Debug, Deserialize)]
struct DeckFile {
    prompts: Vec<DeckPrompt>,
    responses: Vec<String>,
}

/// The full set of cards available to a session. Immutable once built;
/// card identity is the index assigned at load time.
#[derive(Debug, Clone)]
pub struct Catalog {
    pub prompts: Vec<PromptCard>,
    pub responses: Vec<ResponseCard>,
}

impl Catalog {
    /// Deck compiled into the binary
    pub fn builtin() -> Self {
        let prompts = BUILTIN_PROMPTS
            .iter()
            .enumerate()
            .map(|(i, (text, pick))| PromptCard {
                id: i as CardId,
                text: (*text).to_string(),
                blank_count: *pick,
            })
            .collect();

        let responses = BUILTIN_RESPONSES
            .iter()
            .enumerate()
            .map(|(i, text)| ResponseCard {
                id: i as CardId,
                text: (*text).to_string(),
            })
            .collect();

        Self { prompts, responses }
    }

    /// Parse a deck from JSON. Blank counts of zero are clamped to one.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        let deck: DeckFile = serde_json::from_str(json)?;

        let prompts = deck
            .prompts
            .into_iter()
            .enumerate()
            .map(|(i, p)| PromptCard {
                id: i as CardId,
                text: p.text,
                blank_count: p.pick.max(1),
            })
            .collect();

        let responses = deck
            .responses
            .into_iter()
            .enumerate()
            .map(|(i, text)| ResponseCard {
                id: i as CardId,
                text,
            })
            .collect();

        Ok(Self { prompts, responses })
    }

    /// Load a deck file, falling back to the built-in deck on any failure
    pub fn load_or_builtin(path: Option<&Path>) -> Self {
        let Some(path) = path else {
            return Self::builtin();
        };

        match std::fs::read_to_string(path).map_err(|e| e.to_string()) {
            Ok(json) => match Self::from_json(&json) {
                Ok(catalog) if !catalog.prompts.is_empty() && !catalog.responses.is_empty() => {
                    tracing::info!(
                        "Loaded deck from {}: {} prompts, {} responses",
                        path.display(),
                        catalog.prompts.len(),
                        catalog.responses.len()
                    );
                    catalog
                }
                Ok(_) => {
                    tracing::warn!("Deck {} is missing cards, using built-in deck", path.display());
                    Self::builtin()
                }
                Err(e) => {
                    tracing::warn!("Failed to parse deck {}: {}", path.display(), e);
                    Self::builtin()
                }
            },
            Err(e) => {
                tracing::warn!("Failed to read deck {}: {}", path.display(), e);
                Self::builtin()
            }
        }
    }
}

const BUILTIN_PROMPTS: &[(&str, usize)] = &[
    ("My therapist says my biggest problem is ____.", 1),
    ("The secret ingredient in grandma's casserole turned out to be ____.", 1),
    ("Next on the evening news: scientists baffled by ____.", 1),
    ("I could not finish the marathon because of ____.", 1),
    ("The museum's newest exhibit: a thousand years of ____.", 1),
    ("Instead of a handshake, my new boss greeted me with ____.", 1),
    ("The fortune cookie just said: beware of ____.", 1),
    ("My autobiography will be titled 'A Lifetime of ____'.", 1),
    ("The wifi password at this cafe is literally ____.", 1),
    ("Nothing ruins a first date faster than ____.", 1),
    ("The startup's pitch deck was just forty slides about ____.", 1),
    ("I survived the camping trip thanks to ____.", 1),
    ("The school talent show was won by a kid doing ____.", 1),
    ("My horoscope warned me about ____ today.", 1),
    ("The neighbors complained about the noise from ____.", 1),
    ("Step one: ____. Step two: ____. Step three: profit.", 2),
    ("I traded my ____ for a slightly used ____.", 2),
    ("The recipe calls for two cups of ____ and a pinch of ____.", 2),
    ("In my dream, ____ was chasing ____ down the highway.", 2),
    ("The heist went wrong when ____ triggered ____.", 2),
    ("My New Year's resolution is less ____ and more ____.", 2),
    ("Breaking: local mayor replaces ____ with ____.", 2),
    ("The escape room's final puzzle involved ____.", 1),
    ("Archaeologists just unearthed a perfectly preserved ____.", 1),
];

const BUILTIN_RESPONSES: &[&str] = &[
    "a suspiciously heavy suitcase",
    "interpretive dance",
    "forty feral raccoons",
    "my collection of novelty spoons",
    "an aggressively friendly golden retriever",
    "the world's smallest violin",
    "a lifetime supply of bubble wrap",
    "my uncle's conspiracy podcast",
    "a malfunctioning fog machine",
    "emergency karaoke",
    "the office microwave",
    "a haunted roomba",
    "three kids in a trench coat",
    "decorative gourds",
    "an expired coupon",
    "the last slice of pizza",
    "a motivational poster of a cat",
    "free samples",
    "a surprisingly athletic grandpa",
    "glitter that never comes off",
    "an unskippable ad",
    "the neighbor's leaf blower",
    "a traffic cone wearing sunglasses",
    "spreadsheet macros",
    "a limited edition garden gnome",
    "hold music",
    "a rogue shopping cart",
    "artisanal toast",
    "the phrase 'per my last email'",
    "a seagull with no fear",
    "overdue library books",
    "a vending machine that takes exact change only",
    "my browser's 400 open tabs",
    "a weather forecast that is always wrong",
    "the gym membership I never use",
    "a suspicious amount of confetti",
    "an extremely detailed diorama",
    "socks with sandals",
    "a pigeon with a business plan",
    "the check engine light",
    "a trampoline in the living room",
    "soup that is somehow both too hot and too cold",
    "an inflatable tube man",
    "my phone at one percent battery",
    "a very long receipt",
    "the mystery smell in the break room",
    "a well-rehearsed apology",
    "an off-brand superhero",
    "the instruction manual nobody read",
    "a parallel parking attempt",
    "decaf coffee, unannounced",
    "a team-building exercise",
    "the fourth wall",
    "an echo that answers back",
    "a to-do list from 2019",
    "one single, perfect meatball",
];
