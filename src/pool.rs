//! Per-session card pool allocator
//!
//! Draws unique cards without replacement from a [`Catalog`] and tracks which
//! response cards are currently held in a player's hand. Both piles are
//! shuffled once at construction and drawn by advancing through the shuffled
//! order, so a draw is O(1) and never revisits a card. `release` pushes the
//! freed id onto the back of the remaining-draw queue, making it immediately
//! eligible again (swapped-out cards re-enter circulation instantly).

use crate::catalog::Catalog;
use crate::error::GameError;
use crate::types::{CardId, PromptCard, ResponseCard};
use rand::seq::SliceRandom;
use std::collections::{HashMap, HashSet, VecDeque};

#[derive(Debug)]
pub struct CardPool {
    /// Shuffled prompt draw pile, drawn from the back
    prompts: Vec<PromptCard>,
    /// Full response catalog, for id -> card resolution
    responses: HashMap<CardId, ResponseCard>,
    /// Shuffled ids not yet drawn; released ids rejoin at the back
    draw_queue: VecDeque<CardId>,
    /// Ids currently held in some player's hand
    taken: HashSet<CardId>,
}

impl CardPool {
    pub fn new(catalog: &Catalog) -> Self {
        let mut rng = rand::rng();

        let mut prompts = catalog.prompts.clone();
        prompts.shuffle(&mut rng);

        let mut ids: Vec<CardId> = catalog.responses.iter().map(|c| c.id).collect();
        ids.shuffle(&mut rng);

        let responses = catalog
            .responses
            .iter()
            .map(|c| (c.id, c.clone()))
            .collect();

        Self {
            prompts,
            responses,
            draw_queue: ids.into(),
            taken: HashSet::new(),
        }
    }

    /// Draw one prompt card without replacement
    pub fn draw_prompt(&mut self) -> Result<PromptCard, GameError> {
        self.prompts.pop().ok_or(GameError::PoolExhausted)
    }

    /// Draw `n` distinct response cards and mark them as taken.
    ///
    /// Fails without taking anything if fewer than `n` undrawn cards remain.
    pub fn draw_responses(&mut self, n: usize) -> Result<Vec<ResponseCard>, GameError> {
        if self.draw_queue.len() < n {
            return Err(GameError::PoolExhausted);
        }

        let mut cards = Vec::with_capacity(n);
        for _ in 0..n {
            // Queue ids always resolve: they were taken from the catalog
            let id = self.draw_queue.pop_front().ok_or(GameError::PoolExhausted)?;
            self.taken.insert(id);
            cards.push(self.responses[&id].clone());
        }

        Ok(cards)
    }

    /// Return a taken card to the drawable pool.
    ///
    /// The id becomes eligible for the very next draw, possibly to a
    /// different player. Ignores ids that are not currently taken.
    pub fn release(&mut self, card_id: CardId) {
        if self.taken.remove(&card_id) {
            self.draw_queue.push_back(card_id);
        }
    }

    /// Read-only catalog lookup by id
    pub fn lookup_response(&self, card_id: CardId) -> Option<&ResponseCard> {
        self.responses.get(&card_id)
    }

    /// Number of response cards still drawable
    pub fn remaining_responses(&self) -> usize {
        self.draw_queue.len()
    }

    #[cfg(test)]
    fn is_taken(&self, card_id: CardId) -> bool {
        self.taken.contains(&card_id)
    }
}
