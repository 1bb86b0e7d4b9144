//! Game session round state machine
//!
//! A [`GameSession`] owns one card pool, the player roster (join order), the
//! active prompt, and the current round's submissions. It is a plain
//! synchronous structure; the registry in [`super`] wraps each session in its
//! own lock so one action always runs to completion before the next.

use crate::catalog::Catalog;
use crate::error::GameError;
use crate::pool::CardPool;
use crate::types::*;
use std::collections::HashMap;

/// Outcome of removing a player, so the orchestrator knows what to announce
#[derive(Debug, PartialEq)]
pub enum Departure {
    /// Roster changed, round unaffected
    Left,
    /// The departing player was the last one still owing cards, so the
    /// round completed without them and the session is now judging
    RoundCompleted,
    /// The judge left mid-round: the round was abandoned without penalty,
    /// the earliest-joined remaining player is the new judge, and a fresh
    /// prompt was drawn
    RoundAbandoned { new_prompt: PromptCard },
    /// Roster is empty (or no prompt was left to recover with); the session
    /// must be evicted
    SessionEnded,
}

#[derive(Debug)]
pub struct GameSession {
    pub id: SessionId,
    pub state: RoundState,
    players: Vec<Player>,
    active_prompt: Option<PromptCard>,
    submissions: HashMap<PlayerId, Vec<CardId>>,
    /// Player ids in first-submission order, so answers come out deterministic
    submission_order: Vec<PlayerId>,
    pool: CardPool,
}

impl GameSession {
    pub fn new(id: SessionId, catalog: &Catalog) -> Self {
        Self {
            id,
            state: RoundState::Lobby,
            players: Vec::new(),
            active_prompt: None,
            submissions: HashMap::new(),
            submission_order: Vec::new(),
            pool: CardPool::new(catalog),
        }
    }

    /// Draw the first prompt and open the session for submissions
    pub fn start_round(&mut self) -> Result<PromptCard, GameError> {
        if self.state != RoundState::Lobby {
            return Err(GameError::WrongState);
        }

        let prompt = self.pool.draw_prompt()?;
        self.active_prompt = Some(prompt.clone());
        self.state = RoundState::Collecting;
        Ok(prompt)
    }

    /// Add a player with a freshly drawn hand. Returns the new player's id.
    pub fn add_player(&mut self, name: String, is_judge: bool) -> Result<PlayerId, GameError> {
        if self.state == RoundState::Ended {
            return Err(GameError::WrongState);
        }

        let hand = self.pool.draw_responses(INITIAL_HAND_SIZE)?;
        let mut player = Player::new(ulid::Ulid::new().to_string(), name, is_judge);
        player.hand = hand;

        let id = player.id.clone();
        self.players.push(player);
        Ok(id)
    }

    pub fn players(&self) -> &[Player] {
        &self.players
    }

    pub fn player(&self, player_id: &str) -> Option<&Player> {
        self.players.iter().find(|p| p.id == player_id)
    }

    /// The current judge, if the session has started
    pub fn judge(&self) -> Option<&Player> {
        self.players.iter().find(|p| p.is_judge)
    }

    pub fn active_prompt(&self) -> Option<&PromptCard> {
        self.active_prompt.as_ref()
    }

    pub fn lookup_response(&self, card_id: CardId) -> Option<&ResponseCard> {
        self.pool.lookup_response(card_id)
    }

    /// Release `card_id` from the player's hand and draw a replacement into
    /// the vacated slot. Returns the refreshed hand.
    ///
    /// The release happens before the draw, so the draw can never exhaust
    /// the pool: in the worst case the freed card itself comes back.
    pub fn swap_card(
        &mut self,
        player_id: &str,
        card_id: CardId,
    ) -> Result<Vec<ResponseCard>, GameError> {
        let player = self
            .players
            .iter_mut()
            .find(|p| p.id == player_id)
            .ok_or(GameError::PlayerNotFound)?;

        let slot = player
            .hand
            .iter()
            .position(|c| c.id == card_id)
            .ok_or(GameError::InvalidCard)?;

        self.pool.release(card_id);
        let replacement = self.pool.draw_responses(1)?.remove(0);

        // Re-borrow: the pool draw above needed `&mut self.pool`
        let player = self
            .players
            .iter_mut()
            .find(|p| p.id == player_id)
            .ok_or(GameError::PlayerNotFound)?;
        player.hand[slot] = replacement;
        Ok(player.hand.clone())
    }

    /// Number of cards each non-judge player must submit this round
    fn blank_count(&self) -> usize {
        self.active_prompt.as_ref().map_or(1, |p| p.blank_count)
    }

    /// True when every non-judge player on the roster has submitted
    /// `blank_count` cards
    fn round_complete(&self) -> bool {
        let blanks = self.blank_count();
        let submitters: Vec<_> = self.players.iter().filter(|p| !p.is_judge).collect();

        !submitters.is_empty()
            && submitters.iter().all(|p| {
                self.submissions
                    .get(&p.id)
                    .map(|cards| cards.len() >= blanks)
                    .unwrap_or(false)
            })
    }

    /// Record a submission for the current round. The submitted card is
    /// swapped out of the player's hand in the same mutation, so the hand
    /// stays full. Returns true exactly when the round becomes complete.
    pub fn submit(&mut self, player_id: &str, card_id: CardId) -> Result<bool, GameError> {
        if self.state != RoundState::Collecting {
            return Err(GameError::WrongState);
        }

        let player = self.player(player_id).ok_or(GameError::PlayerNotFound)?;
        if player.is_judge {
            return Err(GameError::NotEligible);
        }
        if !player.holds_card(card_id) {
            return Err(GameError::InvalidCard);
        }
        if self
            .submissions
            .get(player_id)
            .is_some_and(|cards| cards.len() >= self.blank_count())
        {
            return Err(GameError::NotEligible);
        }

        self.swap_card(player_id, card_id)?;

        if !self.submissions.contains_key(player_id) {
            self.submission_order.push(player_id.to_string());
        }
        self.submissions
            .entry(player_id.to_string())
            .or_default()
            .push(card_id);

        let complete = self.round_complete();
        if complete {
            self.state = RoundState::Judging;
        }
        Ok(complete)
    }

    /// All submissions for the judging phase, in submission order,
    /// resolved to display text
    pub fn round_answers(&self) -> Result<Vec<RoundAnswer>, GameError> {
        if self.state != RoundState::Judging {
            return Err(GameError::WrongState);
        }

        let answers = self
            .submission_order
            .iter()
            .map(|player_id| {
                let cards: Vec<ResponseCard> = self.submissions[player_id]
                    .iter()
                    .filter_map(|id| self.pool.lookup_response(*id).cloned())
                    .collect();
                let text = cards
                    .iter()
                    .map(|c| c.text.as_str())
                    .collect::<Vec<_>>()
                    .join(ANSWER_SEPARATOR);
                RoundAnswer {
                    player_id: player_id.clone(),
                    cards,
                    text,
                }
            })
            .collect();

        Ok(answers)
    }

    /// Award the round to `winner_id`: one point, judge flag rotates to the
    /// winner, submissions clear, and a new prompt is drawn.
    pub fn judge_pick(&mut self, winner_id: &str) -> Result<PromptCard, GameError> {
        if self.state != RoundState::Judging {
            return Err(GameError::WrongState);
        }
        if !self.submissions.contains_key(winner_id) {
            return Err(GameError::InvalidWinner);
        }
        if self.player(winner_id).is_none() {
            return Err(GameError::PlayerNotFound);
        }

        // Draw before mutating anything so an exhausted prompt pile rejects
        // the action without touching scores or flags
        let prompt = self.pool.draw_prompt()?;

        self.submissions.clear();
        self.submission_order.clear();
        for player in &mut self.players {
            player.is_judge = player.id == winner_id;
            if player.is_judge {
                player.score += WINNER_POINTS;
            }
        }

        self.active_prompt = Some(prompt.clone());
        self.state = RoundState::Collecting;
        Ok(prompt)
    }

    /// Remove a player, returning their hand (and any pending submission) to
    /// the pool. See [`Departure`] for the possible outcomes.
    pub fn remove_player(&mut self, player_id: &str) -> Result<Departure, GameError> {
        let idx = self
            .players
            .iter()
            .position(|p| p.id == player_id)
            .ok_or(GameError::PlayerNotFound)?;

        let departed = self.players.remove(idx);
        for card in &departed.hand {
            self.pool.release(card.id);
        }
        // Submitted cards were already released when they were swapped out
        // at submit time; only the bookkeeping entry remains
        self.submissions.remove(player_id);
        self.submission_order.retain(|id| id != player_id);

        if self.players.is_empty() {
            self.state = RoundState::Ended;
            return Ok(Departure::SessionEnded);
        }

        if departed.is_judge && self.state != RoundState::Lobby {
            // Judge left mid-round: abandon the round without penalty
            self.submissions.clear();
            self.submission_order.clear();
            match self.pool.draw_prompt() {
                Ok(prompt) => {
                    for (i, player) in self.players.iter_mut().enumerate() {
                        player.is_judge = i == 0;
                    }
                    self.active_prompt = Some(prompt.clone());
                    self.state = RoundState::Collecting;
                    Ok(Departure::RoundAbandoned { new_prompt: prompt })
                }
                Err(GameError::PoolExhausted) => {
                    // No prompt left to recover with
                    self.state = RoundState::Ended;
                    Ok(Departure::SessionEnded)
                }
                Err(e) => Err(e),
            }
        } else {
            // Completion follows the live roster: if the departing player
            // was the last one still owing cards, the round is now complete
            if self.state == RoundState::Collecting && self.round_complete() {
                self.state = RoundState::Judging;
                return Ok(Departure::RoundCompleted);
            }
            Ok(Departure::Left)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    fn catalog(prompts: usize, blank_count: usize, responses: usize) -> Catalog {
        Catalog {
            prompts: (0..prompts as CardId)
                .map(|id| PromptCard {
                    id,
                    text: format!("prompt {id} ____"),
                    blank_count,
                })
                .collect(),
            responses: (0..responses as CardId)
                .map(|id| ResponseCard {
                    id,
                    text: format!("response {id}"),
                })
                .collect(),
        }
    }

    /// Session with one judge and `extra` non-judge players, round started
    fn session_with_players(extra: usize) -> (GameSession, Vec<PlayerId>) {
        let mut session = GameSession::new("test".into(), &catalog(10, 1, 200));
        let mut ids = vec![session.add_player("judge".into(), true).unwrap()];
        session.start_round().unwrap();
        for i in 0..extra {
            ids.push(session.add_player(format!("player {i}"), false).unwrap());
        }
        (session, ids)
    }

    fn assert_judge_count(session: &GameSession, expected: usize) {
        let count = session.players().iter().filter(|p| p.is_judge).count();
        assert_eq!(count, expected);
    }

    #[test]
    fn start_draws_prompt_and_opens_collecting() {
        let (session, _) = session_with_players(2);
        assert_eq!(session.state, RoundState::Collecting);
        assert!(session.active_prompt().is_some());
        assert_judge_count(&session, 1);
    }

    #[test]
    fn hands_are_full_and_disjoint() {
        let (session, _) = session_with_players(3);

        let mut seen = HashSet::new();
        for player in session.players() {
            assert_eq!(player.hand.len(), INITIAL_HAND_SIZE);
            for card in &player.hand {
                assert!(seen.insert(card.id), "card {} dealt twice", card.id);
            }
        }
    }

    #[test]
    fn swap_replaces_the_slot_and_keeps_hand_size() {
        let (mut session, ids) = session_with_players(1);
        let player_id = &ids[1];
        let old = session.player(player_id).unwrap().hand[4].clone();

        let hand = session.swap_card(player_id, old.id).unwrap();
        assert_eq!(hand.len(), INITIAL_HAND_SIZE);
        assert_ne!(hand[4].id, old.id);

        // Slots other than the swapped one are untouched
        let current = &session.player(player_id).unwrap().hand;
        assert_eq!(current[0], hand[0]);
    }

    #[test]
    fn swap_of_unheld_card_changes_nothing() {
        let (mut session, ids) = session_with_players(1);
        let player_id = &ids[1];
        let before = session.player(player_id).unwrap().hand.clone();

        let held: Vec<CardId> = before.iter().map(|c| c.id).collect();
        let unheld = (0..200).find(|id| !held.contains(id)).unwrap();

        assert_eq!(
            session.swap_card(player_id, unheld),
            Err(GameError::InvalidCard)
        );
        assert_eq!(session.player(player_id).unwrap().hand, before);
    }

    #[test]
    fn judge_cannot_submit() {
        let (mut session, ids) = session_with_players(2);
        let judge_card = session.player(&ids[0]).unwrap().hand[0].id;
        assert_eq!(
            session.submit(&ids[0], judge_card),
            Err(GameError::NotEligible)
        );
    }

    #[test]
    fn round_completes_when_all_nonjudges_submit() {
        let (mut session, ids) = session_with_players(2);
        let card_b = session.player(&ids[1]).unwrap().hand[0].id;
        let card_c = session.player(&ids[2]).unwrap().hand[0].id;

        assert!(!session.submit(&ids[1], card_b).unwrap());
        assert_eq!(session.state, RoundState::Collecting);

        assert!(session.submit(&ids[2], card_c).unwrap());
        assert_eq!(session.state, RoundState::Judging);

        let answers = session.round_answers().unwrap();
        assert_eq!(answers.len(), 2);
        assert_eq!(answers[0].player_id, ids[1]);
        assert_eq!(answers[0].cards[0].id, card_b);
        assert_eq!(answers[1].player_id, ids[2]);
        assert_eq!(answers[1].cards[0].id, card_c);
    }

    #[test]
    fn submit_refills_the_hand() {
        let (mut session, ids) = session_with_players(2);
        let card = session.player(&ids[1]).unwrap().hand[0].id;

        session.submit(&ids[1], card).unwrap();

        let hand = &session.player(&ids[1]).unwrap().hand;
        assert_eq!(hand.len(), INITIAL_HAND_SIZE);
        assert!(!hand.iter().any(|c| c.id == card));
    }

    #[test]
    fn multi_blank_prompt_needs_multiple_cards() {
        let mut session = GameSession::new("test".into(), &catalog(5, 2, 100));
        let judge = session.add_player("judge".into(), true).unwrap();
        session.start_round().unwrap();
        let player = session.add_player("player".into(), false).unwrap();
        let _ = judge;

        let first = session.player(&player).unwrap().hand[0].id;
        assert!(!session.submit(&player, first).unwrap());

        let second = session.player(&player).unwrap().hand[1].id;
        assert!(session.submit(&player, second).unwrap());

        let answers = session.round_answers().unwrap();
        assert_eq!(answers[0].cards.len(), 2);
        assert!(answers[0].text.contains(ANSWER_SEPARATOR));
    }

    #[test]
    fn cannot_submit_past_blank_count() {
        let (mut session, ids) = session_with_players(2);
        let card = session.player(&ids[1]).unwrap().hand[0].id;
        session.submit(&ids[1], card).unwrap();

        let extra = session.player(&ids[1]).unwrap().hand[0].id;
        assert_eq!(session.submit(&ids[1], extra), Err(GameError::NotEligible));
    }

    #[test]
    fn judge_pick_awards_point_and_rotates_judge() {
        let (mut session, ids) = session_with_players(2);
        let card_b = session.player(&ids[1]).unwrap().hand[0].id;
        let card_c = session.player(&ids[2]).unwrap().hand[0].id;
        session.submit(&ids[1], card_b).unwrap();
        session.submit(&ids[2], card_c).unwrap();

        let old_prompt = session.active_prompt().unwrap().clone();
        session.judge_pick(&ids[1]).unwrap();

        let winner = session.player(&ids[1]).unwrap();
        assert_eq!(winner.score, 1);
        assert!(winner.is_judge);
        assert_judge_count(&session, 1);

        assert_eq!(session.state, RoundState::Collecting);
        assert_ne!(session.active_prompt().unwrap().id, old_prompt.id);
        assert!(session.round_answers().is_err());
    }

    #[test]
    fn judge_pick_rejects_nonsubmitter() {
        let (mut session, ids) = session_with_players(2);
        let card_b = session.player(&ids[1]).unwrap().hand[0].id;
        let card_c = session.player(&ids[2]).unwrap().hand[0].id;
        session.submit(&ids[1], card_b).unwrap();
        session.submit(&ids[2], card_c).unwrap();

        // The judge never submits, so picking them is invalid
        assert_eq!(session.judge_pick(&ids[0]), Err(GameError::InvalidWinner));
        assert_eq!(session.state, RoundState::Judging);
    }

    #[test]
    fn judge_pick_outside_judging_is_rejected() {
        let (mut session, ids) = session_with_players(2);
        assert_eq!(session.judge_pick(&ids[1]), Err(GameError::WrongState));
    }

    #[test]
    fn scores_never_decrease() {
        let (mut session, ids) = session_with_players(1);
        for _ in 0..3 {
            let card = session.player(&ids[1]).unwrap().hand[0].id;
            session.submit(&ids[1], card).unwrap();
            session.judge_pick(&ids[1]).unwrap();
        }
        assert_eq!(session.player(&ids[1]).unwrap().score, 3);
    }

    #[test]
    fn leaving_returns_hand_to_pool() {
        let mut session = GameSession::new("test".into(), &catalog(5, 1, 20));
        let judge = session.add_player("judge".into(), true).unwrap();
        session.start_round().unwrap();
        let player = session.add_player("player".into(), false).unwrap();
        let _ = judge;

        // All 20 responses are dealt out; a third hand is impossible
        assert_eq!(
            session.add_player("third".into(), false),
            Err(GameError::PoolExhausted)
        );

        assert_eq!(session.remove_player(&player).unwrap(), Departure::Left);

        // The departed hand is drawable again
        session.add_player("third".into(), false).unwrap();
    }

    #[test]
    fn last_player_leaving_ends_the_session() {
        let (mut session, ids) = session_with_players(1);
        session.remove_player(&ids[1]).unwrap();
        assert_eq!(
            session.remove_player(&ids[0]),
            Ok(Departure::SessionEnded)
        );
        assert_eq!(session.state, RoundState::Ended);
        assert_eq!(
            session.add_player("late".into(), false),
            Err(GameError::WrongState)
        );
    }

    #[test]
    fn judge_departure_abandons_the_round() {
        let (mut session, ids) = session_with_players(2);
        let card_b = session.player(&ids[1]).unwrap().hand[0].id;
        session.submit(&ids[1], card_b).unwrap();

        let departure = session.remove_player(&ids[0]).unwrap();
        let Departure::RoundAbandoned { new_prompt } = departure else {
            panic!("expected abandoned round, got {departure:?}");
        };

        // Earliest-joined remaining player is promoted, submissions reset
        let new_judge = session.player(&ids[1]).unwrap();
        assert!(new_judge.is_judge);
        assert_eq!(new_judge.score, 0);
        assert_judge_count(&session, 1);
        assert_eq!(session.state, RoundState::Collecting);
        assert_eq!(session.active_prompt().unwrap().id, new_prompt.id);

        // The abandoned submission does not linger into the next round
        let card_c = session.player(&ids[2]).unwrap().hand[0].id;
        assert!(session.submit(&ids[2], card_c).unwrap());
    }

    #[test]
    fn last_holdout_departure_completes_the_round() {
        let (mut session, ids) = session_with_players(2);
        let card_b = session.player(&ids[1]).unwrap().hand[0].id;
        session.submit(&ids[1], card_b).unwrap();

        // Only the player who never submitted leaves: everyone remaining
        // has met the blank count, so the round must complete
        assert_eq!(
            session.remove_player(&ids[2]).unwrap(),
            Departure::RoundCompleted
        );
        assert_eq!(session.state, RoundState::Judging);

        let answers = session.round_answers().unwrap();
        assert_eq!(answers.len(), 1);
        assert_eq!(answers[0].player_id, ids[1]);

        // The round is judgeable as usual
        session.judge_pick(&ids[1]).unwrap();
        assert_eq!(session.state, RoundState::Collecting);
    }

    #[test]
    fn departure_of_a_submitter_does_not_complete_early() {
        let (mut session, ids) = session_with_players(2);
        let card_b = session.player(&ids[1]).unwrap().hand[0].id;
        session.submit(&ids[1], card_b).unwrap();

        // The submitter leaves; the holdout still owes cards
        assert_eq!(session.remove_player(&ids[1]).unwrap(), Departure::Left);
        assert_eq!(session.state, RoundState::Collecting);
    }

    #[test]
    fn nonjudge_departure_mid_round_leaves_round_intact() {
        let (mut session, ids) = session_with_players(3);
        let card_b = session.player(&ids[1]).unwrap().hand[0].id;
        session.submit(&ids[1], card_b).unwrap();

        assert_eq!(session.remove_player(&ids[2]).unwrap(), Departure::Left);
        assert_eq!(session.state, RoundState::Collecting);

        // Completion accounting follows the live roster
        let card_d = session.player(&ids[3]).unwrap().hand[0].id;
        assert!(session.submit(&ids[3], card_d).unwrap());
    }

    #[test]
    fn lookup_survives_draw_and_release() {
        let (mut session, ids) = session_with_players(1);
        let card = session.player(&ids[1]).unwrap().hand[0].clone();
        let text = session.lookup_response(card.id).unwrap().text.clone();

        session.swap_card(&ids[1], card.id).unwrap();
        assert_eq!(session.lookup_response(card.id).unwrap().text, text);
    }
}
