//! Protocol orchestration
//!
//! Translates each inbound [`ClientMessage`] into one session mutation and
//! an ordered list of outbound events. The order within a response matters:
//! a join acknowledgment is emitted before the roster broadcast, so a client
//! never sees a broadcast referencing a player id it hasn't been told is
//! its own. Failed actions mutate nothing and emit a single unicast error.

use crate::error::GameError;
use crate::protocol::*;
use crate::state::session::Departure;
use crate::state::{AppState, SessionHandle};
use crate::types::{CardId, PlayerId, SessionId, WINNER_POINTS};
use std::sync::Arc;

/// What the transport knows about one connection: which session and player
/// it speaks for, once it has started or joined a game.
#[derive(Debug, Default)]
pub struct ConnCtx {
    pub session_id: Option<SessionId>,
    pub player_id: Option<PlayerId>,
}

/// Handle one client message, returning the events to deliver in order
pub async fn handle_message(
    msg: ClientMessage,
    conn: &mut ConnCtx,
    state: &Arc<AppState>,
) -> Vec<Outgoing> {
    let result = match msg {
        ClientMessage::Start { display_name } => handle_start(state, conn, display_name).await,
        ClientMessage::Join {
            session_id,
            display_name,
        } => handle_join(state, conn, session_id, display_name).await,
        ClientMessage::SwapCard {
            session_id,
            player_id,
            card_id,
        } => handle_swap_card(state, session_id, player_id, card_id).await,
        ClientMessage::Submit {
            session_id,
            player_id,
            card_id,
        } => handle_submit(state, session_id, player_id, card_id).await,
        ClientMessage::JudgePick {
            session_id,
            player_id,
            winning_player_id,
        } => handle_judge_pick(state, session_id, player_id, winning_player_id).await,
    };

    result.unwrap_or_else(|e| {
        tracing::warn!("Action rejected: {}", e);
        vec![Outgoing::unicast(ServerMessage::Error {
            code: e.code().to_string(),
            msg: e.to_string(),
        })]
    })
}

async fn require_session(
    state: &Arc<AppState>,
    session_id: &str,
) -> Result<SessionHandle, GameError> {
    state
        .get_session(session_id)
        .await
        .ok_or(GameError::SessionNotFound)
}

fn roster(game: &crate::state::session::GameSession) -> ServerMessage {
    ServerMessage::Roster {
        players: game.players().iter().map(PlayerInfo::from).collect(),
    }
}

fn prompt_event(prompt: &crate::types::PromptCard) -> ServerMessage {
    ServerMessage::Prompt {
        text: prompt.text.clone(),
        blank_count: prompt.blank_count,
    }
}

async fn handle_start(
    state: &Arc<AppState>,
    conn: &mut ConnCtx,
    display_name: String,
) -> Result<Vec<Outgoing>, GameError> {
    let entry = state.create_session().await;
    let mut game = entry.game.lock().await;

    let added = game.add_player(display_name.clone(), true);
    let setup = match added {
        Ok(player_id) => game.start_round().map(|prompt| (player_id, prompt)),
        Err(e) => Err(e),
    };

    let (player_id, prompt) = match setup {
        Ok(v) => v,
        Err(e) => {
            // A session that never started must not linger in the registry
            drop(game);
            state.remove_session(&entry.id).await;
            return Err(e);
        }
    };

    tracing::info!("Created session {} for {}", entry.id, display_name);

    let hand = game.player(&player_id).map(|p| p.hand.clone()).unwrap_or_default();
    let events = vec![
        Outgoing::unicast(ServerMessage::SessionCreated {
            session_id: entry.id.clone(),
        }),
        Outgoing::unicast(ServerMessage::PlayerAssigned {
            player_id: player_id.clone(),
        }),
        Outgoing::unicast(prompt_event(&prompt)),
        Outgoing::unicast(ServerMessage::Hand {
            cards: hand.iter().map(CardInfo::from).collect(),
        }),
        Outgoing::broadcast(roster(&game)),
    ];

    conn.session_id = Some(entry.id.clone());
    conn.player_id = Some(player_id);
    Ok(events)
}

async fn handle_join(
    state: &Arc<AppState>,
    conn: &mut ConnCtx,
    session_id: SessionId,
    display_name: String,
) -> Result<Vec<Outgoing>, GameError> {
    let entry = require_session(state, &session_id).await?;
    let mut game = entry.game.lock().await;

    let player_id = game.add_player(display_name.clone(), false)?;
    tracing::info!("{} joined session {}", display_name, session_id);

    let mut events = vec![Outgoing::unicast(ServerMessage::PlayerAssigned {
        player_id: player_id.clone(),
    })];
    if let Some(prompt) = game.active_prompt() {
        events.push(Outgoing::unicast(prompt_event(prompt)));
    }
    let hand = game.player(&player_id).map(|p| p.hand.clone()).unwrap_or_default();
    events.push(Outgoing::unicast(ServerMessage::Hand {
        cards: hand.iter().map(CardInfo::from).collect(),
    }));
    events.push(Outgoing::broadcast(roster(&game)));

    conn.session_id = Some(session_id);
    conn.player_id = Some(player_id);
    Ok(events)
}

async fn handle_swap_card(
    state: &Arc<AppState>,
    session_id: SessionId,
    player_id: PlayerId,
    card_id: CardId,
) -> Result<Vec<Outgoing>, GameError> {
    let entry = require_session(state, &session_id).await?;
    let mut game = entry.game.lock().await;

    let hand = game.swap_card(&player_id, card_id)?;
    Ok(vec![Outgoing::unicast(ServerMessage::Hand {
        cards: hand.iter().map(CardInfo::from).collect(),
    })])
}

async fn handle_submit(
    state: &Arc<AppState>,
    session_id: SessionId,
    player_id: PlayerId,
    card_id: CardId,
) -> Result<Vec<Outgoing>, GameError> {
    let entry = require_session(state, &session_id).await?;
    let mut game = entry.game.lock().await;

    let complete = game.submit(&player_id, card_id)?;

    let hand = game.player(&player_id).map(|p| p.hand.clone()).unwrap_or_default();
    let mut events = vec![
        Outgoing::unicast(ServerMessage::WaitForJudge),
        Outgoing::unicast(ServerMessage::Hand {
            cards: hand.iter().map(CardInfo::from).collect(),
        }),
    ];

    if complete {
        let submissions = game
            .round_answers()?
            .iter()
            .map(SubmissionInfo::from)
            .collect();
        events.push(Outgoing::broadcast(ServerMessage::Judging { submissions }));
    }

    Ok(events)
}

async fn handle_judge_pick(
    state: &Arc<AppState>,
    session_id: SessionId,
    player_id: PlayerId,
    winning_player_id: PlayerId,
) -> Result<Vec<Outgoing>, GameError> {
    let entry = require_session(state, &session_id).await?;
    let mut game = entry.game.lock().await;

    // Only the current judge may pick a winner
    if game.judge().map(|j| j.id.clone()) != Some(player_id) {
        return Err(GameError::NotEligible);
    }

    let prompt = game.judge_pick(&winning_player_id)?;
    tracing::info!(
        "Session {}: round won by {}",
        session_id,
        winning_player_id
    );

    Ok(vec![
        Outgoing::broadcast(ServerMessage::ScoreUpdate {
            player_id: winning_player_id,
            delta: WINNER_POINTS,
        }),
        Outgoing::broadcast(prompt_event(&prompt)),
        Outgoing::broadcast(roster(&game)),
        Outgoing::broadcast(ServerMessage::RoundReset {
            session_id: session_id.clone(),
        }),
    ])
}

/// Implicit `leave` on transport disconnect. Broadcasts go straight to the
/// session channel since the departing connection has no sink left to
/// unicast to.
pub async fn handle_disconnect(conn: &ConnCtx, state: &Arc<AppState>) {
    let (Some(session_id), Some(player_id)) = (&conn.session_id, &conn.player_id) else {
        return;
    };
    let Some(entry) = state.get_session(session_id).await else {
        return;
    };

    let mut game = entry.game.lock().await;
    match game.remove_player(player_id) {
        Ok(Departure::Left) => {
            let _ = entry.events.send(roster(&game));
        }
        Ok(Departure::RoundCompleted) => {
            // The departure satisfied the completion check, so the judging
            // broadcast the departed player was holding up goes out now
            let _ = entry.events.send(roster(&game));
            if let Ok(answers) = game.round_answers() {
                let _ = entry.events.send(ServerMessage::Judging {
                    submissions: answers.iter().map(SubmissionInfo::from).collect(),
                });
            }
        }
        Ok(Departure::RoundAbandoned { new_prompt }) => {
            tracing::info!("Judge left session {}, round abandoned", session_id);
            let _ = entry.events.send(prompt_event(&new_prompt));
            let _ = entry.events.send(roster(&game));
            let _ = entry.events.send(ServerMessage::RoundReset {
                session_id: session_id.clone(),
            });
        }
        Ok(Departure::SessionEnded) => {
            drop(game);
            state.remove_session(session_id).await;
        }
        Err(e) => {
            tracing::warn!("Disconnect cleanup for {} failed: {}", player_id, e);
        }
    }
}
