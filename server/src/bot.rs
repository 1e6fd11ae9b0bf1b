use crate::state::AppState;
use chess_game::{Game, GameRepository};
use chess_search::Difficulty;
use common::{Error, GameId, PlayerId, UserId};
use dashmap::DashMap;
use rand::Rng;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::warn;

/// Tracks which games are played against the built-in engine and at what
/// difficulty (spec §1: "games against other humans or a built-in engine").
/// `Game`/`GameRepository` carry no notion of a bot opponent — that would
/// mix a search concern into the persisted aggregate — so the server keeps
/// this association itself, keyed by the bot's own `PlayerId`.
#[derive(Default)]
pub struct BotGames {
    difficulty_by_bot_player: DashMap<PlayerId, Difficulty>,
}

impl BotGames {
    pub fn new() -> Self {
        Self::default()
    }

    fn register(&self, bot_player_id: PlayerId, difficulty: Difficulty) {
        self.difficulty_by_bot_player.insert(bot_player_id, difficulty);
    }

    fn difficulty_for(&self, bot_player_id: PlayerId) -> Option<Difficulty> {
        self.difficulty_by_bot_player.get(&bot_player_id).map(|d| *d)
    }
}

/// Serialises all mutations of a single game (spec §4.9: "all mutations of
/// a single Game are funneled through a single-writer region, equivalent to
/// a per-game lock"), across both human moves and engine replies.
#[derive(Default)]
pub struct GameLocks {
    locks: DashMap<GameId, Arc<Mutex<()>>>,
}

impl GameLocks {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn lock_for(&self, game_id: GameId) -> Arc<Mutex<()>> {
        Arc::clone(self.locks.entry(game_id).or_insert_with(|| Arc::new(Mutex::new(()))).value())
    }
}

/// Creates a game between `user_id` and the built-in engine, assigning
/// colours with the same coin flip the matchmaking service uses, and
/// records its difficulty so future moves trigger an engine reply.
pub async fn create_vs_bot_game(state: &AppState, user_id: UserId, difficulty: Difficulty) -> Result<Game, Error> {
    let user_is_white = rand::thread_rng().gen_bool(0.5);
    let game = if user_is_white { Game::new(user_id, UserId::bot()) } else { Game::new(UserId::bot(), user_id) };

    state.games.save(&game).await?;

    let bot_player_id = if user_is_white { game.black.id } else { game.white.id };
    state.bot_games.register(bot_player_id, difficulty);

    Ok(game)
}

/// If it is the engine's turn in `game_id`, computes and applies its move,
/// saves the result, and dispatches the resulting event — exactly as if a
/// human had submitted it (spec §2: "Engine moves are produced by the
/// Search Engine and then submitted as if from a human player").
///
/// A no-op for games that have no registered bot side, whose bot side
/// isn't currently to move, or that have already reached a terminal
/// status. Search workers run to completion once started; there is no
/// cancellation path (spec §4.9, "Cancellation").
pub async fn maybe_play_bot_move(state: AppState, game_id: GameId) {
    let lock = state.game_locks.lock_for(game_id);
    let _guard = lock.lock().await;

    let Ok(Some(game)) = state.games.find_by_id(game_id).await else { return };
    if game.status.is_terminal() {
        return;
    }

    let to_move = if game.position.side_to_move() == game.white.side { &game.white } else { &game.black };
    let Some(difficulty) = state.bot_games.difficulty_for(to_move.id) else { return };
    let bot_player_id = to_move.id;
    let (white, black) = (game.white.id, game.black.id);
    let position = game.position;

    let search = tokio::task::spawn_blocking(move || chess_search::best_move(&position, difficulty)).await;
    let Ok(Ok(result)) = search else {
        warn!(?game_id, "search engine failed to produce a bot move");
        return;
    };

    let Ok(Some(mut game)) = state.games.find_by_id(game_id).await else { return };
    match game.make_move(bot_player_id, result.best_move) {
        Ok(event) => {
            let terminal = game.status.is_terminal();
            if state.games.save(&game).await.is_ok() {
                state.dispatcher.dispatch_game_event(game_id, white, black, &event).await;
                if terminal {
                    state.hub.schedule_terminal_close(game_id, white, black);
                }
            }
        }
        Err(err) => warn!(?game_id, %err, "engine proposed an illegal move"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn game_locks_hand_back_the_same_mutex_for_the_same_game() {
        let locks = GameLocks::new();
        let game_id = GameId::new();

        let a = locks.lock_for(game_id);
        let b = locks.lock_for(game_id);

        assert!(Arc::ptr_eq(&a, &b));
    }

    #[test]
    fn game_locks_hand_back_distinct_mutexes_for_distinct_games() {
        let locks = GameLocks::new();

        let a = locks.lock_for(GameId::new());
        let b = locks.lock_for(GameId::new());

        assert!(!Arc::ptr_eq(&a, &b));
    }

    #[test]
    fn bot_games_recall_the_difficulty_registered_for_a_player() {
        let bots = BotGames::new();
        let bot_player_id = PlayerId::new();

        assert!(bots.difficulty_for(bot_player_id).is_none());
        bots.register(bot_player_id, Difficulty::Advanced);
        assert_eq!(bots.difficulty_for(bot_player_id), Some(Difficulty::Advanced));
    }
}
