use crate::bot::{BotGames, GameLocks};
use crate::config::Config;
use crate::user_directory::SqlxUserDirectory;
use chess_game::SqlxGameRepository;
use chess_matchmaking::{InMemoryMatchRepository, MatchService};
use chess_session::{EventDispatcher, SessionHub};
use std::sync::Arc;

use crate::ws::WsConnection;

pub type AppMatchService = MatchService<SqlxUserDirectory, SqlxGameRepository, InMemoryMatchRepository>;

/// Everything an HTTP or WebSocket handler needs, shared across requests
/// (spec §4.9's three registries, the Match Service, and the repository).
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub games: Arc<SqlxGameRepository>,
    pub hub: Arc<SessionHub<WsConnection>>,
    pub dispatcher: Arc<EventDispatcher<WsConnection>>,
    pub matches: Arc<AppMatchService>,
    pub bot_games: Arc<BotGames>,
    pub game_locks: Arc<GameLocks>,
}
