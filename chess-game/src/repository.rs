use crate::game::Game;
use crate::player::Player;
use crate::status::GameStatus;
use async_trait::async_trait;
use chess_core::{Color, Position};
use common::{Error, GameId, PlayerId, UserId};
use std::collections::HashMap;
use std::sync::Mutex;

/// Persistence for [`Game`] aggregates (spec §4.6). All operations are
/// asynchronous so that both the in-memory and the SQL-backed
/// implementation share one call shape.
#[async_trait]
pub trait GameRepository: Send + Sync {
    async fn save(&self, game: &Game) -> Result<(), Error>;
    async fn find_by_id(&self, id: GameId) -> Result<Option<Game>, Error>;
    async fn delete(&self, id: GameId) -> Result<(), Error>;
    async fn find_all(&self) -> Result<Vec<Game>, Error>;
}

/// An in-process repository backed by a mutex-guarded map, used in tests
/// and for local development without a database.
#[derive(Debug, Default)]
pub struct InMemoryGameRepository {
    games: Mutex<HashMap<GameId, Game>>,
}

impl InMemoryGameRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl GameRepository for InMemoryGameRepository {
    async fn save(&self, game: &Game) -> Result<(), Error> {
        let mut games = self.games.lock().expect("game repository mutex poisoned");
        games.insert(game.id, game.clone());
        Ok(())
    }

    async fn find_by_id(&self, id: GameId) -> Result<Option<Game>, Error> {
        let games = self.games.lock().expect("game repository mutex poisoned");
        Ok(games.get(&id).cloned())
    }

    async fn delete(&self, id: GameId) -> Result<(), Error> {
        let mut games = self.games.lock().expect("game repository mutex poisoned");
        games.remove(&id);
        Ok(())
    }

    async fn find_all(&self) -> Result<Vec<Game>, Error> {
        let games = self.games.lock().expect("game repository mutex poisoned");
        Ok(games.values().cloned().collect())
    }
}

/// A SQLite-backed repository (spec §6, "Persisted state").
///
/// `save` is a single atomic unit: the row is upserted and the move history
/// is replaced wholesale inside one transaction, so a failure of either
/// sub-step rolls back the other.
pub struct SqlxGameRepository {
    pool: sqlx::SqlitePool,
}

impl SqlxGameRepository {
    pub fn new(pool: sqlx::SqlitePool) -> Self {
        Self { pool }
    }

    fn transient(err: sqlx::Error) -> Error {
        Error::Transient(err.to_string())
    }

    /// Creates the `games` and `moves` tables if they do not already exist
    /// (spec §6, "Persisted state"). `moves` cascade-deletes with `games`.
    pub async fn init_schema(pool: &sqlx::SqlitePool) -> Result<(), Error> {
        sqlx::query(
            "CREATE TABLE IF NOT EXISTS games (
                id TEXT PRIMARY KEY,
                white_player_id TEXT NOT NULL,
                black_player_id TEXT NOT NULL,
                white_user_id TEXT NOT NULL,
                black_user_id TEXT NOT NULL,
                fen TEXT NOT NULL,
                current_side TEXT NOT NULL,
                status TEXT NOT NULL,
                draw_offered_by TEXT,
                created_at DATETIME NOT NULL DEFAULT CURRENT_TIMESTAMP,
                updated_at DATETIME NOT NULL DEFAULT CURRENT_TIMESTAMP
            )",
        )
        .execute(pool)
        .await
        .map_err(Self::transient)?;

        sqlx::query(
            "CREATE TABLE IF NOT EXISTS moves (
                game_id TEXT NOT NULL REFERENCES games(id) ON DELETE CASCADE,
                move_number INTEGER NOT NULL,
                from_square TEXT NOT NULL,
                to_square TEXT NOT NULL,
                promotion TEXT,
                created_at DATETIME NOT NULL DEFAULT CURRENT_TIMESTAMP,
                PRIMARY KEY (game_id, move_number)
            )",
        )
        .execute(pool)
        .await
        .map_err(Self::transient)?;

        Ok(())
    }
}

#[derive(sqlx::FromRow)]
struct GameRow {
    white_player_id: String,
    black_player_id: String,
    white_user_id: String,
    black_user_id: String,
    fen: String,
    status: String,
    draw_offered_by: Option<String>,
}

#[async_trait]
impl GameRepository for SqlxGameRepository {
    #[tracing::instrument(skip(self, game), fields(game_id = %game.id))]
    async fn save(&self, game: &Game) -> Result<(), Error> {
        let mut tx = self.pool.begin().await.map_err(Self::transient)?;

        let game_id = game.id.to_string();
        let white_player_id = game.white.id.to_string();
        let black_player_id = game.black.id.to_string();
        let white_user_id = game.white.user_id.to_string();
        let black_user_id = game.black.user_id.to_string();
        let fen = game.position.to_fen();
        let current_side = game.position.side_to_move().to_string();
        let status = status_code(game.status);
        let draw_offered_by = game.draw_offered_by.map(|c| c.to_string());

        sqlx::query(
            "INSERT INTO games \
                (id, white_player_id, black_player_id, white_user_id, black_user_id, \
                 fen, current_side, status, draw_offered_by, updated_at) \
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, CURRENT_TIMESTAMP) \
             ON CONFLICT(id) DO UPDATE SET \
                fen = excluded.fen, \
                current_side = excluded.current_side, \
                status = excluded.status, \
                draw_offered_by = excluded.draw_offered_by, \
                updated_at = CURRENT_TIMESTAMP",
        )
        .bind(&game_id)
        .bind(&white_player_id)
        .bind(&black_player_id)
        .bind(&white_user_id)
        .bind(&black_user_id)
        .bind(&fen)
        .bind(&current_side)
        .bind(status)
        .bind(&draw_offered_by)
        .execute(&mut *tx)
        .await
        .map_err(Self::transient)?;

        sqlx::query("DELETE FROM moves WHERE game_id = ?")
            .bind(&game_id)
            .execute(&mut *tx)
            .await
            .map_err(Self::transient)?;

        for (move_number, mov) in game.history.iter().enumerate() {
            sqlx::query(
                "INSERT INTO moves (game_id, move_number, from_square, to_square, promotion, created_at) \
                 VALUES (?, ?, ?, ?, ?, CURRENT_TIMESTAMP)",
            )
            .bind(&game_id)
            .bind(move_number as i64)
            .bind(mov.from.to_string())
            .bind(mov.to.to_string())
            .bind(mov.promotion.map(|p| p.letter().to_string()))
            .execute(&mut *tx)
            .await
            .map_err(Self::transient)?;
        }

        tx.commit().await.map_err(Self::transient)
    }

    #[tracing::instrument(skip(self))]
    async fn find_by_id(&self, id: GameId) -> Result<Option<Game>, Error> {
        let game_id = id.to_string();

        let row: Option<GameRow> = sqlx::query_as(
            "SELECT white_player_id, black_player_id, white_user_id, black_user_id, \
                    fen, status, draw_offered_by \
             FROM games WHERE id = ?",
        )
        .bind(&game_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(Self::transient)?;

        let Some(GameRow { white_player_id: wp, black_player_id: bp, white_user_id: wu, black_user_id: bu, fen, status, draw_offered_by: draw }) = row
        else {
            return Ok(None);
        };

        let move_rows: Vec<(String, String, Option<String>)> = sqlx::query_as(
            "SELECT from_square, to_square, promotion FROM moves \
             WHERE game_id = ? ORDER BY move_number ASC",
        )
        .bind(&game_id)
        .fetch_all(&self.pool)
        .await
        .map_err(Self::transient)?;

        let history = move_rows
            .into_iter()
            .map(|(from, to, promo)| {
                let notation = format!("{from}{to}{}", promo.unwrap_or_default());
                notation
                    .parse()
                    .map_err(|e| Error::InvalidEncoding(format!("{e}")))
            })
            .collect::<Result<Vec<_>, _>>()?;

        let game = Game {
            id,
            white: Player {
                id: parse_id(&wp)?,
                user_id: parse_id(&wu)?,
                side: Color::White,
            },
            black: Player {
                id: parse_id(&bp)?,
                user_id: parse_id(&bu)?,
                side: Color::Black,
            },
            position: Position::from_fen(&fen)?,
            status: status_from_code(&status)?,
            history,
            draw_offered_by: draw.map(|s| parse_side(&s)).transpose()?,
        };

        Ok(Some(game))
    }

    #[tracing::instrument(skip(self))]
    async fn delete(&self, id: GameId) -> Result<(), Error> {
        sqlx::query("DELETE FROM games WHERE id = ?")
            .bind(id.to_string())
            .execute(&self.pool)
            .await
            .map_err(Self::transient)?;
        Ok(())
    }

    async fn find_all(&self) -> Result<Vec<Game>, Error> {
        let ids: Vec<(String,)> = sqlx::query_as("SELECT id FROM games")
            .fetch_all(&self.pool)
            .await
            .map_err(Self::transient)?;

        let mut games = Vec::with_capacity(ids.len());
        for (id,) in ids {
            let id: GameId = parse_id(&id)?;
            if let Some(game) = self.find_by_id(id).await? {
                games.push(game);
            }
        }
        Ok(games)
    }
}

fn status_code(status: GameStatus) -> &'static str {
    match status {
        GameStatus::InProgress => "IN_PROGRESS",
        GameStatus::Checkmate => "CHECKMATE",
        GameStatus::Stalemate => "STALEMATE",
        GameStatus::Draw => "DRAW",
        GameStatus::Resigned => "RESIGNED",
    }
}

fn status_from_code(code: &str) -> Result<GameStatus, Error> {
    match code {
        "IN_PROGRESS" => Ok(GameStatus::InProgress),
        "CHECKMATE" => Ok(GameStatus::Checkmate),
        "STALEMATE" => Ok(GameStatus::Stalemate),
        "DRAW" => Ok(GameStatus::Draw),
        "RESIGNED" => Ok(GameStatus::Resigned),
        other => Err(Error::InvalidEncoding(format!("unknown game status `{other}`"))),
    }
}

fn parse_side(s: &str) -> Result<Color, Error> {
    match s {
        "w" | "white" | "White" => Ok(Color::White),
        "b" | "black" | "Black" => Ok(Color::Black),
        other => Err(Error::InvalidEncoding(format!("unknown side `{other}`"))),
    }
}

fn parse_id<T: std::str::FromStr>(s: &str) -> Result<T, Error> {
    s.parse()
        .map_err(|_| Error::InvalidEncoding(format!("malformed identifier `{s}`")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn in_memory_repository_round_trips_a_game() {
        let repo = InMemoryGameRepository::new();
        let game = Game::new(UserId::new(), UserId::new());

        repo.save(&game).await.unwrap();
        let loaded = repo.find_by_id(game.id).await.unwrap().unwrap();
        assert_eq!(loaded.id, game.id);

        repo.delete(game.id).await.unwrap();
        assert!(repo.find_by_id(game.id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn find_all_reflects_every_saved_game() {
        let repo = InMemoryGameRepository::new();
        let a = Game::new(UserId::new(), UserId::new());
        let b = Game::new(UserId::new(), UserId::new());
        repo.save(&a).await.unwrap();
        repo.save(&b).await.unwrap();
        assert_eq!(repo.find_all().await.unwrap().len(), 2);
    }
}
