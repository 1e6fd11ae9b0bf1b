use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use common::{Error, GameId, PlayerId, UserId};
use std::collections::HashMap;
use std::sync::Mutex;

/// How long an unclaimed [`Match`] lives before `cleanupExpiredMatches`
/// reclaims it (spec §5, "Timeouts").
pub const MATCH_TTL: Duration = Duration::minutes(5);

/// A transient record pairing two users who were just matched, pending both
/// of them connecting to the created game (spec §3, "Match").
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub struct Match {
    pub white_player_id: PlayerId,
    pub black_player_id: PlayerId,
    pub white_user_id: UserId,
    pub black_user_id: UserId,
    pub game_id: GameId,
    pub matched_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

impl Match {
    pub fn new(
        white_player_id: PlayerId,
        black_player_id: PlayerId,
        white_user_id: UserId,
        black_user_id: UserId,
        game_id: GameId,
        now: DateTime<Utc>,
    ) -> Self {
        Match {
            white_player_id,
            black_player_id,
            white_user_id,
            black_user_id,
            game_id,
            matched_at: now,
            expires_at: now + MATCH_TTL,
        }
    }

    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at < now
    }

    pub fn involves(&self, user_id: UserId) -> bool {
        self.white_user_id == user_id || self.black_user_id == user_id
    }

    pub fn colour_for(&self, user_id: UserId) -> Option<chess_core::Color> {
        if self.white_user_id == user_id {
            Some(chess_core::Color::White)
        } else if self.black_user_id == user_id {
            Some(chess_core::Color::Black)
        } else {
            None
        }
    }
}

/// Persistence for [`Match`] records (spec §4.6 extends to matches; the
/// repository shape mirrors [`chess_game::GameRepository`]).
#[async_trait]
pub trait MatchRepository: Send + Sync {
    async fn save(&self, m: Match) -> Result<(), Error>;
    async fn find_by_user(&self, user_id: UserId) -> Result<Option<Match>, Error>;
    async fn delete_by_game(&self, game_id: GameId) -> Result<(), Error>;
    async fn delete_expired(&self, now: DateTime<Utc>) -> Result<usize, Error>;
}

/// An in-process match repository backed by a mutex-guarded map.
#[derive(Debug, Default)]
pub struct InMemoryMatchRepository {
    matches: Mutex<HashMap<GameId, Match>>,
}

impl InMemoryMatchRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl MatchRepository for InMemoryMatchRepository {
    async fn save(&self, m: Match) -> Result<(), Error> {
        self.matches.lock().expect("match repository mutex poisoned").insert(m.game_id, m);
        Ok(())
    }

    async fn find_by_user(&self, user_id: UserId) -> Result<Option<Match>, Error> {
        let matches = self.matches.lock().expect("match repository mutex poisoned");
        Ok(matches.values().find(|m| m.involves(user_id)).copied())
    }

    async fn delete_by_game(&self, game_id: GameId) -> Result<(), Error> {
        self.matches.lock().expect("match repository mutex poisoned").remove(&game_id);
        Ok(())
    }

    async fn delete_expired(&self, now: DateTime<Utc>) -> Result<usize, Error> {
        let mut matches = self.matches.lock().expect("match repository mutex poisoned");
        let before = matches.len();
        matches.retain(|_, m| !m.is_expired(now));
        Ok(before - matches.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn expired_matches_are_reclaimed() {
        let repo = InMemoryMatchRepository::new();
        let now = Utc::now();
        let m = Match::new(
            PlayerId::new(),
            PlayerId::new(),
            UserId::new(),
            UserId::new(),
            GameId::new(),
            now - Duration::minutes(6),
        );
        repo.save(m).await.unwrap();
        assert_eq!(repo.delete_expired(now).await.unwrap(), 1);
        assert!(repo.find_by_user(m.white_user_id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn unexpired_matches_survive_cleanup() {
        let repo = InMemoryMatchRepository::new();
        let now = Utc::now();
        let m = Match::new(PlayerId::new(), PlayerId::new(), UserId::new(), UserId::new(), GameId::new(), now);
        repo.save(m).await.unwrap();
        assert_eq!(repo.delete_expired(now).await.unwrap(), 0);
        assert!(repo.find_by_user(m.white_user_id).await.unwrap().is_some());
    }
}
