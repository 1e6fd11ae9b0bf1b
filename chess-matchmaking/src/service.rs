use crate::match_record::{Match, MatchRepository};
use crate::queue::MatchmakingQueue;
use crate::user_directory::UserDirectory;
use chess_core::Color;
use chess_game::{Game, GameRepository};
use chrono::{DateTime, Utc};
use common::{Error, GameId, UserId};
use rand::Rng;
use std::sync::Arc;
use tracing::instrument;

/// The outcome of [`MatchService::join_matchmaking`] (spec §4.8).
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum JoinOutcome {
    Waiting { queue_position: usize },
    Matched { game_id: GameId, your_colour: Color },
}

/// The outcome of [`MatchService::get_match_status`].
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum MatchStatus {
    NotFound,
    Waiting { queue_position: usize },
    Matched { game_id: GameId, your_colour: Color },
}

/// Pairs waiting users into games (spec §4.8, C8 "Match Service").
///
/// Coordinates the [`MatchmakingQueue`], the [`UserDirectory`] collaborator,
/// game creation through [`GameRepository`], and [`Match`] bookkeeping
/// through [`MatchRepository`].
pub struct MatchService<U, G, M> {
    queue: Arc<MatchmakingQueue>,
    users: Arc<U>,
    games: Arc<G>,
    matches: Arc<M>,
}

impl<U, G, M> MatchService<U, G, M>
where
    U: UserDirectory,
    G: GameRepository,
    M: MatchRepository,
{
    pub fn new(queue: Arc<MatchmakingQueue>, users: Arc<U>, games: Arc<G>, matches: Arc<M>) -> Self {
        MatchService { queue, users, games, matches }
    }

    /// Implements spec §4.8's five-step `joinMatchmaking` flow.
    ///
    /// On any failure after the user has been enqueued, the user is removed
    /// from the queue again before the error is returned.
    #[instrument(skip(self))]
    pub async fn join_matchmaking(&self, user_id: UserId) -> Result<JoinOutcome, Error> {
        if !self.users.user_exists(user_id).await? {
            return Err(Error::UnknownUser);
        }

        if self.queue.is_queued(user_id) {
            return Err(Error::AlreadyQueued);
        }

        if self.matches.find_by_user(user_id).await?.is_some() {
            return Err(Error::AlreadyMatched);
        }

        self.queue.add(user_id)?;

        match self.try_pair(user_id).await {
            Ok(outcome) => Ok(outcome),
            Err(err) => {
                self.queue.remove(user_id);
                Err(err)
            }
        }
    }

    async fn try_pair(&self, user_id: UserId) -> Result<JoinOutcome, Error> {
        let Some((a, b)) = self.queue.find_match() else {
            return Ok(JoinOutcome::Waiting { queue_position: self.queue.size() });
        };

        let white_user = if rand::thread_rng().gen_bool(0.5) { a } else { b };
        let black_user = if white_user == a { b } else { a };

        let game = Game::new(white_user, black_user);
        self.games.save(&game).await?;

        let record = Match::new(
            game.white.id,
            game.black.id,
            white_user,
            black_user,
            game.id,
            now(),
        );
        self.matches.save(record).await?;

        let your_colour = if user_id == white_user { Color::White } else { Color::Black };
        Ok(JoinOutcome::Matched { game_id: game.id, your_colour })
    }

    /// Implements spec §4.8's `cleanupExpiredMatches`: expired [`Match`]
    /// records are deleted outright since neither side ever connected.
    #[instrument(skip(self))]
    pub async fn cleanup_expired_matches(&self) -> Result<usize, Error> {
        self.matches.delete_expired(now()).await
    }

    /// Performs cleanup before answering, so an expired match never shows
    /// as `Matched`.
    #[instrument(skip(self))]
    pub async fn get_match_status(&self, user_id: UserId) -> Result<MatchStatus, Error> {
        self.cleanup_expired_matches().await?;

        if let Some(m) = self.matches.find_by_user(user_id).await? {
            let your_colour = m.colour_for(user_id).expect("find_by_user guarantees involvement");
            return Ok(MatchStatus::Matched { game_id: m.game_id, your_colour });
        }

        if self.queue.is_queued(user_id) {
            return Ok(MatchStatus::Waiting { queue_position: self.queue.size() });
        }

        Ok(MatchStatus::NotFound)
    }
}

fn now() -> DateTime<Utc> {
    Utc::now()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::match_record::InMemoryMatchRepository;
    use crate::user_directory::MockUserDirectory;
    use chess_game::InMemoryGameRepository;

    fn always_known_user() -> MockUserDirectory {
        let mut mock = MockUserDirectory::new();
        mock.expect_user_exists().returning(|_| Ok(true));
        mock
    }

    fn service() -> MatchService<MockUserDirectory, InMemoryGameRepository, InMemoryMatchRepository> {
        MatchService::new(
            Arc::new(MatchmakingQueue::new()),
            Arc::new(always_known_user()),
            Arc::new(InMemoryGameRepository::new()),
            Arc::new(InMemoryMatchRepository::new()),
        )
    }

    #[tokio::test]
    async fn first_user_waits() {
        let svc = service();
        let outcome = svc.join_matchmaking(UserId::new()).await.unwrap();
        assert_eq!(outcome, JoinOutcome::Waiting { queue_position: 1 });
    }

    #[tokio::test]
    async fn second_user_triggers_a_match() {
        let svc = service();
        let (a, b) = (UserId::new(), UserId::new());
        svc.join_matchmaking(a).await.unwrap();
        let outcome = svc.join_matchmaking(b).await.unwrap();

        let JoinOutcome::Matched { game_id, your_colour } = outcome else {
            panic!("expected a match");
        };
        assert!(svc.games.find_by_id(game_id).await.unwrap().is_some());

        let status_a = svc.get_match_status(a).await.unwrap();
        match status_a {
            MatchStatus::Matched { game_id: gid, your_colour: colour_a } => {
                assert_eq!(gid, game_id);
                assert_ne!(colour_a, your_colour);
            }
            other => panic!("expected a's match, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn joining_twice_is_rejected() {
        let svc = service();
        let user = UserId::new();
        svc.join_matchmaking(user).await.unwrap();
        assert_eq!(svc.join_matchmaking(user).await, Err(Error::AlreadyQueued));
    }

    #[tokio::test]
    async fn joining_while_matched_is_rejected() {
        let svc = service();
        let (a, b) = (UserId::new(), UserId::new());
        svc.join_matchmaking(a).await.unwrap();
        svc.join_matchmaking(b).await.unwrap();
        assert_eq!(svc.join_matchmaking(a).await, Err(Error::AlreadyMatched));
    }

    #[tokio::test]
    async fn unknown_user_is_rejected() {
        let mut mock = MockUserDirectory::new();
        mock.expect_user_exists().returning(|_| Ok(false));
        let svc = MatchService::new(
            Arc::new(MatchmakingQueue::new()),
            Arc::new(mock),
            Arc::new(InMemoryGameRepository::new()),
            Arc::new(InMemoryMatchRepository::new()),
        );
        assert_eq!(svc.join_matchmaking(UserId::new()).await, Err(Error::UnknownUser));
    }

    #[tokio::test]
    async fn unqueued_user_status_is_not_found() {
        let svc = service();
        assert_eq!(svc.get_match_status(UserId::new()).await.unwrap(), MatchStatus::NotFound);
    }
}
