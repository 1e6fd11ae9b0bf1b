mod match_record;
mod queue;
mod service;
mod user_directory;

pub use match_record::{InMemoryMatchRepository, Match, MatchRepository, MATCH_TTL};
pub use queue::MatchmakingQueue;
pub use service::{JoinOutcome, MatchService, MatchStatus};
pub use user_directory::UserDirectory;

#[cfg(test)]
pub use user_directory::MockUserDirectory;
