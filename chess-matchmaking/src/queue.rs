use common::{Error, UserId};
use std::collections::VecDeque;
use std::sync::Mutex;

/// An ordered set of waiting users, keyed by insertion time (spec §4.7).
///
/// `add`/`remove`/`find_match`/`is_queued` all go through one mutex, so
/// pair-up is linearisable: no user can ever appear in two concurrent
/// `find_match` results.
#[derive(Debug, Default)]
pub struct MatchmakingQueue {
    waiting: Mutex<VecDeque<UserId>>,
}

impl MatchmakingQueue {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, VecDeque<UserId>> {
        self.waiting.lock().expect("matchmaking queue mutex poisoned")
    }

    pub fn add(&self, user_id: UserId) -> Result<(), Error> {
        let mut waiting = self.lock();
        if waiting.contains(&user_id) {
            return Err(Error::AlreadyQueued);
        }
        waiting.push_back(user_id);
        Ok(())
    }

    /// Returns whether `user_id` was present.
    pub fn remove(&self, user_id: UserId) -> bool {
        let mut waiting = self.lock();
        if let Some(pos) = waiting.iter().position(|&u| u == user_id) {
            waiting.remove(pos);
            true
        } else {
            false
        }
    }

    /// If at least two users are waiting, atomically removes the two
    /// oldest and returns them; otherwise leaves the queue untouched.
    pub fn find_match(&self) -> Option<(UserId, UserId)> {
        let mut waiting = self.lock();
        if waiting.len() < 2 {
            return None;
        }
        let a = waiting.pop_front().expect("checked len >= 2");
        let b = waiting.pop_front().expect("checked len >= 2");
        Some((a, b))
    }

    pub fn size(&self) -> usize {
        self.lock().len()
    }

    pub fn is_queued(&self, user_id: UserId) -> bool {
        self.lock().contains(&user_id)
    }
}
