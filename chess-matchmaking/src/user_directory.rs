use async_trait::async_trait;
use common::{Error, UserId};

/// A collaborator the Match Service consults to confirm a `userId`
/// genuinely corresponds to a registered user (spec §4.8 step 1).
///
/// Authentication and user registration are out of this crate's scope
/// (spec §6 treats `/api/auth/*` as external collaborators); this trait is
/// the seam the matchmaking flow uses instead of depending on them
/// directly.
#[async_trait]
pub trait UserDirectory: Send + Sync {
    async fn user_exists(&self, user_id: UserId) -> Result<bool, Error>;
}

#[cfg(test)]
mockall::mock! {
    #[derive(Debug)]
    pub UserDirectory {
        pub fn user_exists(&self, user_id: UserId) -> Result<bool, Error>;
    }
}

#[cfg(test)]
#[async_trait]
impl UserDirectory for MockUserDirectory {
    async fn user_exists(&self, user_id: UserId) -> Result<bool, Error> {
        MockUserDirectory::user_exists(self, user_id)
    }
}
