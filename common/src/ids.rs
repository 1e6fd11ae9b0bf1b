use derive_more::{Display, From};
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use uuid::Uuid;

macro_rules! uuid_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Display, From, Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(Uuid);

        impl $name {
            /// Generates a fresh, random identifier.
            pub fn new() -> Self {
                $name(Uuid::new_v4())
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl FromStr for $name {
            type Err = uuid::Error;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Ok($name(Uuid::parse_str(s)?))
            }
        }
    };
}

uuid_id! {
    /// Identifies a registered user, independent of any particular game.
    UserId
}

impl UserId {
    /// The reserved id standing in for the built-in engine opponent.
    ///
    /// No registered account can hold the nil UUID (`UserId::new` always
    /// generates v4), so this value is unambiguous as a sentinel.
    pub fn bot() -> Self {
        UserId(Uuid::nil())
    }

    /// `true` iff this id identifies the built-in engine opponent rather
    /// than a registered user.
    pub fn is_bot(self) -> bool {
        self.0.is_nil()
    }
}

uuid_id! {
    /// Identifies one side's participation in a single [`GameId`].
    ///
    /// A user playing two concurrent games holds two distinct `PlayerId`s.
    PlayerId
}

uuid_id! {
    /// Identifies a single game aggregate.
    GameId
}
