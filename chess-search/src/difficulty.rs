use serde::{Deserialize, Serialize};

/// The AI opponent's playing strength (spec §4.4).
#[derive(Debug, Clone, Copy, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    Beginner,
    Intermediate,
    Advanced,
    Master,
}

impl Difficulty {
    /// The maximum iterative-deepening depth for this difficulty.
    pub fn max_depth(self) -> u8 {
        match self {
            Difficulty::Beginner => 2,
            Difficulty::Intermediate => 4,
            Difficulty::Advanced => 5,
            Difficulty::Master => 7,
        }
    }

    /// A hint for how many Lazy-SMP workers to launch, typically at least
    /// the number of available CPU cores.
    pub fn worker_count_hint(self) -> usize {
        let cores = std::thread::available_parallelism()
            .map(|n| n.get())
            .unwrap_or(1);

        match self {
            Difficulty::Beginner => 1,
            Difficulty::Intermediate => cores.min(2),
            Difficulty::Advanced => cores,
            Difficulty::Master => cores,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn max_depth_matches_spec_table() {
        assert_eq!(Difficulty::Beginner.max_depth(), 2);
        assert_eq!(Difficulty::Intermediate.max_depth(), 4);
        assert_eq!(Difficulty::Advanced.max_depth(), 5);
        assert_eq!(Difficulty::Master.max_depth(), 7);
    }

    #[test]
    fn worker_count_hint_is_never_zero() {
        for d in [
            Difficulty::Beginner,
            Difficulty::Intermediate,
            Difficulty::Advanced,
            Difficulty::Master,
        ] {
            assert!(d.worker_count_hint() >= 1);
        }
    }
}
