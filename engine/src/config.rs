fn env_or<T: std::str::FromStr>(name: &str, default: T) -> T {
    std::env::var(name)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

#[derive(Debug, Clone)]
pub struct GameConfig {
    /// Cards dealt to each player at match creation.
    pub hand_size: usize,
    /// Rounds per match; the match finishes once this many have resolved.
    pub max_rounds: i32,
    /// Fixed shuffle seed for reproducible deals; None draws from entropy.
    pub rng_seed: Option<u64>,
}

impl GameConfig {
    pub fn from_env() -> Self {
        Self {
            hand_size: env_or("HAND_SIZE", 5),
            max_rounds: env_or("MAX_ROUNDS", 5),
            rng_seed: None,
        }
    }
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            hand_size: 5,
            max_rounds: 5,
            rng_seed: None,
        }
    }
}
