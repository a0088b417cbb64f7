use std::time::Duration;

use serde::{Deserialize, Serialize};

pub const DEFAULT_MAX_ATTEMPTS: u32 = 3;
pub const DEFAULT_DUPLICATE_WINDOW: usize = 10;
pub const DEFAULT_RETRY_DELAY: Duration = Duration::from_millis(500);

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GenerationPolicy {
    pub max_attempts: u32,
    pub duplicate_window: usize,
    pub retry_delay: Duration,
}

impl Default for GenerationPolicy {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            duplicate_window: DEFAULT_DUPLICATE_WINDOW,
            retry_delay: DEFAULT_RETRY_DELAY,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum GenerationState {
    Attempting,
    AcceptedUnique,
    AcceptedBestEffort,
}

impl GenerationState {
    pub fn is_accepted(&self) -> bool {
        matches!(self, GenerationState::AcceptedUnique | GenerationState::AcceptedBestEffort)
    }
}

/// Counted duplicate guard for one generation run. The recent-text window is
/// captured once at construction; every candidate consumes exactly one
/// attempt, and the final attempt accepts a duplicate rather than failing.
pub struct DuplicateGate {
    recent_texts: Vec<String>,
    max_attempts: u32,
    attempts: u32,
    state: GenerationState,
}

impl DuplicateGate {
    pub fn new(recent_texts: Vec<String>, max_attempts: u32) -> Self {
        Self {
            recent_texts,
            max_attempts: max_attempts.max(1),
            attempts: 0,
            state: GenerationState::Attempting,
        }
    }

    pub fn evaluate(&mut self, candidate_text: &str) -> GenerationState {
        self.attempts += 1;
        let duplicate = self.recent_texts.iter().any(|text| text == candidate_text);

        self.state = match (duplicate, self.attempts >= self.max_attempts) {
            (false, _) => GenerationState::AcceptedUnique,
            (true, true) => GenerationState::AcceptedBestEffort,
            (true, false) => GenerationState::Attempting,
        };
        self.state
    }

    pub fn attempts(&self) -> u32 {
        self.attempts
    }

    pub fn state(&self) -> GenerationState {
        self.state
    }
}
