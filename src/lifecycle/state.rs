use std::fmt;

/// Where contour setup stands for the active terrain source
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum InitState {
    /// No contour source; an attempt may be scheduled
    Uninitialized,
    /// At least one attempt has started and none has succeeded yet
    Attempting,
    /// Source and layers are registered
    Ready,
    /// Gave up; stays here until the terrain source changes
    Exhausted,
}

impl InitState {
    /// Whether the machine will still try on its own
    pub fn is_pending(&self) -> bool {
        matches!(self, InitState::Uninitialized | InitState::Attempting)
    }
}

impl Default for InitState {
    fn default() -> Self {
        InitState::Uninitialized
    }
}

impl fmt::Display for InitState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            InitState::Uninitialized => "uninitialized",
            InitState::Attempting => "attempting",
            InitState::Ready => "ready",
            InitState::Exhausted => "exhausted",
        };
        f.write_str(name)
    }
}

/// Bounded count of setup attempts
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InitAttemptCounter {
    attempts: u32,
    max_attempts: u32,
}

impl InitAttemptCounter {
    pub fn new(max_attempts: u32) -> Self {
        Self {
            attempts: 0,
            max_attempts,
        }
    }

    pub fn attempts(&self) -> u32 {
        self.attempts
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    pub fn reset(&mut self) {
        self.attempts = 0;
    }

    /// Counts one more attempt, returning the new total
    pub fn record(&mut self) -> u32 {
        self.attempts = self.attempts.saturating_add(1);
        self.attempts
    }

    pub fn is_exhausted(&self) -> bool {
        self.attempts >= self.max_attempts
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counter_bound() {
        let mut counter = InitAttemptCounter::new(2);
        assert!(!counter.is_exhausted());
        assert_eq!(counter.record(), 1);
        assert_eq!(counter.record(), 2);
        assert!(counter.is_exhausted());

        counter.reset();
        assert_eq!(counter.attempts(), 0);
        assert!(!counter.is_exhausted());
    }

    #[test]
    fn test_state_display() {
        assert_eq!(InitState::default().to_string(), "uninitialized");
        assert!(InitState::Attempting.is_pending());
        assert!(!InitState::Exhausted.is_pending());
        assert!(!InitState::Ready.is_pending());
    }
}
