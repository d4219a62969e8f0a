//! Login throttling.
//!
//! Counts failed logins per username. Reaching the limit locks the username
//! for a fixed period; a success or an expired lock resets the count.
//! Failures older than the lockout period are forgotten.
//!
//! State lives in process memory and is bounded: forgotten entries are
//! pruned, and past `capacity` the oldest unlocked entry is evicted to make
//! room.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

/// Usernames tracked at once unless configured otherwise.
pub const DEFAULT_CAPACITY: usize = 10_000;

#[derive(Debug)]
struct Attempts {
    failures: u32,
    last_failure: Instant,
    locked_until: Option<Instant>,
}

impl Attempts {
    fn is_locked(&self, now: Instant) -> bool {
        self.locked_until.is_some_and(|until| until > now)
    }

    /// Nothing left to remember: no live lock and the failures have aged out.
    fn is_stale(&self, now: Instant, lockout: Duration) -> bool {
        match self.locked_until {
            Some(until) => until <= now,
            None => now.saturating_duration_since(self.last_failure) >= lockout,
        }
    }
}

/// Per-username failed-login counter with timed lockout.
#[derive(Debug)]
pub struct LoginThrottle {
    max_attempts: u32,
    lockout: Duration,
    capacity: usize,
    attempts: Mutex<HashMap<String, Attempts>>,
}

impl LoginThrottle {
    /// Lock after `max_attempts` failures for `lockout`.
    ///
    /// `max_attempts == 0` never locks.
    pub fn new(max_attempts: u32, lockout: Duration) -> Self {
        Self::with_capacity(max_attempts, lockout, DEFAULT_CAPACITY)
    }

    /// Like [`LoginThrottle::new`], tracking at most `capacity` usernames.
    pub fn with_capacity(max_attempts: u32, lockout: Duration, capacity: usize) -> Self {
        Self {
            max_attempts,
            lockout,
            capacity: capacity.max(1),
            attempts: Mutex::new(HashMap::new()),
        }
    }

    // Counters stay meaningful after a panic elsewhere; recover the guard.
    fn state(&self) -> MutexGuard<'_, HashMap<String, Attempts>> {
        self.attempts.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn key(username: &str) -> String {
        username.to_lowercase()
    }

    /// `Err(remaining)` while the username is locked.
    pub fn check(&self, username: &str) -> Result<(), Duration> {
        self.check_at(username, Instant::now())
    }

    pub fn check_at(&self, username: &str, now: Instant) -> Result<(), Duration> {
        let mut state = self.state();
        let key = Self::key(username);

        let locked_until = state.get(&key).and_then(|entry| entry.locked_until);
        match locked_until {
            Some(until) if until > now => Err(until - now),
            Some(_) => {
                state.remove(&key);
                Ok(())
            }
            None => Ok(()),
        }
    }

    /// Record a failed login. Returns the lockout if this failure triggered it.
    pub fn record_failure(&self, username: &str) -> Option<Duration> {
        self.record_failure_at(username, Instant::now())
    }

    pub fn record_failure_at(&self, username: &str, now: Instant) -> Option<Duration> {
        if self.max_attempts == 0 {
            return None;
        }

        let mut state = self.state();
        let key = Self::key(username);

        if state.get(&key).is_some_and(|e| e.is_stale(now, self.lockout)) {
            state.remove(&key);
        }
        if !state.contains_key(&key) && state.len() >= self.capacity {
            self.make_room(&mut state, now);
        }

        let entry = state.entry(key).or_insert(Attempts {
            failures: 0,
            last_failure: now,
            locked_until: None,
        });
        entry.failures += 1;
        entry.last_failure = now;

        if entry.failures >= self.max_attempts {
            entry.locked_until = Some(now + self.lockout);
            Some(self.lockout)
        } else {
            None
        }
    }

    fn make_room(&self, state: &mut HashMap<String, Attempts>, now: Instant) {
        state.retain(|_, entry| !entry.is_stale(now, self.lockout));
        if state.len() < self.capacity {
            return;
        }

        // Prefer evicting an unlocked entry so live locks survive a flood.
        let victim = state
            .iter()
            .filter(|(_, entry)| !entry.is_locked(now))
            .min_by_key(|(_, entry)| entry.last_failure)
            .or_else(|| state.iter().min_by_key(|(_, entry)| entry.last_failure))
            .map(|(key, _)| key.clone());

        if let Some(victim) = victim {
            state.remove(&victim);
        }
    }

    /// Forget all failures for this username.
    pub fn record_success(&self, username: &str) {
        self.state().remove(&Self::key(username));
    }

    /// Failures left before the username locks.
    pub fn remaining_attempts(&self, username: &str) -> u32 {
        let now = Instant::now();
        let failures = self
            .state()
            .get(&Self::key(username))
            .filter(|entry| !entry.is_stale(now, self.lockout))
            .map_or(0, |entry| entry.failures);
        self.max_attempts.saturating_sub(failures)
    }

    /// Number of usernames currently tracked.
    pub fn tracked(&self) -> usize {
        self.state().len()
    }
}
