//! Per-identity login throttling.
//!
//! Failed login attempts are counted per normalized email. Reaching
//! `max_attempts` consecutive failures locks the identity out for
//! `lockout_duration`; failures older than `reset_window` no longer count.
//!
//! # Example
//!
//! ```rust
//! use chrono::Utc;
//! use turntable_core::services::{LoginThrottle, ThrottleConfig};
//!
//! let throttle = LoginThrottle::new(ThrottleConfig::default()).unwrap();
//! let now = Utc::now();
//!
//! // Check before calling the credential verifier...
//! assert!(throttle.check_allowed("user@example.com", now).is_ok());
//!
//! // ...and record the verifier's answer afterwards.
//! throttle.record_outcome("user@example.com", now, false);
//! assert_eq!(throttle.record("user@example.com").unwrap().failure_count, 1);
//! ```
//!
//! The table lives in memory only. A restart clears every counter and lockout.

use chrono::{DateTime, Duration, Utc};
use dashmap::{DashMap, mapref::entry::Entry};
use serde::{Deserialize, Serialize};

use crate::{
    error::{RateLimited, ValidationError},
    validation::normalize_identity,
};

/// Longest duration any throttle setting may take.
pub const MAX_THROTTLE_DURATION: Duration = Duration::days(365);

/// Configuration for login throttling.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ThrottleConfig {
    /// Consecutive failures that trigger a lockout.
    pub max_attempts: u32,
    /// How long a lockout lasts.
    pub lockout_duration: Duration,
    /// Inactivity after which accumulated failures are discarded.
    pub reset_window: Duration,
    /// Period of the background sweep that evicts stale records.
    pub janitor_interval: Duration,
}

impl Default for ThrottleConfig {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            lockout_duration: Duration::minutes(15),
            reset_window: Duration::minutes(30),
            janitor_interval: Duration::minutes(60),
        }
    }
}

impl ThrottleConfig {
    pub fn with_max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = max_attempts;
        self
    }

    pub fn with_lockout_duration(mut self, lockout_duration: Duration) -> Self {
        self.lockout_duration = lockout_duration;
        self
    }

    pub fn with_reset_window(mut self, reset_window: Duration) -> Self {
        self.reset_window = reset_window;
        self
    }

    pub fn with_janitor_interval(mut self, janitor_interval: Duration) -> Self {
        self.janitor_interval = janitor_interval;
        self
    }

    /// Reject configurations the state machine cannot honor.
    ///
    /// Durations must be positive and at most [`MAX_THROTTLE_DURATION`]. The
    /// lockout must fit inside the reset window so that a lockout set by a
    /// failure ends before the failure goes stale. A lockout applied later by
    /// [`LoginThrottle::check_allowed`] is anchored at the check and may
    /// outlast the window; the sweep keeps such records until the lockout
    /// ends.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.max_attempts == 0 {
            return Err(ValidationError::InvalidField(
                "max_attempts must be at least 1".to_string(),
            ));
        }

        for (name, value) in [
            ("lockout_duration", self.lockout_duration),
            ("reset_window", self.reset_window),
            ("janitor_interval", self.janitor_interval),
        ] {
            if value <= Duration::zero() {
                return Err(ValidationError::InvalidField(format!(
                    "{name} must be positive"
                )));
            }
            if value > MAX_THROTTLE_DURATION {
                return Err(ValidationError::InvalidField(format!(
                    "{name} must not exceed {} days",
                    MAX_THROTTLE_DURATION.num_days()
                )));
            }
        }

        if self.lockout_duration > self.reset_window {
            return Err(ValidationError::InvalidField(
                "lockout_duration must not exceed reset_window".to_string(),
            ));
        }

        Ok(())
    }
}

/// Failure bookkeeping for one identity.
///
/// A record only exists while it carries at least one failure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttemptRecord {
    pub identity: String,
    pub failure_count: u32,
    pub last_failure_at: DateTime<Utc>,
    pub locked_until: Option<DateTime<Utc>>,
}

impl AttemptRecord {
    fn first_failure(identity: String, now: DateTime<Utc>) -> Self {
        Self {
            identity,
            failure_count: 1,
            last_failure_at: now,
            locked_until: None,
        }
    }

    /// Whether the lockout is in force at `now`.
    pub fn is_locked(&self, now: DateTime<Utc>) -> bool {
        self.locked_until.is_some_and(|until| now < until)
    }

    fn lockout_expired(&self, now: DateTime<Utc>) -> bool {
        self.locked_until.is_some_and(|until| now >= until)
    }

    fn is_stale(&self, now: DateTime<Utc>, reset_window: Duration) -> bool {
        now - self.last_failure_at > reset_window
    }
}

/// Gate for authentication attempts.
///
/// Call [`check_allowed`](Self::check_allowed) before asking the credential
/// verifier and [`record_outcome`](Self::record_outcome) after it answers.
/// The throttle never sees secrets, only identities and outcomes.
///
/// # Thread Safety
///
/// Each operation holds the table shard lock for its identity across the
/// whole read-modify-write, so concurrent attempts for one identity cannot
/// lose an increment or skip the lockout. The janitor may sweep concurrently.
#[derive(Debug)]
pub struct LoginThrottle {
    attempts: DashMap<String, AttemptRecord>,
    config: ThrottleConfig,
}

impl Default for LoginThrottle {
    fn default() -> Self {
        Self {
            attempts: DashMap::new(),
            config: ThrottleConfig::default(),
        }
    }
}

impl LoginThrottle {
    pub fn new(config: ThrottleConfig) -> Result<Self, ValidationError> {
        config.validate()?;
        Ok(Self {
            attempts: DashMap::new(),
            config,
        })
    }

    pub fn config(&self) -> &ThrottleConfig {
        &self.config
    }

    /// Decide whether `identity` may attempt to authenticate at `now`.
    ///
    /// Unknown identities are always allowed. An expired lockout or a record
    /// idle for longer than the reset window is deleted and the attempt is
    /// allowed. A record sitting at the threshold without a lockout is locked
    /// here.
    pub fn check_allowed(&self, identity: &str, now: DateTime<Utc>) -> Result<(), RateLimited> {
        let Entry::Occupied(mut entry) = self.attempts.entry(normalize_identity(identity)) else {
            return Ok(());
        };

        let record = entry.get();

        if let Some(until) = record.locked_until.filter(|until| now < *until) {
            return Err(RateLimited::from_remaining(until - now));
        }

        if record.lockout_expired(now) {
            tracing::debug!(identity = %record.identity, "Lockout expired, clearing attempts");
            entry.remove();
            return Ok(());
        }

        if record.is_stale(now, self.config.reset_window) {
            tracing::debug!(identity = %record.identity, "Discarding stale login attempts");
            entry.remove();
            return Ok(());
        }

        if record.failure_count >= self.config.max_attempts {
            let record = entry.get_mut();
            let Some(until) = now.checked_add_signed(self.config.lockout_duration) else {
                tracing::error!(
                    identity = %record.identity,
                    "Lockout end is out of range, rejecting without a lockout"
                );
                return Err(RateLimited::from_remaining(self.config.lockout_duration));
            };
            record.locked_until = Some(until);
            tracing::warn!(
                identity = %record.identity,
                failures = record.failure_count,
                "Login attempts exceeded, locking identity"
            );
            return Err(RateLimited::from_remaining(self.config.lockout_duration));
        }

        Ok(())
    }

    /// Record the credential verifier's answer for `identity`.
    ///
    /// A success deletes the record. A failure starts or extends the count
    /// and locks the identity on the attempt that reaches `max_attempts`.
    /// Never fails; problems are logged and the login response proceeds.
    pub fn record_outcome(&self, identity: &str, now: DateTime<Utc>, success: bool) {
        let key = normalize_identity(identity);
        if key.is_empty() {
            tracing::warn!("Ignoring login outcome for an empty identity");
            return;
        }

        if success {
            if self.attempts.remove(&key).is_some() {
                tracing::debug!(identity = %key, "Login succeeded, attempts cleared");
            }
            return;
        }

        match self.attempts.entry(key) {
            Entry::Vacant(entry) => {
                let identity = entry.key().clone();
                tracing::debug!(identity = %identity, failures = 1, "Recorded failed login");
                entry.insert(AttemptRecord::first_failure(identity, now));
            }
            Entry::Occupied(mut entry) => {
                let record = entry.get_mut();

                let stale =
                    !record.is_locked(now) && record.is_stale(now, self.config.reset_window);
                if record.lockout_expired(now) || stale {
                    *record = AttemptRecord::first_failure(record.identity.clone(), now);
                    tracing::debug!(
                        identity = %record.identity,
                        failures = 1,
                        "Recorded failed login"
                    );
                    return;
                }

                record.failure_count = record.failure_count.saturating_add(1);
                record.last_failure_at = now;
                tracing::debug!(
                    identity = %record.identity,
                    failures = record.failure_count,
                    "Recorded failed login"
                );

                if record.failure_count >= self.config.max_attempts && record.locked_until.is_none()
                {
                    match now.checked_add_signed(self.config.lockout_duration) {
                        Some(until) => {
                            record.locked_until = Some(until);
                            tracing::warn!(
                                identity = %record.identity,
                                failures = record.failure_count,
                                "Login attempts exceeded, locking identity"
                            );
                        }
                        None => tracing::error!(
                            identity = %record.identity,
                            "Lockout end is out of range, identity left unlocked"
                        ),
                    }
                }
            }
        }
    }

    /// Delete records whose last failure is older than the reset window.
    ///
    /// Returns the number of records removed. Locked records inside the
    /// window are kept, as are records whose lockout is still in force.
    pub fn sweep(&self, now: DateTime<Utc>) -> usize {
        let reset_window = self.config.reset_window;
        let mut removed = 0;
        self.attempts.retain(|_, record| {
            let keep = record.is_locked(now) || !record.is_stale(now, reset_window);
            if !keep {
                removed += 1;
            }
            keep
        });
        removed
    }

    /// Snapshot of the record for `identity`, if any.
    pub fn record(&self, identity: &str) -> Option<AttemptRecord> {
        self.attempts
            .get(&normalize_identity(identity))
            .map(|record| record.value().clone())
    }

    pub fn len(&self) -> usize {
        self.attempts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.attempts.is_empty()
    }
}
