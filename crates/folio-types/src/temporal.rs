//! Cooperative deadlines.
//!
//! Engine operations take an explicit [`Deadline`] and check it before
//! repository calls and between loop iterations. Expiry surfaces as
//! [`DeadlineExceeded`], never as a domain error, so callers can tell a
//! cancelled call from a rejected one.

use chrono::{DateTime, Duration, Utc};

/// An optional point in time after which an operation should stop.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Deadline(Option<DateTime<Utc>>);

impl Deadline {
    /// No deadline; checks always pass.
    pub fn none() -> Self {
        Self(None)
    }

    /// Expire at a fixed instant.
    pub fn at(when: DateTime<Utc>) -> Self {
        Self(Some(when))
    }

    /// Expire a duration from now.
    pub fn within(budget: Duration) -> Self {
        Self(Some(Utc::now() + budget))
    }

    pub fn expires_at(&self) -> Option<DateTime<Utc>> {
        self.0
    }

    pub fn is_expired(&self) -> bool {
        match self.0 {
            Some(when) => Utc::now() >= when,
            None => false,
        }
    }

    /// `Err(DeadlineExceeded)` once the instant has passed.
    pub fn check(&self) -> Result<(), DeadlineExceeded> {
        if self.is_expired() {
            Err(DeadlineExceeded)
        } else {
            Ok(())
        }
    }
}

/// The deadline on an operation elapsed before it completed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("operation deadline exceeded")]
pub struct DeadlineExceeded;
