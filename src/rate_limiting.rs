// ABOUTME: Provider-wide hourly call budget shared by every patient and metric
// ABOUTME: Fixed window reset after 3600s plus retry-after backoff driven by HTTP 429 responses
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! # Provider Rate Limiting
//!
//! The provider enforces a per-application quota, so one [`RateLimiter`] is
//! shared by every request the engine makes. State lives behind a single lock:
//! checking the budget and reserving a slot happen together in
//! [`RateLimiter::try_acquire`], so concurrent callers cannot overshoot it.
//!
//! A reservation is a [`CallPermit`]. Completing the permit counts the call;
//! dropping it (for example when the request future is cancelled) only
//! releases the reservation.

use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tracing::{debug, warn};
use vitals_core::constants::rate_limit::{
    FALLBACK_RETRY_AFTER_SECS, MAX_RETRY_AFTER_SECS, WINDOW_SECS,
};
use vitals_core::errors::{VitalsError, VitalsResult};

/// HTTP status the provider uses to signal quota exhaustion
pub const TOO_MANY_REQUESTS: u16 = 429;

#[derive(Debug)]
struct RateLimitState {
    window_start: DateTime<Utc>,
    calls_in_window: u32,
    in_flight: u32,
    retry_after: Option<DateTime<Utc>>,
}

impl RateLimitState {
    /// Clear an elapsed backoff and start a new window when the old one is over
    fn roll(&mut self, now: DateTime<Utc>) {
        if self.retry_after.is_some_and(|until| now >= until) {
            self.retry_after = None;
        }
        if now - self.window_start >= Duration::seconds(WINDOW_SECS) {
            debug!(
                previous_calls = self.calls_in_window,
                "Rate limit window reset"
            );
            self.calls_in_window = 0;
            self.window_start = now;
        }
    }
}

/// Point-in-time view of the limiter
#[derive(Debug, Clone, Serialize)]
pub struct RateLimitSnapshot {
    /// Budget per window
    pub hourly_limit: u32,
    /// Completed calls in the current window
    pub calls_in_window: u32,
    /// Reserved calls not yet completed
    pub in_flight: u32,
    /// Start of the current window
    pub window_start: DateTime<Utc>,
    /// Backoff deadline, when one is in effect
    pub retry_after: Option<DateTime<Utc>>,
}

/// Shared hourly call budget with retry-after backoff
#[derive(Debug)]
pub struct RateLimiter {
    hourly_limit: u32,
    state: Mutex<RateLimitState>,
}

impl RateLimiter {
    /// Limiter with `hourly_limit` calls per window, window starting now
    #[must_use]
    pub fn new(hourly_limit: u32) -> Self {
        Self::starting_at(hourly_limit, Utc::now())
    }

    /// Limiter whose first window starts at `window_start`
    #[must_use]
    pub const fn starting_at(hourly_limit: u32, window_start: DateTime<Utc>) -> Self {
        Self {
            hourly_limit,
            state: Mutex::new(RateLimitState {
                window_start,
                calls_in_window: 0,
                in_flight: 0,
                retry_after: None,
            }),
        }
    }

    /// Budget per window
    #[must_use]
    pub const fn hourly_limit(&self) -> u32 {
        self.hourly_limit
    }

    fn lock(&self) -> MutexGuard<'_, RateLimitState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Whether a call may be made now
    #[must_use]
    pub fn allow(&self) -> bool {
        self.allow_at(Utc::now())
    }

    /// Whether a call may be made at `now`
    ///
    /// An exhausted budget puts the limiter into backoff until the end of the window.
    #[must_use]
    pub fn allow_at(&self, now: DateTime<Utc>) -> bool {
        let mut state = self.lock();
        self.check(&mut state, now).is_ok()
    }

    fn check(&self, state: &mut RateLimitState, now: DateTime<Utc>) -> Result<(), Option<u64>> {
        if let Some(until) = state.retry_after {
            if now < until {
                return Err(Some(seconds_until(now, until)));
            }
        }

        state.roll(now);

        if state.calls_in_window >= self.hourly_limit {
            let until = state.window_start + Duration::seconds(WINDOW_SECS);
            state.retry_after = Some(until);
            return Err(Some(seconds_until(now, until)));
        }
        if state.calls_in_window + state.in_flight >= self.hourly_limit {
            return Err(None);
        }
        Ok(())
    }

    /// Count a completed call and apply any backoff it signalled
    pub fn record_call(&self, status: u16, retry_after: Option<&str>) {
        self.record_call_at(Utc::now(), status, retry_after);
    }

    /// Count a call that completed at `now`
    pub fn record_call_at(&self, now: DateTime<Utc>, status: u16, retry_after: Option<&str>) {
        let mut state = self.lock();
        Self::record(&mut state, now, status, retry_after);
    }

    fn record(state: &mut RateLimitState, now: DateTime<Utc>, status: u16, retry_after: Option<&str>) {
        state.roll(now);
        state.calls_in_window = state.calls_in_window.saturating_add(1);

        if status == TOO_MANY_REQUESTS {
            let backoff_secs = parse_retry_after(retry_after);
            state.retry_after = Some(backoff_deadline(now, backoff_secs));
            warn!(
                retry_after_secs = backoff_secs,
                calls_in_window = state.calls_in_window,
                "Provider rate limit hit, backing off"
            );
        }
    }

    /// Reserve a slot for one outbound call
    ///
    /// # Errors
    ///
    /// Returns `RateLimited` when the budget is exhausted or a backoff is in effect
    pub fn try_acquire(self: &Arc<Self>) -> VitalsResult<CallPermit> {
        self.try_acquire_at(Utc::now())
    }

    /// Reserve a slot at `now`
    ///
    /// # Errors
    ///
    /// Returns `RateLimited` when the budget is exhausted or a backoff is in effect
    pub fn try_acquire_at(self: &Arc<Self>, now: DateTime<Utc>) -> VitalsResult<CallPermit> {
        let mut state = self.lock();
        self.check(&mut state, now)
            .map_err(|retry_after_secs| VitalsError::RateLimited { retry_after_secs })?;
        state.in_flight += 1;
        drop(state);

        Ok(CallPermit {
            limiter: Arc::clone(self),
            completed: false,
        })
    }

    /// Seconds until calls are accepted again, if a backoff is in effect
    #[must_use]
    pub fn retry_after_secs(&self) -> Option<u64> {
        let now = Utc::now();
        self.lock()
            .retry_after
            .filter(|until| now < *until)
            .map(|until| seconds_until(now, until))
    }

    /// Current counters
    #[must_use]
    pub fn snapshot(&self) -> RateLimitSnapshot {
        let state = self.lock();
        RateLimitSnapshot {
            hourly_limit: self.hourly_limit,
            calls_in_window: state.calls_in_window,
            in_flight: state.in_flight,
            window_start: state.window_start,
            retry_after: state.retry_after,
        }
    }
}

/// Reserved slot for one outbound call
///
/// Call [`complete`](Self::complete) once a response arrives. Dropping the
/// permit without completing it releases the slot without counting a call.
#[derive(Debug)]
#[must_use = "dropping a permit releases the reserved slot"]
pub struct CallPermit {
    limiter: Arc<RateLimiter>,
    completed: bool,
}

impl CallPermit {
    /// Record the call outcome
    pub fn complete(mut self, status: u16, retry_after: Option<&str>) {
        self.completed = true;
        let mut state = self.limiter.lock();
        state.in_flight = state.in_flight.saturating_sub(1);
        RateLimiter::record(&mut state, Utc::now(), status, retry_after);
    }
}

impl Drop for CallPermit {
    fn drop(&mut self) {
        if !self.completed {
            let mut state = self.limiter.lock();
            state.in_flight = state.in_flight.saturating_sub(1);
            debug!("Released uncompleted rate limit reservation");
        }
    }
}

/// Parse a `Retry-After` header as integer seconds, defaulting to one hour
///
/// Values above one day are capped.
#[must_use]
pub fn parse_retry_after(value: Option<&str>) -> u64 {
    value
        .and_then(|raw| raw.trim().parse::<u64>().ok())
        .map_or(FALLBACK_RETRY_AFTER_SECS, |secs| secs.min(MAX_RETRY_AFTER_SECS))
}

/// `now + backoff_secs`, or the fallback backoff when that is not representable
fn backoff_deadline(now: DateTime<Utc>, backoff_secs: u64) -> DateTime<Utc> {
    [backoff_secs, FALLBACK_RETRY_AFTER_SECS]
        .into_iter()
        .find_map(|secs| {
            let delta = Duration::try_seconds(i64::try_from(secs).ok()?)?;
            now.checked_add_signed(delta)
        })
        .unwrap_or(now)
}

/// Whole seconds until `until`, rounded up so a pending backoff never reports zero
fn seconds_until(now: DateTime<Utc>, until: DateTime<Utc>) -> u64 {
    let millis = (until - now).num_milliseconds();
    u64::try_from(millis.saturating_add(999) / 1_000).unwrap_or(0)
}
