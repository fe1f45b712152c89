//! crates/logging/src/squelch.rs
//! Rate limiting of repeated identical messages.
//!
//! The controller remembers the fingerprint of the last message. The first
//! `threshold` copies pass; after that each copy is suppressed and pushes the
//! next admission time further out with capped exponential backoff. The first
//! copy admitted after the window elapses (or any different message) carries
//! the number of suppressed copies so the caller can emit a marker line.

use std::sync::{Mutex, PoisonError};
use std::time::{Duration, Instant};

use crate::trace_squelch;

/// Source of monotonic time.
pub trait Clock: Send + Sync {
    /// Current instant.
    fn now(&self) -> Instant;
}

/// [`Clock`] backed by [`Instant::now`].
#[derive(Copy, Clone, Debug, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }
}

/// [`Clock`] advanced by hand, for deterministic tests.
#[derive(Debug)]
pub struct ManualClock {
    origin: Instant,
    offset: Mutex<Duration>,
}

impl ManualClock {
    /// Creates a clock frozen at the current instant.
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
            offset: Mutex::new(Duration::ZERO),
        }
    }

    /// Moves the clock forward.
    pub fn advance(&self, by: Duration) {
        let mut offset = self.offset.lock().unwrap_or_else(PoisonError::into_inner);
        *offset += by;
    }
}

impl Default for ManualClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Instant {
        self.origin + *self.offset.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl<C: Clock + ?Sized> Clock for std::sync::Arc<C> {
    fn now(&self) -> Instant {
        (**self).now()
    }
}

/// Tunables for the squelch controller.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct SquelchPolicy {
    /// Identical messages admitted before suppression starts.
    pub threshold: usize,
    /// Multiplier applied to the window per denial.
    pub growth_factor: u32,
    /// Window length at exponent zero.
    pub base_interval: Duration,
    /// Upper bound on any window.
    pub max_interval: Duration,
    /// Upper bound on the exponent.
    pub max_exponent: u32,
}

impl SquelchPolicy {
    /// Default repeat threshold.
    pub const DEFAULT_THRESHOLD: usize = 5;
    /// Default growth factor.
    pub const DEFAULT_GROWTH_FACTOR: u32 = 2;

    /// Window length for `exponent`: `min(base * factor^exponent, max)`.
    pub fn interval(&self, exponent: u32) -> Duration {
        let factor = self
            .growth_factor
            .checked_pow(exponent.min(self.max_exponent))
            .unwrap_or(u32::MAX);
        self.base_interval
            .checked_mul(factor)
            .unwrap_or(self.max_interval)
            .min(self.max_interval)
    }
}

impl Default for SquelchPolicy {
    fn default() -> Self {
        Self {
            threshold: Self::DEFAULT_THRESHOLD,
            growth_factor: Self::DEFAULT_GROWTH_FACTOR,
            base_interval: Duration::from_secs(1),
            max_interval: Duration::from_secs(60),
            max_exponent: 6,
        }
    }
}

/// Outcome of [`SquelchController::admit`].
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Admission {
    /// Deliver the message. `squelched` is set once, when copies were dropped.
    Admit {
        /// Number of copies suppressed since the last admission.
        squelched: Option<usize>,
    },
    /// Drop the message.
    Suppressed,
}

impl Admission {
    /// Returns `true` for [`Admission::Admit`].
    pub const fn is_admitted(&self) -> bool {
        matches!(self, Self::Admit { .. })
    }
}

/// Text of the marker line emitted when suppression ends.
pub fn squelch_marker(count: usize) -> String {
    format!("previous message repeated {count} times")
}

/// 64-bit FNV-1a hash of the message text.
pub fn fingerprint(message: &str) -> u64 {
    const OFFSET: u64 = 0xcbf2_9ce4_8422_2325;
    const PRIME: u64 = 0x0000_0100_0000_01b3;
    message
        .bytes()
        .fold(OFFSET, |hash, byte| (hash ^ u64::from(byte)).wrapping_mul(PRIME))
}

/// State for one origin.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SquelchState {
    /// Fingerprint of the last message seen.
    pub fingerprint: Option<u64>,
    /// Consecutive admitted copies.
    pub repeats: usize,
    /// Copies suppressed in the current window.
    pub suppressed: usize,
    /// Earliest admission while suppressing.
    pub next_allowed: Option<Instant>,
    /// Current backoff exponent.
    pub exponent: u32,
}

impl SquelchState {
    fn reset(&mut self, fingerprint: u64) -> Option<usize> {
        let pending = (self.suppressed > 0).then_some(self.suppressed);
        *self = Self {
            fingerprint: Some(fingerprint),
            repeats: 1,
            ..Self::default()
        };
        pending
    }
}

/// Spam suppression for repeated identical messages.
#[derive(Debug)]
pub struct SquelchController<C: Clock = SystemClock> {
    policy: SquelchPolicy,
    clock: C,
    state: Mutex<SquelchState>,
}

impl SquelchController<SystemClock> {
    /// Creates a controller on the system clock.
    pub fn new(policy: SquelchPolicy) -> Self {
        Self::with_clock(policy, SystemClock)
    }
}

impl<C: Clock> SquelchController<C> {
    /// Creates a controller on a custom clock.
    pub fn with_clock(policy: SquelchPolicy, clock: C) -> Self {
        Self {
            policy,
            clock,
            state: Mutex::new(SquelchState::default()),
        }
    }

    /// Active policy.
    pub const fn policy(&self) -> &SquelchPolicy {
        &self.policy
    }

    /// Copy of the current state.
    pub fn state(&self) -> SquelchState {
        self.state
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Decides whether a message with `fingerprint` passes.
    pub fn admit(&self, fingerprint: u64) -> Admission {
        let now = self.clock.now();
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);

        if state.fingerprint != Some(fingerprint) {
            let squelched = state.reset(fingerprint);
            if let Some(count) = squelched {
                trace_squelch!(count, "new message ends suppression");
            }
            return Admission::Admit { squelched };
        }

        if let Some(next) = state.next_allowed {
            if now >= next {
                let squelched = state.reset(fingerprint);
                trace_squelch!(count = squelched.unwrap_or(0), "suppression window elapsed");
                return Admission::Admit { squelched };
            }
            state.suppressed += 1;
            state.exponent = (state.exponent + 1).min(self.policy.max_exponent);
            state.next_allowed = Some(now + self.policy.interval(state.exponent));
            return Admission::Suppressed;
        }

        if state.repeats < self.policy.threshold {
            state.repeats += 1;
            return Admission::Admit { squelched: None };
        }

        state.suppressed = 1;
        state.exponent = 0;
        state.next_allowed = Some(now + self.policy.interval(0));
        trace_squelch!(
            threshold = self.policy.threshold,
            "repeat threshold reached; suppressing"
        );
        Admission::Suppressed
    }

    /// Forgets all state.
    pub fn reset(&self) {
        *self.state.lock().unwrap_or_else(PoisonError::into_inner) = SquelchState::default();
    }
}
