//! Clock and entropy sources consulted when a message is built.
//!
//! Dates, Message-IDs, boundaries and vendor identifiers are the only
//! nondeterministic inputs to message assembly. They are drawn from a
//! [`Sources`] value passed explicitly into construction so tests can pin
//! them; the `build()` shortcuts use [`SystemClock`] and `rand::thread_rng()`.

use chrono::{DateTime, FixedOffset, Local};
use rand::distributions::Alphanumeric;
use rand::{Rng, RngCore};
use uuid::Uuid;

/// Provides the current time.
pub trait Clock {
    /// Returns the current time with its UTC offset.
    fn now(&self) -> DateTime<FixedOffset>;
}

/// Wall clock in the local time zone.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<FixedOffset> {
        Local::now().fixed_offset()
    }
}

/// Clock frozen at one instant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FixedClock(pub DateTime<FixedOffset>);

impl Clock for FixedClock {
    fn now(&self) -> DateTime<FixedOffset> {
        self.0
    }
}

/// The clock and random source used for one construction.
pub struct Sources<'a> {
    /// Time source for the `Date` header.
    pub clock: &'a dyn Clock,
    /// Entropy for identifiers and boundaries.
    pub rng: &'a mut dyn RngCore,
}

impl<'a> Sources<'a> {
    /// Bundles a clock and random source.
    pub fn new(clock: &'a dyn Clock, rng: &'a mut dyn RngCore) -> Self {
        Self { clock, rng }
    }

    /// Returns the current time from the clock.
    #[must_use]
    pub fn now(&self) -> DateTime<FixedOffset> {
        self.clock.now()
    }

    /// Generates a random version 4 UUID.
    pub fn uuid(&mut self) -> Uuid {
        random_uuid(self.rng)
    }

    /// Generates a random alphanumeric token.
    pub fn token(&mut self, len: usize) -> String {
        random_token(self.rng, len)
    }
}

impl std::fmt::Debug for Sources<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Sources")
            .field("now", &self.clock.now())
            .finish_non_exhaustive()
    }
}

/// Generates a random version 4 UUID from `rng`.
pub fn random_uuid(rng: &mut dyn RngCore) -> Uuid {
    let mut bytes = [0u8; 16];
    rng.fill_bytes(&mut bytes);
    uuid::Builder::from_random_bytes(bytes).into_uuid()
}

/// Generates a random alphanumeric token of `len` characters from `rng`.
pub fn random_token(rng: &mut dyn RngCore, len: usize) -> String {
    rng.sample_iter(Alphanumeric)
        .take(len)
        .map(char::from)
        .collect()
}
