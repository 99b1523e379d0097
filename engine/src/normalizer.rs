//! Clock Normalizer
//!
//! Exchanges stamp trades with their own clock, and those stamps reach us with
//! variable network and processing jitter. Trusting them directly produces a
//! bursty, non-monotonic timeline. This filter maps server time onto the local
//! clock instead:
//!
//! - short-term ordering stays server-driven (`server_time_ms` passes through)
//! - the offset to the local clock is re-anchored only on server jumps of at
//!   least one second, and only in whole-second steps
//!
//! ```text
//! output = server_time_ms + now_ms - reference.local_ms
//! ```
//!
//! ## Rejections
//! - **Stale**: the server stamp predates the first call. This drops backlog
//!   an exchange replays right after subscribing. Checked first, and does not
//!   consume warm-up.
//! - **WarmUp**: the first `skip` non-stale calls are discarded so the first
//!   reference pair is taken from a settled stream.
//!
//! ## Determinism
//! `now_ms` is an argument. The caller samples its clock once per tick, so the
//! filter is a pure state machine.

/// Warm-up calls discarded by a fresh normalizer unless configured otherwise.
pub const DEFAULT_WARMUP_SKIP: u32 = 2;

/// Server deltas below this are jitter; at or above it, clock movement.
pub const DRIFT_STEP_MS: i64 = 1_000;

/// Anchor used to re-base server timestamps onto the local clock.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ReferencePair {
    pub server_ms: i64,
    pub local_ms: i64,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Rejection {
    Stale,
    WarmUp,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Normalized {
    Accepted(i64),
    Rejected(Rejection),
}

impl Normalized {
    pub fn accepted(self) -> Option<i64> {
        match self {
            Normalized::Accepted(ts) => Some(ts),
            Normalized::Rejected(_) => None,
        }
    }
}

#[derive(Clone, Debug)]
pub struct ClockNormalizer {
    created_at_ms: Option<i64>,
    remaining_skip: u32,
    reference: Option<ReferencePair>,
}

impl Default for ClockNormalizer {
    fn default() -> Self {
        Self::new(DEFAULT_WARMUP_SKIP)
    }
}

impl ClockNormalizer {
    pub fn new(skip: u32) -> Self {
        Self {
            created_at_ms: None,
            remaining_skip: skip,
            reference: None,
        }
    }

    pub fn created_at_ms(&self) -> Option<i64> {
        self.created_at_ms
    }

    pub fn reference(&self) -> Option<ReferencePair> {
        self.reference
    }

    pub fn remaining_skip(&self) -> u32 {
        self.remaining_skip
    }

    pub fn normalize(&mut self, server_time_ms: i64, now_ms: i64) -> Normalized {
        let created_at = *self.created_at_ms.get_or_insert(now_ms);

        if server_time_ms < created_at {
            return Normalized::Rejected(Rejection::Stale);
        }

        if self.remaining_skip > 0 {
            self.remaining_skip -= 1;
            return Normalized::Rejected(Rejection::WarmUp);
        }

        let Some(mut reference) = self.reference else {
            self.reference = Some(ReferencePair {
                server_ms: server_time_ms,
                local_ms: now_ms,
            });
            return Normalized::Accepted(server_time_ms);
        };

        // Negative deltas are always jitter: the reference never rewinds.
        // Saturating math keeps absurd server stamps from overflowing.
        let delta = server_time_ms.saturating_sub(reference.server_ms);
        if delta >= DRIFT_STEP_MS {
            reference.local_ms = reference
                .local_ms
                .saturating_add((delta / DRIFT_STEP_MS) * DRIFT_STEP_MS);
            reference.server_ms = server_time_ms;
            self.reference = Some(reference);
        }

        let offset = now_ms.saturating_sub(reference.local_ms);
        Normalized::Accepted(server_time_ms.saturating_add(offset))
    }
}
