use serde::Serialize;
use std::sync::Mutex;
use std::time::{Duration, Instant};

/// Minimum time between two boosts, whatever their mode
pub const COOLDOWN: Duration = Duration::from_secs(5 * 60);

/// Readiness derived from the last boost and the current time
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CooldownState {
    Ready,
    Cooling { until: Instant },
}

/// A boost was refused because the previous one is too recent
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rejected {
    /// Whole seconds left, rounded up; always in `1..=300`
    pub remaining_secs: u64,
}

/// Query-only view of the cooldown
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct BoostStatus {
    pub can_boost: bool,
    pub remaining_seconds: u64,
}

/// Rate limiter for the memory boost.
///
/// One instance per hosting process. Readiness is recomputed from `now` on
/// every call; no timer runs in the background.
#[derive(Debug, Default)]
pub struct BoostCooldownGuard {
    last_boost: Mutex<Option<Instant>>,
}

impl BoostCooldownGuard {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self, now: Instant) -> CooldownState {
        state_at(*self.lock(), now)
    }

    /// Never mutates the guard
    pub fn status(&self, now: Instant) -> BoostStatus {
        match self.state(now) {
            CooldownState::Ready => BoostStatus {
                can_boost: true,
                remaining_seconds: 0,
            },
            CooldownState::Cooling { until } => BoostStatus {
                can_boost: false,
                remaining_seconds: ceil_secs(until - now),
            },
        }
    }

    /// Reserve the boost slot. The check and the reservation happen under
    /// one lock, so two racing callers cannot both get a permit.
    pub fn try_boost(&self, now: Instant) -> Result<BoostPermit<'_>, Rejected> {
        let mut last = self.lock();
        match state_at(*last, now) {
            CooldownState::Cooling { until } => Err(Rejected {
                remaining_secs: ceil_secs(until - now),
            }),
            CooldownState::Ready => {
                let previous = last.replace(now);
                Ok(BoostPermit {
                    guard: self,
                    reserved_at: now,
                    previous,
                })
            }
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Option<Instant>> {
        self.last_boost.lock().unwrap_or_else(|e| e.into_inner())
    }
}

fn state_at(last: Option<Instant>, now: Instant) -> CooldownState {
    match last {
        Some(at) => {
            let until = at + COOLDOWN;
            if now < until {
                CooldownState::Cooling { until }
            } else {
                CooldownState::Ready
            }
        }
        None => CooldownState::Ready,
    }
}

fn ceil_secs(d: Duration) -> u64 {
    d.as_secs() + u64::from(d.subsec_nanos() > 0)
}

/// Proof that a boost slot was reserved. Dropping it keeps the reservation;
/// [`BoostPermit::rollback`] gives the slot back after a failed boost.
#[derive(Debug)]
pub struct BoostPermit<'a> {
    guard: &'a BoostCooldownGuard,
    reserved_at: Instant,
    previous: Option<Instant>,
}

impl BoostPermit<'_> {
    pub fn reserved_at(&self) -> Instant {
        self.reserved_at
    }

    pub fn rollback(self) {
        let mut last = self.guard.lock();
        // only undo our own reservation
        if *last == Some(self.reserved_at) {
            *last = self.previous;
        }
    }
}
