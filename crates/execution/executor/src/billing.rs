// Copyright 2019 Conflux Foundation. All rights reserved.
// Conflux is free software and distributed under GNU General Public License.
// See http://www.gnu.org/licenses/

//! Billing timer and per-transaction resource accounting.
//!
//! Billed time is wall time since the transaction started minus every
//! interval spent with the timer paused. The ceiling is checked at host-call
//! boundaries through [`ResourceGuard::checktime`].

use std::{
    collections::BTreeMap,
    sync::Arc,
    time::{Duration, Instant},
};
use wasm_vm_types::{self as vm, wasm_assert, wasm_throw, Name};

/// Monotonic time source. Offsets are measured from an arbitrary origin that
/// stays fixed for the lifetime of the clock.
pub trait Clock: Send + Sync {
    fn now(&self) -> Duration;
}

pub struct SystemClock {
    origin: Instant,
}

impl Default for SystemClock {
    fn default() -> Self {
        SystemClock {
            origin: Instant::now(),
        }
    }
}

impl Clock for SystemClock {
    fn now(&self) -> Duration { self.origin.elapsed() }
}

/// A clock that only moves when told to.
#[cfg(any(test, feature = "testonly_code"))]
#[derive(Default)]
pub struct ManualClock {
    now: parking_lot::Mutex<Duration>,
}

#[cfg(any(test, feature = "testonly_code"))]
impl ManualClock {
    pub fn advance(&self, delta: Duration) { *self.now.lock() += delta; }
}

#[cfg(any(test, feature = "testonly_code"))]
impl Clock for ManualClock {
    fn now(&self) -> Duration { *self.now.lock() }
}

pub struct BillingTimer {
    clock: Arc<dyn Clock>,
    started_at: Duration,
    paused_at: Option<Duration>,
    paused_total: Duration,
    max_duration: Duration,
}

impl BillingTimer {
    pub fn start(clock: Arc<dyn Clock>, max_duration: Duration) -> Self {
        let started_at = clock.now();
        BillingTimer {
            clock,
            started_at,
            paused_at: None,
            paused_total: Duration::ZERO,
            max_duration,
        }
    }

    pub fn now(&self) -> Duration { self.clock.now() }

    pub fn is_paused(&self) -> bool { self.paused_at.is_some() }

    pub fn max_duration(&self) -> Duration { self.max_duration }

    pub fn pause(&mut self) -> vm::Result<()> {
        wasm_assert!(
            self.paused_at.is_none(),
            Transaction,
            "billing timer is already paused"
        );
        self.paused_at = Some(self.clock.now());
        Ok(())
    }

    pub fn resume(&mut self) -> vm::Result<()> {
        let paused_at = match self.paused_at.take() {
            Some(t) => t,
            None => wasm_throw!(
                Transaction,
                "billing timer resumed while it is running"
            ),
        };
        self.paused_total += self.clock.now().saturating_sub(paused_at);
        Ok(())
    }

    /// Closes a pause the receiver never resumed. The open interval is billed
    /// as running time. Returns whether a pause was open.
    pub(crate) fn release_pause(&mut self) -> bool {
        self.paused_at.take().is_some()
    }

    /// Time charged so far. The clock is frozen while paused.
    pub fn billed(&self) -> Duration {
        let now = self.paused_at.unwrap_or_else(|| self.clock.now());
        now.saturating_sub(self.started_at)
            .saturating_sub(self.paused_total)
    }

    pub fn checktime(&self) -> vm::Result<()> {
        let billed = self.billed();
        wasm_assert!(
            billed <= self.max_duration,
            Timeout,
            "deadline exceeded, billed {} us, max {} us",
            billed.as_micros(),
            self.max_duration.as_micros()
        );
        Ok(())
    }
}

/// Resources consumed by one transaction.
pub struct ResourceGuard {
    timer: BillingTimer,
    storage_usage: BTreeMap<Name, i64>,
}

impl ResourceGuard {
    pub fn new(clock: Arc<dyn Clock>, max_duration: Duration) -> Self {
        ResourceGuard {
            timer: BillingTimer::start(clock, max_duration),
            storage_usage: BTreeMap::new(),
        }
    }

    pub fn timer(&self) -> &BillingTimer { &self.timer }

    pub fn pause_billing_timer(&mut self) -> vm::Result<()> {
        self.timer.pause()
    }

    pub fn resume_billing_timer(&mut self) -> vm::Result<()> {
        self.timer.resume()
    }

    pub fn checktime(&self) -> vm::Result<()> { self.timer.checktime() }

    pub(crate) fn release_pause(&mut self) -> bool {
        self.timer.release_pause()
    }

    pub fn update_storage_usage(&mut self, account: Name, delta: i64) {
        *self.storage_usage.entry(account).or_insert(0) += delta;
    }

    pub fn storage_usage(&self, account: &Name) -> i64 {
        self.storage_usage.get(account).copied().unwrap_or(0)
    }

    pub fn storage_usages(&self) -> &BTreeMap<Name, i64> {
        &self.storage_usage
    }

    pub(crate) fn storage_snapshot(&self) -> BTreeMap<Name, i64> {
        self.storage_usage.clone()
    }

    pub(crate) fn restore_storage(&mut self, snapshot: BTreeMap<Name, i64>) {
        self.storage_usage = snapshot;
    }
}
