// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Single-slot, cancellable delay timer.
//!
//! Each entity listener owns one [`DelayTimer`]. Arming it while a previous
//! delay is still pending replaces that delay (debounce), so at most one
//! invocation is ever outstanding.
//!
//! A timer task only fires if, after its sleep, it still owns the slot. The
//! check and the release of the slot happen under the same lock as `arm` and
//! `cancel`, so a cancellation racing with an expiring timer results in
//! exactly one of the two taking effect.

use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tokio::task::AbortHandle;

#[derive(Debug, Default)]
struct Slot {
    /// Incremented on every `arm`.
    generation: u64,
    /// The currently pending timer task, if any.
    pending: Option<AbortHandle>,
}

/// A cancellable timer holding at most one pending invocation.
#[derive(Debug, Default)]
pub struct DelayTimer {
    slot: Arc<Mutex<Slot>>,
}

impl DelayTimer {
    /// Creates an idle timer.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Schedules `fire` to run after `delay`, replacing any pending invocation.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn arm<F>(&self, delay: Duration, fire: F)
    where
        F: FnOnce() + Send + 'static,
    {
        let mut slot = self.slot.lock();
        if let Some(previous) = slot.pending.take() {
            previous.abort();
        }
        slot.generation = slot.generation.wrapping_add(1);
        let generation = slot.generation;

        let shared = Arc::clone(&self.slot);
        let task = tokio::spawn(async move {
            tokio::time::sleep(delay).await;

            let still_current = {
                let mut slot = shared.lock();
                if slot.generation == generation && slot.pending.is_some() {
                    slot.pending = None;
                    true
                } else {
                    false
                }
            };

            if still_current {
                fire();
            }
        });

        slot.pending = Some(task.abort_handle());
    }

    /// Cancels the pending invocation.
    ///
    /// Returns `true` if an invocation was pending. Cancelling a timer that
    /// has already fired is a no-op.
    pub fn cancel(&self) -> bool {
        let mut slot = self.slot.lock();
        match slot.pending.take() {
            Some(handle) => {
                handle.abort();
                true
            }
            None => false,
        }
    }

    /// Returns `true` if an invocation is pending.
    #[must_use]
    pub fn is_pending(&self) -> bool {
        self.slot.lock().pending.is_some()
    }
}

impl Drop for DelayTimer {
    fn drop(&mut self) {
        if let Some(handle) = self.slot.lock().pending.take() {
            handle.abort();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    fn counter() -> (Arc<AtomicU32>, impl Fn() -> Box<dyn FnOnce() + Send>) {
        let count = Arc::new(AtomicU32::new(0));
        let c = Arc::clone(&count);
        let make = move || {
            let c = Arc::clone(&c);
            Box::new(move || {
                c.fetch_add(1, Ordering::SeqCst);
            }) as Box<dyn FnOnce() + Send>
        };
        (count, make)
    }

    #[tokio::test(start_paused = true)]
    async fn fires_after_delay() {
        let timer = DelayTimer::new();
        let (count, make) = counter();

        timer.arm(Duration::from_secs(5), make());
        assert!(timer.is_pending());

        tokio::time::sleep(Duration::from_secs(4)).await;
        assert_eq!(count.load(Ordering::SeqCst), 0);

        tokio::time::sleep(Duration::from_secs(2)).await;
        assert_eq!(count.load(Ordering::SeqCst), 1);
        assert!(!timer.is_pending());
    }

    #[tokio::test(start_paused = true)]
    async fn rearm_debounces() {
        let timer = DelayTimer::new();
        let (count, make) = counter();

        timer.arm(Duration::from_secs(5), make());
        tokio::time::sleep(Duration::from_secs(3)).await;
        timer.arm(Duration::from_secs(5), make());

        // First deadline passes without firing
        tokio::time::sleep(Duration::from_secs(3)).await;
        assert_eq!(count.load(Ordering::SeqCst), 0);

        // Second deadline (timed from the re-arm)
        tokio::time::sleep(Duration::from_secs(3)).await;
        assert_eq!(count.load(Ordering::SeqCst), 1);

        tokio::time::sleep(Duration::from_secs(30)).await;
        assert_eq!(count.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn cancel_prevents_fire() {
        let timer = DelayTimer::new();
        let (count, make) = counter();

        timer.arm(Duration::from_secs(5), make());
        assert!(timer.cancel());
        assert!(!timer.is_pending());

        tokio::time::sleep(Duration::from_secs(10)).await;
        assert_eq!(count.load(Ordering::SeqCst), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn cancel_after_fire_is_noop() {
        let timer = DelayTimer::new();
        let (count, make) = counter();

        timer.arm(Duration::from_secs(1), make());
        tokio::time::sleep(Duration::from_secs(2)).await;

        assert!(!timer.cancel());
        assert_eq!(count.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn rearm_after_cancel() {
        let timer = DelayTimer::new();
        let (count, make) = counter();

        timer.arm(Duration::from_secs(1), make());
        timer.cancel();
        timer.arm(Duration::from_secs(1), make());

        tokio::time::sleep(Duration::from_secs(2)).await;
        assert_eq!(count.load(Ordering::SeqCst), 1);
    }
}
