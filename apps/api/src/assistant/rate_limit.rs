//! Submission gate driven by AI rate limiting.
//!
//! A 429 carries a retry hint in seconds. Submission stays disabled while a
//! one-second countdown runs down from that value and re-enables at zero.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{info, warn};

const TICK: Duration = Duration::from_secs(1);

/// Countdown state without any timer attached.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RetryCountdown {
    remaining: u32,
}

impl RetryCountdown {
    pub fn start(seconds: u32) -> Self {
        Self { remaining: seconds }
    }

    /// Advances one second and returns what is left.
    pub fn tick(&mut self) -> u32 {
        self.remaining = self.remaining.saturating_sub(1);
        self.remaining
    }

    pub fn remaining(&self) -> u32 {
        self.remaining
    }

    pub fn is_submit_enabled(&self) -> bool {
        self.remaining == 0
    }
}

/// Shared countdown observed by the assistant handlers. One timer task runs per
/// rate-limit event; a newer event replaces the running one.
#[derive(Clone)]
pub struct SubmitGate {
    state: Arc<watch::Sender<RetryCountdown>>,
    timer: Arc<Mutex<Option<JoinHandle<()>>>>,
    generation: Arc<AtomicU64>,
}

impl Default for SubmitGate {
    fn default() -> Self {
        Self::new()
    }
}

impl SubmitGate {
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(RetryCountdown::default());
        Self {
            state: Arc::new(tx),
            timer: Arc::new(Mutex::new(None)),
            generation: Arc::new(AtomicU64::new(0)),
        }
    }

    pub fn remaining(&self) -> u32 {
        self.state.borrow().remaining()
    }

    pub fn is_submit_enabled(&self) -> bool {
        self.state.borrow().is_submit_enabled()
    }

    /// Disables submission for `retry_after` seconds. Must be called inside a
    /// tokio runtime.
    pub fn trip(&self, retry_after: u32) {
        warn!(retry_after, "AI rate limit hit, submission disabled");

        let mut slot = match self.timer.lock() {
            Ok(slot) => slot,
            Err(poisoned) => poisoned.into_inner(),
        };
        if let Some(previous) = slot.take() {
            previous.abort();
        }
        // A timer only ticks while its generation is current.
        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        self.state.send_replace(RetryCountdown::start(retry_after));

        let state = Arc::clone(&self.state);
        let current = Arc::clone(&self.generation);
        *slot = Some(tokio::spawn(async move {
            loop {
                let done = state.borrow().is_submit_enabled();
                if done {
                    info!("Rate limit countdown finished, submission enabled");
                    break;
                }
                tokio::time::sleep(TICK).await;
                let mut superseded = false;
                state.send_modify(|countdown| {
                    if current.load(Ordering::SeqCst) == generation {
                        countdown.tick();
                    } else {
                        superseded = true;
                    }
                });
                if superseded {
                    break;
                }
            }
        }));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_countdown_reenables_after_fifteen_ticks() {
        let mut countdown = RetryCountdown::start(15);
        for expected in (1..15).rev() {
            assert!(!countdown.is_submit_enabled());
            assert_eq!(countdown.tick(), expected);
        }
        assert!(!countdown.is_submit_enabled());
        assert_eq!(countdown.tick(), 0);
        assert!(countdown.is_submit_enabled());
        assert_eq!(countdown.tick(), 0);
    }

    #[test]
    fn test_zero_countdown_is_enabled() {
        assert!(RetryCountdown::start(0).is_submit_enabled());
        assert!(RetryCountdown::default().is_submit_enabled());
    }

    #[tokio::test(start_paused = true)]
    async fn test_gate_counts_down_each_second() {
        let gate = SubmitGate::new();
        assert!(gate.is_submit_enabled());

        gate.trip(15);
        assert_eq!(gate.remaining(), 15);
        assert!(!gate.is_submit_enabled());

        tokio::time::sleep(Duration::from_millis(14_500)).await;
        assert_eq!(gate.remaining(), 1);
        assert!(!gate.is_submit_enabled());

        tokio::time::sleep(Duration::from_secs(1)).await;
        assert_eq!(gate.remaining(), 0);
        assert!(gate.is_submit_enabled());
    }

    #[tokio::test(start_paused = true)]
    async fn test_new_trip_replaces_running_countdown() {
        let gate = SubmitGate::new();
        gate.trip(5);
        tokio::time::sleep(Duration::from_millis(2_500)).await;
        assert_eq!(gate.remaining(), 3);

        gate.trip(10);
        tokio::time::sleep(Duration::from_millis(3_200)).await;
        assert_eq!(gate.remaining(), 7);
    }

    #[tokio::test(start_paused = true)]
    async fn test_superseded_timer_never_ticks_new_countdown() {
        let gate = SubmitGate::new();
        gate.trip(5);
        tokio::time::sleep(Duration::from_millis(2_900)).await;
        assert_eq!(gate.remaining(), 3);

        gate.trip(10);
        assert_eq!(gate.remaining(), 10);
        // The first timer would have fired at 3.0s.
        tokio::time::sleep(Duration::from_millis(300)).await;
        assert_eq!(gate.remaining(), 10);
        tokio::time::sleep(Duration::from_millis(1_000)).await;
        assert_eq!(gate.remaining(), 9);
    }
}
