//! Time sources.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

/// Source of the current Unix time in seconds.
pub trait Clock: Send + Sync {
    fn now(&self) -> u64;
}

/// Wall clock.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> u64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs())
            .unwrap_or_default()
    }
}

/// Wall clock re-based onto a ledger timestamp read once at startup.
///
/// The relayer checks authorization windows against ledger time, which a
/// development node may have moved away from wall time.
#[derive(Debug, Clone, Copy)]
pub struct LedgerClock {
    ledger_at: u64,
    wall_at: u64,
}

impl LedgerClock {
    pub fn anchored(ledger_now: u64) -> Self {
        Self {
            ledger_at: ledger_now,
            wall_at: SystemClock.now(),
        }
    }
}

impl Clock for LedgerClock {
    fn now(&self) -> u64 {
        let elapsed = SystemClock.now().saturating_sub(self.wall_at);
        self.ledger_at.saturating_add(elapsed)
    }
}

/// Manually driven clock.
#[derive(Debug, Default)]
pub struct ManualClock {
    now: AtomicU64,
}

impl ManualClock {
    pub fn new(now: u64) -> Self {
        Self {
            now: AtomicU64::new(now),
        }
    }

    pub fn set(&self, now: u64) {
        self.now.store(now, Ordering::SeqCst);
    }

    pub fn advance(&self, seconds: u64) {
        self.now.fetch_add(seconds, Ordering::SeqCst);
    }
}

impl Clock for ManualClock {
    fn now(&self) -> u64 {
        self.now.load(Ordering::SeqCst)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ledger_clock_follows_ledger_ahead_of_wall() {
        let wall = SystemClock.now();
        let ahead = wall + 400 * 86_400;
        let clock = LedgerClock::anchored(ahead);
        let now = clock.now();
        assert!(now >= ahead);
        assert!(now - ahead < 60);
        assert!(now > SystemClock.now() + 399 * 86_400);
    }

    #[test]
    fn test_ledger_clock_behind_wall() {
        let clock = LedgerClock::anchored(1_000);
        assert!(clock.now() >= 1_000);
        assert!(clock.now() < 1_060);
    }

    #[test]
    fn test_manual_clock_set_and_advance() {
        let clock = ManualClock::new(10);
        clock.advance(5);
        assert_eq!(clock.now(), 15);
        clock.set(3);
        assert_eq!(clock.now(), 3);
    }
}
