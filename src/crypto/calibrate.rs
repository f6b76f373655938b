//! Self-tuning scrypt cost.
//!
//! A [`Calibrator`] picks the highest cost exponent whose derivation fits a
//! wall-clock budget. It remembers how long each exponent took so that later
//! calls can skip straight past levels already known to be fast.

use std::collections::BTreeMap;
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

use log::{debug, warn};

use super::kdf::{KdfParams, KeyParams, derive_key};
use super::{MAX_LOG_N, MIN_LOG_N, generate_salt};
use crate::error::Result;

/// Last observed derivation time per cost exponent.
///
/// Share one instance (behind an `Arc`) between sealers to reuse
/// observations across calls. Entries are overwritten, never removed.
#[derive(Debug, Default)]
pub struct Calibrator {
    observed: Mutex<BTreeMap<u8, Duration>>,
}

impl Calibrator {
    pub fn new() -> Self {
        Self::default()
    }

    // The table only holds timing hints, so a poisoned lock is still usable.
    fn table(&self) -> MutexGuard<'_, BTreeMap<u8, Duration>> {
        self.observed.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Last recorded derivation time at `log_n`, if any.
    pub fn observed(&self, log_n: u8) -> Option<Duration> {
        self.table().get(&log_n).copied()
    }

    pub fn len(&self) -> usize {
        self.table().len()
    }

    pub fn is_empty(&self) -> bool {
        self.table().is_empty()
    }

    /// Derive a key with the strongest cost that fits in `timeout`.
    ///
    /// A fresh salt of `salt_len` bytes is generated. The lock is held for
    /// the whole call, so concurrent calibrations run one after another.
    /// A zero timeout derives once at [`MIN_LOG_N`] without touching the
    /// table. If the first probe alone overruns the budget its result is
    /// still returned. The cost is capped at [`MAX_LOG_N`]; a budget that
    /// would allow more still yields that exponent.
    pub fn calibrate(
        &self,
        passphrase: &[u8],
        salt_len: usize,
        key_len: usize,
        timeout: Duration,
    ) -> Result<KeyParams> {
        let salt = generate_salt(salt_len)?;
        let base = KdfParams::default();

        if timeout.is_zero() {
            let key = derive_key(passphrase, &salt, base, key_len)?;
            return Ok(KeyParams::with_key(salt, base, key));
        }

        let mut table = self.table();
        let mut log_n = starting_exponent(&table, timeout);
        let first = log_n;

        let deadline = Instant::now().checked_add(timeout);
        let mut started = Instant::now();
        loop {
            let kdf = base.with_log_n(log_n);
            let key = derive_key(passphrase, &salt, kdf, key_len)?;
            let finished = Instant::now();
            let elapsed = finished.duration_since(started);
            table.insert(log_n, elapsed);
            debug!("scrypt probe log_n={log_n} took {elapsed:?}");

            if log_n == first && elapsed > timeout {
                warn!("scrypt at log_n={log_n} took {elapsed:?}, over the {timeout:?} budget");
            }

            let next_fits = match deadline {
                Some(deadline) => elapsed
                    .checked_mul(2)
                    .and_then(|projected| finished.checked_add(projected))
                    .is_some_and(|projected| projected <= deadline),
                None => true,
            };
            if !next_fits || log_n >= MAX_LOG_N {
                debug!("calibrated scrypt cost log_n={log_n}");
                return Ok(KeyParams::with_key(salt, kdf, key));
            }
            started = finished;
            log_n += 1;
        }
    }

    #[cfg(test)]
    fn record(&self, log_n: u8, elapsed: Duration) {
        self.table().insert(log_n, elapsed);
    }
}

/// Walk the recorded exponents upward from the floor: advance while they
/// were faster than `timeout`, back off one level at the first slower one.
fn starting_exponent(table: &BTreeMap<u8, Duration>, timeout: Duration) -> u8 {
    let mut log_n = MIN_LOG_N;
    for exp in MIN_LOG_N..=MAX_LOG_N {
        let Some(&elapsed) = table.get(&exp) else {
            break;
        };
        if elapsed < timeout {
            log_n = exp;
            continue;
        }
        if elapsed > timeout {
            log_n = log_n.saturating_sub(1).max(MIN_LOG_N);
        }
        break;
    }
    log_n
}
