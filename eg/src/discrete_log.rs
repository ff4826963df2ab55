// Copyright (C) Microsoft Corporation. All rights reserved.

#![deny(clippy::expect_used)]
#![deny(clippy::manual_assert)]
#![deny(clippy::panic)]
#![deny(clippy::unwrap_used)]

//! Discrete-log table (C4): inverts `h -> m` such that `g^m == h` for `m` in `[0, ceiling]`,
//! by extending an incremental cache `{identity -> 0}` one multiplication by `g` at a time.
//!
//! Unlike the baby-step-giant-step tables used elsewhere in this engine, this table never
//! needs random access into the full exponent space: ballot tallies only ever decrypt small
//! vote counts, so the cache only ever grows as far as the largest tally result seen so far,
//! and amortizes across every later lookup at or below that point.

use std::collections::HashMap;
use std::sync::{Mutex, RwLock};

use tracing::debug;

use util::algebra::{Group, GroupElement};

use crate::errors::{check_cancelled, CancellationCheck, EgError, EgResult};

/// Entries are extended in batches of this size so a soft cap can be enforced between
/// batches instead of only after a lookup fully resolves.
pub const DEFAULT_BATCH_SIZE: u64 = 10_000;

/// A sane default ceiling: enough for any realistic contest tally, cheap to extend to.
pub const DEFAULT_CEILING: u64 = 1_000_000;

/// The hard upper bound no caller-supplied ceiling may exceed.
pub const MAX_CEILING: u64 = 100_000_000;

/// A sane default soft cap on the number of entries retained in the cache.
pub const DEFAULT_SOFT_CAP: usize = 100_000;

pub struct DiscreteLogTable {
    group: Group,
    ceiling: u64,
    soft_cap: usize,
    batch_size: u64,
    cache: RwLock<HashMap<GroupElement, u64>>,
    extend_lock: Mutex<()>,
}

impl DiscreteLogTable {
    pub fn new(group: Group, ceiling: u64) -> EgResult<Self> {
        Self::with_policy(group, ceiling, DEFAULT_SOFT_CAP, DEFAULT_BATCH_SIZE)
    }

    pub fn with_policy(
        group: Group,
        ceiling: u64,
        soft_cap: usize,
        batch_size: u64,
    ) -> EgResult<Self> {
        if ceiling > MAX_CEILING {
            return Err(EgError::ResourceExponentTooLarge { ceiling });
        }
        let mut cache = HashMap::new();
        cache.insert(Group::one(), 0_u64);
        Ok(DiscreteLogTable {
            group,
            ceiling,
            soft_cap,
            batch_size: batch_size.max(1),
            cache: RwLock::new(cache),
            extend_lock: Mutex::new(()),
        })
    }

    /// Finds `m` such that `g^m == h`. Extends the cache incrementally if `h` isn't yet
    /// known, up to `self.ceiling`, checking `cancel` at each batch boundary.
    pub fn find(&self, h: &GroupElement, cancel: Option<CancellationCheck>) -> EgResult<u64> {
        {
            #[allow(clippy::unwrap_used)]
            let cache = self.cache.read().unwrap();
            if let Some(m) = cache.get(h) {
                return Ok(*m);
            }
        }

        #[allow(clippy::unwrap_used)]
        let _extend_guard = self.extend_lock.lock().unwrap();

        // Another thread may have extended far enough while we waited for the lock.
        {
            #[allow(clippy::unwrap_used)]
            let cache = self.cache.read().unwrap();
            if let Some(m) = cache.get(h) {
                return Ok(*m);
            }
        }

        loop {
            check_cancelled(cancel)?;

            let (highest_elem, highest_m) = {
                #[allow(clippy::unwrap_used)]
                let cache = self.cache.read().unwrap();
                cache
                    .iter()
                    .max_by_key(|(_, m)| **m)
                    .map(|(elem, m)| (elem.clone(), *m))
                    .unwrap_or_else(|| (Group::one(), 0))
            };

            if highest_m >= self.ceiling {
                return Err(EgError::ResourceExponentTooLarge {
                    ceiling: self.ceiling,
                });
            }

            let batch_end = (highest_m + self.batch_size).min(self.ceiling);
            let mut current = highest_elem;
            let mut m = highest_m;
            let mut found = None;

            #[allow(clippy::unwrap_used)]
            let mut cache = self.cache.write().unwrap();
            while m < batch_end {
                current = current.mul(&self.group.generator(), &self.group);
                m += 1;
                cache.insert(current.clone(), m);
                if &current == h {
                    found = Some(m);
                    break;
                }
            }

            if cache.len() > self.soft_cap {
                prune(&mut cache, self.soft_cap);
                debug!(entries = cache.len(), "pruned discrete log cache");
            }
            drop(cache);

            if let Some(m) = found {
                return Ok(m);
            }
            if m >= self.ceiling {
                return Err(EgError::ResourceExponentTooLarge {
                    ceiling: self.ceiling,
                });
            }
        }
    }

    pub fn len(&self) -> usize {
        #[allow(clippy::unwrap_used)]
        self.cache.read().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        false
    }
}

/// Retains the `soft_cap` highest-`m` entries plus the base case, discarding the rest.
fn prune(cache: &mut HashMap<GroupElement, u64>, soft_cap: usize) {
    let mut entries: Vec<(GroupElement, u64)> = cache.drain().collect();
    entries.sort_unstable_by(|a, b| b.1.cmp(&a.1));
    entries.truncate(soft_cap.saturating_sub(1));
    cache.extend(entries);
    cache.insert(Group::one(), 0);
}
