// Copyright (C) Microsoft Corporation. All rights reserved.

#![deny(clippy::expect_used)]
#![deny(clippy::manual_assert)]
#![deny(clippy::panic)]
#![deny(clippy::unwrap_used)]

//! The engine's closed-set configuration (§6). Every field here is validated once, at
//! construction, rather than re-checked at each call site.

use serde::{Deserialize, Serialize};

use crate::discrete_log::{DEFAULT_BATCH_SIZE, DEFAULT_CEILING, DEFAULT_SOFT_CAP};
use crate::errors::{EgError, EgResult};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngineConfig {
    pub n_trustees: u32,
    pub quorum: u32,
    pub dlog_ceiling: u64,
    pub dlog_cache_size: usize,
    pub dlog_batch_size: u64,
    /// When `false`, the caller asserts ballots were already verified upstream within the
    /// same trust boundary; downstream components must not skip verification otherwise.
    pub verify_on_submit: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        EngineConfig {
            n_trustees: 1,
            quorum: 1,
            dlog_ceiling: DEFAULT_CEILING,
            dlog_cache_size: DEFAULT_SOFT_CAP,
            dlog_batch_size: DEFAULT_BATCH_SIZE,
            verify_on_submit: true,
        }
    }
}

impl EngineConfig {
    pub fn validate(&self) -> EgResult<()> {
        if self.n_trustees < 1 {
            return Err(EgError::ConfigInvalidNTrustees {
                n_trustees: self.n_trustees,
            });
        }
        if self.quorum < 1 || self.quorum > self.n_trustees {
            return Err(EgError::ConfigInvalidQuorum {
                quorum: self.quorum,
                n_trustees: self.n_trustees,
            });
        }
        if self.dlog_ceiling == 0 {
            return Err(EgError::ConfigInvalidManifest(
                "dlog_ceiling must be positive".into(),
            ));
        }
        if self.dlog_cache_size == 0 {
            return Err(EgError::ConfigInvalidManifest(
                "dlog_cache_size must be positive".into(),
            ));
        }
        if self.dlog_batch_size == 0 {
            return Err(EgError::ConfigInvalidManifest(
                "dlog_batch_size must be positive".into(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        assert!(EngineConfig::default().validate().is_ok());
    }

    #[test]
    fn quorum_above_n_trustees_rejected() {
        let config = EngineConfig {
            n_trustees: 3,
            quorum: 4,
            ..EngineConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn zero_dlog_ceiling_rejected() {
        let config = EngineConfig {
            dlog_ceiling: 0,
            ..EngineConfig::default()
        };
        assert!(config.validate().is_err());
    }
}
