// Copyright (C) Microsoft Corporation. All rights reserved.

#![deny(clippy::expect_used)]
#![deny(clippy::manual_assert)]
#![deny(clippy::panic)]
#![deny(clippy::unwrap_used)]

//! Manifest & context (C7): the parameter base hash `Q` and the extended base hash `Q̄` that
//! seeds every proof transcript in the rest of the engine (§4.3).

use serde::{Deserialize, Serialize};

use crate::el_gamal::ElGamalPublicKey;
use crate::errors::{EgError, EgResult};
use crate::fixed_parameters::FixedParameters;
use crate::hash::{eg_h, HValue};
use crate::manifest::Manifest;

/// `Q = H(spec_version, election_scope_id, p, q, g)`, the parameter base hash.
pub fn parameter_base_hash(fixed_parameters: &FixedParameters, manifest: &Manifest) -> HValue {
    let group = &fixed_parameters.group;
    let mut v = manifest.spec_version.as_bytes().to_vec();
    v.push(0x00);
    v.extend_from_slice(manifest.election_scope_id.as_bytes());
    v.push(0x00);
    v.extend_from_slice(&group.modulus().to_bytes_be());
    v.extend_from_slice(&fixed_parameters.field.order().to_bytes_be());
    v.extend_from_slice(&group.generator().to_be_bytes_left_pad(group));
    eg_h(HValue::default(), &v)
}

/// `Q̄ = H(Q, N, k, K, commitment_hash)`, the extended base hash. Every Fiat-Shamir challenge
/// and tracking-code chain in C8-C10 is computed against this value, not the bare `Q`.
pub struct ExtendedBaseHash {
    pub parameter_base_hash: HValue,
    pub n_trustees: u32,
    pub quorum: u32,
    pub joint_key: ElGamalPublicKey,
    pub commitment_hash: HValue,
}

impl ExtendedBaseHash {
    pub fn compute(&self, fixed_parameters: &FixedParameters) -> HValue {
        let group = &fixed_parameters.group;
        let mut v = self.n_trustees.to_be_bytes().to_vec();
        v.extend_from_slice(&self.quorum.to_be_bytes());
        v.extend_from_slice(&self.joint_key.0.to_be_bytes_left_pad(group));
        v.extend_from_slice(self.commitment_hash.as_bytes());
        eg_h(self.parameter_base_hash.clone(), &v)
    }
}

/// Generates placeholder selections for a contest so that encoded plaintext votes sum to
/// `votes_allowed` (§4.7, §4.8 step 3). Placeholder ids are derived deterministically from
/// the contest id so two callers building the same contest agree on them.
pub fn placeholder_selection_ids(contest_id: &str, votes_allowed: u32) -> Vec<String> {
    (0..votes_allowed)
        .map(|i| format!("{contest_id}__placeholder__{i}"))
        .collect()
}

pub fn validate_manifest_and_base_hash(
    fixed_parameters: &FixedParameters,
    manifest: &Manifest,
) -> EgResult<HValue> {
    manifest.validate()?;
    if manifest.spec_version.is_empty() {
        return Err(EgError::ConfigInvalidManifest(
            "spec_version must not be empty".into(),
        ));
    }
    Ok(parameter_base_hash(fixed_parameters, manifest))
}
