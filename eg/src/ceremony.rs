// Copyright (C) Microsoft Corporation. All rights reserved.

#![deny(clippy::expect_used)]
#![deny(clippy::manual_assert)]
#![deny(clippy::panic)]
#![deny(clippy::unwrap_used)]

//! Key ceremony (C6): a state machine coordinating `n` trustees with quorum `k` through
//! `INIT -> KEYS_SHARED -> BACKUPS_SHARED -> BACKUPS_VERIFIED -> JOINT_KEY_PUBLISHED`. Every
//! step is single-attempt: a byte-identical replay of a prior step from the same trustee is
//! accepted silently, a mismatched replay is rejected, and a failed backup verification is
//! fatal and halts the ceremony rather than being retried.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use strum_macros::Display;
use tracing::{info, warn};

use util::algebra::{Group, GroupElement};

use crate::backup::PartialKeyBackup;
use crate::context::ExtendedBaseHash;
use crate::el_gamal::ElGamalPublicKey;
use crate::errors::{EgError, EgResult, TrusteeIndex};
use crate::fixed_parameters::FixedParameters;
use crate::hash::{eg_h, HValue};
use crate::polynomial::PublicCoefficients;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, Serialize, Deserialize)]
pub enum CeremonyState {
    Init,
    KeysShared,
    BackupsShared,
    BackupsVerified,
    JointKeyPublished,
    Aborted,
}

pub struct KeyCeremony {
    fixed_parameters: FixedParameters,
    parameter_base_hash: HValue,
    n_trustees: u32,
    quorum: u32,
    state: CeremonyState,
    announced: BTreeMap<TrusteeIndex, PublicCoefficients>,
    backups: BTreeMap<(TrusteeIndex, TrusteeIndex), PartialKeyBackup>,
    verified: BTreeMap<(TrusteeIndex, TrusteeIndex), bool>,
    joint_key: Option<ElGamalPublicKey>,
    extended_base_hash: Option<HValue>,
}

impl KeyCeremony {
    pub fn new(
        fixed_parameters: FixedParameters,
        parameter_base_hash: HValue,
        n_trustees: u32,
        quorum: u32,
    ) -> EgResult<Self> {
        if n_trustees == 0 {
            return Err(EgError::ConfigInvalidNTrustees { n_trustees });
        }
        if quorum == 0 || quorum > n_trustees {
            return Err(EgError::ConfigInvalidQuorum { quorum, n_trustees });
        }
        Ok(KeyCeremony {
            fixed_parameters,
            parameter_base_hash,
            n_trustees,
            quorum,
            state: CeremonyState::Init,
            announced: BTreeMap::new(),
            backups: BTreeMap::new(),
            verified: BTreeMap::new(),
            joint_key: None,
            extended_base_hash: None,
        })
    }

    pub fn state(&self) -> CeremonyState {
        self.state
    }

    fn require_state(&self, expected: CeremonyState, op: &str) -> EgResult<()> {
        if self.state != expected {
            return Err(EgError::CeremonyWrongState {
                state: self.state.to_string(),
                op: op.to_string(),
            });
        }
        Ok(())
    }

    /// Every trustee posts its public share-key with Schnorr proof. Transitions to
    /// `KeysShared` once all `n` keys are present and valid.
    pub fn announce(&mut self, trustee: TrusteeIndex, coefficients: PublicCoefficients) -> EgResult<()> {
        if self.state != CeremonyState::Init && self.state != CeremonyState::KeysShared {
            return Err(EgError::CeremonyWrongState {
                state: self.state.to_string(),
                op: "announce".into(),
            });
        }
        if coefficients.trustee != trustee {
            return Err(EgError::CeremonyKeyProofInvalid { trustee });
        }

        if let Some(existing) = self.announced.get(&trustee) {
            if existing == &coefficients {
                return Ok(());
            }
            return Err(EgError::CeremonyReplayMismatch { trustee });
        }

        coefficients.verify(&self.parameter_base_hash, &self.fixed_parameters)?;
        self.announced.insert(trustee, coefficients);

        if self.announced.len() as u32 == self.n_trustees {
            self.state = CeremonyState::KeysShared;
            info!(n = self.n_trustees, "all trustee keys announced");
        }
        Ok(())
    }

    /// Each trustee submits an encrypted backup for every peer. Transitions to
    /// `BackupsShared` once all `n*(n-1)` backups are present.
    pub fn share_backup(&mut self, backup: PartialKeyBackup) -> EgResult<()> {
        self.require_state(CeremonyState::KeysShared, "share_backup")?;

        let key = (backup.dealer, backup.recipient);
        if let Some(existing) = self.backups.get(&key) {
            if existing == &backup {
                return Ok(());
            }
            return Err(EgError::CeremonyReplayMismatch {
                trustee: backup.dealer,
            });
        }
        self.backups.insert(key, backup);

        let expected = (self.n_trustees as u64) * (self.n_trustees.saturating_sub(1) as u64);
        if self.backups.len() as u64 == expected {
            self.state = CeremonyState::BackupsShared;
            info!("all key-ceremony backups shared");
        }
        Ok(())
    }

    /// Each trustee reports the outcome (invariant I5) of verifying every backup it
    /// received. A failing verification is fatal and halts the ceremony.
    pub fn report_verification(
        &mut self,
        dealer: TrusteeIndex,
        recipient: TrusteeIndex,
        ok: bool,
    ) -> EgResult<()> {
        self.require_state(CeremonyState::BackupsShared, "report_verification")?;

        if !ok {
            self.state = CeremonyState::Aborted;
            warn!(dealer, recipient, "key ceremony aborted: backup verification failed");
            return Err(EgError::CeremonyBackupVerificationFailed { dealer, recipient });
        }
        self.verified.insert((dealer, recipient), true);

        let expected = (self.n_trustees as u64) * (self.n_trustees.saturating_sub(1) as u64);
        if self.verified.len() as u64 == expected && self.verified.values().all(|v| *v) {
            self.state = CeremonyState::BackupsVerified;
            info!("all key-ceremony backups verified");
        }
        Ok(())
    }

    /// Computes `K = prod y_i`, `commitment_hash = H(Q, all K_{i,l})` (using the bare
    /// parameter base hash `Q`, since `Q̄` can't exist until `K` and `commitment_hash`
    /// themselves are known), and from those the extended base hash `Q̄` that every proof
    /// constructed after this point must be seeded with. Only after this does the election
    /// accept ballots.
    pub fn publish(&mut self) -> EgResult<(ElGamalPublicKey, HValue)> {
        self.require_state(CeremonyState::BackupsVerified, "publish")?;

        let group = &self.fixed_parameters.group;
        let mut joint = Group::one();
        let mut hash_input = Vec::new();
        for (_trustee, coefficients) in &self.announced {
            joint = joint.mul(coefficients.share_key(), group);
            for commitment in &coefficients.commitments.commitments {
                hash_input.extend_from_slice(&commitment.to_be_bytes_left_pad(group));
            }
        }
        let commitment_hash = eg_h(&self.parameter_base_hash, &hash_input);
        let joint_key = ElGamalPublicKey(joint);

        let extended_base_hash = ExtendedBaseHash {
            parameter_base_hash: self.parameter_base_hash.clone(),
            n_trustees: self.n_trustees,
            quorum: self.quorum,
            joint_key: joint_key.clone(),
            commitment_hash,
        }
        .compute(&self.fixed_parameters);

        self.joint_key = Some(joint_key.clone());
        self.extended_base_hash = Some(extended_base_hash.clone());
        self.state = CeremonyState::JointKeyPublished;
        info!("joint key published");

        Ok((joint_key, extended_base_hash))
    }

    pub fn joint_key(&self) -> Option<&ElGamalPublicKey> {
        self.joint_key.as_ref()
    }

    pub fn quorum(&self) -> u32 {
        self.quorum
    }

    pub fn n_trustees(&self) -> u32 {
        self.n_trustees
    }

    pub fn public_coefficients(&self, trustee: TrusteeIndex) -> Option<&PublicCoefficients> {
        self.announced.get(&trustee)
    }
}

/// A trustee's full key-ceremony output: its own secret polynomial, its published
/// commitments, and the polynomial values it received (and verified) from every other
/// trustee, keyed by dealer. Everything [`crate::decryption::partial_share`] and
/// [`crate::decryption::compensated_share`] need to act for this trustee.
#[derive(Debug, Clone)]
pub struct TrusteeRecord {
    pub trustee: TrusteeIndex,
    pub secret: crate::polynomial::SecretPolynomial,
    pub public_coefficients: PublicCoefficients,
    pub shares_received: BTreeMap<TrusteeIndex, util::algebra::FieldElement>,
}

/// Single-process driver for [`KeyCeremony`] (§6's `setup_trustees`): runs every trustee's
/// announce/backup/verify step in one call. Intended for hosts where all trustees run in one
/// process (tests, small single-operator deployments); a distributed deployment drives
/// [`KeyCeremony`] directly instead, one message at a time. Returns the extended base hash
/// `Q̄`, not the bare parameter base hash passed in: every proof built after the ceremony
/// (ballot encryption, partial/compensated decryption) must be seeded with `Q̄`, not `Q`.
pub fn setup_trustees(
    csprng: &mut util::csprng::Csprng,
    parameter_base_hash: HValue,
    fixed_parameters: FixedParameters,
    n_trustees: u32,
    quorum: u32,
) -> EgResult<(ElGamalPublicKey, HValue, Vec<TrusteeRecord>)> {
    use crate::polynomial::SecretPolynomial;

    let mut ceremony = KeyCeremony::new(
        fixed_parameters.clone(),
        parameter_base_hash.clone(),
        n_trustees,
        quorum,
    )?;

    let secrets: Vec<SecretPolynomial> = (0..n_trustees)
        .map(|_| SecretPolynomial::generate(csprng, &fixed_parameters, quorum))
        .collect();

    for (idx, secret) in secrets.iter().enumerate() {
        let trustee = idx as u32 + 1;
        let public = PublicCoefficients::generate(
            csprng,
            &parameter_base_hash,
            &fixed_parameters,
            trustee,
            secret,
        );
        ceremony.announce(trustee, public)?;
    }

    let mut backups: BTreeMap<(TrusteeIndex, TrusteeIndex), PartialKeyBackup> = BTreeMap::new();
    for dealer in 1..=n_trustees {
        let dealer_secret = &secrets[(dealer - 1) as usize];
        for recipient in 1..=n_trustees {
            if recipient == dealer {
                continue;
            }
            #[allow(clippy::unwrap_used)]
            let recipient_public_key = ceremony
                .public_coefficients(recipient)
                .unwrap()
                .share_key()
                .clone();
            let backup = PartialKeyBackup::create(
                csprng,
                &parameter_base_hash,
                &fixed_parameters,
                dealer,
                dealer_secret,
                recipient,
                &recipient_public_key,
            );
            ceremony.share_backup(backup.clone())?;
            backups.insert((dealer, recipient), backup);
        }
    }

    let mut shares_received: BTreeMap<TrusteeIndex, BTreeMap<TrusteeIndex, util::algebra::FieldElement>> =
        BTreeMap::new();
    for recipient in 1..=n_trustees {
        let recipient_secret = secrets[(recipient - 1) as usize].constant_term().clone();
        for dealer in 1..=n_trustees {
            if dealer == recipient {
                continue;
            }
            #[allow(clippy::unwrap_used)]
            let backup = backups.get(&(dealer, recipient)).unwrap();
            #[allow(clippy::unwrap_used)]
            let dealer_public = ceremony.public_coefficients(dealer).unwrap();
            let value = backup.open_and_verify(
                &parameter_base_hash,
                &fixed_parameters,
                &recipient_secret,
                dealer_public,
            )?;
            ceremony.report_verification(dealer, recipient, true)?;
            shares_received.entry(recipient).or_default().insert(dealer, value);
        }
    }

    let (joint_key, extended_base_hash) = ceremony.publish()?;

    let records = (1..=n_trustees)
        .map(|trustee| {
            #[allow(clippy::unwrap_used)]
            let public_coefficients = ceremony.public_coefficients(trustee).unwrap().clone();
            TrusteeRecord {
                trustee,
                secret: secrets[(trustee - 1) as usize].clone(),
                public_coefficients,
                shares_received: shares_received.remove(&trustee).unwrap_or_default(),
            }
        })
        .collect();

    Ok((joint_key, extended_base_hash, records))
}
