// Copyright (C) Microsoft Corporation. All rights reserved.

#![deny(clippy::expect_used)]
#![deny(clippy::manual_assert)]
#![deny(clippy::panic)]
#![deny(clippy::unwrap_used)]

//! Partial and compensated decryption (C10). Every present trustee contributes a
//! [`DecryptionShare`] per selection ciphertext; absent trustees are stood in for by
//! [`CompensatedDecryptionShare`]s computed from decrypted backups. [`combine`] folds a full
//! quorum of shares via Lagrange interpolation and recovers the plaintext count through C4.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use util::algebra::{FieldElement, GroupElement};
use util::algebra_utils::group_lagrange_at_zero;
use util::csprng::Csprng;

use crate::chaum_pedersen::ChaumPedersenProof;
use crate::discrete_log::DiscreteLogTable;
use crate::el_gamal::{decrypt_with_combined_shares, ElGamalCiphertext};
use crate::errors::{check_cancelled, CancellationCheck, EgError, EgResult, TrusteeIndex};
use crate::fixed_parameters::FixedParameters;
use crate::hash::HValue;
use crate::polynomial::PublicCoefficients;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DecryptionShare {
    pub trustee: TrusteeIndex,
    pub share: GroupElement,
    pub proof: ChaumPedersenProof,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompensatedDecryptionShare {
    pub absent_trustee: TrusteeIndex,
    pub present_trustee: TrusteeIndex,
    pub share: GroupElement,
    pub proof: ChaumPedersenProof,
}

/// Present trustee `i` computes `M_i = A^{s_i}` and proves `log_g(y_i) == log_A(M_i)`.
/// `cancel` is checked once per call, the natural per-selection cancellation boundary for a
/// host driving one share per ciphertext.
#[allow(clippy::too_many_arguments)]
pub fn partial_share(
    csprng: &mut Csprng,
    base_hash: &HValue,
    fixed_parameters: &FixedParameters,
    ciphertext: &ElGamalCiphertext,
    trustee: TrusteeIndex,
    secret_share: &FieldElement,
    public_share_key: &GroupElement,
    cancel: Option<CancellationCheck>,
) -> EgResult<DecryptionShare> {
    check_cancelled(cancel)?;
    let group = &fixed_parameters.group;
    let g = group.generator();
    let share = ciphertext.pad.exp(secret_share, group);
    let proof = ChaumPedersenProof::new(
        csprng,
        base_hash,
        fixed_parameters,
        &g,
        public_share_key,
        &ciphertext.pad,
        &share,
        secret_share,
    );
    Ok(DecryptionShare {
        trustee,
        share,
        proof,
    })
}

pub fn verify_partial_share(
    base_hash: &HValue,
    fixed_parameters: &FixedParameters,
    ciphertext: &ElGamalCiphertext,
    public_share_key: &GroupElement,
    decryption_share: &DecryptionShare,
) -> EgResult<()> {
    let group = &fixed_parameters.group;
    let g = group.generator();
    decryption_share.proof.verify(
        base_hash,
        fixed_parameters,
        &g,
        public_share_key,
        &ciphertext.pad,
        &decryption_share.share,
    )
}

/// Present trustee `i`, standing in for absent trustee `l`, has already decrypted and
/// validated `l`'s backup to recover `P_l(i)` (via [`crate::backup::PartialKeyBackup::open_and_verify`]).
/// It computes `M_{l,i} = A^{P_l(i)}` and proves equality of discrete logs against the
/// expected share key anyone can recompute from `l`'s published commitments.
#[allow(clippy::too_many_arguments)]
pub fn compensated_share(
    csprng: &mut Csprng,
    base_hash: &HValue,
    fixed_parameters: &FixedParameters,
    ciphertext: &ElGamalCiphertext,
    absent_trustee: TrusteeIndex,
    present_trustee: TrusteeIndex,
    backup_value: &FieldElement,
    absent_trustee_public_coefficients: &PublicCoefficients,
    cancel: Option<CancellationCheck>,
) -> EgResult<CompensatedDecryptionShare> {
    check_cancelled(cancel)?;
    let group = &fixed_parameters.group;
    let g = group.generator();
    let expected_key =
        absent_trustee_public_coefficients.expected_share_key_at(fixed_parameters, present_trustee);
    let share = ciphertext.pad.exp(backup_value, group);
    let proof = ChaumPedersenProof::new(
        csprng,
        base_hash,
        fixed_parameters,
        &g,
        &expected_key,
        &ciphertext.pad,
        &share,
        backup_value,
    );
    Ok(CompensatedDecryptionShare {
        absent_trustee,
        present_trustee,
        share,
        proof,
    })
}

pub fn verify_compensated_share(
    base_hash: &HValue,
    fixed_parameters: &FixedParameters,
    ciphertext: &ElGamalCiphertext,
    absent_trustee_public_coefficients: &PublicCoefficients,
    decryption_share: &CompensatedDecryptionShare,
) -> EgResult<()> {
    let group = &fixed_parameters.group;
    let g = group.generator();
    let expected_key = absent_trustee_public_coefficients
        .expected_share_key_at(fixed_parameters, decryption_share.present_trustee);
    decryption_share.proof.verify(
        base_hash,
        fixed_parameters,
        &g,
        &expected_key,
        &ciphertext.pad,
        &decryption_share.share,
    )
}

/// Combines present trustees' shares with, for each absent trustee, its present-trustee
/// compensations Lagrange-interpolated into a single reconstructed share, then all shares
/// combined via Lagrange coefficients over the full quorum index set. Recovers `g^m` via C2
/// and inverts it to `m` via C4.
/// `cancel` is checked once per absent trustee reconstructed (the batch boundary of this
/// function's own work) and again before the discrete-log lookup it delegates to.
pub fn combine(
    present_shares: &[DecryptionShare],
    compensated_shares_by_absent_trustee: &BTreeMap<TrusteeIndex, Vec<CompensatedDecryptionShare>>,
    quorum: u32,
    fixed_parameters: &FixedParameters,
    ciphertext: &ElGamalCiphertext,
    discrete_log_table: &DiscreteLogTable,
    cancel: Option<CancellationCheck>,
) -> EgResult<u64> {
    let field = &fixed_parameters.field;
    let group = &fixed_parameters.group;

    let n_present = present_shares.len() as u32;
    let n_reconstructed = compensated_shares_by_absent_trustee.len() as u32;
    if n_present + n_reconstructed < quorum {
        return Err(EgError::DecryptionQuorumNotMet {
            present: n_present,
            quorum,
        });
    }

    let mut reconstructed_shares: Vec<(TrusteeIndex, GroupElement)> = present_shares
        .iter()
        .map(|s| (s.trustee, s.share.clone()))
        .collect();

    for (absent, compensations) in compensated_shares_by_absent_trustee {
        check_cancelled(cancel)?;
        if compensations.is_empty() {
            return Err(EgError::DecryptionMissingCompensation { trustee: *absent });
        }
        let xs: Vec<FieldElement> = compensations
            .iter()
            .map(|c| FieldElement::from(c.present_trustee, field))
            .collect();
        let ys: Vec<GroupElement> = compensations.iter().map(|c| c.share.clone()).collect();
        let reconstructed = group_lagrange_at_zero(&xs, &ys, field, group).ok_or_else(|| {
            EgError::DecryptionMissingCompensation { trustee: *absent }
        })?;
        reconstructed_shares.push((*absent, reconstructed));
    }

    let xs: Vec<FieldElement> = reconstructed_shares
        .iter()
        .map(|(t, _)| FieldElement::from(*t, field))
        .collect();
    let ys: Vec<GroupElement> = reconstructed_shares.iter().map(|(_, m)| m.clone()).collect();
    let combined = group_lagrange_at_zero(&xs, &ys, field, group)
        .ok_or_else(|| EgError::DecryptionQuorumNotMet {
            present: n_present,
            quorum,
        })?;

    let g_to_m = decrypt_with_combined_shares(ciphertext, &combined, group)?;
    discrete_log_table.find(&g_to_m, cancel)
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlaintextTally {
    pub counts: BTreeMap<String, BTreeMap<String, u64>>,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod test {
    use super::*;
    use crate::el_gamal::{encrypt, ElGamalPublicKey};
    use crate::standard_parameters::toy_parameters;
    use util::algebra::ScalarField;

    fn setup_trustees(
        n: u32,
        k: u32,
        fp: &FixedParameters,
        csprng: &mut Csprng,
        base_hash: &HValue,
    ) -> (Vec<FieldElement>, Vec<PublicCoefficients>, ElGamalPublicKey) {
        let mut secret_keys = Vec::new();
        let mut publics = Vec::new();
        for i in 1..=n {
            let secret = crate::polynomial::SecretPolynomial::generate(csprng, fp, k);
            secret_keys.push(secret.constant_term().clone());
            publics.push(PublicCoefficients::generate(csprng, base_hash, fp, i, &secret));
        }
        let joint_key_elem = publics
            .iter()
            .fold(util::algebra::Group::one(), |acc, p| acc.mul(p.share_key(), &fp.group));
        (secret_keys, publics, ElGamalPublicKey(joint_key_elem))
    }

    #[test]
    fn full_quorum_combine_recovers_plaintext() {
        let fp = toy_parameters();
        let mut csprng = Csprng::new(b"decryption full quorum");
        let base_hash = HValue::generate_random(&mut csprng);

        let (secret_keys, _publics, joint_key) = setup_trustees(3, 3, &fp, &mut csprng, &base_hash);

        let m = FieldElement::from(4_u32, &fp.field);
        let r = fp.field.random_field_elem(&mut csprng);
        let ct = encrypt(&m, &r, &joint_key, &fp).unwrap();

        let mut shares = Vec::new();
        for (idx, secret) in secret_keys.iter().enumerate() {
            let trustee = (idx as u32) + 1;
            let public_share_key = fp.group.g_exp(secret);
            let share = partial_share(&mut csprng, &base_hash, &fp, &ct, trustee, secret, &public_share_key, None).unwrap();
            assert!(verify_partial_share(&base_hash, &fp, &ct, &public_share_key, &share).is_ok());
            shares.push(share);
        }

        let dlog = DiscreteLogTable::new(fp.group.clone(), 100).unwrap();
        let recovered = combine(&shares, &BTreeMap::new(), 3, &fp, &ct, &dlog, None).unwrap();
        assert_eq!(recovered, 4);
    }

    #[test]
    fn compensated_share_stands_in_for_absent_trustee() {
        let fp = toy_parameters();
        let mut csprng = Csprng::new(b"decryption compensated");
        let base_hash = HValue::generate_random(&mut csprng);

        let (secret_keys, publics, joint_key) = setup_trustees(3, 2, &fp, &mut csprng, &base_hash);

        let m = FieldElement::from(2_u32, &fp.field);
        let r = fp.field.random_field_elem(&mut csprng);
        let ct = encrypt(&m, &r, &joint_key, &fp).unwrap();

        // Trustee 3 is absent; trustees 1 and 2 are present and hold trustee 3's backups.
        // Reconstruct P_3(i) for i in {1,2} directly (bypassing backup encryption, which is
        // exercised separately in backup.rs) to isolate the compensation/combine logic.
        let absent = 3_u32;
        let absent_poly = crate::polynomial::SecretPolynomial {
            coefficients: vec![secret_keys[2].clone(), ScalarField::one()],
        };
        let absent_public = &publics[2];

        let mut present_shares = Vec::new();
        let mut compensations = Vec::new();
        for i in 1_u32..=2 {
            let secret = &secret_keys[(i - 1) as usize];
            let public_share_key = fp.group.g_exp(secret);
            present_shares.push(partial_share(&mut csprng, &base_hash, &fp, &ct, i, secret, &public_share_key, None).unwrap());

            let backup_value = absent_poly.evaluate(i, &fp);
            let comp =
                compensated_share(&mut csprng, &base_hash, &fp, &ct, absent, i, &backup_value, absent_public, None)
                    .unwrap();
            assert!(verify_compensated_share(&base_hash, &fp, &ct, absent_public, &comp).is_ok());
            compensations.push(comp);
        }

        let mut by_absent = BTreeMap::new();
        by_absent.insert(absent, compensations);

        let dlog = DiscreteLogTable::new(fp.group.clone(), 100).unwrap();
        let recovered = combine(&present_shares, &by_absent, 2, &fp, &ct, &dlog, None).unwrap();
        assert_eq!(recovered, 2);
    }

    #[test]
    fn insufficient_quorum_rejected() {
        let fp = toy_parameters();
        let mut csprng = Csprng::new(b"decryption insufficient");
        let base_hash = HValue::generate_random(&mut csprng);

        let (secret_keys, _publics, joint_key) = setup_trustees(3, 3, &fp, &mut csprng, &base_hash);

        let m = FieldElement::from(1_u32, &fp.field);
        let r = fp.field.random_field_elem(&mut csprng);
        let ct = encrypt(&m, &r, &joint_key, &fp).unwrap();

        let secret = &secret_keys[0];
        let public_share_key = fp.group.g_exp(secret);
        let share = partial_share(&mut csprng, &base_hash, &fp, &ct, 1, secret, &public_share_key, None).unwrap();

        let dlog = DiscreteLogTable::new(fp.group.clone(), 100).unwrap();
        let result = combine(&[share], &BTreeMap::new(), 3, &fp, &ct, &dlog, None);
        assert!(result.is_err());
    }

    #[test]
    fn partial_share_respects_cancellation() {
        let fp = toy_parameters();
        let mut csprng = Csprng::new(b"decryption cancellation");
        let base_hash = HValue::generate_random(&mut csprng);

        let (secret_keys, _publics, joint_key) = setup_trustees(1, 1, &fp, &mut csprng, &base_hash);
        let m = FieldElement::from(1_u32, &fp.field);
        let r = fp.field.random_field_elem(&mut csprng);
        let ct = encrypt(&m, &r, &joint_key, &fp).unwrap();

        let secret = &secret_keys[0];
        let public_share_key = fp.group.g_exp(secret);
        let cancel: crate::errors::CancellationCheck = &|| true;
        let result = partial_share(&mut csprng, &base_hash, &fp, &ct, 1, secret, &public_share_key, Some(cancel));
        assert!(matches!(result, Err(EgError::ResourceCancelled)));
    }
}
