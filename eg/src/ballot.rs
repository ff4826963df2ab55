// Copyright (C) Microsoft Corporation. All rights reserved.

#![deny(clippy::expect_used)]
#![deny(clippy::manual_assert)]
#![deny(clippy::panic)]
#![deny(clippy::unwrap_used)]

//! Ballot encryption (C8): `encrypt_ballot` turns a [`PlaintextBallot`] into a
//! [`CiphertextBallot`] under the joint key, attaching a disjunctive proof per selection, a
//! range-sum proof per contest, and a tracking-code hash chain over the result (§4.8).

use serde::{Deserialize, Serialize};

use util::algebra::FieldElement;
use util::csprng::Csprng;

use crate::canonical::CanonicalEncoder;
use crate::context::placeholder_selection_ids;
use crate::el_gamal::{encrypt, ElGamalCiphertext, ElGamalPublicKey};
use crate::errors::{check_cancelled, CancellationCheck, EgError, EgResult};
use crate::fixed_parameters::FixedParameters;
use crate::hash::{eg_h, eg_h_q_as_field_element, HValue};
use crate::manifest::{Contest, Manifest, VoteVariation};
use crate::zk_range::{new_disjunctive_proof, RangeProof};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlaintextSelection {
    pub selection_id: String,
    pub vote: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlaintextContest {
    pub contest_id: String,
    pub selections: Vec<PlaintextSelection>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlaintextBallot {
    pub ballot_id: String,
    pub style_id: String,
    pub contests: Vec<PlaintextContest>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CiphertextSelection {
    pub selection_id: String,
    pub ciphertext: ElGamalCiphertext,
    pub proof: RangeProof,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CiphertextContest {
    pub contest_id: String,
    pub selections: Vec<CiphertextSelection>,
    pub contest_total: ElGamalCiphertext,
    pub range_proof: RangeProof,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CiphertextBallot {
    pub ballot_id: String,
    pub style_id: String,
    pub contests: Vec<CiphertextContest>,
    pub device_code: HValue,
    pub previous_tracking_code: Option<HValue>,
    pub timestamp: u64,
    pub ballot_crypto_hash: HValue,
    pub tracking_code: HValue,
}

/// Checks the contest's vote-variation constraint on the real (non-placeholder) selections.
/// Each variation ultimately relies on I1 (cast + placeholders == `votes_allowed`) to make
/// the contest sum well-defined; this only rejects casts that could never be completed by
/// placeholders.
fn validate_vote_variation(contest: &Contest, selections: &[PlaintextSelection]) -> EgResult<()> {
    if contest.vote_variation == VoteVariation::OneOfM && contest.votes_allowed != 1 {
        return Err(EgError::ConfigInvalidManifest(format!(
            "contest {} is one_of_m but votes_allowed != 1",
            contest.contest_id
        )));
    }

    let mut seen = std::collections::HashMap::new();
    for selection in selections {
        let cast_for_id = seen.entry(selection.selection_id.as_str()).or_insert(0_u32);
        *cast_for_id += u32::from(selection.vote);
        if *cast_for_id > 1 {
            return Err(EgError::BallotVoteOutOfRange {
                selection_id: selection.selection_id.clone(),
            });
        }
    }

    let cast_sum: u32 = selections.iter().map(|s| u32::from(s.vote)).sum();
    if cast_sum > contest.votes_allowed {
        return Err(EgError::BallotSumConstraintViolated {
            contest_id: contest.contest_id.clone(),
            actual: cast_sum,
            votes_allowed: contest.votes_allowed,
        });
    }
    Ok(())
}

/// Derives the per-selection nonce from `(xi, contest_id, selection_id)` (§4.8 step 2).
/// Deterministic in `xi`: encrypting the same ballot under the same nonce seed twice yields
/// byte-identical ciphertexts, which is what makes receipt verification possible.
fn selection_nonce(
    xi: &HValue,
    contest_id: &str,
    selection_id: &str,
    fixed_parameters: &FixedParameters,
) -> FieldElement {
    let mut enc = CanonicalEncoder::new();
    enc.push_bytes(&[0x30]);
    enc.push_str(contest_id);
    enc.push_str(selection_id);
    eg_h_q_as_field_element(xi, enc.finish(), &fixed_parameters.field)
}

fn encrypt_selection(
    xi: &HValue,
    base_hash: &HValue,
    fixed_parameters: &FixedParameters,
    public_key: &ElGamalPublicKey,
    contest_id: &str,
    selection_id: &str,
    vote: bool,
    csprng: &mut Csprng,
) -> EgResult<(CiphertextSelection, FieldElement)> {
    let nonce = selection_nonce(xi, contest_id, selection_id, fixed_parameters);
    let m = FieldElement::from(u32::from(vote), &fixed_parameters.field);
    let ciphertext = encrypt(&m, &nonce, public_key, fixed_parameters)?;
    let proof = new_disjunctive_proof(
        csprng,
        base_hash,
        fixed_parameters,
        public_key,
        &ciphertext,
        &nonce,
        vote,
    )?;
    Ok((
        CiphertextSelection {
            selection_id: selection_id.to_string(),
            ciphertext,
            proof,
        },
        nonce,
    ))
}

#[allow(clippy::too_many_arguments)]
fn encrypt_contest(
    xi: &HValue,
    base_hash: &HValue,
    fixed_parameters: &FixedParameters,
    public_key: &ElGamalPublicKey,
    contest: &Contest,
    plaintext: &PlaintextContest,
    csprng: &mut Csprng,
    cancel: Option<CancellationCheck>,
) -> EgResult<CiphertextContest> {
    validate_vote_variation(contest, &plaintext.selections)?;

    for selection in &plaintext.selections {
        contest.find_selection(&selection.selection_id)?;
    }

    let cast_sum: u32 = plaintext.selections.iter().map(|s| u32::from(s.vote)).sum();
    let placeholder_ids = placeholder_selection_ids(&contest.contest_id, contest.votes_allowed);
    let n_placeholders_cast = contest.votes_allowed - cast_sum;

    let mut selections = Vec::with_capacity(plaintext.selections.len() + placeholder_ids.len());
    let mut total_ciphertext = ElGamalCiphertext::identity();
    let mut total_nonce = FieldElement::from(0_u32, &fixed_parameters.field);

    for selection in &plaintext.selections {
        check_cancelled(cancel)?;
        let (ciphertext_selection, nonce) = encrypt_selection(
            xi,
            base_hash,
            fixed_parameters,
            public_key,
            &contest.contest_id,
            &selection.selection_id,
            selection.vote,
            csprng,
        )?;
        total_ciphertext = total_ciphertext.homomorphic_add(&ciphertext_selection.ciphertext, &fixed_parameters.group);
        total_nonce = total_nonce.add(&nonce, &fixed_parameters.field);
        selections.push(ciphertext_selection);
    }

    for (i, placeholder_id) in placeholder_ids.iter().enumerate() {
        check_cancelled(cancel)?;
        let vote = (i as u32) < n_placeholders_cast;
        let (ciphertext_selection, nonce) = encrypt_selection(
            xi,
            base_hash,
            fixed_parameters,
            public_key,
            &contest.contest_id,
            placeholder_id,
            vote,
            csprng,
        )?;
        total_ciphertext = total_ciphertext.homomorphic_add(&ciphertext_selection.ciphertext, &fixed_parameters.group);
        total_nonce = total_nonce.add(&nonce, &fixed_parameters.field);
        selections.push(ciphertext_selection);
    }

    let range_proof = RangeProof::new(
        csprng,
        base_hash,
        fixed_parameters,
        public_key,
        &total_ciphertext,
        &total_nonce,
        contest.votes_allowed as usize,
        contest.votes_allowed as usize,
    )?;

    Ok(CiphertextContest {
        contest_id: contest.contest_id.clone(),
        selections,
        contest_total: total_ciphertext,
        range_proof,
    })
}

fn ballot_crypto_hash(
    base_hash: &HValue,
    ballot_id: &str,
    contests: &[CiphertextContest],
    fixed_parameters: &FixedParameters,
) -> HValue {
    let group = &fixed_parameters.group;
    let mut enc = CanonicalEncoder::new();
    enc.push_bytes(&[0x40]);
    enc.push_str(ballot_id);
    for contest in contests {
        enc.push_str(&contest.contest_id);
        for selection in &contest.selections {
            enc.push_group_element(&selection.ciphertext.pad, group);
            enc.push_group_element(&selection.ciphertext.data, group);
        }
        enc.push_group_element(&contest.contest_total.pad, group);
        enc.push_group_element(&contest.contest_total.data, group);
    }
    eg_h(base_hash, enc.finish())
}

/// `H(device_code, previous_code ∨ device_code, timestamp, ballot_crypto_hash)` (§4.8 step 5).
fn tracking_code(
    device_code: &HValue,
    previous_tracking_code: Option<&HValue>,
    timestamp: u64,
    ballot_crypto_hash: &HValue,
) -> HValue {
    let chained = previous_tracking_code.unwrap_or(device_code);
    let mut enc = CanonicalEncoder::new();
    enc.push_bytes(&[0x41]);
    enc.push_bytes(device_code.as_bytes());
    enc.push_bytes(chained.as_bytes());
    enc.push_u64(timestamp);
    enc.push_bytes(ballot_crypto_hash.as_bytes());
    eg_h(device_code, enc.finish())
}

/// Encrypts a plaintext ballot under `public_key` using nonce seed `xi`. `xi` must be
/// destroyed or sealed by the caller after the ciphertext is published (§4.8 Determinism):
/// anyone who learns it can re-derive every selection's plaintext vote. `cancel` is checked
/// once per contest and again at each selection within it, the per-selection cancellation
/// boundary for a host encrypting a large ballot style.
#[allow(clippy::too_many_arguments)]
pub fn encrypt_ballot(
    csprng: &mut Csprng,
    base_hash: &HValue,
    fixed_parameters: &FixedParameters,
    public_key: &ElGamalPublicKey,
    manifest: &Manifest,
    ballot: &PlaintextBallot,
    xi: &HValue,
    device_code: &HValue,
    previous_tracking_code: Option<&HValue>,
    timestamp: u64,
    cancel: Option<CancellationCheck>,
) -> EgResult<CiphertextBallot> {
    let style = manifest.get_ballot_style(&ballot.style_id)?;

    let mut contests = Vec::with_capacity(ballot.contests.len());
    for plaintext_contest in &ballot.contests {
        check_cancelled(cancel)?;
        if !style.contest_ids.contains(&plaintext_contest.contest_id) {
            return Err(EgError::BallotUnknownContest {
                contest_id: plaintext_contest.contest_id.clone(),
            });
        }
        let contest = manifest.get_contest(&plaintext_contest.contest_id)?;
        contests.push(encrypt_contest(
            xi,
            base_hash,
            fixed_parameters,
            public_key,
            contest,
            plaintext_contest,
            csprng,
            cancel,
        )?);
    }

    let crypto_hash = ballot_crypto_hash(base_hash, &ballot.ballot_id, &contests, fixed_parameters);
    let code = tracking_code(device_code, previous_tracking_code, timestamp, &crypto_hash);

    Ok(CiphertextBallot {
        ballot_id: ballot.ballot_id.clone(),
        style_id: ballot.style_id.clone(),
        contests,
        device_code: device_code.clone(),
        previous_tracking_code: previous_tracking_code.cloned(),
        timestamp,
        ballot_crypto_hash: crypto_hash,
        tracking_code: code,
    })
}

/// Re-verifies every proof attached to an already-encrypted ballot (used by C9's
/// `verify_on_submit` configuration and by S6-style tamper tests).
pub fn verify_ballot(
    base_hash: &HValue,
    fixed_parameters: &FixedParameters,
    public_key: &ElGamalPublicKey,
    ciphertext_ballot: &CiphertextBallot,
    manifest: &Manifest,
) -> EgResult<()> {
    for contest in &ciphertext_ballot.contests {
        let contest_def = manifest.get_contest(&contest.contest_id)?;
        for selection in &contest.selections {
            selection.proof.verify(base_hash, fixed_parameters, public_key, &selection.ciphertext, 1)?;
        }
        contest.range_proof.verify(
            base_hash,
            fixed_parameters,
            public_key,
            &contest.contest_total,
            contest_def.votes_allowed as usize,
        )?;
    }

    let expected_crypto_hash = ballot_crypto_hash(
        base_hash,
        &ciphertext_ballot.ballot_id,
        &ciphertext_ballot.contests,
        fixed_parameters,
    );
    if expected_crypto_hash != ciphertext_ballot.ballot_crypto_hash {
        return Err(EgError::ProofInvalid {
            statement: "ballot crypto hash mismatch".into(),
        });
    }

    Ok(())
}
