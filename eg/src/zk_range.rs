// Copyright (C) Microsoft Corporation. All rights reserved.

#![deny(clippy::expect_used)]
#![deny(clippy::manual_assert)]
#![deny(clippy::panic)]
#![deny(clippy::unwrap_used)]

//! Chaum-Pedersen range proofs: "the plaintext encrypted in this ciphertext is some integer
//! `l` in `[0, big_l]`", without revealing which. The disjunctive 0/1 proof C8 attaches to
//! every selection is the `big_l == 1` instance; the per-contest range-sum proof is the
//! `big_l == votes_allowed` instance applied to the homomorphic sum of a contest's
//! selections and placeholders.
//!
//! One real branch is proven honestly; every other branch is simulated by picking its
//! response and challenge first and solving for its commitment. The branch challenges are
//! constrained to sum to the Fiat-Shamir challenge, so a verifier who doesn't know which
//! branch was real cannot distinguish it from the simulated ones.

use serde::{Deserialize, Serialize};

use util::algebra::{FieldElement, GroupElement, ScalarField};
use util::csprng::Csprng;

use crate::el_gamal::{ElGamalCiphertext, ElGamalPublicKey};
use crate::errors::{EgError, EgResult};
use crate::fixed_parameters::FixedParameters;
use crate::hash::{eg_h, HValue};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
struct RangeProofBranch {
    challenge: FieldElement,
    response: FieldElement,
}

/// A proof that some ciphertext encrypts an integer in `[0, big_l]`, carrying one
/// `(challenge, response)` branch per candidate value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RangeProof {
    branches: Vec<RangeProofBranch>,
}

fn challenge(
    base_hash: &HValue,
    fixed_parameters: &FixedParameters,
    public_key: &ElGamalPublicKey,
    ciphertext: &ElGamalCiphertext,
    commit_a: &[GroupElement],
    commit_b: &[GroupElement],
) -> FieldElement {
    let group = &fixed_parameters.group;
    let field = &fixed_parameters.field;

    let mut v = vec![0x21];
    v.extend_from_slice(&public_key.as_group_element().to_be_bytes_left_pad(group));
    v.extend_from_slice(&ciphertext.pad.to_be_bytes_left_pad(group));
    v.extend_from_slice(&ciphertext.data.to_be_bytes_left_pad(group));
    for a in commit_a {
        v.extend_from_slice(&a.to_be_bytes_left_pad(group));
    }
    for b in commit_b {
        v.extend_from_slice(&b.to_be_bytes_left_pad(group));
    }

    let c = eg_h(base_hash, &v);
    FieldElement::from_bytes_be(c.as_bytes(), field)
}

impl RangeProof {
    /// `l` is the plaintext value actually encrypted in `ciphertext` under nonce `r`; `big_l`
    /// is the inclusive upper bound of the range being proven.
    pub fn new(
        csprng: &mut Csprng,
        base_hash: &HValue,
        fixed_parameters: &FixedParameters,
        public_key: &ElGamalPublicKey,
        ciphertext: &ElGamalCiphertext,
        r: &FieldElement,
        l: usize,
        big_l: usize,
    ) -> EgResult<Self> {
        if l > big_l {
            return Err(EgError::OutOfRange(format!(
                "range proof value {l} exceeds bound {big_l}"
            )));
        }

        let field = &fixed_parameters.field;
        let group = &fixed_parameters.group;
        let width = big_l + 1;

        let u: Vec<FieldElement> = (0..width).map(|_| field.random_field_elem(csprng)).collect();
        let mut c: Vec<FieldElement> =
            (0..width).map(|_| field.random_field_elem(csprng)).collect();

        let commit_a: Vec<GroupElement> = (0..width).map(|j| group.g_exp(&u[j])).collect();

        let l_scalar = FieldElement::from(l as u32, field);
        let mut t = u.clone();
        for j in 0..width {
            if j != l {
                let j_scalar = FieldElement::from(j as u32, field);
                let delta = c[j].mul(&l_scalar.sub(&j_scalar, field), field);
                t[j] = t[j].add(&delta, field);
            }
        }
        let commit_b: Vec<GroupElement> = (0..width)
            .map(|j| public_key.as_group_element().exp(&t[j], group))
            .collect();

        let overall_challenge =
            challenge(base_hash, fixed_parameters, public_key, ciphertext, &commit_a, &commit_b);
        c[l] = overall_challenge;
        for j in 0..width {
            if j != l {
                c[l] = c[l].sub(&c[j], field);
            }
        }

        let response: Vec<FieldElement> = (0..width)
            .map(|j| u[j].sub(&c[j].mul(r, field), field))
            .collect();

        Ok(RangeProof {
            branches: (0..width)
                .map(|j| RangeProofBranch {
                    challenge: c[j].clone(),
                    response: response[j].clone(),
                })
                .collect(),
        })
    }

    pub fn verify(
        &self,
        base_hash: &HValue,
        fixed_parameters: &FixedParameters,
        public_key: &ElGamalPublicKey,
        ciphertext: &ElGamalCiphertext,
        big_l: usize,
    ) -> EgResult<()> {
        let field = &fixed_parameters.field;
        let group = &fixed_parameters.group;
        let width = big_l + 1;

        if self.branches.len() != width {
            return Err(EgError::ProofInvalid {
                statement: "range proof branch count mismatches big_l".into(),
            });
        }
        if !ciphertext.pad.is_valid(group) || !ciphertext.data.is_valid(group) {
            return Err(EgError::InvalidGroupElement(
                "range proof ciphertext is not a valid group element pair".into(),
            ));
        }
        for branch in &self.branches {
            if !branch.challenge.is_valid(field) || !branch.response.is_valid(field) {
                return Err(EgError::OutOfRange(
                    "range proof branch value out of field".into(),
                ));
            }
        }

        let commit_a: Vec<GroupElement> = (0..width)
            .map(|j| {
                group
                    .g_exp(&self.branches[j].response)
                    .mul(&ciphertext.pad.exp(&self.branches[j].challenge, group), group)
            })
            .collect();

        let commit_b: Vec<GroupElement> = (0..width)
            .map(|j| {
                let j_scalar = FieldElement::from(j as u32, field);
                let w = self.branches[j]
                    .response
                    .sub(&j_scalar.mul(&self.branches[j].challenge, field), field);
                let k_to_w = public_key.as_group_element().exp(&w, group);
                let data_to_c = ciphertext.data.exp(&self.branches[j].challenge, group);
                k_to_w.mul(&data_to_c, group)
            })
            .collect();

        let expected =
            challenge(base_hash, fixed_parameters, public_key, ciphertext, &commit_a, &commit_b);
        let actual = self
            .branches
            .iter()
            .fold(ScalarField::zero(), |acc, branch| acc.add(&branch.challenge, field));

        if actual != expected {
            return Err(EgError::ProofInvalid {
                statement: "range proof challenge sum".into(),
            });
        }
        Ok(())
    }
}

/// The per-selection disjunctive 0/1 proof is the `big_l == 1` instance of [`RangeProof`].
pub fn new_disjunctive_proof(
    csprng: &mut Csprng,
    base_hash: &HValue,
    fixed_parameters: &FixedParameters,
    public_key: &ElGamalPublicKey,
    ciphertext: &ElGamalCiphertext,
    r: &FieldElement,
    vote: bool,
) -> EgResult<RangeProof> {
    RangeProof::new(
        csprng,
        base_hash,
        fixed_parameters,
        public_key,
        ciphertext,
        r,
        vote as usize,
        1,
    )
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod test {
    use super::*;
    use crate::el_gamal::{encrypt, ElGamalSecretKey};
    use crate::standard_parameters::toy_parameters;

    #[test]
    fn disjunctive_proof_round_trip() {
        let fp = toy_parameters();
        let mut csprng = Csprng::new(b"zk_range disjunctive");
        let base_hash = HValue::generate_random(&mut csprng);
        let sk = ElGamalSecretKey::generate(&mut csprng, &fp);
        let pk = sk.public_key(&fp);

        for vote in [false, true] {
            let m = FieldElement::from(vote as u32, &fp.field);
            let r = fp.field.random_field_elem(&mut csprng);
            let ct = encrypt(&m, &r, &pk, &fp).unwrap();
            let proof =
                new_disjunctive_proof(&mut csprng, &base_hash, &fp, &pk, &ct, &r, vote).unwrap();
            assert!(proof.verify(&base_hash, &fp, &pk, &ct, 1).is_ok());
        }
    }

    #[test]
    fn range_sum_proof_round_trip() {
        let fp = toy_parameters();
        let mut csprng = Csprng::new(b"zk_range sum");
        let base_hash = HValue::generate_random(&mut csprng);
        let sk = ElGamalSecretKey::generate(&mut csprng, &fp);
        let pk = sk.public_key(&fp);

        let votes_allowed = 2_usize;
        let l = 1_usize;
        let m = FieldElement::from(l as u32, &fp.field);
        let r = fp.field.random_field_elem(&mut csprng);
        let ct = encrypt(&m, &r, &pk, &fp).unwrap();
        let proof = RangeProof::new(
            &mut csprng,
            &base_hash,
            &fp,
            &pk,
            &ct,
            &r,
            l,
            votes_allowed,
        )
        .unwrap();
        assert!(proof
            .verify(&base_hash, &fp, &pk, &ct, votes_allowed)
            .is_ok());
    }

    #[test]
    fn tampered_response_fails() {
        let fp = toy_parameters();
        let mut csprng = Csprng::new(b"zk_range tamper");
        let base_hash = HValue::generate_random(&mut csprng);
        let sk = ElGamalSecretKey::generate(&mut csprng, &fp);
        let pk = sk.public_key(&fp);

        let m = FieldElement::from(1_u32, &fp.field);
        let r = fp.field.random_field_elem(&mut csprng);
        let ct = encrypt(&m, &r, &pk, &fp).unwrap();
        let mut proof =
            new_disjunctive_proof(&mut csprng, &base_hash, &fp, &pk, &ct, &r, true).unwrap();
        proof.branches[0].response =
            proof.branches[0].response.add(&FieldElement::from(1_u32, &fp.field), &fp.field);
        assert!(proof.verify(&base_hash, &fp, &pk, &ct, 1).is_err());
    }

    #[test]
    fn rejects_out_of_range_value() {
        let fp = toy_parameters();
        let mut csprng = Csprng::new(b"zk_range oor");
        let base_hash = HValue::generate_random(&mut csprng);
        let sk = ElGamalSecretKey::generate(&mut csprng, &fp);
        let pk = sk.public_key(&fp);
        let r = fp.field.random_field_elem(&mut csprng);
        let m = FieldElement::from(5_u32, &fp.field);
        let ct = encrypt(&m, &r, &pk, &fp).unwrap();
        assert!(RangeProof::new(&mut csprng, &base_hash, &fp, &pk, &ct, &r, 5, 1).is_err());
    }
}
