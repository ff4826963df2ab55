// Copyright (C) Microsoft Corporation. All rights reserved.

#![deny(clippy::expect_used)]
#![deny(clippy::manual_assert)]
#![deny(clippy::panic)]
#![deny(clippy::unwrap_used)]

//! Polynomials and secret sharing (C5). Each trustee samples a degree-`quorum - 1` polynomial
//! with random coefficients in `Z_q`, publishes `K_l = g^{a_l}` for each coefficient alongside
//! a [`SchnorrProof`] of knowledge of `a_l`, and evaluates the polynomial at peer indices to
//! produce key-ceremony backups (see [`crate::backup`]).

use serde::{Deserialize, Serialize};

use util::algebra::FieldElement;
use util::csprng::Csprng;

use crate::errors::{EgError, EgResult, TrusteeIndex};
use crate::fixed_parameters::FixedParameters;
use crate::hash::HValue;
use crate::schnorr::SchnorrProof;

/// `a_0..a_{k-1}`, sampled uniformly at random in `Z_q`. `a_0` is the trustee's long-term
/// secret: `y = g^{a_0}` is the trustee's published share-key.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SecretPolynomial {
    pub coefficients: Vec<FieldElement>,
}

impl SecretPolynomial {
    pub fn generate(csprng: &mut Csprng, fixed_parameters: &FixedParameters, quorum: u32) -> Self {
        let coefficients = (0..quorum)
            .map(|_| fixed_parameters.field.random_field_elem(csprng))
            .collect();
        SecretPolynomial { coefficients }
    }

    pub fn constant_term(&self) -> &FieldElement {
        #[allow(clippy::unwrap_used)]
        self.coefficients.first().unwrap()
    }

    /// `P(x) = sum_l a_l * x^l mod q`.
    pub fn evaluate(&self, x: u32, fixed_parameters: &FixedParameters) -> FieldElement {
        let field = &fixed_parameters.field;
        let x_elem = FieldElement::from(x, field);
        let mut acc = FieldElement::from(0_u32, field);
        let mut power = FieldElement::from(1_u32, field);
        for coeff in &self.coefficients {
            let term = coeff.mul(&power, field);
            acc = acc.add(&term, field);
            power = power.mul(&x_elem, field);
        }
        acc
    }
}

/// `K_l = g^{a_l}` for every coefficient, published alongside a Schnorr proof of knowledge.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CoefficientCommitments {
    pub commitments: Vec<util::algebra::GroupElement>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PublicCoefficients {
    pub trustee: TrusteeIndex,
    pub commitments: CoefficientCommitments,
    pub proofs: Vec<SchnorrProof>,
}

impl PublicCoefficients {
    pub fn generate(
        csprng: &mut Csprng,
        parameter_base_hash: &HValue,
        fixed_parameters: &FixedParameters,
        trustee: TrusteeIndex,
        secret: &SecretPolynomial,
    ) -> Self {
        let group = &fixed_parameters.group;
        let commitments: Vec<_> = secret
            .coefficients
            .iter()
            .map(|a| group.g_exp(a))
            .collect();

        let proofs = secret
            .coefficients
            .iter()
            .zip(commitments.iter())
            .enumerate()
            .map(|(l, (a, commitment))| {
                SchnorrProof::new(
                    csprng,
                    parameter_base_hash,
                    fixed_parameters,
                    trustee,
                    l as u32,
                    a,
                    commitment,
                )
            })
            .collect();

        PublicCoefficients {
            trustee,
            commitments: CoefficientCommitments { commitments },
            proofs,
        }
    }

    pub fn share_key(&self) -> &util::algebra::GroupElement {
        #[allow(clippy::unwrap_used)]
        self.commitments.commitments.first().unwrap()
    }

    pub fn verify(
        &self,
        parameter_base_hash: &HValue,
        fixed_parameters: &FixedParameters,
    ) -> EgResult<()> {
        if self.commitments.commitments.len() != self.proofs.len() {
            return Err(EgError::CeremonyKeyProofInvalid {
                trustee: self.trustee,
            });
        }
        for (l, (commitment, proof)) in self
            .commitments
            .commitments
            .iter()
            .zip(self.proofs.iter())
            .enumerate()
        {
            proof
                .verify(
                    parameter_base_hash,
                    fixed_parameters,
                    self.trustee,
                    l as u32,
                    commitment,
                )
                .map_err(|_| EgError::CeremonyKeyProofInvalid {
                    trustee: self.trustee,
                })?;
        }
        Ok(())
    }

    /// `prod_l K_{i,l}^{j^l}`, the group element anyone can recompute from the published
    /// commitments as the expected value of `g^{P_i(j)}`, without knowing `P_i(j)` itself.
    /// Used directly by C10's compensated-share proof, which needs this as an explicit
    /// Chaum-Pedersen base rather than a boolean check.
    pub fn expected_share_key_at(
        &self,
        fixed_parameters: &FixedParameters,
        j: u32,
    ) -> util::algebra::GroupElement {
        let group = &fixed_parameters.group;
        let field = &fixed_parameters.field;

        let j_elem = FieldElement::from(j, field);
        let mut power = FieldElement::from(1_u32, field);
        let mut rhs = util::algebra::Group::one();
        for commitment in &self.commitments.commitments {
            let term = commitment.exp(&power, group);
            rhs = rhs.mul(&term, group);
            power = power.mul(&j_elem, field);
        }
        rhs
    }

    /// Checks `g^{P_i(j)} == prod_l K_{i,l}^{j^l}`, invariant I5.
    pub fn verify_evaluation_at(
        &self,
        fixed_parameters: &FixedParameters,
        j: u32,
        claimed_value: &FieldElement,
    ) -> bool {
        let group = &fixed_parameters.group;
        let lhs = group.g_exp(claimed_value);
        lhs == self.expected_share_key_at(fixed_parameters, j)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod test {
    use super::*;
    use crate::standard_parameters::toy_parameters;

    #[test]
    fn commitments_and_proofs_verify() {
        let fp = toy_parameters();
        let mut csprng = Csprng::new(b"polynomial commitments");
        let base_hash = HValue::generate_random(&mut csprng);

        let secret = SecretPolynomial::generate(&mut csprng, &fp, 3);
        let public = PublicCoefficients::generate(&mut csprng, &base_hash, &fp, 1, &secret);

        assert!(public.verify(&base_hash, &fp).is_ok());
        assert_eq!(public.share_key(), &fp.group.g_exp(secret.constant_term()));
    }

    #[test]
    fn evaluation_matches_commitments() {
        let fp = toy_parameters();
        let mut csprng = Csprng::new(b"polynomial evaluation");
        let base_hash = HValue::generate_random(&mut csprng);

        let secret = SecretPolynomial::generate(&mut csprng, &fp, 3);
        let public = PublicCoefficients::generate(&mut csprng, &base_hash, &fp, 1, &secret);

        for j in 1_u32..5 {
            let value = secret.evaluate(j, &fp);
            assert!(public.verify_evaluation_at(&fp, j, &value));

            let wrong = value.add(&FieldElement::from(1_u32, &fp.field), &fp.field);
            assert!(!public.verify_evaluation_at(&fp, j, &wrong));
        }
    }
}
