// Copyright (C) Microsoft Corporation. All rights reserved.

#![deny(clippy::expect_used)]
#![deny(clippy::manual_assert)]
#![deny(clippy::panic)]
#![deny(clippy::unwrap_used)]

//! Schnorr proof of knowledge of discrete log, used by C5 to prove possession of each secret
//! polynomial coefficient without revealing it.

use serde::{Deserialize, Serialize};

use util::algebra::{FieldElement, GroupElement};
use util::csprng::Csprng;

use crate::errors::{EgError, EgResult};
use crate::fixed_parameters::FixedParameters;
use crate::hash::{eg_h, HValue};

/// `(challenge, response)` proving knowledge of `x` such that `commitment = g^x`, bound to
/// `(trustee, coefficient_index)` so a proof cannot be replayed against a different slot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchnorrProof {
    pub challenge: HValue,
    pub response: FieldElement,
}

fn challenge(
    parameter_base_hash: &HValue,
    trustee: u32,
    coefficient_index: u32,
    commitment: &GroupElement,
    commit_message: &GroupElement,
    fixed_parameters: &FixedParameters,
) -> HValue {
    let group = &fixed_parameters.group;
    let mut v = vec![0x10];
    v.extend_from_slice(&trustee.to_be_bytes());
    v.extend_from_slice(&coefficient_index.to_be_bytes());
    v.extend_from_slice(&commitment.to_be_bytes_left_pad(group));
    v.extend_from_slice(&commit_message.to_be_bytes_left_pad(group));
    eg_h(parameter_base_hash, &v)
}

impl SchnorrProof {
    pub fn new(
        csprng: &mut Csprng,
        parameter_base_hash: &HValue,
        fixed_parameters: &FixedParameters,
        trustee: u32,
        coefficient_index: u32,
        secret: &FieldElement,
        commitment: &GroupElement,
    ) -> Self {
        let field = &fixed_parameters.field;
        let u = field.random_field_elem(csprng);
        let commit_message = fixed_parameters.group.g_exp(&u);
        let c = challenge(
            parameter_base_hash,
            trustee,
            coefficient_index,
            commitment,
            &commit_message,
            fixed_parameters,
        );
        let c_val = FieldElement::from_bytes_be(c.as_bytes(), field);
        let response = u.sub(&c_val.mul(secret, field), field);
        SchnorrProof {
            challenge: c,
            response,
        }
    }

    pub fn verify(
        &self,
        parameter_base_hash: &HValue,
        fixed_parameters: &FixedParameters,
        trustee: u32,
        coefficient_index: u32,
        commitment: &GroupElement,
    ) -> EgResult<()> {
        let group = &fixed_parameters.group;
        let field = &fixed_parameters.field;

        if !commitment.is_valid(group) {
            return Err(EgError::InvalidGroupElement(
                "coefficient commitment is not a valid group element".into(),
            ));
        }
        if !self.response.is_valid(field) {
            return Err(EgError::OutOfRange(
                "schnorr proof response is not a valid field element".into(),
            ));
        }

        let c_val = FieldElement::from_bytes_be(self.challenge.as_bytes(), field);
        let commit_message = group
            .g_exp(&self.response)
            .mul(&commitment.exp(&c_val, group), group);

        let expected = challenge(
            parameter_base_hash,
            trustee,
            coefficient_index,
            commitment,
            &commit_message,
            fixed_parameters,
        );
        if self.challenge != expected {
            return Err(EgError::ProofInvalid {
                statement: format!(
                    "schnorr proof for trustee {trustee} coefficient {coefficient_index}"
                ),
            });
        }
        Ok(())
    }
}
