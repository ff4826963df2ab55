// Copyright (C) Microsoft Corporation. All rights reserved.

#![deny(clippy::expect_used)]
#![deny(clippy::manual_assert)]
#![deny(clippy::panic)]
#![deny(clippy::unwrap_used)]

//! Chaum-Pedersen proof of equality of discrete logs: given two bases `g` and `a` and two
//! values `y = g^x`, `m = a^x`, proves knowledge of the shared exponent `x` without
//! revealing it. C10 uses this to show a decryption share `M = A^{s}` was computed with the
//! same exponent `s` that produced a trustee's public key `y = g^s` (or, for compensated
//! shares, the reconstructed share key `g^{P_l(i)}`).

use serde::{Deserialize, Serialize};

use util::algebra::{FieldElement, GroupElement};
use util::csprng::Csprng;

use crate::errors::{EgError, EgResult};
use crate::fixed_parameters::FixedParameters;
use crate::hash::{eg_h, HValue};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChaumPedersenProof {
    challenge: FieldElement,
    response: FieldElement,
}

fn challenge(
    base_hash: &HValue,
    fixed_parameters: &FixedParameters,
    g: &GroupElement,
    y: &GroupElement,
    a: &GroupElement,
    m: &GroupElement,
    commit_a: &GroupElement,
    commit_b: &GroupElement,
) -> FieldElement {
    let group = &fixed_parameters.group;
    let field = &fixed_parameters.field;

    let mut v = vec![0x22];
    for elem in [g, y, a, m, commit_a, commit_b] {
        v.extend_from_slice(&elem.to_be_bytes_left_pad(group));
    }
    let c = eg_h(base_hash, &v);
    FieldElement::from_bytes_be(c.as_bytes(), field)
}

impl ChaumPedersenProof {
    /// `x` is the shared exponent such that `y = g^x` and `m = a^x`.
    pub fn new(
        csprng: &mut Csprng,
        base_hash: &HValue,
        fixed_parameters: &FixedParameters,
        g: &GroupElement,
        y: &GroupElement,
        a: &GroupElement,
        m: &GroupElement,
        x: &FieldElement,
    ) -> Self {
        let field = &fixed_parameters.field;
        let group = &fixed_parameters.group;

        let u = field.random_field_elem(csprng);
        let commit_a = g.exp(&u, group);
        let commit_b = a.exp(&u, group);

        let c = challenge(base_hash, fixed_parameters, g, y, a, m, &commit_a, &commit_b);
        let response = u.sub(&c.mul(x, field), field);

        ChaumPedersenProof {
            challenge: c,
            response,
        }
    }

    pub fn verify(
        &self,
        base_hash: &HValue,
        fixed_parameters: &FixedParameters,
        g: &GroupElement,
        y: &GroupElement,
        a: &GroupElement,
        m: &GroupElement,
    ) -> EgResult<()> {
        let field = &fixed_parameters.field;
        let group = &fixed_parameters.group;

        if !self.challenge.is_valid(field) || !self.response.is_valid(field) {
            return Err(EgError::OutOfRange(
                "chaum-pedersen proof value out of field".into(),
            ));
        }
        if !y.is_valid(group) || !m.is_valid(group) {
            return Err(EgError::InvalidGroupElement(
                "chaum-pedersen proof operand not in subgroup".into(),
            ));
        }

        let commit_a = g.exp(&self.response, group).mul(&y.exp(&self.challenge, group), group);
        let commit_b = a.exp(&self.response, group).mul(&m.exp(&self.challenge, group), group);

        let expected = challenge(base_hash, fixed_parameters, g, y, a, m, &commit_a, &commit_b);
        if expected != self.challenge {
            return Err(EgError::ProofInvalid {
                statement: "chaum-pedersen equality of discrete logs".into(),
            });
        }
        Ok(())
    }
}
