// Copyright (C) Microsoft Corporation. All rights reserved.

#![deny(clippy::expect_used)]
#![deny(clippy::manual_assert)]
#![deny(clippy::panic)]
#![deny(clippy::unwrap_used)]

//! Group arithmetic and hashing (C1): the fixed field/group parameters shared by every
//! operation in the engine.

use serde::{Deserialize, Serialize};
use util::{
    algebra::{Group, ScalarField},
    algebra_utils::{cnt_bits_repr, leading_ones},
    csprng::Csprng,
};

use crate::errors::{EgError, EgResult};

/// Describes the bit-length shape a set of fixed parameters was generated to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FixedParameterGenerationParameters {
    pub q_bits_total: usize,
    pub p_bits_total: usize,
    pub p_bits_msb_fixed_1: usize,
    pub p_bits_lsb_fixed_1: usize,
}

/// The field `Z_q` and group `Z_p^r` of order `q` modulo `p`, with generator `g`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FixedParameters {
    pub generation_parameters: FixedParameterGenerationParameters,
    pub field: ScalarField,
    pub group: Group,
}

impl FixedParameters {
    /// Basic validity requirements: both primality, matching orders, and the expected
    /// bit-length shape. Expensive; call once per election, not per operation.
    pub fn validate(&self, csprng: &mut Csprng) -> EgResult<()> {
        let field = &self.field;
        let group = &self.group;

        if !field.is_valid(csprng) {
            return Err(EgError::InvalidGroupElement(
                "field order q is not prime".into(),
            ));
        }
        if !group.is_valid(csprng) {
            return Err(EgError::InvalidGroupElement("group is invalid".into()));
        }
        if !group.matches_field(field) {
            return Err(EgError::InvalidGroupElement(
                "group and field orders differ".into(),
            ));
        }

        if cnt_bits_repr(&field.order()) != self.generation_parameters.q_bits_total {
            return Err(EgError::ConfigInvalidManifest(
                "q has the wrong number of bits".into(),
            ));
        }
        if cnt_bits_repr(&group.modulus()) != self.generation_parameters.p_bits_total {
            return Err(EgError::ConfigInvalidManifest(
                "p has the wrong number of bits".into(),
            ));
        }

        let leading = leading_ones(group.modulus().clone()) as usize;
        if leading < self.generation_parameters.p_bits_msb_fixed_1 {
            return Err(EgError::ConfigInvalidManifest(
                "p does not have the required leading ones".into(),
            ));
        }
        let trailing = group.modulus().trailing_ones() as usize;
        if trailing < self.generation_parameters.p_bits_lsb_fixed_1 {
            return Err(EgError::ConfigInvalidManifest(
                "p does not have the required trailing ones".into(),
            ));
        }

        Ok(())
    }
}
