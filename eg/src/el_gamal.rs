// Copyright (C) Microsoft Corporation. All rights reserved.

#![deny(clippy::expect_used)]
#![deny(clippy::manual_assert)]
#![deny(clippy::panic)]
#![deny(clippy::unwrap_used)]

//! ElGamal encryption (C2) over the prime-order subgroup: keygen, `encrypt`, the two
//! decryption paths (`decrypt_known_secret` consults C4; `decrypt_with_shares` is driven by
//! C10), and homomorphic addition.

use serde::{Deserialize, Serialize};

use util::algebra::{FieldElement, Group, GroupElement, ScalarField};
use util::csprng::Csprng;

use crate::errors::{EgError, EgResult};
use crate::fixed_parameters::FixedParameters;

/// A published trustee/joint share-key `y = g^x`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ElGamalPublicKey(pub GroupElement);

impl ElGamalPublicKey {
    pub fn as_group_element(&self) -> &GroupElement {
        &self.0
    }
}

/// A secret key `x`. Not `Clone`: ownership of secret key material should stay with exactly
/// one logical trustee process, never duplicated across threads (§5).
#[derive(Debug)]
pub struct ElGamalSecretKey(pub FieldElement);

impl ElGamalSecretKey {
    pub fn generate(csprng: &mut Csprng, fixed_parameters: &FixedParameters) -> Self {
        ElGamalSecretKey(fixed_parameters.field.random_field_elem(csprng))
    }

    pub fn public_key(&self, fixed_parameters: &FixedParameters) -> ElGamalPublicKey {
        ElGamalPublicKey(fixed_parameters.group.g_exp(&self.0))
    }
}

/// `(pad, data) = (g^r, K^r . g^m)`, an encryption of plaintext `m` under nonce `r`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ElGamalCiphertext {
    pub pad: GroupElement,
    pub data: GroupElement,
}

impl ElGamalCiphertext {
    /// The multiplicative identity of the homomorphic monoid: encrypts 0 under nonce 0.
    pub fn identity() -> Self {
        ElGamalCiphertext {
            pad: Group::one(),
            data: Group::one(),
        }
    }

    /// Homomorphic addition: component-wise product. The nonce of the sum is the sum of the
    /// nonces, which C9 exploits when folding ballots into a running tally.
    pub fn homomorphic_add(&self, other: &ElGamalCiphertext, group: &Group) -> Self {
        ElGamalCiphertext {
            pad: self.pad.mul(&other.pad, group),
            data: self.data.mul(&other.data, group),
        }
    }

    /// Scales both components by a public exponent (used to re-derive an aggregate nonce
    /// alongside a homomorphically-summed ciphertext).
    pub fn scale(&self, factor: &FieldElement, group: &Group) -> Self {
        ElGamalCiphertext {
            pad: self.pad.exp(factor, group),
            data: self.data.exp(factor, group),
        }
    }
}

/// Encrypts `m` (as a non-negative integer exponent) under `K` with nonce `r`. `r = 0` is
/// rejected: it would reveal the ciphertext is un-blinded.
pub fn encrypt(
    m: &FieldElement,
    r: &FieldElement,
    public_key: &ElGamalPublicKey,
    fixed_parameters: &FixedParameters,
) -> EgResult<ElGamalCiphertext> {
    if *r == ScalarField::zero() {
        return Err(EgError::OutOfRange("ElGamal nonce r must not be 0".into()));
    }

    let group = &fixed_parameters.group;
    let pad = group.g_exp(r);
    let k_to_r = public_key.0.exp(r, group);
    let g_to_m = group.g_exp(m);
    let data = k_to_r.mul(&g_to_m, group);

    Ok(ElGamalCiphertext { pad, data })
}

/// `decrypt_known_secret((a,b), s) = b . a^{-s}`, recovering `g^m`. The caller is responsible
/// for inverting `g^m -> m` via C4.
pub fn decrypt_to_group_element(
    ciphertext: &ElGamalCiphertext,
    secret_key: &ElGamalSecretKey,
    fixed_parameters: &FixedParameters,
) -> EgResult<GroupElement> {
    let group = &fixed_parameters.group;
    let a_to_s = ciphertext.pad.exp(&secret_key.0, group);
    let a_to_minus_s = a_to_s
        .inv(group)
        .ok_or_else(|| EgError::InvalidGroupElement("a^s has no inverse".into()))?;
    Ok(ciphertext.data.mul(&a_to_minus_s, group))
}

/// `decrypt_with_shares((a,b), {M_i, lambda_i}) = b . (prod M_i^{lambda_i})^{-1}`, recovering
/// `g^m`. `combined_shares` is `prod M_i^{lambda_i}`, already combined by C10.
pub fn decrypt_with_combined_shares(
    ciphertext: &ElGamalCiphertext,
    combined_shares: &GroupElement,
    group: &Group,
) -> EgResult<GroupElement> {
    let inv = combined_shares
        .inv(group)
        .ok_or_else(|| EgError::InvalidGroupElement("combined share has no inverse".into()))?;
    Ok(ciphertext.data.mul(&inv, group))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod test {
    use super::*;
    use crate::standard_parameters::toy_parameters;

    #[test]
    fn encrypt_decrypt_round_trip() {
        let fp = toy_parameters();
        let mut csprng = Csprng::new(b"el_gamal round trip");

        let sk = ElGamalSecretKey::generate(&mut csprng, &fp);
        let pk = sk.public_key(&fp);

        for m_val in 0_u32..5 {
            let m = FieldElement::from(m_val, &fp.field);
            let r = fp.field.random_field_elem(&mut csprng);
            let ct = encrypt(&m, &r, &pk, &fp).unwrap();

            let recovered = decrypt_to_group_element(&ct, &sk, &fp).unwrap();
            assert_eq!(recovered, fp.group.g_exp(&m));
        }
    }

    #[test]
    fn rejects_zero_nonce() {
        let fp = toy_parameters();
        let mut csprng = Csprng::new(b"el_gamal zero nonce");
        let sk = ElGamalSecretKey::generate(&mut csprng, &fp);
        let pk = sk.public_key(&fp);
        let m = FieldElement::from(1_u32, &fp.field);
        let r = ScalarField::zero();
        assert!(encrypt(&m, &r, &pk, &fp).is_err());
    }

    #[test]
    fn homomorphic_add_sums_plaintexts() {
        let fp = toy_parameters();
        let mut csprng = Csprng::new(b"el_gamal homomorphic");
        let sk = ElGamalSecretKey::generate(&mut csprng, &fp);
        let pk = sk.public_key(&fp);

        let m1 = FieldElement::from(2_u32, &fp.field);
        let m2 = FieldElement::from(3_u32, &fp.field);
        let r1 = fp.field.random_field_elem(&mut csprng);
        let r2 = fp.field.random_field_elem(&mut csprng);

        let ct1 = encrypt(&m1, &r1, &pk, &fp).unwrap();
        let ct2 = encrypt(&m2, &r2, &pk, &fp).unwrap();
        let sum_ct = ct1.homomorphic_add(&ct2, &fp.group);

        let recovered = decrypt_to_group_element(&sum_ct, &sk, &fp).unwrap();
        assert_eq!(recovered, fp.group.g_exp(&FieldElement::from(5_u32, &fp.field)));
    }
}
