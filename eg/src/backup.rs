// Copyright (C) Microsoft Corporation. All rights reserved.

#![deny(clippy::expect_used)]
#![deny(clippy::manual_assert)]
#![deny(clippy::panic)]
#![deny(clippy::unwrap_used)]

//! Key-ceremony backups (C5/C6): trustee `i`'s evaluation `P_i(j)` of its secret polynomial
//! at peer `j`, encrypted under a Diffie-Hellman key shared between `i` and `j` and
//! MAC-tagged, so that only `j` can recover the share and anyone can detect tampering.

use serde::{Deserialize, Serialize};
use util::algebra::{FieldElement, GroupElement};
use util::bitwise::xor;
use util::csprng::Csprng;

use crate::errors::{EgError, EgResult, TrusteeIndex};
use crate::fixed_parameters::FixedParameters;
use crate::hash::{eg_h, eg_hmac, HValue};
use crate::polynomial::{PublicCoefficients, SecretPolynomial};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PartialKeyBackup {
    pub dealer: TrusteeIndex,
    pub recipient: TrusteeIndex,
    pub c0: GroupElement,
    pub c1: HValue,
    pub c2: HValue,
}

fn dh_secret(
    parameter_base_hash: &HValue,
    fixed_parameters: &FixedParameters,
    dealer: TrusteeIndex,
    recipient: TrusteeIndex,
    recipient_public_key: &GroupElement,
    alpha: &GroupElement,
    beta: &GroupElement,
) -> HValue {
    let group = &fixed_parameters.group;
    let mut v = vec![0x11];
    v.extend_from_slice(&dealer.to_be_bytes());
    v.extend_from_slice(&recipient.to_be_bytes());
    v.extend_from_slice(&recipient_public_key.to_be_bytes_left_pad(group));
    v.extend_from_slice(&alpha.to_be_bytes_left_pad(group));
    v.extend_from_slice(&beta.to_be_bytes_left_pad(group));
    eg_h(parameter_base_hash, &v)
}

fn mac_and_encryption_key(dealer: TrusteeIndex, recipient: TrusteeIndex, shared: &HValue) -> (HValue, HValue) {
    let mut context = b"share_encrypt".to_vec();
    context.extend_from_slice(&dealer.to_be_bytes());
    context.extend_from_slice(&recipient.to_be_bytes());

    let mut mac_input = vec![0x01];
    mac_input.extend_from_slice(b"share_enc_keys");
    mac_input.push(0x00);
    mac_input.extend_from_slice(&context);
    mac_input.extend_from_slice(&[0x02, 0x00]);
    let mac_key = eg_hmac(shared, &mac_input);

    let mut enc_input = vec![0x02];
    enc_input.extend_from_slice(b"share_enc_keys");
    enc_input.push(0x00);
    enc_input.extend_from_slice(&context);
    enc_input.extend_from_slice(&[0x02, 0x00]);
    let enc_key = eg_hmac(shared, &enc_input);

    (mac_key, enc_key)
}

fn share_mac(mac_key: &HValue, alpha_bytes: &[u8], c1: &HValue) -> HValue {
    let mut v = alpha_bytes.to_vec();
    v.extend_from_slice(c1.as_bytes());
    eg_hmac(mac_key, &v)
}

impl PartialKeyBackup {
    pub fn create(
        csprng: &mut Csprng,
        parameter_base_hash: &HValue,
        fixed_parameters: &FixedParameters,
        dealer: TrusteeIndex,
        secret: &SecretPolynomial,
        recipient: TrusteeIndex,
        recipient_public_key: &GroupElement,
    ) -> Self {
        let field = &fixed_parameters.field;
        let group = &fixed_parameters.group;

        let share = secret.evaluate(recipient, fixed_parameters);
        let nonce = field.random_field_elem(csprng);

        let alpha = group.g_exp(&nonce);
        let beta = recipient_public_key.exp(&nonce, group);

        let shared = dh_secret(
            parameter_base_hash,
            fixed_parameters,
            dealer,
            recipient,
            recipient_public_key,
            &alpha,
            &beta,
        );
        let (mac_key, enc_key) = mac_and_encryption_key(dealer, recipient, &shared);

        let c1_bytes = xor(&share.to_32_be_bytes(), enc_key.as_bytes());
        #[allow(clippy::unwrap_used)]
        let c1 = HValue::from(<[u8; 32]>::try_from(c1_bytes.as_slice()).unwrap());
        let c2 = share_mac(&mac_key, &alpha.to_be_bytes_left_pad(group), &c1);

        PartialKeyBackup {
            dealer,
            recipient,
            c0: alpha,
            c1,
            c2,
        }
    }

    /// Decrypts the backup and checks it against the dealer's published coefficient
    /// commitments (invariant I5): `g^{P_i(j)} == prod_l K_{i,l}^{j^l}`.
    pub fn open_and_verify(
        &self,
        parameter_base_hash: &HValue,
        fixed_parameters: &FixedParameters,
        recipient_secret: &FieldElement,
        dealer_public_coefficients: &PublicCoefficients,
    ) -> EgResult<FieldElement> {
        if self.dealer != dealer_public_coefficients.trustee {
            return Err(EgError::CeremonyBackupUndecryptable {
                dealer: self.dealer,
                recipient: self.recipient,
                reason: "dealer index mismatch against published coefficients".into(),
            });
        }

        let group = &fixed_parameters.group;
        let field = &fixed_parameters.field;
        let recipient_public_key = group.g_exp(recipient_secret);

        let alpha = &self.c0;
        let beta = alpha.exp(recipient_secret, group);
        let shared = dh_secret(
            parameter_base_hash,
            fixed_parameters,
            self.dealer,
            self.recipient,
            &recipient_public_key,
            alpha,
            &beta,
        );
        let (mac_key, enc_key) = mac_and_encryption_key(self.dealer, self.recipient, &shared);

        let expected_mac = share_mac(&mac_key, &alpha.to_be_bytes_left_pad(group), &self.c1);
        if expected_mac != self.c2 {
            return Err(EgError::CeremonyBackupUndecryptable {
                dealer: self.dealer,
                recipient: self.recipient,
                reason: "MAC does not verify".into(),
            });
        }

        let share_bytes = xor(self.c1.as_bytes(), enc_key.as_bytes());
        let share = FieldElement::from_bytes_be(&share_bytes, field);

        if !dealer_public_coefficients.verify_evaluation_at(fixed_parameters, self.recipient, &share)
        {
            return Err(EgError::CeremonyBackupVerificationFailed {
                dealer: self.dealer,
                recipient: self.recipient,
            });
        }

        Ok(share)
    }
}
