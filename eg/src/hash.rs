// Copyright (C) Microsoft Corporation. All rights reserved.

#![deny(clippy::expect_used)]
#![deny(clippy::manual_assert)]
#![deny(clippy::panic)]
#![deny(clippy::unwrap_used)]

//! The ElectionGuard-style `H` hash primitive (HMAC-SHA256, the first argument used as the
//! HMAC key) and derivations of it used for Fiat-Shamir challenges, MACs, and hash-chaining.

use digest::{FixedOutput, Update};
use hmac::{Hmac, Mac};
use serde::{Deserialize, Serialize};
use zeroize::{Zeroize, ZeroizeOnDrop};

use util::algebra::{FieldElement, ScalarField};

type HmacSha256 = Hmac<sha2::Sha256>;

pub const HVALUE_BYTE_LEN: usize = 32;
pub type HValueByteArray = [u8; HVALUE_BYTE_LEN];

/// A 256-bit hash output, also used as the HMAC key in `eg_h`'s construction.
#[derive(Default, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Zeroize, ZeroizeOnDrop)]
pub struct HValue(pub HValueByteArray);

impl HValue {
    pub const fn byte_len() -> usize {
        HVALUE_BYTE_LEN
    }

    pub fn generate_random(csprng: &mut util::csprng::Csprng) -> Self {
        let mut buf = [0u8; HVALUE_BYTE_LEN];
        for b in buf.iter_mut() {
            *b = csprng.next_u8();
        }
        HValue(buf)
    }

    pub fn as_bytes(&self) -> &[u8; HVALUE_BYTE_LEN] {
        &self.0
    }
}

impl AsRef<HValue> for HValue {
    fn as_ref(&self) -> &HValue {
        self
    }
}

impl AsRef<[u8]> for HValue {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl From<HValueByteArray> for HValue {
    fn from(value: HValueByteArray) -> Self {
        HValue(value)
    }
}

impl std::fmt::Display for HValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for byte in &self.0 {
            write!(f, "{byte:02X}")?;
        }
        Ok(())
    }
}

impl std::fmt::Debug for HValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        std::fmt::Display::fmt(self, f)
    }
}

impl std::str::FromStr for HValue {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.len() != HVALUE_BYTE_LEN * 2 {
            return Err(format!("expected {} hex chars", HVALUE_BYTE_LEN * 2));
        }
        let mut buf = [0u8; HVALUE_BYTE_LEN];
        for (i, byte) in buf.iter_mut().enumerate() {
            *byte = u8::from_str_radix(&s[i * 2..i * 2 + 2], 16).map_err(|e| e.to_string())?;
        }
        Ok(HValue(buf))
    }
}

impl Serialize for HValue {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        self.to_string().serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for HValue {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        use serde::de::Error;
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(D::Error::custom)
    }
}

/// ElectionGuard `H` hash function: `HMAC-SHA256(key, data)`.
pub fn eg_h<K, D>(key: K, data: D) -> HValue
where
    K: AsRef<HValue>,
    D: AsRef<[u8]>,
{
    #[allow(clippy::unwrap_used)]
    let hmac_sha256 = HmacSha256::new_from_slice(key.as_ref().as_ref()).unwrap();
    let out: [u8; HVALUE_BYTE_LEN] = hmac_sha256
        .chain(data.as_ref())
        .finalize_fixed()
        .as_slice()
        .try_into()
        .unwrap_or([0u8; HVALUE_BYTE_LEN]);
    HValue(out)
}

/// `H_q(key, data) = H(key, data) mod q`, reduced to a field element.
pub fn eg_h_q_as_field_element<K, D>(key: K, data: D, field: &ScalarField) -> FieldElement
where
    K: AsRef<HValue>,
    D: AsRef<[u8]>,
{
    let hv = eg_h(key, data);
    FieldElement::from_bytes_be(hv.as_bytes(), field)
}

/// Same construction as `eg_h`, under a distinct name for use sites that derive symmetric
/// keys/MACs for backup encryption rather than Fiat-Shamir challenges.
pub fn eg_hmac(key: &HValue, data: &[u8]) -> HValue {
    eg_h(key, data)
}
