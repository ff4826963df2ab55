// Fixed-width hex serialization of `BigUint` for canonical, bit-exact encodings.

use num_bigint::BigUint;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::base16::{biguint_from_str_uppercase_hex_bits, to_string_uppercase_hex_bits};

pub fn biguint_serialize_256_bits<S>(u: &BigUint, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    use serde::ser::Error;
    let s = to_string_uppercase_hex_bits(u, 256).map_err(S::Error::custom)?;
    s.serialize(serializer)
}

pub fn biguint_deserialize_256_bits<'de, D>(deserializer: D) -> Result<BigUint, D::Error>
where
    D: Deserializer<'de>,
{
    use serde::de::Error;
    let s = String::deserialize(deserializer)?;
    biguint_from_str_uppercase_hex_bits(&s, 256).map_err(D::Error::custom)
}

/// Width matching our standard group modulus `p` (3072 bits).
pub fn biguint_serialize_3072_bits<S>(u: &BigUint, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    use serde::ser::Error;
    let s = to_string_uppercase_hex_bits(u, 3072).map_err(S::Error::custom)?;
    s.serialize(serializer)
}

pub fn biguint_deserialize_3072_bits<'de, D>(deserializer: D) -> Result<BigUint, D::Error>
where
    D: Deserializer<'de>,
{
    use serde::de::Error;
    let s = String::deserialize(deserializer)?;
    biguint_from_str_uppercase_hex_bits(&s, 3072).map_err(D::Error::custom)
}
