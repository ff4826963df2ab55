// Copyright (C) Microsoft Corporation. All rights reserved.

#![deny(clippy::expect_used)]
#![deny(clippy::manual_assert)]
#![deny(clippy::panic)]
#![deny(clippy::unwrap_used)]

//! Canonical byte encodings (§6 Serialisation): fixed-width big-endian, length-prefixed
//! framing for scalars, group elements, and UTF-8 strings. Tracking codes and ballot crypto
//! hashes are computed over this encoding, not over any transport format (JSON is a
//! projection of it, never the other way around), so any change here changes every hash.

use util::algebra::{FieldElement, Group, GroupElement, ScalarField};

/// Accumulates a length-delimited byte sequence suitable as a hash input. Each `push_*`
/// method frames its argument with a 4-byte big-endian length prefix, so that e.g. an empty
/// trailing field cannot be confused with an absent one.
#[derive(Debug, Default)]
pub struct CanonicalEncoder {
    buf: Vec<u8>,
}

impl CanonicalEncoder {
    pub fn new() -> Self {
        CanonicalEncoder { buf: Vec::new() }
    }

    fn push_framed(&mut self, bytes: &[u8]) {
        self.buf
            .extend_from_slice(&(bytes.len() as u32).to_be_bytes());
        self.buf.extend_from_slice(bytes);
    }

    pub fn push_bytes(&mut self, bytes: &[u8]) -> &mut Self {
        self.push_framed(bytes);
        self
    }

    pub fn push_str(&mut self, s: &str) -> &mut Self {
        self.push_framed(s.as_bytes());
        self
    }

    pub fn push_u32(&mut self, v: u32) -> &mut Self {
        self.push_framed(&v.to_be_bytes());
        self
    }

    pub fn push_u64(&mut self, v: u64) -> &mut Self {
        self.push_framed(&v.to_be_bytes());
        self
    }

    pub fn push_scalar(&mut self, s: &FieldElement, field: &ScalarField) -> &mut Self {
        self.push_framed(&s.to_be_bytes_left_pad(field));
        self
    }

    pub fn push_group_element(&mut self, g: &GroupElement, group: &Group) -> &mut Self {
        self.push_framed(&g.to_be_bytes_left_pad(group));
        self
    }

    pub fn finish(self) -> Vec<u8> {
        self.buf
    }
}
