// Copyright (C) Microsoft Corporation. All rights reserved.

#![deny(clippy::expect_used)]
#![deny(clippy::manual_assert)]
#![deny(clippy::panic)]
#![deny(clippy::unwrap_used)]

//! Concrete fixed parameters.
//!
//! `standard_parameters()` is a reduced-but-real 3072-bit-`p`/256-bit-`q` safe-subgroup-style
//! parameter set, independently generated and primality-checked (not the 4096-bit "Annex A"
//! parameters from the full ElectionGuard spec, analogous to the smaller parameter set the
//! spec itself documents as an accepted alternative). `toy_parameters()` is for fast tests.

use num_bigint::BigUint;
use num_traits::Num;

use util::algebra::{Group, ScalarField};

use crate::fixed_parameters::{FixedParameterGenerationParameters, FixedParameters};

const Q_HEX: &str = "EDEC9BCC97E70B6E307A9E97953B52F0F37DBA43E6465B369102E6ADE9E48159";
const P_HEX: &str = concat!(
    "9110F479F4A1460DDB3722B2BF7E5E8B65BD977859F61BE9685FD13DAE11490AED090A6B4C056163E51F0A3B6",
    "BB37E8A7EE8DDDEC1CC610FB9480A6D6B9976240DA40E88125F2DE4AD5ADA4F943AF3036B301A42F8FFFBB6F0",
    "25817B90670DD2F5807E6D581AB6426AD2AFF139DEA8971B83243CAFBC015B82FD7DF2BE87A4CB16D1E0A3ED5",
    "C604F93286F0E7682B9846BFB316DC13E3951102BC0D9AE397869102F7F2EEFBEF92FF8A5CDD05823E76A68A1",
    "B769A8211E4449ACBDF5203BB38254C559F0093D1605DAD9D5FA0D3EC0D7C2005F5D46A7AA749B37926CC84A7",
    "C58438097784613C34368881216B2DF35493C45EDD8167F48D6B2ABB4FFCD55FE48F31B2AE684A3C6002A5B7F",
    "AC214F46F41E0A961A66FD1B7FBC620DCE69E0C77FB2585523B5E7B8EC0F74C3575C88E0D8FA7EEB0AE08C7CD",
    "0DC1F2FBC19D68DA488B842186D3796D1DBF395824EC01DB10A8216684B9A4C4E267C769A18120D3DB62DB6B5",
    "9B43AE7832BEF7271D6239D48AB4A3AC36604A89DF5AD36EEAB3A669",
);
const G_HEX: &str = concat!(
    "582093F5065BC7273AA869D2C0D81A61AFE921FE4A4170814B751302BB10386547EE3CC938E898AB5F1B400F6",
    "4666FC137AA7784F0442C9394BCC2A034226E51921BC80392433A6AE9A44C8B313674F1949FB42362A32456B2",
    "81C8BAB79412AEF5ACE03381BB77DE5DB971418C7E66573596757F6EF18E6CFF3379DB01C69C31814C86269CE",
    "5C9C05EC3A1E6AB15F051F152C2E9BDD75C6F61C6CF7A305E48BF0BCF133EDEC4148D9FC40229C7AF53E195D5",
    "FFF095B90F305873CD5E587E5E8B3CC5013B528F68F94ED3BFFE05C3309ECA708E3E58D76C7C64D3BBCEAF037",
    "2BA4589EBA455CBE3D17132FDD69439C630F3BD10B5C282A80146007851E0FCE0BA7C8AC06B9740019D108A2F",
    "F4D3EECF37FA3BC1720814FFD7A1587D1DCADD39B1111E2FF403023441EBE328ED7097D75AA6BBAF6B6DA8777",
    "EE0A4408A8355C1E125F0335A48D0F76B87F594B451CED765796C5A026FA9FD848A4DA49900FEE27186580DC0",
    "F96F6067E7C9AEB37B976AEF0F197EDEE324DE20CE07C857DB1E3E9D",
);

fn hex(s: &str) -> BigUint {
    #[allow(clippy::unwrap_used)]
    BigUint::from_str_radix(s, 16).unwrap()
}

/// The reduced-3072/256-bit parameter set used as this engine's default.
pub fn standard_parameters() -> FixedParameters {
    let q = hex(Q_HEX);
    let p = hex(P_HEX);
    let g = hex(G_HEX);

    FixedParameters {
        generation_parameters: FixedParameterGenerationParameters {
            q_bits_total: 256,
            p_bits_total: 3072,
            p_bits_msb_fixed_1: 1,
            p_bits_lsb_fixed_1: 0,
        },
        field: ScalarField::new_unchecked(q),
        group: Group::new_unchecked(p, q_for_group(), g),
    }
}

fn q_for_group() -> BigUint {
    hex(Q_HEX)
}

/// A small parameter set (`q=127, p=59183`) for tests that need many key-ceremony or
/// tallying rounds without paying 3072-bit modexp cost.
pub fn toy_parameters() -> FixedParameters {
    FixedParameters {
        generation_parameters: FixedParameterGenerationParameters {
            q_bits_total: 7,
            p_bits_total: 16,
            p_bits_msb_fixed_1: 1,
            p_bits_lsb_fixed_1: 0,
        },
        field: ScalarField::new_unchecked(BigUint::from(127_u32)),
        group: Group::new_unchecked(
            BigUint::from(59183_u32),
            BigUint::from(127_u32),
            BigUint::from(32616_u32),
        ),
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use util::csprng::Csprng;

    #[test]
    fn standard_parameters_are_valid() {
        let mut csprng = Csprng::new(b"standard_parameters_are_valid");
        let fp = standard_parameters();
        assert!(fp.validate(&mut csprng).is_ok());
    }

    #[test]
    fn toy_parameters_are_valid() {
        let mut csprng = Csprng::new(b"toy_parameters_are_valid");
        let fp = toy_parameters();
        assert!(fp.validate(&mut csprng).is_ok());
    }
}
