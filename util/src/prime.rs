// Copyright (C) Microsoft Corporation. All rights reserved.

#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![deny(clippy::panic)]
#![deny(clippy::manual_assert)]

use std::borrow::Borrow;
use std::cmp::Ordering;
use std::num::NonZeroUsize;

use num_bigint::BigUint;
use num_integer::Integer;
use num_traits::{One, Zero};

use crate::csprng::Csprng;

pub const PRIMES_TABLE_U8: [u8; 54] = [
    2, 3, 5, 7, 11, 13, 17, 19, 23, 29, 31, 37, 41, 43, 47, 53, 59, 61, 67, 71, 73, 79, 83, 89, 97,
    101, 103, 107, 109, 113, 127, 131, 137, 139, 149, 151, 157, 163, 167, 173, 179, 181, 191, 193,
    197, 199, 211, 223, 227, 229, 233, 239, 241, 251,
];

/// The log_2 of the largest number for which we'll do exhaustive trial division.
const EXHAUSTIVE_TRIAL_DIVISION_MAX_L2: u8 = 20;

/// The number of Miller-Rabin iterations to perform for a probabilistic primality test.
pub const MILLER_RABIN_ITERATIONS: usize = 50;

/// Primality test. Numbers with bit-length above [`EXHAUSTIVE_TRIAL_DIVISION_MAX_L2`] are tested
/// probabilistically with [`MILLER_RABIN_ITERATIONS`] rounds of Miller-Rabin.
///
/// Calling this on very large numbers is expensive; callers that validate the same fixed
/// parameters repeatedly should cache the result.
pub fn is_prime<T: Borrow<BigUint>>(n: &T, csprng: &mut Csprng) -> bool {
    let n = n.borrow();

    let n_low_u32 = n.iter_u32_digits().next().unwrap_or_default();

    match n.bits() {
        0..=1 => false,
        2 => true,
        n_bits => {
            if n_low_u32 % 2 == 0 {
                false
            } else {
                match n_bits {
                    0..=8 => {
                        let n_u8 = n_low_u32 as u8;
                        let mut found = false;
                        for p in PRIMES_TABLE_U8 {
                            match n_u8.cmp(&p) {
                                Ordering::Less => break,
                                Ordering::Equal => {
                                    found = true;
                                    break;
                                }
                                _ => {}
                            }
                        }
                        found
                    }
                    9..=32 if n_bits <= EXHAUSTIVE_TRIAL_DIVISION_MAX_L2 as u64 => {
                        use num_integer::Roots;
                        let n = n_low_u32;
                        let n_sqrt = n.sqrt();
                        let mut found = true;
                        for p in (3_u32..=n_sqrt).step_by(2) {
                            if n % p == 0 {
                                found = false;
                                break;
                            }
                        }
                        found
                    }
                    _ => miller_rabin(n, MILLER_RABIN_ITERATIONS, csprng),
                }
            }
        }
    }
}

fn miller_rabin(w: &BigUint, iterations: usize, csprng: &mut Csprng) -> bool {
    // NIST FIPS 186-5, Appendix B.3.1 Miller-Rabin Probabilistic Primality Test.
    assert!(w.is_odd(), "requires w odd");
    assert!(!w.is_one(), "requires 3 <= w");
    assert!(iterations > 0);

    let w_minus_1: BigUint = w - 1_u8;
    let a = largest_integer_a_such_that_2_to_a_divides_even_n(&w_minus_1);
    let m = &w_minus_1 >> a;

    #[allow(clippy::unwrap_used)]
    let wlen: NonZeroUsize = NonZeroUsize::new(w.bits() as usize).unwrap();

    let two = BigUint::from(2_u8);

    'for_i: for _i in 0..iterations {
        let b = loop {
            let b = csprng.next_biguint(wlen);
            if !(b.is_zero() || b.is_one() || b >= w_minus_1) {
                break b;
            }
        };

        let mut z = b.modpow(&m, w);

        if z.is_one() || z == w_minus_1 {
            continue 'for_i;
        }

        for _j in 1..a {
            z = z.modpow(&two, w);
            if z == w_minus_1 {
                continue 'for_i;
            }
            if z.is_one() {
                break;
            }
        }

        return false;
    }

    true
}

fn largest_integer_a_such_that_2_to_a_divides_even_n(n: &BigUint) -> u64 {
    assert!(n.is_even(), "requires n even");
    assert!(!n.is_zero(), "requires n > 1");
    #[allow(clippy::unwrap_used)]
    n.trailing_zeros().unwrap()
}
