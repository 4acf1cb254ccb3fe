// This file is part of foreign-field-gadgets.
// SPDX-License-Identifier: Apache-2.0
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
// http://www.apache.org/licenses/LICENSE-2.0

use ff::PrimeField;
use num_bigint::{BigInt, BigUint, Sign};
use num_integer::Integer;
use num_traits::{One, Signed, Zero};

use crate::{
    error::Error,
    types::{LIMB_BITS, NB_LIMBS},
};

/// Returns the modulus of the field `F` as a [`BigUint`].
pub fn modulus<F: PrimeField>() -> BigUint {
    fe_to_big(-F::ONE) + 1u8
}

/// Converts a field element into a [`BigUint`].
pub fn fe_to_big<F: PrimeField>(fe: F) -> BigUint {
    BigUint::from_bytes_le(fe.to_repr().as_ref())
}

/// Converts a [`BigUint`] into a field element, reducing modulo the field size.
pub fn big_to_fe<F: PrimeField>(e: &BigUint) -> F {
    let e = e % modulus::<F>();
    F::from_str_vartime(&e.to_str_radix(10)).expect("decimal digits parse as a field element")
}

/// Converts a field element into a [`BigInt`] in `[0, p)`.
pub fn fe_to_bigint<F: PrimeField>(fe: F) -> BigInt {
    fe_to_big(fe).into()
}

/// Converts a (possibly negative) [`BigInt`] into a field element.
pub fn bigint_to_fe<F: PrimeField>(e: &BigInt) -> F {
    let p: BigInt = modulus::<F>().into();
    let e = e.mod_floor(&p);
    big_to_fe(&e.to_biguint().expect("mod_floor of a positive modulus is non-negative"))
}

/// `2^k` as a field element.
pub fn pow2<F: PrimeField>(k: usize) -> F {
    big_to_fe(&(BigUint::one() << k))
}

/// `2^bits - 1`.
pub fn mask(bits: usize) -> BigUint {
    (BigUint::one() << bits) - 1u8
}

/// The `len` bits of `x` starting at bit `offset` (little-endian).
pub fn bits_slice(x: &BigUint, offset: usize, len: usize) -> BigUint {
    (x >> offset) & mask(len)
}

/// Splits `x < 2^264` into three little-endian 88-bit limbs.
pub fn split_to_limbs(x: &BigUint) -> Result<[BigUint; NB_LIMBS], Error> {
    if x.bits() as usize > NB_LIMBS * LIMB_BITS {
        return Err(Error::range(x, NB_LIMBS * LIMB_BITS));
    }
    Ok([
        bits_slice(x, 0, LIMB_BITS),
        bits_slice(x, LIMB_BITS, LIMB_BITS),
        bits_slice(x, 2 * LIMB_BITS, LIMB_BITS),
    ])
}

/// Splits `x < 2^264` into a compact pair: the low 176 bits and the top limb.
pub fn split_compact(x: &BigUint) -> Result<(BigUint, BigUint), Error> {
    if x.bits() as usize > NB_LIMBS * LIMB_BITS {
        return Err(Error::range(x, NB_LIMBS * LIMB_BITS));
    }
    Ok((
        bits_slice(x, 0, 2 * LIMB_BITS),
        bits_slice(x, 2 * LIMB_BITS, LIMB_BITS),
    ))
}

/// Recomposes three little-endian 88-bit limbs into an integer.
pub fn compose_limbs(limbs: &[BigUint; NB_LIMBS]) -> BigUint {
    limbs
        .iter()
        .rev()
        .fold(BigUint::zero(), |acc, limb| (acc << LIMB_BITS) + limb)
}

/// `2^264 - f`, the negated modulus over the limb capacity.
pub fn neg_modulus(f: &BigUint) -> BigUint {
    (BigUint::one() << (NB_LIMBS * LIMB_BITS)) - f
}

/// Inverse of `x` modulo `f`, if `gcd(x, f) = 1`.
pub fn mod_inverse(x: &BigUint, f: &BigUint) -> Option<BigUint> {
    let f_int = BigInt::from_biguint(Sign::Plus, f.clone());
    let egcd = BigInt::from_biguint(Sign::Plus, x.clone()).extended_gcd(&f_int);
    if !egcd.gcd.is_one() {
        return None;
    }
    let inv = egcd.x.mod_floor(&f_int);
    debug_assert!(!inv.is_negative());
    inv.to_biguint()
}

#[cfg(test)]
mod tests {
    use pasta_curves::Fp;

    use super::*;

    #[test]
    fn limb_split_and_compose() {
        let x = (BigUint::one() << 200u32) + 12345u64;
        let limbs = split_to_limbs(&x).unwrap();
        assert_eq!(limbs[0], BigUint::from(12345u64));
        assert_eq!(limbs[1], BigUint::zero());
        assert_eq!(limbs[2], BigUint::one() << 24u32);
        assert_eq!(compose_limbs(&limbs), x);

        let (lo, hi) = split_compact(&x).unwrap();
        assert_eq!(lo, BigUint::from(12345u64));
        assert_eq!(hi, BigUint::one() << 24u32);
    }

    #[test]
    fn limb_split_rejects_oversized_values() {
        let x = BigUint::one() << 264u32;
        assert!(matches!(
            split_to_limbs(&x),
            Err(Error::RangeViolation { bits: 264, .. })
        ));
    }

    #[test]
    fn field_conversions_roundtrip() {
        let p = modulus::<Fp>();
        let x = &p - 7u8;
        assert_eq!(fe_to_big(big_to_fe::<Fp>(&x)), x);
        assert_eq!(bigint_to_fe::<Fp>(&BigInt::from(-7)), big_to_fe::<Fp>(&x));
    }

    #[test]
    fn modular_inverse() {
        let f = BigUint::from(17u8);
        let inv = mod_inverse(&BigUint::from(10u8), &f).unwrap();
        assert_eq!(inv, BigUint::from(12u8));
        assert!(mod_inverse(&BigUint::from(5u8), &BigUint::from(255u16)).is_none());
    }
}
