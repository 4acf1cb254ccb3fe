// This file is part of foreign-field-gadgets.
// SPDX-License-Identifier: Apache-2.0
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
// http://www.apache.org/licenses/LICENSE-2.0

//! Division with remainder by `2^32` and `2^64`, and the modular additions
//! built on it.

use ff::PrimeField;

use crate::{
    circuit::CircuitBuilder,
    error::Error,
    range_check::{range_check32, range_check64, range_check_n},
    types::AssignedNative,
    utils::{big_to_fe, bits_slice, fe_to_big, pow2},
};

fn div_mod_word<F: PrimeField>(
    cx: &mut CircuitBuilder<F>,
    n: &AssignedNative<F>,
    word_bits: usize,
    quotient_bits: usize,
) -> Result<(AssignedNative<F>, AssignedNative<F>), Error> {
    assert!(
        quotient_bits > 0 && quotient_bits % 16 == 0 && quotient_bits <= 224,
        "quotient width must be a positive multiple of 16 up to 224, got {quotient_bits}"
    );
    let total = word_bits + quotient_bits;
    if let Some(c) = n.as_constant() {
        let v = fe_to_big(c);
        if v.bits() as usize > total {
            return Err(Error::range(&v, total));
        }
        return Ok((
            AssignedNative::Constant(big_to_fe(&(&v >> word_bits))),
            AssignedNative::Constant(big_to_fe(&bits_slice(&v, 0, word_bits))),
        ));
    }
    let [quotient, remainder] = cx.exists(|w| {
        let v = w.big(n);
        if v.bits() as usize > total {
            return Err(Error::range(&v, total));
        }
        Ok([
            big_to_fe(&(&v >> word_bits)),
            big_to_fe(&bits_slice(&v, 0, word_bits)),
        ])
    })?;
    range_check_n(cx, &quotient, quotient_bits)?;
    match word_bits {
        32 => range_check32(cx, &remainder)?,
        64 => range_check64(cx, &remainder)?,
        _ => unreachable!("word size is fixed by the callers"),
    }
    // n = quotient * 2^word_bits + remainder
    let recomposed = cx.linear_combination(
        &[(pow2(word_bits), quotient), (F::ONE, remainder)],
        F::ZERO,
    )?;
    cx.assert_equal(&recomposed, n)?;
    Ok((quotient, remainder))
}

/// Splits `n < 2^(32 + quotient_bits)` into `n = q * 2^32 + r` with
/// `r < 2^32` and `q` checked to `quotient_bits` bits.
pub fn div_mod_32<F: PrimeField>(
    cx: &mut CircuitBuilder<F>,
    n: &AssignedNative<F>,
    quotient_bits: usize,
) -> Result<(AssignedNative<F>, AssignedNative<F>), Error> {
    div_mod_word(cx, n, 32, quotient_bits)
}

/// Splits `n < 2^(64 + quotient_bits)` into `n = q * 2^64 + r` with
/// `r < 2^64` and `q` checked to `quotient_bits` bits.
pub fn div_mod_64<F: PrimeField>(
    cx: &mut CircuitBuilder<F>,
    n: &AssignedNative<F>,
    quotient_bits: usize,
) -> Result<(AssignedNative<F>, AssignedNative<F>), Error> {
    div_mod_word(cx, n, 64, quotient_bits)
}

/// `(a + b) mod 2^32` for 32-bit operands. The carry fits in one bit, so
/// the quotient is checked to the minimal 16-bit width.
pub fn add_mod_32<F: PrimeField>(
    cx: &mut CircuitBuilder<F>,
    a: &AssignedNative<F>,
    b: &AssignedNative<F>,
) -> Result<AssignedNative<F>, Error> {
    let sum = cx.add(a, b)?;
    let (_, r) = div_mod_word(cx, &sum, 32, 16)?;
    Ok(r)
}

/// `(a + b) mod 2^64` for 64-bit operands.
pub fn add_mod_64<F: PrimeField>(
    cx: &mut CircuitBuilder<F>,
    a: &AssignedNative<F>,
    b: &AssignedNative<F>,
) -> Result<AssignedNative<F>, Error> {
    let sum = cx.add(a, b)?;
    let (_, r) = div_mod_word(cx, &sum, 64, 16)?;
    Ok(r)
}

#[cfg(test)]
mod tests {
    use ff::Field;
    use pasta_curves::Fp;

    use super::*;

    fn witness_u64(cx: &mut CircuitBuilder<Fp>, v: u64) -> AssignedNative<Fp> {
        let v = Fp::from(v);
        let [x] = cx.exists(|_| Ok([v])).unwrap();
        x
    }

    #[test]
    fn div_mod_32_splits() {
        let mut cx = CircuitBuilder::<Fp>::prove();
        let n = witness_u64(&mut cx, (1u64 << 32) + 8);
        let (q, r) = div_mod_32(&mut cx, &n, 32).unwrap();
        assert_eq!(cx.value(&q).unwrap(), Fp::ONE);
        assert_eq!(cx.value(&r).unwrap(), Fp::from(8u64));
    }

    #[test]
    fn div_mod_rejects_oversized_input() {
        let mut cx = CircuitBuilder::<Fp>::prove();
        let n = witness_u64(&mut cx, 1u64 << 50);
        assert!(matches!(
            div_mod_32(&mut cx, &n, 16),
            Err(Error::RangeViolation { bits: 48, .. })
        ));
    }

    #[test]
    fn modular_word_additions() {
        let mut cx = CircuitBuilder::<Fp>::prove();
        let a32 = witness_u64(&mut cx, u32::MAX as u64);
        let b32 = witness_u64(&mut cx, 5);
        let r = add_mod_32(&mut cx, &a32, &b32).unwrap();
        assert_eq!(cx.value(&r).unwrap(), Fp::from(4u64));

        let a64 = witness_u64(&mut cx, u64::MAX);
        let b64 = witness_u64(&mut cx, 7);
        let r = add_mod_64(&mut cx, &a64, &b64).unwrap();
        assert_eq!(cx.value(&r).unwrap(), Fp::from(6u64));
    }

    #[test]
    fn constants_fold() {
        let mut cx = CircuitBuilder::<Fp>::prove();
        let n = AssignedNative::Constant(Fp::from((3u64 << 32) + 9));
        let (q, r) = div_mod_32(&mut cx, &n, 16).unwrap();
        assert_eq!(q, AssignedNative::Constant(Fp::from(3u64)));
        assert_eq!(r, AssignedNative::Constant(Fp::from(9u64)));
        assert_eq!(cx.gate_count(), 0);
    }
}
