// This file is part of foreign-field-gadgets.
// SPDX-License-Identifier: Apache-2.0
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
// http://www.apache.org/licenses/LICENSE-2.0

//! Range-check gadgets.
//!
//! The workhorse is the 88-bit row: a value is decomposed into eight 2-bit
//! crumbs and up to six 12-bit limbs, little-endian. Three such rows plus a
//! padding row check a full limbed element. Narrow widths (multiples of 16)
//! ride on the 16-bit xor row instead, which proves its nibbles are 4 bits
//! wide.
//!
//! Checks on constants never record gates; the bound is verified directly
//! and an out-of-range constant fails in both modes.

use ff::PrimeField;

use crate::{
    circuit::{CircuitBuilder, Gate},
    error::Error,
    types::{AssignedNative, Field3, LIMB_BITS},
    utils::{big_to_fe, bits_slice, fe_to_big, pow2},
};

fn constant_fits<F: PrimeField>(c: F, bits: usize) -> Result<(), Error> {
    let big = fe_to_big(c);
    if big.bits() as usize > bits {
        return Err(Error::range(&big, bits));
    }
    Ok(())
}

/// One 88-bit decomposition row checking `x < 2^(16 + 12 * nb_limbs12)`.
fn range_check0_row<F: PrimeField>(
    cx: &mut CircuitBuilder<F>,
    x: &AssignedNative<F>,
    nb_limbs12: usize,
) -> Result<(), Error> {
    let bits = 16 + 12 * nb_limbs12;
    if let Some(c) = x.as_constant() {
        return constant_fits(c, bits);
    }
    let pieces = cx.exists_vec(8 + nb_limbs12, |w| {
        let v = w.big(x);
        if v.bits() as usize > bits {
            return Err(Error::range(&v, bits));
        }
        let mut out = Vec::with_capacity(8 + nb_limbs12);
        for j in 0..8 {
            out.push(big_to_fe(&bits_slice(&v, 2 * j, 2)));
        }
        for i in 0..nb_limbs12 {
            out.push(big_to_fe(&bits_slice(&v, 16 + 12 * i, 12)));
        }
        Ok(out)
    })?;
    let crumbs: [AssignedNative<F>; 8] =
        pieces[..8].try_into().expect("eight crumbs were allocated");
    let mut limbs = [AssignedNative::zero(); 6];
    limbs[..nb_limbs12].copy_from_slice(&pieces[8..]);
    cx.emit(Gate::RangeCheck0 { value: *x, crumbs, limbs })
}

/// Checks `x < 2^64`.
pub fn range_check64<F: PrimeField>(
    cx: &mut CircuitBuilder<F>,
    x: &AssignedNative<F>,
) -> Result<(), Error> {
    range_check0_row(cx, x, 4)
}

/// Checks `x < 2^88`, the width of one limb.
pub(crate) fn range_check88<F: PrimeField>(
    cx: &mut CircuitBuilder<F>,
    x: &AssignedNative<F>,
) -> Result<(), Error> {
    range_check0_row(cx, x, 6)
}

/// Checks all three limbs of `x` to 88 bits.
pub fn multi_range_check<F: PrimeField>(
    cx: &mut CircuitBuilder<F>,
    x: &Field3<F>,
) -> Result<(), Error> {
    let symbolic = x.limbs().iter().any(|l| l.as_constant().is_none());
    for limb in x.limbs() {
        range_check88(cx, limb)?;
    }
    if symbolic {
        cx.emit(Gate::Zero)?;
    }
    Ok(())
}

/// Splits `compact < 2^176` into two 88-bit limbs and checks them together
/// with the standalone top limb `z`. Returns the resulting limbed element
/// `[lo, hi, z]`.
pub fn compact_multi_range_check<F: PrimeField>(
    cx: &mut CircuitBuilder<F>,
    compact: &AssignedNative<F>,
    z: &AssignedNative<F>,
) -> Result<Field3<F>, Error> {
    if let (Some(c), Some(zc)) = (compact.as_constant(), z.as_constant()) {
        let big = fe_to_big(c);
        if big.bits() as usize > 2 * LIMB_BITS {
            return Err(Error::range(&big, 2 * LIMB_BITS));
        }
        constant_fits(zc, LIMB_BITS)?;
        let lo: F = big_to_fe(&bits_slice(&big, 0, LIMB_BITS));
        let hi: F = big_to_fe(&(&big >> LIMB_BITS));
        return Ok(Field3([
            AssignedNative::Constant(lo),
            AssignedNative::Constant(hi),
            *z,
        ]));
    }
    let [lo, hi] = cx.exists(|w| {
        let v = w.big(compact);
        if v.bits() as usize > 2 * LIMB_BITS {
            return Err(Error::range(&v, 2 * LIMB_BITS));
        }
        Ok([
            big_to_fe(&bits_slice(&v, 0, LIMB_BITS)),
            big_to_fe(&(&v >> LIMB_BITS)),
        ])
    })?;
    cx.emit(Gate::RangeCheck1 { compact: *compact, lo, hi })?;
    range_check88(cx, &lo)?;
    range_check88(cx, &hi)?;
    range_check88(cx, z)?;
    cx.emit(Gate::Zero)?;
    Ok(Field3([lo, hi, *z]))
}

/// Checks `x < 2^16` via a self-xor row, which proves the four nibble
/// decompositions.
pub fn range_check16<F: PrimeField>(
    cx: &mut CircuitBuilder<F>,
    x: &AssignedNative<F>,
) -> Result<(), Error> {
    if let Some(c) = x.as_constant() {
        return constant_fits(c, 16);
    }
    let nibbles = cx.exists(|w| {
        let v = w.big(x);
        if v.bits() > 16 {
            return Err(Error::range(&v, 16));
        }
        Ok([
            big_to_fe(&bits_slice(&v, 0, 4)),
            big_to_fe(&bits_slice(&v, 4, 4)),
            big_to_fe(&bits_slice(&v, 8, 4)),
            big_to_fe(&bits_slice(&v, 12, 4)),
        ])
    })?;
    let zero = AssignedNative::zero();
    cx.emit(Gate::Xor16 {
        words: [*x, zero, *x],
        nibbles: [nibbles, [zero; 4], nibbles],
    })
}

/// Checks `x < 2^8` via a xor row with the top two nibbles pinned to zero.
pub fn range_check8<F: PrimeField>(
    cx: &mut CircuitBuilder<F>,
    x: &AssignedNative<F>,
) -> Result<(), Error> {
    if let Some(c) = x.as_constant() {
        return constant_fits(c, 8);
    }
    let [n0, n1] = cx.exists(|w| {
        let v = w.big(x);
        if v.bits() > 8 {
            return Err(Error::range(&v, 8));
        }
        Ok([big_to_fe(&bits_slice(&v, 0, 4)), big_to_fe(&bits_slice(&v, 4, 4))])
    })?;
    let zero = AssignedNative::zero();
    let nibbles = [n0, n1, zero, zero];
    cx.emit(Gate::Xor16 {
        words: [*x, zero, *x],
        nibbles: [nibbles, [zero; 4], nibbles],
    })
}

/// Checks `x < 2^32`.
pub fn range_check32<F: PrimeField>(
    cx: &mut CircuitBuilder<F>,
    x: &AssignedNative<F>,
) -> Result<(), Error> {
    range_check_n(cx, x, 32)
}

/// Checks `x < 2^bits` for any positive multiple of 16 up to 240, by
/// decomposing into 16-bit chunks.
///
/// Panics if `bits` is zero, not a multiple of 16, or above 240.
pub fn range_check_n<F: PrimeField>(
    cx: &mut CircuitBuilder<F>,
    x: &AssignedNative<F>,
    bits: usize,
) -> Result<(), Error> {
    assert!(
        bits > 0 && bits % 16 == 0 && bits <= 240,
        "rangeCheckN expects a positive multiple of 16 up to 240, got {bits}"
    );
    if let Some(c) = x.as_constant() {
        return constant_fits(c, bits);
    }
    let n = bits / 16;
    if n == 1 {
        return range_check16(cx, x);
    }
    let chunks = cx.exists_vec(n, |w| {
        let v = w.big(x);
        if v.bits() as usize > bits {
            return Err(Error::range(&v, bits));
        }
        Ok((0..n).map(|i| big_to_fe(&bits_slice(&v, 16 * i, 16))).collect())
    })?;
    for chunk in &chunks {
        range_check16(cx, chunk)?;
    }
    let terms: Vec<_> = chunks
        .iter()
        .enumerate()
        .map(|(i, chunk)| (pow2::<F>(16 * i), *chunk))
        .collect();
    let sum = cx.linear_combination(&terms, F::ZERO)?;
    cx.assert_equal(&sum, x)
}

/// Checks `x < 2^bits` for any width up to 16, by nibble rows for 8 and 16
/// bits and by plain bit decomposition otherwise.
pub(crate) fn range_check_small<F: PrimeField>(
    cx: &mut CircuitBuilder<F>,
    x: &AssignedNative<F>,
    bits: usize,
) -> Result<(), Error> {
    debug_assert!(bits > 0 && bits <= 16);
    match bits {
        16 => range_check16(cx, x),
        8 => range_check8(cx, x),
        _ => {
            if let Some(c) = x.as_constant() {
                return constant_fits(c, bits);
            }
            let bit_vars = cx.exists_vec(bits, |w| {
                let v = w.big(x);
                if v.bits() as usize > bits {
                    return Err(Error::range(&v, bits));
                }
                Ok((0..bits).map(|i| big_to_fe(&bits_slice(&v, i, 1))).collect())
            })?;
            for bit in &bit_vars {
                cx.assert_bool(bit)?;
            }
            let terms: Vec<_> = bit_vars
                .iter()
                .enumerate()
                .map(|(i, bit)| (pow2::<F>(i), *bit))
                .collect();
            let sum = cx.linear_combination(&terms, F::ZERO)?;
            cx.assert_equal(&sum, x)
        }
    }
}

/// Returns a boolean variable equal to 1 iff `x < 2^bits`.
///
/// Unlike [`range_check_n`] this never fails on an in-headroom value; it
/// proves the verdict instead. `x` must fit in `bits + h` bits where `h` is
/// the largest multiple of 16 such that `bits + h` stays below the native
/// field capacity; larger values fail at witness time.
///
/// Panics if `bits` is zero or not a multiple of 16.
pub fn is_in_range_n<F: PrimeField>(
    cx: &mut CircuitBuilder<F>,
    x: &AssignedNative<F>,
    bits: usize,
) -> Result<AssignedNative<F>, Error> {
    assert!(
        bits > 0 && bits % 16 == 0,
        "isInRangeN expects a positive multiple of 16, got {bits}"
    );
    let capacity = F::NUM_BITS as usize - 1;
    assert!(capacity > bits + 16, "no headroom above {bits} bits");
    let h = ((capacity - bits) / 16) * 16;
    if let Some(c) = x.as_constant() {
        let big = fe_to_big(c);
        if big.bits() as usize > bits + h {
            return Err(Error::range(&big, bits + h));
        }
        let verdict = if big.bits() as usize <= bits { F::ONE } else { F::ZERO };
        return Ok(AssignedNative::Constant(verdict));
    }
    let [lo, hi, hi_inv] = cx.exists(|w| {
        let v = w.big(x);
        if v.bits() as usize > bits + h {
            return Err(Error::range(&v, bits + h));
        }
        let hi: F = big_to_fe(&(&v >> bits));
        let inv = Option::<F>::from(hi.invert()).unwrap_or(F::ZERO);
        Ok([big_to_fe(&bits_slice(&v, 0, bits)), hi, inv])
    })?;
    let composed = cx.linear_combination(&[(F::ONE, lo), (pow2(bits), hi)], F::ZERO)?;
    cx.assert_equal(&composed, x)?;
    range_check_n(cx, &lo, bits)?;
    range_check_n(cx, &hi, h)?;
    // flag = 1 - hi * hi_inv, with flag * hi = 0; the product pins flag to 0
    // whenever hi is nonzero, and to 1 otherwise.
    let prod = cx.mul(&hi, &hi_inv)?;
    let flag = cx.linear_combination(&[(-F::ONE, prod)], F::ONE)?;
    cx.emit(Gate::Generic {
        terms: vec![],
        mul: Some((F::ONE, flag, hi)),
        constant: F::ZERO,
    })?;
    Ok(flag)
}
