// This file is part of foreign-field-gadgets.
// SPDX-License-Identifier: Apache-2.0
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
// http://www.apache.org/licenses/LICENSE-2.0

//! Bitwise gadgets on native words: xor, and, not and 64-bit rotation.
//!
//! Xor works on 16-bit rows; wider operands are split into 16-bit chunks
//! first, so a length that is not a multiple of 16 is padded up to one.
//! Inputs must fit in the padded length, which is enforced at witness time
//! and by the nibble decompositions of the xor rows.

use ff::PrimeField;

use crate::{
    circuit::{CircuitBuilder, Gate},
    error::Error,
    range_check::range_check64,
    types::AssignedNative,
    utils::{big_to_fe, bits_slice, fe_to_big, mask, pow2},
};

/// Rotation direction for [`rot64`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RotationSide {
    Left,
    Right,
}

/// One xor row: `a ^ b` for 16-bit words, witnessing the nibble
/// decompositions of both inputs and the output.
fn xor16<F: PrimeField>(
    cx: &mut CircuitBuilder<F>,
    a: &AssignedNative<F>,
    b: &AssignedNative<F>,
) -> Result<AssignedNative<F>, Error> {
    if let (Some(av), Some(bv)) = (a.as_constant(), b.as_constant()) {
        let (av, bv) = (fe_to_big(av), fe_to_big(bv));
        if av.bits() > 16 {
            return Err(Error::range(&av, 16));
        }
        if bv.bits() > 16 {
            return Err(Error::range(&bv, 16));
        }
        return Ok(AssignedNative::Constant(big_to_fe(&(av ^ bv))));
    }
    let vals = cx.exists::<13>(|w| {
        let av = w.big(a);
        let bv = w.big(b);
        if av.bits() > 16 {
            return Err(Error::range(&av, 16));
        }
        if bv.bits() > 16 {
            return Err(Error::range(&bv, 16));
        }
        let out = &av ^ &bv;
        let mut vals = [F::ZERO; 13];
        vals[0] = big_to_fe(&out);
        for (wi, word) in [av, bv, out].iter().enumerate() {
            for i in 0..4 {
                vals[1 + 4 * wi + i] = big_to_fe(&bits_slice(word, 4 * i, 4));
            }
        }
        Ok(vals)
    })?;
    let out = vals[0];
    let nib = |w: usize| -> [AssignedNative<F>; 4] {
        [vals[1 + 4 * w], vals[2 + 4 * w], vals[3 + 4 * w], vals[4 + 4 * w]]
    };
    cx.emit(Gate::Xor16 {
        words: [*a, *b, out],
        nibbles: [nib(0), nib(1), nib(2)],
    })?;
    Ok(out)
}

/// Splits `x < 2^(16 * n)` into `n` 16-bit chunks. The chunks recompose to
/// `x` by a generic gate; their widths are proven by the xor rows consuming
/// them.
fn chunks16<F: PrimeField>(
    cx: &mut CircuitBuilder<F>,
    x: &AssignedNative<F>,
    n: usize,
) -> Result<Vec<AssignedNative<F>>, Error> {
    let chunks = cx.exists_vec(n, |w| {
        let v = w.big(x);
        if v.bits() as usize > 16 * n {
            return Err(Error::range(&v, 16 * n));
        }
        Ok((0..n).map(|i| big_to_fe(&bits_slice(&v, 16 * i, 16))).collect())
    })?;
    let terms: Vec<_> = chunks
        .iter()
        .enumerate()
        .map(|(i, c)| (pow2::<F>(16 * i), *c))
        .collect();
    let recomposed = cx.linear_combination(&terms, F::ZERO)?;
    cx.assert_equal(&recomposed, x)?;
    Ok(chunks)
}

/// `a ^ b` over `len` bits, padded up to a multiple of 16.
///
/// Panics if `len` is zero or the padded length exceeds 240 bits.
pub fn xor<F: PrimeField>(
    cx: &mut CircuitBuilder<F>,
    a: &AssignedNative<F>,
    b: &AssignedNative<F>,
    len: usize,
) -> Result<AssignedNative<F>, Error> {
    let padded = len.div_ceil(16) * 16;
    assert!(
        len > 0 && padded <= 240,
        "xor supports between 1 and 240 bits, got {len}"
    );
    let n = padded / 16;
    if n == 1 {
        return xor16(cx, a, b);
    }
    if let (Some(av), Some(bv)) = (a.as_constant(), b.as_constant()) {
        let (av, bv) = (fe_to_big(av), fe_to_big(bv));
        if av.bits() as usize > padded {
            return Err(Error::range(&av, padded));
        }
        if bv.bits() as usize > padded {
            return Err(Error::range(&bv, padded));
        }
        return Ok(AssignedNative::Constant(big_to_fe(&(av ^ bv))));
    }
    let a_chunks = chunks16(cx, a, n)?;
    let b_chunks = chunks16(cx, b, n)?;
    let mut terms = Vec::with_capacity(n);
    for (i, (ac, bc)) in a_chunks.iter().zip(&b_chunks).enumerate() {
        let out = xor16(cx, ac, bc)?;
        terms.push((pow2::<F>(16 * i), out));
    }
    cx.linear_combination(&terms, F::ZERO)
}

/// `a & b` over `len` bits, from the identity `a + b = (a ^ b) + 2 * (a & b)`.
pub fn and<F: PrimeField>(
    cx: &mut CircuitBuilder<F>,
    a: &AssignedNative<F>,
    b: &AssignedNative<F>,
    len: usize,
) -> Result<AssignedNative<F>, Error> {
    let xored = xor(cx, a, b, len)?;
    if let (Some(av), Some(bv)) = (a.as_constant(), b.as_constant()) {
        return Ok(AssignedNative::Constant(big_to_fe(
            &(fe_to_big(av) & fe_to_big(bv)),
        )));
    }
    let [anded] = cx.exists(|w| Ok([big_to_fe(&(w.big(a) & w.big(b)))]))?;
    // a + b - xor - 2 * and = 0
    let two = F::ONE + F::ONE;
    cx.emit(Gate::Generic {
        terms: vec![(F::ONE, *a), (F::ONE, *b), (-F::ONE, xored), (-two, anded)],
        mul: None,
        constant: F::ZERO,
    })?;
    Ok(anded)
}

/// `!a` over `len` bits, i.e. `2^len - 1 - a`. The input must already be
/// checked to `len` bits; no gate is added beyond the linear relation.
pub fn not<F: PrimeField>(
    cx: &mut CircuitBuilder<F>,
    a: &AssignedNative<F>,
    len: usize,
) -> Result<AssignedNative<F>, Error> {
    assert!(len > 0 && len <= 240, "not supports between 1 and 240 bits");
    cx.linear_combination(&[(-F::ONE, *a)], big_to_fe(&mask(len)))
}

/// Rotates a 64-bit word by `bits` in the given direction. The word itself
/// is 64-bit checked here, as are the shifted output and the excess part.
///
/// Panics unless `0 < bits < 64`.
pub fn rot64<F: PrimeField>(
    cx: &mut CircuitBuilder<F>,
    word: &AssignedNative<F>,
    bits: u32,
    side: RotationSide,
) -> Result<AssignedNative<F>, Error> {
    assert!(bits > 0 && bits < 64, "rotation must be between 1 and 63 bits");
    let rot = match side {
        RotationSide::Left => bits,
        RotationSide::Right => 64 - bits,
    };
    if let Some(c) = word.as_constant() {
        let big = fe_to_big(c);
        if big.bits() > 64 {
            return Err(Error::range(&big, 64));
        }
        let v = big.iter_u64_digits().next().unwrap_or(0);
        return Ok(AssignedNative::Constant(F::from(v.rotate_left(rot))));
    }
    let [rotated, excess, shifted] = cx.exists(|w| {
        let big = w.big(word);
        if big.bits() > 64 {
            return Err(Error::range(&big, 64));
        }
        let v = big.iter_u64_digits().next().unwrap_or(0);
        Ok([
            F::from(v.rotate_left(rot)),
            F::from(v >> (64 - rot)),
            F::from(v << rot),
        ])
    })?;
    range_check64(cx, word)?;
    cx.emit(Gate::Rot64 {
        word: *word,
        rotated,
        excess,
        shifted,
        rot,
    })?;
    range_check64(cx, &shifted)?;
    range_check64(cx, &rotated)?;
    // excess < 2^rot, checked as excess + 2^64 - 2^rot < 2^64
    let offset = pow2::<F>(64) - pow2::<F>(rot as usize);
    let bound = cx.linear_combination(&[(F::ONE, excess)], offset)?;
    range_check64(cx, &bound)?;
    Ok(rotated)
}
