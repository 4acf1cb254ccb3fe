// This file is part of foreign-field-gadgets.
// SPDX-License-Identifier: Apache-2.0
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
// http://www.apache.org/licenses/LICENSE-2.0

//! The fixed gate set recorded by the builder.
//!
//! Each gate fixes a small system of equations over its wired cells. In
//! prove mode gates are checked eagerly against the current assignment as
//! they are recorded, so a violated equation surfaces at the exact gadget
//! call that produced it.

use ff::PrimeField;

use crate::{
    circuit::CircuitBuilder,
    error::Error,
    types::{AssignedNative, NB_LIMBS},
    utils::{fe_to_big, pow2},
};

/// A recorded gate.
#[derive(Clone, Debug)]
pub enum Gate<F: PrimeField> {
    /// Padding row with no constraints.
    Zero,

    /// `constant + sum(c_i * v_i) + m * a * b = 0`.
    Generic {
        terms: Vec<(F, AssignedNative<F>)>,
        mul: Option<(F, AssignedNative<F>, AssignedNative<F>)>,
        constant: F,
    },

    /// 88-bit decomposition of `value` into eight 2-bit crumbs (low 16
    /// bits) and six 12-bit limbs (bits 16 to 88), little-endian.
    RangeCheck0 {
        value: AssignedNative<F>,
        crumbs: [AssignedNative<F>; 8],
        limbs: [AssignedNative<F>; 6],
    },

    /// Compact split `compact = lo + 2^88 * hi` of a 176-bit value into two
    /// limbs, each range-checked by an accompanying [`Gate::RangeCheck0`].
    RangeCheck1 {
        compact: AssignedNative<F>,
        lo: AssignedNative<F>,
        hi: AssignedNative<F>,
    },

    /// 16-bit xor: `words[2] = words[0] ^ words[1]`, each word decomposed
    /// into four 4-bit nibbles which are xor-ed position-wise.
    Xor16 {
        words: [AssignedNative<F>; 3],
        nibbles: [[AssignedNative<F>; 4]; 3],
    },

    /// 64-bit left rotation by the fixed offset `rot`:
    /// `word * 2^rot = excess * 2^64 + shifted` and
    /// `rotated = shifted + excess`.
    Rot64 {
        word: AssignedNative<F>,
        rotated: AssignedNative<F>,
        excess: AssignedNative<F>,
        shifted: AssignedNative<F>,
        rot: u32,
    },

    /// One step of foreign-field addition/subtraction:
    /// `result = left + sign * right - overflow * modulus - carry * 2^176`
    /// split over the low 176 bits and the top limb.
    ForeignFieldAdd {
        left: [AssignedNative<F>; NB_LIMBS],
        right: [AssignedNative<F>; NB_LIMBS],
        result: [AssignedNative<F>; NB_LIMBS],
        overflow: AssignedNative<F>,
        carry: AssignedNative<F>,
        sign: F,
        modulus: [F; NB_LIMBS],
    },

    /// Foreign-field multiplication `left * right = quotient * f + remainder`
    /// checked over the binary limb capacity and over the native field, with
    /// the intermediate-product decomposition and carries as extra wires.
    ForeignFieldMul {
        left: [AssignedNative<F>; NB_LIMBS],
        right: [AssignedNative<F>; NB_LIMBS],
        quotient: [AssignedNative<F>; NB_LIMBS],
        remainder01: AssignedNative<F>,
        remainder2: AssignedNative<F>,
        product1_lo: AssignedNative<F>,
        product1_hi_0: AssignedNative<F>,
        product1_hi_1: AssignedNative<F>,
        carry0: AssignedNative<F>,
        carry1_lo: AssignedNative<F>,
        carry1_hi: AssignedNative<F>,
        quotient_bound01: AssignedNative<F>,
        quotient_bound2: AssignedNative<F>,
        quotient_bound_carry: AssignedNative<F>,
        modulus_native: F,
        neg_modulus: [F; NB_LIMBS],
    },
}

impl<F: PrimeField> Gate<F> {
    pub fn name(&self) -> &'static str {
        match self {
            Gate::Zero => "Zero",
            Gate::Generic { .. } => "Generic",
            Gate::RangeCheck0 { .. } => "RangeCheck0",
            Gate::RangeCheck1 { .. } => "RangeCheck1",
            Gate::Xor16 { .. } => "Xor16",
            Gate::Rot64 { .. } => "Rot64",
            Gate::ForeignFieldAdd { .. } => "ForeignFieldAdd",
            Gate::ForeignFieldMul { .. } => "ForeignFieldMul",
        }
    }

    /// Checks all equations of this gate against the builder's assignment.
    pub(crate) fn check(&self, cx: &CircuitBuilder<F>) -> Result<(), Error> {
        let v = |x: &AssignedNative<F>| cx.value(x);
        let hold = |ok: bool, index: usize| -> Result<(), Error> {
            if ok {
                Ok(())
            } else {
                Err(Error::Constraint { gate: self.name(), index })
            }
        };

        match self {
            Gate::Zero => Ok(()),

            Gate::Generic { terms, mul, constant } => {
                let mut acc = *constant;
                for (c, x) in terms {
                    acc += *c * v(x)?;
                }
                if let Some((m, a, b)) = mul {
                    acc += *m * v(a)? * v(b)?;
                }
                hold(acc == F::ZERO, 1)
            }

            Gate::RangeCheck0 { value, crumbs, limbs } => {
                let mut acc = F::ZERO;
                for (j, crumb) in crumbs.iter().enumerate() {
                    let c = v(crumb)?;
                    fits(c, 2)?;
                    acc += c * pow2::<F>(2 * j);
                }
                for (i, limb) in limbs.iter().enumerate() {
                    let l = v(limb)?;
                    fits(l, 12)?;
                    acc += l * pow2::<F>(16 + 12 * i);
                }
                hold(acc == v(value)?, 1)
            }

            Gate::RangeCheck1 { compact, lo, hi } => {
                hold(v(compact)? == v(lo)? + v(hi)? * pow2::<F>(88), 1)
            }

            Gate::Xor16 { words, nibbles } => {
                let mut bits = [[0u64; 4]; 3];
                for w in 0..3 {
                    let mut acc = F::ZERO;
                    for i in 0..4 {
                        let nib = v(&nibbles[w][i])?;
                        fits(nib, 4)?;
                        bits[w][i] = fe_to_big(nib).iter_u64_digits().next().unwrap_or(0);
                        acc += nib * pow2::<F>(4 * i);
                    }
                    hold(acc == v(&words[w])?, w + 1)?;
                }
                for i in 0..4 {
                    hold(bits[0][i] ^ bits[1][i] == bits[2][i], 4)?;
                }
                Ok(())
            }

            Gate::Rot64 { word, rotated, excess, shifted, rot } => {
                let two_64 = pow2::<F>(64);
                hold(
                    v(word)? * pow2::<F>(*rot as usize) == v(excess)? * two_64 + v(shifted)?,
                    1,
                )?;
                hold(v(rotated)? == v(shifted)? + v(excess)?, 2)
            }

            Gate::ForeignFieldAdd { left, right, result, overflow, carry, sign, modulus } => {
                let b = pow2::<F>(88);
                let b2 = pow2::<F>(176);
                let o = v(overflow)?;
                let c = v(carry)?;
                hold(o * (o - sign) == F::ZERO, 1)?;
                hold(c * (c - F::ONE) * (c + F::ONE) == F::ZERO, 2)?;
                let pair = |x: &[AssignedNative<F>; NB_LIMBS]| -> Result<F, Error> {
                    Ok(v(&x[0])? + v(&x[1])? * b)
                };
                let f01 = modulus[0] + modulus[1] * b;
                hold(
                    pair(left)? + *sign * pair(right)? - o * f01 - c * b2 == pair(result)?,
                    3,
                )?;
                hold(
                    v(&left[2])? + *sign * v(&right[2])? - o * modulus[2] + c == v(&result[2])?,
                    4,
                )
            }

            Gate::ForeignFieldMul {
                left,
                right,
                quotient,
                remainder01,
                remainder2,
                product1_lo,
                product1_hi_0,
                product1_hi_1,
                carry0,
                carry1_lo,
                carry1_hi,
                quotient_bound01,
                quotient_bound2,
                quotient_bound_carry,
                modulus_native,
                neg_modulus,
            } => {
                let b = pow2::<F>(88);
                let b2 = pow2::<F>(176);
                let x = [v(&left[0])?, v(&left[1])?, v(&left[2])?];
                let y = [v(&right[0])?, v(&right[1])?, v(&right[2])?];
                let q = [v(&quotient[0])?, v(&quotient[1])?, v(&quotient[2])?];
                let nf = neg_modulus;

                // Intermediate products of x * y + q * (2^264 - f) by limb weight.
                let p0 = x[0] * y[0] + q[0] * nf[0];
                let p1 = x[0] * y[1] + x[1] * y[0] + q[0] * nf[1] + q[1] * nf[0];
                let p2 =
                    x[0] * y[2] + x[2] * y[0] + x[1] * y[1] + q[0] * nf[2] + q[1] * nf[1] + q[2] * nf[0];

                let p10 = v(product1_lo)?;
                let p110 = v(product1_hi_0)?;
                let p111 = v(product1_hi_1)?;
                fits(p111, 2)?;
                hold(p1 == p10 + p110 * b + p111 * b2, 2)?;

                let c0 = v(carry0)?;
                fits(c0, 2)?;
                let r01 = v(remainder01)?;
                let r2 = v(remainder2)?;
                hold(p0 + p10 * b == r01 + c0 * b2, 4)?;

                let c1_lo = v(carry1_lo)?;
                let c1_hi = v(carry1_hi)?;
                fits(c1_hi, 3)?;
                hold(p2 + p110 + p111 * b + c0 == r2 + c1_lo * b + c1_hi * b2, 6)?;

                // The same identity modulo the native field.
                let x_n = x[0] + x[1] * b + x[2] * b2;
                let y_n = y[0] + y[1] * b + y[2] * b2;
                let q_n = q[0] + q[1] * b + q[2] * b2;
                let r_n = r01 + r2 * b2;
                hold(x_n * y_n - q_n * *modulus_native - r_n == F::ZERO, 7)?;

                // Quotient bound addition q' = q + (2^264 - f).
                let qbc = v(quotient_bound_carry)?;
                hold(qbc * (qbc - F::ONE) == F::ZERO, 8)?;
                let nf01 = nf[0] + nf[1] * b;
                hold(
                    v(quotient_bound01)? + qbc * b2 == q[0] + q[1] * b + nf01,
                    9,
                )?;
                hold(v(quotient_bound2)? == q[2] + nf[2] + qbc, 10)
            }
        }
    }
}

fn fits<F: PrimeField>(x: F, bits: usize) -> Result<(), Error> {
    let big = fe_to_big(x);
    if big.bits() as usize > bits {
        return Err(Error::range(&big, bits));
    }
    Ok(())
}
