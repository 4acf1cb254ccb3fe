// This file is part of foreign-field-gadgets.
// SPDX-License-Identifier: Apache-2.0
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
// http://www.apache.org/licenses/LICENSE-2.0

//! Emulated arithmetic modulo a foreign modulus `f < 2^259`.
//!
//! Elements live in three 88-bit limbs with capacity `2^264`. Addition
//! chains stay lazily unreduced; multiplication requires both operands
//! almost reduced, i.e. limb-checked with the top limb bounded by the top
//! limb of `f`, which keeps the quotient within three limbs and the
//! intermediate products below the native capacity. The multiplication
//! identity `x * y = q * f + r` is enforced both over the limb capacity,
//! through a carry decomposition of the intermediate products, and over the
//! native field.

use ff::PrimeField;
use num_bigint::{BigInt, BigUint};
use num_integer::Integer;
use num_traits::{One, Signed, Zero};

use crate::{
    circuit::{CircuitBuilder, Gate},
    error::Error,
    range_check::{compact_multi_range_check, multi_range_check},
    types::{AlmostReduced, AssignedNative, Field3, Reduced, Sign, Sum, LIMB_BITS, NB_LIMBS},
    utils::{
        big_to_fe, bigint_to_fe, bits_slice, fe_to_big, mask, mod_inverse, neg_modulus, pow2,
        split_compact, split_to_limbs,
    },
};

fn assert_modulus(f: &BigUint) {
    assert!(!f.is_zero(), "the foreign modulus cannot be zero");
    assert!(
        f.bits() <= 259,
        "the foreign modulus must fit in 259 bits, got {} bits",
        f.bits()
    );
}

/// Picks the overflow `o` in `{0, sign}`: the sum is reduced by `f` exactly
/// once when it leaves `[0, f)`, so `x + sign * y - o * f` is canonical
/// whenever both operands are below `f`.
fn signed_add_witness(
    x: &BigUint,
    sign: Sign,
    y: &BigUint,
    f: &BigUint,
) -> Result<(BigUint, i8), Error> {
    let capacity = BigInt::one() << (NB_LIMBS * LIMB_BITS);
    let fi = BigInt::from(f.clone());
    let sum = BigInt::from(x.clone()) + BigInt::from(sign.as_i8()) * BigInt::from(y.clone());
    let o = match sign {
        Sign::Pos if sum >= fi => 1,
        Sign::Neg if sum.is_negative() => -1,
        _ => 0,
    };
    let r = &sum - BigInt::from(o) * &fi;
    if r.is_negative() {
        return Err(Error::Underflow);
    }
    if r >= capacity {
        return Err(Error::BoundViolation {
            op: "foreign add",
            msg: format!("sum {sum} exceeds the limb capacity even after reducing once"),
        });
    }
    Ok((r.to_biguint().expect("checked non-negative"), o))
}

/// One addition gate: `result = x + sign * y - overflow * f`, without range
/// checks on the result limbs.
fn single_add<F: PrimeField>(
    cx: &mut CircuitBuilder<F>,
    x: &Field3<F>,
    sign: Sign,
    y: &Field3<F>,
    f: &BigUint,
) -> Result<Field3<F>, Error> {
    let f_limbs = split_to_limbs(f)?;
    if let (Some(xv), Some(yv)) = (x.as_constant(), y.as_constant()) {
        let (r, _) = signed_add_witness(&xv, sign, &yv, f)?;
        return Field3::constant(&r);
    }
    let [r0, r1, r2, overflow, carry] = cx.exists(|w| {
        let xv = w.field3(x);
        let yv = w.field3(y);
        let (r, o) = signed_add_witness(&xv, sign, &yv, f)?;
        let r_limbs = split_to_limbs(&r)?;
        let low = |z: &BigUint| BigInt::from(z & &mask(2 * LIMB_BITS));
        let carry = (low(&xv) + BigInt::from(sign.as_i8()) * low(&yv)
            - BigInt::from(o) * low(f)
            - low(&r))
            >> (2 * LIMB_BITS);
        Ok([
            big_to_fe(&r_limbs[0]),
            big_to_fe(&r_limbs[1]),
            big_to_fe(&r_limbs[2]),
            bigint_to_fe(&BigInt::from(o)),
            bigint_to_fe(&carry),
        ])
    })?;
    let result = Field3([r0, r1, r2]);
    cx.emit(Gate::ForeignFieldAdd {
        left: *x.limbs(),
        right: *y.limbs(),
        result: *result.limbs(),
        overflow,
        carry,
        sign: sign.as_field(),
        modulus: [
            big_to_fe(&f_limbs[0]),
            big_to_fe(&f_limbs[1]),
            big_to_fe(&f_limbs[2]),
        ],
    })?;
    Ok(result)
}

/// Signed sum `xs[0] + signs[0] * xs[1] + ...` modulo `f`, reduced at most
/// once per step. The result limbs are range-checked; the result itself may
/// exceed `f` but stays below `2^264`.
///
/// Panics unless there is exactly one sign per added term.
pub fn sum<F: PrimeField>(
    cx: &mut CircuitBuilder<F>,
    xs: &[Field3<F>],
    signs: &[Sign],
    f: &BigUint,
) -> Result<Field3<F>, Error> {
    assert!(
        !xs.is_empty() && signs.len() == xs.len() - 1,
        "a sum of {} terms needs {} signs, got {}",
        xs.len(),
        xs.len().saturating_sub(1),
        signs.len()
    );
    assert_modulus(f);
    let mut acc = xs[0];
    for (x, sign) in xs[1..].iter().zip(signs) {
        acc = single_add(cx, &acc, *sign, x, f)?;
    }
    multi_range_check(cx, &acc)?;
    Ok(acc)
}

/// `x + y` reduced at most once.
pub fn add<F: PrimeField>(
    cx: &mut CircuitBuilder<F>,
    x: &Field3<F>,
    y: &Field3<F>,
    f: &BigUint,
) -> Result<Field3<F>, Error> {
    sum(cx, &[*x, *y], &[Sign::Pos], f)
}

/// `x - y` plus `f` if the difference is negative. Fails with
/// [`Error::Underflow`] when `x - y < -f`.
pub fn sub<F: PrimeField>(
    cx: &mut CircuitBuilder<F>,
    x: &Field3<F>,
    y: &Field3<F>,
    f: &BigUint,
) -> Result<Field3<F>, Error> {
    sum(cx, &[*x, *y], &[Sign::Neg], f)
}

/// `-x` modulo `f`.
pub fn negate<F: PrimeField>(
    cx: &mut CircuitBuilder<F>,
    x: &Field3<F>,
    f: &BigUint,
) -> Result<Field3<F>, Error> {
    let zero = Field3::constant(&BigUint::zero())?;
    sum(cx, &[zero, *x], &[Sign::Neg], f)
}

/// Range-checks every element and bounds its top limb by the top limb of
/// `f`. The bound values are batched three at a time into shared
/// multi-range-checks, so asserting elements together is cheaper than one
/// by one.
///
/// With `skip_mrc` the per-element limb checks are omitted; the caller
/// vouches that every limb is already known to fit 88 bits. The top-limb
/// bound checks are always emitted.
pub fn assert_almost_reduced<F: PrimeField>(
    cx: &mut CircuitBuilder<F>,
    xs: &[Field3<F>],
    f: &BigUint,
    skip_mrc: bool,
) -> Result<Vec<AlmostReduced<F>>, Error> {
    assert_modulus(f);
    let f2 = f >> (2 * LIMB_BITS);
    let shift = (BigUint::one() << LIMB_BITS) - &f2 - 1u8;
    let top_exceeds = |top: &BigUint| Error::BoundViolation {
        op: "assertAlmostReduced",
        msg: format!("top limb {top} exceeds the modulus top limb {f2}"),
    };
    let mut bounds = Vec::new();
    for x in xs {
        if let Some(v) = x.as_constant() {
            let top = &v >> (2 * LIMB_BITS);
            if top > f2 {
                return Err(top_exceeds(&top));
            }
            continue;
        }
        if !skip_mrc {
            multi_range_check(cx, x)?;
        }
        if cx.is_concrete() {
            let top = fe_to_big(cx.value(&x.limbs()[2])?);
            if top > f2 {
                return Err(top_exceeds(&top));
            }
        }
        // top + 2^88 - f2 - 1 < 2^88 iff top <= f2
        let bound = cx.linear_combination(&[(F::ONE, x.limbs()[2])], big_to_fe(&shift))?;
        bounds.push(bound);
    }
    for trio in bounds.chunks(NB_LIMBS) {
        let mut limbs = [AssignedNative::zero(); NB_LIMBS];
        limbs[..trio.len()].copy_from_slice(trio);
        multi_range_check(cx, &Field3(limbs))?;
    }
    Ok(xs.iter().map(|x| AlmostReduced::new(*x)).collect())
}

/// Proves `x < f` by checking that `f - 1 - x`, computed limb-wise with
/// boolean borrows, has three in-range limbs.
pub fn assert_less_than<F: PrimeField>(
    cx: &mut CircuitBuilder<F>,
    x: &AlmostReduced<F>,
    f: &BigUint,
) -> Result<Reduced<F>, Error> {
    assert_modulus(f);
    let xf = x.as_field3();
    let not_below = |v: &BigUint| Error::BoundViolation {
        op: "assertLessThan",
        msg: format!("{v} is not below the modulus {f}"),
    };
    if let Some(v) = xf.as_constant() {
        if &v >= f {
            return Err(not_below(&v));
        }
        return Ok(Reduced::new(*xf));
    }
    let f_limbs = split_to_limbs(f)?;
    let [d0, d1, d2, b0, b1] = cx.exists(|w| {
        let v = w.field3(xf);
        if &v >= f {
            return Err(not_below(&v));
        }
        let x_limbs = split_to_limbs(&v)?;
        let base = BigInt::one() << LIMB_BITS;
        let t0 = BigInt::from(f_limbs[0].clone()) - 1u8 - BigInt::from(x_limbs[0].clone());
        let b0 = t0.is_negative();
        let d0 = if b0 { &t0 + &base } else { t0.clone() };
        let t1 = BigInt::from(f_limbs[1].clone()) - BigInt::from(x_limbs[1].clone()) - i8::from(b0);
        let b1 = t1.is_negative();
        let d1 = if b1 { &t1 + &base } else { t1.clone() };
        let d2 = BigInt::from(f_limbs[2].clone()) - BigInt::from(x_limbs[2].clone()) - i8::from(b1);
        debug_assert!(!d2.is_negative());
        Ok([
            bigint_to_fe(&d0),
            bigint_to_fe(&d1),
            bigint_to_fe(&d2),
            F::from(b0 as u64),
            F::from(b1 as u64),
        ])
    })?;
    cx.assert_bool(&b0)?;
    cx.assert_bool(&b1)?;
    let base = pow2::<F>(LIMB_BITS);
    // d0 = f0 - 1 - x0 + b0 * 2^88
    let lhs = cx.linear_combination(
        &[(-F::ONE, xf.limbs()[0]), (base, b0)],
        big_to_fe::<F>(&f_limbs[0]) - F::ONE,
    )?;
    cx.assert_equal(&lhs, &d0)?;
    // d1 = f1 - x1 - b0 + b1 * 2^88
    let lhs = cx.linear_combination(
        &[(-F::ONE, xf.limbs()[1]), (-F::ONE, b0), (base, b1)],
        big_to_fe(&f_limbs[1]),
    )?;
    cx.assert_equal(&lhs, &d1)?;
    // d2 = f2 - x2 - b1
    let lhs = cx.linear_combination(
        &[(-F::ONE, xf.limbs()[2]), (-F::ONE, b1)],
        big_to_fe(&f_limbs[2]),
    )?;
    cx.assert_equal(&lhs, &d2)?;
    multi_range_check(cx, &Field3([d0, d1, d2]))?;
    Ok(Reduced::new(*xf))
}

/// Collapses a lazy sum into a single element via an addition chain. A
/// multi-term sum used as a multiplication operand is re-asserted almost
/// reduced; a multi-term remainder only gets its limbs range-checked.
fn collapse<F: PrimeField>(
    cx: &mut CircuitBuilder<F>,
    s: &Sum<F>,
    f: &BigUint,
    almost_reduce: bool,
) -> Result<Field3<F>, Error> {
    if s.rest.is_empty() {
        return Ok(*s.first.as_field3());
    }
    log::debug!("collapsing a lazy sum of {} terms", s.len());
    let mut acc = *s.first.as_field3();
    for (sign, term) in &s.rest {
        acc = single_add(cx, &acc, *sign, term.as_field3(), f)?;
    }
    if almost_reduce {
        let mut checked = assert_almost_reduced(cx, &[acc], f, false)?;
        Ok(*checked.pop().expect("one input, one output").as_field3())
    } else {
        multi_range_check(cx, &acc)?;
        Ok(acc)
    }
}

/// The multiplication gate with its range-check satellites. With
/// `claimed = None` the remainder is witnessed and returned; otherwise the
/// gate proves `x * y = claimed (mod f)`.
fn mul_internal<F: PrimeField>(
    cx: &mut CircuitBuilder<F>,
    x: &Field3<F>,
    y: &Field3<F>,
    claimed: Option<&Field3<F>>,
    f: &BigUint,
) -> Result<Field3<F>, Error> {
    let nf = neg_modulus(f);
    let nf_limbs = split_to_limbs(&nf)?;

    if let (Some(xv), Some(yv)) = (x.as_constant(), y.as_constant()) {
        match claimed {
            None => return Field3::constant(&(xv * yv % f)),
            Some(z) => {
                if let Some(zv) = z.as_constant() {
                    let diff = BigInt::from(xv * yv) - BigInt::from(zv);
                    if !diff.mod_floor(&BigInt::from(f.clone())).is_zero() {
                        return Err(Error::Constraint { gate: "ForeignFieldMul", index: 7 });
                    }
                    return Ok(*z);
                }
            }
        }
    }

    let vals = cx.exists::<14>(|w| {
        let xv = w.field3(x);
        let yv = w.field3(y);
        let product = &xv * &yv;
        let (q, r) = match claimed {
            None => product.div_rem(f),
            Some(z) => {
                let rv = w.field3(z);
                let num = BigInt::from(product.clone()) - BigInt::from(rv.clone());
                if num.is_negative() {
                    return Err(Error::BoundViolation {
                        op: "assertMul",
                        msg: "the claimed remainder exceeds the product".into(),
                    });
                }
                // A remainder of the wrong residue class leaves a non-zero
                // division rest; the resulting carry mismatch fails the gate.
                let q = num.to_biguint().expect("checked non-negative") / f;
                (q, rv)
            }
        };
        log::debug!("foreign mul witness: quotient of {} bits", q.bits());
        let q_l = split_to_limbs(&q)?;
        let (r01, r2) = split_compact(&r)?;
        let x_l = split_to_limbs(&xv)?;
        let y_l = split_to_limbs(&yv)?;

        // Intermediate products of x * y + q * (2^264 - f) by limb weight.
        let p0 = &x_l[0] * &y_l[0] + &q_l[0] * &nf_limbs[0];
        let p1 = &x_l[0] * &y_l[1]
            + &x_l[1] * &y_l[0]
            + &q_l[0] * &nf_limbs[1]
            + &q_l[1] * &nf_limbs[0];
        let p2 = &x_l[0] * &y_l[2]
            + &x_l[2] * &y_l[0]
            + &x_l[1] * &y_l[1]
            + &q_l[0] * &nf_limbs[2]
            + &q_l[1] * &nf_limbs[1]
            + &q_l[2] * &nf_limbs[0];
        let p10 = bits_slice(&p1, 0, LIMB_BITS);
        let p110 = bits_slice(&p1, LIMB_BITS, LIMB_BITS);
        let p111 = &p1 >> (2 * LIMB_BITS);

        let base = BigInt::one() << LIMB_BITS;
        let carry0 = (BigInt::from(&p0 + (&p10 << LIMB_BITS)) - BigInt::from(r01.clone()))
            >> (2 * LIMB_BITS);
        let carry1 = (BigInt::from(&p2 + &p110 + (&p111 << LIMB_BITS)) + &carry0
            - BigInt::from(r2.clone()))
            >> LIMB_BITS;
        let (carry1_hi, carry1_lo) = carry1.div_mod_floor(&base);

        // Bound addition q + (2^264 - f), proving the quotient almost reduced.
        let q01 = &q_l[0] + (&q_l[1] << LIMB_BITS);
        let nf01 = &nf_limbs[0] + (&nf_limbs[1] << LIMB_BITS);
        let q_bound = &q01 + &nf01;
        let q_bound_carry = &q_bound >> (2 * LIMB_BITS);
        let q_bound01 = q_bound & mask(2 * LIMB_BITS);
        let q_bound2 = &q_l[2] + &nf_limbs[2] + &q_bound_carry;

        Ok([
            big_to_fe(&q_l[0]),
            big_to_fe(&q_l[1]),
            big_to_fe(&q_l[2]),
            big_to_fe(&r01),
            big_to_fe(&r2),
            big_to_fe(&p10),
            big_to_fe(&p110),
            big_to_fe(&p111),
            bigint_to_fe(&carry0),
            bigint_to_fe(&carry1_lo),
            bigint_to_fe(&carry1_hi),
            big_to_fe(&q_bound01),
            big_to_fe(&q_bound2),
            big_to_fe(&q_bound_carry),
        ])
    })?;
    let [q0, q1, q2, r01, r2, p10, p110, p111, c0, c1_lo, c1_hi, qb01, qb2, qbc] = vals;
    let quotient = Field3([q0, q1, q2]);

    cx.emit(Gate::ForeignFieldMul {
        left: *x.limbs(),
        right: *y.limbs(),
        quotient: *quotient.limbs(),
        remainder01: r01,
        remainder2: r2,
        product1_lo: p10,
        product1_hi_0: p110,
        product1_hi_1: p111,
        carry0: c0,
        carry1_lo: c1_lo,
        carry1_hi: c1_hi,
        quotient_bound01: qb01,
        quotient_bound2: qb2,
        quotient_bound_carry: qbc,
        modulus_native: big_to_fe(f),
        neg_modulus: [
            big_to_fe(&nf_limbs[0]),
            big_to_fe(&nf_limbs[1]),
            big_to_fe(&nf_limbs[2]),
        ],
    })?;
    cx.emit(Gate::Zero)?;

    if let Some(z) = claimed {
        let compact = cx.linear_combination(
            &[(F::ONE, z.limbs()[0]), (pow2(LIMB_BITS), z.limbs()[1])],
            F::ZERO,
        )?;
        cx.assert_equal(&compact, &r01)?;
        cx.assert_equal(&z.limbs()[2], &r2)?;
    }

    multi_range_check(cx, &quotient)?;
    let remainder = compact_multi_range_check(cx, &r01, &r2)?;
    multi_range_check(cx, &Field3([p10, p110, c1_lo]))?;
    compact_multi_range_check(cx, &qb01, &qb2)?;
    Ok(remainder)
}

/// `x * y mod f`. The result limbs are range-checked; the result is not
/// reduced below `f`.
pub fn mul<F: PrimeField>(
    cx: &mut CircuitBuilder<F>,
    x: &AlmostReduced<F>,
    y: &AlmostReduced<F>,
    f: &BigUint,
) -> Result<Field3<F>, Error> {
    assert_modulus(f);
    mul_internal(cx, x.as_field3(), y.as_field3(), None, f)
}

/// Proves `x * y = z (mod f)` where each operand may be a lazy [`Sum`].
/// Multi-term sums are collapsed here: the factors are re-asserted almost
/// reduced, the remainder only gets its limbs checked.
pub fn assert_mul<F: PrimeField>(
    cx: &mut CircuitBuilder<F>,
    x: impl Into<Sum<F>>,
    y: impl Into<Sum<F>>,
    z: impl Into<Sum<F>>,
    f: &BigUint,
) -> Result<(), Error> {
    assert_modulus(f);
    let x = collapse(cx, &x.into(), f, true)?;
    let y = collapse(cx, &y.into(), f, true)?;
    let z = collapse(cx, &z.into(), f, false)?;
    mul_internal(cx, &x, &y, Some(&z), f).map(|_| ())
}

/// `x^-1 mod f`, proven by `x * z = 1 (mod f)`. Fails with
/// [`Error::NotInvertible`] when `gcd(x, f) != 1`.
pub fn inv<F: PrimeField>(
    cx: &mut CircuitBuilder<F>,
    x: &AlmostReduced<F>,
    f: &BigUint,
) -> Result<AlmostReduced<F>, Error> {
    assert_modulus(f);
    if let Some(xv) = x.as_field3().as_constant() {
        let inv = mod_inverse(&(xv % f), f).ok_or(Error::NotInvertible)?;
        return Ok(AlmostReduced::new(Field3::constant(&inv)?));
    }
    let z = Field3::witness(cx, |w| {
        let xv = w.field3(x.as_field3()) % f;
        mod_inverse(&xv, f).ok_or(Error::NotInvertible)
    })?;
    let z = assert_almost_reduced(cx, &[z], f, false)?
        .pop()
        .expect("one input, one output");
    let one = AlmostReduced::new(Field3::constant(&BigUint::one())?);
    assert_mul(cx, *x, z, one, f)?;
    Ok(z)
}

/// `x / y mod f`, proven by `z * y = x (mod f)`. The dividend must be fully
/// reduced, otherwise the implied quotient would be negative; this is
/// caught at witness time as a bound violation.
pub fn div<F: PrimeField>(
    cx: &mut CircuitBuilder<F>,
    x: &AlmostReduced<F>,
    y: &AlmostReduced<F>,
    f: &BigUint,
) -> Result<AlmostReduced<F>, Error> {
    assert_modulus(f);
    if let (Some(xv), Some(yv)) = (x.as_field3().as_constant(), y.as_field3().as_constant()) {
        let inv = mod_inverse(&(yv % f), f).ok_or(Error::NotInvertible)?;
        return Ok(AlmostReduced::new(Field3::constant(&(xv * inv % f))?));
    }
    let z = Field3::witness(cx, |w| {
        let xv = w.field3(x.as_field3());
        if &xv >= f {
            return Err(Error::BoundViolation {
                op: "div",
                msg: format!("dividend {xv} must be fully reduced below the modulus"),
            });
        }
        let yv = w.field3(y.as_field3()) % f;
        let inv = mod_inverse(&yv, f).ok_or(Error::NotInvertible)?;
        Ok(xv * inv % f)
    })?;
    let z = assert_almost_reduced(cx, &[z], f, false)?
        .pop()
        .expect("one input, one output");
    assert_mul(cx, z, *y, *x, f)?;
    Ok(z)
}
