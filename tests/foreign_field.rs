// This file is part of foreign-field-gadgets.
// SPDX-License-Identifier: Apache-2.0
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
// http://www.apache.org/licenses/LICENSE-2.0

//! End-to-end checks of the foreign-field pipeline against big-integer
//! arithmetic, over the secp256k1 base field.

use foreign_field_gadgets::{
    circuit::Gate,
    foreign::{
        add, assert_almost_reduced, assert_less_than, assert_mul, div, inv, mul, sub, sum,
    },
    types::LIMB_BITS,
    utils::{compose_limbs, fe_to_big},
    AlmostReduced, CircuitBuilder, Error, Field3, Sign, Sum,
};
use num_bigint::{BigInt, BigUint, RandBigInt};
use num_integer::Integer;
use num_traits::{One, Zero};
use pasta_curves::Fp;
use rand::{rngs::StdRng, SeedableRng};

const RNG_SEED: [u8; 32] = [
    7, 21, 11, 0, 2, 5, 13, 8, 1, 3, 17, 24, 9, 30, 12, 6, 4, 10, 14, 26, 18, 22, 28, 15, 19,
    23, 27, 31, 16, 20, 25, 29,
];

fn secp256k1_modulus() -> BigUint {
    BigUint::parse_bytes(
        b"fffffffffffffffffffffffffffffffffffffffffffffffffffffffefffffc2f",
        16,
    )
    .expect("valid hex")
}

fn witness_elem(cx: &mut CircuitBuilder<Fp>, v: &BigUint) -> Field3<Fp> {
    let v = v.clone();
    Field3::witness(cx, move |_| Ok(v)).unwrap()
}

fn almost_reduced(cx: &mut CircuitBuilder<Fp>, v: &BigUint, f: &BigUint) -> AlmostReduced<Fp> {
    let x = witness_elem(cx, v);
    assert_almost_reduced(cx, &[x], f, false).unwrap().pop().unwrap()
}

fn read(cx: &CircuitBuilder<Fp>, x: &Field3<Fp>) -> BigUint {
    let limbs = x.limbs();
    compose_limbs(&[
        fe_to_big(cx.value(&limbs[0]).unwrap()),
        fe_to_big(cx.value(&limbs[1]).unwrap()),
        fe_to_big(cx.value(&limbs[2]).unwrap()),
    ])
}

#[test]
fn additive_ops_match_the_oracle() {
    let mut rng = StdRng::from_seed(RNG_SEED);
    let f = secp256k1_modulus();
    for _ in 0..10 {
        let a = rng.gen_biguint_below(&f);
        let b = rng.gen_biguint_below(&f);
        let mut cx = CircuitBuilder::<Fp>::prove();
        let x = witness_elem(&mut cx, &a);
        let y = witness_elem(&mut cx, &b);
        let r = add(&mut cx, &x, &y, &f).unwrap();
        assert_eq!(read(&cx, &r) % &f, (&a + &b) % &f);
        let r = sub(&mut cx, &x, &y, &f).unwrap();
        assert_eq!(
            read(&cx, &r) % &f,
            (BigInt::from(a.clone()) - BigInt::from(b.clone()))
                .mod_floor(&BigInt::from(f.clone()))
                .to_biguint()
                .unwrap()
        );
    }
}

#[test]
fn addition_reduces_exactly_once() {
    let f = secp256k1_modulus();
    let a = &f - 1u8;
    let b = &f - 2u8;
    let mut cx = CircuitBuilder::<Fp>::prove();
    let x = witness_elem(&mut cx, &a);
    let y = witness_elem(&mut cx, &b);
    // a + b = 2f - 3 leaves [0, f), so the modulus is subtracted once and
    // the result is canonical, not merely congruent.
    let r = add(&mut cx, &x, &y, &f).unwrap();
    assert_eq!(read(&cx, &r), &f - 3u8);

    let x = Field3::<Fp>::constant(&a).unwrap();
    let y = Field3::<Fp>::constant(&b).unwrap();
    let r = add(&mut cx, &x, &y, &f).unwrap();
    assert_eq!(r.as_constant(), Some(&f - 3u8));
}

#[test]
fn signed_sums_match_the_oracle() {
    let mut rng = StdRng::from_seed(RNG_SEED);
    let f = secp256k1_modulus();
    for _ in 0..5 {
        let terms: Vec<BigUint> = (0..4).map(|_| rng.gen_biguint_below(&f)).collect();
        let signs = [Sign::Pos, Sign::Neg, Sign::Pos];
        let mut cx = CircuitBuilder::<Fp>::prove();
        let elems: Vec<Field3<Fp>> = terms.iter().map(|t| witness_elem(&mut cx, t)).collect();
        let r = sum(&mut cx, &elems, &signs, &f).unwrap();

        let mut expected = BigInt::from(terms[0].clone());
        for (t, s) in terms[1..].iter().zip(&signs) {
            let t = BigInt::from(t.clone());
            expected += match s {
                Sign::Pos => t,
                Sign::Neg => -t,
            };
        }
        let expected = expected.mod_floor(&BigInt::from(f.clone())).to_biguint().unwrap();
        assert_eq!(read(&cx, &r) % &f, expected);
    }
}

#[test]
fn multiplication_matches_the_oracle() {
    let mut rng = StdRng::from_seed(RNG_SEED);
    let f = secp256k1_modulus();
    for _ in 0..10 {
        let a = rng.gen_biguint_below(&f);
        let b = rng.gen_biguint_below(&f);
        let mut cx = CircuitBuilder::<Fp>::prove();
        let x = almost_reduced(&mut cx, &a, &f);
        let y = almost_reduced(&mut cx, &b, &f);
        let r = mul(&mut cx, &x, &y, &f).unwrap();
        assert_eq!(read(&cx, &r), (&a * &b) % &f);
        assert!(cx
            .gates()
            .iter()
            .any(|g| matches!(g, Gate::ForeignFieldMul { .. })));
    }
}

#[test]
fn multiplication_of_maximal_operands() {
    let f = secp256k1_modulus();
    let max = &f - 1u8;
    let mut cx = CircuitBuilder::<Fp>::prove();
    let x = almost_reduced(&mut cx, &max, &f);
    let y = almost_reduced(&mut cx, &max, &f);
    let r = mul(&mut cx, &x, &y, &f).unwrap();
    assert_eq!(read(&cx, &r), (&max * &max) % &f);
}

#[test]
fn inversion_and_division_match_the_oracle() {
    let mut rng = StdRng::from_seed(RNG_SEED);
    let f = secp256k1_modulus();
    for _ in 0..5 {
        let a = rng.gen_biguint_below(&f);
        let b = rng.gen_biguint_below(&(&f - 1u8)) + 1u8;
        let mut cx = CircuitBuilder::<Fp>::prove();
        let x = almost_reduced(&mut cx, &a, &f);
        let y = almost_reduced(&mut cx, &b, &f);
        let y_inv = inv(&mut cx, &y, &f).unwrap();
        assert_eq!(
            read(&cx, y_inv.as_field3()) * &b % &f,
            BigUint::one()
        );
        let z = div(&mut cx, &x, &y, &f).unwrap();
        assert_eq!(read(&cx, z.as_field3()) * &b % &f, a);
    }
}

#[test]
fn division_by_zero_is_not_invertible() {
    let f = secp256k1_modulus();
    let mut cx = CircuitBuilder::<Fp>::prove();
    let x = almost_reduced(&mut cx, &BigUint::from(7u8), &f);
    let y = almost_reduced(&mut cx, &BigUint::zero(), &f);
    assert!(matches!(
        div(&mut cx, &x, &y, &f),
        Err(Error::NotInvertible)
    ));
}

#[test]
fn division_requires_a_reduced_dividend() {
    let f = secp256k1_modulus();
    let mut cx = CircuitBuilder::<Fp>::prove();
    // f + 1 shares its top limb with f, so it passes the almost-reduced
    // bound while exceeding the modulus.
    let x = almost_reduced(&mut cx, &(&f + 1u8), &f);
    let y = almost_reduced(&mut cx, &BigUint::from(3u8), &f);
    assert!(matches!(
        div(&mut cx, &x, &y, &f),
        Err(Error::BoundViolation { op: "div", .. })
    ));
}

#[test]
fn lazy_sums_as_multiplication_operands() {
    let mut rng = StdRng::from_seed(RNG_SEED);
    let f = secp256k1_modulus();
    for _ in 0..5 {
        let a = rng.gen_biguint_below(&f);
        let b = rng.gen_biguint_below(&f);
        let c = rng.gen_biguint_below(&f);
        let mut cx = CircuitBuilder::<Fp>::prove();
        let x0 = almost_reduced(&mut cx, &a, &f);
        let x1 = almost_reduced(&mut cx, &b, &f);
        let y = almost_reduced(&mut cx, &c, &f);
        let z = (BigInt::from(a.clone()) - BigInt::from(b.clone()))
            .mod_floor(&BigInt::from(f.clone()))
            .to_biguint()
            .unwrap()
            * &c
            % &f;
        let z = almost_reduced(&mut cx, &z, &f);
        assert_mul(&mut cx, Sum::new(x0).sub(x1), y, z, &f).unwrap();
    }
}

#[test]
fn almost_reduced_then_reduced() {
    let f = secp256k1_modulus();
    let mut cx = CircuitBuilder::<Fp>::prove();
    let x = almost_reduced(&mut cx, &(&f - 1u8), &f);
    assert_less_than(&mut cx, &x, &f).unwrap();

    let x = almost_reduced(&mut cx, &f, &f);
    assert!(matches!(
        assert_less_than(&mut cx, &x, &f),
        Err(Error::BoundViolation { .. })
    ));
}

#[test]
fn top_limb_bound_is_enforced() {
    let f = secp256k1_modulus();
    let f2 = &f >> (2 * LIMB_BITS);
    let over = (&f2 + 1u8) << (2 * LIMB_BITS);
    let mut cx = CircuitBuilder::<Fp>::prove();
    let x = witness_elem(&mut cx, &over);
    assert!(matches!(
        assert_almost_reduced(&mut cx, &[x], &f, false),
        Err(Error::BoundViolation { .. })
    ));
}

#[test]
fn batched_almost_reduced_assertions() {
    let mut rng = StdRng::from_seed(RNG_SEED);
    let f = secp256k1_modulus();
    let mut cx = CircuitBuilder::<Fp>::prove();
    let xs: Vec<Field3<Fp>> = (0..4)
        .map(|_| {
            let v = rng.gen_biguint_below(&f);
            witness_elem(&mut cx, &v)
        })
        .collect();
    let checked = assert_almost_reduced(&mut cx, &xs, &f, false).unwrap();
    assert_eq!(checked.len(), 4);
}

#[test]
fn compile_mode_builds_the_same_circuits() {
    let f = secp256k1_modulus();
    for compile in [true, false] {
        let mut cx = if compile {
            CircuitBuilder::<Fp>::compile()
        } else {
            CircuitBuilder::<Fp>::prove()
        };
        let x = Field3::witness(&mut cx, |_| Ok(BigUint::from(5u8))).unwrap();
        let y = Field3::witness(&mut cx, |_| Ok(BigUint::from(7u8))).unwrap();
        let mut reduced = assert_almost_reduced(&mut cx, &[x, y], &f, false).unwrap();
        let y = reduced.pop().unwrap();
        let x = reduced.pop().unwrap();
        let product = mul(&mut cx, &x, &y, &f).unwrap();
        let s = add(&mut cx, &product, x.as_field3(), &f).unwrap();
        assert_eq!(is_symbolic(&cx, &s), compile);
        assert!(cx.gate_count() > 0);
    }
}

fn is_symbolic(cx: &CircuitBuilder<Fp>, x: &Field3<Fp>) -> bool {
    x.limbs().iter().all(|l| cx.value(l).is_err())
}

#[test]
fn identical_gate_layout_in_both_modes() {
    let f = secp256k1_modulus();
    let build = |mut cx: CircuitBuilder<Fp>| -> Vec<&'static str> {
        let x = Field3::witness(&mut cx, |_| Ok(BigUint::from(11u8))).unwrap();
        let y = Field3::witness(&mut cx, |_| Ok(BigUint::from(13u8))).unwrap();
        let mut ar = assert_almost_reduced(&mut cx, &[x, y], &f, false).unwrap();
        let y = ar.pop().unwrap();
        let x = ar.pop().unwrap();
        mul(&mut cx, &x, &y, &f).unwrap();
        cx.gates().iter().map(|g| g.name()).collect()
    };
    let compiled = build(CircuitBuilder::compile());
    let proven = build(CircuitBuilder::prove());
    assert_eq!(compiled, proven);
}

#[test]
fn sum_requires_matching_signs() {
    let f = secp256k1_modulus();
    let mut cx = CircuitBuilder::<Fp>::prove();
    let x = witness_elem(&mut cx, &BigUint::zero());
    let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
        let _ = sum(&mut cx, &[x], &[Sign::Pos], &f);
    }));
    assert!(result.is_err());
}
