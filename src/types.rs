// This file is part of foreign-field-gadgets.
// SPDX-License-Identifier: Apache-2.0
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
// http://www.apache.org/licenses/LICENSE-2.0

//! Core value types: native circuit variables, foreign-field elements in
//! 88-bit limb form and the bound markers attached to them.

use ff::PrimeField;
use num_bigint::BigUint;

use crate::{
    circuit::{CircuitBuilder, WitnessHandle},
    error::Error,
    utils::{big_to_fe, compose_limbs, fe_to_big, split_to_limbs},
};

/// Number of bits per limb.
pub const LIMB_BITS: usize = 88;

/// Number of limbs of a foreign-field element.
pub const NB_LIMBS: usize = 3;

/// A native field value inside the circuit. Constants are free, variables
/// index a cell of the builder's assignment.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AssignedNative<F: PrimeField> {
    Constant(F),
    Var(usize),
}

impl<F: PrimeField> AssignedNative<F> {
    /// The zero constant.
    pub fn zero() -> Self {
        AssignedNative::Constant(F::ZERO)
    }

    pub fn as_constant(&self) -> Option<F> {
        match self {
            AssignedNative::Constant(c) => Some(*c),
            AssignedNative::Var(_) => None,
        }
    }
}

/// A foreign-field element as three little-endian 88-bit limbs.
///
/// The type carries no guarantee that the limbs are in range. Gadgets that
/// require range-checked limbs take [`AlmostReduced`] or [`Reduced`], which
/// can only be produced by the corresponding assertions.
#[derive(Clone, Copy, Debug)]
pub struct Field3<F: PrimeField>(pub [AssignedNative<F>; NB_LIMBS]);

impl<F: PrimeField> Field3<F> {
    /// A constant element. Fails if `x` exceeds the limb capacity `2^264`.
    pub fn constant(x: &BigUint) -> Result<Self, Error> {
        let limbs = split_to_limbs(x)?;
        Ok(Field3(limbs.map(|l| AssignedNative::Constant(big_to_fe(&l)))))
    }

    /// Witnesses a new element from a prover-side computation. The closure
    /// only runs in prove mode; in compile mode unassigned limb variables
    /// are allocated.
    pub fn witness(
        cx: &mut CircuitBuilder<F>,
        compute: impl FnOnce(&WitnessHandle<'_, F>) -> Result<BigUint, Error>,
    ) -> Result<Self, Error> {
        let limbs = cx.exists(|w| {
            let x = compute(w)?;
            let limbs = split_to_limbs(&x)?;
            Ok(limbs.map(|l| big_to_fe(&l)))
        })?;
        Ok(Field3(limbs))
    }

    pub fn limbs(&self) -> &[AssignedNative<F>; NB_LIMBS] {
        &self.0
    }

    /// The composed integer value when all limbs are constants.
    pub fn as_constant(&self) -> Option<BigUint> {
        let limbs: Option<Vec<_>> = self.0.iter().map(|l| l.as_constant()).collect();
        let limbs: [BigUint; NB_LIMBS] = limbs?
            .into_iter()
            .map(fe_to_big)
            .collect::<Vec<_>>()
            .try_into()
            .ok()?;
        Some(compose_limbs(&limbs))
    }
}

/// A [`Field3`] whose limbs are range-checked to 88 bits and whose top limb
/// is bounded by the top limb of the modulus. This is the input contract of
/// multiplication; see [`crate::foreign::assert_almost_reduced`].
#[derive(Clone, Copy, Debug)]
pub struct AlmostReduced<F: PrimeField>(Field3<F>);

impl<F: PrimeField> AlmostReduced<F> {
    pub(crate) fn new(x: Field3<F>) -> Self {
        AlmostReduced(x)
    }

    pub fn as_field3(&self) -> &Field3<F> {
        &self.0
    }
}

/// A [`Field3`] proven fully reduced, i.e. strictly below the modulus.
/// Produced by [`crate::foreign::assert_less_than`].
#[derive(Clone, Copy, Debug)]
pub struct Reduced<F: PrimeField>(Field3<F>);

impl<F: PrimeField> Reduced<F> {
    pub(crate) fn new(x: Field3<F>) -> Self {
        Reduced(x)
    }

    pub fn as_field3(&self) -> &Field3<F> {
        &self.0
    }
}

impl<F: PrimeField> From<Reduced<F>> for AlmostReduced<F> {
    fn from(x: Reduced<F>) -> Self {
        AlmostReduced(x.0)
    }
}

/// Sign of a term in a lazy [`Sum`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Sign {
    Pos,
    Neg,
}

impl Sign {
    pub(crate) fn as_field<F: PrimeField>(&self) -> F {
        match self {
            Sign::Pos => F::ONE,
            Sign::Neg => -F::ONE,
        }
    }

    pub(crate) fn as_i8(&self) -> i8 {
        match self {
            Sign::Pos => 1,
            Sign::Neg => -1,
        }
    }
}

/// A lazy, unreduced sum of almost-reduced terms.
///
/// Additions and subtractions are only recorded here; the chain of
/// foreign-field additions is emitted when the sum is used as an operand of
/// [`crate::foreign::assert_mul`]. With `n` terms the collapsed value is
/// bounded by `n * 2^264`, so chains must stay well below the native
/// capacity; in practice sums of a handful of terms are used.
#[derive(Clone, Debug)]
pub struct Sum<F: PrimeField> {
    pub(crate) first: AlmostReduced<F>,
    pub(crate) rest: Vec<(Sign, AlmostReduced<F>)>,
}

impl<F: PrimeField> Sum<F> {
    pub fn new(x: AlmostReduced<F>) -> Self {
        Sum { first: x, rest: Vec::new() }
    }

    pub fn add(mut self, y: AlmostReduced<F>) -> Self {
        self.rest.push((Sign::Pos, y));
        self
    }

    pub fn sub(mut self, y: AlmostReduced<F>) -> Self {
        self.rest.push((Sign::Neg, y));
        self
    }

    /// Number of terms in the sum.
    pub fn len(&self) -> usize {
        1 + self.rest.len()
    }

    pub fn is_empty(&self) -> bool {
        false
    }
}

impl<F: PrimeField> From<AlmostReduced<F>> for Sum<F> {
    fn from(x: AlmostReduced<F>) -> Self {
        Sum::new(x)
    }
}

impl<F: PrimeField> From<Reduced<F>> for Sum<F> {
    fn from(x: Reduced<F>) -> Self {
        Sum::new(x.into())
    }
}
