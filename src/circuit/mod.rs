// This file is part of foreign-field-gadgets.
// SPDX-License-Identifier: Apache-2.0
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
// http://www.apache.org/licenses/LICENSE-2.0

//! The circuit builder: variable allocation, witness blocks and gate
//! recording.
//!
//! The builder runs in one of two modes. In compile mode it only lays out
//! variables and gates; witness blocks are skipped and every variable stays
//! symbolic. In prove mode witness blocks run for real, every variable
//! carries a concrete value, and each gate is checked against the
//! assignment the moment it is recorded.

mod gates;

use ff::PrimeField;
use num_bigint::BigUint;

use crate::{
    error::Error,
    types::{AssignedNative, Field3},
    utils::{compose_limbs, fe_to_big},
};

pub use gates::Gate;

/// Builder mode.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Mode {
    /// Lay out the circuit without witness values.
    Compile,
    /// Compute witnesses and check every gate as it is recorded.
    Prove,
}

/// Records variables and gates for a single circuit.
#[derive(Debug)]
pub struct CircuitBuilder<F: PrimeField> {
    mode: Mode,
    values: Vec<Option<F>>,
    gates: Vec<Gate<F>>,
}

impl<F: PrimeField> CircuitBuilder<F> {
    pub fn new(mode: Mode) -> Self {
        CircuitBuilder { mode, values: Vec::new(), gates: Vec::new() }
    }

    pub fn compile() -> Self {
        Self::new(Mode::Compile)
    }

    pub fn prove() -> Self {
        Self::new(Mode::Prove)
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    /// Whether variables carry concrete values.
    pub fn is_concrete(&self) -> bool {
        self.mode == Mode::Prove
    }

    pub fn gates(&self) -> &[Gate<F>] {
        &self.gates
    }

    pub fn gate_count(&self) -> usize {
        self.gates.len()
    }

    fn alloc(&mut self, value: Option<F>) -> AssignedNative<F> {
        let idx = self.values.len();
        self.values.push(value);
        AssignedNative::Var(idx)
    }

    pub(crate) fn resolve(&self, x: &AssignedNative<F>) -> Option<F> {
        match x {
            AssignedNative::Constant(c) => Some(*c),
            AssignedNative::Var(i) => self.values[*i],
        }
    }

    /// The concrete value of `x`. Fails on a symbolic variable, i.e. any
    /// variable in compile mode.
    pub fn value(&self, x: &AssignedNative<F>) -> Result<F, Error> {
        self.resolve(x).ok_or(Error::SymbolicRead)
    }

    /// Allocates `N` variables from a prover-side computation. The closure
    /// runs in prove mode only; in compile mode the variables stay
    /// symbolic.
    pub fn exists<const N: usize>(
        &mut self,
        compute: impl FnOnce(&WitnessHandle<'_, F>) -> Result<[F; N], Error>,
    ) -> Result<[AssignedNative<F>; N], Error> {
        match self.mode {
            Mode::Compile => {
                let mut out = [AssignedNative::Constant(F::ZERO); N];
                for slot in out.iter_mut() {
                    *slot = self.alloc(None);
                }
                Ok(out)
            }
            Mode::Prove => {
                let vals = compute(&WitnessHandle { builder: self })?;
                Ok(vals.map(|val| self.alloc(Some(val))))
            }
        }
    }

    /// Like [`Self::exists`] with a run-time count of variables.
    pub fn exists_vec(
        &mut self,
        n: usize,
        compute: impl FnOnce(&WitnessHandle<'_, F>) -> Result<Vec<F>, Error>,
    ) -> Result<Vec<AssignedNative<F>>, Error> {
        match self.mode {
            Mode::Compile => Ok((0..n).map(|_| self.alloc(None)).collect()),
            Mode::Prove => {
                let vals = compute(&WitnessHandle { builder: self })?;
                debug_assert_eq!(vals.len(), n);
                Ok(vals.into_iter().map(|val| self.alloc(Some(val))).collect())
            }
        }
    }

    /// Records a gate, checking it against the assignment in prove mode.
    pub(crate) fn emit(&mut self, gate: Gate<F>) -> Result<(), Error> {
        if self.is_concrete() {
            gate.check(self)?;
        }
        self.gates.push(gate);
        Ok(())
    }

    /// `constant + sum(c_i * x_i)` as a new variable, constrained by a
    /// generic gate. Folds to a constant when all terms are constants.
    pub fn linear_combination(
        &mut self,
        terms: &[(F, AssignedNative<F>)],
        constant: F,
    ) -> Result<AssignedNative<F>, Error> {
        let fold: Option<F> = terms
            .iter()
            .try_fold(constant, |acc, (c, x)| Some(acc + *c * x.as_constant()?));
        if let Some(value) = fold {
            return Ok(AssignedNative::Constant(value));
        }
        let out = match self.mode {
            Mode::Compile => self.alloc(None),
            Mode::Prove => {
                let mut acc = constant;
                for (c, x) in terms {
                    acc += *c * self.value(x)?;
                }
                self.alloc(Some(acc))
            }
        };
        let mut all = terms.to_vec();
        all.push((-F::ONE, out));
        self.emit(Gate::Generic { terms: all, mul: None, constant })?;
        Ok(out)
    }

    pub fn add(
        &mut self,
        a: &AssignedNative<F>,
        b: &AssignedNative<F>,
    ) -> Result<AssignedNative<F>, Error> {
        self.linear_combination(&[(F::ONE, *a), (F::ONE, *b)], F::ZERO)
    }

    pub fn sub(
        &mut self,
        a: &AssignedNative<F>,
        b: &AssignedNative<F>,
    ) -> Result<AssignedNative<F>, Error> {
        self.linear_combination(&[(F::ONE, *a), (-F::ONE, *b)], F::ZERO)
    }

    pub fn add_constant(
        &mut self,
        a: &AssignedNative<F>,
        k: F,
    ) -> Result<AssignedNative<F>, Error> {
        self.linear_combination(&[(F::ONE, *a)], k)
    }

    /// `a * b` as a new variable.
    pub fn mul(
        &mut self,
        a: &AssignedNative<F>,
        b: &AssignedNative<F>,
    ) -> Result<AssignedNative<F>, Error> {
        if let (Some(a), Some(b)) = (a.as_constant(), b.as_constant()) {
            return Ok(AssignedNative::Constant(a * b));
        }
        let out = match self.mode {
            Mode::Compile => self.alloc(None),
            Mode::Prove => {
                let val = self.value(a)? * self.value(b)?;
                self.alloc(Some(val))
            }
        };
        self.emit(Gate::Generic {
            terms: vec![(-F::ONE, out)],
            mul: Some((F::ONE, *a, *b)),
            constant: F::ZERO,
        })?;
        Ok(out)
    }

    pub fn assert_equal(
        &mut self,
        a: &AssignedNative<F>,
        b: &AssignedNative<F>,
    ) -> Result<(), Error> {
        if let (Some(a), Some(b)) = (a.as_constant(), b.as_constant()) {
            if a != b {
                return Err(Error::Constraint { gate: "Generic", index: 1 });
            }
            return Ok(());
        }
        self.emit(Gate::Generic {
            terms: vec![(F::ONE, *a), (-F::ONE, *b)],
            mul: None,
            constant: F::ZERO,
        })
    }

    pub fn assert_zero(&mut self, a: &AssignedNative<F>) -> Result<(), Error> {
        self.assert_equal(a, &AssignedNative::zero())
    }

    /// Constrains `a * (a - 1) = 0`.
    pub fn assert_bool(&mut self, a: &AssignedNative<F>) -> Result<(), Error> {
        if let Some(a) = a.as_constant() {
            if a != F::ZERO && a != F::ONE {
                return Err(Error::Constraint { gate: "Generic", index: 1 });
            }
            return Ok(());
        }
        self.emit(Gate::Generic {
            terms: vec![(-F::ONE, *a)],
            mul: Some((F::ONE, *a, *a)),
            constant: F::ZERO,
        })
    }
}

/// Read-only access to assigned values inside a witness block.
pub struct WitnessHandle<'a, F: PrimeField> {
    builder: &'a CircuitBuilder<F>,
}

impl<F: PrimeField> WitnessHandle<'_, F> {
    /// The value of a native variable.
    pub fn value(&self, x: &AssignedNative<F>) -> F {
        self.builder
            .resolve(x)
            .expect("all variables are assigned in prove mode")
    }

    /// The value of a native variable as an unsigned integer.
    pub fn big(&self, x: &AssignedNative<F>) -> BigUint {
        fe_to_big(self.value(x))
    }

    /// The composed integer value of a limbed element.
    pub fn field3(&self, x: &Field3<F>) -> BigUint {
        let limbs = x.limbs();
        compose_limbs(&[self.big(&limbs[0]), self.big(&limbs[1]), self.big(&limbs[2])])
    }
}
