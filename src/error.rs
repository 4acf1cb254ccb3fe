// This file is part of foreign-field-gadgets.
// SPDX-License-Identifier: Apache-2.0
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
// http://www.apache.org/licenses/LICENSE-2.0

//! Error type shared by all gadgets.

use thiserror::Error;

/// Errors raised while building a circuit or computing its witnesses.
///
/// Range and bound violations are detected while witnessing, before any
/// gate is recorded, so they carry the offending value. Constraint errors
/// are raised when a recorded gate does not hold on concrete values.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Error {
    /// A witnessed value does not fit in the claimed number of bits.
    #[error("value {value} does not fit in {bits} bits")]
    RangeViolation { value: String, bits: usize },

    /// An operation-specific bound on a witnessed value was exceeded.
    #[error("bound violation in {op}: {msg}")]
    BoundViolation { op: &'static str, msg: String },

    /// A gate equation does not hold on the assigned values.
    #[error("{gate} gate: constraint {index} is not satisfied")]
    Constraint { gate: &'static str, index: usize },

    /// Subtraction result fell below the negated modulus.
    #[error("subtraction underflow: result is below -modulus")]
    Underflow,

    /// Division or inversion by an element sharing a factor with the modulus.
    #[error("element is not invertible modulo the foreign modulus")]
    NotInvertible,

    /// The gadget API was used in a way that violates its structural contract.
    #[error("misuse: {0}")]
    Misuse(String),

    /// A symbolic value was read outside a witness block.
    #[error("cannot read the value of a symbolic variable")]
    SymbolicRead,
}

impl Error {
    pub(crate) fn range(value: &num_bigint::BigUint, bits: usize) -> Self {
        Error::RangeViolation {
            value: value.to_string(),
            bits,
        }
    }
}
