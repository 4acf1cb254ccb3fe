// This file is part of foreign-field-gadgets.
// SPDX-License-Identifier: Apache-2.0
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
// http://www.apache.org/licenses/LICENSE-2.0

//! Gadgets for emulated (foreign-field) arithmetic over 88-bit limbs,
//! together with the range-check, bit-slicing and bitwise primitives they
//! are built from.
//!
//! All gadgets operate through a [`CircuitBuilder`], which either lays out
//! gates symbolically (compile mode) or additionally computes witnesses and
//! checks every gate on the fly (prove mode). Foreign-field elements are
//! [`types::Field3`] limb triples; the [`types::AlmostReduced`] and
//! [`types::Reduced`] wrappers witness which bound has been proven about
//! them and gate the operations that rely on those bounds.

#![deny(rustdoc::broken_intra_doc_links)]

pub mod arithmetic;
pub mod bit_slices;
pub mod bitwise;
pub mod circuit;
pub mod error;
pub mod foreign;
pub mod range_check;
pub mod types;
pub mod utils;

pub use circuit::{CircuitBuilder, Gate, Mode, WitnessHandle};
pub use error::Error;
pub use types::{AlmostReduced, AssignedNative, Field3, Reduced, Sign, Sum};
