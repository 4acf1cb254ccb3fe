// This file is part of foreign-field-gadgets.
// SPDX-License-Identifier: Apache-2.0
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
// http://www.apache.org/licenses/LICENSE-2.0

//! Slicing limbed values into fixed-size bit chunks, and byte
//! conversions for single native words.
//!
//! A chunk may straddle a limb boundary, in which case the pieces from the
//! two limbs are recombined with the appropriate shift. Limbs must be fed
//! in little-endian order so that the straddling state lines up; feeding
//! them out of order is a structural error.

use ff::PrimeField;
use itertools::Itertools;

use crate::{
    circuit::CircuitBuilder,
    error::Error,
    range_check::{range_check8, range_check_small},
    types::{AssignedNative, Field3, LIMB_BITS, NB_LIMBS},
    utils::{big_to_fe, bits_slice, fe_to_big, pow2},
};

/// Incremental chunking of a limbed value into `chunk_size`-bit pieces.
///
/// Feed limbs with [`SliceState::slice_limb`] in order; each call returns
/// the chunks completed by that limb. A chunk straddling into the next limb
/// stays pending until the next call. [`SliceState::take_pending`] yields
/// the final truncated chunk, if any.
pub struct SliceState<F: PrimeField> {
    max_bits: usize,
    chunk_size: usize,
    next_limb: usize,
    consumed: usize,
    filled: usize,
    partial: Option<AssignedNative<F>>,
}

impl<F: PrimeField> SliceState<F> {
    /// Panics if `chunk_size` is not in `1..=16` or `max_bits` exceeds the
    /// limb capacity.
    pub fn new(max_bits: usize, chunk_size: usize) -> Self {
        assert!(
            (1..=16).contains(&chunk_size),
            "chunk size must be between 1 and 16 bits, got {chunk_size}"
        );
        assert!(
            max_bits >= 1 && max_bits <= NB_LIMBS * LIMB_BITS,
            "cannot slice {max_bits} bits out of three 88-bit limbs"
        );
        SliceState {
            max_bits,
            chunk_size,
            next_limb: 0,
            consumed: 0,
            filled: 0,
            partial: None,
        }
    }

    /// Number of bits currently pending in an incomplete chunk.
    pub fn pending_bits(&self) -> usize {
        self.filled
    }

    /// The final, possibly truncated, chunk.
    pub fn take_pending(&mut self) -> Option<AssignedNative<F>> {
        self.filled = 0;
        self.partial.take()
    }

    /// Slices the next limb into pieces, range-checks them, constrains them
    /// to recompose into the limb and returns the chunks completed here.
    ///
    /// The limb is bounded to `min(88, max_bits - consumed)` bits by the
    /// recomposition constraint; a wider limb fails at witness time.
    pub fn slice_limb(
        &mut self,
        cx: &mut CircuitBuilder<F>,
        limb: &AssignedNative<F>,
        limb_index: usize,
    ) -> Result<Vec<AssignedNative<F>>, Error> {
        if limb_index != self.next_limb {
            return Err(Error::Misuse(format!(
                "limbs must be sliced in little-endian order: expected limb {}, got limb {}",
                self.next_limb, limb_index
            )));
        }
        if self.consumed >= self.max_bits {
            return Err(Error::Misuse(format!(
                "all {} bits have already been sliced",
                self.max_bits
            )));
        }
        let limb_bits = (self.max_bits - self.consumed).min(LIMB_BITS);

        let mut widths = Vec::new();
        let mut rem = limb_bits;
        if self.filled > 0 {
            let w = (self.chunk_size - self.filled).min(rem);
            widths.push(w);
            rem -= w;
        }
        while rem > 0 {
            let w = self.chunk_size.min(rem);
            widths.push(w);
            rem -= w;
        }
        let offsets: Vec<usize> = widths
            .iter()
            .scan(0, |acc, w| {
                let o = *acc;
                *acc += w;
                Some(o)
            })
            .collect();

        let pieces = cx.exists_vec(widths.len(), |w| {
            let v = w.big(limb);
            if v.bits() as usize > limb_bits {
                return Err(Error::range(&v, limb_bits));
            }
            Ok(offsets
                .iter()
                .zip(&widths)
                .map(|(o, wd)| big_to_fe(&bits_slice(&v, *o, *wd)))
                .collect())
        })?;
        for (piece, wd) in pieces.iter().zip(&widths) {
            range_check_small(cx, piece, *wd)?;
        }
        let terms: Vec<_> = pieces
            .iter()
            .zip(&offsets)
            .map(|(piece, o)| (pow2::<F>(*o), *piece))
            .collect();
        let recomposed = cx.linear_combination(&terms, F::ZERO)?;
        cx.assert_equal(&recomposed, limb)?;

        let mut done = Vec::new();
        for (piece, wd) in pieces.iter().zip(&widths) {
            match self.partial.take() {
                None => {
                    if *wd == self.chunk_size {
                        done.push(*piece);
                    } else {
                        self.partial = Some(*piece);
                        self.filled = *wd;
                    }
                }
                Some(pending) => {
                    let merged = cx.linear_combination(
                        &[(F::ONE, pending), (pow2(self.filled), *piece)],
                        F::ZERO,
                    )?;
                    self.filled += wd;
                    if self.filled == self.chunk_size {
                        done.push(merged);
                        self.filled = 0;
                    } else {
                        self.partial = Some(merged);
                    }
                }
            }
        }
        self.consumed += limb_bits;
        self.next_limb += 1;
        Ok(done)
    }
}

/// Slices the low `max_bits` bits of `x` into `chunk_size`-bit chunks,
/// little-endian. The last chunk may be narrower. Limbs above `max_bits`
/// are not touched.
pub fn slice_field3<F: PrimeField>(
    cx: &mut CircuitBuilder<F>,
    x: &Field3<F>,
    max_bits: usize,
    chunk_size: usize,
) -> Result<Vec<AssignedNative<F>>, Error> {
    let mut state = SliceState::new(max_bits, chunk_size);
    let nb_limbs = max_bits.div_ceil(LIMB_BITS);
    let mut chunks = Vec::new();
    for (i, limb) in x.limbs().iter().take(nb_limbs).enumerate() {
        chunks.extend(state.slice_limb(cx, limb, i)?);
    }
    chunks.extend(state.take_pending());
    Ok(chunks)
}

/// Packs little-endian bytes into a single word. The bytes are assumed to
/// be 8-bit checked already; at most 31 bytes fit in a native element.
pub fn bytes_to_word<F: PrimeField>(
    cx: &mut CircuitBuilder<F>,
    bytes: &[AssignedNative<F>],
) -> Result<AssignedNative<F>, Error> {
    assert!(
        !bytes.is_empty() && bytes.len() <= 31,
        "a word packs between 1 and 31 bytes, got {}",
        bytes.len()
    );
    let terms: Vec<_> = bytes
        .iter()
        .enumerate()
        .map(|(i, byte)| (pow2::<F>(8 * i), *byte))
        .collect();
    cx.linear_combination(&terms, F::ZERO)
}

/// Unpacks `word < 2^(8 * nb_bytes)` into `nb_bytes` little-endian bytes,
/// each 8-bit checked.
pub fn word_to_bytes<F: PrimeField>(
    cx: &mut CircuitBuilder<F>,
    word: &AssignedNative<F>,
    nb_bytes: usize,
) -> Result<Vec<AssignedNative<F>>, Error> {
    assert!(
        nb_bytes >= 1 && nb_bytes <= 31,
        "a word unpacks into between 1 and 31 bytes, got {nb_bytes}"
    );
    if let Some(c) = word.as_constant() {
        let big = fe_to_big(c);
        if big.bits() as usize > 8 * nb_bytes {
            return Err(Error::range(&big, 8 * nb_bytes));
        }
        return Ok((0..nb_bytes)
            .map(|i| AssignedNative::Constant(big_to_fe(&bits_slice(&big, 8 * i, 8))))
            .collect());
    }
    let bytes = cx.exists_vec(nb_bytes, |w| {
        let v = w.big(word);
        if v.bits() as usize > 8 * nb_bytes {
            return Err(Error::range(&v, 8 * nb_bytes));
        }
        Ok((0..nb_bytes).map(|i| big_to_fe(&bits_slice(&v, 8 * i, 8))).collect())
    })?;
    for byte in &bytes {
        range_check8(cx, byte)?;
    }
    let terms: Vec<_> = bytes
        .iter()
        .enumerate()
        .map(|(i, byte)| (pow2::<F>(8 * i), *byte))
        .collect();
    let recomposed = cx.linear_combination(&terms, F::ZERO)?;
    cx.assert_equal(&recomposed, word)?;
    Ok(bytes)
}

/// Unpacks each word into `bytes_per_word` bytes and concatenates them.
pub fn words_to_bytes<F: PrimeField>(
    cx: &mut CircuitBuilder<F>,
    words: &[AssignedNative<F>],
    bytes_per_word: usize,
) -> Result<Vec<AssignedNative<F>>, Error> {
    let mut bytes = Vec::with_capacity(words.len() * bytes_per_word);
    for word in words {
        bytes.extend(word_to_bytes(cx, word, bytes_per_word)?);
    }
    Ok(bytes)
}

/// Packs bytes into words of `bytes_per_word` bytes each, zero-padding the
/// final word.
pub fn bytes_to_words<F: PrimeField>(
    cx: &mut CircuitBuilder<F>,
    bytes: &[AssignedNative<F>],
    bytes_per_word: usize,
) -> Result<Vec<AssignedNative<F>>, Error> {
    let mut words = Vec::with_capacity(bytes.len().div_ceil(bytes_per_word));
    for chunk in &bytes.iter().copied().chunks(bytes_per_word) {
        let mut group: Vec<_> = chunk.collect();
        group.resize(bytes_per_word, AssignedNative::zero());
        words.push(bytes_to_word(cx, &group)?);
    }
    Ok(words)
}

#[cfg(test)]
mod tests {
    use num_bigint::BigUint;
    use num_traits::One;
    use pasta_curves::Fp;

    use super::*;
    use crate::utils::mask;

    fn witness_field3(cx: &mut CircuitBuilder<Fp>, v: &BigUint) -> Field3<Fp> {
        let v = v.clone();
        Field3::witness(cx, move |_| Ok(v)).unwrap()
    }

    #[test]
    fn chunks_recompose_across_limb_boundary() {
        let mut cx = CircuitBuilder::<Fp>::prove();
        // 96 bits of alternating bytes; chunk 88 = 5 * 16 + 8, so the sixth
        // chunk straddles into the second limb.
        let value = (0..12).fold(BigUint::one(), |acc, _| (acc << 8) + 0xa5u8) & mask(96);
        let x = witness_field3(&mut cx, &value);
        let chunks = slice_field3(&mut cx, &x, 96, 16).unwrap();
        assert_eq!(chunks.len(), 6);
        let recomposed = chunks.iter().enumerate().fold(BigUint::from(0u8), |acc, (i, c)| {
            acc + (fe_to_big(cx.value(c).unwrap()) << (16 * i))
        });
        assert_eq!(recomposed, value);
    }

    #[test]
    fn truncated_final_chunk() {
        let mut cx = CircuitBuilder::<Fp>::prove();
        let value = BigUint::from(0b1_0110u32);
        let x = witness_field3(&mut cx, &value);
        let chunks = slice_field3(&mut cx, &x, 5, 4).unwrap();
        assert_eq!(chunks.len(), 2);
        assert_eq!(cx.value(&chunks[0]).unwrap(), Fp::from(0b0110));
        assert_eq!(cx.value(&chunks[1]).unwrap(), Fp::from(0b1));
    }

    #[test]
    fn out_of_order_limbs_are_rejected() {
        let mut cx = CircuitBuilder::<Fp>::prove();
        let x = witness_field3(&mut cx, &BigUint::from(42u8));
        let mut state = SliceState::new(176, 8);
        assert!(matches!(
            state.slice_limb(&mut cx, &x.limbs()[1], 1),
            Err(Error::Misuse(_))
        ));
        state.slice_limb(&mut cx, &x.limbs()[0], 0).unwrap();
        assert!(matches!(
            state.slice_limb(&mut cx, &x.limbs()[0], 0),
            Err(Error::Misuse(_))
        ));
    }

    #[test]
    fn oversized_limb_fails() {
        let mut cx = CircuitBuilder::<Fp>::prove();
        // The limb holds 66 bits but only 64 are sliced.
        let v: Fp = big_to_fe(&(BigUint::one() << 65u32));
        let [limb0] = cx.exists(|_| Ok([v])).unwrap();
        let mut state = SliceState::<Fp>::new(64, 8);
        assert!(matches!(
            state.slice_limb(&mut cx, &limb0, 0),
            Err(Error::RangeViolation { .. })
        ));
    }

    #[test]
    fn bytes_roundtrip_through_words() {
        let mut cx = CircuitBuilder::<Fp>::prove();
        let raw: Vec<u8> = (1..=16).collect();
        let bytes: Vec<_> = raw
            .iter()
            .map(|b| {
                let v = Fp::from(*b as u64);
                let [x] = cx.exists(|_| Ok([v])).unwrap();
                x
            })
            .collect();
        let words = bytes_to_words(&mut cx, &bytes, 8).unwrap();
        assert_eq!(words.len(), 2);
        let back = words_to_bytes(&mut cx, &words, 8).unwrap();
        assert_eq!(back.len(), raw.len());
        for (b, expected) in back.iter().zip(&raw) {
            assert_eq!(cx.value(b).unwrap(), Fp::from(*expected as u64));
        }
    }

    #[test]
    fn word_to_bytes_requires_capacity() {
        let mut cx = CircuitBuilder::<Fp>::prove();
        let v = Fp::from(1u64 << 16);
        let [word] = cx.exists(|_| Ok([v])).unwrap();
        assert!(matches!(
            word_to_bytes(&mut cx, &word, 2),
            Err(Error::RangeViolation { bits: 16, .. })
        ));
    }
}
