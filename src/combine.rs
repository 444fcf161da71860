//! Zero-run and CRC-combine (component G).
//!
//! Both operations ride on [`crate::poly::multmodp`]: appending `n` zero
//! bytes to a register is multiplication by `x^(8n)` in the model's
//! polynomial ring, and combining two independently-computed CRCs is the
//! same multiplication applied to the first CRC's contribution before
//! XORing in the second.
//!
//! Derivation of [`crc_combine`]'s formula, in terms of the *internal*
//! register representation each engine works in (public CRC value `v`
//! corresponds to internal value `f(v) = rev ? reverse(v ^ xorout) : v ^
//! xorout`, matching the entry/exit transform `crc_bitwise` applies): for
//! two messages `A`, `B` processed independently from the same seed
//! `model.init`, writing `D(_)` for the zero-seeded internal contribution
//! of a message and `shift = x^(8|B|) mod poly`,
//!
//! ```text
//! crc1_internal = shift(|A|, seed) ⊕ D(A)
//! crc2_internal = shift(|B|, seed) ⊕ D(B)
//! combined_internal = shift(|A|+|B|, seed) ⊕ shift(|B|, D(A)) ⊕ D(B)
//!                    = multmodp(shift, crc1_internal ⊕ seed) ⊕ crc2_internal
//! ```
//!
//! (the two `shift(|A|+|B|, seed)` terms cancel via associativity of
//! `multmodp`). Substituting `f` and using that bit-reversal distributes
//! over XOR collapses the `xorout` terms in `crc1_internal ⊕ seed`
//! exactly (`(crc1^xorout) ^ (init^xorout) = crc1^init`, reversed
//! afterward iff `rev`), leaving the closed form `crc_combine`
//! implements below — valid for `rev` true or false alike.

use crate::bits::reverse;
use crate::model::Model;
use crate::poly::{multmodp, x8nmodp, xnmodp};

/// Applies `n` zero *bits* to a register already holding `crc` — the
/// general zero-run operation, granular down to a single bit (unlike
/// `n` being a byte count). `xnmodp` handles any `n` via square-and-
/// multiply in `O(log n)` field multiplications, whether `n` is a
/// handful of bits or gigabits, so there is no separate small-`n`
/// bit-stepping path here: the same call covers both.
///
/// Frames the inner `multmodp` with the same entry/exit transform
/// `crc_bitwise` applies (XOR by `xorout`, then reverse iff `model.rev`,
/// undone symmetrically on the way out) so `crc` and the return value are
/// both in the public representation every other engine in this crate
/// uses, per spec.md §4.6.
pub fn crc_zeros(model: &Model, crc: u128, n: u64) -> u128 {
    let width = model.width as u32;
    let mut crc = crc ^ model.xorout;
    if model.rev {
        crc = reverse(crc, width);
    }
    crc = multmodp(model, crc, xnmodp(model, n));
    if model.rev {
        crc = reverse(crc, width);
    }
    crc ^ model.xorout
}

/// A precomputed table of `x^(8 * 2^k) mod poly` values, letting
/// [`crc_combine`] shift by an arbitrary byte count in `O(log n)`
/// multiplications instead of recomputing a fresh modular exponentiation
/// per call. Detects the point (if any, within 64 doublings) where the
/// squaring sequence starts repeating, the way a generated standalone
/// source has to in order to keep the embedded table small.
pub struct CombineTable {
    entries: Vec<u128>,
    cycle: usize,
    back: usize,
}

/// Builds a [`CombineTable`] for `model`, covering shift amounts up to
/// `2^63` bytes (far beyond any real message length), short-circuiting
/// early if the squaring sequence cycles before then.
pub fn build_combine_table(model: &Model) -> CombineTable {
    let mut entries = Vec::new();
    let mut seen = std::collections::HashMap::new();
    for k in 0u32..64 {
        let v = x8nmodp(model, 1u64 << k);
        if let Some(&first) = seen.get(&v) {
            return CombineTable {
                entries,
                cycle: first,
                back: k as usize - first,
            };
        }
        seen.insert(v, k as usize);
        entries.push(v);
    }
    let len = entries.len();
    CombineTable {
        entries,
        cycle: len,
        back: 0,
    }
}

impl CombineTable {
    /// The precomputed `x^(8*2^k)` values, for callers (the code
    /// generator) that need to embed them as a literal table rather than
    /// go through [`crc_combine`] directly.
    pub fn exposed_entries(&self) -> &[u128] {
        &self.entries
    }
}

fn shift_factor(table: &CombineTable, bit: usize) -> u128 {
    if bit < table.entries.len() {
        table.entries[bit]
    } else {
        let period = table.back.max(1);
        table.entries[table.cycle + (bit - table.cycle) % period]
    }
}

/// Combines `crc1` (the CRC of some message `a`) and `crc2` (the CRC of
/// some message `b`, computed independently with the same model) into the
/// CRC of `a ++ b`, given only `len2`, the length of `b` in bytes.
///
/// Valid for any model, including `refin != refout` (`model.rev`); see
/// the module-level derivation.
pub fn crc_combine(model: &Model, table: &CombineTable, crc1: u128, crc2: u128, len2: u64) -> u128 {
    let width = model.width as u32;
    let mut shift = if model.ref_ { reverse(1, width) } else { 1 };
    for bit in 0..64 {
        if (len2 >> bit) & 1 != 0 {
            shift = multmodp(model, shift, shift_factor(table, bit));
        }
    }
    let d = crc1 ^ model.init;
    let d = if model.rev { reverse(d, width) } else { d };
    let mm = multmodp(model, shift, d);
    let mm = if model.rev { reverse(mm, width) } else { mm };
    mm ^ crc2
}
