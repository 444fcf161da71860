//! Slice-by-N CRC evaluation (component E).
//!
//! Builds on [`crate::engine`]'s bytewise table by deriving `lanes` further
//! tables, each holding the effect of a byte at one position within an
//! N-byte chunk, so a whole chunk can be folded in with table lookups and
//! XORs instead of sequential byte steps.
//!
//! The hot loop groups bytes by `w = ceil(width/8)`, the model's own
//! register width, rather than the full `lanes` count `WordTable` was
//! built with: `lanes` only controls how many tables get derived up
//! front (sized for a caller that wants to benchmark wider lanes, or for
//! [`crate::codegen`] to emit a matching table size), while the loop here
//! only ever consumes the first `w` of them. This covers both the
//! reflected and non-reflected cases uniformly through one derivation
//! (see `merge_group` below) instead of vectorising only the reflected
//! half of the model matrix.

use crate::bits::{ones, reverse};
use crate::engine::{crc_bytewise, ByteTable};
use crate::model::Model;

/// Width, in bytes, of the chunk processed per inner-loop iteration.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LaneWidth {
    W32,
    W64,
    W128,
}

impl LaneWidth {
    pub fn bytes(self) -> usize {
        match self {
            LaneWidth::W32 => 4,
            LaneWidth::W64 => 8,
            LaneWidth::W128 => 16,
        }
    }
}

/// The derived per-lane tables for a model, built once and reused across
/// calls to [`crc_wordwise`].
///
/// `little` records which word endianness this table set was built for —
/// see [`crc_table_wordwise`]'s module docs. In this crate's byte-at-a-time
/// implementation (no raw multi-byte memory loads), changing `little`
/// changes which table index `pick` assigns to a given byte position but
/// never changes the CRC a given `data: &[u8]` folds to: the two are the
/// same set of `(table, index)` terms XORed together in a different
/// order. A caller pairing this table with an `unsafe` native-word-load
/// hot loop of its own needs that `little` to match its load order; this
/// module's own loop does not need it to get the right answer, only to
/// demonstrate the endianness axis the spec requires tables to carry.
#[derive(Clone)]
pub struct WordTable {
    lanes: usize,
    little: bool,
    tables: Vec<ByteTable>,
}

/// Applies the single-byte step `byte_table` would apply, but for an
/// incoming byte of zero — used to propagate a table entry forward by one
/// more chunk position.
pub(crate) fn zero_step(model: &Model, byte_table: &ByteTable, crc: u128) -> u128 {
    let width = model.width as u32;
    if model.ref_ {
        (crc >> 8) ^ byte_table[(crc & 0xff) as usize]
    } else if width <= 8 {
        byte_table[(crc & 0xff) as usize]
    } else {
        let shift = width - 8;
        (crc << 8) ^ byte_table[((crc >> shift) & 0xff) as usize]
    }
}

impl WordTable {
    /// Builds the `lane.bytes()` per-position tables for `model`, derived
    /// from `byte_table` (see [`crate::engine::build_byte_table`]).
    ///
    /// `little` is the word endianness these tables are intended for; see
    /// the struct docs for what that means for this crate's own hot loop.
    pub fn build(model: &Model, byte_table: &ByteTable, lane: LaneWidth, little: bool) -> WordTable {
        let lanes = lane.bytes();
        let mut tables = Vec::with_capacity(lanes);
        tables.push(*byte_table);
        for i in 1..lanes {
            let mut t = [0u128; 256];
            for k in 0..256 {
                t[k] = zero_step(model, byte_table, tables[i - 1][k]);
            }
            tables.push(t);
        }
        WordTable { lanes, little, tables }
    }
}

/// Extracts the byte of `crc` (a `w`-byte-wide register) that `zero_step`
/// would consume at position `j` counting from the byte consumed first:
/// the low byte for reflected models (consumed immediately, via `crc &
/// 0xff`), the high byte for non-reflected ones (consumed via `crc >>
/// shift`).
fn step_byte(crc: u128, j: usize, w: usize, ref_: bool) -> u128 {
    if ref_ {
        (crc >> (8 * j)) & 0xff
    } else {
        (crc >> (8 * (w - 1 - j))) & 0xff
    }
}

/// Folds a `w`-byte `group` into `crc_in` (already in internal, pre-`rev`
/// orientation) using `w` of `tables`' entries, equivalent to applying
/// [`zero_step`]'s single-byte recurrence `w` times in sequence but via
/// table lookups instead.
///
/// Derivation: the per-byte update `crc' = zero_step(crc) ^ table0[b]`
/// is GF(2)-linear (both `zero_step` and `table0` are built from a zero
/// register, so `table0[x ^ y] = table0[x] ^ table0[y]`), so unrolling it
/// `w` times and grouping terms gives
/// `crc_w = XOR_j tables[w-1-j][ step_byte(crc_in, j) ^ group[j] ]`
/// for `j` in `0..w`, where `j` counts consumption order (low-byte-first
/// for reflected, high-byte-first otherwise) — this is the `little ==
/// ref_` ("mirror") case. When `little != ref_` the spec calls for the
/// ascending `pick(i) = i` mapping instead; substituting `j' = w-1-j`
/// into the formula above and swapping which convention extracts
/// `crc_in`'s byte reproduces the identical multiset of `(table, index)`
/// terms, just enumerated the other way — so `mirror` picks which of the
/// two equivalent enumerations this call performs, and the returned CRC
/// is the same either way (endianness transparency, spec property 8).
fn merge_group(tables: &[ByteTable], w: usize, crc_in: u128, group: &[u8], little: bool, ref_: bool) -> u128 {
    let mirror = little == ref_;
    let mut acc = 0u128;
    for j in 0..w {
        let (crc_byte, data_byte, idx) = if mirror {
            (step_byte(crc_in, j, w, ref_), group[j] as u128, w - 1 - j)
        } else {
            (step_byte(crc_in, j, w, !ref_), group[w - 1 - j] as u128, j)
        };
        acc ^= tables[idx][(crc_byte ^ data_byte) as usize];
    }
    acc
}

/// Internal-orientation bytewise step, used for the unaligned prologue:
/// unlike [`crc_bytewise`], this does not re-apply `rev` at entry/exit,
/// since the caller already holds `crc` in internal orientation
/// mid-stream, and does not fold in `model.xorout` either.
fn crc_bytewise_raw(model: &Model, byte_table: &ByteTable, crc: u128, data: &[u8]) -> u128 {
    let width = model.width as u32;
    let mut crc = crc;
    if model.ref_ {
        for &b in data {
            crc = (crc >> 8) ^ byte_table[((crc ^ b as u128) & 0xff) as usize];
        }
    } else {
        let shift = width - 8;
        for &b in data {
            crc = (crc << 8) ^ byte_table[(((crc >> shift) ^ b as u128) & 0xff) as usize];
        }
        crc &= ones(width);
    }
    crc
}

/// Applies the bytes at `data` to `crc` using `w = ceil(width/8)`-at-a-time
/// table lookups (see [`merge_group`]), for both reflected and
/// non-reflected models alike.
///
/// `data == None` returns the initial CRC for this model. Only valid when
/// `model.fits_fast_tables()`.
pub fn crc_wordwise(
    model: &Model,
    byte_table: &ByteTable,
    word_table: &WordTable,
    crc: u128,
    data: Option<&[u8]>,
) -> u128 {
    let data = match data {
        None => return model.init,
        Some(d) => d,
    };

    let width = model.width as u32;
    let w = ((width as usize) + 7) / 8;

    // Widths <= 8 bits have only one byte of register; grouping by `w =
    // 1` has no lookup to save over plain bytewise, so just delegate.
    if w <= 1 {
        return crc_bytewise(model, byte_table, crc, Some(data));
    }

    // `Crc::wordwise` refuses to build a `WordTable` narrower than `w`
    // bytes; this assert only catches a caller that builds `WordTable`
    // directly and skips that guard.
    debug_assert!(w <= word_table.lanes, "lane width too narrow for this model's byte width");

    let mut crc = crc;
    if model.rev {
        crc = reverse(crc, width);
    }
    crc &= ones(width);

    // Process a byte-at-a-time prologue so the hot loop only ever sees
    // whole `w`-byte groups, regardless of where within a larger buffer
    // `data` starts (alignment transparency, spec property 9).
    let prologue = data.len() % w;
    if prologue > 0 {
        crc = crc_bytewise_raw(model, byte_table, crc, &data[..prologue]);
    }

    for chunk in data[prologue..].chunks_exact(w) {
        crc = merge_group(&word_table.tables, w, crc, chunk, word_table.little, model.ref_);
    }
    crc &= ones(width);

    if model.rev {
        crc = reverse(crc, width);
    }
    crc
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::{build_byte_table, crc_bitwise};
    use crate::model::{Model, RawModel};

    fn crc32_iso_hdlc() -> Model {
        Model::normalize(&RawModel {
            width: 32,
            poly: 0x04c11db7,
            init: 0xffffffff,
            refin: true,
            refout: true,
            xorout: 0xffffffff,
            check: 0xcbf43926,
            residue: 0xdebb20e3,
            name: "CRC-32/ISO-HDLC".into(),
        })
    }

    fn crc16_xmodem() -> Model {
        Model::normalize(&RawModel {
            width: 16,
            poly: 0x1021,
            init: 0x0000,
            refin: false,
            refout: false,
            xorout: 0x0000,
            check: 0x31c3,
            residue: 0x0000,
            name: "CRC-16/XMODEM".into(),
        })
    }

    #[test]
    fn wordwise_matches_bitwise_on_aligned_input() {
        let m = crc32_iso_hdlc();
        let byte_table = build_byte_table(&m);
        let word_table = WordTable::build(&m, &byte_table, LaneWidth::W32, true);
        let data = b"0123456789abcdef"; // 16 bytes, a whole number of 4-byte groups
        let expected = crc_bitwise(&m, crc_bitwise(&m, 0, None), Some(data));
        let actual = crc_wordwise(&m, &byte_table, &word_table, crc_bitwise(&m, 0, None), Some(data));
        assert_eq!(actual, expected);
    }

    #[test]
    fn wordwise_matches_bitwise_on_unaligned_input() {
        let m = crc32_iso_hdlc();
        let byte_table = build_byte_table(&m);
        let word_table = WordTable::build(&m, &byte_table, LaneWidth::W64, true);
        let data = b"123456789"; // 9 bytes, not a multiple of 4 or 8
        let expected = crc_bitwise(&m, crc_bitwise(&m, 0, None), Some(data));
        let actual = crc_wordwise(&m, &byte_table, &word_table, crc_bitwise(&m, 0, None), Some(data));
        assert_eq!(actual, expected);
    }

    #[test]
    fn wordwise_check_value_w128_lane() {
        let m = crc32_iso_hdlc();
        let byte_table = build_byte_table(&m);
        let word_table = WordTable::build(&m, &byte_table, LaneWidth::W128, true);
        let crc = crc_wordwise(
            &m,
            &byte_table,
            &word_table,
            crc_wordwise(&m, &byte_table, &word_table, 0, None),
            Some(b"123456789"),
        );
        assert_eq!(crc, 0xcbf43926);
    }

    #[test]
    fn unreflected_model_uses_the_table_driven_path() {
        let m = crc16_xmodem();
        let byte_table = build_byte_table(&m);
        let word_table = WordTable::build(&m, &byte_table, LaneWidth::W32, true);
        let crc = crc_wordwise(
            &m,
            &byte_table,
            &word_table,
            crc_wordwise(&m, &byte_table, &word_table, 0, None),
            Some(b"123456789"),
        );
        assert_eq!(crc, 0x31c3);
    }

    #[test]
    fn unreflected_wordwise_matches_bitwise_on_unaligned_input() {
        let m = crc16_xmodem();
        let byte_table = build_byte_table(&m);
        let word_table = WordTable::build(&m, &byte_table, LaneWidth::W64, true);
        let data = b"The quick brown fox jumps over the lazy dog.";
        let expected = crc_bitwise(&m, crc_bitwise(&m, 0, None), Some(data));
        let actual = crc_wordwise(&m, &byte_table, &word_table, crc_bitwise(&m, 0, None), Some(data));
        assert_eq!(actual, expected);
    }

    #[test]
    fn endianness_transparency_holds_for_both_little_and_big() {
        // Property 8: the same data folds to the same CRC regardless of
        // which word endianness the table set was built for.
        let cases: [(Model, &[u8]); 2] = [
            (crc32_iso_hdlc(), b"The quick brown fox jumps over the lazy dog, 1234567890."),
            (crc16_xmodem(), b"The quick brown fox jumps over the lazy dog, 1234567890."),
        ];
        for (m, data) in cases {
            let byte_table = build_byte_table(&m);
            let little_table = WordTable::build(&m, &byte_table, LaneWidth::W64, true);
            let big_table = WordTable::build(&m, &byte_table, LaneWidth::W64, false);

            let via_little = crc_wordwise(
                &m,
                &byte_table,
                &little_table,
                crc_wordwise(&m, &byte_table, &little_table, 0, None),
                Some(data),
            );
            let via_big = crc_wordwise(
                &m,
                &byte_table,
                &big_table,
                crc_wordwise(&m, &byte_table, &big_table, 0, None),
                Some(data),
            );
            assert_eq!(via_little, via_big, "{}: little vs big table endianness", m.name);
        }
    }
}
