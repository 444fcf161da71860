//! Bitwise and bytewise CRC engines (components C and D).
//!
//! The register here is `u128` throughout, so the same bitwise function
//! that handles ordinary single-word-sized CRCs also covers widths beyond
//! a machine word, up to the full 128 bits — see `crc_bitwise_dbl` below.

use crate::bits::{ones, reverse};
use crate::model::Model;

/// A 256-entry bytewise table: `table[k]` is the *internal* register
/// content after processing byte `k`, in the orientation `crc_bytewise`
/// expects (pre-shifted into the top of the low 8 bits for unreflected
/// `width < 8`, and converted back to internal — not output — orientation
/// when `rev` is set).
pub type ByteTable = [u128; 256];

/// Applies the bytes at `data` to `crc` using the bitwise algorithm.
/// `data == None` returns the initial CRC for this model.
///
/// Valid for any `model.width` in `1..=128`; see [`crc_bitwise_dbl`] for
/// the alias used when a caller wants to be explicit about wide widths.
pub fn crc_bitwise(model: &Model, crc: u128, data: Option<&[u8]>) -> u128 {
    let data = match data {
        None => return model.init,
        Some(d) => d,
    };
    let width = model.width as u32;
    let poly = model.poly;

    let mut crc = crc ^ model.xorout;
    if model.rev {
        crc = reverse(crc, width);
    }

    if model.ref_ {
        crc &= ones(width);
        for &b in data {
            crc ^= b as u128;
            for _ in 0..8 {
                crc = if crc & 1 != 0 { (crc >> 1) ^ poly } else { crc >> 1 };
            }
        }
    } else if width <= 8 {
        let shift = 8 - width;
        let poly = poly << shift;
        crc <<= shift;
        for &b in data {
            crc ^= b as u128;
            for _ in 0..8 {
                crc = if crc & 0x80 != 0 { (crc << 1) ^ poly } else { crc << 1 };
            }
        }
        crc >>= shift;
        crc &= ones(width);
    } else {
        let mask = 1u128 << (width - 1);
        let shift = width - 8;
        for &b in data {
            crc ^= (b as u128) << shift;
            for _ in 0..8 {
                crc = if crc & mask != 0 { (crc << 1) ^ poly } else { crc << 1 };
            }
        }
        crc &= ones(width);
    }

    if model.rev {
        crc = reverse(crc, width);
    }
    crc ^ model.xorout
}

/// Alias for [`crc_bitwise`], kept as a distinct name for callers that
/// want to say explicitly that a model may be wider than a machine word.
/// Since the register here is always `u128`, there is nothing additional
/// to do.
pub fn crc_bitwise_dbl(model: &Model, crc: u128, data: Option<&[u8]>) -> u128 {
    crc_bitwise(model, crc, data)
}

/// Builds the 256-entry bytewise table for `model`.
///
/// Each entry is built by running the single byte `k` through
/// [`crc_bitwise`] starting from a zero register, then converting the
/// result back into the table's internal orientation (reversing again if
/// `rev`, pre-shifting if `width < 8` and unreflected) so [`crc_bytewise`]
/// can thread it across a whole buffer without re-applying the
/// input/output transforms on every byte.
pub fn build_byte_table(model: &Model) -> ByteTable {
    let width = model.width as u32;
    let mut table = [0u128; 256];
    for k in 0u16..256 {
        let byte = k as u8;
        let mut crc = crc_bitwise(model, 0, Some(&[byte]));
        if model.rev {
            crc = reverse(crc, width);
        }
        if width < 8 && !model.ref_ {
            crc <<= 8 - width;
        }
        table[k as usize] = crc;
    }
    table
}

/// Applies `len` bytes at `data` to `crc` using `table`, built by
/// [`build_byte_table`]. Equivalent to [`crc_bitwise`] but faster.
pub fn crc_bytewise(model: &Model, table: &ByteTable, crc: u128, data: Option<&[u8]>) -> u128 {
    let data = match data {
        None => return model.init,
        Some(d) => d,
    };
    let width = model.width as u32;

    let mut crc = crc;
    if model.rev {
        crc = reverse(crc, width);
    }

    if model.ref_ {
        crc &= ones(width);
        for &b in data {
            crc = (crc >> 8) ^ table[((crc ^ b as u128) & 0xff) as usize];
        }
    } else if width <= 8 {
        let shift = 8 - width;
        crc <<= shift;
        for &b in data {
            crc = table[((crc ^ b as u128) & 0xff) as usize];
        }
        crc >>= shift;
    } else {
        let shift = width - 8;
        for &b in data {
            crc = (crc << 8) ^ table[(((crc >> shift) ^ b as u128) & 0xff) as usize];
        }
        crc &= ones(width);
    }

    if model.rev {
        crc = reverse(crc, width);
    }
    crc
}
