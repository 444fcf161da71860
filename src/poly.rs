//! GF(2) polynomial arithmetic modulo a model's polynomial (component F).
//!
//! Every CRC register update is a linear operation over GF(2); `multmodp`
//! makes that linearity usable directly, by multiplying two field
//! elements and reducing the product modulo the model's characteristic
//! polynomial. [`crate::combine`] builds zero-run and CRC-combine on top
//! of it.

use crate::bits::{ones, reverse};
use crate::model::Model;

/// One step of "multiply by x", in the unreflected (MSB-first) coefficient
/// convention: shift left, and if the vacated top bit was set, reduce by
/// XORing in `poly`. Mirrors the reduction crc_bitwise's non-reflected
/// branch applies per input bit.
fn mul_x(v: u128, width: u32, poly: u128) -> u128 {
    let top = 1u128 << (width - 1);
    let mask = ones(width);
    if v & top != 0 {
        ((v << 1) & mask) ^ poly
    } else {
        (v << 1) & mask
    }
}

/// Schoolbook polynomial multiplication modulo `poly`, both operands and
/// the polynomial itself in the unreflected (MSB-first) convention.
fn multmodp_unreflected(poly: u128, width: u32, a: u128, b: u128) -> u128 {
    let mut product = 0u128;
    for i in (0..width).rev() {
        product = mul_x(product, width, poly);
        if (a >> i) & 1 != 0 {
            product ^= b;
        }
    }
    product
}

/// Multiplies `a` and `b` modulo `model.poly`, in whichever orientation
/// (reflected or not) `model` itself uses. `a` and `b` must already be in
/// that orientation (the same one `model.poly`/`model.init` are in).
pub fn multmodp(model: &Model, a: u128, b: u128) -> u128 {
    let width = model.width as u32;
    if model.ref_ {
        let poly = reverse(model.poly, width);
        let a = reverse(a, width);
        let b = reverse(b, width);
        reverse(multmodp_unreflected(poly, width, a, b), width)
    } else {
        multmodp_unreflected(model.poly, width, a, b)
    }
}

/// `x` raised to the power `n` modulo `poly`, by square-and-multiply.
/// `width` must be the polynomial's degree.
fn powmodp_unreflected(poly: u128, width: u32, mut n: u64) -> u128 {
    let mut result = 1u128; // x^0
    let mut base = mul_x(1, width, poly); // x^1 mod poly
    while n > 0 {
        if n & 1 != 0 {
            result = multmodp_unreflected(poly, width, result, base);
        }
        base = multmodp_unreflected(poly, width, base, base);
        n >>= 1;
    }
    result
}

/// `x^n` modulo `model.poly`, in `model`'s own orientation — the value by
/// which a register is multiplied when `n` zero *bits* are appended to
/// the message it represents. Unlike [`x8nmodp`], `n` need not be a
/// multiple of 8; this is what [`crate::combine::crc_zeros`] needs for
/// sub-byte zero-runs and for the width-bit residue computation.
pub fn xnmodp(model: &Model, n: u64) -> u128 {
    let width = model.width as u32;
    if model.ref_ {
        let poly = reverse(model.poly, width);
        reverse(powmodp_unreflected(poly, width, n), width)
    } else {
        powmodp_unreflected(model.poly, width, n)
    }
}

/// `x^(8 * n)` modulo `model.poly`, in `model`'s own orientation — the
/// value by which a register is multiplied when `n` zero bytes are
/// appended to the message it represents.
pub fn x8nmodp(model: &Model, n: u64) -> u128 {
    let bits = n.checked_mul(8).expect("byte count overflows bit count");
    xnmodp(model, bits)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::RawModel;

    fn crc32_iso_hdlc() -> Model {
        Model::normalize(&RawModel {
            width: 32,
            poly: 0x04c11db7,
            init: 0xffffffff,
            refin: true,
            refout: true,
            xorout: 0xffffffff,
            check: 0xcbf43926,
            residue: 0,
            name: "CRC-32/ISO-HDLC".into(),
        })
    }

    #[test]
    fn multiplying_by_one_is_identity() {
        let m = crc32_iso_hdlc();
        let one = if m.ref_ { reverse(1, 32) } else { 1 };
        assert_eq!(multmodp(&m, one, 0xdeadbeef & m.mask()), 0xdeadbeef & m.mask());
    }

    #[test]
    fn x8nmodp_zero_is_one() {
        let m = crc32_iso_hdlc();
        let one = if m.ref_ { reverse(1, 32) } else { 1 };
        assert_eq!(x8nmodp(&m, 0), one);
    }

    #[test]
    fn x8nmodp_agrees_with_repeated_squaring() {
        let m = crc32_iso_hdlc();
        let once = x8nmodp(&m, 1);
        let twice_via_pow = x8nmodp(&m, 2);
        let twice_via_mult = multmodp(&m, once, once);
        assert_eq!(twice_via_pow, twice_via_mult);
    }

    #[test]
    fn unreflected_width_one_does_not_panic() {
        // Smallest possible model: degree-1 polynomial x + 1.
        let m = Model::normalize(&RawModel {
            width: 1,
            poly: 0x1,
            init: 0x0,
            refin: false,
            refout: false,
            xorout: 0x0,
            check: 0x1,
            residue: 0,
            name: "tiny".into(),
        });
        let base = x8nmodp(&m, 1);
        assert!(base <= m.mask());
    }
}
