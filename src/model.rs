//! CRC model records (component B).
//!
//! `RawModel` holds a description exactly as given by a user (Ross
//! Williams' Rocksoft parameters, as catalogued by the RevEng project).
//! `Model::normalize` turns that into a `Model`, the form the engines in
//! [`crate::engine`], [`crate::wordwise`] and [`crate::combine`] actually
//! need. Normalisation builds a *new* record rather than mutating the
//! parsed one in place, so the parsed `RawModel` stays around unmodified
//! for anyone who wants to print or re-check it.

use crate::bits::{ones, reverse};
use thiserror::Error;

/// The largest CRC width this crate supports, in bits.
pub const MAX_WIDTH: u32 = 128;

/// A CRC model exactly as described by a user: Ross Williams' parameters.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RawModel {
    /// Degree of the polynomial, 1..=128.
    pub width: u8,
    /// The polynomial, non-reflected, sans the x^width term. Bit 0 must be 1.
    pub poly: u128,
    /// Initial contents of the CRC register, copied in verbatim.
    pub init: u128,
    /// If true, input bytes are bit-reversed before processing.
    pub refin: bool,
    /// If true, the final register value is bit-reversed before `xorout`.
    pub refout: bool,
    /// XORed with the (possibly reflected) final register value.
    pub xorout: u128,
    /// CRC of the nine ASCII bytes "123456789". Used only to self-check.
    pub check: u128,
    /// CRC obtained by feeding `width` zero bits through a zero register.
    pub residue: u128,
    /// Human-readable identifier, e.g. "CRC-32/ISO-HDLC".
    pub name: String,
}

/// A fault in a `RawModel`'s values, independent of how it was obtained.
///
/// Distinct from [`crate::parse::ParseError`], which covers faults in the
/// *textual* representation; this covers faults in the values themselves,
/// whether they arrived via text or were constructed directly.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ModelError {
    #[error("width {width} is out of range 1..={max}")]
    WidthOutOfRange { width: u32, max: u32 },
    #[error("poly low bit must be 1 (poly = {poly:#x})")]
    PolyLowBitNotSet { poly: u128 },
    #[error("{field} does not fit in {width} bits")]
    ValueOutOfRange { field: &'static str, width: u32 },
}

impl RawModel {
    /// Checks the basic range invariants a model must satisfy: `1 <= width
    /// <= 128`, the polynomial's low bit set, and every width-bit field
    /// actually fitting in `width` bits.
    pub fn validate(&self) -> Result<(), ModelError> {
        let width = self.width as u32;
        if width < 1 || width > MAX_WIDTH {
            return Err(ModelError::WidthOutOfRange { width, max: MAX_WIDTH });
        }
        let mask = ones(width);
        if self.poly & mask != self.poly {
            return Err(ModelError::ValueOutOfRange { field: "poly", width });
        }
        if self.poly & 1 != 1 {
            return Err(ModelError::PolyLowBitNotSet { poly: self.poly });
        }
        if self.init & mask != self.init {
            return Err(ModelError::ValueOutOfRange { field: "init", width });
        }
        if self.xorout & mask != self.xorout {
            return Err(ModelError::ValueOutOfRange { field: "xorout", width });
        }
        if self.check & mask != self.check {
            return Err(ModelError::ValueOutOfRange { field: "check", width });
        }
        if self.residue & mask != self.residue {
            return Err(ModelError::ValueOutOfRange { field: "residue", width });
        }
        Ok(())
    }
}

/// A normalised CRC model, ready for the engines.
///
/// Fields here carry different meanings than the corresponding `RawModel`
/// fields:
///
/// - `poly` is reflected iff `ref_`.
/// - `init` is the CRC of the empty message (the raw `init`, reflected iff
///   `refout` was set, xored with `xorout`) rather than the raw register
///   seed.
/// - `rev` means "apply one more reflection beyond what `ref_` already
///   implies", true only when `refin != refout`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Model {
    pub width: u8,
    pub poly: u128,
    pub init: u128,
    pub xorout: u128,
    pub ref_: bool,
    pub rev: bool,
    pub check: u128,
    pub residue: u128,
    pub name: String,
}

impl Model {
    /// Normalises a `RawModel` into the form the engines consume: reflect
    /// `poly` if `refin`, reflect `init` if `refout` then fold in
    /// `xorout` so `init` becomes the CRC of the empty message, and
    /// collapse `refin`/`refout` into a single extra-reflection flag
    /// (`rev`, true only when they differ). Does not itself validate
    /// ranges; call `raw.validate()` first if `raw` did not come from the
    /// parser (which already validates).
    pub fn normalize(raw: &RawModel) -> Model {
        let width = raw.width as u32;

        let poly = if raw.refin {
            reverse(raw.poly, width)
        } else {
            raw.poly
        };

        let init = if raw.refout {
            reverse(raw.init, width)
        } else {
            raw.init
        };
        let init = init ^ raw.xorout;

        let rev = raw.refout ^ raw.refin;

        Model {
            width: raw.width,
            poly,
            init,
            xorout: raw.xorout,
            ref_: raw.refin,
            rev,
            check: raw.check,
            residue: raw.residue,
            name: raw.name.clone(),
        }
    }

    /// The mask for this model's width, i.e. `ones(width)`.
    pub fn mask(&self) -> u128 {
        ones(self.width as u32)
    }

    /// True when fast bytewise/wordwise tables can be built for this
    /// model. Beyond this, only the bitwise engine is valid; see
    /// `crate::WORD_BITS`.
    pub fn fits_fast_tables(&self) -> bool {
        (self.width as u32) <= crate::WORD_BITS
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn crc32_iso_hdlc() -> RawModel {
        RawModel {
            width: 32,
            poly: 0x04c11db7,
            init: 0xffffffff,
            refin: true,
            refout: true,
            xorout: 0xffffffff,
            check: 0xcbf43926,
            residue: 0x0,
            name: "CRC-32/ISO-HDLC".into(),
        }
    }

    #[test]
    fn validate_accepts_known_good_model() {
        assert!(crc32_iso_hdlc().validate().is_ok());
    }

    #[test]
    fn validate_rejects_poly_missing_low_bit() {
        let mut m = crc32_iso_hdlc();
        m.poly &= !1;
        assert!(matches!(
            m.validate(),
            Err(ModelError::PolyLowBitNotSet { .. })
        ));
    }

    #[test]
    fn validate_rejects_width_zero() {
        let mut m = crc32_iso_hdlc();
        m.width = 0;
        assert!(matches!(
            m.validate(),
            Err(ModelError::WidthOutOfRange { .. })
        ));
    }

    #[test]
    fn normalize_crc32_iso_hdlc_matches_expectation() {
        // refin == refout here, so poly is reflected and rev is false.
        let model = Model::normalize(&crc32_iso_hdlc());
        assert_eq!(model.poly, reverse(0x04c11db7, 32));
        assert_eq!(model.ref_, true);
        assert_eq!(model.rev, false);
        // init is reflected (refout) XOR xorout: reverse(0xffffffff,32) is
        // itself, xored with 0xffffffff gives 0.
        assert_eq!(model.init, 0);
    }

    #[test]
    fn normalize_xmodem_unreflected_keeps_poly() {
        let raw = RawModel {
            width: 16,
            poly: 0x1021,
            init: 0x0000,
            refin: false,
            refout: false,
            xorout: 0x0000,
            check: 0x31c3,
            residue: 0x0000,
            name: "CRC-16/XMODEM".into(),
        };
        let model = Model::normalize(&raw);
        assert_eq!(model.poly, 0x1021);
        assert_eq!(model.ref_, false);
        assert_eq!(model.rev, false);
        assert_eq!(model.init, 0);
    }
}
