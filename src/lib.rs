//! A parameterised CRC engine covering Ross Williams' Rocksoft model
//! (as catalogued by the RevEng project): any width from 1 to 128 bits,
//! any polynomial, optional input/output bit reflection, and an
//! arbitrary XOR-out mask.
//!
//! Three evaluation strategies are provided, from simplest to fastest:
//! bitwise ([`engine::crc_bitwise`]), bytewise/table-driven
//! ([`engine::crc_bytewise`]), and wordwise/slice-by-N
//! ([`wordwise::crc_wordwise`]). [`Crc`] picks the fastest one available
//! for a given model and exposes it as a single digest function plus an
//! incremental hasher. [`poly`] and [`combine`] implement the GF(2)
//! arithmetic behind zero-run and CRC-combine. [`parse`] reads models from
//! text, and [`codegen`] emits a standalone Rust source file specialised
//! for one model.

pub mod bits;
pub mod catalogue;
pub mod codegen;
pub mod combine;
pub mod engine;
pub mod model;
pub mod parse;
pub mod poly;
pub mod wordwise;

use std::borrow::Borrow;

pub use model::{Model, ModelError, RawModel};

/// The largest CRC width, in bits, for which [`Crc`] will build bytewise
/// or wordwise tables. Models wider than this still work, just only via
/// the bitwise engine — see [`Model::fits_fast_tables`].
pub const WORD_BITS: u32 = 64;

/// A prepared CRC model together with whatever fast-path tables its width
/// allows, ready to digest messages.
pub struct Crc {
    model: Model,
    byte_table: Option<engine::ByteTable>,
}

impl Crc {
    /// Normalises and validates `raw`, then builds whatever fast-path
    /// tables its width allows.
    pub fn new(raw: &RawModel) -> Result<Crc, ModelError> {
        raw.validate()?;
        let model = Model::normalize(raw);
        let byte_table = model.fits_fast_tables().then(|| engine::build_byte_table(&model));
        Ok(Crc { model, byte_table })
    }

    /// The normalised model this engine was built from.
    pub fn model(&self) -> &Model {
        &self.model
    }

    /// Computes the CRC of `data` in one call.
    pub fn digest(&self, data: &[u8]) -> u128 {
        let init = self.start();
        self.update(init, data)
    }

    /// The CRC of the empty message — the correct seed for [`Self::update`].
    pub fn start(&self) -> u128 {
        match &self.byte_table {
            Some(table) => engine::crc_bytewise(&self.model, table, 0, None),
            None => engine::crc_bitwise(&self.model, 0, None),
        }
    }

    /// Folds `data` into a running CRC value produced by [`Self::start`]
    /// or a previous call to [`Self::update`].
    pub fn update(&self, crc: u128, data: &[u8]) -> u128 {
        match &self.byte_table {
            Some(table) => engine::crc_bytewise(&self.model, table, crc, Some(data)),
            None => engine::crc_bitwise(&self.model, crc, Some(data)),
        }
    }

    /// Builds the wordwise lane tables for this model and wraps them
    /// together with the bytewise table already held, for callers that
    /// want the slice-by-N engine specifically (e.g. benchmarking it
    /// against the plain bytewise path). `little` is the word endianness
    /// to build the tables for — see [`wordwise::WordTable`]. Returns
    /// `None` if the model is too wide for fast tables, or if `lane` is
    /// narrower than this model's byte width (`crc_wordwise` can only
    /// index as many per-lane tables as `lane` provides).
    pub fn wordwise(&self, little: bool, lane: wordwise::LaneWidth) -> Option<WordwiseCrc<'_>> {
        let byte_table = self.byte_table.as_ref()?;
        if lane.bytes() < (self.model.width as usize + 7) / 8 {
            return None;
        }
        let word_table = wordwise::WordTable::build(&self.model, byte_table, lane, little);
        Some(WordwiseCrc {
            model: &self.model,
            byte_table,
            word_table,
        })
    }

    /// Re-derives `check` from this model's own engines and cross-checks
    /// the catalogued `residue`: the register contents after feeding
    /// `width` zero bits through a zero-initialised register (the
    /// definition [`RawModel::residue`] documents), computed with `init`
    /// and `xorout` both zeroed out so the bare recurrence is exposed.
    pub fn verify(&self) -> VerifyReport {
        let bitwise = engine::crc_bitwise(
            &self.model,
            engine::crc_bitwise(&self.model, 0, None),
            Some(b"123456789"),
        );
        let byte = self.byte_table.as_ref().map(|table| {
            engine::crc_bytewise(
                &self.model,
                table,
                engine::crc_bytewise(&self.model, table, 0, None),
                Some(b"123456789"),
            )
        });
        let word = self.wordwise(true, wordwise::LaneWidth::W32).map(|w| w.digest(b"123456789"));

        let mut residue_model = self.model.clone();
        residue_model.init = 0;
        residue_model.xorout = 0;
        let zero_bytes = vec![0u8; (self.model.width as usize + 7) / 8];
        let residue_crc = engine::crc_bitwise(
            &residue_model,
            engine::crc_bitwise(&residue_model, 0, None),
            Some(&zero_bytes),
        );

        VerifyReport {
            bit: bitwise == self.model.check,
            byte: byte.map_or(true, |v| v == self.model.check),
            word: word.map_or(true, |v| v == self.model.check),
            residue: residue_crc == self.model.residue,
        }
    }
}

/// A CRC engine bound to a specific wordwise lane width, for callers that
/// want the slice-by-N path explicitly rather than [`Crc`]'s default
/// bytewise path.
pub struct WordwiseCrc<'a> {
    model: &'a Model,
    byte_table: &'a engine::ByteTable,
    word_table: wordwise::WordTable,
}

impl<'a> WordwiseCrc<'a> {
    pub fn digest(&self, data: &[u8]) -> u128 {
        let init = wordwise::crc_wordwise(self.model, self.byte_table, &self.word_table, 0, None);
        wordwise::crc_wordwise(self.model, self.byte_table, &self.word_table, init, Some(data))
    }
}

/// The result of [`Crc::verify`]: whether each available engine
/// reproduces the model's catalogued `check` value, and whether the
/// zero-run residue matches.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct VerifyReport {
    pub bit: bool,
    pub byte: bool,
    pub word: bool,
    pub residue: bool,
}

impl VerifyReport {
    /// True only if every engine this report covers passed.
    pub fn all_passed(&self) -> bool {
        self.bit && self.byte && self.word && self.residue
    }
}

/// Incremental digest state over a shared, reusable [`Crc`] — the
/// update-in-chunks counterpart to [`Crc::digest`].
pub struct Digest<S: Borrow<Crc>> {
    crc: S,
    state: u128,
}

impl<S: Borrow<Crc>> Digest<S> {
    pub fn new(crc: S) -> Digest<S> {
        let state = crc.borrow().start();
        Digest { crc, state }
    }

    pub fn reset(&mut self) {
        self.state = self.crc.borrow().start();
    }

    pub fn update(&mut self, data: &[u8]) {
        self.state = self.crc.borrow().update(self.state, data);
    }

    pub fn finish(&self) -> u128 {
        self.state
    }
}
