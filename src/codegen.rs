//! Standalone source generation (component H).
//!
//! Given one normalised model, emits a self-contained Rust source file
//! implementing just that model: no [`crate::model::Model`], no runtime
//! dispatch on width — every constant and table is baked in, the way
//! `crcadd`/`crcgen`'s C code generator emits a specialised C source file
//! per model rather than shipping the general parameterised engine.

use crate::bits::ones;
use crate::combine::build_combine_table;
use crate::engine::build_byte_table;
use crate::model::Model;
use crate::wordwise::zero_step;
use std::fmt::Write as _;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GenError {
    #[error("width {width} exceeds the widest native word this generator supports ({max})")]
    WidthTooWide { width: u32, max: u32 },
    #[error("formatting generated source failed")]
    Format(#[from] std::fmt::Error),
}

/// Target word width for the generated bytewise table entries. Does not
/// limit `model.width` (which may still exceed this; such models just
/// get a `u128`-typed word regardless of the option) so much as pick the
/// combine table's native integer type for smaller models.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum WordBits {
    W32,
    W64,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct GenOptions {
    pub word_bits: WordBits,
    /// Word endianness `emit_wordwise`'s lane-index enumeration targets.
    /// Either choice yields the same CRC; see `wordwise::merge_group`.
    pub little: bool,
}

impl Default for GenOptions {
    fn default() -> Self {
        GenOptions {
            word_bits: WordBits::W64,
            little: true,
        }
    }
}

pub struct GeneratedSource {
    pub file_name: String,
    pub source: String,
}

/// Derives a `snake_case` identifier from a model's name, the way a
/// generated file and its functions need to be named. Non-alphanumeric
/// runs collapse to a single underscore; leading digits get a `crc`
/// prefix so the result is a valid Rust identifier.
pub fn slug(model: &Model) -> String {
    let mut out = String::new();
    let mut last_was_sep = true;
    for ch in model.name.chars() {
        if ch.is_ascii_alphanumeric() {
            out.push(ch.to_ascii_lowercase());
            last_was_sep = false;
        } else if !last_was_sep {
            out.push('_');
            last_was_sep = true;
        }
    }
    while out.ends_with('_') {
        out.pop();
    }
    if out.is_empty() || out.chars().next().unwrap().is_ascii_digit() {
        out = format!("crc_{out}");
    }
    out
}

/// The narrowest unsigned Rust integer type whose bit width is at least
/// `width`.
fn word_type(width: u32) -> &'static str {
    match width {
        0..=8 => "u8",
        9..=16 => "u16",
        17..=32 => "u32",
        33..=64 => "u64",
        _ => "u128",
    }
}

fn fmt_lit(value: u128, ty: &str) -> String {
    match ty {
        "u8" => format!("0x{:02x}_u8", value as u8),
        "u16" => format!("0x{:04x}_u16", value as u16),
        "u32" => format!("0x{:08x}_u32", value as u32),
        "u64" => format!("0x{:016x}_u64", value as u64),
        _ => format!("0x{value:032x}_u128"),
    }
}

/// Emits a standalone Rust source implementing `model`'s bitwise,
/// bytewise (if `model.fits_fast_tables()`) and combine (if width fits
/// `opts.word_bits`) functions.
pub fn generate(model: &Model, opts: &GenOptions) -> Result<GeneratedSource, GenError> {
    let width = model.width as u32;
    let ty = word_type(width);
    let name = slug(model);
    let mask = model.mask();

    let mut src = String::new();
    writeln!(src, "//! Generated standalone CRC implementation for {}.", model.name)?;
    writeln!(src, "//! width={} poly=0x{:x} init=0x{:x} refin={} refout={} xorout=0x{:x}",
        model.width, model.poly, model.init, model.ref_, model.rev ^ model.ref_, model.xorout)?;
    writeln!(src)?;
    writeln!(src, "pub const WIDTH: u32 = {width};")?;
    writeln!(src, "pub const CHECK: {ty} = {};", fmt_lit(model.check, ty))?;
    writeln!(src)?;

    emit_bitwise(&mut src, model, ty, mask)?;
    writeln!(src)?;
    emit_rem(&mut src, model, ty, mask)?;

    if model.fits_fast_tables() {
        writeln!(src)?;
        emit_bytewise(&mut src, model, ty, &name)?;
        writeln!(src)?;
        emit_wordwise(&mut src, model, ty, &name, opts.little)?;

        let fits_word = match opts.word_bits {
            WordBits::W32 => width <= 32,
            WordBits::W64 => width <= 64,
        };
        if fits_word {
            writeln!(src)?;
            emit_combine(&mut src, model, ty, &name)?;
        } else {
            log::debug!("{}: skipping combine table, width {width} exceeds requested word size", model.name);
        }
    } else {
        log::debug!("{}: skipping bytewise/word/combine, width {width} exceeds fast-table limit", model.name);
    }

    Ok(GeneratedSource {
        file_name: format!("{name}.rs"),
        source: src,
    })
}

/// Emits the XOR-out step on a `u128`-typed `crc` local: `xorout ==
/// ONES(width)` collapses to `crc = !crc` (masked back to `width` bits,
/// since `!` flips all 128 bits and this crate's invariant is that `crc`
/// only ever carries significant bits in its low `width`), per spec.md
/// §4.8. Otherwise emits the literal XOR.
fn emit_xorout_step(src: &mut String, model: &Model, mask: u128) -> Result<(), GenError> {
    if model.xorout != 0 && model.xorout == ones(model.width as u32) {
        writeln!(src, "    crc = !crc & {};", fmt_lit(mask, "u128"))?;
    } else {
        writeln!(src, "    crc ^= {};", fmt_lit(model.xorout, "u128"))?;
    }
    Ok(())
}

fn emit_bitwise(src: &mut String, model: &Model, ty: &str, mask: u128) -> Result<(), GenError> {
    let width = model.width as u32;
    writeln!(src, "/// Computes the CRC of `data` from a fresh register.")?;
    writeln!(src, "pub fn crc_bitwise(data: &[u8]) -> {ty} {{")?;
    writeln!(src, "    let mut crc: u128 = {};", fmt_lit(model.init, "u128"))?;
    emit_xorout_step(src, model, mask)?;
    if model.rev {
        writeln!(src, "    crc = crc.reverse_bits() >> {};", 128 - width)?;
    }
    if model.ref_ {
        writeln!(src, "    for &b in data {{")?;
        writeln!(src, "        crc ^= b as u128;")?;
        writeln!(src, "        for _ in 0..8 {{")?;
        writeln!(
            src,
            "            crc = if crc & 1 != 0 {{ (crc >> 1) ^ {} }} else {{ crc >> 1 }};",
            fmt_lit(model.poly, "u128")
        )?;
        writeln!(src, "        }}")?;
        writeln!(src, "    }}")?;
    } else if width <= 8 {
        let shift = 8 - width;
        writeln!(src, "    crc <<= {shift};")?;
        writeln!(src, "    for &b in data {{")?;
        writeln!(src, "        crc ^= b as u128;")?;
        writeln!(src, "        for _ in 0..8 {{")?;
        writeln!(
            src,
            "            crc = if crc & 0x80 != 0 {{ (crc << 1) ^ {} }} else {{ crc << 1 }};",
            fmt_lit(model.poly << shift, "u128")
        )?;
        writeln!(src, "        }}")?;
        writeln!(src, "    }}")?;
        writeln!(src, "    crc >>= {shift};")?;
    } else {
        let shift = width - 8;
        writeln!(src, "    for &b in data {{")?;
        writeln!(src, "        crc ^= (b as u128) << {shift};")?;
        writeln!(src, "        for _ in 0..8 {{")?;
        writeln!(
            src,
            "            crc = if crc & (1u128 << {}) != 0 {{ (crc << 1) ^ {} }} else {{ crc << 1 }};",
            width - 1,
            fmt_lit(model.poly, "u128")
        )?;
        writeln!(src, "        }}")?;
        writeln!(src, "    }}")?;
    }
    writeln!(src, "    crc &= {};", fmt_lit(mask, "u128"))?;
    if model.rev {
        writeln!(src, "    crc = crc.reverse_bits() >> {};", 128 - width)?;
    }
    emit_xorout_step(src, model, mask)?;
    writeln!(src, "    crc as {ty}")?;
    writeln!(src, "}}")?;
    Ok(())
}

/// Computes the CRC of the low (`model.ref_`) or high (otherwise) `bits`
/// bits of `val`, for messages whose length isn't a whole number of
/// bytes. `bits` must be in `0..=8`. Grounded on crcany's generated
/// `_rem` routine (`crcgen.c`), sharing `crc_bitwise`'s entry/exit
/// xorout and `rev` handling but looping `bits` times instead of 8.
fn emit_rem(src: &mut String, model: &Model, ty: &str, mask: u128) -> Result<(), GenError> {
    let width = model.width as u32;
    writeln!(
        src,
        "/// Computes the CRC of the {} `bits` bits of {}`val` (`bits` in 0..=8).",
        if model.ref_ { "low" } else { "high" },
        if model.ref_ { "" } else { "the low byte of " }
    )?;
    writeln!(src, "pub fn crc_rem(crc: {ty}, val: u32, bits: u32) -> {ty} {{")?;
    writeln!(src, "    let mut crc: u128 = crc as u128;")?;
    emit_xorout_step(src, model, mask)?;
    if model.rev {
        writeln!(src, "    crc = crc.reverse_bits() >> {};", 128 - width)?;
    }
    if model.ref_ {
        writeln!(src, "    let val = (val & ((1u32 << bits) - 1)) as u128;")?;
        writeln!(src, "    crc ^= val;")?;
        writeln!(src, "    for _ in 0..bits {{")?;
        writeln!(
            src,
            "        crc = if crc & 1 != 0 {{ (crc >> 1) ^ {} }} else {{ crc >> 1 }};",
            fmt_lit(model.poly, "u128")
        )?;
        writeln!(src, "    }}")?;
    } else if width <= 8 {
        let shift = 8 - width;
        writeln!(src, "    crc <<= {shift};")?;
        writeln!(src, "    let val = (val & (0x100u32 - (0x100u32 >> bits))) as u128;")?;
        writeln!(src, "    crc ^= val;")?;
        writeln!(src, "    for _ in 0..bits {{")?;
        writeln!(
            src,
            "        crc = if crc & 0x80 != 0 {{ (crc << 1) ^ {} }} else {{ crc << 1 }};",
            fmt_lit(model.poly << shift, "u128")
        )?;
        writeln!(src, "    }}")?;
        writeln!(src, "    crc >>= {shift};")?;
    } else {
        let shift = width - 8;
        writeln!(src, "    let val = (val & (0x100u32 - (0x100u32 >> bits))) as u128;")?;
        writeln!(src, "    crc ^= val << {shift};")?;
        writeln!(src, "    for _ in 0..bits {{")?;
        writeln!(
            src,
            "        crc = if crc & (1u128 << {}) != 0 {{ (crc << 1) ^ {} }} else {{ crc << 1 }};",
            width - 1,
            fmt_lit(model.poly, "u128")
        )?;
        writeln!(src, "    }}")?;
    }
    writeln!(src, "    crc &= {};", fmt_lit(mask, "u128"))?;
    if model.rev {
        writeln!(src, "    crc = crc.reverse_bits() >> {};", 128 - width)?;
    }
    emit_xorout_step(src, model, mask)?;
    writeln!(src, "    crc as {ty}")?;
    writeln!(src, "}}")?;
    Ok(())
}

fn emit_bytewise(src: &mut String, model: &Model, ty: &str, name: &str) -> Result<(), GenError> {
    let table = build_byte_table(model);
    let width = model.width as u32;

    writeln!(src, "static {}_TABLE: [{ty}; 256] = [", name.to_ascii_uppercase())?;
    for row in table.chunks(8) {
        let entries: Vec<String> = row.iter().map(|&v| fmt_lit(v, ty)).collect();
        writeln!(src, "    {},", entries.join(", "))?;
    }
    writeln!(src, "];")?;
    writeln!(src)?;
    writeln!(src, "/// Computes the CRC of `data` using the precomputed byte table.")?;
    writeln!(src, "pub fn crc_bytewise(data: &[u8]) -> {ty} {{")?;
    writeln!(src, "    let mut crc: {ty} = {};", fmt_lit(model.init, ty))?;
    if model.rev {
        writeln!(src, "    crc = crc.reverse_bits() >> {};", bit_width(ty) - width)?;
    }
    let table_name = format!("{}_TABLE", name.to_ascii_uppercase());
    if model.ref_ {
        writeln!(src, "    for &b in data {{")?;
        writeln!(
            src,
            "        crc = (crc >> 8) ^ {table_name}[((crc ^ b as {ty}) & 0xff) as usize];"
        )?;
        writeln!(src, "    }}")?;
    } else if width <= 8 {
        writeln!(src, "    for &b in data {{")?;
        writeln!(src, "        crc = {table_name}[((crc ^ b as {ty}) & 0xff) as usize];")?;
        writeln!(src, "    }}")?;
    } else {
        let shift = width - 8;
        writeln!(src, "    for &b in data {{")?;
        writeln!(
            src,
            "        crc = (crc << 8) ^ {table_name}[(((crc >> {shift}) ^ b as {ty}) & 0xff) as usize];"
        )?;
        writeln!(src, "    }}")?;
    }
    if model.rev {
        writeln!(src, "    crc = crc.reverse_bits() >> {};", bit_width(ty) - width)?;
    }
    writeln!(src, "    crc")?;
    writeln!(src, "}}")?;
    Ok(())
}

fn bit_width(ty: &str) -> u32 {
    match ty {
        "u8" => 8,
        "u16" => 16,
        "u32" => 32,
        "u64" => 64,
        _ => 128,
    }
}

/// The Rust expression `step_byte` (`wordwise.rs`) would evaluate for
/// position `j` within a `w`-byte group held in `crc` — the byte
/// `zero_step` would consume at that position, masked to `0xff`.
fn step_byte_expr(j: usize, w: usize, ref_: bool) -> String {
    if ref_ {
        format!("(crc >> {}) & 0xff", 8 * j)
    } else {
        format!("(crc >> {}) & 0xff", 8 * (w - 1 - j))
    }
}

/// Emits `crc_word`, which folds `data` `w = ceil(width/8)` bytes at a
/// time using derived per-lane tables, the way [`crate::wordwise`]'s
/// `crc_wordwise`/`merge_group` do at runtime — reproduced here as
/// straight-line generated source (no dependency on this crate) rather
/// than transliterating crcgen.c's pointer-cast word-load version, which
/// needs `unsafe` and doesn't fit this crate's byte-at-a-time engines.
/// Lane 0 is aliased to the byte table `emit_bytewise` already emitted,
/// mirroring crcgen.c's own `#define table_byte table_word[0]` aliasing.
fn emit_wordwise(src: &mut String, model: &Model, ty: &str, name: &str, little: bool) -> Result<(), GenError> {
    let width = model.width as u32;
    let w = ((width as usize) + 7) / 8;
    let upper = name.to_ascii_uppercase();
    let byte_table_name = format!("{upper}_TABLE");

    if w <= 1 {
        writeln!(src, "/// Narrow models gain nothing from lane grouping over the byte table.")?;
        writeln!(src, "pub fn crc_word(data: &[u8]) -> {ty} {{")?;
        writeln!(src, "    crc_bytewise(data)")?;
        writeln!(src, "}}")?;
        return Ok(());
    }

    let byte_table = build_byte_table(model);
    let mut tables: Vec<[u128; 256]> = vec![byte_table];
    for i in 1..w {
        let mut t = [0u128; 256];
        for (k, slot) in t.iter_mut().enumerate() {
            *slot = zero_step(model, &byte_table, tables[i - 1][k]);
        }
        tables.push(t);
    }

    writeln!(src, "static {upper}_WORD_TABLE: [[{ty}; 256]; {}] = [", w - 1)?;
    for lane in &tables[1..] {
        writeln!(src, "    [")?;
        for row in lane.chunks(8) {
            let entries: Vec<String> = row.iter().map(|&v| fmt_lit(v, ty)).collect();
            writeln!(src, "        {},", entries.join(", "))?;
        }
        writeln!(src, "    ],")?;
    }
    writeln!(src, "];")?;
    writeln!(src)?;

    writeln!(src, "/// Computes the CRC of `data`, {w} bytes at a time, using the derived lane tables.")?;
    writeln!(src, "pub fn crc_word(data: &[u8]) -> {ty} {{")?;
    writeln!(src, "    let mut crc: {ty} = {};", fmt_lit(model.init, ty))?;
    if model.rev {
        writeln!(src, "    crc = crc.reverse_bits() >> {};", bit_width(ty) - width)?;
    }

    writeln!(src, "    let prologue = data.len() % {w};")?;
    writeln!(src, "    for &b in &data[..prologue] {{")?;
    if model.ref_ {
        writeln!(
            src,
            "        crc = (crc >> 8) ^ {byte_table_name}[((crc ^ b as {ty}) & 0xff) as usize];"
        )?;
    } else {
        let shift = width - 8;
        writeln!(
            src,
            "        crc = (crc << 8) ^ {byte_table_name}[(((crc >> {shift}) ^ b as {ty}) & 0xff) as usize];"
        )?;
    }
    writeln!(src, "    }}")?;

    writeln!(src, "    for chunk in data[prologue..].chunks_exact({w}) {{")?;
    writeln!(src, "        let mut acc: {ty} = 0;")?;
    let mirror = little == model.ref_;
    for j in 0..w {
        let (crc_expr, data_idx, table_idx) = if mirror {
            (step_byte_expr(j, w, model.ref_), j, w - 1 - j)
        } else {
            (step_byte_expr(j, w, !model.ref_), w - 1 - j, j)
        };
        let table_ref = if table_idx == 0 {
            byte_table_name.clone()
        } else {
            format!("{upper}_WORD_TABLE[{}]", table_idx - 1)
        };
        writeln!(
            src,
            "        acc ^= {table_ref}[((({crc_expr}) ^ (chunk[{data_idx}] as {ty})) & 0xff) as usize];"
        )?;
    }
    writeln!(src, "        crc = acc;")?;
    writeln!(src, "    }}")?;

    if model.rev {
        writeln!(src, "    crc = crc.reverse_bits() >> {};", bit_width(ty) - width)?;
    }
    writeln!(src, "    crc")?;
    writeln!(src, "}}")?;
    Ok(())
}

fn emit_combine(src: &mut String, model: &Model, ty: &str, name: &str) -> Result<(), GenError> {
    // Covers message lengths up to 2^(entries.len()) bytes; if the
    // squaring sequence cycles earlier than 64 doublings the table is
    // shorter, and combining past that length would need the wraparound
    // crc_combine() in crate::combine applies — not reproduced here.
    let width = model.width as u32;
    let table = build_combine_table(model);
    let entries = table.exposed_entries();
    // `mul` below always works in the unreflected (MSB-first) convention,
    // so it needs the polynomial un-reflected even when model.poly (the
    // engine-orientation value) is stored reflected.
    let poly_unrefl = if model.ref_ { crate::bits::reverse(model.poly, width) } else { model.poly };
    let identity = if model.ref_ { crate::bits::reverse(1, width) } else { 1 };

    writeln!(src, "static {}_SHIFTS: [{ty}; {}] = [", name.to_ascii_uppercase(), entries.len())?;
    for row in entries.chunks(8) {
        let rendered: Vec<String> = row.iter().map(|&v| fmt_lit(v, ty)).collect();
        writeln!(src, "    {},", rendered.join(", "))?;
    }
    writeln!(src, "];")?;
    writeln!(src)?;
    writeln!(src, "/// Combines the CRCs of two messages `a` (yielding `crc1`) and `b`")?;
    writeln!(src, "/// (yielding `crc2`, `len2` bytes long) into the CRC of `a ++ b`.")?;
    writeln!(src, "pub fn crc_combine(crc1: {ty}, crc2: {ty}, len2: u64) -> {ty} {{")?;
    writeln!(src, "    let width: u32 = {width};")?;
    writeln!(src, "    let poly: u128 = {};", fmt_lit(poly_unrefl, "u128"))?;
    writeln!(src, "    let rev = |x: u128| -> u128 {{ x.reverse_bits() >> (128 - width) }};")?;
    writeln!(src, "    let mul = |a: u128, b: u128| -> u128 {{")?;
    if model.ref_ {
        writeln!(src, "        let (a, b) = (rev(a), rev(b));")?;
    }
    writeln!(src, "        let mask = if width >= 128 {{ u128::MAX }} else {{ (1u128 << width) - 1 }};")?;
    writeln!(src, "        let mut product = 0u128;")?;
    writeln!(src, "        for i in (0..width).rev() {{")?;
    writeln!(src, "            let top = 1u128 << (width - 1);")?;
    writeln!(src, "            product = if product & top != 0 {{ ((product << 1) & mask) ^ poly }} else {{ (product << 1) & mask }};")?;
    writeln!(src, "            if (a >> i) & 1 != 0 {{ product ^= b; }}")?;
    writeln!(src, "        }}")?;
    if model.ref_ {
        writeln!(src, "        rev(product)")?;
    } else {
        writeln!(src, "        product")?;
    }
    writeln!(src, "    }};")?;
    writeln!(src, "    let mut shift: u128 = {};", fmt_lit(identity, "u128"))?;
    writeln!(src, "    for bit in 0..{} {{", entries.len())?;
    writeln!(src, "        if (len2 >> bit) & 1 != 0 {{")?;
    writeln!(src, "            shift = mul(shift, {}_SHIFTS[bit] as u128);", name.to_ascii_uppercase())?;
    writeln!(src, "        }}")?;
    writeln!(src, "    }}")?;
    writeln!(src, "    let init: u128 = {};", fmt_lit(model.init, "u128"))?;
    writeln!(src, "    let d: u128 = (crc1 as u128) ^ init;")?;
    if model.rev {
        writeln!(src, "    let d = rev(d);")?;
    }
    writeln!(src, "    let mm = mul(shift, d);")?;
    if model.rev {
        writeln!(src, "    let mm = rev(mm);")?;
    }
    writeln!(src, "    (mm ^ crc2 as u128) as {ty}")?;
    writeln!(src, "}}")?;
    Ok(())
}
