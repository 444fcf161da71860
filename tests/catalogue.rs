//! Integration-level regression fixture: the concrete check-value
//! scenarios and the quantified invariants play the role crcany.c's
//! verification driver plays for the original project, exercised here
//! against the public API rather than a standalone C binary.

use crc_rocksoft::combine::{build_combine_table, crc_combine};
use crc_rocksoft::engine::{build_byte_table, crc_bitwise, crc_bytewise};
use crc_rocksoft::wordwise::{crc_wordwise, LaneWidth, WordTable};
use crc_rocksoft::{catalogue, Crc, Model};

fn digest_bitwise(model: &Model, data: &[u8]) -> u128 {
    crc_bitwise(model, crc_bitwise(model, 0, None), Some(data))
}

macro_rules! check_value_scenarios {
    ($($name:ident: $raw:expr => $expected:expr;)+) => {
        $(
            #[test]
            fn $name() {
                let raw = $raw;
                let crc = Crc::new(&raw).expect("catalogued model should validate");
                assert_eq!(crc.digest(b"123456789"), $expected);
            }
        )+
    };
}

check_value_scenarios! {
    crc32_iso_hdlc_check_value: catalogue::crc32_iso_hdlc() => 0xcbf43926;
    crc16_kermit_check_value: catalogue::crc16_kermit() => 0x2189;
    crc16_xmodem_check_value: catalogue::crc16_xmodem() => 0x31c3;
    crc8_smbus_check_value: catalogue::crc8_smbus() => 0xf4;
    crc64_xz_check_value: catalogue::crc64_xz() => 0x995dc9bbdf1939fa;
    crc82_darc_check_value: catalogue::crc82_darc() => 0x09ea83f625023801fd612;
}

#[test]
fn crc32_combine_matches_scenario_table() {
    // "combine(crc("12345"), crc("6789"), 4) == 0xcbf43926" from the spec's
    // concrete scenarios.
    let raw = catalogue::crc32_iso_hdlc();
    let model = Model::normalize(&raw);
    let table = build_combine_table(&model);

    let crc1 = digest_bitwise(&model, b"12345");
    let crc2 = digest_bitwise(&model, b"6789");
    let combined = crc_combine(&model, &table, crc1, crc2, 4);
    assert_eq!(combined, 0xcbf43926);
}

#[test]
fn every_catalogued_model_passes_self_verify() {
    for raw in catalogue::all() {
        let crc = Crc::new(&raw).unwrap_or_else(|e| panic!("{}: {e}", raw.name));
        let report = crc.verify();
        assert!(report.all_passed(), "{}: {report:?}", raw.name);
    }
}

#[test]
fn engine_agreement_across_bitwise_bytewise_wordwise() {
    // Property 2: for width <= word_bits, all three engines agree.
    for raw in [
        catalogue::crc32_iso_hdlc(),
        catalogue::crc16_kermit(),
        catalogue::crc16_xmodem(),
        catalogue::crc8_smbus(),
        catalogue::crc12_umts(),
        catalogue::crc64_xz(),
    ] {
        let model = Model::normalize(&raw);
        let byte_table = build_byte_table(&model);
        let word_table = WordTable::build(&model, &byte_table, LaneWidth::W64, true);

        let data: &[u8] = b"The quick brown fox jumps over the lazy dog, 1234567890 times.";

        let bit = digest_bitwise(&model, data);
        let byte = crc_bytewise(&model, &byte_table, crc_bytewise(&model, &byte_table, 0, None), Some(data));
        let word = crc_wordwise(
            &model,
            &byte_table,
            &word_table,
            crc_wordwise(&model, &byte_table, &word_table, 0, None),
            Some(data),
        );

        assert_eq!(bit, byte, "{}: bitwise vs bytewise", raw.name);
        assert_eq!(bit, word, "{}: bitwise vs wordwise", raw.name);
    }
}

#[test]
fn chunk_additivity_holds_for_arbitrary_split_points() {
    // Property 1: feeding chunks sequentially equals one call on the whole.
    let raw = catalogue::crc16_kermit();
    let crc = Crc::new(&raw).unwrap();
    let data = b"the quick brown fox jumps over the lazy dog";

    let whole = crc.digest(data);
    for split in 0..=data.len() {
        let (a, b) = data.split_at(split);
        let mut acc = crc.start();
        acc = crc.update(acc, a);
        acc = crc.update(acc, b);
        assert_eq!(acc, whole, "split at {split}");
    }
}

#[test]
fn zero_run_agrees_with_appending_zero_bytes() {
    // Property 7: crc_zeros(M, crc, 8k) == bytewise(M, crc, [0; k]).
    use crc_rocksoft::combine::crc_zeros;

    let raw = catalogue::crc32_iso_hdlc();
    let model = Model::normalize(&raw);
    let byte_table = build_byte_table(&model);

    let base = digest_bitwise(&model, b"123456789");
    for k in [0usize, 1, 3, 7, 16, 255] {
        let mut padded = b"123456789".to_vec();
        padded.extend(std::iter::repeat(0u8).take(k));
        let expected = crc_bytewise(&model, &byte_table, crc_bytewise(&model, &byte_table, 0, None), Some(&padded));
        let actual = crc_zeros(&model, base, k as u64 * 8);
        assert_eq!(actual, expected, "k={k}");
    }
}

#[test]
fn combine_correctness_over_many_splits_for_every_catalogued_model() {
    // Property 6, across every width class the catalogue covers (narrow,
    // word-sized; double-word is excluded since combine is only lifted to
    // fast-table widths). Includes crc12_umts (refin != refout) to cover
    // the `model.rev` branch of `crc_combine`.
    let data = b"combine correctness must hold for every split point, not just a lucky one";
    for raw in [
        catalogue::crc32_iso_hdlc(),
        catalogue::crc16_xmodem(),
        catalogue::crc8_smbus(),
        catalogue::crc12_umts(),
    ] {
        let model = Model::normalize(&raw);
        let table = build_combine_table(&model);
        let whole = digest_bitwise(&model, data);

        for split in [0usize, 1, 7, data.len() / 2, data.len() - 1, data.len()] {
            let (a, b) = data.split_at(split);
            let crc1 = digest_bitwise(&model, a);
            let crc2 = digest_bitwise(&model, b);
            let combined = crc_combine(&model, &table, crc1, crc2, b.len() as u64);
            assert_eq!(combined, whole, "{}: split at {split}", raw.name);
        }
    }
}

#[test]
fn reversal_is_an_involution_for_every_model_width() {
    // Property 3, restated against the public-facing width range.
    use crc_rocksoft::bits::{ones, reverse};
    for n in 1..=128u32 {
        let x = ones(n);
        assert_eq!(reverse(reverse(x, n), n), x & ones(n));
    }
}

#[test]
fn wordwise_alignment_transparency() {
    // Property 9: wordwise(M, crc, data) == wordwise(M, crc, data_at_offset)
    // for data containing the same bytes, regardless of where within a
    // larger buffer that slice starts.
    let raw = catalogue::crc32_iso_hdlc();
    let model = Model::normalize(&raw);
    let byte_table = build_byte_table(&model);
    let word_table = WordTable::build(&model, &byte_table, LaneWidth::W64, true);

    let payload = b"alignment must not change the result, ever";
    let mut buf = vec![0xaa; 5];
    buf.extend_from_slice(payload);

    let aligned = crc_wordwise(
        &model,
        &byte_table,
        &word_table,
        crc_wordwise(&model, &byte_table, &word_table, 0, None),
        Some(payload),
    );
    let offset = crc_wordwise(
        &model,
        &byte_table,
        &word_table,
        crc_wordwise(&model, &byte_table, &word_table, 0, None),
        Some(&buf[5..]),
    );
    assert_eq!(aligned, offset);
}
