//! A handful of well-known RevEng-catalogued models, used by the test
//! suite and by `crcgen`'s built-in self-check.

use crate::model::RawModel;

fn model(
    width: u8,
    poly: u128,
    init: u128,
    refin: bool,
    refout: bool,
    xorout: u128,
    check: u128,
    residue: u128,
    name: &str,
) -> RawModel {
    RawModel {
        width,
        poly,
        init,
        refin,
        refout,
        xorout,
        check,
        residue,
        name: name.to_string(),
    }
}

pub fn crc32_iso_hdlc() -> RawModel {
    model(
        32, 0x04c11db7, 0xffffffff, true, true, 0xffffffff, 0xcbf43926, 0xdebb20e3,
        "CRC-32/ISO-HDLC",
    )
}

pub fn crc16_kermit() -> RawModel {
    model(16, 0x1021, 0x0000, true, true, 0x0000, 0x2189, 0x0000, "CRC-16/KERMIT")
}

pub fn crc16_xmodem() -> RawModel {
    model(16, 0x1021, 0x0000, false, false, 0x0000, 0x31c3, 0x0000, "CRC-16/XMODEM")
}

pub fn crc8_smbus() -> RawModel {
    model(8, 0x07, 0x00, false, false, 0x00, 0xf4, 0x00, "CRC-8/SMBUS")
}

/// `refin != refout`, exercising `Model::rev`.
pub fn crc12_umts() -> RawModel {
    model(12, 0x80f, 0x000, false, true, 0x000, 0xdaf, 0x178, "CRC-12/UMTS")
}

pub fn crc64_xz() -> RawModel {
    model(
        64,
        0x42f0e1eba9ea3693,
        0xffffffffffffffff,
        true,
        true,
        0xffffffffffffffff,
        0x995dc9bbdf1939fa,
        0x49958c9abd7d353f,
        "CRC-64/XZ",
    )
}

/// A double-word example (`width > 64`), exercising the bitwise-only path.
pub fn crc82_darc() -> RawModel {
    model(
        82,
        0x0308c0111011401440411,
        0x0,
        true,
        true,
        0x0,
        0x09ea83f625023801fd612,
        0x0,
        "CRC-82/DARC",
    )
}

/// All models in this catalogue, for exhaustive iteration in tests.
pub fn all() -> Vec<RawModel> {
    vec![
        crc32_iso_hdlc(),
        crc16_kermit(),
        crc16_xmodem(),
        crc8_smbus(),
        crc12_umts(),
        crc64_xz(),
        crc82_darc(),
    ]
}
