//! Segwit address handling on top of the bech32 codec.

use crate::bech32::{self, Bech32Error, Variant};

/// Highest witness version an address may carry.
pub const MAX_WITNESS_VERSION: u8 = 16;

/// A decoded witness program.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SegwitAddress {
    pub version: u8,
    pub program: Vec<u8>,
}

impl SegwitAddress {
    /// Checksum variant required for this witness version (BIP350).
    #[must_use]
    pub fn variant(&self) -> Variant {
        variant_for(self.version)
    }

    /// Output script for this address.
    #[must_use]
    pub fn script_pubkey(&self) -> Vec<u8> {
        script_pubkey(self.version, &self.program)
    }

    /// Encode for the network identified by `hrp`.
    ///
    /// # Errors
    /// See [`encode_segwit_address`].
    pub fn encode(&self, hrp: &str) -> Result<String, Bech32Error> {
        encode_segwit_address(hrp, self.version, &self.program)
    }
}

fn variant_for(version: u8) -> Variant {
    if version == 0 {
        Variant::Bech32
    } else {
        Variant::Bech32m
    }
}

/// Decode `address` and check it belongs to the `expected_hrp` network.
///
/// # Errors
/// - decoding errors from [`bech32::decode`]
/// - [`Bech32Error::InconsistentHrp`] when the HRP differs from `expected_hrp`
/// - [`Bech32Error::MissingVersion`] / [`Bech32Error::InvalidVersion`] for a bad version symbol
/// - [`Bech32Error::InvalidAddress`] when the program is not 2..=40 bytes
/// - [`Bech32Error::InvalidPayToHashLength`] for a version 0 program that is not 20 or 32 bytes
/// - [`Bech32Error::InvalidVariant`] when the checksum variant does not match the version
pub fn decode_segwit_address(
    expected_hrp: &str,
    address: &str,
) -> Result<SegwitAddress, Bech32Error> {
    let decoded = bech32::decode(address)?;
    if !decoded.hrp.eq_ignore_ascii_case(expected_hrp) {
        return Err(Bech32Error::InconsistentHrp);
    }

    let (&version, rest) = decoded
        .data
        .split_first()
        .ok_or(Bech32Error::MissingVersion)?;
    if version > MAX_WITNESS_VERSION {
        return Err(Bech32Error::InvalidVersion);
    }

    let program = bech32::convert_bits(rest, 5, 8, false)?;
    if !(2..=40).contains(&program.len()) {
        return Err(Bech32Error::InvalidAddress);
    }
    if version == 0 && program.len() != 20 && program.len() != 32 {
        return Err(Bech32Error::InvalidPayToHashLength);
    }
    if decoded.variant != variant_for(version) {
        return Err(Bech32Error::InvalidVariant {
            version,
            found: decoded.variant,
        });
    }

    Ok(SegwitAddress { version, program })
}

/// Build the address string for `version` and `program`, then decode it back
/// to make sure the result is a valid address.
///
/// # Errors
/// Returns [`Bech32Error::InvalidVersion`] for versions above 16 and any error
/// [`decode_segwit_address`] reports for the produced string.
pub fn encode_segwit_address(
    hrp: &str,
    version: u8,
    program: &[u8],
) -> Result<String, Bech32Error> {
    if version > MAX_WITNESS_VERSION {
        return Err(Bech32Error::InvalidVersion);
    }
    let mut data = vec![version];
    data.extend(bech32::convert_bits(program, 8, 5, true)?);
    let address = bech32::encode(hrp, &data, variant_for(version))?;
    decode_segwit_address(hrp, &address)?;
    Ok(address)
}

/// Output script: `OP_0` or `OP_1..OP_16`, a push length, then the program.
#[must_use]
pub fn script_pubkey(version: u8, program: &[u8]) -> Vec<u8> {
    let op = if version == 0 { 0 } else { 0x50 + version };
    let mut out = Vec::with_capacity(program.len() + 2);
    out.push(op);
    // programs are at most 40 bytes
    out.push(program.len() as u8);
    out.extend_from_slice(program);
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hex(s: &str) -> Vec<u8> {
        ::hex::decode(s).expect("hex")
    }

    const VALID: &[(&str, &str, &str)] = &[
        (
            "bc",
            "BC1QW508D6QEJXTDG4Y5R3ZARVARY0C5XW7KV8F3T4",
            "0014751e76e8199196d454941c45d1b3a323f1433bd6",
        ),
        (
            "tb",
            "tb1qrp33g0q5c5txsp9arysrx4k6zdkfs4nce4xj0gdcccefvpysxf3q0sl5k7",
            "00201863143c14c5166804bd19203356da136c985678cd4d27a1b8c6329604903262",
        ),
        (
            "tb",
            "tb1qqqqqp399et2xygdj5xreqhjjvcmzhxw4aywxecjdzew6hylgvsesrxh6hy",
            "0020000000c4a5cad46221b2a187905e5266362b99d5e91c6ce24d165dab93e86433",
        ),
        (
            "bc",
            "bc1p0xlxvlhemja6c4dqv22uapctqupfhlxm9h8z3k2e72q4k9hcz7vqzk5jj0",
            "512079be667ef9dcbbac55a06295ce870b07029bfcdb2dce28d959f2815b16f81798",
        ),
        ("bc", "BC1SW50QGDZ25J", "6002751e"),
        (
            "bc",
            "bc1zw508d6qejxtdg4y5r3zarvaryvaxxpcs",
            "5210751e76e8199196d454941c45d1b3a323",
        ),
    ];

    #[test]
    fn valid_addresses_roundtrip() {
        for (hrp, address, script) in VALID {
            let decoded = decode_segwit_address(hrp, address)
                .unwrap_or_else(|e| panic!("{address}: {e}"));
            assert_eq!(decoded.script_pubkey(), hex(script), "{address}");
            let recreated = decoded.encode(hrp).unwrap();
            assert_eq!(recreated, address.to_ascii_lowercase());
        }
    }

    #[test]
    fn p2wpkh_is_version_zero_twenty_bytes() {
        let addr = decode_segwit_address("bc", "bc1qw508d6qejxtdg4y5r3zarvary0c5xw7kv8f3t4").unwrap();
        assert_eq!(addr.version, 0);
        assert_eq!(addr.program.len(), 20);
        assert_eq!(addr.variant(), Variant::Bech32);
    }

    #[test]
    fn invalid_addresses_fail() {
        let invalid = [
            "tc1qw508d6qejxtdg4y5r3zarvary0c5xw7kg3g4ty",
            "bc1qw508d6qejxtdg4y5r3zarvary0c5xw7kv8f3t5",
            "BC13W508D6QEJXTDG4Y5R3ZARVARY0C5XW7KN40WF2",
            "bc1rw5uspcuh",
            "bc10w508d6qejxtdg4y5r3zarvary0c5xw7kw508d6qejxtdg4y5r3zarvary0c5xw7kw5rljs90",
            "BC1QR508D6QEJXTDG4Y5R3ZARVARYV98GJ9P",
            "tb1qrp33g0q5c5txsp9arysrx4k6zdkfs4nce4xj0gdcccefvpysxf3q0sL5k7",
            "tb1pw508d6qejxtdg4y5r3zarqfsj6c3",
            "tb1qrp33g0q5c5txsp9arysrx4k6zdkfs4nce4xj0gdcccefvpysxf3pjxtptv",
        ];
        for address in invalid {
            for hrp in ["bc", "tb"] {
                assert!(
                    decode_segwit_address(hrp, address).is_err(),
                    "expected {address} to be rejected for {hrp}"
                );
            }
        }
    }

    #[test]
    fn hrp_mismatch_is_inconsistent() {
        let err =
            decode_segwit_address("tb", "bc1qw508d6qejxtdg4y5r3zarvary0c5xw7kv8f3t4").unwrap_err();
        assert_eq!(err, Bech32Error::InconsistentHrp);
    }

    #[test]
    fn version_zero_requires_20_or_32_bytes() {
        let mut data = vec![0u8];
        data.extend(bech32::convert_bits(&[7u8; 16], 8, 5, true).unwrap());
        let address = bech32::encode("bc", &data, Variant::Bech32).unwrap();
        assert_eq!(
            decode_segwit_address("bc", &address),
            Err(Bech32Error::InvalidPayToHashLength)
        );
    }

    #[test]
    fn program_length_bounds() {
        for len in [1usize, 41] {
            let mut data = vec![1u8];
            data.extend(bech32::convert_bits(&vec![7u8; len], 8, 5, true).unwrap());
            let address = bech32::encode("bc", &data, Variant::Bech32m).unwrap();
            assert_eq!(
                decode_segwit_address("bc", &address),
                Err(Bech32Error::InvalidAddress),
                "len {len}"
            );
        }
    }

    #[test]
    fn missing_and_invalid_version() {
        let empty = bech32::encode("bc", &[], Variant::Bech32).unwrap();
        assert_eq!(
            decode_segwit_address("bc", &empty),
            Err(Bech32Error::MissingVersion)
        );
        let mut data = vec![17u8];
        data.extend(bech32::convert_bits(&[7u8; 20], 8, 5, true).unwrap());
        let address = bech32::encode("bc", &data, Variant::Bech32m).unwrap();
        assert_eq!(
            decode_segwit_address("bc", &address),
            Err(Bech32Error::InvalidVersion)
        );
    }

    #[test]
    fn checksum_variant_must_match_version() {
        let mut v0 = vec![0u8];
        v0.extend(bech32::convert_bits(&[7u8; 20], 8, 5, true).unwrap());
        let v0_m = bech32::encode("bc", &v0, Variant::Bech32m).unwrap();
        assert_eq!(
            decode_segwit_address("bc", &v0_m),
            Err(Bech32Error::InvalidVariant {
                version: 0,
                found: Variant::Bech32m
            })
        );

        let mut v1 = vec![1u8];
        v1.extend(bech32::convert_bits(&[7u8; 32], 8, 5, true).unwrap());
        let v1_plain = bech32::encode("bc", &v1, Variant::Bech32).unwrap();
        assert!(matches!(
            decode_segwit_address("bc", &v1_plain),
            Err(Bech32Error::InvalidVariant { version: 1, .. })
        ));
    }

    #[test]
    fn encode_rejects_bad_version() {
        assert_eq!(
            encode_segwit_address("bc", 17, &[0u8; 20]),
            Err(Bech32Error::InvalidVersion)
        );
        assert_eq!(
            encode_segwit_address("bc", 0, &[0u8; 21]),
            Err(Bech32Error::InvalidPayToHashLength)
        );
    }

    #[test]
    fn script_pubkey_opcodes() {
        assert_eq!(script_pubkey(0, &[0xab; 20])[..2], [0x00, 20]);
        assert_eq!(script_pubkey(1, &[0xab; 32])[..2], [0x51, 32]);
        assert_eq!(script_pubkey(16, &[0xab; 2])[..2], [0x60, 2]);
    }
}
