//! Bech32 and bech32m string codec (BIP173 / BIP350).
//!
//! The codec only knows about the human-readable part, the 5-bit data symbols
//! and the 6-symbol checksum. Address semantics live in [`crate::segwit`].

use std::fmt;

/// Data-part alphabet, indexed by 5-bit value.
pub const CHARSET: &[u8; 32] = b"qpzry9x8gf2tvdw0s3jn54khce6mua7l";

/// Separator between the human-readable part and the data part.
pub const SEPARATOR: char = '1';

/// Number of checksum symbols appended to the data part.
pub const CHECKSUM_LEN: usize = 6;

const GENERATOR: [u32; 5] = [0x3b6a_57b2, 0x2650_8e6d, 0x1ea1_19fa, 0x3d42_33dd, 0x2a14_62b3];

const BECH32_CONST: u32 = 1;
const BECH32M_CONST: u32 = 0x2bc8_30a3;

/// Checksum flavour. Both share the generator; only the final XOR constant differs.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Variant {
    /// BIP173, used by segwit v0 addresses, LNURL and bolt11.
    Bech32,
    /// BIP350, used by segwit v1+ addresses.
    Bech32m,
}

impl Variant {
    /// Residue `polymod` must produce for a valid string of this variant.
    #[must_use]
    pub const fn constant(self) -> u32 {
        match self {
            Variant::Bech32 => BECH32_CONST,
            Variant::Bech32m => BECH32M_CONST,
        }
    }

    fn from_residue(residue: u32) -> Option<Self> {
        match residue {
            BECH32_CONST => Some(Variant::Bech32),
            BECH32M_CONST => Some(Variant::Bech32m),
            _ => None,
        }
    }
}

impl fmt::Display for Variant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Variant::Bech32 => write!(f, "bech32"),
            Variant::Bech32m => write!(f, "bech32m"),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum Bech32Error {
    #[error("mixed case characters are not allowed")]
    CaseMixing,
    #[error("internally inconsistent hrp")]
    InconsistentHrp,
    #[error("address is not a valid type")]
    InvalidAddress,
    #[error("bits are not valid")]
    InvalidBits,
    #[error("character {0:?} is not valid")]
    InvalidCharacter(String),
    #[error("checksum failed to verify data")]
    InvalidChecksum,
    #[error("unknown hash length for encoded output payload hash")]
    InvalidPayToHashLength,
    #[error("invalid version number")]
    InvalidVersion,
    #[error("missing address data separator")]
    MissingSeparator,
    #[error("missing address version")]
    MissingVersion,
    #[error("witness version {version} cannot use a {found} checksum")]
    InvalidVariant { version: u8, found: Variant },
    #[error("empty human-readable part")]
    EmptyHrp,
}

/// A decoded bech32 string: lowercase HRP, 5-bit payload (checksum removed) and
/// the checksum variant that verified it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Bech32Data {
    pub hrp: String,
    pub data: Vec<u8>,
    pub variant: Variant,
}

impl Bech32Data {
    /// Repack the 5-bit payload into bytes, rejecting non-canonical padding.
    ///
    /// # Errors
    /// Returns [`Bech32Error::InvalidBits`] when the trailing bits are not zero padding.
    pub fn to_bytes(&self) -> Result<Vec<u8>, Bech32Error> {
        convert_bits(&self.data, 5, 8, false)
    }

    /// Re-encode into its canonical lowercase string form.
    ///
    /// # Errors
    /// See [`encode`].
    pub fn encode(&self) -> Result<String, Bech32Error> {
        encode(&self.hrp, &self.data, self.variant)
    }
}

/// Expand the HRP for checksum computation: high bits of every byte, a zero,
/// then the low five bits of every byte.
#[must_use]
pub fn hrp_expand(hrp: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(hrp.len() * 2 + 1);
    out.extend(hrp.iter().map(|b| b >> 5));
    out.push(0);
    out.extend(hrp.iter().map(|b| b & 31));
    out
}

/// BCH checksum over GF(32). Only the low 30 bits of the result are meaningful.
#[must_use]
pub fn polymod(values: &[u8]) -> u32 {
    let mut chk: u32 = 1;
    for &value in values {
        let top = chk >> 25;
        chk = ((chk & 0x01ff_ffff) << 5) ^ u32::from(value);
        for (i, generator) in GENERATOR.iter().enumerate() {
            if (top >> i) & 1 == 1 {
                chk ^= generator;
            }
        }
    }
    chk
}

fn residue(hrp: &[u8], data: &[u8]) -> u32 {
    let mut values = hrp_expand(hrp);
    values.extend_from_slice(data);
    polymod(&values)
}

/// Check `data` (checksum included) against the given variant's constant.
#[must_use]
pub fn verify_checksum(hrp: &[u8], data: &[u8], variant: Variant) -> bool {
    residue(hrp, data) == variant.constant()
}

/// Compute the six checksum symbols for `data`, most significant first.
#[must_use]
pub fn create_checksum(hrp: &[u8], data: &[u8], variant: Variant) -> [u8; CHECKSUM_LEN] {
    let mut values = hrp_expand(hrp);
    values.extend_from_slice(data);
    values.extend_from_slice(&[0; CHECKSUM_LEN]);
    let modulus = polymod(&values) ^ variant.constant();
    let mut out = [0u8; CHECKSUM_LEN];
    for (i, symbol) in out.iter_mut().enumerate() {
        // masked to five bits, the cast cannot truncate
        *symbol = ((modulus >> (5 * (5 - i))) & 31) as u8;
    }
    out
}

fn check_hrp(hrp: &str) -> Result<String, Bech32Error> {
    if hrp.is_empty() {
        return Err(Bech32Error::EmptyHrp);
    }
    if let Some(c) = hrp.chars().find(|c| !is_printable(*c)) {
        return Err(Bech32Error::InvalidCharacter(c.to_string()));
    }
    if hrp.bytes().any(|b| b.is_ascii_lowercase()) && hrp.bytes().any(|b| b.is_ascii_uppercase()) {
        return Err(Bech32Error::CaseMixing);
    }
    Ok(hrp.to_ascii_lowercase())
}

fn is_printable(c: char) -> bool {
    matches!(u32::from(c), 33..=126)
}

/// Encode `hrp` and 5-bit `data` as a lowercase bech32/bech32m string.
///
/// # Errors
/// Returns [`Bech32Error::EmptyHrp`], [`Bech32Error::CaseMixing`] or
/// [`Bech32Error::InvalidCharacter`] when the HRP is unusable, and
/// [`Bech32Error::InvalidCharacter`] when a data value does not fit in five bits.
pub fn encode(hrp: &str, data: &[u8], variant: Variant) -> Result<String, Bech32Error> {
    let hrp = check_hrp(hrp)?;
    if let Some(bad) = data.iter().find(|v| **v > 31) {
        return Err(Bech32Error::InvalidCharacter(format!("{bad:#04x}")));
    }
    let checksum = create_checksum(hrp.as_bytes(), data, variant);
    let mut out = String::with_capacity(hrp.len() + 1 + data.len() + CHECKSUM_LEN);
    out.push_str(&hrp);
    out.push(SEPARATOR);
    out.extend(
        data.iter()
            .chain(checksum.iter())
            .map(|v| char::from(CHARSET[usize::from(*v)])),
    );
    Ok(out)
}

/// Convenience wrapper: regroup `bytes` into 5-bit symbols (padded) and encode.
///
/// # Errors
/// See [`encode`].
pub fn encode_bytes(hrp: &str, bytes: &[u8], variant: Variant) -> Result<String, Bech32Error> {
    let data = convert_bits(bytes, 8, 5, true)?;
    encode(hrp, &data, variant)
}

fn charset_index(byte: u8) -> Option<u8> {
    CHARSET
        .iter()
        .position(|c| *c == byte)
        .and_then(|i| u8::try_from(i).ok())
}

/// Decode a bech32 or bech32m string. The variant is detected from the checksum.
///
/// # Errors
/// - [`Bech32Error::InvalidCharacter`] for characters outside `[33,126]` or outside the charset
/// - [`Bech32Error::CaseMixing`] when both upper and lower case letters appear
/// - [`Bech32Error::MissingSeparator`] when no `1` leaves a non-empty HRP and six checksum symbols
/// - [`Bech32Error::InvalidChecksum`] when neither checksum constant verifies
pub fn decode(input: &str) -> Result<Bech32Data, Bech32Error> {
    if let Some(c) = input.chars().find(|c| !is_printable(*c)) {
        return Err(Bech32Error::InvalidCharacter(c.to_string()));
    }
    let has_lower = input.bytes().any(|b| b.is_ascii_lowercase());
    let has_upper = input.bytes().any(|b| b.is_ascii_uppercase());
    if has_lower && has_upper {
        return Err(Bech32Error::CaseMixing);
    }

    let lowered = input.to_ascii_lowercase();
    let pos = lowered
        .rfind(SEPARATOR)
        .ok_or(Bech32Error::MissingSeparator)?;
    if pos < 1 || pos + CHECKSUM_LEN + 1 > lowered.len() {
        return Err(Bech32Error::MissingSeparator);
    }

    let (hrp, rest) = lowered.split_at(pos);
    let mut data = rest[1..]
        .bytes()
        .map(|b| charset_index(b).ok_or_else(|| Bech32Error::InvalidCharacter(char::from(b).to_string())))
        .collect::<Result<Vec<u8>, _>>()?;

    let variant =
        Variant::from_residue(residue(hrp.as_bytes(), &data)).ok_or(Bech32Error::InvalidChecksum)?;
    data.truncate(data.len() - CHECKSUM_LEN);

    Ok(Bech32Data {
        hrp: hrp.to_string(),
        data,
        variant,
    })
}

/// Regroup bit-packed values from `from_bits` wide to `to_bits` wide.
///
/// With `pad` set, a trailing partial group is zero-filled. Without it, leftover
/// bits must be fewer than `from_bits` and all zero.
///
/// # Errors
/// - [`Bech32Error::InvalidCharacter`] when an input value has bits above `from_bits`
/// - [`Bech32Error::InvalidBits`] for non-canonical padding or widths outside `1..=8`
pub fn convert_bits(
    data: &[u8],
    from_bits: u32,
    to_bits: u32,
    pad: bool,
) -> Result<Vec<u8>, Bech32Error> {
    if !(1..=8).contains(&from_bits) || !(1..=8).contains(&to_bits) {
        return Err(Bech32Error::InvalidBits);
    }
    let maxv: u32 = (1 << to_bits) - 1;
    let max_acc: u32 = (1 << (from_bits + to_bits - 1)) - 1;
    let mut acc: u32 = 0;
    let mut bits: u32 = 0;
    let mut out = Vec::with_capacity(data.len() * from_bits as usize / to_bits as usize + 1);

    for &value in data {
        let value = u32::from(value);
        if value >> from_bits != 0 {
            return Err(Bech32Error::InvalidCharacter(format!("{value:#04x}")));
        }
        acc = ((acc << from_bits) | value) & max_acc;
        bits += from_bits;
        while bits >= to_bits {
            bits -= to_bits;
            out.push(((acc >> bits) & maxv) as u8);
        }
    }

    if pad {
        if bits > 0 {
            out.push(((acc << (to_bits - bits)) & maxv) as u8);
        }
    } else if bits >= from_bits || (acc << (to_bits - bits)) & maxv != 0 {
        return Err(Bech32Error::InvalidBits);
    }

    Ok(out)
}
