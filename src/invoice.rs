//! Shallow amount extraction from bolt11/bolt12 human-readable prefixes.
//!
//! This is a quick local check used to pick a payment flow before asking the
//! node to fully `decode` the string. It never validates the checksum or the
//! tagged fields.

use serde::{Deserialize, Serialize};

const BOLT11_PREFIX: &str = "lnbc";
const BOLT12_INVOICE_PREFIX: &str = "lni";
const BOLT12_OFFER_PREFIX: &str = "lno1";
const URI_SCHEME: &str = "lightning:";

/// Amount an invoice, offer or LNURL request asks for, in millisatoshis.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "kind")]
pub enum InvoiceAmount {
    /// The payer picks the amount.
    Any,
    Exact { msat: u64 },
    AtLeast { msat: u64 },
    Range { min: u64, max: u64 },
}

impl InvoiceAmount {
    /// The fixed amount, if there is exactly one.
    #[must_use]
    pub fn exact_msat(&self) -> Option<u64> {
        match self {
            InvoiceAmount::Exact { msat } => Some(*msat),
            InvoiceAmount::Range { min, max } if min == max => Some(*min),
            _ => None,
        }
    }

    /// Whether paying `msat` satisfies this amount.
    #[must_use]
    pub fn accepts(&self, msat: u64) -> bool {
        match self {
            InvoiceAmount::Any => true,
            InvoiceAmount::Exact { msat: want } => msat == *want,
            InvoiceAmount::AtLeast { msat: min } => msat >= *min,
            InvoiceAmount::Range { min, max } => (*min..=*max).contains(&msat),
        }
    }
}

/// Result of scanning a string for an invoice prefix.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum InvoiceScan {
    /// No recognised prefix. Not an error: the string is simply something else.
    NotInvoice,
    /// A bolt12 offer; amounts are only known after a `decode` round trip.
    Offer,
    Invoice(InvoiceAmount),
}

#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum InvoiceAmountError {
    #[error("unknown amount multiplier {0:?}")]
    UnknownScale(char),
    #[error("amount multiplier without digits")]
    MissingAmount,
    #[error("amount does not fit in 64 bits of millisatoshis")]
    Overflow,
}

fn scale_factor(scale: u8) -> Option<u64> {
    match scale {
        b'm' => Some(100_000_000),
        b'u' => Some(100_000),
        b'n' => Some(100),
        b'p' => Some(1),
        _ => None,
    }
}

/// Classify `input` and pull the amount out of its human-readable prefix.
///
/// An optional `lightning:` URI scheme and surrounding whitespace are ignored,
/// and matching is case-insensitive.
///
/// # Errors
/// Returns [`InvoiceAmountError`] when a recognised invoice carries a malformed
/// amount: an unknown multiplier, a multiplier with no digits, or an amount that
/// overflows.
pub fn parse_invoice_string(input: &str) -> Result<InvoiceScan, InvoiceAmountError> {
    let lowered = input.trim().to_ascii_lowercase();
    let inv = lowered.strip_prefix(URI_SCHEME).unwrap_or(&lowered);

    if inv.starts_with(BOLT12_OFFER_PREFIX) {
        return Ok(InvoiceScan::Offer);
    }
    let start = if inv.starts_with(BOLT11_PREFIX) {
        BOLT11_PREFIX.len()
    } else if inv.starts_with(BOLT12_INVOICE_PREFIX) {
        BOLT12_INVOICE_PREFIX.len()
    } else {
        return Ok(InvoiceScan::NotInvoice);
    };

    let rest = &inv.as_bytes()[start..];
    let digits = rest.iter().take_while(|b| b.is_ascii_digit()).count();

    // Without a multiplier immediately followed by the separator the amount is
    // not readable at this layer.
    let Some(&scale) = rest.get(digits) else {
        return Ok(InvoiceScan::Invoice(InvoiceAmount::Any));
    };
    if rest.get(digits + 1) != Some(&b'1') {
        return Ok(InvoiceScan::Invoice(InvoiceAmount::Any));
    }

    let factor = scale_factor(scale).ok_or(InvoiceAmountError::UnknownScale(char::from(scale)))?;
    if digits == 0 {
        return Err(InvoiceAmountError::MissingAmount);
    }
    let amount: u64 = inv[start..start + digits]
        .parse()
        .map_err(|_| InvoiceAmountError::Overflow)?;
    let msat = amount
        .checked_mul(factor)
        .ok_or(InvoiceAmountError::Overflow)?;

    Ok(InvoiceScan::Invoice(InvoiceAmount::Exact { msat }))
}

#[cfg(test)]
mod tests {
    use super::*;

    const ANY_AMOUNT: &str = "lnbc1p3psxjypp5335lq3qyr4vaexez53yxac5jfatdavwyq5eskkkvnrx6yw9j75vsdqvw3jhxarpdeusxqyjw5qcqpjsp5z65t0t70q4e6yp0t2rcajwslkz6uqmaw2eu5s3fkdfgaf5sdm7vsrzjqv7cv43pj3u8qy38rxwt6mm8qv6u34qg4y4w3zuk93yafhqws0sz2z2z0yqq40qqqqqqqqlgqqqqqeqqjq9qyyssqd432fhw3shf0l3zy0l3ku3xv8re6lhaayeyr8u0ayfcy46348vrzjsa46j7prz70l34wklyennpk7dzsw8eqacde74z92jylvevvdhgpzcxhyn";

    #[test]
    fn any_amount_parses_ok() {
        assert_eq!(
            parse_invoice_string(ANY_AMOUNT),
            Ok(InvoiceScan::Invoice(InvoiceAmount::Any))
        );
    }

    #[test]
    fn multipliers() {
        let cases = [
            ("lnbc2500u1pvjluezpp5", 2_500 * 100_000),
            ("lnbc20m1pvjluezpp5", 20 * 100_000_000),
            ("lnbc10n1pvjluez", 1_000),
            ("lnbc9678785340p1pwmna7l", 9_678_785_340),
        ];
        for (inv, msat) in cases {
            assert_eq!(
                parse_invoice_string(inv),
                Ok(InvoiceScan::Invoice(InvoiceAmount::Exact { msat })),
                "{inv}"
            );
        }
    }

    #[test]
    fn case_and_scheme_are_ignored() {
        assert_eq!(
            parse_invoice_string("  LIGHTNING:LNBC2500U1PVJLUEZ  "),
            Ok(InvoiceScan::Invoice(InvoiceAmount::Exact {
                msat: 250_000_000
            }))
        );
    }

    #[test]
    fn unrecognised_prefix_is_not_an_error() {
        assert_eq!(
            parse_invoice_string("bc1qw508d6qejxtdg4y5r3zarvary0c5xw7kv8f3t4"),
            Ok(InvoiceScan::NotInvoice)
        );
        assert_eq!(parse_invoice_string("lntb1500n1"), Ok(InvoiceScan::NotInvoice));
        assert_eq!(parse_invoice_string(""), Ok(InvoiceScan::NotInvoice));
    }

    #[test]
    fn offers_are_recognised() {
        assert_eq!(
            parse_invoice_string("lno1pg257enxv4ezqcneype82um50ynhxgrwdajx283qfwdpl28qqmc78ymlvhmxcsywdk5wrjnj36jryg488qwlrnzyjczlqs85ck65ycmkdk92smwt9zuewdzfe7v4aavvaz5kgv9mkk63v3s0ge0f099kssh3yc95qztx504hu92hnx8ctzhtt08pgk0texz0509tk"),
            Ok(InvoiceScan::Offer)
        );
    }

    #[test]
    fn bolt12_invoice_prefix() {
        assert_eq!(
            parse_invoice_string("lni5u1qqq"),
            Ok(InvoiceScan::Invoice(InvoiceAmount::Exact { msat: 500_000 }))
        );
    }

    #[test]
    fn malformed_amounts_fail() {
        assert_eq!(
            parse_invoice_string("lnbc2500x1pvjluez"),
            Err(InvoiceAmountError::UnknownScale('x'))
        );
        assert_eq!(
            parse_invoice_string("lnbcu1pvjluez"),
            Err(InvoiceAmountError::MissingAmount)
        );
        assert_eq!(
            parse_invoice_string("lnbc99999999999999999999m1pvjluez"),
            Err(InvoiceAmountError::Overflow)
        );
        assert_eq!(
            parse_invoice_string("lnbc999999999999m1pvjluez"),
            Err(InvoiceAmountError::Overflow)
        );
    }

    #[test]
    fn truncated_prefix_is_indeterminate() {
        assert_eq!(
            parse_invoice_string("lnbc"),
            Ok(InvoiceScan::Invoice(InvoiceAmount::Any))
        );
        assert_eq!(
            parse_invoice_string("lnbc2500"),
            Ok(InvoiceScan::Invoice(InvoiceAmount::Any))
        );
        assert_eq!(
            parse_invoice_string("lnbc2500u"),
            Ok(InvoiceScan::Invoice(InvoiceAmount::Any))
        );
    }

    #[test]
    fn amount_acceptance() {
        assert!(InvoiceAmount::Any.accepts(1));
        assert!(InvoiceAmount::Exact { msat: 5 }.accepts(5));
        assert!(!InvoiceAmount::Exact { msat: 5 }.accepts(6));
        assert!(InvoiceAmount::AtLeast { msat: 5 }.accepts(6));
        assert!(!InvoiceAmount::Range { min: 1, max: 3 }.accepts(4));
        assert_eq!(InvoiceAmount::Range { min: 3, max: 3 }.exact_msat(), Some(3));
        assert_eq!(InvoiceAmount::AtLeast { msat: 3 }.exact_msat(), None);
    }
}
