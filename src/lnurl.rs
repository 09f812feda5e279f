//! LNURL-pay: bech32 `lnurl1...` payloads, lightning addresses, and the JSON
//! documents a pay service returns.
//!
//! HTTP is left to the caller; this module only builds URLs and decodes
//! response bodies.

use serde::{de::DeserializeOwned, Deserialize, Serialize};
use url::Url;

use crate::{
    bech32::{self, Bech32Error},
    invoice::InvoiceAmount,
};

const LNURL_HRP: &str = "lnurl";
const URI_SCHEME: &str = "lightning:";

#[derive(Debug, thiserror::Error)]
pub enum LnUrlDecodeError {
    #[error(transparent)]
    Bech32(#[from] Bech32Error),
    #[error("unexpected human-readable part {0:?}")]
    WrongHrp(String),
    #[error("payload is not utf-8")]
    NotUtf8,
    #[error("invalid url: {0}")]
    InvalidUrl(#[from] url::ParseError),
}

/// Decode an `lnurl1...` string to the URL it wraps.
///
/// A `lightning:` prefix is accepted. Payloads of the form `name@host` resolve
/// to the lightning-address endpoint.
///
/// # Errors
/// Returns [`LnUrlDecodeError`] when the bech32 layer fails, the HRP is not
/// `lnurl`, or the payload is not a URL.
pub fn decode_lnurl(input: &str) -> Result<Url, LnUrlDecodeError> {
    let input = input.trim();
    let input = match input.get(..URI_SCHEME.len()) {
        Some(prefix) if prefix.eq_ignore_ascii_case(URI_SCHEME) => &input[URI_SCHEME.len()..],
        _ => input,
    };

    let decoded = bech32::decode(input)?;
    if decoded.hrp != LNURL_HRP {
        return Err(LnUrlDecodeError::WrongHrp(decoded.hrp));
    }
    let bytes = decoded.to_bytes()?;
    let text = String::from_utf8(bytes).map_err(|_| LnUrlDecodeError::NotUtf8)?;

    if let Some((name, host)) = parse_lightning_address(&text) {
        return lightning_address_url(name, host);
    }
    Ok(Url::parse(&text)?)
}

/// Split a `name@host` lightning address.
#[must_use]
pub fn parse_lightning_address(s: &str) -> Option<(&str, &str)> {
    let (name, host) = s.trim().split_once('@')?;
    let valid_host = host.contains('.')
        && !host
            .chars()
            .any(|c| c.is_whitespace() || c == '/' || c == '@' || c == '?');
    if name.is_empty() || name.contains(char::is_whitespace) || !valid_host {
        return None;
    }
    Some((name, host))
}

/// `https://<host>/.well-known/lnurlp/<name>`.
///
/// # Errors
/// Returns [`LnUrlDecodeError::InvalidUrl`] if `host` does not form a valid URL.
pub fn lightning_address_url(name: &str, host: &str) -> Result<Url, LnUrlDecodeError> {
    let mut url = Url::parse(&format!("https://{host}"))?;
    url.set_path(&format!("/.well-known/lnurlp/{name}"));
    Ok(url)
}

/// First response of an LNURL-pay service.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LnUrlPay {
    pub callback: Url,
    #[serde(default)]
    pub max_sendable: Option<u64>,
    #[serde(default)]
    pub min_sendable: Option<u64>,
    /// JSON-encoded array of `[mime, value]` pairs.
    pub metadata: String,
    pub tag: String,
}

/// The human-readable parts of [`LnUrlPay::metadata`].
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct LnUrlMetadata {
    pub description: Option<String>,
    pub long_description: Option<String>,
    pub identifier: Option<String>,
}

impl LnUrlPay {
    /// Millisatoshi bounds the service accepts.
    #[must_use]
    pub fn amount(&self) -> InvoiceAmount {
        match (self.min_sendable, self.max_sendable) {
            (Some(min), Some(max)) if min == max => InvoiceAmount::Exact { msat: min },
            (Some(min), Some(max)) => InvoiceAmount::Range { min, max },
            (Some(min), None) => InvoiceAmount::AtLeast { msat: min },
            _ => InvoiceAmount::Any,
        }
    }

    /// Callback URL requesting an invoice for `amount_msat`.
    #[must_use]
    pub fn callback_url(&self, amount_msat: u64) -> Url {
        let mut url = self.callback.clone();
        url.query_pairs_mut()
            .append_pair("amount", &amount_msat.to_string());
        url
    }

    /// Decode the metadata entries; malformed metadata yields empty fields.
    #[must_use]
    pub fn metadata_entries(&self) -> LnUrlMetadata {
        let entries: Vec<Vec<String>> = serde_json::from_str(&self.metadata).unwrap_or_default();
        let mut out = LnUrlMetadata::default();
        for entry in entries {
            let [mime, value] = <[String; 2]>::try_from(entry).unwrap_or_default();
            match mime.as_str() {
                "text/plain" => out.description = Some(value),
                "text/long-desc" => out.long_description = Some(value),
                "text/identifier" => out.identifier = Some(value),
                _ => {}
            }
        }
        out
    }

    /// Who is being paid: the `text/identifier` entry, else the callback host.
    #[must_use]
    pub fn vendor(&self) -> String {
        self.metadata_entries()
            .identifier
            .or_else(|| self.callback.host_str().map(str::to_string))
            .unwrap_or_default()
    }
}

/// Callback response carrying the invoice.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
pub struct LnUrlPayInvoice {
    pub pr: String,
}

/// `{"status":"ERROR","reason":..}` returned by an LNURL service.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize, thiserror::Error)]
#[error("lnurl service error: {}", .reason.as_deref().unwrap_or("unknown"))]
pub struct LnUrlError {
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub reason: Option<String>,
}

#[derive(Debug, thiserror::Error)]
pub enum LnUrlResponseError {
    #[error(transparent)]
    Service(#[from] LnUrlError),
    #[error("failed to decode lnurl response: {0}")]
    Decoding(#[from] serde_json::Error),
}

/// Decode a service response body, surfacing `status: ERROR` replies.
///
/// # Errors
/// [`LnUrlResponseError::Service`] for an error document, otherwise
/// [`LnUrlResponseError::Decoding`] if `body` is not a `T`.
pub fn decode_response<T: DeserializeOwned>(body: &[u8]) -> Result<T, LnUrlResponseError> {
    if let Ok(err) = serde_json::from_slice::<LnUrlError>(body) {
        if err.status.as_deref() == Some("ERROR") {
            return Err(err.into());
        }
    }
    Ok(serde_json::from_slice(body)?)
}
