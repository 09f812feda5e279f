//! Parameter and result types for the commando RPC methods this crate wraps.
//!
//! Field names follow the core-lightning JSON schema with `_msat` integer
//! amounts.

use serde::{Deserialize, Serialize, Serializer};

use crate::invoice::InvoiceAmount;

/// `getinfo` result.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
pub struct GetInfo {
    pub id: String,
    #[serde(default)]
    pub alias: String,
    #[serde(default)]
    pub color: String,
    pub network: String,
    pub num_peers: u32,
    #[serde(default)]
    pub fees_collected_msat: u64,
    #[serde(default)]
    pub num_active_channels: u32,
    pub blockheight: u32,
}

/// One on-chain output from `listfunds`.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
pub struct Output {
    pub txid: String,
    pub output: u32,
    /// Satoshis.
    #[serde(default)]
    pub value: u64,
    #[serde(default)]
    pub amount_msat: u64,
    #[serde(default)]
    pub address: Option<String>,
    pub status: String,
    #[serde(default)]
    pub reserved: bool,
}

impl Output {
    /// Satoshi value, from `value` or derived from `amount_msat`.
    #[must_use]
    pub fn sats(&self) -> u64 {
        if self.value > 0 {
            self.value
        } else {
            self.amount_msat / 1000
        }
    }
}

/// One channel from `listfunds`.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
pub struct FundChannel {
    pub peer_id: String,
    #[serde(default)]
    pub connected: bool,
    pub state: String,
    #[serde(default)]
    pub short_channel_id: Option<String>,
    pub our_amount_msat: u64,
    pub amount_msat: u64,
    #[serde(default)]
    pub funding_txid: Option<String>,
}

/// `listfunds` result.
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
pub struct ListFunds {
    #[serde(default)]
    pub outputs: Vec<Output>,
    #[serde(default)]
    pub channels: Vec<FundChannel>,
}

/// Wallet balance split between chain and channels.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct Funds {
    pub onchain_sats: u64,
    pub channel_sats: u64,
}

impl Funds {
    #[must_use]
    pub fn total_sats(&self) -> u64 {
        self.onchain_sats.saturating_add(self.channel_sats)
    }
}

impl ListFunds {
    /// Sum outputs and our side of every channel.
    #[must_use]
    pub fn totals(&self) -> Funds {
        let onchain_sats = self
            .outputs
            .iter()
            .fold(0u64, |acc, o| acc.saturating_add(o.sats()));
        let channel_sats = self
            .channels
            .iter()
            .fold(0u64, |acc, c| acc.saturating_add(c.our_amount_msat / 1000));
        Funds {
            onchain_sats,
            channel_sats,
        }
    }
}

/// `pay` parameters.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct PayRequest {
    pub bolt11: String,
    /// Required for invoices without an amount.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub amount_msat: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl PayRequest {
    pub fn new(bolt11: impl Into<String>) -> Self {
        Self {
            bolt11: bolt11.into(),
            amount_msat: None,
            description: None,
        }
    }
}

/// `pay` result.
#[derive(Clone, Debug, PartialEq, Deserialize)]
pub struct Pay {
    #[serde(default)]
    pub destination: Option<String>,
    pub payment_hash: String,
    pub created_at: f64,
    pub parts: u32,
    pub amount_msat: u64,
    pub amount_sent_msat: u64,
    pub payment_preimage: String,
    pub status: String,
}

impl Pay {
    /// Routing fee paid on top of the invoice amount.
    #[must_use]
    pub fn fee_msat(&self) -> u64 {
        self.amount_sent_msat.saturating_sub(self.amount_msat)
    }
}

/// An amount parameter that may also be the literal `"any"`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AmountOrAny {
    Any,
    Msat(u64),
}

impl Serialize for AmountOrAny {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            AmountOrAny::Any => serializer.serialize_str("any"),
            AmountOrAny::Msat(msat) => serializer.serialize_u64(*msat),
        }
    }
}

impl From<Option<u64>> for AmountOrAny {
    fn from(v: Option<u64>) -> Self {
        v.map_or(AmountOrAny::Any, AmountOrAny::Msat)
    }
}

/// `invoice` parameters.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct InvoiceRequest {
    pub amount_msat: AmountOrAny,
    pub label: String,
    pub description: String,
    /// Seconds.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expiry: Option<u64>,
}

/// `invoice` result.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
pub struct InvoiceRes {
    pub bolt11: String,
    #[serde(default)]
    pub payment_hash: Option<String>,
    #[serde(default)]
    pub expires_at: Option<u64>,
}

/// `offer` parameters.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct OfferRequest {
    pub amount: AmountOrAny,
    pub description: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub issuer: Option<String>,
}

/// `offer` result.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
pub struct OfferRes {
    pub bolt12: String,
    #[serde(default)]
    pub offer_id: Option<String>,
}

/// `decode` result for invoices and offers.
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
pub struct Decode {
    /// e.g. `bolt11 invoice`, `bolt12 offer`, `bolt12 invoice`.
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default, alias = "offer_amount_msat", alias = "invoice_amount_msat")]
    pub amount_msat: Option<u64>,
    #[serde(default)]
    pub expiry: Option<u64>,
    #[serde(default)]
    pub relative_expiry: Option<u64>,
    #[serde(default, alias = "offer_description")]
    pub description: Option<String>,
    #[serde(default, alias = "offer_issuer")]
    pub vendor: Option<String>,
    #[serde(default, alias = "payee", alias = "offer_node_id")]
    pub node_id: Option<String>,
    #[serde(default)]
    pub quantity_min: Option<u64>,
}

impl Decode {
    #[must_use]
    pub fn is_offer(&self) -> bool {
        self.kind == "bolt12 offer"
    }

    /// Amount the decoded string asks for.
    #[must_use]
    pub fn amount(&self) -> InvoiceAmount {
        match (self.amount_msat, self.quantity_min) {
            (Some(msat), Some(qty)) => InvoiceAmount::AtLeast {
                msat: msat.saturating_mul(qty),
            },
            (Some(msat), None) => InvoiceAmount::Exact { msat },
            (None, _) => InvoiceAmount::Any,
        }
    }
}

/// `fetchinvoice` parameters.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct FetchInvoiceRequest {
    pub offer: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub amount_msat: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub quantity: Option<u64>,
    /// Seconds the node waits for the offer's issuer.
    pub timeout: u64,
}

/// `fetchinvoice` result.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
pub struct FetchInvoice {
    pub invoice: String,
}

/// `makesecret` result.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
pub struct MakeSecret {
    pub secret: String,
}
