use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Default wait for ordinary RPC calls.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_millis(8_000);

/// Default wait for calls that block on network activity (`pay`, `fetchinvoice`).
pub const DEFAULT_SLOW_TIMEOUT: Duration = Duration::from_secs(30);

/// Headroom given to the node so its own `fetchinvoice` timeout fires first.
pub const FETCH_INVOICE_NODE_HEADROOM: Duration = Duration::from_secs(5);

/// Session configuration applied to a [`crate::commando::Commando`] and the
/// [`crate::client::Client`] wrappers built on it.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CommandoConfig {
    /// Whole-call timeout for ordinary RPC calls.
    #[serde(with = "duration_ms")]
    pub default_timeout: Duration,
    /// Whole-call timeout for `pay`.
    #[serde(with = "duration_ms")]
    pub pay_timeout: Duration,
    /// Whole-call timeout for `fetchinvoice`.
    #[serde(with = "duration_ms")]
    pub fetch_invoice_timeout: Duration,
    /// Fail a call when a message type other than reply/ping shows up mid-reply.
    /// Off by default: gossip shares the peer connection.
    pub strict_message_types: bool,
}

impl Default for CommandoConfig {
    fn default() -> Self {
        Self {
            default_timeout: DEFAULT_TIMEOUT,
            pay_timeout: DEFAULT_SLOW_TIMEOUT,
            fetch_invoice_timeout: DEFAULT_SLOW_TIMEOUT,
            strict_message_types: false,
        }
    }
}

impl CommandoConfig {
    /// Seconds passed to the node as the `fetchinvoice` `timeout` parameter.
    ///
    /// Never below one second.
    #[must_use]
    pub fn fetch_invoice_node_timeout_secs(&self) -> u64 {
        self.fetch_invoice_timeout
            .saturating_sub(FETCH_INVOICE_NODE_HEADROOM)
            .as_secs()
            .max(1)
    }
}

mod duration_ms {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        let ms = u64::try_from(value.as_millis()).unwrap_or(u64::MAX);
        serializer.serialize_u64(ms)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        u64::deserialize(deserializer).map(Duration::from_millis)
    }
}
