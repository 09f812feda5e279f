//! Commando RPC session over a [`Transport`].
//!
//! A call frames `(method, params, rune)` into one request, then waits for the
//! node's reply parts. Pings are answered, unrelated traffic (gossip sharing
//! the peer link) is skipped, and the assembled body is decoded from the
//! `{"result": ..}` / `{"error": ..}` envelope.

pub mod wire;

use std::time::Duration;

use bytes::{Bytes, BytesMut};
use serde::{de::DeserializeOwned, Serialize};
use thiserror::Error;
use tokio::time::{timeout_at, Instant};
use tracing::{debug, trace};

use crate::{
    config::CommandoConfig,
    credentials::parse_connection_string,
    transport::{Transport, TransportError},
};

use self::wire::ReplyKind;

#[derive(Debug, Error)]
pub enum CommandoError {
    #[error("failed to decode reply: {source}")]
    Decoding {
        #[source]
        source: serde_json::Error,
        raw: Bytes,
    },
    #[error("rpc error: {message}")]
    Rpc { message: String, code: Option<i64> },
    #[error("connection failed")]
    ConnectionFailed(#[source] TransportError),
    #[error("init failed")]
    InitFailed(#[source] TransportError),
    #[error("write failed")]
    WriteFailed(#[source] TransportError),
    #[error("timed out after {0:?}")]
    Timeout(Duration),
    #[error("waiting for a message failed")]
    SelectFailed(#[source] TransportError),
    #[error("receive failed")]
    RecvFailed,
    #[error("unexpected message type {0}")]
    UnexpectedMessageType(u16),
    #[error("bad connection string: {0}")]
    BadConnectionString(String),
    #[error("failed to encode request: {0}")]
    EncodingFailed(String),
    #[error("message type {msg_type} too short ({len} bytes)")]
    ShortMessage { msg_type: u16, len: usize },
    #[error("{0}")]
    Unknown(String),
}

impl CommandoError {
    /// Raw reply bytes, when the node answered with something undecodable.
    #[must_use]
    pub fn raw_reply(&self) -> Option<&Bytes> {
        match self {
            CommandoError::Decoding { raw, .. } => Some(raw),
            _ => None,
        }
    }
}

/// Result alias that defaults to [`CommandoError`].
pub type Result<T, E = CommandoError> = std::result::Result<T, E>;

/// One commando session bound to an owned transport.
///
/// Calls take `&mut self`; a session never has two requests in flight.
pub struct Commando<T: Transport> {
    transport: T,
    config: CommandoConfig,
    next_id: u64,
}

impl<T: Transport> Commando<T> {
    /// Wrap a transport that is already connected and initialised.
    pub fn new(transport: T) -> Self {
        Self::with_config(transport, CommandoConfig::default())
    }

    pub fn with_config(transport: T, config: CommandoConfig) -> Self {
        Self {
            transport,
            config,
            next_id: 1,
        }
    }

    /// Run the peer handshake on `transport` and wrap it.
    ///
    /// The transport is destroyed if any step fails.
    ///
    /// # Errors
    /// - [`CommandoError::ConnectionFailed`] when key generation or connect fails
    /// - [`CommandoError::InitFailed`] when the `init` exchange fails
    pub async fn connect(
        mut transport: T,
        node_id: &str,
        host: &str,
        config: CommandoConfig,
    ) -> Result<Self> {
        debug!(target: "lnlink::commando", %node_id, %host, "connecting");
        let res = async {
            transport
                .generate_ephemeral_key()
                .await
                .map_err(CommandoError::ConnectionFailed)?;
            transport
                .connect(node_id, host)
                .await
                .map_err(CommandoError::ConnectionFailed)?;
            transport
                .perform_init()
                .await
                .map_err(CommandoError::InitFailed)
        }
        .await;

        if let Err(e) = res {
            debug!(target: "lnlink::commando", error = %e, "connect failed");
            if let Err(destroy_err) = transport.destroy().await {
                debug!(target: "lnlink::commando", error = %destroy_err, "destroy after failed connect");
            }
            return Err(e);
        }
        Ok(Self::with_config(transport, config))
    }

    pub fn config(&self) -> &CommandoConfig {
        &self.config
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn transport_mut(&mut self) -> &mut T {
        &mut self.transport
    }

    /// Give back the transport without destroying it.
    pub fn into_inner(self) -> T {
        self.transport
    }

    /// Issue `method` and decode the `result` member as `R`.
    ///
    /// `timeout` bounds the whole call, from the write to the terminal reply.
    ///
    /// # Errors
    /// Any [`CommandoError`]; see [`call_raw`](Self::call_raw) and
    /// [`wire::decode_envelope`].
    pub async fn call<P, R>(
        &mut self,
        method: &str,
        params: &P,
        rune: &str,
        timeout: Duration,
    ) -> Result<R>
    where
        P: Serialize + Sync,
        R: DeserializeOwned,
    {
        let raw = self.call_raw(method, params, rune, timeout).await?;
        wire::decode_envelope(raw)
    }

    /// Issue `method` and return the assembled reply bytes, undecoded.
    ///
    /// # Errors
    /// - [`CommandoError::EncodingFailed`] before anything is written
    /// - [`CommandoError::WriteFailed`] if the request cannot be sent
    /// - [`CommandoError::Timeout`], [`CommandoError::SelectFailed`],
    ///   [`CommandoError::RecvFailed`], [`CommandoError::ShortMessage`] or
    ///   [`CommandoError::UnexpectedMessageType`] while waiting for the reply
    pub async fn call_raw<P>(
        &mut self,
        method: &str,
        params: &P,
        rune: &str,
        timeout: Duration,
    ) -> Result<Bytes>
    where
        P: Serialize + Sync,
    {
        let id = self.next_id;
        let request = wire::encode_request(id, method, params, rune)?;
        self.next_id = self.next_id.wrapping_add(1);

        debug!(
            target: "lnlink::commando",
            %method,
            id,
            rune_len = rune.len(),
            timeout_ms = u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX),
            "sending request"
        );
        self.transport
            .write(&request)
            .await
            .map_err(CommandoError::WriteFailed)?;

        let reply = self.read_reply(timeout).await?;
        debug!(target: "lnlink::commando", %method, id, len = reply.len(), "reply complete");
        Ok(reply)
    }

    async fn read_reply(&mut self, timeout: Duration) -> Result<Bytes> {
        let deadline = deadline_after(timeout);
        let mut buf = BytesMut::new();

        loop {
            match timeout_at(deadline, self.transport.readable()).await {
                Err(_) => {
                    debug!(target: "lnlink::commando", buffered = buf.len(), "timed out");
                    return Err(CommandoError::Timeout(timeout));
                }
                Ok(Err(e)) => return Err(CommandoError::SelectFailed(e)),
                Ok(Ok(())) => {}
            }

            let msg = match timeout_at(deadline, self.transport.receive()).await {
                Err(_) => {
                    debug!(target: "lnlink::commando", buffered = buf.len(), "timed out");
                    return Err(CommandoError::Timeout(timeout));
                }
                Ok(None) => return Err(CommandoError::RecvFailed),
                Ok(Some(msg)) => msg,
            };
            trace!(
                target: "lnlink::commando",
                msg_type = msg.msg_type,
                len = msg.payload.len(),
                "message"
            );

            match ReplyKind::classify(msg.msg_type) {
                ReplyKind::Continues => {
                    buf.extend_from_slice(&wire::reply_body(msg.msg_type, &msg.payload)?);
                }
                ReplyKind::Terminal => {
                    buf.extend_from_slice(&wire::reply_body(msg.msg_type, &msg.payload)?);
                    return Ok(buf.freeze());
                }
                ReplyKind::Ping => {
                    debug!(target: "lnlink::commando", "answering ping");
                    if let Err(e) = self.transport.send_pong(&msg.payload).await {
                        debug!(target: "lnlink::commando", error = %e, "pong failed");
                    }
                }
                ReplyKind::Other(msg_type) if self.config.strict_message_types => {
                    return Err(CommandoError::UnexpectedMessageType(msg_type));
                }
                ReplyKind::Other(msg_type) => {
                    debug!(target: "lnlink::commando", msg_type, "discarding message");
                }
            }
        }
    }

    /// Destroy the transport.
    ///
    /// # Errors
    /// Returns [`CommandoError::Unknown`] if the transport reports a teardown failure.
    pub async fn close(mut self) -> Result<()> {
        self.transport
            .destroy()
            .await
            .map_err(|e| CommandoError::Unknown(e.to_string()))
    }
}

/// A `timeout` too large to add to the clock means no deadline in practice.
fn deadline_after(timeout: Duration) -> Instant {
    let now = Instant::now();
    now.checked_add(timeout)
        .unwrap_or_else(|| now + Duration::from_secs(86_400 * 365 * 30))
}

/// Connect to `connection` (`node_id@host`), make one call, and tear down.
///
/// The transport is destroyed whether or not the call succeeds.
///
/// # Errors
/// [`CommandoError::BadConnectionString`] for a malformed `connection`, then
/// anything [`Commando::connect`] or [`Commando::call`] reports.
pub async fn perform_rpc_once<T, P, R>(
    mut transport: T,
    connection: &str,
    rune: &str,
    method: &str,
    params: &P,
    timeout: Duration,
) -> Result<R>
where
    T: Transport,
    P: Serialize + Sync,
    R: DeserializeOwned,
{
    let (node_id, host) = match parse_connection_string(connection) {
        Ok(parts) => parts,
        Err(_) => {
            if let Err(e) = transport.destroy().await {
                debug!(target: "lnlink::commando", error = %e, "destroy failed");
            }
            return Err(CommandoError::BadConnectionString(connection.to_string()));
        }
    };
    let mut session =
        Commando::connect(transport, &node_id, &host, CommandoConfig::default()).await?;
    let res = session.call(method, params, rune, timeout).await;
    if let Err(e) = session.close().await {
        debug!(target: "lnlink::commando", error = %e, "destroy failed");
    }
    res
}
