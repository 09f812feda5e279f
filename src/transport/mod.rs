//! The authenticated Lightning peer link the commando session runs over.
//!
//! The noise handshake, key management and socket I/O live behind
//! [`Transport`]; this crate only drives the narrow message interface.

use std::{borrow::Cow, error::Error};

use async_trait::async_trait;
use bytes::Bytes;

type BoxError = Box<dyn Error + Send + Sync>;

#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    #[error("{context}")]
    Connection {
        context: Cow<'static, str>,
        #[source]
        source: Option<BoxError>,
    },
    #[error("transport closed")]
    Closed,
}

impl TransportError {
    /// Build a connection error with context and an underlying source.
    pub fn connection<S, E>(context: S, source: E) -> Self
    where
        S: Into<Cow<'static, str>>,
        E: Error + Send + Sync + 'static,
    {
        Self::Connection {
            context: context.into(),
            source: Some(Box::new(source)),
        }
    }

    /// Build a connection error that only has context (no underlying source).
    pub fn connection_message<S>(context: S) -> Self
    where
        S: Into<Cow<'static, str>>,
    {
        Self::Connection {
            context: context.into(),
            source: None,
        }
    }
}

/// One message read off the peer link: the BOLT #1 type and its body.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Message {
    pub msg_type: u16,
    pub payload: Bytes,
}

impl Message {
    pub fn new(msg_type: u16, payload: impl Into<Bytes>) -> Self {
        Self {
            msg_type,
            payload: payload.into(),
        }
    }
}

/// A message-oriented, already-authenticated duplex link to one peer.
///
/// Implementations own their socket; dropping or [`destroy`](Self::destroy)ing
/// the transport releases it.
#[async_trait]
pub trait Transport: Send {
    /// Create the local ephemeral key. Must run before [`connect`](Self::connect).
    async fn generate_ephemeral_key(&mut self) -> Result<(), TransportError> {
        Ok(())
    }

    /// Establish the authenticated link to `node_id` at `host` (`ip:port`).
    async fn connect(&mut self, node_id: &str, host: &str) -> Result<(), TransportError>;

    /// Exchange `init` messages after the handshake.
    async fn perform_init(&mut self) -> Result<(), TransportError> {
        Ok(())
    }

    /// Send one framed message.
    async fn write(&mut self, msg: &[u8]) -> Result<(), TransportError>;

    /// Resolve once a message can be received without blocking.
    ///
    /// An error here means the readiness wait itself failed.
    async fn readable(&mut self) -> Result<(), TransportError>;

    /// Take one message; `None` on a hard read failure.
    async fn receive(&mut self) -> Option<Message>;

    /// Answer a ping with a pong carrying `ping_payload`.
    async fn send_pong(&mut self, ping_payload: &[u8]) -> Result<(), TransportError>;

    /// Tear down the link. Safe to call more than once.
    async fn destroy(&mut self) -> Result<(), TransportError>;
}

#[async_trait]
impl<T: Transport + ?Sized> Transport for Box<T> {
    async fn generate_ephemeral_key(&mut self) -> Result<(), TransportError> {
        (**self).generate_ephemeral_key().await
    }

    async fn connect(&mut self, node_id: &str, host: &str) -> Result<(), TransportError> {
        (**self).connect(node_id, host).await
    }

    async fn perform_init(&mut self) -> Result<(), TransportError> {
        (**self).perform_init().await
    }

    async fn write(&mut self, msg: &[u8]) -> Result<(), TransportError> {
        (**self).write(msg).await
    }

    async fn readable(&mut self) -> Result<(), TransportError> {
        (**self).readable().await
    }

    async fn receive(&mut self) -> Option<Message> {
        (**self).receive().await
    }

    async fn send_pong(&mut self, ping_payload: &[u8]) -> Result<(), TransportError> {
        (**self).send_pong(ping_payload).await
    }

    async fn destroy(&mut self) -> Result<(), TransportError> {
        (**self).destroy().await
    }
}
