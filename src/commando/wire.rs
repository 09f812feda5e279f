//! Commando wire primitives: message types, request framing, reply header
//! handling and the JSON result/error envelope.

use bytes::{BufMut, Bytes, BytesMut};
use serde::{de::DeserializeOwned, Deserialize, Serialize};

use super::CommandoError;

/// Request from client to node.
pub const COMMANDO_CMD: u16 = 0x4c4f;
/// Partial reply; more follows.
pub const COMMANDO_REPLY_CONTINUES: u16 = 0x594b;
/// Final (or only) reply part.
pub const COMMANDO_REPLY_TERM: u16 = 0x594d;
/// BOLT #1 ping.
pub const WIRE_PING: u16 = 18;
/// BOLT #1 pong.
pub const WIRE_PONG: u16 = 19;

/// Bytes at the front of every reply body carrying the request id.
pub const REPLY_HEADER_LEN: usize = 8;

/// Largest message the peer link will carry.
pub const MAX_MESSAGE_LEN: usize = 65_535;

/// How the await loop treats an incoming message type.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ReplyKind {
    Continues,
    Terminal,
    Ping,
    Other(u16),
}

impl ReplyKind {
    #[must_use]
    pub fn classify(msg_type: u16) -> Self {
        match msg_type {
            COMMANDO_REPLY_CONTINUES => ReplyKind::Continues,
            COMMANDO_REPLY_TERM => ReplyKind::Terminal,
            WIRE_PING => ReplyKind::Ping,
            other => ReplyKind::Other(other),
        }
    }
}

#[derive(Serialize)]
struct Request<'a, P: Serialize> {
    method: &'a str,
    params: &'a P,
    rune: &'a str,
}

/// Frame a commando request: type, request id, then the JSON body.
///
/// # Errors
/// Returns [`CommandoError::EncodingFailed`] if `params` cannot be serialized
/// or the framed message exceeds [`MAX_MESSAGE_LEN`].
pub fn encode_request<P: Serialize>(
    id: u64,
    method: &str,
    params: &P,
    rune: &str,
) -> Result<Bytes, CommandoError> {
    let body = serde_json::to_vec(&Request {
        method,
        params,
        rune,
    })
    .map_err(|e| CommandoError::EncodingFailed(e.to_string()))?;

    let len = 2 + 8 + body.len();
    if len > MAX_MESSAGE_LEN {
        return Err(CommandoError::EncodingFailed(format!(
            "request is {len} bytes, limit is {MAX_MESSAGE_LEN}"
        )));
    }

    let mut out = BytesMut::with_capacity(len);
    out.put_u16(COMMANDO_CMD);
    out.put_u64(id);
    out.extend_from_slice(&body);
    Ok(out.freeze())
}

/// Strip the request-id header from a reply body.
///
/// # Errors
/// Returns [`CommandoError::ShortMessage`] if `payload` is shorter than the header.
pub fn reply_body(msg_type: u16, payload: &Bytes) -> Result<Bytes, CommandoError> {
    if payload.len() < REPLY_HEADER_LEN {
        return Err(CommandoError::ShortMessage {
            msg_type,
            len: payload.len(),
        });
    }
    Ok(payload.slice(REPLY_HEADER_LEN..))
}

#[derive(Deserialize)]
struct ResultEnvelope<T> {
    result: T,
}

#[derive(Deserialize)]
struct ErrorEnvelope {
    error: RpcErrorBody,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RpcErrorBody {
    Object {
        message: String,
        #[serde(default)]
        code: Option<i64>,
    },
    Message(String),
}

/// Decode an assembled reply into `T`, or the node's error.
///
/// # Errors
/// - [`CommandoError::Rpc`] when the node answered with an `error` member
/// - [`CommandoError::Decoding`] when the reply matches neither shape; carries
///   the raw bytes
pub fn decode_envelope<T: DeserializeOwned>(raw: Bytes) -> Result<T, CommandoError> {
    if let Ok(ErrorEnvelope { error }) = serde_json::from_slice::<ErrorEnvelope>(&raw) {
        let (message, code) = match error {
            RpcErrorBody::Object { message, code } => (message, code),
            RpcErrorBody::Message(message) => (message, None),
        };
        return Err(CommandoError::Rpc { message, code });
    }

    match serde_json::from_slice::<ResultEnvelope<T>>(&raw) {
        Ok(envelope) => Ok(envelope.result),
        Err(source) => Err(CommandoError::Decoding { source, raw }),
    }
}
