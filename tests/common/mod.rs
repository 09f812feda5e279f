#![allow(dead_code)]

use std::{
    collections::VecDeque,
    sync::{Arc, Mutex},
    time::Duration,
};

use async_trait::async_trait;
use lnlink::{
    commando::wire::{COMMANDO_REPLY_CONTINUES, COMMANDO_REPLY_TERM, WIRE_PING},
    transport::{Message, Transport, TransportError},
};
use serde_json::Value;

pub const NODE_ID: &str = "03f3c108ccd536b8526841f0a5c58212bb9e6584a1eb493080e7c1cc34f82dad71";
pub const HOST: &str = "127.0.0.1:9735";
pub const RUNE: &str = "rune-secret";

pub enum Event {
    Msg(Message),
    RecvNone,
    SelectError,
}

pub fn continues(id: u64, body: &[u8]) -> Event {
    Event::Msg(Message::new(COMMANDO_REPLY_CONTINUES, with_header(id, body)))
}

pub fn terminal(id: u64, body: &[u8]) -> Event {
    Event::Msg(Message::new(COMMANDO_REPLY_TERM, with_header(id, body)))
}

pub fn ping(payload: &[u8]) -> Event {
    Event::Msg(Message::new(WIRE_PING, payload.to_vec()))
}

pub fn other(msg_type: u16, payload: &[u8]) -> Event {
    Event::Msg(Message::new(msg_type, payload.to_vec()))
}

fn with_header(id: u64, body: &[u8]) -> Vec<u8> {
    let mut out = id.to_be_bytes().to_vec();
    out.extend_from_slice(body);
    out
}

pub type SharedLog = Arc<Mutex<Recorded>>;

/// What the session did to the transport.
#[derive(Default, Debug)]
pub struct Recorded {
    pub connected_to: Option<(String, String)>,
    pub writes: Vec<Vec<u8>>,
    pub pongs: Vec<Vec<u8>>,
    pub destroyed: usize,
}

impl Recorded {
    /// JSON body of the `n`th request.
    pub fn request(&self, n: usize) -> Value {
        serde_json::from_slice(&self.writes[n][10..]).expect("request json")
    }

    pub fn request_id(&self, n: usize) -> u64 {
        let mut id = [0u8; 8];
        id.copy_from_slice(&self.writes[n][2..10]);
        u64::from_be_bytes(id)
    }
}

/// Transport replaying a fixed script of incoming events.
///
/// Once the script runs dry `readable` never resolves.
pub struct ScriptedTransport {
    events: VecDeque<Event>,
    gap: Duration,
    fail_connect: bool,
    fail_init: bool,
    fail_write: bool,
    pub log: SharedLog,
}

impl ScriptedTransport {
    pub fn new(events: impl IntoIterator<Item = Event>) -> Self {
        Self {
            events: events.into_iter().collect(),
            gap: Duration::ZERO,
            fail_connect: false,
            fail_init: false,
            fail_write: false,
            log: Arc::default(),
        }
    }

    /// Wait `gap` before each scripted event becomes readable.
    pub fn with_gap(mut self, gap: Duration) -> Self {
        self.gap = gap;
        self
    }

    pub fn failing_connect(mut self) -> Self {
        self.fail_connect = true;
        self
    }

    pub fn failing_init(mut self) -> Self {
        self.fail_init = true;
        self
    }

    pub fn failing_write(mut self) -> Self {
        self.fail_write = true;
        self
    }

    pub fn log(&self) -> SharedLog {
        Arc::clone(&self.log)
    }
}

#[async_trait]
impl Transport for ScriptedTransport {
    async fn connect(&mut self, node_id: &str, host: &str) -> Result<(), TransportError> {
        if self.fail_connect {
            return Err(TransportError::connection_message("connection refused"));
        }
        self.log.lock().unwrap().connected_to = Some((node_id.to_string(), host.to_string()));
        Ok(())
    }

    async fn perform_init(&mut self) -> Result<(), TransportError> {
        if self.fail_init {
            return Err(TransportError::connection_message("init rejected"));
        }
        Ok(())
    }

    async fn write(&mut self, msg: &[u8]) -> Result<(), TransportError> {
        if self.fail_write {
            return Err(TransportError::Closed);
        }
        self.log.lock().unwrap().writes.push(msg.to_vec());
        Ok(())
    }

    async fn readable(&mut self) -> Result<(), TransportError> {
        if self.events.is_empty() {
            std::future::pending::<()>().await;
        }
        if !self.gap.is_zero() {
            tokio::time::sleep(self.gap).await;
        }
        if matches!(self.events.front(), Some(Event::SelectError)) {
            self.events.pop_front();
            return Err(TransportError::connection_message("bad descriptor"));
        }
        Ok(())
    }

    async fn receive(&mut self) -> Option<Message> {
        match self.events.pop_front()? {
            Event::Msg(msg) => Some(msg),
            Event::RecvNone | Event::SelectError => None,
        }
    }

    async fn send_pong(&mut self, ping_payload: &[u8]) -> Result<(), TransportError> {
        self.log.lock().unwrap().pongs.push(ping_payload.to_vec());
        Ok(())
    }

    async fn destroy(&mut self) -> Result<(), TransportError> {
        self.log.lock().unwrap().destroyed += 1;
        Ok(())
    }
}
