#![deny(unsafe_code)]

//! Core-lightning commando client toolkit.
//!
//! - [`bech32`] / [`segwit`]: bech32 and bech32m codec, segwit addresses
//! - [`invoice`]: quick amount extraction from bolt11/bolt12 prefixes
//! - [`lnurl`]: LNURL-pay payloads and lightning addresses
//! - [`commando`]: the RPC session run over an authenticated peer
//!   [`transport::Transport`]
//! - [`client`]: typed wrappers for `getinfo`, `pay`, `invoice`, `decode`, ...
//!
//! The peer handshake and socket I/O are supplied by the caller's
//! [`transport::Transport`] implementation.
//!
//! Example
//! ```no_run
//! # use lnlink::transport::Transport;
//! use lnlink::{Client, CommandoConfig, LnLink};
//!
//! # async fn run<T: Transport>(transport: T) -> Result<(), Box<dyn std::error::Error>> {
//! let link = LnLink::parse("lnlink:02abcd@10.0.0.2:9735?token=rune")?;
//! let mut client = Client::connect(transport, &link, CommandoConfig::default()).await?;
//! let info = client.get_info().await?;
//! println!("{} on {}", info.alias, info.network);
//! client.close().await?;
//! # Ok(())
//! # }
//! ```

pub mod bech32;
pub mod client;
pub mod commando;
pub mod config;
pub mod credentials;
pub mod invoice;
pub mod lnurl;
pub mod rpc;
pub mod segwit;
pub mod transport;

pub use bech32::{Bech32Data, Bech32Error, Variant};
pub use client::Client;
pub use commando::{perform_rpc_once, Commando, CommandoError, Result};
pub use config::CommandoConfig;
pub use credentials::{parse_connection_string, LinkError, LnLink};
pub use invoice::{parse_invoice_string, InvoiceAmount, InvoiceAmountError, InvoiceScan};
pub use segwit::{decode_segwit_address, encode_segwit_address, SegwitAddress};
