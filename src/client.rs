use std::time::Duration;

use serde::{de::DeserializeOwned, Serialize};
use serde_json::json;
use tracing::debug;

use crate::{
    commando::{Commando, Result},
    config::CommandoConfig,
    credentials::LnLink,
    rpc::{
        Decode, FetchInvoice, FetchInvoiceRequest, GetInfo, InvoiceRequest, InvoiceRes, ListFunds,
        MakeSecret, OfferRequest, OfferRes, Pay, PayRequest,
    },
    transport::Transport,
};

/// Typed RPC wrappers over a [`Commando`] session and the rune they call with.
pub struct Client<T: Transport> {
    session: Commando<T>,
    token: String,
}

impl<T: Transport> Client<T> {
    /// Connect `transport` to the node named by `link`.
    ///
    /// # Errors
    /// Returns [`crate::CommandoError`] when the peer handshake fails; the
    /// transport is destroyed in that case.
    pub async fn connect(transport: T, link: &LnLink, config: CommandoConfig) -> Result<Self> {
        let session = Commando::connect(transport, &link.node_id, &link.host, config).await?;
        Ok(Self::from_session(session, link.token.clone()))
    }

    /// Wrap an existing session.
    pub fn from_session(session: Commando<T>, token: impl Into<String>) -> Self {
        Self {
            session,
            token: token.into(),
        }
    }

    pub fn session(&self) -> &Commando<T> {
        &self.session
    }

    pub fn session_mut(&mut self) -> &mut Commando<T> {
        &mut self.session
    }

    /// Call any method with the default timeout.
    ///
    /// # Errors
    /// Any [`crate::CommandoError`] from the session.
    pub async fn call<P, R>(&mut self, method: &str, params: &P) -> Result<R>
    where
        P: Serialize + Sync,
        R: DeserializeOwned,
    {
        let timeout = self.session.config().default_timeout;
        self.call_with_timeout(method, params, timeout).await
    }

    /// Call any method with an explicit whole-call timeout.
    ///
    /// # Errors
    /// Any [`crate::CommandoError`] from the session.
    pub async fn call_with_timeout<P, R>(
        &mut self,
        method: &str,
        params: &P,
        timeout: Duration,
    ) -> Result<R>
    where
        P: Serialize + Sync,
        R: DeserializeOwned,
    {
        debug!(
            target: "lnlink::client",
            %method,
            timeout_ms = u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX),
            "rpc"
        );
        self.session
            .call(method, params, &self.token, timeout)
            .await
    }

    /// `getinfo`.
    ///
    /// # Errors
    /// Any [`crate::CommandoError`] from the session.
    pub async fn get_info(&mut self) -> Result<GetInfo> {
        self.call("getinfo", &json!([])).await
    }

    /// `getinfo` with a caller-chosen timeout, e.g. for a quick reachability probe.
    ///
    /// # Errors
    /// Any [`crate::CommandoError`] from the session.
    pub async fn get_info_with_timeout(&mut self, timeout: Duration) -> Result<GetInfo> {
        self.call_with_timeout("getinfo", &json!([]), timeout).await
    }

    /// `listfunds`.
    ///
    /// # Errors
    /// Any [`crate::CommandoError`] from the session.
    pub async fn list_funds(&mut self) -> Result<ListFunds> {
        self.call("listfunds", &json!([])).await
    }

    /// `pay`, waiting up to [`CommandoConfig::pay_timeout`].
    ///
    /// # Errors
    /// Any [`crate::CommandoError`] from the session; a failed payment is
    /// reported by the node as [`crate::CommandoError::Rpc`].
    pub async fn pay(&mut self, req: &PayRequest) -> Result<Pay> {
        let timeout = self.session.config().pay_timeout;
        self.call_with_timeout("pay", req, timeout).await
    }

    /// `invoice`.
    ///
    /// # Errors
    /// Any [`crate::CommandoError`] from the session.
    pub async fn invoice(&mut self, req: &InvoiceRequest) -> Result<InvoiceRes> {
        self.call("invoice", req).await
    }

    /// `offer`.
    ///
    /// # Errors
    /// Any [`crate::CommandoError`] from the session.
    pub async fn offer(&mut self, req: &OfferRequest) -> Result<OfferRes> {
        self.call("offer", req).await
    }

    /// `decode` a bolt11 invoice, bolt12 offer or invoice.
    ///
    /// # Errors
    /// Any [`crate::CommandoError`] from the session.
    pub async fn decode(&mut self, invoice_or_offer: &str) -> Result<Decode> {
        self.call("decode", &[invoice_or_offer]).await
    }

    /// `fetchinvoice` for `offer`, waiting up to
    /// [`CommandoConfig::fetch_invoice_timeout`].
    ///
    /// # Errors
    /// Any [`crate::CommandoError`] from the session.
    pub async fn fetch_invoice(
        &mut self,
        offer: &str,
        amount_msat: Option<u64>,
        quantity: Option<u64>,
    ) -> Result<FetchInvoice> {
        let config = self.session.config();
        let timeout = config.fetch_invoice_timeout;
        let req = FetchInvoiceRequest {
            offer: offer.to_string(),
            amount_msat,
            quantity,
            timeout: config.fetch_invoice_node_timeout_secs(),
        };
        self.call_with_timeout("fetchinvoice", &req, timeout).await
    }

    /// `makesecret` over `info`, sent hex-encoded.
    ///
    /// # Errors
    /// Any [`crate::CommandoError`] from the session.
    pub async fn make_secret(&mut self, info: &[u8]) -> Result<MakeSecret> {
        self.call("makesecret", &[hex::encode(info)]).await
    }

    /// Destroy the underlying transport.
    ///
    /// # Errors
    /// See [`Commando::close`].
    pub async fn close(self) -> Result<()> {
        self.session.close().await
    }
}
