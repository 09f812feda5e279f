use serde::{Deserialize, Serialize};
use url::Url;

/// Default Lightning peer port when a pairing link leaves it out.
pub const DEFAULT_PEER_PORT: u16 = 9735;

const LINK_SCHEME: &str = "lnlink";

#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum LinkError {
    #[error("invalid url: {0}")]
    InvalidUrl(String),
    #[error("no node id found in link")]
    MissingNodeId,
    #[error("no host found in link")]
    MissingHost,
    #[error("invalid host: {0}")]
    InvalidHost(String),
    #[error("no token found in link")]
    MissingToken,
}

/// Pairing credentials for one node: where to connect and the rune to call with.
///
/// Usually scanned from a QR code of the form
/// `lnlink:<node_id>@<host>[:port]?token=<rune>`.
///
/// # Examples
///
/// ```
/// use lnlink::LnLink;
///
/// let link = LnLink::parse("lnlink:02abcd@10.0.0.2?token=s3cr3t").unwrap();
/// assert_eq!(link.host, "10.0.0.2:9735");
/// assert_eq!(link.connection_string(), "02abcd@10.0.0.2:9735");
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LnLink {
    /// Hex-encoded node public key.
    pub node_id: String,
    /// `host:port` of the node's peer listener.
    pub host: String,
    /// Commando rune authorising the calls.
    pub token: String,
}

impl LnLink {
    /// Parse a `lnlink:` (or `lnlink://`) pairing link.
    ///
    /// # Errors
    /// Returns [`LinkError`] naming the first missing or malformed part.
    pub fn parse(link: &str) -> Result<Self, LinkError> {
        let link = link.trim();
        let normalized = match link.strip_prefix("lnlink:") {
            Some(rest) if !rest.starts_with("//") => format!("{LINK_SCHEME}://{rest}"),
            _ => link.to_string(),
        };

        let url = Url::parse(&normalized).map_err(|e| LinkError::InvalidUrl(e.to_string()))?;
        if url.scheme() != LINK_SCHEME {
            return Err(LinkError::InvalidUrl(format!(
                "unexpected scheme {:?}",
                url.scheme()
            )));
        }

        let node_id = url.username();
        if node_id.is_empty() {
            return Err(LinkError::MissingNodeId);
        }
        let host = url
            .host_str()
            .filter(|h| !h.is_empty())
            .ok_or(LinkError::MissingHost)?;
        let port = url.port().unwrap_or(DEFAULT_PEER_PORT);
        let token = url
            .query_pairs()
            .find(|(k, _)| k == "token")
            .map(|(_, v)| v.into_owned())
            .filter(|t| !t.is_empty())
            .ok_or(LinkError::MissingToken)?;

        Ok(Self {
            node_id: node_id.to_string(),
            host: format!("{host}:{port}"),
            token,
        })
    }

    /// Render the canonical `lnlink:` form.
    #[must_use]
    pub fn to_uri(&self) -> String {
        let token: String = url::form_urlencoded::byte_serialize(self.token.as_bytes()).collect();
        format!("{LINK_SCHEME}:{}@{}?token={token}", self.node_id, self.host)
    }

    /// `node_id@host`, as taken by [`parse_connection_string`].
    #[must_use]
    pub fn connection_string(&self) -> String {
        format!("{}@{}", self.node_id, self.host)
    }
}

/// Split `node_id@host` into its parts.
///
/// # Errors
/// Returns [`LinkError::MissingNodeId`] or [`LinkError::MissingHost`] when
/// either side of the `@` is absent, and [`LinkError::InvalidHost`] when the
/// host carries another `@`.
pub fn parse_connection_string(s: &str) -> Result<(String, String), LinkError> {
    let (node_id, host) = s.trim().split_once('@').ok_or(LinkError::MissingHost)?;
    if node_id.is_empty() {
        return Err(LinkError::MissingNodeId);
    }
    if host.is_empty() {
        return Err(LinkError::MissingHost);
    }
    if host.contains('@') {
        return Err(LinkError::InvalidHost(host.to_string()));
    }
    Ok((node_id.to_string(), host.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    const NODE: &str = "03f3c108ccd536b8526841f0a5c58212bb9e6584a1eb493080e7c1cc34f82dad71";

    #[test]
    fn parses_link_with_port() {
        let link = LnLink::parse(&format!("lnlink:{NODE}@24.84.152.187:9735?token=xyz-0=")).unwrap();
        assert_eq!(link.node_id, NODE);
        assert_eq!(link.host, "24.84.152.187:9735");
        assert_eq!(link.token, "xyz-0=");
    }

    #[test]
    fn default_port_and_slashed_form() {
        let link = LnLink::parse(&format!("lnlink://{NODE}@node.example.com?token=abc")).unwrap();
        assert_eq!(link.host, "node.example.com:9735");
    }

    #[test]
    fn missing_parts() {
        assert_eq!(
            LnLink::parse("lnlink:10.0.0.1:9735?token=abc"),
            Err(LinkError::MissingNodeId)
        );
        assert_eq!(
            LnLink::parse(&format!("lnlink:{NODE}@10.0.0.1:9735")),
            Err(LinkError::MissingToken)
        );
        assert!(matches!(
            LnLink::parse("not a link"),
            Err(LinkError::InvalidUrl(_))
        ));
        assert!(matches!(
            LnLink::parse("https://host?token=abc"),
            Err(LinkError::InvalidUrl(_))
        ));
    }

    #[test]
    fn uri_roundtrip() {
        let link = LnLink {
            node_id: NODE.into(),
            host: "10.0.0.1:19735".into(),
            token: "a+b/c=".into(),
        };
        assert_eq!(LnLink::parse(&link.to_uri()).unwrap(), link);
    }

    #[test]
    fn connection_string() {
        assert_eq!(
            parse_connection_string("02ab@127.0.0.1:9735"),
            Ok(("02ab".to_string(), "127.0.0.1:9735".to_string()))
        );
        assert_eq!(parse_connection_string("127.0.0.1"), Err(LinkError::MissingHost));
        assert_eq!(parse_connection_string("@host"), Err(LinkError::MissingNodeId));
        assert_eq!(parse_connection_string("02ab@"), Err(LinkError::MissingHost));
        assert_eq!(
            parse_connection_string("02ab@evil@127.0.0.1:9735"),
            Err(LinkError::InvalidHost("evil@127.0.0.1:9735".to_string()))
        );
    }
}
