//! Authenticated websocket session.
//!
//! A [`Session`] is opened with [`Session::connect`], which rewrites the
//! configured base URL into the websocket endpoint, performs the upgrade and
//! runs the three-message auth handshake:
//!
//! 1. server → `auth_required`
//! 2. client → `auth` with the access token
//! 3. server → `auth_ok` (or `auth_invalid`)
//!
//! After that the session is a plain request/response channel. Nothing is
//! retried; every failure aborts the connect attempt.

use std::time::Duration;

use futures::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio::time::timeout;
use tokio_tungstenite::tungstenite::{self, Message};
use tokio_tungstenite::{
    Connector, MaybeTlsStream, WebSocketStream, connect_async_tls_with_config,
};
use tracing::{debug, info};
use url::Url;

use crate::error::{Error, Result, UrlError};
use crate::messages::{ClientMessage, ServerMessage, WEBSOCKET_PATH};

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// Default bound on the websocket upgrade and auth handshake.
pub const DEFAULT_HANDSHAKE_TIMEOUT: Duration = Duration::from_secs(10);

/// Default bound on waiting for a single response after authentication.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Settings needed to open a [`Session`].
#[derive(Clone)]
pub struct ConnectOptions {
    /// Base URL of the server, `http://` or `https://`.
    pub url: String,
    /// Long-lived access token.
    pub access_token: String,
    /// Accept invalid TLS certificates (self-signed servers).
    pub insecure: bool,
    pub handshake_timeout: Duration,
    pub request_timeout: Duration,
}

impl std::fmt::Debug for ConnectOptions {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConnectOptions")
            .field("url", &self.url)
            .field("access_token", &"<redacted>")
            .field("insecure", &self.insecure)
            .field("handshake_timeout", &self.handshake_timeout)
            .field("request_timeout", &self.request_timeout)
            .finish()
    }
}

impl ConnectOptions {
    pub fn new(url: impl Into<String>, access_token: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            access_token: access_token.into(),
            insecure: false,
            handshake_timeout: DEFAULT_HANDSHAKE_TIMEOUT,
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
        }
    }

    #[must_use]
    pub fn insecure(mut self, insecure: bool) -> Self {
        self.insecure = insecure;
        self
    }

    #[must_use]
    pub fn handshake_timeout(mut self, duration: Duration) -> Self {
        self.handshake_timeout = duration;
        self
    }

    #[must_use]
    pub fn request_timeout(mut self, duration: Duration) -> Self {
        self.request_timeout = duration;
        self
    }
}

/// Resolve the websocket URL for a server base URL.
///
/// `http` becomes `ws` and `https` becomes `wss`; `ws`/`wss` are accepted
/// as-is. The path is replaced with the websocket API path and any query or
/// fragment is dropped.
///
/// Percent-escapes are checked before parsing: a malformed escape anywhere,
/// or any escape in the host, is an [`Error::InvalidUrl`].
pub fn dial_url(raw: &str) -> Result<Url> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Err(Error::invalid_config("url is required"));
    }

    let invalid = |source: UrlError| Error::InvalidUrl {
        url: raw.to_string(),
        source,
    };
    check_escapes(raw).map_err(invalid)?;
    let mut url = Url::parse(raw).map_err(|e| invalid(e.into()))?;

    let scheme = match url.scheme() {
        "http" | "ws" => "ws",
        "https" | "wss" => "wss",
        other => {
            return Err(Error::invalid_config(format!(
                "unsupported url scheme '{}', expected http or https",
                other
            )));
        }
    };
    url.set_scheme(scheme)
        .map_err(|()| Error::invalid_config(format!("cannot use scheme '{}' for {}", scheme, raw)))?;
    url.set_path(WEBSOCKET_PATH);
    url.set_query(None);
    url.set_fragment(None);

    Ok(url)
}

/// Reject malformed percent-escapes, and escapes inside the host.
fn check_escapes(raw: &str) -> std::result::Result<(), UrlError> {
    let bytes = raw.as_bytes();
    for (i, _) in raw.match_indices('%') {
        let well_formed = bytes.len() > i + 2
            && bytes[i + 1].is_ascii_hexdigit()
            && bytes[i + 2].is_ascii_hexdigit();
        if !well_formed {
            return Err(UrlError::InvalidEscape(escape_at(raw, i)));
        }
    }

    if let Some((_, rest)) = raw.split_once("://") {
        let authority = rest.split(['/', '?', '#']).next().unwrap_or_default();
        let host = authority.rsplit('@').next().unwrap_or_default();
        if let Some(i) = host.find('%') {
            return Err(UrlError::InvalidEscape(escape_at(host, i)));
        }
    }
    Ok(())
}

/// Up to three characters starting at the `%` at byte offset `i`.
fn escape_at(s: &str, i: usize) -> String {
    s[i..].chars().take(3).collect()
}

fn insecure_connector() -> Result<Connector> {
    let tls = native_tls::TlsConnector::builder()
        .danger_accept_invalid_certs(true)
        .danger_accept_invalid_hostnames(true)
        .build()
        .map_err(|e| Error::invalid_config(format!("building TLS connector: {}", e)))?;
    Ok(Connector::NativeTls(tls))
}

/// An authenticated websocket connection.
///
/// The session tracks the message id counter. It starts at 1 once
/// authenticated and every request takes the next value via
/// [`Session::next_id`].
pub struct Session {
    stream: WsStream,
    message_id: u64,
    request_timeout: Duration,
    ha_version: Option<String>,
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("message_id", &self.message_id)
            .field("request_timeout", &self.request_timeout)
            .field("ha_version", &self.ha_version)
            .finish_non_exhaustive()
    }
}

impl Session {
    /// Connect and authenticate.
    pub async fn connect(options: &ConnectOptions) -> Result<Self> {
        let url = dial_url(&options.url)?;
        let connector = if options.insecure {
            Some(insecure_connector()?)
        } else {
            None
        };

        info!("connecting to {}", url);
        let dial = connect_async_tls_with_config(url.as_str(), None, false, connector);
        let (stream, _response) = timeout(options.handshake_timeout, dial)
            .await
            .map_err(|_| Error::timeout("websocket handshake", options.handshake_timeout))?
            .map_err(|source| Error::Dial {
                url: url.to_string(),
                source: Box::new(source),
            })?;
        info!("connected");

        let mut session = Self {
            stream,
            message_id: 1,
            request_timeout: options.request_timeout,
            ha_version: None,
        };
        session
            .authenticate(&options.access_token, options.handshake_timeout)
            .await?;
        Ok(session)
    }

    async fn authenticate(&mut self, access_token: &str, limit: Duration) -> Result<()> {
        match self.recv_within(limit, "auth_required greeting").await? {
            ServerMessage::AuthRequired { ha_version } => {
                debug!(?ha_version, "server greeting received");
                self.ha_version = ha_version;
            }
            other => {
                return Err(Error::UnexpectedMessage {
                    expected: "auth_required",
                    actual: other.kind().to_string(),
                });
            }
        }

        self.send(&ClientMessage::Auth {
            access_token: access_token.to_string(),
        })
        .await?;

        match self.recv_within(limit, "auth result").await? {
            ServerMessage::AuthOk { ha_version } => {
                if ha_version.is_some() {
                    self.ha_version = ha_version;
                }
                info!("authenticated");
                Ok(())
            }
            ServerMessage::AuthInvalid { message } => Err(Error::AuthenticationFailed(
                message.unwrap_or_else(|| "no reason given".to_string()),
            )),
            other => Err(Error::AuthenticationFailed(format!(
                "unexpected {} message",
                other.kind()
            ))),
        }
    }

    /// Current message id (the id of the last request sent).
    pub fn message_id(&self) -> u64 {
        self.message_id
    }

    /// Increment the message id and return the new value.
    pub fn next_id(&mut self) -> u64 {
        self.message_id += 1;
        self.message_id
    }

    /// Server version reported during the handshake, if any.
    pub fn ha_version(&self) -> Option<&str> {
        self.ha_version.as_deref()
    }

    /// Send one message as a JSON text frame.
    pub async fn send(&mut self, message: &ClientMessage) -> Result<()> {
        let json = serde_json::to_string(message)?;
        debug!(kind = message.kind(), "sending message");
        self.stream.send(Message::Text(json.into())).await?;
        Ok(())
    }

    /// Receive the next message, bounded by the request timeout.
    pub async fn recv(&mut self) -> Result<ServerMessage> {
        self.recv_within(self.request_timeout, "response").await
    }

    async fn recv_within(&mut self, limit: Duration, operation: &str) -> Result<ServerMessage> {
        timeout(limit, self.read_message())
            .await
            .map_err(|_| Error::timeout(operation, limit))?
    }

    async fn read_message(&mut self) -> Result<ServerMessage> {
        while let Some(frame) = self.stream.next().await {
            match frame? {
                Message::Text(text) => {
                    let message: ServerMessage = serde_json::from_str(text.as_str())?;
                    debug!(kind = message.kind(), "received message");
                    return Ok(message);
                }
                Message::Binary(_) => return Err(Error::protocol("unexpected binary frame")),
                Message::Close(frame) => {
                    debug!(?frame, "server sent close frame");
                    return Err(Error::ConnectionClosed);
                }
                Message::Ping(_) | Message::Pong(_) | Message::Frame(_) => continue,
            }
        }
        Err(Error::ConnectionClosed)
    }

    /// Close the connection with a normal close frame.
    pub async fn close(mut self) -> Result<()> {
        match self.stream.close(None).await {
            Ok(())
            | Err(tungstenite::Error::ConnectionClosed)
            | Err(tungstenite::Error::AlreadyClosed) => {
                debug!("session closed");
                Ok(())
            }
            Err(e) => Err(e.into()),
        }
    }
}
