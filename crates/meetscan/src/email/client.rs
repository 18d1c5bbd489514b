//! IMAP implementation of [`MailSource`].

use std::collections::HashMap;
use std::net::{SocketAddr, ToSocketAddrs};

use async_imap::Session;
use async_native_tls::TlsConnector;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use futures_util::StreamExt;
use log::{debug, info, warn};
use secrecy::{ExposeSecret, SecretString};
use tokio::time::timeout;

use crate::config::{ImapAuthSettings, ImapAuthType, ImapConfig};

use super::error::{EmailError, Result};
use super::parser::{parse_headers, parse_message, HeaderFields};
use super::source::{FullMessage, MailSource, MessageRef, MessageSummary};

/// Type alias for the underlying async stream (using async-std compatible TcpStream).
type AsyncTcpStream = async_io::Async<std::net::TcpStream>;

/// Type alias for the TLS stream used by the IMAP session.
type TlsStream = async_native_tls::TlsStream<AsyncTcpStream>;

/// SASL XOAUTH2 authenticator. async-imap base64-encodes the response.
struct XOAuth2Authenticator {
    response: String,
}

impl async_imap::Authenticator for XOAuth2Authenticator {
    type Response = String;

    fn process(&mut self, _data: &[u8]) -> Self::Response {
        std::mem::take(&mut self.response)
    }
}

/// Read-only IMAP client for the configured folder.
pub struct ImapClient {
    session: Option<Session<TlsStream>>,
    config: ImapConfig,
}

impl ImapClient {
    pub fn new(config: ImapConfig) -> Self {
        Self {
            session: None,
            config,
        }
    }

    /// Checks if the client is currently connected.
    pub fn is_connected(&self) -> bool {
        self.session.is_some()
    }

    fn session(&mut self) -> Result<&mut Session<TlsStream>> {
        self.session.as_mut().ok_or(EmailError::NotConnected)
    }

    async fn open_session(&self) -> Result<Session<TlsStream>> {
        let addr = resolve_addr(&self.config.host, self.config.port).await?;
        info!("Connecting to IMAP server at {}:{}", self.config.host, self.config.port);

        let connect_timeout = self.config.connect_timeout();
        let std_stream = tokio::task::spawn_blocking(move || {
            std::net::TcpStream::connect_timeout(&addr, connect_timeout)
        })
        .await
        .map_err(|e| EmailError::ConnectionFailed(e.to_string()))?
        .map_err(|e| {
            if e.kind() == std::io::ErrorKind::TimedOut {
                EmailError::Timeout(format!("connecting to {}", addr))
            } else {
                EmailError::ConnectionFailed(e.to_string())
            }
        })?;
        std_stream
            .set_nonblocking(true)
            .map_err(|e| EmailError::ConnectionFailed(e.to_string()))?;
        let tcp_stream = async_io::Async::new(std_stream)
            .map_err(|e| EmailError::ConnectionFailed(e.to_string()))?;

        let tls_stream = TlsConnector::new()
            .connect(&self.config.host, tcp_stream)
            .await?;

        let mut client = async_imap::Client::new(tls_stream);
        // The greeting must be consumed before AUTHENTICATE.
        check_greeting(client.read_response().await)?;

        let session = match self.config.auth.auth_type {
            ImapAuthType::Password => {
                let password = password(&self.config.auth)?;
                client
                    .login(&self.config.username, password.expose_secret())
                    .await
                    .map_err(|(e, _)| EmailError::AuthenticationFailed(e.to_string()))?
            }
            ImapAuthType::OAuth2 => {
                let token = access_token(&self.config.auth)?;
                let response = format!(
                    "user={}\x01auth=Bearer {}\x01\x01",
                    self.config.username,
                    token.expose_secret()
                );
                client
                    .authenticate("XOAUTH2", XOAuth2Authenticator { response })
                    .await
                    .map_err(|(e, _)| EmailError::AuthenticationFailed(e.to_string()))?
            }
        };

        info!("Successfully authenticated to IMAP server");
        Ok(session)
    }

    /// Opens the folder with EXAMINE so nothing is modified or marked as read.
    async fn examine_folder(&mut self) -> Result<()> {
        let folder = self.config.folder.clone();
        let read_timeout = self.config.read_timeout();
        let session = self.session()?;

        info!("Examining folder: {}", folder);
        let mailbox = timeout(read_timeout, session.examine(&folder))
            .await?
            .map_err(|e| {
                if e.to_string().contains("NO") {
                    EmailError::FolderNotFound(folder.clone())
                } else {
                    EmailError::ProtocolError(e.to_string())
                }
            })?;

        debug!("Folder '{}' opened with {} messages", folder, mailbox.exists);
        Ok(())
    }
}

#[async_trait]
impl MailSource for ImapClient {
    async fn connect(&mut self) -> Result<()> {
        if self.session.is_some() {
            debug!("Already connected to IMAP server");
            return Ok(());
        }

        if !self.config.use_tls {
            return Err(EmailError::ConfigError(
                "TLS is required for secure email connections".to_string(),
            ));
        }

        let session = timeout(self.config.connect_timeout(), self.open_session()).await??;
        self.session = Some(session);

        if let Err(e) = self.examine_folder().await {
            self.session = None;
            return Err(e);
        }
        Ok(())
    }

    async fn list_since(&mut self, floor: DateTime<Utc>) -> Result<Vec<MessageRef>> {
        let read_timeout = self.config.read_timeout();
        let session = self.session()?;

        // SINCE has day granularity in the server's zone; widen by a day and
        // filter exactly on INTERNALDATE below.
        let query = format!("SINCE {}", imap_date(floor - chrono::Duration::days(1)));
        debug!("Searching with query: {}", query);

        let uids = timeout(read_timeout, session.uid_search(&query))
            .await?
            .map_err(|e| EmailError::ProtocolError(e.to_string()))?;
        if uids.is_empty() {
            return Ok(Vec::new());
        }

        let mut uids: Vec<u32> = uids.into_iter().collect();
        uids.sort_unstable();

        let refs = timeout(read_timeout, async {
            let mut stream = session
                .uid_fetch(uid_set(&uids), "(UID INTERNALDATE)")
                .await
                .map_err(|e| EmailError::ProtocolError(e.to_string()))?;
            let mut refs = Vec::new();
            while let Some(item) = stream.next().await {
                let fetch = item.map_err(|e| EmailError::ProtocolError(e.to_string()))?;
                match (fetch.uid, fetch.internal_date()) {
                    (Some(uid), Some(date)) => refs.push(MessageRef {
                        uid,
                        received_at: date.with_timezone(&Utc),
                    }),
                    _ => warn!("Message missing UID or INTERNALDATE"),
                }
            }
            Ok::<_, EmailError>(refs)
        })
        .await??;

        let mut refs: Vec<MessageRef> = refs
            .into_iter()
            .filter(|r| r.received_at >= floor)
            .collect();
        refs.sort_by_key(|r| (r.received_at, r.uid));

        debug!("Found {} messages at or after {}", refs.len(), floor);
        Ok(refs)
    }

    async fn fetch_summaries(&mut self, refs: &[MessageRef]) -> Result<Vec<MessageSummary>> {
        if refs.is_empty() {
            return Ok(Vec::new());
        }

        let read_timeout = self.config.read_timeout();
        let session = self.session()?;
        let uids: Vec<u32> = refs.iter().map(|r| r.uid).collect();

        debug!("Fetching headers for {} messages", uids.len());

        let mut headers = timeout(read_timeout, async {
            let mut stream = session
                .uid_fetch(uid_set(&uids), "(UID INTERNALDATE BODY.PEEK[HEADER])")
                .await
                .map_err(|e| EmailError::ProtocolError(e.to_string()))?;
            let mut headers = HashMap::new();
            while let Some(item) = stream.next().await {
                let fetch = match item {
                    Ok(fetch) => fetch,
                    Err(e) => {
                        warn!("Error fetching message header: {}", e);
                        continue;
                    }
                };
                let Some(uid) = fetch.uid else {
                    warn!("Header fetch response without UID");
                    continue;
                };
                let fields = match fetch.header().map(parse_headers) {
                    Some(Ok(fields)) => fields,
                    Some(Err(e)) => {
                        warn!("Unparseable header for UID {}: {}", uid, e);
                        HeaderFields::default()
                    }
                    None => HeaderFields::default(),
                };
                headers.insert(uid, fields);
            }
            Ok::<_, EmailError>(headers)
        })
        .await??;

        let summaries = refs
            .iter()
            .filter_map(|r| {
                let fields = headers.remove(&r.uid)?;
                Some(MessageSummary {
                    uid: r.uid,
                    received_at: r.received_at,
                    message_id: fields.message_id,
                    sender: fields.sender,
                    subject: fields.subject,
                })
            })
            .collect::<Vec<_>>();

        if summaries.len() != refs.len() {
            warn!(
                "Server returned headers for {} of {} messages",
                summaries.len(),
                refs.len()
            );
        }
        Ok(summaries)
    }

    async fn fetch_full(&mut self, message: &MessageRef) -> Result<FullMessage> {
        let read_timeout = self.config.read_timeout();
        let session = self.session()?;
        let uid = message.uid;

        debug!("Fetching email with UID {}", uid);

        let raw = timeout(read_timeout, async {
            let mut stream = session
                .uid_fetch(uid.to_string(), "(UID BODY.PEEK[])")
                .await
                .map_err(|e| EmailError::ProtocolError(e.to_string()))?;
            let mut raw = None;
            while let Some(item) = stream.next().await {
                let fetch = item.map_err(|e| EmailError::ProtocolError(e.to_string()))?;
                if raw.is_none() {
                    raw = fetch.body().map(<[u8]>::to_vec);
                }
            }
            raw.ok_or(EmailError::MessageNotFound(uid))
        })
        .await??;

        let parsed = parse_message(&raw)?;
        Ok(FullMessage {
            uid,
            sender: parsed.headers.sender,
            subject: parsed.headers.subject,
            body: parsed.body,
        })
    }

    async fn disconnect(&mut self) -> Result<()> {
        if let Some(mut session) = self.session.take() {
            info!("Disconnecting from IMAP server");
            timeout(self.config.read_timeout(), session.logout())
                .await?
                .map_err(|e| EmailError::ProtocolError(e.to_string()))?;
        }
        Ok(())
    }
}

impl Drop for ImapClient {
    fn drop(&mut self) {
        if self.session.is_some() {
            warn!("ImapClient dropped without explicit disconnect - session will be closed");
        }
    }
}

async fn resolve_addr(host: &str, port: u16) -> Result<SocketAddr> {
    let target = format!("{}:{}", host, port);
    tokio::task::spawn_blocking(move || {
        target
            .to_socket_addrs()
            .map_err(|e| EmailError::ConnectionFailed(format!("{}: {}", target, e)))?
            .next()
            .ok_or_else(|| EmailError::ConnectionFailed(format!("{}: no address", target)))
    })
    .await
    .map_err(|e| EmailError::ConnectionFailed(e.to_string()))?
}

fn check_greeting<T>(response: std::io::Result<Option<T>>) -> Result<()> {
    match response {
        Ok(Some(_)) => Ok(()),
        Ok(None) => Err(EmailError::ConnectionFailed(
            "server closed the connection before sending a greeting".to_string(),
        )),
        Err(e) => Err(EmailError::ConnectionFailed(format!(
            "failed to read server greeting: {}",
            e
        ))),
    }
}

fn password(auth: &ImapAuthSettings) -> Result<SecretString> {
    if auth.password_insecure.is_some() {
        warn!(
            "Using direct password value (passwordInsecure) is not recommended. \
             Consider using passwordEnvVar or passwordFile instead."
        );
    }
    Ok(crate::secrets::resolve_secret(
        auth.password_insecure.as_deref(),
        auth.password_file.as_deref(),
        auth.password_env_var.as_deref(),
    )?)
}

fn access_token(auth: &ImapAuthSettings) -> Result<SecretString> {
    if auth.access_token_insecure.is_some() {
        warn!(
            "Using direct access token value (accessTokenInsecure) is not recommended. \
             Consider using accessTokenEnvVar or accessTokenFile instead."
        );
    }
    Ok(crate::secrets::resolve_secret(
        auth.access_token_insecure.as_deref(),
        auth.access_token_file.as_deref(),
        auth.access_token_env_var.as_deref(),
    )?)
}

/// Formats a date for IMAP SEARCH (e.g., "01-Jan-2024").
fn imap_date(ts: DateTime<Utc>) -> String {
    ts.format("%d-%b-%Y").to_string()
}

/// Builds a UID set (e.g., "1,2,5,10").
fn uid_set(uids: &[u32]) -> String {
    uids.iter()
        .map(|u| u.to_string())
        .collect::<Vec<_>>()
        .join(",")
}
