pub mod error;

use core::future::Future;
use core::time::Duration;
use std::sync::Arc;

use http_body_util::BodyExt as _;
use hyper::body::{Bytes, Incoming};
use hyper::header::{ACCEPT, AUTHORIZATION, CONTENT_TYPE, HOST};
use hyper::http::uri::PathAndQuery;
use hyper::{Method, Request, Response, Uri};
use hyper_util::rt::TokioIo;
use serde::Serialize;
use shift_roster_config::Config;
use shift_roster_core::models::{Assignment, AssignmentChange, Project, ProjectId};
use shift_roster_core::Window;
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::net::TcpStream;
use tokio_rustls::rustls::pki_types::ServerName;
use tokio_rustls::rustls::{ClientConfig, RootCertStore};
use tokio_rustls::TlsConnector;
use tracing::{debug, error};

use crate::error::ClientError;

/// Where the existing assignments of a window come from.
pub trait RosterSource {
    fn fetch_roster(
        &self,
        window: &Window,
    ) -> impl Future<Output = Result<Vec<Assignment>, ClientError>> + Send;
}

/// Where local changes are persisted to.
pub trait RosterSink {
    fn save_roster(
        &self,
        changes: &[AssignmentChange],
    ) -> impl Future<Output = Result<(), ClientError>> + Send;
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct RosterQuery {
    start_date: String,
    end_date: String,
}

#[derive(Serialize)]
struct SaveRequest<'a> {
    changes: &'a [AssignmentChange],
}

pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Clone)]
pub struct HttpRosterClient {
    base_url: String,
    project_id: ProjectId,
    bearer_token: Option<String>,
    tls: TlsConnector,
    timeout: Duration,
}

impl HttpRosterClient {
    pub fn new(
        api_url: &str,
        project_id: ProjectId,
        bearer_token: Option<String>,
    ) -> Result<Self, ClientError> {
        let base_url = api_url.trim_end_matches('/').to_owned();
        let uri: Uri = base_url.parse()?;
        if !matches!(uri.scheme_str(), Some("http" | "https")) || uri.host().is_none() {
            return Err(ClientError::InvalidUrl(format!(
                "{api_url} is not an absolute http(s) url"
            )));
        }
        if project_id.as_str().is_empty()
            || !project_id
                .as_str()
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
        {
            return Err(ClientError::InvalidUrl(format!(
                "{project_id:?} is not a valid project id"
            )));
        }

        // TODO allow extra root certificates for self hosted back ends
        let mut root_cert_store = RootCertStore::empty();
        root_cert_store.extend(webpki_roots::TLS_SERVER_ROOTS.iter().cloned());
        let config = ClientConfig::builder()
            .with_root_certificates(root_cert_store)
            .with_no_client_auth();

        Ok(Self {
            base_url,
            project_id,
            bearer_token,
            tls: TlsConnector::from(Arc::new(config)),
            timeout: DEFAULT_TIMEOUT,
        })
    }

    pub fn from_config(config: &Config) -> Result<Self, ClientError> {
        Ok(Self::new(
            &config.api_url,
            ProjectId::new(config.project_id.clone()),
            config.bearer_token.clone(),
        )?
        .with_timeout(Duration::from_secs(config.timeout_secs)))
    }

    /// Bounds connecting, sending and reading the answer of every request.
    #[must_use]
    pub const fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    #[must_use]
    pub const fn project_id(&self) -> &ProjectId {
        &self.project_id
    }

    pub fn project_uri(&self) -> Result<Uri, ClientError> {
        Ok(format!("{}/api/admin/project/{}", self.base_url, self.project_id).parse()?)
    }

    /// Without a window this is the write endpoint.
    pub fn roster_uri(&self, window: Option<&Window>) -> Result<Uri, ClientError> {
        let mut uri = format!(
            "{}/api/admin/project/{}/candidates/roster",
            self.base_url, self.project_id
        );
        if let Some(window) = window {
            let query = serde_urlencoded::to_string(RosterQuery {
                start_date: window.start().to_string(),
                end_date: window.end().to_string(),
            })?;
            uri.push('?');
            uri.push_str(&query);
        }
        Ok(uri.parse()?)
    }

    pub async fn fetch_project(&self) -> Result<Project, ClientError> {
        let body = self
            .send(Method::GET, self.project_uri()?, String::new())
            .await?;
        Ok(serde_json::from_slice(&body)?)
    }

    async fn send(&self, method: Method, uri: Uri, body: String) -> Result<Bytes, ClientError> {
        debug!("{method} {uri}");
        tokio::time::timeout(self.timeout, self.send_unbounded(method, uri, body))
            .await
            .map_err(|_| ClientError::Timeout(self.timeout))?
    }

    async fn send_unbounded(
        &self,
        method: Method,
        uri: Uri,
        body: String,
    ) -> Result<Bytes, ClientError> {
        let (host, port) = connect_target(&uri)?;
        let https = uri.scheme_str() == Some("https");
        let authority = uri
            .authority()
            .map_or_else(|| host.clone(), ToString::to_string);

        let mut builder = Request::builder()
            .method(method)
            .uri(uri.path_and_query().map_or("/", PathAndQuery::as_str))
            .header(HOST, authority)
            .header(ACCEPT, "application/json");
        if !body.is_empty() {
            builder = builder.header(CONTENT_TYPE, "application/json");
        }
        if let Some(token) = &self.bearer_token {
            builder = builder.header(AUTHORIZATION, format!("Bearer {token}"));
        }
        let request = builder.body(body)?;

        let stream = TcpStream::connect((host.as_str(), port)).await?;
        let response = if https {
            let server_name = ServerName::try_from(host)?;
            let stream = self.tls.connect(server_name, stream).await?;
            exchange(stream, request).await?
        } else {
            exchange(stream, request).await?
        };

        let status = response.status();
        let body = response.into_body().collect().await?.to_bytes();
        if !status.is_success() {
            return Err(ClientError::Status {
                status: status.as_u16(),
                body: String::from_utf8_lossy(&body).into_owned(),
            });
        }
        Ok(body)
    }
}

/// Host and port to open a socket to. IPv6 literals lose their brackets.
fn connect_target(uri: &Uri) -> Result<(String, u16), ClientError> {
    let host = uri
        .host()
        .ok_or_else(|| ClientError::InvalidUrl(uri.to_string()))?;
    let host = host
        .strip_prefix('[')
        .and_then(|host| host.strip_suffix(']'))
        .unwrap_or(host);
    let port = uri
        .port_u16()
        .unwrap_or(if uri.scheme_str() == Some("https") { 443 } else { 80 });
    Ok((host.to_owned(), port))
}

async fn exchange<S>(io: S, request: Request<String>) -> Result<Response<Incoming>, ClientError>
where
    S: AsyncRead + AsyncWrite + Unpin + Send + 'static,
{
    let (mut sender, connection) = hyper::client::conn::http1::handshake(TokioIo::new(io)).await?;
    tokio::task::spawn(async move {
        if let Err(err) = connection.await {
            error!("connection to roster api failed: {err}");
        }
    });
    Ok(sender.send_request(request).await?)
}

impl RosterSource for HttpRosterClient {
    async fn fetch_roster(&self, window: &Window) -> Result<Vec<Assignment>, ClientError> {
        let body = self
            .send(Method::GET, self.roster_uri(Some(window))?, String::new())
            .await?;
        Ok(serde_json::from_slice(&body)?)
    }
}

impl RosterSink for HttpRosterClient {
    async fn save_roster(&self, changes: &[AssignmentChange]) -> Result<(), ClientError> {
        let body = serde_json::to_string(&SaveRequest { changes })?;
        self.send(Method::POST, self.roster_uri(None)?, body).await?;
        Ok(())
    }
}
