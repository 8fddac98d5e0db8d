use tokio_rustls::rustls::pki_types::InvalidDnsNameError;

#[derive(thiserror::Error, Debug)]
pub enum ClientError {
    #[error("io {0}")]
    Io(#[from] std::io::Error),
    #[error("hyper {0}")]
    Hyper(#[from] hyper::Error),
    #[error("hyper http {0}")]
    HyperHttp(#[from] hyper::http::Error),
    #[error("invalid uri {0}")]
    InvalidUri(#[from] hyper::http::uri::InvalidUri),
    #[error("invalid dns name {0}")]
    InvalidDnsName(#[from] InvalidDnsNameError),
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("url encoding error: {0}")]
    UrlEncoding(#[from] serde_urlencoded::ser::Error),
    #[error("invalid url: {0}")]
    InvalidUrl(String),
    #[error("no answer within {0:?}")]
    Timeout(core::time::Duration),
    #[error("server answered {status}: {body}")]
    Status { status: u16, body: String },
}
