use http::StatusCode;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;
pub type SignResult<T> = std::result::Result<T, SignError>;
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

#[derive(Error, Debug)]
pub enum Error {
    #[error("configuration error : {0}")]
    Config(#[from] ConfigError),
    #[error("OAuth sign failed : {0}")]
    Signer(#[from] SignError),
    #[error("unauthorized (401), check the OAuth credentials : {0}")]
    Unauthorized(String),
    #[error("forbidden (403), the app may lack permission for this resource : {0}")]
    Forbidden(String),
    #[error("not found : {0}")]
    NotFound(String),
    #[error("unexpected response {status} : {body}")]
    Http { status: StatusCode, body: String },
    #[error("request failed : {0}")]
    Transport(#[from] reqwest::Error),
    #[error("malformed response body : {0}")]
    Decode(#[from] serde_json::Error),
    #[error("i/o failed : {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Maps a non-success status to the error kind callers branch on.
    pub(crate) fn from_status(status: StatusCode, body: String) -> Self {
        match status {
            StatusCode::UNAUTHORIZED => Error::Unauthorized(body),
            StatusCode::FORBIDDEN => Error::Forbidden(body),
            _ => Error::Http { status, body },
        }
    }

    /// Whether retrying with the same credentials could never succeed.
    pub fn is_auth_failure(&self) -> bool {
        matches!(
            self,
            Error::Unauthorized(_) | Error::Forbidden(_) | Error::Config(_)
        )
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SignError {
    #[error("base url must not carry a query component, but {0} does.")]
    QueryInBaseUrl(String),
    #[error("invalid base url {0} : {1}")]
    InvalidUrl(String, url::ParseError),
    #[error("parameter {0} is reserved for the oauth_* signing parameters.")]
    ReservedParameter(String),
    #[error("parameter {0} is specified more than once.")]
    DuplicateParameter(String),
    #[error("query parameters could not be serialized : {0}")]
    Serialize(String),
    #[error("signing key rejected by HMAC-SHA1.")]
    InvalidKey,
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("environment variable {0} is not set")]
    MissingVar(&'static str),
    #[error("credential {0} is empty")]
    EmptyCredential(&'static str),
    #[error("environment variable {var} must be a non-negative integer, but {value} is not.")]
    InvalidNumber { var: &'static str, value: String },
    #[error("a bearer token is required for the user lookup")]
    MissingBearerToken,
    #[error("base url {0} cannot carry path segments")]
    InvalidBaseUrl(String),
}
