use std::{borrow::Cow, collections::BTreeMap};

use base64::{engine::general_purpose::STANDARD, Engine};
use hmac::{Hmac, Mac};
use http::Method;
use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use serde::Serialize;
use sha1::Sha1;
use tracing::debug;
use url::Url;

use crate::nonce::{NonceSource, OsNonce, NONCE_LEN};
use crate::{
    SecretsProvider, SignError, SignResult, OAUTH_CONSUMER_KEY, OAUTH_NONCE_KEY,
    OAUTH_SIGNATURE_KEY, OAUTH_SIGNATURE_METHOD_KEY, OAUTH_TIMESTAMP_KEY, OAUTH_TOKEN_KEY,
    OAUTH_VERSION_KEY, RESERVED_KEYS,
};

type HmacSha1 = Hmac<Sha1>;

const SIGNATURE_METHOD: &str = "HMAC-SHA1";
const OAUTH_VERSION: &str = "1.0";

/// RFC 3986 section 2.3: everything but `ALPHA / DIGIT / "-" / "." / "_" / "~"`.
const UNRESERVED: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'.')
    .remove(b'_')
    .remove(b'~');

/// Percent-encode `input` as OAuth 1.0a requires (space is `%20`, never `+`).
pub fn percent_encode(input: &str) -> String {
    utf8_percent_encode(input, UNRESERVED).to_string()
}

/// Encode, sort and join key-value pairs into the normalized parameter string.
fn normalize<'p, I>(pairs: I) -> String
where
    I: IntoIterator<Item = (&'p str, &'p str)>,
{
    let mut encoded: Vec<(String, String)> = pairs
        .into_iter()
        .map(|(k, v)| (percent_encode(k), percent_encode(v)))
        .collect();
    encoded.sort();
    encoded
        .iter()
        .map(|(k, v)| format!("{}={}", k, v))
        .collect::<Vec<_>>()
        .join("&")
}

pub(crate) fn signature_base_string(method: &Method, base_url: &Url, parameters: &str) -> String {
    format!(
        "{}&{}&{}",
        method.as_str().to_ascii_uppercase(),
        percent_encode(base_url.as_str()),
        percent_encode(parameters)
    )
}

fn unix_timestamp() -> u64 {
    u64::try_from(chrono::Utc::now().timestamp()).unwrap_or_default()
}

/// A request to be signed: method, query-less base URL and the caller's parameters.
#[derive(Debug, Clone)]
pub struct SignatureRequest {
    method: Method,
    base_url: Url,
    parameters: BTreeMap<String, String>,
}

impl SignatureRequest {
    pub fn new(method: Method, base_url: &str) -> SignResult<Self> {
        let url = Url::parse(base_url)
            .map_err(|e| SignError::InvalidUrl(base_url.to_string(), e))?;
        Self::from_url(method, url)
    }

    /// # Errors
    /// Fails when `base_url` already has a query component; dynamic
    /// parameters must go through [`SignatureRequest::parameter`] or
    /// [`SignatureRequest::query`] so the signature covers them.
    pub fn from_url(method: Method, mut base_url: Url) -> SignResult<Self> {
        if base_url.query().is_some() {
            return Err(SignError::QueryInBaseUrl(base_url.to_string()));
        }
        base_url.set_fragment(None);
        Ok(SignatureRequest {
            method,
            base_url,
            parameters: BTreeMap::new(),
        })
    }

    /// Add one query parameter.
    pub fn parameter<K, V>(mut self, key: K, value: V) -> SignResult<Self>
    where
        K: Into<String>,
        V: ToString,
    {
        let key = key.into();
        if RESERVED_KEYS.contains(&key.as_str()) {
            return Err(SignError::ReservedParameter(key));
        }
        if self.parameters.contains_key(&key) {
            return Err(SignError::DuplicateParameter(key));
        }
        self.parameters.insert(key, value.to_string());
        Ok(self)
    }

    /// Add every pair `query` serializes to, the same way reqwest's `.query()` does.
    ///
    /// # Errors
    /// Fails if `query` cannot be serialized into a query string, or if it
    /// yields a reserved or repeated key.
    pub fn query<T: Serialize + ?Sized>(mut self, query: &T) -> SignResult<Self> {
        let encoded =
            serde_urlencoded::to_string(query).map_err(|e| SignError::Serialize(e.to_string()))?;
        for (key, value) in url::form_urlencoded::parse(encoded.as_bytes()) {
            self = self.parameter(key, value)?;
        }
        Ok(self)
    }

    pub fn method(&self) -> &Method {
        &self.method
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    pub fn parameters(&self) -> &BTreeMap<String, String> {
        &self.parameters
    }

    /// The URL to actually send: base URL plus the parameters, encoded
    /// exactly as they were for the signature.
    pub fn request_url(&self) -> Url {
        let mut url = self.base_url.clone();
        if !self.parameters.is_empty() {
            let query = normalize(
                self.parameters
                    .iter()
                    .map(|(k, v)| (k.as_str(), v.as_str())),
            );
            url.set_query(Some(&query));
        }
        url
    }
}

/// The `oauth_*` parameters of one signed request, `oauth_signature` included.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignedParameters {
    parameters: BTreeMap<String, String>,
}

impl SignedParameters {
    pub fn signature(&self) -> &str {
        self.get(OAUTH_SIGNATURE_KEY).unwrap_or_default()
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.parameters.get(key).map(String::as_str)
    }

    /// Iterate in key order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.parameters.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.parameters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.parameters.is_empty()
    }

    /// Render as an `Authorization` header value.
    pub fn authorization_header(&self) -> String {
        crate::header::authorization_header(self)
    }
}

/// Overrides for the generated `oauth_*` values.
///
/// Left unset, the timestamp is the current Unix time and the nonce comes
/// from the signer's [`NonceSource`].
#[derive(Debug, Clone, Default)]
pub struct OAuthParameters<'a> {
    nonce: Option<Cow<'a, str>>,
    timestamp: Option<u64>,
}

impl<'a> OAuthParameters<'a> {
    pub fn new() -> Self {
        Default::default()
    }

    /// set the oauth_nonce value
    pub fn nonce<T>(self, nonce: T) -> Self
    where
        T: Into<Cow<'a, str>>,
    {
        OAuthParameters {
            nonce: Some(nonce.into()),
            ..self
        }
    }

    /// set the oauth_timestamp value
    pub fn timestamp<T>(self, timestamp: T) -> Self
    where
        T: Into<u64>,
    {
        OAuthParameters {
            timestamp: Some(timestamp.into()),
            ..self
        }
    }
}

/// HMAC-SHA1 OAuth 1.0a signer.
pub struct Signer<'a, TSecretsProvider>
where
    TSecretsProvider: SecretsProvider,
{
    secrets: &'a TSecretsProvider,
    parameters: OAuthParameters<'a>,
    nonce_source: &'a dyn NonceSource,
}

impl<'a, TSecretsProvider> Signer<'a, TSecretsProvider>
where
    TSecretsProvider: SecretsProvider,
{
    pub fn new(secrets: &'a TSecretsProvider, parameters: OAuthParameters<'a>) -> Self {
        Signer {
            secrets,
            parameters,
            nonce_source: &OsNonce,
        }
    }

    pub fn with_nonce_source(self, nonce_source: &'a dyn NonceSource) -> Self {
        Signer {
            nonce_source,
            ..self
        }
    }

    /// Sign `request`, returning the `oauth_*` parameters plus `oauth_signature`.
    ///
    /// The caller's query parameters take part in the signature but are not
    /// part of the result; they travel in the request URL.
    pub fn sign(&self, request: &SignatureRequest) -> SignResult<SignedParameters> {
        let (consumer_key, consumer_secret) = self.secrets.get_consumer_key_pair();
        let (token, token_secret) = self.secrets.get_token_pair();

        let timestamp = self.parameters.timestamp.unwrap_or_else(unix_timestamp);
        let nonce = match self.parameters.nonce {
            Some(ref nonce) => nonce.to_string(),
            None => self.nonce_source.alphanumeric(NONCE_LEN),
        };

        let mut oauth = BTreeMap::new();
        oauth.insert(OAUTH_CONSUMER_KEY.to_string(), consumer_key.to_string());
        oauth.insert(OAUTH_NONCE_KEY.to_string(), nonce);
        oauth.insert(
            OAUTH_SIGNATURE_METHOD_KEY.to_string(),
            SIGNATURE_METHOD.to_string(),
        );
        oauth.insert(OAUTH_TIMESTAMP_KEY.to_string(), timestamp.to_string());
        oauth.insert(OAUTH_TOKEN_KEY.to_string(), token.to_string());
        oauth.insert(OAUTH_VERSION_KEY.to_string(), OAUTH_VERSION.to_string());

        let parameter_string = normalize(
            oauth
                .iter()
                .chain(request.parameters.iter())
                .map(|(k, v)| (k.as_str(), v.as_str())),
        );
        let base_string =
            signature_base_string(&request.method, &request.base_url, &parameter_string);
        let signing_key = format!(
            "{}&{}",
            percent_encode(consumer_secret),
            percent_encode(token_secret)
        );

        let mut mac =
            HmacSha1::new_from_slice(signing_key.as_bytes()).map_err(|_| SignError::InvalidKey)?;
        mac.update(base_string.as_bytes());
        let signature = STANDARD.encode(mac.finalize().into_bytes());
        debug!(method = %request.method, url = %request.base_url, "signed request");

        oauth.insert(OAUTH_SIGNATURE_KEY.to_string(), signature);
        Ok(SignedParameters { parameters: oauth })
    }
}
