/*!
likes-to-topics: recently-liked posts → blog topic ideas.

# Overview

This library fetches the posts a user liked on X through the API v2, signing
every user-context request with OAuth 1.0a (HMAC-SHA1), and hands their text
to a completion model that suggests blog topics.

The signing part is usable on its own: [`Signer`] turns a [`SignatureRequest`]
into [`SignedParameters`], which render into an `Authorization` header.

# How to use

## Basic usecase 1 - signing a request

```rust
use http::Method;
use likes_to_topics::{Credentials, OAuthParameters, SignatureRequest, Signer};

let credentials = Credentials::new("[CONSUMER_KEY]", "[CONSUMER_SECRET]")
    .token("[ACCESS_TOKEN]", "[TOKEN_SECRET]");

let request = SignatureRequest::new(
    Method::GET,
    "https://api.x.com/2/users/2244994945/liked_tweets",
)?
.query(&[("max_results", "10")])?;

let signed = Signer::new(&credentials, OAuthParameters::new()).sign(&request)?;
let header = signed.authorization_header();
assert!(header.starts_with("OAuth "));
// send `request.request_url()` with `Authorization: {header}`
# Ok::<(), likes_to_topics::SignError>(())
```

## Basic usecase 2 - fetching liked posts

```rust,no_run
use likes_to_topics::{Credentials, FetchWindow, OAuthClientProvider};

# async fn run() -> likes_to_topics::Result<()> {
let credentials = Credentials::new("[CONSUMER_KEY]", "[CONSUMER_SECRET]")
    .token("[ACCESS_TOKEN]", "[TOKEN_SECRET]");

let client = reqwest::Client::new()
    .oauth1(credentials)
    .bearer_token(Some("[BEARER_TOKEN]"));

let user_id = client.user_id("XDevelopers").await?;
let outcome = client.liked_posts(&user_id, FetchWindow::default()).await;
for post in &outcome.posts {
    println!("{}: {}", post.author_username().unwrap_or("unknown"), post.text);
}
# Ok(())
# }
```
*/
mod client;
pub mod completion;
pub mod config;
mod error;
mod header;
pub mod logging;
mod model;
pub mod nonce;
mod secrets;
mod signer;
pub mod topics;
pub mod transport;

// exposed to external program
pub use client::{Client, FetchOutcome, FetchWindow, OAuthClientProvider, StopReason, MAX_PAGE_SIZE};
pub use error::{ConfigError, ConfigResult, Error, Result, SignError, SignResult};
pub use header::authorization_header;
pub use model::{LikedPost, User};
pub use secrets::{ConsumerCredentials, Credentials, SecretsProvider};
pub use signer::{percent_encode, OAuthParameters, SignatureRequest, SignedParameters, Signer};

/// Root of the X API v2.
pub const DEFAULT_API_BASE_URL: &str = "https://api.x.com/2";

// exposed constant variables
/// Represents `oauth_consumer_key`.
pub const OAUTH_CONSUMER_KEY: &str = "oauth_consumer_key";
/// Represents `oauth_nonce`.
pub const OAUTH_NONCE_KEY: &str = "oauth_nonce";
/// Represents `oauth_signature`.
pub const OAUTH_SIGNATURE_KEY: &str = "oauth_signature";
/// Represents `oauth_signature_method`.
pub const OAUTH_SIGNATURE_METHOD_KEY: &str = "oauth_signature_method";
/// Represents `oauth_timestamp`.
pub const OAUTH_TIMESTAMP_KEY: &str = "oauth_timestamp";
/// Represents `oauth_token`.
pub const OAUTH_TOKEN_KEY: &str = "oauth_token";
/// Represents `oauth_version`.
pub const OAUTH_VERSION_KEY: &str = "oauth_version";

/// Keys a caller may not pass as query parameters.
pub(crate) const RESERVED_KEYS: &[&str] = &[
    OAUTH_CONSUMER_KEY,
    OAUTH_NONCE_KEY,
    OAUTH_SIGNATURE_KEY,
    OAUTH_SIGNATURE_METHOD_KEY,
    OAUTH_TIMESTAMP_KEY,
    OAUTH_TOKEN_KEY,
    OAUTH_VERSION_KEY,
];
