use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use http::{Method, StatusCode};
use serde::Serialize;
use tracing::{debug, info, warn};
use url::Url;

use crate::model::{LikedPost, LikedPostsPage, UserLookup};
use crate::nonce::{NonceSource, OsNonce};
use crate::transport::{ApiRequest, Transport};
use crate::{
    ConfigError, ConfigResult, Credentials, Error, OAuthParameters, Result, SignatureRequest,
    Signer, DEFAULT_API_BASE_URL,
};

/// Upper bound the API accepts for `max_results` on one page.
pub const MAX_PAGE_SIZE: usize = 100;

const TWEET_FIELDS: &str = "created_at,public_metrics,context_annotations,entities";
const EXPANSIONS: &str = "author_id";
const USER_FIELDS: &str = "username,name,verified";

pub trait OAuthClientProvider: Transport + Sized {
    /// Wrap this transport into a [`Client`] signing with `credentials`.
    fn oauth1(self, credentials: Credentials<'static>) -> Client<Self> {
        Client::new(self, credentials)
    }
}

impl<T: Transport> OAuthClientProvider for T {}

/// Bounds of one liked-posts fetch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FetchWindow {
    pub max_results: usize,
    pub days_back: u32,
}

impl Default for FetchWindow {
    fn default() -> Self {
        FetchWindow {
            max_results: 25,
            days_back: 7,
        }
    }
}

/// Why a fetch stopped requesting pages.
#[derive(Debug)]
pub enum StopReason {
    /// Collected `max_results` posts.
    LimitReached,
    /// The last page had no `next_token`.
    NoMorePages,
    /// A page came back without a `data` array.
    NoData,
    /// A page contributed no post inside the window; older pages are skipped.
    OutOfWindow,
    /// A request failed; posts gathered before it are kept.
    Failed(Error),
}

/// Posts gathered by [`Client::liked_posts`] and how the fetch ended.
#[derive(Debug)]
pub struct FetchOutcome {
    pub posts: Vec<LikedPost>,
    /// Number of page requests issued.
    pub pages: usize,
    pub stop: StopReason,
}

impl FetchOutcome {
    pub fn error(&self) -> Option<&Error> {
        match self.stop {
            StopReason::Failed(ref err) => Some(err),
            _ => None,
        }
    }

    pub fn into_result(self) -> Result<Vec<LikedPost>> {
        match self.stop {
            StopReason::Failed(err) => Err(err),
            _ => Ok(self.posts),
        }
    }
}

#[derive(Debug, Serialize)]
struct LikedPostsQuery<'a> {
    max_results: usize,
    #[serde(rename = "tweet.fields")]
    tweet_fields: &'a str,
    expansions: &'a str,
    #[serde(rename = "user.fields")]
    user_fields: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pagination_token: Option<&'a str>,
}

enum FetchState {
    RequestPage(Option<String>),
    ProcessPage(LikedPostsPage),
    Terminal(StopReason),
}

/// X API v2 client: bearer-authenticated user lookup and OAuth 1.0a signed
/// liked-posts retrieval.
pub struct Client<T> {
    transport: T,
    base_url: Url,
    credentials: Credentials<'static>,
    bearer_token: Option<String>,
    oauth_parameters: OAuthParameters<'static>,
    nonce_source: Arc<dyn NonceSource>,
}

impl<T> Client<T>
where
    T: Transport,
{
    /// Constructs a new `Client` against [`DEFAULT_API_BASE_URL`].
    pub fn new(transport: T, credentials: Credentials<'static>) -> Self {
        Client {
            transport,
            base_url: Url::parse(DEFAULT_API_BASE_URL).expect("default base url is valid"),
            credentials,
            bearer_token: None,
            oauth_parameters: OAuthParameters::new(),
            nonce_source: Arc::new(OsNonce),
        }
    }

    /// Point the client at another API root, e.g. `https://api.x.com/2`.
    pub fn base_url(self, base_url: &str) -> ConfigResult<Self> {
        let url =
            Url::parse(base_url).map_err(|_| ConfigError::InvalidBaseUrl(base_url.to_string()))?;
        if url.cannot_be_a_base() {
            return Err(ConfigError::InvalidBaseUrl(base_url.to_string()));
        }
        Ok(Client {
            base_url: url,
            ..self
        })
    }

    /// App-only token used by [`Client::user_id`].
    pub fn bearer_token<S: Into<String>>(self, bearer_token: Option<S>) -> Self {
        Client {
            bearer_token: bearer_token.map(Into::into),
            ..self
        }
    }

    pub fn oauth_parameters(self, oauth_parameters: OAuthParameters<'static>) -> Self {
        Client {
            oauth_parameters,
            ..self
        }
    }

    pub fn nonce_source<N: NonceSource + 'static>(self, nonce_source: N) -> Self {
        Client {
            nonce_source: Arc::new(nonce_source),
            ..self
        }
    }

    fn endpoint(&self, segments: &[&str]) -> Url {
        let mut url = self.base_url.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        url
    }

    /// Resolve a handle (with or without the leading `@`) to its user id.
    ///
    /// # Errors
    ///
    /// [`ConfigError::MissingBearerToken`] without a bearer token,
    /// [`Error::NotFound`] for an unknown handle, [`Error::Unauthorized`] /
    /// [`Error::Forbidden`] for rejected credentials. Nothing is retried.
    pub async fn user_id(&self, handle: &str) -> Result<String> {
        let token = self
            .bearer_token
            .as_deref()
            .ok_or(ConfigError::MissingBearerToken)?;
        let handle = handle.trim_start_matches('@');
        let url = self.endpoint(&["users", "by", "username", handle]);
        debug!(%url, "looking up user id");

        let response = self
            .transport
            .get(ApiRequest {
                url,
                authorization: format!("Bearer {}", token),
            })
            .await?;
        if response.status == StatusCode::NOT_FOUND {
            return Err(Error::NotFound(handle.to_string()));
        }
        if !response.status.is_success() {
            return Err(Error::from_status(response.status, response.body));
        }

        let lookup: UserLookup = serde_json::from_str(&response.body)?;
        lookup
            .data
            .map(|user| user.id)
            .ok_or_else(|| Error::NotFound(handle.to_string()))
    }

    /// Fetch the posts `user_id` liked within `window`, newest first.
    ///
    /// Pages are requested one after another until `max_results` posts are
    /// collected, the API has no further page, or a page yields nothing newer
    /// than the cutoff. Failures end the fetch without discarding what was
    /// already collected; see [`FetchOutcome::stop`].
    pub async fn liked_posts(&self, user_id: &str, window: FetchWindow) -> FetchOutcome {
        let cutoff = cutoff(Utc::now(), window.days_back);
        info!(
            days_back = window.days_back,
            since = %cutoff.format("%Y-%m-%d"),
            "fetching liked posts"
        );

        let mut posts = Vec::new();
        let mut pages = 0;
        let mut state = if window.max_results == 0 {
            FetchState::Terminal(StopReason::LimitReached)
        } else {
            FetchState::RequestPage(None)
        };

        let stop = loop {
            state = match state {
                FetchState::RequestPage(token) => {
                    pages += 1;
                    match self.request_page(user_id, &window, token.as_deref()).await {
                        Ok(Some(page)) => FetchState::ProcessPage(page),
                        Ok(None) => FetchState::Terminal(StopReason::NoData),
                        Err(err) => FetchState::Terminal(StopReason::Failed(err)),
                    }
                }
                FetchState::ProcessPage(page) => {
                    process_page(page, cutoff, window.max_results, &mut posts)
                }
                FetchState::Terminal(stop) => break stop,
            };
        };

        match stop {
            StopReason::Failed(ref err) => warn!(pages, "stopped fetching liked posts: {}", err),
            StopReason::OutOfWindow => info!(
                "no more liked posts found within {} days",
                window.days_back
            ),
            _ => {}
        }
        info!(
            "found {} liked posts from the last {} days",
            posts.len(),
            window.days_back
        );

        FetchOutcome { posts, pages, stop }
    }

    /// `Ok(None)` for a successful page without a `data` array.
    async fn request_page(
        &self,
        user_id: &str,
        window: &FetchWindow,
        pagination_token: Option<&str>,
    ) -> Result<Option<LikedPostsPage>> {
        let query = LikedPostsQuery {
            max_results: window.max_results.min(MAX_PAGE_SIZE),
            tweet_fields: TWEET_FIELDS,
            expansions: EXPANSIONS,
            user_fields: USER_FIELDS,
            pagination_token,
        };
        let request = SignatureRequest::from_url(
            Method::GET,
            self.endpoint(&["users", user_id, "liked_tweets"]),
        )?
        .query(&query)?;
        let signed = Signer::new(&self.credentials, self.oauth_parameters.clone())
            .with_nonce_source(self.nonce_source.as_ref())
            .sign(&request)?;

        debug!(url = %request.base_url(), ?pagination_token, "requesting page");
        let response = self
            .transport
            .get(ApiRequest {
                url: request.request_url(),
                authorization: signed.authorization_header(),
            })
            .await?;
        if !response.status.is_success() {
            return Err(Error::from_status(response.status, response.body));
        }

        let page: LikedPostsPage = serde_json::from_str(&response.body)?;
        Ok(page.data.is_some().then(|| page))
    }
}

/// Oldest creation time still inside the window. A window reaching past
/// the representable range has no cutoff.
fn cutoff(now: DateTime<Utc>, days_back: u32) -> DateTime<Utc> {
    now.checked_sub_signed(Duration::days(i64::from(days_back)))
        .unwrap_or(DateTime::<Utc>::MIN_UTC)
}

/// Filter one page against `cutoff`, attach authors, and pick the next state.
fn process_page(
    page: LikedPostsPage,
    cutoff: DateTime<Utc>,
    max_results: usize,
    posts: &mut Vec<LikedPost>,
) -> FetchState {
    let authors = page.includes.users_by_id();
    let mut in_window = 0;
    for mut post in page.data.unwrap_or_default() {
        if post.created_at().map_or(false, |created| created < cutoff) {
            continue;
        }
        if let Some(author) = post.author_id.as_ref().and_then(|id| authors.get(id)) {
            post.author = Some(author.clone());
        }
        posts.push(post);
        in_window += 1;
    }
    debug!(in_window, total = posts.len(), "processed page");

    if posts.len() >= max_results {
        posts.truncate(max_results);
        return FetchState::Terminal(StopReason::LimitReached);
    }
    match page.meta.next_token {
        Some(token) if in_window > 0 => FetchState::RequestPage(Some(token)),
        Some(_) => FetchState::Terminal(StopReason::OutOfWindow),
        None => FetchState::Terminal(StopReason::NoMorePages),
    }
}

#[cfg(test)]
mod tests {
    use std::{cell::RefCell, collections::VecDeque};

    use async_trait::async_trait;
    use chrono::SecondsFormat;
    use serde_json::json;

    use super::*;
    use crate::transport::ApiResponse;

    #[derive(Default)]
    struct Scripted {
        responses: RefCell<VecDeque<ApiResponse>>,
        requests: RefCell<Vec<ApiRequest>>,
    }

    impl Scripted {
        fn new(responses: Vec<ApiResponse>) -> Self {
            Scripted {
                responses: RefCell::new(responses.into()),
                requests: RefCell::default(),
            }
        }

        fn requests(&self) -> Vec<ApiRequest> {
            self.requests.borrow().clone()
        }
    }

    #[async_trait(?Send)]
    impl Transport for Scripted {
        async fn get(&self, request: ApiRequest) -> Result<ApiResponse> {
            self.requests.borrow_mut().push(request);
            Ok(self
                .responses
                .borrow_mut()
                .pop_front()
                .expect("unexpected request"))
        }
    }

    fn client(transport: &Scripted) -> Client<&Scripted> {
        let credentials = Credentials::new("ck", "cs").token("at", "ats");
        Client::new(transport, credentials)
            .base_url("https://api.example.com/2")
            .unwrap()
            .bearer_token(Some("bearer"))
    }

    fn timestamp(hours_ago: i64) -> String {
        (Utc::now() - Duration::hours(hours_ago)).to_rfc3339_opts(SecondsFormat::Millis, true)
    }

    fn post(id: usize, hours_ago: i64) -> serde_json::Value {
        json!({
            "id": id.to_string(),
            "text": format!("post {}", id),
            "created_at": timestamp(hours_ago),
            "author_id": "42",
        })
    }

    fn page(posts: Vec<serde_json::Value>, next_token: Option<&str>) -> ApiResponse {
        let mut body = json!({
            "data": posts,
            "includes": {"users": [{"id": "42", "username": "ferris", "name": "Ferris"}]},
            "meta": {"result_count": 0},
        });
        if let Some(token) = next_token {
            body["meta"]["next_token"] = json!(token);
        }
        ApiResponse::new(StatusCode::OK, body.to_string())
    }

    fn window(max_results: usize) -> FetchWindow {
        FetchWindow {
            max_results,
            days_back: 7,
        }
    }

    #[tokio::test]
    async fn stop_when_page_is_out_of_window() {
        let transport = Scripted::new(vec![
            page((1..=3).map(|i| post(i, 1)).collect(), Some("page-2")),
            page(vec![post(4, 24 * 10), post(5, 24 * 12)], Some("page-3")),
        ]);
        let outcome = client(&transport).liked_posts("123", window(5)).await;

        assert_eq!(outcome.posts.len(), 3);
        assert_eq!(outcome.pages, 2);
        assert!(matches!(outcome.stop, StopReason::OutOfWindow));

        let requests = transport.requests();
        assert_eq!(requests.len(), 2);
        assert!(!requests[0].url.as_str().contains("pagination_token"));
        assert!(requests[1]
            .url
            .query_pairs()
            .any(|(k, v)| k == "pagination_token" && v == "page-2"));
    }

    #[tokio::test]
    async fn huge_days_back_keeps_everything() {
        let transport = Scripted::new(vec![page(
            vec![post(1, 1), post(2, 24 * 365 * 50)],
            None,
        )]);
        let outcome = client(&transport)
            .liked_posts(
                "123",
                FetchWindow {
                    max_results: 5,
                    days_back: u32::MAX,
                },
            )
            .await;

        assert_eq!(outcome.posts.len(), 2);
        assert!(matches!(outcome.stop, StopReason::NoMorePages));
    }

    #[test]
    fn cutoff_saturates_at_min() {
        let now = Utc::now();
        assert_eq!(cutoff(now, u32::MAX), DateTime::<Utc>::MIN_UTC);
        assert_eq!(cutoff(now, 7), now - Duration::days(7));
    }

    #[tokio::test]
    async fn unauthorized_ends_fetch() {
        let transport = Scripted::new(vec![ApiResponse::new(
            StatusCode::UNAUTHORIZED,
            r#"{"title":"Unauthorized"}"#,
        )]);
        let outcome = client(&transport).liked_posts("123", window(5)).await;

        assert!(outcome.posts.is_empty());
        assert!(matches!(outcome.error(), Some(Error::Unauthorized(_))));
        assert_eq!(transport.requests().len(), 1);
    }

    #[tokio::test]
    async fn forbidden_ends_fetch() {
        let transport = Scripted::new(vec![ApiResponse::new(StatusCode::FORBIDDEN, "")]);
        let outcome = client(&transport).liked_posts("123", window(5)).await;

        assert!(matches!(outcome.error(), Some(Error::Forbidden(_))));
        assert!(outcome.error().unwrap().is_auth_failure());
    }

    #[tokio::test]
    async fn truncate_to_max_results() {
        let transport = Scripted::new(vec![page(
            (1..=8).map(|i| post(i, 2)).collect(),
            Some("page-2"),
        )]);
        let outcome = client(&transport).liked_posts("123", window(5)).await;

        assert_eq!(outcome.posts.len(), 5);
        assert_eq!(outcome.posts[4].id, "5");
        assert!(matches!(outcome.stop, StopReason::LimitReached));

        let requests = transport.requests();
        assert_eq!(requests.len(), 1);
        assert_eq!(
            requests[0].url.path(),
            "/2/users/123/liked_tweets"
        );
        assert!(requests[0]
            .url
            .query_pairs()
            .any(|(k, v)| k == "max_results" && v == "5"));
        assert!(requests[0].authorization.starts_with("OAuth oauth_consumer_key=\"ck\""));
    }

    #[tokio::test]
    async fn keep_partial_results_on_server_error() {
        let transport = Scripted::new(vec![
            page(vec![post(1, 1), post(2, 1)], Some("page-2")),
            ApiResponse::new(StatusCode::SERVICE_UNAVAILABLE, "try later"),
        ]);
        let outcome = client(&transport).liked_posts("123", window(10)).await;

        assert_eq!(outcome.posts.len(), 2);
        match outcome.error() {
            Some(Error::Http { status, body }) => {
                assert_eq!(*status, StatusCode::SERVICE_UNAVAILABLE);
                assert_eq!(body, "try later");
            }
            other => panic!("unexpected: {:?}", other),
        }
        assert!(outcome.into_result().is_err());
    }

    #[tokio::test]
    async fn page_without_data_is_success() {
        let transport = Scripted::new(vec![ApiResponse::new(
            StatusCode::OK,
            r#"{"meta":{"result_count":0}}"#,
        )]);
        let outcome = client(&transport).liked_posts("123", window(5)).await;

        assert!(matches!(outcome.stop, StopReason::NoData));
        assert!(outcome.into_result().unwrap().is_empty());
    }

    #[tokio::test]
    async fn malformed_body_is_decode_error() {
        let transport = Scripted::new(vec![ApiResponse::new(StatusCode::OK, "<html>")]);
        let outcome = client(&transport).liked_posts("123", window(5)).await;

        assert!(matches!(outcome.error(), Some(Error::Decode(_))));
    }

    #[tokio::test]
    async fn filter_and_enrich_posts() {
        let mut undated = post(3, 0);
        undated["created_at"] = json!("not a date");
        let mut stranger = post(4, 1);
        stranger["author_id"] = json!("7");
        let transport = Scripted::new(vec![page(
            vec![post(1, 1), post(2, 24 * 8), undated, stranger],
            None,
        )]);
        let outcome = client(&transport).liked_posts("123", window(10)).await;

        let ids: Vec<&str> = outcome.posts.iter().map(|p| p.id.as_str()).collect();
        assert_eq!(ids, vec!["1", "3", "4"]);
        assert_eq!(outcome.posts[0].author_username(), Some("ferris"));
        assert!(outcome.posts[2].author.is_none());
        assert!(matches!(outcome.stop, StopReason::NoMorePages));
    }

    #[tokio::test]
    async fn follow_pages_until_limit() {
        let transport = Scripted::new(vec![
            page(vec![post(1, 1), post(2, 1)], Some("page-2")),
            page(vec![post(3, 2), post(4, 2)], Some("page-3")),
        ]);
        let outcome = client(&transport).liked_posts("123", window(3)).await;

        assert_eq!(outcome.posts.len(), 3);
        assert_eq!(outcome.pages, 2);
        assert!(matches!(outcome.stop, StopReason::LimitReached));
    }

    #[tokio::test]
    async fn cap_page_size() {
        let transport = Scripted::new(vec![page(vec![post(1, 1)], None)]);
        client(&transport).liked_posts("123", window(250)).await;

        assert!(transport.requests()[0]
            .url
            .query_pairs()
            .any(|(k, v)| k == "max_results" && v == "100"));
    }

    #[tokio::test]
    async fn zero_max_results_sends_nothing() {
        let transport = Scripted::default();
        let outcome = client(&transport).liked_posts("123", window(0)).await;

        assert!(outcome.posts.is_empty());
        assert_eq!(outcome.pages, 0);
        assert!(transport.requests().is_empty());
    }

    #[tokio::test]
    async fn resolve_user_id() {
        let body = r#"{"data":{"id":"2244994945","name":"X Dev","username":"XDevelopers"}}"#;
        let transport = Scripted::new(vec![
            ApiResponse::new(StatusCode::OK, body),
            ApiResponse::new(StatusCode::OK, body),
        ]);
        let client = client(&transport);

        assert_eq!(client.user_id("@XDevelopers").await.unwrap(), "2244994945");
        assert_eq!(client.user_id("XDevelopers").await.unwrap(), "2244994945");

        let requests = transport.requests();
        assert_eq!(requests[0].authorization, "Bearer bearer");
        assert_eq!(
            requests[0].url.as_str(),
            "https://api.example.com/2/users/by/username/XDevelopers"
        );
        assert_eq!(requests[0].url, requests[1].url);
    }

    #[tokio::test]
    async fn unknown_handle_is_not_found() {
        let transport = Scripted::new(vec![
            ApiResponse::new(
                StatusCode::OK,
                r#"{"errors":[{"title":"Not Found Error"}]}"#,
            ),
            ApiResponse::new(StatusCode::NOT_FOUND, ""),
        ]);
        let client = client(&transport);

        assert!(matches!(client.user_id("nobody").await, Err(Error::NotFound(h)) if h == "nobody"));
        assert!(matches!(client.user_id("nobody").await, Err(Error::NotFound(_))));
    }

    #[tokio::test]
    async fn rejected_bearer_is_unauthorized() {
        let transport = Scripted::new(vec![ApiResponse::new(StatusCode::UNAUTHORIZED, "")]);
        let err = client(&transport).user_id("someone").await.unwrap_err();
        assert!(matches!(err, Error::Unauthorized(_)));
    }

    #[tokio::test]
    async fn missing_bearer_skips_request() {
        let transport = Scripted::default();
        let client = client(&transport).bearer_token(None::<String>);

        let err = client.user_id("someone").await.unwrap_err();
        assert!(matches!(
            err,
            Error::Config(ConfigError::MissingBearerToken)
        ));
        assert!(transport.requests().is_empty());
    }

    #[test]
    fn reject_opaque_base_url() {
        let transport = Scripted::default();
        let credentials = Credentials::new("ck", "cs").token("at", "ats");
        let err = Client::new(&transport, credentials)
            .base_url("mailto:someone@example.com")
            .err()
            .unwrap();
        assert!(matches!(err, ConfigError::InvalidBaseUrl(_)));
    }
}
