use async_trait::async_trait;
use http::{header::AUTHORIZATION, StatusCode};
use url::Url;

use crate::Result;

/// A single authenticated `GET`.
#[derive(Debug, Clone)]
pub struct ApiRequest {
    pub url: Url,
    /// Full `Authorization` header value (`OAuth ...` or `Bearer ...`).
    pub authorization: String,
}

/// Status and raw body; callers decide how to decode.
#[derive(Debug, Clone)]
pub struct ApiResponse {
    pub status: StatusCode,
    pub body: String,
}

impl ApiResponse {
    pub fn new<T: Into<String>>(status: StatusCode, body: T) -> Self {
        ApiResponse {
            status,
            body: body.into(),
        }
    }
}

/// The HTTP boundary of the client.
///
/// Errors returned here are transport failures only; non-2xx responses are
/// returned as [`ApiResponse`] values.
#[async_trait(?Send)]
pub trait Transport {
    async fn get(&self, request: ApiRequest) -> Result<ApiResponse>;
}

#[async_trait(?Send)]
impl Transport for reqwest::Client {
    async fn get(&self, request: ApiRequest) -> Result<ApiResponse> {
        let response = reqwest::Client::get(self, request.url)
            .header(AUTHORIZATION, request.authorization)
            .send()
            .await?;
        let status = response.status();
        let body = response.text().await?;
        Ok(ApiResponse { status, body })
    }
}

#[async_trait(?Send)]
impl<T: Transport + ?Sized> Transport for &T {
    async fn get(&self, request: ApiRequest) -> Result<ApiResponse> {
        (**self).get(request).await
    }
}
