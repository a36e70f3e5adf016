//! Authenticated request path with transparent token refresh
//!
//! Every protected call goes through [`ApiClient::execute`], which attaches
//! the bearer token and survives exactly one token expiry per logical
//! request. Concurrent expiries share a single refresh via the session
//! manager's single-flight path.

use std::sync::Arc;

use reqwest::{header, Method};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::debug;

use super::error::ClientError;
use super::PublicClient;
use crate::session::SessionManager;

/// A request described by its parts so a retry is a fresh build-and-send,
/// never a replay of a consumed body.
#[derive(Debug, Clone)]
pub struct ApiRequest {
    pub method: Method,
    pub path: String,
    pub body: Option<serde_json::Value>,
}

impl ApiRequest {
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            body: None,
        }
    }

    pub fn get(path: impl Into<String>) -> Self {
        Self::new(Method::GET, path)
    }

    pub fn post(path: impl Into<String>) -> Self {
        Self::new(Method::POST, path)
    }

    pub fn put(path: impl Into<String>) -> Self {
        Self::new(Method::PUT, path)
    }

    pub fn delete(path: impl Into<String>) -> Self {
        Self::new(Method::DELETE, path)
    }

    pub fn json(mut self, body: &impl Serialize) -> Result<Self, ClientError> {
        self.body = Some(serde_json::to_value(body)?);
        Ok(self)
    }

    /// Auth endpoints handle their own 401s; refreshing on them would loop.
    fn is_auth_endpoint(&self) -> bool {
        self.path.contains("/auth/")
    }
}

/// Client for the protected API surface.
#[derive(Clone)]
pub struct ApiClient {
    http: PublicClient,
    sessions: Arc<SessionManager>,
}

impl ApiClient {
    pub fn new(http: PublicClient, sessions: Arc<SessionManager>) -> Self {
        Self { http, sessions }
    }

    pub fn sessions(&self) -> &Arc<SessionManager> {
        &self.sessions
    }

    /// Execute a request, refreshing the token and retrying once on a 401.
    ///
    /// A request that is unauthorized again after the retry surfaces
    /// [`ClientError::SessionExpired`] without a second refresh attempt.
    pub async fn execute<T: DeserializeOwned>(
        &self,
        request: ApiRequest,
    ) -> Result<T, ClientError> {
        match self.send(&request, self.sessions.access_token()).await {
            Err(err)
                if err.is_unauthorized()
                    && !request.is_auth_endpoint()
                    && self.sessions.is_authenticated() =>
            {
                debug!(path = %request.path, "request unauthorized, refreshing token");
                let token = self
                    .sessions
                    .refresh_session()
                    .await
                    .map_err(|_| ClientError::SessionExpired)?;
                match self.send(&request, Some(token)).await {
                    Err(err) if err.is_unauthorized() => Err(ClientError::SessionExpired),
                    other => other,
                }
            }
            other => other,
        }
    }

    pub async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T, ClientError> {
        self.execute(ApiRequest::get(path)).await
    }

    pub async fn post<T: DeserializeOwned>(
        &self,
        path: &str,
        body: &impl Serialize,
    ) -> Result<T, ClientError> {
        self.execute(ApiRequest::post(path).json(body)?).await
    }

    pub async fn put<T: DeserializeOwned>(
        &self,
        path: &str,
        body: &impl Serialize,
    ) -> Result<T, ClientError> {
        self.execute(ApiRequest::put(path).json(body)?).await
    }

    pub async fn delete<T: DeserializeOwned>(&self, path: &str) -> Result<T, ClientError> {
        self.execute(ApiRequest::delete(path)).await
    }

    async fn send<T: DeserializeOwned>(
        &self,
        request: &ApiRequest,
        token: Option<String>,
    ) -> Result<T, ClientError> {
        let mut builder = self.http.request(request.method.clone(), &request.path);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
        }
        if let Some(body) = &request.body {
            builder = builder.json(body);
        }
        self.http.execute(builder).await
    }
}
