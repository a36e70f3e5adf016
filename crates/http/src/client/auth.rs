//! Auth endpoint bindings

use super::error::ClientError;
use super::PublicClient;
use crate::types::{
    ForgotPasswordRequest, LoginRequest, RefreshRequest, RefreshResponse, RegisterRequest,
    ResetPasswordRequest,
};
use async_trait::async_trait;
use reqwest::header;

use crate::types::LoginResponse;

/// The external authentication service, as seen by the session manager.
///
/// A trait seam so session tests can script responses without a server.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait AuthBackend: Send + Sync {
    async fn login(&self, request: LoginRequest) -> Result<LoginResponse, ClientError>;
    async fn register(&self, request: RegisterRequest) -> Result<(), ClientError>;
    async fn refresh(&self, request: RefreshRequest) -> Result<RefreshResponse, ClientError>;
    async fn logout(&self, access_token: String) -> Result<(), ClientError>;
    async fn forgot_password(&self, request: ForgotPasswordRequest) -> Result<(), ClientError>;
    async fn reset_password(&self, request: ResetPasswordRequest) -> Result<(), ClientError>;
}

/// HTTP implementation of [`AuthBackend`] over the public client.
#[derive(Clone)]
pub struct AuthApi {
    client: PublicClient,
}

impl AuthApi {
    pub fn new(client: PublicClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl AuthBackend for AuthApi {
    async fn login(&self, request: LoginRequest) -> Result<LoginResponse, ClientError> {
        let req = self
            .client
            .request(reqwest::Method::POST, "/auth/login")
            .json(&request);
        self.client.execute(req).await
    }

    async fn register(&self, request: RegisterRequest) -> Result<(), ClientError> {
        let req = self
            .client
            .request(reqwest::Method::POST, "/auth/register")
            .json(&request);
        self.client.execute_empty(req).await
    }

    async fn refresh(&self, request: RefreshRequest) -> Result<RefreshResponse, ClientError> {
        let req = self
            .client
            .request(reqwest::Method::POST, "/auth/refresh-token")
            .json(&request);
        self.client.execute(req).await
    }

    async fn logout(&self, access_token: String) -> Result<(), ClientError> {
        let req = self
            .client
            .request(reqwest::Method::POST, "/auth/logout")
            .header(header::AUTHORIZATION, format!("Bearer {access_token}"));
        self.client.execute_empty(req).await
    }

    async fn forgot_password(&self, request: ForgotPasswordRequest) -> Result<(), ClientError> {
        let req = self
            .client
            .request(reqwest::Method::POST, "/auth/forgot-password")
            .json(&request);
        self.client.execute_empty(req).await
    }

    async fn reset_password(&self, request: ResetPasswordRequest) -> Result<(), ClientError> {
        let req = self
            .client
            .request(reqwest::Method::POST, "/auth/reset-password")
            .json(&request);
        self.client.execute_empty(req).await
    }
}
