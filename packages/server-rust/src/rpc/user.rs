//! Typed client for the remote user service.
//!
//! Every method copies its DTO field for field into a wire request, makes
//! one call through [`RpcCaller`], and maps the wire response back.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use super::call::RpcCaller;
use super::client::RpcClient;
use super::error::RpcError;
use crate::context::RequestContext;

/// Operation names understood by the user service.
pub mod user_ops {
    pub const SERVICE: &str = "user";
    pub const SIGN_UP: &str = "user.SignUp";
    pub const SIGN_IN: &str = "user.SignIn";
    pub const VALIDATE: &str = "user.ValidateUser";
    pub const GET_ME: &str = "user.GetMe";
    pub const GET_BY_ID: &str = "user.GetById";
    pub const UPDATE: &str = "user.UpdateUser";
    pub const REFRESH: &str = "user.Refresh";
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignUp {
    pub username: String,
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignIn {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpdateUser {
    pub email: String,
    pub username: String,
    pub new_password: String,
    pub old_password: String,
}

/// Access/refresh token pair issued by the user service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tokens {
    pub access: String,
    pub refresh: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: u64,
    pub email: String,
    pub username: String,
}

/// Wire messages exchanged with the user service.
mod wire {
    use serde::{Deserialize, Serialize};

    #[derive(Serialize)]
    pub struct SignUpRequest<'a> {
        pub username: &'a str,
        pub email: &'a str,
        pub password: &'a str,
    }

    #[derive(Serialize)]
    pub struct SignInRequest<'a> {
        pub email: &'a str,
        pub password: &'a str,
    }

    #[derive(Serialize)]
    pub struct ValidateRequest<'a> {
        pub access: &'a str,
    }

    #[derive(Serialize)]
    pub struct GetByIdRequest {
        pub user_id: u64,
    }

    #[derive(Serialize)]
    pub struct UpdateUserRequest<'a> {
        pub email: &'a str,
        pub username: &'a str,
        pub new_password: &'a str,
        pub old_password: &'a str,
    }

    /// Used in both directions by `Refresh`.
    #[derive(Serialize, Deserialize)]
    pub struct RefreshRequestResponse {
        pub access: String,
        pub refresh: String,
    }

    #[derive(Deserialize)]
    pub struct UserIdResponse {
        pub user_id: u64,
    }

    #[derive(Deserialize)]
    pub struct TokensResponse {
        pub access: String,
        pub refresh: String,
    }

    #[derive(Deserialize)]
    pub struct UserResponse {
        pub user_id: u64,
        pub email: String,
        pub username: String,
    }
}

impl From<wire::UserResponse> for User {
    fn from(r: wire::UserResponse) -> Self {
        Self {
            id: r.user_id,
            email: r.email,
            username: r.username,
        }
    }
}

/// Client for the user service.
#[derive(Clone)]
pub struct UserClient {
    rpc: RpcCaller,
}

impl UserClient {
    #[must_use]
    pub fn new(client: Arc<dyn RpcClient>) -> Self {
        Self {
            rpc: RpcCaller::new(user_ops::SERVICE, client),
        }
    }

    /// Wraps a pre-configured caller (e.g. one with a non-default codec).
    #[must_use]
    pub fn from_caller(rpc: RpcCaller) -> Self {
        Self { rpc }
    }

    /// Registers a user and returns the new user id.
    ///
    /// # Errors
    ///
    /// Returns the normalized [`RpcError`] of the remote call.
    pub async fn sign_up(&self, ctx: &RequestContext, dto: &SignUp) -> Result<u64, RpcError> {
        let request = wire::SignUpRequest {
            username: &dto.username,
            email: &dto.email,
            password: &dto.password,
        };
        let response: wire::UserIdResponse =
            self.rpc.call(ctx, user_ops::SIGN_UP, &request).await?;
        Ok(response.user_id)
    }

    /// # Errors
    ///
    /// Returns the normalized [`RpcError`] of the remote call.
    pub async fn sign_in(&self, ctx: &RequestContext, dto: &SignIn) -> Result<Tokens, RpcError> {
        let request = wire::SignInRequest {
            email: &dto.email,
            password: &dto.password,
        };
        let response: wire::TokensResponse =
            self.rpc.call(ctx, user_ops::SIGN_IN, &request).await?;
        Ok(Tokens {
            access: response.access,
            refresh: response.refresh,
        })
    }

    /// Resolves an access token to the user id it was issued for.
    ///
    /// # Errors
    ///
    /// Returns the normalized [`RpcError`] of the remote call.
    pub async fn validate(&self, ctx: &RequestContext, access: &str) -> Result<u64, RpcError> {
        let request = wire::ValidateRequest { access };
        let response: wire::UserIdResponse =
            self.rpc.call(ctx, user_ops::VALIDATE, &request).await?;
        Ok(response.user_id)
    }

    /// # Errors
    ///
    /// Returns the normalized [`RpcError`] of the remote call.
    pub async fn get_me(&self, ctx: &RequestContext, access: &str) -> Result<User, RpcError> {
        let request = wire::ValidateRequest { access };
        let response: wire::UserResponse = self.rpc.call(ctx, user_ops::GET_ME, &request).await?;
        Ok(response.into())
    }

    /// # Errors
    ///
    /// Returns the normalized [`RpcError`] of the remote call.
    pub async fn get_by_id(&self, ctx: &RequestContext, user_id: u64) -> Result<User, RpcError> {
        let request = wire::GetByIdRequest { user_id };
        let response: wire::UserResponse =
            self.rpc.call(ctx, user_ops::GET_BY_ID, &request).await?;
        Ok(response.into())
    }

    /// # Errors
    ///
    /// Returns the normalized [`RpcError`] of the remote call.
    pub async fn update(&self, ctx: &RequestContext, dto: &UpdateUser) -> Result<u64, RpcError> {
        let request = wire::UpdateUserRequest {
            email: &dto.email,
            username: &dto.username,
            new_password: &dto.new_password,
            old_password: &dto.old_password,
        };
        let response: wire::UserIdResponse =
            self.rpc.call(ctx, user_ops::UPDATE, &request).await?;
        Ok(response.user_id)
    }

    /// Exchanges a token pair for a fresh one.
    ///
    /// # Errors
    ///
    /// Returns the normalized [`RpcError`] of the remote call.
    pub async fn refresh(&self, ctx: &RequestContext, pair: &Tokens) -> Result<Tokens, RpcError> {
        let request = wire::RefreshRequestResponse {
            access: pair.access.clone(),
            refresh: pair.refresh.clone(),
        };
        let response: wire::RefreshRequestResponse =
            self.rpc.call(ctx, user_ops::REFRESH, &request).await?;
        Ok(Tokens {
            access: response.access,
            refresh: response.refresh,
        })
    }
}
