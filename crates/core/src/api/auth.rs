//! Auth endpoints

use serde::Deserialize;
use serde_json::{json, Value};
use tracing::info;

use super::client::{take_field, ApiClient, RequestOptions};
use crate::account::{LoginForm, ProfileForm, RegisterForm};
use crate::session::User;
use crate::Result;

/// Body returned by register and login
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct AuthResponse {
    #[serde(default)]
    pub access_token: Option<String>,
    #[serde(default)]
    pub user: Option<User>,
    #[serde(default)]
    pub message: Option<String>,
}

impl ApiClient {
    /// `POST /auth/register`; starts a session when the reply carries one
    pub async fn register(&self, form: &RegisterForm) -> Result<AuthResponse> {
        let form = form.validate()?;
        let data = self
            .request(
                "/auth/register",
                RequestOptions::post(Some(json!({
                    "name": form.name,
                    "email": form.email,
                    "password": form.password,
                }))),
            )
            .await?;
        self.start_session(data).await
    }

    /// `POST /auth/login`; starts a session when the reply carries one
    pub async fn login(&self, form: &LoginForm) -> Result<AuthResponse> {
        let form = form.validate()?;
        let data = self
            .request(
                "/auth/login",
                RequestOptions::post(Some(json!({
                    "email": form.email,
                    "password": form.password,
                }))),
            )
            .await?;
        self.start_session(data).await
    }

    /// Forget the local session; the service has nothing to revoke
    pub async fn logout(&self) -> Result<()> {
        self.session().clear_session().await
    }

    /// `GET /auth/profile`
    pub async fn get_profile(&self) -> Result<Option<User>> {
        let data = self
            .request("/auth/profile", RequestOptions::get().authenticated())
            .await?;
        take_field(data, "user")
    }

    /// `PUT /auth/profile`; refreshes the cached user on success
    pub async fn update_profile(&self, form: &ProfileForm) -> Result<Option<User>> {
        let form = form.validate()?;
        let data = self
            .request(
                "/auth/profile",
                RequestOptions::put(json!({
                    "name": form.name,
                    "email": form.email,
                }))
                .authenticated(),
            )
            .await?;

        let user: Option<User> = take_field(data, "user")?;
        if let Some(user) = &user {
            self.session().update_user(user).await?;
        }
        Ok(user)
    }

    /// `POST /auth/verify-token`; the reply shape is up to the service
    pub async fn verify_token(&self) -> Result<Option<Value>> {
        self.request(
            "/auth/verify-token",
            RequestOptions::post(None).authenticated(),
        )
        .await
    }

    async fn start_session(&self, data: Option<Value>) -> Result<AuthResponse> {
        let response: AuthResponse = match data {
            Some(data) => serde_json::from_value(data)?,
            None => AuthResponse::default(),
        };

        let token = response
            .access_token
            .as_deref()
            .map(str::trim)
            .filter(|token| !token.is_empty());
        if let (Some(token), Some(user)) = (token, &response.user) {
            self.session().set_session(token, user).await?;
            info!("Signed in as {}", user.email);
        }
        Ok(response)
    }
}
