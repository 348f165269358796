//! Authenticated request pipeline and typed endpoint wrappers.

use std::sync::Arc;

use reqwest::{RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde_json::json;
use tracing::{debug, warn};
use uuid::Uuid;

use domain::{
    CreateDiary, DiaryResponse, NotificationResponse, Paginated, PaginationParams, SiteConfig,
    TokenPair, UnreadCount, UpdateDiary, UserResponse,
};

use crate::config::ClientConfig;
use crate::error::{ClientError, ClientResult};
use crate::token::{HttpRefresher, TokenManager, TokenStore};

/// Client for the diary API.
#[derive(Clone)]
pub struct DiaryClient {
    http: reqwest::Client,
    base_url: String,
    tokens: Arc<TokenManager>,
}

impl DiaryClient {
    /// Build a client whose session is kept in `store`.
    pub fn new(config: ClientConfig, store: Arc<dyn TokenStore>) -> ClientResult<Self> {
        let http = reqwest::Client::builder().timeout(config.timeout).build()?;
        let refresher = Arc::new(HttpRefresher::new(http.clone(), &config.base_url));
        let tokens = TokenManager::new(store, refresher, config.refresh_leeway);
        Ok(Self::with_token_manager(config, http, tokens))
    }

    /// Build a client around an existing token manager.
    pub fn with_token_manager(
        config: ClientConfig,
        http: reqwest::Client,
        tokens: Arc<TokenManager>,
    ) -> Self {
        Self {
            http,
            base_url: config.base_url,
            tokens,
        }
    }

    pub fn tokens(&self) -> &Arc<TokenManager> {
        &self.tokens
    }

    /// Pick up the session saved by a previous run.
    pub async fn restore_session(&self) -> ClientResult<bool> {
        self.tokens.restore().await
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Send an authenticated request.
    ///
    /// A 401 triggers one refresh and one retry with the new token.
    pub async fn send(&self, request: RequestBuilder) -> ClientResult<Response> {
        let (token, generation) = self.tokens.access_token().await?;
        let retry = request.try_clone();

        let response = request.bearer_auth(&token).send().await?;
        if response.status() != StatusCode::UNAUTHORIZED {
            return check(response).await;
        }

        let Some(retry) = retry else {
            // Streaming bodies cannot be replayed
            return check(response).await;
        };

        debug!("Access token rejected, refreshing and retrying once");
        let (token, _) = self.tokens.refresh_after(generation).await?;
        let response = retry.bearer_auth(&token).send().await?;
        check(response).await
    }

    async fn send_json<T: DeserializeOwned>(&self, request: RequestBuilder) -> ClientResult<T> {
        let response = self.send(request).await?;
        Ok(response.json().await?)
    }

    async fn public_json<T: DeserializeOwned>(&self, request: RequestBuilder) -> ClientResult<T> {
        let response = check(request.send().await?).await?;
        Ok(response.json().await?)
    }

    // =========================================================================
    // Authentication
    // =========================================================================

    pub async fn register(
        &self,
        email: &str,
        password: &str,
        name: &str,
    ) -> ClientResult<UserResponse> {
        let request = self
            .http
            .post(self.url("/auth/register"))
            .json(&json!({ "email": email, "password": password, "name": name }));
        self.public_json(request).await
    }

    /// Sign in and start a session.
    pub async fn login(&self, email: &str, password: &str) -> ClientResult<TokenPair> {
        let request = self
            .http
            .post(self.url("/auth/login"))
            .json(&json!({ "email": email, "password": password }));
        let tokens: TokenPair = self.public_json(request).await?;
        self.tokens.set_tokens(tokens.clone()).await?;
        Ok(tokens)
    }

    /// Exchange the current refresh token explicitly.
    pub async fn refresh(&self) -> ClientResult<()> {
        let (_, generation) = self.tokens.access_token().await?;
        self.tokens.refresh_after(generation).await.map(|_| ())
    }

    /// Revoke the refresh token and forget the session.
    ///
    /// The local session is cleared even when the server cannot be reached.
    pub async fn logout(&self) -> ClientResult<()> {
        if let Some(refresh_token) = self.tokens.refresh_token().await {
            let result = self
                .http
                .post(self.url("/auth/logout"))
                .json(&json!({ "refresh_token": refresh_token }))
                .send()
                .await;
            match result {
                Ok(response) if !response.status().is_success() => {
                    warn!("Server refused logout: {}", response.status());
                }
                Err(e) => warn!("Logout request failed: {}", e),
                Ok(_) => {}
            }
        }
        self.tokens.clear().await
    }

    pub async fn me(&self) -> ClientResult<UserResponse> {
        self.send_json(self.http.get(self.url("/auth/me"))).await
    }

    // =========================================================================
    // Diaries
    // =========================================================================

    pub async fn list_diaries(
        &self,
        params: PaginationParams,
    ) -> ClientResult<Paginated<DiaryResponse>> {
        let request = self.http.get(self.url("/diaries")).query(&params);
        self.send_json(request).await
    }

    pub async fn public_diaries(
        &self,
        params: PaginationParams,
    ) -> ClientResult<Paginated<DiaryResponse>> {
        let request = self.http.get(self.url("/diaries/public")).query(&params);
        self.send_json(request).await
    }

    pub async fn get_diary(&self, id: Uuid) -> ClientResult<DiaryResponse> {
        let request = self.http.get(self.url(&format!("/diaries/{}", id)));
        self.send_json(request).await
    }

    pub async fn create_diary(&self, input: &CreateDiary) -> ClientResult<DiaryResponse> {
        let request = self.http.post(self.url("/diaries")).json(input);
        self.send_json(request).await
    }

    pub async fn update_diary(&self, id: Uuid, patch: &UpdateDiary) -> ClientResult<DiaryResponse> {
        let request = self
            .http
            .put(self.url(&format!("/diaries/{}", id)))
            .json(patch);
        self.send_json(request).await
    }

    pub async fn delete_diary(&self, id: Uuid) -> ClientResult<()> {
        let request = self.http.delete(self.url(&format!("/diaries/{}", id)));
        self.send(request).await?;
        Ok(())
    }

    // =========================================================================
    // Notifications
    // =========================================================================

    pub async fn notifications(
        &self,
        unread_only: bool,
        params: PaginationParams,
    ) -> ClientResult<Paginated<NotificationResponse>> {
        let request = self
            .http
            .get(self.url("/notifications"))
            .query(&params)
            .query(&[("unread_only", unread_only)]);
        self.send_json(request).await
    }

    pub async fn unread_count(&self) -> ClientResult<UnreadCount> {
        self.send_json(self.http.get(self.url("/notifications/unread-count")))
            .await
    }

    pub async fn mark_notification_read(&self, id: Uuid) -> ClientResult<NotificationResponse> {
        let request = self
            .http
            .post(self.url(&format!("/notifications/{}/read", id)));
        self.send_json(request).await
    }

    pub async fn mark_all_notifications_read(&self) -> ClientResult<UnreadCount> {
        self.send_json(self.http.post(self.url("/notifications/read-all")))
            .await
    }

    // =========================================================================
    // Site configuration
    // =========================================================================

    pub async fn site_config(&self) -> ClientResult<SiteConfig> {
        self.public_json(self.http.get(self.url("/config"))).await
    }
}

async fn check(response: Response) -> ClientResult<Response> {
    if response.status().is_success() {
        Ok(response)
    } else {
        Err(ClientError::from_response(response).await)
    }
}
