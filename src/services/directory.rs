use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use thiserror::Error;
use uuid::Uuid;

use crate::models::{ServiceDomain, ServiceOffer, ServiceRequest, UserAccount};

/// Errors that can occur when calling the directory API
#[derive(Debug, Error)]
pub enum DirectoryError {
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("API returned error: {0}")]
    Api(String),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("unauthorized: invalid API key")]
    Unauthorized,

    #[error("invalid response format: {0}")]
    InvalidResponse(String),
}

/// Outcome of an atomic match confirmation
///
/// `Conflict` means the availability re-check failed on the owning side,
/// typically because another requester confirmed the same offer first.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfirmOutcome {
    Confirmed,
    Conflict,
}

/// Boundary to the identity and request/offer collaborator
///
/// Everything behind this trait is owned elsewhere; the engine only reads,
/// except for `confirm_match`, which the collaborator executes under its
/// own check-and-set.
#[async_trait]
pub trait Directory: Send + Sync {
    async fn get_user(&self, user_id: &str) -> Result<UserAccount, DirectoryError>;

    /// Enumerate every account holding the given capability (e.g. "admin")
    async fn list_users_with_capability(
        &self,
        capability: &str,
    ) -> Result<Vec<UserAccount>, DirectoryError>;

    async fn get_request(
        &self,
        domain: ServiceDomain,
        request_id: Uuid,
    ) -> Result<ServiceRequest, DirectoryError>;

    async fn get_offer(
        &self,
        domain: ServiceDomain,
        offer_id: Uuid,
    ) -> Result<ServiceOffer, DirectoryError>;

    async fn list_available_offers(
        &self,
        domain: ServiceDomain,
    ) -> Result<Vec<ServiceOffer>, DirectoryError>;

    async fn confirm_match(
        &self,
        domain: ServiceDomain,
        request_id: Uuid,
        offer_id: Uuid,
    ) -> Result<ConfirmOutcome, DirectoryError>;
}

/// HTTP client for the platform directory
///
/// Handles identity lookups, request/offer reads and the atomic match
/// confirmation endpoint. User lookups are fronted by an in-process cache
/// because the escalation fan-out resolves the same accounts repeatedly.
pub struct HttpDirectory {
    base_url: String,
    api_key: String,
    client: Client,
    user_cache: moka::future::Cache<String, UserAccount>,
}

impl HttpDirectory {
    pub fn new(base_url: String, api_key: String, cache_size: u64, cache_ttl_secs: u64) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .expect("Failed to create HTTP client");

        let user_cache = moka::future::CacheBuilder::new(cache_size)
            .time_to_live(Duration::from_secs(cache_ttl_secs))
            .build();

        Self {
            base_url,
            api_key,
            client,
            user_cache,
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url.trim_end_matches('/'), path)
    }

    async fn check_status(
        response: reqwest::Response,
        what: &str,
    ) -> Result<reqwest::Response, DirectoryError> {
        match response.status() {
            status if status.is_success() => Ok(response),
            StatusCode::NOT_FOUND => Err(DirectoryError::NotFound(what.to_string())),
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => Err(DirectoryError::Unauthorized),
            status => Err(DirectoryError::Api(format!(
                "{} request failed: {}",
                what, status
            ))),
        }
    }
}

#[async_trait]
impl Directory for HttpDirectory {
    async fn get_user(&self, user_id: &str) -> Result<UserAccount, DirectoryError> {
        if let Some(user) = self.user_cache.get(user_id).await {
            tracing::trace!(user_id, "Directory cache hit");
            return Ok(user);
        }

        let url = self.url(&format!("/users/{}", urlencoding::encode(user_id)));
        tracing::debug!(user_id, "Fetching user from directory");

        let response = self
            .client
            .get(&url)
            .header("X-Api-Key", &self.api_key)
            .send()
            .await?;

        let response = Self::check_status(response, &format!("user {}", user_id)).await?;

        let user: UserAccount = response
            .json()
            .await
            .map_err(|e| DirectoryError::InvalidResponse(format!("Failed to parse user: {}", e)))?;

        self.user_cache.insert(user_id.to_string(), user.clone()).await;

        Ok(user)
    }

    async fn list_users_with_capability(
        &self,
        capability: &str,
    ) -> Result<Vec<UserAccount>, DirectoryError> {
        let url = self.url(&format!(
            "/users?capability={}",
            urlencoding::encode(capability)
        ));

        let response = self
            .client
            .get(&url)
            .header("X-Api-Key", &self.api_key)
            .send()
            .await?;

        let response =
            Self::check_status(response, &format!("capability {}", capability)).await?;

        let users: Vec<UserAccount> = response.json().await.map_err(|e| {
            DirectoryError::InvalidResponse(format!("Failed to parse user list: {}", e))
        })?;

        tracing::debug!(capability, count = users.len(), "Listed capability holders");

        Ok(users)
    }

    async fn get_request(
        &self,
        domain: ServiceDomain,
        request_id: Uuid,
    ) -> Result<ServiceRequest, DirectoryError> {
        let url = self.url(&format!("/requests/{}/{}", domain.as_str(), request_id));

        let response = self
            .client
            .get(&url)
            .header("X-Api-Key", &self.api_key)
            .send()
            .await?;

        let response =
            Self::check_status(response, &format!("request {}", request_id)).await?;

        response.json().await.map_err(|e| {
            DirectoryError::InvalidResponse(format!("Failed to parse request: {}", e))
        })
    }

    async fn get_offer(
        &self,
        domain: ServiceDomain,
        offer_id: Uuid,
    ) -> Result<ServiceOffer, DirectoryError> {
        let url = self.url(&format!("/offers/{}/{}", domain.as_str(), offer_id));

        let response = self
            .client
            .get(&url)
            .header("X-Api-Key", &self.api_key)
            .send()
            .await?;

        let response = Self::check_status(response, &format!("offer {}", offer_id)).await?;

        response.json().await.map_err(|e| {
            DirectoryError::InvalidResponse(format!("Failed to parse offer: {}", e))
        })
    }

    async fn list_available_offers(
        &self,
        domain: ServiceDomain,
    ) -> Result<Vec<ServiceOffer>, DirectoryError> {
        let url = self.url(&format!("/offers/{}?available=true", domain.as_str()));

        let response = self
            .client
            .get(&url)
            .header("X-Api-Key", &self.api_key)
            .send()
            .await?;

        let response = Self::check_status(response, "offer listing").await?;

        let offers: Vec<ServiceOffer> = response.json().await.map_err(|e| {
            DirectoryError::InvalidResponse(format!("Failed to parse offer list: {}", e))
        })?;

        tracing::debug!(
            domain = domain.as_str(),
            count = offers.len(),
            "Listed available offers"
        );

        Ok(offers)
    }

    async fn confirm_match(
        &self,
        domain: ServiceDomain,
        request_id: Uuid,
        offer_id: Uuid,
    ) -> Result<ConfirmOutcome, DirectoryError> {
        let url = self.url(&format!(
            "/requests/{}/{}/confirm",
            domain.as_str(),
            request_id
        ));

        let response = self
            .client
            .post(&url)
            .header("X-Api-Key", &self.api_key)
            .json(&serde_json::json!({ "offerId": offer_id }))
            .send()
            .await?;

        // 409 is the lost-race signal from the owning side's check-and-set
        if response.status() == StatusCode::CONFLICT {
            tracing::info!(%request_id, %offer_id, "Match confirmation lost the race");
            return Ok(ConfirmOutcome::Conflict);
        }

        Self::check_status(response, &format!("confirm request {}", request_id)).await?;

        tracing::info!(%request_id, %offer_id, "Match confirmed");

        Ok(ConfirmOutcome::Confirmed)
    }
}
