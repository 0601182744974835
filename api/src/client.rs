//! Festa backend client implementation

use festa_detail::gateway::{
    FestivalGateway, GatewayError, GatewayFuture, ParticipationGateway, ProfileGateway,
    ReviewGateway,
};
use festa_detail::types::{
    AccountId, AuthorProfile, Festival, FestivalId, NewReview, Review, ReviewId,
};
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::Value;

/// Environment variable holding the backend base URL
const ENV_API_URL: &str = "FESTA_API_URL";

/// Environment variable holding the optional bearer token
const ENV_API_TOKEN: &str = "FESTA_API_TOKEN";

/// Account row as the backend returns it from `/accounts/search`
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AccountRow {
    id: i64,
    full_name: String,
    #[serde(default)]
    avatar_url: Option<String>,
}

impl From<AccountRow> for AuthorProfile {
    fn from(row: AccountRow) -> Self {
        Self {
            account_id: AccountId::new(row.id),
            display_name: row.full_name,
            avatar_url: row.avatar_url,
        }
    }
}

/// Festa backend API client
#[derive(Clone)]
pub struct ApiClient {
    client: Client,
    base_url: String,
    token: Option<String>,
}

impl ApiClient {
    /// Create a new client with the given base URL
    #[must_use]
    pub fn new(base_url: impl Into<String>) -> Self {
        let mut base_url = base_url.into();
        while base_url.ends_with('/') {
            base_url.pop();
        }
        Self {
            client: Client::new(),
            base_url,
            token: None,
        }
    }

    /// Create a client from `FESTA_API_URL` / `FESTA_API_TOKEN`
    ///
    /// # Errors
    ///
    /// Returns `GatewayError::Network` if `FESTA_API_URL` is not set.
    pub fn from_env() -> Result<Self, GatewayError> {
        let base_url = std::env::var(ENV_API_URL)
            .map_err(|_| GatewayError::Network(format!("{ENV_API_URL} is not set")))?;
        let mut client = Self::new(base_url);
        client.token = std::env::var(ENV_API_TOKEN).ok();
        Ok(client)
    }

    /// Attach a bearer token to every request
    #[must_use]
    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    fn request(&self, method: reqwest::Method, path: &str) -> reqwest::RequestBuilder {
        let mut builder = self
            .client
            .request(method, format!("{}{path}", self.base_url));
        if let Some(token) = &self.token {
            builder = builder.bearer_auth(token);
        }
        builder
    }

    /// Run a request and decode the body into `T`, unwrapping the
    /// `{ data, success, message }` envelope if present.
    async fn execute<T: DeserializeOwned>(
        builder: reqwest::RequestBuilder,
    ) -> Result<T, GatewayError> {
        let value = Self::execute_raw(builder).await?;
        extract_payload(value)
    }

    /// Run a request whose payload the caller does not need
    async fn execute_unit(builder: reqwest::RequestBuilder) -> Result<(), GatewayError> {
        let value = Self::execute_raw(builder).await?;
        reject_soft_failure(&value)
    }

    /// Run a request and return the raw JSON body (`Null` for empty bodies)
    async fn execute_raw(builder: reqwest::RequestBuilder) -> Result<Value, GatewayError> {
        let response = builder
            .send()
            .await
            .map_err(|e| GatewayError::Network(e.to_string()))?;

        let status = response.status();
        match status {
            StatusCode::NOT_FOUND => Err(GatewayError::NotFound),
            status if !status.is_success() => {
                let message = response.text().await.unwrap_or_default();
                tracing::warn!(status = status.as_u16(), %message, "backend rejected request");
                Err(GatewayError::Api {
                    status: status.as_u16(),
                    message,
                })
            },
            _ => {
                let text = response
                    .text()
                    .await
                    .map_err(|e| GatewayError::Network(e.to_string()))?;
                if text.is_empty() {
                    return Ok(Value::Null);
                }
                serde_json::from_str(&text).map_err(|e| GatewayError::Parse(e.to_string()))
            },
        }
    }
}

/// Fail on an envelope carrying `success: false`
fn reject_soft_failure(value: &Value) -> Result<(), GatewayError> {
    if let Some(obj) = value.as_object() {
        if obj.get("success").and_then(Value::as_bool) == Some(false) {
            let message = obj
                .get("message")
                .and_then(Value::as_str)
                .unwrap_or("request rejected")
                .to_string();
            return Err(GatewayError::Api {
                status: 200,
                message,
            });
        }
    }
    Ok(())
}

/// Decode `data` when the body is enveloped, the body itself otherwise
fn extract_payload<T: DeserializeOwned>(value: Value) -> Result<T, GatewayError> {
    reject_soft_failure(&value)?;

    if let Some(obj) = value.as_object() {
        if let Some(data) = obj.get("data") {
            if !data.is_null() {
                return serde_json::from_value(data.clone())
                    .map_err(|e| GatewayError::Parse(e.to_string()));
            }
        }
    }

    serde_json::from_value(value).map_err(|e| GatewayError::Parse(e.to_string()))
}

impl FestivalGateway for ApiClient {
    fn fetch_festival(&self, festival_id: FestivalId) -> GatewayFuture<Festival> {
        let builder = self.request(
            reqwest::Method::GET,
            &format!("/festivals/{festival_id}"),
        );
        Box::pin(async move { Self::execute(builder).await })
    }
}

impl ParticipationGateway for ApiClient {
    fn fetch_participation(
        &self,
        festival_id: FestivalId,
        account_id: AccountId,
    ) -> GatewayFuture<bool> {
        let builder = self
            .request(reqwest::Method::GET, "/festivalparticipants/search")
            .query(&[
                ("festivalId", festival_id.get()),
                ("accountId", account_id.get()),
            ]);
        Box::pin(async move {
            // The backend answers either with the matching participant rows
            // or with a plain boolean, depending on the deployment.
            let mut value = Self::execute_raw(builder).await?;
            reject_soft_failure(&value)?;
            if let Some(obj) = value.as_object_mut() {
                if let Some(data) = obj.remove("data") {
                    value = data;
                }
            }
            let participating = match value {
                Value::Array(rows) => !rows.is_empty(),
                Value::Bool(flag) => flag,
                Value::Null => false,
                // A lone participant row
                Value::Object(_) => true,
                other => {
                    return Err(GatewayError::Parse(format!(
                        "unexpected participation payload: {other}"
                    )));
                },
            };
            Ok(participating)
        })
    }

    fn create_participation(
        &self,
        festival_id: FestivalId,
        account_id: AccountId,
    ) -> GatewayFuture<()> {
        let builder = self
            .request(reqwest::Method::POST, "/festivalparticipants/create")
            .json(&serde_json::json!({
                "festivalId": festival_id.get(),
                "accountId": account_id.get(),
            }));
        Box::pin(async move { Self::execute_unit(builder).await })
    }

    fn delete_participation(
        &self,
        festival_id: FestivalId,
        account_id: AccountId,
    ) -> GatewayFuture<()> {
        let builder = self
            .request(reqwest::Method::DELETE, "/festivalparticipants/delete")
            .query(&[
                ("festivalId", festival_id.get()),
                ("accountId", account_id.get()),
            ]);
        Box::pin(async move { Self::execute_unit(builder).await })
    }
}

impl ReviewGateway for ApiClient {
    fn fetch_reviews(&self, festival_id: FestivalId) -> GatewayFuture<Vec<Review>> {
        let builder = self
            .request(reqwest::Method::GET, "/reviews/search")
            .query(&[("festivalId", festival_id.get())]);
        Box::pin(async move { Self::execute(builder).await })
    }

    fn create_review(&self, review: NewReview) -> GatewayFuture<Review> {
        let builder = self
            .request(reqwest::Method::POST, "/reviews/create")
            .json(&review);
        Box::pin(async move { Self::execute(builder).await })
    }

    fn update_review(
        &self,
        review_id: ReviewId,
        rating: u8,
        comment: String,
    ) -> GatewayFuture<Review> {
        // The update endpoint takes its fields as query parameters.
        let builder = self
            .request(reqwest::Method::PUT, "/reviews/update")
            .query(&[
                ("reviewId", review_id.get().to_string()),
                ("rating", rating.to_string()),
                ("comment", comment),
            ]);
        Box::pin(async move { Self::execute(builder).await })
    }

    fn delete_review(&self, review_id: ReviewId) -> GatewayFuture<()> {
        let builder = self
            .request(reqwest::Method::DELETE, "/reviews/delete")
            .query(&[("reviewId", review_id.get())]);
        Box::pin(async move { Self::execute_unit(builder).await })
    }
}

impl ProfileGateway for ApiClient {
    fn fetch_author_profile(&self, account_id: AccountId) -> GatewayFuture<AuthorProfile> {
        let builder = self
            .request(reqwest::Method::GET, "/accounts/search")
            .query(&[("id", account_id.get())]);
        Box::pin(async move {
            let rows: Vec<AccountRow> = Self::execute(builder).await?;
            rows.into_iter()
                .next()
                .map(AuthorProfile::from)
                .ok_or(GatewayError::NotFound)
        })
    }
}
