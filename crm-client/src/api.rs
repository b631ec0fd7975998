use async_trait::async_trait;
use reqwest::{Client, Method, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::Serialize;
use shared_types::{
    ActivityWithRefs, ContactForm, ContactListQuery, ContactWithCompany, ContactsResponse,
    DashboardStats, DealForm, DealStage, DealWithDetails, ErrorResponse, MoveDealRequest,
    PipelineBoard, ReorderDealsRequest, StagesResponse, SuccessResponse, Validate,
    ValidationErrors,
};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ClientError {
    #[error("Request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Not signed in")]
    Unauthorized,

    #[error("Not found")]
    NotFound,

    /// Rejected before sending, or answered with 422 by the server.
    #[error(transparent)]
    Validation(#[from] ValidationErrors),

    #[error("Server answered {status}: {}", .body.error)]
    Api { status: u16, body: ErrorResponse },
}

/// Persists a deal move. The board controller only needs this one call, so tests can
/// swap the HTTP client for an in-process fake.
#[async_trait]
pub trait DealMover: Send + Sync {
    async fn move_deal(&self, request: &MoveDealRequest) -> Result<DealWithDetails, ClientError>;
}

#[derive(Debug, Clone)]
pub struct ApiClient {
    base_url: String,
    token: Option<String>,
    client: Client,
}

impl ApiClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        let base_url: String = base_url.into();
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            token: None,
            client: Client::new(),
        }
    }

    /// Sends `token` as a bearer credential on every request.
    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let builder = self
            .client
            .request(method, format!("{}{}", self.base_url, path));
        match &self.token {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        }
    }

    async fn read<T: DeserializeOwned>(response: Response) -> Result<T, ClientError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response.json::<T>().await?);
        }

        match status {
            StatusCode::UNAUTHORIZED => Err(ClientError::Unauthorized),
            StatusCode::NOT_FOUND => Err(ClientError::NotFound),
            _ => {
                let text = response.text().await?;
                let body = serde_json::from_str::<ErrorResponse>(&text)
                    .unwrap_or_else(|_| ErrorResponse::new(text));

                match (status, body.fields) {
                    (StatusCode::UNPROCESSABLE_ENTITY, Some(fields)) => {
                        Err(ClientError::Validation(ValidationErrors { fields }))
                    }
                    (_, fields) => Err(ClientError::Api {
                        status: status.as_u16(),
                        body: ErrorResponse {
                            error: body.error,
                            fields,
                        },
                    }),
                }
            }
        }
    }

    async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T, ClientError> {
        let response = self.request(Method::GET, path).send().await?;
        Self::read(response).await
    }

    async fn send_json<B: Serialize + ?Sized, T: DeserializeOwned>(
        &self,
        method: Method,
        path: &str,
        body: &B,
    ) -> Result<T, ClientError> {
        let response = self.request(method, path).json(body).send().await?;
        Self::read(response).await
    }

    pub async fn list_contacts(
        &self,
        query: &ContactListQuery,
    ) -> Result<ContactsResponse, ClientError> {
        let response = self
            .request(Method::GET, "/api/contacts")
            .query(query)
            .send()
            .await?;
        Self::read(response).await
    }

    /// Checks the form locally first; an invalid form never reaches the server.
    pub async fn create_contact(&self, form: &ContactForm) -> Result<ContactWithCompany, ClientError> {
        form.validate()?;
        self.send_json(Method::POST, "/api/contacts", form).await
    }

    pub async fn create_deal(&self, form: &DealForm) -> Result<DealWithDetails, ClientError> {
        form.validate()?;
        self.send_json(Method::POST, "/api/deals", form).await
    }

    pub async fn delete_deal(&self, deal_id: &str) -> Result<(), ClientError> {
        let response = self
            .request(Method::DELETE, &format!("/api/deals/{}", deal_id))
            .send()
            .await?;
        Self::read::<SuccessResponse>(response).await?;
        Ok(())
    }

    pub async fn get_board(&self) -> Result<PipelineBoard, ClientError> {
        self.get("/api/deals/board").await
    }

    pub async fn reorder_deals(&self, request: &ReorderDealsRequest) -> Result<(), ClientError> {
        self.send_json::<_, SuccessResponse>(Method::POST, "/api/deals/reorder", request)
            .await?;
        Ok(())
    }

    pub async fn list_stages(&self) -> Result<Vec<DealStage>, ClientError> {
        let response: StagesResponse = self.get("/api/stages").await?;
        Ok(response.stages)
    }

    pub async fn toggle_activity(&self, activity_id: &str) -> Result<ActivityWithRefs, ClientError> {
        let response = self
            .request(
                Method::POST,
                &format!("/api/activities/{}/toggle", activity_id),
            )
            .send()
            .await?;
        Self::read(response).await
    }

    pub async fn dashboard_stats(&self) -> Result<DashboardStats, ClientError> {
        self.get("/api/dashboard").await
    }
}

#[async_trait]
impl DealMover for ApiClient {
    async fn move_deal(&self, request: &MoveDealRequest) -> Result<DealWithDetails, ClientError> {
        tracing::debug!(
            "Moving deal {} to stage {} at {}",
            request.deal_id,
            request.stage_id,
            request.position
        );
        self.send_json(Method::POST, "/api/deals/move", request).await
    }
}
