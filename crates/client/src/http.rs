use std::time::Duration;

use async_trait::async_trait;
use gestibank_core::config::ApiConfig;
use gestibank_core::domain::{Demand, DemandId, Quote, QuoteId, User, UserId};
use gestibank_core::statistics::{DemandStatistics, ProviderStatistics, TechnicianStatistics};
use reqwest::multipart::{Form, Part};
use reqwest::{Client, Method, RequestBuilder, Response};
use secrecy::{ExposeSecret, SecretString};
use serde::de::DeserializeOwned;
use tracing::{debug, warn};

use crate::backend::{Page, ProcurementBackend};
use crate::dto::{
    DemandUpdateRequest, DemandValidateRequest, ErrorBody, FileUpload, LoginRequest, NewDemand,
    PurchaseOrderUpload, QuoteCreateRequest, QuoteResponse, QuoteUpdateRequest,
    QuoteValidateRequest, TokenResponse, UserRegisterRequest,
};
use crate::error::BackendError;

/// reqwest implementation of [`ProcurementBackend`].
#[derive(Clone, Debug)]
pub struct HttpBackend {
    client: Client,
    base_url: String,
    token: Option<SecretString>,
}

impl HttpBackend {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, BackendError> {
        let client = Client::builder().timeout(timeout).build()?;
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Ok(Self { client, base_url, token: None })
    }

    pub fn from_config(api: &ApiConfig) -> Result<Self, BackendError> {
        Self::new(api.base_url.clone(), Duration::from_secs(api.timeout_secs))
    }

    pub fn with_token(mut self, token: SecretString) -> Self {
        self.token = Some(token);
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let url = format!("{}{}", self.base_url, path);
        debug!(event_name = "backend.http.request", method = %method, path, "sending backend request");
        let builder = self.client.request(method, url);
        match &self.token {
            Some(token) => builder.bearer_auth(token.expose_secret()),
            None => builder,
        }
    }

    async fn send_json<T: DeserializeOwned>(&self, builder: RequestBuilder) -> Result<T, BackendError> {
        let response = check_status(builder.send().await?).await?;
        response.json::<T>().await.map_err(|error| BackendError::Decode(error.to_string()))
    }

    async fn send_quote(&self, builder: RequestBuilder) -> Result<Quote, BackendError> {
        let response: QuoteResponse = self.send_json(builder).await?;
        Quote::try_from(response)
    }

    async fn send_quotes(&self, builder: RequestBuilder) -> Result<Vec<Quote>, BackendError> {
        let responses: Vec<QuoteResponse> = self.send_json(builder).await?;
        responses.into_iter().map(Quote::try_from).collect()
    }
}

async fn check_status(response: Response) -> Result<Response, BackendError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    let message = serde_json::from_str::<ErrorBody>(&body)
        .ok()
        .and_then(|error| error.message.or(error.description))
        .filter(|message| !message.trim().is_empty())
        .or_else(|| Some(body.trim().to_string()).filter(|body| !body.is_empty()))
        .unwrap_or_else(|| status.canonical_reason().unwrap_or("request failed").to_string());

    warn!(
        event_name = "backend.http.error_status",
        status = status.as_u16(),
        message = %message,
        "backend rejected request"
    );
    Err(BackendError::Status { status: status.as_u16(), message })
}

fn file_part(file: &FileUpload) -> Result<Part, BackendError> {
    Part::bytes(file.bytes.clone())
        .file_name(file.file_name.clone())
        .mime_str(&file.content_type)
        .map_err(BackendError::Transport)
}

#[async_trait]
impl ProcurementBackend for HttpBackend {
    async fn login(&self, request: &LoginRequest) -> Result<String, BackendError> {
        let builder = self.client.post(format!("{}/auth/login", self.base_url)).json(request);
        let response: TokenResponse = self.send_json(builder).await?;
        Ok(response.token)
    }

    async fn my_profile(&self) -> Result<User, BackendError> {
        self.send_json(self.request(Method::GET, "/users/my_profile")).await
    }

    async fn list_users(&self) -> Result<Vec<User>, BackendError> {
        self.send_json(self.request(Method::GET, "/users")).await
    }

    async fn register_user(&self, request: &UserRegisterRequest) -> Result<User, BackendError> {
        self.send_json(self.request(Method::POST, "/auth/register").json(request)).await
    }

    async fn delete_user(&self, id: UserId) -> Result<(), BackendError> {
        let builder = self.request(Method::DELETE, &format!("/users/{}", id.0));
        check_status(builder.send().await?).await?;
        Ok(())
    }

    async fn list_demands(&self, page: Page) -> Result<Vec<Demand>, BackendError> {
        let builder = self
            .request(Method::GET, "/demands")
            .query(&[("page", page.page), ("size", page.size)]);
        self.send_json(builder).await
    }

    async fn get_demand(&self, id: DemandId) -> Result<Demand, BackendError> {
        self.send_json(self.request(Method::GET, &format!("/demands/{id}"))).await
    }

    async fn create_demand(&self, request: &NewDemand) -> Result<Demand, BackendError> {
        let mut form = Form::new();
        for (name, value) in request.form_fields() {
            form = form.text(name, value);
        }
        if let Some(file) = &request.attachment {
            form = form.part("attachedFile", file_part(file)?);
        }
        self.send_json(self.request(Method::POST, "/demands").multipart(form)).await
    }

    async fn update_demand(&self, request: &DemandUpdateRequest) -> Result<Demand, BackendError> {
        self.send_json(self.request(Method::PUT, "/demands").json(request)).await
    }

    async fn validate_demand(
        &self,
        request: &DemandValidateRequest,
    ) -> Result<Demand, BackendError> {
        self.send_json(self.request(Method::POST, "/demands/validate").json(request)).await
    }

    async fn list_quotes(&self, page: Page) -> Result<Vec<Quote>, BackendError> {
        let builder = self
            .request(Method::GET, "/quotes")
            .query(&[("page", page.page), ("size", page.size)]);
        self.send_quotes(builder).await
    }

    async fn get_quote(&self, id: QuoteId) -> Result<Quote, BackendError> {
        self.send_quote(self.request(Method::GET, &format!("/quotes/{id}"))).await
    }

    async fn create_quote(&self, request: &QuoteCreateRequest) -> Result<Quote, BackendError> {
        self.send_quote(self.request(Method::POST, "/quotes").json(request)).await
    }

    async fn update_quote(&self, request: &QuoteUpdateRequest) -> Result<Quote, BackendError> {
        self.send_quote(self.request(Method::PUT, "/quotes").json(request)).await
    }

    async fn validate_quote(&self, request: &QuoteValidateRequest) -> Result<Quote, BackendError> {
        self.send_quote(self.request(Method::POST, "/quotes/validate").json(request)).await
    }

    async fn attach_purchase_order(
        &self,
        upload: &PurchaseOrderUpload,
    ) -> Result<Quote, BackendError> {
        let form = Form::new()
            .text("quoteId", upload.quote_id.to_string())
            .part("attachedFile", file_part(&upload.file)?);
        self.send_quote(self.request(Method::PUT, "/quotes/manage").multipart(form)).await
    }

    async fn demand_statistics(&self) -> Result<DemandStatistics, BackendError> {
        self.send_json(self.request(Method::GET, "/statistics/demands")).await
    }

    async fn technician_statistics(&self) -> Result<TechnicianStatistics, BackendError> {
        self.send_json(self.request(Method::GET, "/statistics/technician")).await
    }

    async fn provider_statistics(&self) -> Result<ProviderStatistics, BackendError> {
        self.send_json(self.request(Method::GET, "/statistics/provider")).await
    }
}
