use async_trait::async_trait;
use gestibank_core::domain::{Demand, DemandId, Quote, QuoteId, User, UserId};
use gestibank_core::statistics::{DemandStatistics, ProviderStatistics, TechnicianStatistics};

use crate::dto::{
    DemandUpdateRequest, DemandValidateRequest, LoginRequest, NewDemand, PurchaseOrderUpload,
    QuoteCreateRequest, QuoteUpdateRequest, QuoteValidateRequest, UserRegisterRequest,
};
use crate::error::BackendError;

/// Zero-based page request, as the backend's list endpoints take it.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Page {
    pub page: u32,
    pub size: u32,
}

impl Page {
    pub fn first(size: u32) -> Self {
        Self { page: 0, size }
    }

    pub fn next(self) -> Self {
        Self { page: self.page + 1, size: self.size }
    }
}

/// The external procurement backend. It owns storage and re-checks every
/// permission; implementations issue one request per call and never retry.
#[async_trait]
pub trait ProcurementBackend: Send + Sync {
    async fn login(&self, request: &LoginRequest) -> Result<String, BackendError>;

    async fn my_profile(&self) -> Result<User, BackendError>;
    async fn list_users(&self) -> Result<Vec<User>, BackendError>;
    async fn register_user(&self, request: &UserRegisterRequest) -> Result<User, BackendError>;
    async fn delete_user(&self, id: UserId) -> Result<(), BackendError>;

    async fn list_demands(&self, page: Page) -> Result<Vec<Demand>, BackendError>;
    async fn get_demand(&self, id: DemandId) -> Result<Demand, BackendError>;
    async fn create_demand(&self, request: &NewDemand) -> Result<Demand, BackendError>;
    async fn update_demand(&self, request: &DemandUpdateRequest) -> Result<Demand, BackendError>;
    async fn validate_demand(&self, request: &DemandValidateRequest)
        -> Result<Demand, BackendError>;

    async fn list_quotes(&self, page: Page) -> Result<Vec<Quote>, BackendError>;
    async fn get_quote(&self, id: QuoteId) -> Result<Quote, BackendError>;
    async fn create_quote(&self, request: &QuoteCreateRequest) -> Result<Quote, BackendError>;
    async fn update_quote(&self, request: &QuoteUpdateRequest) -> Result<Quote, BackendError>;
    async fn validate_quote(&self, request: &QuoteValidateRequest) -> Result<Quote, BackendError>;
    async fn attach_purchase_order(
        &self,
        upload: &PurchaseOrderUpload,
    ) -> Result<Quote, BackendError>;

    async fn demand_statistics(&self) -> Result<DemandStatistics, BackendError>;
    async fn technician_statistics(&self) -> Result<TechnicianStatistics, BackendError>;
    async fn provider_statistics(&self) -> Result<ProviderStatistics, BackendError>;
}
