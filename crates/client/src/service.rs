use gestibank_core::domain::{
    Demand, DemandDraft, DemandId, DemandStatus, Quote, QuoteId, QuoteStatus, Role, User, UserId,
};
use gestibank_core::flows::{
    initial_demand_status, DemandAction, DemandCommand, DemandEngine, EntityKind, QuoteAction,
    QuoteCommand, QuoteEngine, TransitionOutcome, WorkflowEffect, WorkflowError,
};
use gestibank_core::inbox::{inbox, InboxItem};
use gestibank_core::statistics::{DemandStatistics, ProviderStatistics, TechnicianStatistics};
use gestibank_core::visibility::{visible_demands, visible_quotes};
use rust_decimal::Decimal;
use serde::Serialize;
use tracing::{error, info, warn};
use validator::Validate;

use crate::backend::{Page, ProcurementBackend};
use crate::dto::{
    CommentRequest, DemandUpdateRequest, DemandValidateRequest, FileUpload, NewDemand,
    PurchaseOrderUpload, QuoteCreateRequest, QuoteUpdateRequest, QuoteValidateRequest,
    UserRegisterRequest,
};
use crate::error::{BackendError, ServiceError};
use crate::session::Session;

const DEFAULT_PAGE_SIZE: u32 = 50;

/// Result of a demand command. Opening a quote leaves the demand as it was
/// and yields the new quote instead.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DemandMutation {
    Demand(Demand),
    QuoteOpened(Quote),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "scope", rename_all = "snake_case")]
pub enum Statistics {
    Demands(DemandStatistics),
    Technician(TechnicianStatistics),
    Provider(ProviderStatistics),
}

/// Role-aware front door to the backend for one session.
pub struct WorkflowService<B> {
    backend: B,
    session: Session,
    page_size: u32,
    demands: DemandEngine,
    quotes: QuoteEngine,
}

impl<B> WorkflowService<B>
where
    B: ProcurementBackend,
{
    pub fn new(backend: B, session: Session) -> Self {
        Self {
            backend,
            session,
            page_size: DEFAULT_PAGE_SIZE,
            demands: DemandEngine::default(),
            quotes: QuoteEngine::default(),
        }
    }

    pub fn with_page_size(mut self, page_size: u32) -> Self {
        self.page_size = page_size.max(1);
        self
    }

    pub fn page_size(&self) -> u32 {
        self.page_size
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub async fn visible_demands(&self, page: Page) -> Result<Vec<Demand>, ServiceError> {
        if matches!(self.session.role, Role::Manager | Role::Admin) {
            return Ok(Vec::new());
        }
        let demands = self.backend.list_demands(page).await?;
        let viewer = self.session.viewer();
        Ok(visible_demands(&viewer, &demands).into_iter().cloned().collect())
    }

    pub async fn visible_quotes(&self, page: Page) -> Result<Vec<Quote>, ServiceError> {
        if !matches!(self.session.role, Role::Technician | Role::Provider | Role::Manager) {
            return Ok(Vec::new());
        }
        let quotes = self.backend.list_quotes(page).await?;
        let viewer = self.session.viewer();
        Ok(visible_quotes(&viewer, &quotes).into_iter().cloned().collect())
    }

    pub async fn demand(&self, id: DemandId) -> Result<Demand, ServiceError> {
        let demand = self.latest_demand(id).await?;
        if !self.session.viewer().sees_demand(&demand) {
            return Err(ServiceError::NotFound { entity: EntityKind::Demand, id: id.0 });
        }
        Ok(demand)
    }

    pub async fn quote(&self, id: QuoteId) -> Result<Quote, ServiceError> {
        let quote = self.latest_quote(id).await?;
        if !self.session.viewer().sees_quote(&quote) {
            return Err(ServiceError::NotFound { entity: EntityKind::Quote, id: id.0 });
        }
        Ok(quote)
    }

    /// Demand the caller is about to act on. With an observed status the
    /// latest record is read without the role view, so a demand that moved
    /// on is reported as stale instead of missing.
    pub async fn demand_snapshot(
        &self,
        id: DemandId,
        observed: Option<DemandStatus>,
    ) -> Result<Demand, ServiceError> {
        let Some(status) = observed else {
            return self.demand(id).await;
        };
        let mut demand = self.latest_demand(id).await?;
        demand.status = status;
        Ok(demand)
    }

    pub async fn quote_snapshot(
        &self,
        id: QuoteId,
        observed: Option<QuoteStatus>,
    ) -> Result<Quote, ServiceError> {
        let Some(status) = observed else {
            return self.quote(id).await;
        };
        let mut quote = self.latest_quote(id).await?;
        quote.status = status;
        Ok(quote)
    }

    pub async fn create_demand(
        &self,
        draft: DemandDraft,
        attachment: Option<FileUpload>,
    ) -> Result<Demand, ServiceError> {
        let starts_in = initial_demand_status(self.session.role).map_err(|error| {
            self.log_refusal(EntityKind::Demand, &error);
            error
        })?;
        draft.check().map_err(|violation| WorkflowError::InvalidDraft {
            field: violation.field,
            reason: violation.reason.to_string(),
        })?;

        let demand = self
            .mutate(EntityKind::Demand, "create", self.backend.create_demand(&NewDemand { draft, attachment }))
            .await?;
        info!(
            event_name = "workflow.demand.created",
            demand_id = demand.id.0,
            role = %self.session.role,
            expected_status = %starts_in,
            status = %demand.status,
            "demand created"
        );
        Ok(demand)
    }

    pub async fn approve_demand(
        &self,
        snapshot: &Demand,
        note: Option<String>,
    ) -> Result<DemandMutation, ServiceError> {
        self.execute_demand(snapshot, DemandCommand::Approve { note }).await
    }

    pub async fn reject_demand(
        &self,
        snapshot: &Demand,
        reason: impl Into<String>,
    ) -> Result<DemandMutation, ServiceError> {
        self.execute_demand(snapshot, DemandCommand::Reject { reason: reason.into() }).await
    }

    pub async fn resubmit_demand(
        &self,
        snapshot: &Demand,
        draft: DemandDraft,
    ) -> Result<DemandMutation, ServiceError> {
        self.execute_demand(snapshot, DemandCommand::Resubmit { draft }).await
    }

    pub async fn create_quote(
        &self,
        snapshot: &Demand,
        total_amount: Decimal,
    ) -> Result<Quote, ServiceError> {
        match self.execute_demand(snapshot, DemandCommand::CreateQuote { total_amount }).await? {
            DemandMutation::QuoteOpened(quote) => Ok(quote),
            DemandMutation::Demand(_) => Err(ServiceError::Validation(
                "create quote did not open a quote".to_string(),
            )),
        }
    }

    /// Validates `command` against the caller's snapshot, re-reads the demand,
    /// then issues the single mutation the transition calls for.
    pub async fn execute_demand(
        &self,
        snapshot: &Demand,
        command: DemandCommand,
    ) -> Result<DemandMutation, ServiceError> {
        let role = self.session.role;
        self.demands
            .apply(role, snapshot.status, &command)
            .map_err(|error| self.refused(EntityKind::Demand, error))?;

        let latest = self.latest_demand(snapshot.id).await?;
        let outcome = self
            .demands
            .apply_fresh(role, snapshot.status, latest.status, &command)
            .map_err(|error| self.refused(EntityKind::Demand, error))?;

        let mutation = match primary_effect(&outcome)? {
            WorkflowEffect::RecordComment { comment } => {
                let request = DemandValidateRequest {
                    demand_status: comment.kind,
                    comment: CommentRequest::new(comment.clone(), snapshot.id, None),
                };
                let demand = self
                    .mutate(EntityKind::Demand, "validate", self.backend.validate_demand(&request))
                    .await?;
                DemandMutation::Demand(demand)
            }
            WorkflowEffect::ReviseDemand { draft } => {
                let request = DemandUpdateRequest::new(snapshot.id, draft.clone());
                let demand = self
                    .mutate(EntityKind::Demand, "update", self.backend.update_demand(&request))
                    .await?;
                DemandMutation::Demand(demand)
            }
            WorkflowEffect::OpenQuote { total_amount } => {
                let request =
                    QuoteCreateRequest { total_amount: *total_amount, demand_id: snapshot.id };
                let quote = self
                    .mutate(EntityKind::Quote, "create", self.backend.create_quote(&request))
                    .await?;
                DemandMutation::QuoteOpened(quote)
            }
            other => return Err(unexpected_effect(EntityKind::Demand, other)),
        };

        log_applied(EntityKind::Demand, snapshot.id.0, role, &outcome);
        Ok(mutation)
    }

    pub async fn approve_quote(
        &self,
        snapshot: &Quote,
        note: Option<String>,
    ) -> Result<Quote, ServiceError> {
        self.execute_quote(snapshot, QuoteCommand::Approve { note }, None).await
    }

    pub async fn reject_quote(
        &self,
        snapshot: &Quote,
        reason: impl Into<String>,
    ) -> Result<Quote, ServiceError> {
        self.execute_quote(snapshot, QuoteCommand::Reject { reason: reason.into() }, None).await
    }

    pub async fn resubmit_quote(
        &self,
        snapshot: &Quote,
        total_amount: Decimal,
    ) -> Result<Quote, ServiceError> {
        self.execute_quote(snapshot, QuoteCommand::Resubmit { total_amount }, None).await
    }

    pub async fn attach_purchase_order(
        &self,
        snapshot: &Quote,
        file: FileUpload,
    ) -> Result<Quote, ServiceError> {
        let command = QuoteCommand::AttachPurchaseOrder { file_name: file.file_name.clone() };
        self.execute_quote(snapshot, command, Some(file)).await
    }

    async fn execute_quote(
        &self,
        snapshot: &Quote,
        command: QuoteCommand,
        file: Option<FileUpload>,
    ) -> Result<Quote, ServiceError> {
        let role = self.session.role;
        self.quotes
            .apply(role, snapshot.status, &command)
            .map_err(|error| self.refused(EntityKind::Quote, error))?;

        let latest = self.latest_quote(snapshot.id).await?;
        let outcome = self
            .quotes
            .apply_fresh(role, snapshot.status, latest.status, &command)
            .map_err(|error| self.refused(EntityKind::Quote, error))?;

        let quote = match primary_effect(&outcome)? {
            WorkflowEffect::RecordComment { comment } => {
                let request = QuoteValidateRequest {
                    quote_status: comment.kind,
                    comment: CommentRequest::new(
                        comment.clone(),
                        snapshot.demand_id,
                        Some(snapshot.id),
                    ),
                };
                self.mutate(EntityKind::Quote, "validate", self.backend.validate_quote(&request))
                    .await?
            }
            WorkflowEffect::ReviseQuoteAmount { total_amount } => {
                let request = QuoteUpdateRequest { id: snapshot.id, total_amount: *total_amount };
                self.mutate(EntityKind::Quote, "update", self.backend.update_quote(&request))
                    .await?
            }
            WorkflowEffect::AttachPurchaseOrder { file_name } => {
                let Some(mut file) = file else {
                    return Err(WorkflowError::MissingAttachment.into());
                };
                file.file_name = file_name.clone();
                let upload = PurchaseOrderUpload { quote_id: snapshot.id, file };
                self.mutate(
                    EntityKind::Quote,
                    "attach_purchase_order",
                    self.backend.attach_purchase_order(&upload),
                )
                .await?
            }
            other => return Err(unexpected_effect(EntityKind::Quote, other)),
        };

        log_applied(EntityKind::Quote, snapshot.id.0, role, &outcome);
        Ok(quote)
    }

    pub fn can_act_on_demand(&self, demand: &Demand, action: DemandAction) -> bool {
        self.demands.can_transition(self.session.role, demand.status, action)
    }

    pub fn can_act_on_quote(&self, quote: &Quote, action: QuoteAction) -> bool {
        self.quotes.can_transition(self.session.role, quote.status, action)
    }

    /// Actions the session's role may take on `demand` in its current status.
    pub fn demand_actions(&self, demand: &Demand) -> Vec<DemandAction> {
        DemandAction::ALL
            .into_iter()
            .filter(|action| self.can_act_on_demand(demand, *action))
            .collect()
    }

    pub fn quote_actions(&self, quote: &Quote) -> Vec<QuoteAction> {
        QuoteAction::ALL
            .into_iter()
            .filter(|action| self.can_act_on_quote(quote, *action))
            .collect()
    }

    pub async fn users(&self) -> Result<Vec<User>, ServiceError> {
        self.require_admin("list users")?;
        Ok(self.backend.list_users().await?)
    }

    pub async fn register_user(&self, request: UserRegisterRequest) -> Result<User, ServiceError> {
        self.require_admin("register users")?;
        request.validate().map_err(|errors| ServiceError::Validation(errors.to_string()))?;

        let user = self
            .mutate_user("register", self.backend.register_user(&request))
            .await?;
        info!(
            event_name = "workflow.user.registered",
            user_id = user.id.0,
            role = %user.role,
            "user registered"
        );
        Ok(user)
    }

    pub async fn delete_user(&self, id: UserId) -> Result<(), ServiceError> {
        self.require_admin("delete users")?;
        self.mutate_user("delete", self.backend.delete_user(id)).await?;
        info!(event_name = "workflow.user.deleted", user_id = id.0, "user deleted");
        Ok(())
    }

    /// Dashboard counters from the backend for the session's role.
    pub async fn statistics(&self) -> Result<Statistics, ServiceError> {
        match self.session.role {
            Role::Agent | Role::Responsible => {
                Ok(Statistics::Demands(self.backend.demand_statistics().await?))
            }
            Role::Technician => {
                Ok(Statistics::Technician(self.backend.technician_statistics().await?))
            }
            Role::Provider => Ok(Statistics::Provider(self.backend.provider_statistics().await?)),
            role => Err(ServiceError::Forbidden { role, operation: "view statistics" }),
        }
    }

    /// Same counters, computed from the first page of visible entities.
    pub async fn local_statistics(&self) -> Result<Statistics, ServiceError> {
        let page = Page::first(self.page_size);
        match self.session.role {
            Role::Agent | Role::Responsible => {
                let demands = self.visible_demands(page).await?;
                Ok(Statistics::Demands(DemandStatistics::from_demands(&demands)))
            }
            Role::Technician => {
                let demands = self.backend.list_demands(page).await?;
                Ok(Statistics::Technician(TechnicianStatistics::from_demands(&demands)))
            }
            Role::Provider => {
                let quotes = self.visible_quotes(page).await?;
                Ok(Statistics::Provider(ProviderStatistics::from_quotes(&quotes)))
            }
            role => Err(ServiceError::Forbidden { role, operation: "view statistics" }),
        }
    }

    pub async fn inbox(&self) -> Result<Vec<InboxItem>, ServiceError> {
        let page = Page::first(self.page_size);
        let demands = self.visible_demands(page).await?;
        let quotes = self.visible_quotes(page).await?;
        Ok(inbox(&self.session.viewer(), &demands, &quotes))
    }

    fn require_admin(&self, operation: &'static str) -> Result<(), ServiceError> {
        if self.session.viewer().manages_users() {
            return Ok(());
        }
        warn!(
            event_name = "workflow.user.forbidden",
            role = %self.session.role,
            operation,
            "user management refused"
        );
        Err(ServiceError::Forbidden { role: self.session.role, operation })
    }

    // Agents and responsibles may read a demand directly; other roles only
    // reach demands through the list endpoint.
    async fn latest_demand(&self, id: DemandId) -> Result<Demand, ServiceError> {
        if matches!(self.session.role, Role::Agent | Role::Responsible) {
            return Ok(self.backend.get_demand(id).await?);
        }

        let mut page = Page::first(self.page_size);
        loop {
            let demands = self.backend.list_demands(page).await?;
            let exhausted = demands.len() < page.size as usize;
            if let Some(demand) = demands.into_iter().find(|demand| demand.id == id) {
                return Ok(demand);
            }
            if exhausted {
                return Err(ServiceError::NotFound { entity: EntityKind::Demand, id: id.0 });
            }
            page = page.next();
        }
    }

    async fn latest_quote(&self, id: QuoteId) -> Result<Quote, ServiceError> {
        if matches!(self.session.role, Role::Technician | Role::Provider) {
            return Ok(self.backend.get_quote(id).await?);
        }

        let mut page = Page::first(self.page_size);
        loop {
            let quotes = self.backend.list_quotes(page).await?;
            let exhausted = quotes.len() < page.size as usize;
            if let Some(quote) = quotes.into_iter().find(|quote| quote.id == id) {
                return Ok(quote);
            }
            if exhausted {
                return Err(ServiceError::NotFound { entity: EntityKind::Quote, id: id.0 });
            }
            page = page.next();
        }
    }

    async fn mutate<T>(
        &self,
        entity: EntityKind,
        operation: &'static str,
        request: impl std::future::Future<Output = Result<T, BackendError>>,
    ) -> Result<T, ServiceError> {
        request.await.map_err(|failure| {
            error!(
                event_name = "workflow.backend.mutation_failed",
                entity = %entity,
                operation,
                role = %self.session.role,
                error = %failure,
                "backend rejected mutation"
            );
            ServiceError::Backend(failure)
        })
    }

    async fn mutate_user<T>(
        &self,
        operation: &'static str,
        request: impl std::future::Future<Output = Result<T, BackendError>>,
    ) -> Result<T, ServiceError> {
        request.await.map_err(|failure| {
            error!(
                event_name = "workflow.backend.mutation_failed",
                entity = "user",
                operation,
                error = %failure,
                "backend rejected user mutation"
            );
            ServiceError::Backend(failure)
        })
    }

    fn refused(&self, entity: EntityKind, error: WorkflowError) -> ServiceError {
        self.log_refusal(entity, &error);
        ServiceError::Workflow(error)
    }

    fn log_refusal(&self, entity: EntityKind, error: &WorkflowError) {
        let role = self.session.role;
        let kind = error.kind().as_str();
        match (entity, error) {
            (EntityKind::Demand, WorkflowError::StaleState { .. }) => warn!(
                event_name = "workflow.demand.stale_state",
                role = %role,
                error = %error,
                "demand changed since it was read"
            ),
            (EntityKind::Quote, WorkflowError::StaleState { .. }) => warn!(
                event_name = "workflow.quote.stale_state",
                role = %role,
                error = %error,
                "quote changed since it was read"
            ),
            (EntityKind::Demand, _) => warn!(
                event_name = "workflow.demand.transition_rejected",
                role = %role,
                kind,
                error = %error,
                "workflow refused demand transition"
            ),
            (EntityKind::Quote, _) => warn!(
                event_name = "workflow.quote.transition_rejected",
                role = %role,
                kind,
                error = %error,
                "workflow refused quote transition"
            ),
        }
    }
}

fn primary_effect<S, A>(outcome: &TransitionOutcome<S, A>) -> Result<&WorkflowEffect, ServiceError> {
    outcome
        .effects
        .first()
        .ok_or_else(|| ServiceError::Validation("transition produced no mutation".to_string()))
}

fn unexpected_effect(entity: EntityKind, effect: &WorkflowEffect) -> ServiceError {
    ServiceError::Validation(format!("unsupported {entity} effect {effect:?}"))
}

fn log_applied<S, A>(entity: EntityKind, id: i64, role: Role, outcome: &TransitionOutcome<S, A>)
where
    S: std::fmt::Display,
    A: std::fmt::Display,
{
    match entity {
        EntityKind::Demand => info!(
            event_name = "workflow.demand.transition_applied",
            demand_id = id,
            role = %role,
            action = %outcome.action,
            from = %outcome.from,
            to = %outcome.to,
            "demand transition applied"
        ),
        EntityKind::Quote => info!(
            event_name = "workflow.quote.transition_applied",
            quote_id = id,
            role = %role,
            action = %outcome.action,
            from = %outcome.from,
            to = %outcome.to,
            "quote transition applied"
        ),
    }
}
