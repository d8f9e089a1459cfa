use std::fmt;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::comment::CommentDraft;
use crate::domain::demand::DemandStatus;
use crate::domain::quote::QuoteStatus;
use crate::domain::user::Role;
use crate::flows::states::{
    DemandAction, DemandCommand, EntityKind, QuoteAction, QuoteCommand, TransitionOutcome,
    WorkflowEffect,
};

pub const DEFAULT_DEMAND_APPROVAL_NOTE: &str = "Demand approved";
pub const DEFAULT_QUOTE_APPROVAL_NOTE: &str = "Quote approved";

/// One transition table. Permission lookups go through [`Self::target`];
/// payload checks only run once the lookup succeeded.
pub trait WorkflowDefinition {
    type Status: Copy + Eq + fmt::Display;
    type Action: Copy + Eq + fmt::Display;
    type Command;

    fn entity(&self) -> EntityKind;
    fn action_of(&self, command: &Self::Command) -> Self::Action;
    fn target(&self, role: Role, status: Self::Status, action: Self::Action)
        -> Option<Self::Status>;
    fn effects(
        &self,
        command: &Self::Command,
    ) -> Result<(Option<CommentDraft>, Vec<WorkflowEffect>), WorkflowError>;
}

#[derive(Clone, Copy, Debug, Default)]
pub struct DemandFlow;

impl WorkflowDefinition for DemandFlow {
    type Status = DemandStatus;
    type Action = DemandAction;
    type Command = DemandCommand;

    fn entity(&self) -> EntityKind {
        EntityKind::Demand
    }

    fn action_of(&self, command: &DemandCommand) -> DemandAction {
        command.action()
    }

    fn target(&self, role: Role, status: DemandStatus, action: DemandAction) -> Option<DemandStatus> {
        use DemandAction::{Approve, CreateQuote, Reject, Resubmit};
        use DemandStatus::{
            Created, ResponsibleApproved, ResponsibleRejected, TechnicianApproved,
            TechnicianRejected,
        };

        match (status, action, role) {
            (Created, Approve, Role::Responsible) => Some(ResponsibleApproved),
            (Created, Reject, Role::Responsible) => Some(ResponsibleRejected),
            (ResponsibleApproved, Approve, Role::Technician) => Some(TechnicianApproved),
            (ResponsibleApproved, Reject, Role::Technician) => Some(TechnicianRejected),
            (ResponsibleRejected | TechnicianRejected, Resubmit, Role::Agent | Role::Responsible) => {
                Some(Created)
            }
            (TechnicianApproved, CreateQuote, Role::Provider) => Some(TechnicianApproved),
            _ => None,
        }
    }

    fn effects(
        &self,
        command: &DemandCommand,
    ) -> Result<(Option<CommentDraft>, Vec<WorkflowEffect>), WorkflowError> {
        match command {
            DemandCommand::Approve { note } => {
                Ok(record(CommentDraft::approved(approval_note(note, DEFAULT_DEMAND_APPROVAL_NOTE))))
            }
            DemandCommand::Reject { reason } => Ok(record(rejection(reason)?)),
            DemandCommand::Resubmit { draft } => {
                draft.check().map_err(|violation| WorkflowError::InvalidDraft {
                    field: violation.field,
                    reason: violation.reason.to_string(),
                })?;
                Ok((None, vec![WorkflowEffect::ReviseDemand { draft: draft.clone() }]))
            }
            DemandCommand::CreateQuote { total_amount } => {
                let total_amount = positive_amount(*total_amount)?;
                Ok((None, vec![WorkflowEffect::OpenQuote { total_amount }]))
            }
        }
    }
}

#[derive(Clone, Copy, Debug, Default)]
pub struct QuoteFlow;

impl WorkflowDefinition for QuoteFlow {
    type Status = QuoteStatus;
    type Action = QuoteAction;
    type Command = QuoteCommand;

    fn entity(&self) -> EntityKind {
        EntityKind::Quote
    }

    fn action_of(&self, command: &QuoteCommand) -> QuoteAction {
        command.action()
    }

    fn target(&self, role: Role, status: QuoteStatus, action: QuoteAction) -> Option<QuoteStatus> {
        use QuoteAction::{Approve, AttachPurchaseOrder, Reject, Resubmit};
        use QuoteStatus::{Approved, Created, Rejected};

        match (status, action, role) {
            (Created, Approve, Role::Technician) => Some(Approved),
            (Created, Reject, Role::Technician) => Some(Rejected),
            (Rejected, Resubmit, Role::Provider) => Some(Created),
            (Approved, AttachPurchaseOrder, Role::Manager) => Some(Approved),
            _ => None,
        }
    }

    fn effects(
        &self,
        command: &QuoteCommand,
    ) -> Result<(Option<CommentDraft>, Vec<WorkflowEffect>), WorkflowError> {
        match command {
            QuoteCommand::Approve { note } => {
                Ok(record(CommentDraft::approved(approval_note(note, DEFAULT_QUOTE_APPROVAL_NOTE))))
            }
            QuoteCommand::Reject { reason } => Ok(record(rejection(reason)?)),
            QuoteCommand::Resubmit { total_amount } => {
                let total_amount = positive_amount(*total_amount)?;
                Ok((None, vec![WorkflowEffect::ReviseQuoteAmount { total_amount }]))
            }
            QuoteCommand::AttachPurchaseOrder { file_name } => {
                let file_name = file_name.trim();
                if file_name.is_empty() {
                    return Err(WorkflowError::MissingAttachment);
                }
                Ok((
                    None,
                    vec![WorkflowEffect::AttachPurchaseOrder { file_name: file_name.to_string() }],
                ))
            }
        }
    }
}

pub struct WorkflowEngine<F> {
    flow: F,
}

impl<F> WorkflowEngine<F>
where
    F: WorkflowDefinition,
{
    pub fn new(flow: F) -> Self {
        Self { flow }
    }

    pub fn entity(&self) -> EntityKind {
        self.flow.entity()
    }

    pub fn can_transition(&self, role: Role, status: F::Status, action: F::Action) -> bool {
        self.flow.target(role, status, action).is_some()
    }

    pub fn apply(
        &self,
        role: Role,
        status: F::Status,
        command: &F::Command,
    ) -> Result<TransitionOutcome<F::Status, F::Action>, WorkflowError> {
        let action = self.flow.action_of(command);
        let Some(to) = self.flow.target(role, status, action) else {
            return Err(WorkflowError::InvalidTransition {
                entity: self.flow.entity(),
                role,
                status: status.to_string(),
                action: action.to_string(),
            });
        };

        let (comment, effects) = self.flow.effects(command)?;
        Ok(TransitionOutcome { from: status, to, action, comment, effects })
    }

    /// Like [`Self::apply`], but refuses to act on a status the caller no
    /// longer sees as current.
    pub fn apply_fresh(
        &self,
        role: Role,
        observed: F::Status,
        latest: F::Status,
        command: &F::Command,
    ) -> Result<TransitionOutcome<F::Status, F::Action>, WorkflowError> {
        if observed != latest {
            return Err(WorkflowError::StaleState {
                entity: self.flow.entity(),
                observed: observed.to_string(),
                latest: latest.to_string(),
            });
        }
        self.apply(role, latest, command)
    }
}

impl Default for WorkflowEngine<DemandFlow> {
    fn default() -> Self {
        Self::new(DemandFlow)
    }
}

impl Default for WorkflowEngine<QuoteFlow> {
    fn default() -> Self {
        Self::new(QuoteFlow)
    }
}

pub type DemandEngine = WorkflowEngine<DemandFlow>;
pub type QuoteEngine = WorkflowEngine<QuoteFlow>;

/// Status a freshly created demand starts in, by creator role.
pub fn initial_demand_status(role: Role) -> Result<DemandStatus, WorkflowError> {
    match role {
        Role::Agent => Ok(DemandStatus::Created),
        Role::Responsible => Ok(DemandStatus::ResponsibleApproved),
        _ => Err(WorkflowError::InvalidTransition {
            entity: EntityKind::Demand,
            role,
            status: "none".to_string(),
            action: "create".to_string(),
        }),
    }
}

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum WorkflowError {
    #[error("{role} cannot {action} a {entity} in status {status}")]
    InvalidTransition { entity: EntityKind, role: Role, status: String, action: String },
    #[error("a rejection requires a non-empty reason")]
    MissingReason,
    #[error("total amount must be greater than zero, got {amount}")]
    InvalidAmount { amount: Decimal },
    #[error("{entity} moved from {observed} to {latest}; reload before acting")]
    StaleState { entity: EntityKind, observed: String, latest: String },
    #[error("invalid demand: {field} {reason}")]
    InvalidDraft { field: String, reason: String },
    #[error("a purchase order file is required")]
    MissingAttachment,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WorkflowErrorKind {
    InvalidTransition,
    MissingReason,
    InvalidAmount,
    StaleState,
    InvalidDraft,
    MissingAttachment,
}

impl WorkflowErrorKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::InvalidTransition => "invalid_transition",
            Self::MissingReason => "missing_reason",
            Self::InvalidAmount => "invalid_amount",
            Self::StaleState => "stale_state",
            Self::InvalidDraft => "invalid_draft",
            Self::MissingAttachment => "missing_attachment",
        }
    }
}

impl WorkflowError {
    pub fn kind(&self) -> WorkflowErrorKind {
        match self {
            Self::InvalidTransition { .. } => WorkflowErrorKind::InvalidTransition,
            Self::MissingReason => WorkflowErrorKind::MissingReason,
            Self::InvalidAmount { .. } => WorkflowErrorKind::InvalidAmount,
            Self::StaleState { .. } => WorkflowErrorKind::StaleState,
            Self::InvalidDraft { .. } => WorkflowErrorKind::InvalidDraft,
            Self::MissingAttachment => WorkflowErrorKind::MissingAttachment,
        }
    }
}

fn record(comment: CommentDraft) -> (Option<CommentDraft>, Vec<WorkflowEffect>) {
    (Some(comment.clone()), vec![WorkflowEffect::RecordComment { comment }])
}

fn approval_note(note: &Option<String>, default: &str) -> String {
    note.as_deref()
        .map(str::trim)
        .filter(|note| !note.is_empty())
        .unwrap_or(default)
        .to_string()
}

fn rejection(reason: &str) -> Result<CommentDraft, WorkflowError> {
    let reason = reason.trim();
    if reason.is_empty() {
        return Err(WorkflowError::MissingReason);
    }
    Ok(CommentDraft::rejected(reason))
}

fn positive_amount(amount: Decimal) -> Result<Decimal, WorkflowError> {
    if amount <= Decimal::ZERO {
        return Err(WorkflowError::InvalidAmount { amount });
    }
    Ok(amount)
}

#[cfg(test)]
mod tests {
    use rust_decimal::Decimal;

    use crate::domain::comment::{CommentDraft, CommentType};
    use crate::domain::demand::{ArticleDraft, DemandDraft, DemandStatus};
    use crate::domain::quote::QuoteStatus;
    use crate::domain::user::Role;
    use crate::flows::engine::{
        initial_demand_status, DemandEngine, QuoteEngine, WorkflowError, WorkflowErrorKind,
        DEFAULT_QUOTE_APPROVAL_NOTE,
    };
    use crate::flows::states::{
        DemandAction, DemandCommand, QuoteAction, QuoteCommand, WorkflowEffect,
    };

    fn draft() -> DemandDraft {
        DemandDraft {
            title: "Office chairs".to_string(),
            description: "Ergonomic chairs for the Casablanca branch".to_string(),
            articles: vec![ArticleDraft {
                id: None,
                name: "Chair".to_string(),
                description: "Mesh back".to_string(),
                quantity: 12,
            }],
        }
    }

    #[test]
    fn responsible_approves_created_demand() {
        let engine = DemandEngine::default();
        let outcome = engine
            .apply(Role::Responsible, DemandStatus::Created, &DemandCommand::Approve { note: None })
            .expect("created -> responsible approved");

        assert_eq!(outcome.from, DemandStatus::Created);
        assert_eq!(outcome.to, DemandStatus::ResponsibleApproved);
        assert_eq!(outcome.comment.map(|comment| comment.kind), Some(CommentType::Approved));
    }

    #[test]
    fn responsible_rejection_carries_the_reason() {
        let engine = DemandEngine::default();
        let outcome = engine
            .apply(
                Role::Responsible,
                DemandStatus::Created,
                &DemandCommand::Reject { reason: "Budget insuffisant".to_string() },
            )
            .expect("created -> responsible rejected");

        let expected = CommentDraft::rejected("Budget insuffisant");
        assert_eq!(outcome.to, DemandStatus::ResponsibleRejected);
        assert_eq!(outcome.comment, Some(expected.clone()));
        assert_eq!(outcome.effects, vec![WorkflowEffect::RecordComment { comment: expected }]);
    }

    #[test]
    fn agent_cannot_approve() {
        let engine = DemandEngine::default();
        let error = engine
            .apply(Role::Agent, DemandStatus::Created, &DemandCommand::Approve { note: None })
            .expect_err("agents do not approve");

        assert_eq!(error.kind(), WorkflowErrorKind::InvalidTransition);
    }

    #[test]
    fn blank_reason_is_missing_reason_for_the_right_role() {
        let demands = DemandEngine::default();
        let error = demands
            .apply(
                Role::Responsible,
                DemandStatus::Created,
                &DemandCommand::Reject { reason: "   ".to_string() },
            )
            .expect_err("blank reason");
        assert_eq!(error, WorkflowError::MissingReason);

        let quotes = QuoteEngine::default();
        let error = quotes
            .apply(
                Role::Technician,
                QuoteStatus::Created,
                &QuoteCommand::Reject { reason: String::new() },
            )
            .expect_err("blank quote reason");
        assert_eq!(error, WorkflowError::MissingReason);
    }

    #[test]
    fn permission_is_checked_before_payload() {
        let engine = DemandEngine::default();
        let error = engine
            .apply(Role::Agent, DemandStatus::Created, &DemandCommand::Reject { reason: String::new() })
            .expect_err("wrong role and blank reason");

        assert_eq!(error.kind(), WorkflowErrorKind::InvalidTransition);
    }

    #[test]
    fn technician_moves_responsible_approved_demands() {
        let engine = DemandEngine::default();
        let approved = engine
            .apply(
                Role::Technician,
                DemandStatus::ResponsibleApproved,
                &DemandCommand::Approve { note: Some("Specs ok".to_string()) },
            )
            .expect("technician approval");
        assert_eq!(approved.to, DemandStatus::TechnicianApproved);
        assert_eq!(approved.comment.map(|comment| comment.content), Some("Specs ok".to_string()));

        let rejected = engine
            .apply(
                Role::Technician,
                DemandStatus::ResponsibleApproved,
                &DemandCommand::Reject { reason: "Wrong model".to_string() },
            )
            .expect("technician rejection");
        assert_eq!(rejected.to, DemandStatus::TechnicianRejected);
    }

    #[test]
    fn rejected_demands_are_resubmitted_by_agent_or_responsible() {
        let engine = DemandEngine::default();
        for role in [Role::Agent, Role::Responsible] {
            for status in [DemandStatus::ResponsibleRejected, DemandStatus::TechnicianRejected] {
                let outcome = engine
                    .apply(role, status, &DemandCommand::Resubmit { draft: draft() })
                    .expect("resubmit");
                assert_eq!(outcome.to, DemandStatus::Created);
                assert_eq!(outcome.comment, None);
                assert_eq!(outcome.effects, vec![WorkflowEffect::ReviseDemand { draft: draft() }]);
            }
        }
    }

    #[test]
    fn resubmit_validates_the_draft() {
        let engine = DemandEngine::default();
        let mut invalid = draft();
        invalid.articles[0].name = String::new();

        let error = engine
            .apply(Role::Agent, DemandStatus::ResponsibleRejected, &DemandCommand::Resubmit { draft: invalid })
            .expect_err("article without a name");

        assert_eq!(
            error,
            WorkflowError::InvalidDraft {
                field: "articles[0].name".to_string(),
                reason: "must not be empty".to_string()
            }
        );
    }

    #[test]
    fn provider_opens_a_quote_without_moving_the_demand() {
        let engine = DemandEngine::default();
        let amount = Decimal::new(4_500_000, 2);
        let outcome = engine
            .apply(
                Role::Provider,
                DemandStatus::TechnicianApproved,
                &DemandCommand::CreateQuote { total_amount: amount },
            )
            .expect("open quote");

        assert!(!outcome.changes_status());
        assert_eq!(outcome.effects, vec![WorkflowEffect::OpenQuote { total_amount: amount }]);
    }

    #[test]
    fn non_positive_amounts_are_invalid() {
        let engine = DemandEngine::default();
        for amount in [Decimal::ZERO, Decimal::new(-100, 0)] {
            let error = engine
                .apply(
                    Role::Provider,
                    DemandStatus::TechnicianApproved,
                    &DemandCommand::CreateQuote { total_amount: amount },
                )
                .expect_err("amount must be positive");
            assert_eq!(error, WorkflowError::InvalidAmount { amount });
        }
    }

    #[test]
    fn quote_approval_uses_default_text_without_a_note() {
        let engine = QuoteEngine::default();
        let outcome = engine
            .apply(Role::Technician, QuoteStatus::Created, &QuoteCommand::Approve { note: Some(" ".to_string()) })
            .expect("approve quote");

        assert_eq!(outcome.to, QuoteStatus::Approved);
        assert_eq!(outcome.comment, Some(CommentDraft::approved(DEFAULT_QUOTE_APPROVAL_NOTE)));
    }

    #[test]
    fn rejected_quote_is_resubmitted_with_a_new_amount() {
        let engine = QuoteEngine::default();
        let outcome = engine
            .apply(
                Role::Provider,
                QuoteStatus::Rejected,
                &QuoteCommand::Resubmit { total_amount: Decimal::new(9_900, 0) },
            )
            .expect("resubmit quote");
        assert_eq!(outcome.to, QuoteStatus::Created);

        let error = engine
            .apply(
                Role::Provider,
                QuoteStatus::Rejected,
                &QuoteCommand::Resubmit { total_amount: Decimal::new(-5, 0) },
            )
            .expect_err("negative amount");
        assert_eq!(error.kind(), WorkflowErrorKind::InvalidAmount);
    }

    #[test]
    fn manager_attaches_purchase_order_to_approved_quote() {
        let engine = QuoteEngine::default();
        let outcome = engine
            .apply(
                Role::Manager,
                QuoteStatus::Approved,
                &QuoteCommand::AttachPurchaseOrder { file_name: " bc-114.pdf ".to_string() },
            )
            .expect("attach");
        assert_eq!(outcome.to, QuoteStatus::Approved);
        assert_eq!(
            outcome.effects,
            vec![WorkflowEffect::AttachPurchaseOrder { file_name: "bc-114.pdf".to_string() }]
        );

        let error = engine
            .apply(
                Role::Manager,
                QuoteStatus::Approved,
                &QuoteCommand::AttachPurchaseOrder { file_name: String::new() },
            )
            .expect_err("no file");
        assert_eq!(error, WorkflowError::MissingAttachment);

        assert!(!engine.can_transition(Role::Manager, QuoteStatus::Created, QuoteAction::AttachPurchaseOrder));
    }

    #[test]
    fn stale_snapshot_is_refused() {
        let engine = DemandEngine::default();
        let error = engine
            .apply_fresh(
                Role::Responsible,
                DemandStatus::Created,
                DemandStatus::ResponsibleRejected,
                &DemandCommand::Approve { note: None },
            )
            .expect_err("status moved underneath");
        assert_eq!(error.kind(), WorkflowErrorKind::StaleState);

        let fresh = engine
            .apply_fresh(
                Role::Responsible,
                DemandStatus::Created,
                DemandStatus::Created,
                &DemandCommand::Approve { note: None },
            )
            .expect("same status");
        assert_eq!(fresh.to, DemandStatus::ResponsibleApproved);
    }

    #[test]
    fn only_table_entries_are_allowed() {
        let engine = DemandEngine::default();
        let mut allowed = Vec::new();
        for role in Role::ALL {
            for status in DemandStatus::ALL {
                for action in DemandAction::ALL {
                    let first = engine.can_transition(role, status, action);
                    assert_eq!(first, engine.can_transition(role, status, action));
                    if first {
                        allowed.push((status, action, role));
                    }
                }
            }
        }

        assert_eq!(allowed.len(), 9);
        assert!(allowed.iter().all(|(status, _, _)| !matches!(
            status,
            DemandStatus::InProgress | DemandStatus::Done
        )));

        let quotes = QuoteEngine::default();
        let quote_allowed = Role::ALL
            .into_iter()
            .flat_map(|role| QuoteStatus::ALL.into_iter().map(move |status| (role, status)))
            .flat_map(|(role, status)| QuoteAction::ALL.into_iter().map(move |action| (role, status, action)))
            .filter(|(role, status, action)| quotes.can_transition(*role, *status, *action))
            .count();
        assert_eq!(quote_allowed, 4);
    }

    #[test]
    fn creator_role_decides_initial_status() {
        assert_eq!(initial_demand_status(Role::Agent), Ok(DemandStatus::Created));
        assert_eq!(initial_demand_status(Role::Responsible), Ok(DemandStatus::ResponsibleApproved));
        let error = initial_demand_status(Role::Provider).expect_err("providers do not create demands");
        assert_eq!(error.kind(), WorkflowErrorKind::InvalidTransition);
    }
}
