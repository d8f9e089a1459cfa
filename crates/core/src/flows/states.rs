use std::fmt;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::domain::comment::CommentDraft;
use crate::domain::demand::DemandDraft;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    Demand,
    Quote,
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Demand => "demand",
            Self::Quote => "quote",
        })
    }
}

/// Payload-free discriminant of a [`DemandCommand`], used for permission lookups.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DemandAction {
    Approve,
    Reject,
    Resubmit,
    CreateQuote,
}

impl DemandAction {
    pub const ALL: [DemandAction; 4] =
        [DemandAction::Approve, DemandAction::Reject, DemandAction::Resubmit, DemandAction::CreateQuote];
}

impl fmt::Display for DemandAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Approve => "approve",
            Self::Reject => "reject",
            Self::Resubmit => "resubmit",
            Self::CreateQuote => "create_quote",
        })
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QuoteAction {
    Approve,
    Reject,
    Resubmit,
    AttachPurchaseOrder,
}

impl QuoteAction {
    pub const ALL: [QuoteAction; 4] = [
        QuoteAction::Approve,
        QuoteAction::Reject,
        QuoteAction::Resubmit,
        QuoteAction::AttachPurchaseOrder,
    ];
}

impl fmt::Display for QuoteAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Approve => "approve",
            Self::Reject => "reject",
            Self::Resubmit => "resubmit",
            Self::AttachPurchaseOrder => "attach_purchase_order",
        })
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum DemandCommand {
    Approve { note: Option<String> },
    Reject { reason: String },
    Resubmit { draft: DemandDraft },
    CreateQuote { total_amount: Decimal },
}

impl DemandCommand {
    pub fn action(&self) -> DemandAction {
        match self {
            Self::Approve { .. } => DemandAction::Approve,
            Self::Reject { .. } => DemandAction::Reject,
            Self::Resubmit { .. } => DemandAction::Resubmit,
            Self::CreateQuote { .. } => DemandAction::CreateQuote,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum QuoteCommand {
    Approve { note: Option<String> },
    Reject { reason: String },
    Resubmit { total_amount: Decimal },
    AttachPurchaseOrder { file_name: String },
}

impl QuoteCommand {
    pub fn action(&self) -> QuoteAction {
        match self {
            Self::Approve { .. } => QuoteAction::Approve,
            Self::Reject { .. } => QuoteAction::Reject,
            Self::Resubmit { .. } => QuoteAction::Resubmit,
            Self::AttachPurchaseOrder { .. } => QuoteAction::AttachPurchaseOrder,
        }
    }
}

/// Mutation the caller has to issue against the backend for a transition.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "effect", rename_all = "snake_case")]
pub enum WorkflowEffect {
    RecordComment { comment: CommentDraft },
    ReviseDemand { draft: DemandDraft },
    OpenQuote { total_amount: Decimal },
    ReviseQuoteAmount { total_amount: Decimal },
    AttachPurchaseOrder { file_name: String },
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransitionOutcome<S, A> {
    pub from: S,
    pub to: S,
    pub action: A,
    pub comment: Option<CommentDraft>,
    pub effects: Vec<WorkflowEffect>,
}

impl<S: PartialEq, A> TransitionOutcome<S, A> {
    pub fn changes_status(&self) -> bool {
        self.from != self.to
    }
}
