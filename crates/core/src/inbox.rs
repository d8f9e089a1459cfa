use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::demand::{Demand, DemandId, DemandStatus};
use crate::domain::quote::{Quote, QuoteId, QuoteStatus};
use crate::domain::user::Role;
use crate::visibility::Viewer;

pub const INBOX_LIMIT: usize = 5;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum InboxItem {
    DemandAwaitingReview {
        demand_id: DemandId,
        title: String,
        status: DemandStatus,
        at: Option<DateTime<Utc>>,
    },
    QuoteAwaitingPurchaseOrder {
        quote_id: QuoteId,
        demand_id: DemandId,
        at: Option<DateTime<Utc>>,
    },
    PurchaseOrderReceived {
        quote_id: QuoteId,
        demand_id: DemandId,
        file: String,
        at: Option<DateTime<Utc>>,
    },
}

impl InboxItem {
    pub fn at(&self) -> Option<DateTime<Utc>> {
        match self {
            Self::DemandAwaitingReview { at, .. }
            | Self::QuoteAwaitingPurchaseOrder { at, .. }
            | Self::PurchaseOrderReceived { at, .. } => *at,
        }
    }
}

/// Pending work for the viewer, newest first, capped at [`INBOX_LIMIT`].
pub fn inbox(viewer: &Viewer<'_>, demands: &[Demand], quotes: &[Quote]) -> Vec<InboxItem> {
    let awaiting = |status: DemandStatus| {
        demands
            .iter()
            .filter(move |demand| demand.status == status)
            .map(|demand| InboxItem::DemandAwaitingReview {
                demand_id: demand.id,
                title: demand.title.clone(),
                status: demand.status,
                at: Some(demand.created_at),
            })
    };

    let mut items: Vec<InboxItem> = match viewer.role {
        Role::Responsible => awaiting(DemandStatus::Created).collect(),
        Role::Technician => awaiting(DemandStatus::ResponsibleApproved).collect(),
        Role::Provider => awaiting(DemandStatus::TechnicianApproved)
            .chain(
                quotes
                    .iter()
                    .filter(|quote| quote.is_owned_by(viewer.email))
                    .filter_map(purchase_order_notice),
            )
            .collect(),
        Role::Manager => quotes
            .iter()
            .filter(|quote| quote.status == QuoteStatus::Approved && !quote.has_purchase_order())
            .map(|quote| InboxItem::QuoteAwaitingPurchaseOrder {
                quote_id: quote.id,
                demand_id: quote.demand_id,
                at: quote.updated_at.or(quote.created_at),
            })
            .collect(),
        Role::Agent | Role::Admin => Vec::new(),
    };

    // None sorts last; stable sort keeps backend order among equals.
    items.sort_by(|left, right| right.at().cmp(&left.at()));
    items.truncate(INBOX_LIMIT);
    items
}

fn purchase_order_notice(quote: &Quote) -> Option<InboxItem> {
    let file = quote
        .bon_command
        .clone()
        .filter(|file| !file.trim().is_empty())
        .or_else(|| quote.attached_files.first().map(|file| file.file_name.clone()))?;

    let at = quote
        .attached_files
        .iter()
        .filter_map(|file| file.uploaded_at)
        .max()
        .or(quote.updated_at)
        .or(quote.created_at);

    Some(InboxItem::PurchaseOrderReceived { quote_id: quote.id, demand_id: quote.demand_id, file, at })
}
