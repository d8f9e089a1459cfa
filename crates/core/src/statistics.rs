use serde::{Deserialize, Serialize};

use crate::domain::demand::{Demand, DemandStatus};
use crate::domain::quote::{Quote, QuoteStatus};

/// Dashboard counters for agents and responsibles.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DemandStatistics {
    pub total_demands_created: u32,
    pub total_closed_demands: u32,
    pub pending_demands: u32,
    pub rejected_demands: u32,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TechnicianStatistics {
    pub total_demands_to_validated: u32,
    pub validated_demands: u32,
    pub rejected_demands: u32,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProviderStatistics {
    pub total_quotes_created: u32,
    pub total_accepted_quotes: u32,
    pub quotes_pending_validation: u32,
    // older backends do not send it
    #[serde(default)]
    pub total_rejected_quotes: u32,
}

impl DemandStatistics {
    pub fn from_demands(demands: &[Demand]) -> Self {
        let mut stats = Self::default();
        for demand in demands {
            stats.total_demands_created += 1;
            match demand.status {
                DemandStatus::Done => stats.total_closed_demands += 1,
                status if status.is_rejected() => stats.rejected_demands += 1,
                _ => stats.pending_demands += 1,
            }
        }
        stats
    }
}

impl TechnicianStatistics {
    pub fn from_demands(demands: &[Demand]) -> Self {
        let mut stats = Self::default();
        for demand in demands {
            match demand.status {
                DemandStatus::ResponsibleApproved => stats.total_demands_to_validated += 1,
                DemandStatus::TechnicianApproved | DemandStatus::InProgress | DemandStatus::Done => {
                    stats.validated_demands += 1
                }
                DemandStatus::TechnicianRejected => stats.rejected_demands += 1,
                DemandStatus::Created | DemandStatus::ResponsibleRejected => {}
            }
        }
        stats
    }
}

impl ProviderStatistics {
    /// Counts over `quotes`; the caller narrows them to one provider first.
    pub fn from_quotes<'q>(quotes: impl IntoIterator<Item = &'q Quote>) -> Self {
        let mut stats = Self::default();
        for quote in quotes {
            stats.total_quotes_created += 1;
            match quote.status {
                QuoteStatus::Created => stats.quotes_pending_validation += 1,
                QuoteStatus::Approved => stats.total_accepted_quotes += 1,
                QuoteStatus::Rejected => stats.total_rejected_quotes += 1,
                // Counted in the total only, as the backend does.
                QuoteStatus::InProgress | QuoteStatus::Done => {}
            }
        }
        stats
    }
}
