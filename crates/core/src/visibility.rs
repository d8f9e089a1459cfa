//! What each role is shown. These filters mirror the permission table: a
//! role only sees the entities it can act on, plus the agent/responsible
//! overview of every demand.

use crate::domain::demand::{Demand, DemandStatus};
use crate::domain::quote::{Quote, QuoteStatus};
use crate::domain::user::Role;

/// Who is looking. Providers are matched to their quotes by email.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Viewer<'a> {
    pub role: Role,
    pub email: &'a str,
}

impl<'a> Viewer<'a> {
    pub fn new(role: Role, email: &'a str) -> Self {
        Self { role, email }
    }

    pub fn sees_demand(&self, demand: &Demand) -> bool {
        match self.role {
            Role::Agent | Role::Responsible => true,
            Role::Technician => demand.status == DemandStatus::ResponsibleApproved,
            Role::Provider => demand.status == DemandStatus::TechnicianApproved,
            Role::Manager | Role::Admin => false,
        }
    }

    pub fn sees_quote(&self, quote: &Quote) -> bool {
        match self.role {
            Role::Technician => true,
            Role::Provider => quote.is_owned_by(self.email),
            Role::Manager => quote.status == QuoteStatus::Approved,
            Role::Agent | Role::Responsible | Role::Admin => false,
        }
    }

    pub fn manages_users(&self) -> bool {
        self.role == Role::Admin
    }
}

pub fn visible_demands<'d>(viewer: &Viewer<'_>, demands: &'d [Demand]) -> Vec<&'d Demand> {
    demands.iter().filter(|demand| viewer.sees_demand(demand)).collect()
}

pub fn visible_quotes<'q>(viewer: &Viewer<'_>, quotes: &'q [Quote]) -> Vec<&'q Quote> {
    quotes.iter().filter(|quote| viewer.sees_quote(quote)).collect()
}
