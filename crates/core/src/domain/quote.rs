use std::fmt;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::domain::comment::{latest_rejection, Comment};
use crate::domain::demand::DemandId;
use crate::domain::user::UserRef;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct QuoteId(pub i64);

impl fmt::Display for QuoteId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum QuoteStatus {
    Created,
    Approved,
    Rejected,
    InProgress,
    Done,
}

impl QuoteStatus {
    pub const ALL: [QuoteStatus; 5] = [
        QuoteStatus::Created,
        QuoteStatus::Approved,
        QuoteStatus::Rejected,
        QuoteStatus::InProgress,
        QuoteStatus::Done,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Created => "CREATED",
            Self::Approved => "APPROVED",
            Self::Rejected => "REJECTED",
            Self::InProgress => "IN_PROGRESS",
            Self::Done => "DONE",
        }
    }
}

impl fmt::Display for QuoteStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for QuoteStatus {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let normalized = value.trim().to_ascii_uppercase().replace('-', "_");
        Self::ALL
            .into_iter()
            .find(|status| status.as_str() == normalized)
            .ok_or_else(|| format!("unknown quote status `{value}`"))
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AttachedFile {
    #[serde(default)]
    pub id: Option<i64>,
    pub file_name: String,
    #[serde(default)]
    pub file_url: Option<String>,
    #[serde(default)]
    pub uploaded_at: Option<DateTime<Utc>>,
}

/// A provider's priced response to a technician-approved demand.
///
/// `bon_command` is the purchase-order file reference set by a manager once
/// the quote is approved. Attaching it does not move the status.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Quote {
    pub id: QuoteId,
    pub total_amount: Decimal,
    pub demand_id: DemandId,
    pub status: QuoteStatus,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub provider: Option<UserRef>,
    #[serde(default, deserialize_with = "crate::domain::null_as_default")]
    pub comments: Vec<Comment>,
    #[serde(default, deserialize_with = "crate::domain::null_as_default")]
    pub attached_files: Vec<AttachedFile>,
    #[serde(default)]
    pub bon_command: Option<String>,
}

impl Quote {
    pub fn rejection_comment(&self) -> Option<&str> {
        if self.status != QuoteStatus::Rejected {
            return None;
        }
        latest_rejection(&self.comments).map(|comment| comment.content.as_str())
    }

    pub fn has_purchase_order(&self) -> bool {
        self.bon_command.as_deref().is_some_and(|file| !file.trim().is_empty())
    }

    pub fn is_owned_by(&self, email: &str) -> bool {
        self.provider.as_ref().is_some_and(|provider| provider.has_email(email))
    }
}

#[cfg(test)]
mod tests {
    use rust_decimal::Decimal;

    use super::{Quote, QuoteId, QuoteStatus};
    use crate::domain::demand::DemandId;
    use crate::domain::user::{Role, UserId, UserRef};

    fn quote(status: QuoteStatus) -> Quote {
        Quote {
            id: QuoteId(7),
            total_amount: Decimal::new(1_250_000, 2),
            demand_id: DemandId(3),
            status,
            created_at: None,
            updated_at: None,
            provider: Some(UserRef {
                id: UserId(9),
                first_name: "Omar".to_string(),
                last_name: "Alami".to_string(),
                email: "omar@supplier.ma".to_string(),
                role: Some(Role::Provider),
            }),
            comments: Vec::new(),
            attached_files: Vec::new(),
            bon_command: None,
        }
    }

    #[test]
    fn ownership_matches_email_case_insensitively() {
        let quote = quote(QuoteStatus::Created);
        assert!(quote.is_owned_by("Omar@Supplier.ma"));
        assert!(!quote.is_owned_by("someone@supplier.ma"));
    }

    #[test]
    fn blank_purchase_order_does_not_count() {
        let mut quote = quote(QuoteStatus::Approved);
        assert!(!quote.has_purchase_order());
        quote.bon_command = Some("   ".to_string());
        assert!(!quote.has_purchase_order());
        quote.bon_command = Some("bc-2025-014.pdf".to_string());
        assert!(quote.has_purchase_order());
    }

    #[test]
    fn amount_serializes_as_a_json_number() {
        let encoded = serde_json::to_value(quote(QuoteStatus::Created)).expect("encode quote");
        assert_eq!(encoded["totalAmount"], serde_json::json!(12500.0));
        assert_eq!(encoded["status"], "CREATED");
        assert_eq!(encoded["demandId"], 3);
    }

    #[test]
    fn status_parsing_is_case_insensitive() {
        assert_eq!("in_progress".parse::<QuoteStatus>(), Ok(QuoteStatus::InProgress));
        assert!("SENT".parse::<QuoteStatus>().is_err());
    }
}
