use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::comment::{latest_rejection, Comment};
use crate::domain::user::UserRef;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct DemandId(pub i64);

impl fmt::Display for DemandId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ArticleId(pub i64);

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DemandStatus {
    Created,
    ResponsibleApproved,
    ResponsibleRejected,
    TechnicianApproved,
    TechnicianRejected,
    InProgress,
    Done,
}

impl DemandStatus {
    pub const ALL: [DemandStatus; 7] = [
        DemandStatus::Created,
        DemandStatus::ResponsibleApproved,
        DemandStatus::ResponsibleRejected,
        DemandStatus::TechnicianApproved,
        DemandStatus::TechnicianRejected,
        DemandStatus::InProgress,
        DemandStatus::Done,
    ];

    pub fn is_rejected(self) -> bool {
        matches!(self, Self::ResponsibleRejected | Self::TechnicianRejected)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Created => "CREATED",
            Self::ResponsibleApproved => "RESPONSIBLE_APPROVED",
            Self::ResponsibleRejected => "RESPONSIBLE_REJECTED",
            Self::TechnicianApproved => "TECHNICIAN_APPROVED",
            Self::TechnicianRejected => "TECHNICIAN_REJECTED",
            Self::InProgress => "IN_PROGRESS",
            Self::Done => "DONE",
        }
    }
}

impl fmt::Display for DemandStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for DemandStatus {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let normalized = value.trim().to_ascii_uppercase().replace('-', "_");
        Self::ALL
            .into_iter()
            .find(|status| status.as_str() == normalized)
            .ok_or_else(|| format!("unknown demand status `{value}`"))
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Article {
    pub id: ArticleId,
    pub name: String,
    pub quantity: u32,
    #[serde(default, deserialize_with = "crate::domain::null_as_default")]
    pub description: String,
}

/// Article as typed in a creation or edit form. `id` is set when the line
/// already exists on the demand being edited.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ArticleDraft {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<ArticleId>,
    pub name: String,
    pub description: String,
    pub quantity: u32,
}

impl From<&Article> for ArticleDraft {
    fn from(article: &Article) -> Self {
        Self {
            id: Some(article.id),
            name: article.name.clone(),
            description: article.description.clone(),
            quantity: article.quantity,
        }
    }
}

/// Content of a demand, used both for creation and for edit & resubmit.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DemandDraft {
    pub title: String,
    pub description: String,
    pub articles: Vec<ArticleDraft>,
}

/// First field of a draft that fails validation.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DraftViolation {
    pub field: String,
    pub reason: &'static str,
}

impl DemandDraft {
    pub fn check(&self) -> Result<(), DraftViolation> {
        if self.title.trim().is_empty() {
            return Err(DraftViolation { field: "title".to_string(), reason: "must not be empty" });
        }
        if self.articles.is_empty() {
            return Err(DraftViolation {
                field: "articles".to_string(),
                reason: "at least one article is required",
            });
        }

        for (index, article) in self.articles.iter().enumerate() {
            if article.name.trim().is_empty() {
                return Err(DraftViolation {
                    field: format!("articles[{index}].name"),
                    reason: "must not be empty",
                });
            }
            if article.description.trim().is_empty() {
                return Err(DraftViolation {
                    field: format!("articles[{index}].description"),
                    reason: "must not be empty",
                });
            }
            if article.quantity == 0 {
                return Err(DraftViolation {
                    field: format!("articles[{index}].quantity"),
                    reason: "must be a positive integer",
                });
            }
        }

        Ok(())
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Demand {
    pub id: DemandId,
    pub title: String,
    #[serde(default, deserialize_with = "crate::domain::null_as_default")]
    pub description: String,
    #[serde(default, deserialize_with = "crate::domain::null_as_default")]
    pub articles: Vec<Article>,
    #[serde(default)]
    pub attached_file: Option<String>,
    pub status: DemandStatus,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub created_by: Option<UserRef>,
    #[serde(default, deserialize_with = "crate::domain::null_as_default")]
    pub comments: Vec<Comment>,
}

impl Demand {
    /// Reason shown for a rejected demand: the latest REJECTED comment.
    pub fn rejection_comment(&self) -> Option<&str> {
        if !self.status.is_rejected() {
            return None;
        }
        latest_rejection(&self.comments).map(|comment| comment.content.as_str())
    }

    pub fn draft(&self) -> DemandDraft {
        DemandDraft {
            title: self.title.clone(),
            description: self.description.clone(),
            articles: self.articles.iter().map(ArticleDraft::from).collect(),
        }
    }
}
