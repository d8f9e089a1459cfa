use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::demand::DemandId;
use crate::domain::quote::QuoteId;
use crate::domain::user::UserRef;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CommentId(pub i64);

/// Also used as the verdict of a validation request: the backend derives the
/// resulting status from the acting role plus this value.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CommentType {
    Approved,
    Rejected,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Comment {
    #[serde(default)]
    pub id: Option<CommentId>,
    pub content: String,
    #[serde(rename = "type")]
    pub kind: CommentType,
    #[serde(default)]
    pub demand_id: Option<DemandId>,
    #[serde(default)]
    pub quote_id: Option<QuoteId>,
    #[serde(default)]
    pub created_by: Option<UserRef>,
    pub created_at: DateTime<Utc>,
}

/// A comment produced by a transition, not yet recorded by the backend.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommentDraft {
    pub content: String,
    #[serde(rename = "type")]
    pub kind: CommentType,
}

impl CommentDraft {
    pub fn approved(content: impl Into<String>) -> Self {
        Self { content: content.into(), kind: CommentType::Approved }
    }

    pub fn rejected(content: impl Into<String>) -> Self {
        Self { content: content.into(), kind: CommentType::Rejected }
    }
}

/// Latest rejection in an append-only history. Comments are ordered by
/// `created_at`; ties keep their position in the list.
pub fn latest_rejection(comments: &[Comment]) -> Option<&Comment> {
    comments
        .iter()
        .enumerate()
        .filter(|(_, comment)| comment.kind == CommentType::Rejected)
        .filter(|(_, comment)| !comment.content.trim().is_empty())
        .max_by_key(|(position, comment)| (comment.created_at, *position))
        .map(|(_, comment)| comment)
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, TimeZone, Utc};

    use super::{latest_rejection, Comment, CommentType};

    fn comment(content: &str, kind: CommentType, minutes: i64) -> Comment {
        Comment {
            id: None,
            content: content.to_string(),
            kind,
            demand_id: None,
            quote_id: None,
            created_by: None,
            created_at: Utc.with_ymd_and_hms(2025, 3, 1, 9, 0, 0).unwrap()
                + Duration::minutes(minutes),
        }
    }

    #[test]
    fn picks_the_most_recent_rejection() {
        let history = vec![
            comment("Budget insuffisant", CommentType::Rejected, 0),
            comment("ok", CommentType::Approved, 5),
            comment("Missing supplier reference", CommentType::Rejected, 10),
            comment("ok again", CommentType::Approved, 20),
        ];

        let latest = latest_rejection(&history).expect("a rejection exists");
        assert_eq!(latest.content, "Missing supplier reference");
    }

    #[test]
    fn no_rejection_means_no_reason() {
        let history = vec![comment("ok", CommentType::Approved, 0)];
        assert!(latest_rejection(&history).is_none());
    }

    #[test]
    fn comment_type_uses_backend_spelling() {
        let decoded: Comment = serde_json::from_str(
            r#"{"id":3,"content":"nope","type":"REJECTED","createdAt":"2025-03-01T09:00:00Z"}"#,
        )
        .expect("decode embedded comment");
        assert_eq!(decoded.kind, CommentType::Rejected);
        assert!(decoded.demand_id.is_none());
    }
}
