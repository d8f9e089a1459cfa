pub mod comment;
pub mod demand;
pub mod quote;
pub mod user;

pub use comment::{latest_rejection, Comment, CommentDraft, CommentId, CommentType};
pub use demand::{
    Article, ArticleDraft, ArticleId, Demand, DemandDraft, DemandId, DemandStatus, DraftViolation,
};
pub use quote::{AttachedFile, Quote, QuoteId, QuoteStatus};
pub use user::{Role, UnknownRole, User, UserId, UserRef};

/// Reads an explicit JSON `null` as the field's default. The backend emits
/// `null` for optional text and empty collections.
pub fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: serde::Deserializer<'de>,
    T: Default + serde::Deserialize<'de>,
{
    let value = <Option<T> as serde::Deserialize>::deserialize(deserializer)?;
    Ok(value.unwrap_or_default())
}
