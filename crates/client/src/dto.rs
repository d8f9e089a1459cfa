//! Wire shapes of the REST backend. Responses that already match the domain
//! (demands, users, statistics) decode straight into core types; quotes embed
//! their demand and creator and are flattened here.

use std::fmt;

use chrono::{DateTime, Utc};
use gestibank_core::domain::{
    ArticleDraft, AttachedFile, Comment, CommentDraft, CommentType, DemandDraft, DemandId, Quote,
    QuoteId, QuoteStatus, Role, UserRef,
};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize, Serializer};
use validator::Validate;

use crate::error::BackendError;

#[derive(Clone, Serialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

impl fmt::Debug for LoginRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LoginRequest")
            .field("email", &self.email)
            .field("password", &"<redacted>")
            .finish()
    }
}

#[derive(Clone, Debug, Deserialize)]
pub struct TokenResponse {
    pub token: String,
}

#[derive(Clone, Serialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UserRegisterRequest {
    #[validate(length(min = 1, message = "first name is required"))]
    pub first_name: String,
    #[validate(length(min = 1, message = "last name is required"))]
    pub last_name: String,
    #[validate(length(min = 6, message = "password must have at least 6 characters"))]
    pub password: String,
    #[validate(email(message = "email is not valid"))]
    pub email: String,
    #[serde(serialize_with = "serialize_role")]
    pub role: Role,
}

impl fmt::Debug for UserRegisterRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UserRegisterRequest")
            .field("first_name", &self.first_name)
            .field("last_name", &self.last_name)
            .field("email", &self.email)
            .field("role", &self.role)
            .finish_non_exhaustive()
    }
}

fn serialize_role<S: Serializer>(role: &Role, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(&role.wire_name())
}

/// File sent as a multipart part.
#[derive(Clone, PartialEq, Eq)]
pub struct FileUpload {
    pub file_name: String,
    pub content_type: String,
    pub bytes: Vec<u8>,
}

impl fmt::Debug for FileUpload {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FileUpload")
            .field("file_name", &self.file_name)
            .field("content_type", &self.content_type)
            .field("len", &self.bytes.len())
            .finish()
    }
}

impl FileUpload {
    pub fn new(file_name: impl Into<String>, bytes: Vec<u8>) -> Self {
        let file_name = file_name.into();
        let content_type = guess_content_type(&file_name).to_string();
        Self { file_name, content_type, bytes }
    }
}

fn guess_content_type(file_name: &str) -> &'static str {
    let extension = file_name.rsplit_once('.').map(|(_, ext)| ext.to_ascii_lowercase());
    match extension.as_deref() {
        Some("pdf") => "application/pdf",
        Some("png") => "image/png",
        Some("jpg" | "jpeg") => "image/jpeg",
        Some("doc") => "application/msword",
        Some("docx") => "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
        Some("xls") => "application/vnd.ms-excel",
        Some("xlsx") => "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet",
        _ => "application/octet-stream",
    }
}

/// Multipart body of `POST /demands`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NewDemand {
    pub draft: DemandDraft,
    pub attachment: Option<FileUpload>,
}

impl NewDemand {
    /// Text fields in the order the backend binds them.
    pub fn form_fields(&self) -> Vec<(String, String)> {
        let mut fields = vec![
            ("title".to_string(), self.draft.title.clone()),
            ("description".to_string(), self.draft.description.clone()),
        ];
        for (index, article) in self.draft.articles.iter().enumerate() {
            fields.push((format!("articles[{index}].name"), article.name.clone()));
            fields.push((format!("articles[{index}].description"), article.description.clone()));
            fields.push((format!("articles[{index}].quantity"), article.quantity.to_string()));
        }
        fields
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DemandUpdateRequest {
    pub id: DemandId,
    pub title: String,
    pub description: String,
    pub articles: Vec<ArticleDraft>,
}

impl DemandUpdateRequest {
    pub fn new(id: DemandId, draft: DemandDraft) -> Self {
        Self { id, title: draft.title, description: draft.description, articles: draft.articles }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CommentRequest {
    pub content: String,
    #[serde(rename = "type")]
    pub kind: CommentType,
    pub demand_id: DemandId,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub quote_id: Option<QuoteId>,
}

impl CommentRequest {
    pub fn new(comment: CommentDraft, demand_id: DemandId, quote_id: Option<QuoteId>) -> Self {
        Self { content: comment.content, kind: comment.kind, demand_id, quote_id }
    }
}

/// The backend derives the next status from the caller's role and this verdict.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DemandValidateRequest {
    pub demand_status: CommentType,
    pub comment: CommentRequest,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QuoteValidateRequest {
    pub quote_status: CommentType,
    pub comment: CommentRequest,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QuoteCreateRequest {
    pub total_amount: Decimal,
    pub demand_id: DemandId,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QuoteUpdateRequest {
    pub id: QuoteId,
    pub total_amount: Decimal,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PurchaseOrderUpload {
    pub quote_id: QuoteId,
    pub file: FileUpload,
}

#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EmbeddedDemand {
    pub id: DemandId,
}

#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuoteResponse {
    pub id: QuoteId,
    pub total_amount: Decimal,
    pub status: QuoteStatus,
    #[serde(default)]
    pub demand: Option<EmbeddedDemand>,
    #[serde(default)]
    pub demand_id: Option<DemandId>,
    #[serde(default)]
    pub created_by: Option<UserRef>,
    #[serde(default)]
    pub provider: Option<UserRef>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
    #[serde(default, deserialize_with = "gestibank_core::domain::null_as_default")]
    pub comments: Vec<Comment>,
    #[serde(default, deserialize_with = "gestibank_core::domain::null_as_default")]
    pub attached_files: Vec<AttachedFile>,
    #[serde(default)]
    pub bon_command: Option<String>,
}

impl TryFrom<QuoteResponse> for Quote {
    type Error = BackendError;

    fn try_from(response: QuoteResponse) -> Result<Self, Self::Error> {
        let demand_id = response
            .demand
            .map(|demand| demand.id)
            .or(response.demand_id)
            .ok_or_else(|| {
                BackendError::Decode(format!("quote {} does not reference a demand", response.id))
            })?;

        Ok(Quote {
            id: response.id,
            total_amount: response.total_amount,
            demand_id,
            status: response.status,
            created_at: response.created_at,
            updated_at: response.updated_at,
            provider: response.created_by.or(response.provider),
            comments: response.comments,
            attached_files: response.attached_files,
            bon_command: response.bon_command,
        })
    }
}

#[derive(Clone, Debug, Default, Deserialize)]
pub struct ErrorBody {
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
}
