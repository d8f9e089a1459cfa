use chrono::{DateTime, TimeZone, Utc};
use gestibank_core::domain::{Role, UserId};
use gestibank_core::visibility::Viewer;
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use serde::Deserialize;

use crate::error::SessionError;

/// Claims the backend puts in its bearer tokens.
#[derive(Debug, Deserialize)]
struct Claims {
    sub: String,
    role: String,
    #[serde(rename = "userId", default)]
    user_id: Option<i64>,
    #[serde(default)]
    name: Option<String>,
    exp: i64,
}

/// The acting user, as identified by the backend token.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Session {
    pub email: String,
    pub role: Role,
    pub user_id: Option<UserId>,
    pub name: Option<String>,
    pub expires_at: Option<DateTime<Utc>>,
}

impl Session {
    pub fn new(email: impl Into<String>, role: Role) -> Self {
        Self { email: email.into(), role, user_id: None, name: None, expires_at: None }
    }

    /// Reads the claims without checking the signature; the backend verifies
    /// it on every request. Expiry and role are still enforced here.
    pub fn from_token(token: &str) -> Result<Self, SessionError> {
        let token = token.trim();
        if token.is_empty() {
            return Err(SessionError::Missing);
        }

        let mut validation = Validation::new(Algorithm::HS256);
        validation.insecure_disable_signature_validation();
        validation.validate_aud = false;
        validation.set_required_spec_claims(&["exp", "sub"]);

        let data = decode::<Claims>(token, &DecodingKey::from_secret(&[]), &validation).map_err(
            |error| match error.kind() {
                ErrorKind::ExpiredSignature => SessionError::Expired,
                _ => SessionError::Malformed(error.to_string()),
            },
        )?;

        let claims = data.claims;
        let role = claims.role.parse::<Role>()?;
        Ok(Self {
            email: claims.sub,
            role,
            user_id: claims.user_id.map(UserId),
            name: claims.name.filter(|name| !name.trim().is_empty()),
            expires_at: Utc.timestamp_opt(claims.exp, 0).single(),
        })
    }

    pub fn viewer(&self) -> Viewer<'_> {
        Viewer::new(self.role, &self.email)
    }
}
