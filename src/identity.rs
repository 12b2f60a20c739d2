//! Identity as seen from the external auth provider.
//!
//! The provider owns sign-in and sessions; this module only describes what it
//! hands back and how callers pass the request's session explicitly.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// The authenticated user behind the current session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    /// Stable external user id.
    pub id: String,
    pub first_name: String,
    pub last_name: String,
    pub email_addresses: Vec<String>,
    pub image_url: String,
}

impl Identity {
    #[must_use]
    pub fn primary_email(&self) -> Option<&str> {
        self.email_addresses.first().map(String::as_str)
    }
}

/// Per-request authentication input, passed explicitly to the provider.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RequestContext {
    pub session_token: Option<String>,
}

impl RequestContext {
    #[must_use]
    pub fn anonymous() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_session(token: impl Into<String>) -> Self {
        Self {
            session_token: Some(token.into()),
        }
    }
}

/// What the provider knows about the current request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthOutcome {
    Authenticated(Identity),
    Unauthenticated,
}

#[derive(Debug, Error)]
pub enum IdentityError {
    #[error("Identity provider request failed: {0}")]
    Transport(String),

    #[error("Identity provider returned status {status}: {message}")]
    Status { status: u16, message: String },

    #[error("Failed to decode identity: {0}")]
    Decode(String),
}

#[async_trait::async_trait]
pub trait IdentityProvider: Send + Sync {
    /// Looks up the user owning the session in `ctx`.
    ///
    /// # Errors
    ///
    /// Returns an [`IdentityError`] when the provider cannot be reached or
    /// answers with something other than a user or a rejection.
    async fn current_user(&self, ctx: &RequestContext) -> Result<AuthOutcome, IdentityError>;
}
