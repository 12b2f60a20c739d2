//! Domain service for application profiles.
//!
//! Resolves the profile belonging to the current session, creating it the
//! first time an identity is seen.

use thiserror::Error;

use crate::db::Profile;
use crate::identity::{Identity, IdentityError, RequestContext};

/// Errors specific to profile operations.
#[derive(Debug, Error)]
pub enum ProfileError {
    #[error("Identity provider error: {0}")]
    IdentityProvider(String),

    #[error("Malformed identity: {0}")]
    MalformedIdentity(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<sea_orm::DbErr> for ProfileError {
    fn from(err: sea_orm::DbErr) -> Self {
        Self::Database(err.to_string())
    }
}

impl From<IdentityError> for ProfileError {
    fn from(err: IdentityError) -> Self {
        Self::IdentityProvider(err.to_string())
    }
}

impl From<anyhow::Error> for ProfileError {
    fn from(err: anyhow::Error) -> Self {
        if err.downcast_ref::<sea_orm::DbErr>().is_some() {
            return Self::Database(format!("{err:#}"));
        }
        Self::Internal(err.to_string())
    }
}

/// Result of resolving the current request's profile.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProfileOutcome {
    Ready(Profile),
    /// No identity behind the request; the caller should redirect.
    SignInRequired { redirect_to: String },
}

/// Domain service trait for profiles.
#[async_trait::async_trait]
pub trait ProfileService: Send + Sync {
    /// Returns the profile for the identity behind `ctx`, creating it on first visit.
    ///
    /// # Errors
    ///
    /// Provider and store failures propagate; an identity without an email
    /// address yields [`ProfileError::MalformedIdentity`].
    async fn resolve(&self, ctx: &RequestContext) -> Result<ProfileOutcome, ProfileError>;

    /// Get-or-create for a caller that already holds the identity.
    async fn get_or_create(&self, identity: &Identity) -> Result<Profile, ProfileError>;

    async fn find_by_user_id(&self, user_id: &str) -> Result<Option<Profile>, ProfileError>;

    /// Lists the most recently created profiles.
    async fn list(&self, limit: u64) -> Result<Vec<Profile>, ProfileError>;
}
