//! `SeaORM` implementation of the `ProfileService` trait.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, info};

use crate::db::{NewProfile, Profile, Store};
use crate::identity::{AuthOutcome, Identity, IdentityProvider, RequestContext};
use crate::services::profile_service::{ProfileError, ProfileOutcome, ProfileService};
use crate::services::username::random_username;

pub struct SeaOrmProfileService {
    store: Store,
    identity: Arc<dyn IdentityProvider>,
    sign_in_url: String,
}

impl SeaOrmProfileService {
    #[must_use]
    pub fn new(
        store: Store,
        identity: Arc<dyn IdentityProvider>,
        sign_in_url: impl Into<String>,
    ) -> Self {
        Self {
            store,
            identity,
            sign_in_url: sign_in_url.into(),
        }
    }

    fn new_profile_for(identity: &Identity) -> Result<NewProfile, ProfileError> {
        let email = identity.primary_email().ok_or_else(|| {
            ProfileError::MalformedIdentity(format!(
                "identity {} has no email address",
                identity.id
            ))
        })?;

        Ok(NewProfile {
            user_id: identity.id.clone(),
            name: format!("{} {}", identity.first_name, identity.last_name),
            email: email.to_string(),
            image_url: identity.image_url.clone(),
            username: random_username(&identity.first_name),
        })
    }
}

#[async_trait]
impl ProfileService for SeaOrmProfileService {
    async fn resolve(&self, ctx: &RequestContext) -> Result<ProfileOutcome, ProfileError> {
        let identity = match self.identity.current_user(ctx).await? {
            AuthOutcome::Authenticated(identity) => identity,
            AuthOutcome::Unauthenticated => {
                metrics::counter!("profiles_resolved_total", "outcome" => "sign_in_required")
                    .increment(1);
                return Ok(ProfileOutcome::SignInRequired {
                    redirect_to: self.sign_in_url.clone(),
                });
            }
        };

        let profile = self.get_or_create(&identity).await?;
        metrics::counter!("profiles_resolved_total", "outcome" => "ready").increment(1);
        Ok(ProfileOutcome::Ready(profile))
    }

    async fn get_or_create(&self, identity: &Identity) -> Result<Profile, ProfileError> {
        if let Some(profile) = self.store.find_profile_by_user_id(&identity.id).await? {
            debug!(user_id = %identity.id, profile_id = profile.id, "Found existing profile");
            return Ok(profile);
        }

        let new_profile = Self::new_profile_for(identity)?;
        let created = self.store.create_profile(new_profile).await?;

        if created.inserted {
            metrics::counter!("profiles_created_total").increment(1);
            info!(
                user_id = %identity.id,
                profile_id = created.profile.id,
                username = %created.profile.username,
                "Created profile"
            );
        } else {
            debug!(user_id = %identity.id, "Profile was created concurrently, reusing it");
        }

        Ok(created.profile)
    }

    async fn find_by_user_id(&self, user_id: &str) -> Result<Option<Profile>, ProfileError> {
        Ok(self.store.find_profile_by_user_id(user_id).await?)
    }

    async fn list(&self, limit: u64) -> Result<Vec<Profile>, ProfileError> {
        Ok(self.store.list_profiles(limit).await?)
    }
}
