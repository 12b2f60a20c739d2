use anyhow::{Context, Result};
use sea_orm::{
    ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder,
    QuerySelect, Set, sea_query::OnConflict,
};
use tracing::debug;

use crate::entities::{prelude::Profiles, profiles};

/// Stored profile as handed to services.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Profile {
    pub id: i32,
    pub user_id: String,
    pub name: String,
    pub email: String,
    pub image_url: String,
    pub username: String,
    pub created_at: String,
    pub updated_at: String,
}

impl From<profiles::Model> for Profile {
    fn from(model: profiles::Model) -> Self {
        Self {
            id: model.id,
            user_id: model.user_id,
            name: model.name,
            email: model.email,
            image_url: model.image_url,
            username: model.username,
            created_at: model.created_at,
            updated_at: model.updated_at,
        }
    }
}

/// Fields supplied by the caller when a profile is first created.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewProfile {
    pub user_id: String,
    pub name: String,
    pub email: String,
    pub image_url: String,
    pub username: String,
}

/// Result of a conflict-safe insert.
#[derive(Debug, Clone)]
pub struct CreatedProfile {
    pub profile: Profile,
    /// False when another writer inserted the same `user_id` first.
    pub inserted: bool,
}

pub struct ProfileRepository {
    conn: DatabaseConnection,
}

impl ProfileRepository {
    #[must_use]
    pub const fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    /// Get profile by external identity id
    pub async fn get_by_user_id(&self, user_id: &str) -> Result<Option<Profile>> {
        let profile = Profiles::find()
            .filter(profiles::Column::UserId.eq(user_id))
            .one(&self.conn)
            .await
            .context("Failed to query profile by user id")?;

        Ok(profile.map(Profile::from))
    }

    /// Insert a profile, or return the existing row when `user_id` is taken.
    ///
    /// The insert uses `ON CONFLICT(user_id) DO NOTHING`, so two concurrent
    /// first visits for the same identity both end up with the single stored row.
    pub async fn create_or_existing(&self, new_profile: NewProfile) -> Result<CreatedProfile> {
        let now = chrono::Utc::now().to_rfc3339();
        let user_id = new_profile.user_id.clone();

        let active_model = profiles::ActiveModel {
            user_id: Set(new_profile.user_id),
            name: Set(new_profile.name),
            email: Set(new_profile.email),
            image_url: Set(new_profile.image_url),
            username: Set(new_profile.username),
            created_at: Set(now.clone()),
            updated_at: Set(now),
            ..Default::default()
        };

        let rows = Profiles::insert(active_model)
            .on_conflict(
                OnConflict::column(profiles::Column::UserId)
                    .do_nothing()
                    .to_owned(),
            )
            .exec_without_returning(&self.conn)
            .await
            .context("Failed to insert profile")?;

        if rows == 0 {
            debug!(user_id = %user_id, "Profile insert lost a race, reading existing row");
        }

        let profile = self
            .get_by_user_id(&user_id)
            .await?
            .ok_or_else(|| anyhow::anyhow!("Profile for user {user_id} missing after insert"))?;

        Ok(CreatedProfile {
            profile,
            inserted: rows > 0,
        })
    }

    /// List profiles, newest first
    pub async fn list(&self, limit: u64) -> Result<Vec<Profile>> {
        let rows = Profiles::find()
            .order_by_desc(profiles::Column::Id)
            .limit(limit)
            .all(&self.conn)
            .await
            .context("Failed to list profiles")?;

        Ok(rows.into_iter().map(Profile::from).collect())
    }

    pub async fn count(&self) -> Result<u64> {
        Profiles::find()
            .count(&self.conn)
            .await
            .context("Failed to count profiles")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::Store;

    async fn test_repo() -> ProfileRepository {
        let db_path = std::env::temp_dir().join(format!(
            "onboard-repo-test-{}.db",
            uuid::Uuid::new_v4()
        ));
        let store = Store::new(&format!("sqlite:{}", db_path.display()))
            .await
            .unwrap();
        ProfileRepository::new(store.conn)
    }

    fn ada() -> NewProfile {
        NewProfile {
            user_id: "u1".to_string(),
            name: "Ada Lovelace".to_string(),
            email: "ada@x.com".to_string(),
            image_url: "http://img/a".to_string(),
            username: "ada1234".to_string(),
        }
    }

    #[tokio::test]
    async fn test_create_assigns_store_fields() {
        let repo = test_repo().await;

        let created = repo.create_or_existing(ada()).await.unwrap();
        assert!(created.inserted);
        assert!(created.profile.id > 0);
        assert!(!created.profile.created_at.is_empty());
        assert_eq!(created.profile.created_at, created.profile.updated_at);

        let found = repo.get_by_user_id("u1").await.unwrap().unwrap();
        assert_eq!(found, created.profile);
    }

    #[tokio::test]
    async fn test_conflicting_insert_returns_existing_row() {
        let repo = test_repo().await;

        let first = repo.create_or_existing(ada()).await.unwrap();

        let mut second = ada();
        second.username = "ada9999".to_string();
        second.name = "Someone Else".to_string();
        let again = repo.create_or_existing(second).await.unwrap();

        assert!(!again.inserted);
        assert_eq!(again.profile, first.profile);
        assert_eq!(again.profile.username, "ada1234");
        assert_eq!(repo.count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_username_is_not_unique() {
        let repo = test_repo().await;

        repo.create_or_existing(ada()).await.unwrap();
        let mut other = ada();
        other.user_id = "u2".to_string();
        repo.create_or_existing(other).await.unwrap();

        assert_eq!(repo.count().await.unwrap(), 2);
        let listed = repo.list(10).await.unwrap();
        assert_eq!(listed[0].user_id, "u2");
        assert_eq!(listed[1].user_id, "u1");
    }

    #[tokio::test]
    async fn test_missing_user_returns_none() {
        let repo = test_repo().await;
        assert!(repo.get_by_user_id("nobody").await.unwrap().is_none());
    }
}
