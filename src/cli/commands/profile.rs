use std::sync::Arc;

use crate::clients::identity::HttpIdentityProvider;
use crate::config::Config;
use crate::db::Store;
use crate::services::{ProfileService, SeaOrmProfileService};

async fn open_service(config: &Config) -> anyhow::Result<(Store, SeaOrmProfileService)> {
    let store = Store::new(&config.general.database_path).await?;
    let identity = Arc::new(HttpIdentityProvider::new(&config.identity)?);
    let service = SeaOrmProfileService::new(
        store.clone(),
        identity,
        config.identity.sign_in_url.clone(),
    );
    Ok((store, service))
}

pub async fn cmd_profile_list(config: &Config, limit: u64) -> anyhow::Result<()> {
    let (store, service) = open_service(config).await?;
    let profiles = service.list(limit).await?;

    if profiles.is_empty() {
        println!("No profiles yet. Profiles are created on a user's first visit.");
        return Ok(());
    }

    let total = store.profile_count().await?;
    println!("Profiles (showing {} of {total}):", profiles.len());
    println!("{:-<70}", "");

    for profile in profiles {
        println!("• {} (@{})", profile.name, profile.username);
        println!(
            "  User: {} | Email: {} | Created: {}",
            profile.user_id, profile.email, profile.created_at
        );
    }

    println!();
    println!("Use 'onboard profile show <user_id>' for details");
    Ok(())
}

pub async fn cmd_profile_show(config: &Config, user_id: &str) -> anyhow::Result<()> {
    let (_, service) = open_service(config).await?;
    let profile = service
        .find_by_user_id(user_id)
        .await?
        .ok_or_else(|| anyhow::anyhow!("No profile for user '{user_id}'"))?;

    println!("Profile #{}", profile.id);
    println!("{:-<70}", "");
    println!("User ID:   {}", profile.user_id);
    println!("Name:      {}", profile.name);
    println!("Username:  {}", profile.username);
    println!("Email:     {}", profile.email);
    println!("Image:     {}", profile.image_url);
    println!("Created:   {}", profile.created_at);

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::NewProfile;

    fn temp_config() -> Config {
        let db_path = std::env::temp_dir().join(format!(
            "onboard-cli-test-{}.db",
            uuid::Uuid::new_v4()
        ));
        let mut config = Config::default();
        config.general.database_path = format!("sqlite:{}", db_path.display());
        config
    }

    #[tokio::test]
    async fn test_profile_commands_read_through_service() {
        let config = temp_config();
        let (store, _) = open_service(&config).await.unwrap();

        cmd_profile_list(&config, 10).await.unwrap();
        let err = cmd_profile_show(&config, "u1").await.unwrap_err();
        assert!(err.to_string().contains("No profile for user 'u1'"));

        store
            .create_profile(NewProfile {
                user_id: "u1".to_string(),
                name: "Ada Lovelace".to_string(),
                email: "ada@x.com".to_string(),
                image_url: "http://img/a".to_string(),
                username: "ada1234".to_string(),
            })
            .await
            .unwrap();

        cmd_profile_list(&config, 10).await.unwrap();
        cmd_profile_show(&config, "u1").await.unwrap();
    }
}
