use serde::Serialize;
use tracing::info;

use super::client::{BackendClient, BackendError};
use super::query::eq;
use crate::models::{OnboardingProfile, Profile, ProfileUpdate};

const PROFILES: &str = "profiles";

#[derive(Serialize)]
struct StampedUpdate<'a> {
    #[serde(flatten)]
    update: &'a ProfileUpdate,
    updated_at: String,
}

#[derive(Serialize)]
struct OnboardingRow<'a> {
    id: &'a str,
    username: &'a str,
    full_name: &'a str,
    bio: &'a str,
    is_artist: bool,
    art_styles: &'a [String],
    location: &'a str,
    updated_at: String,
}

impl BackendClient {
    pub async fn get_profile(&self, user_id: &str) -> Result<Option<Profile>, BackendError> {
        self.select_one(PROFILES, &[("select", "*".to_string()), ("id", eq(user_id))])
            .await
    }

    pub async fn my_profile(&self) -> Result<Option<Profile>, BackendError> {
        let session = self.require_session()?;
        self.get_profile(&session.user_id).await
    }

    pub async fn update_profile(&self, update: &ProfileUpdate) -> Result<(), BackendError> {
        let session = self.require_session()?;
        self.update(
            PROFILES,
            &[("id", eq(&session.user_id))],
            &StampedUpdate {
                update,
                updated_at: chrono::Utc::now().to_rfc3339(),
            },
        )
        .await?;
        info!("Updated profile {}", session.user_id);
        Ok(())
    }

    /// True when the signed-in user has no profile or an incomplete one.
    pub async fn needs_onboarding(&self) -> Result<bool, BackendError> {
        Ok(!self.my_profile().await?.is_some_and(|p| p.is_complete()))
    }

    pub async fn complete_onboarding(
        &self,
        profile: &OnboardingProfile,
    ) -> Result<(), BackendError> {
        let session = self.require_session()?;
        validate_onboarding(profile)?;

        self.upsert(
            PROFILES,
            &OnboardingRow {
                id: &session.user_id,
                username: profile.username.trim(),
                full_name: profile.full_name.trim(),
                bio: profile.bio.trim(),
                is_artist: profile.is_artist,
                art_styles: &profile.art_styles,
                location: profile.location.trim(),
                updated_at: chrono::Utc::now().to_rfc3339(),
            },
        )
        .await?;
        info!("Completed onboarding for {}", session.user_id);
        Ok(())
    }
}

fn validate_onboarding(profile: &OnboardingProfile) -> Result<(), BackendError> {
    let username = profile.username.trim();
    if username.is_empty() {
        return Err(BackendError::InvalidInput("username is required".into()));
    }
    if username.chars().any(char::is_whitespace) {
        return Err(BackendError::InvalidInput(
            "username cannot contain spaces".into(),
        ));
    }
    if profile.full_name.trim().is_empty() {
        return Err(BackendError::InvalidInput("full name is required".into()));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn onboarding(username: &str, full_name: &str) -> OnboardingProfile {
        OnboardingProfile {
            username: username.into(),
            full_name: full_name.into(),
            ..Default::default()
        }
    }

    #[test]
    fn onboarding_validation() {
        assert!(validate_onboarding(&onboarding("asha", "Asha Devi")).is_ok());
        assert!(validate_onboarding(&onboarding("", "Asha Devi")).is_err());
        assert!(validate_onboarding(&onboarding("asha devi", "Asha Devi")).is_err());
        assert!(validate_onboarding(&onboarding("asha", "  ")).is_err());
    }

    #[test]
    fn stamped_update_flattens_fields() {
        let update = ProfileUpdate {
            location: Some("Bihar".into()),
            ..Default::default()
        };
        let value = serde_json::to_value(StampedUpdate {
            update: &update,
            updated_at: "2024-01-01T00:00:00+00:00".into(),
        })
        .unwrap();
        assert_eq!(
            value,
            serde_json::json!({"location": "Bihar", "updated_at": "2024-01-01T00:00:00+00:00"})
        );
    }
}
