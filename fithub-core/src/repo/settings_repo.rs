use super::error::RepositoryError;
use crate::models::{Settings, UserData};
use crate::storage::{StorageKey, Store};

#[derive(Debug, Clone)]
pub struct SettingsRepository {
    store: Store,
}

impl SettingsRepository {
    pub fn new(store: Store) -> Self {
        Self { store }
    }

    pub async fn settings(&self) -> Result<Settings, RepositoryError> {
        Ok(self.store.get_as(StorageKey::Settings.as_str()).await?)
    }

    pub async fn save_settings(&self, settings: &Settings) -> Result<(), RepositoryError> {
        if settings.first_day_of_week > 6 {
            return Err(RepositoryError::Validation(format!(
                "First day of week must be 0-6, got {}",
                settings.first_day_of_week
            )));
        }
        self.store
            .set_as(StorageKey::Settings.as_str(), settings)
            .await?;
        Ok(())
    }

    pub async fn user_data(&self) -> Result<UserData, RepositoryError> {
        Ok(self.store.get_as(StorageKey::UserData.as_str()).await?)
    }

    pub async fn mark_welcome_seen(&self) -> Result<(), RepositoryError> {
        let mut data = self.user_data().await?;
        if data.has_seen_welcome {
            return Ok(());
        }
        data.has_seen_welcome = true;
        self.store
            .set_as(StorageKey::UserData.as_str(), &data)
            .await?;
        Ok(())
    }
}
