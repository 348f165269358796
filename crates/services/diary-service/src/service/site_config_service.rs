//! Site configuration service.

use async_trait::async_trait;
use std::sync::Arc;

use common::AppResult;
use domain::{SiteConfig, UpdateSiteConfig};

use crate::repository::SiteConfigRepository;

#[async_trait]
pub trait SiteConfigService: Send + Sync {
    async fn get(&self) -> AppResult<SiteConfig>;

    /// Validate and persist a partial update
    async fn update(&self, patch: UpdateSiteConfig) -> AppResult<SiteConfig>;
}

pub struct SiteConfigManager {
    repo: Arc<dyn SiteConfigRepository>,
}

impl SiteConfigManager {
    pub fn new(repo: Arc<dyn SiteConfigRepository>) -> Self {
        Self { repo }
    }
}

#[async_trait]
impl SiteConfigService for SiteConfigManager {
    async fn get(&self) -> AppResult<SiteConfig> {
        self.repo.get().await
    }

    async fn update(&self, patch: UpdateSiteConfig) -> AppResult<SiteConfig> {
        let mut config = self.repo.get().await?;
        config.apply(patch)?;
        let saved = self.repo.save(config).await?;
        tracing::info!(
            registration_open = saved.registration_open,
            max_entry_length = saved.max_entry_length,
            "Site configuration updated"
        );
        Ok(saved)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::MockSiteConfigRepository;

    #[tokio::test]
    async fn test_invalid_patch_is_not_saved() {
        let mut repo = MockSiteConfigRepository::new();
        repo.expect_get().returning(|| Ok(SiteConfig::default()));
        repo.expect_save().never();

        let service = SiteConfigManager::new(Arc::new(repo));
        let result = service
            .update(UpdateSiteConfig {
                max_entry_length: Some(0),
                ..Default::default()
            })
            .await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_valid_patch_is_saved() {
        let mut repo = MockSiteConfigRepository::new();
        repo.expect_get().returning(|| Ok(SiteConfig::default()));
        repo.expect_save()
            .withf(|config| !config.registration_open)
            .returning(Ok);

        let service = SiteConfigManager::new(Arc::new(repo));
        let config = service
            .update(UpdateSiteConfig {
                registration_open: Some(false),
                ..Default::default()
            })
            .await
            .unwrap();
        assert!(!config.registration_open);
    }
}
