//! Site configuration repository.

use async_trait::async_trait;
use sea_orm::{ActiveModelTrait, DatabaseConnection, EntityTrait, Set};

use super::entities::site_config::{ActiveModel, Entity as SiteConfigEntity, SITE_CONFIG_ROW_ID};
use common::{AppError, AppResult};
use domain::SiteConfig;

#[cfg(any(test, feature = "test-utils"))]
use mockall::automock;

#[cfg_attr(any(test, feature = "test-utils"), automock)]
#[async_trait]
pub trait SiteConfigRepository: Send + Sync {
    /// Current configuration; defaults when nothing has been saved yet
    async fn get(&self) -> AppResult<SiteConfig>;

    /// Insert or replace the configuration row
    async fn save(&self, config: SiteConfig) -> AppResult<SiteConfig>;
}

pub struct SiteConfigStore {
    db: DatabaseConnection,
}

impl SiteConfigStore {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

#[async_trait]
impl SiteConfigRepository for SiteConfigStore {
    async fn get(&self) -> AppResult<SiteConfig> {
        let row = SiteConfigEntity::find_by_id(SITE_CONFIG_ROW_ID)
            .one(&self.db)
            .await?;
        Ok(row.map(SiteConfig::from).unwrap_or_default())
    }

    async fn save(&self, config: SiteConfig) -> AppResult<SiteConfig> {
        let max_entry_length = i32::try_from(config.max_entry_length)
            .map_err(|_| AppError::validation("Maximum entry length is too large"))?;

        let existing = SiteConfigEntity::find_by_id(SITE_CONFIG_ROW_ID)
            .one(&self.db)
            .await?;

        let active = ActiveModel {
            id: Set(SITE_CONFIG_ROW_ID),
            site_name: Set(config.site_name),
            announcement: Set(config.announcement),
            registration_open: Set(config.registration_open),
            max_entry_length: Set(max_entry_length),
            updated_at: Set(config.updated_at),
        };

        let model = match existing {
            Some(_) => active.update(&self.db).await?,
            None => active.insert(&self.db).await?,
        };
        Ok(SiteConfig::from(model))
    }
}
