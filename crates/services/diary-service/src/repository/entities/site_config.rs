//! Site configuration row for SeaORM. The table holds at most one row.

use sea_orm::entity::prelude::*;

use domain::SiteConfig;

/// Primary key of the only row
pub const SITE_CONFIG_ROW_ID: i32 = 1;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "site_config")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: i32,
    pub site_name: String,
    #[sea_orm(column_type = "Text", nullable)]
    pub announcement: Option<String>,
    pub registration_open: bool,
    pub max_entry_length: i32,
    pub updated_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

impl From<Model> for SiteConfig {
    fn from(model: Model) -> Self {
        SiteConfig {
            site_name: model.site_name,
            announcement: model.announcement,
            registration_open: model.registration_open,
            max_entry_length: u32::try_from(model.max_entry_length).unwrap_or(0),
            updated_at: model.updated_at,
        }
    }
}
