//! Use-case services built on the repositories.

mod diary_service;
mod moderation_service;
mod notification_service;
mod site_config_service;
mod user_service;

pub use diary_service::{DiaryManager, DiaryService};
pub use moderation_service::{ModerationService, Moderator};
pub use notification_service::{NotificationManager, NotificationService};
pub use site_config_service::{SiteConfigManager, SiteConfigService};
pub use user_service::{UserManager, UserService};
