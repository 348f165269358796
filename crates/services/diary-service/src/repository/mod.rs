//! Repository layer for data access.

mod diary_repository;
pub mod entities;
mod notification_repository;
mod site_config_repository;
mod user_repository;

pub use diary_repository::{DiaryRepository, DiaryStore};
pub use notification_repository::{NotificationRepository, NotificationStore};
pub use site_config_repository::{SiteConfigRepository, SiteConfigStore};
pub use user_repository::{UserRepository, UserStore};

#[cfg(any(test, feature = "test-utils"))]
pub use diary_repository::MockDiaryRepository;
#[cfg(any(test, feature = "test-utils"))]
pub use notification_repository::MockNotificationRepository;
#[cfg(any(test, feature = "test-utils"))]
pub use site_config_repository::MockSiteConfigRepository;
#[cfg(any(test, feature = "test-utils"))]
pub use user_repository::MockUserRepository;
