//! Domain layer - Core business entities and value objects.
//!
//! This crate contains pure domain logic with no infrastructure dependencies.
//! The wire types (`TokenPair`, `*Response`) are shared by the HTTP API and
//! the client so both sides agree on the JSON shapes.

pub mod auth;
pub mod constants;
pub mod diary;
pub mod error;
pub mod notification;
pub mod pagination;
pub mod password;
pub mod site_config;
pub mod user;

pub use auth::{Claims, TokenKind, TokenPair};
pub use constants::*;
pub use diary::{CreateDiary, Diary, DiaryResponse, DiaryStatus, UpdateDiary, Visibility};
pub use error::{DomainError, DomainResult};
pub use notification::{Notification, NotificationKind, NotificationResponse, UnreadCount};
pub use pagination::{Paginated, PaginationMeta, PaginationParams};
pub use password::Password;
pub use site_config::{SiteConfig, UpdateSiteConfig};
pub use user::{User, UserResponse, UserRole};
