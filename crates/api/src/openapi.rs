//! OpenAPI documentation.

use utoipa::{
    openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme},
    Modify, OpenApi,
};

use crate::handlers::admin_handler::{ChangeRoleRequest, HideDiaryRequest};
use crate::handlers::auth_handler::{LoginRequest, RefreshRequest, RegisterRequest};
use domain::pagination::{DiaryPage, NotificationPage, UserPage};
use domain::{
    CreateDiary, DiaryResponse, DiaryStatus, NotificationKind, NotificationResponse,
    PaginationMeta, SiteConfig, TokenPair, UnreadCount, UpdateDiary, UpdateSiteConfig,
    UserResponse, UserRole, Visibility,
};

/// API documentation struct.
#[derive(OpenApi)]
#[openapi(
    paths(
        crate::handlers::auth_handler::register,
        crate::handlers::auth_handler::login,
        crate::handlers::auth_handler::refresh,
        crate::handlers::auth_handler::logout,
        crate::handlers::auth_handler::me,
        crate::handlers::diary_handler::list_my_diaries,
        crate::handlers::diary_handler::public_diaries,
        crate::handlers::diary_handler::create_diary,
        crate::handlers::diary_handler::get_diary,
        crate::handlers::diary_handler::update_diary,
        crate::handlers::diary_handler::delete_diary,
        crate::handlers::notification_handler::list_notifications,
        crate::handlers::notification_handler::unread_count,
        crate::handlers::notification_handler::mark_read,
        crate::handlers::notification_handler::mark_all_read,
        crate::handlers::config_handler::get_config,
        crate::handlers::config_handler::update_config,
        crate::handlers::admin_handler::list_users,
        crate::handlers::admin_handler::change_role,
        crate::handlers::admin_handler::disable_user,
        crate::handlers::admin_handler::restore_user,
        crate::handlers::admin_handler::list_diaries,
        crate::handlers::admin_handler::hide_diary,
        crate::handlers::admin_handler::restore_diary,
    ),
    components(
        schemas(
            RegisterRequest,
            LoginRequest,
            RefreshRequest,
            TokenPair,
            UserResponse,
            UserRole,
            UserPage,
            CreateDiary,
            UpdateDiary,
            DiaryResponse,
            DiaryStatus,
            Visibility,
            DiaryPage,
            NotificationKind,
            NotificationResponse,
            NotificationPage,
            UnreadCount,
            PaginationMeta,
            SiteConfig,
            UpdateSiteConfig,
            ChangeRoleRequest,
            HideDiaryRequest,
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Authentication", description = "Registration, login and token refresh"),
        (name = "Diaries", description = "Diary entries"),
        (name = "Notifications", description = "In-app notifications"),
        (name = "Config", description = "Site configuration"),
        (name = "Admin", description = "User and content moderation"),
    )
)]
pub struct ApiDoc;

/// Security scheme modifier.
struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_document_lists_every_route() {
        let doc = ApiDoc::openapi();
        for path in [
            "/auth/login",
            "/auth/refresh",
            "/diaries/{id}",
            "/notifications/read-all",
            "/config",
            "/admin/diaries/{id}/hide",
        ] {
            assert!(doc.paths.paths.contains_key(path), "missing {}", path);
        }
    }
}
