//! Domain-level constants.
//!
//! These constants define business rules and validation requirements.

// =============================================================================
// User Roles
// =============================================================================

/// Default role assigned to new users
pub const ROLE_USER: &str = "user";

/// Administrator role with elevated privileges
pub const ROLE_ADMIN: &str = "admin";

/// All valid role values
pub const VALID_ROLES: &[&str] = &[ROLE_USER, ROLE_ADMIN];

/// Check if a role value is valid
pub fn is_valid_role(role: &str) -> bool {
    VALID_ROLES.contains(&role)
}

// =============================================================================
// Validation
// =============================================================================

/// Minimum password length requirement
pub const MIN_PASSWORD_LENGTH: usize = 8;

/// Minimum name length requirement
pub const MIN_NAME_LENGTH: usize = 1;

/// Maximum diary title length in characters
pub const MAX_TITLE_LENGTH: usize = 200;

/// Maximum length of the mood and weather labels
pub const MAX_LABEL_LENGTH: usize = 32;

/// Default maximum diary content length in characters
pub const DEFAULT_MAX_ENTRY_LENGTH: u32 = 20_000;

/// Default site name shown by clients
pub const DEFAULT_SITE_NAME: &str = "My Diary";

// =============================================================================
// Authentication
// =============================================================================

/// Default access token lifetime in minutes
pub const DEFAULT_ACCESS_TOKEN_TTL_MINUTES: i64 = 15;

/// Default refresh token lifetime in days
pub const DEFAULT_REFRESH_TOKEN_TTL_DAYS: i64 = 7;

/// Minimum JWT secret length (security requirement)
pub const MIN_JWT_SECRET_LENGTH: usize = 32;

/// Seconds per minute (for token expiration calculation)
pub const SECONDS_PER_MINUTE: i64 = 60;

/// Seconds per day (for token expiration calculation)
pub const SECONDS_PER_DAY: i64 = 86_400;

/// Authorization header prefix for Bearer tokens
pub const BEARER_TOKEN_PREFIX: &str = "Bearer ";

/// JWT token type identifier
pub const TOKEN_TYPE_BEARER: &str = "Bearer";

// =============================================================================
// Pagination
// =============================================================================

/// Default number of items per page
pub const DEFAULT_PAGE_SIZE: u64 = 20;

/// Maximum allowed items per page to prevent excessive queries
pub const MAX_PAGE_SIZE: u64 = 100;

/// Default starting page number (1-indexed)
pub const DEFAULT_PAGE_NUMBER: u64 = 1;

/// Highest page number served; larger requests read this page instead
pub const MAX_PAGE_NUMBER: u64 = 1_000_000;
