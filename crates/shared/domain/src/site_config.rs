//! Site-wide settings editable by admins.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::constants::{DEFAULT_MAX_ENTRY_LENGTH, DEFAULT_SITE_NAME, MAX_TITLE_LENGTH};
use crate::error::{DomainError, DomainResult};

/// Upper bound an admin may configure for entry length
const MAX_CONFIGURABLE_ENTRY_LENGTH: u32 = 1_000_000;

/// Site configuration singleton
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct SiteConfig {
    /// Name displayed by clients
    pub site_name: String,
    /// Optional banner message
    #[serde(default)]
    pub announcement: Option<String>,
    /// Whether new accounts may be registered
    pub registration_open: bool,
    /// Maximum diary content length in characters
    pub max_entry_length: u32,
    pub updated_at: DateTime<Utc>,
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            site_name: DEFAULT_SITE_NAME.to_string(),
            announcement: None,
            registration_open: true,
            max_entry_length: DEFAULT_MAX_ENTRY_LENGTH,
            updated_at: Utc::now(),
        }
    }
}

impl SiteConfig {
    /// Apply a patch, validating the resulting values.
    ///
    /// Nothing is changed when any field is rejected.
    pub fn apply(&mut self, patch: UpdateSiteConfig) -> DomainResult<()> {
        let mut next = self.clone();
        if let Some(name) = patch.site_name {
            let name = name.trim();
            if name.is_empty() || name.chars().count() > MAX_TITLE_LENGTH {
                return Err(DomainError::validation(format!(
                    "Site name must be between 1 and {} characters",
                    MAX_TITLE_LENGTH
                )));
            }
            next.site_name = name.to_string();
        }
        if let Some(announcement) = patch.announcement {
            // An empty announcement clears the banner
            next.announcement = Some(announcement).filter(|a| !a.trim().is_empty());
        }
        if let Some(open) = patch.registration_open {
            next.registration_open = open;
        }
        if let Some(max) = patch.max_entry_length {
            if max == 0 || max > MAX_CONFIGURABLE_ENTRY_LENGTH {
                return Err(DomainError::validation(format!(
                    "Maximum entry length must be between 1 and {}",
                    MAX_CONFIGURABLE_ENTRY_LENGTH
                )));
            }
            next.max_entry_length = max;
        }
        next.updated_at = Utc::now();
        *self = next;
        Ok(())
    }
}

/// Partial site configuration update
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct UpdateSiteConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub site_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub announcement: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub registration_open: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_entry_length: Option<u32>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_apply_patch() {
        let mut config = SiteConfig::default();
        config
            .apply(UpdateSiteConfig {
                site_name: Some("  Night Notes ".to_string()),
                announcement: Some("Maintenance on Sunday".to_string()),
                registration_open: Some(false),
                max_entry_length: Some(500),
            })
            .unwrap();

        assert_eq!(config.site_name, "Night Notes");
        assert_eq!(config.announcement.as_deref(), Some("Maintenance on Sunday"));
        assert!(!config.registration_open);
        assert_eq!(config.max_entry_length, 500);
    }

    #[test]
    fn test_empty_announcement_clears_banner() {
        let mut config = SiteConfig {
            announcement: Some("hello".to_string()),
            ..Default::default()
        };
        config
            .apply(UpdateSiteConfig {
                announcement: Some(String::new()),
                ..Default::default()
            })
            .unwrap();
        assert!(config.announcement.is_none());
    }

    #[test]
    fn test_rejects_invalid_values() {
        let mut config = SiteConfig::default();
        assert!(config
            .apply(UpdateSiteConfig {
                max_entry_length: Some(0),
                ..Default::default()
            })
            .is_err());
        assert!(config
            .apply(UpdateSiteConfig {
                site_name: Some("   ".to_string()),
                ..Default::default()
            })
            .is_err());
        assert_eq!(config.max_entry_length, DEFAULT_MAX_ENTRY_LENGTH);

        // a rejected field leaves the valid ones unapplied too
        assert!(config
            .apply(UpdateSiteConfig {
                site_name: Some("Renamed".to_string()),
                max_entry_length: Some(0),
                ..Default::default()
            })
            .is_err());
        assert_eq!(config.site_name, DEFAULT_SITE_NAME);
    }
}
