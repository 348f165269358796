//! Diary entry entity, visibility rules and DTOs.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::constants::{MAX_LABEL_LENGTH, MAX_TITLE_LENGTH};
use crate::error::{DomainError, DomainResult};

/// Who may read an entry besides its author.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "lowercase")]
pub enum Visibility {
    #[default]
    Private,
    Public,
}

impl Visibility {
    pub fn as_str(&self) -> &'static str {
        match self {
            Visibility::Private => "private",
            Visibility::Public => "public",
        }
    }
}

impl From<&str> for Visibility {
    fn from(s: &str) -> Self {
        match s {
            "public" => Visibility::Public,
            _ => Visibility::Private,
        }
    }
}

/// Moderation state of an entry.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "lowercase")]
pub enum DiaryStatus {
    #[default]
    Published,
    /// Taken down by an admin; only the author and admins can still see it.
    Hidden,
}

impl DiaryStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            DiaryStatus::Published => "published",
            DiaryStatus::Hidden => "hidden",
        }
    }
}

impl From<&str> for DiaryStatus {
    fn from(s: &str) -> Self {
        match s {
            "hidden" => DiaryStatus::Hidden,
            _ => DiaryStatus::Published,
        }
    }
}

impl std::fmt::Display for DiaryStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Diary entry domain entity
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Diary {
    pub id: Uuid,
    pub author_id: Uuid,
    pub title: String,
    pub content: String,
    pub mood: Option<String>,
    pub weather: Option<String>,
    pub visibility: Visibility,
    pub status: DiaryStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub deleted_at: Option<DateTime<Utc>>,
}

impl Diary {
    /// Check whether the viewer may read this entry.
    ///
    /// The author and admins always can; everyone else only sees
    /// public, published, non-deleted entries.
    pub fn can_view(&self, viewer_id: Uuid, viewer_is_admin: bool) -> bool {
        if self.deleted_at.is_some() {
            return viewer_is_admin;
        }
        if viewer_is_admin || self.is_owned_by(viewer_id) {
            return true;
        }
        self.visibility == Visibility::Public && self.status == DiaryStatus::Published
    }

    pub fn is_owned_by(&self, user_id: Uuid) -> bool {
        self.author_id == user_id
    }

    pub fn is_hidden(&self) -> bool {
        self.status == DiaryStatus::Hidden
    }
}

fn validate_title(title: &str) -> DomainResult<()> {
    let title = title.trim();
    if title.is_empty() {
        return Err(DomainError::validation("Title is required"));
    }
    if title.chars().count() > MAX_TITLE_LENGTH {
        return Err(DomainError::validation(format!(
            "Title must be at most {} characters",
            MAX_TITLE_LENGTH
        )));
    }
    Ok(())
}

fn validate_content(content: &str, max_length: u32) -> DomainResult<()> {
    if content.chars().count() > max_length as usize {
        return Err(DomainError::validation(format!(
            "Content must be at most {} characters",
            max_length
        )));
    }
    Ok(())
}

fn validate_label(field: &str, value: Option<&str>) -> DomainResult<()> {
    match value {
        Some(v) if v.chars().count() > MAX_LABEL_LENGTH => Err(DomainError::validation(format!(
            "{} must be at most {} characters",
            field, MAX_LABEL_LENGTH
        ))),
        _ => Ok(()),
    }
}

/// Diary creation data transfer object
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct CreateDiary {
    /// Entry title
    pub title: String,
    /// Entry body
    #[serde(default)]
    pub content: String,
    /// Optional mood label
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mood: Option<String>,
    /// Optional weather label
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub weather: Option<String>,
    /// Defaults to private
    #[serde(default)]
    pub visibility: Visibility,
}

impl CreateDiary {
    /// Validate against the site's maximum entry length.
    pub fn validate(&self, max_entry_length: u32) -> DomainResult<()> {
        validate_title(&self.title)?;
        validate_content(&self.content, max_entry_length)?;
        validate_label("Mood", self.mood.as_deref())?;
        validate_label("Weather", self.weather.as_deref())
    }
}

/// Partial diary update; absent fields are left unchanged.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct UpdateDiary {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mood: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub weather: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub visibility: Option<Visibility>,
}

impl UpdateDiary {
    pub fn validate(&self, max_entry_length: u32) -> DomainResult<()> {
        if let Some(title) = &self.title {
            validate_title(title)?;
        }
        if let Some(content) = &self.content {
            validate_content(content, max_entry_length)?;
        }
        validate_label("Mood", self.mood.as_deref())?;
        validate_label("Weather", self.weather.as_deref())
    }

    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.content.is_none()
            && self.mood.is_none()
            && self.weather.is_none()
            && self.visibility.is_none()
    }
}

/// Diary response (safe to return to client)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct DiaryResponse {
    pub id: Uuid,
    pub author_id: Uuid,
    pub title: String,
    pub content: String,
    #[serde(default)]
    pub mood: Option<String>,
    #[serde(default)]
    pub weather: Option<String>,
    pub visibility: Visibility,
    pub status: DiaryStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<Diary> for DiaryResponse {
    fn from(diary: Diary) -> Self {
        Self {
            id: diary.id,
            author_id: diary.author_id,
            title: diary.title,
            content: diary.content,
            mood: diary.mood,
            weather: diary.weather,
            visibility: diary.visibility,
            status: diary.status,
            created_at: diary.created_at,
            updated_at: diary.updated_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn diary(author_id: Uuid, visibility: Visibility, status: DiaryStatus) -> Diary {
        let now = Utc::now();
        Diary {
            id: Uuid::new_v4(),
            author_id,
            title: "Monday".to_string(),
            content: "Rained all day.".to_string(),
            mood: Some("calm".to_string()),
            weather: Some("rain".to_string()),
            visibility,
            status,
            created_at: now,
            updated_at: now,
            deleted_at: None,
        }
    }

    #[test]
    fn test_author_sees_own_private_entry() {
        let author = Uuid::new_v4();
        let entry = diary(author, Visibility::Private, DiaryStatus::Published);
        assert!(entry.can_view(author, false));
        assert!(!entry.can_view(Uuid::new_v4(), false));
    }

    #[test]
    fn test_public_entry_visible_until_hidden() {
        let author = Uuid::new_v4();
        let stranger = Uuid::new_v4();
        let mut entry = diary(author, Visibility::Public, DiaryStatus::Published);
        assert!(entry.can_view(stranger, false));

        entry.status = DiaryStatus::Hidden;
        assert!(!entry.can_view(stranger, false));
        assert!(entry.can_view(author, false));
        assert!(entry.can_view(stranger, true));
    }

    #[test]
    fn test_deleted_entry_only_visible_to_admins() {
        let author = Uuid::new_v4();
        let mut entry = diary(author, Visibility::Public, DiaryStatus::Published);
        entry.deleted_at = Some(Utc::now());
        assert!(!entry.can_view(author, false));
        assert!(entry.can_view(Uuid::new_v4(), true));
    }

    #[test]
    fn test_create_validation() {
        let mut input = CreateDiary {
            title: "  ".to_string(),
            content: "body".to_string(),
            ..Default::default()
        };
        assert!(input.validate(100).is_err());

        input.title = "Title".to_string();
        assert!(input.validate(100).is_ok());
        assert!(input.validate(3).is_err());

        input.mood = Some("x".repeat(MAX_LABEL_LENGTH + 1));
        assert!(input.validate(100).is_err());
    }

    #[test]
    fn test_update_validation_only_checks_present_fields() {
        let patch = UpdateDiary {
            visibility: Some(Visibility::Public),
            ..Default::default()
        };
        assert!(patch.validate(1).is_ok());
        assert!(!patch.is_empty());
        assert!(UpdateDiary::default().is_empty());

        let patch = UpdateDiary {
            title: Some(String::new()),
            ..Default::default()
        };
        assert!(patch.validate(100).is_err());
    }

    #[test]
    fn test_enum_string_forms() {
        assert_eq!(Visibility::from("public"), Visibility::Public);
        assert_eq!(Visibility::from("bogus"), Visibility::Private);
        assert_eq!(DiaryStatus::from("hidden"), DiaryStatus::Hidden);
        assert_eq!(DiaryStatus::Published.as_str(), "published");
        assert_eq!(
            serde_json::to_string(&Visibility::Public).unwrap(),
            "\"public\""
        );
    }
}
