use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;
use validator::Validate;

/// Row as stored, including the password hash. Never serialized.
#[derive(Debug, Clone, FromRow)]
pub struct UserRecord {
    pub id: Uuid,
    pub email: String,
    pub first_name: String,
    pub middle_name: String,
    pub last_name: String,
    pub avatar_url: Option<String>,
    pub hashed_password: String,
    pub role_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Sanitized user, safe to return from the API.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: Uuid,
    pub email: String,
    pub first_name: String,
    pub middle_name: String,
    pub last_name: String,
    pub avatar_url: Option<String>,
    pub role_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<UserRecord> for User {
    fn from(record: UserRecord) -> Self {
        Self {
            id: record.id,
            email: record.email,
            first_name: record.first_name,
            middle_name: record.middle_name,
            last_name: record.last_name,
            avatar_url: record.avatar_url,
            role_id: record.role_id,
            created_at: record.created_at,
            updated_at: record.updated_at,
        }
    }
}

/// The user as carried inside the session cookie.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SessionUser {
    pub id: Uuid,
    pub first_name: String,
    pub middle_name: String,
    pub last_name: String,
    pub avatar_url: Option<String>,
    /// Role title, if the user has a role.
    pub role: Option<String>,
    pub email: String,
    pub created_at: DateTime<Utc>,
}

/// Flat row of the user listing; the role title comes from a join.
#[derive(Debug, Clone, FromRow)]
pub struct UserListRow {
    pub id: Uuid,
    pub first_name: String,
    pub middle_name: String,
    pub last_name: String,
    pub role_id: Option<Uuid>,
    pub email: String,
    pub created_at: DateTime<Utc>,
    pub role_title: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserListItem {
    pub id: Uuid,
    pub first_name: String,
    pub middle_name: String,
    pub last_name: String,
    pub role_id: Option<Uuid>,
    pub email: String,
    pub created_at: DateTime<Utc>,
    pub role: Option<RoleTitle>,
}

#[derive(Debug, Clone, Serialize)]
pub struct RoleTitle {
    pub title: String,
}

impl From<UserListRow> for UserListItem {
    fn from(row: UserListRow) -> Self {
        Self {
            id: row.id,
            first_name: row.first_name,
            middle_name: row.middle_name,
            last_name: row.last_name,
            role_id: row.role_id,
            email: row.email,
            created_at: row.created_at,
            role: row.role_title.map(|title| RoleTitle { title }),
        }
    }
}

/// Admin create/update form for a user.
#[derive(Debug, Clone, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase", default)]
pub struct UserForm {
    #[validate(email(message = "Invalid email address"))]
    pub email: String,
    #[validate(length(min = 3, message = "First name is required with at least 3 characters"))]
    pub first_name: String,
    #[validate(length(min = 1, message = "Middle name is required with at least 1 character"))]
    pub middle_name: String,
    #[validate(length(min = 3, message = "Last name is required with at least 3 characters"))]
    pub last_name: String,
}

#[derive(Debug, Clone, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase", default)]
pub struct RegisterRequest {
    #[validate(email(message = "Invalid email address"))]
    pub email: String,
    #[validate(length(min = 8, message = "Password must contain at least 8 characters"))]
    pub password: String,
    #[validate(must_match(other = "password", message = "Passwords do not match"))]
    pub confirm_password: String,
    #[validate(length(min = 3, message = "First name is required with at least 3 characters"))]
    pub first_name: String,
    #[validate(length(min = 1, message = "Middle name is required with at least 1 character"))]
    pub middle_name: String,
    #[validate(length(min = 3, message = "Last name is required with at least 3 characters"))]
    pub last_name: String,
}

#[derive(Debug, Clone, Default, Deserialize, Validate)]
#[serde(default)]
pub struct LoginRequest {
    #[validate(email(message = "Invalid email address"))]
    pub email: String,
    #[validate(length(min = 8, message = "Password must contain at least 8 characters"))]
    pub password: String,
}

#[derive(Debug, Clone, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase", default)]
pub struct ProfileUpdate {
    #[validate(email(message = "Invalid email address"))]
    pub email: String,
    #[validate(length(min = 3, message = "First name is required with at least 3 characters"))]
    pub first_name: String,
    #[validate(length(min = 1, message = "Middle name is required with at least 1 character"))]
    pub middle_name: String,
    #[validate(length(min = 3, message = "Last name is required with at least 3 characters"))]
    pub last_name: String,
    #[validate(url(message = "Avatar must be a valid URL"))]
    pub avatar_url: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase", default)]
pub struct AvatarUpdate {
    #[validate(url(message = "Avatar must be a valid URL"))]
    pub avatar_url: String,
}
