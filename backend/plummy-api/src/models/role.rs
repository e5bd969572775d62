use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Role {
    pub id: Uuid,
    pub title: String,
    pub position: i32,
    pub permissions: serde_json::Value,
    /// Display order of the role's members.
    pub user_ids: Vec<Uuid>,
    pub created_by_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, FromRow)]
pub struct RoleListRow {
    pub id: Uuid,
    pub title: String,
    pub position: i32,
    pub created_at: DateTime<Utc>,
    pub creator_first_name: Option<String>,
    pub creator_middle_name: Option<String>,
    pub creator_last_name: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RoleListItem {
    pub id: Uuid,
    pub title: String,
    pub position: i32,
    pub created_at: DateTime<Utc>,
    pub created_by: Option<CreatorName>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatorName {
    pub first_name: String,
    pub middle_name: String,
    pub last_name: String,
}

impl From<RoleListRow> for RoleListItem {
    fn from(row: RoleListRow) -> Self {
        let created_by = row.creator_first_name.map(|first_name| CreatorName {
            first_name,
            middle_name: row.creator_middle_name.unwrap_or_default(),
            last_name: row.creator_last_name.unwrap_or_default(),
        });
        Self {
            id: row.id,
            title: row.title,
            position: row.position,
            created_at: row.created_at,
            created_by,
        }
    }
}

/// A member as listed on the role permissions page.
#[derive(Debug, Clone, FromRow, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct RoleMember {
    pub id: Uuid,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub avatar_url: Option<String>,
    pub role_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
}

impl RoleMember {
    pub fn matches(&self, needle_lower: &str) -> bool {
        self.first_name.to_lowercase().contains(needle_lower)
            || self.last_name.to_lowercase().contains(needle_lower)
            || self.email.to_lowercase().contains(needle_lower)
    }
}

/// Role with its members in display order.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RoleWithMembers {
    pub id: Uuid,
    pub title: String,
    pub position: i32,
    pub permissions: serde_json::Value,
    pub user_ids: Vec<Uuid>,
    pub users: Vec<RoleMember>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total_count: Option<usize>,
}

#[derive(Debug, Clone, FromRow, Serialize)]
pub struct RolePermissions {
    pub title: String,
    pub permissions: serde_json::Value,
}

/// Option for the role facet filter on the users table.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct RoleFacet {
    pub value: String,
    pub label: String,
    pub icon: &'static str,
}

impl RoleFacet {
    pub fn for_title(title: String) -> Self {
        Self {
            value: title.clone(),
            label: title,
            icon: "lucide:circle-user",
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize, Validate)]
#[serde(default)]
pub struct RoleForm {
    #[validate(length(min = 3, message = "Title is required with at least 3 characters"))]
    pub title: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn role_form_requires_three_characters() {
        assert!(RoleForm { title: "QA".into() }.validate().is_err());
        assert!(RoleForm { title: "Manager".into() }.validate().is_ok());
    }

    #[test]
    fn list_item_without_creator() {
        let item = RoleListItem::from(RoleListRow {
            id: Uuid::new_v4(),
            title: "User".into(),
            position: 1,
            created_at: Utc::now(),
            creator_first_name: None,
            creator_middle_name: None,
            creator_last_name: None,
        });
        let json = serde_json::to_value(item).unwrap();
        assert!(json["createdBy"].is_null());
    }

    #[test]
    fn member_search_is_case_insensitive() {
        let member = RoleMember {
            id: Uuid::new_v4(),
            first_name: "Grace".into(),
            last_name: "Hopper".into(),
            email: "grace@navy.mil".into(),
            avatar_url: None,
            role_id: None,
            created_at: Utc::now(),
        };
        assert!(member.matches("hop"));
        assert!(member.matches("navy"));
        assert!(!member.matches("ada"));
    }
}
