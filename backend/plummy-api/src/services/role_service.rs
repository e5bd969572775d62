// Role service - roles, permission documents, positions and member order
use std::collections::{HashMap, HashSet};

use uuid::Uuid;

use crate::db::Database;
use crate::error::{AppError, FieldErrors, Result};
use crate::listing::{self, ListQuery, Paginated, ROLE_LISTING};
use crate::models::{
    Role, RoleFacet, RoleForm, RoleListItem, RoleListRow, RoleMember, RolePermissions, RoleWithMembers,
};

pub const TITLE_TAKEN: &str = "Title already exists";
pub const DEFAULT_MEMBER_TAKE: usize = 100;

const MEMBER_QUERY: &str = r#"
    SELECT id, first_name, last_name, email, avatar_url, role_id, created_at
    FROM users
    WHERE role_id = $1
    ORDER BY created_at ASC
"#;

pub struct RoleService {
    db: Database,
}

/// Submitted order first (duplicates collapsed), then the existing ids that
/// were not submitted, in their existing relative order.
pub fn merge_member_order(submitted: &[Uuid], existing: &[Uuid]) -> Vec<Uuid> {
    let mut seen = HashSet::with_capacity(submitted.len() + existing.len());
    submitted
        .iter()
        .chain(existing.iter())
        .filter(|id| seen.insert(**id))
        .copied()
        .collect()
}

/// Members in `user_ids` order; members missing from `user_ids` follow in
/// the order given (creation time). Ids that are not members are dropped.
pub fn order_members(user_ids: &[Uuid], members: Vec<RoleMember>) -> Vec<RoleMember> {
    let listed: HashSet<Uuid> = user_ids.iter().copied().collect();
    let mut by_id = HashMap::with_capacity(members.len());
    let mut unlisted = Vec::new();
    for member in members {
        if listed.contains(&member.id) {
            by_id.insert(member.id, member);
        } else {
            unlisted.push(member);
        }
    }

    let mut ordered: Vec<RoleMember> = user_ids.iter().filter_map(|id| by_id.remove(id)).collect();
    ordered.extend(unlisted);
    ordered
}

/// Case-insensitive search over names and email, then a `skip`/`take` slice.
/// Returns the slice and the number of members that matched.
pub fn page_members(members: Vec<RoleMember>, search: Option<&str>, skip: usize, take: usize) -> (Vec<RoleMember>, usize) {
    let needle = search.map(str::trim).filter(|s| !s.is_empty()).map(str::to_lowercase);
    let matched: Vec<RoleMember> = match needle {
        Some(needle) => members.into_iter().filter(|m| m.matches(&needle)).collect(),
        None => members,
    };
    let total = matched.len();
    (matched.into_iter().skip(skip).take(take).collect(), total)
}

/// Parses a JSON array of uuids.
pub fn parse_id_list(body: &serde_json::Value) -> Result<Vec<Uuid>> {
    let items = body
        .as_array()
        .ok_or_else(|| AppError::BadRequest("Expected a JSON array of ids".to_string()))?;
    items
        .iter()
        .map(|item| {
            item.as_str()
                .and_then(|s| Uuid::parse_str(s).ok())
                .ok_or_else(|| AppError::BadRequest(format!("Invalid id: {}", item)))
        })
        .collect()
}

impl RoleService {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    pub async fn list(&self, query: &ListQuery) -> Result<Paginated<RoleListItem>> {
        let (rows, total) = listing::fetch_page::<RoleListRow>(&self.db.pg, &ROLE_LISTING, query).await?;
        Ok(Paginated::new(rows, total, query).map(RoleListItem::from))
    }

    pub async fn all_by_position(&self) -> Result<Vec<Role>> {
        let roles = sqlx::query_as::<_, Role>("SELECT * FROM roles ORDER BY position ASC")
            .fetch_all(&self.db.pg)
            .await?;
        Ok(roles)
    }

    pub async fn facets(&self) -> Result<Vec<RoleFacet>> {
        let titles: Vec<String> = sqlx::query_scalar("SELECT title FROM roles ORDER BY position ASC")
            .fetch_all(&self.db.pg)
            .await?;
        Ok(titles.into_iter().map(RoleFacet::for_title).collect())
    }

    async fn title_taken(&self, title: &str, exclude: Option<Uuid>) -> Result<bool> {
        let taken: bool = sqlx::query_scalar(
            "SELECT EXISTS(SELECT 1 FROM roles WHERE title = $1 AND ($2::uuid IS NULL OR id <> $2))",
        )
        .bind(title)
        .bind(exclude)
        .fetch_one(&self.db.pg)
        .await?;
        Ok(taken)
    }

    async fn check_form(&self, form: &RoleForm, exclude: Option<Uuid>) -> Result<()> {
        let mut errors = FieldErrors::of(form);
        if errors.get("title").is_none() && self.title_taken(&form.title, exclude).await? {
            errors.add("title", TITLE_TAKEN);
        }
        errors.into_result()
    }

    /// New roles go to the end of the position order.
    pub async fn create(&self, form: RoleForm, created_by: Uuid) -> Result<Role> {
        self.check_form(&form, None).await?;

        let role = sqlx::query_as::<_, Role>(
            r#"
            INSERT INTO roles (title, created_by_id, position)
            VALUES ($1, $2, (SELECT COALESCE(MAX(position), 0) + 1 FROM roles))
            RETURNING *
            "#,
        )
        .bind(&form.title)
        .bind(created_by)
        .fetch_one(&self.db.pg)
        .await
        .map_err(title_conflict)?;

        tracing::info!(role_id = %role.id, title = %role.title, "Role created");
        Ok(role)
    }

    pub async fn update(&self, id: Uuid, form: RoleForm) -> Result<Role> {
        self.check_form(&form, Some(id)).await?;

        sqlx::query_as::<_, Role>("UPDATE roles SET title = $2, updated_at = NOW() WHERE id = $1 RETURNING *")
            .bind(id)
            .bind(&form.title)
            .fetch_optional(&self.db.pg)
            .await
            .map_err(title_conflict)?
            .ok_or_else(|| AppError::NotFound("Role not found".to_string()))
    }

    /// Members keep their accounts; their `role_id` is cleared by the foreign key.
    pub async fn delete(&self, id: Uuid) -> Result<Role> {
        let role = sqlx::query_as::<_, Role>("DELETE FROM roles WHERE id = $1 RETURNING *")
            .bind(id)
            .fetch_optional(&self.db.pg)
            .await?
            .ok_or_else(|| AppError::NotFound("Role not found".to_string()))?;

        tracing::info!(role_id = %id, "Role deleted");
        Ok(role)
    }

    /// Sets positions 1..n following the given order.
    pub async fn reorder_positions(&self, role_ids: &[Uuid]) -> Result<Vec<Role>> {
        let mut tx = self.db.pg.begin().await?;
        let mut updated = Vec::with_capacity(role_ids.len());

        for (index, id) in role_ids.iter().enumerate() {
            let role = sqlx::query_as::<_, Role>(
                "UPDATE roles SET position = $2, updated_at = NOW() WHERE id = $1 RETURNING *",
            )
            .bind(id)
            .bind(index as i32 + 1)
            .fetch_optional(&mut *tx)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Role {} not found", id)))?;
            updated.push(role);
        }

        tx.commit().await?;
        Ok(updated)
    }

    pub async fn permissions(&self, id: Uuid) -> Result<RolePermissions> {
        sqlx::query_as::<_, RolePermissions>("SELECT title, permissions FROM roles WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.db.pg)
            .await?
            .ok_or_else(|| AppError::NotFound("Role not found".to_string()))
    }

    pub async fn update_permissions(&self, id: Uuid, permissions: serde_json::Value) -> Result<Role> {
        sqlx::query_as::<_, Role>("UPDATE roles SET permissions = $2, updated_at = NOW() WHERE id = $1 RETURNING *")
            .bind(id)
            .bind(permissions)
            .fetch_optional(&self.db.pg)
            .await?
            .ok_or_else(|| AppError::NotFound("Role not found".to_string()))
    }

    async fn find(&self, id: Uuid) -> Result<Role> {
        sqlx::query_as::<_, Role>("SELECT * FROM roles WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.db.pg)
            .await?
            .ok_or_else(|| AppError::NotFound("Role not found".to_string()))
    }

    async fn members(&self, role_id: Uuid) -> Result<Vec<RoleMember>> {
        let members = sqlx::query_as::<_, RoleMember>(MEMBER_QUERY)
            .bind(role_id)
            .fetch_all(&self.db.pg)
            .await?;
        Ok(members)
    }

    /// The role with its members in display order, searched and sliced.
    pub async fn member_view(&self, id: Uuid, search: Option<&str>, skip: usize, take: usize) -> Result<RoleWithMembers> {
        let role = self.find(id).await?;
        let ordered = order_members(&role.user_ids, self.members(id).await?);
        let (users, total) = page_members(ordered, search, skip, take);

        Ok(RoleWithMembers {
            id: role.id,
            title: role.title,
            position: role.position,
            permissions: role.permissions,
            user_ids: role.user_ids,
            users,
            total_count: Some(total),
        })
    }

    /// Stores a new member order. Existing ids the caller left out keep
    /// their relative order after the submitted ones.
    pub async fn reorder_members(&self, id: Uuid, submitted: &[Uuid]) -> Result<RoleWithMembers> {
        let role = self.find(id).await?;
        let members = self.members(id).await?;

        let mut existing = role.user_ids.clone();
        let stored: HashSet<Uuid> = existing.iter().copied().collect();
        existing.extend(members.iter().map(|m| m.id).filter(|id| !stored.contains(id)));

        let merged = merge_member_order(submitted, &existing);

        let result = sqlx::query("UPDATE roles SET user_ids = $2, updated_at = NOW() WHERE id = $1")
            .bind(id)
            .bind(&merged)
            .execute(&self.db.pg)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::Internal(anyhow::anyhow!("Failed to update user order")));
        }

        tracing::info!(role_id = %id, members = merged.len(), "Role member order updated");

        Ok(RoleWithMembers {
            id: role.id,
            title: role.title,
            position: role.position,
            permissions: role.permissions,
            users: order_members(&merged, members),
            user_ids: merged,
            total_count: None,
        })
    }
}

fn title_conflict(e: sqlx::Error) -> AppError {
    if let sqlx::Error::Database(db_err) = &e {
        if db_err.is_unique_violation() {
            return AppError::Validation(FieldErrors::single("title", TITLE_TAKEN));
        }
    }
    AppError::Database(e)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, Utc};

    fn ids(n: usize) -> Vec<Uuid> {
        (0..n).map(|_| Uuid::new_v4()).collect()
    }

    fn member(id: Uuid, first: &str, minutes_ago: i64) -> RoleMember {
        RoleMember {
            id,
            first_name: first.into(),
            last_name: "Tester".into(),
            email: format!("{}@example.com", first.to_lowercase()),
            avatar_url: None,
            role_id: None,
            created_at: Utc::now() - Duration::minutes(minutes_ago),
        }
    }

    #[test]
    fn omitted_ids_keep_relative_order() {
        let existing = ids(5);
        let submitted = vec![existing[3], existing[1]];
        let merged = merge_member_order(&submitted, &existing);
        assert_eq!(merged, vec![existing[3], existing[1], existing[0], existing[2], existing[4]]);
    }

    #[test]
    fn duplicates_collapse_to_first_occurrence() {
        let existing = ids(3);
        let submitted = vec![existing[2], existing[0], existing[2]];
        let merged = merge_member_order(&submitted, &existing);
        assert_eq!(merged, vec![existing[2], existing[0], existing[1]]);
    }

    #[test]
    fn submitted_ids_not_yet_stored_are_kept() {
        let existing = ids(2);
        let newcomer = Uuid::new_v4();
        let merged = merge_member_order(&[newcomer], &existing);
        assert_eq!(merged, vec![newcomer, existing[0], existing[1]]);
    }

    #[test]
    fn members_follow_stored_order_then_creation_time() {
        let [a, b, c, d] = [Uuid::new_v4(), Uuid::new_v4(), Uuid::new_v4(), Uuid::new_v4()];
        let stale = Uuid::new_v4();
        let members = vec![member(a, "Ann", 40), member(b, "Bob", 30), member(c, "Cid", 20), member(d, "Dee", 10)];

        let ordered = order_members(&[c, stale, a], members);
        let order: Vec<Uuid> = ordered.iter().map(|m| m.id).collect();
        assert_eq!(order, vec![c, a, b, d]);
    }

    #[test]
    fn member_search_then_slice() {
        let members: Vec<RoleMember> = ["Ann", "Bob", "Annie", "Dee", "Joanna"]
            .iter()
            .enumerate()
            .map(|(i, name)| member(Uuid::new_v4(), name, i as i64))
            .collect();

        let (page, total) = page_members(members.clone(), Some("ANN"), 1, 1);
        assert_eq!(total, 3);
        assert_eq!(page.len(), 1);
        assert_eq!(page[0].first_name, "Annie");

        let (page, total) = page_members(members, None, 0, DEFAULT_MEMBER_TAKE);
        assert_eq!((page.len(), total), (5, 5));
    }

    #[test]
    fn id_list_must_be_an_array_of_uuids() {
        let id = Uuid::new_v4();
        assert_eq!(parse_id_list(&serde_json::json!([id.to_string()])).unwrap(), vec![id]);
        assert!(matches!(parse_id_list(&serde_json::json!({"ids": []})), Err(AppError::BadRequest(_))));
        assert!(matches!(parse_id_list(&serde_json::json!(["nope"])), Err(AppError::BadRequest(_))));
        assert!(matches!(parse_id_list(&serde_json::json!([1])), Err(AppError::BadRequest(_))));
    }
}
