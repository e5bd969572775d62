// User service - account administration and profile edits
use uuid::Uuid;

use crate::db::Database;
use crate::error::{AppError, FieldErrors, Result};
use crate::listing::{self, ListQuery, Paginated, USER_LISTING};
use crate::models::{
    AvatarUpdate, ProfileUpdate, SessionUser, User, UserForm, UserListItem, UserListRow, UserRecord,
};
use crate::services::AuthService;

pub const EMAIL_TAKEN: &str = "Email already exists";

const USER_COLUMNS: &str =
    "id, email, first_name, middle_name, last_name, avatar_url, role_id, created_at, updated_at";

const SESSION_USER_QUERY: &str = r#"
    SELECT u.id, u.first_name, u.middle_name, u.last_name, u.avatar_url,
           r.title AS role, u.email, u.created_at
    FROM users u
    LEFT JOIN roles r ON r.id = u.role_id
    WHERE u.id = $1
"#;

pub struct UserService {
    db: Database,
}

/// Maps a unique violation on `users.email` to the same field error the
/// pre-insert check reports.
pub(crate) fn email_conflict(e: sqlx::Error) -> AppError {
    if let sqlx::Error::Database(db_err) = &e {
        if db_err.is_unique_violation() {
            return AppError::Validation(FieldErrors::single("email", EMAIL_TAKEN));
        }
    }
    AppError::Database(e)
}

impl UserService {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    pub async fn list(&self, query: &ListQuery) -> Result<Paginated<UserListItem>> {
        let (rows, total) = listing::fetch_page::<UserListRow>(&self.db.pg, &USER_LISTING, query).await?;
        Ok(Paginated::new(rows, total, query).map(UserListItem::from))
    }

    /// Whether another user (other than `exclude`) already uses `email`.
    pub async fn email_taken(&self, email: &str, exclude: Option<Uuid>) -> Result<bool> {
        let taken: bool = sqlx::query_scalar(
            "SELECT EXISTS(SELECT 1 FROM users WHERE email = $1 AND ($2::uuid IS NULL OR id <> $2))",
        )
        .bind(email)
        .bind(exclude)
        .fetch_one(&self.db.pg)
        .await?;
        Ok(taken)
    }

    /// Field validation merged with the email uniqueness check.
    async fn check_form<T: validator::Validate>(&self, form: &T, email: &str, exclude: Option<Uuid>) -> Result<()> {
        let mut errors = FieldErrors::of(form);
        if errors.get("email").is_none() && self.email_taken(email, exclude).await? {
            errors.add("email", EMAIL_TAKEN);
        }
        errors.into_result()
    }

    pub async fn find_by_email(&self, email: &str) -> Result<Option<UserRecord>> {
        let user = sqlx::query_as::<_, UserRecord>("SELECT * FROM users WHERE email = $1")
            .bind(email)
            .fetch_optional(&self.db.pg)
            .await?;
        Ok(user)
    }

    /// Inserts a user with an already hashed password.
    pub async fn insert(
        &self,
        email: &str,
        first_name: &str,
        middle_name: &str,
        last_name: &str,
        hashed_password: &str,
    ) -> Result<User> {
        let user = sqlx::query_as::<_, User>(&format!(
            "INSERT INTO users (email, first_name, middle_name, last_name, hashed_password) \
             VALUES ($1, $2, $3, $4, $5) RETURNING {}",
            USER_COLUMNS
        ))
        .bind(email)
        .bind(first_name)
        .bind(middle_name)
        .bind(last_name)
        .bind(hashed_password)
        .fetch_one(&self.db.pg)
        .await
        .map_err(email_conflict)?;
        Ok(user)
    }

    /// Admin-created account; the user signs in with the configured default password.
    pub async fn create(&self, form: UserForm, default_password: &str) -> Result<User> {
        self.check_form(&form, &form.email, None).await?;

        let hashed = AuthService::hash_password(default_password)?;
        let user = self
            .insert(&form.email, &form.first_name, &form.middle_name, &form.last_name, &hashed)
            .await?;

        tracing::info!(user_id = %user.id, "User created");
        Ok(user)
    }

    pub async fn update(&self, id: Uuid, form: UserForm) -> Result<User> {
        self.check_form(&form, &form.email, Some(id)).await?;

        let user = sqlx::query_as::<_, User>(&format!(
            "UPDATE users SET email = $2, first_name = $3, middle_name = $4, last_name = $5, updated_at = NOW() \
             WHERE id = $1 RETURNING {}",
            USER_COLUMNS
        ))
        .bind(id)
        .bind(&form.email)
        .bind(&form.first_name)
        .bind(&form.middle_name)
        .bind(&form.last_name)
        .fetch_optional(&self.db.pg)
        .await
        .map_err(email_conflict)?
        .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;

        Ok(user)
    }

    /// Deletes the user and drops it from every role's member order.
    pub async fn delete(&self, id: Uuid) -> Result<User> {
        let mut tx = self.db.pg.begin().await?;

        sqlx::query("UPDATE roles SET user_ids = array_remove(user_ids, $1), updated_at = NOW() WHERE $1 = ANY(user_ids)")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        let user = sqlx::query_as::<_, User>(&format!("DELETE FROM users WHERE id = $1 RETURNING {}", USER_COLUMNS))
            .bind(id)
            .fetch_optional(&mut *tx)
            .await?
            .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;

        tx.commit().await?;

        tracing::info!(user_id = %id, "User deleted");
        Ok(user)
    }

    pub async fn session_user(&self, id: Uuid) -> Result<SessionUser> {
        sqlx::query_as::<_, SessionUser>(SESSION_USER_QUERY)
            .bind(id)
            .fetch_optional(&self.db.pg)
            .await?
            .ok_or(AppError::Unauthorized)
    }

    pub async fn update_profile(&self, id: Uuid, update: ProfileUpdate) -> Result<SessionUser> {
        self.check_form(&update, &update.email, Some(id)).await?;

        sqlx::query(
            "UPDATE users SET email = $2, first_name = $3, middle_name = $4, last_name = $5, \
             avatar_url = COALESCE($6, avatar_url), updated_at = NOW() WHERE id = $1",
        )
        .bind(id)
        .bind(&update.email)
        .bind(&update.first_name)
        .bind(&update.middle_name)
        .bind(&update.last_name)
        .bind(&update.avatar_url)
        .execute(&self.db.pg)
        .await
        .map_err(email_conflict)?;

        self.session_user(id).await
    }

    pub async fn update_avatar(&self, id: Uuid, update: AvatarUpdate) -> Result<SessionUser> {
        FieldErrors::of(&update).into_result()?;

        sqlx::query("UPDATE users SET avatar_url = $2, updated_at = NOW() WHERE id = $1")
            .bind(id)
            .bind(&update.avatar_url)
            .execute(&self.db.pg)
            .await?;

        self.session_user(id).await
    }
}
