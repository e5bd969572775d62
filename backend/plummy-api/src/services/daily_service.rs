// Daily service - personal featured photos
use futures::future::join_all;
use uuid::Uuid;

use crate::db::Database;
use crate::error::{AppError, FieldErrors, Result};
use crate::models::{Daily, DailyModification, DailyUploadRequest, FeaturedDaily, MemberDaily, MemberDailyRow};
use crate::services::media_service::{ImageHost, ResourceType, UploadOptions};

pub const DAILY_FOLDER: &str = "daily_uploads";

const ONE_ACTIVE_INDEX: &str = "idx_dailies_one_active_per_user";

const MEMBER_FEATURED_QUERY: &str = r#"
    SELECT d.id, d.daily_url, u.avatar_url, u.first_name, u.last_name
    FROM dailies d
    JOIN users u ON u.id = d.user_id
    WHERE d.is_my_day AND d.user_id <> $1
    ORDER BY d.created_at DESC
    LIMIT $2 OFFSET $3
"#;

pub struct DailyService {
    db: Database,
}

fn not_found() -> AppError {
    AppError::NotFound("Daily not found".to_string())
}

fn is_active_clash(constraint: Option<&str>) -> bool {
    constraint == Some(ONE_ACTIVE_INDEX)
}

/// A concurrent `set_active` for the same user won the single active slot.
fn active_conflict(e: sqlx::Error) -> AppError {
    if let sqlx::Error::Database(db_err) = &e {
        if db_err.is_unique_violation() && is_active_clash(db_err.constraint()) {
            return AppError::Conflict("Another daily was made active at the same time".to_string());
        }
    }
    AppError::Database(e)
}

impl DailyService {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    pub async fn list(&self, user_id: Uuid) -> Result<Vec<Daily>> {
        let dailies = sqlx::query_as::<_, Daily>(
            "SELECT * FROM dailies WHERE user_id = $1 ORDER BY created_at DESC",
        )
        .bind(user_id)
        .fetch_all(&self.db.pg)
        .await?;
        Ok(dailies)
    }

    /// Uploads every image concurrently, then records one daily per image.
    /// Any failed upload fails the whole request before anything is stored.
    pub async fn upload(&self, user_id: Uuid, req: DailyUploadRequest, media: &dyn ImageHost) -> Result<Vec<Daily>> {
        FieldErrors::of(&req).into_result()?;

        let options = UploadOptions {
            folder: Some(DAILY_FOLDER.to_string()),
            public_id: None,
            resource_type: ResourceType::Auto,
        };
        let uploads = join_all(req.post_images.iter().map(|image| media.upload(&image.url, &options))).await;

        let mut tx = self.db.pg.begin().await?;
        let mut created = Vec::with_capacity(uploads.len());

        for (image, uploaded) in req.post_images.iter().zip(uploads) {
            let uploaded = uploaded?;
            let daily = sqlx::query_as::<_, Daily>(
                "INSERT INTO dailies (user_id, title, daily_url) VALUES ($1, $2, $3) RETURNING *",
            )
            .bind(user_id)
            .bind(&image.title)
            .bind(&uploaded.secure_url)
            .fetch_one(&mut *tx)
            .await?;
            created.push(daily);
        }

        tx.commit().await?;

        tracing::info!(user_id = %user_id, count = created.len(), "Dailies uploaded");
        Ok(created)
    }

    pub async fn featured_for_user(&self, user_id: Uuid) -> Result<FeaturedDaily> {
        sqlx::query_as::<_, FeaturedDaily>(
            r#"
            SELECT d.daily_url, u.avatar_url
            FROM dailies d
            JOIN users u ON u.id = d.user_id
            WHERE d.user_id = $1 AND d.is_my_day
            "#,
        )
        .bind(user_id)
        .fetch_optional(&self.db.pg)
        .await?
        .ok_or_else(|| AppError::NotFound("No featured daily".to_string()))
    }

    pub async fn featured_members(&self, user_id: Uuid, skip: i64, take: i64) -> Result<Vec<MemberDaily>> {
        let rows = sqlx::query_as::<_, MemberDailyRow>(MEMBER_FEATURED_QUERY)
            .bind(user_id)
            .bind(take)
            .bind(skip)
            .fetch_all(&self.db.pg)
            .await?;
        Ok(rows.into_iter().map(MemberDaily::from).collect())
    }

    /// Makes this daily the user's only active one.
    pub async fn set_active(&self, user_id: Uuid, daily_id: Uuid) -> Result<Daily> {
        let mut tx = self.db.pg.begin().await?;

        sqlx::query("UPDATE dailies SET is_my_day = FALSE, updated_at = NOW() WHERE user_id = $1 AND is_my_day AND id <> $2")
            .bind(user_id)
            .bind(daily_id)
            .execute(&mut *tx)
            .await
            .map_err(active_conflict)?;

        let daily = sqlx::query_as::<_, Daily>(
            "UPDATE dailies SET is_my_day = TRUE, updated_at = NOW() WHERE id = $1 AND user_id = $2 RETURNING *",
        )
        .bind(daily_id)
        .bind(user_id)
        .fetch_optional(&mut *tx)
        .await
        .map_err(active_conflict)?
        .ok_or_else(not_found)?;

        tx.commit().await.map_err(active_conflict)?;

        tracing::info!(user_id = %user_id, daily_id = %daily_id, "Daily set as active");
        Ok(daily)
    }

    pub async fn clear_active(&self, user_id: Uuid, daily_id: Uuid) -> Result<Daily> {
        sqlx::query_as::<_, Daily>(
            "UPDATE dailies SET is_my_day = FALSE, updated_at = NOW() WHERE id = $1 AND user_id = $2 RETURNING *",
        )
        .bind(daily_id)
        .bind(user_id)
        .fetch_optional(&self.db.pg)
        .await?
        .ok_or_else(not_found)
    }

    pub async fn modify(&self, user_id: Uuid, daily_id: Uuid, m: DailyModification) -> Result<Daily> {
        m.check()?;

        sqlx::query_as::<_, Daily>(
            r#"
            UPDATE dailies SET
                image_opacity = $3, image_blur = $4, image_blur_face = $5, image_sharpen = $6,
                image_brightness = $7, image_vibrance = $8, image_angle = $9,
                image_remove_background = $10, image_zoom_pan = $11, image_gray_scale = $12,
                text_content = $13, text_position_x = $14, text_position_y = $15,
                text_font_size = $16, text_color = $17,
                updated_at = NOW()
            WHERE id = $1 AND user_id = $2
            RETURNING *
            "#,
        )
        .bind(daily_id)
        .bind(user_id)
        .bind(m.image_opacity)
        .bind(m.image_blur)
        .bind(m.image_blur_face)
        .bind(m.image_sharpen)
        .bind(m.image_brightness)
        .bind(m.image_vibrance)
        .bind(m.image_angle)
        .bind(m.image_remove_background)
        .bind(m.image_zoom_pan)
        .bind(m.image_gray_scale)
        .bind(&m.text_content)
        .bind(m.text_position_x)
        .bind(m.text_position_y)
        .bind(m.text_font_size)
        .bind(&m.text_color)
        .fetch_optional(&self.db.pg)
        .await?
        .ok_or_else(not_found)
    }

    pub async fn remove(&self, user_id: Uuid, daily_id: Uuid) -> Result<Daily> {
        let daily = sqlx::query_as::<_, Daily>("DELETE FROM dailies WHERE id = $1 AND user_id = $2 RETURNING *")
            .bind(daily_id)
            .bind(user_id)
            .fetch_optional(&self.db.pg)
            .await?
            .ok_or_else(not_found)?;

        tracing::info!(user_id = %user_id, daily_id = %daily_id, "Daily removed");
        Ok(daily)
    }
}
