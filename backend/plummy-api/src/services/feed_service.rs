// Feed service - posts, comments and emoji reactions
use std::collections::HashMap;

use chrono::Utc;
use sqlx::types::Json;
use uuid::Uuid;

use crate::db::Database;
use crate::error::{AppError, FieldErrors, Result};
use crate::models::{
    CommentRequest, CommentRow, CommentWithUser, FeedPost, FeedRow, LikeRequest, LikeRow, LikeSummary, LikeWithUser,
    Post, PostComment, PostImage, PostLike, ReactionCount, ShareContentRequest,
};
use crate::services::media_service::{ImageHost, UploadOptions};
use crate::utils::format_emoji_name;

const FEED_QUERY: &str = r#"
    SELECT p.id, p.content, p.post_images, p.created_at,
           u.id AS author_id, u.first_name AS author_first_name,
           u.last_name AS author_last_name, u.avatar_url AS author_avatar_url
    FROM posts p
    JOIN users u ON u.id = p.user_id
    ORDER BY p.created_at DESC
    LIMIT $1 OFFSET $2
"#;

const COMMENTS_QUERY: &str = r#"
    SELECT c.id, c.post_id, c.user_id, c.comment, c.created_at,
           u.first_name, u.last_name, u.avatar_url
    FROM post_comments c
    JOIN users u ON u.id = c.user_id
    WHERE c.post_id = $1
    ORDER BY c.created_at DESC
    LIMIT $2 OFFSET $3
"#;

const LIKES_QUERY: &str = r#"
    SELECT l.id, l.post_id, l.user_id, l.emoji, l.emoji_name, l.emoji_id, l.created_at,
           u.first_name, u.last_name, u.avatar_url, u.email, u.created_at AS user_created_at
    FROM post_likes l
    JOIN users u ON u.id = l.user_id
    WHERE l.post_id = $1 AND ($2::text IS NULL OR l.emoji_id = $2)
    ORDER BY l.created_at DESC
    LIMIT $3 OFFSET $4
"#;

pub struct FeedService {
    db: Database,
}

/// Likes grouped per emoji id, most used first. Ties keep first-seen order.
pub fn summarize_reactions(likes: &[PostLike]) -> LikeSummary {
    let mut reactions: Vec<ReactionCount> = Vec::new();
    let mut index: HashMap<&str, usize> = HashMap::new();

    for like in likes {
        match index.get(like.emoji_id.as_str()) {
            Some(&i) => reactions[i].count += 1,
            None => {
                index.insert(like.emoji_id.as_str(), reactions.len());
                reactions.push(ReactionCount {
                    emoji: like.emoji.clone(),
                    emoji_name: like.emoji_name.clone(),
                    emoji_id: like.emoji_id.clone(),
                    label: format_emoji_name(&like.emoji_name),
                    count: 1,
                });
            }
        }
    }

    reactions.sort_by(|a, b| b.count.cmp(&a.count));

    LikeSummary {
        count: likes.len() as i64,
        reactions,
    }
}

fn parse_post_id(raw: &str) -> Result<Uuid> {
    Uuid::parse_str(raw.trim()).map_err(|_| AppError::Validation(FieldErrors::single("postId", "Invalid post id")))
}

impl FeedService {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    pub async fn content(&self, skip: i64, take: i64) -> Result<Vec<FeedPost>> {
        let rows = sqlx::query_as::<_, FeedRow>(FEED_QUERY)
            .bind(take)
            .bind(skip)
            .fetch_all(&self.db.pg)
            .await?;

        let now = Utc::now();
        Ok(rows.into_iter().map(|row| FeedPost::from_row(row, now)).collect())
    }

    /// Creates the post, then uploads `data:` images under `posts/<postId>`.
    /// An image that fails to upload is logged and left out.
    pub async fn share(&self, user_id: Uuid, req: ShareContentRequest, media: &dyn ImageHost) -> Result<Post> {
        req.check()?;

        let post = sqlx::query_as::<_, Post>("INSERT INTO posts (user_id, content) VALUES ($1, $2) RETURNING *")
            .bind(user_id)
            .bind(req.content.as_deref().unwrap_or(""))
            .fetch_one(&self.db.pg)
            .await?;

        let post_id = post.id.to_string();
        let mut images = Vec::new();

        for image in req.post_images.unwrap_or_default() {
            if !image.url.starts_with("data:") {
                images.push(PostImage {
                    id: image.id,
                    post_id: post_id.clone(),
                    url: image.url,
                });
                continue;
            }

            let options = UploadOptions {
                folder: Some(format!("posts/{}", post_id)),
                public_id: Some(image.id.clone()),
                ..Default::default()
            };
            match media.upload(&image.url, &options).await {
                Ok(uploaded) => images.push(PostImage {
                    id: image.id,
                    post_id: post_id.clone(),
                    url: uploaded.secure_url,
                }),
                Err(e) => {
                    tracing::error!(post_id = %post.id, image_id = %image.id, error = %e, "Image upload failed, skipping");
                }
            }
        }

        let post = sqlx::query_as::<_, Post>(
            "UPDATE posts SET post_images = $2, updated_at = NOW() WHERE id = $1 RETURNING *",
        )
        .bind(post.id)
        .bind(Json(&images))
        .fetch_one(&self.db.pg)
        .await?;

        tracing::info!(post_id = %post.id, images = images.len(), "Post shared");
        Ok(post)
    }

    pub async fn comment(&self, user_id: Uuid, req: CommentRequest) -> Result<PostComment> {
        FieldErrors::of(&req).into_result()?;
        let post_id = parse_post_id(&req.post_id)?;

        let comment = sqlx::query_as::<_, PostComment>(
            "INSERT INTO post_comments (post_id, user_id, comment) VALUES ($1, $2, $3) RETURNING *",
        )
        .bind(post_id)
        .bind(user_id)
        .bind(&req.comment)
        .fetch_one(&self.db.pg)
        .await
        .map_err(|e| missing_post(e, post_id))?;

        Ok(comment)
    }

    pub async fn comments(&self, post_id: Uuid, skip: i64, take: i64) -> Result<Vec<CommentWithUser>> {
        let rows = sqlx::query_as::<_, CommentRow>(COMMENTS_QUERY)
            .bind(post_id)
            .bind(take)
            .bind(skip)
            .fetch_all(&self.db.pg)
            .await?;
        Ok(rows.into_iter().map(CommentWithUser::from).collect())
    }

    pub async fn comment_count(&self, post_id: Uuid) -> Result<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM post_comments WHERE post_id = $1")
            .bind(post_id)
            .fetch_one(&self.db.pg)
            .await?;
        Ok(count)
    }

    /// Records one like per call.
    pub async fn like(&self, user_id: Uuid, req: LikeRequest) -> Result<PostLike> {
        FieldErrors::of(&req).into_result()?;
        let post_id = parse_post_id(&req.post_id)?;

        let like = sqlx::query_as::<_, PostLike>(
            r#"
            INSERT INTO post_likes (post_id, user_id, emoji, emoji_name, emoji_id)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING *
            "#,
        )
        .bind(post_id)
        .bind(user_id)
        .bind(&req.emoji)
        .bind(&req.emoji_name)
        .bind(&req.emoji_id)
        .fetch_one(&self.db.pg)
        .await
        .map_err(|e| missing_post(e, post_id))?;

        tracing::debug!(post_id = %post_id, like_id = %like.id, "Like recorded");
        Ok(like)
    }

    pub async fn unlike(&self, post_id: Uuid, like_id: Uuid) -> Result<PostLike> {
        sqlx::query_as::<_, PostLike>("DELETE FROM post_likes WHERE id = $1 AND post_id = $2 RETURNING *")
            .bind(like_id)
            .bind(post_id)
            .fetch_optional(&self.db.pg)
            .await?
            .ok_or_else(|| AppError::NotFound("Like not found".to_string()))
    }

    pub async fn likes(&self, post_id: Uuid, emoji_id: Option<&str>, skip: i64, take: i64) -> Result<Vec<LikeWithUser>> {
        let rows = sqlx::query_as::<_, LikeRow>(LIKES_QUERY)
            .bind(post_id)
            .bind(emoji_id)
            .bind(take)
            .bind(skip)
            .fetch_all(&self.db.pg)
            .await?;
        Ok(rows.into_iter().map(LikeWithUser::from).collect())
    }

    pub async fn like_summary(&self, post_id: Uuid) -> Result<LikeSummary> {
        let likes = sqlx::query_as::<_, PostLike>(
            "SELECT * FROM post_likes WHERE post_id = $1 ORDER BY created_at ASC",
        )
        .bind(post_id)
        .fetch_all(&self.db.pg)
        .await?;
        Ok(summarize_reactions(&likes))
    }

    /// The caller's most recent like on the post, if any.
    pub async fn liked_by(&self, post_id: Uuid, user_id: Uuid) -> Result<Option<PostLike>> {
        let like = sqlx::query_as::<_, PostLike>(
            "SELECT * FROM post_likes WHERE post_id = $1 AND user_id = $2 ORDER BY created_at DESC LIMIT 1",
        )
        .bind(post_id)
        .bind(user_id)
        .fetch_optional(&self.db.pg)
        .await?;
        Ok(like)
    }
}

/// Foreign-key violations on comment/like inserts, by constraint name:
/// the post is gone (404) or the session's user no longer exists (401).
fn foreign_key_error(constraint: Option<&str>, post_id: Uuid) -> Option<AppError> {
    match constraint {
        Some(name) if name.ends_with("_post_id_fkey") => Some(AppError::NotFound(format!("Post {} not found", post_id))),
        Some(name) if name.ends_with("_user_id_fkey") => Some(AppError::Unauthorized),
        _ => None,
    }
}

fn missing_post(e: sqlx::Error, post_id: Uuid) -> AppError {
    if let sqlx::Error::Database(db_err) = &e {
        if db_err.is_foreign_key_violation() {
            if let Some(err) = foreign_key_error(db_err.constraint(), post_id) {
                return err;
            }
        }
    }
    AppError::Database(e)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn like(emoji: &str, name: &str, id: &str) -> PostLike {
        PostLike {
            id: Uuid::new_v4(),
            post_id: Uuid::nil(),
            user_id: Uuid::new_v4(),
            emoji: emoji.into(),
            emoji_name: name.into(),
            emoji_id: id.into(),
            created_at: Utc::now(),
        }
    }

    #[test]
    fn reactions_are_grouped_most_used_first() {
        let likes = vec![
            like("❤️", "red_heart", "heart"),
            like("👍", "thumbs_up", "+1"),
            like("👍", "thumbs_up", "+1"),
            like("😂", "joy", "joy"),
            like("👍", "thumbs_up", "+1"),
            like("❤️", "red_heart", "heart"),
        ];
        let summary = summarize_reactions(&likes);
        assert_eq!(summary.count, 6);
        let order: Vec<(&str, i64)> = summary.reactions.iter().map(|r| (r.emoji_id.as_str(), r.count)).collect();
        assert_eq!(order, vec![("+1", 3), ("heart", 2), ("joy", 1)]);
        assert_eq!(summary.reactions[0].label, "Thumbs up");
    }

    #[test]
    fn no_likes_summarize_to_zero() {
        let summary = summarize_reactions(&[]);
        assert_eq!(summary.count, 0);
        assert!(summary.reactions.is_empty());
    }

    #[test]
    fn foreign_key_errors_follow_the_violated_constraint() {
        let post_id = Uuid::new_v4();
        assert!(matches!(
            foreign_key_error(Some("post_likes_post_id_fkey"), post_id),
            Some(AppError::NotFound(_))
        ));
        assert!(matches!(
            foreign_key_error(Some("post_comments_post_id_fkey"), post_id),
            Some(AppError::NotFound(_))
        ));
        assert!(matches!(
            foreign_key_error(Some("post_likes_user_id_fkey"), post_id),
            Some(AppError::Unauthorized)
        ));
        assert!(foreign_key_error(Some("something_else"), post_id).is_none());
        assert!(foreign_key_error(None, post_id).is_none());
    }

    #[test]
    fn post_ids_must_be_uuids() {
        assert!(parse_post_id("not-a-uuid").is_err());
        assert!(parse_post_id(&Uuid::new_v4().to_string()).is_ok());
    }
}
