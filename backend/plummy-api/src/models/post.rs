use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::types::Json;
use sqlx::FromRow;
use uuid::Uuid;
use validator::Validate;

use crate::error::FieldErrors;

/// Image attached to a post, stored inline on the post row.
#[derive(Debug, Clone, Serialize, Deserialize, Validate, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PostImage {
    pub id: String,
    /// Empty until the post exists.
    #[serde(default)]
    pub post_id: String,
    #[validate(url(message = "Valid image URL is required"))]
    pub url: String,
}

#[derive(Debug, Clone, FromRow, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Post {
    pub id: Uuid,
    pub user_id: Uuid,
    pub content: String,
    pub post_images: Json<Vec<PostImage>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Post joined with its author, as read for the feed.
#[derive(Debug, Clone, FromRow)]
pub struct FeedRow {
    pub id: Uuid,
    pub content: String,
    pub post_images: Json<Vec<PostImage>>,
    pub created_at: DateTime<Utc>,
    pub author_id: Uuid,
    pub author_first_name: String,
    pub author_last_name: String,
    pub author_avatar_url: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FeedPost {
    pub id: Uuid,
    pub content: String,
    pub created_at: DateTime<Utc>,
    pub time_ago: String,
    pub author: FeedAuthor,
    pub images: Vec<PostImage>,
}

#[derive(Debug, Clone, Serialize)]
pub struct FeedAuthor {
    pub id: Uuid,
    pub name: String,
    pub avatar: String,
}

impl FeedPost {
    pub fn from_row(row: FeedRow, now: DateTime<Utc>) -> Self {
        Self {
            id: row.id,
            content: row.content,
            created_at: row.created_at,
            time_ago: crate::utils::format_relative_time(row.created_at, now),
            author: FeedAuthor {
                id: row.author_id,
                name: format!("{} {}", row.author_first_name, row.author_last_name),
                avatar: row.author_avatar_url.unwrap_or_default(),
            },
            images: row.post_images.0,
        }
    }
}

/// Author summary embedded in comments and likes.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PostUser {
    pub id: Uuid,
    pub first_name: String,
    pub last_name: String,
    pub avatar_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, FromRow, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PostComment {
    pub id: Uuid,
    pub post_id: Uuid,
    pub user_id: Uuid,
    pub comment: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, FromRow)]
pub struct CommentRow {
    pub id: Uuid,
    pub post_id: Uuid,
    pub user_id: Uuid,
    pub comment: String,
    pub created_at: DateTime<Utc>,
    pub first_name: String,
    pub last_name: String,
    pub avatar_url: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CommentWithUser {
    #[serde(flatten)]
    pub comment: PostComment,
    pub user: PostUser,
}

impl From<CommentRow> for CommentWithUser {
    fn from(row: CommentRow) -> Self {
        Self {
            user: PostUser {
                id: row.user_id,
                first_name: row.first_name,
                last_name: row.last_name,
                avatar_url: row.avatar_url,
                email: None,
                created_at: None,
            },
            comment: PostComment {
                id: row.id,
                post_id: row.post_id,
                user_id: row.user_id,
                comment: row.comment,
                created_at: row.created_at,
            },
        }
    }
}

/// An emoji reaction on a post.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PostLike {
    pub id: Uuid,
    pub post_id: Uuid,
    pub user_id: Uuid,
    pub emoji: String,
    #[serde(rename = "emoji_name")]
    pub emoji_name: String,
    #[serde(rename = "emoji_id")]
    pub emoji_id: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, FromRow)]
pub struct LikeRow {
    pub id: Uuid,
    pub post_id: Uuid,
    pub user_id: Uuid,
    pub emoji: String,
    pub emoji_name: String,
    pub emoji_id: String,
    pub created_at: DateTime<Utc>,
    pub first_name: String,
    pub last_name: String,
    pub avatar_url: Option<String>,
    pub email: String,
    pub user_created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize)]
pub struct LikeWithUser {
    #[serde(flatten)]
    pub like: PostLike,
    pub user: PostUser,
}

impl From<LikeRow> for LikeWithUser {
    fn from(row: LikeRow) -> Self {
        Self {
            user: PostUser {
                id: row.user_id,
                first_name: row.first_name,
                last_name: row.last_name,
                avatar_url: row.avatar_url,
                email: Some(row.email),
                created_at: Some(row.user_created_at),
            },
            like: PostLike {
                id: row.id,
                post_id: row.post_id,
                user_id: row.user_id,
                emoji: row.emoji,
                emoji_name: row.emoji_name,
                emoji_id: row.emoji_id,
                created_at: row.created_at,
            },
        }
    }
}

/// Likes on a post grouped by emoji.
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ReactionCount {
    pub emoji: String,
    pub emoji_name: String,
    pub emoji_id: String,
    pub label: String,
    pub count: i64,
}

#[derive(Debug, Clone, Serialize)]
pub struct LikeSummary {
    pub count: i64,
    pub reactions: Vec<ReactionCount>,
}

#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct ShareContentRequest {
    pub content: Option<String>,
    #[validate(nested)]
    pub post_images: Option<Vec<PostImage>>,
}

impl ShareContentRequest {
    /// Field validation plus the rule that a post needs text or at least one image.
    pub fn check(&self) -> crate::error::Result<()> {
        let mut errors = FieldErrors::of(self);
        if !self.has_content() && !self.has_images() {
            errors.add("content", "Content is required.");
        }
        errors.into_result()
    }

    pub fn has_content(&self) -> bool {
        self.content.as_deref().is_some_and(|c| !c.trim().is_empty())
    }

    pub fn has_images(&self) -> bool {
        self.post_images.as_ref().is_some_and(|images| !images.is_empty())
    }
}

#[derive(Debug, Clone, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase", default)]
pub struct CommentRequest {
    #[validate(length(min = 1, message = "Post id is required"))]
    pub post_id: String,
    #[validate(length(min = 1, message = "Comment is required"))]
    pub comment: String,
}

#[derive(Debug, Clone, Default, Deserialize, Validate)]
#[serde(default)]
pub struct LikeRequest {
    #[serde(rename = "postId")]
    #[validate(length(min = 1, message = "Post id is required"))]
    pub post_id: String,
    #[validate(length(min = 1, message = "Emoji is required"))]
    pub emoji: String,
    #[validate(length(min = 1, message = "Emoji name is required"))]
    pub emoji_name: String,
    #[validate(length(min = 1, message = "Emoji id is required"))]
    pub emoji_id: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UnlikeRequest {
    pub like_id: Uuid,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AppError;

    fn field_errors(result: crate::error::Result<()>) -> FieldErrors {
        match result {
            Err(AppError::Validation(fields)) => fields,
            other => panic!("expected validation error, got {:?}", other),
        }
    }

    #[test]
    fn share_requires_content_or_images() {
        let empty = ShareContentRequest { content: Some("   ".into()), post_images: Some(vec![]) };
        let errors = field_errors(empty.check());
        assert_eq!(errors.get("content"), Some("Content is required."));

        let text_only = ShareContentRequest { content: Some("hello".into()), post_images: None };
        assert!(text_only.check().is_ok());
    }

    #[test]
    fn share_rejects_invalid_image_urls() {
        let req = ShareContentRequest {
            content: None,
            post_images: Some(vec![PostImage {
                id: "img-1".into(),
                post_id: "".into(),
                url: "not a url".into(),
            }]),
        };
        let errors = field_errors(req.check());
        assert_eq!(errors.get("postImages"), Some("Valid image URL is required"));
        assert_eq!(errors.get("content"), None);
    }

    #[test]
    fn data_urls_are_accepted() {
        let req = ShareContentRequest {
            content: None,
            post_images: Some(vec![PostImage {
                id: "img-1".into(),
                post_id: "".into(),
                url: "data:image/png;base64,iVBORw0KGgo=".into(),
            }]),
        };
        assert!(req.check().is_ok());
    }

    #[test]
    fn like_request_uses_wire_names() {
        let req: LikeRequest = serde_json::from_value(serde_json::json!({
            "postId": "5d7c4a7e-0000-4000-8000-000000000000",
            "emoji": "👍",
            "emoji_name": "thumbs_up",
            "emoji_id": "+1"
        }))
        .unwrap();
        assert!(req.validate().is_ok());
        assert_eq!(req.emoji_name, "thumbs_up");
    }

    #[test]
    fn like_request_rejects_empty_emoji() {
        let req = LikeRequest {
            post_id: "p".into(),
            emoji: String::new(),
            emoji_name: "x".into(),
            emoji_id: "x".into(),
        };
        let errors = FieldErrors::from(&req.validate().unwrap_err());
        assert_eq!(errors.get("emoji"), Some("Emoji is required"));
    }
}
