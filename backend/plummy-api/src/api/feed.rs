use axum::{
    extract::{Path, Query, State},
    routing::{get, post},
    Extension, Json, Router,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::api::JsonBody;
use crate::error::Result;
use crate::listing::Window;
use crate::middleware::CurrentUser;
use crate::models::{
    CommentRequest, CommentWithUser, FeedPost, LikeRequest, LikeSummary, LikeWithUser, Post, PostComment, PostLike,
    ShareContentRequest, UnlikeRequest,
};
use crate::services::FeedService;
use crate::AppState;

const DEFAULT_TAKE: i64 = 5;
const MAX_TAKE: i64 = 50;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/content", get(content))
        .route("/shareContent", post(share_content))
        .route("/comment", post(create_comment))
        .route("/posts/:postId/comment", get(list_comments))
        .route("/posts/:postId/likedPost", get(liked_post))
        .route("/:postId/commentCount", get(comment_count))
        .route("/like", post(create_like))
        .route("/like.post", post(create_like))
        .route("/:postId/like", get(list_likes).delete(delete_like))
        .route("/:postId/likeCount", get(like_count))
}

async fn content(State(state): State<AppState>, Query(window): Query<Window>) -> Result<Json<Vec<FeedPost>>> {
    let (skip, take) = window.resolve(DEFAULT_TAKE, MAX_TAKE);
    let posts = FeedService::new(state.db.clone()).content(skip, take).await?;
    Ok(Json(posts))
}

async fn share_content(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
    JsonBody(payload): JsonBody<ShareContentRequest>,
) -> Result<Json<Post>> {
    let post = FeedService::new(state.db.clone())
        .share(current.user.id, payload, state.media.as_ref())
        .await?;
    Ok(Json(post))
}

async fn create_comment(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
    JsonBody(payload): JsonBody<CommentRequest>,
) -> Result<Json<PostComment>> {
    let comment = FeedService::new(state.db.clone())
        .comment(current.user.id, payload)
        .await?;
    Ok(Json(comment))
}

async fn list_comments(
    State(state): State<AppState>,
    Path(post_id): Path<Uuid>,
    Query(window): Query<Window>,
) -> Result<Json<Vec<CommentWithUser>>> {
    let (skip, take) = window.resolve(DEFAULT_TAKE, MAX_TAKE);
    let comments = FeedService::new(state.db.clone()).comments(post_id, skip, take).await?;
    Ok(Json(comments))
}

#[derive(Debug, Serialize)]
struct Count {
    count: i64,
}

async fn comment_count(State(state): State<AppState>, Path(post_id): Path<Uuid>) -> Result<Json<Count>> {
    let count = FeedService::new(state.db.clone()).comment_count(post_id).await?;
    Ok(Json(Count { count }))
}

async fn create_like(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
    JsonBody(payload): JsonBody<LikeRequest>,
) -> Result<Json<PostLike>> {
    let like = FeedService::new(state.db.clone()).like(current.user.id, payload).await?;
    Ok(Json(like))
}

async fn delete_like(
    State(state): State<AppState>,
    Path(post_id): Path<Uuid>,
    JsonBody(payload): JsonBody<UnlikeRequest>,
) -> Result<Json<PostLike>> {
    let like = FeedService::new(state.db.clone()).unlike(post_id, payload.like_id).await?;
    Ok(Json(like))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct LikesQuery {
    skip: Option<String>,
    take: Option<String>,
    emoji_id: Option<String>,
}

async fn list_likes(
    State(state): State<AppState>,
    Path(post_id): Path<Uuid>,
    Query(query): Query<LikesQuery>,
) -> Result<Json<Vec<LikeWithUser>>> {
    let (skip, take) = Window { skip: query.skip, take: query.take }.resolve(DEFAULT_TAKE, MAX_TAKE);
    let emoji_id = query.emoji_id.as_deref().filter(|id| !id.is_empty());
    let likes = FeedService::new(state.db.clone())
        .likes(post_id, emoji_id, skip, take)
        .await?;
    Ok(Json(likes))
}

async fn like_count(State(state): State<AppState>, Path(post_id): Path<Uuid>) -> Result<Json<LikeSummary>> {
    let summary = FeedService::new(state.db.clone()).like_summary(post_id).await?;
    Ok(Json(summary))
}

/// The caller's like on the post, or `null`.
async fn liked_post(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
    Path(post_id): Path<Uuid>,
) -> Result<Json<Option<PostLike>>> {
    let like = FeedService::new(state.db.clone())
        .liked_by(post_id, current.user.id)
        .await?;
    Ok(Json(like))
}
