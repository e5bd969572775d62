use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;
use validator::Validate;

use crate::error::FieldErrors;

/// A personal featured photo. At most one per user has `is_my_day` set.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Daily {
    pub id: Uuid,
    pub user_id: Uuid,
    pub title: String,
    pub daily_url: String,
    pub is_my_day: bool,
    pub image_opacity: f64,
    pub image_blur: f64,
    pub image_blur_face: f64,
    pub image_sharpen: f64,
    pub image_brightness: f64,
    pub image_vibrance: f64,
    pub image_angle: f64,
    pub image_remove_background: bool,
    pub image_zoom_pan: bool,
    pub image_gray_scale: bool,
    pub text_content: String,
    pub text_position_x: f64,
    pub text_position_y: f64,
    pub text_font_size: f64,
    pub text_color: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, FromRow, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FeaturedDaily {
    pub daily_url: String,
    pub avatar_url: Option<String>,
}

#[derive(Debug, Clone, FromRow)]
pub struct MemberDailyRow {
    pub id: Uuid,
    pub daily_url: String,
    pub avatar_url: Option<String>,
    pub first_name: String,
    pub last_name: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MemberDaily {
    pub id: Uuid,
    pub daily_url: String,
    pub user: MemberDailyUser,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MemberDailyUser {
    pub avatar_url: Option<String>,
    pub first_name: String,
    pub last_name: String,
}

impl From<MemberDailyRow> for MemberDaily {
    fn from(row: MemberDailyRow) -> Self {
        Self {
            id: row.id,
            daily_url: row.daily_url,
            user: MemberDailyUser {
                avatar_url: row.avatar_url,
                first_name: row.first_name,
                last_name: row.last_name,
            },
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
#[serde(default)]
pub struct DailyImage {
    pub title: String,
    #[validate(length(min = 1, message = "Image URL is required"))]
    pub url: String,
}

#[derive(Debug, Clone, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase", default)]
pub struct DailyUploadRequest {
    #[validate(length(min = 1, message = "At least one photo is required"), nested)]
    pub post_images: Vec<DailyImage>,
}

/// Image and text-overlay settings. Omitted fields reset to their defaults.
#[derive(Debug, Clone, Deserialize, Validate, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct DailyModification {
    #[validate(range(min = 0.0, max = 1.0, message = "Opacity must be between 0 and 1"))]
    pub image_opacity: f64,
    #[validate(range(min = 0.0, max = 100.0, message = "Blur must be between 0 and 100"))]
    pub image_blur: f64,
    #[validate(range(min = 0.0, max = 100.0, message = "Face blur must be between 0 and 100"))]
    pub image_blur_face: f64,
    #[validate(range(min = 0.0, max = 100.0, message = "Sharpen must be between 0 and 100"))]
    pub image_sharpen: f64,
    #[validate(range(min = 0.0, max = 200.0, message = "Brightness must be between 0 and 200"))]
    pub image_brightness: f64,
    #[validate(range(min = -100.0, max = 100.0, message = "Vibrance must be between -100 and 100"))]
    pub image_vibrance: f64,
    #[validate(range(min = -360.0, max = 360.0, message = "Angle must be between -360 and 360"))]
    pub image_angle: f64,
    pub text_content: String,
    pub text_position_x: f64,
    pub text_position_y: f64,
    #[validate(range(min = 1.0, max = 200.0, message = "Font size must be between 1 and 200"))]
    pub text_font_size: f64,
    pub text_color: String,
    pub image_remove_background: bool,
    pub image_zoom_pan: bool,
    pub image_gray_scale: bool,
}

impl DailyModification {
    pub fn check(&self) -> crate::error::Result<()> {
        FieldErrors::of(self).into_result()
    }
}

impl Default for DailyModification {
    fn default() -> Self {
        Self {
            image_opacity: 1.0,
            image_blur: 0.0,
            image_blur_face: 0.0,
            image_sharpen: 0.0,
            image_brightness: 100.0,
            image_vibrance: 0.0,
            image_angle: 0.0,
            text_content: String::new(),
            text_position_x: 0.0,
            text_position_y: 0.0,
            text_font_size: 16.0,
            text_color: "#000000".to_string(),
            image_remove_background: false,
            image_zoom_pan: false,
            image_gray_scale: false,
        }
    }
}
