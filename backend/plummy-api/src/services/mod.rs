mod auth_service;
mod daily_service;
mod feed_service;
pub mod media_service;
mod role_service;
pub mod search_service;
mod user_service;

pub use auth_service::*;
pub use daily_service::*;
pub use feed_service::*;
pub use media_service::{CloudinaryClient, ImageHost, ResourceType, UploadOptions, UploadedImage};
pub use role_service::*;
pub use search_service::{SearchClient, SearchResult, SearchSource};
pub use user_service::*;
