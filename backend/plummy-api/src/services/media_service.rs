// Media host - image upload and removal on Cloudinary
use std::collections::BTreeMap;
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use reqwest::Client as HttpClient;
use serde::Deserialize;
use sha1::{Digest, Sha1};

use crate::config::CloudinaryConfig;
use crate::error::{AppError, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ResourceType {
    #[default]
    Image,
    /// Let the host detect the type from the payload.
    Auto,
}

impl ResourceType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ResourceType::Image => "image",
            ResourceType::Auto => "auto",
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct UploadOptions {
    pub folder: Option<String>,
    pub public_id: Option<String>,
    pub resource_type: ResourceType,
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct UploadedImage {
    pub public_id: String,
    pub secure_url: String,
}

#[async_trait]
pub trait ImageHost: Send + Sync {
    /// Uploads `file` (a `data:` URL or a remote URL).
    async fn upload(&self, file: &str, options: &UploadOptions) -> Result<UploadedImage>;

    /// Removes an image by public id. Returns the host's result string.
    async fn destroy(&self, public_id: &str) -> Result<String>;
}

pub struct CloudinaryClient {
    http: HttpClient,
    config: CloudinaryConfig,
}

/// Request signature: parameters sorted by name, joined as `k=v&k=v`,
/// followed by the API secret, hashed with SHA-1.
pub fn sign_params(params: &BTreeMap<&str, String>, api_secret: &str) -> String {
    let to_sign = params
        .iter()
        .filter(|(_, v)| !v.is_empty())
        .map(|(k, v)| format!("{}={}", k, v))
        .collect::<Vec<_>>()
        .join("&");

    let mut hasher = Sha1::new();
    hasher.update(to_sign.as_bytes());
    hasher.update(api_secret.as_bytes());
    hex::encode(hasher.finalize())
}

#[derive(Debug, Deserialize)]
struct DestroyResponse {
    result: String,
}

impl CloudinaryClient {
    pub fn new(config: CloudinaryConfig, timeout_secs: u64) -> anyhow::Result<Self> {
        let http = HttpClient::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()?;
        Ok(Self { http, config })
    }

    fn endpoint(&self, resource_type: ResourceType, action: &str) -> String {
        format!(
            "{}/v1_1/{}/{}/{}",
            self.config.base_url.trim_end_matches('/'),
            self.config.cloud_name,
            resource_type.as_str(),
            action
        )
    }

    /// Adds `timestamp`, `api_key` and `signature` to the signed parameters.
    fn signed_form(&self, mut params: BTreeMap<&'static str, String>) -> Vec<(&'static str, String)> {
        params.insert("timestamp", Utc::now().timestamp().to_string());
        let signature = sign_params(&params, &self.config.api_secret);

        let mut form: Vec<(&'static str, String)> = params.into_iter().filter(|(_, v)| !v.is_empty()).collect();
        form.push(("api_key", self.config.api_key.clone()));
        form.push(("signature", signature));
        form
    }

    async fn post_form<T: for<'de> Deserialize<'de>>(&self, url: String, form: Vec<(&'static str, String)>) -> Result<T> {
        let response = self
            .http
            .post(&url)
            .form(&form)
            .send()
            .await
            .map_err(|e| AppError::Upstream(format!("Media host request failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::Upstream(format!("Media host returned {}: {}", status, body)));
        }

        response
            .json::<T>()
            .await
            .map_err(|e| AppError::Upstream(format!("Media host response was not understood: {}", e)))
    }
}

#[async_trait]
impl ImageHost for CloudinaryClient {
    async fn upload(&self, file: &str, options: &UploadOptions) -> Result<UploadedImage> {
        let mut params = BTreeMap::new();
        if let Some(folder) = &options.folder {
            params.insert("folder", folder.clone());
        }
        if let Some(public_id) = &options.public_id {
            params.insert("public_id", public_id.clone());
        }

        let mut form = self.signed_form(params);
        form.push(("file", file.to_string()));

        let uploaded: UploadedImage = self
            .post_form(self.endpoint(options.resource_type, "upload"), form)
            .await?;

        tracing::info!(public_id = %uploaded.public_id, "Image uploaded");
        Ok(uploaded)
    }

    async fn destroy(&self, public_id: &str) -> Result<String> {
        let mut params = BTreeMap::new();
        params.insert("public_id", public_id.to_string());

        let response: DestroyResponse = self
            .post_form(self.endpoint(ResourceType::Image, "destroy"), self.signed_form(params))
            .await?;

        if response.result != "ok" {
            tracing::warn!(public_id = %public_id, result = %response.result, "Image was not removed");
        }
        Ok(response.result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_string_contains, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client(base_url: String) -> CloudinaryClient {
        CloudinaryClient::new(
            CloudinaryConfig {
                cloud_name: "demo".into(),
                api_key: "key123".into(),
                api_secret: "shh".into(),
                base_url,
            },
            5,
        )
        .unwrap()
    }

    #[test]
    fn signature_sorts_params_and_appends_secret() {
        let mut params = BTreeMap::new();
        params.insert("timestamp", "1315060510".to_string());
        params.insert("public_id", "sample_image".to_string());
        params.insert("folder", String::new());

        let mut hasher = Sha1::new();
        hasher.update(b"public_id=sample_image&timestamp=1315060510abcd");
        let expected = hex::encode(hasher.finalize());

        assert_eq!(sign_params(&params, "abcd"), expected);
    }

    #[tokio::test]
    async fn upload_posts_signed_form() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1_1/demo/image/upload"))
            .and(body_string_contains("signature="))
            .and(body_string_contains("api_key=key123"))
            .and(body_string_contains("folder=posts%2Fabc"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "public_id": "posts/abc/img-1",
                "secure_url": "https://res.cloudinary.com/demo/image/upload/posts/abc/img-1.png"
            })))
            .expect(1)
            .mount(&server)
            .await;

        let uploaded = client(server.uri())
            .upload(
                "data:image/png;base64,iVBORw0KGgo=",
                &UploadOptions {
                    folder: Some("posts/abc".into()),
                    public_id: Some("img-1".into()),
                    resource_type: ResourceType::Image,
                },
            )
            .await
            .unwrap();

        assert_eq!(uploaded.public_id, "posts/abc/img-1");
    }

    #[tokio::test]
    async fn upload_failure_is_an_upstream_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1_1/demo/auto/upload"))
            .respond_with(ResponseTemplate::new(401).set_body_string("bad signature"))
            .mount(&server)
            .await;

        let err = client(server.uri())
            .upload(
                "https://example.com/cat.png",
                &UploadOptions { resource_type: ResourceType::Auto, ..Default::default() },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Upstream(_)));
    }

    #[tokio::test]
    async fn destroy_reports_host_result() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1_1/demo/image/destroy"))
            .and(body_string_contains("public_id=sunset"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({ "result": "not found" })))
            .mount(&server)
            .await;

        let result = client(server.uri()).destroy("sunset").await.unwrap();
        assert_eq!(result, "not found");
    }
}
