//! Object storage bindings (`/storage/v1`).

use async_trait::async_trait;
use bytes::Bytes;
use tracing::debug;

use super::{ensure_success, RestBackend};
use crate::error::RemoteError;
use crate::traits::{HttpClient, ObjectStorage};

/// Browsers may cache uploaded images for an hour.
const CACHE_CONTROL: &str = "max-age=3600";

/// Percent-encode each segment of an object path, keeping the slashes.
fn encode_path(path: &str) -> String {
    path.split('/')
        .map(|segment| urlencoding::encode(segment).into_owned())
        .collect::<Vec<_>>()
        .join("/")
}

impl<C: HttpClient> RestBackend<C> {
    fn public_prefix(&self) -> String {
        format!("/storage/v1/object/public/{}/", self.bucket)
    }
}

#[async_trait]
impl<C: HttpClient> ObjectStorage for RestBackend<C> {
    async fn upload(
        &self,
        path: &str,
        data: Bytes,
        content_type: &str,
    ) -> Result<(), RemoteError> {
        debug!("Uploading {} bytes to {}/{}", data.len(), self.bucket, path);
        let url = self.url(&format!(
            "/storage/v1/object/{}/{}",
            self.bucket,
            encode_path(path)
        ));
        let mut headers = self.headers();
        headers.insert("Content-Type".to_string(), content_type.to_string());
        headers.insert("Cache-Control".to_string(), CACHE_CONTROL.to_string());
        headers.insert("x-upsert".to_string(), "false".to_string());

        let response = self.http.post_bytes(&url, data, &headers).await?;
        ensure_success(response).map(|_| ())
    }

    fn public_url(&self, path: &str) -> String {
        format!("{}{}{}", self.base_url, self.public_prefix(), encode_path(path))
    }

    fn path_from_public_url(&self, url: &str) -> Option<String> {
        let url = url.split(|c| c == '?' || c == '#').next().unwrap_or(url);
        let prefix = self.public_prefix();
        let start = url.find(&prefix)? + prefix.len();
        let path = urlencoding::decode(&url[start..]).ok()?;
        (!path.is_empty()).then(|| path.into_owned())
    }

    async fn remove(&self, path: &str) -> Result<(), RemoteError> {
        debug!("Removing {}/{}", self.bucket, path);
        let url = self.url(&format!("/storage/v1/object/{}", self.bucket));
        let body = serde_json::json!({ "prefixes": [path] }).to_string();
        let response = self
            .http
            .delete(&url, Some(&body), &self.json_headers())
            .await?;
        ensure_success(response).map(|_| ())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::mock::{MockHttpClient, MockResponse};
    use crate::traits::Response;

    const BASE: &str = "https://x.example.co";

    fn backend() -> RestBackend<MockHttpClient> {
        let http = MockHttpClient::new();
        http.set_default_response(MockResponse::Success(Response::new(
            200,
            Bytes::from(r#"{"Key":"prompt-images/u/1.png"}"#),
        )));
        RestBackend::new(http, BASE, "anon")
    }

    #[test]
    fn test_public_url_and_back() {
        let backend = backend();
        let url = backend.public_url("user 1/17.png");
        assert_eq!(
            url,
            "https://x.example.co/storage/v1/object/public/prompt-images/user%201/17.png"
        );
        assert_eq!(
            backend.path_from_public_url(&url).as_deref(),
            Some("user 1/17.png")
        );
    }

    #[test]
    fn test_path_from_foreign_or_bare_url() {
        let backend = backend();
        assert_eq!(
            backend.path_from_public_url(
                "https://cdn.example.net/storage/v1/object/public/prompt-images/u/2.jpg?t=1"
            ),
            Some("u/2.jpg".to_string())
        );
        assert_eq!(backend.path_from_public_url("https://imgur.com/a.png"), None);
        assert_eq!(
            backend.path_from_public_url(
                "https://x.example.co/storage/v1/object/public/prompt-images/"
            ),
            None
        );
    }

    #[tokio::test]
    async fn test_upload_headers() {
        let backend = backend();
        backend
            .upload("u/1.png", Bytes::from_static(b"\x89PNG"), "image/png")
            .await
            .unwrap();

        let request = &backend.http().get_requests()[0];
        assert_eq!(request.method, "POST");
        assert_eq!(
            request.url,
            "https://x.example.co/storage/v1/object/prompt-images/u/1.png"
        );
        assert_eq!(
            request.headers.get("Content-Type").map(String::as_str),
            Some("image/png")
        );
        assert_eq!(
            request.headers.get("x-upsert").map(String::as_str),
            Some("false")
        );
    }

    #[tokio::test]
    async fn test_remove_sends_prefixes() {
        let backend = backend();
        backend.remove("u/1.png").await.unwrap();

        let request = &backend.http().get_requests()[0];
        assert_eq!(request.method, "DELETE");
        assert!(request.url.ends_with("/storage/v1/object/prompt-images"));
        assert_eq!(request.body.as_deref(), Some(r#"{"prefixes":["u/1.png"]}"#));
    }
}
