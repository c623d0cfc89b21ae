//! Wire fixtures for the REST bindings.

use prompt_gallery::adapters::ReqwestHttpClient;
use prompt_gallery::backend::RestBackend;
use serde_json::{json, Value};

pub const ANON_KEY: &str = "anon-key";
pub const USER_ID: &str = "6f1d8f3e-2b7a-4c51-9d0e-3a2b1c4d5e6f";

/// REST backend talking to a wiremock server.
pub fn rest_backend(base_url: &str) -> RestBackend {
    RestBackend::new(ReqwestHttpClient::new(), base_url, ANON_KEY)
}

/// A prompt row as the table endpoint returns it.
pub fn prompt_row(id: i64, title: &str, likes: i64) -> Value {
    json!({
        "id": id,
        "title": title,
        "text": format!("{} body", title),
        "image_url": null,
        "user_id": USER_ID,
        "username": "Ana",
        "is_owner": false,
        "likes": likes,
        "copy_count": 0,
        "report_count": null,
        "created_at": "2024-05-01T10:00:00Z"
    })
}

/// A password or refresh grant response.
pub fn token_response(access_token: &str) -> Value {
    json!({
        "access_token": access_token,
        "refresh_token": "refresh-1",
        "token_type": "bearer",
        "expires_in": 3600,
        "expires_at": 4_102_444_800i64,
        "user": {
            "id": USER_ID,
            "email": "ana@example.com",
            "user_metadata": { "name": "Ana" },
            "app_metadata": { "provider": "email" },
            "identities": [{ "provider": "email" }]
        }
    })
}
