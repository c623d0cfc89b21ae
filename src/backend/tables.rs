//! Table bindings (`/rest/v1`).

use async_trait::async_trait;
use serde::Deserialize;
use tracing::debug;
use uuid::Uuid;

use super::query::{parse_content_range, QueryString};
use super::{ensure_success, RestBackend};
use crate::error::RemoteError;
use crate::models::{
    CounterUpdate, FeedQuery, Like, NewPrompt, Prompt, PromptId, PromptPage, SortKey,
};
use crate::traits::{Database, Headers, HttpClient, Response};

const PROMPTS: &str = "prompts";
const LIKES: &str = "likes";
const USERS: &str = "users";

#[derive(Debug, Deserialize)]
struct LikedRow {
    prompt_id: PromptId,
}

impl<C: HttpClient> RestBackend<C> {
    fn table_url(&self, table: &str, query: &QueryString) -> String {
        self.url(&format!("/rest/v1/{}{}", table, query.build()))
    }

    fn prefer(&self, prefer: &str) -> Headers {
        let mut headers = self.json_headers();
        headers.insert("Prefer".to_string(), prefer.to_string());
        headers
    }

    /// Decode a `return=representation` body and fail when no row matched.
    fn affected_rows(table: &str, response: Response) -> Result<Vec<Prompt>, RemoteError> {
        let rows: Vec<Prompt> = ensure_success(response)?.json()?;
        if rows.is_empty() {
            return Err(RemoteError::NoRowsAffected(table.to_string()));
        }
        Ok(rows)
    }

    /// Row count from `Content-Range`, falling back to what was returned.
    fn total_from(response: &Response, offset: u64, returned: usize) -> u64 {
        response
            .header_value("Content-Range")
            .and_then(parse_content_range)
            .unwrap_or(offset + returned as u64)
    }
}

#[async_trait]
impl<C: HttpClient> Database for RestBackend<C> {
    async fn fetch_prompts(&self, query: &FeedQuery) -> Result<PromptPage, RemoteError> {
        let url = self.table_url(PROMPTS, &QueryString::feed(query));
        debug!("GET {}", url);
        let response = self.http.get(&url, &self.prefer("count=exact")).await?;

        // Past the last page PostgREST answers 416 with the total still set.
        if response.status == 416 {
            let total = response
                .header_value("Content-Range")
                .and_then(parse_content_range)
                .unwrap_or(0);
            return Ok(PromptPage {
                prompts: Vec::new(),
                total,
            });
        }

        let response = ensure_success(response)?;
        let prompts: Vec<Prompt> = response.json()?;
        let total = Self::total_from(&response, query.offset(), prompts.len());
        Ok(PromptPage { prompts, total })
    }

    async fn fetch_prompt(&self, id: PromptId) -> Result<Option<Prompt>, RemoteError> {
        let query = QueryString::new().select("*").eq("id", id).limit(1);
        let response = self
            .http
            .get(&self.table_url(PROMPTS, &query), &self.headers())
            .await?;
        let rows: Vec<Prompt> = ensure_success(response)?.json()?;
        Ok(rows.into_iter().next())
    }

    async fn fetch_prompts_by_owner(&self, user_id: Uuid) -> Result<Vec<Prompt>, RemoteError> {
        let query = QueryString::new()
            .select("*")
            .eq("user_id", user_id)
            .order(SortKey::Newest);
        let response = self
            .http
            .get(&self.table_url(PROMPTS, &query), &self.headers())
            .await?;
        Ok(ensure_success(response)?.json()?)
    }

    async fn insert_prompt(&self, prompt: &NewPrompt) -> Result<Prompt, RemoteError> {
        debug!("POST /rest/v1/prompts '{}'", prompt.title);
        let body = serde_json::to_string(prompt)?;
        let response = self
            .http
            .post(
                &self.table_url(PROMPTS, &QueryString::new()),
                &body,
                &self.prefer("return=representation"),
            )
            .await?;
        let mut rows = Self::affected_rows(PROMPTS, response)?;
        Ok(rows.swap_remove(0))
    }

    async fn update_counter(
        &self,
        id: PromptId,
        update: CounterUpdate,
    ) -> Result<(), RemoteError> {
        debug!("PATCH prompt {} {}={}", id, update.column(), update.value());
        let response = self
            .http
            .patch(
                &self.table_url(PROMPTS, &QueryString::prompt_id(id)),
                &update.to_patch().to_string(),
                &self.prefer("return=representation"),
            )
            .await?;
        Self::affected_rows(PROMPTS, response).map(|_| ())
    }

    async fn delete_prompt(&self, id: PromptId) -> Result<(), RemoteError> {
        debug!("DELETE prompt {}", id);
        let response = self
            .http
            .delete(
                &self.table_url(PROMPTS, &QueryString::prompt_id(id)),
                None,
                &self.prefer("return=representation"),
            )
            .await?;
        Self::affected_rows(PROMPTS, response).map(|_| ())
    }

    async fn delete_reported_prompt(&self, id: PromptId) -> Result<(), RemoteError> {
        debug!("POST rpc/delete_reported_prompt {}", id);
        let body = serde_json::json!({ "prompt_id": id }).to_string();
        let response = self
            .http
            .post(
                &self.url("/rest/v1/rpc/delete_reported_prompt"),
                &body,
                &self.json_headers(),
            )
            .await?;
        let response = ensure_success(response)?;

        // The procedure reports whether it deleted anything; older versions
        // return nothing at all.
        match response.json::<serde_json::Value>() {
            Ok(serde_json::Value::Bool(false)) => {
                Err(RemoteError::NoRowsAffected(PROMPTS.to_string()))
            }
            _ => Ok(()),
        }
    }

    async fn fetch_liked_prompt_ids(&self, user_id: Uuid) -> Result<Vec<PromptId>, RemoteError> {
        let query = QueryString::new().select("prompt_id").eq("user_id", user_id);
        let response = self
            .http
            .get(&self.table_url(LIKES, &query), &self.headers())
            .await?;
        let rows: Vec<LikedRow> = ensure_success(response)?.json()?;
        Ok(rows.into_iter().map(|row| row.prompt_id).collect())
    }

    async fn insert_like(&self, like: &Like) -> Result<(), RemoteError> {
        debug!("POST like {} by {}", like.prompt_id, like.user_id);
        let body = serde_json::to_string(like)?;
        let response = self
            .http
            .post(
                &self.table_url(LIKES, &QueryString::new()),
                &body,
                &self.prefer("return=minimal"),
            )
            .await?;
        ensure_success(response).map(|_| ())
    }

    async fn delete_like(&self, like: &Like) -> Result<(), RemoteError> {
        debug!("DELETE like {} by {}", like.prompt_id, like.user_id);
        let query = QueryString::new()
            .eq("user_id", like.user_id)
            .eq("prompt_id", like.prompt_id);
        let response = self
            .http
            .delete(&self.table_url(LIKES, &query), None, &self.headers())
            .await?;
        ensure_success(response).map(|_| ())
    }

    async fn count_likes(&self, id: PromptId) -> Result<u64, RemoteError> {
        let query = QueryString::new()
            .select("prompt_id")
            .eq("prompt_id", id)
            .limit(1);
        let response = self
            .http
            .get(&self.table_url(LIKES, &query), &self.prefer("count=exact"))
            .await?;
        let response = ensure_success(response)?;
        response
            .header_value("Content-Range")
            .and_then(parse_content_range)
            .ok_or_else(|| RemoteError::Decode("missing Content-Range total".to_string()))
    }

    async fn insert_profile(&self, user_id: Uuid, name: &str) -> Result<(), RemoteError> {
        let body = serde_json::json!({ "id": user_id, "name": name }).to_string();
        let response = self
            .http
            .post(
                &self.table_url(USERS, &QueryString::new()),
                &body,
                &self.prefer("return=minimal"),
            )
            .await?;
        ensure_success(response).map(|_| ())
    }
}
