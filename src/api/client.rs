//! REST API Client
//!
//! `reqwest` implementation of the account and post stores.

use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use reqwest::{Client, Response};
use serde::de::DeserializeOwned;
use std::path::Path;
use std::time::Duration;

use super::dto::{
    Account, AccountForm, AccountId, ErrorBody, MediaFile, MutationResponse, Post, PostId,
    PostUpload,
};
use super::error::{ApiError, ApiResult};
use super::{collection_url, item_url, AccountStore, PostStore, ACCOUNTS_PATH, POSTS_PATH};

/// HTTP client for the auto-posting backend
#[derive(Clone)]
pub struct ConsoleClient {
    client: Client,
    base_url: String,
}

impl ConsoleClient {
    /// Create a client for `base_url` (e.g. "http://localhost:5000")
    pub fn new(base_url: impl Into<String>, request_timeout: Duration) -> ApiResult<Self> {
        let client = Client::builder().timeout(request_timeout).build()?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn multipart(upload: &PostUpload<MediaFile>) -> ApiResult<Form> {
        let mut form = Form::new();
        for (name, value) in upload.text_fields() {
            form = form.text(name, value.to_string());
        }

        if let Some(media) = &upload.media {
            let mime = mime_guess::from_path(&media.file_name).first_or_octet_stream();
            let part = Part::bytes(media.bytes.clone())
                .file_name(media.file_name.clone())
                .mime_str(mime.as_ref())?;
            form = form.part("file", part);
        }

        Ok(form)
    }
}

/// Decode a JSON body, mapping non-2xx answers to [`ApiError`]
async fn decode<T: DeserializeOwned>(response: Response) -> ApiResult<T> {
    let status = response.status();

    if status.is_success() {
        return response
            .json()
            .await
            .map_err(|e| ApiError::Decode(e.to_string()));
    }

    let text = response.text().await.unwrap_or_default();
    let message = serde_json::from_str::<ErrorBody>(&text)
        .map(|body| body.error)
        .unwrap_or(text);

    tracing::warn!(status = status.as_u16(), error = %message, "Backend rejected request");
    Err(ApiError::from_status(status.as_u16(), message))
}

#[async_trait(?Send)]
impl AccountStore for ConsoleClient {
    async fn list_accounts(&self) -> ApiResult<Vec<Account>> {
        let url = collection_url(&self.base_url, ACCOUNTS_PATH);
        decode(self.client.get(url).send().await?).await
    }

    async fn get_account(&self, id: AccountId) -> ApiResult<Account> {
        let url = item_url(&self.base_url, ACCOUNTS_PATH, id);
        decode(self.client.get(url).send().await?).await
    }

    async fn create_account(&self, form: &AccountForm) -> ApiResult<MutationResponse> {
        let url = collection_url(&self.base_url, ACCOUNTS_PATH);
        decode(self.client.post(url).json(form).send().await?).await
    }

    async fn update_account(
        &self,
        id: AccountId,
        form: &AccountForm,
    ) -> ApiResult<MutationResponse> {
        let url = item_url(&self.base_url, ACCOUNTS_PATH, id);
        decode(self.client.put(url).json(form).send().await?).await
    }

    async fn delete_account(&self, id: AccountId) -> ApiResult<MutationResponse> {
        let url = item_url(&self.base_url, ACCOUNTS_PATH, id);
        decode(self.client.delete(url).send().await?).await
    }
}

#[async_trait(?Send)]
impl PostStore for ConsoleClient {
    type Media = MediaFile;

    async fn list_posts(&self) -> ApiResult<Vec<Post>> {
        let url = collection_url(&self.base_url, POSTS_PATH);
        decode(self.client.get(url).send().await?).await
    }

    async fn get_post(&self, id: PostId) -> ApiResult<Post> {
        let url = item_url(&self.base_url, POSTS_PATH, id);
        decode(self.client.get(url).send().await?).await
    }

    async fn create_post(&self, upload: &PostUpload<MediaFile>) -> ApiResult<MutationResponse> {
        let url = collection_url(&self.base_url, POSTS_PATH);
        let form = Self::multipart(upload)?;
        decode(self.client.post(url).multipart(form).send().await?).await
    }

    async fn update_post(
        &self,
        id: PostId,
        upload: &PostUpload<MediaFile>,
    ) -> ApiResult<MutationResponse> {
        let url = item_url(&self.base_url, POSTS_PATH, id);
        let form = Self::multipart(upload)?;
        decode(self.client.put(url).multipart(form).send().await?).await
    }

    async fn delete_post(&self, id: PostId) -> ApiResult<MutationResponse> {
        let url = item_url(&self.base_url, POSTS_PATH, id);
        decode(self.client.delete(url).send().await?).await
    }
}

/// Read a media file from disk for upload
pub async fn load_media(path: &Path) -> std::io::Result<MediaFile> {
    let bytes = tokio::fs::read(path).await?;
    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| "upload".to_string());

    Ok(MediaFile { file_name, bytes })
}
