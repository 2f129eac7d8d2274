//! HTTP API Client
//!
//! Account and post stores over `fetch`. Post writes go out as
//! `multipart/form-data` built from a browser `FormData`.

use async_trait::async_trait;
use gloo_net::http::{Request, Response};
use serde::de::DeserializeOwned;

use autopost_console::api::dto::ErrorBody;
use autopost_console::api::{
    collection_url, item_url, Account, AccountForm, AccountId, AccountStore, ApiError, ApiResult,
    MediaSource, MutationResponse, Post, PostId, PostStore, PostUpload, ACCOUNTS_PATH, POSTS_PATH,
};

/// Default server URL
pub const DEFAULT_SERVER_URL: &str = "http://localhost:5000";

const SERVER_URL_KEY: &str = "autopost_server_url";

/// Get the server URL from local storage or use default
pub fn get_server_url() -> String {
    let url = web_sys::window()
        .and_then(|window| window.local_storage().ok().flatten())
        .and_then(|storage| storage.get_item(SERVER_URL_KEY).ok().flatten())
        .filter(|url| !url.trim().is_empty())
        .unwrap_or_else(|| DEFAULT_SERVER_URL.to_string());
    url.trim_end_matches('/').to_string()
}

/// Set the server URL in local storage
pub fn set_server_url(url: &str) {
    if let Some(window) = web_sys::window() {
        if let Ok(Some(storage)) = window.local_storage() {
            let _ = storage.set_item(SERVER_URL_KEY, url.trim());
        }
    }
}

/// File picked in an `<input type="file">`
#[derive(Debug, Clone)]
pub struct BrowserFile {
    name: String,
    file: web_sys::File,
}

impl From<web_sys::File> for BrowserFile {
    fn from(file: web_sys::File) -> Self {
        Self {
            name: file.name(),
            file,
        }
    }
}

impl MediaSource for BrowserFile {
    fn file_name(&self) -> &str {
        &self.name
    }
}

/// REST store bound to one server
#[derive(Debug, Clone)]
pub struct HttpStore {
    base_url: String,
}

impl HttpStore {
    pub fn new(base_url: &str) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    /// Store for the URL saved in local storage
    pub fn from_storage() -> Self {
        Self::new(&get_server_url())
    }

    fn form_data(upload: &PostUpload<BrowserFile>) -> ApiResult<web_sys::FormData> {
        let form = web_sys::FormData::new().map_err(js_error)?;
        for (name, value) in upload.text_fields() {
            form.append_with_str(name, value).map_err(js_error)?;
        }
        if let Some(media) = &upload.media {
            form.append_with_blob_and_filename("file", &media.file, &media.name)
                .map_err(js_error)?;
        }
        Ok(form)
    }
}

fn js_error(value: wasm_bindgen::JsValue) -> ApiError {
    ApiError::Validation(format!("{:?}", value))
}

fn network(e: gloo_net::Error) -> ApiError {
    ApiError::Network(e.to_string())
}

/// Decode a JSON body, mapping non-2xx answers to [`ApiError`]
async fn decode<T: DeserializeOwned>(response: Response) -> ApiResult<T> {
    if !response.ok() {
        let status = response.status();
        let message = match response.json::<ErrorBody>().await {
            Ok(body) => body.error,
            Err(_) => response.status_text(),
        };
        web_sys::console::warn_1(&format!("API error {}: {}", status, message).into());
        return Err(ApiError::from_status(status, message));
    }

    response
        .json()
        .await
        .map_err(|e| ApiError::Decode(e.to_string()))
}

#[async_trait(?Send)]
impl AccountStore for HttpStore {
    async fn list_accounts(&self) -> ApiResult<Vec<Account>> {
        let url = collection_url(&self.base_url, ACCOUNTS_PATH);
        decode(Request::get(&url).send().await.map_err(network)?).await
    }

    async fn get_account(&self, id: AccountId) -> ApiResult<Account> {
        let url = item_url(&self.base_url, ACCOUNTS_PATH, id);
        decode(Request::get(&url).send().await.map_err(network)?).await
    }

    async fn create_account(&self, form: &AccountForm) -> ApiResult<MutationResponse> {
        let url = collection_url(&self.base_url, ACCOUNTS_PATH);
        let request = Request::post(&url).json(form).map_err(network)?;
        decode(request.send().await.map_err(network)?).await
    }

    async fn update_account(
        &self,
        id: AccountId,
        form: &AccountForm,
    ) -> ApiResult<MutationResponse> {
        let url = item_url(&self.base_url, ACCOUNTS_PATH, id);
        let request = Request::put(&url).json(form).map_err(network)?;
        decode(request.send().await.map_err(network)?).await
    }

    async fn delete_account(&self, id: AccountId) -> ApiResult<MutationResponse> {
        let url = item_url(&self.base_url, ACCOUNTS_PATH, id);
        decode(Request::delete(&url).send().await.map_err(network)?).await
    }
}

#[async_trait(?Send)]
impl PostStore for HttpStore {
    type Media = BrowserFile;

    async fn list_posts(&self) -> ApiResult<Vec<Post>> {
        let url = collection_url(&self.base_url, POSTS_PATH);
        decode(Request::get(&url).send().await.map_err(network)?).await
    }

    async fn get_post(&self, id: PostId) -> ApiResult<Post> {
        let url = item_url(&self.base_url, POSTS_PATH, id);
        decode(Request::get(&url).send().await.map_err(network)?).await
    }

    async fn create_post(&self, upload: &PostUpload<BrowserFile>) -> ApiResult<MutationResponse> {
        let url = collection_url(&self.base_url, POSTS_PATH);
        let request = Request::post(&url)
            .body(Self::form_data(upload)?)
            .map_err(network)?;
        decode(request.send().await.map_err(network)?).await
    }

    async fn update_post(
        &self,
        id: PostId,
        upload: &PostUpload<BrowserFile>,
    ) -> ApiResult<MutationResponse> {
        let url = item_url(&self.base_url, POSTS_PATH, id);
        let request = Request::put(&url)
            .body(Self::form_data(upload)?)
            .map_err(network)?;
        decode(request.send().await.map_err(network)?).await
    }

    async fn delete_post(&self, id: PostId) -> ApiResult<MutationResponse> {
        let url = item_url(&self.base_url, POSTS_PATH, id);
        decode(Request::delete(&url).send().await.map_err(network)?).await
    }
}
