//! REST Backend
//!
//! Wire types and the store seams the console controllers talk to.
//! The native build ships a `reqwest` implementation ([`ConsoleClient`]);
//! the browser front-end provides its own over `gloo-net`.

pub mod dto;
pub mod error;

#[cfg(feature = "native")]
pub mod client;

use async_trait::async_trait;

pub use dto::{
    media_extension_allowed, Account, AccountForm, AccountId, MediaFile, MediaSource,
    MutationResponse, Post, PostForm, PostFormError, PostId, PostUpload,
};
pub use error::{ApiError, ApiResult};

#[cfg(feature = "native")]
pub use client::{load_media, ConsoleClient};

/// Path of the account collection
pub const ACCOUNTS_PATH: &str = "/api/accounts";

/// Path of the post collection
pub const POSTS_PATH: &str = "/api/posts";

/// CRUD access to `/api/accounts`
#[async_trait(?Send)]
pub trait AccountStore {
    async fn list_accounts(&self) -> ApiResult<Vec<Account>>;

    async fn get_account(&self, id: AccountId) -> ApiResult<Account>;

    async fn create_account(&self, form: &AccountForm) -> ApiResult<MutationResponse>;

    async fn update_account(&self, id: AccountId, form: &AccountForm)
        -> ApiResult<MutationResponse>;

    async fn delete_account(&self, id: AccountId) -> ApiResult<MutationResponse>;
}

/// CRUD access to `/api/posts` (multipart writes)
#[async_trait(?Send)]
pub trait PostStore {
    /// File handle type attached to uploads on this platform
    type Media: MediaSource + Clone;

    async fn list_posts(&self) -> ApiResult<Vec<Post>>;

    async fn get_post(&self, id: PostId) -> ApiResult<Post>;

    async fn create_post(&self, upload: &PostUpload<Self::Media>) -> ApiResult<MutationResponse>;

    async fn update_post(
        &self,
        id: PostId,
        upload: &PostUpload<Self::Media>,
    ) -> ApiResult<MutationResponse>;

    async fn delete_post(&self, id: PostId) -> ApiResult<MutationResponse>;
}

/// URL of one item in a collection
pub fn item_url(base_url: &str, collection: &str, id: i64) -> String {
    format!("{}{}/{}", base_url.trim_end_matches('/'), collection, id)
}

/// URL of a collection
pub fn collection_url(base_url: &str, collection: &str) -> String {
    format!("{}{}", base_url.trim_end_matches('/'), collection)
}
