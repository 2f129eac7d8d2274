//! Data Transfer Objects
//!
//! Request and response types exchanged with the `/api/accounts` and
//! `/api/posts` endpoints.

use serde::{Deserialize, Deserializer, Serialize};
use thiserror::Error;

use crate::format::{self, ClipTimeError};

/// Server-assigned account identifier
pub type AccountId = i64;

/// Server-assigned post identifier
pub type PostId = i64;

/// Media extensions the backend accepts for upload
pub const ALLOWED_MEDIA_EXTENSIONS: [&str; 3] = ["mp4", "mov", "avi"];

// ============================================
// ACCOUNTS
// ============================================

/// A posting account as returned by the backend.
///
/// Credentials are write-only: the list and detail endpoints never return
/// them, so they only appear when a caller builds the value locally.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Account {
    pub id: AccountId,
    pub username: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub consumer_key: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub consumer_secret: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub access_token: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub access_token_secret: Option<String>,
    #[serde(with = "post_flag")]
    pub post_flag: bool,
}

/// Six-field payload for `POST /api/accounts` and `PUT /api/accounts/{id}`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct AccountForm {
    pub username: String,
    pub consumer_key: String,
    pub consumer_secret: String,
    pub access_token: String,
    pub access_token_secret: String,
    #[serde(with = "post_flag")]
    pub post_flag: bool,
}

impl AccountForm {
    /// Edit buffer for an existing account. Secrets start blank because the
    /// backend does not return them.
    pub fn from_account(account: &Account) -> Self {
        Self {
            username: account.username.clone(),
            consumer_key: account.consumer_key.clone().unwrap_or_default(),
            consumer_secret: account.consumer_secret.clone().unwrap_or_default(),
            access_token: account.access_token.clone().unwrap_or_default(),
            access_token_secret: account.access_token_secret.clone().unwrap_or_default(),
            post_flag: account.post_flag,
        }
    }
}

/// `post_flag` travels as 0/1; older rows may carry a JSON boolean.
mod post_flag {
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &bool, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u8(u8::from(*value))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<bool, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Flag {
            Bool(bool),
            Int(i64),
        }

        Ok(match Flag::deserialize(deserializer)? {
            Flag::Bool(b) => b,
            Flag::Int(i) => i != 0,
        })
    }
}

// ============================================
// POSTS
// ============================================

/// A scheduled post (media file plus caption and follow-up reply)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Post {
    pub id: PostId,
    pub filename: String,
    pub caption: String,
    #[serde(default)]
    pub reply_content: String,
    /// Clip start offset in seconds
    #[serde(default, deserialize_with = "lenient_seconds")]
    pub start_time: Option<u32>,
    /// Clip end offset in seconds
    #[serde(default, deserialize_with = "lenient_seconds")]
    pub end_time: Option<u32>,
}

/// Accepts an integer, a numeric string, `""` or `null`
fn lenient_seconds<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<u32>, D::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Int(u32),
        Text(String),
    }

    match Option::<Raw>::deserialize(deserializer)? {
        None => Ok(None),
        Some(Raw::Int(n)) => Ok(Some(n)),
        Some(Raw::Text(s)) if s.trim().is_empty() => Ok(None),
        Some(Raw::Text(s)) => s
            .trim()
            .parse()
            .map(Some)
            .map_err(serde::de::Error::custom),
    }
}

/// A platform file handle that can be attached to a post upload
pub trait MediaSource {
    /// Original file name, used for the extension check and the multipart part
    fn file_name(&self) -> &str;
}

/// In-memory media file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MediaFile {
    pub file_name: String,
    pub bytes: Vec<u8>,
}

impl MediaSource for MediaFile {
    fn file_name(&self) -> &str {
        &self.file_name
    }
}

/// Whether the backend will accept a file with this name
pub fn media_extension_allowed(file_name: &str) -> bool {
    file_name
        .rsplit_once('.')
        .map(|(_, ext)| {
            ALLOWED_MEDIA_EXTENSIONS
                .iter()
                .any(|allowed| allowed.eq_ignore_ascii_case(ext))
        })
        .unwrap_or(false)
}

/// Post form as typed by the user (times in `m:ss`)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PostForm<M> {
    pub caption: String,
    pub reply_content: String,
    pub start_time: String,
    pub end_time: String,
    pub media: Option<M>,
}

impl<M> Default for PostForm<M> {
    fn default() -> Self {
        Self {
            caption: String::new(),
            reply_content: String::new(),
            start_time: String::new(),
            end_time: String::new(),
            media: None,
        }
    }
}

impl<M> PostForm<M> {
    /// Edit buffer for an existing post; the media slot starts empty
    pub fn from_post(post: &Post) -> Self {
        Self {
            caption: post.caption.clone(),
            reply_content: post.reply_content.clone(),
            start_time: format::seconds_to_time(post.start_time),
            end_time: format::seconds_to_time(post.end_time),
            media: None,
        }
    }
}

/// Rejected post form
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum PostFormError {
    #[error("start time: {0}")]
    StartTime(ClipTimeError),

    #[error("end time: {0}")]
    EndTime(ClipTimeError),

    #[error("A media file is required")]
    MissingMedia,

    #[error("Unsupported media file {0:?}: allowed extensions are mp4, mov, avi")]
    UnsupportedMedia(String),
}

impl<M: MediaSource> PostForm<M> {
    /// Validate and convert to the multipart payload. `require_media` is set
    /// for creation; updates may keep the stored file.
    pub fn into_upload(self, require_media: bool) -> Result<PostUpload<M>, PostFormError> {
        let start_time =
            format::time_to_seconds(&self.start_time).map_err(PostFormError::StartTime)?;
        let end_time = format::time_to_seconds(&self.end_time).map_err(PostFormError::EndTime)?;

        match &self.media {
            None if require_media => return Err(PostFormError::MissingMedia),
            Some(media) if !media_extension_allowed(media.file_name()) => {
                return Err(PostFormError::UnsupportedMedia(media.file_name().to_string()));
            }
            _ => {}
        }

        Ok(PostUpload {
            caption: self.caption,
            reply_content: self.reply_content,
            start_time,
            end_time,
            media: self.media,
        })
    }
}

/// Validated multipart payload for `POST /api/posts` and `PUT /api/posts/{id}`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PostUpload<M> {
    pub caption: String,
    pub reply_content: String,
    /// Seconds, or empty when unset
    pub start_time: String,
    /// Seconds, or empty when unset
    pub end_time: String,
    /// Sent as the `file` part
    pub media: Option<M>,
}

impl<M> PostUpload<M> {
    /// Text parts in submission order
    pub fn text_fields(&self) -> [(&'static str, &str); 4] {
        [
            ("caption", self.caption.as_str()),
            ("reply_content", self.reply_content.as_str()),
            ("start_time", self.start_time.as_str()),
            ("end_time", self.end_time.as_str()),
        ]
    }
}

// ============================================
// RESPONSES
// ============================================

/// Body returned by create/update/delete endpoints
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct MutationResponse {
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub id: Option<i64>,
    #[serde(default)]
    pub filename: Option<String>,
}

/// Body returned with a non-2xx status
#[derive(Debug, Clone, Deserialize)]
pub struct ErrorBody {
    pub error: String,
}
