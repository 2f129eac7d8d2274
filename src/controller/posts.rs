//! Post Manager
//!
//! Same table/form/modal flow as the account manager, against `/api/posts`.
//! Clip times are shown as `m:ss` and sent as seconds; forms are validated
//! before anything is uploaded.

use std::cell::RefCell;

use crate::api::{ApiResult, Post, PostForm, PostId, PostStore};
use crate::format::seconds_to_time;

use super::table::{Confirm, ListSequencer, ListTicket, Modal, RowAction};

/// One rendered table row
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PostRow {
    pub id: PostId,
    pub filename: String,
    pub caption: String,
    pub reply_content: String,
    /// `m:ss`, empty when unset
    pub start_time: String,
    pub end_time: String,
    pub actions: [RowAction<PostId>; 2],
}

impl From<&Post> for PostRow {
    fn from(post: &Post) -> Self {
        Self {
            id: post.id,
            filename: post.filename.clone(),
            caption: post.caption.clone(),
            reply_content: post.reply_content.clone(),
            start_time: seconds_to_time(post.start_time),
            end_time: seconds_to_time(post.end_time),
            actions: RowAction::for_row(post.id),
        }
    }
}

pub struct PostManager<S: PostStore, C> {
    store: S,
    confirm: C,
    sequencer: ListSequencer,
    rows: RefCell<Vec<PostRow>>,
    form: RefCell<PostForm<S::Media>>,
    modal: RefCell<Modal<PostId, PostForm<S::Media>>>,
}

impl<S: PostStore, C: Confirm> PostManager<S, C> {
    pub fn new(store: S, confirm: C) -> Self {
        Self {
            store,
            confirm,
            sequencer: ListSequencer::new(),
            rows: RefCell::new(Vec::new()),
            form: RefCell::new(PostForm::default()),
            modal: RefCell::new(Modal::Closed),
        }
    }

    pub fn rows(&self) -> Vec<PostRow> {
        self.rows.borrow().clone()
    }

    pub fn form(&self) -> PostForm<S::Media> {
        self.form.borrow().clone()
    }

    pub fn modal(&self) -> Modal<PostId, PostForm<S::Media>> {
        self.modal.borrow().clone()
    }

    pub fn close_modal(&self) {
        self.modal.replace(Modal::Closed);
    }

    pub fn list_requests(&self) -> u64 {
        self.sequencer.issued()
    }

    pub async fn list(&self) -> ApiResult<()> {
        let ticket = self.sequencer.begin();
        match self.store.list_posts().await {
            Ok(posts) => {
                self.apply_listing(ticket, &posts);
                Ok(())
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to load posts");
                Err(e)
            }
        }
    }

    pub fn apply_listing(&self, ticket: ListTicket, posts: &[Post]) -> bool {
        if !self.sequencer.accept(ticket) {
            tracing::debug!(?ticket, "Discarding stale post listing");
            return false;
        }
        self.rows.replace(posts.iter().map(PostRow::from).collect());
        true
    }

    /// Validate and upload a new post; a media file is required
    pub async fn create(&self, form: PostForm<S::Media>) -> ApiResult<()> {
        self.form.replace(form.clone());

        let upload = form.into_upload(true).map_err(|e| {
            tracing::warn!(error = %e, "Rejected post form");
            e
        })?;

        match self.store.create_post(&upload).await {
            Ok(response) => {
                tracing::info!(post_id = ?response.id, filename = ?response.filename, "Post created");
                self.form.replace(PostForm::default());
                self.refresh().await;
                Ok(())
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to create post");
                Err(e)
            }
        }
    }

    pub async fn edit(&self, id: PostId) -> ApiResult<()> {
        match self.store.get_post(id).await {
            Ok(post) => {
                self.modal.replace(Modal::Open {
                    id,
                    buffer: PostForm::from_post(&post),
                });
                Ok(())
            }
            Err(e) => {
                tracing::error!(post_id = id, error = %e, "Failed to load post");
                Err(e)
            }
        }
    }

    /// Upload changes; without a new media file the stored one is kept
    pub async fn save(&self, id: PostId, form: PostForm<S::Media>) -> ApiResult<()> {
        if self.modal.borrow().editing() == Some(id) {
            self.modal.replace(Modal::Open {
                id,
                buffer: form.clone(),
            });
        }

        let upload = form.into_upload(false).map_err(|e| {
            tracing::warn!(post_id = id, error = %e, "Rejected post form");
            e
        })?;

        match self.store.update_post(id, &upload).await {
            Ok(_) => {
                tracing::info!(post_id = id, "Post updated");
                self.close_modal();
                self.refresh().await;
                Ok(())
            }
            Err(e) => {
                tracing::error!(post_id = id, error = %e, "Failed to update post");
                Err(e)
            }
        }
    }

    pub async fn remove(&self, id: PostId) -> ApiResult<bool> {
        if !self
            .confirm
            .confirm("Are you sure you want to delete this post?")
        {
            tracing::debug!(post_id = id, "Post deletion cancelled");
            return Ok(false);
        }

        match self.store.delete_post(id).await {
            Ok(_) => {
                tracing::info!(post_id = id, "Post deleted");
                self.refresh().await;
                Ok(true)
            }
            Err(e) => {
                tracing::error!(post_id = id, error = %e, "Failed to delete post");
                Err(e)
            }
        }
    }

    pub async fn dispatch(&self, action: RowAction<PostId>) -> ApiResult<()> {
        match action {
            RowAction::Edit(id) => self.edit(id).await,
            RowAction::Delete(id) => self.remove(id).await.map(|_| ()),
        }
    }

    async fn refresh(&self) {
        if let Err(e) = self.list().await {
            tracing::warn!(error = %e, "Post list refresh failed after mutation");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::{ApiError, MediaFile, MutationResponse, PostUpload};
    use async_trait::async_trait;
    use std::cell::Cell;
    use std::rc::Rc;

    #[derive(Default)]
    struct FakePosts {
        posts: RefCell<Vec<Post>>,
        uploads: RefCell<Vec<PostUpload<MediaFile>>>,
        next_id: Cell<PostId>,
        list_calls: Cell<usize>,
        deletes: Cell<usize>,
    }

    fn stored(id: PostId, upload: &PostUpload<MediaFile>, filename: &str) -> Post {
        Post {
            id,
            filename: filename.to_string(),
            caption: upload.caption.clone(),
            reply_content: upload.reply_content.clone(),
            start_time: upload.start_time.parse().ok(),
            end_time: upload.end_time.parse().ok(),
        }
    }

    #[async_trait(?Send)]
    impl PostStore for Rc<FakePosts> {
        type Media = MediaFile;

        async fn list_posts(&self) -> ApiResult<Vec<Post>> {
            self.list_calls.set(self.list_calls.get() + 1);
            Ok(self.posts.borrow().clone())
        }

        async fn get_post(&self, id: PostId) -> ApiResult<Post> {
            self.posts
                .borrow()
                .iter()
                .find(|p| p.id == id)
                .cloned()
                .ok_or_else(|| ApiError::NotFound("Post not found".to_string()))
        }

        async fn create_post(&self, upload: &PostUpload<MediaFile>) -> ApiResult<MutationResponse> {
            let id = self.next_id.get() + 1;
            self.next_id.set(id);
            let filename = upload
                .media
                .as_ref()
                .map(|m| m.file_name.clone())
                .unwrap_or_default();
            self.posts
                .borrow_mut()
                .push(stored(id, upload, &filename));
            self.uploads.borrow_mut().push(upload.clone());
            Ok(MutationResponse {
                message: Some("Post added successfully".to_string()),
                id: Some(id),
                filename: Some(filename),
            })
        }

        async fn update_post(
            &self,
            id: PostId,
            upload: &PostUpload<MediaFile>,
        ) -> ApiResult<MutationResponse> {
            self.uploads.borrow_mut().push(upload.clone());
            let mut posts = self.posts.borrow_mut();
            let slot = posts
                .iter_mut()
                .find(|p| p.id == id)
                .ok_or_else(|| ApiError::NotFound("Post not found".to_string()))?;
            let filename = upload
                .media
                .as_ref()
                .map(|m| m.file_name.clone())
                .unwrap_or_else(|| slot.filename.clone());
            *slot = stored(id, upload, &filename);
            Ok(MutationResponse::default())
        }

        async fn delete_post(&self, id: PostId) -> ApiResult<MutationResponse> {
            self.deletes.set(self.deletes.get() + 1);
            self.posts.borrow_mut().retain(|p| p.id != id);
            Ok(MutationResponse::default())
        }
    }

    fn clip(name: &str) -> MediaFile {
        MediaFile {
            file_name: name.to_string(),
            bytes: b"video".to_vec(),
        }
    }

    fn form(caption: &str, start: &str, end: &str, media: Option<MediaFile>) -> PostForm<MediaFile> {
        PostForm {
            caption: caption.to_string(),
            reply_content: "https://example.com".to_string(),
            start_time: start.to_string(),
            end_time: end.to_string(),
            media,
        }
    }

    fn manager(
        answer: bool,
    ) -> (PostManager<Rc<FakePosts>, impl Confirm>, Rc<FakePosts>) {
        let store = Rc::new(FakePosts::default());
        let manager = PostManager::new(store.clone(), move |_: &str| answer);
        (manager, store)
    }

    #[tokio::test]
    async fn test_create_sends_seconds_and_renders_clip_times() {
        let (manager, store) = manager(true);
        manager
            .create(form("launch", "1:05", "2:30", Some(clip("launch.mp4"))))
            .await
            .unwrap();

        let upload = store.uploads.borrow()[0].clone();
        assert_eq!(upload.start_time, "65");
        assert_eq!(upload.end_time, "150");

        assert_eq!(store.list_calls.get(), 1);
        assert_eq!(manager.form(), PostForm::default());
        let row = &manager.rows()[0];
        assert_eq!(row.filename, "launch.mp4");
        assert_eq!(row.start_time, "1:05");
        assert_eq!(row.end_time, "2:30");
    }

    #[tokio::test]
    async fn test_malformed_clip_time_never_uploads() {
        let (manager, store) = manager(true);
        let bad = form("launch", "1:75", "", Some(clip("launch.mp4")));

        let err = manager.create(bad.clone()).await.unwrap_err();
        assert!(matches!(err, ApiError::Validation(_)));
        assert!(store.uploads.borrow().is_empty());
        assert_eq!(store.list_calls.get(), 0);
        assert_eq!(manager.form(), bad);
    }

    #[tokio::test]
    async fn test_create_requires_supported_media() {
        let (manager, store) = manager(true);

        assert!(manager.create(form("a", "", "", None)).await.is_err());
        assert!(manager
            .create(form("a", "", "", Some(clip("a.gif"))))
            .await
            .is_err());
        assert!(store.uploads.borrow().is_empty());
    }

    #[tokio::test]
    async fn test_edit_and_save_without_new_media() {
        let (manager, store) = manager(true);
        manager
            .create(form("launch", "0:10", "", Some(clip("launch.mov"))))
            .await
            .unwrap();

        manager.dispatch(RowAction::Edit(1)).await.unwrap();
        let buffer = manager.modal().buffer().cloned().unwrap();
        assert_eq!(buffer.start_time, "0:10");
        assert_eq!(buffer.end_time, "");
        assert!(buffer.media.is_none());

        manager
            .save(1, PostForm { caption: "relaunch".to_string(), ..buffer })
            .await
            .unwrap();

        assert!(!manager.modal().is_open());
        assert_eq!(store.list_calls.get(), 2);
        let row = &manager.rows()[0];
        assert_eq!(row.caption, "relaunch");
        assert_eq!(row.filename, "launch.mov");
        assert_eq!(row.start_time, "0:10");
    }

    #[tokio::test]
    async fn test_invalid_save_keeps_modal() {
        let (manager, store) = manager(true);
        manager
            .create(form("launch", "", "", Some(clip("launch.mp4"))))
            .await
            .unwrap();
        manager.edit(1).await.unwrap();

        let bad = form("launch", "", "9:99", None);
        assert!(manager.save(1, bad.clone()).await.is_err());
        assert_eq!(manager.modal().buffer(), Some(&bad));
        assert_eq!(store.uploads.borrow().len(), 1);
    }

    #[tokio::test]
    async fn test_delete_confirmation_gate() {
        let (declining, store) = manager(false);
        store.posts.borrow_mut().push(Post {
            id: 1,
            filename: "a.mp4".to_string(),
            caption: "c".to_string(),
            reply_content: String::new(),
            start_time: None,
            end_time: None,
        });

        assert!(!declining.remove(1).await.unwrap());
        assert_eq!(store.deletes.get(), 0);

        let (accepting, store) = manager(true);
        store.posts.borrow_mut().push(Post {
            id: 1,
            filename: "a.mp4".to_string(),
            caption: "c".to_string(),
            reply_content: String::new(),
            start_time: None,
            end_time: None,
        });
        accepting.dispatch(RowAction::Delete(1)).await.unwrap();
        assert_eq!(store.deletes.get(), 1);
        assert_eq!(store.list_calls.get(), 1);
        assert!(accepting.rows().is_empty());
    }

    #[tokio::test]
    async fn test_list_is_idempotent() {
        let (manager, _) = manager(true);
        manager
            .create(form("a", "", "", Some(clip("a.mp4"))))
            .await
            .unwrap();
        let before = manager.rows();
        manager.list().await.unwrap();
        manager.list().await.unwrap();
        assert_eq!(manager.rows(), before);
        assert_eq!(manager.list_requests(), 3);
    }

    #[test]
    fn test_stale_listing_discarded() {
        let (manager, _) = manager(true);
        let post = |caption: &str| Post {
            id: 1,
            filename: "a.mp4".to_string(),
            caption: caption.to_string(),
            reply_content: String::new(),
            start_time: Some(5),
            end_time: None,
        };

        let older = manager.sequencer.begin();
        let newer = manager.sequencer.begin();
        assert!(manager.apply_listing(newer, &[post("new")]));
        assert!(!manager.apply_listing(older, &[post("old")]));
        assert_eq!(manager.rows()[0].caption, "new");
        assert_eq!(manager.rows()[0].start_time, "0:05");
    }
}
