/**
 * Post Creation and Profile Editing
 *
 * Flows that push a freshly captured image to blob storage before writing
 * the document that references it. A local payload is uploaded under a
 * generated key; an already remote reference is used as-is.
 */
use crate::client::session::SessionContext;
use crate::shared::error::FeedError;
use crate::shared::post::PostId;
use crate::shared::snapshot::PostRecord;
use crate::store::{BlobStore, DocumentStore, StoreError};
use chrono::Utc;
use std::sync::Arc;

/// Image attached to a new post or avatar
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImageSource {
    /// Already stored remotely
    Remote(String),
    /// Freshly captured bytes that still need uploading
    Local(Vec<u8>),
}

/// User input for a new post
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PostDraft {
    pub image: Option<ImageSource>,
    pub caption: String,
    pub location: Option<String>,
}

async fn resolve_image(
    blobs: &dyn BlobStore,
    image: ImageSource,
    key: String,
) -> Result<String, StoreError> {
    match image {
        ImageSource::Remote(url) => Ok(url),
        ImageSource::Local(bytes) => {
            tracing::debug!("[Publish] Uploading {} bytes to {}", bytes.len(), key);
            blobs.upload(&key, bytes).await
        }
    }
}

fn publish_failed(err: StoreError) -> FeedError {
    FeedError::publish_failed(err.to_string())
}

/// Creates posts on behalf of the signed-in user
#[derive(Clone)]
pub struct PostPublisher {
    documents: Arc<dyn DocumentStore>,
    blobs: Arc<dyn BlobStore>,
    session: SessionContext,
}

impl PostPublisher {
    pub fn new(documents: Arc<dyn DocumentStore>, blobs: Arc<dyn BlobStore>, session: SessionContext) -> Self {
        Self {
            documents,
            blobs,
            session,
        }
    }

    /// Publish a new post, returning its id
    ///
    /// # Errors
    ///
    /// - [`FeedError::Unauthenticated`] when nobody is signed in
    /// - [`FeedError::ValidationError`] when the draft has no image; no
    ///   remote call is made
    /// - [`FeedError::PublishFailed`] when the upload or write fails
    pub async fn create_post(&self, draft: PostDraft) -> Result<PostId, FeedError> {
        let user = self.session.current_user().ok_or(FeedError::Unauthenticated)?;
        let image = draft
            .image
            .ok_or_else(|| FeedError::validation("image", "A post needs a photo"))?;

        let key = format!("posts/{}-{}.jpg", user.id, Utc::now().timestamp_millis());
        let image_url = resolve_image(self.blobs.as_ref(), image, key)
            .await
            .map_err(publish_failed)?;

        let record = PostRecord {
            author_id: Some(user.id.clone()),
            author_name: Some(user.display_name.clone()),
            author_avatar: user.avatar_url.clone(),
            image_url: Some(image_url),
            caption: Some(draft.caption.trim().to_string()),
            location: draft.location.map(|l| l.trim().to_string()).filter(|l| !l.is_empty()),
            likes: Some(Vec::new()),
            comments_preview: Some(Vec::new()),
            comment_count: Some(0),
            created_at: None,
            updated_at: None,
        };

        let id = self.documents.create_post(record).await.map_err(publish_failed)?;
        tracing::info!("[Publish] {} created post {}", user.id, id);
        Ok(id)
    }
}

/// Edits the signed-in user's profile
#[derive(Clone)]
pub struct ProfileEditor {
    blobs: Arc<dyn BlobStore>,
    session: SessionContext,
}

impl ProfileEditor {
    pub fn new(blobs: Arc<dyn BlobStore>, session: SessionContext) -> Self {
        Self { blobs, session }
    }

    /// Update the display name and, optionally, the avatar
    ///
    /// A local avatar is uploaded to `avatars/{uid}.jpg` first. Returns the
    /// resulting avatar reference, if any.
    pub async fn update_profile(
        &self,
        display_name: &str,
        avatar: Option<ImageSource>,
    ) -> Result<Option<String>, FeedError> {
        let user = self.session.current_user().ok_or(FeedError::Unauthenticated)?;
        let display_name = display_name.trim();
        if display_name.is_empty() {
            return Err(FeedError::validation("display_name", "Name cannot be empty"));
        }

        let avatar_url = match avatar {
            Some(image) => Some(
                resolve_image(self.blobs.as_ref(), image, format!("avatars/{}.jpg", user.id))
                    .await
                    .map_err(publish_failed)?,
            ),
            None => None,
        };

        if !self.session.update_profile(display_name.to_string(), avatar_url.clone()) {
            return Err(FeedError::Unauthenticated);
        }
        tracing::info!("[Publish] Updated profile of {}", user.id);
        Ok(avatar_url.or(user.avatar_url))
    }
}
