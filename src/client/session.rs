/**
 * Session Context
 *
 * Explicit handle on the signed-in user. Commands read the current user
 * from here instead of from global state, and the view layer watches it for
 * login-state changes.
 */
use crate::shared::post::UserId;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::watch;

/// Identity of the signed-in user
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthUser {
    pub id: UserId,
    pub display_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avatar_url: Option<String>,
}

impl AuthUser {
    pub fn new(id: impl Into<UserId>, display_name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            display_name: display_name.into(),
            avatar_url: None,
        }
    }
}

/// Shared session state
///
/// Cloning yields another handle on the same session.
#[derive(Debug, Clone)]
pub struct SessionContext {
    tx: Arc<watch::Sender<Option<AuthUser>>>,
}

impl Default for SessionContext {
    fn default() -> Self {
        Self::new()
    }
}

impl SessionContext {
    /// Create a signed-out session
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(None);
        Self { tx: Arc::new(tx) }
    }

    /// Create a session already signed in as `user`
    pub fn signed_in(user: AuthUser) -> Self {
        let session = Self::new();
        session.sign_in(user);
        session
    }

    /// The signed-in user, if any
    pub fn current_user(&self) -> Option<AuthUser> {
        self.tx.borrow().clone()
    }

    pub fn is_signed_in(&self) -> bool {
        self.tx.borrow().is_some()
    }

    pub fn sign_in(&self, user: AuthUser) {
        tracing::info!("[Session] Signed in as {}", user.id);
        self.tx.send_replace(Some(user));
    }

    pub fn sign_out(&self) {
        if self.tx.send_replace(None).is_some() {
            tracing::info!("[Session] Signed out");
        }
    }

    /// Update the signed-in user's profile fields
    ///
    /// Returns `false` when nobody is signed in.
    pub fn update_profile(&self, display_name: String, avatar_url: Option<String>) -> bool {
        self.tx.send_if_modified(|current| match current {
            Some(user) => {
                user.display_name = display_name;
                if avatar_url.is_some() {
                    user.avatar_url = avatar_url;
                }
                true
            }
            None => false,
        })
    }

    /// Receiver notified on every login-state change
    pub fn watch(&self) -> watch::Receiver<Option<AuthUser>> {
        self.tx.subscribe()
    }
}
