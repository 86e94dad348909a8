//! Property-based tests for the optimistic merge

use crate::common::{post, preview, snapshot};
use chrono::Utc;
use pixfeed::client::offline::{merge, OptimisticPatch, OptimisticStateMerger, PatchKey};
use pixfeed::shared::post::prepend_preview;
use pixfeed::shared::{
    CommentId, CommentPreview, FeedSnapshot, Post, PostId, PostRecord, UserId, PREVIEW_LIMIT,
};
use proptest::prelude::*;
use std::collections::{HashMap, VecDeque};

fn user_strategy() -> impl Strategy<Value = String> {
    prop::sample::select(vec!["u1", "u2", "u3", "u4", "u5"]).prop_map(str::to_string)
}

fn likes_strategy() -> impl Strategy<Value = Vec<String>> {
    prop::collection::vec(user_strategy(), 0..5)
}

fn to_record(post: &Post) -> PostRecord {
    PostRecord {
        author_id: Some(post.author_id.clone()),
        author_name: Some(post.author_name.clone()),
        image_url: Some(post.image_url.clone()),
        caption: Some(post.caption.clone()),
        likes: Some(post.likes.iter().cloned().collect()),
        comments_preview: Some(post.comments_preview.clone()),
        comment_count: Some(post.comment_count),
        created_at: Some(post.created_at),
        ..PostRecord::default()
    }
}

fn new_comment(n: usize) -> CommentPreview {
    CommentPreview {
        id: CommentId::new(format!("new-{}", n)),
        author_id: UserId::new("u1"),
        author_name: "u1".to_string(),
        text: format!("comment {}", n),
        created_at: None,
    }
}

/// What happens next to the post, from the client's point of view
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PostEvent {
    /// The user comments; the patch goes pending
    Comment,
    /// The store applies the oldest comment it has not applied yet
    ConfirmOldest,
    /// Someone else comments
    ForeignComment,
    /// The store pushes the same state again
    Redeliver,
    /// A foreign comment is deleted and the count goes down
    DeleteForeign,
}

fn event_strategy() -> impl Strategy<Value = PostEvent> {
    prop_oneof![
        3 => Just(PostEvent::Comment),
        3 => Just(PostEvent::ConfirmOldest),
        2 => Just(PostEvent::ForeignComment),
        1 => Just(PostEvent::Redeliver),
        1 => Just(PostEvent::DeleteForeign),
    ]
}

/// Authoritative state of `p1` as the store sees it
struct RemotePost {
    count: u64,
    preview: Vec<CommentPreview>,
    foreign: u64,
    unconfirmed: VecDeque<CommentPreview>,
}

impl RemotePost {
    fn new(foreign: u64) -> Self {
        let mut remote = Self {
            count: 0,
            preview: Vec::new(),
            foreign: 0,
            unconfirmed: VecDeque::new(),
        };
        for n in 0..foreign {
            remote.foreign_comment(&format!("seed-{}", n));
        }
        remote
    }

    fn land(&mut self, comment: CommentPreview) {
        self.preview = prepend_preview(comment, &self.preview);
        self.count += 1;
    }

    fn foreign_comment(&mut self, id: &str) {
        self.land(preview(id, "u2", "nice"));
        self.foreign += 1;
    }

    fn delete_foreign(&mut self) {
        if self.foreign == 0 {
            return;
        }
        self.foreign -= 1;
        self.count -= 1;
        if let Some(pos) = self.preview.iter().position(|c| c.author_id.as_str() == "u2") {
            self.preview.remove(pos);
        }
    }

    fn snapshot(&self) -> FeedSnapshot {
        snapshot(vec![("p1", to_record(&post("p1", &[], self.preview.clone(), self.count)))])
    }
}

proptest! {
    #[test]
    fn test_like_toggle_twice_restores_likes(likes in likes_strategy(), user in user_strategy()) {
        let likes: Vec<&str> = likes.iter().map(String::as_str).collect();
        let initial = post("p1", &likes, Vec::new(), 0);
        let user = UserId::new(user);

        let first = OptimisticPatch::like_toggle(&initial, &user, Utc::now());
        let toggled = first.apply(initial.clone());
        prop_assert_ne!(toggled.is_liked_by(&user), initial.is_liked_by(&user));

        let second = OptimisticPatch::like_toggle(&toggled, &user, Utc::now());
        let restored = second.apply(toggled);
        prop_assert_eq!(restored.likes, initial.likes);
    }

    #[test]
    fn test_like_patch_only_touches_acting_user(
        base in likes_strategy(),
        remote in likes_strategy(),
        user in user_strategy(),
    ) {
        let base: Vec<&str> = base.iter().map(String::as_str).collect();
        let remote: Vec<&str> = remote.iter().map(String::as_str).collect();
        let user = UserId::new(user);
        let patch = OptimisticPatch::like_toggle(&post("p1", &base, Vec::new(), 0), &user, Utc::now());

        let remote = post("p1", &remote, Vec::new(), 0);
        let merged = patch.apply(remote.clone());
        for other in remote.likes.iter().filter(|u| **u != user) {
            prop_assert!(merged.is_liked_by(other));
        }
        for other in merged.likes.iter().filter(|u| **u != user) {
            prop_assert!(remote.is_liked_by(other));
        }
    }

    #[test]
    fn test_merged_comment_count_never_drops(
        seeded in 0u64..4,
        events in prop::collection::vec(event_strategy(), 1..40),
    ) {
        let id = PostId::new("p1");
        let mut remote = RemotePost::new(seeded);
        let mut merger = OptimisticStateMerger::new();
        merger.apply_snapshot(remote.snapshot());
        let mut shown = merger.post(&id).unwrap().comment_count;
        // A deletion while comments are pending leaves their predicted
        // counts ahead of the store, so only the remote floor holds until
        // those comments are gone.
        let mut counts_in_step = true;

        for (n, event) in events.into_iter().enumerate() {
            let mut newest = None;
            match event {
                PostEvent::Comment => {
                    let comment = new_comment(n);
                    let current = merger.post(&id).unwrap();
                    let patch = OptimisticPatch::comment_add(current, comment.clone(), Utc::now());
                    merger.install(patch);
                    remote.unconfirmed.push_back(comment);
                    newest = Some(format!("comment {}", n));
                }
                PostEvent::ConfirmOldest => {
                    if let Some(comment) = remote.unconfirmed.pop_front() {
                        remote.land(comment);
                    }
                    merger.apply_snapshot(remote.snapshot());
                }
                PostEvent::ForeignComment => {
                    remote.foreign_comment(&format!("f-{}", n));
                    merger.apply_snapshot(remote.snapshot());
                }
                PostEvent::Redeliver => {
                    merger.apply_snapshot(remote.snapshot());
                }
                PostEvent::DeleteForeign => {
                    if remote.foreign > 0 && merger.pending_len() > 0 {
                        counts_in_step = false;
                    }
                    remote.delete_foreign();
                    merger.apply_snapshot(remote.snapshot());
                }
            }

            let merged = merger.post(&id).unwrap();
            prop_assert!(merged.comment_count >= remote.count);
            prop_assert_eq!(merged.comment_count, remote.count + merger.pending_len() as u64);
            prop_assert!(merged.comments_preview.len() <= PREVIEW_LIMIT);
            if let (Some(text), true) = (newest, counts_in_step) {
                prop_assert_eq!(&merged.comments_preview[0].text, &text);
            }
            if counts_in_step && event != PostEvent::DeleteForeign {
                prop_assert!(
                    merged.comment_count >= shown,
                    "count dropped from {} to {} on {:?}",
                    shown,
                    merged.comment_count,
                    event
                );
            }
            if merger.pending_len() == 0 {
                counts_in_step = true;
            }
            shown = merged.comment_count;
        }
    }

    #[test]
    fn test_preview_never_exceeds_limit(comments in 1usize..8) {
        let mut current = post("p1", &[], Vec::new(), 0);
        for n in 0..comments {
            let patch = OptimisticPatch::comment_add(&current, new_comment(n), Utc::now());
            current = patch.apply(current);
            prop_assert!(current.comments_preview.len() <= PREVIEW_LIMIT);
            prop_assert!(current.comment_count >= current.comments_preview.len() as u64);
        }
        prop_assert_eq!(current.comment_count, comments as u64);
    }

    #[test]
    fn test_merge_is_idempotent(likes in likes_strategy(), user in user_strategy()) {
        let likes: Vec<&str> = likes.iter().map(String::as_str).collect();
        let remote = post("p1", &likes, Vec::new(), 0);
        let patch = OptimisticPatch::like_toggle(&remote, &UserId::new(user), Utc::now());
        let snapshot = snapshot(vec![("p1", to_record(&remote))]);
        let pending: HashMap<PatchKey, OptimisticPatch> = HashMap::from([(patch.key(), patch)]);

        let first = merge(&snapshot, &pending);
        let second = merge(&snapshot, &pending);
        prop_assert_eq!(first, second);
    }

    #[test]
    fn test_confirmed_like_is_retired(likes in likes_strategy(), user in user_strategy()) {
        let likes: Vec<&str> = likes.iter().map(String::as_str).collect();
        let remote = post("p1", &likes, Vec::new(), 0);
        let user = UserId::new(user);
        let patch = OptimisticPatch::like_toggle(&remote, &user, Utc::now());
        let confirmed = patch.apply(remote.clone());

        let mut merger = OptimisticStateMerger::new();
        merger.apply_snapshot(snapshot(vec![("p1", to_record(&remote))]));
        merger.install(patch.clone());
        prop_assert_eq!(merger.pending_len(), 1);

        let window = merger.apply_snapshot(snapshot(vec![("p1", to_record(&confirmed))]));
        prop_assert_eq!(merger.pending_len(), 0);
        prop_assert_eq!(&window.posts()[0].likes, &confirmed.likes);
    }

    #[test]
    fn test_merge_without_patches_is_passthrough(likes in likes_strategy(), count in 0u64..20) {
        let likes: Vec<&str> = likes.iter().map(String::as_str).collect();
        let remote = post("p1", &likes, Vec::new(), count);
        let snapshot = snapshot(vec![("p1", to_record(&remote))]);

        let outcome = merge(&snapshot, &HashMap::new());
        prop_assert!(outcome.retired.is_empty());
        prop_assert!(outcome.orphaned.is_empty());
        prop_assert_eq!(outcome.window.posts(), &[remote][..]);
    }
}
