use std::fmt;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// Platform-issued item identifier (base36 string like "t3_abc12").
pub type ItemId = String;

/// Which stream an item came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ItemKind {
    Post,
    Comment,
}

impl fmt::Display for ItemKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ItemKind::Post => write!(f, "post"),
            ItemKind::Comment => write!(f, "comment"),
        }
    }
}

/// Immutable snapshot of a post or comment supplied by the platform client.
///
/// The core never mutates an item; approvals and removals go through a
/// `ModerationSink`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModerationItem {
    pub id: ItemId,
    pub kind: ItemKind,
    pub author: String,
    pub created_at: DateTime<Utc>,
    /// Parent post for comments, `None` for posts.
    #[serde(default)]
    pub container_id: Option<ItemId>,
    /// Post flair text (category).
    #[serde(default)]
    pub flair: Option<String>,
    /// CSS class of the author's flair badge.
    #[serde(default)]
    pub author_flair_class: Option<String>,
    /// Link target of a link post.
    #[serde(default)]
    pub url: Option<String>,
    /// Text ("self") post.
    #[serde(default)]
    pub is_self: bool,
    /// Archived post, or for comments the archived state of the container.
    #[serde(default)]
    pub archived: bool,
    /// Already removed by another moderator or bot.
    #[serde(default)]
    pub removed: bool,
    #[serde(default)]
    pub permalink: Option<String>,
    /// Community (subreddit) the item was posted in, lowercase.
    #[serde(default)]
    pub community: Option<String>,
}

impl ModerationItem {
    /// A bare post snapshot with every optional field unset.
    pub fn post(id: impl Into<ItemId>, author: impl Into<String>, created_at: DateTime<Utc>) -> Self {
        Self {
            id: id.into(),
            kind: ItemKind::Post,
            author: author.into(),
            created_at,
            container_id: None,
            flair: None,
            author_flair_class: None,
            url: None,
            is_self: false,
            archived: false,
            removed: false,
            permalink: None,
            community: None,
        }
    }

    /// A bare comment snapshot attached to `container_id`.
    pub fn comment(
        id: impl Into<ItemId>,
        container_id: impl Into<ItemId>,
        author: impl Into<String>,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            kind: ItemKind::Comment,
            container_id: Some(container_id.into()),
            ..Self::post(id, author, created_at)
        }
    }

    pub fn with_flair(mut self, flair: impl Into<String>) -> Self {
        self.flair = Some(flair.into());
        self
    }

    pub fn with_author_flair_class(mut self, class: impl Into<String>) -> Self {
        self.author_flair_class = Some(class.into());
        self
    }

    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = Some(url.into());
        self
    }

    pub fn in_community(mut self, community: impl Into<String>) -> Self {
        self.community = Some(community.into().to_ascii_lowercase());
        self
    }

    pub fn self_post(mut self) -> Self {
        self.is_self = true;
        self
    }

    pub fn archived(mut self) -> Self {
        self.archived = true;
        self
    }

    pub fn is_post(&self) -> bool {
        self.kind == ItemKind::Post
    }

    pub fn is_comment(&self) -> bool {
        self.kind == ItemKind::Comment
    }

    /// Time elapsed since the item was created.
    pub fn age(&self, now: DateTime<Utc>) -> Duration {
        now.signed_duration_since(self.created_at)
    }

    /// Best human-readable locator for logs.
    pub fn locator(&self) -> &str {
        self.permalink.as_deref().unwrap_or(&self.id)
    }
}
