//! Post and comment entities plus their read models.
//!
//! # Invariants
//! - Every post references exactly one user and one category.
//! - Every comment references exactly one user and one post.
//! - `PostRecord::tags` is sorted by name.

use crate::model::taxonomy::CategoryId;
use crate::model::user::{User, UserId};
use crate::model::validation::{normalize_tag_names, require_text, ValidationError};
use serde::{Deserialize, Serialize};

pub type PostId = i64;
pub type CommentId = i64;

const PAGE_SIZE_DEFAULT: u32 = 10;
const PAGE_SIZE_MAX: u32 = 100;

/// Post read model joined with author, category and tags.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PostRecord {
    pub id: PostId,
    pub title: String,
    pub content: String,
    pub user_id: UserId,
    /// Username of the owning user.
    pub author: String,
    pub category_id: CategoryId,
    /// Name of the owning category.
    pub category: String,
    /// Linked tag names, sorted.
    pub tags: Vec<String>,
}

/// Comment read model joined with its author.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommentRecord {
    pub id: CommentId,
    pub post_id: PostId,
    pub user_id: UserId,
    /// Username of the commenting user.
    pub author: String,
    pub content: String,
}

/// One post with its comments in insertion order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PostThread {
    pub post: PostRecord,
    pub comments: Vec<CommentRecord>,
}

/// Everything a user has posted, each post with its comment thread.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserPosts {
    pub user: User,
    pub posts: Vec<PostThread>,
}

/// Validated post body fields.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewPost {
    pub title: String,
    pub content: String,
    /// Distinct tag names in first-seen order.
    pub tags: Vec<String>,
}

impl NewPost {
    /// Title must not be blank; content may be empty.
    pub fn parse(title: &str, content: &str, tags: &[String]) -> Result<Self, ValidationError> {
        Ok(Self {
            title: require_text("title", title)?,
            content: content.to_string(),
            tags: normalize_tag_names(tags)?,
        })
    }
}

/// Partial update for a post. `None` fields are left untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PostPatch {
    pub title: Option<String>,
    pub content: Option<String>,
    /// Name of an existing category to move the post to.
    pub category: Option<String>,
    /// Replacement tag set; `Some(vec![])` removes every tag link.
    pub tags: Option<Vec<String>>,
}

impl PostPatch {
    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.content.is_none()
            && self.category.is_none()
            && self.tags.is_none()
    }
}

/// Zero-based page of a listing.
///
/// Row window is `[page * per_page, (page + 1) * per_page)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageRequest {
    pub page: u32,
    /// Defaults to 10 when 0, clamps to 100.
    pub per_page: u32,
}

impl Default for PageRequest {
    fn default() -> Self {
        Self {
            page: 0,
            per_page: PAGE_SIZE_DEFAULT,
        }
    }
}

impl PageRequest {
    pub fn new(page: u32, per_page: u32) -> Self {
        Self { page, per_page }
    }

    /// Page size after applying default and cap.
    pub fn limit(&self) -> u32 {
        match self.per_page {
            0 => PAGE_SIZE_DEFAULT,
            value if value > PAGE_SIZE_MAX => PAGE_SIZE_MAX,
            value => value,
        }
    }

    /// Rows skipped before this page.
    pub fn row_offset(&self) -> u64 {
        u64::from(self.page) * u64::from(self.limit())
    }
}

#[cfg(test)]
mod tests {
    use super::{NewPost, PageRequest, PostPatch};

    #[test]
    fn page_request_offsets_by_whole_pages() {
        let page = PageRequest::new(1, 10);
        assert_eq!(page.limit(), 10);
        assert_eq!(page.row_offset(), 10);
        assert_eq!(PageRequest::new(3, 25).row_offset(), 75);
    }

    #[test]
    fn page_request_defaults_and_caps_size() {
        assert_eq!(PageRequest::new(0, 0).limit(), 10);
        assert_eq!(PageRequest::new(2, 500).limit(), 100);
        assert_eq!(PageRequest::new(2, 500).row_offset(), 200);
        assert_eq!(PageRequest::default(), PageRequest::new(0, 10));
    }

    #[test]
    fn new_post_allows_empty_content_but_not_blank_title() {
        let post = NewPost::parse(" Title ", "", &[]).unwrap();
        assert_eq!(post.title, "Title");
        assert!(post.content.is_empty());
        assert!(NewPost::parse("   ", "body", &[]).is_err());
    }

    #[test]
    fn default_patch_is_empty() {
        assert!(PostPatch::default().is_empty());
        let patch = PostPatch {
            title: Some("t".to_string()),
            ..PostPatch::default()
        };
        assert!(!patch.is_empty());
    }
}
