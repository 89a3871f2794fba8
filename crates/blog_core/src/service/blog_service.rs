//! Blog CRUD use-case service.
//!
//! # Responsibility
//! - Resolve users, categories, posts and comments by their identifying
//!   fields and apply one create/read/update/delete step per call.
//! - Return typed outcomes; presentation is left to callers.
//!
//! # Invariants
//! - Every write runs in one immediate transaction: it is either committed
//!   whole or rolled back whole.
//! - Existence is checked before insert for users, categories and tags;
//!   storage uniqueness violations map to the same `AlreadyExists` error.
//! - Post deletion follows `ServiceOptions::post_delete`.

use crate::model::post::{
    CommentId, CommentRecord, NewPost, PageRequest, PostId, PostPatch, PostRecord, PostThread,
    UserPosts,
};
use crate::model::taxonomy::{Category, Tag};
use crate::model::user::{NewUser, User};
use crate::model::validation::{normalize_tag_names, require_text, ValidationError};
use crate::repo::comment_repo::{CommentRepository, SqliteCommentRepository};
use crate::repo::post_repo::{PostChanges, PostRepository, SqlitePostRepository};
use crate::repo::taxonomy_repo::{SqliteTaxonomyRepository, TaxonomyRepository};
use crate::repo::user_repo::{SqliteUserRepository, UserRepository};
use crate::repo::{Entity, RepoError};
use log::{debug, error, info, warn};
use rusqlite::{Connection, Transaction, TransactionBehavior};
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::str::FromStr;
use std::time::Instant;

pub type BlogResult<T> = Result<T, BlogError>;

/// Service error for blog use-cases.
#[derive(Debug)]
pub enum BlogError {
    UserNotFound(String),
    CategoryNotFound(String),
    PostNotFound(PostId),
    CommentNotFound(CommentId),
    /// A unique field is already taken. `key` names the taken value.
    AlreadyExists { entity: Entity, key: String },
    Validation(ValidationError),
    Repo(RepoError),
    /// Write succeeded but the read-back disagrees.
    InconsistentState(&'static str),
}

impl BlogError {
    /// Whether this is a "not found" outcome rather than a failure.
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            Self::UserNotFound(_)
                | Self::CategoryNotFound(_)
                | Self::PostNotFound(_)
                | Self::CommentNotFound(_)
        )
    }

    fn is_rejection(&self) -> bool {
        self.is_not_found() || matches!(self, Self::AlreadyExists { .. } | Self::Validation(_))
    }
}

impl Display for BlogError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::UserNotFound(username) => write!(f, "user not found: `{username}`"),
            Self::CategoryNotFound(name) => write!(f, "category not found: `{name}`"),
            Self::PostNotFound(id) => write!(f, "post not found: {id}"),
            Self::CommentNotFound(id) => write!(f, "comment not found: {id}"),
            Self::AlreadyExists { entity, key } => write!(f, "{entity} already exists: `{key}`"),
            Self::Validation(err) => write!(f, "{err}"),
            Self::Repo(err) => write!(f, "{err}"),
            Self::InconsistentState(details) => write!(f, "inconsistent blog state: {details}"),
        }
    }
}

impl Error for BlogError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::Repo(err) => Some(err),
            _ => None,
        }
    }
}

impl From<ValidationError> for BlogError {
    fn from(value: ValidationError) -> Self {
        Self::Validation(value)
    }
}

impl From<RepoError> for BlogError {
    fn from(value: RepoError) -> Self {
        let conflict_entity = value.conflict_entity();
        match value {
            RepoError::NotFound {
                entity: Entity::Post,
                id,
            } => Self::PostNotFound(id),
            RepoError::NotFound {
                entity: Entity::Comment,
                id,
            } => Self::CommentNotFound(id),
            RepoError::Conflict(target) => match conflict_entity {
                Some(entity) => Self::AlreadyExists { entity, key: target },
                None => Self::Repo(RepoError::Conflict(target)),
            },
            other => Self::Repo(other),
        }
    }
}

impl From<rusqlite::Error> for BlogError {
    fn from(value: rusqlite::Error) -> Self {
        RepoError::from(value).into()
    }
}

/// What happens to a post's comments and tag links when it is deleted.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PostDeleteRule {
    /// Comments and tag links are deleted with the post.
    #[default]
    Cascade,
    /// Only the post row goes; comments and links keep the stale post id.
    Orphan,
}

impl PostDeleteRule {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Cascade => "cascade",
            Self::Orphan => "orphan",
        }
    }
}

impl FromStr for PostDeleteRule {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "cascade" => Ok(Self::Cascade),
            "orphan" => Ok(Self::Orphan),
            other => Err(format!(
                "unsupported post delete rule `{other}`; expected cascade|orphan"
            )),
        }
    }
}

/// Behavior switches for `BlogService`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ServiceOptions {
    pub post_delete: PostDeleteRule,
}

/// Outcome of `delete_post`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PostDeletion {
    pub post_id: PostId,
    /// Always 0 under `PostDeleteRule::Orphan`.
    pub removed_comments: usize,
    /// Always 0 under `PostDeleteRule::Orphan`.
    pub removed_tag_links: usize,
}

/// Blog CRUD facade over one borrowed SQLite connection.
pub struct BlogService<'conn> {
    conn: &'conn mut Connection,
    options: ServiceOptions,
}

impl<'conn> BlogService<'conn> {
    /// Creates a service with default options (cascading post deletes).
    pub fn new(conn: &'conn mut Connection) -> Self {
        Self::with_options(conn, ServiceOptions::default())
    }

    pub fn with_options(conn: &'conn mut Connection, options: ServiceOptions) -> Self {
        Self { conn, options }
    }

    pub fn options(&self) -> ServiceOptions {
        self.options
    }

    // ----------------------------------------------------------------- create

    /// Creates a user unless the username or the email is already taken.
    pub fn add_user(&mut self, username: &str, email: &str) -> BlogResult<User> {
        let new_user = NewUser::parse(username, email)?;
        self.write("add_user", |tx| {
            let users = SqliteUserRepository::new(tx);
            if let Some(existing) = users.find_conflicting(&new_user.username, &new_user.email)? {
                let key = if existing.username == new_user.username {
                    new_user.username.clone()
                } else {
                    new_user.email.clone()
                };
                return Err(BlogError::AlreadyExists {
                    entity: Entity::User,
                    key,
                });
            }

            let id = users.create_user(&new_user)?;
            Ok(User {
                id,
                username: new_user.username.clone(),
                email: new_user.email.clone(),
            })
        })
    }

    pub fn add_category(&mut self, name: &str) -> BlogResult<Category> {
        let name = require_text("category name", name)?;
        self.write("add_category", |tx| {
            let taxonomy = SqliteTaxonomyRepository::new(tx);
            if taxonomy.find_category(&name)?.is_some() {
                return Err(BlogError::AlreadyExists {
                    entity: Entity::Category,
                    key: name.clone(),
                });
            }
            let id = taxonomy.create_category(&name)?;
            Ok(Category {
                id,
                name: name.clone(),
            })
        })
    }

    pub fn add_tag(&mut self, name: &str) -> BlogResult<Tag> {
        let name = require_text("tag name", name)?;
        self.write("add_tag", |tx| {
            let taxonomy = SqliteTaxonomyRepository::new(tx);
            if taxonomy.find_tag(&name)?.is_some() {
                return Err(BlogError::AlreadyExists {
                    entity: Entity::Tag,
                    key: name.clone(),
                });
            }
            let id = taxonomy.create_tag(&name)?;
            Ok(Tag {
                id,
                name: name.clone(),
            })
        })
    }

    /// Creates a post owned by `username` in `category_name`.
    ///
    /// Unknown tag names are created on the fly; repeated names are linked once.
    /// Nothing is inserted when the user or category is missing.
    pub fn add_post(
        &mut self,
        username: &str,
        title: &str,
        content: &str,
        category_name: &str,
        tag_names: &[String],
    ) -> BlogResult<PostRecord> {
        let new_post = NewPost::parse(title, content, tag_names)?;
        let username = username.trim();
        let category_name = category_name.trim();
        self.write("add_post", |tx| {
            let user = SqliteUserRepository::new(tx)
                .find_by_username(username)?
                .ok_or_else(|| BlogError::UserNotFound(username.to_string()))?;
            let category = SqliteTaxonomyRepository::new(tx)
                .find_category(category_name)?
                .ok_or_else(|| BlogError::CategoryNotFound(category_name.to_string()))?;

            let posts = SqlitePostRepository::new(tx);
            let post_id =
                posts.create_post(user.id, category.id, &new_post.title, &new_post.content)?;
            let created_tags = link_tags(tx, post_id, &new_post.tags)?;
            debug!(
                "event=post_tags_linked module=service post_id={post_id} links={} created_tags={created_tags}",
                new_post.tags.len()
            );

            posts
                .get_post(post_id)?
                .ok_or(BlogError::InconsistentState("created post not found in read-back"))
        })
    }

    pub fn add_comment(
        &mut self,
        username: &str,
        post_id: PostId,
        content: &str,
    ) -> BlogResult<CommentRecord> {
        let content = require_text("comment content", content)?;
        let username = username.trim();
        self.write("add_comment", |tx| {
            let user = SqliteUserRepository::new(tx)
                .find_by_username(username)?
                .ok_or_else(|| BlogError::UserNotFound(username.to_string()))?;
            if !SqlitePostRepository::new(tx).post_exists(post_id)? {
                return Err(BlogError::PostNotFound(post_id));
            }

            let comments = SqliteCommentRepository::new(tx);
            let id = comments.create_comment(user.id, post_id, &content)?;
            comments
                .get_comment(id)?
                .ok_or(BlogError::InconsistentState("created comment not found in read-back"))
        })
    }

    // ------------------------------------------------------------------- read

    pub fn get_user(&self, username: &str) -> BlogResult<User> {
        let username = username.trim();
        SqliteUserRepository::new(self.conn)
            .find_by_username(username)?
            .ok_or_else(|| BlogError::UserNotFound(username.to_string()))
    }

    pub fn get_post(&self, id: PostId) -> BlogResult<PostRecord> {
        SqlitePostRepository::new(self.conn)
            .get_post(id)?
            .ok_or(BlogError::PostNotFound(id))
    }

    pub fn get_comment(&self, id: CommentId) -> BlogResult<CommentRecord> {
        SqliteCommentRepository::new(self.conn)
            .get_comment(id)?
            .ok_or(BlogError::CommentNotFound(id))
    }

    /// Posts of one category in insertion order; empty when the category is unknown.
    pub fn get_posts_by_category(&self, category_name: &str) -> BlogResult<Vec<PostRecord>> {
        let category_name = category_name.trim();
        let Some(category) = SqliteTaxonomyRepository::new(self.conn).find_category(category_name)?
        else {
            debug!("event=posts_by_category module=service status=empty reason=category_missing");
            return Ok(Vec::new());
        };
        Ok(SqlitePostRepository::new(self.conn).list_by_category(category.id)?)
    }

    /// Posts linked to any of `tag_names`, deduplicated, in insertion order.
    pub fn get_posts_by_tags(&self, tag_names: &[String]) -> BlogResult<Vec<PostRecord>> {
        let names: Vec<String> = tag_names
            .iter()
            .map(|name| name.trim())
            .filter(|name| !name.is_empty())
            .map(str::to_string)
            .collect();
        Ok(SqlitePostRepository::new(self.conn).list_by_tag_names(&names)?)
    }

    /// One page of a user's posts in insertion order.
    pub fn get_user_posts_paginated(
        &self,
        username: &str,
        page: PageRequest,
    ) -> BlogResult<Vec<PostRecord>> {
        let user = self.get_user(username)?;
        Ok(SqlitePostRepository::new(self.conn).list_by_user(
            user.id,
            Some(page.limit()),
            page.row_offset(),
        )?)
    }

    /// All of a user's posts, each with its comment thread.
    pub fn get_user_posts_with_comments(&self, username: &str) -> BlogResult<UserPosts> {
        let user = self.get_user(username)?;
        let posts = SqlitePostRepository::new(self.conn).list_by_user(user.id, None, 0)?;
        let comments = SqliteCommentRepository::new(self.conn);
        let mut threads = Vec::with_capacity(posts.len());
        for post in posts {
            let post_comments = comments.list_for_post(post.id)?;
            threads.push(PostThread {
                post,
                comments: post_comments,
            });
        }
        Ok(UserPosts {
            user,
            posts: threads,
        })
    }

    pub fn count_users(&self) -> BlogResult<u64> {
        Ok(SqliteUserRepository::new(self.conn).count_users()?)
    }

    pub fn count_tags(&self) -> BlogResult<u64> {
        Ok(SqliteTaxonomyRepository::new(self.conn).count_tags()?)
    }

    pub fn count_posts(&self) -> BlogResult<u64> {
        Ok(SqlitePostRepository::new(self.conn).count_posts()?)
    }

    pub fn count_comments(&self) -> BlogResult<u64> {
        Ok(SqliteCommentRepository::new(self.conn).count_comments()?)
    }

    // ----------------------------------------------------------------- update

    /// Applies the `Some` fields of `patch`.
    ///
    /// An unknown category aborts the whole update, leaving the post as it was.
    pub fn update_post(&mut self, id: PostId, patch: &PostPatch) -> BlogResult<PostRecord> {
        let title = patch
            .title
            .as_deref()
            .map(|value| require_text("title", value))
            .transpose()?;
        let category_name = patch
            .category
            .as_deref()
            .map(|value| require_text("category name", value))
            .transpose()?;
        let tags = patch.tags.as_deref().map(normalize_tag_names).transpose()?;

        self.write("update_post", |tx| {
            let posts = SqlitePostRepository::new(tx);
            let current = posts.get_post(id)?.ok_or(BlogError::PostNotFound(id))?;

            let category_id = match category_name.as_deref() {
                Some(name) if name != current.category => {
                    let category = SqliteTaxonomyRepository::new(tx)
                        .find_category(name)?
                        .ok_or_else(|| BlogError::CategoryNotFound(name.to_string()))?;
                    Some(category.id)
                }
                _ => None,
            };

            posts.update_post(
                id,
                &PostChanges {
                    title: title.as_deref(),
                    content: patch.content.as_deref(),
                    category_id,
                },
            )?;

            if let Some(tags) = tags.as_deref() {
                let removed = posts.clear_tags(id)?;
                let created = link_tags(tx, id, tags)?;
                debug!(
                    "event=post_tags_replaced module=service post_id={id} removed={removed} linked={} created_tags={created}",
                    tags.len()
                );
            }

            posts
                .get_post(id)?
                .ok_or(BlogError::InconsistentState("updated post not found in read-back"))
        })
    }

    pub fn update_comment(&mut self, id: CommentId, content: &str) -> BlogResult<CommentRecord> {
        let content = require_text("comment content", content)?;
        self.write("update_comment", |tx| {
            let comments = SqliteCommentRepository::new(tx);
            comments.update_content(id, &content)?;
            comments
                .get_comment(id)?
                .ok_or(BlogError::InconsistentState("updated comment not found in read-back"))
        })
    }

    // ----------------------------------------------------------------- delete

    /// Deletes a post, handling its comments and tag links per `PostDeleteRule`.
    pub fn delete_post(&mut self, id: PostId) -> BlogResult<PostDeletion> {
        match self.options.post_delete {
            PostDeleteRule::Cascade => self.write("delete_post", |tx| {
                let posts = SqlitePostRepository::new(tx);
                if !posts.post_exists(id)? {
                    return Err(BlogError::PostNotFound(id));
                }
                let removed_tag_links = posts.clear_tags(id)?;
                let removed_comments = SqliteCommentRepository::new(tx).delete_for_post(id)?;
                posts.delete_post(id)?;
                Ok(PostDeletion {
                    post_id: id,
                    removed_comments,
                    removed_tag_links,
                })
            }),
            PostDeleteRule::Orphan => {
                // foreign_keys cannot change inside a transaction.
                self.conn.execute_batch("PRAGMA foreign_keys = OFF;")?;
                let result = self.write("delete_post", |tx| {
                    if !SqlitePostRepository::new(tx).delete_post(id)? {
                        return Err(BlogError::PostNotFound(id));
                    }
                    Ok(PostDeletion {
                        post_id: id,
                        removed_comments: 0,
                        removed_tag_links: 0,
                    })
                });
                self.conn.execute_batch("PRAGMA foreign_keys = ON;")?;
                result
            }
        }
    }

    pub fn delete_comment(&mut self, id: CommentId) -> BlogResult<()> {
        self.write("delete_comment", |tx| {
            if !SqliteCommentRepository::new(tx).delete_comment(id)? {
                return Err(BlogError::CommentNotFound(id));
            }
            Ok(())
        })
    }

    fn write<T>(
        &mut self,
        operation: &'static str,
        apply: impl FnOnce(&Transaction<'_>) -> BlogResult<T>,
    ) -> BlogResult<T> {
        let started_at = Instant::now();
        let tx = self
            .conn
            .transaction_with_behavior(TransactionBehavior::Immediate)?;

        // Dropping `tx` without commit rolls the unit of work back.
        let result = apply(&tx).and_then(|value| {
            tx.commit()?;
            Ok(value)
        });

        match &result {
            Ok(_) => info!(
                "event={operation} module=service status=ok duration_ms={}",
                started_at.elapsed().as_millis()
            ),
            Err(err) if err.is_rejection() => warn!(
                "event={operation} module=service status=rejected duration_ms={} reason={err}",
                started_at.elapsed().as_millis()
            ),
            Err(err) => error!(
                "event={operation} module=service status=error duration_ms={} error={err}",
                started_at.elapsed().as_millis()
            ),
        }
        result
    }
}

/// Links each name to the post, creating missing tags. Returns created tag count.
fn link_tags(conn: &Connection, post_id: PostId, tag_names: &[String]) -> BlogResult<usize> {
    let taxonomy = SqliteTaxonomyRepository::new(conn);
    let posts = SqlitePostRepository::new(conn);
    let mut created_tags = 0;
    for name in tag_names {
        let (tag, created) = taxonomy.find_or_create_tag(name)?;
        if created {
            created_tags += 1;
        }
        posts.link_tag(post_id, tag.id)?;
    }
    Ok(created_tags)
}
