//! Blog demo driver.
//!
//! # Responsibility
//! - Reset the configured store and run a fixed create/read/update/delete
//!   script against it.
//! - Print human-readable status lines; expected "not found" and duplicate
//!   outcomes are printed, anything else aborts with exit status 1.

use blog_core::{
    init_logging, open_store, BlogConfig, BlogError, BlogResult, BlogService, CommentId,
    PageRequest, PostId, PostPatch, PostRecord,
};
use log::{error, info};
use std::error::Error;
use std::process::ExitCode;

const USERNAME: &str = "TestUser";
const EMAIL: &str = "test@example.com";
const CATEGORY: &str = "Technology";
const TAG: &str = "Tech";
const SECTION_RULE: &str =
    "======================================================================================";

/// Ids created by the script, reused by later sections.
#[derive(Debug, Default, Clone, Copy)]
struct SampleIds {
    post: Option<PostId>,
    comment: Option<CommentId>,
}

fn main() -> ExitCode {
    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!("event=demo_run module=cli status=error error={err}");
            eprintln!("blog_demo failed: {err}");
            ExitCode::FAILURE
        }
    }
}

fn run() -> Result<(), Box<dyn Error>> {
    let config = BlogConfig::from_env()?;
    init_logging(&config.logging)?;
    info!(
        "event=demo_run module=cli status=start db_path={} post_delete={}",
        config.db_path.display(),
        config.service.post_delete.as_str()
    );

    let mut conn = open_store(&config.db_path)?;
    let mut blog = BlogService::with_options(&mut conn, config.service);

    let ids = create_section(&mut blog)?;
    read_section(&blog)?;
    update_section(&mut blog, ids)?;
    delete_section(&mut blog, ids)?;

    info!("event=demo_run module=cli status=ok");
    Ok(())
}

fn create_section(blog: &mut BlogService<'_>) -> Result<SampleIds, BlogError> {
    section("Create Operations:");
    report(blog.add_user(USERNAME, EMAIL), |user| {
        format!("User '{}' added.", user.username)
    })?;
    report(blog.add_category(CATEGORY), |category| {
        format!("Category '{}' added.", category.name)
    })?;
    report(blog.add_tag(TAG), |tag| format!("Tag '{}' added.", tag.name))?;

    let post = report(
        blog.add_post(
            USERNAME,
            "Understanding SQLite Through Examples",
            "A deep dive into a relational blog schema for real scenarios.",
            CATEGORY,
            &[TAG.to_string()],
        ),
        |post| format!("Post '{}' added by '{}'.", post.title, post.author),
    )?;
    let mut ids = SampleIds {
        post: post.map(|post| post.id),
        comment: None,
    };

    if let Some(post_id) = ids.post {
        let comment = report(
            blog.add_comment(USERNAME, post_id, "This is a fascinating topic!"),
            |comment| {
                format!(
                    "Comment added to post with id '{}' by '{}'.",
                    comment.post_id, comment.author
                )
            },
        )?;
        ids.comment = comment.map(|comment| comment.id);
    }
    Ok(ids)
}

fn read_section(blog: &BlogService<'_>) -> Result<(), BlogError> {
    section("Read Operations:");

    println!("\nPosts by Tag: [{TAG}, Cooking]");
    print_posts(&blog.get_posts_by_tags(&[TAG.to_string(), "Cooking".to_string()])?);

    println!("\nPosts by Category: {CATEGORY}");
    print_posts(&blog.get_posts_by_category(CATEGORY)?);

    println!("\nPosts by Category: None");
    print_posts(&blog.get_posts_by_category("None")?);

    if let Some(feed) = report(blog.get_user_posts_with_comments(USERNAME), |_| String::new())? {
        println!("\nUser: {}", feed.user.username);
        for thread in &feed.posts {
            println!(
                " - Post: {}, Tags: [{}]",
                thread.post.title,
                thread.post.tags.join(", ")
            );
            for comment in &thread.comments {
                println!("   - Comment: {} by {}", comment.content, comment.author);
            }
        }
    }

    let first_page = blog.get_user_posts_paginated(USERNAME, PageRequest::default())?;
    println!("\nUser {USERNAME} has {} posts on the first page!", first_page.len());
    Ok(())
}

fn update_section(blog: &mut BlogService<'_>, ids: SampleIds) -> Result<(), BlogError> {
    section("Update Operations:");
    let Some(post_id) = ids.post else {
        println!("No post to update.");
        return Ok(());
    };

    let retitle = PostPatch {
        title: Some("An updated example of SQLite".to_string()),
        ..PostPatch::default()
    };
    report(blog.update_post(post_id, &retitle), |post| {
        format!("Post with id '{}' updated successfully.", post.id)
    })?;

    let rewrite = PostPatch {
        content: Some("Now you know how to do this! Congratulations!".to_string()),
        ..PostPatch::default()
    };
    report(blog.update_post(post_id, &rewrite), |post| {
        format!("Post with id '{}' updated successfully.", post.id)
    })?;

    if let Some(comment_id) = ids.comment {
        report(
            blog.update_comment(comment_id, "I have updated my comment"),
            |comment| format!("Comment with ID '{}' updated successfully.", comment.id),
        )?;
    }
    Ok(())
}

fn delete_section(blog: &mut BlogService<'_>, ids: SampleIds) -> Result<(), BlogError> {
    section("Delete Operations:");

    println!("There are {} comments", blog.count_comments()?);
    if let Some(comment_id) = ids.comment {
        report(blog.delete_comment(comment_id), |_| {
            format!("Comment with ID '{comment_id}' deleted.")
        })?;
    }
    println!("There are now {} comments", blog.count_comments()?);

    println!("\nThere are {} posts", blog.count_posts()?);
    if let Some(post_id) = ids.post {
        report(blog.delete_post(post_id), |deletion| {
            format!(
                "Post with id '{}' deleted ({} comments, {} tag links removed).",
                deletion.post_id, deletion.removed_comments, deletion.removed_tag_links
            )
        })?;
    }
    println!("There are now {} posts", blog.count_posts()?);
    Ok(())
}

/// Prints the outcome line; not-found and duplicate outcomes are not fatal.
fn report<T>(result: BlogResult<T>, describe: impl FnOnce(&T) -> String) -> BlogResult<Option<T>> {
    match result {
        Ok(value) => {
            let line = describe(&value);
            if !line.is_empty() {
                println!("{line}");
            }
            Ok(Some(value))
        }
        Err(err) if err.is_not_found() || matches!(err, BlogError::AlreadyExists { .. }) => {
            println!("{err}");
            Ok(None)
        }
        Err(err) => Err(err),
    }
}

fn section(title: &str) {
    println!("{SECTION_RULE}");
    println!("\n\n{title}");
}

fn print_posts(posts: &[PostRecord]) {
    for post in posts {
        println!(" - Post: {}, user: {}", post.title, post.author);
    }
}
