use blog_core::db::open_db_in_memory;
use blog_core::{BlogError, BlogService, PageRequest, PostRecord};
use rusqlite::Connection;

fn setup() -> Connection {
    let mut conn = open_db_in_memory().unwrap();
    {
        let mut blog = BlogService::new(&mut conn);
        blog.add_user("TestUser", "test@example.com").unwrap();
        blog.add_user("Reader", "reader@example.com").unwrap();
        blog.add_category("Technology").unwrap();
        blog.add_category("Cooking").unwrap();
        blog.add_category("Empty").unwrap();
    }
    conn
}

fn tags(names: &[&str]) -> Vec<String> {
    names.iter().map(|name| name.to_string()).collect()
}

fn titles(posts: &[PostRecord]) -> Vec<&str> {
    posts.iter().map(|post| post.title.as_str()).collect()
}

#[test]
fn posts_by_category_lists_in_insertion_order() {
    let mut conn = setup();
    let mut blog = BlogService::new(&mut conn);
    blog.add_post("TestUser", "first", "", "Technology", &[])
        .unwrap();
    blog.add_post("Reader", "soup", "", "Cooking", &[]).unwrap();
    blog.add_post("Reader", "second", "", "Technology", &[])
        .unwrap();

    let posts = blog.get_posts_by_category("Technology").unwrap();
    assert_eq!(titles(&posts), vec!["first", "second"]);
    assert_eq!(posts[1].author, "Reader");
}

#[test]
fn posts_by_category_is_empty_for_unknown_or_unused_category() {
    let mut conn = setup();
    let blog = BlogService::new(&mut conn);
    assert!(blog.get_posts_by_category("None").unwrap().is_empty());
    assert!(blog.get_posts_by_category("Empty").unwrap().is_empty());
}

#[test]
fn posts_by_tags_returns_each_matching_post_once() {
    let mut conn = setup();
    let mut blog = BlogService::new(&mut conn);
    blog.add_post("TestUser", "both", "", "Technology", &tags(&["Tech", "Rust"]))
        .unwrap();
    blog.add_post("TestUser", "untagged", "", "Technology", &[])
        .unwrap();
    blog.add_post("Reader", "rust only", "", "Technology", &tags(&["Rust"]))
        .unwrap();
    blog.add_post("Reader", "pasta", "", "Cooking", &tags(&["Italian"]))
        .unwrap();

    let posts = blog
        .get_posts_by_tags(&tags(&["Tech", "Rust", "Cooking"]))
        .unwrap();
    assert_eq!(titles(&posts), vec!["both", "rust only"]);
    assert_eq!(posts[0].tags, tags(&["Rust", "Tech"]));

    assert!(blog.get_posts_by_tags(&[]).unwrap().is_empty());
    assert!(blog.get_posts_by_tags(&tags(&["Nope"])).unwrap().is_empty());
}

#[test]
fn paginated_user_posts_use_page_index_not_row_offset() {
    let mut conn = setup();
    let mut blog = BlogService::new(&mut conn);
    for idx in 0..25 {
        blog.add_post("TestUser", &format!("post {idx}"), "", "Technology", &[])
            .unwrap();
        blog.add_post("Reader", &format!("reader {idx}"), "", "Cooking", &[])
            .unwrap();
    }

    let second_page = blog
        .get_user_posts_paginated("TestUser", PageRequest::new(1, 10))
        .unwrap();
    let expected: Vec<String> = (10..20).map(|idx| format!("post {idx}")).collect();
    assert_eq!(titles(&second_page), expected);

    let last_page = blog
        .get_user_posts_paginated("TestUser", PageRequest::new(2, 10))
        .unwrap();
    assert_eq!(last_page.len(), 5);

    let past_end = blog
        .get_user_posts_paginated("TestUser", PageRequest::new(3, 10))
        .unwrap();
    assert!(past_end.is_empty());

    let defaulted = blog
        .get_user_posts_paginated("TestUser", PageRequest::new(0, 0))
        .unwrap();
    assert_eq!(defaulted.len(), 10);
}

#[test]
fn paginated_user_posts_for_unknown_user_is_not_found() {
    let mut conn = setup();
    let blog = BlogService::new(&mut conn);
    let err = blog
        .get_user_posts_paginated("Ghost", PageRequest::default())
        .unwrap_err();
    assert!(matches!(err, BlogError::UserNotFound(ref name) if name == "Ghost"));
}

#[test]
fn user_posts_with_comments_nests_threads_in_order() {
    let mut conn = setup();
    let mut blog = BlogService::new(&mut conn);
    let first = blog
        .add_post("TestUser", "first", "", "Technology", &tags(&["Tech"]))
        .unwrap();
    let second = blog
        .add_post("TestUser", "second", "", "Cooking", &[])
        .unwrap();
    blog.add_post("Reader", "not mine", "", "Cooking", &[])
        .unwrap();
    blog.add_comment("Reader", first.id, "nice").unwrap();
    blog.add_comment("TestUser", first.id, "thanks").unwrap();
    blog.add_comment("Reader", second.id, "yum").unwrap();

    let feed = blog.get_user_posts_with_comments("TestUser").unwrap();
    assert_eq!(feed.user.username, "TestUser");
    assert_eq!(feed.posts.len(), 2);
    assert_eq!(feed.posts[0].post, first);

    let first_thread: Vec<(&str, &str)> = feed.posts[0]
        .comments
        .iter()
        .map(|comment| (comment.author.as_str(), comment.content.as_str()))
        .collect();
    assert_eq!(first_thread, vec![("Reader", "nice"), ("TestUser", "thanks")]);
    assert_eq!(feed.posts[1].comments.len(), 1);
}

#[test]
fn post_record_serializes_with_flat_fields() {
    let mut conn = setup();
    let mut blog = BlogService::new(&mut conn);
    let post = blog
        .add_post("TestUser", "json", "body", "Technology", &tags(&["Tech"]))
        .unwrap();

    let value = serde_json::to_value(&post).unwrap();
    assert_eq!(value["author"], "TestUser");
    assert_eq!(value["category"], "Technology");
    assert_eq!(value["tags"], serde_json::json!(["Tech"]));
}
