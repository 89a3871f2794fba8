use blog_core::db::open_db_in_memory;
use blog_core::{BlogError, BlogService, Entity, ValidationError};
use rusqlite::Connection;

fn setup() -> Connection {
    open_db_in_memory().unwrap()
}

fn tags(names: &[&str]) -> Vec<String> {
    names.iter().map(|name| name.to_string()).collect()
}

#[test]
fn add_user_returns_created_row() {
    let mut conn = setup();
    let mut blog = BlogService::new(&mut conn);

    let user = blog.add_user(" TestUser ", "test@example.com").unwrap();
    assert_eq!(user.username, "TestUser");
    assert_eq!(user.email, "test@example.com");
    assert_eq!(blog.get_user("TestUser").unwrap(), user);
}

#[test]
fn add_user_with_existing_username_or_email_is_rejected_without_insert() {
    let mut conn = setup();
    let mut blog = BlogService::new(&mut conn);
    blog.add_user("TestUser", "test@example.com").unwrap();

    let same_pair = blog.add_user("TestUser", "test@example.com").unwrap_err();
    assert!(matches!(
        same_pair,
        BlogError::AlreadyExists { entity: Entity::User, ref key } if key == "TestUser"
    ));

    let same_email = blog.add_user("Other", "test@example.com").unwrap_err();
    assert!(matches!(
        same_email,
        BlogError::AlreadyExists { entity: Entity::User, ref key } if key == "test@example.com"
    ));

    assert!(blog.add_user("TestUser", "other@example.com").is_err());
    assert_eq!(blog.count_users().unwrap(), 1);
}

#[test]
fn add_user_validates_fields() {
    let mut conn = setup();
    let mut blog = BlogService::new(&mut conn);

    let err = blog.add_user("bad name", "x@example.com").unwrap_err();
    assert!(matches!(
        err,
        BlogError::Validation(ValidationError::InvalidUsername(_))
    ));
    let err = blog.add_user("good", "not-an-email").unwrap_err();
    assert!(matches!(
        err,
        BlogError::Validation(ValidationError::InvalidEmail(_))
    ));
    assert_eq!(blog.count_users().unwrap(), 0);
}

#[test]
fn duplicate_category_and_tag_names_are_rejected() {
    let mut conn = setup();
    let mut blog = BlogService::new(&mut conn);

    blog.add_category("Technology").unwrap();
    let err = blog.add_category("Technology").unwrap_err();
    assert!(matches!(
        err,
        BlogError::AlreadyExists {
            entity: Entity::Category,
            ..
        }
    ));

    blog.add_tag("Tech").unwrap();
    let err = blog.add_tag(" Tech ").unwrap_err();
    assert!(matches!(
        err,
        BlogError::AlreadyExists {
            entity: Entity::Tag,
            ..
        }
    ));
    assert_eq!(blog.count_tags().unwrap(), 1);
}

#[test]
fn add_post_links_user_category_and_tags() {
    let mut conn = setup();
    let mut blog = BlogService::new(&mut conn);
    blog.add_user("TestUser", "test@example.com").unwrap();
    blog.add_category("Technology").unwrap();
    blog.add_tag("Tech").unwrap();

    let post = blog
        .add_post(
            "TestUser",
            "Understanding SQLite Through Examples",
            "A deep dive.",
            "Technology",
            &tags(&["Tech"]),
        )
        .unwrap();

    assert_eq!(blog.count_posts().unwrap(), 1);
    assert_eq!(post.title, "Understanding SQLite Through Examples");
    assert_eq!(post.author, "TestUser");
    assert_eq!(post.category, "Technology");
    assert_eq!(post.tags, tags(&["Tech"]));
    assert_eq!(blog.get_post(post.id).unwrap(), post);
}

#[test]
fn add_post_with_missing_user_or_category_inserts_nothing() {
    let mut conn = setup();
    let mut blog = BlogService::new(&mut conn);
    blog.add_user("TestUser", "test@example.com").unwrap();
    blog.add_category("Technology").unwrap();

    let err = blog
        .add_post("Ghost", "t", "c", "Technology", &tags(&["New"]))
        .unwrap_err();
    assert!(matches!(err, BlogError::UserNotFound(ref name) if name == "Ghost"));

    let err = blog
        .add_post("TestUser", "t", "c", "Cooking", &tags(&["New"]))
        .unwrap_err();
    assert!(matches!(err, BlogError::CategoryNotFound(ref name) if name == "Cooking"));

    assert_eq!(blog.count_posts().unwrap(), 0);
    assert_eq!(blog.count_tags().unwrap(), 0);
}

#[test]
fn add_post_creates_only_missing_tags_and_links_each_name() {
    let mut conn = setup();
    {
        let mut blog = BlogService::new(&mut conn);
        blog.add_user("TestUser", "test@example.com").unwrap();
        blog.add_category("Technology").unwrap();
        blog.add_tag("Tech").unwrap();
        blog.add_tag("Rust").unwrap();

        let post = blog
            .add_post(
                "TestUser",
                "Tags",
                "",
                "Technology",
                &tags(&["Tech", "Databases", "Rust", "Sqlite", "Databases"]),
            )
            .unwrap();
        assert_eq!(post.tags, tags(&["Databases", "Rust", "Sqlite", "Tech"]));
        assert_eq!(blog.count_tags().unwrap(), 4);
    }

    let links: i64 = conn
        .query_row("SELECT COUNT(*) FROM post_tags;", [], |row| row.get(0))
        .unwrap();
    assert_eq!(links, 4);
}

#[test]
fn add_post_rejects_blank_tag_before_touching_storage() {
    let mut conn = setup();
    let mut blog = BlogService::new(&mut conn);
    blog.add_user("TestUser", "test@example.com").unwrap();
    blog.add_category("Technology").unwrap();

    let err = blog
        .add_post("TestUser", "t", "c", "Technology", &tags(&["Tech", "  "]))
        .unwrap_err();
    assert!(matches!(
        err,
        BlogError::Validation(ValidationError::BlankField("tag name"))
    ));
    assert_eq!(blog.count_posts().unwrap(), 0);
    assert_eq!(blog.count_tags().unwrap(), 0);
}

#[test]
fn add_comment_requires_user_and_post() {
    let mut conn = setup();
    let mut blog = BlogService::new(&mut conn);
    blog.add_user("TestUser", "test@example.com").unwrap();
    blog.add_user("Reader", "reader@example.com").unwrap();
    blog.add_category("Technology").unwrap();
    let post = blog
        .add_post("TestUser", "t", "c", "Technology", &[])
        .unwrap();

    let comment = blog
        .add_comment("Reader", post.id, "This is a fascinating topic!")
        .unwrap();
    assert_eq!(comment.post_id, post.id);
    assert_eq!(comment.author, "Reader");
    assert_eq!(comment.content, "This is a fascinating topic!");

    let err = blog.add_comment("Ghost", post.id, "hi").unwrap_err();
    assert!(matches!(err, BlogError::UserNotFound(_)));
    let err = blog.add_comment("Reader", post.id + 100, "hi").unwrap_err();
    assert!(matches!(err, BlogError::PostNotFound(id) if id == post.id + 100));
    assert_eq!(blog.count_comments().unwrap(), 1);
}
